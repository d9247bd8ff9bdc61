use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Required fields or series are absent.
    #[error("Missing data: {0}")]
    MissingData(String),

    /// Structurally nonsensical input, e.g. a discount rate at or below terminal growth.
    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    /// Too few aligned observations for a statistic to mean anything.
    #[error("Insufficient samples: need at least {required}, got {actual}")]
    InsufficientSamples { required: usize, actual: usize },

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl AnalysisError {
    pub fn invalid_domain(msg: impl Into<String>) -> Self {
        AnalysisError::InvalidDomain(msg.into())
    }

    pub fn missing(msg: impl Into<String>) -> Self {
        AnalysisError::MissingData(msg.into())
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

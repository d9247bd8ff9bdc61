pub mod alignment;
pub mod error;
pub mod growth;
pub mod stats;
pub mod types;

pub use alignment::{AlignedRow, AlignedRows, TimeSeriesAligner, TrailingWindow};
pub use error::*;
pub use growth::GrowthPolicy;
pub use types::*;

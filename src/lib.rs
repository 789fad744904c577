pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod records;
pub mod stages;
pub mod table;
pub mod thresholds;

pub use config::Layout;
pub use error::AlarmError;
pub use pipeline::{RunSummary, Selection, Stage, StageOutcome, run};

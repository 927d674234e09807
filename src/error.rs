//! Terminal error taxonomy for the reconciliation pipeline.
//!
//! Only three conditions abort a run: unreadable input, structurally invalid
//! delimited text, and required columns missing after renaming. Per-row
//! coercion failures are never errors; they surface as null fields and are
//! accounted for during classification.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("input is not valid delimited text: {0}")]
    Parse(String),
    #[error("missing required column(s) after renaming: {}", .missing.join(", "))]
    Schema { missing: Vec<String> },
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(io) => PipelineError::Io(io),
            _ => PipelineError::Parse(message),
        }
    }
}

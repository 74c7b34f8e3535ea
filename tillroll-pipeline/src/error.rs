//! Pipeline error types
//!
//! Lower-level OS/driver errors never reach the caller as errors: they are
//! captured into attempt reason strings and either escalate the fallback
//! chain or become the final failure message. The variants here cover what
//! the pipeline itself can reject or conclude.

use thiserror::Error;
use tillroll_printer::PrintError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Markup or receipt payload rejected before any printer interaction
    #[error("Render validation failed: {0}")]
    RenderValidation(String),

    /// Every fallback stage failed
    #[error("All print strategies exhausted: {last_reason}")]
    Exhausted { last_reason: String },

    /// Low-level printing error, surfaced only for non-print operations
    /// (PDF export, temp file handling)
    #[error(transparent)]
    Print(#[from] PrintError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

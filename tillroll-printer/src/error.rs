//! Error types for the printer library

use thiserror::Error;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// IO error during printing
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout waiting for the printer or the rendering surface
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid printer or job configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Printer enumeration failed or is not available
    #[error("Enumeration failed: {0}")]
    Enumeration(String),

    /// The OS print spooler rejected the job
    #[error("Spooler error: {0}")]
    Spooler(String),

    /// PDF generation failed
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Operation attempted on a surface that was already closed
    #[error("Rendering surface is closed")]
    SurfaceClosed,
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;

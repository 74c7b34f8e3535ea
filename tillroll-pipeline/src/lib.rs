//! # tillroll-pipeline
//!
//! Receipt print pipeline: turns a logical "print this receipt" request
//! into a silent print job on a thermal printer, with layered fallbacks.
//!
//! ## Flow
//!
//! caller → [`PrintPipeline`] → render markup → resolve printer →
//! execute through an off-screen surface → on failure, escalate
//! direct → default printer → PDF intermediate → external viewer.
//!
//! Every request ends in exactly one terminal [`PrintReport`]; rendering
//! surfaces and temp files never outlive the request that created them.
//!
//! ## Example
//!
//! ```ignore
//! use tillroll_pipeline::{PipelineConfig, PrintOptions, PrintPipeline};
//!
//! let pipeline = PrintPipeline::with_spooler(PipelineConfig::from_env());
//! let response = pipeline.print_receipt(&receipt, &PrintOptions {
//!     printer_name: Some("POS-58".into()),
//!     ..Default::default()
//! }).await;
//! if !response.success {
//!     eprintln!("print failed: {}", response.result.message);
//! }
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod fallback;
pub mod facade;
pub mod render;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-exports
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use executor::PrintJobExecutor;
pub use facade::PrintPipeline;
pub use fallback::FallbackPipeline;
pub use render::{CurrencyFormat, ReceiptRenderer, TicketBuilder};
pub use types::{
    ListPrintersResponse, PaymentInfo, PdfExportResponse, PrintAttempt, PrintOptions,
    PrintOutcome, PrintReport, PrintRequest, PrintResponse, PrintStrategy, ReceiptData,
    ReceiptItem, ReceiptPrintResponse, StoreInfo,
};

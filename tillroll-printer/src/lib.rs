//! # tillroll-printer
//!
//! Low-level printing mechanics for thermal receipt printers.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - Printer discovery (native OS API with a shell-command fallback)
//! - Printer name resolution against the discovered list
//! - Silent job submission through the OS print spooler
//! - Off-screen rendering surfaces for markup and PDF content
//! - Temp file lifecycle for PDF-intermediate print jobs
//!
//! Business logic (WHAT to print: receipt layout, fallback policy) lives
//! in `tillroll-pipeline`.
//!
//! ## Example
//!
//! ```ignore
//! use tillroll_printer::{PrinterResolver, SpoolerSurfaceFactory, SurfaceFactory};
//! use tillroll_printer::surface::{SurfaceContent, SurfacePrintOptions};
//!
//! let resolver = PrinterResolver::with_default_strategies();
//! let target = resolver.resolve(Some("POS-58")).await;
//!
//! let factory = SpoolerSurfaceFactory::default();
//! let mut surface = factory.create().await?;
//! surface.load(SurfaceContent::Markup("TEST PAGE\n".into())).await?;
//! surface.print(&SurfacePrintOptions { printer: target, ..Default::default() }).await?;
//! surface.close().await;
//! ```

mod descriptor;
mod error;
pub mod pdf;
mod resolve;
pub mod spooler;
pub mod viewer;

pub mod discovery;
pub mod surface;
pub mod temp;

// Re-exports
pub use descriptor::{PrinterDescriptor, PrinterStatus};
pub use discovery::{NativeEnumeration, PrinterEnumeration, ShellEnumeration};
pub use error::{PrintError, PrintResult};
pub use resolve::PrinterResolver;
pub use spooler::SpoolJob;
pub use surface::{
    RenderSurface, SpoolerSurface, SpoolerSurfaceFactory, SurfaceContent, SurfaceFactory,
    SurfacePrintOptions,
};
pub use temp::{TempArtifact, TempResourceTracker};

//! Off-screen rendering surfaces
//!
//! A [`RenderSurface`] is a headless context that holds printable content:
//! it is loaded, optionally exported to PDF, printed silently, and closed.
//! The pipeline never touches a concrete surface type: it receives a
//! [`SurfaceFactory`] at construction time, which keeps the print flow
//! testable and free of process-global window state.

use crate::error::{PrintError, PrintResult};
use crate::pdf::{self, PageSpec};
use crate::spooler::{self, SpoolJob};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// Content loadable into a surface
#[derive(Debug, Clone)]
pub enum SurfaceContent {
    /// Fixed-width ticket markup
    Markup(String),
    /// A PDF file on disk (the PDF-intermediate fallback path)
    PdfFile(PathBuf),
}

/// Options for one silent print submission from a surface
#[derive(Debug, Clone)]
pub struct SurfacePrintOptions {
    /// Target printer; `None` submits to the system default
    pub printer: Option<String>,
    pub copies: u32,
    /// Silent submission (no OS dialog); the spooler path is always silent
    pub silent: bool,
    /// Content scale as an integer percentage
    pub scale_percent: u32,
    /// Document name shown in the print queue
    pub doc_name: String,
}

impl Default for SurfacePrintOptions {
    fn default() -> Self {
        Self {
            printer: None,
            copies: 1,
            silent: true,
            scale_percent: 100,
            doc_name: "receipt".to_string(),
        }
    }
}

/// A headless renderable context for one print attempt
///
/// Exclusively owned by the attempt that created it; must be closed on
/// every exit path.
#[async_trait]
pub trait RenderSurface: Send {
    /// Load content; resolves once the content is fully laid out
    async fn load(&mut self, content: SurfaceContent) -> PrintResult<()>;

    /// Submit the loaded content to the printer, silently
    async fn print(&mut self, options: &SurfacePrintOptions) -> PrintResult<()>;

    /// Export the loaded content as PDF bytes
    async fn export_pdf(&mut self) -> PrintResult<Vec<u8>>;

    /// Release the surface; safe to call once on any path
    async fn close(&mut self);
}

/// Creates surfaces on demand
#[async_trait]
pub trait SurfaceFactory: Send + Sync {
    async fn create(&self) -> PrintResult<Box<dyn RenderSurface>>;
}

// === Production implementation ===

/// Surface backed by the OS print spooler
///
/// Markup layout is performed in-process, so the load signal resolves as
/// soon as the content is stored; printing typesets or forwards the
/// content through [`spooler`].
pub struct SpoolerSurface {
    content: Option<SurfaceContent>,
    page: PageSpec,
    closed: bool,
}

impl SpoolerSurface {
    pub fn new(page: PageSpec) -> Self {
        Self {
            content: None,
            page,
            closed: false,
        }
    }
}

#[async_trait]
impl RenderSurface for SpoolerSurface {
    async fn load(&mut self, content: SurfaceContent) -> PrintResult<()> {
        if self.closed {
            return Err(PrintError::SurfaceClosed);
        }
        self.content = Some(content);
        Ok(())
    }

    async fn print(&mut self, options: &SurfacePrintOptions) -> PrintResult<()> {
        if self.closed {
            return Err(PrintError::SurfaceClosed);
        }
        if !options.silent {
            // The spooler has no dialog to show; submission stays silent
            debug!("non-silent print requested, submitting silently anyway");
        }
        if options.scale_percent != 100 {
            debug!(
                scale = options.scale_percent,
                "scale hint not applicable to raw spooler submission"
            );
        }

        let job = SpoolJob::new(
            options.printer.as_deref(),
            &options.doc_name,
            options.copies,
        );

        match &self.content {
            None => Err(PrintError::InvalidConfig(
                "no content loaded into surface".to_string(),
            )),
            Some(SurfaceContent::Markup(markup)) => {
                spooler::submit_bytes(&job, markup.as_bytes()).await
            }
            Some(SurfaceContent::PdfFile(path)) => spooler::submit_path(&job, path).await,
        }
    }

    async fn export_pdf(&mut self) -> PrintResult<Vec<u8>> {
        if self.closed {
            return Err(PrintError::SurfaceClosed);
        }
        match &self.content {
            None => Err(PrintError::InvalidConfig(
                "no content loaded into surface".to_string(),
            )),
            Some(SurfaceContent::Markup(markup)) => pdf::render_markup(markup, &self.page),
            Some(SurfaceContent::PdfFile(path)) => Ok(tokio::fs::read(path).await?),
        }
    }

    async fn close(&mut self) {
        self.content = None;
        self.closed = true;
    }
}

/// Factory for [`SpoolerSurface`]
#[derive(Debug, Clone, Default)]
pub struct SpoolerSurfaceFactory {
    page: PageSpec,
}

impl SpoolerSurfaceFactory {
    pub fn new(page: PageSpec) -> Self {
        Self { page }
    }
}

#[async_trait]
impl SurfaceFactory for SpoolerSurfaceFactory {
    async fn create(&self) -> PrintResult<Box<dyn RenderSurface>> {
        Ok(Box::new(SpoolerSurface::new(self.page.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_closed_surface_rejects_operations() {
        let mut surface = SpoolerSurface::new(PageSpec::default());
        surface.close().await;

        let load = surface.load(SurfaceContent::Markup("X\n".into())).await;
        assert!(matches!(load, Err(PrintError::SurfaceClosed)));

        let export = surface.export_pdf().await;
        assert!(matches!(export, Err(PrintError::SurfaceClosed)));
    }

    #[tokio::test]
    async fn test_print_without_load_is_invalid() {
        let mut surface = SpoolerSurface::new(PageSpec::default());
        let result = surface.print(&SurfacePrintOptions::default()).await;
        assert!(matches!(result, Err(PrintError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_export_pdf_from_markup() {
        let mut surface = SpoolerSurface::new(PageSpec::default());
        surface
            .load(SurfaceContent::Markup("RECEIPT\nTOTAL 1.000\n".into()))
            .await
            .unwrap();
        let bytes = surface.export_pdf().await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        surface.close().await;
    }
}

//! Print job execution through an off-screen surface
//!
//! One attempt = one surface. The surface is created, loaded with a
//! bounded wait, given a short settle delay, printed silently, and closed.
//! Closing happens exactly once on every exit path; a load signal that
//! never fires forces the print submission rather than hanging the
//! pipeline.

use crate::types::{PrintAttempt, PrintStrategy};
use std::sync::Arc;
use std::time::Duration;
use tillroll_printer::surface::{RenderSurface, SurfaceContent, SurfaceFactory, SurfacePrintOptions};
use tillroll_printer::{PrintError, PrintResult};
use tracing::{info, instrument, warn};

/// Executes single print attempts against rendering surfaces
pub struct PrintJobExecutor {
    factory: Arc<dyn SurfaceFactory>,
    load_timeout: Duration,
    settle_delay: Duration,
}

impl PrintJobExecutor {
    pub fn new(factory: Arc<dyn SurfaceFactory>, load_timeout: Duration, settle_delay: Duration) -> Self {
        Self {
            factory,
            load_timeout,
            settle_delay,
        }
    }

    /// Run one attempt and record its outcome
    ///
    /// Never returns an error: submission problems become the attempt's
    /// failure reason so the fallback chain can decide what happens next.
    #[instrument(skip(self, content), fields(strategy = %strategy, printer = ?options.printer))]
    pub async fn execute(
        &self,
        strategy: PrintStrategy,
        content: SurfaceContent,
        options: &SurfacePrintOptions,
    ) -> PrintAttempt {
        let mut surface = match self.factory.create().await {
            Ok(surface) => surface,
            Err(e) => {
                warn!(error = %e, "surface creation failed");
                return PrintAttempt::failure(strategy, format!("surface creation failed: {}", e));
            }
        };

        let outcome = self.drive(surface.as_mut(), content, options).await;
        // The one place the surface dies, no matter how the attempt went
        surface.close().await;

        match outcome {
            Ok(()) => {
                info!("print attempt succeeded");
                PrintAttempt::success(strategy)
            }
            Err(e) => {
                warn!(error = %e, "print attempt failed");
                PrintAttempt::failure(strategy, e.to_string())
            }
        }
    }

    async fn drive(
        &self,
        surface: &mut dyn RenderSurface,
        content: SurfaceContent,
        options: &SurfacePrintOptions,
    ) -> PrintResult<()> {
        match tokio::time::timeout(self.load_timeout, surface.load(content)).await {
            Ok(Ok(())) => {
                // Load-complete can fire before layout settles
                tokio::time::sleep(self.settle_delay).await;
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                warn!(
                    timeout_ms = self.load_timeout.as_millis() as u64,
                    "content load signal never fired, forcing print submission"
                );
            }
        }

        surface.print(options).await
    }

    /// Load markup into a fresh surface and export it as PDF bytes
    ///
    /// The surface is closed on every path, same as for printing.
    #[instrument(skip(self, markup), fields(markup_len = markup.len()))]
    pub async fn export_pdf(&self, markup: &str) -> PrintResult<Vec<u8>> {
        let mut surface = self.factory.create().await?;

        let result = async {
            tokio::time::timeout(
                self.load_timeout,
                surface.load(SurfaceContent::Markup(markup.to_string())),
            )
            .await
            .map_err(|_| {
                PrintError::Timeout("content load timed out before PDF export".to_string())
            })??;
            surface.export_pdf().await
        }
        .await;

        surface.close().await;
        result
    }
}

//! Fallback escalation
//!
//! Linear chain, each stage at most once per request, stopping at the
//! first success:
//!
//! 1. direct print against the resolved printer
//! 2. retry against the system default (only when a specific printer was
//!    requested)
//! 3. PDF intermediate: export, write to a temp file, print that file
//!    through a second surface (some thermal drivers refuse markup jobs
//!    but accept PDF pagination)
//!
//! Opening the OS viewer is the explicit last resort, reached
//! automatically only when the PDF export itself fails; otherwise callers
//! invoke it as its own operation.

use crate::error::PipelineResult;
use crate::executor::PrintJobExecutor;
use crate::types::{PrintAttempt, PrintReport, PrintRequest, PrintStrategy};
use std::sync::Arc;
use std::time::Duration;
use tillroll_printer::surface::{SurfaceContent, SurfacePrintOptions};
use tillroll_printer::{PrinterResolver, TempResourceTracker, viewer};
use tracing::{info, instrument, warn};

pub struct FallbackPipeline {
    executor: PrintJobExecutor,
    resolver: Arc<PrinterResolver>,
    temp: TempResourceTracker,
    viewer_grace: Duration,
}

impl FallbackPipeline {
    pub fn new(
        executor: PrintJobExecutor,
        resolver: Arc<PrinterResolver>,
        temp: TempResourceTracker,
        viewer_grace: Duration,
    ) -> Self {
        Self {
            executor,
            resolver,
            temp,
            viewer_grace,
        }
    }

    fn options_for(&self, request: &PrintRequest, printer: Option<String>) -> SurfacePrintOptions {
        SurfacePrintOptions {
            printer,
            copies: request.copies,
            silent: request.silent,
            scale_percent: request.scale_percent,
            doc_name: format!("tillroll-{}", request.id),
        }
    }

    /// Run one attempt with the resolved printer, no escalation
    pub async fn print_direct_only(&self, request: &PrintRequest) -> PrintAttempt {
        let resolved = self.resolver.resolve(request.printer_name.as_deref()).await;
        self.executor
            .execute(
                PrintStrategy::Direct,
                SurfaceContent::Markup(request.markup.clone()),
                &self.options_for(request, resolved),
            )
            .await
    }

    /// Run the escalation chain to a terminal report
    #[instrument(skip(self, request), fields(request_id = %request.id, printer = ?request.printer_name))]
    pub async fn print_with_fallback(&self, request: &PrintRequest) -> PrintReport {
        let mut attempts: Vec<PrintAttempt> = Vec::new();

        // Stage 1: direct
        let resolved = self.resolver.resolve(request.printer_name.as_deref()).await;
        let had_specific_printer = resolved.is_some();
        let attempt = self
            .executor
            .execute(
                PrintStrategy::Direct,
                SurfaceContent::Markup(request.markup.clone()),
                &self.options_for(request, resolved),
            )
            .await;
        let succeeded = attempt.is_success();
        attempts.push(attempt);
        if succeeded {
            return PrintReport::succeeded(PrintStrategy::Direct, attempts);
        }

        // Stage 2: retry on the system default, only if a specific printer
        // was in play
        if had_specific_printer {
            info!("direct print failed, retrying on system default");
            let attempt = self
                .executor
                .execute(
                    PrintStrategy::DefaultFallback,
                    SurfaceContent::Markup(request.markup.clone()),
                    &self.options_for(request, None),
                )
                .await;
            let succeeded = attempt.is_success();
            attempts.push(attempt);
            if succeeded {
                return PrintReport::succeeded(PrintStrategy::DefaultFallback, attempts);
            }
        }

        // Stage 3: PDF intermediate
        info!("escalating to PDF-intermediate print");
        match self.executor.export_pdf(&request.markup).await {
            Ok(pdf_bytes) => {
                let attempt = self.print_pdf_bytes(request, &pdf_bytes).await;
                let succeeded = attempt.is_success();
                attempts.push(attempt);
                if succeeded {
                    return PrintReport::succeeded(PrintStrategy::PdfIntermediate, attempts);
                }
            }
            Err(e) => {
                // Export failure is distinct from print failure: nothing
                // printable exists yet, so hand off to the operator
                warn!(error = %e, "PDF export failed, escalating to external viewer");
                attempts.push(PrintAttempt::failure(
                    PrintStrategy::PdfIntermediate,
                    format!("pdf export failed: {}", e),
                ));
                let attempt = self.open_in_viewer(request).await;
                let succeeded = attempt.is_success();
                attempts.push(attempt);
                if succeeded {
                    return PrintReport::succeeded(PrintStrategy::ExternalViewer, attempts);
                }
            }
        }

        warn!(attempts = attempts.len(), "all print strategies exhausted");
        PrintReport::exhausted(attempts)
    }

    /// Print exported PDF bytes through a scoped temp file
    ///
    /// The temp PDF is deleted immediately after the attempt, success or
    /// not.
    async fn print_pdf_bytes(&self, request: &PrintRequest, pdf_bytes: &[u8]) -> PrintAttempt {
        let resolved = self.resolver.resolve(request.printer_name.as_deref()).await;
        let options = self.options_for(request, resolved);
        let executor = &self.executor;

        let result = self
            .temp
            .with_temp_file(&request.id, "pdf", pdf_bytes, |path| async move {
                Ok(executor
                    .execute(
                        PrintStrategy::PdfIntermediate,
                        SurfaceContent::PdfFile(path),
                        &options,
                    )
                    .await)
            })
            .await;

        match result {
            Ok(attempt) => attempt,
            Err(e) => PrintAttempt::failure(
                PrintStrategy::PdfIntermediate,
                format!("temp file handling failed: {}", e),
            ),
        }
    }

    /// Last resort: write a PDF and open it in the OS default viewer
    ///
    /// "Opened" counts as success; the pipeline can no longer observe
    /// completion, the operator triggers the physical print. The temp file
    /// is deleted after a grace period instead of immediately, since the
    /// viewer needs time to open it.
    #[instrument(skip(self, request), fields(request_id = %request.id))]
    pub async fn open_in_viewer(&self, request: &PrintRequest) -> PrintAttempt {
        match self.export_for_viewer(request).await {
            Ok(path) => {
                info!(path = %path.display(), "receipt handed to external viewer");
                PrintAttempt::success(PrintStrategy::ExternalViewer)
            }
            Err(e) => PrintAttempt::failure(PrintStrategy::ExternalViewer, e.to_string()),
        }
    }

    /// Export a PDF with deferred deletion and hand it to the viewer,
    /// returning the path it lives at for the grace period
    pub async fn export_for_viewer(
        &self,
        request: &PrintRequest,
    ) -> PipelineResult<std::path::PathBuf> {
        let pdf_bytes = self.executor.export_pdf(&request.markup).await?;

        let path = self
            .temp
            .write_deferred(&request.id, "pdf", &pdf_bytes, self.viewer_grace)
            .await?;

        viewer::open_with_default_handler(&path).await?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockFactory, SurfaceBehavior};
    use crate::types::{PrintOptions, PrintOutcome};
    use tillroll_printer::surface::SurfaceFactory;

    fn pipeline(factory: &Arc<MockFactory>) -> FallbackPipeline {
        // Resolver with no strategies: discovery is empty, names pass
        // through untouched
        let resolver = Arc::new(PrinterResolver::new(Vec::new()));
        let executor = PrintJobExecutor::new(
            factory.clone() as Arc<dyn SurfaceFactory>,
            Duration::from_secs(5),
            Duration::from_secs(1),
        );
        FallbackPipeline::new(
            executor,
            resolver,
            TempResourceTracker::new(),
            Duration::from_millis(50),
        )
    }

    fn named_request() -> PrintRequest {
        PrintRequest::new(
            "RECEIPT\nTOTAL Rp 1.000\n",
            &PrintOptions {
                printer_name: Some("POS-58".to_string()),
                ..Default::default()
            },
        )
    }

    fn unnamed_request() -> PrintRequest {
        PrintRequest::new("RECEIPT\nTOTAL Rp 1.000\n", &PrintOptions::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_direct_success_is_terminal() {
        let factory = MockFactory::with_behaviors(vec![SurfaceBehavior::default()]);
        let report = pipeline(&factory).print_with_fallback(&named_request()).await;

        assert!(report.success);
        assert_eq!(report.strategy_used, Some(PrintStrategy::Direct));
        assert_eq!(report.attempts.len(), 1);
        assert_eq!(factory.created(), 1);
        assert_eq!(factory.closed(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_direct_failure_retries_on_default() {
        let factory = MockFactory::with_behaviors(vec![
            SurfaceBehavior {
                fail_print: Some("no printer found"),
                ..Default::default()
            },
            SurfaceBehavior::default(),
        ]);
        let report = pipeline(&factory).print_with_fallback(&named_request()).await;

        assert!(report.success);
        assert_eq!(report.strategy_used, Some(PrintStrategy::DefaultFallback));
        // Exactly two attempts: direct failed, default succeeded
        assert_eq!(report.attempts.len(), 2);
        assert_eq!(report.attempts[0].strategy, PrintStrategy::Direct);
        assert_eq!(report.attempts[0].outcome, PrintOutcome::Failure);
        assert_eq!(report.attempts[1].strategy, PrintStrategy::DefaultFallback);

        // The retry cleared the printer name
        let prints = factory.prints();
        assert_eq!(prints[0].printer.as_deref(), Some("POS-58"));
        assert_eq!(prints[1].printer, None);
        assert_eq!(factory.closed(), factory.created());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_default_retry_without_specific_printer() {
        let factory = MockFactory::with_behaviors(vec![
            // direct fails, then export surface ok, then pdf print ok
            SurfaceBehavior {
                fail_print: Some("driver error"),
                ..Default::default()
            },
            SurfaceBehavior::default(),
            SurfaceBehavior::default(),
        ]);
        let report = pipeline(&factory)
            .print_with_fallback(&unnamed_request())
            .await;

        assert!(report.success);
        assert_eq!(report.strategy_used, Some(PrintStrategy::PdfIntermediate));
        // direct, pdfIntermediate; no defaultFallback in between
        assert_eq!(report.attempts.len(), 2);
        assert_eq!(report.attempts[1].strategy, PrintStrategy::PdfIntermediate);

        // The PDF print went through a file
        let prints = factory.prints();
        assert!(prints.last().unwrap().content_was_pdf);
    }

    #[tokio::test(start_paused = true)]
    async fn test_strict_order_and_exhaustion() {
        let factory = MockFactory::with_behaviors(vec![
            SurfaceBehavior {
                fail_print: Some("direct failed"),
                ..Default::default()
            },
            SurfaceBehavior {
                fail_print: Some("default failed"),
                ..Default::default()
            },
            SurfaceBehavior::default(), // export surface
            SurfaceBehavior {
                fail_print: Some("pdf print failed"),
                ..Default::default()
            },
        ]);
        let report = pipeline(&factory).print_with_fallback(&named_request()).await;

        assert!(!report.success);
        assert_eq!(report.strategy_used, None);
        let strategies: Vec<_> = report.attempts.iter().map(|a| a.strategy).collect();
        assert_eq!(
            strategies,
            vec![
                PrintStrategy::Direct,
                PrintStrategy::DefaultFallback,
                PrintStrategy::PdfIntermediate,
            ]
        );
        assert!(report.message.contains("pdf print failed"));
        // Four surfaces lived, four died
        assert_eq!(factory.created(), 4);
        assert_eq!(factory.closed(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_export_failure_escalates_to_viewer() {
        let factory = MockFactory::with_behaviors(vec![
            SurfaceBehavior {
                fail_print: Some("direct failed"),
                ..Default::default()
            },
            SurfaceBehavior {
                fail_print: Some("default failed"),
                ..Default::default()
            },
            // export surface fails to export; the viewer path re-exports
            // and fails the same way
            SurfaceBehavior {
                fail_export: Some("export broken"),
                ..Default::default()
            },
            SurfaceBehavior {
                fail_export: Some("export broken"),
                ..Default::default()
            },
        ]);
        let report = pipeline(&factory).print_with_fallback(&named_request()).await;

        assert!(!report.success);
        let strategies: Vec<_> = report.attempts.iter().map(|a| a.strategy).collect();
        assert_eq!(
            strategies,
            vec![
                PrintStrategy::Direct,
                PrintStrategy::DefaultFallback,
                PrintStrategy::PdfIntermediate,
                PrintStrategy::ExternalViewer,
            ]
        );
        assert_eq!(factory.closed(), factory.created());
    }

    #[tokio::test(start_paused = true)]
    async fn test_direct_only_makes_single_attempt() {
        let factory = MockFactory::with_behaviors(vec![SurfaceBehavior {
            fail_print: Some("offline"),
            ..Default::default()
        }]);
        let attempt = pipeline(&factory).print_direct_only(&named_request()).await;

        assert_eq!(attempt.outcome, PrintOutcome::Failure);
        assert_eq!(factory.created(), 1);
        assert_eq!(factory.closed(), 1);
    }
}

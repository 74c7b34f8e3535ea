//! Caller-facing print pipeline
//!
//! The one entry point the rest of the application talks to. Composes the
//! resolver, renderer, executor, and fallback chain, and returns uniform
//! terminal results: the caller only ever sees a success flag plus a
//! diagnostic string, never a low-level OS error.
//!
//! Requests are processed one at a time. Interleaved submissions confuse
//! stateful thermal printer drivers, so a request holds the pipeline gate
//! through its whole fallback chain; concurrent callers queue behind it.

use crate::config::PipelineConfig;
use crate::executor::PrintJobExecutor;
use crate::fallback::FallbackPipeline;
use crate::render::ReceiptRenderer;
use crate::types::{
    ListPrintersResponse, PdfExportResponse, PrintOptions, PrintRequest, PrintResponse,
    PrintStrategy, ReceiptData, ReceiptPrintResponse,
};
use std::sync::Arc;
use tillroll_printer::surface::SurfaceFactory;
use tillroll_printer::{
    PrinterResolver, SpoolerSurfaceFactory, TempResourceTracker, pdf::PageSpec,
};
use tracing::{info, instrument};

pub struct PrintPipeline {
    fallback: FallbackPipeline,
    resolver: Arc<PrinterResolver>,
    config: PipelineConfig,
    /// Serializes requests; held across a request's whole fallback chain
    gate: tokio::sync::Mutex<()>,
}

impl PrintPipeline {
    /// Compose a pipeline from injected parts
    ///
    /// The surface factory is handed in rather than read from global
    /// state, so tests and embedders control the rendering backend.
    pub fn new(
        factory: Arc<dyn SurfaceFactory>,
        resolver: Arc<PrinterResolver>,
        config: PipelineConfig,
    ) -> Self {
        let executor =
            PrintJobExecutor::new(factory, config.load_timeout(), config.settle_delay());
        let fallback = FallbackPipeline::new(
            executor,
            resolver.clone(),
            TempResourceTracker::new(),
            config.viewer_grace(),
        );
        Self {
            fallback,
            resolver,
            config,
            gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Production wiring: spooler-backed surfaces, native-then-shell
    /// printer discovery
    pub fn with_spooler(config: PipelineConfig) -> Self {
        let page = if config.paper_width > 32 {
            PageSpec::wide()
        } else {
            PageSpec::default()
        };
        Self::new(
            Arc::new(SpoolerSurfaceFactory::new(page)),
            Arc::new(PrinterResolver::with_default_strategies()),
            config,
        )
    }

    /// Enumerate printers, fresh on every call
    #[instrument(skip(self))]
    pub async fn list_printers(&self) -> ListPrintersResponse {
        ListPrintersResponse {
            printers: self.resolver.discover().await,
        }
    }

    /// Single direct print of caller-supplied markup, no fallback
    #[instrument(skip(self, markup), fields(markup_len = markup.len()))]
    pub async fn print_direct(
        &self,
        markup: &str,
        printer_name: Option<String>,
        copies: Option<u32>,
        scale_percent: Option<u32>,
    ) -> PrintResponse {
        if markup.trim().is_empty() {
            return PrintResponse {
                success: false,
                message: "markup is empty".to_string(),
            };
        }

        let options = PrintOptions {
            printer_name,
            copies: copies.unwrap_or(1),
            scale_percent: scale_percent.unwrap_or(100),
            silent: true,
        };
        let request = PrintRequest::new(markup, &options);

        let _guard = self.gate.lock().await;
        let attempt = self.fallback.print_direct_only(&request).await;
        PrintResponse {
            success: attempt.is_success(),
            message: attempt
                .reason
                .unwrap_or_else(|| format!("printed via {}", PrintStrategy::Direct)),
        }
    }

    /// Print caller-supplied markup through the full fallback chain
    #[instrument(skip(self, markup), fields(markup_len = markup.len()))]
    pub async fn print_receipt_content(
        &self,
        markup: &str,
        options: &PrintOptions,
    ) -> PrintResponse {
        if markup.trim().is_empty() {
            return PrintResponse {
                success: false,
                message: "markup is empty".to_string(),
            };
        }

        let request = PrintRequest::new(markup, options);
        let _guard = self.gate.lock().await;
        let report = self.fallback.print_with_fallback(&request).await;
        PrintResponse {
            success: report.success,
            message: report.message,
        }
    }

    /// Render a receipt and print it through the full fallback chain
    #[instrument(skip(self, receipt, options), fields(order_id = %receipt.order_id))]
    pub async fn print_receipt(
        &self,
        receipt: &ReceiptData,
        options: &PrintOptions,
    ) -> ReceiptPrintResponse {
        let markup = match ReceiptRenderer::new(receipt, self.config.paper_width)
            .with_currency(self.config.currency())
            .render()
        {
            Ok(markup) => markup,
            Err(e) => {
                // Rejected before any printer interaction
                return ReceiptPrintResponse {
                    success: false,
                    method: None,
                    result: crate::types::PrintReport::rejected(e.to_string()),
                };
            }
        };

        let request = PrintRequest::new(markup, options);
        let _guard = self.gate.lock().await;
        info!(request_id = %request.id, "receipt print request accepted");
        let report = self.fallback.print_with_fallback(&request).await;
        ReceiptPrintResponse {
            success: report.success,
            method: report.strategy_used.map(|s| s.as_str().to_string()),
            result: report,
        }
    }

    /// Render a receipt to PDF and hand it to the OS default viewer
    ///
    /// The explicit last-resort operation: success means "opened", the
    /// operator triggers the physical print from the viewer.
    #[instrument(skip(self, receipt), fields(order_id = %receipt.order_id))]
    pub async fn print_receipt_pdf(&self, receipt: &ReceiptData) -> PdfExportResponse {
        let method = PrintStrategy::ExternalViewer.as_str().to_string();

        let markup = match ReceiptRenderer::new(receipt, self.config.paper_width)
            .with_currency(self.config.currency())
            .render()
        {
            Ok(markup) => markup,
            Err(e) => {
                return PdfExportResponse {
                    success: false,
                    method,
                    pdf_path: None,
                    message: e.to_string(),
                };
            }
        };

        let request = PrintRequest::new(markup, &PrintOptions::default());
        let _guard = self.gate.lock().await;
        match self.fallback.export_for_viewer(&request).await {
            Ok(path) => PdfExportResponse {
                success: true,
                method,
                pdf_path: Some(path.display().to_string()),
                message: "receipt opened in external viewer".to_string(),
            },
            Err(e) => PdfExportResponse {
                success: false,
                method,
                pdf_path: None,
                message: e.to_string(),
            },
        }
    }
}

//! Print pipeline data structures
//!
//! Receipt payloads, print requests, and the attempt/report audit types
//! returned to the caller.

use serde::{Deserialize, Serialize};

/// Store information for the receipt header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreInfo {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// One receipt line item
///
/// Amounts are integer currency units (no decimals on thermal receipts).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptItem {
    pub name: String,
    pub quantity: u32,
    pub unit_price: i64,
    pub total: i64,
}

/// Payment block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub method: String,
    pub paid: i64,
    pub change: i64,
}

/// Receipt payload handed in by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptData {
    pub store: StoreInfo,
    pub order_id: String,
    /// Caller-formatted date/time string
    pub timestamp: String,
    pub cashier: Option<String>,
    pub customer: Option<String>,
    pub items: Vec<ReceiptItem>,
    pub subtotal: i64,
    #[serde(default)]
    pub discount: i64,
    pub total: i64,
    pub payment: Option<PaymentInfo>,
    #[serde(default)]
    pub footer: Vec<String>,
}

/// Caller-facing print options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintOptions {
    pub printer_name: Option<String>,
    #[serde(default = "default_copies")]
    pub copies: u32,
    #[serde(default = "default_silent")]
    pub silent: bool,
    #[serde(default = "default_scale")]
    pub scale_percent: u32,
}

fn default_copies() -> u32 {
    1
}

fn default_silent() -> bool {
    true
}

fn default_scale() -> u32 {
    100
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            printer_name: None,
            copies: default_copies(),
            silent: default_silent(),
            scale_percent: default_scale(),
        }
    }
}

/// One print request flowing through the pipeline
///
/// Treated as immutable once built; receipt payloads are rendered to
/// markup before the request is constructed.
#[derive(Debug, Clone)]
pub struct PrintRequest {
    /// Unique id, used as the owner tag on temp artifacts
    pub id: String,
    pub markup: String,
    pub printer_name: Option<String>,
    pub copies: u32,
    pub scale_percent: u32,
    pub silent: bool,
}

impl PrintRequest {
    pub fn new(markup: impl Into<String>, options: &PrintOptions) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            markup: markup.into(),
            printer_name: options.printer_name.clone(),
            copies: options.copies.max(1),
            scale_percent: options.scale_percent,
            silent: options.silent,
        }
    }
}

/// Fallback strategies, in escalation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrintStrategy {
    Direct,
    DefaultFallback,
    PdfIntermediate,
    ExternalViewer,
}

impl PrintStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::DefaultFallback => "defaultFallback",
            Self::PdfIntermediate => "pdfIntermediate",
            Self::ExternalViewer => "externalViewer",
        }
    }
}

impl std::fmt::Display for PrintStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintOutcome {
    Success,
    Failure,
}

/// One entry in a request's audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintAttempt {
    pub strategy: PrintStrategy,
    pub outcome: PrintOutcome,
    pub reason: Option<String>,
}

impl PrintAttempt {
    pub fn success(strategy: PrintStrategy) -> Self {
        Self {
            strategy,
            outcome: PrintOutcome::Success,
            reason: None,
        }
    }

    pub fn failure(strategy: PrintStrategy, reason: impl Into<String>) -> Self {
        Self {
            strategy,
            outcome: PrintOutcome::Failure,
            reason: Some(reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == PrintOutcome::Success
    }
}

/// Terminal result of one print request
///
/// Every request produces exactly one of these; the attempts vector is the
/// ordered audit trail of the fallback chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintReport {
    pub success: bool,
    pub strategy_used: Option<PrintStrategy>,
    pub attempts: Vec<PrintAttempt>,
    pub message: String,
}

impl PrintReport {
    pub fn succeeded(strategy: PrintStrategy, attempts: Vec<PrintAttempt>) -> Self {
        Self {
            success: true,
            strategy_used: Some(strategy),
            message: format!("printed via {}", strategy),
            attempts,
        }
    }

    pub fn exhausted(attempts: Vec<PrintAttempt>) -> Self {
        let message = attempts
            .iter()
            .rev()
            .find_map(|a| a.reason.clone())
            .unwrap_or_else(|| "all print strategies failed".to_string());
        Self {
            success: false,
            strategy_used: None,
            attempts,
            message,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            strategy_used: None,
            attempts: Vec::new(),
            message: message.into(),
        }
    }

    /// Result-shaped view for callers that prefer `?` over flag checks
    pub fn into_result(self) -> crate::error::PipelineResult<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(crate::error::PipelineError::Exhausted {
                last_reason: self.message.clone(),
            })
        }
    }
}

// === Operation response shapes ===

/// Response of `list_printers`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPrintersResponse {
    pub printers: Vec<tillroll_printer::PrinterDescriptor>,
}

/// Response of `print_direct` and `print_receipt_content`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintResponse {
    pub success: bool,
    pub message: String,
}

/// Response of `print_receipt`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptPrintResponse {
    pub success: bool,
    /// Strategy that completed the job, when one did
    pub method: Option<String>,
    pub result: PrintReport,
}

/// Response of `print_receipt_pdf`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfExportResponse {
    pub success: bool,
    pub method: String,
    pub pdf_path: Option<String>,
    pub message: String,
}

//! Receipt rendering
//!
//! Turns a [`ReceiptData`] into fixed-width ticket markup sized for a
//! thermal roll (32 columns on 58mm paper). Column math uses GBK byte
//! widths so CJK product names keep the amount columns aligned on
//! double-width thermal fonts.

use crate::error::{PipelineError, PipelineResult};
use crate::types::ReceiptData;

/// Display width of a string on thermal paper (CJK counts double)
pub fn display_width(s: &str) -> usize {
    let (cow, _, _) = encoding_rs::GBK.encode(s);
    cow.len()
}

/// Truncate to at most `max_width` display columns
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut result = String::new();
    for c in s.chars() {
        let char_str = c.to_string();
        let (cow, _, _) = encoding_rs::GBK.encode(&char_str);
        let char_width = cow.len();
        if width + char_width > max_width {
            break;
        }
        result.push(c);
        width += char_width;
    }
    result
}

/// Pad (or truncate) to exactly `width` display columns
pub fn pad_to_width(s: &str, width: usize, align_right: bool) -> String {
    let current = display_width(s);
    if current >= width {
        return truncate_to_width(s, width);
    }
    let spaces = width - current;
    if align_right {
        format!("{}{}", " ".repeat(spaces), s)
    } else {
        format!("{}{}", s, " ".repeat(spaces))
    }
}

/// Currency presentation for rendered amounts
///
/// Amounts are integer currency units; a single fixed locale is enough for
/// the contract, parameterized here so deployments can change it.
#[derive(Debug, Clone)]
pub struct CurrencyFormat {
    pub prefix: String,
    pub thousands_separator: char,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            prefix: "Rp".to_string(),
            thousands_separator: '.',
        }
    }
}

impl CurrencyFormat {
    /// Format an integer amount with thousands separators
    pub fn format(&self, amount: i64) -> String {
        let digits = amount.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(self.thousands_separator);
            }
            grouped.push(c);
        }
        let sign = if amount < 0 { "-" } else { "" };
        if self.prefix.is_empty() {
            format!("{}{}", sign, grouped)
        } else {
            format!("{}{} {}", sign, self.prefix, grouped)
        }
    }
}

/// Fixed-width ticket markup builder
pub struct TicketBuilder {
    buf: String,
    width: usize,
}

impl TicketBuilder {
    pub fn new(width: usize) -> Self {
        Self {
            buf: String::new(),
            width,
        }
    }

    pub fn write(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    pub fn write_line(&mut self, s: &str) {
        self.buf.push_str(s);
        self.buf.push('\n');
    }

    pub fn blank_line(&mut self) {
        self.buf.push('\n');
    }

    /// Center text within the line width
    pub fn text_center(&mut self, s: &str) {
        let w = display_width(s);
        if w >= self.width {
            self.write_line(&truncate_to_width(s, self.width));
            return;
        }
        let left = (self.width - w) / 2;
        self.buf.push_str(&" ".repeat(left));
        self.write_line(s);
    }

    /// Left text and right text on one line, padded apart
    pub fn line_lr(&mut self, left: &str, right: &str) {
        let lw = display_width(left);
        let rw = display_width(right);
        if lw + rw >= self.width {
            self.write_line(&format!("{} {}", left, right));
        } else {
            let spaces = self.width - lw - rw;
            self.write(left);
            self.write(&" ".repeat(spaces));
            self.write_line(right);
        }
    }

    pub fn dash_sep(&mut self) {
        self.write_line(&"-".repeat(self.width));
    }

    pub fn eq_sep(&mut self) {
        self.write_line(&"=".repeat(self.width));
    }

    pub fn finalize(self) -> String {
        self.buf
    }
}

/// Renders one receipt to ticket markup
pub struct ReceiptRenderer<'a> {
    receipt: &'a ReceiptData,
    width: usize,
    currency: CurrencyFormat,
}

impl<'a> ReceiptRenderer<'a> {
    pub fn new(receipt: &'a ReceiptData, width: usize) -> Self {
        Self {
            receipt,
            width,
            currency: CurrencyFormat::default(),
        }
    }

    pub fn with_currency(mut self, currency: CurrencyFormat) -> Self {
        self.currency = currency;
        self
    }

    /// Render to markup
    ///
    /// Rejects payloads that would print a blank or misleading page: an
    /// empty item list or a non-positive total is a hard error, raised
    /// before any printer interaction.
    pub fn render(&self) -> PipelineResult<String> {
        let receipt = self.receipt;

        if receipt.items.is_empty() {
            return Err(PipelineError::RenderValidation(
                "receipt has no line items".to_string(),
            ));
        }
        if receipt.total <= 0 {
            return Err(PipelineError::RenderValidation(format!(
                "receipt total must be positive, got {}",
                receipt.total
            )));
        }

        let mut b = TicketBuilder::new(self.width);

        // Header block
        b.text_center(&receipt.store.name);
        if let Some(address) = &receipt.store.address {
            b.text_center(address);
        }
        if let Some(phone) = &receipt.store.phone {
            b.text_center(&format!("Telp: {}", phone));
        }
        b.dash_sep();

        // Order context
        b.line_lr("Order", &receipt.order_id);
        b.line_lr("Date", &receipt.timestamp);
        if let Some(cashier) = &receipt.cashier {
            b.line_lr("Cashier", cashier);
        }
        if let Some(customer) = &receipt.customer {
            b.line_lr("Customer", customer);
        }
        b.dash_sep();

        // Items: name on its own line, quantity math on the next
        for item in &receipt.items {
            b.write_line(&truncate_to_width(&item.name, self.width));
            let qty_line = format!(
                "  {} x {}",
                item.quantity,
                self.currency.format(item.unit_price)
            );
            b.line_lr(&qty_line, &self.currency.format(item.total));
        }
        b.dash_sep();

        // Totals block
        b.line_lr("Subtotal", &self.currency.format(receipt.subtotal));
        if receipt.discount > 0 {
            b.line_lr("Discount", &self.currency.format(-receipt.discount));
        }
        b.line_lr("TOTAL", &self.currency.format(receipt.total));

        // Payment block
        if let Some(payment) = &receipt.payment {
            b.dash_sep();
            b.line_lr(&payment.method, &self.currency.format(payment.paid));
            b.line_lr("Change", &self.currency.format(payment.change));
        }

        // Footer block
        b.blank_line();
        for line in &receipt.footer {
            b.text_center(line);
        }

        Ok(b.finalize())
    }
}

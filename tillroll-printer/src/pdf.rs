//! Markup-to-PDF typesetting for thermal roll pages
//!
//! Lays fixed-width ticket markup onto a 58mm-wide page using the builtin
//! Courier font, so the PDF paginates the same columns the direct spooler
//! path prints. printpdf's data-oriented API is used: a page is a list of
//! `Op`s serialized through `PdfDocument::save()`.

use crate::error::{PrintError, PrintResult};
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, TextItem,
};
use tracing::{debug, instrument};

/// Physical page geometry for the roll
#[derive(Debug, Clone)]
pub struct PageSpec {
    /// Roll width; 58mm for the standard receipt roll
    pub width_mm: f32,
    /// Side margin, leaving ~54mm of effective print width
    pub margin_mm: f32,
    pub font_size_pt: f32,
    pub line_height_pt: f32,
}

impl Default for PageSpec {
    fn default() -> Self {
        Self {
            width_mm: 58.0,
            margin_mm: 2.0,
            font_size_pt: 7.0,
            line_height_pt: 8.4,
        }
    }
}

impl PageSpec {
    /// 80mm roll variant
    pub fn wide() -> Self {
        Self {
            width_mm: 80.0,
            ..Self::default()
        }
    }
}

/// Typeset markup onto a single roll-shaped page and serialize to PDF bytes
///
/// Receipt rolls are continuous, so the page height grows with the content
/// instead of breaking into multiple pages.
#[instrument(skip(markup, page), fields(markup_len = markup.len()))]
pub fn render_markup(markup: &str, page: &PageSpec) -> PrintResult<Vec<u8>> {
    if markup.trim().is_empty() {
        return Err(PrintError::Pdf("markup is empty".to_string()));
    }

    let lines: Vec<&str> = markup.lines().collect();

    let margin_pt = Mm(page.margin_mm).into_pt().0;
    let content_height_pt = lines.len() as f32 * page.line_height_pt;
    let page_height_pt = content_height_pt + 2.0 * margin_pt;
    // A roll cutter needs a minimum slug length
    let page_height_mm = (page_height_pt * 0.3528).max(40.0);

    let page_w = Mm(page.width_mm);
    let page_h = Mm(page_height_mm);
    let page_h_pt = page_h.into_pt().0;

    let mut ops: Vec<Op> = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let y_pt = page_h_pt - margin_pt - ((idx + 1) as f32 * page.line_height_pt);

        ops.push(Op::StartTextSection);
        ops.push(Op::SetTextCursor {
            pos: Point {
                x: Pt(margin_pt),
                y: Pt(y_pt),
            },
        });
        ops.push(Op::SetFontSizeBuiltinFont {
            size: Pt(page.font_size_pt),
            font: BuiltinFont::Courier,
        });
        ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text((*line).to_string())],
            font: BuiltinFont::Courier,
        });
        ops.push(Op::EndTextSection);
    }

    let mut doc = PdfDocument::new("Receipt");
    doc.with_pages(vec![PdfPage::new(page_w, page_h, ops)]);

    debug!(
        lines = lines.len(),
        page_height_mm, "receipt typeset onto roll page"
    );

    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
    if output.is_empty() {
        return Err(PrintError::Pdf("PDF serialization produced no bytes".to_string()));
    }

    Ok(output)
}

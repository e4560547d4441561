//! # Invoice Document Renderer
//!
//! Turns a loaded [`InvoiceDocument`] into PDF bytes.
//!
//! ## Page Layout (A4, points)
//! ```text
//! ┌───────────────────────────────────────────────┐  842
//! │ COMPANY NAME                    INVOICE       │
//! │ address / email / phone         FAC-...       │
//! │                                 date, status  │
//! │ Bill to:                        Order CMD-... │
//! │ client name, email, address                   │
//! │ ───────────────────────────────────────────── │
//! │ Product         Qty   Unit    Tax     Total   │
//! │ ...             ...   ...     ...     ...     │  (continues on
//! │ ───────────────────────────────────────────── │   next pages)
//! │                         Subtotal (HT)  ...    │
//! │                         Tax            ...    │
//! │                         Total (TTC)    ...    │
//! │ Payment method: ...                           │
//! │ footer                                Page 1/1│
//! └───────────────────────────────────────────────┘  0
//! ```
//!
//! Text uses the built-in Helvetica fonts with `WinAnsiEncoding`, so no font
//! files are embedded. Characters outside that code page print as `?`.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::config::CompanyInfo;
use facture_core::{Money, OrderLine, TaxRate};
use facture_db::InvoiceDocument;

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 50;
const ROW_HEIGHT: i64 = 16;

/// Line rows on the first page, below the header blocks.
const FIRST_PAGE_ROWS: usize = 24;
/// Line rows on continuation pages.
const NEXT_PAGE_ROWS: usize = 40;

// Table column x positions
const COL_NAME: i64 = MARGIN;
const COL_QTY: i64 = 300;
const COL_UNIT: i64 = 350;
const COL_TAX: i64 = 430;
const COL_TOTAL: i64 = 490;

/// Error produced while assembling or serializing the document.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("PDF encoding failed: {0}")]
    Encoding(#[from] lopdf::Error),

    #[error("PDF write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders one invoice as a PDF file.
///
/// ## Arguments
/// * `doc` - Invoice with its order, lines and client
/// * `company` - Seller block printed in the header
/// * `currency` - Currency code appended to every amount
///
/// ## Errors
/// Returns [`PdfError`] if a content stream cannot be encoded or the
/// document cannot be written.
pub fn render_invoice(
    doc: &InvoiceDocument,
    company: &CompanyInfo,
    currency: &str,
) -> Result<Vec<u8>, PdfError> {
    let chunks = paginate(&doc.lines);
    let page_count = chunks.len();

    let mut pdf = Document::with_version("1.5");
    let pages_id = pdf.new_object_id();

    let regular = pdf.add_object(font("Helvetica"));
    let bold = pdf.add_object(font("Helvetica-Bold"));
    let resources_id = pdf.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(page_count);
    for (index, lines) in chunks.iter().enumerate() {
        let mut page = PageWriter::new();
        let first = index == 0;
        let last = index + 1 == page_count;

        let mut y = if first {
            write_header(&mut page, doc, company)
        } else {
            page.text(true, 11, MARGIN, PAGE_HEIGHT - MARGIN, &doc.invoice.invoice_number);
            PAGE_HEIGHT - MARGIN - 2 * ROW_HEIGHT
        };

        y = write_table(&mut page, lines, doc.order.tax_rate(), currency, y);

        if last {
            write_totals(&mut page, doc, currency, y);
        }
        write_footer(&mut page, company, index + 1, page_count);

        let content_id = pdf.add_object(Stream::new(lopdf::Dictionary::new(), page.finish().encode()?));
        let page_id = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    pdf.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => Object::Array(kids),
            "Count" => page_count as i64,
            "Resources" => resources_id,
            "MediaBox" => Object::Array(vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()]),
        }),
    );
    let catalog_id: ObjectId = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = pdf_info(&mut pdf, &doc.invoice.invoice_number, &company.name);
    pdf.trailer.set("Root", catalog_id);
    pdf.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    pdf.save_to(&mut bytes)?;
    Ok(bytes)
}

fn font(base: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

fn pdf_info(pdf: &mut Document, invoice_number: &str, author: &str) -> ObjectId {
    pdf.add_object(dictionary! {
        "Title" => Object::String(encode_text(&format!("Invoice {}", invoice_number)), StringFormat::Literal),
        "Author" => Object::String(encode_text(author), StringFormat::Literal),
        "Producer" => Object::String(b"facture-api".to_vec(), StringFormat::Literal),
    })
}

/// Splits the lines into per-page chunks. Always yields at least one page.
fn paginate(lines: &[OrderLine]) -> Vec<&[OrderLine]> {
    let first_len = lines.len().min(FIRST_PAGE_ROWS);
    let (first, rest) = lines.split_at(first_len);

    let mut chunks = vec![first];
    chunks.extend(rest.chunks(NEXT_PAGE_ROWS));
    chunks
}

// =============================================================================
// Sections
// =============================================================================

/// Writes seller, invoice and client blocks. Returns the y where the table starts.
fn write_header(page: &mut PageWriter, doc: &InvoiceDocument, company: &CompanyInfo) -> i64 {
    let invoice = &doc.invoice;
    let top = PAGE_HEIGHT - MARGIN;

    // Seller, left column
    page.text(true, 16, MARGIN, top, &company.name);
    let mut y = top - 20;
    for detail in [&company.address, &company.email, &company.phone]
        .into_iter()
        .flatten()
    {
        page.text(false, 10, MARGIN, y, detail);
        y -= 13;
    }

    // Invoice identity, right column
    let right = 360;
    page.text(true, 16, right, top, "INVOICE");
    page.text(true, 11, right, top - 20, &invoice.invoice_number);
    page.text(
        false,
        10,
        right,
        top - 34,
        &format!("Date: {}", invoice.invoice_date.format("%Y-%m-%d")),
    );
    page.text(false, 10, right, top - 47, &format!("Status: {}", invoice.status.label()));
    if let Some(paid_at) = invoice.paid_at {
        page.text(
            false,
            10,
            right,
            top - 60,
            &format!("Paid on: {}", paid_at.format("%Y-%m-%d")),
        );
    }
    page.text(
        false,
        10,
        right,
        top - 80,
        &format!("Order: {}", doc.order.order_number),
    );
    page.text(
        false,
        10,
        right,
        top - 93,
        &format!("Order date: {}", doc.order.created_at.format("%Y-%m-%d")),
    );

    // Client block
    let mut y = y.min(top - 120);
    page.text(true, 11, MARGIN, y, "Bill to:");
    y -= 14;
    page.text(false, 10, MARGIN, y, &doc.client.full_name());
    y -= 13;
    page.text(false, 10, MARGIN, y, &doc.client.email);
    if let Some(address) = &doc.client.address {
        for part in address.lines() {
            y -= 13;
            page.text(false, 10, MARGIN, y, part);
        }
    }

    y - 2 * ROW_HEIGHT
}

/// Writes the column headings and one row per line. Returns the y below the table.
fn write_table(
    page: &mut PageWriter,
    lines: &[OrderLine],
    rate: TaxRate,
    currency: &str,
    mut y: i64,
) -> i64 {
    page.text(true, 10, COL_NAME, y, "Product");
    page.text(true, 10, COL_QTY, y, "Qty");
    page.text(true, 10, COL_UNIT, y, "Unit price");
    page.text(true, 10, COL_TAX, y, "Tax");
    page.text(true, 10, COL_TOTAL, y, "Total");
    y -= 6;
    page.rule(y);
    y -= ROW_HEIGHT;

    let rate_label = rate.to_string();
    for line in lines {
        page.text(false, 10, COL_NAME, y, &truncate(&line.product_name, 45));
        page.text(false, 10, COL_QTY, y, &line.quantity.to_string());
        page.text(false, 10, COL_UNIT, y, &amount(line.unit_price(), currency));
        page.text(false, 10, COL_TAX, y, &rate_label);
        page.text(false, 10, COL_TOTAL, y, &amount(line.subtotal(), currency));
        y -= ROW_HEIGHT;
    }

    page.rule(y + ROW_HEIGHT - 6);
    y - 6
}

fn write_totals(page: &mut PageWriter, doc: &InvoiceDocument, currency: &str, mut y: i64) {
    let invoice = &doc.invoice;
    let label_x = COL_UNIT;

    let rows = [
        (false, "Subtotal (HT)".to_string(), invoice.subtotal()),
        (false, format!("Tax ({})", invoice.tax_rate()), invoice.tax()),
        (true, "Total (TTC)".to_string(), invoice.total()),
    ];
    for (bold, label, value) in rows {
        page.text(bold, 10, label_x, y, &label);
        page.text(bold, 10, COL_TOTAL, y, &amount(value, currency));
        y -= ROW_HEIGHT;
    }

    y -= ROW_HEIGHT;
    let method = invoice
        .payment_method
        .map(|m| m.label())
        .unwrap_or("Not specified");
    page.text(false, 10, MARGIN, y, &format!("Payment method: {}", method));

    if let Some(comment) = &invoice.comment {
        y -= ROW_HEIGHT;
        page.text(false, 9, MARGIN, y, &truncate(comment, 90));
    }
}

fn write_footer(page: &mut PageWriter, company: &CompanyInfo, number: usize, count: usize) {
    page.text(
        false,
        8,
        MARGIN,
        MARGIN - 20,
        &format!("{} - Thank you for your business.", company.name),
    );
    page.text(
        false,
        8,
        PAGE_WIDTH - MARGIN - 40,
        MARGIN - 20,
        &format!("Page {}/{}", number, count),
    );
}

// =============================================================================
// Drawing Primitives
// =============================================================================

/// Accumulates content-stream operations for one page.
struct PageWriter {
    operations: Vec<Operation>,
}

impl PageWriter {
    fn new() -> Self {
        PageWriter {
            operations: Vec::new(),
        }
    }

    fn text(&mut self, bold: bool, size: i64, x: i64, y: i64, text: &str) {
        let font = if bold { "F2" } else { "F1" };
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.into(), size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(encode_text(text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ]);
    }

    /// Horizontal line across the printable width.
    fn rule(&mut self, y: i64) {
        self.operations.extend([
            Operation::new("w", vec![Object::Real(0.5)]),
            Operation::new("m", vec![MARGIN.into(), y.into()]),
            Operation::new("l", vec![(PAGE_WIDTH - MARGIN).into(), y.into()]),
            Operation::new("S", vec![]),
        ]);
    }

    fn finish(self) -> Content {
        Content {
            operations: self.operations,
        }
    }
}

fn amount(value: Money, currency: &str) -> String {
    format!("{} {}", value, currency)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

/// Maps text to WinAnsi (CP1252) bytes.
fn encode_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            c if (c as u32) < 0x80 => c as u8,
            c if (0xA0..=0xFF).contains(&(c as u32)) => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

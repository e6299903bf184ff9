use crate::clients::object_storage::{BucketSpec, ObjectStorage};
use crate::models::invoice::{join_seats, InvoiceData};
use crate::utils::error::{AppError, AppResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use std::sync::Arc;
use tracing::{info, warn};

const INVOICE_ISSUER: &str = "CooperBus";
const PDF_CONTENT_TYPE: &str = "application/pdf";

type Rgb = [u8; 3];

const PRIMARY: Rgb = [37, 99, 235];
const TEXT: Rgb = [31, 41, 55];
const LIGHT_GRAY: Rgb = [156, 163, 175];
const TABLE_HEADER: Rgb = [248, 250, 252];
const WHITE: Rgb = [255, 255, 255];

// A4, in millimetres
const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const PT_PER_MM: f32 = 72.0 / 25.4;

#[derive(Debug, Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// Text in WinAnsi. Latin-1 maps one to one, arrows become `->`.
fn encode_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '→' => out.extend_from_slice(b"->"),
            ' '..='~' => out.push(c as u8),
            '\u{a0}'..='\u{ff}' => out.push(c as u32 as u8),
            _ => out.push(b'?'),
        }
    }
    out
}

fn color(rgb: Rgb) -> Vec<Object> {
    rgb.iter()
        .map(|channel| Object::Real(f32::from(*channel) / 255.0))
        .collect()
}

fn x_pt(x: f32) -> Object {
    Object::Real(x * PT_PER_MM)
}

// Layout coordinates run down from the top edge; PDF runs up from the bottom
fn y_pt(y: f32) -> Object {
    Object::Real((PAGE_HEIGHT - y) * PT_PER_MM)
}

/// Collects drawing operations for one page, positioned in millimetres from
/// the top-left corner.
struct Canvas {
    operations: Vec<Operation>,
    font: Font,
    font_size: f32,
    text_color: Rgb,
    fill_color: Rgb,
    draw_color: Rgb,
}

impl Canvas {
    fn new() -> Self {
        Canvas {
            operations: Vec::new(),
            font: Font::Regular,
            font_size: 16.0,
            text_color: [0, 0, 0],
            fill_color: [0, 0, 0],
            draw_color: [0, 0, 0],
        }
    }

    fn set_font(&mut self, font: Font, size: f32) {
        self.font = font;
        self.font_size = size;
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.operations.push(Operation::new("rg", color(self.fill_color)));
        self.operations.push(Operation::new(
            "re",
            vec![
                x_pt(x),
                y_pt(y + h),
                Object::Real(w * PT_PER_MM),
                Object::Real(h * PT_PER_MM),
            ],
        ));
        self.operations.push(Operation::new("f", vec![]));
    }

    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.operations.push(Operation::new("RG", color(self.draw_color)));
        self.operations.push(Operation::new("w", vec![Object::Real(0.57)]));
        self.operations.push(Operation::new("m", vec![x_pt(x1), y_pt(y1)]));
        self.operations.push(Operation::new("l", vec![x_pt(x2), y_pt(y2)]));
        self.operations.push(Operation::new("S", vec![]));
    }

    /// Draws `text` with its baseline at `y`.
    fn text(&mut self, text: &str, x: f32, y: f32) {
        self.operations.push(Operation::new("BT", vec![]));
        self.operations.push(Operation::new("rg", color(self.text_color)));
        self.operations.push(Operation::new(
            "Tf",
            vec![self.font.resource().into(), Object::Real(self.font_size)],
        ));
        self.operations.push(Operation::new("Td", vec![x_pt(x), y_pt(y)]));
        self.operations.push(Operation::new(
            "Tj",
            vec![Object::String(encode_text(text), StringFormat::Literal)],
        ));
        self.operations.push(Operation::new("ET", vec![]));
    }

    /// Builds the document. No ids or clocks are read, so the bytes depend
    /// only on the operations and `created_at`.
    fn into_pdf(self, title: &str, created_at: DateTime<Utc>) -> AppResult<Vec<u8>> {
        let mut doc = Document::with_version("1.4");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
        });

        let content = Content {
            operations: self.operations,
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                Object::Real(PAGE_WIDTH * PT_PER_MM),
                Object::Real(PAGE_HEIGHT * PT_PER_MM),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::String(encode_text(title), StringFormat::Literal),
            "Producer" => Object::string_literal(INVOICE_ISSUER),
            "CreationDate" => Object::string_literal(
                format!("D:{}Z", created_at.format("%Y%m%d%H%M%S"))
            ),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| AppError::DocumentError(e.to_string()))?;
        Ok(bytes)
    }
}

/// Renders the single-page A4 invoice. Output depends only on `data`.
pub fn generate_invoice_pdf(data: &InvoiceData) -> AppResult<Vec<u8>> {
    let mut page = Canvas::new();

    // Header band
    page.fill_color = PRIMARY;
    page.fill_rect(0.0, 0.0, 210.0, 40.0);
    page.text_color = WHITE;
    page.set_font(Font::Bold, 24.0);
    page.text(INVOICE_ISSUER, 20.0, 25.0);
    page.set_font(Font::Regular, 12.0);
    page.text("Bus reservation system", 20.0, 32.0);

    page.text_color = TEXT;
    page.set_font(Font::Bold, 16.0);
    page.text("ELECTRONIC INVOICE", 20.0, 55.0);
    page.set_font(Font::Regular, 10.0);
    page.text(&format!("Invoice #: {}", data.confirmation_code), 20.0, 65.0);
    page.text(&format!("Date: {}", data.created_at.format("%d/%m/%Y")), 20.0, 72.0);
    page.text(&format!("Reservation ID: {}", data.reservation_id), 20.0, 79.0);

    page.set_font(Font::Bold, 12.0);
    page.text("PASSENGER INFORMATION", 20.0, 95.0);
    page.set_font(Font::Regular, 10.0);
    page.text(&format!("Name: {}", data.passenger_name()), 20.0, 105.0);
    page.text(&format!("ID: {}", data.passenger.identification), 20.0, 112.0);
    page.text(&format!("Email: {}", data.passenger.email), 20.0, 119.0);
    page.text(&format!("Phone: {}", data.passenger.phone), 20.0, 126.0);
    page.text(&format!("Address: {}", data.passenger.address), 20.0, 133.0);

    page.set_font(Font::Bold, 12.0);
    page.text("TRIP DETAILS", 20.0, 150.0);
    page.set_font(Font::Regular, 10.0);
    page.text(
        &format!("Route: {} → {}", data.trip.origin, data.trip.destination),
        20.0,
        160.0,
    );
    page.text(
        &format!(
            "Date and time: {} {}",
            data.trip.trip_date.format("%d/%m/%Y"),
            data.trip.departure_time.format("%H:%M")
        ),
        20.0,
        167.0,
    );

    let mut y = 174.0;
    if is_known(&data.trip.bus_number) {
        page.text(&format!("Bus: {}", data.trip.bus_number), 20.0, y);
        y += 7.0;
    }
    if is_known(&data.trip.bus_type) {
        page.text(&format!("Type: {}", data.trip.bus_type), 20.0, y);
        y += 7.0;
    }
    page.text(&format!("Seats: {}", join_seats(&data.seats)), 20.0, y);
    y += 7.0;

    // Pricing table, placed below whatever the trip block printed
    let table = y + 15.0;
    page.set_font(Font::Bold, 12.0);
    page.text("PAYMENT DETAILS", 20.0, table);

    page.fill_color = TABLE_HEADER;
    page.fill_rect(20.0, table + 5.0, 170.0, 10.0);
    page.set_font(Font::Bold, 10.0);
    page.text("Description", 25.0, table + 12.0);
    page.text("Quantity", 120.0, table + 12.0);
    page.text("Unit price", 140.0, table + 12.0);
    page.text("Total", 170.0, table + 12.0);

    page.set_font(Font::Regular, 10.0);
    page.text("Bus ticket", 25.0, table + 22.0);
    page.text(&data.seats.len().to_string(), 125.0, table + 22.0);
    page.text(&format!("${:.2}", data.unit_price()), 145.0, table + 22.0);
    page.text(&format!("${:.2}", data.total), 172.0, table + 22.0);

    page.draw_color = LIGHT_GRAY;
    page.line(20.0, table + 28.0, 190.0, table + 28.0);

    page.set_font(Font::Bold, 12.0);
    page.text("TOTAL DUE:", 120.0, table + 38.0);
    page.set_font(Font::Bold, 14.0);
    page.text(&format!("${:.2}", data.total), 172.0, table + 38.0);

    page.set_font(Font::Regular, 10.0);
    page.text(
        &format!("Payment method: {}", data.payment_method.label()),
        20.0,
        table + 50.0,
    );
    if let Some(last_four) = &data.card_last_four {
        page.text(&format!("Card ending in: ****{}", last_four), 20.0, table + 57.0);
    }

    let footer = table + 80.0;
    page.set_font(Font::Regular, 8.0);
    page.text_color = LIGHT_GRAY;
    page.text("This electronic invoice was generated automatically.", 20.0, footer);
    page.text("For questions, contact our customer service.", 20.0, footer + 5.0);

    page.into_pdf(
        &format!("Invoice {}", data.confirmation_code),
        data.created_at,
    )
}

fn is_known(value: &str) -> bool {
    !value.is_empty() && value != "N/A"
}

pub fn invoice_file_name(reservation_id: i32, created_at: DateTime<Utc>) -> String {
    format!("invoice_{}_{}.pdf", reservation_id, created_at.timestamp_millis())
}

pub fn pdf_data_uri(pdf: &[u8]) -> String {
    format!("data:{};base64,{}", PDF_CONTENT_TYPE, STANDARD.encode(pdf))
}

/// Where an invoice ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceUpload {
    pub url: String,
    /// False when `url` is the inline data-URI fallback
    pub stored: bool,
}

#[derive(Clone)]
pub struct InvoiceService {
    storage: Arc<dyn ObjectStorage>,
    bucket: BucketSpec,
}

impl InvoiceService {
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        InvoiceService {
            storage,
            bucket: BucketSpec::invoices(),
        }
    }

    /// Creates the invoice bucket if needed. Never fails; uploads fall back
    /// to data URIs when the bucket is unusable.
    pub async fn ensure_invoice_bucket(&self) {
        match self.storage.ensure_bucket(&self.bucket).await {
            Ok(()) => info!(bucket = %self.bucket.name, "Invoice bucket ready"),
            Err(e) => warn!(
                bucket = %self.bucket.name,
                error = %e,
                "Could not prepare invoice bucket"
            ),
        }
    }

    pub async fn upload_invoice(
        &self,
        pdf: Vec<u8>,
        reservation_id: i32,
        created_at: DateTime<Utc>,
    ) -> InvoiceUpload {
        let file_name = invoice_file_name(reservation_id, created_at);
        let size = pdf.len();
        let fallback = pdf_data_uri(&pdf);

        match self
            .storage
            .upload(&self.bucket.name, &file_name, PDF_CONTENT_TYPE, pdf)
            .await
        {
            Ok(url) => {
                info!(reservation_id, file_name = %file_name, size, "Invoice uploaded");
                InvoiceUpload { url, stored: true }
            }
            Err(e) => {
                warn!(reservation_id, error = %e, "Invoice upload failed, using inline copy");
                InvoiceUpload {
                    url: fallback,
                    stored: false,
                }
            }
        }
    }
}

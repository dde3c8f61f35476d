use std::{fmt::Display, io::Cursor};

use chrono::NaiveDate;
use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::{
    error::{AppError, Result},
    models::{ExportFormat, OrderItem, OrderResponse},
};

const HEADERS: [&str; 9] = [
    "N°",
    "Date",
    "Client",
    "Téléphone",
    "Adresse",
    "Statut",
    "Source",
    "Articles",
    "Total (MAD)",
];

/// One flattened order as it appears in every export format.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub id: i32,
    pub date: String,
    pub customer: String,
    pub phone: String,
    pub address: String,
    pub status: String,
    pub source: String,
    pub items: String,
    pub total: Decimal,
}

impl ExportRow {
    pub fn from_order(response: &OrderResponse) -> Self {
        let order = &response.order;
        let or_dash = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

        Self {
            id: order.id,
            date: order.order_date.format("%Y-%m-%d %H:%M").to_string(),
            customer: or_dash(&order.customer_name),
            phone: or_dash(&order.phone),
            address: or_dash(&order.address),
            status: order.status.to_string(),
            source: order.order_source.as_str().to_string(),
            items: describe_items(&response.items),
            total: order.total.round_dp(2),
        }
    }

    fn cells(&self) -> [String; 9] {
        [
            self.id.to_string(),
            self.date.clone(),
            self.customer.clone(),
            self.phone.clone(),
            self.address.clone(),
            self.status.clone(),
            self.source.clone(),
            self.items.clone(),
            format!("{:.2}", self.total),
        ]
    }
}

fn describe_items(items: &[OrderItem]) -> String {
    items
        .iter()
        .map(|item| match &item.color_name_fr {
            Some(color) => format!("{} [{}] x{}", item.product_name_fr, color, item.quantity),
            None => format!("{} x{}", item.product_name_fr, item.quantity),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn file_name(format: ExportFormat, date: NaiveDate) -> String {
    format!("orders-{}.{}", date.format("%Y%m%d"), format.extension())
}

pub fn render(format: ExportFormat, orders: &[OrderResponse]) -> Result<Vec<u8>> {
    let rows: Vec<ExportRow> = orders.iter().map(ExportRow::from_order).collect();

    tracing::info!("Exporting {} order(s) as {}", rows.len(), format.extension());

    match format {
        ExportFormat::Csv => render_csv(&rows),
        ExportFormat::Excel => render_excel(&rows),
        ExportFormat::Pdf => render_pdf(&rows),
        ExportFormat::Word => render_word(&rows),
    }
}

fn export_error(e: impl Display) -> AppError {
    AppError::InternalError(format!("Export failed: {}", e))
}

fn render_csv(rows: &[ExportRow]) -> Result<Vec<u8>> {
    // BOM so spreadsheet apps pick UTF-8 for the Arabic/French text.
    let mut writer = csv::Writer::from_writer(b"\xEF\xBB\xBF".to_vec());

    writer.write_record(HEADERS).map_err(export_error)?;
    for row in rows {
        writer.write_record(row.cells()).map_err(export_error)?;
    }

    writer.into_inner().map_err(export_error)
}

fn render_excel(rows: &[ExportRow]) -> Result<Vec<u8>> {
    use rust_xlsxwriter::{Format, Workbook};

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let money_format = Format::new().set_num_format("0.00");

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Commandes").map_err(export_error)?;

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(export_error)?;
    }

    for (index, row) in rows.iter().enumerate() {
        let r = index as u32 + 1;
        let cells = row.cells();

        worksheet
            .write_number(r, 0, f64::from(row.id))
            .map_err(export_error)?;
        for (col, value) in cells.iter().enumerate().take(8).skip(1) {
            worksheet
                .write_string(r, col as u16, value.as_str())
                .map_err(export_error)?;
        }
        worksheet
            .write_number_with_format(r, 8, row.total.to_f64().unwrap_or_default(), &money_format)
            .map_err(export_error)?;
    }

    worksheet.autofit();

    workbook.save_to_buffer().map_err(export_error)
}

struct PdfColumn {
    x: f32,
    max_chars: usize,
}

const PDF_COLUMNS: [PdfColumn; 9] = [
    PdfColumn { x: 8.0, max_chars: 6 },
    PdfColumn { x: 20.0, max_chars: 16 },
    PdfColumn { x: 50.0, max_chars: 20 },
    PdfColumn { x: 88.0, max_chars: 14 },
    PdfColumn { x: 114.0, max_chars: 24 },
    PdfColumn { x: 158.0, max_chars: 10 },
    PdfColumn { x: 178.0, max_chars: 9 },
    PdfColumn { x: 196.0, max_chars: 44 },
    PdfColumn { x: 272.0, max_chars: 12 },
];

const PAGE_WIDTH_MM: f32 = 297.0;
const PAGE_HEIGHT_MM: f32 = 210.0;
const TOP_MM: f32 = 192.0;
const BOTTOM_MM: f32 = 15.0;
const LINE_MM: f32 = 6.0;

fn render_pdf(rows: &[ExportRow]) -> Result<Vec<u8>> {
    use printpdf::{BuiltinFont, Mm, PdfDocument};

    let (doc, page, layer) = PdfDocument::new(
        "Commandes",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Commandes",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(export_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(export_error)?;

    let mut current = doc.get_page(page).get_layer(layer);
    current.use_text("Export des commandes", 14.0, Mm(8.0), Mm(200.0), &bold);

    let mut y = TOP_MM;
    let write_header = |layer: &printpdf::PdfLayerReference, y: f32| {
        for (column, header) in PDF_COLUMNS.iter().zip(HEADERS) {
            layer.use_text(pdf_text(header, column.max_chars), 9.0, Mm(column.x), Mm(y), &bold);
        }
    };

    write_header(&current, y);
    y -= LINE_MM;

    for row in rows {
        if y < BOTTOM_MM {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Commandes");
            current = doc.get_page(page).get_layer(layer);
            y = TOP_MM;
            write_header(&current, y);
            y -= LINE_MM;
        }

        for (column, value) in PDF_COLUMNS.iter().zip(row.cells()) {
            current.use_text(pdf_text(&value, column.max_chars), 8.0, Mm(column.x), Mm(y), &font);
        }
        y -= LINE_MM;
    }

    doc.save_to_bytes().map_err(export_error)
}

/// Builtin PDF fonts only cover Latin-1; other characters become `?`.
fn pdf_text(value: &str, max_chars: usize) -> String {
    let mut text: String = value
        .chars()
        .map(|c| if (c as u32) <= 0xFF { c } else { '?' })
        .take(max_chars + 1)
        .collect();

    if text.chars().count() > max_chars {
        text = text.chars().take(max_chars.saturating_sub(1)).collect();
        text.push('.');
    }

    text
}

fn render_word(rows: &[ExportRow]) -> Result<Vec<u8>> {
    use docx_rs::{Docx, Paragraph, Run, Table, TableCell, TableRow};

    let cell = |text: String, bold: bool| {
        let run = Run::new().add_text(text);
        let run = if bold { run.bold() } else { run };
        TableCell::new().add_paragraph(Paragraph::new().add_run(run))
    };

    let mut table_rows = Vec::with_capacity(rows.len() + 1);
    table_rows.push(TableRow::new(
        HEADERS.iter().map(|h| cell(h.to_string(), true)).collect(),
    ));
    for row in rows {
        table_rows.push(TableRow::new(
            row.cells().into_iter().map(|value| cell(value, false)).collect(),
        ));
    }

    let docx = Docx::new()
        .add_paragraph(
            Paragraph::new().add_run(Run::new().add_text("Export des commandes").bold().size(32)),
        )
        .add_table(Table::new(table_rows));

    let mut buffer = Cursor::new(Vec::new());
    docx.build().pack(&mut buffer).map_err(export_error)?;

    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::dec;

    use super::*;
    use crate::models::{Order, OrderSource, OrderStatus};

    fn sample() -> Vec<OrderResponse> {
        let order = Order {
            id: 12,
            customer_name: Some("Salma El Idrissi".to_string()),
            phone: Some("0612345678".to_string()),
            address: Some("12 Rue Atlas, Fès".to_string()),
            notes: None,
            status: OrderStatus::Confirmed,
            order_source: OrderSource::Web,
            order_date: Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap(),
            completed_date: None,
            total: dec!(115.50),
        };
        let items = vec![
            OrderItem {
                id: 1,
                order_id: 12,
                product_id: Some(3),
                color_id: Some(8),
                product_name_fr: "Vernis".to_string(),
                product_name_ar: "طلاء".to_string(),
                color_name_fr: Some("Rouge".to_string()),
                color_name_ar: Some("أحمر".to_string()),
                quantity: 2,
                price: dec!(25.75),
                image: Some("/uploads/vernis-rouge.png".to_string()),
                color_hex: Some("#c0392b".to_string()),
            },
            OrderItem {
                id: 2,
                order_id: 12,
                product_id: None,
                color_id: None,
                product_name_fr: "Parfum".to_string(),
                product_name_ar: "عطر".to_string(),
                color_name_fr: None,
                color_name_ar: None,
                quantity: 1,
                price: dec!(64.00),
                image: None,
                color_hex: None,
            },
        ];

        vec![OrderResponse { order, items }]
    }

    #[test]
    fn flattens_orders_into_rows() {
        let row = ExportRow::from_order(&sample()[0]);

        assert_eq!(row.date, "2025-03-14 09:30");
        assert_eq!(row.status, "confirmed");
        assert_eq!(row.items, "Vernis [Rouge] x2; Parfum x1");
        assert_eq!(row.total, dec!(115.50));
    }

    #[test]
    fn csv_has_header_and_one_line_per_order() {
        let bytes = render(ExportFormat::Csv, &sample()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.trim_start_matches('\u{feff}').lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("N°,Date,Client"));
        assert!(lines[1].starts_with("12,2025-03-14 09:30,Salma El Idrissi"));
        assert!(lines[1].ends_with("115.50"));
    }

    #[test]
    fn office_formats_are_zip_containers() {
        for format in [ExportFormat::Excel, ExportFormat::Word] {
            let bytes = render(format, &sample()).unwrap();
            assert!(bytes.starts_with(b"PK"), "{:?}", format);
        }
    }

    #[test]
    fn pdf_output_has_pdf_header() {
        let bytes = render(ExportFormat::Pdf, &sample()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn pdf_paginates_long_exports() {
        let orders: Vec<OrderResponse> = (0..80).flat_map(|_| sample()).collect();
        let bytes = render(ExportFormat::Pdf, &orders).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn empty_exports_still_render() {
        for format in [
            ExportFormat::Csv,
            ExportFormat::Excel,
            ExportFormat::Pdf,
            ExportFormat::Word,
        ] {
            assert!(!render(format, &[]).unwrap().is_empty());
        }
    }

    #[test]
    fn pdf_text_replaces_and_truncates() {
        assert_eq!(pdf_text("Fès", 10), "Fès");
        assert_eq!(pdf_text("عطر", 10), "???");
        assert_eq!(pdf_text("abcdefghij", 5), "abcd.");
    }

    #[test]
    fn names_files_by_date_and_extension() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        assert_eq!(file_name(ExportFormat::Excel, date), "orders-20250314.xlsx");
    }
}

//! Reports: low stock, movement summaries, PDF and CSV renditions

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::Utc;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Pt};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::models::Item;

// PDF layout, in points. A4 portrait with fixed column offsets; rows run
// down the page and break onto a new one near the bottom margin.
const PAGE_WIDTH: f64 = 595.276;
const PAGE_HEIGHT: f64 = 841.89;
const MARGIN: f64 = 40.0;
const COL_IN: f64 = MARGIN + 250.0;
const COL_OUT: f64 = MARGIN + 340.0;
const COL_IN_RIGHT: f64 = MARGIN + 320.0;
const COL_OUT_RIGHT: f64 = MARGIN + 420.0;
const PAGE_BREAK_Y: f64 = 80.0;
/// Helvetica digit glyphs share this advance, in em units
const DIGIT_ADVANCE: f64 = 0.556;

/// One row of the movement summary: total IN and OUT magnitudes per item
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SummaryRow {
    pub item_id: i64,
    pub name: String,
    pub total_in: i64,
    pub total_out: i64,
}

/// Dashboard headline figures
#[derive(Debug, Clone, Serialize)]
pub struct DashboardMetrics {
    pub total_items: i64,
    pub total_quantity: i64,
    pub total_transactions: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_count: Option<i64>,
}

#[derive(Clone)]
pub struct ReportsService {
    db: SqlitePool,
}

impl ReportsService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Items at or below their reorder level
    pub async fn low_stock(&self) -> AppResult<Vec<Item>> {
        let items = sqlx::query_as(
            "SELECT id, name, sku, price, quantity, reorder_level, description, supplier_id \
             FROM items WHERE quantity <= reorder_level ORDER BY id",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(items)
    }

    /// Summed IN and OUT transaction magnitudes per item, name order.
    /// Items without transactions report zero totals.
    pub async fn movement_summary(&self) -> AppResult<Vec<SummaryRow>> {
        let rows = sqlx::query_as(
            "SELECT i.id AS item_id, i.name, \
                    COALESCE(SUM(CASE WHEN st.kind = 'IN' THEN st.quantity ELSE 0 END), 0) AS total_in, \
                    COALESCE(SUM(CASE WHEN st.kind = 'OUT' THEN st.quantity ELSE 0 END), 0) AS total_out \
             FROM items i LEFT JOIN stock_transactions st ON st.item_id = i.id \
             GROUP BY i.id, i.name ORDER BY i.name, i.id",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    /// Headline figures for the dashboard. The user count is an
    /// admin-only card.
    pub async fn dashboard_metrics(&self, include_users: bool) -> AppResult<DashboardMetrics> {
        let total_items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.db)
            .await?;
        let total_quantity: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(quantity), 0) FROM items")
                .fetch_one(&self.db)
                .await?;
        let total_transactions: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM stock_transactions")
                .fetch_one(&self.db)
                .await?;
        let user_count = if include_users {
            Some(
                sqlx::query_scalar("SELECT COUNT(*) FROM users")
                    .fetch_one(&self.db)
                    .await?,
            )
        } else {
            None
        };

        Ok(DashboardMetrics {
            total_items,
            total_quantity,
            total_transactions,
            user_count,
        })
    }

    /// Render the movement summary as a paginated PDF under `output_dir`
    /// and return the path of the written file.
    pub fn render_pdf(summary: &[SummaryRow], output_dir: &str) -> AppResult<String> {
        std::fs::create_dir_all(output_dir)
            .map_err(|e| AppError::Internal(format!("Cannot create report directory: {}", e)))?;

        let title = "Stockroom - Stock Movement Report";
        let (doc, first_page, first_layer) = PdfDocument::new(
            title,
            Mm::from(Pt(PAGE_WIDTH)),
            Mm::from(Pt(PAGE_HEIGHT)),
            "Layer 1",
        );
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| AppError::Internal(format!("PDF font setup failed: {}", e)))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| AppError::Internal(format!("PDF font setup failed: {}", e)))?;

        let mut layer = doc.get_page(first_page).get_layer(first_layer);
        let mut y = PAGE_HEIGHT - MARGIN;

        let title_x = (PAGE_WIDTH - approx_text_width(title, 16.0)) / 2.0;
        layer.use_text(title, 16.0, Mm::from(Pt(title_x)), Mm::from(Pt(y)), &bold);
        y -= 30.0;

        draw_header(&layer, &bold, y);
        y -= 18.0;

        for row in summary {
            if y < PAGE_BREAK_Y {
                let (page, page_layer) = doc.add_page(
                    Mm::from(Pt(PAGE_WIDTH)),
                    Mm::from(Pt(PAGE_HEIGHT)),
                    "Layer 1",
                );
                layer = doc.get_page(page).get_layer(page_layer);
                y = PAGE_HEIGHT - MARGIN;
                draw_header(&layer, &bold, y);
                y -= 18.0;
            }

            let name: String = row.name.chars().take(40).collect();
            layer.use_text(name.as_str(), 10.0, Mm::from(Pt(MARGIN)), Mm::from(Pt(y)), &regular);
            draw_right_aligned(&layer, &regular, &row.total_in.to_string(), 10.0, COL_IN_RIGHT, y);
            draw_right_aligned(&layer, &regular, &row.total_out.to_string(), 10.0, COL_OUT_RIGHT, y);
            y -= 16.0;
        }

        let filename = format!("stock_report_{}.pdf", Utc::now().format("%Y%m%d_%H%M%S"));
        let path = Path::new(output_dir).join(filename);
        let file = File::create(&path)
            .map_err(|e| AppError::Internal(format!("Cannot write report file: {}", e)))?;
        doc.save(&mut BufWriter::new(file))
            .map_err(|e| AppError::Internal(format!("PDF rendering failed: {}", e)))?;

        Ok(path.to_string_lossy().into_owned())
    }

    /// Serialize report rows to CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization failed: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("CSV encoding error: {}", e)))
    }
}

fn draw_header(layer: &PdfLayerReference, bold: &IndirectFontRef, y: f64) {
    layer.use_text("Item", 11.0, Mm::from(Pt(MARGIN)), Mm::from(Pt(y)), bold);
    layer.use_text("Total IN", 11.0, Mm::from(Pt(COL_IN)), Mm::from(Pt(y)), bold);
    layer.use_text("Total OUT", 11.0, Mm::from(Pt(COL_OUT)), Mm::from(Pt(y)), bold);
}

fn draw_right_aligned(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    text: &str,
    size: f64,
    right_edge: f64,
    y: f64,
) {
    let x = right_edge - text.chars().count() as f64 * size * DIGIT_ADVANCE;
    layer.use_text(text, size, Mm::from(Pt(x)), Mm::from(Pt(y)), font);
}

/// Rough Helvetica width used for centering the title; mixed text
/// averages about half an em per character.
fn approx_text_width(text: &str, size: f64) -> f64 {
    text.chars().count() as f64 * size * 0.5
}

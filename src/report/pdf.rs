//! PDF report renderer.
//!
//! Lays the report out top-to-bottom on A4 pages with the built-in
//! Helvetica fonts, in the spirit of a simple cell/line writer: every call
//! draws at the current cursor and moves it down, breaking to a new page
//! when the next block would cross the bottom margin.

use std::path::Path;

use chrono::NaiveDate;
use printpdf::graphics::{LinePoint, PaintMode, Point, Polygon, PolygonRing, WindingOrder};
use printpdf::image::RawImage;
use printpdf::matrix::TextMatrix;
use printpdf::ops::Op;
use printpdf::text::TextItem;
use printpdf::xobject::{XObject, XObjectTransform};
use printpdf::{BuiltinFont, Mm, PdfDocument, PdfPage, PdfSaveOptions, Pt, Rgb, XObjectId};

use crate::domain::{ChartArtifact, GroupTotal, MetricsResult, ReportArtifact, ReportFormat};
use crate::error::PipelineError;
use crate::report::format::{
    self, AMOUNT_HEADER, CATEGORY_HEADER, CATEGORY_TABLE_INTRO, HEADING_CATEGORY, HEADING_REGION, HEADING_SUMMARY,
    REGION_HEADER, REGION_TABLE_INTRO,
};

const PT_PER_MM: f32 = 72.0 / 25.4;
const PAGE_W_MM: f32 = 210.0;
const PAGE_H_MM: f32 = 297.0;
const MARGIN_MM: f32 = 10.0;
const BOTTOM_MARGIN_MM: f32 = 20.0;
const CELL_PAD_MM: f32 = 1.0;
const CHART_W_MM: f32 = 180.0;
const LABEL_COL_MM: f32 = 100.0;
const AMOUNT_COL_MM: f32 = 90.0;

const REGULAR: BuiltinFont = BuiltinFont::Helvetica;
const BOLD: BuiltinFont = BuiltinFont::HelveticaBold;

/// Write `Sales_Report_<date>.pdf` into `output_dir`, replacing any report
/// from the same day.
pub fn write_pdf_report(
    metrics: &MetricsResult,
    chart: &ChartArtifact,
    source_name: &str,
    date: NaiveDate,
    output_dir: &Path,
) -> Result<ReportArtifact, PipelineError> {
    let path = output_dir.join(format::report_file_name(date, ReportFormat::Pdf));
    log::info!("Generating PDF report: {}", path.display());

    let chart_bytes = std::fs::read(&chart.path).map_err(|e| {
        PipelineError::render(&path, format!("Failed to read chart '{}': {e}", chart.path.display()))
    })?;

    let doc = build_document(metrics, &chart_bytes, source_name, date).map_err(|e| PipelineError::render(&path, e))?;

    let mut warnings = Vec::new();
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        log::debug!("PDF writer emitted {} warning(s)", warnings.len());
    }
    std::fs::write(&path, bytes).map_err(|e| PipelineError::render(&path, e.to_string()))?;

    log::info!("PDF report saved to {}", path.display());
    Ok(ReportArtifact {
        format: ReportFormat::Pdf,
        path,
    })
}

/// Assemble the full report document in memory.
pub fn build_document(
    metrics: &MetricsResult,
    chart_png: &[u8],
    source_name: &str,
    date: NaiveDate,
) -> Result<PdfDocument, String> {
    let title = format::report_title(date);
    let mut doc = PdfDocument::new(&title);

    let mut warnings = Vec::new();
    let image = RawImage::decode_from_bytes(chart_png, &mut warnings)
        .map_err(|e| format!("Failed to decode chart image: {e}"))?;
    let image_dims = (image.width as u32, image.height as u32);
    let image_id = XObjectId::new();
    doc.resources.xobjects.map.insert(image_id.clone(), XObject::Image(image));

    let mut w = PageWriter::new();

    w.line(10.0, &title, BOLD, 16.0, Align::Center);
    w.ln(10.0);

    w.line(10.0, HEADING_SUMMARY, BOLD, 14.0, Align::Left);
    w.paragraph(10.0, &format::summary_paragraph(metrics, source_name), REGULAR, 12.0);
    w.ln(5.0);

    w.line(10.0, HEADING_REGION, BOLD, 14.0, Align::Left);
    w.image(image_id, image_dims, CHART_W_MM);
    w.ln(5.0);
    w.paragraph(8.0, REGION_TABLE_INTRO, REGULAR, 10.0);
    w.ln(2.0);
    w.totals_table(REGION_HEADER, &metrics.sales_by_region);
    w.ln(5.0);

    w.line(10.0, HEADING_CATEGORY, BOLD, 14.0, Align::Left);
    w.paragraph(8.0, CATEGORY_TABLE_INTRO, REGULAR, 10.0);
    w.ln(2.0);
    w.totals_table(CATEGORY_HEADER, &metrics.sales_by_category);

    doc.pages = w.finish();
    Ok(doc)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
    Right,
}

/// Cursor-based page writer. Positions are millimetres from the top-left
/// corner; conversion to PDF's bottom-left points happens at draw time.
struct PageWriter {
    pages: Vec<PdfPage>,
    ops: Vec<Op>,
    y: f32,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            ops: Vec::new(),
            y: MARGIN_MM,
        }
    }

    fn finish(mut self) -> Vec<PdfPage> {
        self.flush_page();
        self.pages
    }

    fn flush_page(&mut self) {
        let ops = std::mem::take(&mut self.ops);
        self.pages.push(PdfPage::new(Mm(PAGE_W_MM), Mm(PAGE_H_MM), ops));
        self.y = MARGIN_MM;
    }

    fn ensure_space(&mut self, h: f32) {
        if self.y + h > PAGE_H_MM - BOTTOM_MARGIN_MM && self.y > MARGIN_MM {
            self.flush_page();
        }
    }

    fn ln(&mut self, h: f32) {
        self.y += h;
    }

    /// One full-width line of text, then move down by `h`.
    fn line(&mut self, h: f32, text: &str, font: BuiltinFont, size: f32, align: Align) {
        self.ensure_space(h);
        self.cell(MARGIN_MM, PAGE_W_MM - 2.0 * MARGIN_MM, h, text, font, size, align, false);
        self.y += h;
    }

    /// Word-wrapped text across the content width, `h` per line.
    fn paragraph(&mut self, h: f32, text: &str, font: BuiltinFont, size: f32) {
        let max_w = PAGE_W_MM - 2.0 * MARGIN_MM - 2.0 * CELL_PAD_MM;
        for line in wrap_text(text, size, max_w) {
            self.line(h, &line, font, size, Align::Left);
        }
    }

    fn image(&mut self, id: XObjectId, (img_w, img_h): (u32, u32), width_mm: f32) {
        if img_w == 0 || img_h == 0 {
            return;
        }
        let height_mm = width_mm * img_h as f32 / img_w as f32;
        self.ensure_space(height_mm);

        let width_pt = width_mm * PT_PER_MM;
        let height_pt = height_mm * PT_PER_MM;
        let transform = XObjectTransform {
            translate_x: Some(Pt(MARGIN_MM * PT_PER_MM)),
            translate_y: Some(Pt((PAGE_H_MM - self.y - height_mm) * PT_PER_MM)),
            scale_x: Some(width_pt / img_w as f32),
            scale_y: Some(height_pt / img_h as f32),
            rotate: None,
            dpi: Some(72.0),
        };
        self.ops.push(Op::UseXobject { id, transform });
        self.y += height_mm;
    }

    fn totals_table(&mut self, label_header: &str, groups: &[GroupTotal]) {
        const ROW_H: f32 = 10.0;
        let x_label = MARGIN_MM;
        let x_amount = MARGIN_MM + LABEL_COL_MM;

        let header = |w: &mut Self| {
            w.cell(x_label, LABEL_COL_MM, ROW_H, label_header, BOLD, 12.0, Align::Left, true);
            w.cell(x_amount, AMOUNT_COL_MM, ROW_H, AMOUNT_HEADER, BOLD, 12.0, Align::Left, true);
            w.y += ROW_H;
        };

        self.ensure_space(ROW_H * 2.0);
        header(self);
        for (label, amount) in format::table_rows(groups) {
            if self.y + ROW_H > PAGE_H_MM - BOTTOM_MARGIN_MM {
                self.flush_page();
                header(self);
            }
            self.cell(x_label, LABEL_COL_MM, ROW_H, &label, REGULAR, 12.0, Align::Left, true);
            self.cell(x_amount, AMOUNT_COL_MM, ROW_H, &amount, REGULAR, 12.0, Align::Right, true);
            self.y += ROW_H;
        }
    }

    /// Draw a text cell at the current line without moving the cursor.
    #[allow(clippy::too_many_arguments)]
    fn cell(&mut self, x: f32, w: f32, h: f32, text: &str, font: BuiltinFont, size: f32, align: Align, border: bool) {
        if border {
            self.stroke_rect(x, self.y, w, h);
        }
        if text.is_empty() {
            return;
        }

        let text_w = text_width_mm(text, size);
        let text_x = match align {
            Align::Left => x + CELL_PAD_MM,
            Align::Center => x + (w - text_w) / 2.0,
            Align::Right => x + w - CELL_PAD_MM - text_w,
        };
        let size_mm = size / PT_PER_MM;
        let baseline = self.y + h / 2.0 + 0.3 * size_mm;

        self.ops.push(Op::StartTextSection);
        self.ops.push(Op::SetFillColor {
            col: printpdf::color::Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)),
        });
        self.ops.push(Op::SetFontSizeBuiltinFont { size: Pt(size), font });
        self.ops.push(Op::SetTextMatrix {
            matrix: TextMatrix::Translate(Pt(text_x * PT_PER_MM), Pt((PAGE_H_MM - baseline) * PT_PER_MM)),
        });
        self.ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(text.to_string())],
            font,
        });
        self.ops.push(Op::EndTextSection);
    }

    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let left = x * PT_PER_MM;
        let right = (x + w) * PT_PER_MM;
        let top = (PAGE_H_MM - y) * PT_PER_MM;
        let bottom = (PAGE_H_MM - y - h) * PT_PER_MM;
        let corner = |px: f32, py: f32| LinePoint {
            p: Point { x: Pt(px), y: Pt(py) },
            bezier: false,
        };
        let polygon = Polygon {
            rings: vec![PolygonRing {
                points: vec![
                    corner(left, bottom),
                    corner(right, bottom),
                    corner(right, top),
                    corner(left, top),
                ],
            }],
            mode: PaintMode::Stroke,
            winding_order: WindingOrder::NonZero,
        };
        self.ops.push(Op::SetOutlineColor {
            col: printpdf::color::Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)),
        });
        self.ops.push(Op::SetOutlineThickness { pt: Pt(0.5) });
        self.ops.push(Op::DrawPolygon { polygon });
    }
}

/// Greedy word wrap using Helvetica advance widths.
fn wrap_text(text: &str, size: f32, max_w_mm: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width_mm(&candidate, size) <= max_w_mm || current.is_empty() {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn text_width_mm(text: &str, size: f32) -> f32 {
    let units: u32 = text.chars().map(helvetica_advance).sum();
    units as f32 / 1000.0 * size / PT_PER_MM
}

/// Advance width of a glyph in Helvetica, in 1/1000 em.
fn helvetica_advance(ch: char) -> u32 {
    const ASCII: [u16; 95] = [
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' ' .. '/'
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0' .. '9'
        278, 278, 584, 584, 584, 556, 1015, // ':' .. '@'
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A' .. 'M'
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N' .. 'Z'
        278, 278, 278, 469, 556, 333, // '[' .. '`'
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a' .. 'm'
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n' .. 'z'
        334, 260, 334, 584, // '{' .. '~'
    ];
    let code = ch as u32;
    if (32..127).contains(&code) {
        ASCII[(code - 32) as usize] as u32
    } else {
        556
    }
}

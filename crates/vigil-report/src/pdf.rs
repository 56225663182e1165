//! Painting pass: turn a [`ReportLayout`] into PDF bytes.
//!
//! A4 portrait, builtin Helvetica faces, styling carried over from the
//! dashboard's report look (dark banner, accent section rules, tinted
//! disclaimer box).

use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Polygon, Rgb,
};

use crate::layout::{Block, ReportLayout, REPORT_TITLE};
use crate::ReportError;

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 15.0;
const HEADER_H: f32 = 42.0;
const BODY_LINE_H: f32 = 6.0;
const DISCLAIMER_LINE_H: f32 = 5.0;

// Rough advance-width factor for Helvetica, used only to center the title.
const AVG_GLYPH_EM: f32 = 0.5;
const PT_TO_MM: f32 = 0.352_778;

fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb(Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    ))
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

struct Painter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    fonts: Fonts,
    /// Cursor measured from the top of the current page, in mm.
    y: f32,
}

impl Painter {
    fn new() -> Result<Self, ReportError> {
        let (doc, page, layer) = PdfDocument::new(REPORT_TITLE, Mm(PAGE_W), Mm(PAGE_H), "Page 1");
        let fonts = Fonts {
            regular: add_font(&doc, BuiltinFont::Helvetica)?,
            bold: add_font(&doc, BuiltinFont::HelveticaBold)?,
            italic: add_font(&doc, BuiltinFont::HelveticaOblique)?,
        };
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            fonts,
            y: 0.0,
        })
    }

    /// Start a new page when fewer than `needed` mm remain.
    fn ensure_room(&mut self, needed: f32) {
        if self.y + needed > PAGE_H - MARGIN {
            let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Page");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = MARGIN;
        }
    }

    fn fill_rect(&self, x: f32, y_top: f32, w: f32, h: f32, color: Color) {
        self.layer.set_fill_color(color);
        let top = PAGE_H - y_top;
        let bottom = PAGE_H - y_top - h;
        let points = vec![
            (Point::new(Mm(x), Mm(top)), false),
            (Point::new(Mm(x + w), Mm(top)), false),
            (Point::new(Mm(x + w), Mm(bottom)), false),
            (Point::new(Mm(x), Mm(bottom)), false),
        ];
        self.layer.add_polygon(Polygon {
            rings: vec![points],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });
    }

    fn rule(&self, x1: f32, x2: f32, y_top: f32, color: Color) {
        self.layer.set_outline_color(color);
        self.layer.set_outline_thickness(0.75);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x1), Mm(PAGE_H - y_top)), false),
                (Point::new(Mm(x2), Mm(PAGE_H - y_top)), false),
            ],
            is_closed: false,
        });
    }

    fn text(&self, text: &str, font: &IndirectFontRef, size: f32, x: f32, baseline_top: f32) {
        self.layer
            .use_text(text, size, Mm(x), Mm(PAGE_H - baseline_top), font);
    }

    fn centered_text(&self, text: &str, font: &IndirectFontRef, size: f32, baseline_top: f32) {
        let est_width = text.chars().count() as f32 * size * AVG_GLYPH_EM * PT_TO_MM;
        let x = ((PAGE_W - est_width) / 2.0).max(MARGIN);
        self.text(text, font, size, x, baseline_top);
    }

    fn paint_block(&mut self, block: &Block) {
        let usable = PAGE_W - 2.0 * MARGIN;
        match block {
            Block::HeaderBar { title, subtitle } => {
                self.fill_rect(0.0, 0.0, PAGE_W, HEADER_H, rgb(30, 30, 46));
                self.layer.set_fill_color(rgb(255, 255, 255));
                self.centered_text(title, &self.fonts.bold, 22.0, 18.0);
                self.layer.set_fill_color(rgb(180, 180, 210));
                self.centered_text(subtitle, &self.fonts.regular, 10.0, 28.0);
                self.y = HEADER_H + 12.0;
            }
            Block::SectionTitle(title) => {
                self.ensure_room(14.0);
                self.layer.set_fill_color(rgb(75, 75, 200));
                self.text(title, &self.fonts.bold, 13.0, MARGIN, self.y + 5.0);
                self.rule(MARGIN, MARGIN + usable, self.y + 7.0, rgb(75, 75, 200));
                self.y += 11.0;
            }
            Block::Paragraph(lines) => {
                self.layer.set_fill_color(rgb(30, 30, 30));
                for line in lines {
                    self.ensure_room(BODY_LINE_H);
                    if !line.is_empty() {
                        self.text(line, &self.fonts.regular, 11.0, MARGIN, self.y + 4.5);
                    }
                    self.y += BODY_LINE_H;
                }
            }
            Block::MetricRow { label, value } => {
                self.ensure_room(8.0);
                self.layer.set_fill_color(rgb(50, 50, 50));
                self.text(label, &self.fonts.bold, 11.0, MARGIN, self.y + 5.5);
                self.layer.set_fill_color(rgb(30, 30, 30));
                self.text(value, &self.fonts.regular, 11.0, MARGIN + 80.0, self.y + 5.5);
                self.y += 8.0;
            }
            Block::Condition { text, flagged } => {
                self.ensure_room(8.0);
                let color = if *flagged {
                    rgb(200, 50, 50)
                } else {
                    rgb(34, 139, 34)
                };
                self.layer.set_fill_color(color);
                let line = format!("  - {text}");
                self.text(&line, &self.fonts.regular, 11.0, MARGIN, self.y + 5.5);
                self.y += 8.0;
            }
            Block::Spacer(mm) => {
                self.y += mm;
            }
            Block::DisclaimerBox(lines) => {
                let box_h = lines.len() as f32 * DISCLAIMER_LINE_H + 6.0;
                self.ensure_room(box_h);
                self.fill_rect(MARGIN, self.y, usable, box_h, rgb(255, 248, 230));
                self.layer.set_fill_color(rgb(140, 110, 20));
                let mut baseline = self.y + 7.0;
                for line in lines {
                    self.text(line, &self.fonts.italic, 9.0, MARGIN + 3.0, baseline);
                    baseline += DISCLAIMER_LINE_H;
                }
                self.y += box_h;
            }
        }
    }

    fn finish(self) -> Result<Vec<u8>, ReportError> {
        self.doc
            .save_to_bytes()
            .map_err(|e| ReportError::Pdf(e.to_string()))
    }
}

fn add_font(doc: &PdfDocumentReference, font: BuiltinFont) -> Result<IndirectFontRef, ReportError> {
    doc.add_builtin_font(font)
        .map_err(|e| ReportError::Pdf(e.to_string()))
}

/// Paint every block of the layout and return the document bytes.
pub(crate) fn paint(layout: &ReportLayout) -> Result<Vec<u8>, ReportError> {
    let mut painter = Painter::new()?;
    for block in &layout.blocks {
        painter.paint_block(block);
    }
    painter.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::assessment_layout;
    use crate::ReportMeta;
    use chrono::TimeZone;
    use chrono::Utc;

    #[test]
    fn paint_produces_a_nonempty_pdf() {
        let meta = ReportMeta {
            generated_at: Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
            session_started_at: None,
        };
        let bytes = paint(&assessment_layout("all good", &meta)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn long_reports_spill_onto_additional_pages() {
        let meta = ReportMeta {
            generated_at: Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
            session_started_at: None,
        };
        let short = paint(&assessment_layout("one line", &meta)).unwrap();
        let long_text = "Observation line with enough words to wrap.\n".repeat(120);
        let long = paint(&assessment_layout(&long_text, &meta)).unwrap();

        let page_objects = |bytes: &[u8]| {
            String::from_utf8_lossy(bytes)
                .matches("/Type /Page")
                .count()
        };
        assert!(page_objects(&long) > page_objects(&short));
    }
}

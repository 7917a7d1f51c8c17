use crate::assembler::{
    Page, PageElement, Rect, ReportDocument, TextAlign, PAGE_HEIGHT_MM, PAGE_WIDTH_MM,
    TEXT_PADDING_MM,
};
use crate::charts::ChartArtifact;
use crate::error::{FactsheetError, Result};
use crate::utils::{estimate_text_width_mm, mm_to_pt, pt_to_mm};
use log::{debug, info};
use printpdf::color::Color;
use printpdf::xobject::XObjectTransform;
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Pt, Rgb, Svg, TextItem,
    TextMatrix, XObjectId,
};

/// File name offered when the factsheet is downloaded.
pub const SUGGESTED_FILENAME: &str = "factsheet.pdf";

/// Serializes an assembled document to PDF bytes.
///
/// Either the whole document is written or an error is returned; no partial
/// output escapes.
pub fn render_pdf(document: &ReportDocument) -> Result<Vec<u8>> {
    let mut doc = PdfDocument::new(&document.title);

    for page in document.pages() {
        let ops = PageOps::new(&mut doc).render(page)?;
        doc.pages
            .push(PdfPage::new(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), ops));
    }

    let mut bytes = Vec::new();
    let mut warnings = Vec::new();
    doc.save_writer(&mut bytes, &PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        debug!("PDF writer reported {} warnings", warnings.len());
    }

    info!(
        "Rendered '{}' to {} bytes across {} pages",
        document.title,
        bytes.len(),
        document.page_count()
    );
    Ok(bytes)
}

/// Collects the drawing operations of a single page.
struct PageOps<'a> {
    doc: &'a mut PdfDocument,
    ops: Vec<Op>,
    page_height_pt: f32,
}

impl<'a> PageOps<'a> {
    fn new(doc: &'a mut PdfDocument) -> Self {
        Self {
            doc,
            ops: vec![Op::SetFillColor {
                col: Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)),
            }],
            page_height_pt: mm_to_pt(PAGE_HEIGHT_MM),
        }
    }

    fn render(mut self, page: &Page) -> Result<Vec<Op>> {
        for element in &page.elements {
            match element {
                PageElement::Heading {
                    text,
                    rect,
                    align,
                    font_size,
                    bold,
                } => {
                    let font = if *bold {
                        BuiltinFont::HelveticaBold
                    } else {
                        BuiltinFont::Helvetica
                    };
                    let x = aligned_x(text, rect, *align, *font_size);
                    self.write_line(text, x, cell_baseline(rect.y, rect.height, *font_size), *font_size, font);
                }
                PageElement::Chart { artifact, rect } => self.embed_chart(artifact, rect)?,
                PageElement::TextBlock {
                    lines,
                    font_size,
                    line_height,
                    ..
                }
                | PageElement::TextRows {
                    rows: lines,
                    font_size,
                    line_height,
                    ..
                } => self.write_lines(lines, &element.line_origins(), *font_size, *line_height),
            }
        }
        Ok(self.ops)
    }

    fn write_lines(
        &mut self,
        lines: &[String],
        origins: &[(f32, f32)],
        font_size: f32,
        line_height: f32,
    ) {
        for (line, (x, top)) in lines.iter().zip(origins) {
            if line.is_empty() {
                continue;
            }
            self.write_line(
                line,
                x + TEXT_PADDING_MM,
                cell_baseline(*top, line_height, font_size),
                font_size,
                BuiltinFont::Helvetica,
            );
        }
    }

    /// Writes one line with its baseline at `baseline_mm` from the top of the page.
    fn write_line(&mut self, text: &str, x_mm: f32, baseline_mm: f32, font_size: f32, font: BuiltinFont) {
        let pdf_y = self.page_height_pt - mm_to_pt(baseline_mm);
        self.ops.push(Op::StartTextSection);
        self.ops.push(Op::SetFontSizeBuiltinFont {
            size: Pt(font_size),
            font,
        });
        self.ops.push(Op::SetTextMatrix {
            matrix: TextMatrix::Translate(Pt(mm_to_pt(x_mm)), Pt(pdf_y)),
        });
        self.ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(text.to_string())],
            font,
        });
        self.ops.push(Op::EndTextSection);
    }

    fn embed_chart(&mut self, artifact: &ChartArtifact, rect: &Rect) -> Result<()> {
        let mut warnings = Vec::new();
        let xobject = Svg::parse(&artifact.svg, &mut warnings).map_err(|e| {
            FactsheetError::RenderFailure(format!(
                "Failed to embed {:?} chart: {}",
                artifact.role, e
            ))
        })?;

        let px_width = xobject
            .width
            .map(|w| w.0 as f32)
            .unwrap_or(artifact.width as f32);
        let px_height = xobject
            .height
            .map(|h| h.0 as f32)
            .unwrap_or(artifact.height as f32);
        let id: XObjectId = self.doc.add_xobject(&xobject);

        let y = self.page_height_pt - mm_to_pt(rect.bottom());
        let transform = XObjectTransform {
            translate_x: Some(Pt(mm_to_pt(rect.x))),
            translate_y: Some(Pt(y)),
            scale_x: Some(mm_to_pt(rect.width) / px_width.max(1.0)),
            scale_y: Some(mm_to_pt(rect.height) / px_height.max(1.0)),
            rotate: None,
            dpi: Some(72.0),
        };
        self.ops.push(Op::UseXobject { id, transform });
        Ok(())
    }
}

/// Baseline of text vertically centered in a cell, all in millimetres.
fn cell_baseline(top: f32, height: f32, font_size: f32) -> f32 {
    top + height / 2.0 + 0.3 * pt_to_mm(font_size)
}

fn aligned_x(text: &str, rect: &Rect, align: TextAlign, font_size: f32) -> f32 {
    match align {
        TextAlign::Left => rect.x + TEXT_PADDING_MM,
        TextAlign::Center => {
            let width = estimate_text_width_mm(text, font_size);
            rect.x + ((rect.width - width) / 2.0).max(0.0)
        }
    }
}

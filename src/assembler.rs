use crate::charts::{ChartArtifact, ChartSet};
use crate::schema::{ReportData, DEFAULT_TITLE};
use crate::utils::{estimate_text_width_mm, wrap_text};
use log::{debug, warn};
use serde::Serialize;

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const SIDE_MARGIN_MM: f32 = 10.0;
pub const BOTTOM_MARGIN_MM: f32 = 15.0;
pub const CONTENT_WIDTH_MM: f32 = PAGE_WIDTH_MM - 2.0 * SIDE_MARGIN_MM;
/// Horizontal padding between a text cell edge and its first glyph.
pub const TEXT_PADDING_MM: f32 = 1.0;
pub const TEXT_COLUMN_GAP_MM: f32 = 5.0;

const LINE_HEIGHT_MM: f32 = 10.0;
const BODY_FONT_PT: f32 = 12.0;
const TITLE_FONT_PT: f32 = 16.0;
/// Smallest font used for body text; below this spacing is compressed instead.
const MIN_TEXT_FONT_PT: f32 = 6.0;
const MAX_ROW_COLUMNS: usize = 6;
const MAX_DISCLOSURE_COLUMNS: usize = 3;

const GROWTH_CHART_TOP_MM: f32 = 30.0;
const PERFORMANCE_TOP_MM: f32 = 120.0;
const PIE_TOP_MM: f32 = 50.0;
const PIE_WIDTH_MM: f32 = 90.0;
const SECTOR_PIE_LEFT_MM: f32 = 110.0;
const YEARLY_CHART_TOP_MM: f32 = 130.0;
const DISCLOSURE_TOP_MM: f32 = 20.0;

/// Position and size in millimetres, measured from the top-left page corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextAlign {
    Left,
    Center,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageElement {
    Heading {
        text: String,
        rect: Rect,
        align: TextAlign,
        font_size: f32,
        bold: bool,
    },
    Chart {
        artifact: ChartArtifact,
        rect: Rect,
    },
    /// Pre-wrapped flowing text; `text` keeps the unwrapped source.
    TextBlock {
        text: String,
        lines: Vec<String>,
        rect: Rect,
        font_size: f32,
        line_height: f32,
        columns: usize,
    },
    /// One literal line per record, top-aligned at `rect.y`.
    TextRows {
        rows: Vec<String>,
        rect: Rect,
        font_size: f32,
        line_height: f32,
        columns: usize,
    },
}

impl PageElement {
    pub fn rect(&self) -> Rect {
        match self {
            PageElement::Heading { rect, .. }
            | PageElement::Chart { rect, .. }
            | PageElement::TextBlock { rect, .. }
            | PageElement::TextRows { rect, .. } => *rect,
        }
    }

    /// Every line of text the element prints.
    pub fn text_lines(&self) -> Vec<&str> {
        match self {
            PageElement::Heading { text, .. } => vec![text.as_str()],
            PageElement::Chart { .. } => Vec::new(),
            PageElement::TextBlock { lines, .. } => lines.iter().map(String::as_str).collect(),
            PageElement::TextRows { rows, .. } => rows.iter().map(String::as_str).collect(),
        }
    }

    /// Top-left corner of every line in [`PageElement::text_lines`] order.
    ///
    /// Lines fill the first column top to bottom before moving right, with
    /// the same number of lines in every column but the last.
    pub fn line_origins(&self) -> Vec<(f32, f32)> {
        match self {
            PageElement::TextBlock {
                lines: items,
                rect,
                line_height,
                columns,
                ..
            }
            | PageElement::TextRows {
                rows: items,
                rect,
                line_height,
                columns,
                ..
            } => {
                let columns = (*columns).max(1);
                let per_column = items.len().div_ceil(columns).max(1);
                let width = column_width(rect.width, columns);
                (0..items.len())
                    .map(|i| {
                        let column = (i / per_column) as f32;
                        let row = (i % per_column) as f32;
                        (
                            rect.x + column * (width + TEXT_COLUMN_GAP_MM),
                            rect.y + row * line_height,
                        )
                    })
                    .collect()
            }
            PageElement::Heading { rect, .. } => vec![(rect.x, rect.y)],
            PageElement::Chart { .. } => Vec::new(),
        }
    }
}

/// Text set into equal-width columns inside a fixed box.
#[derive(Debug, Clone, PartialEq)]
struct TextFlow {
    lines: Vec<String>,
    font_size: f32,
    line_height: f32,
    columns: usize,
}

fn column_width(total: f32, columns: usize) -> f32 {
    let columns = columns.max(1);
    (total - TEXT_COLUMN_GAP_MM * (columns - 1) as f32) / columns as f32
}

fn line_height_for(font_size: f32) -> f32 {
    LINE_HEIGHT_MM * font_size / BODY_FONT_PT
}

fn lines_per_column(available: f32, line_height: f32) -> usize {
    ((available + 1e-3) / line_height).floor() as usize
}

/// Body font sizes from largest to smallest, in whole points.
fn font_steps() -> impl Iterator<Item = f32> {
    (MIN_TEXT_FONT_PT as u32..=BODY_FONT_PT as u32)
        .rev()
        .map(|pt| pt as f32)
}

/// Lays out single-line records: largest font first, adding columns as long
/// as the widest record still fits. If even the smallest font in the most
/// columns overflows, line spacing is compressed so every record is kept.
fn flow_rows(rows: Vec<String>, available: f32) -> TextFlow {
    for font_size in font_steps() {
        let line_height = line_height_for(font_size);
        let per_column = lines_per_column(available, line_height);
        let columns = rows.len().div_ceil(per_column.max(1)).max(1);
        if per_column > 0 && columns <= max_row_columns(&rows, font_size) {
            return TextFlow {
                lines: rows,
                font_size,
                line_height,
                columns,
            };
        }
    }

    let columns = max_row_columns(&rows, MIN_TEXT_FONT_PT);
    let line_height = available / rows.len().div_ceil(columns) as f32;
    warn!(
        "{} performance rows exceed {} columns at {}pt; compressing spacing to {:.2}mm",
        rows.len(),
        columns,
        MIN_TEXT_FONT_PT,
        line_height
    );
    TextFlow {
        lines: rows,
        font_size: MIN_TEXT_FONT_PT,
        line_height,
        columns,
    }
}

/// How many columns of the widest row fit across the content width.
fn max_row_columns(rows: &[String], font_size: f32) -> usize {
    let widest = rows
        .iter()
        .map(|r| estimate_text_width_mm(r, font_size))
        .fold(0.0, f32::max)
        + 2.0 * TEXT_PADDING_MM;
    (((CONTENT_WIDTH_MM + TEXT_COLUMN_GAP_MM) / (widest + TEXT_COLUMN_GAP_MM)).floor() as usize)
        .clamp(1, MAX_ROW_COLUMNS)
}

/// Wraps paragraphs into as few columns as possible, shrinking the font
/// before adding a column. Nothing is dropped: past the smallest font in the
/// most columns, line spacing is compressed instead.
fn flow_paragraphs(text: &str, available: f32) -> TextFlow {
    let wrap = |font_size: f32, columns: usize| {
        wrap_text(
            text,
            column_width(CONTENT_WIDTH_MM, columns) - 2.0 * TEXT_PADDING_MM,
            font_size,
        )
    };

    for columns in 1..=MAX_DISCLOSURE_COLUMNS {
        for font_size in font_steps() {
            let line_height = line_height_for(font_size);
            let lines = wrap(font_size, columns);
            if lines.len() <= columns * lines_per_column(available, line_height) {
                return TextFlow {
                    lines,
                    font_size,
                    line_height,
                    columns,
                };
            }
        }
    }

    let columns = MAX_DISCLOSURE_COLUMNS;
    let lines = wrap(MIN_TEXT_FONT_PT, columns);
    let line_height = available / lines.len().div_ceil(columns) as f32;
    warn!(
        "Disclosures need {} lines at {}pt; compressing spacing to {:.2}mm",
        lines.len(),
        MIN_TEXT_FONT_PT,
        line_height
    );
    TextFlow {
        lines,
        font_size: MIN_TEXT_FONT_PT,
        line_height,
        columns,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub number: usize,
    pub elements: Vec<PageElement>,
}

impl Page {
    fn new(number: usize) -> Self {
        Self {
            number,
            elements: Vec::new(),
        }
    }

    fn push(&mut self, element: PageElement) {
        self.elements.push(element);
    }

    pub fn charts(&self) -> impl Iterator<Item = (&ChartArtifact, Rect)> {
        self.elements.iter().filter_map(|e| match e {
            PageElement::Chart { artifact, rect } => Some((artifact, *rect)),
            _ => None,
        })
    }

    pub fn text_lines(&self) -> Vec<&str> {
        self.elements.iter().flat_map(|e| e.text_lines()).collect()
    }
}

/// The assembled, immutable factsheet layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub title: String,
    pages: Vec<Page>,
}

impl ReportDocument {
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Lays out the fixed three-page factsheet.
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    title: String,
}

impl Default for ReportAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE)
    }
}

impl ReportAssembler {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// Builds the document. Every page and chart slot is always emitted so
    /// layout coordinates do not depend on the input.
    pub fn assemble(&self, data: &ReportData, charts: ChartSet) -> ReportDocument {
        let ChartSet {
            growth,
            regional,
            sector,
            yearly,
        } = charts;

        let pages = vec![
            self.performance_page(data, growth),
            breakdown_page(regional, sector, yearly),
            disclosures_page(data),
        ];

        debug!(
            "Assembled '{}' with {} pages",
            self.title,
            pages.len()
        );

        ReportDocument {
            title: self.title.clone(),
            pages,
        }
    }

    fn performance_page(&self, data: &ReportData, growth: ChartArtifact) -> Page {
        let mut page = Page::new(1);
        page.push(heading(&self.title, 10.0, TextAlign::Center, TITLE_FONT_PT, true));
        page.push(heading("Investment Growth Chart", 20.0, TextAlign::Left, BODY_FONT_PT, false));
        page.push(chart(growth, SIDE_MARGIN_MM, GROWTH_CHART_TOP_MM, CONTENT_WIDTH_MM));
        page.push(heading("Performance Data", PERFORMANCE_TOP_MM, TextAlign::Left, BODY_FONT_PT, false));

        let top = PERFORMANCE_TOP_MM + LINE_HEIGHT_MM;
        let available = PAGE_HEIGHT_MM - BOTTOM_MARGIN_MM - top;
        let rows: Vec<String> = data.performance_rows.iter().map(|r| r.to_line()).collect();
        let flow = flow_rows(rows, available);

        page.push(PageElement::TextRows {
            rows: flow.lines,
            rect: Rect::new(SIDE_MARGIN_MM, top, CONTENT_WIDTH_MM, available),
            font_size: flow.font_size,
            line_height: flow.line_height,
            columns: flow.columns,
        });
        page
    }
}

/// Convenience wrapper using the default title.
pub fn assemble(data: &ReportData, charts: ChartSet) -> ReportDocument {
    ReportAssembler::default().assemble(data, charts)
}

fn heading(text: &str, y: f32, align: TextAlign, font_size: f32, bold: bool) -> PageElement {
    PageElement::Heading {
        text: text.to_string(),
        rect: Rect::new(SIDE_MARGIN_MM, y, CONTENT_WIDTH_MM, LINE_HEIGHT_MM),
        align,
        font_size,
        bold,
    }
}

fn chart(artifact: ChartArtifact, x: f32, y: f32, width: f32) -> PageElement {
    let height = width * artifact.aspect_ratio();
    PageElement::Chart {
        artifact,
        rect: Rect::new(x, y, width, height),
    }
}

fn breakdown_page(regional: ChartArtifact, sector: ChartArtifact, yearly: ChartArtifact) -> Page {
    let mut page = Page::new(2);
    page.push(heading("Portfolio Breakdown", 10.0, TextAlign::Left, BODY_FONT_PT, false));
    page.push(chart(regional, SIDE_MARGIN_MM, PIE_TOP_MM, PIE_WIDTH_MM));
    page.push(chart(sector, SECTOR_PIE_LEFT_MM, PIE_TOP_MM, PIE_WIDTH_MM));
    page.push(chart(yearly, SIDE_MARGIN_MM, YEARLY_CHART_TOP_MM, CONTENT_WIDTH_MM));
    page
}

fn disclosures_page(data: &ReportData) -> Page {
    let mut page = Page::new(3);
    page.push(heading("Disclosures", 10.0, TextAlign::Center, BODY_FONT_PT, false));

    let text = data.disclosures.join("\n");
    let available = PAGE_HEIGHT_MM - BOTTOM_MARGIN_MM - DISCLOSURE_TOP_MM;

    let flow = flow_paragraphs(&text, available);

    page.push(PageElement::TextBlock {
        text,
        lines: flow.lines,
        rect: Rect::new(SIDE_MARGIN_MM, DISCLOSURE_TOP_MM, CONTENT_WIDTH_MM, available),
        font_size: flow.font_size,
        line_height: flow.line_height,
        columns: flow.columns,
    });
    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::render_all;
    use crate::schema::{Exposure, GrowthSeries, PerformanceRow, YearlyPerformance};

    fn sample_data() -> ReportData {
        ReportData {
            time_axis: vec!["1".into(), "2".into(), "3".into()],
            growth_series: vec![GrowthSeries {
                name: "Investment Growth A".into(),
                values: vec![100.0, 110.0, 125.0],
            }],
            performance_rows: vec![PerformanceRow {
                ret: 0.08,
                std_dev: 0.12,
                information_ratio: 0.5,
            }],
            regional_exposure: vec![Exposure::new("Asia", 100.0)],
            sector_exposure: vec![Exposure::new("Energy", 100.0)],
            yearly_performance: vec![YearlyPerformance {
                year: "2020".into(),
                value: 3.0,
            }],
            disclosures: vec!["Capital at risk.".into()],
        }
    }

    fn empty_data() -> ReportData {
        ReportData {
            time_axis: Vec::new(),
            growth_series: Vec::new(),
            performance_rows: Vec::new(),
            regional_exposure: Vec::new(),
            sector_exposure: Vec::new(),
            yearly_performance: Vec::new(),
            disclosures: Vec::new(),
        }
    }

    #[test]
    fn test_fixed_page_structure() {
        let data = sample_data();
        let doc = assemble(&data, render_all(&data).unwrap());

        assert_eq!(doc.page_count(), 3);
        let pages = doc.pages();
        assert_eq!(
            pages[0].text_lines(),
            vec![
                DEFAULT_TITLE,
                "Investment Growth Chart",
                "Performance Data",
                "0.08 0.12 0.5"
            ]
        );
        assert_eq!(pages[1].text_lines(), vec!["Portfolio Breakdown"]);
        assert_eq!(pages[2].text_lines(), vec!["Disclosures", "Capital at risk."]);
        assert_eq!(pages[0].charts().count(), 1);
        assert_eq!(pages[1].charts().count(), 3);
        assert_eq!(pages[2].charts().count(), 0);
    }

    #[test]
    fn test_empty_input_keeps_layout() {
        let full = sample_data();
        let empty = empty_data();
        let full_doc = assemble(&full, render_all(&full).unwrap());
        let empty_doc = assemble(&empty, render_all(&empty).unwrap());

        assert_eq!(empty_doc.page_count(), 3);
        for (a, b) in full_doc.pages().iter().zip(empty_doc.pages()) {
            let rects_a: Vec<Rect> = a.charts().map(|(_, r)| r).collect();
            let rects_b: Vec<Rect> = b.charts().map(|(_, r)| r).collect();
            assert_eq!(rects_a, rects_b);
        }
    }

    #[test]
    fn test_chart_placement() {
        let data = sample_data();
        let doc = assemble(&data, render_all(&data).unwrap());

        let (growth, rect) = doc.pages()[0].charts().next().unwrap();
        assert_eq!(growth.role, crate::charts::ChartRole::Growth);
        assert_eq!(rect, Rect::new(10.0, 30.0, 190.0, 95.0));

        let breakdown: Vec<Rect> = doc.pages()[1].charts().map(|(_, r)| r).collect();
        assert_eq!(breakdown[0].x, 10.0);
        assert_eq!(breakdown[1].x, 110.0);
        assert_eq!(breakdown[0].y, breakdown[1].y);
        assert!(breakdown[2].y > breakdown[0].bottom());
        assert!(breakdown[2].bottom() <= PAGE_HEIGHT_MM - BOTTOM_MARGIN_MM);
    }

    fn assert_lines_inside(element: &PageElement) {
        let rect = element.rect();
        let line_height = match element {
            PageElement::TextBlock { line_height, .. } | PageElement::TextRows { line_height, .. } => {
                *line_height
            }
            other => panic!("expected flowing text, got {other:?}"),
        };
        for (x, y) in element.line_origins() {
            assert!(x >= rect.x && x < rect.x + rect.width);
            assert!(y >= rect.y && y + line_height <= rect.bottom() + 1e-3);
        }
    }

    #[test]
    fn test_many_performance_rows_flow_into_columns() {
        let mut data = sample_data();
        data.performance_rows = vec![data.performance_rows[0]; 40];
        let doc = assemble(&data, render_all(&data).unwrap());

        assert_eq!(doc.page_count(), 3);
        let element = doc.pages()[0].elements.last().unwrap();
        match element {
            PageElement::TextRows {
                rows,
                font_size,
                columns,
                ..
            } => {
                assert_eq!(rows.len(), 40);
                assert_eq!(*font_size, BODY_FONT_PT);
                assert_eq!(*columns, 3);
            }
            other => panic!("expected performance rows, got {other:?}"),
        }
        assert_lines_inside(element);
    }

    #[test]
    fn test_thousand_performance_rows_keep_minimum_font() {
        let mut data = sample_data();
        data.performance_rows = vec![data.performance_rows[0]; 1000];
        let doc = assemble(&data, render_all(&data).unwrap());

        assert_eq!(doc.page_count(), 3);
        let element = doc.pages()[0].elements.last().unwrap();
        match element {
            PageElement::TextRows {
                rows,
                font_size,
                columns,
                ..
            } => {
                assert_eq!(rows.len(), 1000);
                assert_eq!(*font_size, MIN_TEXT_FONT_PT);
                assert_eq!(*columns, MAX_ROW_COLUMNS);
            }
            other => panic!("expected performance rows, got {other:?}"),
        }
        assert_lines_inside(element);
    }

    #[test]
    fn test_long_disclosures_shrink_font() {
        let mut data = sample_data();
        data.disclosures = vec!["Past performance does not guarantee future results. ".repeat(12); 6];
        let doc = assemble(&data, render_all(&data).unwrap());

        let element = &doc.pages()[2].elements[1];
        match element {
            PageElement::TextBlock {
                font_size,
                lines,
                columns,
                ..
            } => {
                assert!(*font_size < BODY_FONT_PT);
                assert!(*font_size >= MIN_TEXT_FONT_PT);
                assert_eq!(*columns, 1);
                assert!(lines.len() > 6);
            }
            other => panic!("expected disclosure block, got {other:?}"),
        }
        assert_lines_inside(element);
    }

    #[test]
    fn test_every_disclosure_paragraph_is_kept() {
        let mut data = sample_data();
        data.disclosures = (1..=301)
            .map(|i| format!("Risk warning {} applies to this fund.", i))
            .collect();
        data.disclosures.push("Final risk warning.".to_string());
        let doc = assemble(&data, render_all(&data).unwrap());

        assert_eq!(doc.page_count(), 3);
        let element = &doc.pages()[2].elements[1];
        match element {
            PageElement::TextBlock {
                font_size, lines, ..
            } => {
                assert_eq!(*font_size, MIN_TEXT_FONT_PT);
                assert_eq!(lines.len(), 302);
                assert_eq!(lines.last().map(String::as_str), Some("Final risk warning."));
                assert!(lines.iter().any(|l| l == "Risk warning 150 applies to this fund."));
            }
            other => panic!("expected disclosure block, got {other:?}"),
        }
        assert_lines_inside(element);
    }

    #[test]
    fn test_line_origins_fill_columns_top_down() {
        let element = PageElement::TextRows {
            rows: (0..5).map(|i| i.to_string()).collect(),
            rect: Rect::new(10.0, 100.0, 190.0, 50.0),
            font_size: BODY_FONT_PT,
            line_height: 10.0,
            columns: 2,
        };
        let width = column_width(190.0, 2);
        assert_eq!(
            element.line_origins(),
            vec![
                (10.0, 100.0),
                (10.0, 110.0),
                (10.0, 120.0),
                (10.0 + width + TEXT_COLUMN_GAP_MM, 100.0),
                (10.0 + width + TEXT_COLUMN_GAP_MM, 110.0),
            ]
        );
    }

    #[test]
    fn test_assembly_is_idempotent() {
        let data = sample_data();
        let charts = render_all(&data).unwrap();
        let first = assemble(&data, charts.clone());
        let second = assemble(&data, charts);
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_title() {
        let data = sample_data();
        let doc = ReportAssembler::new("Global Equity Fund").assemble(&data, render_all(&data).unwrap());
        assert_eq!(doc.title, "Global Equity Fund");
        assert_eq!(doc.pages()[0].text_lines()[0], "Global Equity Fund");
    }
}

use crate::error::{FactsheetError, Result};
use crate::schema::{GrowthSeries, ReportData};
use log::{debug, warn};
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};

pub const GROWTH_CHART_SIZE: (u32, u32) = (1000, 500);
pub const PIE_CHART_SIZE: (u32, u32) = (700, 500);
pub const BAR_CHART_SIZE: (u32, u32) = (800, 480);

const FONT: &str = "sans-serif";
const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
const SERIES_COLORS: [RGBColor; 8] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
];
const PIE_COLORS: [RGBColor; 8] = [
    RGBColor(99, 110, 250),
    RGBColor(239, 85, 59),
    RGBColor(0, 204, 150),
    RGBColor(171, 99, 250),
    RGBColor(255, 161, 90),
    RGBColor(25, 211, 243),
    RGBColor(255, 102, 146),
    RGBColor(182, 232, 128),
];

/// Axis bounds are clamped to this magnitude so the span stays finite.
const AXIS_LIMIT: f64 = f64::MAX / 2.0;

type DrawResult = std::result::Result<(), Box<dyn std::error::Error>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartRole {
    Growth,
    Regional,
    Sector,
    Yearly,
}

/// A rendered chart held in memory as an SVG document.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartArtifact {
    pub role: ChartRole,
    pub width: u32,
    pub height: u32,
    pub svg: String,
}

impl ChartArtifact {
    /// Height divided by width, used to keep the aspect ratio when placing the chart.
    pub fn aspect_ratio(&self) -> f32 {
        self.height as f32 / self.width.max(1) as f32
    }
}

/// The four charts of a factsheet, handed to the assembler by value.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSet {
    pub growth: ChartArtifact,
    pub regional: ChartArtifact,
    pub sector: ChartArtifact,
    pub yearly: ChartArtifact,
}

impl ChartSet {
    pub fn iter(&self) -> impl Iterator<Item = &ChartArtifact> {
        [&self.growth, &self.regional, &self.sector, &self.yearly].into_iter()
    }
}

/// Renders every chart the factsheet needs from normalized data.
pub fn render_all(data: &ReportData) -> Result<ChartSet> {
    let (regional_labels, regional_values): (Vec<String>, Vec<f64>) = data
        .regional_exposure
        .iter()
        .map(|e| (e.label.clone(), e.value))
        .unzip();
    let (sector_labels, sector_values): (Vec<String>, Vec<f64>) = data
        .sector_exposure
        .iter()
        .map(|e| (e.label.clone(), e.value))
        .unzip();
    let (years, yearly_values): (Vec<String>, Vec<f64>) = data
        .yearly_performance
        .iter()
        .map(|y| (y.year.clone(), y.value))
        .unzip();

    Ok(ChartSet {
        growth: render_growth(&data.time_axis, &data.growth_series)?,
        regional: render_pie(
            ChartRole::Regional,
            "Regional Exposure",
            &regional_labels,
            &regional_values,
        )?,
        sector: render_pie(
            ChartRole::Sector,
            "Equity Sectors",
            &sector_labels,
            &sector_values,
        )?,
        yearly: render_bar(&years, &yearly_values)?,
    })
}

/// Line chart with one labeled line per series, in the order given.
pub fn render_growth(time_axis: &[String], series: &[GrowthSeries]) -> Result<ChartArtifact> {
    for s in series {
        if s.values.len() != time_axis.len() {
            return Err(FactsheetError::RenderFailure(format!(
                "Series '{}' has {} values for {} time points",
                s.name,
                s.values.len(),
                time_axis.len()
            )));
        }
        ensure_finite(&s.name, &s.values)?;
    }

    render_svg(ChartRole::Growth, GROWTH_CHART_SIZE, |root| {
        draw_growth(root, time_axis, series)
    })
}

/// Pie chart with slices in the order given; no sorting by value.
///
/// Slices that are zero or negative cannot be drawn and are left out; when
/// nothing positive remains the chart shows the "No data" placeholder.
pub fn render_pie(
    role: ChartRole,
    title: &str,
    labels: &[String],
    values: &[f64],
) -> Result<ChartArtifact> {
    if labels.len() != values.len() {
        return Err(FactsheetError::RenderFailure(format!(
            "{} has {} labels but {} values",
            title,
            labels.len(),
            values.len()
        )));
    }
    ensure_finite(title, values)?;

    let (labels, values): (Vec<String>, Vec<f64>) = labels
        .iter()
        .zip(values)
        .filter(|(label, value)| {
            if **value > 0.0 {
                return true;
            }
            warn!("{}: leaving out slice '{}' with value {}", title, label, value);
            false
        })
        .map(|(label, value)| (label.clone(), *value))
        .unzip();

    render_svg(role, PIE_CHART_SIZE, |root| draw_pie(root, title, &labels, &values))
}

pub fn render_bar(years: &[String], values: &[f64]) -> Result<ChartArtifact> {
    if years.len() != values.len() {
        return Err(FactsheetError::RenderFailure(format!(
            "Yearly Performance has {} years but {} values",
            years.len(),
            values.len()
        )));
    }
    ensure_finite("Yearly Performance", values)?;

    render_svg(ChartRole::Yearly, BAR_CHART_SIZE, |root| {
        draw_bar(root, years, values)
    })
}

fn ensure_finite(name: &str, values: &[f64]) -> Result<()> {
    match values.iter().find(|v| !v.is_finite()) {
        Some(v) => Err(FactsheetError::RenderFailure(format!(
            "{} contains non-finite value {}",
            name, v
        ))),
        None => Ok(()),
    }
}

fn render_svg<F>(role: ChartRole, size: (u32, u32), draw: F) -> Result<ChartArtifact>
where
    F: FnOnce(&DrawingArea<SVGBackend, Shift>) -> DrawResult,
{
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        draw(&root).map_err(|e| {
            FactsheetError::RenderFailure(format!("Failed to draw {:?} chart: {}", role, e))
        })?;
        root.present().map_err(|e| {
            FactsheetError::RenderFailure(format!("Failed to finish {:?} chart: {}", role, e))
        })?;
    }

    debug!("Rendered {:?} chart ({} bytes of SVG)", role, svg.len());
    Ok(ChartArtifact {
        role,
        width: size.0,
        height: size.1,
        svg,
    })
}

/// Padded (min, max) of the values, always a non-empty range whose span
/// is finite.
fn value_range(values: impl Iterator<Item = f64>, include_zero: bool) -> (f64, f64) {
    let (mut lo, mut hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if include_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }

    // scaled before subtracting: hi - lo overflows for spans beyond f64::MAX
    let pad = if hi > lo {
        hi * 0.05 - lo * 0.05
    } else {
        (hi.abs() * 0.05).max(1.0)
    };
    let lo = if include_zero && lo == 0.0 { 0.0 } else { lo - pad };
    let hi = hi + pad;
    (lo.max(-AXIS_LIMIT), hi.min(AXIS_LIMIT))
}

/// Tick label for a value axis; very large or small magnitudes use
/// scientific notation.
fn axis_label(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-3..1e7).contains(&magnitude) {
        format!("{:.2e}", value)
    } else {
        format!("{}", (value * 1e4).round() / 1e4)
    }
}

fn draw_no_data(root: &DrawingArea<SVGBackend, Shift>) -> DrawResult {
    let (w, h) = root.dim_in_pixel();
    root.draw(&Text::new(
        "No data",
        (w as i32 / 2 - 35, h as i32 / 2),
        (FONT, 20).into_font().color(&BLACK),
    ))?;
    Ok(())
}

fn label_at(labels: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

fn draw_growth(
    root: &DrawingArea<SVGBackend, Shift>,
    time_axis: &[String],
    series: &[GrowthSeries],
) -> DrawResult {
    root.fill(&WHITE)?;

    let x_max = time_axis.len().saturating_sub(1).max(1) as f64;
    let (y_min, y_max) = value_range(series.iter().flat_map(|s| s.values.iter().copied()), false);

    let mut chart = ChartBuilder::on(root)
        .caption("Investment Growth", (FONT, 28))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(0f64..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Time")
        .y_desc("Growth Value")
        .x_labels(time_axis.len().clamp(2, 12))
        .x_label_formatter(&|x| label_at(time_axis, *x))
        .y_label_formatter(&|y| axis_label(*y))
        .draw()?;

    if series.is_empty() {
        return draw_no_data(root);
    }

    for (idx, s) in series.iter().enumerate() {
        let color = SERIES_COLORS[idx % SERIES_COLORS.len()];
        chart
            .draw_series(LineSeries::new(
                s.values.iter().enumerate().map(|(i, v)| (i as f64, *v)),
                color.stroke_width(2),
            ))?
            .label(s.name.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    Ok(())
}

fn draw_pie(
    root: &DrawingArea<SVGBackend, Shift>,
    title: &str,
    labels: &[String],
    values: &[f64],
) -> DrawResult {
    root.fill(&WHITE)?;
    let area = root.titled(title, (FONT, 28))?;

    if values.is_empty() {
        return draw_no_data(&area);
    }

    // shares only; dividing by the largest slice keeps the total finite
    let largest = values.iter().copied().fold(0.0, f64::max);
    let shares: Vec<f64> = values.iter().map(|v| v / largest).collect();

    let (w, h) = area.dim_in_pixel();
    let center = (w as i32 / 2, h as i32 / 2);
    let radius = w.min(h) as f64 * 0.33;
    let colors: Vec<RGBColor> = (0..values.len())
        .map(|i| PIE_COLORS[i % PIE_COLORS.len()])
        .collect();

    let mut pie = Pie::new(&center, &radius, &shares, &colors, labels);
    pie.label_style((FONT, 16).into_font().color(&BLACK));
    pie.percentages((FONT, 14).into_font().color(&WHITE));
    area.draw(&pie)?;

    Ok(())
}

fn draw_bar(root: &DrawingArea<SVGBackend, Shift>, years: &[String], values: &[f64]) -> DrawResult {
    root.fill(&WHITE)?;

    let bars = values.len().max(1) as i32;
    let (y_min, y_max) = value_range(values.iter().copied(), true);

    let mut chart = ChartBuilder::on(root)
        .caption("Yearly Performance", (FONT, 28))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((0..bars).into_segmented(), y_min..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Year")
        .y_desc("Performance")
        .x_labels(bars as usize)
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => years.get(*i as usize).cloned().unwrap_or_default(),
            _ => String::new(),
        })
        .y_label_formatter(&|y| axis_label(*y))
        .draw()?;

    if values.is_empty() {
        return draw_no_data(root);
    }

    chart.draw_series(values.iter().enumerate().map(|(i, v)| {
        let (bottom, top) = if *v >= 0.0 { (0.0, *v) } else { (*v, 0.0) };
        let mut bar = Rectangle::new(
            [
                (SegmentValue::Exact(i as i32), bottom),
                (SegmentValue::Exact(i as i32 + 1), top),
            ],
            SKY_BLUE.filled(),
        );
        bar.set_margin(0, 0, 8, 8);
        bar
    }))?;

    Ok(())
}

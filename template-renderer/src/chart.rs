//! Chart drawing and chart-handle lifecycle.
//!
//! Charts are drawn as SVG fragments in local coordinates. A drawn chart is
//! owned by a [`ChartHandle`] bound to one canvas through a
//! [`ChartRegistry`]; the registry refuses a second live binding on the
//! same canvas, and dropping the handle releases the binding.
//! [`ChartSlot`] is the per-element owner that disposes the previous handle
//! before creating the next one.

use std::collections::HashMap;
use std::fmt::Write;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use template_core::{ChartData, Dataset};

use crate::color::{safe_color, ColorRole};
use crate::error::{RenderError, RenderResult};
use crate::svg::escape_xml;

/// Palette used when a dataset has no colors of its own.
const PALETTE: [&str; 6] = [
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948",
];

/// Colors the live view uses for a dataset without a background color.
const LIVE_FALLBACK_COLORS: [&str; 4] = [
    "rgba(75,192,192,0.6)",
    "rgba(255,99,132,0.6)",
    "rgba(255,206,86,0.6)",
    "rgba(54,162,235,0.6)",
];

const GRID_COLOR: &str = "#e5e7eb";
const AXIS_TEXT_COLOR: &str = "#6b7280";

/// Chart types supported by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartType {
    /// Vertical bar chart.
    Bar,
    /// Line chart.
    Line,
    /// Pie chart.
    Pie,
    /// Pie chart with a hollow center.
    Doughnut,
    /// Radar (spider) chart.
    Radar,
}

impl ChartType {
    /// Parse a chart type token, falling back to a bar chart.
    #[must_use]
    pub fn parse_or_bar(token: &str) -> Self {
        token.parse().unwrap_or(Self::Bar)
    }

    /// The type's token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Pie => "pie",
            Self::Doughnut => "doughnut",
            Self::Radar => "radar",
        }
    }
}

impl FromStr for ChartType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bar" => Ok(Self::Bar),
            "line" => Ok(Self::Line),
            "pie" => Ok(Self::Pie),
            "doughnut" | "donut" => Ok(Self::Doughnut),
            "radar" => Ok(Self::Radar),
            _ => Err(format!("Unknown chart type: {s}")),
        }
    }
}

/// One drawable data series.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Series label.
    pub label: String,
    /// Values; non-finite values draw as zero.
    pub values: Vec<f64>,
    /// Fill colors, cycled per data point.
    pub fills: Vec<String>,
    /// Stroke color.
    pub stroke: String,
}

impl Series {
    fn fill_at(&self, index: usize) -> &str {
        if self.fills.is_empty() {
            PALETTE[index % PALETTE.len()]
        } else {
            &self.fills[index % self.fills.len()]
        }
    }

    fn value_at(&self, index: usize) -> f64 {
        self.values
            .get(index)
            .copied()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }
}

/// Everything needed to draw a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    /// Chart type.
    pub chart_type: ChartType,
    /// Category labels.
    pub labels: Vec<String>,
    /// Data series.
    pub series: Vec<Series>,
    /// Draw a legend above the plot.
    pub legend: bool,
    /// Draw dashed horizontal grid lines.
    pub grid: bool,
    /// Whether the chart animates in (live view only).
    pub animation: bool,
}

impl ChartSpec {
    /// Spec for the interactive view: the first dataset, with placeholder
    /// content where the element has none.
    #[must_use]
    pub fn live(data: &ChartData) -> Self {
        let labels = if data.labels.is_empty() {
            ["A", "B", "C", "D"].map(String::from).to_vec()
        } else {
            data.labels.clone()
        };
        let first = data.datasets.first();
        let values = first
            .filter(|d| !d.data.is_empty())
            .map_or_else(|| vec![10.0, 20.0, 30.0, 40.0], |d| d.data.clone());
        let fills = first
            .and_then(|d| d.background_color.as_ref())
            .map_or_else(
                || LIVE_FALLBACK_COLORS.map(String::from).to_vec(),
                |paint| paint_colors(paint, values.len()),
            );

        Self {
            chart_type: ChartType::parse_or_bar(&data.chart_type),
            labels,
            series: vec![Series {
                label: first
                    .map(|d| d.label.clone())
                    .filter(|l| !l.is_empty())
                    .unwrap_or_else(|| "Dataset".to_string()),
                values,
                fills,
                stroke: "rgba(0,0,0,0.8)".to_string(),
            }],
            legend: false,
            grid: false,
            animation: true,
        }
    }

    /// Spec for an offscreen export canvas: every dataset, legend on,
    /// animation off.
    #[must_use]
    pub fn offscreen(data: &ChartData) -> Self {
        Self {
            chart_type: ChartType::parse_or_bar(&data.chart_type),
            labels: data.labels.clone(),
            series: data
                .datasets
                .iter()
                .enumerate()
                .map(|(i, d)| offscreen_series(d, i, data.labels.len()))
                .collect(),
            legend: true,
            grid: true,
            animation: false,
        }
    }

    fn category_count(&self) -> usize {
        self.series
            .iter()
            .map(|s| s.values.len())
            .max()
            .unwrap_or(0)
            .max(self.labels.len())
    }
}

fn paint_colors(paint: &template_core::Paint, count: usize) -> Vec<String> {
    (0..count.max(1))
        .filter_map(|i| paint.color_at(i))
        .map(|c| safe_color(c, ColorRole::Surface))
        .collect()
}

fn offscreen_series(dataset: &Dataset, index: usize, label_count: usize) -> Series {
    let count = dataset.data.len().max(label_count);
    let fills = dataset
        .background_color
        .as_ref()
        .map(|paint| paint_colors(paint, count))
        .unwrap_or_default();
    let stroke = dataset.border_color.as_deref().map_or_else(
        || {
            fills
                .first()
                .cloned()
                .unwrap_or_else(|| PALETTE[index % PALETTE.len()].to_string())
        },
        |c| safe_color(c, ColorRole::Text),
    );
    Series {
        label: dataset.label.clone(),
        values: dataset.data.clone(),
        fills,
        stroke,
    }
}

/// Draw a chart into `svg` in local coordinates `(0, 0)..(width, height)`.
pub fn render_chart_svg(svg: &mut String, spec: &ChartSpec, width: f32, height: f32) {
    let mut top = 6.0_f32;
    if spec.legend && !spec.series.is_empty() {
        render_legend(svg, spec, width);
        top += 16.0;
    }

    match spec.chart_type {
        ChartType::Bar => render_bars(svg, spec, Plot::new(top, width, height)),
        ChartType::Line => render_lines(svg, spec, Plot::new(top, width, height)),
        ChartType::Pie => render_pie(svg, spec, top, width, height, 0.0),
        ChartType::Doughnut => render_pie(svg, spec, top, width, height, 0.5),
        ChartType::Radar => render_radar(svg, spec, top, width, height),
    }
}

/// Plot rectangle for cartesian charts.
#[derive(Debug, Clone, Copy)]
struct Plot {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

impl Plot {
    fn new(top: f32, width: f32, height: f32) -> Self {
        let (left, right, bottom) = (30.0, 6.0, 16.0);
        Self {
            x: left,
            y: top,
            w: (width - left - right).max(1.0),
            h: (height - top - bottom).max(1.0),
        }
    }
}

fn render_legend(svg: &mut String, spec: &ChartSpec, width: f32) {
    let mut x = 6.0_f32;
    for (i, series) in spec.series.iter().enumerate() {
        if x > width - 20.0 {
            break;
        }
        let color = escape_xml(series.fill_at(i));
        let label = escape_xml(&series.label);
        let _ = write!(
            svg,
            "<rect x=\"{x}\" y=\"4\" width=\"10\" height=\"10\" fill=\"{color}\"/><text x=\"{}\" y=\"13\" font-size=\"10\" fill=\"{AXIS_TEXT_COLOR}\" font-family=\"sans-serif\">{label}</text>",
            x + 14.0,
        );
        #[allow(clippy::cast_precision_loss)]
        let advance = 24.0 + series.label.chars().count() as f32 * 5.5;
        x += advance;
    }
}

fn max_value(spec: &ChartSpec) -> f64 {
    let max = spec
        .series
        .iter()
        .flat_map(|s| s.values.iter().copied())
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    if max <= 0.0 {
        1.0
    } else {
        max
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn render_axes(svg: &mut String, spec: &ChartSpec, plot: Plot, max: f64) {
    const TICKS: usize = 4;
    for tick in 0..=TICKS {
        let ratio = tick as f32 / TICKS as f32;
        let y = plot.y + plot.h - plot.h * ratio;
        if spec.grid && tick > 0 {
            let _ = write!(
                svg,
                "<line x1=\"{}\" y1=\"{y}\" x2=\"{}\" y2=\"{y}\" stroke=\"{GRID_COLOR}\" stroke-dasharray=\"5,5\"/>",
                plot.x,
                plot.x + plot.w,
            );
        }
        let value = max * f64::from(ratio);
        let _ = write!(
            svg,
            "<text x=\"{}\" y=\"{}\" font-size=\"9\" fill=\"{AXIS_TEXT_COLOR}\" text-anchor=\"end\" font-family=\"sans-serif\">{}</text>",
            plot.x - 4.0,
            y + 3.0,
            format_tick(value),
        );
    }
    let _ = write!(
        svg,
        "<line x1=\"{x}\" y1=\"{b}\" x2=\"{}\" y2=\"{b}\" stroke=\"#9ca3af\"/>",
        plot.x + plot.w,
        x = plot.x,
        b = plot.y + plot.h,
    );

    let count = spec.category_count().max(1);
    let slot = plot.w / count as f32;
    for (i, label) in spec.labels.iter().enumerate() {
        let cx = plot.x + slot * (i as f32 + 0.5);
        let _ = write!(
            svg,
            "<text x=\"{cx}\" y=\"{}\" font-size=\"9\" fill=\"{AXIS_TEXT_COLOR}\" text-anchor=\"middle\" font-family=\"sans-serif\">{}</text>",
            plot.y + plot.h + 11.0,
            escape_xml(label),
        );
    }
}

fn format_tick(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn render_bars(svg: &mut String, spec: &ChartSpec, plot: Plot) {
    let max = max_value(spec);
    render_axes(svg, spec, plot, max);

    let count = spec.category_count();
    let groups = spec.series.len();
    if count == 0 || groups == 0 {
        return;
    }

    let slot = plot.w / count as f32;
    let inner = slot * 0.8;
    let bar_width = inner / groups as f32;
    for (s, series) in spec.series.iter().enumerate() {
        for i in 0..count {
            let value = series.value_at(i).max(0.0);
            let bar_h = ((value / max) as f32) * plot.h;
            let bx = plot.x + slot * i as f32 + (slot - inner) / 2.0 + bar_width * s as f32;
            let by = plot.y + plot.h - bar_h;
            let _ = write!(
                svg,
                "<rect x=\"{bx}\" y=\"{by}\" width=\"{bar_width}\" height=\"{bar_h}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>",
                escape_xml(series.fill_at(i)),
                escape_xml(&series.stroke),
            );
        }
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn render_lines(svg: &mut String, spec: &ChartSpec, plot: Plot) {
    let max = max_value(spec);
    render_axes(svg, spec, plot, max);

    let count = spec.category_count();
    if count == 0 {
        return;
    }
    let slot = plot.w / count as f32;

    for series in &spec.series {
        let points: Vec<(f32, f32)> = (0..series.values.len())
            .map(|i| {
                let value = series.value_at(i).max(0.0);
                (
                    plot.x + slot * (i as f32 + 0.5),
                    plot.y + plot.h - ((value / max) as f32) * plot.h,
                )
            })
            .collect();
        let path: Vec<String> = points.iter().map(|(x, y)| format!("{x},{y}")).collect();
        let stroke = escape_xml(&series.stroke);
        let _ = write!(
            svg,
            "<polyline points=\"{}\" fill=\"none\" stroke=\"{stroke}\" stroke-width=\"2\"/>",
            path.join(" "),
        );
        for (i, (x, y)) in points.iter().enumerate() {
            let _ = write!(
                svg,
                "<circle cx=\"{x}\" cy=\"{y}\" r=\"3\" fill=\"{}\" stroke=\"{stroke}\"/>",
                escape_xml(series.fill_at(i)),
            );
        }
    }
}

fn render_pie(svg: &mut String, spec: &ChartSpec, top: f32, width: f32, height: f32, cutout: f64) {
    let Some(series) = spec.series.first() else {
        return;
    };
    let values: Vec<f64> = (0..series.values.len())
        .map(|i| series.value_at(i).max(0.0))
        .collect();
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        return;
    }

    let cx = f64::from(width / 2.0);
    let cy = f64::from(top + (height - top) / 2.0);
    let radius = f64::from(((width.min(height - top)) / 2.0 - 6.0).max(1.0));
    let inner = radius * cutout;
    let mut start = -std::f64::consts::FRAC_PI_2;

    for (i, value) in values.iter().enumerate() {
        if *value <= 0.0 {
            continue;
        }
        let sweep = value / total * std::f64::consts::TAU;
        let color = escape_xml(series.fill_at(i));
        if sweep >= std::f64::consts::TAU - 1e-9 {
            let _ = write!(
                svg,
                "<circle cx=\"{cx}\" cy=\"{cy}\" r=\"{radius}\" fill=\"{color}\"/>"
            );
            if inner > 0.0 {
                let _ = write!(
                    svg,
                    "<circle cx=\"{cx}\" cy=\"{cy}\" r=\"{inner}\" fill=\"#ffffff\"/>"
                );
            }
            return;
        }
        let end = start + sweep;
        let large = i32::from(sweep > std::f64::consts::PI);
        let (ox1, oy1) = (cx + radius * start.cos(), cy + radius * start.sin());
        let (ox2, oy2) = (cx + radius * end.cos(), cy + radius * end.sin());
        let d = if inner > 0.0 {
            let (ix1, iy1) = (cx + inner * end.cos(), cy + inner * end.sin());
            let (ix2, iy2) = (cx + inner * start.cos(), cy + inner * start.sin());
            format!(
                "M{ox1},{oy1} A{radius},{radius} 0 {large},1 {ox2},{oy2} L{ix1},{iy1} A{inner},{inner} 0 {large},0 {ix2},{iy2} Z"
            )
        } else {
            format!("M{cx},{cy} L{ox1},{oy1} A{radius},{radius} 0 {large},1 {ox2},{oy2} Z")
        };
        let _ = write!(
            svg,
            "<path d=\"{d}\" fill=\"{color}\" stroke=\"#ffffff\" stroke-width=\"1\"/>"
        );
        start = end;
    }
}

#[allow(clippy::cast_precision_loss)]
fn render_radar(svg: &mut String, spec: &ChartSpec, top: f32, width: f32, height: f32) {
    let count = spec.category_count();
    if count < 3 {
        // A radar needs at least a triangle; draw it as bars instead.
        render_bars(svg, spec, Plot::new(top, width, height));
        return;
    }

    let max = max_value(spec);
    let cx = f64::from(width / 2.0);
    let cy = f64::from(top + (height - top) / 2.0);
    let radius = f64::from(((width.min(height - top)) / 2.0 - 14.0).max(1.0));
    let angle = |i: usize| -std::f64::consts::FRAC_PI_2 + std::f64::consts::TAU * i as f64 / count as f64;

    for ring in 1..=3 {
        let r = radius * f64::from(ring) / 3.0;
        let points: Vec<String> = (0..count)
            .map(|i| format!("{},{}", cx + r * angle(i).cos(), cy + r * angle(i).sin()))
            .collect();
        let _ = write!(
            svg,
            "<polygon points=\"{}\" fill=\"none\" stroke=\"{GRID_COLOR}\"/>",
            points.join(" "),
        );
    }
    for (i, label) in spec.labels.iter().enumerate().take(count) {
        let (x, y) = (cx + radius * angle(i).cos(), cy + radius * angle(i).sin());
        let _ = write!(
            svg,
            "<line x1=\"{cx}\" y1=\"{cy}\" x2=\"{x}\" y2=\"{y}\" stroke=\"{GRID_COLOR}\"/><text x=\"{}\" y=\"{}\" font-size=\"9\" fill=\"{AXIS_TEXT_COLOR}\" text-anchor=\"middle\" font-family=\"sans-serif\">{}</text>",
            cx + (radius + 8.0) * angle(i).cos(),
            cy + (radius + 8.0) * angle(i).sin() + 3.0,
            escape_xml(label),
        );
    }

    for series in &spec.series {
        let points: Vec<String> = (0..count)
            .map(|i| {
                let r = radius * (series.value_at(i).max(0.0) / max);
                format!("{},{}", cx + r * angle(i).cos(), cy + r * angle(i).sin())
            })
            .collect();
        let _ = write!(
            svg,
            "<polygon points=\"{}\" fill=\"{}\" fill-opacity=\"0.5\" stroke=\"{}\" stroke-width=\"2\"/>",
            points.join(" "),
            escape_xml(series.fill_at(0)),
            escape_xml(&series.stroke),
        );
    }
}

/// Identifier of a drawing surface a chart can bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CanvasId(u64);

/// Tracks which canvases currently have a live chart.
#[derive(Debug, Clone, Default)]
pub struct ChartRegistry {
    bindings: Arc<RwLock<HashMap<CanvasId, u64>>>,
    next_canvas: Arc<AtomicU64>,
    next_binding: Arc<AtomicU64>,
}

impl ChartRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh canvas.
    #[must_use]
    pub fn allocate_canvas(&self) -> CanvasId {
        CanvasId(self.next_canvas.fetch_add(1, Ordering::Relaxed))
    }

    /// Draw a chart and bind it to `canvas`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Chart`] if the canvas already has a live chart.
    pub fn bind(
        &self,
        canvas: CanvasId,
        spec: ChartSpec,
        width: f32,
        height: f32,
    ) -> RenderResult<ChartHandle> {
        let binding = {
            let mut bindings = self
                .bindings
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if bindings.contains_key(&canvas) {
                return Err(RenderError::Chart(format!(
                    "canvas {} already has a live chart",
                    canvas.0
                )));
            }
            let binding = self.next_binding.fetch_add(1, Ordering::Relaxed);
            bindings.insert(canvas, binding);
            binding
        };

        let mut svg = String::with_capacity(2048);
        render_chart_svg(&mut svg, &spec, width, height);
        tracing::debug!(canvas = canvas.0, chart = spec.chart_type.as_str(), "Chart bound");

        Ok(ChartHandle {
            registry: self.clone(),
            canvas,
            binding,
            spec,
            width,
            height,
            svg,
        })
    }

    /// Number of canvases with a live chart.
    #[must_use]
    pub fn live_bindings(&self) -> usize {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether a canvas has a live chart.
    #[must_use]
    pub fn is_bound(&self, canvas: CanvasId) -> bool {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&canvas)
    }

    fn release(&self, canvas: CanvasId, binding: u64) {
        let mut bindings = self
            .bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if bindings.get(&canvas) == Some(&binding) {
            bindings.remove(&canvas);
        }
    }
}

/// A live chart bound to a canvas. Dropping it disposes the chart.
#[derive(Debug)]
pub struct ChartHandle {
    registry: ChartRegistry,
    canvas: CanvasId,
    binding: u64,
    spec: ChartSpec,
    width: f32,
    height: f32,
    svg: String,
}

impl ChartHandle {
    /// The canvas this chart is bound to.
    #[must_use]
    pub const fn canvas(&self) -> CanvasId {
        self.canvas
    }

    /// The spec the chart was drawn from.
    #[must_use]
    pub const fn spec(&self) -> &ChartSpec {
        &self.spec
    }

    /// Drawn size.
    #[must_use]
    pub const fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// The drawn chart as an SVG fragment in local coordinates.
    #[must_use]
    pub fn svg(&self) -> &str {
        &self.svg
    }
}

impl Drop for ChartHandle {
    fn drop(&mut self) {
        self.registry.release(self.canvas, self.binding);
        tracing::debug!(canvas = self.canvas.0, "Chart disposed");
    }
}

/// Owner of the chart drawn on one canvas.
#[derive(Debug)]
pub struct ChartSlot {
    registry: ChartRegistry,
    canvas: CanvasId,
    handle: Option<ChartHandle>,
}

impl ChartSlot {
    /// A slot with a freshly allocated canvas and no chart.
    #[must_use]
    pub fn new(registry: &ChartRegistry) -> Self {
        Self {
            registry: registry.clone(),
            canvas: registry.allocate_canvas(),
            handle: None,
        }
    }

    /// Replace the chart: the previous one is disposed first.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Chart`] if the canvas could not be bound.
    pub fn set(&mut self, spec: ChartSpec, width: f32, height: f32) -> RenderResult<&ChartHandle> {
        self.handle = None;
        let handle = self.registry.bind(self.canvas, spec, width, height)?;
        Ok(self.handle.insert(handle))
    }

    /// Dispose the current chart, if any.
    pub fn clear(&mut self) {
        self.handle = None;
    }

    /// The current chart.
    #[must_use]
    pub const fn handle(&self) -> Option<&ChartHandle> {
        self.handle.as_ref()
    }

    /// The slot's canvas.
    #[must_use]
    pub const fn canvas(&self) -> CanvasId {
        self.canvas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use template_core::Paint;

    fn sample(chart_type: &str) -> ChartData {
        let mut data = ChartData::sample(Some(chart_type));
        data.datasets[0].background_color = Some(Paint::PerPoint(vec![
            "#111111".into(),
            "#222222".into(),
        ]));
        data
    }

    #[test]
    fn test_chart_type_parsing() {
        assert_eq!("Doughnut".parse::<ChartType>(), Ok(ChartType::Doughnut));
        assert_eq!(ChartType::parse_or_bar("scatter"), ChartType::Bar);
        assert_eq!(ChartType::parse_or_bar(""), ChartType::Bar);
    }

    #[test]
    fn test_live_spec_placeholders() {
        let data = ChartData {
            chart_type: String::new(),
            labels: Vec::new(),
            datasets: Vec::new(),
        };
        let spec = ChartSpec::live(&data);
        assert_eq!(spec.chart_type, ChartType::Bar);
        assert_eq!(spec.labels, vec!["A", "B", "C", "D"]);
        assert_eq!(spec.series[0].values, vec![10.0, 20.0, 30.0, 40.0]);
        assert_eq!(spec.series[0].label, "Dataset");
        assert!(!spec.legend);
    }

    #[test]
    fn test_offscreen_spec_has_legend_and_no_animation() {
        let spec = ChartSpec::offscreen(&sample("line"));
        assert!(spec.legend);
        assert!(!spec.animation);
        assert_eq!(spec.series[0].fills[1], "#222222");
    }

    #[test]
    fn test_every_type_draws() {
        for token in ["bar", "line", "pie", "doughnut", "radar"] {
            let mut svg = String::new();
            render_chart_svg(&mut svg, &ChartSpec::offscreen(&sample(token)), 300.0, 200.0);
            assert!(svg.contains("Sample Data"), "{token} legend missing");
            let shape = match token {
                "bar" => "<rect",
                "line" => "<polyline",
                "pie" | "doughnut" => "<path",
                _ => "<polygon",
            };
            assert!(svg.contains(shape), "{token} drew no {shape}");
        }
    }

    #[test]
    fn test_registry_rejects_duplicate_binding() {
        let registry = ChartRegistry::new();
        let canvas = registry.allocate_canvas();
        let spec = ChartSpec::offscreen(&sample("bar"));

        let first = registry.bind(canvas, spec.clone(), 100.0, 100.0).expect("bind");
        assert!(registry.bind(canvas, spec.clone(), 100.0, 100.0).is_err());
        assert_eq!(registry.live_bindings(), 1);

        drop(first);
        assert_eq!(registry.live_bindings(), 0);
        assert!(registry.bind(canvas, spec, 100.0, 100.0).is_ok());
    }

    #[test]
    fn test_slot_disposes_before_rebinding() {
        let registry = ChartRegistry::new();
        let mut slot = ChartSlot::new(&registry);
        for token in ["bar", "pie", "line"] {
            slot.set(ChartSpec::offscreen(&sample(token)), 200.0, 100.0)
                .expect("set");
            assert_eq!(registry.live_bindings(), 1);
        }
        assert_eq!(
            slot.handle().map(|h| h.spec().chart_type),
            Some(ChartType::Line)
        );

        drop(slot);
        assert_eq!(registry.live_bindings(), 0);
    }
}

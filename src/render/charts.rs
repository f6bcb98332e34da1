//! Chart layouts
//!
//! Three fixed figures, each a pure projection of the enriched table:
//! - temporal: density, flow and speed over time plus states over time
//! - fundamentales: entropy vs density, density heatmap by weekday and hour
//! - distribuciones: histograms and boxplots of density and flow

use std::ops::Range;

use plotters::prelude::*;

use super::decorator::{Area, ChartDecorator, DrawResult, PanelSpec};
use crate::analysis::report::HeatmapTable;
use crate::analysis::stats;
use crate::analysis::types::{Metric, TrafficState, TrafficTable};

const STEEL_BLUE: RGBColor = RGBColor(70, 130, 180);
const DARK_ORANGE: RGBColor = RGBColor(255, 140, 0);
const FOREST_GREEN: RGBColor = RGBColor(34, 139, 34);

/// Bins of the density and flow histograms
pub const HISTOGRAM_BINS: usize = 50;

/// The figures produced for every analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Temporal,
    Fundamentals,
    Distributions,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [
        ChartKind::Temporal,
        ChartKind::Fundamentals,
        ChartKind::Distributions,
    ];

    /// Key of the image in the result bundle
    pub fn key(&self) -> &'static str {
        match self {
            ChartKind::Temporal => "temporal",
            ChartKind::Fundamentals => "fundamentales",
            ChartKind::Distributions => "distribuciones",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::Temporal => "Temporal Analysis of Traffic Metrics",
            ChartKind::Fundamentals => "Fundamental Traffic Diagram",
            ChartKind::Distributions => "Density and Flow Distributions",
        }
    }

    /// Pixel size (width, height)
    pub fn size(&self) -> (u32, u32) {
        match self {
            ChartKind::Temporal => (1800, 1000),
            ChartKind::Fundamentals => (1600, 600),
            ChartKind::Distributions => (1400, 1000),
        }
    }
}

/// Draw one figure onto `root`
pub fn draw(
    kind: ChartKind,
    root: Area<'_>,
    decorator: &dyn ChartDecorator,
    table: &TrafficTable,
    heatmap: &HeatmapTable,
) -> DrawResult<()> {
    root.fill(&WHITE)?;
    let area = decorator.figure(root.clone(), kind.title())?;

    match kind {
        ChartKind::Temporal => draw_temporal(&area, decorator, table)?,
        ChartKind::Fundamentals => draw_fundamentals(&area, decorator, table, heatmap)?,
        ChartKind::Distributions => draw_distributions(&area, decorator, table)?,
    }

    root.present()
}

// ============================================================================
// TEMPORAL
// ============================================================================

fn draw_temporal(area: &Area<'_>, decorator: &dyn ChartDecorator, table: &TrafficTable) -> DrawResult<()> {
    let panels = area.split_evenly((2, 2));
    let minutes: Vec<f64> = table.rows().iter().map(|r| r.minute()).collect();
    let x_range = padded_range(&minutes, 0.0);

    let series = [
        (Metric::Density, "Density vs Time", "Density (%)", STEEL_BLUE),
        (Metric::Flow, "Flow vs Time", "Flow (veh/s)", DARK_ORANGE),
        (Metric::Speed, "Speed vs Time", "Speed (% movement)", FOREST_GREEN),
    ];

    for (panel_area, (metric, title, y_desc, color)) in panels.iter().zip(series) {
        let values = table.column(metric);
        let spec = PanelSpec::new(title, x_range.clone(), padded_range(&values, 0.05))
            .axes("Time (minutes)", y_desc);
        let mut panel = decorator.panel(panel_area, &spec)?;
        panel.draw_series(LineSeries::new(
            minutes.iter().copied().zip(values),
            color.mix(0.8).stroke_width(1),
        ))?;
    }

    let density = table.column(Metric::Density);
    let spec = PanelSpec::new(
        "Traffic States over Time",
        x_range,
        padded_range(&density, 0.05),
    )
    .axes("Time (minutes)", "Density (%)");
    let mut panel = decorator.panel(&panels[3], &spec)?;

    for state in TrafficState::BY_SEVERITY {
        let points: Vec<(f64, f64)> = table
            .rows()
            .iter()
            .filter(|r| r.state == state)
            .map(|r| (r.minute(), r.observation.density))
            .collect();
        if points.is_empty() {
            continue;
        }
        let (r, g, b) = state.rgb();
        let color = RGBColor(r, g, b).mix(0.7);
        panel
            .draw_series(points.into_iter().map(|p| Circle::new(p, 2, color.filled())))?
            .label(state.label())
            .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
    }
    decorator.legend(&mut panel)
}

// ============================================================================
// FUNDAMENTALS
// ============================================================================

fn draw_fundamentals(
    area: &Area<'_>,
    decorator: &dyn ChartDecorator,
    table: &TrafficTable,
    heatmap: &HeatmapTable,
) -> DrawResult<()> {
    let panels = area.split_evenly((1, 2));

    let density = table.column(Metric::Density);
    let entropy = table.column(Metric::Entropy);
    let flow = table.column(Metric::Flow);
    let (flow_lo, flow_hi) = (
        stats::min(&flow).unwrap_or(0.0),
        stats::max(&flow).unwrap_or(1.0),
    );

    let spec = PanelSpec::new(
        "Entropy vs Density (color = Flow)",
        padded_range(&density, 0.05),
        padded_range(&entropy, 0.05),
    )
    .axes("Density (%)", "Entropy (bits)");
    let mut panel = decorator.panel(&panels[0], &spec)?;
    panel.draw_series(density.iter().zip(&entropy).zip(&flow).map(|((&d, &e), &f)| {
        let color = plasma(normalize(f, flow_lo, flow_hi)).mix(0.7);
        Circle::new((d, e), 3, color.filled())
    }))?;

    draw_heatmap(&panels[1], decorator, heatmap)
}

fn draw_heatmap(area: &Area<'_>, decorator: &dyn ChartDecorator, heatmap: &HeatmapTable) -> DrawResult<()> {
    let rows = heatmap.weekdays.len();
    let cols = heatmap.hours.len();
    let (lo, hi) = heatmap.value_range().unwrap_or((0.0, 1.0));

    // Row i (Monday first) is drawn at the top: y = rows - 1 - i
    let hour_label = |v: &f64| label_at(*v, cols).map(|c| heatmap.hours[c].to_string()).unwrap_or_default();
    let day_label = |v: &f64| {
        label_at(*v, rows)
            .map(|k| heatmap.weekdays[rows - 1 - k].short().to_string())
            .unwrap_or_default()
    };

    let spec = PanelSpec::new(
        "Mean Density by Day and Hour",
        -0.5..cols.max(1) as f64 - 0.5,
        -0.5..rows.max(1) as f64 - 0.5,
    )
    .axes("Hour of Day", "Weekday")
    .x_labels(cols.max(1), &hour_label)
    .y_labels(rows.max(1), &day_label);
    let mut panel = decorator.panel(area, &spec)?;

    let mut cells = Vec::new();
    for (i, row) in heatmap.cells.iter().enumerate() {
        let y = (rows - 1 - i) as f64;
        for (c, value) in row.iter().enumerate() {
            let Some(value) = value else { continue };
            let x = c as f64;
            cells.push(Rectangle::new(
                [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                yl_or_rd(normalize(*value, lo, hi)).filled(),
            ));
            cells.push(Rectangle::new(
                [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                WHITE.stroke_width(1),
            ));
        }
    }
    panel.draw_series(cells)?;
    Ok(())
}

// ============================================================================
// DISTRIBUTIONS
// ============================================================================

fn draw_distributions(area: &Area<'_>, decorator: &dyn ChartDecorator, table: &TrafficTable) -> DrawResult<()> {
    let panels = area.split_evenly((2, 2));
    let density = table.column(Metric::Density);
    let flow = table.column(Metric::Flow);

    draw_histogram(&panels[0], decorator, &density, "Density Distribution", "Density (%)", STEEL_BLUE)?;
    draw_histogram(&panels[1], decorator, &flow, "Flow Distribution", "Flow (veh/s)", DARK_ORANGE)?;
    draw_boxplot(&panels[2], decorator, &density, "Density Boxplot", "Density (%)", STEEL_BLUE)?;
    draw_boxplot(&panels[3], decorator, &flow, "Flow Boxplot", "Flow (veh/s)", DARK_ORANGE)
}

/// Bin counts over [min, max]; the last bin includes max
pub fn histogram(values: &[f64], bins: usize) -> (Range<f64>, Vec<usize>) {
    let range = match (stats::min(values), stats::max(values)) {
        (Some(lo), Some(hi)) if hi > lo => lo..hi,
        (Some(v), _) => v - 0.5..v + 0.5,
        _ => 0.0..1.0,
    };
    let width = (range.end - range.start) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = ((v - range.start) / width).floor() as usize;
        counts[idx.min(bins - 1)] += 1;
    }
    (range, counts)
}

fn draw_histogram(
    area: &Area<'_>,
    decorator: &dyn ChartDecorator,
    values: &[f64],
    title: &str,
    x_desc: &str,
    color: RGBColor,
) -> DrawResult<()> {
    let (range, counts) = histogram(values, HISTOGRAM_BINS);
    let width = (range.end - range.start) / HISTOGRAM_BINS as f64;
    let top = counts.iter().copied().max().unwrap_or(1).max(1) as f64 * 1.1;

    let spec = PanelSpec::new(title, range.clone(), 0.0..top).axes(x_desc, "Frequency");
    let mut panel = decorator.panel(area, &spec)?;

    let bars = counts.iter().enumerate().filter(|(_, &n)| n > 0).flat_map(|(i, &n)| {
        let x0 = range.start + i as f64 * width;
        let corners = [(x0, 0.0), (x0 + width, n as f64)];
        [
            Rectangle::new(corners, color.mix(0.7).filled()),
            Rectangle::new(corners, BLACK.stroke_width(1)),
        ]
    });
    panel.draw_series(bars)?;
    Ok(())
}

/// Box statistics with whiskers at the furthest samples within 1.5 IQR
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    let sorted = stats::sorted(values);
    let q1 = stats::quantile_sorted(&sorted, 0.25)?;
    let median = stats::quantile_sorted(&sorted, 0.5)?;
    let q3 = stats::quantile_sorted(&sorted, 0.75)?;
    let iqr = q3 - q1;
    let (fence_low, fence_high) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

    let inside = || sorted.iter().copied().filter(|v| (fence_low..=fence_high).contains(v));
    Some(BoxStats {
        q1,
        median,
        q3,
        whisker_low: inside().reduce(f64::min).unwrap_or(q1),
        whisker_high: inside().reduce(f64::max).unwrap_or(q3),
        outliers: sorted
            .iter()
            .copied()
            .filter(|v| !(fence_low..=fence_high).contains(v))
            .collect(),
    })
}

fn draw_boxplot(
    area: &Area<'_>,
    decorator: &dyn ChartDecorator,
    values: &[f64],
    title: &str,
    y_desc: &str,
    color: RGBColor,
) -> DrawResult<()> {
    let spec = PanelSpec::new(title, 0.0..2.0, padded_range(values, 0.08)).axes("", y_desc);
    let mut panel = decorator.panel(area, &spec)?;
    let Some(b) = box_stats(values) else {
        return Ok(());
    };

    let (left, right, center) = (0.7, 1.3, 1.0);
    let (cap_left, cap_right) = (0.85, 1.15);
    let ink = BLACK.stroke_width(2);

    panel.draw_series([
        Rectangle::new([(left, b.q1), (right, b.q3)], color.mix(0.7).filled()),
        Rectangle::new([(left, b.q1), (right, b.q3)], ink),
    ])?;
    panel.draw_series([
        PathElement::new(vec![(left, b.median), (right, b.median)], RGBColor(255, 127, 14).stroke_width(2)),
        PathElement::new(vec![(center, b.q3), (center, b.whisker_high)], ink),
        PathElement::new(vec![(center, b.q1), (center, b.whisker_low)], ink),
        PathElement::new(vec![(cap_left, b.whisker_high), (cap_right, b.whisker_high)], ink),
        PathElement::new(vec![(cap_left, b.whisker_low), (cap_right, b.whisker_low)], ink),
    ])?;
    panel.draw_series(
        b.outliers
            .iter()
            .map(|&v| Circle::new((center, v), 3, BLACK.stroke_width(1))),
    )?;
    Ok(())
}

// ============================================================================
// HELPERS
// ============================================================================

/// Data range widened by `pad` of its span; degenerate spans get a unit window
pub fn padded_range(values: &[f64], pad: f64) -> Range<f64> {
    match (stats::min(values), stats::max(values)) {
        (Some(lo), Some(hi)) if hi > lo => {
            let margin = (hi - lo) * pad;
            lo - margin..hi + margin
        }
        (Some(v), _) => v - 1.0..v + 1.0,
        _ => 0.0..1.0,
    }
}

fn normalize(value: f64, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
    } else {
        0.5
    }
}

/// Integer position `v` rounds to, if it is one of `0..count`
fn label_at(v: f64, count: usize) -> Option<usize> {
    let k = v.round();
    ((v - k).abs() < 1e-6 && k >= 0.0 && (k as usize) < count).then_some(k as usize)
}

fn lerp_palette(palette: &[(u8, u8, u8)], t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0) * (palette.len() - 1) as f64;
    let i = (t.floor() as usize).min(palette.len() - 2);
    let frac = t - i as f64;
    let (a, b) = (palette[i], palette[i + 1]);
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac).round() as u8;
    RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Perceptual dark-blue to yellow scale
fn plasma(t: f64) -> RGBColor {
    const PLASMA: [(u8, u8, u8); 5] = [
        (13, 8, 135),
        (126, 3, 168),
        (204, 71, 120),
        (248, 149, 64),
        (240, 249, 33),
    ];
    lerp_palette(&PLASMA, t)
}

/// Light yellow to dark red scale
fn yl_or_rd(t: f64) -> RGBColor {
    const YL_OR_RD: [(u8, u8, u8); 5] = [
        (255, 255, 204),
        (254, 217, 118),
        (253, 141, 60),
        (227, 26, 28),
        (128, 0, 38),
    ];
    lerp_palette(&YL_OR_RD, t)
}

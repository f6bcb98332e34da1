//! Chart decorations
//!
//! Everything that needs a font (titles, captions, tick labels, legends) goes
//! through a `ChartDecorator`. Two implementations exist:
//! - `AnnotatedDecorator`: full text, requires a registered font
//! - `PlainDecorator`: no text at all, frames and grid lines only
//!
//! The decorator is picked once at start-up (see `ChartRenderer::select`).

use std::ops::Range;
use std::path::Path;

use plotters::chart::ChartContext;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::register_font;

use crate::analysis::RenderError;

pub type Backend<'b> = BitMapBackend<'b>;
pub type Area<'b> = DrawingArea<Backend<'b>, Shift>;
pub type Panel<'a, 'b> = ChartContext<'a, Backend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;
pub type DrawError = DrawingAreaErrorKind<<Backend<'static> as DrawingBackend>::ErrorType>;
pub type DrawResult<T> = Result<T, DrawError>;

/// Font family every annotated chart uses
pub const FONT_FAMILY: &str = "sans-serif";

/// Tick label formatter
pub type LabelFormatter<'s> = &'s dyn Fn(&f64) -> String;

/// Geometry and text of one panel
pub struct PanelSpec<'s> {
    pub title: &'s str,
    pub x: Range<f64>,
    pub y: Range<f64>,
    pub x_desc: &'s str,
    pub y_desc: &'s str,
    pub x_labels: Option<(usize, LabelFormatter<'s>)>,
    pub y_labels: Option<(usize, LabelFormatter<'s>)>,
}

impl<'s> PanelSpec<'s> {
    pub fn new(title: &'s str, x: Range<f64>, y: Range<f64>) -> Self {
        Self {
            title,
            x,
            y,
            x_desc: "",
            y_desc: "",
            x_labels: None,
            y_labels: None,
        }
    }

    pub fn axes(mut self, x_desc: &'s str, y_desc: &'s str) -> Self {
        self.x_desc = x_desc;
        self.y_desc = y_desc;
        self
    }

    pub fn x_labels(mut self, count: usize, fmt: LabelFormatter<'s>) -> Self {
        self.x_labels = Some((count, fmt));
        self
    }

    pub fn y_labels(mut self, count: usize, fmt: LabelFormatter<'s>) -> Self {
        self.y_labels = Some((count, fmt));
        self
    }
}

pub trait ChartDecorator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Draw the figure title, returning the area left for panels
    fn figure<'b>(&self, root: Area<'b>, title: &str) -> DrawResult<Area<'b>>;

    /// Build a panel with its axes, grid and (if supported) labels
    fn panel<'a, 'b>(&self, area: &'a Area<'b>, spec: &PanelSpec<'_>) -> DrawResult<Panel<'a, 'b>>;

    /// Draw the legend of every labelled series of the panel
    fn legend<'a, 'b: 'a>(&self, panel: &mut Panel<'a, 'b>) -> DrawResult<()>;
}

// ============================================================================
// ANNOTATED
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct AnnotatedDecorator;

impl AnnotatedDecorator {
    /// Register the font at `path` and check that text can be measured with it
    pub fn load(path: &Path) -> Result<Self, RenderError> {
        let bytes = std::fs::read(path)
            .map_err(|e| RenderError::FontUnavailable(format!("{}: {}", path.display(), e)))?;

        // plotters keeps registered fonts for the life of the process
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        register_font(FONT_FAMILY, FontStyle::Normal, bytes).map_err(|_| {
            RenderError::FontUnavailable(format!("{}: not a usable font file", path.display()))
        })?;

        (FONT_FAMILY, 12)
            .into_font()
            .box_size("Ag")
            .map_err(|e| RenderError::FontUnavailable(format!("{:?}", e)))?;

        Ok(Self)
    }
}

impl ChartDecorator for AnnotatedDecorator {
    fn name(&self) -> &'static str {
        "annotated"
    }

    fn figure<'b>(&self, root: Area<'b>, title: &str) -> DrawResult<Area<'b>> {
        root.titled(title, (FONT_FAMILY, 30))
    }

    fn panel<'a, 'b>(&self, area: &'a Area<'b>, spec: &PanelSpec<'_>) -> DrawResult<Panel<'a, 'b>> {
        let mut chart = ChartBuilder::on(area)
            .caption(spec.title, (FONT_FAMILY, 20))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(spec.x.clone(), spec.y.clone())?;

        {
            let mut mesh = chart.configure_mesh();
            mesh.x_desc(spec.x_desc)
                .y_desc(spec.y_desc)
                .light_line_style(BLACK.mix(0.04))
                .bold_line_style(BLACK.mix(0.12));
            if let Some((count, fmt)) = spec.x_labels {
                mesh.x_labels(count).x_label_formatter(fmt);
            }
            if let Some((count, fmt)) = spec.y_labels {
                mesh.y_labels(count).y_label_formatter(fmt);
            }
            mesh.draw()?;
        }

        Ok(chart)
    }

    fn legend<'a, 'b: 'a>(&self, panel: &mut Panel<'a, 'b>) -> DrawResult<()> {
        panel
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.9))
            .border_style(BLACK.mix(0.5))
            .draw()
    }
}

// ============================================================================
// PLAIN
// ============================================================================

/// Grid lines drawn per axis by the plain decorator
const PLAIN_GRID_LINES: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct PlainDecorator;

impl ChartDecorator for PlainDecorator {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn figure<'b>(&self, root: Area<'b>, _title: &str) -> DrawResult<Area<'b>> {
        Ok(root.margin(20, 10, 10, 10))
    }

    fn panel<'a, 'b>(&self, area: &'a Area<'b>, spec: &PanelSpec<'_>) -> DrawResult<Panel<'a, 'b>> {
        let mut chart = ChartBuilder::on(area)
            .margin(15)
            .build_cartesian_2d(spec.x.clone(), spec.y.clone())?;

        let (x0, x1) = (spec.x.start, spec.x.end);
        let (y0, y1) = (spec.y.start, spec.y.end);
        let grid = BLACK.mix(0.1);

        for i in 1..PLAIN_GRID_LINES {
            let t = i as f64 / PLAIN_GRID_LINES as f64;
            let x = x0 + (x1 - x0) * t;
            let y = y0 + (y1 - y0) * t;
            chart.draw_series([
                PathElement::new(vec![(x, y0), (x, y1)], grid),
                PathElement::new(vec![(x0, y), (x1, y)], grid),
            ])?;
        }
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x0, y0), (x1, y1)],
            BLACK.mix(0.5),
        )))?;

        Ok(chart)
    }

    fn legend<'a, 'b: 'a>(&self, _panel: &mut Panel<'a, 'b>) -> DrawResult<()> {
        Ok(())
    }
}

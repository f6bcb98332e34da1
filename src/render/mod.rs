//! Chart Rendering
//!
//! Turns the enriched table into the three result images.
//!
//! ## Structure
//! - `decorator`: text/no-text strategy (annotated or plain)
//! - `charts`: the three figure layouts
//! - `encode`: PNG and data URI encoding
//!
//! ## Usage
//! ```ignore
//! let renderer = ChartRenderer::select(Some(Path::new("DejaVuSans.ttf")), false)?;
//! let uri = renderer.render(ChartKind::Temporal, &table, &heatmap)?;
//! assert!(uri.starts_with("data:image/png;base64,"));
//! ```

pub mod charts;
pub mod decorator;
pub mod encode;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use plotters::prelude::*;

use crate::analysis::report::HeatmapTable;
use crate::analysis::types::TrafficTable;
use crate::analysis::RenderError;

pub use charts::ChartKind;
pub use decorator::{AnnotatedDecorator, ChartDecorator, PlainDecorator};

/// Renders charts with the decorator chosen at start-up.
/// Cheap to clone; shared by every request.
#[derive(Clone)]
pub struct ChartRenderer {
    decorator: Arc<dyn ChartDecorator>,
}

impl fmt::Debug for ChartRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartRenderer")
            .field("decorator", &self.decorator.name())
            .finish()
    }
}

impl ChartRenderer {
    pub fn new(decorator: Arc<dyn ChartDecorator>) -> Self {
        Self { decorator }
    }

    /// Renderer that never draws text
    pub fn plain() -> Self {
        Self::new(Arc::new(PlainDecorator))
    }

    /// Pick the annotated renderer when `font` can be loaded.
    ///
    /// Without a usable font this falls back to the plain renderer, or fails
    /// when `require_labels` is set.
    pub fn select(font: Option<&Path>, require_labels: bool) -> Result<Self, RenderError> {
        let loaded = match font {
            Some(path) => AnnotatedDecorator::load(path),
            None => Err(RenderError::FontUnavailable("no chart font configured".to_string())),
        };

        match loaded {
            Ok(decorator) => {
                tracing::info!("Chart renderer: annotated ({})", font.map(|p| p.display().to_string()).unwrap_or_default());
                Ok(Self::new(Arc::new(decorator)))
            }
            Err(e) if require_labels => Err(e),
            Err(e) => {
                tracing::warn!("Chart labels disabled, using plain renderer: {}", e);
                Ok(Self::plain())
            }
        }
    }

    pub fn name(&self) -> &'static str {
        self.decorator.name()
    }

    /// Render one chart as a PNG data URI
    pub fn render(
        &self,
        kind: ChartKind,
        table: &TrafficTable,
        heatmap: &HeatmapTable,
    ) -> Result<String, RenderError> {
        let chart = kind.key();
        if table.is_empty() {
            return Err(RenderError::EmptyDataset { chart });
        }

        let (width, height) = kind.size();
        let mut pixels = vec![0u8; width as usize * height as usize * 3];

        {
            let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
            charts::draw(kind, root, self.decorator.as_ref(), table, heatmap).map_err(|e| {
                RenderError::Draw {
                    chart,
                    message: e.to_string(),
                }
            })?;
        }

        let png = encode::encode_png(&pixels, width, height).map_err(|e| RenderError::Encode {
            chart,
            message: e.to_string(),
        })?;

        tracing::debug!("Rendered chart '{}' ({}x{}, {} bytes)", chart, width, height, png.len());
        Ok(encode::data_uri(&png))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::metrics::heatmap;
    use crate::analysis::parser::parse_clock;
    use crate::analysis::rules::StateThresholds;
    use crate::analysis::timeline::{build_table, default_log_start};
    use crate::analysis::types::Observation;
    use std::path::PathBuf;

    const FONT_DIRS: [&str; 3] = ["/usr/share/fonts", "/usr/local/share/fonts", "/Library/Fonts"];

    /// A TrueType font for annotated rendering: `FLUVI_TEST_FONT`, DejaVu Sans,
    /// or the first `.ttf` under the usual font directories
    fn system_font() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os("FLUVI_TEST_FONT").map(PathBuf::from) {
            return Some(path);
        }
        let dejavu = PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf");
        if dejavu.is_file() {
            return Some(dejavu);
        }
        FONT_DIRS.iter().find_map(|dir| find_ttf(Path::new(dir)))
    }

    fn find_ttf(dir: &Path) -> Option<PathBuf> {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(dir).ok()?.flatten().map(|e| e.path()).collect();
        entries.sort();
        entries.iter().find_map(|path| {
            if path.is_dir() {
                find_ttf(path)
            } else {
                path.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("ttf"))
                    .then(|| path.clone())
            }
        })
    }

    fn sample_table() -> TrafficTable {
        let rows = (0..240)
            .map(|i| {
                let minute = i % 120;
                let time = format!("{:02}:{:02}:00", 7 + minute / 60, minute % 60);
                let wave = (i as f64 / 10.0).sin();
                Observation {
                    seconds_in_day: parse_clock(&time).unwrap(),
                    raw_time: time,
                    density: 45.0 + 40.0 * wave,
                    flow: 2.0 + wave,
                    generation: 0.5 + 0.1 * wave,
                    speed: 60.0 - 45.0 * wave,
                    entropy: 1.5 + 0.3 * wave,
                }
            })
            .collect();
        build_table(rows, default_log_start(), &StateThresholds::default()).unwrap()
    }

    #[test]
    fn test_plain_renders_every_chart() {
        let table = sample_table();
        let heatmap = heatmap(&table);
        let renderer = ChartRenderer::plain();
        assert_eq!(renderer.name(), "plain");

        for kind in ChartKind::ALL {
            let uri = renderer.render(kind, &table, &heatmap).unwrap();
            let png = encode::decode_data_uri(&uri).unwrap();
            let img = image::load_from_memory(&png).unwrap();
            assert_eq!((img.width(), img.height()), kind.size());
            assert!(img.width() > 0 && img.height() > 0);
        }
    }

    #[test]
    fn test_annotated_renders_every_chart() {
        let Some(font) = system_font() else {
            eprintln!("no TrueType font found, skipping annotated rendering");
            return;
        };
        let renderer = ChartRenderer::select(Some(&font), true).unwrap();
        assert_eq!(renderer.name(), "annotated");

        let table = sample_table();
        let heatmap = heatmap(&table);
        for kind in ChartKind::ALL {
            let uri = renderer.render(kind, &table, &heatmap).unwrap();
            let png = encode::decode_data_uri(&uri).unwrap();
            let img = image::load_from_memory(&png).unwrap();
            assert_eq!((img.width(), img.height()), kind.size());
        }
    }

    #[test]
    fn test_single_row_renders() {
        let rows = vec![Observation {
            raw_time: "07:00:10".to_string(),
            seconds_in_day: parse_clock("07:00:10").unwrap(),
            density: 10.0,
            flow: 1.0,
            generation: 0.5,
            speed: 90.0,
            entropy: 1.0,
        }];
        let table = build_table(rows, default_log_start(), &StateThresholds::default()).unwrap();
        let renderer = ChartRenderer::plain();
        for kind in ChartKind::ALL {
            assert!(renderer.render(kind, &table, &heatmap(&table)).is_ok());
        }
    }

    #[test]
    fn test_empty_table_is_render_error() {
        let table = TrafficTable::default();
        let result = ChartRenderer::plain().render(ChartKind::Temporal, &table, &HeatmapTable::default());
        assert_eq!(result, Err(RenderError::EmptyDataset { chart: "temporal" }));
    }

    #[test]
    fn test_select_without_font() {
        let renderer = ChartRenderer::select(None, false).unwrap();
        assert_eq!(renderer.name(), "plain");

        let err = ChartRenderer::select(None, true).unwrap_err();
        assert!(matches!(err, RenderError::FontUnavailable(_)));
    }

    #[test]
    fn test_select_with_bad_font() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();

        assert_eq!(ChartRenderer::select(Some(&path), false).unwrap().name(), "plain");
        assert!(ChartRenderer::select(Some(&path), true).is_err());

        let missing = dir.path().join("missing.ttf");
        assert!(matches!(
            ChartRenderer::select(Some(&missing), true),
            Err(RenderError::FontUnavailable(_))
        ));
    }
}

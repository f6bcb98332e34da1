//! Configuration module

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDateTime;

use crate::analysis::timeline::default_log_start;

/// Format of `FLUVI_LOG_START` and the `start` query parameter
pub const LOG_START_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (all interfaces)
    pub port: u16,

    /// Directory served as static assets
    pub static_dir: PathBuf,

    /// Instant the simulator logs start at
    pub log_start: NaiveDateTime,

    /// TrueType/OpenType font for annotated charts
    pub chart_font: Option<PathBuf>,

    /// Refuse to start without chart labels
    pub require_chart_labels: bool,

    /// Request body limit of the analysis endpoint
    pub max_upload_bytes: usize,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            static_dir: PathBuf::from("."),
            log_start: default_log_start(),
            chart_font: None,
            require_chart_labels: false,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`; invalid values keep their default
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            port: parsed(&lookup, "PORT", defaults.port),

            static_dir: lookup("FLUVI_STATIC_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),

            log_start: match lookup("FLUVI_LOG_START") {
                Some(raw) => NaiveDateTime::parse_from_str(raw.trim(), LOG_START_FORMAT)
                    .unwrap_or_else(|_| {
                        tracing::warn!("Invalid FLUVI_LOG_START '{}', using {}", raw, defaults.log_start);
                        defaults.log_start
                    }),
                None => defaults.log_start,
            },

            chart_font: lookup("FLUVI_CHART_FONT")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),

            require_chart_labels: match lookup("FLUVI_REQUIRE_CHART_LABELS") {
                Some(raw) => parse_flag(&raw).unwrap_or_else(|| {
                    tracing::warn!("Invalid FLUVI_REQUIRE_CHART_LABELS '{}', using false", raw);
                    defaults.require_chart_labels
                }),
                None => defaults.require_chart_labels,
            },

            max_upload_bytes: parsed(&lookup, "FLUVI_MAX_UPLOAD_BYTES", defaults.max_upload_bytes),

            environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {} '{}', using {}", key, raw, default);
            default
        }),
        None => default,
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

use crate::error::ValidationError;
use crate::types::{Coords, Detail, Summary};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing_subscriber::{EnvFilter, fmt};

#[macro_export]
macro_rules! dlog {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*);
    };
}

static COORDS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\[?\s*([-+]?\d+(?:\.\d+)?)\s*[,;\s]\s*([-+]?\d+(?:\.\d+)?)\s*\]?\s*$")
        .expect("coordinate pattern is valid")
});

/// Initialize colorful logging.
///
/// Default level is INFO.
/// - `-v` => DEBUG
/// - `-vv` => TRACE
/// - `-q` => WARN
/// - `-qq` => ERROR
///
/// `RUST_LOG` overrides everything (e.g. `RUST_LOG=trace`).
pub fn init_logging(verbose: u8, quiet: u8) {
    let net = i16::from(verbose) - i16::from(quiet);
    let level = match net {
        i16::MIN..=-2 => "error",
        -1 => "warn",
        0 => "info",
        1 => "debug",
        2..=i16::MAX => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,trailmark={level}")));

    let show_src = matches!(level, "debug" | "trace");

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_target(true)
        .with_level(true)
        .with_file(show_src)
        .with_line_number(show_src)
        .compact()
        .init();
}

/// Parse `"lat,lng"` (also `"lat lng"`, `"[lat, lng]"`).
pub fn parse_coords(s: &str) -> Result<Coords, String> {
    let caps = COORDS_RE
        .captures(s)
        .ok_or_else(|| format!("expected LAT,LNG, got {s:?}"))?;

    let lat: f64 = caps[1].parse().map_err(|e| format!("latitude: {e}"))?;
    let lng: f64 = caps[2].parse().map_err(|e| format!("longitude: {e}"))?;
    Coords::new(lat, lng).map_err(|e: ValidationError| e.to_string())
}

/// One list row: `Running on April 14 | 🏃‍♀️ 5 km | ⏱ 24 min | ⚡️ 4.8 min/km | 🦶🏼 178 spm`.
pub fn format_row(s: &Summary) -> String {
    let detail_icon = match s.detail {
        Detail::Cadence(_) => "🦶🏼",
        Detail::Elevation(_) => "⛰️",
    };
    format!(
        "{} | {} {} km | ⏱ {} min | ⚡️ {:.1} {} | {detail_icon} {} {}",
        s.description,
        s.kind.icon(),
        s.distance,
        s.duration,
        s.metric.value(),
        s.metric.unit(),
        s.detail.value(),
        s.detail.unit(),
    )
}

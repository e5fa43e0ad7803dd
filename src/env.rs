//! Environment variable names used by this crate for convenient
//! configuration of handlers from microservices.
//!
//! These are purely helpers; the core handler types remain decoupled from
//! environment access.

use crate::handler::HandlerOptions;
use crate::record::Level;

/// Minimum severity, e.g. `debug`, `info`, `warn`, `error`.
pub const LOG_TEXT_LEVEL_ENV: &str = "LOG_TEXT_LEVEL";

/// `chrono` strftime layout for the line timestamp.
pub const LOG_TEXT_TIME_FORMAT_ENV: &str = "LOG_TEXT_TIME_FORMAT";

/// Set to `1`/`true` to disable ANSI color styling.
pub const LOG_TEXT_NO_COLOR_ENV: &str = "LOG_TEXT_NO_COLOR";

/// Set to `1`/`true` to disable the per-severity glyph.
pub const LOG_TEXT_NO_EMOJI_ENV: &str = "LOG_TEXT_NO_EMOJI";

/// Set to `1`/`true` to disable the timestamp.
pub const LOG_TEXT_NO_TIME_ENV: &str = "LOG_TEXT_NO_TIME";

/// Set to `1`/`true` to disable the severity tag.
pub const LOG_TEXT_NO_LEVEL_ENV: &str = "LOG_TEXT_NO_LEVEL";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_flag(key: &str) -> bool {
    matches!(
        std::env::var(key).ok().as_deref(),
        Some("1") | Some("true") | Some("yes")
    )
}

/// Build [`HandlerOptions`] from the environment, starting from defaults.
///
/// Unset or unparsable variables leave the corresponding default in place.
pub fn options_from_env() -> HandlerOptions {
    let mut opts = HandlerOptions::default();

    if let Ok(level) = std::env::var(LOG_TEXT_LEVEL_ENV) {
        if let Ok(level) = level.parse::<Level>() {
            opts.level = level;
        }
    }
    if let Ok(layout) = std::env::var(LOG_TEXT_TIME_FORMAT_ENV) {
        opts.time_format = layout;
    }
    opts.disable_color = env_flag(LOG_TEXT_NO_COLOR_ENV);
    opts.disable_emoji = env_flag(LOG_TEXT_NO_EMOJI_ENV);
    opts.disable_time = env_flag(LOG_TEXT_NO_TIME_ENV);
    opts.disable_level = env_flag(LOG_TEXT_NO_LEVEL_ENV);
    opts
}

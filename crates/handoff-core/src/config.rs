//! Environment-driven configuration.
//!
//! `HANDOFF_LOG` selects the diagnostic level and `HANDOFF_LOG_FORMAT` the
//! record format. Both are resolved on first use and stay fixed for the rest
//! of the process.

use std::sync::atomic::{AtomicU8, Ordering};

pub const LOG_LEVEL_ENV: &str = "HANDOFF_LOG";
pub const LOG_FORMAT_ENV: &str = "HANDOFF_LOG_FORMAT";

const UNRESOLVED: u8 = 0;
const RESOLVING: u8 = 255;

static LEVEL_STATE: AtomicU8 = AtomicU8::new(UNRESOLVED);
static FORMAT_STATE: AtomicU8 = AtomicU8::new(UNRESOLVED);

/// Diagnostic verbosity, ordered from quietest to noisiest.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Off = 1,
    #[default]
    Error = 2,
    Warn = 3,
    Info = 4,
    Debug = 5,
}

impl LogLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }

    const fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Off,
            3 => Self::Warn,
            4 => Self::Info,
            5 => Self::Debug,
            _ => Self::Error,
        }
    }
}

/// Shape of each emitted diagnostic record.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogFormat {
    #[default]
    Text = 1,
    Jsonl = 2,
}

impl LogFormat {
    const fn from_u8(v: u8) -> Self {
        match v {
            2 => Self::Jsonl,
            _ => Self::Text,
        }
    }
}

#[must_use]
pub fn parse_level_value(raw: &str) -> LogLevel {
    match raw.trim().to_ascii_lowercase().as_str() {
        "off" | "none" | "0" => LogLevel::Off,
        "warn" | "warning" => LogLevel::Warn,
        "info" => LogLevel::Info,
        "debug" | "trace" => LogLevel::Debug,
        _ => LogLevel::Error,
    }
}

#[must_use]
pub fn parse_format_value(raw: &str) -> LogFormat {
    match raw.trim().to_ascii_lowercase().as_str() {
        "jsonl" | "json" => LogFormat::Jsonl,
        _ => LogFormat::Text,
    }
}

// UNRESOLVED -> RESOLVING -> value. A caller that races the resolver, or
// re-enters from inside it, gets the default instead of waiting.
fn resolve_sticky(state: &AtomicU8, default: u8, resolve: impl FnOnce() -> u8) -> u8 {
    let cached = state.load(Ordering::Relaxed);
    if cached == RESOLVING {
        return default;
    }
    if cached != UNRESOLVED {
        return cached;
    }

    if state
        .compare_exchange(UNRESOLVED, RESOLVING, Ordering::SeqCst, Ordering::Relaxed)
        .is_err()
    {
        let v = state.load(Ordering::Relaxed);
        return if v != UNRESOLVED && v != RESOLVING {
            v
        } else {
            default
        };
    }

    let resolved = resolve();
    state.store(resolved, Ordering::Release);
    resolved
}

/// Process-wide log level.
#[must_use]
pub fn log_level() -> LogLevel {
    LogLevel::from_u8(resolve_sticky(&LEVEL_STATE, LogLevel::Error as u8, || {
        std::env::var(LOG_LEVEL_ENV)
            .map(|raw| parse_level_value(&raw))
            .unwrap_or_default() as u8
    }))
}

/// Process-wide log record format.
#[must_use]
pub fn log_format() -> LogFormat {
    LogFormat::from_u8(resolve_sticky(&FORMAT_STATE, LogFormat::Text as u8, || {
        std::env::var(LOG_FORMAT_ENV)
            .map(|raw| parse_format_value(&raw))
            .unwrap_or_default() as u8
    }))
}

/// Forget the resolved configuration so the next read consults the
/// environment again.
#[cfg(test)]
pub(crate) fn reset_for_tests() {
    LEVEL_STATE.store(UNRESOLVED, Ordering::SeqCst);
    FORMAT_STATE.store(UNRESOLVED, Ordering::SeqCst);
}

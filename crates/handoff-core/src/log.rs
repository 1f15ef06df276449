//! Diagnostics written straight to stderr.
//!
//! Each record is assembled in memory and emitted with a single `write(2)`
//! so it never interleaves with, or depends on, the host program's stdio
//! buffers.

use std::fmt;

use serde::Serialize;

use crate::config::{self, LogFormat, LogLevel};

/// One diagnostic record as it appears in `jsonl` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord<'a> {
    pub level: &'static str,
    pub target: &'a str,
    pub message: String,
    pub pid: u32,
}

#[must_use]
pub fn enabled(level: LogLevel) -> bool {
    level != LogLevel::Off && level <= config::log_level()
}

pub fn error(target: &str, args: fmt::Arguments<'_>) {
    emit(LogLevel::Error, target, args);
}

pub fn warn(target: &str, args: fmt::Arguments<'_>) {
    emit(LogLevel::Warn, target, args);
}

pub fn info(target: &str, args: fmt::Arguments<'_>) {
    emit(LogLevel::Info, target, args);
}

pub fn debug(target: &str, args: fmt::Arguments<'_>) {
    emit(LogLevel::Debug, target, args);
}

pub fn emit(level: LogLevel, target: &str, args: fmt::Arguments<'_>) {
    if !enabled(level) {
        return;
    }
    let record = LogRecord {
        level: level.as_str(),
        target,
        message: args.to_string(),
        pid: std::process::id(),
    };
    write_stderr(render(&record, config::log_format()).as_bytes());
}

/// Fatal diagnostics ignore the configured level.
pub fn fatal(target: &str, args: fmt::Arguments<'_>) {
    let record = LogRecord {
        level: "fatal",
        target,
        message: args.to_string(),
        pid: std::process::id(),
    };
    let line = match config::log_format() {
        LogFormat::Text => format!("handoff: FATAL: {}\n", record.message),
        LogFormat::Jsonl => render(&record, LogFormat::Jsonl),
    };
    write_stderr(line.as_bytes());
}

#[must_use]
pub fn render(record: &LogRecord<'_>, format: LogFormat) -> String {
    match format {
        LogFormat::Text => format!(
            "handoff[{}]: {}: {}\n",
            record.level, record.target, record.message
        ),
        LogFormat::Jsonl => match serde_json::to_string(record) {
            Ok(mut line) => {
                line.push('\n');
                line
            }
            Err(e) => format!("{{\"level\":\"error\",\"message\":\"log encode: {e}\"}}\n"),
        },
    }
}

fn write_stderr(mut bytes: &[u8]) {
    while !bytes.is_empty() {
        // SAFETY: `bytes` is a live slice; stderr may be closed, in which case
        // the write fails and the record is dropped.
        let n = unsafe { libc::write(libc::STDERR_FILENO, bytes.as_ptr().cast(), bytes.len()) };
        if n < 0 {
            if crate::errno::last_errno() == libc::EINTR {
                continue;
            }
            return;
        }
        if n == 0 {
            return;
        }
        bytes = &bytes[n as usize..];
    }
}

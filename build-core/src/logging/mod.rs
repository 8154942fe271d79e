//! Structured Logging & Tracing
//!
//! Every tool in the workspace reports progress through the `tracing` crate:
//! - Level-based filtering (TRACE/DEBUG/INFO/WARN/ERROR)
//! - Per-module filters rendered into an `EnvFilter` directive string
//! - Spans around each dependency and build step
//! - Idempotent initialization (first call wins, `RUST_LOG` overrides)

use serde::{Deserialize, Serialize};
use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Log level for the build tooling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    pub fn from_id(id: u32) -> Self {
        match id {
            0 => LogLevel::Trace,
            1 => LogLevel::Debug,
            2 => LogLevel::Info,
            3 => LogLevel::Warn,
            4 => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }

    /// Map CLI `-v`/`-q` counts onto a level, starting from INFO.
    pub fn from_verbosity(verbose: u8, quiet: u8) -> Self {
        let id = 2i32 - verbose as i32 + quiet as i32;
        Self::from_id(id.clamp(0, 4) as u32)
    }
}

/// Configuration for tracing initialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracingConfig {
    pub default_level: LogLevel,
    pub module_filters: Vec<(String, LogLevel)>,
    pub show_targets: bool,
    pub show_file_line: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: LogLevel::Info,
            module_filters: vec![
                ("fm_core::patch".to_string(), LogLevel::Info),
                ("fm_core::logtail".to_string(), LogLevel::Warn),
                ("reqwest".to_string(), LogLevel::Warn),
                ("hyper_util".to_string(), LogLevel::Warn),
            ],
            show_targets: false,
            show_file_line: false,
        }
    }
}

impl TracingConfig {
    /// Same filters, different default level.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.default_level = level;
        self
    }

    pub fn to_env_filter_string(&self) -> String {
        let mut parts = vec![self.default_level.as_str().to_string()];
        for (module, level) in &self.module_filters {
            parts.push(format!("{}={}", module, level.as_str()));
        }
        parts.join(",")
    }
}

static TRACING_INIT: Once = Once::new();

/// Initialize tracing with default settings. Safe to call more than once.
pub fn init_tracing_default() {
    init_tracing(&TracingConfig::default());
}

/// Initialize tracing with custom config. The first call wins.
pub fn init_tracing(config: &TracingConfig) {
    let filter_str = config.to_env_filter_string();
    let show_targets = config.show_targets;
    let show_file_line = config.show_file_line;
    TRACING_INIT.call_once(move || {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(show_targets)
            .with_level(true)
            .with_file(show_file_line)
            .with_line_number(show_file_line)
            .compact();

        // A test harness may already have installed a subscriber
        let _ = subscriber.try_init();
    });
}

/// Named span for one unit of work (a dependency, a project build step).
/// The span stays entered until the guard is dropped.
pub struct TimingSpan {
    _span: tracing::span::EnteredSpan,
}

impl TimingSpan {
    pub fn new(name: &str) -> Self {
        let span = tracing::info_span!("step", name = name);
        Self {
            _span: span.entered(),
        }
    }
}

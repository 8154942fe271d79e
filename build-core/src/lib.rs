//! Freeminer Build Tooling - Shared Core
//!
//! Pure logic shared by the dependency builder and the credits scorer:
//! - Textual patch operations (exact search-and-replace, BOM handling)
//! - Build configuration (build mode, toolchain profile, completion check)
//! - Structured logging via `tracing`
//! - Tailing of log files written by external tools

pub mod config;
pub mod logging;
pub mod logtail;
pub mod patch;

pub use config::{BuildMode, CompletionCheck, ConfigError, OrchestratorConfig, ToolchainProfile};
pub use logging::{init_tracing, init_tracing_default, LogLevel, TimingSpan, TracingConfig};
pub use logtail::{LogTail, LogWatcher};
pub use patch::{apply_patch, decode_text, patch_file, strip_bom, PatchError, PatchOp, PatchOutcome};

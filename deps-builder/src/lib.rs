//! Freeminer Windows Dependency Builder
//!
//! Fetches, patches and builds every native library Freeminer links against,
//! then generates and builds the game itself:
//! - Dependency catalog with per-toolchain recipes (VS2013, VS2015)
//! - Toolchain pre-flight (`PATH` lookup with install hints)
//! - Archive download and extraction behind the `Acquire` trait
//! - External tool invocations behind the `Execute` trait
//! - Completion stamps so interrupted builds are redone
//! - cmake/MSBuild generation of the main project
//! - cppcheck wrapper that follows the linter's log

pub mod catalog;
pub mod error;
pub mod fetch;
pub mod layout;
pub mod lint;
pub mod orchestrator;
pub mod project;
pub mod runner;
pub mod toolchain;

// Re-export commonly used types
pub use catalog::{catalog, ArchiveKind, ArchiveSpec, Dependency, Step, Versions};
pub use error::{BuildError, Result};
pub use fetch::{Acquire, HttpAcquirer};
pub use layout::Layout;
pub use orchestrator::{BuildStamp, EnsureOutcome, EnsureReport, Orchestrator, STAMP_FILE};
pub use runner::{Execute, Invocation, ProcessRunner};

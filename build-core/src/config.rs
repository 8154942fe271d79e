use crate::logging::TracingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Release/Debug selection, propagated into every external invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BuildMode {
    #[default]
    Release,
    Debug,
}

impl BuildMode {
    /// Only the literal `debug` selects a debug build.
    pub fn from_cli_hint(hint: Option<&str>) -> Self {
        match hint {
            Some("debug") => BuildMode::Debug,
            _ => BuildMode::Release,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::Release => "Release",
            BuildMode::Debug => "Debug",
        }
    }

    pub fn is_debug(&self) -> bool {
        matches!(self, BuildMode::Debug)
    }

    /// Choose between a release and a debug variant of some value.
    pub fn pick<T>(&self, release: T, debug: T) -> T {
        match self {
            BuildMode::Release => release,
            BuildMode::Debug => debug,
        }
    }
}

impl std::fmt::Display for BuildMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the two Visual Studio dependency sets to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ToolchainProfile {
    /// VS2013 toolchain: MSYS utilities, msgpack, older library versions
    #[default]
    Vs2013,
    /// VS2015 toolchain: newer library versions, `v140` platform toolset patches
    Vs2015,
}

impl ToolchainProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolchainProfile::Vs2013 => "vs2013",
            ToolchainProfile::Vs2015 => "vs2015",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "vs2013" | "windows" => Some(ToolchainProfile::Vs2013),
            "vs2015" | "windows_vs2015" => Some(ToolchainProfile::Vs2015),
            _ => None,
        }
    }
}

/// How the orchestrator decides a dependency is already prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompletionCheck {
    /// Directory presence alone marks a dependency as acquired.
    Directory,
    /// A stamp file, written after the last build step succeeded, is required.
    /// A directory without one is removed and acquired again.
    #[default]
    Stamp,
}

/// Orchestrator settings, optionally loaded from a RON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub profile: ToolchainProfile,
    pub completion: CompletionCheck,
    /// Main project source tree; defaults to two levels above the build root.
    pub source_dir: Option<PathBuf>,
    /// Request parallel compilation (`CL=/MP`) for the final build.
    pub parallel_compile: bool,
    /// Download LevelDB/Crc32C/Snappy NuGet packages and wire them into the project.
    pub fetch_nuget_packages: bool,
    /// NuGet executable, relative to the build root unless absolute.
    pub nuget_exe: PathBuf,
    pub logging: TracingConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            profile: ToolchainProfile::Vs2013,
            completion: CompletionCheck::Stamp,
            source_dir: None,
            parallel_compile: true,
            fetch_nuget_packages: true,
            nuget_exe: PathBuf::from("NuGet.exe"),
            logging: TracingConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(content)?)
    }

    /// Compact JSON form, for logging the effective settings.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

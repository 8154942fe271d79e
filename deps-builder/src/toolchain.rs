//! Toolchain pre-flight
//!
//! Every external tool a profile needs is located on `PATH` before anything
//! is downloaded or built. A missing tool aborts with the install hint.

use crate::error::{BuildError, Result};
use fm_core::ToolchainProfile;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;

/// A group of tools sharing one install hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRequirement {
    pub tools: Vec<&'static str>,
    pub hint: &'static str,
}

/// A located tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundTool {
    pub name: &'static str,
    pub path: PathBuf,
}

const MSBUILD_HINT: &str = "Make sure you use VS2013 developer command prompt.";
const MSBUILD_2015_HINT: &str = "Make sure you use VS2015 developer command prompt.";
const CMAKE_HINT: &str = "Make sure you have CMake installed and added to PATH.";
const RUBY_HINT: &str = "Make sure you have Ruby installed and added to PATH.";
const MSYS_HINT: &str = "Make sure you have MSYS installed and added to PATH.";

/// Tools a profile needs, in the order they are checked.
pub fn required_tools(profile: ToolchainProfile) -> Vec<ToolRequirement> {
    match profile {
        ToolchainProfile::Vs2013 => vec![
            ToolRequirement {
                tools: vec!["msbuild.exe"],
                hint: MSBUILD_HINT,
            },
            ToolRequirement {
                tools: vec!["cmake.exe"],
                hint: CMAKE_HINT,
            },
            // msgpack's preprocess script
            ToolRequirement {
                tools: vec!["ruby.exe"],
                hint: RUBY_HINT,
            },
            ToolRequirement {
                tools: vec!["cp.exe", "rm.exe", "sed.exe", "bash.exe"],
                hint: MSYS_HINT,
            },
        ],
        ToolchainProfile::Vs2015 => vec![
            ToolRequirement {
                tools: vec!["msbuild.exe"],
                hint: MSBUILD_2015_HINT,
            },
            ToolRequirement {
                tools: vec!["cmake.exe"],
                hint: CMAKE_HINT,
            },
        ],
    }
}

/// Locate `program` in the directories of a `PATH`-style variable.
///
/// Quoted entries (`"C:\Program Files\CMake\bin"`) are unquoted first.
/// Names are matched case-insensitively on Windows by the filesystem itself.
pub fn which(program: &str, path_var: &OsStr) -> Option<PathBuf> {
    let direct = Path::new(program);
    if direct.components().count() > 1 {
        return is_executable(direct).then(|| direct.to_path_buf());
    }

    std::env::split_paths(path_var)
        .map(|dir| {
            let raw = dir.to_string_lossy();
            let unquoted = raw.trim_matches('"');
            PathBuf::from(unquoted).join(program)
        })
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Check every requirement against `path_var`; stop at the first missing tool.
pub fn preflight(requirements: &[ToolRequirement], path_var: &OsStr) -> Result<Vec<FoundTool>> {
    let mut found = Vec::new();
    for req in requirements {
        for &tool in &req.tools {
            let path = which(tool, path_var).ok_or_else(|| BuildError::MissingTool {
                tool: tool.to_string(),
                hint: req.hint.to_string(),
            })?;
            info!("Found {}: {}", tool, path.display());
            found.push(FoundTool { name: tool, path });
        }
    }
    Ok(found)
}

//! Build directory layout
//!
//! ```text
//! <root>/
//!   deps/          downloaded archives and built dependencies
//!   project/       generated Freeminer solution
//!   install_tmp/   CMAKE_INSTALL_PREFIX
//! <root>/../..     Freeminer source tree (unless overridden)
//! ```

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub root: PathBuf,
    pub deps: PathBuf,
    pub project: PathBuf,
    pub install: PathBuf,
    pub source: PathBuf,
}

impl Layout {
    /// `root` should already be absolute; every later path derives from it.
    pub fn new(root: impl Into<PathBuf>, source: Option<PathBuf>) -> Self {
        let root = root.into();
        let source = source.unwrap_or_else(|| {
            root.ancestors()
                .nth(2)
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.clone())
        });
        Self {
            deps: root.join("deps"),
            project: root.join("project"),
            install: root.join("install_tmp"),
            source,
            root,
        }
    }

    pub fn dep(&self, dir_name: &str) -> PathBuf {
        self.deps.join(dir_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_defaults() {
        let layout = Layout::new("/src/freeminer/build/windows", None);
        assert_eq!(layout.deps, PathBuf::from("/src/freeminer/build/windows/deps"));
        assert_eq!(layout.project, PathBuf::from("/src/freeminer/build/windows/project"));
        assert_eq!(layout.install, PathBuf::from("/src/freeminer/build/windows/install_tmp"));
        assert_eq!(layout.source, PathBuf::from("/src/freeminer"));
        assert_eq!(layout.dep("zlib-1.2.8"), PathBuf::from("/src/freeminer/build/windows/deps/zlib-1.2.8"));
    }

    #[test]
    fn test_source_override() {
        let layout = Layout::new("/b", Some(PathBuf::from("/checkout")));
        assert_eq!(layout.source, PathBuf::from("/checkout"));
    }
}

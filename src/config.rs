use std::path::{Path, PathBuf};

use tracing::debug;

/// Files or directories whose presence marks a project root.
pub const ROOT_MARKERS: &[&str] = &[
    ".git",
    "go.mod",
    "Cargo.toml",
    "package.json",
    "pyproject.toml",
    "pom.xml",
    "build.gradle",
    "CMakeLists.txt",
];

/// Where to look for source files named by coverage reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub project_root: PathBuf,
    /// Extra roots from the command line, tried after a file's own hint.
    pub source_dirs: Vec<PathBuf>,
}

impl Config {
    pub fn new(project_root: impl Into<PathBuf>, source_dirs: Vec<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            source_dirs,
        }
    }

    /// Walk upward from `start` to the nearest directory holding a root
    /// marker. Falls back to `start` itself when none is found.
    pub fn discover(start: &Path, source_dirs: Vec<PathBuf>) -> Self {
        let root = start
            .ancestors()
            .find(|dir| ROOT_MARKERS.iter().any(|m| dir.join(m).exists()))
            .unwrap_or(start);
        debug!("Using project root {}", root.display());
        Self::new(root, source_dirs)
    }

    /// Ordered, de-duplicated resolution roots for one file.
    ///
    /// The file's hint comes first (relative hints are taken from the
    /// project root), then `source_dirs`, then the project root.
    pub fn candidate_dirs(&self, hint: &str) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Vec::new();
        if !hint.is_empty() {
            let hint = Path::new(hint);
            dirs.push(if hint.is_absolute() {
                hint.to_path_buf()
            } else {
                self.project_root.join(hint)
            });
        }
        dirs.extend(self.source_dirs.iter().cloned());
        dirs.push(self.project_root.clone());

        let mut unique = Vec::with_capacity(dirs.len());
        for dir in dirs {
            if !unique.contains(&dir) {
                unique.push(dir);
            }
        }
        unique
    }
}

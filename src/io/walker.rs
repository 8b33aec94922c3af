use crate::core::{Result, RouteGenError};
use crate::extraction::SourceFile;
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Finds `.rs` files under a root, honouring `.gitignore` and configured
/// glob patterns.
pub struct FileWalker {
    root: PathBuf,
    ignore_patterns: Vec<glob::Pattern>,
}

impl FileWalker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            ignore_patterns: vec![],
        }
    }

    /// Patterns are matched against paths relative to the root, with `/`
    /// separators.
    pub fn with_ignore_patterns(mut self, patterns: &[String]) -> Result<Self> {
        self.ignore_patterns = patterns
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<std::result::Result<_, _>>()?;
        Ok(self)
    }

    /// Matching files, sorted by relative path.
    pub fn walk(&self) -> Result<Vec<PathBuf>> {
        if !self.root.exists() {
            return Err(RouteGenError::file_system("path does not exist", &self.root));
        }
        let mut files = Vec::new();
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .build();

        for entry in walker {
            let entry = entry?;
            let path = entry.path();

            if path.is_file() && self.should_process(path) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        debug!(root = %self.root.display(), files = files.len(), "Discovered source files");
        Ok(files)
    }

    /// Read every discovered file. Paths in the result are relative to the
    /// root so output does not depend on where the tool was run from.
    pub fn load_sources(&self) -> Result<Vec<SourceFile>> {
        self.walk()?
            .par_iter()
            .map(|path| {
                let content = std::fs::read_to_string(path).map_err(|e| RouteGenError::FileSystem {
                    message: format!("cannot read {}", path.display()),
                    path: Some(path.clone()),
                    source: Some(e),
                })?;
                Ok(SourceFile::new(self.display_path(path), content))
            })
            .collect()
    }

    fn should_process(&self, path: &Path) -> bool {
        if path.extension().and_then(|ext| ext.to_str()) != Some("rs") {
            return false;
        }
        let relative = self.display_path(path);
        !self
            .ignore_patterns
            .iter()
            .any(|pattern| pattern.matches(&relative))
    }

    fn display_path(&self, path: &Path) -> String {
        let base = if self.root.is_file() {
            self.root.parent().unwrap_or(Path::new(""))
        } else {
            self.root.as_path()
        };
        let relative = path.strip_prefix(base).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

pub fn find_source_files(root: &Path, ignore_patterns: &[String]) -> Result<Vec<SourceFile>> {
    FileWalker::new(root.to_path_buf())
        .with_ignore_patterns(ignore_patterns)?
        .load_sources()
}

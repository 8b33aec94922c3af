use crate::core::{Result, RouteGenError};
use crate::emit::RenderedUnit;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// First-line prefix shared by every generated file.
pub const GENERATED_MARKER: &str = "// @generated by routegen";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    /// Previously generated files with no unit in this run.
    pub removed: Vec<PathBuf>,
}

/// Write units into `dir`, skipping files whose content is already current
/// and deleting stale generated files. Files without the generated marker
/// are never touched.
pub fn write_units(dir: &Path, units: &[RenderedUnit]) -> Result<WriteSummary> {
    check_file_names(units)?;
    ensure_dir(dir)?;
    let mut summary = WriteSummary::default();
    let mut current = BTreeSet::new();

    for unit in units {
        let path = dir.join(&unit.file_name);
        current.insert(unit.file_name.clone());
        match fs::read_to_string(&path) {
            Ok(existing) if existing == unit.text => summary.unchanged.push(path),
            _ => {
                write_file(&path, &unit.text)?;
                summary.written.push(path);
            }
        }
    }

    for entry in fs::read_dir(dir).map_err(|e| io_error("cannot list", dir, e))? {
        let path = entry.map_err(|e| io_error("cannot list", dir, e))?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.ends_with(".rs") || current.contains(name) || !is_generated(&path) {
            continue;
        }
        fs::remove_file(&path).map_err(|e| io_error("cannot remove", &path, e))?;
        debug!(path = %path.display(), "Removed stale generated file");
        summary.removed.push(path);
    }

    info!(
        written = summary.written.len(),
        unchanged = summary.unchanged.len(),
        removed = summary.removed.len(),
        "Wrote generated units"
    );
    Ok(summary)
}

/// Reject units whose file names would land on the same file, including on
/// case-insensitive file systems.
fn check_file_names(units: &[RenderedUnit]) -> Result<()> {
    let mut seen: BTreeMap<String, &str> = BTreeMap::new();
    for unit in units {
        if let Some(previous) = seen.insert(unit.file_name.to_lowercase(), &unit.file_name) {
            return Err(RouteGenError::FileSystem {
                message: format!(
                    "generated files {previous} and {} would overwrite each other",
                    unit.file_name
                ),
                path: None,
                source: None,
            });
        }
    }
    Ok(())
}

fn is_generated(path: &Path) -> bool {
    fs::read_to_string(path)
        .map(|content| content.starts_with(GENERATED_MARKER))
        .unwrap_or(false)
}

pub fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| io_error("cannot write", path, e))
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| io_error("cannot create directory", path, e))?;
    }
    Ok(())
}

fn io_error(action: &str, path: &Path, source: std::io::Error) -> RouteGenError {
    RouteGenError::FileSystem {
        message: format!("{action} {}", path.display()),
        path: Some(path.to_path_buf()),
        source: Some(source),
    }
}

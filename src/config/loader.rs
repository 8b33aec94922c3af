use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::core::RouteGenConfig;
use crate::core::{Result, RouteGenError};

pub const CONFIG_FILE_NAME: &str = "routegen.toml";
pub const ENABLED_ENV_VAR: &str = "ROUTEGEN_ENABLED";
const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Pure function to read config file contents
pub(crate) fn read_config_file(path: &Path) -> std::result::Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Pure function to parse and validate config from TOML string
pub fn parse_and_validate_config(contents: &str) -> std::result::Result<RouteGenConfig, String> {
    let config = toml::from_str::<RouteGenConfig>(contents)
        .map_err(|e| format!("Failed to parse {CONFIG_FILE_NAME}: {e}"))?;
    config.validate()?;
    Ok(config)
}

/// Pure function to generate directory ancestors up to a depth limit
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Nearest `routegen.toml` at or above `start`.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|path| path.is_file())
}

/// Load and validate one config file.
pub fn load_config_from_path(path: &Path) -> Result<RouteGenConfig> {
    let contents = read_config_file(path).map_err(|e| RouteGenError::FileSystem {
        message: format!("cannot read config file {}", path.display()),
        path: Some(path.to_path_buf()),
        source: Some(e),
    })?;
    let config = parse_and_validate_config(&contents)
        .map_err(|e| RouteGenError::Configuration(format!("{}: {e}", path.display())))?;
    debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Search upward from `start`; defaults when no file is found.
pub fn load_config(start: &Path) -> Result<RouteGenConfig> {
    match find_config_file(start) {
        Some(path) => load_config_from_path(&path),
        None => {
            debug!(
                "No config found after checking {} directories. Using default config.",
                MAX_TRAVERSAL_DEPTH
            );
            Ok(RouteGenConfig::default())
        }
    }
}

/// Apply environment overrides through `lookup` (normally `std::env::var`).
pub fn apply_env_overrides<F>(mut config: RouteGenConfig, lookup: F) -> Result<RouteGenConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(ENABLED_ENV_VAR) {
        config.enabled = parse_bool(&value).ok_or_else(|| {
            RouteGenError::Configuration(format!("{ENABLED_ENV_VAR}: expected a boolean, got '{value}'"))
        })?;
        debug!(enabled = config.enabled, "{} override applied", ENABLED_ENV_VAR);
    }
    Ok(config)
}

/// Explicit file if given, otherwise upward search from `start`, then
/// environment overrides.
pub fn resolve_config(explicit: Option<&Path>, start: &Path) -> Result<RouteGenConfig> {
    let config = match explicit {
        Some(path) => load_config_from_path(path)?,
        None => load_config(start)?,
    };
    let config = apply_env_overrides(config, |key| std::env::var(key).ok())?;
    if !config.enabled {
        warn!("routegen is disabled by configuration");
    }
    Ok(config)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

use crate::config::CONFIG_FILE_NAME;
use crate::io::output::write_file;
use anyhow::Result;
use std::path::Path;

pub const DEFAULT_CONFIG: &str = r#"# routegen configuration

# Set to false (or ROUTEGEN_ENABLED=0) to skip analysis and generation.
enabled = true

[routing]
result_wrappers = ["ErrorOr"]
max_group_depth = 4
runtime_crate = "routegen_runtime"

[diagnostics]
suppress = []
overrides = {}
documentation_hints = false

[ignore]
patterns = [
    "target/**",
]
"#;

pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    write_file(&config_path, DEFAULT_CONFIG)?;
    println!("Created {CONFIG_FILE_NAME} configuration file");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_and_validate_config;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_parses() {
        let config = parse_and_validate_config(DEFAULT_CONFIG).unwrap();
        assert!(config.enabled);
        assert_eq!(config.ignore.patterns, vec!["target/**".to_string()]);
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        init_config(dir.path(), false).unwrap();
        assert!(init_config(dir.path(), false).is_err());
        init_config(dir.path(), true).unwrap();
    }
}

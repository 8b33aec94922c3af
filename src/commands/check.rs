use super::{analyze_project, diagnostics_report, exit_code, load_project};
use crate::cli::OutputFormat;
use anyhow::Result;
use std::path::PathBuf;
use std::process::ExitCode;

pub struct CheckConfig {
    pub path: PathBuf,
    pub config: Option<PathBuf>,
    pub format: OutputFormat,
}

/// Report diagnostics without writing anything. Fails when any Error
/// survives the diagnostic policy.
pub fn check_project(config: CheckConfig) -> Result<ExitCode> {
    let project = load_project(&config.path, config.config.as_deref())?;
    let output = analyze_project(&project)?;
    print!("{}", diagnostics_report(&output.diagnostics, config.format)?);
    if config.format == OutputFormat::Json {
        println!();
    }
    Ok(exit_code(&output))
}

//! CLI command implementations.
//!
//! Available commands:
//! - **generate**: analyze and write registration code
//! - **check**: report diagnostics, failing on errors
//! - **routes**: list the endpoints that would be registered
//! - **init**: write a default `routegen.toml`
//!
//! The first three share `load_project` and `analyze_project`, so they
//! always agree on which endpoints are valid.

pub mod check;
pub mod generate;
pub mod init;
pub mod routes;

pub use check::check_project;
pub use generate::generate_project;
pub use init::init_config;
pub use routes::list_routes;

use crate::cli::OutputFormat;
use crate::config::{resolve_config, RouteGenConfig};
use crate::diagnostics::{render_json, render_summary, render_terminal, Diagnostic, DiagnosticSummary};
use crate::extraction::SourceFile;
use crate::io::find_source_files;
use crate::observability::{set_phase, PipelinePhase};
use crate::pipeline::{self, CancelFlag, PipelineOutput, PipelineSettings};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

/// Configuration plus source snapshot for one invocation.
pub struct Project {
    pub root: PathBuf,
    pub config: RouteGenConfig,
    pub settings: PipelineSettings,
    pub sources: Vec<SourceFile>,
}

pub fn load_project(path: &Path, config_path: Option<&Path>) -> Result<Project> {
    let search_start = if path.is_file() {
        path.parent().unwrap_or(Path::new(".")).to_path_buf()
    } else {
        path.to_path_buf()
    };
    let config = resolve_config(config_path, &search_start)?;
    let settings = config
        .to_settings()
        .map_err(crate::core::RouteGenError::Configuration)?;

    let sources = {
        let _phase = set_phase(PipelinePhase::FileDiscovery);
        find_source_files(path, &config.ignore.patterns)
            .with_context(|| format!("failed to discover sources under {}", path.display()))?
    };
    info!(files = sources.len(), root = %path.display(), "Loaded project");

    Ok(Project {
        root: path.to_path_buf(),
        config,
        settings,
        sources,
    })
}

pub fn analyze_project(project: &Project) -> Result<PipelineOutput> {
    let output = pipeline::run(&project.sources, &project.settings, &CancelFlag::new())?;
    Ok(output)
}

/// Exit status for a finished command.
pub fn exit_code(output: &PipelineOutput) -> ExitCode {
    if output.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Terminal rendering: each diagnostic plus a summary line.
pub fn terminal_report(diagnostics: &[Diagnostic]) -> String {
    let mut out = render_terminal(diagnostics);
    out.push_str(&render_summary(&DiagnosticSummary::from_diagnostics(diagnostics)));
    out.push('\n');
    out
}

pub fn diagnostics_report(diagnostics: &[Diagnostic], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Terminal => Ok(terminal_report(diagnostics)),
        OutputFormat::Json => Ok(render_json(diagnostics)?),
    }
}

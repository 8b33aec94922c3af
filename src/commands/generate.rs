use super::{analyze_project, exit_code, load_project, terminal_report};
use crate::cli::OutputFormat;
use crate::diagnostics::{Diagnostic, DiagnosticSummary};
use crate::emit::RenderedUnit;
use crate::io::{write_units, WriteSummary};
use crate::observability::{set_phase, PipelinePhase};
use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

pub struct GenerateConfig {
    pub path: PathBuf,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct GenerateReport<'a> {
    summary: DiagnosticSummary,
    diagnostics: &'a [Diagnostic],
    #[serde(skip_serializing_if = "Option::is_none")]
    files: Option<&'a WriteSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    units: Option<&'a [RenderedUnit]>,
}

/// Analyze `path` and write one file per containing type into the output
/// directory, or print the units when no directory is given. Units for
/// valid handlers are produced even when other handlers have errors; the
/// exit code still reports the errors.
pub fn generate_project(config: GenerateConfig) -> Result<ExitCode> {
    let project = load_project(&config.path, config.config.as_deref())?;
    let output = analyze_project(&project)?;

    let _phase = set_phase(PipelinePhase::Output);
    let written = match &config.output {
        Some(dir) => Some(write_units(dir, &output.units)?),
        None => None,
    };

    match config.format {
        OutputFormat::Json => {
            let report = GenerateReport {
                summary: DiagnosticSummary::from_diagnostics(&output.diagnostics),
                diagnostics: &output.diagnostics,
                files: written.as_ref(),
                units: written.is_none().then_some(output.units.as_slice()),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Terminal => {
            if written.is_none() {
                for unit in &output.units {
                    println!("// ---- {} ----", unit.file_name);
                    print!("{}", unit.text);
                }
            }
            eprint!("{}", terminal_report(&output.diagnostics));
            if let Some(summary) = &written {
                eprintln!(
                    "{} file(s) written, {} unchanged, {} removed",
                    summary.written.len(),
                    summary.unchanged.len(),
                    summary.removed.len()
                );
            }
        }
    }

    Ok(exit_code(&output))
}

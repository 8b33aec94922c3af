//! Rendering of the diagnostic stream for the CLI.

use super::{Diagnostic, Severity};
use colored::Colorize;
use serde::Serialize;

/// Counts per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosticSummary {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub hidden: usize,
}

impl DiagnosticSummary {
    pub fn from_diagnostics(diagnostics: &[Diagnostic]) -> Self {
        diagnostics
            .iter()
            .fold(Self::default(), |mut summary, diagnostic| {
                match diagnostic.severity {
                    Severity::Error => summary.errors += 1,
                    Severity::Warning => summary.warnings += 1,
                    Severity::Info => summary.infos += 1,
                    Severity::Hidden => summary.hidden += 1,
                }
                summary
            })
    }
}

/// One line per visible diagnostic; Hidden ones are skipped.
pub fn render_terminal(diagnostics: &[Diagnostic]) -> String {
    let mut out = String::new();
    for diagnostic in diagnostics.iter().filter(|d| d.severity != Severity::Hidden) {
        let level = match diagnostic.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Info => "info".cyan(),
            Severity::Hidden => "hidden".dimmed(),
        };
        out.push_str(&format!(
            "{}[{}]: {}\n  --> {}\n",
            level,
            diagnostic.id.code(),
            diagnostic.message,
            diagnostic.location
        ));
        if let Some(related) = &diagnostic.related {
            out.push_str(&format!("  note: first declared at {related}\n"));
        }
    }
    out
}

pub fn render_summary(summary: &DiagnosticSummary) -> String {
    let errors = format!("{} error(s)", summary.errors);
    let warnings = format!("{} warning(s)", summary.warnings);
    format!(
        "{}, {}, {} info",
        if summary.errors > 0 {
            errors.red().to_string()
        } else {
            errors
        },
        if summary.warnings > 0 {
            warnings.yellow().to_string()
        } else {
            warnings
        },
        summary.infos
    )
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: DiagnosticSummary,
    diagnostics: &'a [Diagnostic],
}

pub fn render_json(diagnostics: &[Diagnostic]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        summary: DiagnosticSummary::from_diagnostics(diagnostics),
        diagnostics,
    })
}

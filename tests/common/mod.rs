// Test utility module for routegen integration tests
#![allow(dead_code)]

use routegen::{run, CancelFlag, Diagnostic, DiagnosticId, PipelineOutput, PipelineSettings, SourceFile};

pub fn sources(files: &[(&str, &str)]) -> Vec<SourceFile> {
    files
        .iter()
        .map(|(path, code)| SourceFile::new(*path, *code))
        .collect()
}

/// Run the full pipeline with default settings.
pub fn run_sources(files: &[(&str, &str)]) -> PipelineOutput {
    run_with(files, &PipelineSettings::default())
}

pub fn run_with(files: &[(&str, &str)], settings: &PipelineSettings) -> PipelineOutput {
    run(&sources(files), settings, &CancelFlag::new()).expect("pipeline run failed")
}

pub fn ids(diagnostics: &[Diagnostic]) -> Vec<DiagnosticId> {
    diagnostics.iter().map(|d| d.id).collect()
}

/// (parameter name, binding source label) for every parameter of the only
/// emitted endpoint.
pub fn bindings(output: &PipelineOutput) -> Vec<(String, &'static str)> {
    assert_eq!(output.endpoints.len(), 1, "expected exactly one endpoint");
    output.endpoints[0]
        .parameters
        .iter()
        .map(|p| (p.name.clone(), p.source.label()))
        .collect()
}

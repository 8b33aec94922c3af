//! The analysis pipeline.
//!
//! ```text
//! SourceFile ─extract─> ExtractedFileData ─analyze─> EndpointDescriptor?
//!      ─duplicates─> survivors ─emit─> RenderedUnit
//! ```
//!
//! Every arrow is a pure function returning its value plus diagnostics
//! (`StageOutput`). `run` executes the whole graph from scratch;
//! `host::IncrementalHost` runs the same stages behind caches. Both produce
//! identical output for identical input.

pub mod cancel;
pub mod host;
pub mod stage;

use crate::analysis::{analyze_handler, AnalysisInput, AnalysisSettings, GroupTable};
use crate::core::{EndpointDescriptor, Location, Result, RouteGenError};
use crate::diagnostics::{self, Diagnostic, DiagnosticId, DiagnosticPolicy};
use crate::emit::{render_units, EmitOptions, RenderedUnit};
use crate::extraction::{DeclarationExtractor, ExtractedFileData, SourceFile, StructDecl};
use crate::observability::{
    increment_progress, set_current_file, set_current_handler, set_phase, set_progress, PipelinePhase,
};
use crate::routing::detect_duplicates;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, info_span};

pub use cancel::CancelFlag;
pub use host::{HostStats, IncrementalHost};
pub use stage::StageOutput;

/// Files parsed per parallel batch before the span table is reset.
const EXTRACTION_BATCH: usize = 64;

/// Everything that changes what a run produces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineSettings {
    /// When false the pipeline produces nothing at all.
    pub enabled: bool,
    pub analysis: AnalysisSettings,
    pub emit: EmitOptions,
    pub policy: DiagnosticPolicy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            analysis: AnalysisSettings::default(),
            emit: EmitOptions::default(),
            policy: DiagnosticPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineOutput {
    /// Emitted endpoints in their total order.
    pub endpoints: Vec<EndpointDescriptor>,
    pub units: Vec<RenderedUnit>,
    /// Policy-adjusted diagnostics in presentation order.
    pub diagnostics: Vec<Diagnostic>,
}

impl PipelineOutput {
    pub fn has_errors(&self) -> bool {
        diagnostics::has_errors(&self.diagnostics)
    }
}

/// Extraction stage for one file. A parse failure becomes a
/// `SourceParseFailure` diagnostic and an empty declaration set.
pub fn extract_source(file: &SourceFile) -> StageOutput<ExtractedFileData> {
    let _file = set_current_file(&file.path);
    match DeclarationExtractor::extract(file) {
        Ok(data) => StageOutput::clean(data),
        Err(error) => parse_failure(&file.path, error),
    }
}

fn parse_failure(path: &str, error: RouteGenError) -> StageOutput<ExtractedFileData> {
    let location = match &error {
        RouteGenError::Parse { line, column, .. } => {
            Location::new(path, *line as u32, *column as u32)
        }
        _ => Location::new(path, 1, 1),
    };
    let message = match error {
        RouteGenError::Parse { message, .. } => format!("cannot parse {path}: {message}"),
        other => format!("cannot read {path}: {other}"),
    };
    StageOutput::new(
        ExtractedFileData::empty(path),
        vec![Diagnostic::new(DiagnosticId::SourceParseFailure, message, location)],
    )
}

/// Parse all files in parallel batches, checking for cancellation between
/// batches. Output keeps input order.
pub fn extract_sources(files: &[SourceFile], cancel: &CancelFlag) -> Result<StageOutput<Vec<ExtractedFileData>>> {
    let _phase = set_phase(PipelinePhase::Extraction);
    let mut extracted = Vec::with_capacity(files.len());
    let mut diagnostics = Vec::new();

    for batch in files.chunks(EXTRACTION_BATCH) {
        cancel.check()?;
        for (path, result) in DeclarationExtractor::extract_batch(batch, EXTRACTION_BATCH) {
            let output = match result {
                Ok(data) => StageOutput::clean(data),
                Err(error) => parse_failure(&path, error),
            };
            extracted.push(output.drain_into(&mut diagnostics));
        }
    }

    debug!(files = files.len(), failures = diagnostics.len(), "Extraction complete");
    Ok(StageOutput::new(extracted, diagnostics))
}

/// All struct declarations across files, for group lookup.
pub fn collect_structs(files: &[ExtractedFileData]) -> Vec<StructDecl> {
    files.iter().flat_map(|file| file.structs.iter().cloned()).collect()
}

/// Analyze every candidate handler in parallel. Cancellation is checked
/// before each handler.
pub fn analyze_all(
    files: &[ExtractedFileData],
    settings: &AnalysisSettings,
    cancel: &CancelFlag,
) -> Result<StageOutput<Vec<EndpointDescriptor>>> {
    let _phase = set_phase(PipelinePhase::Analysis);
    let structs = collect_structs(files);
    let table = GroupTable::new(&structs);
    let inputs: Vec<AnalysisInput> = files
        .iter()
        .flat_map(|file| file.handlers.iter())
        .map(|handler| AnalysisInput::new(handler.clone(), &table, settings))
        .collect();
    set_progress(0, inputs.len());

    let outputs = inputs
        .par_iter()
        .map(|input| {
            cancel.check()?;
            let _handler = set_current_handler(&input.handler.name);
            let output = analyze_handler(input);
            increment_progress();
            Ok(output)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut endpoints = Vec::new();
    let mut diagnostics = Vec::new();
    for output in outputs {
        if let Some(endpoint) = output.drain_into(&mut diagnostics) {
            endpoints.push(endpoint);
        }
    }
    Ok(StageOutput::new(endpoints, diagnostics))
}

/// Final merge: presentation order, then the suppression/override policy.
pub fn finish(
    endpoints: Vec<EndpointDescriptor>,
    units: Vec<RenderedUnit>,
    diagnostics: Vec<Diagnostic>,
    policy: &DiagnosticPolicy,
) -> PipelineOutput {
    PipelineOutput {
        endpoints,
        units,
        diagnostics: policy.apply(diagnostics::normalize(diagnostics)),
    }
}

/// Run from extracted declarations.
pub fn run_declarations(
    files: &[ExtractedFileData],
    settings: &PipelineSettings,
    cancel: &CancelFlag,
) -> Result<PipelineOutput> {
    if !settings.enabled {
        info!("routegen is disabled; skipping");
        return Ok(PipelineOutput::default());
    }
    let mut diagnostics = Vec::new();
    let (endpoints, units) = run_stages(files, settings, cancel, &mut diagnostics)?;
    Ok(finish(endpoints, units, diagnostics, &settings.policy))
}

/// Run from source text.
pub fn run(sources: &[SourceFile], settings: &PipelineSettings, cancel: &CancelFlag) -> Result<PipelineOutput> {
    if !settings.enabled {
        info!("routegen is disabled; skipping");
        return Ok(PipelineOutput::default());
    }
    let mut diagnostics = Vec::new();
    let files = extract_sources(sources, cancel)?.drain_into(&mut diagnostics);
    let (endpoints, units) = run_stages(&files, settings, cancel, &mut diagnostics)?;
    Ok(finish(endpoints, units, diagnostics, &settings.policy))
}

fn run_stages(
    files: &[ExtractedFileData],
    settings: &PipelineSettings,
    cancel: &CancelFlag,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(Vec<EndpointDescriptor>, Vec<RenderedUnit>)> {
    let _span = info_span!("pipeline", files = files.len()).entered();

    let clean = analyze_all(files, &settings.analysis, cancel)?.drain_into(diagnostics);

    cancel.check()?;
    let survivors = {
        let _phase = set_phase(PipelinePhase::DuplicateDetection);
        detect_duplicates(&clean).drain_into(diagnostics)
    };

    cancel.check()?;
    let units = {
        let _phase = set_phase(PipelinePhase::Emission);
        render_units(&survivors, &settings.emit)
    };

    info!(
        endpoints = survivors.len(),
        units = units.len(),
        diagnostics = diagnostics.len(),
        "Pipeline complete"
    );
    Ok((survivors, units))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn source(path: &str, code: &str) -> SourceFile {
        SourceFile::new(path, code)
    }

    #[test]
    fn test_parse_failure_is_a_diagnostic() {
        let output = run(
            &[
                source("src/bad.rs", "fn broken( {"),
                source(
                    "src/ok.rs",
                    indoc! {r#"
                        #[get("/ok")]
                        fn ok() -> ErrorOr<u8> { todo!() }
                    "#},
                ),
            ],
            &PipelineSettings::default(),
            &CancelFlag::new(),
        )
        .unwrap();
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].id, DiagnosticId::SourceParseFailure);
        assert_eq!(output.endpoints.len(), 1);
    }

    #[test]
    fn test_disabled_pipeline_produces_nothing() {
        let settings = PipelineSettings {
            enabled: false,
            ..PipelineSettings::default()
        };
        let output = run(
            &[source("src/a.rs", "#[get(\"/a\")] fn a(repo: Repo) -> u8 { 0 }")],
            &settings,
            &CancelFlag::new(),
        )
        .unwrap();
        assert_eq!(output, PipelineOutput::default());
    }

    #[test]
    fn test_cancelled_run_returns_error() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = run(
            &[source("src/a.rs", "fn a() {}")],
            &PipelineSettings::default(),
            &cancel,
        )
        .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_policy_applies_to_advisories() {
        let code = indoc! {r#"
            #[get("/items/{id:int}")]
            fn item(id: bool) -> ErrorOr<u8> { todo!() }
        "#};
        let settings = PipelineSettings {
            policy: DiagnosticPolicy::new().suppress(DiagnosticId::RouteConstraintMismatch),
            ..PipelineSettings::default()
        };
        let output = run(&[source("src/a.rs", code)], &settings, &CancelFlag::new()).unwrap();
        assert!(output.diagnostics.is_empty());
        assert_eq!(output.units.len(), 1);
    }

    #[test]
    fn test_declarations_entry_matches_source_entry() {
        let sources = [
            source(
                "src/users.rs",
                indoc! {r#"
                    pub struct UsersApi;

                    impl UsersApi {
                        #[get("/users/{id}")]
                        pub fn get(id: u64) -> ErrorOr<u8> { todo!() }

                        #[get("/users/{id}")]
                        pub fn shadow(id: u64) -> ErrorOr<u8> { todo!() }
                    }
                "#},
            ),
            source(
                "src/health.rs",
                indoc! {r#"
                    #[get("/health")]
                    fn health(repo: Repo) -> ErrorOr<u8> { todo!() }

                    #[get("/ready")]
                    fn ready() -> ErrorOr<u8> { todo!() }
                "#},
            ),
        ];
        let cancel = CancelFlag::new();
        let extracted = extract_sources(&sources, &cancel).unwrap();
        assert!(extracted.diagnostics.is_empty());

        let settings = PipelineSettings::default();
        let from_declarations = run_declarations(&extracted.value, &settings, &cancel).unwrap();
        let from_sources = run(&sources, &settings, &cancel).unwrap();
        assert_eq!(from_declarations, from_sources);
        assert_eq!(from_declarations.endpoints.len(), 2);
        assert!(from_declarations.has_errors());

        let disabled = PipelineSettings {
            enabled: false,
            ..PipelineSettings::default()
        };
        let off = run_declarations(&extracted.value, &disabled, &cancel).unwrap();
        assert_eq!(off, PipelineOutput::default());
        assert_eq!(off, run(&sources, &disabled, &cancel).unwrap());
    }
}

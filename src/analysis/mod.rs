//! Per-handler analysis.
//!
//! `analyze_handler` turns one candidate into an `EndpointDescriptor` or a
//! set of diagnostics explaining why it cannot be emitted. It depends only on
//! its `AnalysisInput`, which bundles the handler, the group structs it can
//! reach and the settings that affect the result. Equal inputs always give
//! equal outputs, which is what lets the incremental host cache it.

pub mod binding;
pub mod constraints;
pub mod return_type;
pub mod special_types;

use crate::core::{EndpointDescriptor, ParameterDescriptor};
use crate::diagnostics::{has_errors, Diagnostic, DiagnosticId};
use crate::discovery::resolve_candidate;
use crate::extraction::{HandlerDecl, StructDecl};
use crate::pipeline::stage::StageOutput;
use crate::routing::{canonicalize_route_names, parse_template, validate_route};
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span};

pub use binding::{Classifier, GroupTable, ParameterOutcome};
pub use return_type::{normalize_return, ReturnShape};

pub const DEFAULT_RESULT_WRAPPER: &str = "ErrorOr";
pub const DEFAULT_MAX_GROUP_DEPTH: usize = 4;

/// Settings that change analysis results. Part of every cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalysisSettings {
    pub result_wrappers: Vec<String>,
    pub max_group_depth: usize,
    /// Report handlers without a summary (`MissingSummary`).
    pub documentation_hints: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            result_wrappers: vec![DEFAULT_RESULT_WRAPPER.to_string()],
            max_group_depth: DEFAULT_MAX_GROUP_DEPTH,
            documentation_hints: false,
        }
    }
}

/// Everything `analyze_handler` reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnalysisInput {
    pub handler: HandlerDecl,
    /// Structs reachable through `#[group]`, in stable order.
    pub groups: Vec<StructDecl>,
    pub settings: AnalysisSettings,
}

impl AnalysisInput {
    pub fn new(handler: HandlerDecl, table: &GroupTable<'_>, settings: &AnalysisSettings) -> Self {
        let groups = table.reachable_from(&handler);
        Self {
            handler,
            groups,
            settings: settings.clone(),
        }
    }
}

/// Analyze one handler. The value is `None` whenever any Error was raised.
pub fn analyze_handler(input: &AnalysisInput) -> StageOutput<Option<EndpointDescriptor>> {
    let handler = &input.handler;
    let settings = &input.settings;
    let _span = debug_span!("analyze_handler", handler = %handler.name, file = %handler.key.file).entered();

    let resolved = match resolve_candidate(handler, &settings.result_wrappers) {
        Ok(resolved) => resolved,
        Err(diagnostic) => {
            debug!(id = diagnostic.id.code(), "Handler rejected");
            return StageOutput::new(None, vec![diagnostic]);
        }
    };

    let mut diagnostics = Vec::new();
    let template = match parse_template(&resolved.marker.template) {
        Ok(template) => Some(template),
        Err(error) => {
            diagnostics.push(Diagnostic::new(
                error.id,
                error.message,
                resolved.marker_location.clone(),
            ));
            None
        }
    };

    let placeholders = template
        .as_ref()
        .map(|t| t.placeholder_names().into_iter().map(str::to_string).collect())
        .unwrap_or_default();
    let table = GroupTable::new(&input.groups);
    let classifier = Classifier::new(placeholders, &table, settings.max_group_depth);

    let mut parameters: Vec<ParameterDescriptor> = Vec::with_capacity(handler.params.len());
    for param in &handler.params {
        match classifier.classify(param, &handler.namespace) {
            ParameterOutcome::Bound(descriptors) => parameters.extend(descriptors),
            ParameterOutcome::Rejected(diagnostic) => diagnostics.push(diagnostic),
        }
    }

    diagnostics.extend(constraints::check_parameter_set(&parameters, &resolved.marker.verb));
    if let Some(template) = &template {
        canonicalize_route_names(template, &mut parameters);
        diagnostics.extend(validate_route(template, &parameters, &resolved.marker_location));
    }

    let summary = resolved
        .marker
        .summary
        .clone()
        .or_else(|| handler.doc.as_deref().and_then(first_paragraph));
    if settings.documentation_hints && summary.is_none() {
        diagnostics.push(Diagnostic::new(
            DiagnosticId::MissingSummary,
            format!("handler `{}` has no summary or doc comment", handler.name),
            handler.location.clone(),
        ));
    }

    debug!(
        parameters = parameters.len(),
        diagnostics = diagnostics.len(),
        "Handler analyzed"
    );

    let (Some(route), false) = (template, has_errors(&diagnostics)) else {
        return StageOutput::new(None, diagnostics);
    };

    let endpoint = EndpointDescriptor {
        namespace: handler.namespace.clone(),
        owner: handler.owner.clone(),
        trait_name: handler.trait_name.clone(),
        method_name: handler.name.clone(),
        route,
        verb: resolved.marker.verb.clone(),
        success_status: resolved.marker.status,
        payload_type: resolved.shape.payload_name(),
        is_async: resolved.shape.is_async,
        parameters,
        display_name: resolved.marker.name.clone(),
        summary,
        key: handler.key.clone(),
        location: handler.location.clone(),
    };
    StageOutput::new(Some(endpoint), diagnostics)
}

fn first_paragraph(doc: &str) -> Option<String> {
    let paragraph = doc
        .split("\n\n")
        .next()
        .map(|p| p.lines().map(str::trim).collect::<Vec<_>>().join(" "))?;
    (!paragraph.is_empty()).then_some(paragraph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BindingSource;
    use crate::extraction::{DeclarationExtractor, SourceFile};
    use indoc::indoc;

    fn analyze(code: &str) -> StageOutput<Option<EndpointDescriptor>> {
        analyze_with(code, &AnalysisSettings::default())
    }

    fn analyze_with(code: &str, settings: &AnalysisSettings) -> StageOutput<Option<EndpointDescriptor>> {
        let data = DeclarationExtractor::extract(&SourceFile::new("src/api.rs", code)).expect("parse");
        let table = GroupTable::new(&data.structs);
        let handler = data.handlers.last().cloned().expect("handler");
        analyze_handler(&AnalysisInput::new(handler, &table, settings))
    }

    fn ids(output: &StageOutput<Option<EndpointDescriptor>>) -> Vec<DiagnosticId> {
        output.diagnostics.iter().map(|d| d.id).collect()
    }

    #[test]
    fn test_clean_handler() {
        let output = analyze(indoc! {r#"
            /// Lists a user's posts.
            #[get("/users/{id}/posts/{slug}")]
            async fn posts(id: i32, slug: String, page: Option<i32>) -> ErrorOr<Vec<Post>> { todo!() }
        "#});
        assert!(output.diagnostics.is_empty());
        let endpoint = output.value.expect("emitted");
        let sources: Vec<_> = endpoint.parameters.iter().map(|p| p.source.clone()).collect();
        assert_eq!(
            sources,
            vec![
                BindingSource::ImplicitRoute,
                BindingSource::ImplicitRoute,
                BindingSource::ImplicitQuery
            ]
        );
        assert_eq!(endpoint.summary.as_deref(), Some("Lists a user's posts."));
        assert_eq!(endpoint.payload_type, "Vec<Post>");
        assert_eq!(endpoint.success_status, 200);
    }

    #[test]
    fn test_malformed_template_still_classifies_parameters() {
        let output = analyze(indoc! {r#"
            #[get("/users/{id")]
            fn broken(repo: Repo) -> ErrorOr<u8> { todo!() }
        "#});
        assert_eq!(
            ids(&output),
            vec![DiagnosticId::MalformedRouteTemplate, DiagnosticId::AmbiguousParameter]
        );
        assert!(output.value.is_none());
    }

    #[test]
    fn test_warnings_do_not_block() {
        let output = analyze(indoc! {r#"
            #[get("/items/{id:int}")]
            fn item(id: bool) -> ErrorOr<u8> { todo!() }
        "#});
        assert_eq!(ids(&output), vec![DiagnosticId::RouteConstraintMismatch]);
        assert!(output.value.is_some());
    }

    #[test]
    fn test_documentation_hints_opt_in() {
        let code = indoc! {r#"
            #[get("/ping")]
            fn ping() -> ErrorOr<()> { todo!() }
        "#};
        assert!(analyze(code).diagnostics.is_empty());

        let settings = AnalysisSettings {
            documentation_hints: true,
            ..AnalysisSettings::default()
        };
        let output = analyze_with(code, &settings);
        assert_eq!(ids(&output), vec![DiagnosticId::MissingSummary]);
        assert!(output.value.is_some());
    }

    #[test]
    fn test_group_members_bind_route_values() {
        let output = analyze(indoc! {r#"
            pub struct Keys {
                pub tenant: String,
                pub id: u64,
            }

            #[delete("/tenants/{tenant}/items/{id}")]
            fn remove(#[group] keys: Keys) -> ErrorOr<()> { todo!() }
        "#});
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        let endpoint = output.value.expect("emitted");
        assert_eq!(endpoint.parameters.len(), 3);
    }

    #[test]
    fn test_marker_summary_overrides_doc() {
        let output = analyze(indoc! {r#"
            /// From docs.
            #[get("/s", summary = "From marker")]
            fn s() -> ErrorOr<u8> { todo!() }
        "#});
        assert_eq!(
            output.value.and_then(|e| e.summary).as_deref(),
            Some("From marker")
        );
    }

    #[test]
    fn test_first_paragraph() {
        assert_eq!(first_paragraph("One\ntwo\n\nthree").as_deref(), Some("One two"));
        assert_eq!(first_paragraph(""), None);
    }
}

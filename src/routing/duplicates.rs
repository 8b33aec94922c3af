//! Cross-entity uniqueness pass.
//!
//! Runs over endpoints that already validated cleanly. Endpoints are first
//! put in their total order, so the registrant reported as "first" does not
//! depend on how the input was collected.

use crate::core::{EndpointDescriptor, RouteSegment, RouteTemplate};
use crate::diagnostics::{Diagnostic, DiagnosticId};
use crate::pipeline::stage::StageOutput;
use std::collections::BTreeMap;
use tracing::debug;

/// Normalized identity of a route: verb plus shape of the path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteKey {
    pub verb: String,
    pub path: String,
}

impl RouteKey {
    pub fn of(verb: &str, template: &RouteTemplate) -> Self {
        let path = template
            .segments
            .iter()
            .map(|segment| match segment {
                RouteSegment::Literal(text) => text.to_lowercase(),
                RouteSegment::Placeholder { catch_all: true, .. } => "{*}".to_string(),
                RouteSegment::Placeholder { .. } => "{}".to_string(),
            })
            .collect::<Vec<_>>()
            .join("/");
        Self {
            verb: verb.to_ascii_uppercase(),
            path: format!("/{path}"),
        }
    }
}

/// Sort endpoints into their total order and drop later duplicates.
///
/// Returns the survivors in order plus one diagnostic per rejected
/// registrant. Endpoints whose effective names collide get a warning but
/// are kept.
pub fn detect_duplicates(endpoints: &[EndpointDescriptor]) -> StageOutput<Vec<EndpointDescriptor>> {
    let mut ordered: Vec<&EndpointDescriptor> = endpoints.iter().collect();
    ordered.sort_by(|a, b| a.order_key().cmp(&b.order_key()));

    let mut first_by_route: BTreeMap<RouteKey, &EndpointDescriptor> = BTreeMap::new();
    let mut first_by_name: BTreeMap<String, &EndpointDescriptor> = BTreeMap::new();
    let mut survivors = Vec::with_capacity(ordered.len());
    let mut diagnostics = Vec::new();

    for endpoint in ordered {
        let key = RouteKey::of(&endpoint.verb, &endpoint.route);
        if let Some(first) = first_by_route.get(&key) {
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticId::DuplicateRoute,
                    format!(
                        "{} {} is already registered by `{}`; `{}` is not registered",
                        key.verb,
                        endpoint.route.raw,
                        first.qualified_name(),
                        endpoint.qualified_name()
                    ),
                    endpoint.location.clone(),
                )
                .with_related(first.location.clone()),
            );
            continue;
        }
        first_by_route.insert(key, endpoint);

        let name = endpoint.effective_name();
        match first_by_name.get(&name) {
            Some(first) => diagnostics.push(
                Diagnostic::new(
                    DiagnosticId::DuplicateEndpointName,
                    format!(
                        "endpoint name \"{name}\" is also used by `{}`",
                        first.qualified_name()
                    ),
                    endpoint.location.clone(),
                )
                .with_related(first.location.clone()),
            ),
            None => {
                first_by_name.insert(name, endpoint);
            }
        }
        survivors.push(endpoint.clone());
    }

    debug!(
        endpoints = endpoints.len(),
        kept = survivors.len(),
        "Duplicate route pass complete"
    );
    StageOutput::new(survivors, diagnostics)
}

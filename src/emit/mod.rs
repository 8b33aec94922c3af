//! Registration code emitter.
//!
//! One rendered unit per containing type and module: an
//! `impl crate::path::Owner` block for handlers declared on a type, or a free
//! `map_<module>_endpoints` function for free handlers. A unit is meant to be
//! included in the module its handlers were declared in, where their
//! parameter types resolve.
//!
//! A type's own module gets `map_endpoints`. `impl` blocks for the same type
//! in other modules get `map_<module path>_endpoints` instead, so no two
//! units define the same inherent method. Endpoints appear in declaration
//! order and formatting is fixed, so equal descriptors always render to
//! identical bytes.
//!
//! Generated code targets a runtime crate providing:
//!
//! ```rust,ignore
//! pub trait RouteBuilder {
//!     fn map<H>(&mut self, verb: &'static str, template: &'static str, metadata: EndpointMetadata, handler: H);
//! }
//! pub fn map_result<T, E>(value_or_errors: Result<T, Vec<E>>, success_status: u16) -> Response;
//! ```

pub mod accessors;
pub mod writer;

use crate::core::{
    BindingSource, ContainingType, EndpointDescriptor, GroupFrame, OwnerKind, ParameterDescriptor,
};
use crate::extraction::namespace::module_name;
use accessors::{accessor, local_name, pass_prefix, struct_path};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use writer::CodeWriter;

pub const DEFAULT_RUNTIME_CRATE: &str = "routegen_runtime";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmitOptions {
    /// Path of the crate providing `RouteBuilder`, `EndpointMetadata` and
    /// `map_result`.
    pub runtime_crate: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            runtime_crate: DEFAULT_RUNTIME_CRATE.to_string(),
        }
    }
}

/// Generated source for one containing type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderedUnit {
    pub namespace: String,
    pub owner: ContainingType,
    /// Output file name, distinct for distinct owners.
    pub file_name: String,
    pub text: String,
}

/// Input of the per-owner emission stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitInput {
    /// Endpoints of one owner, in declaration order.
    pub endpoints: Vec<EndpointDescriptor>,
    pub options: EmitOptions,
}

/// Group endpoints by (module, owner), each group in declaration order.
pub fn group_by_owner(endpoints: &[EndpointDescriptor]) -> Vec<Vec<EndpointDescriptor>> {
    let mut groups: BTreeMap<(&str, &ContainingType), Vec<EndpointDescriptor>> = BTreeMap::new();
    for endpoint in endpoints {
        groups
            .entry((endpoint.namespace.as_str(), &endpoint.owner))
            .or_default()
            .push(endpoint.clone());
    }
    groups
        .into_values()
        .map(|mut group| {
            group.sort_by(|a, b| a.key.cmp(&b.key));
            group
        })
        .collect()
}

pub fn render_units(endpoints: &[EndpointDescriptor], options: &EmitOptions) -> Vec<RenderedUnit> {
    let units: Vec<RenderedUnit> = group_by_owner(endpoints)
        .into_iter()
        .filter_map(|group| {
            render_unit(&UnitInput {
                endpoints: group,
                options: options.clone(),
            })
        })
        .collect();
    debug!(units = units.len(), "Rendered registration units");
    units
}

/// Render one owner's endpoints. `None` for an empty group.
pub fn render_unit(input: &UnitInput) -> Option<RenderedUnit> {
    let first = input.endpoints.first()?;
    let owner = &first.owner;
    let runtime = &input.options.runtime_crate;
    let mut w = CodeWriter::new();

    let namespace = first.namespace.as_str();
    w.line(format!("// @generated by routegen from {namespace}. Do not edit."));
    w.blank();

    match owner.kind {
        OwnerKind::Type => {
            w.open(format!("impl {} {{", owner.path));
            w.line("#[allow(unused_mut, unused_variables)]");
            w.open(format!(
                "pub fn {}<B: {runtime}::RouteBuilder>(builder: &mut B) {{",
                type_function_name(namespace, owner)
            ));
            write_endpoints(&mut w, &input.endpoints, runtime);
            w.close("}");
            w.close("}");
        }
        OwnerKind::Module => {
            w.line("#[allow(unused_mut, unused_variables)]");
            w.open(format!(
                "pub fn map_{}_endpoints<B: {runtime}::RouteBuilder>(builder: &mut B) {{",
                module_name(namespace)
            ));
            write_endpoints(&mut w, &input.endpoints, runtime);
            w.close("}");
        }
    }

    Some(RenderedUnit {
        namespace: namespace.to_string(),
        owner: owner.clone(),
        file_name: file_name(namespace, owner),
        text: w.finish(),
    })
}

fn write_endpoints(w: &mut CodeWriter, endpoints: &[EndpointDescriptor], runtime: &str) {
    for (index, endpoint) in endpoints.iter().enumerate() {
        if index > 0 {
            w.blank();
        }
        write_endpoint(w, endpoint, runtime);
    }
}

fn write_endpoint(w: &mut CodeWriter, endpoint: &EndpointDescriptor, runtime: &str) {
    let template = &endpoint.route.raw;
    w.line(format!("// {} {template}", endpoint.verb));
    w.open("builder.map(");
    w.line(format!("{:?},", endpoint.verb));
    w.line(format!("{template:?},"));
    w.open(format!("{runtime}::EndpointMetadata {{"));
    w.line(format!("name: {:?},", endpoint.effective_name()));
    match &endpoint.summary {
        Some(summary) => w.line(format!("summary: Some({summary:?}),")),
        None => w.line("summary: None,"),
    };
    w.line(format!("payload_type: {:?},", endpoint.payload_type));
    w.line(format!("success_status: {},", endpoint.success_status));
    w.close("},");
    w.open("|mut request| {");
    w.open("Box::pin(async move {");

    for (index, parameter) in endpoint.parameters.iter().enumerate() {
        if let Some(expr) = accessor(parameter) {
            let binding = if pass_prefix(&parameter.ty) == "&mut " {
                "let mut"
            } else {
                "let"
            };
            w.line(format!(
                "{binding} {}: {} = {expr};",
                local_name(parameter, index),
                parameter.ty.owned()
            ));
        }
    }

    let args: Vec<String> = top_level_indices(&endpoint.parameters)
        .map(|index| argument_expr(&endpoint.parameters, index))
        .collect();
    let await_suffix = if endpoint.is_async { ".await" } else { "" };
    w.line(format!(
        "let result = {}({}){await_suffix};",
        call_path(endpoint),
        args.join(", ")
    ));
    w.line(format!(
        "Ok({runtime}::map_result(result, {}))",
        endpoint.success_status
    ));

    w.close("})");
    w.close("},");
    w.close(");");
}

fn top_level_indices(parameters: &[ParameterDescriptor]) -> impl Iterator<Item = usize> + '_ {
    parameters
        .iter()
        .enumerate()
        .filter(|(_, p)| p.group_path.is_empty())
        .map(|(index, _)| index)
}

/// Argument expression for the parameter at `index`, assembling groups from
/// their members.
fn argument_expr(parameters: &[ParameterDescriptor], index: usize) -> String {
    let parameter = &parameters[index];
    let prefix = pass_prefix(&parameter.ty);
    let BindingSource::ParameterGroup { type_name } = &parameter.source else {
        return format!("{prefix}{}", local_name(parameter, index));
    };

    let mut member_path = parameter.group_path.clone();
    member_path.push(GroupFrame {
        binding: parameter.name.clone(),
        type_name: type_name.clone(),
    });
    let fields: Vec<String> = parameters
        .iter()
        .enumerate()
        .filter(|(_, p)| p.group_path == member_path)
        .map(|(child, p)| format!("{}: {}", p.name, argument_expr(parameters, child)))
        .collect();
    format!("{prefix}{} {{ {} }}", struct_path(&parameter.ty), fields.join(", "))
}

fn call_path(endpoint: &EndpointDescriptor) -> String {
    match (endpoint.owner.kind, &endpoint.trait_name) {
        (OwnerKind::Type, Some(trait_name)) => format!(
            "<{} as {trait_name}>::{}",
            endpoint.owner.path, endpoint.method_name
        ),
        (OwnerKind::Type, None) => format!("{}::{}", endpoint.owner.path, endpoint.method_name),
        (OwnerKind::Module, _) => endpoint.method_name.clone(),
    }
}

/// `map_endpoints` in the owner's own module, otherwise
/// `map_<module path>_endpoints` (`crate::users::write` gives
/// `map_users_write_endpoints`).
fn type_function_name(namespace: &str, owner: &ContainingType) -> String {
    if namespace == owner.module() {
        return "map_endpoints".to_string();
    }
    let relative = namespace.strip_prefix("crate::").unwrap_or(namespace);
    format!("map_{}_endpoints", relative.replace("::", "_"))
}

/// Output file for a unit.
///
/// - `crate::users::UsersApi` from its own module: `crate.users.UsersApi.rs`
/// - the same type from `crate::admin`: `crate.admin.crate.users.UsersApi.rs`
/// - free handlers of `crate::health`: `crate.health-routes.rs`
///
/// Path segments are identifiers, which never contain `.` or `-`, and
/// `crate` only ever starts a path, so distinct units never share a file.
fn file_name(namespace: &str, owner: &ContainingType) -> String {
    let dotted = |path: &str| path.replace("::", ".");
    match owner.kind {
        OwnerKind::Type if namespace == owner.module() => format!("{}.rs", dotted(&owner.path)),
        OwnerKind::Type => format!("{}.{}.rs", dotted(namespace), dotted(&owner.path)),
        OwnerKind::Module => format!("{}-routes.rs", dotted(namespace)),
    }
}

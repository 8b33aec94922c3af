//! Parameter binding classification.
//!
//! Each parameter is classified by the first rule that matches:
//!
//! 1. an explicit binding attribute (`#[query]`, `#[body]`, `#[group]`, ...)
//! 2. a framework-special type (context, cancellation, raw stream, form files)
//! 3. a name exactly equal to a route placeholder: implicit route value
//! 4. a primitive or collection of primitives: implicit query value
//! 5. otherwise the parameter is ambiguous and needs an attribute
//!
//! There is no implicit service rule. A parameter of some arbitrary type is
//! ambiguous rather than silently resolved from the container; services must
//! be asked for with `#[service]` or `#[keyed_service]`.
//!
//! `#[group]` parameters expand into the named fields of their struct, each
//! classified by the same rules. Expansion is depth-bounded and tracks the
//! types on the current path to reject cycles.

use super::special_types::{is_query_bindable, special_kind};
use crate::core::{
    AttributeKind, BindingAttribute, BindingSource, GroupFrame, ParameterDescriptor, TypeRef,
};
use crate::diagnostics::{Diagnostic, DiagnosticId};
use crate::extraction::namespace::resolve_path;
use crate::extraction::{AttrValue, AttributeDecl, HandlerDecl, ParamDecl, StructDecl};
use std::collections::{BTreeMap, BTreeSet};

/// Result for one declared parameter: exactly one of these, never both.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParameterOutcome {
    /// The parameter's descriptor. A group yields its own descriptor first,
    /// followed by its flattened members.
    Bound(Vec<ParameterDescriptor>),
    Rejected(Diagnostic),
}

impl ParameterOutcome {
    pub fn is_bound(&self) -> bool {
        matches!(self, Self::Bound(_))
    }
}

/// Struct definitions by name, for `#[group]` lookup.
#[derive(Debug, Default)]
pub struct GroupTable<'a> {
    by_name: BTreeMap<&'a str, Vec<&'a StructDecl>>,
}

impl<'a> GroupTable<'a> {
    pub fn new(structs: &'a [StructDecl]) -> Self {
        let mut by_name: BTreeMap<&str, Vec<&StructDecl>> = BTreeMap::new();
        for decl in structs {
            by_name.entry(decl.name.as_str()).or_default().push(decl);
        }
        for candidates in by_name.values_mut() {
            candidates.sort_by(|a, b| (&a.namespace, &a.location).cmp(&(&b.namespace, &b.location)));
        }
        Self { by_name }
    }

    /// Prefer a struct from `namespace`, then the first by namespace order.
    pub fn find(&self, name: &str, namespace: &str) -> Option<&'a StructDecl> {
        let candidates = self.by_name.get(name)?;
        candidates
            .iter()
            .find(|decl| decl.namespace == namespace)
            .or_else(|| candidates.first())
            .copied()
    }

    /// Struct named by `ty` as written in `namespace`. A qualified path
    /// (`models::Paging`, `super::Paging`) picks the struct in the module it
    /// resolves to, or one whose module ends with the written qualifier.
    pub fn resolve(&self, ty: &TypeRef, namespace: &str) -> Option<&'a StructDecl> {
        let TypeRef::Path { segments, .. } = ty.peel_references() else {
            return None;
        };
        let (name, qualifier) = segments.split_last()?;
        if qualifier.is_empty() {
            return self.find(name, namespace);
        }
        let candidates = self.by_name.get(name.as_str())?;
        let target = resolve_path(namespace, qualifier);
        let written = format!("::{}", qualifier.join("::"));
        candidates
            .iter()
            .find(|decl| decl.namespace == target)
            .or_else(|| candidates.iter().find(|decl| decl.namespace.ends_with(&written)))
            .or_else(|| candidates.first())
            .copied()
    }

    /// Every struct a handler's `#[group]` parameters can reach, in a stable
    /// order. Only these feed into the handler's analysis, so edits to
    /// unrelated structs leave its cached result valid.
    pub fn reachable_from(&self, handler: &HandlerDecl) -> Vec<StructDecl> {
        let mut pending: Vec<&str> = handler.params.iter().filter_map(group_type_name).collect();
        let mut seen = BTreeSet::new();
        let mut reachable = Vec::new();

        while let Some(name) = pending.pop() {
            if !seen.insert(name) {
                continue;
            }
            for decl in self.by_name.get(name).into_iter().flatten() {
                reachable.push((*decl).clone());
                if let Some(fields) = &decl.fields {
                    pending.extend(fields.iter().filter_map(group_type_name));
                }
            }
        }

        reachable.sort_by(|a, b| {
            (&a.namespace, &a.name, &a.location).cmp(&(&b.namespace, &b.name, &b.location))
        });
        reachable
    }
}

fn group_type_name(param: &ParamDecl) -> Option<&str> {
    param
        .attributes
        .iter()
        .any(|attr| attr.name() == AttributeKind::Group.as_str())
        .then(|| param.ty.peel_references().last_segment())
        .flatten()
}

pub struct Classifier<'a> {
    placeholders: Vec<String>,
    groups: &'a GroupTable<'a>,
    max_depth: usize,
}

impl<'a> Classifier<'a> {
    pub fn new(placeholders: Vec<String>, groups: &'a GroupTable<'a>, max_depth: usize) -> Self {
        Self {
            placeholders,
            groups,
            max_depth,
        }
    }

    /// Classify one handler parameter declared in `namespace`.
    pub fn classify(&self, param: &ParamDecl, namespace: &str) -> ParameterOutcome {
        let mut visiting = Vec::new();
        self.classify_in(param, namespace, &[], &mut visiting)
    }

    fn classify_in(
        &self,
        param: &ParamDecl,
        namespace: &str,
        path: &[GroupFrame],
        visiting: &mut Vec<String>,
    ) -> ParameterOutcome {
        let Some(name) = param.name.as_deref() else {
            return ParameterOutcome::Rejected(Diagnostic::new(
                DiagnosticId::AmbiguousParameter,
                format!(
                    "parameter of type `{}` is not a plain identifier and cannot be bound",
                    param.ty
                ),
                param.location.clone(),
            ));
        };
        let display = display_path(path, name);

        let attribute = match explicit_attribute(param, &display) {
            Ok(attribute) => attribute,
            Err(diagnostic) => return ParameterOutcome::Rejected(diagnostic),
        };

        let source = match attribute {
            Some(attribute) if attribute.kind == AttributeKind::Group => {
                return self.expand_group(param, name, attribute, namespace, path, visiting);
            }
            Some(attribute) => {
                let source = explicit_source(&attribute, name);
                return ParameterOutcome::Bound(vec![descriptor(param, name, Some(attribute), source, path)]);
            }
            None => implicit_source(param, name, &self.placeholders),
        };

        match source {
            Some(source) => ParameterOutcome::Bound(vec![descriptor(param, name, None, source, path)]),
            None => ParameterOutcome::Rejected(Diagnostic::new(
                DiagnosticId::AmbiguousParameter,
                format!(
                    "cannot infer a binding source for `{display}: {}`; add #[body], #[service], #[query] or another binding attribute",
                    param.ty
                ),
                param.location.clone(),
            )),
        }
    }

    fn expand_group(
        &self,
        param: &ParamDecl,
        name: &str,
        attribute: BindingAttribute,
        namespace: &str,
        path: &[GroupFrame],
        visiting: &mut Vec<String>,
    ) -> ParameterOutcome {
        let display = display_path(path, name);
        let reject = |id: DiagnosticId, message: String| {
            ParameterOutcome::Rejected(Diagnostic::new(id, message, param.location.clone()))
        };

        let Some(type_name) = param.ty.peel_references().last_segment() else {
            return reject(
                DiagnosticId::UnknownParameterGroupType,
                format!("group `{display}` has type `{}`, which is not a named struct", param.ty),
            );
        };
        let found = self.groups.resolve(&param.ty, namespace);
        let identity = found.map(|decl| format!("{}::{}", decl.namespace, decl.name));
        if identity
            .as_ref()
            .is_some_and(|identity| visiting.contains(identity))
        {
            return reject(
                DiagnosticId::ParameterGroupCycle,
                format!("group `{display}` of type `{type_name}` contains itself"),
            );
        }
        if path.len() + 1 > self.max_depth {
            return reject(
                DiagnosticId::ParameterGroupTooDeep,
                format!(
                    "group `{display}` is nested {} levels deep; the limit is {}",
                    path.len() + 1,
                    self.max_depth
                ),
            );
        }
        let (Some(decl), Some(identity)) = (found, identity) else {
            return reject(
                DiagnosticId::UnknownParameterGroupType,
                format!("group `{display}` has type `{type_name}`, but no such struct was found"),
            );
        };
        let Some(fields) = decl.fields.as_ref().filter(|fields| !fields.is_empty()) else {
            return reject(
                DiagnosticId::UnknownParameterGroupType,
                format!("group type `{type_name}` has no named fields"),
            );
        };

        let header = descriptor(
            param,
            name,
            Some(attribute),
            BindingSource::ParameterGroup {
                type_name: type_name.to_string(),
            },
            path,
        );
        let mut member_path = path.to_vec();
        member_path.push(GroupFrame {
            binding: name.to_string(),
            type_name: type_name.to_string(),
        });

        visiting.push(identity);
        let mut descriptors = vec![header];
        let mut rejected = None;
        for field in fields {
            match self.classify_in(field, &decl.namespace, &member_path, visiting) {
                ParameterOutcome::Bound(members) => descriptors.extend(members),
                ParameterOutcome::Rejected(diagnostic) => {
                    rejected = Some(diagnostic);
                    break;
                }
            }
        }
        visiting.pop();

        match rejected {
            Some(diagnostic) => ParameterOutcome::Rejected(diagnostic),
            None => ParameterOutcome::Bound(descriptors),
        }
    }
}

/// The single explicit binding attribute, if any.
fn explicit_attribute(param: &ParamDecl, display: &str) -> Result<Option<BindingAttribute>, Diagnostic> {
    let candidates: Vec<(&AttributeDecl, AttributeKind)> = param
        .attributes
        .iter()
        .filter_map(|attr| AttributeKind::from_name(attr.name()).map(|kind| (attr, kind)))
        .collect();
    if candidates.is_empty() {
        return Ok(None);
    }

    let conflict = |detail: String| {
        Diagnostic::new(
            DiagnosticId::ConflictingBindingAttributes,
            format!("parameter `{display}` has conflicting binding attributes: {detail}"),
            param.location.clone(),
        )
    };

    let kinds: BTreeSet<AttributeKind> = candidates.iter().map(|(_, kind)| *kind).collect();
    if kinds.len() > 1 {
        let names: Vec<String> = kinds.iter().map(|kind| format!("#[{}]", kind.as_str())).collect();
        return Err(conflict(names.join(", ")));
    }

    let parsed = candidates
        .iter()
        .map(|(attr, kind)| parse_binding_attribute(attr, *kind))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|reason| {
            Diagnostic::new(
                DiagnosticId::InvalidBindingAttribute,
                format!("parameter `{display}`: {reason}"),
                param.location.clone(),
            )
        })?;

    if parsed.windows(2).any(|pair| pair[0] != pair[1]) {
        let kind = parsed[0].kind.as_str();
        return Err(conflict(format!("#[{kind}] repeated with different arguments")));
    }
    Ok(parsed.into_iter().next())
}

/// Read the arguments of a binding attribute.
pub fn parse_binding_attribute(attr: &AttributeDecl, kind: AttributeKind) -> Result<BindingAttribute, String> {
    let label = kind.as_str();
    if let Some(raw) = &attr.malformed {
        return Err(format!("cannot read arguments of #[{label}]: `{raw}`"));
    }

    let key_name = match kind {
        AttributeKind::KeyedService => "key",
        _ => "name",
    };
    let mut value = None;
    for arg in &attr.args {
        let accepted = match arg.key.as_deref() {
            None => true,
            Some(key) => key == key_name,
        };
        if !accepted {
            return Err(format!(
                "unknown argument `{}` on #[{label}]",
                arg.key.as_deref().unwrap_or_default()
            ));
        }
        if value.is_some() {
            return Err(format!("#[{label}] takes at most one argument"));
        }
        value = Some(&arg.value);
    }

    let text = match value {
        None => None,
        Some(AttrValue::Str(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(AttrValue::Int(i)) if kind == AttributeKind::KeyedService => Some(i.to_string()),
        Some(_) => return Err(format!("#[{label}] expects a non-empty string literal")),
    };

    match kind {
        AttributeKind::Body | AttributeKind::Service | AttributeKind::Group if text.is_some() => {
            Err(format!("#[{label}] takes no arguments"))
        }
        AttributeKind::KeyedService if text.is_none() => {
            Err("#[keyed_service] requires a key".to_string())
        }
        _ => Ok(BindingAttribute { kind, name: text }),
    }
}

fn explicit_source(attribute: &BindingAttribute, param_name: &str) -> BindingSource {
    let name = || attribute.name.clone().unwrap_or_else(|| param_name.to_string());
    match attribute.kind {
        AttributeKind::Route => BindingSource::ExplicitRoute { name: name() },
        AttributeKind::Query => BindingSource::ExplicitQuery { name: name() },
        AttributeKind::Header => BindingSource::ExplicitHeader { name: name() },
        AttributeKind::Body => BindingSource::ExplicitBody,
        AttributeKind::Form => BindingSource::ExplicitForm { name: name() },
        AttributeKind::Service => BindingSource::ExplicitService,
        AttributeKind::KeyedService => BindingSource::ExplicitKeyedService { key: name() },
        AttributeKind::Group => BindingSource::ParameterGroup {
            type_name: name(),
        },
    }
}

/// Rules 2-4. `None` means ambiguous.
fn implicit_source(param: &ParamDecl, name: &str, placeholders: &[String]) -> Option<BindingSource> {
    if let Some(kind) = special_kind(&param.ty) {
        return Some(BindingSource::SpecialType(kind));
    }
    if placeholders.iter().any(|placeholder| placeholder == name) {
        return Some(BindingSource::ImplicitRoute);
    }
    is_query_bindable(&param.ty).then_some(BindingSource::ImplicitQuery)
}

fn descriptor(
    param: &ParamDecl,
    name: &str,
    attribute: Option<BindingAttribute>,
    source: BindingSource,
    path: &[GroupFrame],
) -> ParameterDescriptor {
    ParameterDescriptor {
        name: name.to_string(),
        ty: param.ty.clone(),
        attribute,
        source,
        group_path: path.to_vec(),
        location: param.location.clone(),
    }
}

fn display_path(path: &[GroupFrame], name: &str) -> String {
    path.iter()
        .map(|frame| frame.binding.as_str())
        .chain(std::iter::once(name))
        .collect::<Vec<_>>()
        .join(".")
}

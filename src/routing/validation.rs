//! Agreement between a parsed template and the classified parameters.

use crate::analysis::special_types::{is_string_like, INTEGER_TYPES};
use crate::core::{BindingSource, Location, ParameterDescriptor, RouteSegment, RouteTemplate, TypeRef};
use crate::diagnostics::{Diagnostic, DiagnosticId};
use std::collections::BTreeMap;

const DATE_TYPES: [&str; 5] = ["DateTime", "NaiveDateTime", "NaiveDate", "OffsetDateTime", "SystemTime"];
const FLOAT_TYPES: [&str; 3] = ["f32", "f64", "Decimal"];
const RUST_PRIMITIVES: [&str; 16] = [
    "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize", "f32",
    "f64", "bool", "char",
];

/// Check placeholder claims and constraint agreement.
///
/// `route_location` is where template-level findings (unbound placeholders)
/// are reported.
pub fn validate_route(
    template: &RouteTemplate,
    parameters: &[ParameterDescriptor],
    route_location: &Location,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    // Keyed by lower-cased placeholder name, claimants in parameter order.
    let mut claims: BTreeMap<String, Vec<&ParameterDescriptor>> = BTreeMap::new();

    for parameter in parameters.iter().filter(|p| p.source.is_route()) {
        let wanted = parameter.bound_name();
        let found = template.placeholder_names().into_iter().find(|name| {
            if matches!(parameter.source, BindingSource::ImplicitRoute) {
                *name == wanted
            } else {
                name.eq_ignore_ascii_case(wanted)
            }
        });
        match found {
            Some(name) => claims.entry(name.to_lowercase()).or_default().push(parameter),
            None => diagnostics.push(Diagnostic::new(
                DiagnosticId::UnknownRouteParameter,
                format!(
                    "parameter `{}` is bound to route value '{wanted}', but \"{}\" has no such placeholder",
                    display_name(parameter),
                    template.raw
                ),
                parameter.location.clone(),
            )),
        }
    }

    for segment in &template.segments {
        let RouteSegment::Placeholder {
            name,
            constraints,
            optional,
            ..
        } = segment
        else {
            continue;
        };

        let claimants = claims.get(&name.to_lowercase()).map(Vec::as_slice).unwrap_or_default();
        let Some(first) = claimants.first() else {
            diagnostics.push(Diagnostic::new(
                DiagnosticId::RouteParameterNotBound,
                format!(
                    "route placeholder '{{{name}}}' in \"{}\" is not bound to any parameter",
                    template.raw
                ),
                route_location.clone(),
            ));
            continue;
        };

        for extra in &claimants[1..] {
            diagnostics.push(Diagnostic::new(
                DiagnosticId::RouteParameterBoundTwice,
                format!(
                    "route placeholder '{{{name}}}' is already bound to `{}`; `{}` cannot bind it again",
                    display_name(first),
                    display_name(extra)
                ),
                extra.location.clone(),
            ));
        }

        for constraint in constraints {
            if constraint_accepts(constraint, &first.ty) == Some(false) {
                diagnostics.push(Diagnostic::new(
                    DiagnosticId::RouteConstraintMismatch,
                    format!(
                        "placeholder '{{{name}}}' is constrained to '{constraint}', but `{}` has type `{}`",
                        display_name(first),
                        first.ty
                    ),
                    first.location.clone(),
                ));
            }
        }

        if !optional && first.ty.peel_references().is_option() {
            diagnostics.push(Diagnostic::new(
                DiagnosticId::NullableRouteParameter,
                format!(
                    "`{}` is optional but placeholder '{{{name}}}' always has a value",
                    display_name(first)
                ),
                first.location.clone(),
            ));
        }
    }

    diagnostics
}

/// Rewrite each explicit route binding to the spelling of the placeholder it
/// matches, so emitted code asks the router for the captured name.
/// Bindings matching no placeholder are left for `validate_route` to report.
pub fn canonicalize_route_names(template: &RouteTemplate, parameters: &mut [ParameterDescriptor]) {
    let placeholders = template.placeholder_names();
    for parameter in parameters.iter_mut() {
        let BindingSource::ExplicitRoute { name } = &mut parameter.source else {
            continue;
        };
        if let Some(canonical) = placeholders.iter().find(|p| p.eq_ignore_ascii_case(name.as_str())) {
            if *canonical != name.as_str() {
                *name = canonical.to_string();
            }
        }
    }
}

/// Whether a placeholder constraint admits a parameter type. `None` when
/// the constraint is not one this check knows about.
pub fn constraint_accepts(constraint: &str, ty: &TypeRef) -> Option<bool> {
    let mut ty = ty.peel_references();
    while let Some(inner) = ty.option_inner() {
        ty = inner.peel_references();
    }
    if is_string_like(ty) {
        return Some(true);
    }
    let type_name = ty.last_segment()?;
    let constraint_name = constraint
        .split('(')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let accepted = match constraint_name.as_str() {
        "int" | "long" => INTEGER_TYPES.contains(&type_name),
        "float" | "double" | "decimal" => FLOAT_TYPES.contains(&type_name),
        "bool" => type_name == "bool",
        "guid" | "uuid" => type_name == "Uuid",
        "datetime" => DATE_TYPES.contains(&type_name),
        "alpha" => type_name == "char",
        name if RUST_PRIMITIVES.contains(&name) => type_name == name,
        _ => return None,
    };
    Some(accepted)
}

fn display_name(parameter: &ParameterDescriptor) -> String {
    if parameter.group_path.is_empty() {
        return parameter.name.clone();
    }
    let mut path: Vec<&str> = parameter.group_path.iter().map(|f| f.binding.as_str()).collect();
    path.push(&parameter.name);
    path.join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GroupFrame;
    use crate::routing::template::parse_template;

    fn param(name: &str, ty: TypeRef, source: BindingSource) -> ParameterDescriptor {
        ParameterDescriptor {
            name: name.into(),
            ty,
            attribute: None,
            source,
            group_path: Vec::new(),
            location: Location::new("src/a.rs", 3, 1),
        }
    }

    fn ids(diagnostics: &[Diagnostic]) -> Vec<DiagnosticId> {
        diagnostics.iter().map(|d| d.id).collect()
    }

    fn validate(raw: &str, params: &[ParameterDescriptor]) -> Vec<Diagnostic> {
        let template = parse_template(raw).unwrap();
        validate_route(&template, params, &Location::new("src/a.rs", 1, 1))
    }

    #[test]
    fn test_all_placeholders_bound() {
        let params = [
            param("id", TypeRef::named("i32"), BindingSource::ImplicitRoute),
            param("slug", TypeRef::named("String"), BindingSource::ImplicitRoute),
        ];
        assert!(validate("/users/{id:int}/posts/{slug:alpha}", &params).is_empty());
    }

    #[test]
    fn test_unbound_placeholder() {
        let params = [param("id", TypeRef::named("i32"), BindingSource::ImplicitQuery)];
        let diagnostics = validate("/users/{userId}", &params);
        assert_eq!(ids(&diagnostics), vec![DiagnosticId::RouteParameterNotBound]);
        assert!(diagnostics[0].message.contains("userId"));
    }

    #[test]
    fn test_explicit_route_name_is_case_insensitive() {
        let params = [param(
            "id",
            TypeRef::named("i32"),
            BindingSource::ExplicitRoute {
                name: "userid".into(),
            },
        )];
        assert!(validate("/users/{userId}", &params).is_empty());
    }

    #[test]
    fn test_explicit_route_name_takes_template_spelling() {
        let template = parse_template("/users/{userId}/posts/{slug}").unwrap();
        let mut params = [
            param(
                "id",
                TypeRef::named("u64"),
                BindingSource::ExplicitRoute {
                    name: "userid".into(),
                },
            ),
            param(
                "ghost",
                TypeRef::named("u64"),
                BindingSource::ExplicitRoute { name: "nope".into() },
            ),
            param("slug", TypeRef::named("String"), BindingSource::ImplicitRoute),
        ];
        canonicalize_route_names(&template, &mut params);

        assert_eq!(
            params[0].source,
            BindingSource::ExplicitRoute {
                name: "userId".into()
            }
        );
        assert_eq!(params[1].source, BindingSource::ExplicitRoute { name: "nope".into() });
        assert_eq!(params[2].source, BindingSource::ImplicitRoute);
    }

    #[test]
    fn test_unknown_and_double_binding() {
        let params = [
            param("id", TypeRef::named("i32"), BindingSource::ImplicitRoute),
            param(
                "other",
                TypeRef::named("i32"),
                BindingSource::ExplicitRoute { name: "id".into() },
            ),
            param(
                "ghost",
                TypeRef::named("i32"),
                BindingSource::ExplicitRoute { name: "nope".into() },
            ),
        ];
        assert_eq!(
            ids(&validate("/{id}", &params)),
            vec![
                DiagnosticId::UnknownRouteParameter,
                DiagnosticId::RouteParameterBoundTwice
            ]
        );
    }

    #[test]
    fn test_constraint_mismatch_is_warning() {
        let params = [param("id", TypeRef::named("bool"), BindingSource::ImplicitRoute)];
        let diagnostics = validate("/{id:int}", &params);
        assert_eq!(ids(&diagnostics), vec![DiagnosticId::RouteConstraintMismatch]);
        assert!(!diagnostics[0].is_error());
    }

    #[test]
    fn test_nullable_route_parameter() {
        let optional = TypeRef::generic("Option", vec![TypeRef::named("i32")]);
        let params = [param("id", optional.clone(), BindingSource::ImplicitRoute)];
        assert_eq!(
            ids(&validate("/{id}", &params)),
            vec![DiagnosticId::NullableRouteParameter]
        );
        assert!(validate("/{id?}", &[param("id", optional, BindingSource::ImplicitRoute)]).is_empty());
    }

    #[test]
    fn test_group_member_display_name() {
        let mut member = param("id", TypeRef::named("bool"), BindingSource::ImplicitRoute);
        member.group_path.push(GroupFrame {
            binding: "keys".into(),
            type_name: "Keys".into(),
        });
        let diagnostics = validate("/{id:int}", &[member]);
        assert!(diagnostics[0].message.contains("`keys.id`"));
    }

    #[test]
    fn test_constraint_table() {
        assert_eq!(constraint_accepts("int", &TypeRef::named("u64")), Some(true));
        assert_eq!(constraint_accepts("long", &TypeRef::named("f64")), Some(false));
        assert_eq!(constraint_accepts("decimal", &TypeRef::named("Decimal")), Some(true));
        assert_eq!(constraint_accepts("guid", &TypeRef::named("uuid::Uuid")), Some(true));
        assert_eq!(
            constraint_accepts("datetime", &TypeRef::generic("DateTime", vec![TypeRef::named("Utc")])),
            Some(true)
        );
        assert_eq!(constraint_accepts("u8", &TypeRef::named("u16")), Some(false));
        assert_eq!(constraint_accepts("min(1)", &TypeRef::named("u16")), None);
        assert_eq!(constraint_accepts("int", &TypeRef::named("String")), Some(true));
        assert_eq!(
            constraint_accepts("int", &TypeRef::generic("Option", vec![TypeRef::named("i32")])),
            Some(true)
        );
    }
}

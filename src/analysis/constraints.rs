//! Checks across the parameters of one endpoint.

use super::special_types::{is_query_bindable, special_kind};
use crate::core::{BindingSource, ParameterDescriptor, SpecialKind};
use crate::diagnostics::{Diagnostic, DiagnosticId};

const BODYLESS_VERBS: [&str; 2] = ["GET", "HEAD"];

/// Request body consumers. At most one family may appear per endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum BodyFamily {
    Body,
    Form,
    Stream,
}

impl BodyFamily {
    fn of(source: &BindingSource) -> Option<Self> {
        match source {
            BindingSource::ExplicitBody => Some(Self::Body),
            BindingSource::ExplicitForm { .. }
            | BindingSource::SpecialType(SpecialKind::FormFile | SpecialKind::FormFileCollection) => {
                Some(Self::Form)
            }
            BindingSource::SpecialType(SpecialKind::RawStream) => Some(Self::Stream),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Body => "#[body]",
            Self::Form => "form data",
            Self::Stream => "the raw body stream",
        }
    }
}

/// Body exclusivity and form shape rules over a flattened parameter list.
pub fn check_parameter_set(parameters: &[ParameterDescriptor], verb: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut first_family: Option<(BodyFamily, &ParameterDescriptor)> = None;
    let mut body_seen: Option<&ParameterDescriptor> = None;
    let mut stream_seen: Option<&ParameterDescriptor> = None;
    let mut complex_form_seen: Option<&ParameterDescriptor> = None;
    let mut family_conflict_reported = false;

    for parameter in parameters {
        let Some(family) = BodyFamily::of(&parameter.source) else {
            continue;
        };

        match family {
            BodyFamily::Body => {
                if let Some(first) = body_seen {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticId::MultipleBodyParameters,
                        format!(
                            "`{}` and `{}` are both #[body]; an endpoint reads at most one body",
                            first.name, parameter.name
                        ),
                        parameter.location.clone(),
                    ));
                }
                body_seen.get_or_insert(parameter);
            }
            BodyFamily::Stream => {
                if let Some(first) = stream_seen {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticId::ConflictingBodySources,
                        format!(
                            "`{}` and `{}` both consume the raw body stream",
                            first.name, parameter.name
                        ),
                        parameter.location.clone(),
                    ));
                }
                stream_seen.get_or_insert(parameter);
            }
            BodyFamily::Form => {
                if is_complex_form(parameter) {
                    if let Some(first) = complex_form_seen {
                        diagnostics.push(Diagnostic::new(
                            DiagnosticId::MultipleComplexFormParameters,
                            format!(
                                "`{}` and `{}` are both bound from the whole form; only one structured form parameter is allowed",
                                first.name, parameter.name
                            ),
                            parameter.location.clone(),
                        ));
                    }
                    complex_form_seen.get_or_insert(parameter);
                }
            }
        }

        match first_family {
            None => first_family = Some((family, parameter)),
            Some((first, holder)) if first != family && !family_conflict_reported => {
                family_conflict_reported = true;
                diagnostics.push(Diagnostic::new(
                    DiagnosticId::ConflictingBodySources,
                    format!(
                        "`{}` reads {} but `{}` already reads {}; an endpoint consumes the request body once",
                        parameter.name,
                        family.label(),
                        holder.name,
                        first.label()
                    ),
                    parameter.location.clone(),
                ));
            }
            Some(_) => {}
        }
    }

    if let Some((_, holder)) = first_family {
        if BODYLESS_VERBS.contains(&verb) {
            diagnostics.push(Diagnostic::new(
                DiagnosticId::BodyOnBodylessMethod,
                format!("`{}` reads the request body of a {verb} request", holder.name),
                holder.location.clone(),
            ));
        }
    }

    diagnostics
}

fn is_complex_form(parameter: &ParameterDescriptor) -> bool {
    matches!(parameter.source, BindingSource::ExplicitForm { .. })
        && special_kind(&parameter.ty).is_none()
        && !is_query_bindable(&parameter.ty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Location, TypeRef};

    fn param(name: &str, ty: &str, source: BindingSource) -> ParameterDescriptor {
        ParameterDescriptor {
            name: name.into(),
            ty: TypeRef::named(ty),
            attribute: None,
            source,
            group_path: Vec::new(),
            location: Location::default(),
        }
    }

    fn form(name: &str, ty: &str) -> ParameterDescriptor {
        param(name, ty, BindingSource::ExplicitForm { name: name.into() })
    }

    fn ids(parameters: &[ParameterDescriptor], verb: &str) -> Vec<DiagnosticId> {
        check_parameter_set(parameters, verb).iter().map(|d| d.id).collect()
    }

    #[test]
    fn test_single_body_is_fine() {
        let params = [
            param("id", "i32", BindingSource::ImplicitRoute),
            param("body", "NewUser", BindingSource::ExplicitBody),
        ];
        assert!(ids(&params, "POST").is_empty());
    }

    #[test]
    fn test_multiple_bodies() {
        let params = [
            param("a", "A", BindingSource::ExplicitBody),
            param("b", "B", BindingSource::ExplicitBody),
        ];
        assert_eq!(ids(&params, "POST"), vec![DiagnosticId::MultipleBodyParameters]);
    }

    #[test]
    fn test_body_and_form_conflict() {
        let params = [
            param("a", "A", BindingSource::ExplicitBody),
            param("file", "FormFile", BindingSource::SpecialType(SpecialKind::FormFile)),
        ];
        assert_eq!(ids(&params, "POST"), vec![DiagnosticId::ConflictingBodySources]);
    }

    #[test]
    fn test_form_primitives_and_files_mix() {
        let params = [
            form("title", "String"),
            form("count", "u32"),
            param("file", "FormFile", BindingSource::SpecialType(SpecialKind::FormFile)),
            form("meta", "Meta"),
        ];
        assert!(ids(&params, "POST").is_empty());
    }

    #[test]
    fn test_multiple_complex_forms() {
        let params = [form("a", "Meta"), form("b", "Other")];
        assert_eq!(
            ids(&params, "POST"),
            vec![DiagnosticId::MultipleComplexFormParameters]
        );
    }

    #[test]
    fn test_two_streams_conflict() {
        let stream = BindingSource::SpecialType(SpecialKind::RawStream);
        let params = [
            param("a", "BodyStream", stream.clone()),
            param("b", "BodyStream", stream),
        ];
        assert_eq!(ids(&params, "PUT"), vec![DiagnosticId::ConflictingBodySources]);
    }

    #[test]
    fn test_body_on_get_warns() {
        let params = [param("a", "A", BindingSource::ExplicitBody)];
        let diagnostics = check_parameter_set(&params, "GET");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].id, DiagnosticId::BodyOnBodylessMethod);
        assert!(!diagnostics[0].is_error());
    }
}

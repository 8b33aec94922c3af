//! Routing marker arguments.

use crate::extraction::{AttrValue, AttributeDecl};

/// Verb shorthands; `route` takes the verb as `method = "..."`.
pub const VERB_MARKERS: [&str; 7] = ["get", "post", "put", "delete", "patch", "head", "options"];

pub const ROUTE_MARKER: &str = "route";

const DEFAULT_STATUS: u16 = 200;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutingMarker {
    /// Upper-cased HTTP verb.
    pub verb: String,
    pub template: String,
    pub status: u16,
    pub name: Option<String>,
    pub summary: Option<String>,
}

impl RoutingMarker {
    /// Read a marker attribute. The error is a human-readable reason.
    pub fn parse(attr: &AttributeDecl) -> Result<Self, String> {
        let marker = attr.name();
        if let Some(raw) = &attr.malformed {
            return Err(format!("cannot read arguments of #[{marker}]: `{raw}`"));
        }

        let is_route = marker == ROUTE_MARKER;
        if !is_route && !VERB_MARKERS.contains(&marker) {
            return Err(format!("`{marker}` is not a routing marker"));
        }

        let mut positional = attr.positional();
        let template = match positional.next() {
            Some(AttrValue::Str(template)) => template.clone(),
            Some(_) => return Err(format!("#[{marker}] template must be a string literal")),
            None => return Err(format!("#[{marker}] is missing its route template")),
        };
        if positional.next().is_some() {
            return Err(format!("#[{marker}] takes a single positional argument"));
        }

        let mut verb = (!is_route).then(|| marker.to_ascii_uppercase());
        let mut status = DEFAULT_STATUS;
        let mut name = None;
        let mut summary = None;

        for arg in attr.args.iter().filter(|arg| arg.key.is_some()) {
            let key = arg.key.as_deref().unwrap_or_default();
            match (key, &arg.value) {
                ("status", AttrValue::Int(code)) if (100..=599).contains(code) => {
                    status = *code as u16;
                }
                ("status", other) => {
                    return Err(format!("invalid status {}", describe_value(other)));
                }
                ("name", AttrValue::Str(value)) if !value.trim().is_empty() => {
                    name = Some(value.clone());
                }
                ("summary", AttrValue::Str(value)) => summary = Some(value.clone()),
                ("method", AttrValue::Str(value)) if is_route => {
                    verb = Some(parse_method(value)?);
                }
                ("name" | "summary" | "method", other) => {
                    return Err(format!("invalid value {} for `{key}`", describe_value(other)));
                }
                _ => return Err(format!("unknown argument `{key}` on #[{marker}]")),
            }
        }

        let verb = verb.ok_or_else(|| "#[route] requires `method = \"VERB\"`".to_string())?;
        Ok(Self {
            verb,
            template,
            status,
            name,
            summary,
        })
    }
}

fn parse_method(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(format!("invalid HTTP method \"{value}\""));
    }
    Ok(trimmed.to_ascii_uppercase())
}

fn describe_value(value: &AttrValue) -> String {
    match value {
        AttrValue::Str(s) => format!("\"{s}\""),
        AttrValue::Int(i) => i.to_string(),
        AttrValue::Bool(b) => b.to_string(),
        AttrValue::Ident(ident) | AttrValue::Other(ident) => format!("`{ident}`"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::AttrArg;

    fn attr(name: &str, args: Vec<AttrArg>) -> AttributeDecl {
        AttributeDecl::new(name, args)
    }

    fn template(value: &str) -> AttrArg {
        AttrArg::positional(AttrValue::Str(value.into()))
    }

    #[test]
    fn test_verb_marker_defaults() {
        let marker = RoutingMarker::parse(&attr("get", vec![template("/a")])).unwrap();
        assert_eq!(marker.verb, "GET");
        assert_eq!(marker.template, "/a");
        assert_eq!(marker.status, 200);
        assert_eq!(marker.name, None);
    }

    #[test]
    fn test_named_arguments() {
        let marker = RoutingMarker::parse(&attr(
            "post",
            vec![
                template("/w"),
                AttrArg::named("status", AttrValue::Int(201)),
                AttrArg::named("name", AttrValue::Str("CreateWidget".into())),
                AttrArg::named("summary", AttrValue::Str("Creates".into())),
            ],
        ))
        .unwrap();
        assert_eq!(marker.status, 201);
        assert_eq!(marker.name.as_deref(), Some("CreateWidget"));
        assert_eq!(marker.summary.as_deref(), Some("Creates"));
    }

    #[test]
    fn test_route_marker_needs_method() {
        let missing = RoutingMarker::parse(&attr("route", vec![template("/a")]));
        assert!(missing.is_err());

        let marker = RoutingMarker::parse(&attr(
            "route",
            vec![template("/a"), AttrArg::named("method", AttrValue::Str("purge".into()))],
        ))
        .unwrap();
        assert_eq!(marker.verb, "PURGE");
    }

    #[test]
    fn test_rejections() {
        assert!(RoutingMarker::parse(&attr("get", vec![])).is_err());
        assert!(RoutingMarker::parse(&attr(
            "get",
            vec![AttrArg::positional(AttrValue::Ident("PATH".into()))]
        ))
        .is_err());
        assert!(RoutingMarker::parse(&attr(
            "get",
            vec![template("/a"), AttrArg::named("status", AttrValue::Int(42))]
        ))
        .is_err());
        assert!(RoutingMarker::parse(&attr(
            "get",
            vec![template("/a"), AttrArg::named("colour", AttrValue::Str("red".into()))]
        ))
        .is_err());
        assert!(RoutingMarker::parse(&attr(
            "get",
            vec![template("/a"), AttrArg::named("method", AttrValue::Str("PUT".into()))]
        ))
        .is_err());

        let mut malformed = attr("get", vec![]);
        malformed.malformed = Some("/a\" status".into());
        assert!(RoutingMarker::parse(&malformed).is_err());
    }
}

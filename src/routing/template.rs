//! Route template parsing.
//!
//! Grammar, one segment per `/`:
//!
//! ```text
//! literal        users
//! placeholder    {id}  {id:int}  {id:int:min(1)}  {id?}  {id:int?}
//! catch-all      {*rest}          last segment only
//! ```
//!
//! A placeholder must occupy its whole segment. Names are unique within a
//! template, compared case-insensitively.

use crate::core::{RouteSegment, RouteTemplate};
use crate::diagnostics::DiagnosticId;
use std::collections::HashSet;

/// Why a template was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateError {
    pub id: DiagnosticId,
    pub message: String,
}

impl TemplateError {
    fn malformed(template: &str, reason: impl std::fmt::Display) -> Self {
        Self {
            id: DiagnosticId::MalformedRouteTemplate,
            message: format!("route template \"{template}\" is malformed: {reason}"),
        }
    }
}

pub fn parse_template(raw: &str) -> Result<RouteTemplate, TemplateError> {
    if raw.is_empty() {
        return Ok(RouteTemplate {
            raw: String::new(),
            segments: Vec::new(),
        });
    }
    let Some(body) = raw.strip_prefix('/') else {
        return Err(TemplateError::malformed(raw, "must start with '/'"));
    };

    let parts = split_segments(raw, body)?;
    let last_index = parts.len().saturating_sub(1);
    let mut segments = Vec::with_capacity(parts.len());
    let mut seen = HashSet::new();

    for (index, part) in parts.iter().enumerate() {
        if part.is_empty() {
            // Only a trailing slash may leave an empty segment.
            if index == last_index {
                continue;
            }
            return Err(TemplateError::malformed(raw, "empty path segment"));
        }

        let segment = parse_segment(raw, part)?;
        if let RouteSegment::Placeholder {
            name, catch_all, ..
        } = &segment
        {
            if *catch_all && index != last_index {
                return Err(TemplateError::malformed(
                    raw,
                    format!("catch-all '{{*{name}}}' must be the last segment"),
                ));
            }
            if !seen.insert(name.to_lowercase()) {
                return Err(TemplateError {
                    id: DiagnosticId::DuplicatePlaceholder,
                    message: format!("route template \"{raw}\" declares '{{{name}}}' more than once"),
                });
            }
        }
        segments.push(segment);
    }

    Ok(RouteTemplate {
        raw: raw.to_string(),
        segments,
    })
}

/// Split on `/` outside braces so constraints like `regex(a/b)` stay whole.
fn split_segments<'a>(raw: &str, body: &'a str) -> Result<Vec<&'a str>, TemplateError> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, ch) in body.char_indices() {
        match ch {
            '{' => {
                depth += 1;
                if depth > 1 {
                    return Err(TemplateError::malformed(raw, "nested '{'"));
                }
            }
            '}' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| TemplateError::malformed(raw, "unmatched '}'"))?;
            }
            '/' if depth == 0 => {
                parts.push(&body[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(TemplateError::malformed(raw, "unclosed '{'"));
    }
    parts.push(&body[start..]);
    Ok(parts)
}

fn parse_segment(raw: &str, part: &str) -> Result<RouteSegment, TemplateError> {
    if !part.contains(['{', '}']) {
        return Ok(RouteSegment::Literal(part.to_string()));
    }
    let inner = match part.strip_prefix('{').and_then(|rest| rest.strip_suffix('}')) {
        Some(inner) if !inner.contains(['{', '}']) => inner,
        _ => {
            return Err(TemplateError::malformed(
                raw,
                format!("segment '{part}' mixes a placeholder with literal text"),
            ))
        }
    };

    let (catch_all, inner) = match inner.strip_prefix('*') {
        Some(rest) => (true, rest.strip_prefix('*').unwrap_or(rest)),
        None => (false, inner),
    };
    let (optional, inner) = match inner.strip_suffix('?') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };
    if catch_all && optional {
        return Err(TemplateError::malformed(raw, "a catch-all cannot be optional"));
    }

    let mut pieces = inner.split(':');
    let name = pieces.next().unwrap_or_default().trim();
    if name.is_empty() {
        return Err(TemplateError {
            id: DiagnosticId::EmptyPlaceholderName,
            message: format!("route template \"{raw}\" has a placeholder without a name"),
        });
    }
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(TemplateError::malformed(
            raw,
            format!("invalid placeholder name '{name}'"),
        ));
    }

    let constraints: Vec<String> = pieces.map(|c| c.trim().to_string()).collect();
    if constraints.iter().any(String::is_empty) {
        return Err(TemplateError::malformed(
            raw,
            format!("empty constraint on '{{{name}}}'"),
        ));
    }

    Ok(RouteSegment::Placeholder {
        name: name.to_string(),
        constraints,
        optional,
        catch_all,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholder(name: &str, constraints: &[&str], optional: bool, catch_all: bool) -> RouteSegment {
        RouteSegment::Placeholder {
            name: name.into(),
            constraints: constraints.iter().map(|c| c.to_string()).collect(),
            optional,
            catch_all,
        }
    }

    fn error_id(raw: &str) -> DiagnosticId {
        parse_template(raw).expect_err(raw).id
    }

    #[test]
    fn test_literals_and_placeholders() {
        let template = parse_template("/users/{id:int}/posts/{slug}").unwrap();
        assert_eq!(
            template.segments,
            vec![
                RouteSegment::Literal("users".into()),
                placeholder("id", &["int"], false, false),
                RouteSegment::Literal("posts".into()),
                placeholder("slug", &[], false, false),
            ]
        );
        assert_eq!(template.placeholder_names(), vec!["id", "slug"]);
    }

    #[test]
    fn test_optional_and_catch_all() {
        let template = parse_template("/files/{version:int?}/{*path}").unwrap();
        assert_eq!(template.segments[1], placeholder("version", &["int"], true, false));
        assert_eq!(template.segments[2], placeholder("path", &[], false, true));
    }

    #[test]
    fn test_constraint_with_slash_and_args() {
        let template = parse_template("/a/{id:regex(x/y):min(1)}").unwrap();
        assert_eq!(template.segments[1], placeholder("id", &["regex(x/y)", "min(1)"], false, false));
    }

    #[test]
    fn test_root_and_empty() {
        assert!(parse_template("").unwrap().segments.is_empty());
        assert!(parse_template("/").unwrap().segments.is_empty());
        assert_eq!(parse_template("/users/").unwrap().segments.len(), 1);
    }

    #[test]
    fn test_malformed() {
        for raw in [
            "users",
            "/users/{id",
            "/users/id}",
            "/users/{{id}}",
            "/users/x{id}",
            "/{*rest}/tail",
            "/a//b",
            "/{id:}",
            "/{*rest?}",
            "/{a b}",
        ] {
            assert_eq!(error_id(raw), DiagnosticId::MalformedRouteTemplate, "{raw}");
        }
    }

    #[test]
    fn test_empty_name() {
        assert_eq!(error_id("/users/{}"), DiagnosticId::EmptyPlaceholderName);
        assert_eq!(error_id("/users/{:int}"), DiagnosticId::EmptyPlaceholderName);
    }

    #[test]
    fn test_duplicate_names_case_insensitive() {
        assert_eq!(error_id("/{id}/{ID}"), DiagnosticId::DuplicatePlaceholder);
    }
}

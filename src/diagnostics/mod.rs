//! Diagnostic taxonomy.
//!
//! Every validation outcome maps to a `DiagnosticId` with a stable code, a
//! category and a default severity. Any `Error` attached to an entity removes
//! it from emission; everything else is advisory.
//!
//! # Codes
//!
//! - RG1xxx: structural (malformed routes, markers, handler shape)
//! - RG2xxx: binding (parameter sources and route agreement)
//! - RG3xxx: cross-entity
//! - RG4xxx: advisory
//! - RG9xxx: front-end

pub mod policy;
pub mod reporting;

use crate::core::Location;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use policy::DiagnosticPolicy;
pub use reporting::{render_json, render_summary, render_terminal, DiagnosticSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Hidden,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "hidden" => Some(Self::Hidden),
            "info" => Some(Self::Info),
            "warning" | "warn" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Hidden => "hidden",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Structural,
    Binding,
    CrossEntity,
    Advisory,
    FrontEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiagnosticId {
    MalformedRouteTemplate,
    EmptyPlaceholderName,
    DuplicatePlaceholder,
    ConflictingBindingAttributes,
    NonStaticHandler,
    InvalidReturnType,
    InvalidRoutingMarker,
    GenericHandler,
    InvalidBindingAttribute,

    AmbiguousParameter,
    MultipleBodyParameters,
    ConflictingBodySources,
    MultipleComplexFormParameters,
    UnknownParameterGroupType,
    ParameterGroupCycle,
    ParameterGroupTooDeep,
    RouteParameterNotBound,
    UnknownRouteParameter,
    RouteParameterBoundTwice,

    DuplicateRoute,

    RouteConstraintMismatch,
    NullableRouteParameter,
    DuplicateEndpointName,
    MissingSummary,
    BodyOnBodylessMethod,

    SourceParseFailure,
}

/// Static facts about one identifier.
struct Descriptor {
    code: &'static str,
    name: &'static str,
    category: Category,
    severity: Severity,
}

const fn describe(id: DiagnosticId) -> Descriptor {
    use Category::*;
    use DiagnosticId as D;
    use Severity::*;

    let (code, name, category, severity) = match id {
        D::MalformedRouteTemplate => ("RG1001", "MalformedRouteTemplate", Structural, Error),
        D::EmptyPlaceholderName => ("RG1002", "EmptyPlaceholderName", Structural, Error),
        D::DuplicatePlaceholder => ("RG1003", "DuplicatePlaceholder", Structural, Error),
        D::ConflictingBindingAttributes => {
            ("RG1004", "ConflictingBindingAttributes", Structural, Error)
        }
        D::NonStaticHandler => ("RG1005", "NonStaticHandler", Structural, Error),
        D::InvalidReturnType => ("RG1006", "InvalidReturnType", Structural, Error),
        D::InvalidRoutingMarker => ("RG1007", "InvalidRoutingMarker", Structural, Error),
        D::GenericHandler => ("RG1008", "GenericHandler", Structural, Error),
        D::InvalidBindingAttribute => ("RG1009", "InvalidBindingAttribute", Structural, Error),

        D::AmbiguousParameter => ("RG2001", "AmbiguousParameter", Binding, Error),
        D::MultipleBodyParameters => ("RG2002", "MultipleBodyParameters", Binding, Error),
        D::ConflictingBodySources => ("RG2003", "ConflictingBodySources", Binding, Error),
        D::MultipleComplexFormParameters => {
            ("RG2004", "MultipleComplexFormParameters", Binding, Error)
        }
        D::UnknownParameterGroupType => ("RG2005", "UnknownParameterGroupType", Binding, Error),
        D::ParameterGroupCycle => ("RG2006", "ParameterGroupCycle", Binding, Error),
        D::ParameterGroupTooDeep => ("RG2007", "ParameterGroupTooDeep", Binding, Error),
        D::RouteParameterNotBound => ("RG2008", "RouteParameterNotBound", Binding, Error),
        D::UnknownRouteParameter => ("RG2009", "UnknownRouteParameter", Binding, Error),
        D::RouteParameterBoundTwice => ("RG2010", "RouteParameterBoundTwice", Binding, Error),

        D::DuplicateRoute => ("RG3001", "DuplicateRoute", CrossEntity, Error),

        D::RouteConstraintMismatch => ("RG4001", "RouteConstraintMismatch", Advisory, Warning),
        D::NullableRouteParameter => ("RG4002", "NullableRouteParameter", Advisory, Info),
        D::DuplicateEndpointName => ("RG4003", "DuplicateEndpointName", Advisory, Warning),
        D::MissingSummary => ("RG4004", "MissingSummary", Advisory, Hidden),
        D::BodyOnBodylessMethod => ("RG4005", "BodyOnBodylessMethod", Advisory, Warning),

        D::SourceParseFailure => ("RG9001", "SourceParseFailure", FrontEnd, Error),
    };
    Descriptor {
        code,
        name,
        category,
        severity,
    }
}

impl DiagnosticId {
    pub const ALL: [DiagnosticId; 26] = [
        Self::MalformedRouteTemplate,
        Self::EmptyPlaceholderName,
        Self::DuplicatePlaceholder,
        Self::ConflictingBindingAttributes,
        Self::NonStaticHandler,
        Self::InvalidReturnType,
        Self::InvalidRoutingMarker,
        Self::GenericHandler,
        Self::InvalidBindingAttribute,
        Self::AmbiguousParameter,
        Self::MultipleBodyParameters,
        Self::ConflictingBodySources,
        Self::MultipleComplexFormParameters,
        Self::UnknownParameterGroupType,
        Self::ParameterGroupCycle,
        Self::ParameterGroupTooDeep,
        Self::RouteParameterNotBound,
        Self::UnknownRouteParameter,
        Self::RouteParameterBoundTwice,
        Self::DuplicateRoute,
        Self::RouteConstraintMismatch,
        Self::NullableRouteParameter,
        Self::DuplicateEndpointName,
        Self::MissingSummary,
        Self::BodyOnBodylessMethod,
        Self::SourceParseFailure,
    ];

    /// Stable code, e.g. `RG2008`.
    pub const fn code(self) -> &'static str {
        describe(self).code
    }

    pub const fn name(self) -> &'static str {
        describe(self).name
    }

    pub const fn category(self) -> Category {
        describe(self).category
    }

    pub const fn default_severity(self) -> Severity {
        describe(self).severity
    }

    /// Look up an identifier by code or by name.
    pub fn from_code(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.code().eq_ignore_ascii_case(value) || id.name() == value)
    }
}

impl fmt::Display for DiagnosticId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.code(), self.name())
    }
}

/// A structured validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    pub id: DiagnosticId,
    pub severity: Severity,
    pub message: String,
    pub location: Location,
    /// Secondary location, e.g. the first registrant of a duplicate route.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<Location>,
}

impl Diagnostic {
    /// Build a diagnostic at its identifier's default severity.
    pub fn new(id: DiagnosticId, message: impl Into<String>, location: Location) -> Self {
        Self {
            id,
            severity: id.default_severity(),
            message: message.into(),
            location,
            related: None,
        }
    }

    pub fn with_related(mut self, related: Location) -> Self {
        self.related = Some(related);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Presentation order: location, then code, then message.
    pub fn sort_key(&self) -> (&Location, &'static str, &str) {
        (&self.location, self.id.code(), &self.message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{}] {}",
            self.location,
            self.severity,
            self.id.code(),
            self.message
        )
    }
}

pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

/// Sort into presentation order and drop exact repeats.
pub fn normalize(mut diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    diagnostics.dedup();
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_codes_are_unique() {
        let codes: HashSet<_> = DiagnosticId::ALL.iter().map(|id| id.code()).collect();
        assert_eq!(codes.len(), DiagnosticId::ALL.len());
    }

    #[test]
    fn test_lookup_by_code_and_name() {
        assert_eq!(
            DiagnosticId::from_code("RG2008"),
            Some(DiagnosticId::RouteParameterNotBound)
        );
        assert_eq!(
            DiagnosticId::from_code("DuplicateRoute"),
            Some(DiagnosticId::DuplicateRoute)
        );
        assert_eq!(DiagnosticId::from_code("RG0000"), None);
    }

    #[test]
    fn test_code_ranges_match_categories() {
        for id in DiagnosticId::ALL {
            let expected = match id.category() {
                Category::Structural => "RG1",
                Category::Binding => "RG2",
                Category::CrossEntity => "RG3",
                Category::Advisory => "RG4",
                Category::FrontEnd => "RG9",
            };
            assert!(id.code().starts_with(expected), "{id}");
        }
    }

    #[test]
    fn test_only_advisory_ids_are_non_errors() {
        for id in DiagnosticId::ALL {
            let advisory = id.category() == Category::Advisory;
            assert_eq!(id.default_severity() != Severity::Error, advisory, "{id}");
        }
    }

    #[test]
    fn test_normalize_orders_and_dedups() {
        let late = Diagnostic::new(
            DiagnosticId::DuplicateRoute,
            "dup",
            Location::new("b.rs", 1, 1),
        );
        let early = Diagnostic::new(
            DiagnosticId::AmbiguousParameter,
            "amb",
            Location::new("a.rs", 9, 1),
        );
        let result = normalize(vec![late.clone(), early.clone(), late.clone()]);
        assert_eq!(result, vec![early, late]);
    }
}

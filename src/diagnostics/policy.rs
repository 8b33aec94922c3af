//! Severity overrides and suppression for advisory diagnostics.
//!
//! Error-severity diagnostics are outside the policy's reach: they can be
//! neither suppressed nor re-leveled, and nothing can be raised to Error.
//! Emission decisions are taken before the policy runs, so the policy only
//! changes what is reported.

use super::{Diagnostic, DiagnosticId, Severity};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DiagnosticPolicy {
    suppressed: BTreeSet<DiagnosticId>,
    overrides: BTreeMap<DiagnosticId, Severity>,
}

impl DiagnosticPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configuration strings, rejecting unknown codes and any
    /// attempt to touch Error-level identifiers.
    pub fn from_config(
        suppress: &[String],
        overrides: &BTreeMap<String, String>,
    ) -> Result<Self, String> {
        let mut policy = Self::new();
        for code in suppress {
            let id = lookup_advisory(code)?;
            policy.suppressed.insert(id);
        }
        for (code, level) in overrides {
            let id = lookup_advisory(code)?;
            let severity = Severity::parse(level)
                .ok_or_else(|| format!("unknown severity '{level}' for {code}"))?;
            if severity == Severity::Error {
                return Err(format!("{code} cannot be raised to error"));
            }
            policy.overrides.insert(id, severity);
        }
        Ok(policy)
    }

    pub fn suppress(mut self, id: DiagnosticId) -> Self {
        if id.default_severity() != Severity::Error {
            self.suppressed.insert(id);
        }
        self
    }

    pub fn is_suppressed(&self, diagnostic: &Diagnostic) -> bool {
        !diagnostic.is_error() && self.suppressed.contains(&diagnostic.id)
    }

    pub fn apply(&self, diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
        diagnostics
            .into_iter()
            .filter(|diagnostic| !self.is_suppressed(diagnostic))
            .map(|mut diagnostic| {
                if !diagnostic.is_error() {
                    if let Some(severity) = self.overrides.get(&diagnostic.id) {
                        diagnostic.severity = *severity;
                    }
                }
                diagnostic
            })
            .collect()
    }
}

fn lookup_advisory(code: &str) -> Result<DiagnosticId, String> {
    let id = DiagnosticId::from_code(code).ok_or_else(|| format!("unknown diagnostic '{code}'"))?;
    if id.default_severity() == Severity::Error {
        return Err(format!("{} is an error and cannot be configured", id.code()));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Location;

    fn diag(id: DiagnosticId) -> Diagnostic {
        Diagnostic::new(id, "m", Location::new("a.rs", 1, 1))
    }

    #[test]
    fn test_suppresses_advisory() {
        let policy = DiagnosticPolicy::new().suppress(DiagnosticId::NullableRouteParameter);
        let out = policy.apply(vec![
            diag(DiagnosticId::NullableRouteParameter),
            diag(DiagnosticId::RouteConstraintMismatch),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, DiagnosticId::RouteConstraintMismatch);
    }

    #[test]
    fn test_errors_cannot_be_suppressed() {
        let policy = DiagnosticPolicy::new().suppress(DiagnosticId::DuplicateRoute);
        let out = policy.apply(vec![diag(DiagnosticId::DuplicateRoute)]);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_config_rejects_error_codes() {
        let err = DiagnosticPolicy::from_config(&["RG2008".to_string()], &BTreeMap::new());
        assert!(err.is_err());

        let mut overrides = BTreeMap::new();
        overrides.insert("RG4001".to_string(), "error".to_string());
        assert!(DiagnosticPolicy::from_config(&[], &overrides).is_err());
    }

    #[test]
    fn test_override_relevels() {
        let mut overrides = BTreeMap::new();
        overrides.insert("MissingSummary".to_string(), "warning".to_string());
        let policy = DiagnosticPolicy::from_config(&[], &overrides).unwrap();
        let out = policy.apply(vec![diag(DiagnosticId::MissingSummary)]);
        assert_eq!(out[0].severity, Severity::Warning);
    }
}

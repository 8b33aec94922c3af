use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analysis::{AnalysisSettings, DEFAULT_MAX_GROUP_DEPTH, DEFAULT_RESULT_WRAPPER};
use crate::diagnostics::DiagnosticPolicy;
use crate::emit::{EmitOptions, DEFAULT_RUNTIME_CRATE};
use crate::pipeline::PipelineSettings;

pub const MAX_GROUP_DEPTH_LIMIT: usize = 32;

/// Root configuration structure for routegen (`routegen.toml`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteGenConfig {
    /// Master switch. When false nothing is analysed or emitted.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,

    #[serde(default)]
    pub ignore: IgnoreConfig,
}

impl Default for RouteGenConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            routing: RoutingConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
            ignore: IgnoreConfig::default(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Wrapper type names accepted as `W<T>` around a handler's payload.
    #[serde(default = "default_result_wrappers")]
    pub result_wrappers: Vec<String>,

    /// Maximum `#[group]` nesting.
    #[serde(default = "default_max_group_depth")]
    pub max_group_depth: usize,

    /// Crate path used by emitted code.
    #[serde(default = "default_runtime_crate")]
    pub runtime_crate: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            result_wrappers: default_result_wrappers(),
            max_group_depth: default_max_group_depth(),
            runtime_crate: default_runtime_crate(),
        }
    }
}

fn default_result_wrappers() -> Vec<String> {
    vec![DEFAULT_RESULT_WRAPPER.to_string()]
}

fn default_max_group_depth() -> usize {
    DEFAULT_MAX_GROUP_DEPTH
}

fn default_runtime_crate() -> String {
    DEFAULT_RUNTIME_CRATE.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiagnosticsConfig {
    /// Advisory codes (`RG4001`) or names to drop from the report.
    #[serde(default)]
    pub suppress: Vec<String>,

    /// Advisory code to severity (`info` or `warning`).
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,

    /// Report handlers with no summary.
    #[serde(default)]
    pub documentation_hints: bool,
}

/// Ignore patterns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IgnoreConfig {
    /// Glob patterns for files to skip, relative to the scanned root.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl RouteGenConfig {
    /// Check ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        let depth = self.routing.max_group_depth;
        if depth == 0 || depth > MAX_GROUP_DEPTH_LIMIT {
            return Err(format!(
                "routing.max_group_depth must be between 1 and {MAX_GROUP_DEPTH_LIMIT}, got {depth}"
            ));
        }
        if self.routing.result_wrappers.is_empty() {
            return Err("routing.result_wrappers must name at least one wrapper".to_string());
        }
        if let Some(bad) = self
            .routing
            .result_wrappers
            .iter()
            .find(|w| !is_identifier(w))
        {
            return Err(format!("routing.result_wrappers: '{bad}' is not a type name"));
        }
        if self.routing.runtime_crate.trim().is_empty() {
            return Err("routing.runtime_crate must not be empty".to_string());
        }
        for pattern in &self.ignore.patterns {
            glob::Pattern::new(pattern)
                .map_err(|e| format!("ignore.patterns: invalid glob '{pattern}': {e}"))?;
        }
        self.policy().map(|_| ())
    }

    pub fn policy(&self) -> Result<DiagnosticPolicy, String> {
        DiagnosticPolicy::from_config(&self.diagnostics.suppress, &self.diagnostics.overrides)
    }

    /// Everything the pipeline needs from this configuration.
    pub fn to_settings(&self) -> Result<PipelineSettings, String> {
        self.validate()?;
        Ok(PipelineSettings {
            enabled: self.enabled,
            analysis: AnalysisSettings {
                result_wrappers: self.routing.result_wrappers.clone(),
                max_group_depth: self.routing.max_group_depth,
                documentation_hints: self.diagnostics.documentation_hints,
            },
            emit: EmitOptions {
                runtime_crate: self.routing.runtime_crate.clone(),
            },
            policy: self.policy()?,
        })
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

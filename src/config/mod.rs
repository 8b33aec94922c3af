//! `routegen.toml` loading and validation.
//!
//! ```toml
//! enabled = true
//!
//! [routing]
//! result_wrappers = ["ErrorOr", "ApiResult"]
//! max_group_depth = 4
//! runtime_crate = "routegen_runtime"
//!
//! [diagnostics]
//! suppress = ["RG4002"]
//! overrides = { RG4001 = "info" }
//! documentation_hints = false
//!
//! [ignore]
//! patterns = ["src/generated/**"]
//! ```

mod core;
mod loader;

pub use self::core::{
    DiagnosticsConfig, IgnoreConfig, RouteGenConfig, RoutingConfig, MAX_GROUP_DEPTH_LIMIT,
};
pub use loader::{
    apply_env_overrides, directory_ancestors, find_config_file, load_config,
    load_config_from_path, parse_and_validate_config, resolve_config, CONFIG_FILE_NAME,
    ENABLED_ENV_VAR,
};

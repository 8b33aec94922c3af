//! Route templates: parsing, per-endpoint validation and the cross-endpoint
//! duplicate pass.

pub mod duplicates;
pub mod template;
pub mod validation;

pub use duplicates::{detect_duplicates, RouteKey};
pub use template::{parse_template, TemplateError};
pub use validation::{canonicalize_route_names, constraint_accepts, validate_route};

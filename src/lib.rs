//! routegen: compile-time analysis and registration-code generation for
//! annotated HTTP handlers.
//!
//! Handlers are ordinary functions carrying a routing marker:
//!
//! ```ignore
//! impl UserApi {
//!     /// Fetch one user.
//!     #[get("/users/{id:int}")]
//!     pub async fn get_user(id: i64, #[service] repo: &UserRepo) -> ErrorOr<User> { .. }
//! }
//! ```
//!
//! `pipeline::run` parses the sources, classifies every parameter, validates
//! routes, drops duplicates and renders one registration unit per
//! containing type and module. Problems with the analysed code come back as
//! `Diagnostic` values; `RouteGenError` is reserved for failures that stop
//! the run (I/O, bad configuration, cancellation).

pub mod analysis;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod diagnostics;
pub mod discovery;
pub mod emit;
pub mod extraction;
pub mod io;
pub mod observability;
pub mod pipeline;
pub mod routing;

// Re-export commonly used types
pub use crate::core::{
    ContainingType, DeclKey, EndpointDescriptor, Location, ParameterDescriptor, Result,
    RouteGenError, RouteTemplate, TypeRef,
};

pub use crate::diagnostics::{Diagnostic, DiagnosticId, DiagnosticPolicy, Severity};

pub use crate::extraction::{DeclarationExtractor, ExtractedFileData, SourceFile};

pub use crate::emit::{EmitOptions, RenderedUnit};

pub use crate::config::RouteGenConfig;

pub use crate::pipeline::{
    run, run_declarations, CancelFlag, IncrementalHost, PipelineOutput, PipelineSettings,
};

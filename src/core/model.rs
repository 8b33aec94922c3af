//! Descriptor types produced by the analysis stages.
//!
//! Everything here is owned, structurally comparable data. Sequence fields
//! compare in order: reordering parameters changes emitted code, so it must
//! also change equality.

use super::types::TypeRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in a source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Stable declaration-order key: source file plus ordinal within that file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeclKey {
    pub file: String,
    pub ordinal: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OwnerKind {
    /// Associated function inside an `impl` block.
    Type,
    /// Free function; the owner is its module.
    Module,
}

/// Identity of the type (or module) a handler is declared on.
///
/// `path` is the crate-absolute path (`crate::users::UsersApi`) and is what
/// identifies the owner; `name` is its last segment, used for display.
/// Every `impl` block of one type shares the same `path`, whichever module
/// the block sits in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainingType {
    pub kind: OwnerKind,
    pub path: String,
    pub name: String,
}

impl ContainingType {
    /// A type owner from its resolved path.
    pub fn of_type(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = path.rsplit("::").next().unwrap_or(&path).to_string();
        Self {
            kind: OwnerKind::Type,
            path,
            name,
        }
    }

    /// The module owning free handlers.
    pub fn of_module(namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            kind: OwnerKind::Module,
            path: namespace.clone(),
            name: namespace,
        }
    }

    /// Module the owner is defined in.
    pub fn module(&self) -> &str {
        match self.kind {
            OwnerKind::Module => &self.path,
            OwnerKind::Type => self.path.rsplit_once("::").map_or("crate", |(module, _)| module),
        }
    }
}

impl fmt::Display for ContainingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Framework-provided parameter types recognised without an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpecialKind {
    Context,
    Cancellation,
    RawStream,
    FormFile,
    FormFileCollection,
}

/// Explicit binding attribute kinds accepted on parameters and group fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttributeKind {
    Route,
    Query,
    Header,
    Body,
    Form,
    Service,
    KeyedService,
    Group,
}

impl AttributeKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "route" => Some(Self::Route),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "body" => Some(Self::Body),
            "form" => Some(Self::Form),
            "service" => Some(Self::Service),
            "keyed_service" => Some(Self::KeyedService),
            "group" => Some(Self::Group),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Route => "route",
            Self::Query => "query",
            Self::Header => "header",
            Self::Body => "body",
            Self::Form => "form",
            Self::Service => "service",
            Self::KeyedService => "keyed_service",
            Self::Group => "group",
        }
    }
}

/// An explicit binding attribute after argument parsing.
///
/// `name` holds the name override (route/query/header/form) or the service
/// key (keyed_service).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BindingAttribute {
    pub kind: AttributeKind,
    pub name: Option<String>,
}

/// Where a parameter's value comes from at request time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingSource {
    ExplicitRoute { name: String },
    ExplicitQuery { name: String },
    ExplicitHeader { name: String },
    ExplicitBody,
    ExplicitForm { name: String },
    ExplicitService,
    ExplicitKeyedService { key: String },
    ParameterGroup { type_name: String },
    SpecialType(SpecialKind),
    ImplicitRoute,
    ImplicitQuery,
}

impl BindingSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ExplicitRoute { .. } => "ExplicitRoute",
            Self::ExplicitQuery { .. } => "ExplicitQuery",
            Self::ExplicitHeader { .. } => "ExplicitHeader",
            Self::ExplicitBody => "ExplicitBody",
            Self::ExplicitForm { .. } => "ExplicitForm",
            Self::ExplicitService => "ExplicitService",
            Self::ExplicitKeyedService { .. } => "ExplicitKeyedService",
            Self::ParameterGroup { .. } => "ParameterGroup",
            Self::SpecialType(_) => "SpecialType",
            Self::ImplicitRoute => "ImplicitRoute",
            Self::ImplicitQuery => "ImplicitQuery",
        }
    }

    /// True for sources that claim a route placeholder.
    pub fn is_route(&self) -> bool {
        matches!(self, Self::ExplicitRoute { .. } | Self::ImplicitRoute)
    }
}

/// One step of `#[group]` nesting a flattened parameter came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupFrame {
    /// Parameter or field name holding the group.
    pub binding: String,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub ty: TypeRef,
    pub attribute: Option<BindingAttribute>,
    pub source: BindingSource,
    /// Enclosing groups, outermost first. Empty for direct parameters.
    pub group_path: Vec<GroupFrame>,
    pub location: Location,
}

impl ParameterDescriptor {
    /// External name the value is looked up by (placeholder, query key, ...).
    pub fn bound_name(&self) -> &str {
        match &self.source {
            BindingSource::ExplicitRoute { name }
            | BindingSource::ExplicitQuery { name }
            | BindingSource::ExplicitHeader { name }
            | BindingSource::ExplicitForm { name } => name,
            _ => &self.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteSegment {
    Literal(String),
    Placeholder {
        name: String,
        constraints: Vec<String>,
        optional: bool,
        catch_all: bool,
    },
}

/// A parsed route template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteTemplate {
    pub raw: String,
    pub segments: Vec<RouteSegment>,
}

impl RouteTemplate {
    /// Placeholder names in template order.
    pub fn placeholder_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                RouteSegment::Placeholder { name, .. } => Some(name.as_str()),
                RouteSegment::Literal(_) => None,
            })
            .collect()
    }

    pub fn placeholder(&self, wanted: &str) -> Option<&RouteSegment> {
        self.segments.iter().find(|segment| {
            matches!(segment, RouteSegment::Placeholder { name, .. } if name == wanted)
        })
    }
}

/// A fully validated handler, ready for the cross-entity pass and emission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    pub namespace: String,
    pub owner: ContainingType,
    pub trait_name: Option<String>,
    pub method_name: String,
    pub route: RouteTemplate,
    pub verb: String,
    pub success_status: u16,
    pub payload_type: String,
    pub is_async: bool,
    pub parameters: Vec<ParameterDescriptor>,
    pub display_name: Option<String>,
    pub summary: Option<String>,
    pub key: DeclKey,
    pub location: Location,
}

impl EndpointDescriptor {
    /// Total order used by every cross-entity pass: namespace, owner, then
    /// declaration order.
    pub fn order_key(&self) -> (&str, &str, &DeclKey) {
        (&self.namespace, &self.owner.path, &self.key)
    }

    /// Name used in generated metadata.
    pub fn effective_name(&self) -> String {
        self.display_name
            .clone()
            .unwrap_or_else(|| format!("{}.{}", self.owner.name, self.method_name))
    }

    /// Human-readable identity used in diagnostics.
    pub fn qualified_name(&self) -> String {
        format!("{}::{}::{}", self.namespace, self.owner.name, self.method_name)
    }
}

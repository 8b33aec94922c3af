//! Declaration data produced by the front-end.
//!
//! These are the inputs the analysis core consumes. Each is a self-contained
//! snapshot copied out of the syn AST: no spans, no token streams.

use crate::core::{ContainingType, DeclKey, Location, TypeRef};
use serde::{Deserialize, Serialize};

/// A literal-ish attribute argument value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttrValue {
    Str(String),
    Int(u64),
    Bool(bool),
    Ident(String),
    /// Anything else, kept as token text.
    Other(String),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }
}

/// One argument: positional (`"x"`) or named (`key = "x"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttrArg {
    pub key: Option<String>,
    pub value: AttrValue,
}

impl AttrArg {
    pub fn positional(value: AttrValue) -> Self {
        Self { key: None, value }
    }

    pub fn named(key: &str, value: AttrValue) -> Self {
        Self {
            key: Some(key.to_string()),
            value,
        }
    }
}

/// An outer attribute other than `#[doc]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeDecl {
    pub path: Vec<String>,
    pub args: Vec<AttrArg>,
    /// Set when the argument list could not be read as comma-separated
    /// expressions; holds the raw token text.
    pub malformed: Option<String>,
    pub location: Location,
}

impl AttributeDecl {
    pub fn new(path: &str, args: Vec<AttrArg>) -> Self {
        Self {
            path: path.split("::").map(str::to_string).collect(),
            args,
            malformed: None,
            location: Location::default(),
        }
    }

    /// Last path segment, which is what markers are matched on.
    pub fn name(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }

    pub fn positional(&self) -> impl Iterator<Item = &AttrValue> {
        self.args.iter().filter(|a| a.key.is_none()).map(|a| &a.value)
    }

    pub fn named(&self, key: &str) -> Option<&AttrValue> {
        self.args
            .iter()
            .find(|a| a.key.as_deref() == Some(key))
            .map(|a| &a.value)
    }
}

/// A function parameter or a named struct field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamDecl {
    /// `None` when the pattern is not a plain identifier.
    pub name: Option<String>,
    pub ty: TypeRef,
    pub attributes: Vec<AttributeDecl>,
    pub location: Location,
}

impl ParamDecl {
    pub fn new(name: &str, ty: TypeRef) -> Self {
        Self {
            name: Some(name.to_string()),
            ty,
            attributes: Vec::new(),
            location: Location::default(),
        }
    }

    pub fn with_attribute(mut self, attribute: AttributeDecl) -> Self {
        self.attributes.push(attribute);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReceiverKind {
    Value,
    Ref,
    RefMut,
    Typed,
}

/// A candidate handler: a function carrying a routing marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandlerDecl {
    pub namespace: String,
    pub owner: ContainingType,
    pub trait_name: Option<String>,
    pub name: String,
    pub key: DeclKey,
    pub location: Location,
    pub attributes: Vec<AttributeDecl>,
    pub doc: Option<String>,
    pub receiver: Option<ReceiverKind>,
    /// Type and const generic parameter names, including the impl block's.
    pub generic_params: Vec<String>,
    pub is_async: bool,
    /// `None` for the implicit unit return.
    pub output: Option<TypeRef>,
    pub params: Vec<ParamDecl>,
}

/// A struct definition, used to expand `#[group]` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructDecl {
    pub namespace: String,
    pub name: String,
    /// `None` for tuple and unit structs.
    pub fields: Option<Vec<ParamDecl>>,
    pub location: Location,
}

/// Everything the front-end extracted from one source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtractedFileData {
    pub path: String,
    pub handlers: Vec<HandlerDecl>,
    pub structs: Vec<StructDecl>,
}

impl ExtractedFileData {
    pub fn empty(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            handlers: Vec::new(),
            structs: Vec::new(),
        }
    }
}

/// A source file as handed to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path relative to the project root, with `/` separators.
    pub path: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

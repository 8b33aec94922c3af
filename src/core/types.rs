//! Plain-data rendering of Rust types.
//!
//! `TypeRef` is what the extractor produces from a `syn::Type`. It owns all of
//! its data, so it can cross stage boundaries and sit in caches without
//! dragging parser state along.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A self-contained description of a Rust type as written at the declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TypeRef {
    /// `a::b::C<Args..>`; generic arguments belong to the last segment.
    Path {
        segments: Vec<String>,
        args: Vec<TypeRef>,
    },
    /// `&T` / `&mut T`
    Reference { mutable: bool, inner: Box<TypeRef> },
    /// `[T]`
    Slice(Box<TypeRef>),
    /// `[T; len]`
    Array { elem: Box<TypeRef>, len: String },
    /// `(A, B)`; the empty tuple is unit.
    Tuple(Vec<TypeRef>),
    /// `impl Trait<..>` or `dyn Trait<..>` with an optional `Output = T` binding.
    Trait {
        dynamic: bool,
        segments: Vec<String>,
        output: Option<Box<TypeRef>>,
    },
    /// Anything the extractor does not model, kept as token text.
    Opaque(String),
}

impl TypeRef {
    /// Shorthand for a path type without generic arguments.
    pub fn named(name: &str) -> Self {
        Self::Path {
            segments: name.split("::").map(str::to_string).collect(),
            args: Vec::new(),
        }
    }

    /// Shorthand for a path type with generic arguments.
    pub fn generic(name: &str, args: Vec<TypeRef>) -> Self {
        Self::Path {
            segments: name.split("::").map(str::to_string).collect(),
            args,
        }
    }

    pub fn reference(inner: TypeRef) -> Self {
        Self::Reference {
            mutable: false,
            inner: Box::new(inner),
        }
    }

    pub fn unit() -> Self {
        Self::Tuple(Vec::new())
    }

    /// Last path segment, if this is a path type.
    pub fn last_segment(&self) -> Option<&str> {
        match self {
            Self::Path { segments, .. } => segments.last().map(String::as_str),
            _ => None,
        }
    }

    /// Generic arguments of a path type (empty for other shapes).
    pub fn args(&self) -> &[TypeRef] {
        match self {
            Self::Path { args, .. } => args,
            _ => &[],
        }
    }

    /// True when this is a path type whose last segment is `name`.
    pub fn is(&self, name: &str) -> bool {
        self.last_segment() == Some(name)
    }

    /// Strip any number of reference layers.
    pub fn peel_references(&self) -> &TypeRef {
        let mut current = self;
        while let Self::Reference { inner, .. } = current {
            current = inner;
        }
        current
    }

    /// Inner type of `Option<T>`, if this is one.
    pub fn option_inner(&self) -> Option<&TypeRef> {
        match self {
            Self::Path { args, .. } if self.is("Option") && args.len() == 1 => args.first(),
            _ => None,
        }
    }

    pub fn is_option(&self) -> bool {
        self.option_inner().is_some()
    }

    /// The owned counterpart used when binding a value before a call.
    ///
    /// `&str` becomes `String`, `&[T]` becomes `Vec<T>`, `&T` becomes `T`.
    pub fn owned(&self) -> TypeRef {
        match self {
            Self::Reference { inner, .. } => match inner.as_ref() {
                Self::Path { segments, args } if args.is_empty() && segments.last().is_some_and(|s| s == "str") => {
                    TypeRef::named("String")
                }
                Self::Slice(elem) => TypeRef::generic("Vec", vec![elem.owned()]),
                other => other.owned(),
            },
            other => other.clone(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path { segments, args } => {
                write!(f, "{}", segments.join("::"))?;
                write_args(f, args)
            }
            Self::Reference { mutable, inner } => {
                if *mutable {
                    write!(f, "&mut {inner}")
                } else {
                    write!(f, "&{inner}")
                }
            }
            Self::Slice(elem) => write!(f, "[{elem}]"),
            Self::Array { elem, len } => write!(f, "[{elem}; {len}]"),
            Self::Tuple(elems) => {
                write!(f, "(")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{elem}")?;
                }
                if elems.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Self::Trait {
                dynamic,
                segments,
                output,
            } => {
                let keyword = if *dynamic { "dyn" } else { "impl" };
                write!(f, "{keyword} {}", segments.join("::"))?;
                if let Some(output) = output {
                    write!(f, "<Output = {output}>")?;
                }
                Ok(())
            }
            Self::Opaque(text) => write!(f, "{text}"),
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[TypeRef]) -> fmt::Result {
    if args.is_empty() {
        return Ok(());
    }
    write!(f, "<")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{arg}")?;
    }
    write!(f, ">")
}

//! Static type tables used by the classifier.
//!
//! Built once on first use. Lookups match the last path segment, so
//! `tokio_util::sync::CancellationToken` and `CancellationToken` are the same
//! entry.

use crate::core::{SpecialKind, TypeRef};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

static SPECIAL_TYPES: Lazy<HashMap<&'static str, SpecialKind>> = Lazy::new(|| {
    HashMap::from([
        ("HttpContext", SpecialKind::Context),
        ("RequestContext", SpecialKind::Context),
        ("CancellationToken", SpecialKind::Cancellation),
        ("BodyStream", SpecialKind::RawStream),
        ("RawBody", SpecialKind::RawStream),
        ("FormFile", SpecialKind::FormFile),
        ("FormFileCollection", SpecialKind::FormFileCollection),
    ])
});

static SCALARS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "bool", "char", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64",
        "u128", "usize", "f32", "f64", "String", "str", "Uuid", "Decimal", "NaiveDate",
        "NaiveDateTime", "NaiveTime", "IpAddr", "Ipv4Addr", "Ipv6Addr",
    ])
});

static COLLECTIONS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| HashSet::from(["Vec", "VecDeque", "HashSet", "BTreeSet"]));

/// Integer primitives, shared with route constraint checks.
pub const INTEGER_TYPES: [&str; 12] = [
    "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize",
];

/// Framework-special kind of a parameter type, ignoring references and one
/// `Option` layer.
pub fn special_kind(ty: &TypeRef) -> Option<SpecialKind> {
    let ty = ty.peel_references();
    match ty.option_inner() {
        Some(inner) => required_kind(inner.peel_references()),
        None => required_kind(ty),
    }
}

fn required_kind(ty: &TypeRef) -> Option<SpecialKind> {
    if let Some(kind) = ty.last_segment().and_then(|name| SPECIAL_TYPES.get(name)) {
        return Some(*kind);
    }
    match collection_element(ty) {
        Some(elem) if required_kind(elem.peel_references()) == Some(SpecialKind::FormFile) => {
            Some(SpecialKind::FormFileCollection)
        }
        _ => None,
    }
}

/// Single-valued types bindable from one string: primitives, `Option` of
/// one, references to one and `Cow<str>`.
pub fn is_scalar(ty: &TypeRef) -> bool {
    let ty = ty.peel_references();
    if let Some(inner) = ty.option_inner() {
        return is_scalar(inner);
    }
    let Some(name) = ty.last_segment() else {
        return false;
    };
    match name {
        "DateTime" => true,
        "Cow" => ty.args().last().is_some_and(is_string_like),
        _ => ty.args().is_empty() && SCALARS.contains(name),
    }
}

/// Scalars and collections of scalars; the types that bind implicitly from
/// the query string.
pub fn is_query_bindable(ty: &TypeRef) -> bool {
    let ty = ty.peel_references();
    if let Some(inner) = ty.option_inner() {
        return is_query_bindable(inner);
    }
    is_scalar(ty) || collection_element(ty).is_some_and(is_scalar)
}

/// `String`, `str` or `Cow<str>`, through references and `Option`.
pub fn is_string_like(ty: &TypeRef) -> bool {
    let ty = ty.peel_references();
    if let Some(inner) = ty.option_inner() {
        return is_string_like(inner);
    }
    match ty.last_segment() {
        Some("String" | "str") => ty.args().is_empty(),
        Some("Cow") => ty.args().last().is_some_and(is_string_like),
        _ => false,
    }
}

/// Element type of a sequence: `Vec<T>` and friends, `[T]`, `[T; N]`.
pub fn collection_element(ty: &TypeRef) -> Option<&TypeRef> {
    match ty {
        TypeRef::Slice(elem) => Some(&**elem),
        TypeRef::Array { elem, .. } => Some(&**elem),
        TypeRef::Path { segments, args } if args.len() == 1 => segments
            .last()
            .filter(|name| COLLECTIONS.contains(name.as_str()))
            .map(|_| &args[0]),
        _ => None,
    }
}

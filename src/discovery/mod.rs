//! Entity discovery.
//!
//! Two phases:
//!
//! 1. `has_routing_marker` looks only at attribute paths. The extractor runs it
//!    over every function and copies out nothing else for the rest.
//! 2. `resolve_candidate` checks that a candidate is a context-free callable
//!    with a readable marker and an accepted return shape. A failure here is a
//!    single Error and no entity at all.

pub mod marker;

use crate::analysis::return_type::{normalize_return, ReturnShape};
use crate::core::Location;
use crate::diagnostics::{Diagnostic, DiagnosticId};
use crate::extraction::{AttributeDecl, HandlerDecl};

pub use marker::{RoutingMarker, ROUTE_MARKER, VERB_MARKERS};

fn is_marker_name(name: &str) -> bool {
    name == ROUTE_MARKER || VERB_MARKERS.contains(&name)
}

/// Cheap syntactic filter: does any attribute's last path segment name a
/// routing marker?
pub fn has_routing_marker(attrs: &[syn::Attribute]) -> bool {
    attrs.iter().any(|attr| {
        attr.path()
            .segments
            .last()
            .is_some_and(|segment| is_marker_name(&segment.ident.to_string()))
    })
}

/// Routing marker attributes on an extracted handler, in source order.
pub fn marker_attributes(handler: &HandlerDecl) -> Vec<&AttributeDecl> {
    handler
        .attributes
        .iter()
        .filter(|attr| is_marker_name(attr.name()))
        .collect()
}

/// A candidate that passed entity-level checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedHandler {
    pub marker: RoutingMarker,
    pub shape: ReturnShape,
    /// Where the marker sits; route template diagnostics point here.
    pub marker_location: Location,
}

/// Entity-level resolution. `Err` carries the one diagnostic that rejects
/// the whole handler.
pub fn resolve_candidate(
    handler: &HandlerDecl,
    result_wrappers: &[String],
) -> Result<ResolvedHandler, Diagnostic> {
    let markers = marker_attributes(handler);
    let name = &handler.name;

    let marker_attr = match markers.as_slice() {
        [single] => *single,
        [] => {
            return Err(Diagnostic::new(
                DiagnosticId::InvalidRoutingMarker,
                format!("handler `{name}` has no routing marker"),
                handler.location.clone(),
            ))
        }
        [_, second, ..] => {
            return Err(Diagnostic::new(
                DiagnosticId::InvalidRoutingMarker,
                format!("handler `{name}` has more than one routing marker"),
                second.location.clone(),
            ))
        }
    };

    if handler.receiver.is_some() {
        return Err(Diagnostic::new(
            DiagnosticId::NonStaticHandler,
            format!("handler `{name}` takes `self`; handlers must be associated or free functions"),
            handler.location.clone(),
        ));
    }

    if !handler.generic_params.is_empty() {
        return Err(Diagnostic::new(
            DiagnosticId::GenericHandler,
            format!(
                "handler `{name}` is generic over {}; handlers cannot be registered without instantiation",
                handler.generic_params.join(", ")
            ),
            handler.location.clone(),
        ));
    }

    let marker = RoutingMarker::parse(marker_attr).map_err(|reason| {
        Diagnostic::new(
            DiagnosticId::InvalidRoutingMarker,
            format!("handler `{name}`: {reason}"),
            marker_attr.location.clone(),
        )
    })?;

    let shape = normalize_return(handler.output.as_ref(), handler.is_async, result_wrappers)
        .map_err(|reason| {
            Diagnostic::new(
                DiagnosticId::InvalidReturnType,
                format!("handler `{name}`: {reason}"),
                handler.location.clone(),
            )
        })?;

    Ok(ResolvedHandler {
        marker,
        shape,
        marker_location: marker_attr.location.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{DeclarationExtractor, SourceFile};
    use indoc::indoc;

    fn handlers(code: &str) -> Vec<HandlerDecl> {
        DeclarationExtractor::extract(&SourceFile::new("src/api.rs", code))
            .expect("parse")
            .handlers
    }

    fn resolve(code: &str) -> Result<ResolvedHandler, Diagnostic> {
        let handler = handlers(code).remove(0);
        resolve_candidate(&handler, &["ErrorOr".to_string()])
    }

    #[test]
    fn test_marker_predicate_matches_last_segment() {
        let item: syn::ItemFn = syn::parse_quote! {
            #[routegen::delete("/x")]
            fn remove() {}
        };
        assert!(has_routing_marker(&item.attrs));

        let plain: syn::ItemFn = syn::parse_quote! {
            #[inline]
            fn helper() {}
        };
        assert!(!has_routing_marker(&plain.attrs));
    }

    #[test]
    fn test_resolves_static_handler() {
        let resolved = resolve(indoc! {r#"
            #[get("/users/{id}")]
            async fn get_user(id: i32) -> ErrorOr<User> { todo!() }
        "#})
        .unwrap();
        assert_eq!(resolved.marker.verb, "GET");
        assert!(resolved.shape.is_async);
        assert_eq!(resolved.shape.payload_name(), "User");
    }

    #[test]
    fn test_instance_handler_rejected() {
        let diagnostic = resolve(indoc! {r#"
            struct Api;
            impl Api {
                #[get("/x")]
                fn get(&self) -> ErrorOr<u8> { todo!() }
            }
        "#})
        .unwrap_err();
        assert_eq!(diagnostic.id, DiagnosticId::NonStaticHandler);
    }

    #[test]
    fn test_generic_handler_rejected() {
        let diagnostic = resolve(indoc! {r#"
            #[get("/x")]
            fn get<T: Default>() -> ErrorOr<u8> { todo!() }
        "#})
        .unwrap_err();
        assert_eq!(diagnostic.id, DiagnosticId::GenericHandler);
    }

    #[test]
    fn test_two_markers_rejected() {
        let diagnostic = resolve(indoc! {r#"
            #[get("/x")]
            #[post("/x")]
            fn both() -> ErrorOr<u8> { todo!() }
        "#})
        .unwrap_err();
        assert_eq!(diagnostic.id, DiagnosticId::InvalidRoutingMarker);
    }

    #[test]
    fn test_bad_return_rejected() {
        let diagnostic = resolve(indoc! {r#"
            #[get("/x")]
            fn plain() -> u8 { 0 }
        "#})
        .unwrap_err();
        assert_eq!(diagnostic.id, DiagnosticId::InvalidReturnType);
    }

    #[test]
    fn test_receiver_checked_before_return_type() {
        let diagnostic = resolve(indoc! {r#"
            struct Api;
            impl Api {
                #[get("/x")]
                fn get(self) -> u8 { 0 }
            }
        "#})
        .unwrap_err();
        assert_eq!(diagnostic.id, DiagnosticId::NonStaticHandler);
    }
}

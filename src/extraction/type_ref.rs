//! Conversion from `syn::Type` to the owned `TypeRef`.

use crate::core::TypeRef;
use quote::ToTokens;

pub fn type_ref_from_syn(ty: &syn::Type) -> TypeRef {
    match ty {
        syn::Type::Path(type_path) if type_path.qself.is_none() => from_path(&type_path.path),
        syn::Type::Reference(reference) => TypeRef::Reference {
            mutable: reference.mutability.is_some(),
            inner: Box::new(type_ref_from_syn(&reference.elem)),
        },
        syn::Type::Slice(slice) => TypeRef::Slice(Box::new(type_ref_from_syn(&slice.elem))),
        syn::Type::Array(array) => TypeRef::Array {
            elem: Box::new(type_ref_from_syn(&array.elem)),
            len: array.len.to_token_stream().to_string(),
        },
        syn::Type::Tuple(tuple) => {
            TypeRef::Tuple(tuple.elems.iter().map(type_ref_from_syn).collect())
        }
        syn::Type::Paren(paren) => type_ref_from_syn(&paren.elem),
        syn::Type::Group(group) => type_ref_from_syn(&group.elem),
        syn::Type::ImplTrait(impl_trait) => from_bounds(false, impl_trait.bounds.iter()),
        syn::Type::TraitObject(object) => from_bounds(true, object.bounds.iter()),
        other => TypeRef::Opaque(other.to_token_stream().to_string()),
    }
}

fn from_path(path: &syn::Path) -> TypeRef {
    let segments = path.segments.iter().map(|s| s.ident.to_string()).collect();
    let args = path
        .segments
        .last()
        .map(|last| generic_types(&last.arguments))
        .unwrap_or_default();
    TypeRef::Path { segments, args }
}

fn generic_types(arguments: &syn::PathArguments) -> Vec<TypeRef> {
    match arguments {
        syn::PathArguments::AngleBracketed(angle) => angle
            .args
            .iter()
            .filter_map(|arg| match arg {
                syn::GenericArgument::Type(ty) => Some(type_ref_from_syn(ty)),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Uses the first trait bound; auto traits and lifetimes after it are dropped.
fn from_bounds<'a>(
    dynamic: bool,
    mut bounds: impl Iterator<Item = &'a syn::TypeParamBound>,
) -> TypeRef {
    let trait_bound = bounds.find_map(|bound| match bound {
        syn::TypeParamBound::Trait(trait_bound) => Some(trait_bound),
        _ => None,
    });
    let Some(trait_bound) = trait_bound else {
        return TypeRef::Opaque((if dynamic { "dyn" } else { "impl" }).to_string());
    };

    let segments = trait_bound
        .path
        .segments
        .iter()
        .map(|s| s.ident.to_string())
        .collect();
    let output = trait_bound.path.segments.last().and_then(|last| match &last.arguments {
        syn::PathArguments::AngleBracketed(angle) => angle.args.iter().find_map(|arg| match arg {
            syn::GenericArgument::AssocType(assoc) if assoc.ident == "Output" => {
                Some(Box::new(type_ref_from_syn(&assoc.ty)))
            }
            _ => None,
        }),
        _ => None,
    });

    TypeRef::Trait {
        dynamic,
        segments,
        output,
    }
}

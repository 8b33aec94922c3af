//! Single-pass declaration extraction.
//!
//! `DeclarationExtractor` parses a Rust file once, runs the cheap routing
//! marker predicate over every function, and copies candidates (plus all
//! struct definitions, needed for `#[group]` expansion) into owned
//! declaration data. Functions without a marker are skipped without looking
//! at their signatures.
//!
//! The proc-macro2 SourceMap is reset after each file so spans never
//! accumulate across a long-running session.

use super::namespace::{child_module, module_path_for, resolve_path};
use super::type_ref::type_ref_from_syn;
use super::types::{
    AttrArg, AttrValue, AttributeDecl, ExtractedFileData, HandlerDecl, ParamDecl, ReceiverKind,
    SourceFile, StructDecl,
};
use crate::core::parsing::reset_span_locations;
use crate::core::{ContainingType, DeclKey, Location, Result, RouteGenError};
use crate::discovery::has_routing_marker;
use quote::ToTokens;
use rayon::prelude::*;
use syn::ext::IdentExt;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use std::collections::BTreeMap;
use tracing::{debug, debug_span};

/// Names brought into one module by `use`, alias to path as written.
/// Glob imports are not tracked.
type Imports = BTreeMap<String, Vec<String>>;

/// Where the current function sits.
struct Scope<'a> {
    namespace: &'a str,
    owner: ContainingType,
    trait_name: Option<String>,
    generic_params: Vec<String>,
}

pub struct DeclarationExtractor {
    path: String,
    ordinal: u32,
    functions_seen: usize,
}

impl DeclarationExtractor {
    /// Extract all candidate handlers and struct definitions from one file.
    ///
    /// # Errors
    ///
    /// Returns `RouteGenError::Parse` when the file is not valid Rust.
    pub fn extract(file: &SourceFile) -> Result<ExtractedFileData> {
        let _span = debug_span!("extract_file", path = %file.path).entered();

        let ast = match syn::parse_file(&file.content) {
            Ok(ast) => ast,
            Err(e) => {
                let start = e.span().start();
                let err = RouteGenError::parse(&file.path, start.line, start.column + 1, e.to_string());
                reset_span_locations();
                return Err(err);
            }
        };

        let mut extractor = Self {
            path: file.path.clone(),
            ordinal: 0,
            functions_seen: 0,
        };
        let namespace = module_path_for(&file.path);
        let mut data = ExtractedFileData::empty(file.path.clone());
        extractor.extract_items(&ast.items, &namespace, &mut data);

        debug!(
            functions = extractor.functions_seen,
            candidates = data.handlers.len(),
            structs = data.structs.len(),
            "Extracted declarations"
        );

        reset_span_locations();
        Ok(data)
    }

    /// Extract many files in parallel, resetting the SourceMap between batches.
    ///
    /// Results come back in input order.
    pub fn extract_batch(
        files: &[SourceFile],
        batch_size: usize,
    ) -> Vec<(String, Result<ExtractedFileData>)> {
        let mut results = Vec::with_capacity(files.len());
        for batch in files.chunks(batch_size.max(1)) {
            let batch_results: Vec<_> = batch
                .par_iter()
                .map(|file| (file.path.clone(), Self::extract(file)))
                .collect();
            results.extend(batch_results);
            reset_span_locations();
        }
        results
    }

    fn extract_items(&mut self, items: &[syn::Item], namespace: &str, data: &mut ExtractedFileData) {
        let mut imports = Imports::new();
        for item in items {
            if let syn::Item::Use(item_use) = item {
                collect_imports(&item_use.tree, &mut Vec::new(), &mut imports);
            }
        }

        for item in items {
            match item {
                syn::Item::Fn(item_fn) => {
                    self.functions_seen += 1;
                    if has_routing_marker(&item_fn.attrs) {
                        let scope = Scope {
                            namespace,
                            owner: ContainingType::of_module(namespace),
                            trait_name: None,
                            generic_params: Vec::new(),
                        };
                        let handler = self.extract_handler(&item_fn.attrs, &item_fn.sig, &scope);
                        data.handlers.push(handler);
                    }
                }
                syn::Item::Impl(item_impl) => self.extract_impl(item_impl, namespace, &imports, data),
                syn::Item::Struct(item_struct) => {
                    data.structs.push(self.extract_struct(item_struct, namespace));
                }
                syn::Item::Mod(item_mod) => {
                    if let Some((_, items)) = &item_mod.content {
                        let child = child_module(namespace, &item_mod.ident.unraw().to_string());
                        self.extract_items(items, &child, data);
                    }
                }
                _ => {}
            }
        }
    }

    fn extract_impl(
        &mut self,
        item_impl: &syn::ItemImpl,
        namespace: &str,
        imports: &Imports,
        data: &mut ExtractedFileData,
    ) {
        let owner = match item_impl.self_ty.as_ref() {
            syn::Type::Path(type_path) if type_path.qself.is_none() => {
                let segments: Vec<String> = type_path
                    .path
                    .segments
                    .iter()
                    .map(|s| s.ident.unraw().to_string())
                    .collect();
                ContainingType::of_type(resolve_owner(namespace, &segments, imports))
            }
            other => ContainingType::of_type(other.to_token_stream().to_string()),
        };
        let trait_name = item_impl.trait_.as_ref().map(|(_, path, _)| {
            path.segments
                .iter()
                .map(|s| s.ident.to_string())
                .collect::<Vec<_>>()
                .join("::")
        });
        let scope = Scope {
            namespace,
            owner,
            trait_name,
            generic_params: generic_names(&item_impl.generics),
        };

        for impl_item in &item_impl.items {
            if let syn::ImplItem::Fn(method) = impl_item {
                self.functions_seen += 1;
                if has_routing_marker(&method.attrs) {
                    let handler = self.extract_handler(&method.attrs, &method.sig, &scope);
                    data.handlers.push(handler);
                }
            }
        }
    }

    fn extract_handler(
        &mut self,
        attrs: &[syn::Attribute],
        sig: &syn::Signature,
        scope: &Scope<'_>,
    ) -> HandlerDecl {
        let key = DeclKey {
            file: self.path.clone(),
            ordinal: self.ordinal,
        };
        self.ordinal += 1;

        let receiver = sig.receiver().map(|receiver| {
            if receiver.colon_token.is_some() {
                ReceiverKind::Typed
            } else {
                match &receiver.reference {
                    Some(_) if receiver.mutability.is_some() => ReceiverKind::RefMut,
                    Some(_) => ReceiverKind::Ref,
                    None => ReceiverKind::Value,
                }
            }
        });

        let mut generic_params = scope.generic_params.clone();
        generic_params.extend(generic_names(&sig.generics));

        let params = sig
            .inputs
            .iter()
            .filter_map(|input| match input {
                syn::FnArg::Typed(pat_type) => Some(self.extract_param(pat_type)),
                syn::FnArg::Receiver(_) => None,
            })
            .collect();

        HandlerDecl {
            namespace: scope.namespace.to_string(),
            owner: scope.owner.clone(),
            trait_name: scope.trait_name.clone(),
            name: sig.ident.unraw().to_string(),
            key,
            location: self.location(sig.ident.span()),
            attributes: self.extract_attributes(attrs),
            doc: doc_text(attrs),
            receiver,
            generic_params,
            is_async: sig.asyncness.is_some(),
            output: match &sig.output {
                syn::ReturnType::Default => None,
                syn::ReturnType::Type(_, ty) => Some(type_ref_from_syn(ty)),
            },
            params,
        }
    }

    fn extract_param(&self, pat_type: &syn::PatType) -> ParamDecl {
        let name = match pat_type.pat.as_ref() {
            syn::Pat::Ident(pat_ident) if pat_ident.subpat.is_none() => {
                Some(pat_ident.ident.unraw().to_string())
            }
            _ => None,
        };
        ParamDecl {
            name,
            ty: type_ref_from_syn(&pat_type.ty),
            attributes: self.extract_attributes(&pat_type.attrs),
            location: self.location(pat_type.pat.span()),
        }
    }

    fn extract_struct(&self, item_struct: &syn::ItemStruct, namespace: &str) -> StructDecl {
        let fields = match &item_struct.fields {
            syn::Fields::Named(named) => Some(
                named
                    .named
                    .iter()
                    .map(|field| ParamDecl {
                        name: field.ident.as_ref().map(|ident| ident.unraw().to_string()),
                        ty: type_ref_from_syn(&field.ty),
                        attributes: self.extract_attributes(&field.attrs),
                        location: self.location(field.span()),
                    })
                    .collect(),
            ),
            syn::Fields::Unnamed(_) | syn::Fields::Unit => None,
        };
        StructDecl {
            namespace: namespace.to_string(),
            name: item_struct.ident.unraw().to_string(),
            fields,
            location: self.location(item_struct.ident.span()),
        }
    }

    fn extract_attributes(&self, attrs: &[syn::Attribute]) -> Vec<AttributeDecl> {
        attrs
            .iter()
            .filter(|attr| !attr.path().is_ident("doc"))
            .map(|attr| self.extract_attribute(attr))
            .collect()
    }

    fn extract_attribute(&self, attr: &syn::Attribute) -> AttributeDecl {
        let path = attr
            .path()
            .segments
            .iter()
            .map(|s| s.ident.to_string())
            .collect();
        let location = self.location(attr.span());

        let (args, malformed) = match &attr.meta {
            syn::Meta::Path(_) => (Vec::new(), None),
            syn::Meta::NameValue(name_value) => {
                (vec![AttrArg::positional(attr_value(&name_value.value))], None)
            }
            syn::Meta::List(list) => {
                match list.parse_args_with(Punctuated::<syn::Expr, syn::Token![,]>::parse_terminated) {
                    Ok(exprs) => (exprs.iter().map(attr_arg).collect(), None),
                    Err(_) => (Vec::new(), Some(list.tokens.to_string())),
                }
            }
        };

        AttributeDecl {
            path,
            args,
            malformed,
            location,
        }
    }

    fn location(&self, span: proc_macro2::Span) -> Location {
        let start = span.start();
        Location::new(self.path.clone(), start.line as u32, start.column as u32 + 1)
    }
}

fn generic_names(generics: &syn::Generics) -> Vec<String> {
    generics
        .params
        .iter()
        .filter_map(|param| match param {
            syn::GenericParam::Type(ty) => Some(ty.ident.to_string()),
            syn::GenericParam::Const(constant) => Some(constant.ident.to_string()),
            syn::GenericParam::Lifetime(_) => None,
        })
        .collect()
}

fn attr_arg(expr: &syn::Expr) -> AttrArg {
    if let syn::Expr::Assign(assign) = expr {
        if let syn::Expr::Path(path) = assign.left.as_ref() {
            if let Some(ident) = path.path.get_ident() {
                return AttrArg::named(&ident.unraw().to_string(), attr_value(&assign.right));
            }
        }
    }
    AttrArg::positional(attr_value(expr))
}

fn attr_value(expr: &syn::Expr) -> AttrValue {
    match expr {
        syn::Expr::Lit(expr_lit) => match &expr_lit.lit {
            syn::Lit::Str(s) => AttrValue::Str(s.value()),
            syn::Lit::Int(i) => i
                .base10_parse::<u64>()
                .map(AttrValue::Int)
                .unwrap_or_else(|_| AttrValue::Other(i.to_string())),
            syn::Lit::Bool(b) => AttrValue::Bool(b.value),
            other => AttrValue::Other(other.to_token_stream().to_string()),
        },
        syn::Expr::Path(path) => match path.path.get_ident() {
            Some(ident) => AttrValue::Ident(ident.unraw().to_string()),
            None => AttrValue::Other(path.to_token_stream().to_string()),
        },
        other => AttrValue::Other(other.to_token_stream().to_string()),
    }
}

/// Joined `///` lines, trimmed; `None` when there is no text.
fn doc_text(attrs: &[syn::Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            syn::Meta::NameValue(name_value) => match &name_value.value {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(s),
                    ..
                }) => Some(s.value().trim().to_string()),
                _ => None,
            },
            _ => None,
        })
        .collect();
    let text = lines.join("\n").trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn collect_imports(tree: &syn::UseTree, prefix: &mut Vec<String>, imports: &mut Imports) {
    match tree {
        syn::UseTree::Path(path) => {
            prefix.push(path.ident.unraw().to_string());
            collect_imports(&path.tree, prefix, imports);
            prefix.pop();
        }
        syn::UseTree::Name(name) => {
            let ident = name.ident.unraw().to_string();
            if ident == "self" {
                if let Some(module) = prefix.last() {
                    imports.insert(module.clone(), prefix.clone());
                }
            } else {
                let mut full = prefix.clone();
                full.push(ident.clone());
                imports.insert(ident, full);
            }
        }
        syn::UseTree::Rename(rename) => {
            let mut full = prefix.clone();
            full.push(rename.ident.unraw().to_string());
            imports.insert(rename.rename.unraw().to_string(), full);
        }
        syn::UseTree::Group(group) => {
            for item in &group.items {
                collect_imports(item, prefix, imports);
            }
        }
        syn::UseTree::Glob(_) => {}
    }
}

/// Crate-absolute path of an `impl` self type. A leading segment brought in
/// by `use` is replaced by its import path first.
fn resolve_owner(namespace: &str, segments: &[String], imports: &Imports) -> String {
    let Some((first, rest)) = segments.split_first() else {
        return namespace.to_string();
    };
    match imports.get(first) {
        Some(imported) if !matches!(first.as_str(), "crate" | "self" | "super") => {
            let mut full = imported.clone();
            full.extend(rest.iter().cloned());
            resolve_path(namespace, &full)
        }
        _ => resolve_path(namespace, segments),
    }
}

//! Request accessor expressions, one per binding source.

use crate::analysis::special_types::{is_query_bindable, special_kind};
use crate::core::{BindingSource, ParameterDescriptor, SpecialKind, TypeRef};

/// Name of the local a parameter value is bound to before the call.
///
/// Direct parameters become `arg_<name>`; their names are already unique.
/// Group members become `arg<index>_<name>`, with `index` the member's
/// position in the flattened parameter list. The digit after `arg` keeps the
/// two forms apart and the index keeps members apart.
pub fn local_name(parameter: &ParameterDescriptor, index: usize) -> String {
    if parameter.group_path.is_empty() {
        format!("arg_{}", parameter.name)
    } else {
        format!("arg{index}_{}", parameter.name)
    }
}

/// Expression reading a parameter's value from `request`, or `None` for a
/// group header, which is assembled from its members instead.
pub fn accessor(parameter: &ParameterDescriptor) -> Option<String> {
    let ty = parameter.ty.owned();
    let expr = match &parameter.source {
        BindingSource::ExplicitRoute { name } => format!("request.route::<{ty}>({name:?})?"),
        BindingSource::ImplicitRoute => format!("request.route::<{ty}>({:?})?", parameter.name),
        BindingSource::ExplicitQuery { name } => format!("request.query::<{ty}>({name:?})?"),
        BindingSource::ImplicitQuery => format!("request.query::<{ty}>({:?})?", parameter.name),
        BindingSource::ExplicitHeader { name } => format!("request.header::<{ty}>({name:?})?"),
        BindingSource::ExplicitBody => format!("request.body::<{ty}>().await?"),
        BindingSource::ExplicitForm { name } => form_accessor(&parameter.ty, &ty, name),
        BindingSource::ExplicitService => format!("request.service::<{ty}>()?"),
        BindingSource::ExplicitKeyedService { key } => {
            format!("request.keyed_service::<{ty}>({key:?})?")
        }
        BindingSource::SpecialType(kind) => special_accessor(*kind, &parameter.ty, &parameter.name),
        BindingSource::ParameterGroup { .. } => return None,
    };
    Some(expr)
}

fn form_accessor(declared: &TypeRef, owned: &TypeRef, name: &str) -> String {
    match special_kind(declared) {
        Some(kind @ (SpecialKind::FormFile | SpecialKind::FormFileCollection)) => {
            special_accessor(kind, declared, name)
        }
        _ if is_query_bindable(declared) => format!("request.form_field::<{owned}>({name:?}).await?"),
        _ => format!("request.form_model::<{owned}>().await?"),
    }
}

fn special_accessor(kind: SpecialKind, declared: &TypeRef, name: &str) -> String {
    if !declared.peel_references().is_option() {
        return required_special_accessor(kind, name);
    }
    match kind {
        // A missing optional upload binds `None` instead of failing.
        SpecialKind::FormFile => format!("request.form_file({name:?}).await.ok()"),
        SpecialKind::FormFileCollection => "request.form_files().await.ok()".to_string(),
        _ => format!("Some({})", required_special_accessor(kind, name)),
    }
}

fn required_special_accessor(kind: SpecialKind, name: &str) -> String {
    match kind {
        SpecialKind::Context => "request.context()".to_string(),
        SpecialKind::Cancellation => "request.cancellation()".to_string(),
        SpecialKind::RawStream => "request.body_stream()".to_string(),
        SpecialKind::FormFile => format!("request.form_file({name:?}).await?"),
        SpecialKind::FormFileCollection => "request.form_files().await?".to_string(),
    }
}

/// How a bound local is passed: by value, `&local` or `&mut local`.
pub fn pass_prefix(ty: &TypeRef) -> &'static str {
    match ty {
        TypeRef::Reference { mutable: true, .. } => "&mut ",
        TypeRef::Reference { .. } => "&",
        _ => "",
    }
}

/// Path of a group struct for use in a struct literal (generic arguments
/// dropped).
pub fn struct_path(ty: &TypeRef) -> String {
    match ty.peel_references() {
        TypeRef::Path { segments, .. } => segments.join("::"),
        other => other.to_string(),
    }
}

//! Return-type normalization.
//!
//! Accepted shapes, with `W` a configured result wrapper or `Result<T, Vec<E>>`:
//!
//! | declaration                                  | async |
//! |----------------------------------------------|-------|
//! | `fn f() -> W<T>`                             | no    |
//! | `async fn f() -> W<T>`                       | yes   |
//! | `fn f() -> impl Future<Output = W<T>>`       | yes   |
//! | `fn f() -> BoxFuture<'_, W<T>>`              | yes   |
//! | `fn f() -> Pin<Box<dyn Future<Output = W<T>>>>` | yes |
//!
//! Anything with a second async level is rejected.

use crate::core::TypeRef;

const BOXED_FUTURES: [&str; 2] = ["BoxFuture", "LocalBoxFuture"];

/// The success payload a handler produces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReturnShape {
    pub payload: TypeRef,
    pub is_async: bool,
}

impl ReturnShape {
    /// Canonical payload type name used in emitted metadata.
    pub fn payload_name(&self) -> String {
        self.payload.to_string()
    }
}

/// Normalize a handler's declared output. The error is a human-readable reason.
pub fn normalize_return(
    output: Option<&TypeRef>,
    is_async_fn: bool,
    wrappers: &[String],
) -> Result<ReturnShape, String> {
    let declared = output.ok_or_else(|| "handler has no return type".to_string())?;

    let (wrapped, is_async) = match future_output(declared) {
        Some(_) if is_async_fn => {
            return Err(format!("`async fn` returning `{declared}` has two async levels"));
        }
        Some(inner) => {
            if future_output(inner).is_some() {
                return Err(format!("`{declared}` has two async levels"));
            }
            (inner, true)
        }
        None => (declared, is_async_fn),
    };

    let payload = wrapper_payload(wrapped, wrappers).ok_or_else(|| {
        format!(
            "expected {} or Result<T, Vec<E>>, found `{wrapped}`",
            wrappers
                .iter()
                .map(|w| format!("{w}<T>"))
                .collect::<Vec<_>>()
                .join(", ")
        )
    })?;

    Ok(ReturnShape {
        payload: payload.clone(),
        is_async,
    })
}

/// If `ty` is one async wrapper, the type it resolves to.
fn future_output(ty: &TypeRef) -> Option<&TypeRef> {
    match ty {
        TypeRef::Trait {
            segments, output, ..
        } if segments.last().is_some_and(|s| s == "Future") => output.as_deref(),
        TypeRef::Path { args, .. } if BOXED_FUTURES.iter().any(|name| ty.is(name)) => args.last(),
        TypeRef::Path { args, .. } if ty.is("Pin") && args.len() == 1 => {
            let boxed = &args[0];
            if boxed.is("Box") && boxed.args().len() == 1 {
                future_output(&boxed.args()[0])
            } else {
                None
            }
        }
        _ => None,
    }
}

fn wrapper_payload<'a>(ty: &'a TypeRef, wrappers: &[String]) -> Option<&'a TypeRef> {
    let args = ty.args();
    if wrappers.iter().any(|w| ty.is(w)) && args.len() == 1 {
        return args.first();
    }
    if ty.is("Result") && args.len() == 2 && args[1].is("Vec") && args[1].args().len() == 1 {
        return args.first();
    }
    None
}

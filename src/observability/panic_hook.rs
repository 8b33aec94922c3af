//! Crash report printed when routegen panics.
//!
//! The report names the pipeline phase, file and handler the panicking
//! thread was working on, which is usually enough to reproduce with a
//! single source file.

use super::context::{current_context, progress, PipelineContext};
use std::panic::PanicHookInfo;
use tracing::Span;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const RULE: &str = "------------------------------------------------------------";

pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("{}", crash_report(info, &current_context(), progress()));
    }));
}

fn crash_report(info: &PanicHookInfo<'_>, context: &PipelineContext, progress: (usize, usize)) -> String {
    let mut lines = vec![
        RULE.to_string(),
        format!("routegen {VERSION} crashed ({})", std::env::consts::OS),
        RULE.to_string(),
        format!("panic:    {}", panic_message(info)),
    ];
    if let Some(location) = info.location() {
        lines.push(format!(
            "at:       {}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        ));
    }
    lines.extend(context_lines(context, progress));
    if let Some(metadata) = Span::current().metadata() {
        lines.push(format!("span:     {}", metadata.name()));
    }
    if std::env::var_os("RUST_BACKTRACE").is_some() {
        lines.push(format!("\n{}", std::backtrace::Backtrace::capture()));
    } else {
        lines.push("set RUST_BACKTRACE=1 for a backtrace".to_string());
    }
    lines.push(RULE.to_string());
    lines.join("\n")
}

fn context_lines(context: &PipelineContext, (done, total): (usize, usize)) -> Vec<String> {
    let mut lines = Vec::new();
    match context.phase {
        Some(phase) => lines.push(format!("phase:    {phase}")),
        None => lines.push("phase:    (before the pipeline started)".to_string()),
    }
    if let Some(file) = &context.current_file {
        lines.push(format!("file:     {file}"));
    }
    if let Some(handler) = &context.current_handler {
        lines.push(format!("handler:  {handler}"));
    }
    if total > 0 {
        lines.push(format!("progress: {done}/{total} handlers"));
    }
    lines
}

fn panic_message(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

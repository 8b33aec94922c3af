//! Stage results for the analysis pipeline.
//!
//! Each stage is a pure function from an owned input to an owned output plus
//! the diagnostics it raised. Diagnostics are returned, never pushed into a
//! shared collector, so stages can be rerun, skipped via the cache, or run in
//! parallel without coordination.

use crate::diagnostics::Diagnostic;

/// A value together with the diagnostics produced while computing it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StageOutput<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> StageOutput<T> {
    pub fn new(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self { value, diagnostics }
    }

    pub fn clean(value: T) -> Self {
        Self {
            value,
            diagnostics: Vec::new(),
        }
    }

    /// Split into value and diagnostics, appending the latter to `sink`.
    pub fn drain_into(self, sink: &mut Vec<Diagnostic>) -> T {
        sink.extend(self.diagnostics);
        self.value
    }
}

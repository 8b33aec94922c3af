//! Span bookkeeping for the syn front-end.
//!
//! With proc-macro2's `span-locations` feature every parsed file appends to a
//! thread-local SourceMap. Line numbers must be pulled out of the AST before
//! the map is reset, after which spans are meaningless. The extractor copies
//! every position it needs into `Location` values, so resetting after each
//! file is always safe for callers of this crate.

/// Reset the proc-macro2 SourceMap for the current thread.
///
/// Call only after all line/column data has been copied out of the AST.
#[inline]
pub fn reset_span_locations() {
    proc_macro2::extra::invalidate_current_thread_spans();
}

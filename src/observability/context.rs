//! Thread-local pipeline context for crash reports.
//!
//! Each thread records the phase, file and handler it is working on. Guards
//! restore the previous value on drop, so nesting (handler within file within
//! phase) unwinds correctly. Progress is global and atomic so rayon workers
//! can bump it.

use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

static ENTITIES_DONE: AtomicUsize = AtomicUsize::new(0);
static ENTITIES_TOTAL: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static CURRENT: RefCell<PipelineContext> = const { RefCell::new(PipelineContext::new()) };
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineContext {
    pub phase: Option<PipelinePhase>,
    pub current_file: Option<String>,
    pub current_handler: Option<String>,
}

impl PipelineContext {
    pub const fn new() -> Self {
        Self {
            phase: None,
            current_file: None,
            current_handler: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    FileDiscovery,
    Extraction,
    Analysis,
    DuplicateDetection,
    Emission,
    Output,
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FileDiscovery => "file_discovery",
            Self::Extraction => "extraction",
            Self::Analysis => "analysis",
            Self::DuplicateDetection => "duplicate_detection",
            Self::Emission => "emission",
            Self::Output => "output",
        };
        f.write_str(name)
    }
}

/// Restores the previous context when dropped.
#[must_use = "the context is restored as soon as the guard is dropped"]
pub struct ContextGuard {
    previous: PipelineContext,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = std::mem::take(&mut self.previous);
        CURRENT.with(|ctx| *ctx.borrow_mut() = previous);
    }
}

fn update(change: impl FnOnce(&mut PipelineContext)) -> ContextGuard {
    CURRENT.with(|ctx| {
        let previous = ctx.borrow().clone();
        change(&mut *ctx.borrow_mut());
        ContextGuard { previous }
    })
}

pub fn set_phase(phase: PipelinePhase) -> ContextGuard {
    update(|ctx| ctx.phase = Some(phase))
}

pub fn set_current_file(path: impl Into<String>) -> ContextGuard {
    let path = path.into();
    update(|ctx| ctx.current_file = Some(path))
}

pub fn set_current_handler(name: impl Into<String>) -> ContextGuard {
    let name = name.into();
    update(|ctx| ctx.current_handler = Some(name))
}

pub fn current_context() -> PipelineContext {
    CURRENT.with(|ctx| ctx.borrow().clone())
}

pub fn set_progress(done: usize, total: usize) {
    ENTITIES_DONE.store(done, Ordering::Relaxed);
    ENTITIES_TOTAL.store(total, Ordering::Relaxed);
}

pub fn increment_progress() {
    ENTITIES_DONE.fetch_add(1, Ordering::Relaxed);
}

pub fn progress() -> (usize, usize) {
    (
        ENTITIES_DONE.load(Ordering::Relaxed),
        ENTITIES_TOTAL.load(Ordering::Relaxed),
    )
}

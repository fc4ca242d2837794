//! Thread-local context tracking for crash reports.
//!
//! Records which extraction phase is running and which file or type
//! identifier is being processed. The extraction runs on a single
//! thread, so one thread-local context describes the whole run; RAII
//! guards restore the previous context on drop.

use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

static FILES_PROCESSED: AtomicUsize = AtomicUsize::new(0);
static FILES_TOTAL: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static CURRENT_CONTEXT: RefCell<ExtractionContext> = const { RefCell::new(ExtractionContext::new()) };
}

/// Snapshot of what the extractor was doing.
#[derive(Debug, Clone, Default)]
pub struct ExtractionContext {
    pub phase: Option<ExtractionPhase>,
    pub current_file: Option<PathBuf>,
    /// Type identifier being resolved, if any
    pub current_identifier: Option<String>,
}

impl ExtractionContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: None,
            current_file: None,
            current_identifier: None,
        }
    }
}

/// Stages of one extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPhase {
    /// Locating the hole and reading its type
    HoleContext,
    /// Following type definitions from the hole
    RelevantTypes,
    /// Deriving target types from the hole type
    TargetTypes,
    /// Scanning top-level declarations
    RelevantHeaders,
    /// Writing the result
    Output,
}

impl std::fmt::Display for ExtractionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HoleContext => write!(f, "hole_context"),
            Self::RelevantTypes => write!(f, "relevant_types"),
            Self::TargetTypes => write!(f, "target_types"),
            Self::RelevantHeaders => write!(f, "relevant_headers"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// RAII guard restoring the previous context on drop.
pub struct ContextGuard {
    previous: ExtractionContext,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CURRENT_CONTEXT.with(|ctx| {
            *ctx.borrow_mut() = self.previous.clone();
        });
    }
}

fn update(apply: impl FnOnce(&mut ExtractionContext)) -> ContextGuard {
    CURRENT_CONTEXT.with(|ctx| {
        let previous = ctx.borrow().clone();
        apply(&mut ctx.borrow_mut());
        ContextGuard { previous }
    })
}

/// Set the current phase. The previous phase is restored when the guard
/// drops.
///
/// ```ignore
/// let _phase = set_phase(ExtractionPhase::RelevantTypes);
/// ```
#[must_use]
pub fn set_phase(phase: ExtractionPhase) -> ContextGuard {
    update(|ctx| ctx.phase = Some(phase))
}

#[must_use]
pub fn set_current_file(path: impl Into<PathBuf>) -> ContextGuard {
    let path = path.into();
    update(|ctx| ctx.current_file = Some(path))
}

#[must_use]
pub fn set_current_identifier(name: impl Into<String>) -> ContextGuard {
    let name = name.into();
    update(|ctx| ctx.current_identifier = Some(name))
}

pub fn set_progress(processed: usize, total: usize) {
    FILES_PROCESSED.store(processed, Ordering::Relaxed);
    FILES_TOTAL.store(total, Ordering::Relaxed);
}

pub fn increment_processed() {
    FILES_PROCESSED.fetch_add(1, Ordering::Relaxed);
}

#[must_use]
pub fn get_current_context() -> ExtractionContext {
    CURRENT_CONTEXT.with(|ctx| ctx.borrow().clone())
}

/// Files scanned for headers so far, and the total.
#[must_use]
pub fn get_progress() -> (usize, usize) {
    (
        FILES_PROCESSED.load(Ordering::Relaxed),
        FILES_TOTAL.load(Ordering::Relaxed),
    )
}

pub fn reset_context() {
    CURRENT_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = ExtractionContext::new();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_guard_restores_previous() {
        reset_context();

        let _types = set_phase(ExtractionPhase::RelevantTypes);
        {
            let _headers = set_phase(ExtractionPhase::RelevantHeaders);
            assert_eq!(
                get_current_context().phase,
                Some(ExtractionPhase::RelevantHeaders)
            );
        }
        assert_eq!(
            get_current_context().phase,
            Some(ExtractionPhase::RelevantTypes),
            "Phase should be restored after the inner guard drops"
        );
    }

    #[test]
    fn test_nested_context_guards() {
        reset_context();

        let _phase = set_phase(ExtractionPhase::RelevantTypes);
        let _file = set_current_file("/p/prelude.ts");
        let _ident = set_current_identifier("Model");

        let ctx = get_current_context();
        assert_eq!(ctx.phase, Some(ExtractionPhase::RelevantTypes));
        assert_eq!(ctx.current_file, Some(PathBuf::from("/p/prelude.ts")));
        assert_eq!(ctx.current_identifier.as_deref(), Some("Model"));
    }

    #[test]
    fn test_progress_tracking() {
        set_progress(0, 4);
        increment_processed();
        increment_processed();
        let (processed, total) = get_progress();
        assert_eq!((processed, total), (2, 4));
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(ExtractionPhase::HoleContext.to_string(), "hole_context");
        assert_eq!(
            ExtractionPhase::RelevantHeaders.to_string(),
            "relevant_headers"
        );
    }

    #[test]
    fn test_empty_context_by_default() {
        reset_context();
        let ctx = get_current_context();
        assert!(ctx.phase.is_none());
        assert!(ctx.current_file.is_none());
        assert!(ctx.current_identifier.is_none());
    }
}

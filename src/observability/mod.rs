//! Observability infrastructure for crash reports and debugging.
//!
//! ## Features
//!
//! - **Panic Hook**: Produces a crash report naming the extraction phase
//! - **Context Tracking**: Thread-local phase, file and identifier
//!
//! ## Usage
//!
//! ```ignore
//! use context_extractor::observability::{install_panic_hook, set_phase, ExtractionPhase};
//!
//! install_panic_hook();
//! let _phase = set_phase(ExtractionPhase::RelevantTypes);
//! ```

pub mod context;
pub mod panic_hook;

pub use context::{
    get_current_context, get_progress, increment_processed, set_current_file,
    set_current_identifier, set_phase, set_progress, ContextGuard, ExtractionContext,
    ExtractionPhase,
};
pub use panic_hook::install_panic_hook;

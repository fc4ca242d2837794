//! Custom panic hook for crash reports.
//!
//! A crash report names the extraction phase, the file and the type
//! identifier being processed, so a failure can be reproduced against
//! the same sketch.

use super::context::{get_current_context, get_progress, ExtractionContext};
use std::panic::PanicHookInfo;
use tracing::Span;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const RULE: &str =
    "================================================================================";

/// Install the crash-report hook. Call early in `main`.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        print_crash_report(info);
    }));
}

fn print_crash_report(info: &PanicHookInfo<'_>) {
    let context = get_current_context();
    let (processed, total) = get_progress();

    eprintln!();
    eprintln!("{RULE}");
    eprintln!("CONTEXT-EXTRACTOR CRASH REPORT");
    eprintln!("  Version: {VERSION}");
    eprintln!("  Platform: {}", std::env::consts::OS);
    eprintln!("{RULE}");
    print_panic_details(info);
    print_context_section(&context, processed, total);
    print_backtrace_section();
}

fn print_panic_details(info: &PanicHookInfo<'_>) {
    eprintln!("  PANIC: {}", truncate(&extract_panic_message(info), 68));
    if let Some(location) = info.location() {
        eprintln!(
            "  Location: {}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        );
    }
}

fn print_context_section(context: &ExtractionContext, processed: usize, total: usize) {
    eprintln!("{RULE}");
    eprintln!("  OPERATION CONTEXT:");
    match &context.phase {
        Some(phase) => eprintln!("    Phase: {phase}"),
        None => eprintln!("    Phase: (not set - crash occurred before extraction started)"),
    }

    let current_span = Span::current();
    if let Some(metadata) = current_span.metadata() {
        eprintln!("    Span: {}", truncate(metadata.name(), 67));
    }
    if let Some(file) = &context.current_file {
        eprintln!("    File: {}", file.display());
    }
    if let Some(identifier) = &context.current_identifier {
        eprintln!("    Identifier: {}", truncate(identifier, 63));
    }
    if total > 0 {
        eprintln!("    Progress: {processed} / {total} files");
    }
}

fn print_backtrace_section() {
    eprintln!("{RULE}");
    if std::env::var("RUST_BACKTRACE").is_ok() {
        eprintln!("  STACK TRACE:");
        eprintln!("{}", std::backtrace::Backtrace::capture());
    } else {
        eprintln!("  Run with RUST_BACKTRACE=1 for stack trace");
    }
}

fn extract_panic_message(info: &PanicHookInfo<'_>) -> String {
    if let Some(s) = info.payload().downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

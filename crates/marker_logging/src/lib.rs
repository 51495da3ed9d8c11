#![deny(missing_docs)]
//! Shared logging utilities for the marker workspace.
//!
//! This crate provides the `marker_*` logging macros used across the codebase,
//! a per-thread context label (which tab or background instance is speaking)
//! and a minimal test initializer for the global logger.

use std::cell::RefCell;
use std::fmt;

#[doc(hidden)]
pub use log as __log;

thread_local! {
    /// Label of the browser context driving the current thread.
    static CONTEXT: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Sets the context label for the current thread, e.g. `"background"` or `"tab-17"`.
pub fn set_context(label: impl Into<String>) {
    let label = label.into();
    CONTEXT.with(|c| *c.borrow_mut() = Some(label));
}

/// Removes the context label of the current thread.
pub fn clear_context() {
    CONTEXT.with(|c| *c.borrow_mut() = None);
}

/// Returns a copy of the context label of the current thread, if one is set.
pub fn context() -> Option<String> {
    CONTEXT.with(|c| c.borrow().clone())
}

/// Renders the current context label as a `"[label] "` prefix, or nothing.
#[doc(hidden)]
pub struct ContextPrefix;

impl fmt::Display for ContextPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        CONTEXT.with(|c| match c.borrow().as_deref() {
            Some(label) => write!(f, "[{label}] "),
            None => Ok(()),
        })
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! marker_trace {
    ($($arg:tt)*) => {{
        $crate::__log::trace!("{}{}", $crate::ContextPrefix, format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! marker_debug {
    ($($arg:tt)*) => {{
        $crate::__log::debug!("{}{}", $crate::ContextPrefix, format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! marker_info {
    ($($arg:tt)*) => {{
        $crate::__log::info!("{}{}", $crate::ContextPrefix, format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! marker_warn {
    ($($arg:tt)*) => {{
        $crate::__log::warn!("{}{}", $crate::ContextPrefix, format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! marker_error {
    ($($arg:tt)*) => {{
        $crate::__log::error!("{}{}", $crate::ContextPrefix, format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Another test may already have installed a logger.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )]);
}

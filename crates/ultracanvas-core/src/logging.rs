//! Logging and debugging facilities for UltraCanvas.
//!
//! UltraCanvas uses the `tracing` crate for instrumentation. Nothing is
//! printed unless the application installs a subscriber:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("ultracanvas::dispatch=trace,ultracanvas::window=debug")
//!     .init();
//! ```
//!
//! Every subsystem logs on its own target (see [`targets`]) so filters can
//! be narrowed to, say, focus changes or popup registration only.
//!
//! [`TreeFormatter`] renders hierarchical debug dumps (the element tree uses
//! it) with ASCII, Unicode or compact branch glyphs.

use std::fmt::Write as FmtWrite;

/// Span names used throughout UltraCanvas for tracing.
pub mod span_names {
    /// One iteration of the application loop.
    pub const EVENT_LOOP: &str = "ultracanvas::event_loop";
    /// One window frame render.
    pub const FRAME: &str = "ultracanvas::frame";
    /// Dispatch of a single event.
    pub const DISPATCH: &str = "ultracanvas::dispatch";
    /// Timer processing.
    pub const TIMER: &str = "ultracanvas::timer";
}

/// Target names for log filtering.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "ultracanvas_core";
    /// Application loop target.
    pub const APPLICATION: &str = "ultracanvas::application";
    /// Window lifecycle target.
    pub const WINDOW: &str = "ultracanvas::window";
    /// Event dispatch target.
    pub const DISPATCH: &str = "ultracanvas::dispatch";
    /// Focus manager target.
    pub const FOCUS: &str = "ultracanvas::focus";
    /// Popup registry target.
    pub const POPUP: &str = "ultracanvas::popup";
    /// Tooltip manager target.
    pub const TOOLTIP: &str = "ultracanvas::tooltip";
    /// Render context target.
    pub const RENDER: &str = "ultracanvas::render";
    /// Platform adapter target.
    pub const PLATFORM: &str = "ultracanvas::platform";
    /// Timer system target.
    pub const TIMER: &str = "ultracanvas_core::timer";
    /// Signal system target.
    pub const SIGNAL: &str = "ultracanvas_core::signal";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact single-line representation.
    Compact,
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show numeric IDs.
    pub show_ids: bool,
    /// Whether to show geometry.
    pub show_bounds: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_bounds: true,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for minimal output (labels only).
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_bounds: false,
            ..Default::default()
        }
    }
}

/// Accumulates an indented tree dump line by line.
#[derive(Debug, Clone)]
pub struct TreeFormatter {
    options: TreeFormatOptions,
    output: String,
}

impl TreeFormatter {
    /// Create a formatter with the given options.
    pub fn new(options: TreeFormatOptions) -> Self {
        Self {
            options,
            output: String::new(),
        }
    }

    /// The options this formatter was created with.
    pub fn options(&self) -> &TreeFormatOptions {
        &self.options
    }

    /// Whether a node at `depth` should be emitted.
    pub fn within_depth(&self, depth: usize) -> bool {
        self.options.max_depth.is_none_or(|max| depth <= max)
    }

    /// Append one node line.
    pub fn push_node(&mut self, depth: usize, is_last: bool, label: &str) {
        let prefix = self.build_prefix(depth, is_last);
        // Writing into a String cannot fail.
        let _ = writeln!(self.output, "{prefix}{label}");
    }

    /// Finish and return the accumulated text.
    pub fn finish(self) -> String {
        self.output
    }

    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, corner, last) = match self.options.style {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500}", "\u{2514}\u{2500}\u{2500}"),
            TreeStyle::Compact => ("", "-", "-"),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            for _ in 0..self.options.indent_size {
                prefix.push(' ');
            }
        }
        prefix.push_str(if is_last { last } else { corner });
        prefix.push(' ');
        prefix
    }
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Used around frame rendering and dispatch to measure their duration.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create and enter a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "ultracanvas::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

/// Macros for common tracing patterns.
///
/// Thin wrappers around the `tracing` macros with the core target baked in.
#[macro_export]
macro_rules! uc_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "ultracanvas_core", $($arg)*)
    };
}

#[macro_export]
macro_rules! uc_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "ultracanvas_core", $($arg)*)
    };
}

#[macro_export]
macro_rules! uc_info {
    ($($arg:tt)*) => {
        tracing::info!(target: "ultracanvas_core", $($arg)*)
    };
}

#[macro_export]
macro_rules! uc_warn {
    ($($arg:tt)*) => {
        tracing::warn!(target: "ultracanvas_core", $($arg)*)
    };
}

#[macro_export]
macro_rules! uc_error {
    ($($arg:tt)*) => {
        tracing::error!(target: "ultracanvas_core", $($arg)*)
    };
}

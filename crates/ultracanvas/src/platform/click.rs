//! Double-click synthesis for backends that only report presses.

use crate::event::MouseButton;

/// Maximum time between presses, in milliseconds.
pub const DOUBLE_CLICK_INTERVAL_MS: u64 = 500;

/// Maximum travel between presses, in pixels on either axis.
pub const DOUBLE_CLICK_DISTANCE: i32 = 4;

#[derive(Debug, Clone, Copy)]
struct Press {
    button: MouseButton,
    x: i32,
    y: i32,
    timestamp: u64,
}

/// Recognizes the second press of a double click.
///
/// A third press after a double click starts a new sequence rather than
/// producing another double click.
#[derive(Debug, Clone, Default)]
pub struct ClickTracker {
    last: Option<Press>,
}

impl ClickTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press and report whether it completes a double click.
    pub fn press(&mut self, button: MouseButton, x: i32, y: i32, timestamp: u64) -> bool {
        let is_double = self.last.is_some_and(|p| {
            p.button == button
                && timestamp.saturating_sub(p.timestamp) <= DOUBLE_CLICK_INTERVAL_MS
                && (x - p.x).abs() <= DOUBLE_CLICK_DISTANCE
                && (y - p.y).abs() <= DOUBLE_CLICK_DISTANCE
        });
        self.last = if is_double {
            None
        } else {
            Some(Press {
                button,
                x,
                y,
                timestamp,
            })
        };
        is_double
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

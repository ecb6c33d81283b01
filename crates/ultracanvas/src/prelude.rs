//! Commonly used types, for glob import:
//!
//! ```
//! use ultracanvas::prelude::*;
//! ```

// ============================================================================
// Application and windows
// ============================================================================

pub use crate::window::{TextShaping, Window, WindowConfig, WindowState, WindowType};
pub use crate::{Application, ApplicationConfig};

// ============================================================================
// Elements and events
// ============================================================================

pub use crate::{
    Container, Element, ElementBase, ElementId, EventCx, EventKind, Layer, Modifiers, MouseButton, UcEvent,
    VirtualKey, WindowId,
};

// ============================================================================
// Signals
// ============================================================================

pub use ultracanvas_core::{ConnectionId, Signal};

// ============================================================================
// Drawing
// ============================================================================

pub use ultracanvas_render::{Color, IntPoint, IntRect, RenderContext, TextStyle};

//! UltraCanvas - a retained-mode desktop UI runtime.
//!
//! This is the umbrella crate: the element tree, event dispatch, focus,
//! popups, tooltips, windows and the application loop, with the core and
//! render crates re-exported.
//!
//! # Example
//!
//! ```no_run
//! use ultracanvas::render::{Color, IntRect};
//! use ultracanvas::{Application, Container, WindowConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut app = Application::initialize("hello")?;
//!     let id = app.create_window(WindowConfig::new("Hello").with_size(400, 300))?;
//!     if let Some(window) = app.window_mut(id) {
//!         let root = window.root();
//!         window.add_element(
//!             root,
//!             Container::new("panel", IntRect::new(20, 20, 200, 100)).with_background(Color::LIGHT_GRAY),
//!         )?;
//!     }
//!     app.run();
//!     Ok(())
//! }
//! ```

mod application;
mod context;
mod dispatch;
mod element;
mod event;
mod focus;
mod id;
mod popup;
mod tooltip;
mod tree;

pub mod platform;
pub mod prelude;
pub mod window;
pub mod zorder;

pub use ultracanvas_core::*;

/// Graphics rendering module.
pub mod render {
    pub use ultracanvas_render::*;
}

pub use application::{
    Application, ApplicationConfig, ApplicationProxy, GlobalEventHandler, TimerCallback,
};
pub use context::EventCx;
pub use dispatch::{DispatchResult, InputState, popup_area, target_at};
pub use element::{Container, Element, ElementBase};
pub use event::{EventKind, Modifiers, MouseButton, UcEvent, VirtualKey};
pub use focus::{FocusManager, FocusReason};
pub use id::{ElementId, WindowId};
pub use popup::PopupRegistry;
pub use tooltip::{TooltipManager, TooltipState, TooltipStyle};
pub use tree::{ElementTree, TreeError};
pub use window::{Window, WindowConfig, WindowError, WindowState, WindowType};
pub use zorder::Layer;

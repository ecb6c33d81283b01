//! The platform contract.
//!
//! Windows talk to the OS through two traits. A [`Platform`] creates native
//! windows and pumps OS events, already normalized to [`UcEvent`]s with
//! window-local coordinates, virtual keys and the modifier mask. A
//! [`NativeWindow`] receives geometry and state changes and presents
//! finished frames.
//!
//! Two platforms ship with the crate:
//!
//! - [`HeadlessPlatform`] keeps everything in memory. Tests inject events
//!   through a [`HeadlessHandle`] and inspect the calls windows made.
//! - `WinitPlatform` (feature `winit-backend`) drives real windows through
//!   winit and presents frames with softbuffer.

mod click;
mod headless;
#[cfg(all(feature = "winit-backend", any(target_os = "windows", target_os = "macos", target_os = "linux")))]
mod winit;

use std::time::Duration;

use cursor_icon::CursorIcon;
use ultracanvas_core::CoreError;
use ultracanvas_render::PixelBuffer;

use crate::event::UcEvent;
use crate::id::WindowId;
use crate::window::WindowConfig;

pub use click::{ClickTracker, DOUBLE_CLICK_DISTANCE, DOUBLE_CLICK_INTERVAL_MS};
pub use headless::{HeadlessHandle, HeadlessPlatform, HeadlessWindow, NativeCall};
#[cfg(all(feature = "winit-backend", any(target_os = "windows", target_os = "macos", target_os = "linux")))]
pub use self::winit::WinitPlatform;

/// An OS window as seen by the toolkit.
///
/// Sizes and positions are in pixels. Methods that change geometry
/// are requests; the platform reports the outcome back as window events.
pub trait NativeWindow {
    fn id(&self) -> WindowId;

    fn set_title(&mut self, title: &str);

    fn set_visible(&mut self, visible: bool);

    fn set_position(&mut self, x: i32, y: i32);

    fn set_size(&mut self, width: i32, height: i32);

    /// `-1` means no limit.
    fn set_size_limits(&mut self, min: (i32, i32), max: (i32, i32));

    fn set_resizable(&mut self, resizable: bool);

    fn set_minimized(&mut self, minimized: bool);

    fn set_maximized(&mut self, maximized: bool);

    fn set_fullscreen(&mut self, fullscreen: bool);

    fn set_cursor(&mut self, cursor: CursorIcon);

    /// Ask the OS for a repaint opportunity.
    fn request_redraw(&mut self);

    /// Copy a finished frame to the screen.
    fn present(&mut self, frame: &PixelBuffer) -> Result<(), CoreError>;

    /// Tear down the native resources.
    fn close(&mut self);
}

/// Creates native windows and produces their events.
pub trait Platform {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn create_window(&mut self, id: WindowId, config: &WindowConfig) -> Result<Box<dyn NativeWindow>, CoreError>;

    /// Wait up to `timeout` for OS events and return them in arrival order.
    /// `None` blocks until something arrives; a zero timeout only polls.
    fn poll_events(&mut self, timeout: Option<Duration>) -> Vec<UcEvent>;
}

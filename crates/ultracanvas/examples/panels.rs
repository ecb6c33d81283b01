//! Opens a window with a few nested panels and a tooltip.
//!
//! Run with `RUST_LOG=ultracanvas=debug` to watch dispatch and focus.

use ultracanvas::prelude::*;
use ultracanvas::render::Color;
use tracing_subscriber::EnvFilter;

/// A panel that shows a tooltip while hovered and takes focus on click.
#[derive(Debug)]
struct Panel {
    base: ElementBase,
    color: Color,
    tip: &'static str,
}

impl Panel {
    fn new(id: &str, bounds: IntRect, color: Color, tip: &'static str) -> Self {
        Self {
            base: ElementBase::new(id, bounds).focusable(),
            color,
            tip,
        }
    }
}

impl Element for Panel {
    fn base(&self) -> &ElementBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ElementBase {
        &mut self.base
    }

    fn type_name(&self) -> &'static str {
        "Panel"
    }

    fn render(&self, ctx: &mut dyn RenderContext) {
        let b = self.base.bounds();
        ctx.push_state();
        ctx.set_fill_color(self.color);
        ctx.fill_rounded_rectangle(0.0, 0.0, b.width as f32, b.height as f32, 6.0);
        if self.base.is_focused() {
            ctx.set_stroke_color(Color::WHITE);
            ctx.draw_rounded_rectangle(1.0, 1.0, b.width as f32 - 2.0, b.height as f32 - 2.0, 6.0);
        }
        ctx.pop_state();
    }

    fn on_event(&mut self, cx: &mut EventCx<'_>, event: &UcEvent) -> bool {
        match event.kind {
            EventKind::MouseEnter => {
                cx.show_tooltip(self.tip, event.position());
                true
            }
            EventKind::MouseLeave => {
                cx.hide_tooltip();
                true
            }
            EventKind::MouseDown => {
                cx.request_focus();
                true
            }
            EventKind::FocusGained | EventKind::FocusLost => {
                cx.request_redraw();
                true
            }
            EventKind::KeyDown if event.virtual_key == VirtualKey::Escape => {
                cx.close_window();
                true
            }
            _ => false,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut app = Application::initialize("panels")?;
    let id = app.create_window(
        WindowConfig::new("Panels")
            .with_size(480, 320)
            .with_min_size(240, 160)
            .with_background(Color::DARK_GRAY),
    )?;
    let Some(window) = app.window_mut(id) else {
        return Ok(());
    };
    let root = window.root();
    let group = window.add_element(root, Container::new("group", IntRect::new(20, 20, 440, 280)).with_clip())?;
    window.add_element(group, Panel::new("red", IntRect::new(20, 20, 180, 120), Color::RED, "Red panel"))?;
    window.add_element(group, Panel::new("blue", IntRect::new(120, 90, 180, 120), Color::BLUE, "Blue panel"))?;
    window.add_element(group, Panel::new("green", IntRect::new(240, 140, 180, 120), Color::GREEN, "Green panel"))?;

    println!("Tab cycles focus, Escape closes the window.");
    app.run();
    Ok(())
}

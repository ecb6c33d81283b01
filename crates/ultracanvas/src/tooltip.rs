//! Delayed tooltips.
//!
//! Each window owns one [`TooltipManager`]. Hovering elements ask for a
//! tooltip through their event context; the manager shows it after the
//! style's show delay and hides it after the hide delay, and the window
//! drives the timers from [`TooltipManager::update`].
//!
//! ```text
//!            show                 delay elapsed
//!   Idle ------------> PendingShow -------------> Visible
//!    ^                    |  hide                  |    ^
//!    |<-------------------+                  hide  |    | show
//!    |                                             v    |
//!    +------------------------------------------ PendingHide
//!                  delay elapsed
//! ```

use std::time::Duration;

use ultracanvas_core::logging::targets;
use ultracanvas_render::{BoxShadow, Color, FontSlant, FontWeight, IntPoint, IntRect, RenderContext, TextStyle};

/// Tooltip visibility state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TooltipState {
    #[default]
    Idle,
    /// Waiting for the show delay.
    PendingShow,
    Visible,
    /// Still drawn, waiting for the hide delay.
    PendingHide,
}

/// Appearance and timing of a window's tooltips.
#[derive(Debug, Clone)]
pub struct TooltipStyle {
    pub show_delay: Duration,
    pub hide_delay: Duration,
    /// Text wraps beyond this width, padding included.
    pub max_width: i32,
    pub padding: i32,
    pub font_family: String,
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub text_color: Color,
    pub background: Color,
    pub border_color: Color,
    pub border_width: f32,
    pub corner_radius: f32,
    pub shadow: Option<BoxShadow>,
    /// Offset from the pointer to the tooltip's top-left corner.
    pub cursor_offset: IntPoint,
}

impl Default for TooltipStyle {
    fn default() -> Self {
        Self {
            show_delay: Duration::from_millis(800),
            hide_delay: Duration::from_millis(500),
            max_width: 300,
            padding: 6,
            font_family: "Sans".into(),
            font_size: 11.0,
            font_weight: FontWeight::NORMAL,
            text_color: Color::from_rgb8(0x20, 0x20, 0x20),
            background: Color::from_rgb8(0xff, 0xff, 0xe1),
            border_color: Color::from_rgb8(0x76, 0x76, 0x76),
            border_width: 1.0,
            corner_radius: 3.0,
            shadow: Some(BoxShadow::default()),
            cursor_offset: IntPoint::new(12, 18),
        }
    }
}

impl TooltipStyle {
    pub fn with_delays(mut self, show: Duration, hide: Duration) -> Self {
        self.show_delay = show;
        self.hide_delay = hide;
        self
    }

    pub fn with_colors(mut self, text: Color, background: Color, border: Color) -> Self {
        self.text_color = text;
        self.background = background;
        self.border_color = border;
        self
    }

    pub fn with_font(mut self, family: impl Into<String>, size: f32) -> Self {
        self.font_family = family.into();
        self.font_size = size;
        self
    }

    pub fn with_max_width(mut self, max_width: i32) -> Self {
        self.max_width = max_width;
        self
    }

    pub fn with_padding(mut self, padding: i32) -> Self {
        self.padding = padding.max(0);
        self
    }

    pub fn with_shadow(mut self, shadow: Option<BoxShadow>) -> Self {
        self.shadow = shadow;
        self
    }

    fn text_style(&self) -> TextStyle {
        TextStyle::new(self.font_family.clone(), self.font_size).with_weight(self.font_weight)
    }
}

/// Tooltip state machine for one window.
#[derive(Debug, Default)]
pub struct TooltipManager {
    style: TooltipStyle,
    state: TooltipState,
    text: String,
    /// Pointer position in window coordinates.
    anchor: IntPoint,
    deadline: Option<Duration>,
}

impl TooltipManager {
    pub fn new(style: TooltipStyle) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    pub fn style(&self) -> &TooltipStyle {
        &self.style
    }

    pub fn set_style(&mut self, style: TooltipStyle) {
        self.style = style;
    }

    pub fn state(&self) -> TooltipState {
        self.state
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn anchor(&self) -> IntPoint {
        self.anchor
    }

    /// Whether the tooltip is on screen.
    pub fn is_drawn(&self) -> bool {
        matches!(self.state, TooltipState::Visible | TooltipState::PendingHide)
    }

    /// When the next transition is due.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Ask for `text` at `anchor`, shown after the show delay.
    ///
    /// While pending, a different text restarts the delay. A visible
    /// tooltip is updated in place and a pending hide is cancelled.
    /// Returns whether the drawn tooltip changed.
    pub fn update_and_show(&mut self, text: impl Into<String>, anchor: IntPoint, now: Duration) -> bool {
        let text = text.into();
        match self.state {
            TooltipState::Idle => {
                self.text = text;
                self.anchor = anchor;
                if self.style.show_delay.is_zero() {
                    return self.enter(TooltipState::Visible, None);
                }
                self.enter(TooltipState::PendingShow, Some(now + self.style.show_delay))
            }
            TooltipState::PendingShow => {
                if self.text != text {
                    self.deadline = Some(now + self.style.show_delay);
                }
                self.text = text;
                self.anchor = anchor;
                false
            }
            TooltipState::Visible | TooltipState::PendingHide => {
                let changed = self.text != text || self.anchor != anchor;
                self.text = text;
                self.anchor = anchor;
                self.enter(TooltipState::Visible, None) || changed
            }
        }
    }

    /// Show right away, skipping the delay.
    pub fn show_immediately(&mut self, text: impl Into<String>, anchor: IntPoint) -> bool {
        let text = text.into();
        let changed = !self.is_drawn() || self.text != text || self.anchor != anchor;
        self.text = text;
        self.anchor = anchor;
        self.enter(TooltipState::Visible, None);
        changed
    }

    /// Start hiding. A tooltip that never appeared is dropped at once.
    pub fn hide(&mut self, now: Duration) -> bool {
        match self.state {
            TooltipState::PendingShow => self.enter(TooltipState::Idle, None),
            TooltipState::Visible if self.style.hide_delay.is_zero() => self.enter(TooltipState::Idle, None),
            TooltipState::Visible => self.enter(TooltipState::PendingHide, Some(now + self.style.hide_delay)),
            TooltipState::Idle | TooltipState::PendingHide => false,
        }
    }

    pub fn hide_immediately(&mut self) -> bool {
        let was_drawn = self.is_drawn();
        self.enter(TooltipState::Idle, None);
        was_drawn
    }

    /// Fire due transitions. Returns whether the drawn tooltip changed.
    pub fn update(&mut self, now: Duration) -> bool {
        let Some(deadline) = self.deadline else {
            return false;
        };
        if now < deadline {
            return false;
        }
        match self.state {
            TooltipState::PendingShow => self.enter(TooltipState::Visible, None),
            TooltipState::PendingHide => self.enter(TooltipState::Idle, None),
            _ => {
                self.deadline = None;
                false
            }
        }
    }

    /// Returns whether the drawn tooltip changed.
    fn enter(&mut self, state: TooltipState, deadline: Option<Duration>) -> bool {
        let was_drawn = self.is_drawn();
        if self.state != state {
            tracing::trace!(target: targets::TOOLTIP, from = ?self.state, to = ?state, "tooltip state changed");
        }
        self.state = state;
        self.deadline = deadline;
        if state == TooltipState::Idle {
            self.text.clear();
        }
        was_drawn != self.is_drawn()
    }

    /// Box of the tooltip in window coordinates.
    ///
    /// Placed at the pointer plus the cursor offset, flipped to the other
    /// side of the pointer when it would leave the window, then clamped.
    pub fn layout(&self, ctx: &mut dyn RenderContext, window: IntRect) -> Option<IntRect> {
        if !self.is_drawn() || self.text.is_empty() {
            return None;
        }
        let padding = self.style.padding;
        ctx.push_state();
        ctx.set_text_style(self.style.text_style());
        let (tw, th) = ctx.text_dimensions(&self.text, (self.style.max_width - 2 * padding) as f32, 0.0);
        ctx.pop_state();

        let width = tw.ceil() as i32 + 2 * padding;
        let height = th.ceil() as i32 + 2 * padding;
        let offset = self.style.cursor_offset;

        let mut x = self.anchor.x + offset.x;
        let mut y = self.anchor.y + offset.y;
        if x + width > window.right() {
            x = self.anchor.x - offset.x - width;
        }
        if y + height > window.bottom() {
            y = self.anchor.y - offset.y - height;
        }
        x = x.min(window.right() - width).max(window.x);
        y = y.min(window.bottom() - height).max(window.y);
        Some(IntRect::new(x, y, width, height))
    }

    /// Draw the tooltip, if drawn, on top of everything.
    pub fn render(&self, ctx: &mut dyn RenderContext, window: IntRect) {
        let Some(rect) = self.layout(ctx, window) else {
            return;
        };
        let style = &self.style;
        let (x, y, w, h) = (rect.x as f32, rect.y as f32, rect.width as f32, rect.height as f32);

        ctx.push_state();
        if let Some(shadow) = style.shadow {
            let layers = shadow.blur.ceil().max(1.0) as i32;
            for i in 0..layers {
                let spread = (layers - i) as f32;
                ctx.set_fill_color(shadow.color.scale_alpha(1.0 / layers as f32));
                ctx.fill_rounded_rectangle(
                    x + shadow.offset_x - spread + 1.0,
                    y + shadow.offset_y - spread + 1.0,
                    w + 2.0 * spread - 2.0,
                    h + 2.0 * spread - 2.0,
                    style.corner_radius + spread,
                );
            }
        }

        ctx.set_fill_color(style.background);
        ctx.fill_rounded_rectangle(x, y, w, h, style.corner_radius);
        if style.border_width > 0.0 {
            ctx.set_stroke_color(style.border_color);
            ctx.set_line_width(style.border_width);
            ctx.draw_rounded_rectangle(x + 0.5, y + 0.5, w - 1.0, h - 1.0, style.corner_radius);
        }

        let pad = style.padding as f32;
        ctx.set_font_face(&style.font_family, style.font_weight, FontSlant::Normal);
        ctx.set_font_size(style.font_size);
        ctx.set_text_color(style.text_color);
        ctx.draw_text_in_rect(&self.text, x + pad, y + pad, w - 2.0 * pad, h - 2.0 * pad);
        ctx.pop_state();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use ultracanvas_render::{DrawCommand, FixedAdvanceShaper, SoftwareContext};

    fn secs(s: f32) -> Duration {
        Duration::from_secs_f32(s)
    }

    fn manager() -> TooltipManager {
        TooltipManager::new(TooltipStyle::default().with_delays(secs(0.8), secs(0.5)))
    }

    #[test]
    fn test_show_after_delay_then_hide_after_delay() {
        let mut tips = manager();
        assert!(!tips.update_and_show("Hello", IntPoint::new(10, 10), secs(0.0)));
        assert_eq!(tips.state(), TooltipState::PendingShow);
        assert!(!tips.update(secs(0.5)));
        assert!(tips.update(secs(0.85)));
        assert_eq!(tips.state(), TooltipState::Visible);

        assert!(!tips.hide(secs(1.0)));
        assert_eq!(tips.state(), TooltipState::PendingHide);
        assert!(tips.is_drawn());
        assert!(!tips.update(secs(1.3)));
        assert!(tips.update(secs(1.6)));
        assert_eq!(tips.state(), TooltipState::Idle);
        assert_eq!(tips.next_deadline(), None);
    }

    #[test]
    fn test_hide_while_pending_never_shows() {
        let mut tips = manager();
        tips.update_and_show("Hello", IntPoint::ZERO, secs(0.0));
        tips.hide(secs(0.3));
        assert_eq!(tips.state(), TooltipState::Idle);
        assert!(!tips.update(secs(2.0)));
        assert!(!tips.is_drawn());
    }

    #[test]
    fn test_show_cancels_pending_hide() {
        let mut tips = manager();
        tips.show_immediately("A", IntPoint::ZERO);
        tips.hide(secs(0.0));
        tips.update_and_show("A", IntPoint::ZERO, secs(0.2));
        assert_eq!(tips.state(), TooltipState::Visible);
        assert!(!tips.update(secs(5.0)));
        assert_eq!(tips.state(), TooltipState::Visible);
    }

    #[test]
    fn test_zero_delays() {
        let mut tips = TooltipManager::new(TooltipStyle::default().with_delays(Duration::ZERO, Duration::ZERO));
        assert!(tips.update_and_show("A", IntPoint::ZERO, secs(0.0)));
        assert_eq!(tips.state(), TooltipState::Visible);
        assert!(tips.hide(secs(0.0)));
        assert_eq!(tips.state(), TooltipState::Idle);
    }

    #[test]
    fn test_new_text_restarts_pending_delay() {
        let mut tips = manager();
        tips.update_and_show("A", IntPoint::ZERO, secs(0.0));
        tips.update_and_show("B", IntPoint::ZERO, secs(0.5));
        assert!(!tips.update(secs(1.0)));
        assert!(tips.update(secs(1.3)));
        assert_eq!(tips.text(), "B");
    }

    #[test]
    fn test_layout_flips_at_window_edge() {
        let mut ctx = SoftwareContext::with_shaper(200, 100, Arc::new(FixedAdvanceShaper::default())).unwrap();
        let window = IntRect::new(0, 0, 200, 100);
        let mut tips = manager();
        tips.show_immediately("tip", IntPoint::new(10, 10));
        let rect = tips.layout(&mut ctx, window).unwrap();
        assert_eq!(rect.origin(), IntPoint::new(22, 28));

        tips.show_immediately("tip", IntPoint::new(195, 95));
        let rect = tips.layout(&mut ctx, window).unwrap();
        assert!(rect.right() <= 195 - 12);
        assert!(rect.bottom() <= 95 - 18);
        assert!(rect.x >= 0 && rect.y >= 0);
    }

    #[test]
    fn test_render_draws_text_and_balances_state() {
        let mut ctx = SoftwareContext::with_shaper(200, 100, Arc::new(FixedAdvanceShaper::default())).unwrap();
        let mut tips = manager();
        tips.show_immediately("Hello", IntPoint::new(10, 10));
        ctx.begin_frame();
        let depth = ctx.state_depth();
        tips.render(&mut ctx, IntRect::new(0, 0, 200, 100));
        assert_eq!(ctx.state_depth(), depth);
        assert!(
            ctx.recorded_commands()
                .iter()
                .any(|c| matches!(c, DrawCommand::Text { text, .. } if text == "Hello"))
        );
    }
}

//! The render state and its save/restore stack.

use std::sync::Arc;

use crate::paint::{DashPattern, Paint, StrokeStyle};
use crate::text::TextStyle;
use crate::transform::Transform2D;
use crate::types::{Color, IntRect, Rect};

/// Per-pixel clip coverage over a device-space rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipMask {
    bounds: IntRect,
    coverage: Vec<u8>,
}

impl ClipMask {
    /// An empty (fully clipped) mask over `bounds`.
    pub fn new(bounds: IntRect) -> Self {
        let len = bounds.width.max(0) as usize * bounds.height.max(0) as usize;
        Self {
            bounds,
            coverage: vec![0; len],
        }
    }

    pub fn bounds(&self) -> IntRect {
        self.bounds
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        self.bounds.contains(crate::types::IntPoint::new(x, y)).then(|| {
            (y - self.bounds.y) as usize * self.bounds.width as usize + (x - self.bounds.x) as usize
        })
    }

    /// Coverage in 0..=1; zero outside the mask bounds.
    pub fn coverage(&self, x: i32, y: i32) -> f32 {
        self.index(x, y)
            .map(|i| self.coverage[i] as f32 / 255.0)
            .unwrap_or(0.0)
    }

    /// Accumulate coverage at a pixel, saturating.
    pub fn add(&mut self, x: i32, y: i32, amount: f32) {
        if let Some(i) = self.index(x, y) {
            let v = self.coverage[i] as f32 + amount.clamp(0.0, 1.0) * 255.0;
            self.coverage[i] = v.min(255.0).round() as u8;
        }
    }

    /// Multiply by another mask.
    pub fn intersect(&mut self, other: &ClipMask) {
        let b = self.bounds;
        for y in b.y..b.bottom() {
            for x in b.x..b.right() {
                if let Some(i) = self.index(x, y) {
                    let v = self.coverage[i] as f32 * other.coverage(x, y);
                    self.coverage[i] = v.round() as u8;
                }
            }
        }
    }
}

/// Everything [`RenderStateStack::save`] captures.
#[derive(Debug, Clone)]
pub struct RenderState {
    pub transform: Transform2D,
    /// Device-space clip bounds; `None` means unclipped.
    pub clip: Option<Rect>,
    /// Optional non-rectangular coverage within `clip`.
    pub clip_mask: Option<Arc<ClipMask>>,
    pub fill_paint: Paint,
    pub stroke_paint: Paint,
    pub text_paint: Paint,
    pub text_style: TextStyle,
    pub alpha: f32,
    pub stroke: StrokeStyle,
    pub dash: Option<DashPattern>,
    pub text_is_markup: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            transform: Transform2D::IDENTITY,
            clip: None,
            clip_mask: None,
            fill_paint: Paint::Solid(Color::BLACK),
            stroke_paint: Paint::Solid(Color::BLACK),
            text_paint: Paint::Solid(Color::BLACK),
            text_style: TextStyle::default(),
            alpha: 1.0,
            stroke: StrokeStyle::default(),
            dash: None,
            text_is_markup: false,
        }
    }
}

impl RenderState {
    /// Clip coverage at a device pixel center.
    pub fn clip_coverage(&self, x: i32, y: i32) -> f32 {
        if let Some(clip) = self.clip {
            let (cx, cy) = (x as f32 + 0.5, y as f32 + 0.5);
            if cx < clip.left() || cx >= clip.right() || cy < clip.top() || cy >= clip.bottom() {
                return 0.0;
            }
        }
        match &self.clip_mask {
            Some(mask) => mask.coverage(x, y),
            None => 1.0,
        }
    }

    /// Compare the parts of the state a balanced draw routine must preserve.
    pub fn same_as(&self, other: &RenderState) -> bool {
        self.transform == other.transform
            && self.clip == other.clip
            && self.clip_mask == other.clip_mask
            && self.fill_paint == other.fill_paint
            && self.stroke_paint == other.stroke_paint
            && self.text_paint == other.text_paint
            && self.text_style == other.text_style
            && self.alpha == other.alpha
            && self.stroke == other.stroke
            && self.dash == other.dash
    }
}

/// LIFO stack of render states.
#[derive(Debug, Clone, Default)]
pub struct RenderStateStack {
    stack: Vec<RenderState>,
    current: RenderState,
}

impl RenderStateStack {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn current(&self) -> &RenderState {
        &self.current
    }

    #[inline]
    pub fn current_mut(&mut self) -> &mut RenderState {
        &mut self.current
    }

    pub fn save(&mut self) {
        self.stack.push(self.current.clone());
    }

    /// Pop the last saved state. Returns `false` when nothing was saved.
    pub fn restore(&mut self) -> bool {
        match self.stack.pop() {
            Some(state) => {
                self.current = state;
                true
            }
            None => false,
        }
    }

    /// Drop every saved state and return to defaults.
    ///
    /// Pattern handles held by the stack are released.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.current = RenderState::default();
    }

    /// Pop until `depth` states remain saved.
    pub fn restore_to_depth(&mut self, depth: usize) {
        while self.stack.len() > depth {
            self.restore();
        }
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn translate(&mut self, tx: f32, ty: f32) {
        self.current.transform = self.current.transform.translated(tx, ty);
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.current.transform = self.current.transform.scaled_xy(sx, sy);
    }

    pub fn rotate(&mut self, angle: f32) {
        self.current.transform = self.current.transform.rotated(angle);
    }

    /// Post-concatenate in user space.
    pub fn concat(&mut self, t: &Transform2D) {
        self.current.transform = self.current.transform.then(t);
    }

    pub fn set_transform(&mut self, t: Transform2D) {
        self.current.transform = t;
    }

    /// Intersect the clip with a user-space rectangle.
    pub fn clip_rect(&mut self, rect: Rect) {
        let device = self.current.transform.transform_rect(&rect);
        self.current.clip = Some(match self.current.clip {
            Some(existing) => existing.intersect(&device).unwrap_or(Rect::ZERO),
            None => device,
        });
    }

    /// Replace the whole clip with a user-space rectangle.
    pub fn set_clip_rect(&mut self, rect: Rect) {
        self.current.clip = Some(self.current.transform.transform_rect(&rect));
        self.current.clip_mask = None;
    }

    pub fn clear_clip(&mut self) {
        self.current.clip = None;
        self.current.clip_mask = None;
    }

    #[inline]
    pub fn clip_bounds(&self) -> Option<Rect> {
        self.current.clip
    }
}

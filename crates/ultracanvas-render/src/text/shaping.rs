//! Text shaping backends.
//!
//! A [`TextShaper`] measures single-line runs and rasterizes them into
//! coverage values. Line breaking and alignment live in
//! [`layout`](super::layout), on top of whichever shaper a context uses.

use std::fmt;

use unicode_segmentation::UnicodeSegmentation;

use super::types::FontSpec;

/// Vertical metrics for one line of a font.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMetrics {
    /// Distance from the line top to the baseline.
    pub ascent: f32,
    pub descent: f32,
    pub line_height: f32,
}

/// Measures and rasterizes single-line text runs.
pub trait TextShaper: Send + Sync + fmt::Debug {
    /// Advance width of `text` laid out on one line.
    fn advance(&self, text: &str, font: &FontSpec) -> f32;

    /// Vertical metrics, with `line_height` already applied.
    fn metrics(&self, font: &FontSpec, line_height: f32) -> LineMetrics;

    /// Rasterize `text` with its line box at the origin.
    ///
    /// `sink` receives pixel coordinates relative to the line's top-left
    /// corner and a coverage value in 0..=1.
    fn rasterize(
        &self,
        text: &str,
        font: &FontSpec,
        line_height: f32,
        sink: &mut dyn FnMut(i32, i32, f32),
    );
}

/// Deterministic metrics with box glyphs.
///
/// Every grapheme advances by `0.6 * size`, lines are `line_height * size`
/// tall, and visible graphemes draw as solid boxes. Used headless and in tests
/// where layout must not depend on installed fonts.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedAdvanceShaper;

impl FixedAdvanceShaper {
    pub const ADVANCE_RATIO: f32 = 0.6;

    pub fn glyph_advance(font: &FontSpec) -> f32 {
        font.size * Self::ADVANCE_RATIO
    }
}

impl TextShaper for FixedAdvanceShaper {
    fn advance(&self, text: &str, font: &FontSpec) -> f32 {
        text.graphemes(true).filter(|g| *g != "\n").count() as f32 * Self::glyph_advance(font)
    }

    fn metrics(&self, font: &FontSpec, line_height: f32) -> LineMetrics {
        let height = font.size * line_height;
        let ascent = font.size * 0.8 + (height - font.size) / 2.0;
        LineMetrics {
            ascent,
            descent: height - ascent,
            line_height: height,
        }
    }

    fn rasterize(
        &self,
        text: &str,
        font: &FontSpec,
        line_height: f32,
        sink: &mut dyn FnMut(i32, i32, f32),
    ) {
        let advance = Self::glyph_advance(font);
        let m = self.metrics(font, line_height);
        let top = (m.ascent - font.size * 0.7).round() as i32;
        let bottom = m.ascent.round() as i32;
        let mut x = 0.0f32;
        for g in text.graphemes(true) {
            if !g.chars().all(char::is_whitespace) {
                let left = (x + advance * 0.1).round() as i32;
                let right = (x + advance * 0.9).round() as i32;
                for py in top..bottom {
                    for px in left..right {
                        sink(px, py, 1.0);
                    }
                }
            }
            x += advance;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::types::FontFace;

    fn font() -> FontSpec {
        FontSpec::new(FontFace::default(), 10.0)
    }

    #[test]
    fn test_fixed_advance() {
        let shaper = FixedAdvanceShaper;
        assert_eq!(shaper.advance("hello", &font()), 30.0);
        assert_eq!(shaper.advance("", &font()), 0.0);
        // One grapheme even with a combining mark.
        assert_eq!(shaper.advance("e\u{301}", &font()), 6.0);
    }

    #[test]
    fn test_fixed_metrics() {
        let m = FixedAdvanceShaper.metrics(&font(), 1.2);
        assert_eq!(m.line_height, 12.0);
        assert!((m.ascent + m.descent - 12.0).abs() < 1e-4);
    }

    #[test]
    fn test_rasterize_skips_spaces() {
        let mut hits = 0;
        FixedAdvanceShaper.rasterize(" ", &font(), 1.2, &mut |_, _, _| hits += 1);
        assert_eq!(hits, 0);
        FixedAdvanceShaper.rasterize("a", &font(), 1.2, &mut |_, _, _| hits += 1);
        assert!(hits > 0);
    }
}

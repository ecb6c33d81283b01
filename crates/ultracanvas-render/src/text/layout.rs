//! Line breaking, alignment and hit-testing for styled text.

use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;

use super::markup::StyledText;
use super::shaping::TextShaper;
use super::types::{FontSpec, TextAlignment, TextStyle, VerticalAlignment};

/// One laid-out line.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutLine {
    /// Byte range into the source text, without the trailing break.
    pub range: Range<usize>,
    /// Advance width, excluding trailing whitespace.
    pub width: f32,
    /// Horizontal offset from alignment.
    pub x: f32,
    /// Top of the line box.
    pub top: f32,
    pub height: f32,
}

/// A block of text broken into lines.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextLayout {
    lines: Vec<LayoutLine>,
    width: f32,
    height: f32,
}

/// Width of `range` of `styled`, honouring inline styles.
pub fn measure_range(
    shaper: &dyn TextShaper,
    styled: &StyledText,
    style: &TextStyle,
    range: Range<usize>,
) -> f32 {
    styled
        .spans_in(range)
        .map(|span| {
            let font = FontSpec::new(span.style.apply(&style.face), style.size);
            shaper.advance(&styled.text[span.range], &font)
        })
        .sum()
}

fn trim_trailing_ws(text: &str, range: Range<usize>) -> Range<usize> {
    let trimmed = text[range.clone()].trim_end();
    range.start..range.start + trimmed.len()
}

impl TextLayout {
    /// Lay out `styled`, wrapping at word boundaries when `max_width` is set.
    ///
    /// Explicit newlines always break. A word wider than `max_width` is split
    /// between graphemes.
    pub fn new(
        shaper: &dyn TextShaper,
        styled: &StyledText,
        style: &TextStyle,
        max_width: Option<f32>,
    ) -> Self {
        let text = styled.text.as_str();
        let line_height = style.line_pixels();
        let measure = |r: Range<usize>| measure_range(shaper, styled, style, r);
        let limit = max_width.filter(|w| w.is_finite() && *w > 0.0);

        let mut ranges: Vec<Range<usize>> = Vec::new();
        let mut para_start = 0;
        for para in text.split('\n') {
            let para_end = para_start + para.len();
            match limit {
                None => ranges.push(para_start..para_end),
                Some(max) => Self::wrap_paragraph(text, para_start..para_end, max, &measure, &mut ranges),
            }
            para_start = para_end + 1;
        }

        let mut layout = TextLayout::default();
        if text.is_empty() {
            return layout;
        }
        for (i, range) in ranges.into_iter().enumerate() {
            let visible = trim_trailing_ws(text, range.clone());
            let width = measure(visible);
            layout.width = layout.width.max(width);
            layout.lines.push(LayoutLine {
                range,
                width,
                x: 0.0,
                top: i as f32 * line_height,
                height: line_height,
            });
        }
        layout.height = layout.lines.len() as f32 * line_height;
        layout
    }

    fn wrap_paragraph(
        text: &str,
        para: Range<usize>,
        max: f32,
        measure: &dyn Fn(Range<usize>) -> f32,
        out: &mut Vec<Range<usize>>,
    ) {
        if para.is_empty() {
            out.push(para);
            return;
        }
        let mut line_start = para.start;
        let mut line_end = para.start;
        let mut width = 0.0f32;

        for (offset, word) in text[para.clone()].split_word_bound_indices() {
            let start = para.start + offset;
            let end = start + word.len();
            let word_width = measure(start..end);
            let is_space = word.chars().all(char::is_whitespace);

            if line_end > line_start && width + word_width > max && !is_space {
                out.push(line_start..line_end);
                line_start = start;
                line_end = start;
                width = 0.0;
            }

            if line_end == line_start && word_width > max && !is_space {
                // Split an overlong word between graphemes.
                for (g_off, g) in word.grapheme_indices(true) {
                    let gs = start + g_off;
                    let ge = gs + g.len();
                    let gw = measure(gs..ge);
                    if line_end > line_start && width + gw > max {
                        out.push(line_start..line_end);
                        line_start = gs;
                        width = 0.0;
                    }
                    line_end = ge;
                    width += gw;
                }
                continue;
            }

            line_end = end;
            width += word_width;
        }
        out.push(line_start..line_end);
    }

    /// Apply alignment inside a `width` x `height` box.
    pub fn align(&mut self, style: &TextStyle, width: f32, height: f32) {
        let dy = match style.vertical_alignment {
            VerticalAlignment::Top => 0.0,
            VerticalAlignment::Middle => (height - self.height) / 2.0,
            VerticalAlignment::Bottom => height - self.height,
        };
        for line in &mut self.lines {
            line.x = match style.alignment {
                TextAlignment::Left => 0.0,
                TextAlignment::Center => (width - line.width) / 2.0,
                TextAlignment::Right => width - line.width,
            };
            line.top += dy;
        }
    }

    pub fn lines(&self) -> &[LayoutLine] {
        &self.lines
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Byte index of the grapheme boundary nearest to `(x, y)`.
    pub fn index_at(
        &self,
        shaper: &dyn TextShaper,
        styled: &StyledText,
        style: &TextStyle,
        x: f32,
        y: f32,
    ) -> Option<usize> {
        let last = self.lines.last()?;
        let line = self
            .lines
            .iter()
            .find(|l| y >= l.top && y < l.top + l.height)
            .unwrap_or(if y < self.lines[0].top { &self.lines[0] } else { last });

        let slice = &styled.text[line.range.clone()];
        let mut cursor = line.x;
        for (offset, g) in slice.grapheme_indices(true) {
            let start = line.range.start + offset;
            let w = measure_range(shaper, styled, style, start..start + g.len());
            if x < cursor + w / 2.0 {
                return Some(start);
            }
            cursor += w;
        }
        Some(line.range.end)
    }
}

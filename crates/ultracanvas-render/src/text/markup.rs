//! Inline text markup.
//!
//! Supported tags are `<b>`, `<i>`, `<u>`, `<s>`, `<tt>` and `<code>`, plus the
//! entities `&lt;`, `&gt;`, `&amp;`, `&quot;` and `&apos;`. Tags nest. Anything
//! that is not a recognized tag or entity is kept as literal text.

use std::ops::Range;

use super::types::{FontFace, FontSlant, FontWeight};

/// Inline style flags for a span of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SpanStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub monospace: bool,
}

impl SpanStyle {
    /// Apply the flags on top of a base face.
    pub fn apply(&self, base: &FontFace) -> FontFace {
        let mut face = base.clone();
        if self.bold {
            face.weight = FontWeight::BOLD;
        }
        if self.italic {
            face.slant = FontSlant::Italic;
        }
        if self.monospace {
            face.family = "monospace".to_string();
        }
        face
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

/// A contiguous byte range of [`StyledText::text`] sharing one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSpan {
    pub range: Range<usize>,
    pub style: SpanStyle,
}

/// Plain text plus style spans covering it end to end.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyledText {
    pub text: String,
    pub spans: Vec<StyleSpan>,
}

impl StyledText {
    /// Unstyled text.
    pub fn plain(text: &str) -> Self {
        let spans = if text.is_empty() {
            Vec::new()
        } else {
            vec![StyleSpan {
                range: 0..text.len(),
                style: SpanStyle::default(),
            }]
        };
        Self {
            text: text.to_string(),
            spans,
        }
    }

    /// Parse markup. Never fails; unrecognized syntax stays literal.
    pub fn parse(markup: &str) -> Self {
        let mut out = StyledText::default();
        let mut stack: Vec<Tag> = Vec::new();
        let mut rest = markup;

        while let Some(c) = rest.chars().next() {
            if c == '<'
                && let Some((tag, closing, len)) = parse_tag(rest)
            {
                if closing {
                    // Close the innermost matching tag; mismatched closers are dropped.
                    if let Some(pos) = stack.iter().rposition(|t| *t == tag) {
                        stack.remove(pos);
                    }
                } else {
                    stack.push(tag);
                }
                rest = &rest[len..];
                continue;
            }
            if c == '&'
                && let Some((decoded, len)) = parse_entity(rest)
            {
                out.push(decoded, style_of(&stack));
                rest = &rest[len..];
                continue;
            }
            out.push(c, style_of(&stack));
            rest = &rest[c.len_utf8()..];
        }
        out
    }

    fn push(&mut self, c: char, style: SpanStyle) {
        let start = self.text.len();
        self.text.push(c);
        let end = self.text.len();
        match self.spans.last_mut() {
            Some(last) if last.style == style && last.range.end == start => last.range.end = end,
            _ => self.spans.push(StyleSpan {
                range: start..end,
                style,
            }),
        }
    }

    /// Byte offset in `markup` of the character that produced byte
    /// `plain_index` of the parsed text. Past the end maps to `markup.len()`.
    pub fn source_index(markup: &str, plain_index: usize) -> usize {
        let mut plain = 0;
        let mut rest = markup;
        while let Some(c) = rest.chars().next() {
            if c == '<'
                && let Some((_, _, len)) = parse_tag(rest)
            {
                rest = &rest[len..];
                continue;
            }
            if plain >= plain_index {
                return markup.len() - rest.len();
            }
            if c == '&'
                && let Some((decoded, len)) = parse_entity(rest)
            {
                plain += decoded.len_utf8();
                rest = &rest[len..];
                continue;
            }
            plain += c.len_utf8();
            rest = &rest[c.len_utf8()..];
        }
        markup.len()
    }

    /// Spans clipped to `range`, in order.
    pub fn spans_in(&self, range: Range<usize>) -> impl Iterator<Item = StyleSpan> + '_ {
        self.spans.iter().filter_map(move |span| {
            let start = span.range.start.max(range.start);
            let end = span.range.end.min(range.end);
            (start < end).then_some(StyleSpan {
                range: start..end,
                style: span.style,
            })
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Bold,
    Italic,
    Underline,
    Strike,
    Mono,
}

fn style_of(stack: &[Tag]) -> SpanStyle {
    let mut style = SpanStyle::default();
    for tag in stack {
        match tag {
            Tag::Bold => style.bold = true,
            Tag::Italic => style.italic = true,
            Tag::Underline => style.underline = true,
            Tag::Strike => style.strikethrough = true,
            Tag::Mono => style.monospace = true,
        }
    }
    style
}

/// Returns the tag, whether it closes, and its byte length.
fn parse_tag(s: &str) -> Option<(Tag, bool, usize)> {
    let end = s.find('>')?;
    let inner = &s[1..end];
    let (closing, name) = match inner.strip_prefix('/') {
        Some(name) => (true, name),
        None => (false, inner),
    };
    let tag = match name.to_ascii_lowercase().as_str() {
        "b" => Tag::Bold,
        "i" => Tag::Italic,
        "u" => Tag::Underline,
        "s" => Tag::Strike,
        "tt" | "code" => Tag::Mono,
        _ => return None,
    };
    Some((tag, closing, end + 1))
}

fn parse_entity(s: &str) -> Option<(char, usize)> {
    const ENTITIES: [(&str, char); 5] = [
        ("&lt;", '<'),
        ("&gt;", '>'),
        ("&amp;", '&'),
        ("&quot;", '"'),
        ("&apos;", '\''),
    ];
    ENTITIES
        .iter()
        .find(|(name, _)| s.starts_with(name))
        .map(|(name, c)| (*c, name.len()))
}

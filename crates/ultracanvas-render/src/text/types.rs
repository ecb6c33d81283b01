//! Font and text style types.

/// Font weight on the usual 100-900 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FontWeight(pub u16);

impl FontWeight {
    pub const THIN: Self = Self(100);
    pub const LIGHT: Self = Self(300);
    pub const NORMAL: Self = Self(400);
    pub const MEDIUM: Self = Self(500);
    pub const SEMI_BOLD: Self = Self(600);
    pub const BOLD: Self = Self(700);
    pub const BLACK: Self = Self(900);

    pub fn new(weight: u16) -> Self {
        Self(weight.clamp(100, 900))
    }

    pub const fn value(self) -> u16 {
        self.0
    }

    pub fn is_bold(self) -> bool {
        self.0 >= Self::SEMI_BOLD.0
    }

    pub fn to_cosmic(self) -> cosmic_text::Weight {
        cosmic_text::Weight(self.0)
    }
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// Font slant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontSlant {
    #[default]
    Normal,
    Italic,
    Oblique,
}

impl FontSlant {
    pub fn to_cosmic(self) -> cosmic_text::Style {
        match self {
            FontSlant::Normal => cosmic_text::Style::Normal,
            FontSlant::Italic => cosmic_text::Style::Italic,
            FontSlant::Oblique => cosmic_text::Style::Oblique,
        }
    }
}

/// A font family name plus weight and slant.
///
/// The generic names `sans-serif`, `serif` and `monospace` select the
/// platform's default face for that category.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontFace {
    pub family: String,
    pub weight: FontWeight,
    pub slant: FontSlant,
}

impl FontFace {
    pub fn new(family: impl Into<String>, weight: FontWeight, slant: FontSlant) -> Self {
        Self {
            family: family.into(),
            weight,
            slant,
        }
    }

    pub fn is_monospace(&self) -> bool {
        matches!(self.family.as_str(), "monospace" | "mono")
    }

    pub(crate) fn to_attrs(&self) -> cosmic_text::Attrs<'_> {
        let family = match self.family.as_str() {
            "" | "sans-serif" | "sans" => cosmic_text::Family::SansSerif,
            "serif" => cosmic_text::Family::Serif,
            "monospace" | "mono" => cosmic_text::Family::Monospace,
            name => cosmic_text::Family::Name(name),
        };
        cosmic_text::Attrs::new()
            .family(family)
            .weight(self.weight.to_cosmic())
            .style(self.slant.to_cosmic())
    }
}

impl Default for FontFace {
    fn default() -> Self {
        Self::new("sans-serif", FontWeight::NORMAL, FontSlant::Normal)
    }
}

/// A fully resolved font: face plus pixel size.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub face: FontFace,
    pub size: f32,
}

impl FontSpec {
    pub fn new(face: FontFace, size: f32) -> Self {
        Self { face, size }
    }
}

/// Horizontal alignment inside a layout box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical alignment inside a layout box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VerticalAlignment {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// The text portion of the render state.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub face: FontFace,
    /// Pixel size.
    pub size: f32,
    pub alignment: TextAlignment,
    pub vertical_alignment: VerticalAlignment,
    /// Line height as a multiple of the font size.
    pub line_height: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            face: FontFace::default(),
            size: 12.0,
            alignment: TextAlignment::Left,
            vertical_alignment: VerticalAlignment::Top,
            line_height: 1.2,
        }
    }
}

impl TextStyle {
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            face: FontFace::new(family, FontWeight::NORMAL, FontSlant::Normal),
            size,
            ..Self::default()
        }
    }

    pub fn with_weight(mut self, weight: FontWeight) -> Self {
        self.face.weight = weight;
        self
    }

    pub fn with_slant(mut self, slant: FontSlant) -> Self {
        self.face.slant = slant;
        self
    }

    pub fn with_alignment(mut self, alignment: TextAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_vertical_alignment(mut self, alignment: VerticalAlignment) -> Self {
        self.vertical_alignment = alignment;
        self
    }

    pub fn font(&self) -> FontSpec {
        FontSpec::new(self.face.clone(), self.size)
    }

    /// Height of one laid-out line.
    pub fn line_pixels(&self) -> f32 {
        self.size * self.line_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_clamps() {
        assert_eq!(FontWeight::new(50), FontWeight::THIN);
        assert_eq!(FontWeight::new(1200), FontWeight::BLACK);
        assert!(FontWeight::BOLD.is_bold());
        assert!(!FontWeight::NORMAL.is_bold());
    }

    #[test]
    fn test_text_style_builder() {
        let style = TextStyle::new("monospace", 14.0)
            .with_weight(FontWeight::BOLD)
            .with_alignment(TextAlignment::Center);
        assert!(style.face.is_monospace());
        assert_eq!(style.face.weight, FontWeight::BOLD);
        assert!((style.line_pixels() - 16.8).abs() < 1e-4);
    }
}

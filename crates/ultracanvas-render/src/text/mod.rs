//! Text styling, shaping, layout and markup.
//!
//! Render contexts measure and draw through a [`TextShaper`]:
//!
//! - [`CosmicShaper`] shapes with cosmic-text against the shared system font
//!   database.
//! - [`FixedAdvanceShaper`] uses fixed metrics and box glyphs, so layout is
//!   identical on every machine.
//!
//! [`TextLayout`] performs word wrapping and alignment on top of either, and
//! [`StyledText`] carries the inline styles produced by markup parsing.
//!
//! ```
//! use ultracanvas_render::text::{FixedAdvanceShaper, StyledText, TextLayout, TextStyle};
//!
//! let style = TextStyle::new("sans-serif", 10.0);
//! let styled = StyledText::parse("<b>hello</b> world");
//! let layout = TextLayout::new(&FixedAdvanceShaper, &styled, &style, Some(40.0));
//! assert_eq!(layout.line_count(), 2);
//! ```

mod font_system;
mod layout;
mod markup;
mod shaping;
mod types;

pub use font_system::{CosmicShaper, FontSystemConfig};
pub use layout::{LayoutLine, TextLayout, measure_range};
pub use markup::{SpanStyle, StyleSpan, StyledText};
pub use shaping::{FixedAdvanceShaper, LineMetrics, TextShaper};
pub use types::{
    FontFace, FontSlant, FontSpec, FontWeight, TextAlignment, TextStyle, VerticalAlignment,
};

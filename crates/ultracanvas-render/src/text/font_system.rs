//! The process-wide cosmic-text font system and the shaper built on it.

use std::sync::OnceLock;

use cosmic_text::{Buffer, Metrics, Shaping, SwashCache, Wrap};
use parking_lot::Mutex;
use ultracanvas_core::logging::targets;

use super::shaping::{LineMetrics, TextShaper};
use super::types::FontSpec;

/// Configuration for the shared font system.
///
/// Only the first configuration applied takes effect.
#[derive(Debug, Clone)]
pub struct FontSystemConfig {
    /// Scan installed system fonts.
    pub load_system_fonts: bool,
    /// BCP-47 locale used for fallback selection.
    pub locale: String,
    pub sans_serif_family: Option<String>,
    pub monospace_family: Option<String>,
}

impl Default for FontSystemConfig {
    fn default() -> Self {
        Self {
            load_system_fonts: true,
            locale: sys_locale::get_locale().unwrap_or_else(|| "en-US".to_string()),
            sans_serif_family: None,
            monospace_family: None,
        }
    }
}

impl FontSystemConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_system_fonts(mut self, load: bool) -> Self {
        self.load_system_fonts = load;
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn sans_serif_family(mut self, family: impl Into<String>) -> Self {
        self.sans_serif_family = Some(family.into());
        self
    }

    pub fn monospace_family(mut self, family: impl Into<String>) -> Self {
        self.monospace_family = Some(family.into());
        self
    }
}

struct SharedFonts {
    fonts: cosmic_text::FontSystem,
    swash: SwashCache,
}

static FONTS: OnceLock<Mutex<SharedFonts>> = OnceLock::new();

fn shared_fonts(config: &FontSystemConfig) -> &'static Mutex<SharedFonts> {
    FONTS.get_or_init(|| {
        let mut fonts = if config.load_system_fonts {
            cosmic_text::FontSystem::new()
        } else {
            cosmic_text::FontSystem::new_with_locale_and_db(
                config.locale.clone(),
                cosmic_text::fontdb::Database::new(),
            )
        };
        let db = fonts.db_mut();
        if let Some(family) = &config.sans_serif_family {
            db.set_sans_serif_family(family.as_str());
        }
        if let Some(family) = &config.monospace_family {
            db.set_monospace_family(family.as_str());
        }
        tracing::debug!(
            target: targets::RENDER,
            faces = fonts.db().faces().count(),
            locale = %config.locale,
            "font system initialized"
        );
        Mutex::new(SharedFonts {
            fonts,
            swash: SwashCache::new(),
        })
    })
}

/// Shaper backed by cosmic-text and the shared system font database.
///
/// Missing glyphs fall back to whatever the font system supplies; with no
/// fonts installed text measures as zero width and draws nothing.
#[derive(Debug, Clone, Copy)]
pub struct CosmicShaper {
    _private: (),
}

impl CosmicShaper {
    /// Use the shared font system, initializing it with defaults if needed.
    pub fn new() -> Self {
        Self::with_config(&FontSystemConfig::default())
    }

    pub fn with_config(config: &FontSystemConfig) -> Self {
        shared_fonts(config);
        Self { _private: () }
    }

    fn fonts(&self) -> &'static Mutex<SharedFonts> {
        shared_fonts(&FontSystemConfig::default())
    }

    fn shape(fonts: &mut cosmic_text::FontSystem, text: &str, font: &FontSpec, line_height: f32) -> Buffer {
        let size = font.size.max(1.0);
        let mut buffer = Buffer::new(fonts, Metrics::new(size, size * line_height));
        buffer.set_wrap(fonts, Wrap::None);
        buffer.set_size(fonts, None, None);
        buffer.set_text(fonts, text, font.face.to_attrs(), Shaping::Advanced);
        buffer.shape_until_scroll(fonts, false);
        buffer
    }
}

impl Default for CosmicShaper {
    fn default() -> Self {
        Self::new()
    }
}

impl TextShaper for CosmicShaper {
    fn advance(&self, text: &str, font: &FontSpec) -> f32 {
        if text.is_empty() {
            return 0.0;
        }
        let mut shared = self.fonts().lock();
        let buffer = Self::shape(&mut shared.fonts, text, font, 1.2);
        buffer
            .layout_runs()
            .map(|run| run.line_w)
            .fold(0.0, f32::max)
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
        if text.is_empty() {
            return;
        }
        let mut guard = self.fonts().lock();
        let SharedFonts { fonts, swash } = &mut *guard;
        let buffer = Self::shape(fonts, text, font, line_height);
        let white = cosmic_text::Color::rgba(255, 255, 255, 255);
        buffer.draw(fonts, swash, white, |x, y, w, h, color| {
            let coverage = color.a() as f32 / 255.0;
            if coverage <= 0.0 {
                return;
            }
            for dy in 0..h as i32 {
                for dx in 0..w as i32 {
                    sink(x + dx, y + dy, coverage);
                }
            }
        });
    }
}

use crate::color::Color;
use crate::math::Dimensions;

/// Configuration settings for rendering text elements.
#[derive(Debug, Clone, PartialEq)]
pub struct TextConfig {
    /// The color of the text.
    pub color: Color,
    /// Fonts are not managed here. The host assigns ids and resolves them when drawing.
    pub font_id: u16,
    /// The font size of the text, in logical units.
    pub font_size: u16,
    /// The spacing between letters.
    pub letter_spacing: u16,
    /// The height of each line of text. Zero means the font size.
    pub line_height: u16,
}

impl TextConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the text color.
    #[inline]
    pub fn color(&mut self, color: impl Into<Color>) -> &mut Self {
        self.color = color.into();
        self
    }

    #[inline]
    pub fn font_id(&mut self, id: u16) -> &mut Self {
        self.font_id = id;
        self
    }

    #[inline]
    pub fn font_size(&mut self, size: u16) -> &mut Self {
        self.font_size = size;
        self
    }

    #[inline]
    pub fn letter_spacing(&mut self, spacing: u16) -> &mut Self {
        self.letter_spacing = spacing;
        self
    }

    #[inline]
    pub fn line_height(&mut self, height: u16) -> &mut Self {
        self.line_height = height;
        self
    }

    /// Copy with every size multiplied by `scale`.
    pub fn scaled(&self, scale: f32) -> Self {
        let s = |v: u16| (f32::from(v) * scale).round() as u16;
        Self {
            color: self.color,
            font_id: self.font_id,
            font_size: s(self.font_size),
            letter_spacing: s(self.letter_spacing),
            line_height: s(self.line_height),
        }
    }
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            font_id: 0,
            font_size: 14,
            letter_spacing: 0,
            line_height: 0,
        }
    }
}

/// Measures a string for the given text config.
pub type MeasureTextFn = Box<dyn Fn(&str, &TextConfig) -> Dimensions>;

/// Font-independent estimate: half an em per character.
pub fn estimate_text(text: &str, config: &TextConfig) -> Dimensions {
    let size = f32::from(config.font_size);
    let chars = text.chars().count() as f32;
    let spacing = f32::from(config.letter_spacing) * (chars - 1.0).max(0.0);
    let height = if config.line_height > 0 {
        f32::from(config.line_height)
    } else {
        size
    };
    Dimensions::new(chars * size * 0.5 + spacing, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_scales_with_size() {
        let mut config = TextConfig::new();
        config.font_size(10).letter_spacing(1);
        assert_eq!(estimate_text("abcd", &config), Dimensions::new(23.0, 10.0));
        assert_eq!(estimate_text("", &config).width, 0.0);
        config.line_height(16);
        assert_eq!(estimate_text("a", &config).height, 16.0);
    }

    #[test]
    fn scaled_rounds_sizes() {
        let mut config = TextConfig::new();
        config.font_size(11).line_height(13);
        let scaled = config.scaled(1.5);
        assert_eq!((scaled.font_size, scaled.line_height), (17, 20));
    }
}

use crate::color::Color;
use crate::math::BoundingBox;

/// Represents a rectangle with a specified color and corner radius.
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    /// The fill color of the rectangle.
    pub color: Color,
    pub corner_radius: f32,
}

/// Represents a border with a specified color and width.
#[derive(Debug, Clone, PartialEq)]
pub struct Border {
    /// The border color.
    pub color: Color,
    pub corner_radius: f32,
    /// Line width on every side.
    pub width: f32,
}

/// Represents a text element with styling attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    /// The text content.
    pub text: String,
    /// The color of the text.
    pub color: Color,
    /// The ID of the font used.
    pub font_id: u16,
    /// The font size, already scaled to device pixels.
    pub font_size: u16,
    /// The spacing between letters.
    pub letter_spacing: u16,
    /// The line height.
    pub line_height: u16,
}

/// A named host icon drawn into a square.
#[derive(Debug, Clone, PartialEq)]
pub struct Icon {
    pub name: String,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommandConfig {
    Rectangle(Rectangle),
    Border(Border),
    Text(Text),
    Icon(Icon),
}

/// One draw call in device pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCommand {
    /// Rectangular box that fully encloses this element.
    pub bounding_box: BoundingBox,
    pub config: RenderCommandConfig,
    /// Id of the element that produced the command.
    pub id: u32,
    /// Z-index for layering this element.
    pub z_index: i16,
}

impl RenderCommand {
    pub fn text(&self) -> Option<&str> {
        match &self.config {
            RenderCommandConfig::Text(text) => Some(&text.text),
            _ => None,
        }
    }
}

/// An RGBA color with floating-point components (0.0–255.0 range).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(255.0, 255.0, 255.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 255.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Allows using hex values to build colors
    /// ```
    /// use pie_menu_engine::color::Color;
    /// assert_eq!(Color::rgb(255.0, 255.0, 255.0), Color::u_rgb(0xFF, 0xFF, 0xFF));
    /// ```
    pub const fn u_rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(r as f32, g as f32, b as f32)
    }

    pub const fn u_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(r as f32, g as f32, b as f32, a as f32)
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Components in the 0.0–1.0 range.
    pub fn normalized(&self) -> [f32; 4] {
        [self.r / 255.0, self.g / 255.0, self.b / 255.0, self.a / 255.0]
    }

    /// Brightens (positive) or darkens (negative) each channel by `amount`.
    pub fn shade(self, amount: f32) -> Self {
        let shift = |c: f32| (c + amount).clamp(0.0, 255.0);
        Self::rgba(shift(self.r), shift(self.g), shift(self.b), self.a)
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from(value: (u8, u8, u8)) -> Self {
        Self::u_rgb(value.0, value.1, value.2)
    }
}

impl From<(u8, u8, u8, u8)> for Color {
    fn from(value: (u8, u8, u8, u8)) -> Self {
        Self::u_rgba(value.0, value.1, value.2, value.3)
    }
}

impl From<u32> for Color {
    fn from(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xFF) as f32;
        let g = ((hex >> 8) & 0xFF) as f32;
        let b = (hex & 0xFF) as f32;
        Color::rgba(r, g, b, 255.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_and_shade() {
        assert_eq!(Color::from(0x3D3D3Du32), Color::u_rgb(0x3D, 0x3D, 0x3D));
        assert_eq!(Color::u_rgb(250, 5, 100).shade(10.0), Color::rgb(255.0, 15.0, 110.0));
        assert_eq!(Color::WHITE.normalized(), [1.0, 1.0, 1.0, 1.0]);
    }
}

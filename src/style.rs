//! Widget styles derived from a theme.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::text::TextConfig;

/// Base palette and metrics, in logical units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub background: (u8, u8, u8, u8),
    pub header: (u8, u8, u8, u8),
    pub text: (u8, u8, u8, u8),
    pub accent: (u8, u8, u8, u8),
    pub outline: (u8, u8, u8, u8),
    pub font_size: u16,
    /// Height of one widget row.
    pub unit: f32,
    pub spacing: f32,
    pub padding: f32,
    pub corner_radius: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: (0x2B, 0x2B, 0x2B, 0xF0),
            header: (0x3D, 0x3D, 0x3D, 0xFF),
            text: (0xE6, 0xE6, 0xE6, 0xFF),
            accent: (0x47, 0x72, 0xB3, 0xFF),
            outline: (0x19, 0x19, 0x19, 0xFF),
            font_size: 11,
            unit: 20.0,
            spacing: 2.0,
            padding: 6.0,
            corner_radius: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub background: Color,
    pub outline: Color,
    pub text: TextConfig,
    pub height: f32,
    /// Gap between items of unaligned rows and columns.
    pub spacing: f32,
    pub padding: f32,
    pub corner_radius: f32,
}

/// Shares one [`Style`] per name until the theme changes.
///
/// Known names: `panel`, `box`, `title`, `button`, `label`, `separator`.
/// Unknown names get the `label` style.
#[derive(Debug, Default)]
pub struct StyleCache {
    theme: Theme,
    styles: FxHashMap<String, Rc<Style>>,
}

impl StyleCache {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            styles: FxHashMap::default(),
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        if theme != self.theme {
            self.theme = theme;
            self.styles.clear();
        }
    }

    pub fn get(&mut self, name: &str) -> Rc<Style> {
        if let Some(style) = self.styles.get(name) {
            return Rc::clone(style);
        }
        let style = Rc::new(derive(&self.theme, name));
        self.styles.insert(name.to_string(), Rc::clone(&style));
        style
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

fn derive(theme: &Theme, name: &str) -> Style {
    let mut text = TextConfig::new();
    text.color(theme.text).font_size(theme.font_size);
    let base = Style {
        background: Color::TRANSPARENT,
        outline: Color::from(theme.outline),
        text,
        height: theme.unit,
        spacing: theme.spacing,
        padding: theme.padding,
        corner_radius: theme.corner_radius,
    };
    match name {
        "panel" => Style {
            background: Color::from(theme.background),
            ..base
        },
        "box" => Style {
            background: Color::from(theme.background).shade(12.0),
            padding: theme.padding * 0.5,
            ..base
        },
        "title" => Style {
            background: Color::from(theme.header),
            height: theme.unit + 4.0,
            ..base
        },
        "button" => Style {
            background: Color::from(theme.accent),
            ..base
        },
        "separator" => Style {
            background: Color::from(theme.outline),
            height: theme.unit * 0.4,
            ..base
        },
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styles_are_shared_until_theme_changes() {
        let mut cache = StyleCache::new(Theme::default());
        let a = cache.get("button");
        let b = cache.get("button");
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);

        cache.set_theme(Theme::default());
        assert!(Rc::ptr_eq(&a, &cache.get("button")));

        cache.set_theme(Theme {
            accent: (255, 0, 0, 255),
            ..Theme::default()
        });
        let c = cache.get("button");
        assert!(!Rc::ptr_eq(&a, &c));
        assert_eq!(c.background, Color::u_rgb(255, 0, 0));
    }

    #[test]
    fn unknown_name_falls_back_to_label() {
        let mut cache = StyleCache::default();
        assert_eq!(*cache.get("nope"), *cache.get("label"));
        assert_eq!(cache.get("title").height, 24.0);
    }
}

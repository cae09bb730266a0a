use macroquad::prelude::*;
use rustc_hash::FxHashMap;

use crate::math::{BoundingBox, Dimensions};
use crate::render_commands::{RenderCommand, RenderCommandConfig};
use crate::text::{MeasureTextFn, TextConfig};

const PIXELS_PER_POINT: f32 = 2.0;

fn to_macroquad_color(color: &crate::color::Color) -> Color {
    Color {
        r: color.r / 255.0,
        g: color.g / 255.0,
        b: color.b / 255.0,
        a: color.a / 255.0,
    }
}

fn draw_good_circle(x: f32, y: f32, r: f32, color: Color) {
    let sides = ((2.0 * std::f32::consts::PI * r) / PIXELS_PER_POINT).max(20.0);
    draw_poly(x, y, sides.min(255.0) as u8, r, 0.0, color);
}

fn draw_rounded_rectangle(bb: BoundingBox, radius: f32, color: Color) {
    let r = radius.min(bb.width * 0.5).min(bb.height * 0.5);
    if r <= 0.0 {
        draw_rectangle(bb.x, bb.y, bb.width, bb.height, color);
        return;
    }
    draw_rectangle(bb.x + r, bb.y, bb.width - 2.0 * r, bb.height, color);
    draw_rectangle(bb.x, bb.y + r, r, bb.height - 2.0 * r, color);
    draw_rectangle(bb.right() - r, bb.y + r, r, bb.height - 2.0 * r, color);
    draw_good_circle(bb.x + r, bb.y + r, r, color);
    draw_good_circle(bb.right() - r, bb.y + r, r, color);
    draw_good_circle(bb.x + r, bb.bottom() - r, r, color);
    draw_good_circle(bb.right() - r, bb.bottom() - r, r, color);
}

/// Icon textures by host icon name. Unknown icons draw as an outlined square.
#[derive(Default)]
pub struct IconAtlas {
    textures: FxHashMap<String, Texture2D>,
}

impl IconAtlas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, texture: Texture2D) {
        self.textures.insert(name.into(), texture);
    }

    pub fn get(&self, name: &str) -> Option<&Texture2D> {
        self.textures.get(name)
    }
}

/// Draws layout output. Commands are drawn by ascending z index, keeping
/// emission order within one z.
pub fn render(commands: &[RenderCommand], fonts: &[Font], icons: &IconAtlas) {
    let mut ordered: Vec<&RenderCommand> = commands.iter().collect();
    ordered.sort_by_key(|command| command.z_index);

    for command in ordered {
        let bb = command.bounding_box;
        match &command.config {
            RenderCommandConfig::Rectangle(config) => {
                draw_rounded_rectangle(bb, config.corner_radius, to_macroquad_color(&config.color));
            }
            RenderCommandConfig::Border(config) => {
                draw_rectangle_lines(
                    bb.x - config.width / 2.0,
                    bb.y - config.width / 2.0,
                    bb.width + config.width,
                    bb.height + config.width,
                    config.width,
                    to_macroquad_color(&config.color),
                );
            }
            RenderCommandConfig::Text(config) => {
                let font = fonts.get(config.font_id as usize);
                let x_scale = if config.letter_spacing > 0 {
                    let plain = measure_text(&config.text, font, config.font_size, 1.0).width;
                    if plain > 0.0 { bb.width / plain } else { 1.0 }
                } else {
                    1.0
                };
                draw_text_ex(
                    &config.text,
                    bb.x,
                    bb.y + bb.height,
                    TextParams {
                        font_size: config.font_size,
                        font,
                        font_scale: 1.0,
                        font_scale_aspect: x_scale,
                        rotation: 0.0,
                        color: to_macroquad_color(&config.color),
                    },
                );
            }
            RenderCommandConfig::Icon(config) => {
                let color = to_macroquad_color(&config.color);
                match icons.get(&config.name) {
                    Some(texture) => draw_texture_ex(
                        texture,
                        bb.x,
                        bb.y,
                        color,
                        DrawTextureParams {
                            dest_size: Some(Vec2::new(bb.width, bb.height)),
                            ..Default::default()
                        },
                    ),
                    None => draw_rectangle_lines(bb.x, bb.y, bb.width, bb.height, 1.0, color),
                }
            }
        }
    }
}

/// Text measurement backed by macroquad fonts. Font ids index into `fonts`;
/// an unknown id uses macroquad's built-in font.
pub fn create_measure_text_function(fonts: Vec<Font>) -> MeasureTextFn {
    Box::new(move |text: &str, config: &TextConfig| {
        let measured = macroquad::text::measure_text(
            text,
            fonts.get(config.font_id as usize),
            config.font_size,
            1.0,
        );
        let added_space = (text.chars().count().max(1) - 1) as f32 * config.letter_spacing as f32;
        Dimensions::new(measured.width + added_space, measured.height)
    })
}

// src/render/text.rs
use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rusttype::{Font, Scale};
use tracing::debug;

/// Fonts tried when no font path is configured.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Load the configured font, falling back to well-known system fonts.
/// Without any usable font, figures are drawn without text.
pub fn load_font(configured: Option<&Path>) -> Option<Font<'static>> {
    let candidates = configured
        .map(|p| vec![p.to_path_buf()])
        .unwrap_or_else(|| SYSTEM_FONTS.iter().map(PathBuf::from).collect());

    for path in candidates {
        let Ok(bytes) = fs::read(&path) else {
            continue;
        };
        if let Some(font) = Font::try_from_vec(bytes) {
            debug!(font = %path.display(), "loaded font");
            return Some(font);
        }
    }

    debug!("no usable font found, figures will carry no text");
    None
}

/// Draws text when a font is available, otherwise does nothing.
pub struct TextPainter<'f> {
    font: Option<&'f Font<'static>>,
}

impl<'f> TextPainter<'f> {
    pub fn new(font: Option<&'f Font<'static>>) -> Self {
        Self { font }
    }

    /// Width and height of `text`, estimated when there is no font.
    pub fn measure(&self, text: &str, size: f32) -> (u32, u32) {
        match self.font {
            Some(font) => {
                let (w, h) = text_size(Scale::uniform(size), font, text);
                (w.max(0) as u32, h.max(0) as u32)
            }
            None => ((text.chars().count() as f32 * size * 0.55) as u32, size as u32),
        }
    }

    pub fn draw(&self, canvas: &mut RgbImage, text: &str, x: i32, y: i32, size: f32, color: [u8; 3]) {
        if let Some(font) = self.font {
            draw_text_mut(canvas, Rgb(color), x, y, Scale::uniform(size), font, text);
        }
    }

    /// Draw `text` horizontally centred on `center_x`.
    pub fn draw_centered(&self, canvas: &mut RgbImage, text: &str, center_x: i32, y: i32, size: f32, color: [u8; 3]) {
        let (w, _) = self.measure(text, size);
        self.draw(canvas, text, center_x - w as i32 / 2, y, size, color);
    }
}

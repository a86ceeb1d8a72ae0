// src/services/caption.rs
use crate::errors::ImgDropError;
use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};
use imageproc::distance_transform::Norm;
use imageproc::drawing::{draw_text_mut, text_size};
use imageproc::morphology::dilate;
use log::warn;
use std::path::{Path, PathBuf};

const MIN_FONT_SIZE: f32 = 12.0;
const TEXT_WIDTH_RATIO: f32 = 0.9;
const LINE_SPACING: f32 = 1.1;

const GLYPH: Luma<u8> = Luma([255]);

// Checked in order when no font is configured
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "/System/Library/Fonts/Supplemental/Impact.ttf",
    "C:\\Windows\\Fonts\\impact.ttf",
];

pub struct CaptionRenderer {
    font: Option<FontVec>,
    source: Option<PathBuf>,
}

impl CaptionRenderer {
    /// Loads the configured font, or the first usable system font.
    ///
    /// A configured path that cannot be loaded is an error; a missing system
    /// font only disables captioning.
    pub fn load(configured: Option<&Path>) -> Result<Self, ImgDropError> {
        if let Some(path) = configured {
            let font = read_font(path)?;
            return Ok(Self {
                font: Some(font),
                source: Some(path.to_path_buf()),
            });
        }

        for candidate in FONT_CANDIDATES.iter().map(Path::new) {
            if let Ok(font) = read_font(candidate) {
                return Ok(Self {
                    font: Some(font),
                    source: Some(candidate.to_path_buf()),
                });
            }
        }

        warn!("No caption font found; set IMGDROP_FONT_PATH to enable meme captions");
        Ok(Self::unavailable())
    }

    pub fn unavailable() -> Self {
        Self {
            font: None,
            source: None,
        }
    }

    pub fn font_source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Draws upper-cased, outlined captions at the top and bottom of `img`.
    pub fn render(
        &self,
        img: &DynamicImage,
        top_text: Option<&str>,
        bottom_text: Option<&str>,
        font_size: Option<f32>,
    ) -> Result<DynamicImage, ImgDropError> {
        let font = self.font.as_ref().ok_or_else(|| {
            ImgDropError::Font("No TrueType font is configured for captions".to_string())
        })?;

        let mut canvas = img.to_rgba8();
        let (width, height) = canvas.dimensions();

        let size = font_size.unwrap_or(height as f32 / 10.0).max(MIN_FONT_SIZE);
        let scale = PxScale::from(size);
        let max_width = (width as f32 * TEXT_WIDTH_RATIO) as u32;
        let line_height = (size * LINE_SPACING).ceil() as i32;
        let margin = ((height as f32 * 0.03) as i32).max(2);
        let outline = (size / 15.0).ceil().clamp(1.0, u8::MAX as f32) as u8;

        let measure = |line: &str| text_size(scale, font, line).0;

        // Glyph coverage for every line; the outline is grown from it in one pass
        let mut glyphs = GrayImage::new(width, height);
        let mut draw_line = |line: &str, y: i32| {
            let x = (width as i32 - measure(line) as i32) / 2;
            draw_text_mut(&mut glyphs, GLYPH, x, y, scale, font, line);
        };

        if let Some(text) = top_text {
            let lines = wrap_lines(&text.to_uppercase(), max_width, measure);
            for (i, line) in lines.iter().enumerate() {
                draw_line(line, margin + i as i32 * line_height);
            }
        }

        if let Some(text) = bottom_text {
            let lines = wrap_lines(&text.to_uppercase(), max_width, measure);
            let start = height as i32 - margin - lines.len() as i32 * line_height;
            for (i, line) in lines.iter().enumerate() {
                draw_line(line, start + i as i32 * line_height);
            }
        }

        paint_outlined(&mut canvas, &glyphs, outline);

        Ok(DynamicImage::ImageRgba8(canvas))
    }
}

/// Paints white glyphs with a black border `outline` pixels wide.
///
/// `glyphs` holds coverage values; partial coverage shades from the border
/// colour to white.
fn paint_outlined(canvas: &mut RgbaImage, glyphs: &GrayImage, outline: u8) {
    let border = dilate(glyphs, Norm::LInf, outline);

    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        if border.get_pixel(x, y)[0] == 0 {
            continue;
        }
        let coverage = glyphs.get_pixel(x, y)[0];
        *pixel = Rgba([coverage, coverage, coverage, 255]);
    }
}

fn read_font(path: &Path) -> Result<FontVec, ImgDropError> {
    let bytes = std::fs::read(path)
        .map_err(|e| ImgDropError::Font(format!("Cannot read {}: {}", path.display(), e)))?;
    FontVec::try_from_vec(bytes)
        .map_err(|e| ImgDropError::Font(format!("Cannot parse {}: {}", path.display(), e)))
}

/// Greedy word wrap. A single word wider than `max_width` gets its own line.
pub fn wrap_lines<F>(text: &str, max_width: u32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> u32,
{
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate = format!("{} {}", current, word);
        if measure(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

// src/services/image_processor.rs
use crate::errors::ImgDropError;
use crate::models::{OutputFormat, Transform};
use image::codecs::jpeg::JpegEncoder;
use image::{
    ColorType, DynamicImage, GenericImageView, ImageReader, Limits, RgbImage, imageops::FilterType,
};
use log::{debug, warn};
use std::io::Cursor;
use webp::Encoder as WebpEncoder;

pub const DEFAULT_QUALITY: u8 = 85;

const SEARCH_START_QUALITY: u8 = 95;
const SEARCH_QUALITY_STEP: u8 = 5;

/// A decoded upload together with the format it arrived in.
pub struct LoadedImage {
    pub image: DynamicImage,
    pub source_format: Option<OutputFormat>,
}

impl LoadedImage {
    /// The format to write back when the form does not ask for one.
    pub fn preferred_format(&self) -> OutputFormat {
        self.source_format.unwrap_or(OutputFormat::Png)
    }
}

/// Outcome of the quality search in [`ImageProcessor::reduce_to_size`].
#[derive(Debug)]
pub struct SizeReduction {
    pub data: Vec<u8>,
    pub quality: u8,
    pub met_target: bool,
}

pub struct ImageProcessor {
    max_dimension: u32,
    filter: FilterType,
}

impl ImageProcessor {
    pub fn new(max_dimension: u32) -> Self {
        Self {
            max_dimension,
            filter: FilterType::Lanczos3,
        }
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    pub fn load(&self, data: &[u8]) -> Result<LoadedImage, ImgDropError> {
        if data.is_empty() {
            return Err(ImgDropError::Validation("No image file selected".to_string()));
        }

        let mut reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| ImgDropError::ImageProcessing(format!("Failed to read image: {}", e)))?;

        let mut limits = Limits::default();
        limits.max_image_width = Some(self.max_dimension);
        limits.max_image_height = Some(self.max_dimension);
        reader.limits(limits);

        let source_format = reader.format().and_then(OutputFormat::from_image_format);
        let image = reader
            .decode()
            .map_err(|e| ImgDropError::ImageProcessing(format!("Invalid image format: {}", e)))?;

        self.validate_dimensions(&image)?;

        debug!(
            "Loaded {}x{} image ({:?})",
            image.width(),
            image.height(),
            source_format
        );

        Ok(LoadedImage {
            image,
            source_format,
        })
    }

    fn validate_dimensions(&self, img: &DynamicImage) -> Result<(), ImgDropError> {
        let (width, height) = img.dimensions();

        if width > self.max_dimension || height > self.max_dimension {
            return Err(ImgDropError::ImageProcessing(format!(
                "Image dimensions exceed {}x{}",
                self.max_dimension, self.max_dimension
            )));
        }

        Ok(())
    }

    /// Resizes to `width` x `height`.
    ///
    /// With `keep_aspect` the image is shrunk to fit inside the box and is
    /// never enlarged.
    pub fn resize(&self, img: &DynamicImage, width: u32, height: u32, keep_aspect: bool) -> DynamicImage {
        let (new_width, new_height) = if keep_aspect {
            fit_within(img.dimensions(), (width, height))
        } else {
            (width, height)
        };

        if (new_width, new_height) == img.dimensions() {
            debug!("Image dimensions unchanged, skipping resize");
            return img.clone();
        }

        debug!(
            "Resizing image from {}x{} to {}x{}",
            img.width(),
            img.height(),
            new_width,
            new_height
        );

        img.resize_exact(new_width, new_height, self.filter)
    }

    pub fn crop(
        &self,
        img: &DynamicImage,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, ImgDropError> {
        if width == 0 || height == 0 {
            return Err(ImgDropError::Validation(
                "Crop region must not be empty".to_string(),
            ));
        }

        let (img_width, img_height) = img.dimensions();
        if x as u64 + width as u64 > img_width as u64 || y as u64 + height as u64 > img_height as u64 {
            return Err(ImgDropError::Validation(format!(
                "Crop region {}x{}+{}+{} falls outside the {}x{} image",
                width, height, x, y, img_width, img_height
            )));
        }

        Ok(img.crop_imm(x, y, width, height))
    }

    /// Rotations are counter-clockwise.
    pub fn transform(&self, img: &DynamicImage, transform: Transform) -> DynamicImage {
        match transform {
            Transform::Rotate90 => img.rotate270(),
            Transform::Rotate180 => img.rotate180(),
            Transform::Rotate270 => img.rotate90(),
            Transform::FlipHorizontal => img.fliph(),
            Transform::FlipVertical => img.flipv(),
        }
    }

    pub fn encode(
        &self,
        img: &DynamicImage,
        format: OutputFormat,
        quality: u8,
    ) -> Result<Vec<u8>, ImgDropError> {
        match format {
            OutputFormat::Jpeg => return encode_jpeg(&img.to_rgb8(), quality),
            OutputFormat::WebP => return Ok(encode_webp(img, quality)),
            _ => {}
        }

        let prepared = match (format, img.color()) {
            (OutputFormat::Png, _) => None,
            (OutputFormat::Gif, _) => Some(DynamicImage::ImageRgba8(img.to_rgba8())),
            (_, ColorType::L8 | ColorType::Rgb8 | ColorType::Rgba8) => None,
            _ => Some(DynamicImage::ImageRgba8(img.to_rgba8())),
        };

        let mut output = Vec::new();
        prepared
            .as_ref()
            .unwrap_or(img)
            .write_to(&mut Cursor::new(&mut output), format.image_format())
            .map_err(|e| {
                ImgDropError::ImageProcessing(format!("Failed to encode {} image: {}", format, e))
            })?;

        Ok(output)
    }

    /// Searches downwards from quality 95 in steps of 5 for the first JPEG
    /// encoding that fits in `budget` bytes.
    ///
    /// When no quality fits, the quality 5 encoding is returned with
    /// `met_target` unset.
    pub fn reduce_to_size(&self, img: &DynamicImage, budget: u64) -> Result<SizeReduction, ImgDropError> {
        let rgb = img.to_rgb8();
        let mut quality = SEARCH_START_QUALITY;

        loop {
            let data = encode_jpeg(&rgb, quality)?;
            debug!("Quality {} -> {} bytes (budget {})", quality, data.len(), budget);

            if data.len() as u64 <= budget {
                return Ok(SizeReduction {
                    data,
                    quality,
                    met_target: true,
                });
            }

            if quality <= SEARCH_QUALITY_STEP {
                warn!(
                    "Could not reach {} bytes; smallest encoding is {} bytes",
                    budget,
                    data.len()
                );
                return Ok(SizeReduction {
                    data,
                    quality,
                    met_target: false,
                });
            }

            quality -= SEARCH_QUALITY_STEP;
        }
    }
}

fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>, ImgDropError> {
    let mut output = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut output, quality.clamp(1, 100));
    img.write_with_encoder(encoder)
        .map_err(|e| ImgDropError::ImageProcessing(format!("Failed to encode jpg image: {}", e)))?;
    Ok(output)
}

/// Lossy WebP through libwebp; the encoder in `image` only writes lossless.
fn encode_webp(img: &DynamicImage, quality: u8) -> Vec<u8> {
    let rgba = img.to_rgba8();
    let encoder = WebpEncoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
    encoder.encode(quality.clamp(1, 100) as f32).to_vec()
}

/// Largest size with the original aspect ratio that fits inside `bounds`,
/// never larger than `original`.
pub fn fit_within(original: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (orig_w, orig_h) = original;
    let (max_w, max_h) = bounds;

    if orig_w <= max_w && orig_h <= max_h {
        return original;
    }

    let ratio = (max_w as f64 / orig_w as f64).min(max_h as f64 / orig_h as f64);
    let new_w = ((orig_w as f64 * ratio).round() as u32).clamp(1, max_w.max(1));
    let new_h = ((orig_h as f64 * ratio).round() as u32).clamp(1, max_h.max(1));

    (new_w, new_h)
}

pub fn validate_quality(quality: u8) -> Result<u8, ImgDropError> {
    if (1..=100).contains(&quality) {
        Ok(quality)
    } else {
        Err(ImgDropError::Validation(format!(
            "Quality must be between 1 and 100, got {}",
            quality
        )))
    }
}

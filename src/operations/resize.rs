// src/operations/resize.rs
use super::{Operation, output_settings, reported_quality};
use crate::errors::ImgDropError;
use crate::models::{
    FormFields, OperationInput, OutputFormat, ProcessedOutput, Transform, Unit,
};
use crate::services::ImageProcessor;
use crate::services::units::{DEFAULT_DPI, to_pixels};
use image::{DynamicImage, GenericImageView};
use std::sync::Arc;

/// Resize settings shared by single and bulk resizing.
#[derive(Debug, Clone)]
pub struct ResizeParams {
    pub width: u32,
    pub height: u32,
    pub keep_aspect: bool,
    pub transform: Option<Transform>,
    pub format: OutputFormat,
    pub quality: u8,
}

impl ResizeParams {
    pub fn from_fields(fields: &FormFields, max_dimension: u32) -> Result<Self, ImgDropError> {
        let unit: Unit = fields.parse_or("unit", Unit::Px)?;
        let dpi: u32 = fields.parse_or("dpi", DEFAULT_DPI)?;
        let width = to_pixels(fields.required("width")?, unit, dpi, max_dimension)?;
        let height = to_pixels(fields.required("height")?, unit, dpi, max_dimension)?;
        let (format, quality) = output_settings(fields, OutputFormat::Jpeg)?;

        Ok(Self {
            width,
            height,
            keep_aspect: fields.flag("aspect_ratio"),
            transform: fields.optional("transform")?,
            format,
            quality,
        })
    }

    /// Transform, resize, then encode. Returns the bytes and final size.
    pub fn apply(
        &self,
        processor: &ImageProcessor,
        img: &DynamicImage,
    ) -> Result<(Vec<u8>, (u32, u32)), ImgDropError> {
        let transformed;
        let source = match self.transform {
            Some(t) => {
                transformed = processor.transform(img, t);
                &transformed
            }
            None => img,
        };

        let resized = processor.resize(source, self.width, self.height, self.keep_aspect);
        let data = processor.encode(&resized, self.format, self.quality)?;
        Ok((data, resized.dimensions()))
    }
}

pub struct ResizeOperation {
    processor: Arc<ImageProcessor>,
}

impl ResizeOperation {
    pub fn new(processor: Arc<ImageProcessor>) -> Self {
        Self { processor }
    }
}

impl Operation for ResizeOperation {
    fn name(&self) -> &'static str {
        "resize"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["dimension"]
    }

    fn description(&self) -> &'static str {
        "Resize to a width and height in px, cm, mm or inches, optionally keeping the aspect ratio"
    }

    fn execute(&self, input: &OperationInput) -> Result<ProcessedOutput, ImgDropError> {
        let file = input.first_file()?;
        let params = ResizeParams::from_fields(&input.fields, self.processor.max_dimension())?;
        let loaded = self.processor.load(&file.data)?;

        let (data, dimensions) = params.apply(&self.processor, &loaded.image)?;

        Ok(ProcessedOutput {
            quality: reported_quality(params.format, params.quality),
            ..ProcessedOutput::image(data, "resized_image", params.format, dimensions)
        })
    }
}

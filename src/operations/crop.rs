// src/operations/crop.rs
use super::{Operation, output_settings, reported_quality};
use crate::errors::ImgDropError;
use crate::models::{OperationInput, ProcessedOutput};
use crate::services::ImageProcessor;
use image::GenericImageView;
use std::sync::Arc;

pub struct CropOperation {
    processor: Arc<ImageProcessor>,
}

impl CropOperation {
    pub fn new(processor: Arc<ImageProcessor>) -> Self {
        Self { processor }
    }
}

impl Operation for CropOperation {
    fn name(&self) -> &'static str {
        "crop"
    }

    fn description(&self) -> &'static str {
        "Cut out a rectangle given by x, y, width and height in pixels"
    }

    fn execute(&self, input: &OperationInput) -> Result<ProcessedOutput, ImgDropError> {
        let file = input.first_file()?;
        let fields = &input.fields;
        let x: u32 = fields.parse_or("x", 0)?;
        let y: u32 = fields.parse_or("y", 0)?;
        let width: u32 = fields.required("width")?;
        let height: u32 = fields.required("height")?;

        let loaded = self.processor.load(&file.data)?;
        let (format, quality) = output_settings(fields, loaded.preferred_format())?;

        let cropped = self.processor.crop(&loaded.image, x, y, width, height)?;
        let data = self.processor.encode(&cropped, format, quality)?;

        Ok(ProcessedOutput {
            quality: reported_quality(format, quality),
            ..ProcessedOutput::image(data, "cropped_image", format, cropped.dimensions())
        })
    }
}

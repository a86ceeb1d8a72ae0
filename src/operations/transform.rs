// src/operations/transform.rs
use super::{Operation, output_settings, reported_quality};
use crate::errors::ImgDropError;
use crate::models::{OperationInput, ProcessedOutput, Transform};
use crate::services::ImageProcessor;
use image::GenericImageView;
use std::sync::Arc;

pub struct TransformOperation {
    processor: Arc<ImageProcessor>,
}

impl TransformOperation {
    pub fn new(processor: Arc<ImageProcessor>) -> Self {
        Self { processor }
    }
}

impl Operation for TransformOperation {
    fn name(&self) -> &'static str {
        "transform"
    }

    fn description(&self) -> &'static str {
        "Rotate by 90, 180 or 270 degrees counter-clockwise, or flip horizontally or vertically"
    }

    fn execute(&self, input: &OperationInput) -> Result<ProcessedOutput, ImgDropError> {
        let file = input.first_file()?;
        let transform: Transform = input.fields.required("transform")?;

        let loaded = self.processor.load(&file.data)?;
        let (format, quality) = output_settings(&input.fields, loaded.preferred_format())?;

        let transformed = self.processor.transform(&loaded.image, transform);
        let data = self.processor.encode(&transformed, format, quality)?;

        Ok(ProcessedOutput {
            quality: reported_quality(format, quality),
            ..ProcessedOutput::image(data, "transformed_image", format, transformed.dimensions())
        })
    }
}

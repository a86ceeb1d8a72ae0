// src/operations/convert.rs
use super::{Operation, reported_quality};
use crate::errors::ImgDropError;
use crate::models::{OperationInput, OutputFormat, ProcessedOutput};
use crate::services::ImageProcessor;
use crate::services::image_processor::{DEFAULT_QUALITY, validate_quality};
use image::GenericImageView;
use log::debug;
use std::sync::Arc;

pub struct ConvertOperation {
    processor: Arc<ImageProcessor>,
}

impl ConvertOperation {
    pub fn new(processor: Arc<ImageProcessor>) -> Self {
        Self { processor }
    }
}

impl Operation for ConvertOperation {
    fn name(&self) -> &'static str {
        "convert"
    }

    fn description(&self) -> &'static str {
        "Re-encode in another format (jpeg, png, webp, gif, bmp, tiff)"
    }

    fn execute(&self, input: &OperationInput) -> Result<ProcessedOutput, ImgDropError> {
        let file = input.first_file()?;
        let format: OutputFormat = input.fields.required("format")?;
        let quality = validate_quality(input.fields.parse_or("quality", DEFAULT_QUALITY)?)?;

        let loaded = self.processor.load(&file.data)?;
        debug!("Converting {:?} to {}", loaded.source_format, format);
        let data = self.processor.encode(&loaded.image, format, quality)?;

        Ok(ProcessedOutput {
            quality: reported_quality(format, quality),
            ..ProcessedOutput::image(data, "converted_image", format, loaded.image.dimensions())
        })
    }
}

// src/operations/mod.rs
// Form-driven image operations and the registry the handlers dispatch through.
use crate::errors::ImgDropError;
use crate::models::{FormFields, OperationInfo, OperationInput, OutputFormat, ProcessedOutput};
use crate::services::image_processor::{DEFAULT_QUALITY, validate_quality};
use crate::services::{CaptionRenderer, ImageProcessor};
use std::sync::Arc;

pub mod bulk;
pub mod convert;
pub mod crop;
pub mod meme;
pub mod reduce;
pub mod resize;
pub mod transform;

pub use bulk::BulkResizeOperation;
pub use convert::ConvertOperation;
pub use crop::CropOperation;
pub use meme::MemeOperation;
pub use reduce::ReduceOperation;
pub use resize::ResizeOperation;
pub use transform::TransformOperation;

pub trait Operation: Send + Sync {
    fn name(&self) -> &'static str;

    /// Alternative names accepted in the `mode` form field.
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    fn description(&self) -> &'static str;

    fn execute(&self, input: &OperationInput) -> Result<ProcessedOutput, ImgDropError>;
}

pub struct OperationRegistry {
    operations: Vec<Arc<dyn Operation>>,
}

impl OperationRegistry {
    pub fn new(processor: Arc<ImageProcessor>, captions: Arc<CaptionRenderer>) -> Self {
        Self {
            operations: vec![
                Arc::new(ResizeOperation::new(processor.clone())),
                Arc::new(ReduceOperation::new(processor.clone())),
                Arc::new(CropOperation::new(processor.clone())),
                Arc::new(BulkResizeOperation::new(processor.clone())),
                Arc::new(ConvertOperation::new(processor.clone())),
                Arc::new(TransformOperation::new(processor.clone())),
                Arc::new(MemeOperation::new(processor, captions)),
            ],
        }
    }

    pub fn find(&self, name: &str) -> Option<Arc<dyn Operation>> {
        let name = name.trim().to_ascii_lowercase();
        self.operations
            .iter()
            .find(|op| op.name() == name || op.aliases().iter().any(|alias| *alias == name))
            .cloned()
    }

    pub fn list(&self) -> Vec<OperationInfo> {
        self.operations
            .iter()
            .map(|op| OperationInfo {
                name: op.name(),
                aliases: op.aliases(),
                description: op.description(),
            })
            .collect()
    }
}

/// Reads the `format` and `quality` fields shared by most operations.
pub(crate) fn output_settings(
    fields: &FormFields,
    default_format: OutputFormat,
) -> Result<(OutputFormat, u8), ImgDropError> {
    let format = fields.parse_or("format", default_format)?;
    let quality = validate_quality(fields.parse_or("quality", DEFAULT_QUALITY)?)?;
    Ok((format, quality))
}

pub(crate) fn reported_quality(format: OutputFormat, quality: u8) -> Option<u8> {
    format.honours_quality().then_some(quality)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::models::UploadedImage;

    pub(crate) fn processor() -> Arc<ImageProcessor> {
        Arc::new(ImageProcessor::new(4096))
    }

    pub(crate) fn input_with(files: Vec<(&str, Vec<u8>)>, fields: &[(&str, &str)]) -> OperationInput {
        let mut form = FormFields::default();
        for (name, value) in fields {
            form.insert(*name, *value);
        }

        OperationInput {
            files: files
                .into_iter()
                .map(|(filename, data)| UploadedImage {
                    filename: filename.to_string(),
                    data,
                })
                .collect(),
            fields: form,
        }
    }

    pub(crate) fn decode(data: &[u8]) -> image::DynamicImage {
        image::load_from_memory(data).unwrap()
    }
}

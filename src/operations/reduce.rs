// src/operations/reduce.rs
use super::Operation;
use crate::errors::ImgDropError;
use crate::models::{OperationInput, OutputFormat, ProcessedOutput, SizeUnit};
use crate::services::ImageProcessor;
use image::GenericImageView;
use log::debug;
use std::sync::Arc;

pub struct ReduceOperation {
    processor: Arc<ImageProcessor>,
}

impl ReduceOperation {
    pub fn new(processor: Arc<ImageProcessor>) -> Self {
        Self { processor }
    }
}

impl Operation for ReduceOperation {
    fn name(&self) -> &'static str {
        "reduce"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["filesize"]
    }

    fn description(&self) -> &'static str {
        "Re-encode as JPEG at the highest quality that fits a target file size"
    }

    fn execute(&self, input: &OperationInput) -> Result<ProcessedOutput, ImgDropError> {
        let file = input.first_file()?;
        let target_size: u64 = input.fields.required("target_size")?;
        if target_size == 0 {
            return Err(ImgDropError::Validation(
                "Target size must be greater than zero".to_string(),
            ));
        }
        let size_unit: SizeUnit = input.fields.parse_or("size_unit", SizeUnit::Kb)?;
        let budget = size_unit.to_bytes(target_size);

        let loaded = self.processor.load(&file.data)?;
        let reduction = self.processor.reduce_to_size(&loaded.image, budget)?;
        debug!(
            "Reduced to {} bytes at quality {} (budget {})",
            reduction.data.len(),
            reduction.quality,
            budget
        );

        let stem = format!("reduced_to_{}{}", target_size, size_unit.label());
        let mut output = ProcessedOutput::image(
            reduction.data,
            &stem,
            OutputFormat::Jpeg,
            loaded.image.dimensions(),
        );
        output.quality = Some(reduction.quality);
        if !reduction.met_target {
            output.warning = Some(
                "Could not meet the target size even at lowest quality. Result is the smallest possible."
                    .to_string(),
            );
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::test_support::{input_with, processor};
    use crate::services::image_processor::tests::{create_noise_image, create_test_png};
    use image::ImageFormat;
    use std::io::Cursor;

    fn noise_png(width: u32, height: u32) -> Vec<u8> {
        let mut buffer = Vec::new();
        create_noise_image(width, height)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn test_reduce_within_budget() {
        let op = ReduceOperation::new(processor());
        let input = input_with(
            vec![("flat.png", create_test_png(64, 64))],
            &[("target_size", "500"), ("size_unit", "KB")],
        );

        let output = op.execute(&input).unwrap();
        assert_eq!(output.filename, "reduced_to_500KB.jpg");
        assert_eq!(output.content_type, "image/jpeg");
        assert_eq!(output.quality, Some(95));
        assert!(output.warning.is_none());
        assert!(output.data.len() <= 500 * 1024);
    }

    #[test]
    fn test_reduce_unreachable_budget_warns() {
        let op = ReduceOperation::new(processor());
        let input = input_with(
            vec![("noise.png", noise_png(600, 600))],
            &[("target_size", "1"), ("size_unit", "KB")],
        );

        let output = op.execute(&input).unwrap();
        assert_eq!(output.quality, Some(5));
        assert!(output.warning.is_some());
    }

    #[test]
    fn test_reduce_rejects_zero_and_bad_unit() {
        let op = ReduceOperation::new(processor());
        let zero = input_with(
            vec![("a.png", create_test_png(8, 8))],
            &[("target_size", "0")],
        );
        assert!(op.execute(&zero).is_err());

        let bad_unit = input_with(
            vec![("a.png", create_test_png(8, 8))],
            &[("target_size", "10"), ("size_unit", "GB")],
        );
        assert!(op.execute(&bad_unit).is_err());
    }
}

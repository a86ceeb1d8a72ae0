// src/operations/meme.rs
use super::{Operation, output_settings, reported_quality};
use crate::errors::ImgDropError;
use crate::models::{OperationInput, ProcessedOutput};
use crate::services::{CaptionRenderer, ImageProcessor};
use image::GenericImageView;
use std::sync::Arc;

const MAX_FONT_SIZE: f32 = 1000.0;

pub struct MemeOperation {
    processor: Arc<ImageProcessor>,
    captions: Arc<CaptionRenderer>,
}

impl MemeOperation {
    pub fn new(processor: Arc<ImageProcessor>, captions: Arc<CaptionRenderer>) -> Self {
        Self {
            processor,
            captions,
        }
    }
}

impl Operation for MemeOperation {
    fn name(&self) -> &'static str {
        "meme"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["caption"]
    }

    fn description(&self) -> &'static str {
        "Overlay outlined top and bottom captions"
    }

    fn execute(&self, input: &OperationInput) -> Result<ProcessedOutput, ImgDropError> {
        let file = input.first_file()?;
        let fields = &input.fields;
        let top = fields.get("top_text");
        let bottom = fields.get("bottom_text");
        if top.is_none() && bottom.is_none() {
            return Err(ImgDropError::Validation(
                "Enter top text, bottom text, or both".to_string(),
            ));
        }

        let font_size: Option<f32> = fields.optional("font_size")?;
        if let Some(size) = font_size {
            if !(size > 0.0 && size <= MAX_FONT_SIZE) {
                return Err(ImgDropError::Validation(format!(
                    "Font size must be between 1 and {}",
                    MAX_FONT_SIZE
                )));
            }
        }

        let loaded = self.processor.load(&file.data)?;
        let (format, quality) = output_settings(fields, loaded.preferred_format())?;

        let captioned = self.captions.render(&loaded.image, top, bottom, font_size)?;
        let data = self.processor.encode(&captioned, format, quality)?;

        Ok(ProcessedOutput {
            quality: reported_quality(format, quality),
            ..ProcessedOutput::image(data, "meme", format, captioned.dimensions())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::test_support::{input_with, processor};
    use crate::services::caption::tests::font_renderer;
    use crate::services::image_processor::tests::create_test_png;

    fn without_font() -> MemeOperation {
        MemeOperation::new(processor(), Arc::new(CaptionRenderer::unavailable()))
    }

    #[test]
    fn test_requires_some_text() {
        let input = input_with(vec![("a.png", create_test_png(40, 40))], &[("top_text", "  ")]);
        assert!(matches!(
            without_font().execute(&input),
            Err(ImgDropError::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_bad_font_size() {
        let input = input_with(
            vec![("a.png", create_test_png(40, 40))],
            &[("top_text", "hi"), ("font_size", "-4")],
        );
        assert!(matches!(
            without_font().execute(&input),
            Err(ImgDropError::Validation(_))
        ));
    }

    #[test]
    fn test_missing_font_is_reported() {
        let input = input_with(
            vec![("a.png", create_test_png(40, 40))],
            &[("bottom_text", "such caption")],
        );
        assert!(matches!(
            without_font().execute(&input),
            Err(ImgDropError::Font(_))
        ));
    }

    #[test]
    fn test_caption_with_font() {
        let op = MemeOperation::new(processor(), Arc::new(font_renderer()));
        let input = input_with(
            vec![("a.png", create_test_png(120, 90))],
            &[("top_text", "top"), ("bottom_text", "bottom")],
        );

        let output = op.execute(&input).unwrap();
        assert_eq!(output.filename, "meme.png");
        assert_eq!((output.width, output.height), (Some(120), Some(90)));
    }
}

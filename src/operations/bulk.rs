// src/operations/bulk.rs
use super::Operation;
use super::resize::ResizeParams;
use crate::errors::ImgDropError;
use crate::models::{OperationInput, ProcessedOutput};
use crate::services::ImageProcessor;
use crate::services::archive::{ArchiveBuilder, entry_stem};
use log::{debug, warn};
use std::sync::Arc;

pub struct BulkResizeOperation {
    processor: Arc<ImageProcessor>,
}

impl BulkResizeOperation {
    pub fn new(processor: Arc<ImageProcessor>) -> Self {
        Self { processor }
    }
}

impl Operation for BulkResizeOperation {
    fn name(&self) -> &'static str {
        "bulk-resize"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["bulk"]
    }

    fn description(&self) -> &'static str {
        "Resize every uploaded image with the same settings and download them as a zip"
    }

    fn execute(&self, input: &OperationInput) -> Result<ProcessedOutput, ImgDropError> {
        input.first_file()?;
        let params = ResizeParams::from_fields(&input.fields, self.processor.max_dimension())?;

        let mut archive = ArchiveBuilder::new();
        let mut skipped = Vec::new();

        for file in &input.files {
            let resized = self
                .processor
                .load(&file.data)
                .and_then(|loaded| params.apply(&self.processor, &loaded.image));

            match resized {
                Ok((data, _)) => {
                    let name = format!(
                        "{}_resized.{}",
                        entry_stem(&file.filename),
                        params.format.extension()
                    );
                    let added = archive.add(&name, &data)?;
                    debug!("Added {} to archive", added);
                }
                Err(e) => {
                    warn!("Skipping {}: {}", file.filename, e);
                    skipped.push(file.filename.clone());
                }
            }
        }

        if archive.is_empty() {
            return Err(ImgDropError::ImageProcessing(format!(
                "None of the uploaded files could be processed: {}",
                skipped.join(", ")
            )));
        }

        let warning = (!skipped.is_empty())
            .then(|| format!("Skipped files that could not be processed: {}", skipped.join(", ")));

        Ok(ProcessedOutput {
            data: archive.finish()?,
            filename: "resized_images.zip".to_string(),
            content_type: "application/zip".to_string(),
            warning,
            width: None,
            height: None,
            quality: None,
        })
    }
}

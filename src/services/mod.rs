// src/services/mod.rs
pub mod archive;
pub mod caption;
pub mod image_processor;
pub mod output_store;
pub mod units;

pub use archive::ArchiveBuilder;
pub use caption::CaptionRenderer;
pub use image_processor::ImageProcessor;
pub use output_store::OutputStore;

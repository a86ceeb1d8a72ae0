// src/models.rs
use crate::errors::ImgDropError;
use chrono::{DateTime, Utc};
use image::ImageFormat as ImgFormat;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
    Bmp,
    Tiff,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
            OutputFormat::Gif => "gif",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Tiff => "tiff",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
            OutputFormat::Gif => "image/gif",
            OutputFormat::Bmp => "image/bmp",
            OutputFormat::Tiff => "image/tiff",
        }
    }

    pub fn image_format(self) -> ImgFormat {
        match self {
            OutputFormat::Jpeg => ImgFormat::Jpeg,
            OutputFormat::Png => ImgFormat::Png,
            OutputFormat::WebP => ImgFormat::WebP,
            OutputFormat::Gif => ImgFormat::Gif,
            OutputFormat::Bmp => ImgFormat::Bmp,
            OutputFormat::Tiff => ImgFormat::Tiff,
        }
    }

    /// Maps a detected source format onto one we can write back out.
    pub fn from_image_format(format: ImgFormat) -> Option<Self> {
        match format {
            ImgFormat::Jpeg => Some(OutputFormat::Jpeg),
            ImgFormat::Png => Some(OutputFormat::Png),
            ImgFormat::WebP => Some(OutputFormat::WebP),
            ImgFormat::Gif => Some(OutputFormat::Gif),
            ImgFormat::Bmp => Some(OutputFormat::Bmp),
            ImgFormat::Tiff => Some(OutputFormat::Tiff),
            _ => None,
        }
    }

    pub fn honours_quality(self) -> bool {
        matches!(self, OutputFormat::Jpeg | OutputFormat::WebP)
    }
}

impl FromStr for OutputFormat {
    type Err = ImgDropError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::WebP),
            "gif" => Ok(OutputFormat::Gif),
            "bmp" => Ok(OutputFormat::Bmp),
            "tiff" | "tif" => Ok(OutputFormat::Tiff),
            other => Err(ImgDropError::Validation(format!(
                "Unsupported output format: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Px,
    Cm,
    Mm,
    In,
}

impl FromStr for Unit {
    type Err = ImgDropError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "px" | "pixels" => Ok(Unit::Px),
            "cm" => Ok(Unit::Cm),
            "mm" => Ok(Unit::Mm),
            "in" | "inch" | "inches" => Ok(Unit::In),
            other => Err(ImgDropError::Validation(format!("Unknown unit: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Rotate90,
    Rotate180,
    Rotate270,
    FlipHorizontal,
    FlipVertical,
}

impl FromStr for Transform {
    type Err = ImgDropError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rotate_90" => Ok(Transform::Rotate90),
            "rotate_180" => Ok(Transform::Rotate180),
            "rotate_270" => Ok(Transform::Rotate270),
            "flip_horizontal" => Ok(Transform::FlipHorizontal),
            "flip_vertical" => Ok(Transform::FlipVertical),
            other => Err(ImgDropError::Validation(format!(
                "Unknown transform: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    Kb,
    Mb,
}

impl SizeUnit {
    pub fn to_bytes(self, amount: u64) -> u64 {
        match self {
            SizeUnit::Kb => amount.saturating_mul(1024),
            SizeUnit::Mb => amount.saturating_mul(1024 * 1024),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SizeUnit::Kb => "KB",
            SizeUnit::Mb => "MB",
        }
    }
}

impl FromStr for SizeUnit {
    type Err = ImgDropError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "KB" => Ok(SizeUnit::Kb),
            "MB" => Ok(SizeUnit::Mb),
            other => Err(ImgDropError::Validation(format!(
                "Unknown size unit: {}",
                other
            ))),
        }
    }
}

/// Text fields of a submitted form.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    values: HashMap<String, String>,
}

impl FormFields {
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Returns the trimmed value, treating blank inputs as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Checkbox semantics: present and not explicitly switched off.
    pub fn flag(&self, name: &str) -> bool {
        match self.get(name) {
            Some(v) => !matches!(v.to_ascii_lowercase().as_str(), "false" | "off" | "0" | "no"),
            None => false,
        }
    }

    pub fn required<T>(&self, name: &str) -> Result<T, ImgDropError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self
            .get(name)
            .ok_or_else(|| ImgDropError::Validation(format!("Missing field: {}", name)))?;
        Self::parse_field(name, raw)
    }

    pub fn optional<T>(&self, name: &str) -> Result<Option<T>, ImgDropError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.get(name)
            .map(|raw| Self::parse_field(name, raw))
            .transpose()
    }

    pub fn parse_or<T>(&self, name: &str, default: T) -> Result<T, ImgDropError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        Ok(self.optional(name)?.unwrap_or(default))
    }

    fn parse_field<T>(name: &str, raw: &str) -> Result<T, ImgDropError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        raw.parse::<T>().map_err(|e| {
            ImgDropError::Validation(format!("Invalid value for {}: {} ({})", name, raw, e))
        })
    }
}

#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct OperationInput {
    pub files: Vec<UploadedImage>,
    pub fields: FormFields,
}

impl OperationInput {
    pub fn first_file(&self) -> Result<&UploadedImage, ImgDropError> {
        self.files
            .first()
            .ok_or_else(|| ImgDropError::Validation("No image file selected".to_string()))
    }
}

/// Bytes produced by an operation, before they are stored.
#[derive(Debug, Clone)]
pub struct ProcessedOutput {
    pub data: Vec<u8>,
    pub filename: String,
    pub content_type: String,
    pub warning: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<u8>,
}

impl ProcessedOutput {
    pub fn image(data: Vec<u8>, stem: &str, format: OutputFormat, dimensions: (u32, u32)) -> Self {
        Self {
            data,
            filename: format!("{}.{}", stem, format.extension()),
            content_type: format.mime_type().to_string(),
            warning: None,
            width: Some(dimensions.0),
            height: Some(dimensions.1),
            quality: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredOutput {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub size: usize,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip)]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationReceipt {
    pub id: Uuid,
    pub operation: String,
    pub filename: String,
    pub content_type: String,
    pub size: usize,
    pub download_url: String,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationInfo {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
}

// src/services/archive.rs
use crate::errors::ImgDropError;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// In-memory zip archive with unique entry names.
pub struct ArchiveBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    names: HashSet<String>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            names: HashSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Adds `data` under `name`, suffixing `_1`, `_2`, ... on collisions.
    /// Returns the name actually used.
    pub fn add(&mut self, name: &str, data: &[u8]) -> Result<String, ImgDropError> {
        let name = self.unique_name(name);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        self.writer
            .start_file(name.clone(), options)
            .map_err(|e| ImgDropError::Archive(format!("Failed to add {}: {}", name, e)))?;
        self.writer
            .write_all(data)
            .map_err(|e| ImgDropError::Archive(format!("Failed to write {}: {}", name, e)))?;

        self.names.insert(name.clone());
        Ok(name)
    }

    pub fn finish(self) -> Result<Vec<u8>, ImgDropError> {
        let cursor = self
            .writer
            .finish()
            .map_err(|e| ImgDropError::Archive(format!("Failed to finalise archive: {}", e)))?;
        Ok(cursor.into_inner())
    }

    fn unique_name(&self, name: &str) -> String {
        if !self.names.contains(name) {
            return name.to_string();
        }

        let (stem, ext) = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (name, None),
        };

        (1..)
            .map(|n| match ext {
                Some(ext) => format!("{}_{}.{}", stem, n, ext),
                None => format!("{}_{}", stem, n),
            })
            .find(|candidate| !self.names.contains(candidate))
            .unwrap_or_else(|| name.to_string())
    }
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// File stem of an uploaded filename with any client-side directories removed.
pub fn entry_stem(filename: &str) -> String {
    let normalised = filename.replace('\\', "/");
    let stem = Path::new(&normalised)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .trim();

    if stem.is_empty() || stem == ".." {
        "image".to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn test_archive_round_trip_names() {
        let mut archive = ArchiveBuilder::new();
        assert_eq!(archive.add("a.jpg", b"one").unwrap(), "a.jpg");
        assert_eq!(archive.add("a.jpg", b"two").unwrap(), "a_1.jpg");
        assert_eq!(archive.add("a.jpg", b"three").unwrap(), "a_2.jpg");
        assert_eq!(archive.add("README", b"four").unwrap(), "README");
        assert_eq!(archive.add("README", b"five").unwrap(), "README_1");
        assert!(!archive.is_empty());

        let data = archive.finish().unwrap();
        let mut zip = ZipArchive::new(Cursor::new(data)).unwrap();
        assert_eq!(zip.len(), 5);

        let mut contents = String::new();
        zip.by_name("a_1.jpg")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "two");
    }

    #[test]
    fn test_entry_stem_strips_directories() {
        assert_eq!(entry_stem("holiday.png"), "holiday");
        assert_eq!(entry_stem("../../etc/passwd"), "passwd");
        assert_eq!(entry_stem("C:\\Users\\me\\cat.jpeg"), "cat");
        assert_eq!(entry_stem(""), "image");
    }
}

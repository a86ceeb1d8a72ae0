// src/services/output_store.rs
use crate::errors::ImgDropError;
use crate::models::{ProcessedOutput, StoredOutput};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::Duration;
use uuid::Uuid;

/// Ephemeral result files, indexed in memory and removed after a TTL.
pub struct OutputStore {
    dir: PathBuf,
    ttl: chrono::Duration,
    index: RwLock<HashMap<Uuid, StoredOutput>>,
}

impl OutputStore {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Result<Self, ImgDropError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| ImgDropError::Storage(format!("Invalid output TTL: {}", e)))?;

        let store = Self {
            dir,
            ttl,
            index: RwLock::new(HashMap::new()),
        };
        store.remove_orphans();

        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files are named `<id>.<ext>` so the extension drives the served MIME type.
    fn path_for(&self, id: &Uuid, filename: &str) -> PathBuf {
        match Path::new(filename).extension().and_then(|e| e.to_str()) {
            Some(ext) => self.dir.join(format!("{}.{}", id, ext)),
            None => self.dir.join(id.to_string()),
        }
    }

    pub fn save(&self, output: &ProcessedOutput) -> Result<StoredOutput, ImgDropError> {
        let id = Uuid::new_v4();
        let path = self.path_for(&id, &output.filename);
        std::fs::write(&path, &output.data)?;

        let created_at = Utc::now();
        let stored = StoredOutput {
            id,
            filename: output.filename.clone(),
            content_type: output.content_type.clone(),
            size: output.data.len(),
            created_at,
            expires_at: created_at + self.ttl,
            path,
        };

        self.index
            .write()
            .map_err(|_| ImgDropError::Internal("Output index lock poisoned".to_string()))?
            .insert(id, stored.clone());

        debug!("Stored {} ({} bytes) as {}", stored.filename, stored.size, id);
        Ok(stored)
    }

    pub fn get(&self, id: &Uuid) -> Result<StoredOutput, ImgDropError> {
        let index = self
            .index
            .read()
            .map_err(|_| ImgDropError::Internal("Output index lock poisoned".to_string()))?;

        match index.get(id) {
            Some(entry) if entry.expires_at > Utc::now() => Ok(entry.clone()),
            Some(_) => Err(ImgDropError::NotFound(format!("Output {} has expired", id))),
            None => Err(ImgDropError::NotFound(format!("Output {} not found", id))),
        }
    }

    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    /// Drops every entry whose expiry is at or before `now`.
    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let expired: Vec<StoredOutput> = {
            let mut index = self.index.write().unwrap_or_else(|e| e.into_inner());
            let ids: Vec<Uuid> = index
                .values()
                .filter(|entry| entry.expires_at <= now)
                .map(|entry| entry.id)
                .collect();
            ids.iter().filter_map(|id| index.remove(id)).collect()
        };

        for entry in &expired {
            if let Err(e) = std::fs::remove_file(&entry.path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove expired output {}: {}", entry.id, e);
                }
            }
        }

        if !expired.is_empty() {
            info!("Purged {} expired outputs", expired.len());
        }
        expired.len()
    }

    /// Files left by a previous run are unreachable once the index is gone.
    fn remove_orphans(&self) {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot scan {}: {}", self.dir.display(), e);
                return;
            }
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_output = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .is_some_and(|stem| Uuid::parse_str(stem).is_ok());
            if is_output && std::fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }

        if removed > 0 {
            info!("Removed {} outputs left from a previous run", removed);
        }
    }
}

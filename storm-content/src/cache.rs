// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Content cache for storing named artifacts locally
//!
//! The cache is a flat directory: one file per entry, the file name is the
//! cache key verbatim. Writes go to a uniquely named temp file which is then
//! renamed over the target, so readers never see a partial file and
//! concurrent writers to the same key resolve as last-writer-wins.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::integrity::hash_reader;

/// Current version of the [`CachedRecord`] envelope
pub const RECORD_FORMAT_VERSION: u32 = 1;

/// Versioned envelope for typed payloads stored in the cache
#[derive(Debug, Serialize, Deserialize)]
struct CachedRecord<T> {
    format_version: u32,
    payload: T,
}

/// File-backed key/value store for cached content
#[derive(Debug)]
pub struct ContentCache {
    cache_dir: PathBuf,
}

impl ContentCache {
    /// Create a cache rooted at `cache_dir`, creating the directory if needed
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let cache_dir = cache_dir.into();
        if cache_dir.as_os_str().is_empty() {
            return Err(CacheError::NoCachePath);
        }
        fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    /// Root directory of the cache
    pub fn root(&self) -> &Path {
        &self.cache_dir
    }

    /// On-disk location of the entry named `name`
    pub fn path_of(&self, name: &str) -> Result<PathBuf, CacheError> {
        validate_key(name)?;
        Ok(self.cache_dir.join(name))
    }

    /// Whether an entry named `name` exists
    pub fn exists(&self, name: &str) -> bool {
        self.path_of(name).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Time elapsed since the entry was last written
    ///
    /// A missing entry is [`CacheError::NotFound`]. A modification time in
    /// the future (clock skew) reads as zero.
    pub fn age(&self, name: &str) -> Result<Duration, CacheError> {
        let path = self.path_of(name)?;
        let modified = fs::metadata(&path)
            .and_then(|meta| meta.modified())
            .map_err(|e| map_io(name, e))?;
        Ok(SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO))
    }

    /// Read the raw bytes of an entry
    pub fn read(&self, name: &str) -> Result<Vec<u8>, CacheError> {
        let path = self.path_of(name)?;
        fs::read(&path).map_err(|e| map_io(name, e))
    }

    /// Read an entry, treating any failure as absence
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        match self.read(name) {
            Ok(data) => Some(data),
            Err(CacheError::NotFound(_)) => None,
            Err(e) => {
                debug!("Cache read of {} failed: {}", name, e);
                None
            }
        }
    }

    /// Read an entry as UTF-8 text
    pub fn read_text(&self, name: &str) -> Result<String, CacheError> {
        Ok(String::from_utf8(self.read(name)?)?)
    }

    /// Read an entry as an untyped JSON document
    pub fn read_json(&self, name: &str) -> Result<serde_json::Value, CacheError> {
        self.read_json_as(name)
    }

    /// Read an entry as JSON into `T`
    pub fn read_json_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, CacheError> {
        let text = self.read_text(name)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Write an entry, replacing any previous content
    pub fn write(&self, name: &str, data: &[u8]) -> Result<(), CacheError> {
        let path = self.path_of(name)?;
        atomic_write(&path, data).inspect_err(|e| {
            warn!("Failed to write cache entry {}: {}", name, e);
        })?;
        debug!("Cached {} ({} bytes)", name, data.len());
        Ok(())
    }

    /// Store a typed value inside a versioned record envelope
    pub fn write_record<T: Serialize>(&self, name: &str, value: &T) -> Result<(), CacheError> {
        let record = CachedRecord {
            format_version: RECORD_FORMAT_VERSION,
            payload: value,
        };
        let data = serde_json::to_vec(&record)?;
        self.write(name, &data)
    }

    /// Load a typed value written by [`ContentCache::write_record`]
    pub fn read_record<T: DeserializeOwned>(&self, name: &str) -> Result<T, CacheError> {
        let record: CachedRecord<serde_json::Value> = self.read_json_as(name)?;
        if record.format_version != RECORD_FORMAT_VERSION {
            return Err(CacheError::UnsupportedFormat(record.format_version));
        }
        Ok(serde_json::from_value(record.payload)?)
    }

    /// Remove an entry; true iff a file was actually deleted
    pub fn delete(&self, name: &str) -> bool {
        let Ok(path) = self.path_of(name) else {
            return false;
        };
        match fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!("Failed to delete cache entry {}: {}", name, e);
                false
            }
        }
    }

    /// MD5 digest of an entry's contents, lowercase hex
    pub fn hash(&self, name: &str) -> Result<String, CacheError> {
        let path = self.path_of(name)?;
        let file = File::open(&path).map_err(|e| map_io(name, e))?;
        Ok(hash_reader(io::BufReader::new(file))?)
    }
}

/// Reject keys that would escape the flat cache layout
fn validate_key(name: &str) -> Result<(), CacheError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(CacheError::InvalidKey(name.to_string()));
    }
    Ok(())
}

fn map_io(name: &str, err: io::Error) -> CacheError {
    if err.kind() == io::ErrorKind::NotFound {
        CacheError::NotFound(name.to_string())
    } else {
        CacheError::Io(err)
    }
}

/// Atomic file write (write to a unique temp file, then rename)
///
/// Either the old content remains or the new content is fully written.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> Result<(), CacheError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CacheError::InvalidKey(path.display().to_string()))?;
    let temp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

    if let Err(e) = fs::write(&temp_path, data) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    Ok(())
}

/// Errors that can occur with the content cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// No cache directory was configured
    #[error("No cache path given")]
    NoCachePath,

    /// Key is not a plain file name
    #[error("Invalid cache key: {0:?}")]
    InvalidKey(String),

    /// Requested entry does not exist
    #[error("Cache entry not found: {0}")]
    NotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Entry is not valid UTF-8
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Record envelope has an unknown version
    #[error("Unsupported record format version {0}")]
    UnsupportedFormat(u32),
}

impl CacheError {
    /// Whether this error means the entry is absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound(_))
    }

    /// Whether the bytes were present but could not be decoded
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            CacheError::Utf8(_) | CacheError::Json(_) | CacheError::UnsupportedFormat(_)
        )
    }
}

//! Bundle manifest timestamp

use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;

/// Source of the last applied update timestamp
pub trait TimestampSource: Send + Sync {
    /// Timestamp of the installed bundle, if one is known
    fn read_timestamp(&self) -> Option<i64>;
}

#[derive(Debug, Deserialize)]
struct ManifestTimestamp {
    timestamp: i64,
}

/// Reads the `timestamp` field of an installed bundle's `manifest.json`
#[derive(Debug, Clone)]
pub struct BundleManifest {
    path: PathBuf,
}

impl BundleManifest {
    /// Reader for the manifest at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TimestampSource for BundleManifest {
    fn read_timestamp(&self) -> Option<i64> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(e) => {
                debug!("No bundle manifest at {}: {}", self.path.display(), e);
                return None;
            }
        };
        match serde_json::from_slice::<ManifestTimestamp>(&data) {
            Ok(manifest) => Some(manifest.timestamp),
            Err(e) => {
                debug!("Unreadable bundle manifest {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

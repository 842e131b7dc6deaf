// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Inter-app identifier resolution
//!
//! Bundles ship a `data/identifiers.json` file mapping CMS app IDs to the
//! platform packages of other apps, used for inter-app linking:
//!
//! ```json
//! {
//!   "ARC_STORM-1-1": {
//!     "android": { "packageName": "com.cube.arc.fa" },
//!     "ios": { "iTunesId": "529160691", "launcher": "ARCFA://" },
//!     "name": { "en": "First aid" }
//!   }
//! }
//! ```
//!
//! Only the Android package name is kept.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Map from CMS app ID to Android package name
pub type AppIdentifierMap = HashMap<String, String>;

/// Resolves CMS app IDs to package names
///
/// Each successful load swaps in a complete new map; readers always see
/// either the old or the new snapshot, never a mix.
#[derive(Debug, Default)]
pub struct IdentifierResolver {
    apps: RwLock<Option<Arc<AppIdentifierMap>>>,
}

impl IdentifierResolver {
    /// Create a resolver with no map loaded
    pub fn new() -> Self {
        Self::default()
    }

    /// Load identifiers from raw JSON bytes
    ///
    /// Entries without an `android.packageName` string are skipped. A
    /// document that is not UTF-8, not JSON, or not an object fails the
    /// whole load and leaves the previous map in place.
    ///
    /// Returns the number of apps loaded.
    pub fn load_apps(&self, data: &[u8]) -> Result<usize, IdentifierError> {
        let text = std::str::from_utf8(data)?;
        let document: Value = serde_json::from_str(text)?;
        let Value::Object(entries) = document else {
            return Err(IdentifierError::NotAnObject);
        };

        let mut apps = AppIdentifierMap::with_capacity(entries.len());
        for (app_id, value) in entries {
            match android_package(&value) {
                Some(package) => {
                    apps.insert(app_id, package.to_string());
                }
                None => warn!("Skipping identifier {}: no android.packageName", app_id),
            }
        }

        let count = apps.len();
        *self.apps.write() = Some(Arc::new(apps));
        debug!("Loaded {} app identifiers", count);
        Ok(count)
    }

    /// Load identifiers from a file on disk
    pub fn load_apps_from_file(&self, path: &Path) -> Result<usize, IdentifierError> {
        let data = std::fs::read(path)?;
        self.load_apps(&data)
    }

    /// Drop the loaded map; lookups resolve nothing until the next load
    pub fn clear(&self) {
        *self.apps.write() = None;
    }

    /// Look up the package name for a CMS app ID
    pub fn resolve(&self, id: &str) -> Option<String> {
        self.apps.read().as_ref()?.get(id).cloned()
    }

    /// Whether a map has been loaded
    pub fn is_loaded(&self) -> bool {
        self.apps.read().is_some()
    }

    /// Number of loaded identifiers (zero when nothing is loaded)
    pub fn len(&self) -> usize {
        self.apps.read().as_ref().map_or(0, |apps| apps.len())
    }

    /// Whether no identifiers are available
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current snapshot of the map, if loaded
    pub fn snapshot(&self) -> Option<Arc<AppIdentifierMap>> {
        self.apps.read().clone()
    }
}

fn android_package(value: &Value) -> Option<&str> {
    value.get("android")?.get("packageName")?.as_str()
}

/// Errors that abort an identifier load
#[derive(Debug, Error)]
pub enum IdentifierError {
    /// IO error reading the identifiers file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Document is not UTF-8
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Document is not JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Top level is not a JSON object
    #[error("Identifiers document is not a JSON object")]
    NotAnObject,
}

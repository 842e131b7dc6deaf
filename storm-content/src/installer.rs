// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Bundle installation
//!
//! Bundles arrive as gzip-compressed tar archives. A full bundle replaces
//! the bundle directory wholesale; a delta bundle is unpacked over it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::types::{Bundle, BundleKind};

/// Applies downloaded bundles to local storage
pub trait BundleInstaller: Send + Sync {
    /// Install a bundle
    fn apply(&self, bundle: &Bundle) -> Result<(), InstallError>;
}

/// Installs tar.gz bundles into a directory
#[derive(Debug, Clone)]
pub struct ArchiveInstaller {
    bundle_dir: PathBuf,
}

impl ArchiveInstaller {
    /// Installer targeting `bundle_dir`
    pub fn new(bundle_dir: impl Into<PathBuf>) -> Self {
        Self {
            bundle_dir: bundle_dir.into(),
        }
    }

    /// Directory bundles are installed into
    pub fn bundle_dir(&self) -> &Path {
        &self.bundle_dir
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let name = self
            .bundle_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bundle".to_string());
        self.bundle_dir.with_file_name(format!("{}.{}", name, suffix))
    }

    /// Unpack into a staging directory, then swap it in
    fn install_full(&self, data: &[u8]) -> Result<(), InstallError> {
        let staging = self.sibling("staging");
        remove_dir_if_exists(&staging)?;
        fs::create_dir_all(&staging)?;

        if let Err(e) = unpack(data, &staging) {
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }

        let previous = self.sibling("previous");
        remove_dir_if_exists(&previous)?;
        if self.bundle_dir.exists() {
            fs::rename(&self.bundle_dir, &previous)?;
        }
        if let Err(e) = fs::rename(&staging, &self.bundle_dir) {
            // Put the old bundle back so the app keeps working
            if previous.exists() {
                let _ = fs::rename(&previous, &self.bundle_dir);
            }
            return Err(e.into());
        }
        // The new bundle is in place; a leftover is cleared before the next swap
        if let Err(e) = remove_dir_if_exists(&previous) {
            warn!("Failed to remove {}: {}", previous.display(), e);
        }
        Ok(())
    }

    fn install_delta(&self, data: &[u8]) -> Result<(), InstallError> {
        fs::create_dir_all(&self.bundle_dir)?;
        unpack(data, &self.bundle_dir)
    }
}

impl BundleInstaller for ArchiveInstaller {
    fn apply(&self, bundle: &Bundle) -> Result<(), InstallError> {
        debug!(
            "Installing {} ({} bytes) into {}",
            bundle.kind,
            bundle.data.len(),
            self.bundle_dir.display()
        );
        match bundle.kind {
            BundleKind::Full => self.install_full(&bundle.data)?,
            BundleKind::Delta { .. } => self.install_delta(&bundle.data)?,
        }
        info!("Installed {}", bundle.kind);
        Ok(())
    }
}

/// Unpack a tar.gz archive; entries escaping `dest` are refused by `tar`
fn unpack(data: &[u8], dest: &Path) -> Result<(), InstallError> {
    let mut archive = Archive::new(GzDecoder::new(data));
    archive.set_preserve_permissions(false);
    archive.unpack(dest).map_err(InstallError::Archive)
}

fn remove_dir_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Errors that can occur while installing a bundle
#[derive(Debug, Error)]
pub enum InstallError {
    /// Filesystem error around the bundle directory
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Archive is corrupt or could not be unpacked
    #[error("Invalid bundle archive: {0}")]
    Archive(io::Error),

    /// Installation task did not run to completion
    #[error("Installation interrupted: {0}")]
    Interrupted(String),
}

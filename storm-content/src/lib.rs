// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Storm Content Library
//!
//! Content delivery for Storm mobile apps:
//! - A flat, file-backed cache of named artifacts with MD5 content digests
//! - Full and timestamp-based delta bundle updates from the CMS, with
//!   single-flight requests and cooperative cancellation
//! - Resolution of inter-app identifiers shipped in the bundle
//!
//! Every component is an explicitly constructed value; share them with
//! `Arc` rather than through global state.

mod cache;
mod config;
mod fetcher;
mod identifiers;
mod installer;
mod integrity;
mod manager;
mod manifest;
mod types;
mod update;

pub use async_trait::async_trait;
pub use cache::{CacheError, ContentCache, RECORD_FORMAT_VERSION};
pub use config::{ContentConfig, Environment};
#[cfg(feature = "http")]
pub use fetcher::HttpBundleTransport;
pub use fetcher::{BundleTransport, FetchError};
pub use identifiers::{AppIdentifierMap, IdentifierError, IdentifierResolver};
pub use installer::{ArchiveInstaller, BundleInstaller, InstallError};
pub use integrity::{compute_hash, hash_reader};
pub use manager::{ContentError, ContentManager, LAST_CHECK_KEY};
pub use manifest::{BundleManifest, TimestampSource};
pub use types::{Bundle, BundleKind, UpdateOutcome, UpdateReport, UpdateState};
pub use update::{UpdateCoordinator, UpdateError};

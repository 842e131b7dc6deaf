//! Mobile-friendly records and enums.

use std::path::PathBuf;
use std::time::Duration;

use storm_content::{BundleKind, ContentConfig, Environment, UpdateOutcome};

/// Configuration for the content system.
#[derive(Debug, Clone, uniffi::Record)]
pub struct MobileContentConfig {
    /// App-private directory holding the cache and installed bundle
    pub storage_dir: String,
    /// CMS base URL
    pub content_base_url: String,
    /// CMS app identifier
    pub app_id: String,
    /// Request unpublished content
    pub use_test_environment: bool,
    /// Screen density bucket, e.g. "x2.0"
    pub density: String,
    /// Whether remote updates are enabled
    pub remote_updates_enabled: bool,
    /// Optional proxy URL
    pub proxy_url: Option<String>,
}

impl MobileContentConfig {
    pub fn to_core_config(&self) -> ContentConfig {
        let environment = if self.use_test_environment {
            Environment::Test
        } else {
            Environment::Live
        };
        let mut config = ContentConfig {
            content_base_url: self.content_base_url.clone(),
            app_id: self.app_id.clone(),
            density: self.density.clone(),
            remote_updates_enabled: self.remote_updates_enabled,
            proxy_url: self.proxy_url.clone(),
            ..ContentConfig::with_storage_path(PathBuf::from(&self.storage_dir))
        }
        .with_environment(environment);

        // Proxied connections are slower
        if config.proxy_url.is_some() {
            config.timeout = Duration::from_secs(60);
        }

        config
    }
}

/// Kind of bundle that was installed.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum MobileBundleKind {
    /// Complete snapshot
    Full,
    /// Changes since a timestamp
    Delta { since: i64 },
}

impl From<BundleKind> for MobileBundleKind {
    fn from(kind: BundleKind) -> Self {
        match kind {
            BundleKind::Full => MobileBundleKind::Full,
            BundleKind::Delta { since } => MobileBundleKind::Delta { since },
        }
    }
}

/// Result of an update check that did not fail.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum MobileUpdateOutcome {
    /// New content was downloaded and installed
    Completed {
        kind: MobileBundleKind,
        size_bytes: u64,
    },
    /// Nothing newer on the server
    UpToDate,
    /// The request was cancelled
    Cancelled,
}

impl From<UpdateOutcome> for MobileUpdateOutcome {
    fn from(outcome: UpdateOutcome) -> Self {
        match outcome {
            UpdateOutcome::Completed(report) => MobileUpdateOutcome::Completed {
                kind: report.kind.into(),
                size_bytes: report.size_bytes,
            },
            UpdateOutcome::UpToDate => MobileUpdateOutcome::UpToDate,
            UpdateOutcome::Cancelled => MobileUpdateOutcome::Cancelled,
        }
    }
}

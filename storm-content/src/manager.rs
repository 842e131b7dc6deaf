//! Content Manager - entry point for the content system
//!
//! The ContentManager wires together:
//! - The content cache (named artifacts)
//! - The identifier resolver (inter-app links)
//! - The update coordinator (bundle downloads)
//!
//! and keeps the resolver in sync with the installed bundle.

use std::sync::Arc;
use std::time::SystemTime;

use thiserror::Error;
use tracing::{debug, warn};

use super::cache::{CacheError, ContentCache};
use super::config::ContentConfig;
#[cfg(feature = "http")]
use super::fetcher::HttpBundleTransport;
use super::fetcher::{BundleTransport, FetchError};
use super::identifiers::{IdentifierError, IdentifierResolver};
use super::installer::BundleInstaller;
#[cfg(feature = "http")]
use super::installer::ArchiveInstaller;
use super::manifest::TimestampSource;
#[cfg(feature = "http")]
use super::manifest::BundleManifest;
use super::types::{UpdateOutcome, UpdateState};
use super::update::{UpdateCoordinator, UpdateError};

/// Cache key recording when updates were last checked
pub const LAST_CHECK_KEY: &str = "last_check";

/// Owns the cache, identifiers and update coordinator for one app
pub struct ContentManager {
    config: ContentConfig,
    cache: Arc<ContentCache>,
    identifiers: Arc<IdentifierResolver>,
    coordinator: UpdateCoordinator,
}

impl ContentManager {
    /// Create a manager with the default collaborators
    ///
    /// Uses the bundle manifest for timestamps, the HTTP transport and the
    /// archive installer.
    #[cfg(feature = "http")]
    pub fn new(config: ContentConfig) -> Result<Self, ContentError> {
        let transport = Arc::new(HttpBundleTransport::new(&config)?);
        let installer = Arc::new(ArchiveInstaller::new(&config.bundle_path));
        let timestamps = Arc::new(BundleManifest::new(config.manifest_path()));
        Self::with_parts(config, timestamps, transport, installer)
    }

    /// Create a manager over custom collaborators
    pub fn with_parts(
        config: ContentConfig,
        timestamps: Arc<dyn TimestampSource>,
        transport: Arc<dyn BundleTransport>,
        installer: Arc<dyn BundleInstaller>,
    ) -> Result<Self, ContentError> {
        let cache = Arc::new(ContentCache::new(&config.cache_path)?);
        let identifiers = Arc::new(IdentifierResolver::new());
        let coordinator = UpdateCoordinator::new(timestamps, transport, installer);

        let manager = Self {
            config,
            cache,
            identifiers,
            coordinator,
        };
        // A missing identifiers file is normal before the first install
        if manager.config.identifiers_path().exists() {
            if let Err(e) = manager.reload_identifiers() {
                warn!("Failed to load identifiers: {}", e);
            }
        }
        Ok(manager)
    }

    /// Reload identifiers from the installed bundle
    pub fn reload_identifiers(&self) -> Result<usize, ContentError> {
        Ok(self
            .identifiers
            .load_apps_from_file(&self.config.identifiers_path())?)
    }

    /// Look up the package name for a CMS app ID
    pub fn app_package_name(&self, id: &str) -> Option<String> {
        self.identifiers.resolve(id)
    }

    /// Download and install the latest full bundle
    pub async fn check_for_bundle(&self) -> Result<UpdateOutcome, UpdateError> {
        let outcome = self.coordinator.check_for_bundle().await?;
        self.after_update(&outcome);
        Ok(outcome)
    }

    /// Download and install changes since the installed bundle
    pub async fn check_for_updates(&self) -> Result<UpdateOutcome, UpdateError> {
        let outcome = self.coordinator.check_for_updates().await?;
        self.after_update(&outcome);
        Ok(outcome)
    }

    /// Download and install changes published after `since`
    pub async fn check_for_updates_since(&self, since: i64) -> Result<UpdateOutcome, UpdateError> {
        let outcome = self.coordinator.check_for_updates_since(since).await?;
        self.after_update(&outcome);
        Ok(outcome)
    }

    /// Cancel the in-flight update request, if any
    pub fn cancel_pending_requests(&self) -> bool {
        self.coordinator.cancel_pending_requests()
    }

    /// Whether an update request is running
    pub fn update_state(&self) -> UpdateState {
        self.coordinator.state()
    }

    /// Check if an update check should be performed now
    pub fn should_check_now(&self) -> bool {
        if !self.config.remote_updates_enabled {
            return false;
        }

        match self.cache.age(LAST_CHECK_KEY) {
            Ok(elapsed) => elapsed >= self.config.check_interval,
            // Never checked before
            Err(_) => true,
        }
    }

    /// Record that an update check was performed
    pub fn record_check_time(&self) -> Result<(), ContentError> {
        let secs = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.cache
            .write(LAST_CHECK_KEY, secs.to_string().as_bytes())?;
        Ok(())
    }

    fn after_update(&self, outcome: &UpdateOutcome) {
        if matches!(outcome, UpdateOutcome::Cancelled) {
            return;
        }
        if let Err(e) = self.record_check_time() {
            warn!("Failed to record update check time: {}", e);
        }
        if !outcome.is_completed() {
            return;
        }
        // A bundle without an identifiers file must not keep serving the
        // previous bundle's links
        if !self.config.identifiers_path().exists() {
            debug!("Installed bundle has no identifiers; clearing");
            self.identifiers.clear();
            return;
        }
        match self.reload_identifiers() {
            Ok(count) => debug!("Reloaded {} identifiers after update", count),
            Err(e) => warn!("Identifiers not reloaded: {}", e),
        }
    }

    /// Shared handle to the cache
    pub fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }

    /// Shared handle to the identifier resolver
    pub fn identifiers(&self) -> &Arc<IdentifierResolver> {
        &self.identifiers
    }

    /// Get the configuration
    pub fn config(&self) -> &ContentConfig {
        &self.config
    }
}

/// Errors that can occur with the content manager
#[derive(Debug, Error)]
pub enum ContentError {
    /// Cache error
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Identifier load error
    #[error("Identifier error: {0}")]
    Identifiers(#[from] IdentifierError),

    /// Transport setup error
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
}

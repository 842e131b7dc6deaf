//! Storm Content Mobile Bindings
//!
//! UniFFI bindings for Android and iOS platforms.
//! Exposes the content cache, app identifiers and bundle updates on top of
//! storm-content.
//!
//! Note: update checks block the calling thread on an owned runtime, so
//! platforms should call them off the UI thread.

use std::sync::Arc;

use storm_content::{ContentManager, UpdateState};
use tracing::info;

mod error;
mod types;

pub use error::MobileError;
pub use types::{MobileBundleKind, MobileContentConfig, MobileUpdateOutcome};

uniffi::setup_scaffolding!();

/// Main entry point for the mobile content API.
#[derive(uniffi::Object)]
pub struct StormContentMobile {
    manager: ContentManager,
    runtime: tokio::runtime::Runtime,
}

#[uniffi::export]
impl StormContentMobile {
    /// Create a new instance, loading app identifiers from any installed bundle.
    #[uniffi::constructor]
    pub fn new(config: MobileContentConfig) -> Result<Arc<Self>, MobileError> {
        if config.storage_dir.is_empty() {
            return Err(MobileError::InvalidInput(
                "storage_dir must not be empty".to_string(),
            ));
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("storm-content")
            .enable_all()
            .build()
            .map_err(|e| MobileError::Internal(e.to_string()))?;

        let manager = ContentManager::new(config.to_core_config())?;
        info!(
            app_id = %config.app_id,
            apps = manager.identifiers().len(),
            "content manager ready"
        );

        Ok(Arc::new(StormContentMobile { manager, runtime }))
    }

    // === Cache ===

    pub fn file_exists(&self, name: String) -> bool {
        self.manager.cache().exists(&name)
    }

    pub fn read_file(&self, name: String) -> Result<Vec<u8>, MobileError> {
        Ok(self.manager.cache().read(&name)?)
    }

    pub fn read_file_as_string(&self, name: String) -> Result<String, MobileError> {
        Ok(self.manager.cache().read_text(&name)?)
    }

    pub fn write_file(&self, name: String, data: Vec<u8>) -> Result<(), MobileError> {
        Ok(self.manager.cache().write(&name, &data)?)
    }

    /// Returns true if the file existed and was removed.
    pub fn remove_file(&self, name: String) -> bool {
        self.manager.cache().delete(&name)
    }

    /// Lowercase hex MD5 of the cached file.
    pub fn file_hash(&self, name: String) -> Result<String, MobileError> {
        Ok(self.manager.cache().hash(&name)?)
    }

    /// Milliseconds since the file was last written.
    pub fn file_age_ms(&self, name: String) -> Result<u64, MobileError> {
        let age = self.manager.cache().age(&name)?;
        Ok(u64::try_from(age.as_millis()).unwrap_or(u64::MAX))
    }

    // === App identifiers ===

    /// Replace the identifier map from a JSON document. Returns the entry count.
    pub fn load_apps(&self, data: Vec<u8>) -> Result<u32, MobileError> {
        let count = self.manager.identifiers().load_apps(&data)?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    pub fn app_package_name(&self, id: String) -> Option<String> {
        self.manager.app_package_name(&id)
    }

    // === Updates ===

    pub fn check_for_bundle(&self) -> Result<MobileUpdateOutcome, MobileError> {
        let outcome = self.runtime.block_on(self.manager.check_for_bundle())?;
        Ok(outcome.into())
    }

    pub fn check_for_updates(&self) -> Result<MobileUpdateOutcome, MobileError> {
        let outcome = self.runtime.block_on(self.manager.check_for_updates())?;
        Ok(outcome.into())
    }

    pub fn check_for_updates_since(&self, since: i64) -> Result<MobileUpdateOutcome, MobileError> {
        let outcome = self
            .runtime
            .block_on(self.manager.check_for_updates_since(since))?;
        Ok(outcome.into())
    }

    /// Cancel the in-flight update, if any. Returns true if one was cancelled.
    pub fn cancel_pending_requests(&self) -> bool {
        self.manager.cancel_pending_requests()
    }

    pub fn is_update_in_progress(&self) -> bool {
        self.manager.update_state() != UpdateState::Idle
    }

    /// Whether the check interval has elapsed since the last update check.
    pub fn should_check_now(&self) -> bool {
        self.manager.should_check_now()
    }
}

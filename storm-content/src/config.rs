//! Configuration for content caching and bundle updates

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// CMS environment to request bundles from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Published content
    #[default]
    Live,
    /// Unpublished content for QA builds
    Test,
}

impl Environment {
    /// Query string value understood by the CMS
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Live => "live",
            Environment::Test => "test",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for the content system
#[derive(Debug, Clone)]
pub struct ContentConfig {
    /// Directory for the flat content cache
    pub cache_path: PathBuf,

    /// Directory the unpacked bundle lives in
    pub bundle_path: PathBuf,

    /// CMS base URL, without a trailing slash
    pub content_base_url: String,

    /// API version path segment (e.g., "v1.0")
    pub api_version: String,

    /// CMS app identifier
    pub app_id: String,

    /// CMS environment
    pub environment: Environment,

    /// Screen density bucket sent with bundle requests
    pub density: String,

    /// Enable/disable remote updates
    pub remote_updates_enabled: bool,

    /// Minimum interval between update checks
    pub check_interval: Duration,

    /// HTTP timeout for fetches
    pub timeout: Duration,

    /// Maximum bundle size (bytes)
    pub max_bundle_size: u64,

    /// Proxy URL
    pub proxy_url: Option<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from("cache"),
            bundle_path: PathBuf::from("bundle"),
            content_base_url: String::new(),
            api_version: "v1.0".to_string(),
            app_id: String::new(),
            environment: Environment::Live,
            density: "x1.0".to_string(),
            remote_updates_enabled: true,
            check_interval: Duration::from_secs(3600), // 1 hour
            timeout: Duration::from_secs(30),
            max_bundle_size: 50 * 1024 * 1024, // 50 MB
            proxy_url: None,
        }
    }
}

impl ContentConfig {
    /// Configuration with cache and bundle directories under `storage_path`
    pub fn with_storage_path(storage_path: impl Into<PathBuf>) -> Self {
        let storage_path = storage_path.into();
        Self {
            cache_path: storage_path.join("cache"),
            bundle_path: storage_path.join("bundle"),
            ..Default::default()
        }
    }

    /// Configure with custom proxy
    pub fn with_proxy(mut self, proxy_url: String) -> Self {
        self.proxy_url = Some(proxy_url);
        self
    }

    /// Select the CMS environment
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Disable remote updates (use the installed bundle only)
    pub fn without_remote_updates(mut self) -> Self {
        self.remote_updates_enabled = false;
        self
    }

    /// Location of the bundle manifest
    pub fn manifest_path(&self) -> PathBuf {
        self.bundle_path.join("manifest.json")
    }

    /// Location of the inter-app identifiers file
    pub fn identifiers_path(&self) -> PathBuf {
        self.bundle_path.join("data").join("identifiers.json")
    }
}

//! Gatekeeper configuration: cache version, scope and app shell manifest.

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

/// Error type for configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Cannot resolve '{path}' against scope: {source}")]
    Resolve {
        path: String,
        #[source]
        source: url::ParseError,
    },
}

/// Identifier for one generation of cached entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheVersion(String);

impl CacheVersion {
    /// Create a cache version.
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// Get the version string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered list of relative asset paths needed to boot offline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppShellManifest {
    paths: Vec<String>,
}

impl AppShellManifest {
    /// Create a manifest from relative paths.
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// The relative paths, in order.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the manifest lists no assets.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Resolve every path against the scope URL.
    pub fn resolve(&self, scope: &Url) -> Result<Vec<Url>, ConfigError> {
        self.paths
            .iter()
            .map(|path| {
                scope.join(path).map_err(|source| ConfigError::Resolve {
                    path: path.clone(),
                    source,
                })
            })
            .collect()
    }
}

impl Default for AppShellManifest {
    fn default() -> Self {
        Self::new([
            "./",
            "./index.html",
            "./manifest.json",
            "./icons/icon-192.png",
            "./icons/icon-512.png",
            "./icons/maskable-192.png",
            "./icons/maskable-512.png",
        ])
    }
}

/// Configuration for one deployment of the gatekeeper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatekeeperConfig {
    /// Name of the current cache generation.
    pub cache_version: CacheVersion,
    /// Location the worker controls; its origin is the same-origin boundary.
    pub scope: Url,
    /// Navigation document, relative to the scope.
    #[serde(default = "default_shell_document")]
    pub shell_document: String,
    /// Assets cached at install time.
    #[serde(default)]
    pub app_shell: AppShellManifest,
    /// Body served for navigations when offline with no cached shell.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,
}

fn default_shell_document() -> String {
    "index.html".to_string()
}

fn default_offline_page() -> String {
    "<h1>Offline</h1>".to_string()
}

impl GatekeeperConfig {
    /// Create a configuration with the default app shell.
    pub fn new(cache_version: impl Into<String>, scope: Url) -> Self {
        Self {
            cache_version: CacheVersion::new(cache_version),
            scope,
            shell_document: default_shell_document(),
            app_shell: AppShellManifest::default(),
            offline_page: default_offline_page(),
        }
    }

    /// Set the navigation document path.
    pub fn with_shell_document(mut self, path: impl Into<String>) -> Self {
        self.shell_document = path.into();
        self
    }

    /// Set the app shell manifest.
    pub fn with_app_shell(mut self, manifest: AppShellManifest) -> Self {
        self.app_shell = manifest;
        self
    }

    /// Set the offline fallback page body.
    pub fn with_offline_page(mut self, html: impl Into<String>) -> Self {
        self.offline_page = html.into();
        self
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file (`.json` as JSON, anything else as TOML).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Check the invariants the gatekeeper relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_version.as_str().trim().is_empty() {
            return Err(ConfigError::Invalid("cache_version must not be empty".into()));
        }

        if self.scope.cannot_be_a_base() || self.scope.host().is_none() {
            return Err(ConfigError::Invalid(format!(
                "scope must be a hierarchical URL with a host: {}",
                self.scope
            )));
        }

        // Relative paths resolve against the last '/' of the scope.
        if !self.scope.path().ends_with('/') {
            return Err(ConfigError::Invalid(format!(
                "scope path must end with '/': {}",
                self.scope
            )));
        }

        if self.shell_document.trim().is_empty() {
            return Err(ConfigError::Invalid("shell_document must not be empty".into()));
        }

        let shell = self.shell_document_url()?;
        if shell.origin() != self.scope.origin() {
            return Err(ConfigError::Invalid(format!(
                "shell_document must be same-origin with the scope: {}",
                shell
            )));
        }

        self.app_shell.resolve(&self.scope)?;
        Ok(())
    }

    /// Absolute URL of the navigation document.
    pub fn shell_document_url(&self) -> Result<Url, ConfigError> {
        self.scope
            .join(&self.shell_document)
            .map_err(|source| ConfigError::Resolve {
                path: self.shell_document.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> Url {
        Url::parse("https://app.example/").unwrap()
    }

    // === AppShellManifest Tests ===

    #[test]
    fn test_manifest_default_paths() {
        let manifest = AppShellManifest::default();

        assert_eq!(manifest.len(), 7);
        assert_eq!(manifest.paths()[0], "./");
        assert_eq!(manifest.paths()[1], "./index.html");
    }

    #[test]
    fn test_manifest_resolve() {
        let manifest = AppShellManifest::new(["./", "./icons/icon-192.png"]);
        let urls = manifest.resolve(&Url::parse("https://app.example/pwa/").unwrap()).unwrap();

        assert_eq!(urls[0].as_str(), "https://app.example/pwa/");
        assert_eq!(urls[1].as_str(), "https://app.example/pwa/icons/icon-192.png");
    }

    // === GatekeeperConfig Tests ===

    #[test]
    fn test_config_new_defaults() {
        let config = GatekeeperConfig::new("v1.0.0", scope());

        assert_eq!(config.cache_version.as_str(), "v1.0.0");
        assert_eq!(config.shell_document, "index.html");
        assert_eq!(config.offline_page, "<h1>Offline</h1>");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_shell_document_url() {
        let config = GatekeeperConfig::new("v1", Url::parse("https://app.example/pwa/").unwrap());

        assert_eq!(
            config.shell_document_url().unwrap().as_str(),
            "https://app.example/pwa/index.html"
        );
    }

    #[test]
    fn test_config_from_toml() {
        let config = GatekeeperConfig::from_toml_str(
            r#"
            cache_version = "v2"
            scope = "https://app.example/"
            app_shell = ["./", "./index.html"]
            "#,
        )
        .unwrap();

        assert_eq!(config.cache_version, CacheVersion::new("v2"));
        assert_eq!(config.app_shell.len(), 2);
        assert_eq!(config.shell_document, "index.html");
    }

    #[test]
    fn test_config_from_json() {
        let config = GatekeeperConfig::from_json_str(
            r#"{"cache_version": "v3", "scope": "https://app.example/", "offline_page": "<p>gone</p>"}"#,
        )
        .unwrap();

        assert_eq!(config.offline_page, "<p>gone</p>");
        assert_eq!(config.app_shell, AppShellManifest::default());
    }

    #[test]
    fn test_config_rejects_empty_version() {
        let config = GatekeeperConfig::new("  ", scope());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_config_rejects_scope_without_trailing_slash() {
        let config = GatekeeperConfig::new("v1", Url::parse("https://app.example/pwa").unwrap());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_config_rejects_cross_origin_shell() {
        let config = GatekeeperConfig::new("v1", scope())
            .with_shell_document("https://cdn.example/index.html");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_config_parse_error() {
        let result = GatekeeperConfig::from_toml_str("cache_version = ");
        assert!(matches!(result, Err(ConfigError::Toml(_))));

        let result = GatekeeperConfig::from_json_str(r#"{"cache_version": 1"#);
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_config_load_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gatekeeper.toml");
        std::fs::write(
            &path,
            "cache_version = \"v1.0.0\"\nscope = \"https://app.example/\"\n",
        )
        .unwrap();

        let config = GatekeeperConfig::load(&path).unwrap();
        assert_eq!(config.cache_version.as_str(), "v1.0.0");
    }

    #[test]
    fn test_config_load_missing_file() {
        let result = GatekeeperConfig::load("/nonexistent/gatekeeper.toml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}

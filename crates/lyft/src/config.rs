//! CLI configuration.
//!
//! Resolution order (later overrides earlier):
//! 1. `<data dir>/config.toml`
//! 2. Environment variables and command-line flags
//!
//! ```toml
//! client_id = "..."
//! client_secret = "..."
//! geocode_key = "..."
//! base_url = "https://api.lyft.com"
//! redirect_uri = "http://localhost:90"
//! sandbox = false
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use lyft_oauth::OAuthConfig;
use serde::{Deserialize, Serialize};

/// Config filename within the data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Data directory name under the home directory.
const DATA_DIR_NAME: &str = ".lyft";

/// The default data directory, `~/.lyft`.
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DATA_DIR_NAME))
}

/// Contents of `config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub geocode_key: Option<String>,
    pub base_url: Option<String>,
    pub redirect_uri: Option<String>,
    /// Use the sandbox form of the client secret.
    pub sandbox: bool,
}

impl FileConfig {
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse config.toml")
    }

    /// Load `config.toml` from `data_dir`; a missing file yields defaults.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                tracing::debug!(path = %path.display(), "loaded config");
                Self::from_toml(&contents)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }
}

/// Values from flags and the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub geocode_key: Option<String>,
    pub base_url: Option<String>,
}

/// Resolved configuration.
#[derive(Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub geocode_key: Option<String>,
    pub base_url: String,
    pub redirect_uri: Option<String>,
    pub sandbox: bool,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("data_dir", &self.data_dir)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[redacted]"))
            .field("geocode_key", &self.geocode_key.as_ref().map(|_| "[redacted]"))
            .field("base_url", &self.base_url)
            .field("redirect_uri", &self.redirect_uri)
            .field("sandbox", &self.sandbox)
            .finish()
    }
}

/// Empty values count as unset.
fn pick(over: Option<String>, file: Option<String>) -> Option<String> {
    over.filter(|v| !v.is_empty())
        .or(file.filter(|v| !v.is_empty()))
}

impl Settings {
    /// Layer `overrides` over `file`.
    pub fn resolve(data_dir: PathBuf, file: FileConfig, overrides: Overrides) -> Self {
        Self {
            data_dir,
            client_id: pick(overrides.client_id, file.client_id),
            client_secret: pick(overrides.client_secret, file.client_secret),
            geocode_key: pick(overrides.geocode_key, file.geocode_key),
            base_url: pick(overrides.base_url, file.base_url)
                .unwrap_or_else(|| lyft_client::DEFAULT_BASE_URL.to_string()),
            redirect_uri: file.redirect_uri.filter(|v| !v.is_empty()),
            sandbox: file.sandbox,
        }
    }

    /// Resolve the data directory, read its config file and apply overrides.
    pub fn load(data_dir: Option<PathBuf>, overrides: Overrides) -> Result<Self> {
        let data_dir = data_dir
            .or_else(default_data_dir)
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory; set LYFT_DATA_DIR"))?;
        let file = FileConfig::load(&data_dir)?;
        Ok(Self::resolve(data_dir, file, overrides))
    }

    /// OAuth settings for the app; requires the client id and secret.
    pub fn oauth_config(&self) -> Result<OAuthConfig> {
        let client_id = self.client_id.as_deref().ok_or_else(|| {
            anyhow::anyhow!("LYFT_CLIENT_ID must be set (environment or {CONFIG_FILE})")
        })?;
        let client_secret = self.client_secret.as_deref().ok_or_else(|| {
            anyhow::anyhow!("LYFT_CLIENT_SECRET must be set (environment or {CONFIG_FILE})")
        })?;

        let mut config = OAuthConfig::new(client_id, client_secret).base_url(&self.base_url);
        if let Some(redirect) = &self.redirect_uri {
            config = config.redirect_uri(redirect);
        }
        if self.sandbox {
            config = config.sandbox();
        }
        Ok(config)
    }

    /// The geocoding API key; needed only to look up street addresses.
    pub fn geocode_key(&self) -> Result<&str> {
        self.geocode_key.as_deref().ok_or_else(|| {
            anyhow::anyhow!("GOOG_GEOCODE_KEY must be set to geocode addresses")
        })
    }
}

use crate::episode::DisplayOptions;
use crate::error::{CoreError, Result};
use chrono::Locale;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PodcastrConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Root of the episodes API (the `/episodes` resource lives under it)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Number of episodes requested for the home listing
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default = "default_order")]
    pub order: String,
    #[serde(default = "default_sort")]
    pub sort: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_base_url() -> String {
    "http://localhost:3333".into()
}

const fn default_limit() -> u32 {
    12
}

fn default_order() -> String {
    "desc".into()
}

fn default_sort() -> String {
    "published_at".into()
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_max_retries() -> u32 {
    3
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            limit: default_limit(),
            order: default_order(),
            sort: default_sort(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Locale used for month names, e.g. `pt_BR` or `en_US`
    #[serde(default = "default_date_locale")]
    pub date_locale: String,
    /// `chrono` strftime pattern for published dates
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// How many episodes the "latest releases" section shows
    #[serde(default = "default_latest_count")]
    pub latest_count: usize,
}

fn default_date_locale() -> String {
    "pt_BR".into()
}

fn default_date_format() -> String {
    "%-d %b %y".into()
}

const fn default_latest_count() -> usize {
    2
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            date_locale: default_date_locale(),
            date_format: default_date_format(),
            latest_count: default_latest_count(),
        }
    }
}

impl DisplayConfig {
    /// Resolve the configured locale into formatting options.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigInvalid`] if the locale name is unknown.
    pub fn options(&self) -> Result<DisplayOptions> {
        let locale =
            Locale::try_from(self.date_locale.as_str()).map_err(|_| CoreError::ConfigInvalid {
                message: format!("unknown display.date_locale '{}'", self.date_locale),
            })?;
        Ok(DisplayOptions::new(locale, &self.date_format))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Time scale of the headless audio element (2.0 plays twice as fast)
    #[serde(default = "default_simulation_speed")]
    pub simulation_speed: f64,
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
}

const fn default_simulation_speed() -> f64 {
    1.0
}

const fn default_progress_interval_ms() -> u64 {
    1000
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            simulation_speed: default_simulation_speed(),
            progress_interval_ms: default_progress_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to `~/.config/podcastr/podcastr.log`
    #[serde(default)]
    pub enabled: bool,
}

impl PodcastrConfig {
    /// Get the config file path (~/.config/podcastr/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from the default location, creating a template on first run.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigNotFound`] after writing the template, or an error if the
    /// file cannot be read, parsed or validated.
    pub fn load_or_create() -> Result<Self> {
        Self::load_or_create_at(&Self::config_path())
    }

    /// Same as [`Self::load_or_create`] for an explicit path.
    ///
    /// # Errors
    ///
    /// See [`Self::load_or_create`].
    pub fn load_or_create_at(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }

            fs::write(config_path, CONFIG_TEMPLATE)?;

            return Err(CoreError::ConfigNotFound {
                path: config_path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(config_path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed TOML or a validation error for bad values.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check field values that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first missing or invalid field found.
    pub fn validate(&self) -> Result<()> {
        if self.catalog.base_url.trim().is_empty() {
            return Err(CoreError::ConfigMissingField {
                field: "catalog.base_url".into(),
            });
        }
        if self.catalog.limit == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "catalog.limit must be at least 1".into(),
            });
        }
        if !(self.player.simulation_speed.is_finite() && self.player.simulation_speed > 0.0) {
            return Err(CoreError::ConfigInvalid {
                message: "player.simulation_speed must be a positive number".into(),
            });
        }
        if self.player.progress_interval_ms == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "player.progress_interval_ms must be at least 1".into(),
            });
        }
        self.display.options()?;
        Ok(())
    }
}

const CONFIG_TEMPLATE: &str = r#"# Podcastr Configuration
# ~/.config/podcastr/config.toml

[catalog]
# Episodes API root; the list lives at {base_url}/episodes
base_url = "http://localhost:3333"
limit = 12
order = "desc"
sort = "published_at"
timeout_secs = 10
max_retries = 3

[display]
date_locale = "pt_BR"
date_format = "%-d %b %y"
# Episodes shown in the "latest releases" section
latest_count = 2

[player]
# Time scale of the headless player (2.0 = twice as fast)
simulation_speed = 1.0
progress_interval_ms = 1000

[logging]
# Also write logs to ~/.config/podcastr/podcastr.log
enabled = false
"#;

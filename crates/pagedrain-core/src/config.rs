//! Configuration management for pagedrain.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Longest accepted value for any scroll delay (one hour).
pub const MAX_DELAY_MS: u64 = 60 * 60 * 1000;

/// Longest accepted session deadline (one week).
pub const MAX_DEADLINE_SECS: u64 = 7 * 24 * 60 * 60;

/// Main application configuration.
///
/// This is loaded from `~/.config/pagedrain/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Browser launch and navigation settings
    pub browser: BrowserConfig,
    /// Scroll exhaustion policy
    pub scroll: ScrollConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML or fail validation
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path.
    ///
    /// Unlike [`AppConfig::load`], a missing file is an error here.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `PAGEDRAIN_HEADLESS`: Override browser headless mode (true/false)
    /// - `PAGEDRAIN_NAVIGATION_TIMEOUT_SECS`: Override navigation timeout
    /// - `PAGEDRAIN_MAX_PAGES`: Cap the number of growth iterations
    /// - `PAGEDRAIN_CONTROL_SELECTOR`: CSS selector of a "load more" control
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit path, then apply the same
    /// environment overrides as [`AppConfig::load_with_env`].
    pub fn load_from_with_env(path: &Path) -> ConfigResult<Self> {
        let mut config = Self::load_from(path)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("PAGEDRAIN_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Ok(val) = std::env::var("PAGEDRAIN_NAVIGATION_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                self.browser.navigation_timeout_secs = secs;
                tracing::debug!("Override browser.navigation_timeout_secs from env: {}", secs);
            }
        }

        if let Ok(val) = std::env::var("PAGEDRAIN_MAX_PAGES") {
            if let Ok(pages) = val.parse() {
                self.scroll.max_pages = Some(pages);
                tracing::debug!("Override scroll.max_pages from env: {}", pages);
            }
        }

        if let Ok(val) = std::env::var("PAGEDRAIN_CONTROL_SELECTOR") {
            if !val.trim().is_empty() {
                tracing::debug!("Override scroll.control_selector from env: {}", val);
                self.scroll.control_selector = Some(val);
            }
        }
    }

    /// Validate every section.
    pub fn validate(&self) -> ConfigResult<()> {
        self.browser.validate()?;
        self.scroll.validate()
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let config_dir = path
            .parent()
            .ok_or_else(|| ConfigError::invalid("config_path", "no parent directory"))?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/pagedrain/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "pagedrain", "pagedrain").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Browser launch and navigation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Time allowed for the initial page load, in seconds
    pub navigation_timeout_secs: u64,
    /// Path to a Chrome/Chromium executable (auto-detected when unset)
    pub executable: Option<String>,
    /// User agent override
    pub user_agent: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            navigation_timeout_secs: 60,
            executable: None,
            user_agent: None,
        }
    }
}

impl BrowserConfig {
    /// Navigation timeout as a `Duration`.
    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.window_width == 0 || self.window_height == 0 {
            return Err(ConfigError::invalid(
                "browser.window_width/window_height",
                "window dimensions must be non-zero",
            ));
        }
        if self.navigation_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "browser.navigation_timeout_secs",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// What happens to the base delay after a growth iteration that follows stalls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffMode {
    /// The grown delay is kept for the rest of the session
    #[default]
    Sticky,
    /// The delay returns to `initial_delay_ms` whenever the page grows
    ResetOnGrowth,
}

/// Scroll exhaustion policy.
///
/// Every field is optional in TOML; omitted fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Maximum number of growth iterations (unbounded when unset)
    pub max_pages: Option<u32>,
    /// CSS selector of a "load more" control clicked instead of scrolling
    pub control_selector: Option<String>,
    /// Wait after each advance before re-measuring
    pub initial_delay_ms: u64,
    /// Extra grace period applied once a stall is detected
    pub stall_delay_ms: u64,
    /// Amount the base delay grows by after each stall
    pub delay_increment_ms: u64,
    /// Upper bound for the base delay
    pub max_delay_ms: Option<u64>,
    /// Wall-clock limit for one session, in seconds
    pub deadline_secs: Option<u64>,
    /// Hard cap on advance attempts per session
    pub max_iterations: Option<u32>,
    /// Delay behaviour after growth
    pub backoff: BackoffMode,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            max_pages: None,
            control_selector: None,
            initial_delay_ms: 500,
            stall_delay_ms: 3000,
            delay_increment_ms: 500,
            max_delay_ms: None,
            deadline_secs: Some(300),
            max_iterations: Some(1000),
            backoff: BackoffMode::Sticky,
        }
    }
}

impl ScrollConfig {
    /// Plain scroll-to-bottom policy: short fixed delay, no budget, no control.
    #[must_use]
    pub fn simple() -> Self {
        Self {
            initial_delay_ms: 200,
            ..Self::default()
        }
    }

    /// Cap the number of growth iterations.
    #[must_use]
    pub fn with_max_pages(mut self, pages: u32) -> Self {
        self.max_pages = Some(pages);
        self
    }

    /// Click the first element matching `selector` instead of scrolling.
    #[must_use]
    pub fn with_control_selector(mut self, selector: impl Into<String>) -> Self {
        self.control_selector = Some(selector.into());
        self
    }

    /// Set (or clear) the wall-clock deadline.
    ///
    /// Sub-second remainders round up to the next whole second.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline_secs =
            deadline.map(|d| d.as_secs().saturating_add(u64::from(d.subsec_nanos() > 0)));
        self
    }

    /// Set (or clear) the iteration cap.
    #[must_use]
    pub fn with_max_iterations(mut self, iterations: Option<u32>) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Choose the delay behaviour after growth.
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffMode) -> Self {
        self.backoff = backoff;
        self
    }

    /// Base delay before the first measurement.
    #[must_use]
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Stall grace period.
    #[must_use]
    pub fn stall_delay(&self) -> Duration {
        Duration::from_millis(self.stall_delay_ms)
    }

    /// Backoff step.
    #[must_use]
    pub fn delay_increment(&self) -> Duration {
        Duration::from_millis(self.delay_increment_ms)
    }

    /// Upper bound for the base delay, if any.
    #[must_use]
    pub fn max_delay(&self) -> Option<Duration> {
        self.max_delay_ms.map(Duration::from_millis)
    }

    /// Session deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }

    /// Check the policy for values that would make the loop meaningless.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.initial_delay_ms == 0 {
            return Err(ConfigError::invalid(
                "scroll.initial_delay_ms",
                "must be greater than zero",
            ));
        }
        if self.stall_delay_ms == 0 {
            return Err(ConfigError::invalid(
                "scroll.stall_delay_ms",
                "must be greater than zero",
            ));
        }
        for (field, value) in [
            ("scroll.initial_delay_ms", self.initial_delay_ms),
            ("scroll.stall_delay_ms", self.stall_delay_ms),
            ("scroll.delay_increment_ms", self.delay_increment_ms),
            ("scroll.max_delay_ms", self.max_delay_ms.unwrap_or(0)),
        ] {
            if value > MAX_DELAY_MS {
                return Err(ConfigError::invalid(
                    field,
                    format!("must not exceed {MAX_DELAY_MS}"),
                ));
            }
        }
        match self.deadline_secs {
            Some(0) => {
                return Err(ConfigError::invalid(
                    "scroll.deadline_secs",
                    "must be at least 1 (omit it for no deadline)",
                ));
            }
            Some(secs) if secs > MAX_DEADLINE_SECS => {
                return Err(ConfigError::invalid(
                    "scroll.deadline_secs",
                    format!("must not exceed {MAX_DEADLINE_SECS} (omit it for no deadline)"),
                ));
            }
            _ => {}
        }
        if self.max_pages == Some(0) {
            return Err(ConfigError::invalid("scroll.max_pages", "must be at least 1"));
        }
        if self.max_iterations == Some(0) {
            return Err(ConfigError::invalid(
                "scroll.max_iterations",
                "must be at least 1",
            ));
        }
        if let Some(selector) = &self.control_selector {
            if selector.trim().is_empty() {
                return Err(ConfigError::invalid(
                    "scroll.control_selector",
                    "must not be empty (omit it to scroll the window)",
                ));
            }
        }
        if let Some(max) = self.max_delay_ms {
            if max < self.initial_delay_ms {
                return Err(ConfigError::invalid(
                    "scroll.max_delay_ms",
                    format!(
                        "must not be below initial_delay_ms ({})",
                        self.initial_delay_ms
                    ),
                ));
            }
        }
        Ok(())
    }
}

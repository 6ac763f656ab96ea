//! Configuration for rescollect.
//!
//! This module provides runtime configuration for URL resource access.
//! Use [`ConfigBuilder`] at application startup to configure the User-Agent string.

use std::sync::OnceLock;

/// Global configuration, initialized via [`ConfigBuilder::init`].
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Runtime configuration for rescollect.
#[derive(Debug, Clone)]
pub struct Config {
    /// User-Agent string sent when fetching URL resources.
    /// Example: "my-build-tool/1.0.0"
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: concat!("rescollect/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Configuration builder for fluent API.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    user_agent: Option<String>,
}

impl ConfigBuilder {
    /// Create a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the User-Agent string for URL resource fetches.
    ///
    /// Default: "rescollect/{version}"
    ///
    /// # Example
    ///
    /// ```
    /// use rescollect::config::ConfigBuilder;
    ///
    /// ConfigBuilder::new()
    ///     .user_agent("my-build-tool/1.0.0")
    ///     .init();
    /// ```
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build and initialize the global configuration.
    ///
    /// This can only be called once. Subsequent calls are ignored.
    /// Returns `true` if configuration was set, `false` if already initialized.
    pub fn init(self) -> bool {
        let config = Config {
            user_agent: self
                .user_agent
                .unwrap_or_else(|| Config::default().user_agent),
        };
        CONFIG.set(config).is_ok()
    }
}

/// Initialize rescollect with default configuration.
///
/// This is equivalent to `ConfigBuilder::new().init()`.
pub fn init_default() -> bool {
    ConfigBuilder::new().init()
}

/// Get the current configuration, or default if not initialized.
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}

//! [`Config`]-related definitions.

use config::{ConfigBuilder, ConfigError, builder::DefaultState};
use serde::Deserialize;
use smart_default::SmartDefault;

use membership_observability::LogSettings;
use membership_sales::PriceChangePolicy;

/// Configuration file used when `MEMBERSHIP_CONFIG` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "membership.toml";

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: Server,
    pub auth: Auth,
    pub log: LogSettings,
    pub sales: Sales,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if the file exists);
    /// - merging it with `MEMBERSHIP_*` environment variables, `__` separating
    ///   nested keys (`MEMBERSHIP_SERVER__PORT=9000`);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("MEMBERSHIP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    /// Load from the file named by `MEMBERSHIP_CONFIG`, or [`DEFAULT_CONFIG_PATH`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var("MEMBERSHIP_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_owned());
        Self::new(path)
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,
}

impl Server {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Authentication configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Auth {
    /// HS256 secret used to verify bearer tokens.
    #[default("dev-secret".to_owned())]
    pub jwt_secret: String,
}

/// Sales configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Sales {
    /// What an update does with a line whose price changed.
    pub price_change_policy: PriceChangePolicy,

    /// Buffered realtime messages per connected terminal before it starts
    /// missing pushes.
    #[default(256)]
    pub realtime_capacity: usize,
}

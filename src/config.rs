//! Bridge configuration.
//!
//! `BridgeConfig` holds the fixed, bridge-wide settings: the provider tag that is
//! stamped on every host event and the plugin identity that is logged when a
//! session is initialized. Per-session settings (app id, zones, privacy) live in
//! [`SessionConfig`](crate::options::SessionConfig) instead.
//!
//! # Examples
//!
//! ## Use defaults
//! ```rust
//! use adcolony_bridge::BridgeConfig;
//! let cfg = BridgeConfig::default();
//! assert_eq!(cfg.provider, "adcolony");
//! ```
//!
//! ## Customize with the builder
//! ```rust
//! use adcolony_bridge::BridgeConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = BridgeConfig::builder()
//!     .plugin_name("plugin.adcolony")
//!     .plugin_version("2.2.0")
//!     .build()?; // returns Result<BridgeConfig, BridgeConfigError>
//! # Ok(()) }
//! ```

use std::fmt;

const DEFAULT_PROVIDER: &str = "adcolony";
const DEFAULT_PLUGIN_NAME: &str = "plugin.adcolony";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Provider tag attached to every event delivered to the host
    pub provider: String,
    /// Name of the plugin as seen by the host runtime
    pub plugin_name: String,
    /// Version reported in the init banner
    pub plugin_version: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            plugin_name: DEFAULT_PLUGIN_NAME.to_string(),
            plugin_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl BridgeConfig {
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BridgeConfigBuilder {
    inner: BridgeConfig,
}

impl BridgeConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut BridgeConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn provider<S: Into<String>>(self, p: S) -> Self { self.map(|c| c.provider = p.into()) }
    pub fn plugin_name<S: Into<String>>(self, n: S) -> Self { self.map(|c| c.plugin_name = n.into()) }
    pub fn plugin_version<S: Into<String>>(self, v: S) -> Self { self.map(|c| c.plugin_version = v.into()) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<BridgeConfig, BridgeConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeConfigError {
    EmptyProvider,
    EmptyPluginName,
}

impl fmt::Display for BridgeConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeConfigError::EmptyProvider => write!(f, "provider tag must not be empty"),
            BridgeConfigError::EmptyPluginName => write!(f, "plugin_name must not be empty"),
        }
    }
}
impl std::error::Error for BridgeConfigError {}

fn validate(c: &BridgeConfig) -> Result<(), BridgeConfigError> {
    if c.provider.trim().is_empty() {
        return Err(BridgeConfigError::EmptyProvider);
    }
    if c.plugin_name.trim().is_empty() {
        return Err(BridgeConfigError::EmptyPluginName);
    }
    Ok(())
}

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Which flavour of the hosted service a client talks to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    #[default]
    EnterpriseSearch,
    WorkplaceSearch,
    SwiftypeEnterprise,
}

impl Variant {
    pub fn default_base_url(self) -> &'static str {
        match self {
            Variant::EnterpriseSearch | Variant::SwiftypeEnterprise => {
                "http://localhost:3002/api/v1/ent"
            }
            Variant::WorkplaceSearch => "http://localhost:3002/api/ws/v1",
        }
    }
}

/// Bearer token used for every request. Never printed.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

impl From<&str> for AccessToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for AccessToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// Library name and version reported to the service on every request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientIdentity {
    pub name: String,
    pub version: String,
}

impl ClientIdentity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self::new("entsearch-rs", env!("CARGO_PKG_VERSION"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PollingConfig {
    /// Delay between receipt lookups
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,

    /// Deadline measured from submission
    #[serde(default = "default_poll_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_poll_timeout_ms() -> u64 {
    10_000
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            timeout_ms: default_poll_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    pub access_token: AccessToken,

    /// Overrides the variant's default base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default)]
    pub variant: Variant,
    #[serde(default)]
    pub identity: ClientIdentity,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub insecure_skip_verify: bool,
}

impl ClientConfig {
    pub fn new(access_token: impl Into<AccessToken>) -> Self {
        Self {
            access_token: access_token.into(),
            base_url: None,
            variant: Variant::default(),
            identity: ClientIdentity::default(),
            polling: PollingConfig::default(),
            insecure_skip_verify: false,
        }
    }

    pub fn load(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read client config {}", path))?;
        let config: ClientConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse client config {}", path))?;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.variant.default_base_url())
    }
}

use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Listener and admin listener both bind {0}")]
    ListenerConflict(String),

    #[error("Upstream timeout cannot be 0")]
    InvalidTimeout,

    #[error("URL must use http or https: {0}")]
    InvalidScheme(Url),

    #[error("List default {0} cannot be 0")]
    InvalidListDefault(&'static str),
}

/// Insights service configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Listener for `/insights` and `/openapi.json`
    pub listener: Listener,
    /// Listener for `/health` and `/ready`
    pub admin_listener: Listener,
    /// Where and how Gong is reached
    pub upstream: UpstreamConfig,
    /// Values sent for `limit`/`page` on list topics when the caller omits them
    pub list_defaults: ListDefaults,
    /// Externally reachable URL advertised in the OpenAPI descriptor
    ///
    /// Falls back to the listener address when unset.
    pub public_url: Option<Url>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listener: Listener {
                host: "0.0.0.0".into(),
                port: 5000,
            },
            admin_listener: Listener {
                host: "127.0.0.1".into(),
                port: 5001,
            },
            upstream: UpstreamConfig::default(),
            list_defaults: ListDefaults::default(),
            public_url: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.listener.overlaps(&self.admin_listener) {
            return Err(ValidationError::ListenerConflict(self.listener.address()));
        }

        self.upstream.validate()?;
        self.list_defaults.validate()?;

        if let Some(url) = &self.public_url {
            validate_scheme(url)?;
        }

        Ok(())
    }

    /// Server URL for the OpenAPI descriptor.
    pub fn server_url(&self) -> String {
        match &self.public_url {
            Some(url) => url.as_str().trim_end_matches('/').to_string(),
            None => format!("http://{}", self.listener.address()),
        }
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether both listeners would claim the same socket. A wildcard host
    /// covers every interface on its port.
    fn overlaps(&self, other: &Listener) -> bool {
        self.port == other.port
            && (self.host == other.host || self.is_wildcard() || other.is_wildcard())
    }

    fn is_wildcard(&self) -> bool {
        matches!(self.host.as_str(), "0.0.0.0" | "::" | "[::]")
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the Gong API
    pub base_url: Url,
    /// Total time allowed for one upstream request, including the body
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        UpstreamConfig {
            base_url: Url::parse(DEFAULT_GONG_API_BASE).expect("default base URL is valid"),
            timeout_secs: 30,
        }
    }
}

pub const DEFAULT_GONG_API_BASE: &str = "https://api.gong.io";

impl UpstreamConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        validate_scheme(&self.base_url)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ListDefaults {
    pub limit: u32,
    pub page: u32,
}

impl Default for ListDefaults {
    fn default() -> Self {
        ListDefaults { limit: 10, page: 1 }
    }
}

impl ListDefaults {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.limit == 0 {
            return Err(ValidationError::InvalidListDefault("limit"));
        }
        if self.page == 0 {
            return Err(ValidationError::InvalidListDefault("page"));
        }
        Ok(())
    }
}

fn validate_scheme(url: &Url) -> Result<(), ValidationError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(ValidationError::InvalidScheme(url.clone())),
    }
}

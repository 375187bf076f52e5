use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::header::HeaderValue;
use std::fmt;

pub const API_KEY_VAR: &str = "GONG_API_KEY";
pub const API_SECRET_VAR: &str = "GONG_API_SECRET";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum CredentialsError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),
    #[error("credentials contain characters that cannot be sent in a header")]
    InvalidHeader,
}

/// Gong access key and secret. Read once at startup and shared read-only.
#[derive(Clone)]
pub struct Credentials {
    authorization: HeaderValue,
}

impl Credentials {
    pub fn new(access_key: &str, secret: &str) -> Result<Self, CredentialsError> {
        let encoded = STANDARD.encode(format!("{access_key}:{secret}"));
        let mut authorization = HeaderValue::from_str(&format!("Basic {encoded}"))
            .map_err(|_| CredentialsError::InvalidHeader)?;
        authorization.set_sensitive(true);

        Ok(Self { authorization })
    }

    pub fn from_env() -> Result<Self, CredentialsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds credentials from any variable source; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CredentialsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or(CredentialsError::Missing(name))
        };

        let access_key = read(API_KEY_VAR)?;
        let secret = read(API_SECRET_VAR)?;
        Self::new(&access_key, &secret)
    }

    /// Value of the `Authorization` header sent to Gong.
    pub fn authorization(&self) -> &HeaderValue {
        &self.authorization
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("authorization", &"<redacted>")
            .finish()
    }
}

use crate::config::UpstreamConfig;
use crate::credentials::Credentials;
use crate::errors::InsightsError;
use http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use http::{Method, StatusCode};
use hyper::body::Bytes;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// A fully rendered request for the Gong API.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamCall {
    pub method: Method,
    pub url: Url,
    pub body: Option<Value>,
}

/// A successful Gong response, kept as raw bytes.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

/// Authenticated client for the Gong REST API.
#[derive(Clone)]
pub struct GongClient {
    client: reqwest::Client,
    base_url: Url,
    credentials: Arc<Credentials>,
}

impl GongClient {
    pub fn new(config: &UpstreamConfig, credentials: Credentials) -> Result<Self, InsightsError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| InsightsError::HttpClient(e.to_string()))?;

        Ok(GongClient {
            client,
            base_url: config.base_url.clone(),
            credentials: Arc::new(credentials),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Issues one request. Never retries.
    ///
    /// Non-2xx answers come back as [`InsightsError::Upstream`] with the status
    /// and body untouched. Connection failures, timeouts and truncated bodies
    /// are [`InsightsError::UpstreamUnreachable`].
    pub async fn send(&self, call: UpstreamCall) -> Result<UpstreamResponse, InsightsError> {
        let host = call.url.host_str().unwrap_or_default().to_string();

        let mut request = self
            .client
            .request(call.method, call.url)
            .header(AUTHORIZATION, self.credentials.authorization().clone());

        if let Some(body) = &call.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| unreachable(&host, e))?;

        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).cloned();
        let body = response.bytes().await.map_err(|e| unreachable(&host, e))?;

        if !status.is_success() {
            tracing::warn!(upstream = %host, %status, "upstream returned an error");
            return Err(InsightsError::Upstream {
                status,
                content_type,
                body,
            });
        }

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}

fn unreachable(host: &str, error: reqwest::Error) -> InsightsError {
    let reason = if error.is_timeout() {
        format!("request to {host} timed out")
    } else if error.is_connect() {
        format!("could not connect to {host}")
    } else {
        format!("request to {host} failed: {error}")
    };

    tracing::warn!(upstream = %host, error = %error, "upstream unreachable");
    InsightsError::UpstreamUnreachable(reason)
}

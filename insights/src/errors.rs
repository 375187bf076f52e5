use crate::topic::{Param, Topic};
use http_body_util::combinators::BoxBody;
use hyper::body::Bytes;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::{Response, StatusCode};
use shared::http::{full_body, json_error_response};
use thiserror::Error;

/// Errors that can occur while serving an insights request
#[derive(Error, Debug)]
pub enum InsightsError {
    #[error("unknown topic: {0:?}")]
    InvalidTopic(String),

    #[error("topic {topic} requires the {} parameter", .param.query_name())]
    MissingParameter { topic: Topic, param: Param },

    /// Gong answered with a non-2xx status. Status and body are handed back untouched.
    #[error("upstream returned {status}")]
    Upstream {
        status: StatusCode,
        content_type: Option<HeaderValue>,
        body: Bytes,
    },

    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("not found")]
    NotFound,

    #[error("invalid upstream URL: {0}")]
    InvalidUpstreamUrl(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InsightsError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            InsightsError::InvalidTopic(_) | InsightsError::MissingParameter { .. } => {
                StatusCode::BAD_REQUEST
            }
            InsightsError::Upstream { status, .. } => *status,
            InsightsError::UpstreamUnreachable(_) => StatusCode::BAD_GATEWAY,
            InsightsError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            InsightsError::NotFound => StatusCode::NOT_FOUND,
            InsightsError::InvalidUpstreamUrl(_)
            | InsightsError::HttpClient(_)
            | InsightsError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Renders the error for the caller.
    pub fn into_response(self) -> Response<BoxBody<Bytes, InsightsError>> {
        match self {
            InsightsError::Upstream {
                status,
                content_type,
                body,
            } => {
                let mut response = Response::new(full_body(body));
                *response.status_mut() = status;
                if let Some(content_type) = content_type {
                    response.headers_mut().insert(CONTENT_TYPE, content_type);
                }
                response
            }
            other => json_error_response(other.status_code(), &other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            InsightsError::InvalidTopic("foo".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            InsightsError::MissingParameter {
                topic: Topic::Deal,
                param: Param::DealId,
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            InsightsError::UpstreamUnreachable("timed out".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            InsightsError::Upstream {
                status: StatusCode::TOO_MANY_REQUESTS,
                content_type: None,
                body: Bytes::new(),
            }
            .status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[tokio::test]
    async fn test_missing_parameter_response() {
        let response = InsightsError::MissingParameter {
            topic: Topic::Highlights,
            param: Param::CallId,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "error": "topic highlights requires the call_id parameter" })
        );
    }

    #[tokio::test]
    async fn test_upstream_error_passthrough() {
        let upstream_body = Bytes::from_static(br#"{"requestId":"abc","errors":["boom"]}"#);
        let response = InsightsError::Upstream {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            content_type: Some(HeaderValue::from_static("application/json")),
            body: upstream_body.clone(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes, upstream_body);
    }
}

use crate::dispatcher::Dispatcher;
use crate::errors::InsightsError;
use crate::metrics_defs::{REQUEST_DURATION, REQUESTS_INFLIGHT};
use crate::upstream::UpstreamResponse;
use http_body_util::combinators::BoxBody;
use hyper::body::{Bytes, Incoming};
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::service::Service;
use hyper::{Method, Request, Response};
use shared::http::full_body;
use shared::{gauge, histogram};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

pub type InsightsBody = BoxBody<Bytes, InsightsError>;

/// Serves `/insights` and `/openapi.json`.
#[derive(Clone)]
pub struct InsightsService {
    inner: Arc<Inner>,
}

struct Inner {
    dispatcher: Dispatcher,
    openapi: Bytes,
}

impl InsightsService {
    pub fn new(dispatcher: Dispatcher, openapi: &serde_json::Value) -> Self {
        Self {
            inner: Arc::new(Inner {
                dispatcher,
                openapi: Bytes::from(openapi.to_string()),
            }),
        }
    }

    pub async fn handle<B>(&self, req: Request<B>) -> Response<InsightsBody> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let query = req.uri().query().map(String::from);
        drop(req);

        let route = match path.as_str() {
            "/insights" => "insights",
            "/openapi.json" => "openapi",
            _ => "unknown",
        };
        let mut inflight = InflightRequest::start(route, method.clone(), path);

        let result = match route {
            "insights" => self.insights(&method, query.as_deref()).await,
            "openapi" => self.openapi(&method),
            _ => Err(InsightsError::NotFound),
        };

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(error = %e, "request failed");
                e.into_response()
            }
        };

        inflight.finish(response.status().as_u16());
        response
    }

    async fn insights(
        &self,
        method: &Method,
        query: Option<&str>,
    ) -> Result<Response<InsightsBody>, InsightsError> {
        if method != Method::GET {
            return Err(InsightsError::MethodNotAllowed);
        }

        let upstream = self.inner.dispatcher.dispatch_query(query).await?;
        Ok(passthrough_response(upstream))
    }

    fn openapi(&self, method: &Method) -> Result<Response<InsightsBody>, InsightsError> {
        if method != Method::GET {
            return Err(InsightsError::MethodNotAllowed);
        }

        let mut response = Response::new(full_body(self.inner.openapi.clone()));
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(response)
    }
}

/// Tracks one request from arrival until its handler completes or is dropped.
///
/// Hyper drops the handler future when the client disconnects, so the gauge,
/// histogram and log line are emitted from `Drop`.
struct InflightRequest {
    started: Instant,
    route: &'static str,
    method: Method,
    path: String,
    status: Option<u16>,
}

impl InflightRequest {
    fn start(route: &'static str, method: Method, path: String) -> Self {
        gauge!(REQUESTS_INFLIGHT).increment(1.0);
        Self {
            started: Instant::now(),
            route,
            method,
            path,
            status: None,
        }
    }

    fn finish(&mut self, status: u16) {
        self.status = Some(status);
    }
}

impl Drop for InflightRequest {
    fn drop(&mut self) {
        gauge!(REQUESTS_INFLIGHT).decrement(1.0);

        let elapsed = self.started.elapsed();
        let status = match self.status {
            Some(status) => status.to_string(),
            None => "cancelled".to_string(),
        };
        histogram!(REQUEST_DURATION, "route" => self.route, "status" => status.clone())
            .record(elapsed.as_secs_f64());

        let method = &self.method;
        let path = self.path.as_str();
        let elapsed_ms = elapsed.as_millis() as u64;
        match self.status {
            Some(status) => {
                tracing::info!(%method, path, status, elapsed_ms, "handled request")
            }
            None => tracing::info!(%method, path, elapsed_ms, "request cancelled"),
        }
    }
}

fn passthrough_response(upstream: UpstreamResponse) -> Response<InsightsBody> {
    let mut response = Response::new(full_body(upstream.body));
    *response.status_mut() = upstream.status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        upstream
            .content_type
            .unwrap_or(HeaderValue::from_static("application/json")),
    );
    response
}

impl Service<Request<Incoming>> for InsightsService {
    type Response = Response<InsightsBody>;
    type Error = InsightsError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.handle(req).await) })
    }
}

use crate::config::ListDefaults;
use crate::errors::InsightsError;
use crate::metrics_defs::UPSTREAM_REQUESTS;
use crate::topic::{InsightRequest, Segment};
use crate::upstream::{GongClient, UpstreamCall, UpstreamResponse};
use http::Method;
use shared::counter;
use url::Url;

/// Maps a unified insights request onto exactly one Gong API call.
#[derive(Clone)]
pub struct Dispatcher {
    client: GongClient,
    list_defaults: ListDefaults,
}

impl Dispatcher {
    pub fn new(client: GongClient, list_defaults: ListDefaults) -> Self {
        Self {
            client,
            list_defaults,
        }
    }

    /// Parses the raw `/insights` query and dispatches it.
    pub async fn dispatch_query(
        &self,
        query: Option<&str>,
    ) -> Result<UpstreamResponse, InsightsError> {
        let request = InsightRequest::from_query(query)?;
        self.dispatch(&request).await
    }

    pub async fn dispatch(
        &self,
        request: &InsightRequest,
    ) -> Result<UpstreamResponse, InsightsError> {
        // Nothing goes on the wire for an invalid request.
        request.validate()?;

        let call = self.build_call(request)?;
        tracing::debug!(topic = %request.topic, method = %call.method, path = call.url.path(), "dispatching");

        let result = self.client.send(call).await;

        let status = match &result {
            Ok(response) => response.status.as_u16().to_string(),
            Err(InsightsError::Upstream { status, .. }) => status.as_u16().to_string(),
            Err(_) => "unreachable".to_string(),
        };
        counter!(UPSTREAM_REQUESTS, "topic" => request.topic.as_str(), "status" => status)
            .increment(1);

        result
    }

    /// Renders the URL, query and body for the request's topic.
    pub fn build_call(&self, request: &InsightRequest) -> Result<UpstreamCall, InsightsError> {
        let route = request.topic.route();
        let mut url = self.client.base_url().clone();

        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                InsightsError::InvalidUpstreamUrl(self.client.base_url().to_string())
            })?;
            segments.pop_if_empty();
            for segment in route.path {
                match segment {
                    Segment::Literal(literal) => {
                        segments.push(literal);
                    }
                    Segment::Param(param) => {
                        let value = request.param(*param).ok_or(
                            InsightsError::MissingParameter {
                                topic: request.topic,
                                param: *param,
                            },
                        )?;
                        segments.push(value);
                    }
                }
            }
        }

        if route.method == Method::GET {
            append_query(&mut url, request, route.paginated.then_some(&self.list_defaults));
        }

        let body = route.body.render(request.call_id.as_deref());

        Ok(UpstreamCall {
            method: route.method,
            url,
            body,
        })
    }
}

const LIST_PARAMS: [&str; 2] = ["limit", "page"];

fn append_query(url: &mut Url, request: &InsightRequest, defaults: Option<&ListDefaults>) {
    // On list topics an empty `limit=` or `page=` counts as absent, like empty ids.
    let forwarded: Vec<&(String, String)> = request
        .passthrough
        .iter()
        .filter(|(key, value)| {
            defaults.is_none() || !value.is_empty() || !LIST_PARAMS.contains(&key.as_str())
        })
        .collect();
    let has = |key: &str| forwarded.iter().any(|(k, _)| k == key);

    let mut extra = Vec::new();
    if let Some(defaults) = defaults {
        if !has("limit") {
            extra.push(("limit", defaults.limit.to_string()));
        }
        if !has("page") {
            extra.push(("page", defaults.page.to_string()));
        }
    }

    if forwarded.is_empty() && extra.is_empty() {
        return;
    }

    let mut pairs = url.query_pairs_mut();
    for (key, value) in forwarded {
        pairs.append_pair(key, value);
    }
    for (key, value) in &extra {
        pairs.append_pair(key, value);
    }
}

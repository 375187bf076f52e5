//! The unified `topic` discriminator and the table that maps each topic to
//! the shape of its Gong API call.
//!
//! Adding a topic means adding a variant and a row in [`Topic::route`]; the
//! dispatcher itself has no per-topic branches.

use crate::errors::InsightsError;
use http::Method;
use serde_json::{Value, json};
use std::fmt;

/// Topic used when the caller does not pass one.
pub const DEFAULT_TOPIC: Topic = Topic::Calls;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    Calls,
    Deals,
    Deal,
    DealCalls,
    Highlights,
    Transcript,
}

impl Topic {
    pub const ALL: [Topic; 6] = [
        Topic::Calls,
        Topic::Deals,
        Topic::Deal,
        Topic::DealCalls,
        Topic::Highlights,
        Topic::Transcript,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Topic::Calls => "calls",
            Topic::Deals => "deals",
            Topic::Deal => "deal",
            Topic::DealCalls => "deal_calls",
            Topic::Highlights => "highlights",
            Topic::Transcript => "transcript",
        }
    }

    pub fn parse(value: &str) -> Result<Topic, InsightsError> {
        Topic::ALL
            .into_iter()
            .find(|topic| topic.as_str() == value)
            .ok_or_else(|| InsightsError::InvalidTopic(value.to_string()))
    }

    pub fn route(&self) -> TopicRoute {
        match self {
            Topic::Calls => TopicRoute {
                method: Method::GET,
                path: &[Segment::Literal("v2"), Segment::Literal("calls")],
                required: None,
                body: RouteBody::None,
                paginated: true,
            },
            Topic::Deals => TopicRoute {
                method: Method::GET,
                path: &[Segment::Literal("v2"), Segment::Literal("deals")],
                required: None,
                body: RouteBody::None,
                paginated: true,
            },
            Topic::Deal => TopicRoute {
                method: Method::GET,
                path: &[
                    Segment::Literal("v2"),
                    Segment::Literal("deals"),
                    Segment::Param(Param::DealId),
                ],
                required: Some(Param::DealId),
                body: RouteBody::None,
                paginated: false,
            },
            Topic::DealCalls => TopicRoute {
                method: Method::GET,
                path: &[
                    Segment::Literal("v2"),
                    Segment::Literal("deals"),
                    Segment::Param(Param::DealId),
                    Segment::Literal("calls"),
                ],
                required: Some(Param::DealId),
                body: RouteBody::None,
                paginated: true,
            },
            Topic::Highlights => TopicRoute {
                method: Method::POST,
                path: &[
                    Segment::Literal("v2"),
                    Segment::Literal("calls"),
                    Segment::Literal("extensive"),
                ],
                required: Some(Param::CallId),
                body: RouteBody::CallFilter {
                    content: Some("highlights"),
                },
                paginated: false,
            },
            Topic::Transcript => TopicRoute {
                method: Method::POST,
                path: &[
                    Segment::Literal("v2"),
                    Segment::Literal("calls"),
                    Segment::Literal("transcript"),
                ],
                required: Some(Param::CallId),
                body: RouteBody::CallFilter { content: None },
                paginated: false,
            },
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier parameters a topic may require.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Param {
    DealId,
    CallId,
}

impl Param {
    pub const fn query_name(&self) -> &'static str {
        match self {
            Param::DealId => "deal_id",
            Param::CallId => "call_id",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment {
    Literal(&'static str),
    Param(Param),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteBody {
    None,
    /// `{"filter": {"callIds": [id]}}`, optionally with a content selector
    /// exposing a single content field.
    CallFilter { content: Option<&'static str> },
}

impl RouteBody {
    pub fn render(&self, call_id: Option<&str>) -> Option<Value> {
        match self {
            RouteBody::None => None,
            RouteBody::CallFilter { content } => {
                let mut body = json!({ "filter": { "callIds": [call_id.unwrap_or_default()] } });
                if let Some(field) = content {
                    body["contentSelector"] =
                        json!({ "exposedFields": { "content": { *field: true } } });
                }
                Some(body)
            }
        }
    }
}

/// Shape of the upstream call for one topic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicRoute {
    pub method: Method,
    pub path: &'static [Segment],
    pub required: Option<Param>,
    pub body: RouteBody,
    /// Whether `limit`/`page` defaults are applied.
    pub paginated: bool,
}

/// One parsed `/insights` query. Lives for a single request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsightRequest {
    pub topic: Topic,
    pub deal_id: Option<String>,
    pub call_id: Option<String>,
    /// Remaining query pairs, forwarded to GET routes in order.
    pub passthrough: Vec<(String, String)>,
}

impl InsightRequest {
    pub fn new(topic: Topic) -> Self {
        Self {
            topic,
            deal_id: None,
            call_id: None,
            passthrough: Vec::new(),
        }
    }

    pub fn with_deal_id(mut self, deal_id: impl Into<String>) -> Self {
        self.deal_id = Some(deal_id.into());
        self
    }

    pub fn with_call_id(mut self, call_id: impl Into<String>) -> Self {
        self.call_id = Some(call_id.into());
        self
    }

    /// Parses and validates the raw query string of an `/insights` request.
    pub fn from_query(query: Option<&str>) -> Result<Self, InsightsError> {
        let mut topic = None;
        let mut deal_id = None;
        let mut call_id = None;
        let mut passthrough = Vec::new();

        for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "topic" => topic = Some(value.into_owned()),
                "deal_id" => deal_id = Some(value.into_owned()),
                "call_id" => call_id = Some(value.into_owned()),
                _ => passthrough.push((key.into_owned(), value.into_owned())),
            }
        }

        let topic = match topic {
            Some(value) => Topic::parse(&value)?,
            None => DEFAULT_TOPIC,
        };

        let request = InsightRequest {
            topic,
            deal_id: deal_id.filter(|id| !id.is_empty()),
            call_id: call_id.filter(|id| !id.is_empty()),
            passthrough,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn param(&self, param: Param) -> Option<&str> {
        match param {
            Param::DealId => self.deal_id.as_deref(),
            Param::CallId => self.call_id.as_deref(),
        }
    }

    /// Checks that the id the topic needs is present and non-empty.
    pub fn validate(&self) -> Result<(), InsightsError> {
        match self.topic.route().required {
            Some(param) if self.param(param).is_none_or(str::is_empty) => {
                Err(InsightsError::MissingParameter {
                    topic: self.topic,
                    param,
                })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_topics() {
        for topic in Topic::ALL {
            assert_eq!(Topic::parse(topic.as_str()).unwrap(), topic);
        }

        assert!(matches!(
            Topic::parse("unknown_topic"),
            Err(InsightsError::InvalidTopic(t)) if t == "unknown_topic"
        ));
        assert!(matches!(
            Topic::parse(""),
            Err(InsightsError::InvalidTopic(_))
        ));
        // Literals are case sensitive
        assert!(Topic::parse("Calls").is_err());
    }

    #[test]
    fn test_required_params() {
        let required: Vec<_> = Topic::ALL.iter().map(|t| t.route().required).collect();
        assert_eq!(
            required,
            vec![
                None,
                None,
                Some(Param::DealId),
                Some(Param::DealId),
                Some(Param::CallId),
                Some(Param::CallId),
            ]
        );
    }

    #[test]
    fn test_from_query_defaults_to_calls() {
        let request = InsightRequest::from_query(None).unwrap();
        assert_eq!(request, InsightRequest::new(Topic::Calls));

        let request = InsightRequest::from_query(Some("limit=5")).unwrap();
        assert_eq!(request.topic, Topic::Calls);
        assert_eq!(request.passthrough, vec![("limit".into(), "5".into())]);
    }

    #[test]
    fn test_from_query_missing_parameter() {
        let result = InsightRequest::from_query(Some("topic=deal"));
        assert!(matches!(
            result,
            Err(InsightsError::MissingParameter {
                topic: Topic::Deal,
                param: Param::DealId
            })
        ));

        // An empty id counts as missing
        let result = InsightRequest::from_query(Some("topic=transcript&call_id="));
        assert!(matches!(
            result,
            Err(InsightsError::MissingParameter {
                topic: Topic::Transcript,
                param: Param::CallId
            })
        ));

        // The wrong id does not satisfy the requirement
        let result = InsightRequest::from_query(Some("topic=highlights&deal_id=42"));
        assert!(matches!(
            result,
            Err(InsightsError::MissingParameter {
                param: Param::CallId,
                ..
            })
        ));
    }

    #[test]
    fn test_from_query_invalid_topic() {
        let result = InsightRequest::from_query(Some("topic=unknown_topic&call_id=1"));
        assert!(matches!(result, Err(InsightsError::InvalidTopic(_))));

        let result = InsightRequest::from_query(Some("topic="));
        assert!(matches!(result, Err(InsightsError::InvalidTopic(_))));
    }

    #[test]
    fn test_from_query_decodes_and_keeps_extras() {
        let request = InsightRequest::from_query(Some(
            "topic=deal_calls&deal_id=a%2Fb&fromDateTime=2024-01-01T00%3A00%3A00Z&page=2",
        ))
        .unwrap();

        assert_eq!(request.topic, Topic::DealCalls);
        assert_eq!(request.deal_id.as_deref(), Some("a/b"));
        assert_eq!(
            request.passthrough,
            vec![
                ("fromDateTime".into(), "2024-01-01T00:00:00Z".into()),
                ("page".into(), "2".into()),
            ]
        );
    }

    #[test]
    fn test_route_body() {
        assert_eq!(Topic::Calls.route().body.render(None), None);

        let transcript = Topic::Transcript.route().body.render(Some("123"));
        assert_eq!(
            transcript,
            Some(json!({ "filter": { "callIds": ["123"] } }))
        );

        let highlights = Topic::Highlights.route().body.render(Some("123"));
        assert_eq!(
            highlights,
            Some(json!({
                "filter": { "callIds": ["123"] },
                "contentSelector": { "exposedFields": { "content": { "highlights": true } } }
            }))
        );
    }
}

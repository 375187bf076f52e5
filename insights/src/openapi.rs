//! OpenAPI descriptor consumed by Custom GPT actions.

use crate::topic::{DEFAULT_TOPIC, Topic};
use serde_json::{Value, json};

pub const OPERATION_ID: &str = "getInsights";

/// Builds the descriptor advertising `server_url` as the only server.
pub fn descriptor(server_url: &str) -> Value {
    let topics: Vec<&str> = Topic::ALL.iter().map(Topic::as_str).collect();

    json!({
        "openapi": "3.1.0",
        "info": {
            "title": "Gong Insights",
            "description": "Read calls, deals, call highlights and transcripts from Gong.",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "servers": [{ "url": server_url }],
        "paths": {
            "/insights": {
                "get": {
                    "operationId": OPERATION_ID,
                    "summary": "Fetch Gong data for a topic",
                    "description": "`deal` and `deal_calls` require `deal_id`. `highlights` and `transcript` require `call_id`. Any other query parameter is forwarded to Gong on list topics.",
                    "parameters": [
                        {
                            "name": "topic",
                            "in": "query",
                            "required": false,
                            "description": "Which Gong resource to fetch.",
                            "schema": {
                                "type": "string",
                                "enum": topics,
                                "default": DEFAULT_TOPIC.as_str(),
                            },
                        },
                        {
                            "name": "deal_id",
                            "in": "query",
                            "required": false,
                            "description": "Gong deal identifier, for `deal` and `deal_calls`.",
                            "schema": { "type": "string" },
                        },
                        {
                            "name": "call_id",
                            "in": "query",
                            "required": false,
                            "description": "Gong call identifier, for `highlights` and `transcript`.",
                            "schema": { "type": "string" },
                        },
                        {
                            "name": "limit",
                            "in": "query",
                            "required": false,
                            "description": "Maximum number of records on list topics.",
                            "schema": { "type": "integer", "minimum": 1 },
                        },
                        {
                            "name": "page",
                            "in": "query",
                            "required": false,
                            "description": "Page number on list topics.",
                            "schema": { "type": "integer", "minimum": 1 },
                        },
                    ],
                    "responses": {
                        "200": {
                            "description": "The Gong API response, unchanged.",
                            "content": {
                                "application/json": { "schema": { "type": "object" } },
                            },
                        },
                        "400": {
                            "description": "Unknown topic or missing identifier.",
                            "content": {
                                "application/json": { "schema": { "$ref": "#/components/schemas/Error" } },
                            },
                        },
                        "502": {
                            "description": "Gong could not be reached.",
                            "content": {
                                "application/json": { "schema": { "$ref": "#/components/schemas/Error" } },
                            },
                        },
                    },
                },
            },
        },
        "components": {
            "schemas": {
                "Error": {
                    "type": "object",
                    "properties": { "error": { "type": "string" } },
                    "required": ["error"],
                },
            },
        },
    })
}

//! Backend implementation over the REST API.
//!
//! Resources follow Eve conventions: lists come back as `{"_items": [...]}`,
//! writes answer with the item's meta fields only (`_id`, `_etag`, ...) and
//! updates must present the current `_etag` in `If-Match`.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, IF_MATCH};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::{Backend, SearchEndpoint};
use crate::error::{PlanningError, Result};
use crate::models::{Agenda, Coverage, Planning, PlanningHistory, Record, strip_reserved_fields};
use crate::query::SearchRequest;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const HISTORY_PAGE_SIZE: u32 = 200;

/// Response fields describing the exchange rather than the document.
const ENVELOPE_FIELDS: [&str; 3] = ["_type", "_status", "_links"];

/// Talks to the backend over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Creates a client for `base_url`, e.g. `https://example.org/api`.
    pub fn new(base_url: impl Into<String>, token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let value = HeaderValue::from_str(token).map_err(|e| {
                PlanningError::invalid_input("token").with_reason(e.to_string())
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| PlanningError::http("failed to build HTTP client", e))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str, etag: Option<&str>) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match etag {
            Some(etag) => builder.header(IF_MATCH, etag),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, action: &str) -> Result<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| PlanningError::http(format!("{action} failed"), e))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(PlanningError::Backend {
            status: Some(status),
            message: error_message(&body).unwrap_or_else(|| format!("{action} failed")),
        })
    }

    async fn send_json(&self, builder: RequestBuilder, action: &str) -> Result<Value> {
        let response = self.send(builder, action).await?;
        response
            .json()
            .await
            .map_err(|e| PlanningError::http(format!("{action} returned an unreadable body"), e))
    }

    /// Writes `payload` and returns it overlaid with the meta fields from
    /// the answer.
    async fn write<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        etag: Option<&str>,
        payload: Value,
        action: &str,
    ) -> Result<T> {
        debug!("{method} {path}");
        let builder = self.request(method, path, etag).json(&payload);
        let answer = self.send_json(builder, action).await?;
        Ok(serde_json::from_value(overlay(payload, answer))?)
    }

    /// Fetches one document, reporting a 404 as [`PlanningError::NotFound`].
    async fn get_one<T>(&self, resource: &str, kind: &str, id: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let builder = self.request(Method::GET, &format!("{resource}/{id}"), None);
        match self.send_json(builder, &format!("fetch {}", kind.to_lowercase())).await {
            Ok(body) => Ok(serde_json::from_value(without_envelope(body))?),
            Err(PlanningError::Backend {
                status: Some(404), ..
            }) => Err(PlanningError::NotFound {
                kind: kind.to_string(),
                id: id.to_string(),
            }),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn search(
        &self,
        endpoint: SearchEndpoint,
        request: &SearchRequest,
    ) -> Result<Vec<Record>> {
        let mut params: Vec<(&str, String)> =
            vec![("source", serde_json::to_string(&request.source)?)];
        if let Some(page) = request.page {
            params.push(("page", page.to_string()));
        }
        if let Some(max_results) = request.max_results {
            params.push(("max_results", max_results.to_string()));
        }
        if endpoint == SearchEndpoint::Planning {
            params.push(("embedded", json!({ "original_creator": 1 }).to_string()));
        }

        debug!("GET {endpoint} {params:?}");
        let builder = self.request(Method::GET, endpoint.resource(), None).query(&params);
        let body = self.send_json(builder, &format!("search {endpoint}")).await?;
        decode_items(body, endpoint)
    }

    async fn get_planning(&self, id: &str) -> Result<Planning> {
        self.get_one("planning", "Planning item", id).await
    }

    async fn save_planning(
        &self,
        existing: Option<&Planning>,
        payload: &Value,
    ) -> Result<Planning> {
        match existing.and_then(|item| item.id.as_deref().map(|id| (id, item))) {
            Some((id, item)) => {
                self.write(
                    Method::PATCH,
                    &format!("planning/{id}"),
                    item.etag.as_deref(),
                    payload.clone(),
                    "update planning item",
                )
                .await
            }
            None => {
                self.write(Method::POST, "planning", None, payload.clone(), "create planning item")
                    .await
            }
        }
    }

    async fn save_coverage(&self, coverage: &Coverage) -> Result<Coverage> {
        let payload = strip_reserved_fields(serde_json::to_value(coverage)?);
        match coverage.id.as_deref() {
            Some(id) => {
                self.write(
                    Method::PATCH,
                    &format!("coverage/{id}"),
                    coverage.etag.as_deref(),
                    payload,
                    "update coverage",
                )
                .await
            }
            None => {
                self.write(Method::POST, "coverage", None, payload, "create coverage")
                    .await
            }
        }
    }

    async fn delete_coverage(&self, coverage: &Coverage) -> Result<()> {
        let id = coverage.id.as_deref().ok_or_else(|| {
            PlanningError::invalid_input("coverage")
                .with_reason("cannot delete an unsaved coverage")
        })?;
        let path = format!("coverage/{id}");
        let builder = self.request(Method::DELETE, &path, coverage.etag.as_deref());
        self.send(builder, "delete coverage").await?;
        Ok(())
    }

    async fn spike_planning(&self, planning: &Planning) -> Result<Planning> {
        self.set_spiked(planning, "spike").await
    }

    async fn unspike_planning(&self, planning: &Planning) -> Result<Planning> {
        self.set_spiked(planning, "unspike").await
    }

    async fn get_coverage(&self, id: &str) -> Result<Coverage> {
        self.get_one("coverage", "Coverage", id).await
    }

    async fn planning_history(&self, planning_id: &str) -> Result<Vec<PlanningHistory>> {
        let params = [
            ("where", json!({ "planning_id": planning_id }).to_string()),
            ("max_results", HISTORY_PAGE_SIZE.to_string()),
            ("sort", "[(\"_created\", 1)]".to_string()),
        ];
        debug!("GET planning_history {params:?}");
        let builder = self.request(Method::GET, "planning_history", None).query(&params);
        let body = self.send_json(builder, "fetch planning history").await?;
        match body.get("_items") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| Ok(serde_json::from_value(item.clone())?))
                .collect(),
            _ => Err(PlanningError::Backend {
                status: None,
                message: "Failed to retrieve planning history".to_string(),
            }),
        }
    }

    async fn lock_planning(&self, planning: &Planning) -> Result<Planning> {
        self.set_locked(planning, "lock", json!({ "lock_action": "edit" }))
            .await
    }

    async fn unlock_planning(&self, planning: &Planning) -> Result<Planning> {
        self.set_locked(planning, "unlock", json!({})).await
    }

    async fn get_agenda(&self, id: &str) -> Result<Agenda> {
        self.get_one("agenda", "Agenda", id).await
    }
}

impl HttpBackend {
    async fn set_spiked(&self, planning: &Planning, action: &str) -> Result<Planning> {
        let id = planning.id.as_deref().ok_or_else(|| {
            PlanningError::invalid_input("planning")
                .with_reason(format!("cannot {action} an unsaved item"))
        })?;
        let builder = self
            .request(Method::PATCH, &format!("planning/{action}/{id}"), planning.etag.as_deref())
            .json(&json!({}));
        let answer = self.send_json(builder, &format!("{action} planning item")).await?;
        Ok(serde_json::from_value(overlay(serde_json::to_value(planning)?, answer))?)
    }

    /// Lock endpoints answer with the whole item, lock fields included.
    async fn set_locked(
        &self,
        planning: &Planning,
        action: &str,
        body: Value,
    ) -> Result<Planning> {
        let id = planning.id.as_deref().ok_or_else(|| {
            PlanningError::invalid_input("planning")
                .with_reason(format!("cannot {action} an unsaved item"))
        })?;
        let builder = self
            .request(Method::POST, &format!("planning/{id}/{action}"), None)
            .json(&body);
        let answer = self.send_json(builder, &format!("{action} planning item")).await?;
        Ok(serde_json::from_value(overlay(serde_json::to_value(planning)?, answer))?)
    }
}

/// Extracts the human-readable part of an error body.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("_message")
        .or_else(|| value.get("_error").and_then(|error| error.get("message")))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Decodes `_items`, tagging hits that lack a `_type`.
fn decode_items(body: Value, endpoint: SearchEndpoint) -> Result<Vec<Record>> {
    let Some(Value::Array(items)) = body.get("_items").cloned() else {
        return Err(PlanningError::Backend {
            status: None,
            message: "Failed to retrieve items".to_string(),
        });
    };

    items
        .into_iter()
        .map(|mut item| {
            let default_type = endpoint.default_type();
            if let (Some(object), Some(default_type)) = (item.as_object_mut(), default_type) {
                object
                    .entry("_type")
                    .or_insert_with(|| Value::String(default_type.to_string()));
            }
            Ok(serde_json::from_value(item)?)
        })
        .collect()
}

/// Drops the exchange fields of a response body.
fn without_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut fields) => {
            for key in ENVELOPE_FIELDS {
                fields.remove(key);
            }
            Value::Object(fields)
        }
        other => other,
    }
}

/// Copies every document field of `answer` onto `payload`.
fn overlay(payload: Value, answer: Value) -> Value {
    match (payload, without_envelope(answer)) {
        (Value::Object(mut merged), Value::Object(answer)) => {
            merged.extend(answer);
            Value::Object(merged)
        }
        (payload, Value::Null) => payload,
        (_, answer) => answer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_message_field() {
        assert_eq!(
            error_message(r#"{"_message": "Not allowed"}"#).as_deref(),
            Some("Not allowed")
        );
        let body = r#"{"_status": "ERR", "_error": {"code": 412, "message": "Etag mismatch"}}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("Etag mismatch")
        );
        assert_eq!(error_message("<html>oops</html>"), None);
    }

    #[test]
    fn test_decode_items_tags_untyped_hits() {
        let body = json!({ "_items": [{ "_id": "p1", "slugline": "budget" }] });
        let records = decode_items(body, SearchEndpoint::Planning).unwrap();
        assert_eq!(records[0].id(), Some("p1"));
        assert!(records[0].as_planning().is_some());
    }

    #[test]
    fn test_decode_items_requires_items() {
        let result = decode_items(json!({ "_status": "OK" }), SearchEndpoint::Combined);
        assert!(matches!(result, Err(PlanningError::Backend { status: None, .. })));
    }

    #[test]
    fn test_overlay_keeps_payload_and_adds_meta() {
        let merged = overlay(
            json!({ "slugline": "budget" }),
            json!({ "_id": "p1", "_etag": "abc", "_status": "OK" }),
        );
        let planning: Planning = serde_json::from_value(merged).unwrap();
        assert_eq!(planning.id.as_deref(), Some("p1"));
        assert_eq!(planning.etag.as_deref(), Some("abc"));
        assert_eq!(planning.slugline.as_deref(), Some("budget"));
    }

    #[test]
    fn test_overlay_drops_envelope_fields() {
        let merged = overlay(
            json!({ "slugline": "budget" }),
            json!({ "_id": "p1", "_status": "OK", "_links": {}, "_type": "planning" }),
        );
        assert_eq!(merged, json!({ "slugline": "budget", "_id": "p1" }));
    }

    #[test]
    fn test_decode_items_keeps_unknown_states() {
        let body = json!({ "_items": [
            { "_id": "p1", "state": "active" },
            { "_id": "p2", "state": "under_review" }
        ] });
        let records = decode_items(body, SearchEndpoint::Planning).unwrap();
        let states: Vec<&str> = records
            .iter()
            .filter_map(Record::as_planning)
            .map(|planning| planning.state.as_str())
            .collect();
        assert_eq!(states, vec!["active", "under_review"]);
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let backend = HttpBackend::new("http://localhost:5000/api/", None).unwrap();
        assert_eq!(backend.url("planning"), "http://localhost:5000/api/planning");
    }
}

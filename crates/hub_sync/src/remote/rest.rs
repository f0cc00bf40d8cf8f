//! PostgREST client (the wire format Supabase exposes under `/rest/v1`)

use super::RemoteTable;
use crate::SyncError;
use async_trait::async_trait;
use hub_common::sanitizer::LogSanitizer;
use hub_config::RemoteConfig;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

const PREFER_MINIMAL: &str = "return=minimal";
const PREFER_UPSERT: &str = "resolution=merge-duplicates,return=minimal";

/// Shared HTTP client for one backend; hands out per-table handles
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    base_url: String,
    sanitizer: Arc<LogSanitizer>,
}

impl RestClient {
    /// Build a client from `[remote]` settings
    ///
    /// Fails with [`SyncError::NotConfigured`] when URL or key is missing or
    /// malformed. No request is made.
    pub fn from_config(remote: &RemoteConfig) -> crate::Result<Self> {
        remote
            .validate()
            .map_err(|e| SyncError::NotConfigured(e.to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(&remote.api_key)?);
        headers.insert(
            AUTHORIZATION,
            header_value(&format!("Bearer {}", remote.api_key))?,
        );
        headers.insert("x-client-info", header_value(&remote.client_header)?);

        let http = Client::builder()
            .timeout(remote.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| SyncError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: remote.url.trim_end_matches('/').to_string(),
            sanitizer: Arc::new(LogSanitizer::new().with_secret(&remote.api_key)),
        })
    }

    /// Check that the backend answers at all
    ///
    /// Any HTTP status counts as reachable; only transport failures fail.
    pub async fn probe(&self) -> crate::Result<()> {
        let url = format!("{}/rest/v1/", self.base_url);
        let response = self.http.get(&url).send().await?;
        debug!("Remote probe answered HTTP {}", response.status());
        Ok(())
    }

    /// Handle for one table
    pub fn table(&self, name: &str) -> RestTable {
        RestTable {
            client: self.clone(),
            table: name.to_string(),
        }
    }
}

fn header_value(value: &str) -> crate::Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| SyncError::NotConfigured("header contains invalid characters".to_string()))
}

/// PostgREST `in` list: `("a","b")`, quoting every id
fn in_list(ids: &[String]) -> String {
    let quoted: Vec<String> = ids
        .iter()
        .map(|id| format!("\"{}\"", id.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("({})", quoted.join(","))
}

/// One table of a [`RestClient`] backend
#[derive(Clone)]
pub struct RestTable {
    client: RestClient,
    table: String,
}

impl RestTable {
    fn url(&self) -> String {
        format!("{}/rest/v1/{}", self.client.base_url, self.table)
    }

    /// Turn non-2xx responses into [`SyncError::Remote`]
    async fn check(&self, response: Response) -> crate::Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        // PostgREST errors are {"message", "code", "details", "hint"}
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| {
                if body.is_empty() {
                    format!("HTTP {}", status.as_u16())
                } else {
                    body
                }
            });

        Err(SyncError::Remote {
            status: status.as_u16(),
            message: self.client.sanitizer.sanitize(&message),
        })
    }

    async fn send_delete(&self, filter: String) -> crate::Result<()> {
        let response = self
            .client
            .http
            .delete(self.url())
            .query(&[("id", filter)])
            .header("Prefer", PREFER_MINIMAL)
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteTable for RestTable {
    fn name(&self) -> &str {
        &self.table
    }

    async fn select_all(&self) -> crate::Result<Vec<Value>> {
        let response = self
            .client
            .http
            .get(self.url())
            .query(&[("select", "*")])
            .send()
            .await?;
        let body = self.check(response).await?.text().await?;

        serde_json::from_str::<Vec<Value>>(&body)
            .map_err(|e| SyncError::InvalidPayload(format!("{}: {}", self.table, e)))
    }

    async fn insert(&self, row: Value) -> crate::Result<()> {
        let response = self
            .client
            .http
            .post(self.url())
            .header("Prefer", PREFER_MINIMAL)
            .json(&row)
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }

    async fn update_by_id(&self, id: &str, patch: Map<String, Value>) -> crate::Result<()> {
        let response = self
            .client
            .http
            .patch(self.url())
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", PREFER_MINIMAL)
            .json(&patch)
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> crate::Result<()> {
        self.send_delete(format!("eq.{}", id)).await
    }

    async fn delete_where_id_not_in(&self, ids: &[String]) -> crate::Result<()> {
        self.send_delete(format!("not.in.{}", in_list(ids))).await
    }

    async fn delete_where_id_ne(&self, sentinel: &str) -> crate::Result<()> {
        self.send_delete(format!("neq.{}", sentinel)).await
    }

    async fn upsert(&self, rows: Vec<Value>) -> crate::Result<()> {
        let response = self
            .client
            .http
            .post(self.url())
            .query(&[("columns", column_list(&rows))])
            .header("Prefer", PREFER_UPSERT)
            .json(&rows)
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }
}

/// Quoted union of the rows' keys in first-seen order
///
/// Bulk bodies whose objects differ in keys are rejected unless the column
/// set is named explicitly; missing keys then take the column default.
fn column_list(rows: &[Value]) -> String {
    let mut columns: Vec<&str> = Vec::new();
    for key in rows.iter().filter_map(Value::as_object).flat_map(|row| row.keys()) {
        if !columns.contains(&key.as_str()) {
            columns.push(key);
        }
    }
    columns
        .iter()
        .map(|column| format!("\"{}\"", column))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_column_list_is_union_of_keys() {
        let rows = vec![
            json!({"id": "mo", "day": "Montag", "breakfast": "Müsli"}),
            json!({"id": "di", "day": "Dienstag", "mealName": "Suppe"}),
        ];
        assert_eq!(column_list(&rows), r#""breakfast","day","id","mealName""#);
    }

    #[test]
    fn test_in_list_quotes_ids() {
        let ids = vec!["a".to_string(), "b\"c".to_string()];
        assert_eq!(in_list(&ids), r#"("a","b\"c")"#);
    }

    #[test]
    fn test_from_config_requires_credentials() {
        let result = RestClient::from_config(&RemoteConfig::default());
        assert!(matches!(result, Err(SyncError::NotConfigured(_))));
    }

    #[test]
    fn test_from_config_rejects_bad_header() {
        let remote = RemoteConfig {
            url: "https://example.supabase.co".to_string(),
            api_key: "line\nbreak".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            RestClient::from_config(&remote),
            Err(SyncError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_table_url_trims_slash() {
        let remote = RemoteConfig {
            url: "https://example.supabase.co/".to_string(),
            api_key: "anon".to_string(),
            ..Default::default()
        };
        let table = RestClient::from_config(&remote).unwrap().table("shopping");
        assert_eq!(table.url(), "https://example.supabase.co/rest/v1/shopping");
        assert_eq!(table.name(), "shopping");
    }
}

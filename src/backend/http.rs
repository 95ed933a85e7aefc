//! HTTP implementation of the remote store boundary
//!
//! Speaks JSON to the hosted store's REST surface:
//! `GET /api/v1/{table}?owner={id}`, `POST /api/v1/{table}/upsert`,
//! `DELETE /api/v1/{table}/{id}?owner={id}`, all bearer-authenticated.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::BackendError;
use crate::remote::Collection;

use super::SyncBackend;

/// Default timeout for API requests; no explicit retry/backoff policy on
/// top of it.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct UpsertRequest {
    owner: String,
    rows: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RowsResponse {
    #[serde(default)]
    rows: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
}

/// Bearer-authenticated REST client for the hosted store.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, token: &str) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(BackendError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn url(&self, collection: Collection, suffix: &str) -> String {
        format!("{}/api/v1/{}{}", self.base_url, collection.table(), suffix)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|e| e.error)
            .unwrap_or(body);
        Err(BackendError::api(status.as_u16(), message))
    }
}

#[async_trait]
impl SyncBackend for HttpBackend {
    async fn fetch_rows(
        &self,
        collection: Collection,
        owner: &str,
    ) -> Result<Vec<serde_json::Value>, BackendError> {
        let response = self
            .client
            .get(self.url(collection, ""))
            .query(&[("owner", owner)])
            .bearer_auth(&self.token)
            .send()
            .await?;

        let response = Self::check(response).await?;
        let body: RowsResponse = response.json().await?;
        Ok(body.rows)
    }

    async fn upsert_rows(
        &self,
        collection: Collection,
        owner: &str,
        rows: Vec<serde_json::Value>,
    ) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.url(collection, "/upsert"))
            .bearer_auth(&self.token)
            .json(&UpsertRequest {
                owner: owner.to_string(),
                rows,
            })
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn delete_row(
        &self,
        collection: Collection,
        owner: &str,
        id: &str,
    ) -> Result<(), BackendError> {
        let response = self
            .client
            .delete(self.url(collection, &format!("/{id}")))
            .query(&[("owner", owner)])
            .bearer_auth(&self.token)
            .send()
            .await?;

        // Deleting an already-absent row is not an error.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check(response).await?;
        Ok(())
    }
}

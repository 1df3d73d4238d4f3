//! Client for a hosted document database speaking the REST protocol served by
//! [`crate::server`].

use super::engine::DocumentStore;
use crate::core::{EntityInstance, EntityKind, Fields, StoreError, StoreResult};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct InsertedDocument {
    id: String,
}

pub struct HttpStore {
    client: Client,
    base: Url,
}

impl HttpStore {
    /// Creates a client for the store rooted at `base_url`
    /// (`http://host:port/optional/prefix`).
    pub fn new(base_url: &str, timeout: Duration) -> StoreResult<Self> {
        let base = Url::parse(base_url)
            .map_err(|err| StoreError::unavailable(format!("Invalid store URL '{}': {}", base_url, err)))?;
        if base.cannot_be_a_base() {
            return Err(StoreError::unavailable(format!(
                "Store URL '{}' cannot carry a path",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| StoreError::unavailable(format!("Failed to build HTTP client: {}", err)))?;

        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, kind: EntityKind, id: Option<&str>) -> StoreResult<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StoreError::unavailable("store URL cannot carry a path"))?;
            segments.pop_if_empty().push(kind.as_str());
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }
}

fn transport(err: reqwest::Error) -> StoreError {
    StoreError::unavailable(err.to_string())
}

/// Maps a non-success response onto the store taxonomy.
async fn status_error(response: Response, kind: EntityKind, id: Option<&str>) -> StoreError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    match status {
        StatusCode::NOT_FOUND => match id {
            Some(id) => StoreError::not_found(kind, id),
            None => StoreError::unavailable(format!("collection '{}' is not served", kind)),
        },
        StatusCode::BAD_REQUEST
        | StatusCode::FORBIDDEN
        | StatusCode::CONFLICT
        | StatusCode::UNPROCESSABLE_ENTITY => {
            StoreError::rejected(format!("{}: {}", status, body.trim()))
        }
        _ => StoreError::unavailable(format!("{}: {}", status, body.trim())),
    }
}

#[async_trait]
impl DocumentStore for HttpStore {
    async fn list_all(&self, kind: EntityKind) -> StoreResult<Vec<EntityInstance>> {
        let response = self
            .client
            .get(self.url(kind, None)?)
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(status_error(response, kind, None).await);
        }

        let instances: Vec<EntityInstance> = response.json().await.map_err(transport)?;
        debug!(%kind, count = instances.len(), "listed documents");
        Ok(instances)
    }

    async fn insert(&self, kind: EntityKind, fields: Fields) -> StoreResult<String> {
        let response = self
            .client
            .post(self.url(kind, None)?)
            .json(&fields)
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(status_error(response, kind, None).await);
        }

        let inserted: InsertedDocument = response.json().await.map_err(transport)?;
        Ok(inserted.id)
    }

    async fn update(&self, kind: EntityKind, id: &str, fields: Fields) -> StoreResult<()> {
        let response = self
            .client
            .put(self.url(kind, Some(id))?)
            .json(&fields)
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(status_error(response, kind, Some(id)).await);
        }
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> StoreResult<()> {
        let response = self
            .client
            .delete(self.url(kind, Some(id))?)
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(status_error(response, kind, Some(id)).await);
        }
        Ok(())
    }
}

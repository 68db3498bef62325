use std::time::Duration;

use async_trait::async_trait;
use autodoc_core::{
    Assignment, AssignmentUpdate, Car, Color, Id, NewAssignment, Person, Role, StatusBatch,
    WorkItem, WorkType,
};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::{AssignmentFilter, ExternalStore, StoreError};
use crate::config::Config;

/// Status the store answers a successful `DELETE` with.
const DELETED_STATUS: StatusCode = StatusCode::NO_CONTENT;

/// [`ExternalStore`] backed by the store's HTTP/JSON API.
#[derive(Clone, Debug)]
pub struct HttpStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_rows<T: DeserializeOwned>(
        &self,
        path: &str,
        request: RequestBuilder,
    ) -> Result<Vec<T>, StoreError> {
        let body = expect_body(request.send().await?).await?;
        decode_rows(path, body)
    }

    async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, StoreError> {
        self.get_rows(path, self.client.get(self.url(path))).await
    }

    async fn write(&self, request: RequestBuilder) -> Result<Option<Value>, StoreError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(rejection(response).await);
        }
        let text = response.text().await?;
        debug!(status = status.as_u16(), body = %text, "Store accepted write");
        Ok(meaningful_payload(&text))
    }
}

#[async_trait]
impl ExternalStore for HttpStore {
    #[tracing::instrument(skip(self))]
    async fn list_cars(&self) -> Result<Vec<Car>, StoreError> {
        self.list("cars").await
    }

    #[tracing::instrument(skip(self))]
    async fn list_colors(&self) -> Result<Vec<Color>, StoreError> {
        self.list("colors").await
    }

    #[tracing::instrument(skip(self))]
    async fn list_works(&self) -> Result<Vec<WorkType>, StoreError> {
        self.list("works").await
    }

    #[tracing::instrument(skip(self))]
    async fn list_persons(&self) -> Result<Vec<Person>, StoreError> {
        self.list("persons").await
    }

    #[tracing::instrument(skip(self))]
    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        self.list("roles").await
    }

    #[tracing::instrument(skip(self))]
    async fn list_assignments(
        &self,
        filter: AssignmentFilter,
    ) -> Result<Vec<Assignment>, StoreError> {
        let path = "work-assignments";
        let request = self.client.get(self.url(path)).query(&filter);
        self.get_rows(path, request).await
    }

    #[tracing::instrument(skip(self))]
    async fn get_assignment(&self, id: Id) -> Result<Assignment, StoreError> {
        let response = self
            .client
            .get(self.url(&format!("work-assignments/{id}")))
            .send()
            .await?;
        let body = expect_body(response).await?;
        serde_json::from_value(body).map_err(|err| StoreError::Decode(err.to_string()))
    }

    #[tracing::instrument(skip(self))]
    async fn list_assignment_works(&self, assignment_id: Id) -> Result<Vec<WorkItem>, StoreError> {
        let path = "work-assignment-works";
        let request = self
            .client
            .get(self.url(path))
            .query(&[("work_assignment_id", assignment_id)]);
        self.get_rows(path, request).await
    }

    #[tracing::instrument(skip(self))]
    async fn create_assignment(
        &self,
        payload: &NewAssignment,
    ) -> Result<Option<Value>, StoreError> {
        self.write(self.client.post(self.url("work-assignments")).json(payload))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn update_assignment(
        &self,
        update: &AssignmentUpdate,
    ) -> Result<Option<Value>, StoreError> {
        let url = self.url(&format!("work-assignments/{}", update.id));
        self.write(self.client.put(url).json(update)).await
    }

    #[tracing::instrument(skip(self))]
    async fn update_work_status(&self, batch: &StatusBatch) -> Result<Option<Value>, StoreError> {
        let url = self.url("work-assignment-works/update-status/");
        self.write(self.client.post(url).json(batch)).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_assignment(&self, id: Id) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(self.url(&format!("work-assignments/{id}")))
            .send()
            .await?;
        if response.status() == DELETED_STATUS {
            return Ok(());
        }
        Err(rejection(response).await)
    }
}

/// Reads a successful JSON body, turning any other status into a rejection.
async fn expect_body(response: Response) -> Result<Value, StoreError> {
    if !response.status().is_success() {
        return Err(rejection(response).await);
    }
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|err| StoreError::Decode(err.to_string()))
}

/// Decodes a list response row by row. Rows that do not match the model are
/// logged and skipped so one bad row cannot blank out a whole page.
fn decode_rows<T: DeserializeOwned>(path: &str, body: Value) -> Result<Vec<T>, StoreError> {
    let Value::Array(rows) = body else {
        return Err(StoreError::Decode(format!("expected a list from '{path}'")));
    };
    let rows = rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value::<T>(row) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                warn!(path, error = %err, "Skipping malformed row from the external store");
                None
            }
        })
        .collect();
    Ok(rows)
}

/// Builds a rejection from a non-success response, preferring the JSON
/// `detail` field and falling back to the raw text.
async fn rejection(response: Response) -> StoreError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    StoreError::Rejected {
        status,
        detail: extract_detail(&text),
    }
}

fn extract_detail(text: &str) -> String {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|body| match body.get("detail")? {
            Value::String(detail) => Some(detail.clone()),
            other => Some(other.to_string()),
        })
        .unwrap_or_else(|| text.to_string())
}

/// Some successful writes come back with an empty or non-JSON body; those
/// carry no payload.
fn meaningful_payload(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Null) => None,
        Ok(Value::Object(map)) if map.is_empty() => None,
        Ok(Value::Array(items)) if items.is_empty() => None,
        Ok(value) => Some(value),
        Err(_) => {
            if !text.trim().is_empty() {
                warn!(body = %text, "Store returned a non-JSON success body");
            }
            None
        }
    }
}

//! Consumer side of the external data store.
//!
//! The store owns every persisted row. [`ExternalStore`] is the seam the rest
//! of the server talks to; [`HttpStore`] is the HTTP/JSON implementation.

use async_trait::async_trait;
use autodoc_core::{
    Assignment, AssignmentUpdate, Car, Color, Id, NewAssignment, Person, Role, StatusBatch,
    WorkItem, WorkType,
};
use serde::Serialize;

mod http;

pub use http::HttpStore;

/// Error type for external store calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The request never produced a response (connection refused, timeout...).
    #[error("Connection to the external store failed: {0}")]
    Transport(String),
    /// The store answered with a non-success status.
    #[error("API returned status {status}: {detail}")]
    Rejected { status: u16, detail: String },
    /// The store answered successfully but the body was not what we expected.
    #[error("Unexpected response from the external store: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Transport(err.to_string())
    }
}

/// Query for `GET work-assignments`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AssignmentFilter {
    pub year: i32,
    pub month: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
}

impl AssignmentFilter {
    pub fn month(year: i32, month: u32) -> Self {
        Self {
            year,
            month,
            day: None,
        }
    }

    pub fn day(year: i32, month: u32, day: u32) -> Self {
        Self {
            year,
            month,
            day: Some(day),
        }
    }
}

/// Operations the server needs from the external store.
///
/// Write operations return the decoded response body, or `None` when the
/// store answered successfully without a meaningful payload.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExternalStore: Send + Sync {
    async fn list_cars(&self) -> Result<Vec<Car>, StoreError>;
    async fn list_colors(&self) -> Result<Vec<Color>, StoreError>;
    async fn list_works(&self) -> Result<Vec<WorkType>, StoreError>;
    async fn list_persons(&self) -> Result<Vec<Person>, StoreError>;
    async fn list_roles(&self) -> Result<Vec<Role>, StoreError>;

    async fn list_assignments(
        &self,
        filter: AssignmentFilter,
    ) -> Result<Vec<Assignment>, StoreError>;
    async fn get_assignment(&self, id: Id) -> Result<Assignment, StoreError>;
    async fn list_assignment_works(&self, assignment_id: Id) -> Result<Vec<WorkItem>, StoreError>;

    async fn create_assignment(
        &self,
        payload: &NewAssignment,
    ) -> Result<Option<serde_json::Value>, StoreError>;
    async fn update_assignment(
        &self,
        update: &AssignmentUpdate,
    ) -> Result<Option<serde_json::Value>, StoreError>;
    async fn update_work_status(
        &self,
        batch: &StatusBatch,
    ) -> Result<Option<serde_json::Value>, StoreError>;
    /// Succeeds only when the store confirms the deletion.
    async fn delete_assignment(&self, id: Id) -> Result<(), StoreError>;
}

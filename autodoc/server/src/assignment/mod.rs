//! Create, update, status-change and delete of assignments.
//!
//! Every operation validates locally first, then makes exactly one write
//! round trip to the external store. Nothing is retried.

use autodoc_core::{
    Assignment, CreateAssignment, Id, StatusBatch, UpdateAssignment, ValidationError, WorkItem,
};
use chrono::NaiveDate;
use serde_json::Value;

use crate::store::{ExternalStore, StoreError};

pub mod api;

pub use api::create_assignment_router;

#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The store rejected the request; status and detail are relayed as is.
    #[error("API returned status {status}: {detail}")]
    Upstream { status: u16, detail: String },
    #[error("Connection to the external store failed: {0}")]
    Unavailable(String),
    #[error("Status update failed")]
    StatusUpdateFailed,
    #[error("Unexpected response from the external store: {0}")]
    Unexpected(String),
}

impl From<StoreError> for AssignmentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Transport(message) => AssignmentError::Unavailable(message),
            StoreError::Rejected { status, detail } => AssignmentError::Upstream { status, detail },
            StoreError::Decode(message) => AssignmentError::Unexpected(message),
        }
    }
}

/// Outcome of a successful create.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedAssignment {
    /// Day the new assignment lands on.
    pub date: NaiveDate,
    /// Whatever the store answered with, if it was meaningful JSON.
    pub payload: Option<Value>,
}

/// An assignment with its work items, as shown on the edit card.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentDetails {
    pub assignment: Assignment,
    pub works: Vec<WorkItem>,
}

pub struct AssignmentService<'a> {
    store: &'a dyn ExternalStore,
}

impl<'a> AssignmentService<'a> {
    pub fn new(store: &'a dyn ExternalStore) -> Self {
        Self { store }
    }

    /// Validates a create request and posts it to the store.
    ///
    /// # Arguments
    ///
    /// * `request` - The assignment and its work lines as submitted.
    ///
    /// # Returns
    ///
    /// A `Result` containing the day of the new assignment and the store's answer,
    /// or a validation or store error.
    #[tracing::instrument(skip(self))]
    pub async fn create(
        &self,
        request: CreateAssignment,
    ) -> Result<CreatedAssignment, AssignmentError> {
        let assignment = request.validate()?;
        let payload = self.store.create_assignment(&assignment).await?;
        tracing::info!(
            date = %assignment.date,
            works = assignment.works.len(),
            "Created assignment"
        );
        Ok(CreatedAssignment {
            date: assignment.date.date(),
            payload,
        })
    }

    /// Validates an update request and sends it to the store.
    ///
    /// # Arguments
    ///
    /// * `request` - The changed assignment fields and its full list of work lines.
    ///
    /// # Returns
    ///
    /// A `Result` containing the store's answer if it was meaningful JSON, or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn update(&self, request: UpdateAssignment) -> Result<Option<Value>, AssignmentError> {
        let update = request.validate()?;
        let payload = self.store.update_assignment(&update).await?;
        tracing::info!(id = update.id, works = update.works.len(), "Updated assignment");
        Ok(payload)
    }

    /// Sends the batch even when it is empty. Success requires the store to
    /// answer with a JSON body carrying `success`.
    ///
    /// # Arguments
    ///
    /// * `batch` - The assignment id with the work item statuses to set.
    ///
    /// # Returns
    ///
    /// A `Result` containing the store's confirmation body, or
    /// `StatusUpdateFailed` when the store rejected or did not confirm the batch.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, batch: StatusBatch) -> Result<Value, AssignmentError> {
        match self.store.update_work_status(&batch).await {
            Ok(Some(body)) if reports_success(&body) => {
                tracing::info!(
                    assignment_id = batch.assignment_id,
                    updates = batch.updates.len(),
                    "Updated work statuses"
                );
                Ok(body)
            }
            Ok(body) => {
                tracing::warn!(assignment_id = batch.assignment_id, ?body, "Store did not confirm status update");
                Err(AssignmentError::StatusUpdateFailed)
            }
            Err(StoreError::Transport(message)) => Err(AssignmentError::Unavailable(message)),
            Err(err) => {
                tracing::warn!(assignment_id = batch.assignment_id, error = %err, "Status update rejected");
                Err(AssignmentError::StatusUpdateFailed)
            }
        }
    }

    /// Deletes an assignment.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the assignment to delete.
    ///
    /// # Returns
    ///
    /// An empty `Result` if the store answered `204 No Content`, or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: Id) -> Result<(), AssignmentError> {
        self.store.delete_assignment(id).await?;
        tracing::info!(id, "Deleted assignment");
        Ok(())
    }

    /// Fetches an assignment with its work items. A failed work-item fetch
    /// yields an empty list; a failed assignment fetch is an error.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the assignment to fetch.
    ///
    /// # Returns
    ///
    /// A `Result` containing the assignment with its work items, or an error otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: Id) -> Result<AssignmentDetails, AssignmentError> {
        let assignment = self.store.get_assignment(id).await?;
        let works = self
            .store
            .list_assignment_works(id)
            .await
            .unwrap_or_else(|err| {
                tracing::warn!(id, error = %err, "Failed to fetch work items, returning none");
                Vec::new()
            });
        Ok(AssignmentDetails { assignment, works })
    }
}

fn reports_success(body: &Value) -> bool {
    body.get("success")
        .is_some_and(|success| *success != Value::Bool(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockExternalStore;
    use autodoc_core::{StatusChange, WorkSelection};
    use chrono::NaiveDateTime;
    use mockall::predicate::*;
    use serde_json::json;

    fn create_request() -> CreateAssignment {
        CreateAssignment {
            year: 2024,
            month: 5,
            day: 15,
            color_id: Some(1),
            person_id: Some(2),
            works: vec![WorkSelection {
                work_id: Some(10),
                executor_id: None,
                status: None,
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn can_create_at_noon_by_default() {
        let mut store = MockExternalStore::new();
        store
            .expect_create_assignment()
            .withf(|assignment| {
                assignment.date.to_string() == "2024-05-15 12:00:00"
                    && assignment.color_id == 1
                    && assignment.person_id == 2
                    && assignment.works.len() == 1
            })
            .times(1)
            .returning(|_| Ok(Some(json!({"id": 99}))));

        let created = AssignmentService::new(&store)
            .create(create_request())
            .await
            .unwrap();

        assert_eq!(created.date, NaiveDate::from_ymd_opt(2024, 5, 15).unwrap());
        assert_eq!(created.payload, Some(json!({"id": 99})));
    }

    #[tokio::test]
    async fn can_reject_create_without_calling_store() {
        let mut store = MockExternalStore::new();
        store.expect_create_assignment().never();
        let request = CreateAssignment {
            person_id: None,
            ..create_request()
        };

        let result = AssignmentService::new(&store).create(request).await;

        assert!(matches!(
            result,
            Err(AssignmentError::Validation(ValidationError::MissingField(
                "person_id"
            )))
        ));
    }

    #[tokio::test]
    async fn can_relay_upstream_rejection() {
        let mut store = MockExternalStore::new();
        store.expect_create_assignment().returning(|_| {
            Err(StoreError::Rejected {
                status: 422,
                detail: "color not found".to_string(),
            })
        });

        let err = AssignmentService::new(&store)
            .create(create_request())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "API returned status 422: color not found");
    }

    #[tokio::test]
    async fn can_require_id_for_update() {
        let mut store = MockExternalStore::new();
        store.expect_update_assignment().never();

        let result = AssignmentService::new(&store)
            .update(UpdateAssignment::default())
            .await;

        assert!(matches!(
            result,
            Err(AssignmentError::Validation(ValidationError::MissingField("id")))
        ));
    }

    #[tokio::test]
    async fn can_update_with_normalized_works() {
        let mut store = MockExternalStore::new();
        store
            .expect_update_assignment()
            .withf(|update| {
                update.id == 5
                    && update.vin.is_none()
                    && update.works.len() == 1
                    && !update.works[0].status
            })
            .times(1)
            .returning(|_| Ok(None));
        let request = UpdateAssignment {
            id: Some(5),
            works: vec![WorkSelection {
                work_id: Some(10),
                executor_id: Some(3),
                status: None,
            }],
            ..Default::default()
        };

        let payload = AssignmentService::new(&store).update(request).await.unwrap();

        assert_eq!(payload, None);
    }

    #[tokio::test]
    async fn can_send_empty_status_batch() {
        let mut store = MockExternalStore::new();
        store
            .expect_update_work_status()
            .with(eq(StatusBatch::new(4, vec![])))
            .times(1)
            .returning(|_| Ok(Some(json!({"success": true, "updated": 0}))));

        let body = AssignmentService::new(&store)
            .update_status(StatusBatch::new(4, vec![]))
            .await
            .unwrap();

        assert_eq!(body, json!({"success": true, "updated": 0}));
    }

    #[tokio::test]
    async fn can_fail_status_update_without_confirmation() {
        let mut store = MockExternalStore::new();
        store
            .expect_update_work_status()
            .times(1)
            .returning(|_| Ok(Some(json!({"updated": 1}))));
        let batch = StatusBatch::new(
            4,
            vec![StatusChange {
                work_item_id: 1,
                status: true,
            }],
        );

        let result = AssignmentService::new(&store).update_status(batch).await;

        assert!(matches!(result, Err(AssignmentError::StatusUpdateFailed)));
    }

    #[tokio::test]
    async fn can_fail_status_update_on_empty_or_false_body() {
        for response in [None, Some(json!({"success": false}))] {
            let mut store = MockExternalStore::new();
            store
                .expect_update_work_status()
                .returning(move |_| Ok(response.clone()));

            let result = AssignmentService::new(&store)
                .update_status(StatusBatch::new(1, vec![]))
                .await;

            assert!(matches!(result, Err(AssignmentError::StatusUpdateFailed)));
        }
    }

    #[tokio::test]
    async fn can_report_transport_failure_on_status_update() {
        let mut store = MockExternalStore::new();
        store
            .expect_update_work_status()
            .returning(|_| Err(StoreError::Transport("timed out".to_string())));

        let result = AssignmentService::new(&store)
            .update_status(StatusBatch::new(1, vec![]))
            .await;

        assert!(matches!(result, Err(AssignmentError::Unavailable(_))));
    }

    #[tokio::test]
    async fn can_report_missing_assignment_on_delete() {
        let mut store = MockExternalStore::new();
        store.expect_delete_assignment().with(eq(8)).returning(|_| {
            Err(StoreError::Rejected {
                status: 404,
                detail: "Not found.".to_string(),
            })
        });

        let result = AssignmentService::new(&store).delete(8).await;

        assert!(matches!(
            result,
            Err(AssignmentError::Upstream { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn can_get_assignment_with_works() {
        let mut store = MockExternalStore::new();
        store.expect_get_assignment().with(eq(3)).returning(|id| {
            let date = NaiveDateTime::parse_from_str("2024-05-15 09:30", "%Y-%m-%d %H:%M").unwrap();
            Ok(Assignment::new(id, date))
        });
        store
            .expect_list_assignment_works()
            .with(eq(3))
            .returning(|_| Err(StoreError::Decode("not a list".to_string())));

        let details = AssignmentService::new(&store).get(3).await.unwrap();

        assert_eq!(details.assignment.id, 3);
        assert!(details.works.is_empty());
    }
}

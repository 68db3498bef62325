use autodoc_core::{
    Assignment, CreateAssignment, Id, StatusBatch, StatusChange, UpdateAssignment, WorkItem,
    WorkSelection,
};
use axum::{
    Router,
    body::Bytes,
    extract::{Path, State, rejection::PathRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use chrono::{Datelike, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::assignment::{AssignmentDetails, AssignmentError, AssignmentService};
use crate::web::lenient::{optional, optional_timestamp};
use crate::web::{AppState, ErrorResponse};

/// A work picked on the assignment form.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct WorkSelectionJson {
    /// Work type id
    #[serde(default, deserialize_with = "optional")]
    #[schema(value_type = Option<i64>)]
    work_id: Option<Id>,
    /// Person doing the work, empty for unassigned
    #[serde(default, deserialize_with = "optional")]
    #[schema(value_type = Option<i64>)]
    executor_id: Option<Id>,
    /// Completion flag, only read on update
    #[serde(default, deserialize_with = "optional")]
    #[schema(value_type = Option<bool>)]
    status: Option<bool>,
}

impl From<WorkSelectionJson> for WorkSelection {
    fn from(work: WorkSelectionJson) -> Self {
        Self {
            work_id: work.work_id,
            executor_id: work.executor_id,
            status: work.status,
        }
    }
}

/// Body of the create request. The date comes from the path.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateAssignmentJson {
    /// Hour of day, 12 when absent
    #[serde(default, deserialize_with = "optional")]
    #[schema(value_type = Option<u32>)]
    hour: Option<u32>,
    /// Minute, 0 when absent
    #[serde(default, deserialize_with = "optional")]
    #[schema(value_type = Option<u32>)]
    minute: Option<u32>,
    #[serde(default)]
    vin: Option<String>,
    #[serde(default)]
    car_number: Option<String>,
    #[serde(default, deserialize_with = "optional")]
    #[schema(value_type = Option<i64>)]
    car_id: Option<Id>,
    /// Required
    #[serde(default, deserialize_with = "optional")]
    #[schema(value_type = Option<i64>)]
    color_id: Option<Id>,
    /// Required
    #[serde(default, deserialize_with = "optional")]
    #[schema(value_type = Option<i64>)]
    person_id: Option<Id>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    works: Vec<WorkSelectionJson>,
}

impl CreateAssignmentJson {
    fn into_request(self, year: i32, month: u32, day: u32) -> CreateAssignment {
        CreateAssignment {
            year,
            month,
            day,
            hour: self.hour,
            minute: self.minute,
            vin: self.vin,
            car_number: self.car_number,
            car_id: self.car_id,
            color_id: self.color_id,
            person_id: self.person_id,
            description: self.description,
            works: self.works.into_iter().map(WorkSelection::from).collect(),
        }
    }
}

/// Body of the update request. Absent fields are left untouched upstream;
/// `works` replaces the whole list.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateAssignmentJson {
    /// Required
    #[serde(default, deserialize_with = "optional")]
    #[schema(value_type = Option<i64>)]
    id: Option<Id>,
    /// ISO-8601 timestamp
    #[serde(default, deserialize_with = "optional_timestamp")]
    #[schema(value_type = Option<String>, example = "2024-05-15T09:30:00")]
    date: Option<NaiveDateTime>,
    #[serde(default)]
    vin: Option<String>,
    #[serde(default)]
    car_number: Option<String>,
    #[serde(default, deserialize_with = "optional")]
    #[schema(value_type = Option<i64>)]
    color_id: Option<Id>,
    #[serde(default, deserialize_with = "optional")]
    #[schema(value_type = Option<i64>)]
    person_id: Option<Id>,
    #[serde(default, deserialize_with = "optional")]
    #[schema(value_type = Option<i64>)]
    car_id: Option<Id>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    works: Vec<WorkSelectionJson>,
}

impl From<UpdateAssignmentJson> for UpdateAssignment {
    fn from(body: UpdateAssignmentJson) -> Self {
        Self {
            id: body.id,
            date: body.date,
            vin: body.vin,
            car_number: body.car_number,
            color_id: body.color_id,
            person_id: body.person_id,
            car_id: body.car_id,
            description: body.description,
            works: body.works.into_iter().map(WorkSelection::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusChangeJson {
    work_item_id: Id,
    status: bool,
}

/// Body of the status update request.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StatusUpdateJson {
    #[serde(default)]
    updates: Vec<StatusChangeJson>,
}

/// Envelope of every successful mutation.
#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessResponse {
    success: bool,
    /// Page to show after a create
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_url: Option<String>,
    /// Body returned by the external store, when it sent one
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    result: Option<Value>,
}

impl SuccessResponse {
    fn new(result: Option<Value>) -> Self {
        Self {
            success: true,
            redirect_url: None,
            result,
        }
    }

    fn with_redirect(mut self, redirect_url: String) -> Self {
        self.redirect_url = Some(redirect_url);
        self
    }
}

/// An assignment and its work items.
#[derive(Debug, Serialize, ToSchema)]
pub struct AssignmentDetailsJson {
    #[schema(value_type = Object)]
    assignment: Assignment,
    #[schema(value_type = Vec<Object>)]
    works: Vec<WorkItem>,
}

impl From<AssignmentDetails> for AssignmentDetailsJson {
    fn from(details: AssignmentDetails) -> Self {
        Self {
            assignment: details.assignment,
            works: details.works,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request data format")]
    InvalidRequest(#[source] serde_json::Error),
    #[error("Invalid URL parameter")]
    InvalidPath(#[from] PathRejection),
    #[error(transparent)]
    Assignment(#[from] AssignmentError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidRequest(_) | ApiError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            ApiError::Assignment(err) => match err {
                AssignmentError::Validation(_) | AssignmentError::StatusUpdateFailed => {
                    StatusCode::BAD_REQUEST
                }
                AssignmentError::Upstream { status, .. } => StatusCode::from_u16(*status)
                    .ok()
                    .filter(|status| status.is_client_error() || status.is_server_error())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                AssignmentError::Unavailable(_) | AssignmentError::Unexpected(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        };
        let rejected_upstream =
            matches!(self, ApiError::Assignment(AssignmentError::Upstream { .. }));
        if status.is_server_error() || rejected_upstream {
            tracing::error!(error = ?self, "Assignment request failed");
        } else {
            tracing::warn!(error = %self, "Assignment request rejected");
        }
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

/// Parses a JSON body. An empty body reads as the default request so that
/// missing fields surface as validation errors.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(ApiError::InvalidRequest)
}

/// Handler for POST /create-assignment/{year}/{month}/{day}.
#[tracing::instrument(skip(state, body))]
#[utoipa::path(
    post,
    path = "/create-assignment/{year}/{month}/{day}",
    params(
        ("year" = i32, Path, description = "Year of the assignment"),
        ("month" = u32, Path, description = "Month of the assignment, 1-12"),
        ("day" = u32, Path, description = "Day of month")
    ),
    request_body = CreateAssignmentJson,
    responses(
        (status = 200, description = "Assignment created", body = SuccessResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "External store unavailable", body = ErrorResponse)
    ),
    tag = "Assignments"
)]
pub async fn create_assignment_handler(
    State(state): State<AppState>,
    path: Result<Path<(i32, u32, u32)>, PathRejection>,
    body: Bytes,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Path((year, month, day)) = path?;
    let request = parse_body::<CreateAssignmentJson>(&body)?.into_request(year, month, day);
    let created = AssignmentService::new(state.store.as_ref())
        .create(request)
        .await?;
    let date = created.date;
    let redirect_url = format!("/details/{}/{}/{}", date.year(), date.month(), date.day());
    Ok(Json(
        SuccessResponse::new(created.payload).with_redirect(redirect_url),
    ))
}

/// Handler for GET /get-assignment/{id}.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/get-assignment/{id}",
    params(("id" = i64, Path, description = "Assignment id")),
    responses(
        (status = 200, description = "Assignment with its work items", body = AssignmentDetailsJson),
        (status = 404, description = "Unknown assignment", body = ErrorResponse),
        (status = 500, description = "External store unavailable", body = ErrorResponse)
    ),
    tag = "Assignments"
)]
pub async fn get_assignment_handler(
    State(state): State<AppState>,
    path: Result<Path<Id>, PathRejection>,
) -> Result<Json<AssignmentDetailsJson>, ApiError> {
    let Path(id) = path?;
    let details = AssignmentService::new(state.store.as_ref()).get(id).await?;
    Ok(Json(details.into()))
}

/// Handler for POST /update-assignment.
#[tracing::instrument(skip(state, body))]
#[utoipa::path(
    post,
    path = "/update-assignment",
    request_body = UpdateAssignmentJson,
    responses(
        (status = 200, description = "Assignment updated", body = SuccessResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "External store unavailable", body = ErrorResponse)
    ),
    tag = "Assignments"
)]
pub async fn update_assignment_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SuccessResponse>, ApiError> {
    let request: UpdateAssignment = parse_body::<UpdateAssignmentJson>(&body)?.into();
    let payload = AssignmentService::new(state.store.as_ref())
        .update(request)
        .await?;
    Ok(Json(SuccessResponse::new(payload)))
}

/// Handler for POST /update-work-status/{assignment_id}.
#[tracing::instrument(skip(state, body))]
#[utoipa::path(
    post,
    path = "/update-work-status/{assignment_id}",
    params(("assignment_id" = i64, Path, description = "Assignment the work items belong to")),
    request_body = StatusUpdateJson,
    responses(
        (status = 200, description = "Statuses updated", body = SuccessResponse),
        (status = 400, description = "Store did not confirm the update", body = ErrorResponse),
        (status = 500, description = "External store unavailable", body = ErrorResponse)
    ),
    tag = "Assignments"
)]
pub async fn update_work_status_handler(
    State(state): State<AppState>,
    path: Result<Path<Id>, PathRejection>,
    body: Bytes,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Path(assignment_id) = path?;
    let updates = parse_body::<StatusUpdateJson>(&body)?
        .updates
        .into_iter()
        .map(|change| StatusChange {
            work_item_id: change.work_item_id,
            status: change.status,
        })
        .collect();
    let result = AssignmentService::new(state.store.as_ref())
        .update_status(StatusBatch::new(assignment_id, updates))
        .await?;
    Ok(Json(SuccessResponse::new(Some(result))))
}

/// Handler for POST or DELETE /delete-assignment/{assignment_id}.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    method(post, delete),
    path = "/delete-assignment/{assignment_id}",
    params(("assignment_id" = i64, Path, description = "Assignment to delete")),
    responses(
        (status = 200, description = "Assignment deleted", body = SuccessResponse),
        (status = 404, description = "Unknown assignment", body = ErrorResponse),
        (status = 500, description = "External store unavailable", body = ErrorResponse)
    ),
    tag = "Assignments"
)]
pub async fn delete_assignment_handler(
    State(state): State<AppState>,
    path: Result<Path<Id>, PathRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Path(assignment_id) = path?;
    AssignmentService::new(state.store.as_ref())
        .delete(assignment_id)
        .await?;
    Ok(Json(SuccessResponse::new(None)))
}

/// Fallback for disallowed methods on the assignment routes.
#[tracing::instrument]
async fn method_not_allowed_handler() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorResponse::new("Method not allowed")),
    )
}

pub fn create_assignment_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/create-assignment/{year}/{month}/{day}",
            post(create_assignment_handler).fallback(method_not_allowed_handler),
        )
        .route(
            "/get-assignment/{id}",
            get(get_assignment_handler).fallback(method_not_allowed_handler),
        )
        .route(
            "/update-assignment",
            post(update_assignment_handler).fallback(method_not_allowed_handler),
        )
        .route(
            "/update-work-status/{assignment_id}",
            post(update_work_status_handler).fallback(method_not_allowed_handler),
        )
        .route(
            "/delete-assignment/{assignment_id}",
            post(delete_assignment_handler)
                .delete(delete_assignment_handler)
                .fallback(method_not_allowed_handler),
        )
        .with_state(state)
}

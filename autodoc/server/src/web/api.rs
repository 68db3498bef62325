use axum::{Json, Router, routing::get};
use utoipa::OpenApi;

use crate::assignment::api::{
    self, AssignmentDetailsJson, CreateAssignmentJson, StatusChangeJson, StatusUpdateJson,
    SuccessResponse, UpdateAssignmentJson, WorkSelectionJson,
};
use crate::web::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::create_assignment_handler,
        api::get_assignment_handler,
        api::update_assignment_handler,
        api::update_work_status_handler,
        api::delete_assignment_handler,
    ),
    components(
        schemas(
            AssignmentDetailsJson,
            CreateAssignmentJson,
            ErrorResponse,
            StatusChangeJson,
            StatusUpdateJson,
            SuccessResponse,
            UpdateAssignmentJson,
            WorkSelectionJson,
        ),
    ),
    tags(
        (name = "Assignments", description = "Work order scheduling")
    )
)]
pub struct ApiDoc;

#[tracing::instrument]
async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Serves the OpenAPI document of the JSON endpoints.
pub fn create_api_docs_router() -> Router {
    Router::new().route("/api-docs/openapi.json", get(openapi_handler))
}

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::gateway::LookupGateway;
use super::identifier::{is_submittable, mask_input};
use super::service::LookupService;
use super::state::{RejectionReason, WorkflowState};
use super::view::LookupView;
use super::workflow::WorkflowError;

#[derive(Debug, Clone, Deserialize)]
pub struct LookupRequest {
    pub cpf: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaskResponse {
    pub masked: String,
    pub submittable: bool,
}

/// Router exposing the lookup surface. Every request runs in its own workflow session.
pub fn lookup_router<G>(service: LookupService<G>) -> Router
where
    G: LookupGateway,
{
    Router::new()
        .route("/api/v1/lookup", post(lookup_handler::<G>))
        .route("/api/v1/lookup/mask", post(mask_handler))
        .with_state(service)
}

pub(crate) async fn lookup_handler<G>(
    State(service): State<LookupService<G>>,
    Json(request): Json<LookupRequest>,
) -> Response
where
    G: LookupGateway,
{
    let session = service.session();
    match session.lookup(request.cpf).await {
        Ok(state) => {
            let status = match &state {
                WorkflowState::Resolved(_) => StatusCode::OK,
                WorkflowState::Rejected(RejectionReason::Invalid(_)) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                WorkflowState::Rejected(RejectionReason::TransientFailure) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(LookupView::from_state(&state))).into_response()
        }
        Err(err) => {
            let status = match err {
                WorkflowError::Busy => StatusCode::CONFLICT,
                WorkflowError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
                WorkflowError::Closed => StatusCode::INTERNAL_SERVER_ERROR,
            };
            let payload = json!({
                "error": err.to_string(),
            });
            (status, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn mask_handler(Json(request): Json<LookupRequest>) -> Json<MaskResponse> {
    Json(MaskResponse {
        masked: mask_input(&request.cpf),
        submittable: is_submittable(&request.cpf),
    })
}

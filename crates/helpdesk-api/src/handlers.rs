//! API Handlers
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use helpdesk_core::{HelpdeskError, TicketFields, HELPDESK_VERSION};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::AppState;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<String>,
    cause: String,
}

fn error_response(err: &HelpdeskError) -> (StatusCode, Json<Value>) {
    let (status, body) = match err {
        HelpdeskError::InvalidTicket { field, reason } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorBody {
                error: "invalid_ticket",
                field: Some(field),
                stage: None,
                cause: reason.clone(),
            },
        ),
        HelpdeskError::StageFailure { stage, cause } => (
            StatusCode::BAD_GATEWAY,
            ErrorBody {
                error: "stage_failure",
                field: None,
                stage: Some(stage.clone()),
                cause: cause.to_string(),
            },
        ),
        HelpdeskError::Cancelled { stage } => (
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorBody {
                error: "cancelled",
                field: None,
                stage: Some(stage.clone()),
                cause: err.to_string(),
            },
        ),
    };
    (status, Json(json!(body)))
}

/// A body that does not decode into ticket fields is an invalid ticket too.
fn rejection_response(rejection: &JsonRejection) -> (StatusCode, Json<Value>) {
    let body = ErrorBody {
        error: "invalid_ticket",
        field: Some("body"),
        stage: None,
        cause: rejection.body_text(),
    };
    (StatusCode::UNPROCESSABLE_ENTITY, Json(json!(body)))
}

pub async fn submit_ticket(
    State(state): State<AppState>,
    payload: Result<Json<TicketFields>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let fields = match payload {
        Ok(Json(fields)) => fields,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "ticket body rejected");
            return rejection_response(&rejection);
        }
    };
    match state.desk.submit_ticket(fields).await {
        Ok(summary) => {
            state.metrics.record_summary(&summary);
            (StatusCode::OK, Json(json!(summary)))
        }
        Err(err) => {
            warn!(error = %err, "ticket not resolved");
            state.metrics.record_failure(&err);
            error_response(&err)
        }
    }
}

pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "version": HELPDESK_VERSION })),
    )
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.encode() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

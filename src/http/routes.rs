// Database HTTP routes
// Every endpoint issues a fresh action token and executes through the gate

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GateError;
use crate::gate::QueryGate;
use crate::query::{QueryRunner, ResultSet};

// ==================
// Shared State
// ==================

/// State shared across handlers
pub struct DatabaseState<R> {
    pub gate: Arc<QueryGate<R>>,
    /// Tables described by `GET /db/format`
    pub format_tables: Vec<String>,
}

impl<R> DatabaseState<R> {
    pub fn new(gate: Arc<QueryGate<R>>, format_tables: Vec<String>) -> Self {
        Self {
            gate,
            format_tables,
        }
    }
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    /// Use the single-row path: the response is one object, not an array
    #[serde(default)]
    pub single: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

impl From<&GateError> for ErrorResponse {
    fn from(err: &GateError) -> Self {
        Self {
            error: err.to_string(),
            code: status_for(err).as_u16(),
        }
    }
}

/// Status code for each gate failure
pub fn status_for(err: &GateError) -> StatusCode {
    match err {
        GateError::Authorization => StatusCode::CONFLICT,
        GateError::UnsupportedQuery | GateError::Store(_) => StatusCode::BAD_REQUEST,
        GateError::Serialization { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        GateError::StoreOpen { .. } => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn gate_error(err: GateError) -> ApiError {
    (status_for(&err), Json(ErrorResponse::from(&err)))
}

fn internal_error(message: String) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: message,
            code: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        }),
    )
}

// ==================
// Router
// ==================

/// Create the database routes
pub fn database_routes<R: QueryRunner + 'static>(state: Arc<DatabaseState<R>>) -> Router {
    Router::new()
        .route("/", get(hello_handler))
        .route("/db/execute", post(execute_query_handler::<R>))
        .route("/db/format", get(format_handler::<R>))
        .with_state(state)
}

// ==================
// Handlers
// ==================

async fn hello_handler() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Hello, World!".to_string(),
    })
}

async fn execute_query_handler<R: QueryRunner + 'static>(
    State(state): State<Arc<DatabaseState<R>>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<ResultSet>, ApiError> {
    let gate = Arc::clone(&state.gate);

    // rusqlite blocks, keep it off the async workers
    let outcome = tokio::task::spawn_blocking(move || {
        let token = gate.issue_token();
        if request.single {
            gate.execute_single(&request.query, token)
        } else {
            gate.execute(&request.query, token)
        }
    })
    .await
    .map_err(|e| internal_error(format!("query task failed: {e}")))?;

    match outcome {
        Ok(result) => Ok(Json(result)),
        Err(err) => {
            tracing::info!(error = %err, "Query rejected");
            Err(gate_error(err))
        }
    }
}

async fn format_handler<R: QueryRunner + 'static>(
    State(state): State<Arc<DatabaseState<R>>>,
) -> Result<Json<Value>, ApiError> {
    let gate = Arc::clone(&state.gate);
    let tables = state.format_tables.clone();

    let outcome = tokio::task::spawn_blocking(move || {
        tables
            .iter()
            .map(|table| {
                let token = gate.issue_token();
                gate.execute(&format!("PRAGMA table_info({table})"), token)
                    .map(ResultSet::into_json)
            })
            .collect::<Result<Vec<Value>, GateError>>()
    })
    .await
    .map_err(|e| internal_error(format!("format task failed: {e}")))?;

    outcome.map(|all| Json(Value::Array(all))).map_err(gate_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&GateError::Authorization), StatusCode::CONFLICT);
        assert_eq!(status_for(&GateError::UnsupportedQuery), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&GateError::Serialization {
                detail: "x".to_string()
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_body_carries_message_and_code() {
        let body = ErrorResponse::from(&GateError::UnsupportedQuery);
        assert_eq!(body.error, "only SELECT and PRAGMA queries are supported");
        assert_eq!(body.code, 400);
    }

    #[test]
    fn test_query_request_defaults_to_all_rows() {
        let request: QueryRequest =
            serde_json::from_str(r#"{"query": "SELECT * FROM Meaning"}"#).unwrap();
        assert_eq!(request.query, "SELECT * FROM Meaning");
        assert!(!request.single);
    }
}

//! HTTP request handlers

use axum::{extract::State, http::StatusCode, response::Redirect, Json};

use super::{ApiResponse, AppState, HealthResponse, PredictPayload, PredictResponse};

/// Generate a request ID
fn request_id() -> String {
    format!("req-{:016x}", rand::random::<u64>())
}

/// Health check handler
pub async fn index(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let health = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime_secs(),
        run_id: state.run.run_id.clone(),
    };

    (StatusCode::OK, Json(health))
}

/// Redirect to the experiment dashboard
pub async fn experiments(State(state): State<AppState>) -> Redirect {
    Redirect::temporary(&state.config.dashboard_url)
}

/// Classify a batch of texts with the loaded run
pub async fn predict(
    State(state): State<AppState>,
    Json(payload): Json<PredictPayload>,
) -> (StatusCode, Json<ApiResponse<PredictResponse>>) {
    let req_id = request_id();

    if payload.inputs.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("inputs must not be empty", &req_id)),
        );
    }

    if !state.serves(&payload.experiment_id) {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(
                &format!("run not found: {}", payload.experiment_id),
                &req_id,
            )),
        );
    }

    let texts = payload
        .inputs
        .into_iter()
        .map(|input| input.text)
        .collect();

    let predictions = state
        .components
        .predict(texts, payload.include_activations);

    log::info!(
        "{}: {} predictions from run {}",
        req_id,
        predictions.len(),
        state.run.run_id,
    );

    let response = PredictResponse {
        run_id: state.run.run_id.clone(),
        predictions,
    };

    (
        StatusCode::OK,
        Json(ApiResponse::success(response, &req_id)),
    )
}

//! Prediction server
//!
//! Serves the best recorded run over HTTP: a health check, a redirect to the
//! experiment dashboard, and a prediction endpoint.

/// Request handlers
pub mod handlers;

/// Shared server state and loaded model components
pub mod state;

pub use state::{AppState, Components};

use std::{collections::BTreeMap, net::SocketAddr};

use axum::{
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::tracking::{Objective, RunStore};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server address
    pub address: SocketAddr,

    /// The top-level data directory holding the run store
    pub data_dir: String,

    /// The metric used to select the run to serve
    pub metric: String,

    /// The direction in which the metric is compared
    pub objective: Objective,

    /// Where the /experiments endpoint redirects to
    pub dashboard_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:5000".parse().expect("valid address"),
            data_dir: "data".to_string(),
            metric: "test_loss".to_string(),
            objective: Objective::Minimize,
            dashboard_url: "https://wandb.ai/home".to_string(),
        }
    }
}

impl ServerConfig {
    /// Create config with custom address
    pub fn with_address(mut self, address: SocketAddr) -> Self {
        self.address = address;
        self
    }

    /// Create config with a custom data directory
    pub fn with_data_dir(mut self, data_dir: &str) -> Self {
        self.data_dir = data_dir.to_string();
        self
    }

    /// Create config with a custom run-selection metric
    pub fn with_metric(mut self, metric: &str, objective: Objective) -> Self {
        self.metric = metric.to_string();
        self.objective = objective;
        self
    }
}

/// API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,

    /// Response data (if successful)
    pub data: Option<T>,

    /// Error message (if failed)
    pub error: Option<String>,

    /// Request ID for tracing
    pub request_id: String,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T, request_id: &str) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            request_id: request_id.to_string(),
        }
    }

    /// Create error response
    pub fn error(message: &str, request_id: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.to_string()),
            request_id: request_id.to_string(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Server status
    pub status: String,

    /// Server version
    pub version: String,

    /// Uptime in seconds
    pub uptime_secs: u64,

    /// The run whose artifacts are loaded
    pub run_id: String,
}

/// A single text to classify
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictInput {
    /// The raw input text
    pub text: String,
}

/// Prediction request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictPayload {
    /// The run to predict with; "latest" resolves to the loaded run
    #[serde(default = "default_experiment_id")]
    pub experiment_id: String,

    /// The texts to classify
    pub inputs: Vec<PredictInput>,

    /// Include tokens and convolutional activation maps in the response
    #[serde(default)]
    pub include_activations: bool,
}

fn default_experiment_id() -> String {
    "latest".to_string()
}

/// The activation map of one convolution width for one input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationMap {
    /// The kernel width of the convolution, in tokens
    pub filter_width: usize,

    /// Per-filter activations, trimmed to the input's token count
    pub filters: Vec<Vec<f32>>,
}

/// A structured prediction for a single input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// The raw input text
    pub text: String,

    /// The winning class label
    pub label: String,

    /// The probability distribution over class labels
    pub probabilities: BTreeMap<String, f32>,

    /// The token strings seen by the model, when activations are requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<String>>,

    /// One activation map per convolution width, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activations: Option<Vec<ActivationMap>>,
}

/// Prediction response data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    /// The run that produced the predictions
    pub run_id: String,

    /// One prediction per input, in order
    pub predictions: Vec<Prediction>,
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/experiments", get(handlers::experiments))
        .route("/predict", post(handlers::predict))
        .with_state(state)
}

/// Select the best recorded run, load its artifacts, and serve the API
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let store = RunStore::new(format!("{}/runs", config.data_dir));
    let run = store.best(&config.metric, config.objective)?;

    log::info!(
        "serving run {} ({} = {:.4})",
        run.run_id,
        config.metric,
        run.metrics.get(&config.metric).copied().unwrap_or(f64::NAN),
    );

    let components = Components::load(&store.run_dir(&run.run_id))?;
    let state = AppState::new(run, components, config.clone());

    let listener = tokio::net::TcpListener::bind(config.address).await?;
    log::info!("listening on {}", config.address);

    axum::serve(listener, router(state)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn server_config_defaults() {
        let config = ServerConfig::default();

        assert_eq!(config.address.port(), 5000);
        assert_eq!(config.metric, "test_loss");
        assert_eq!(config.objective, Objective::Minimize);
    }

    #[test]
    fn server_config_with_address_and_data_dir() {
        let address: SocketAddr = "0.0.0.0:8080".parse().unwrap();
        let config = ServerConfig::default()
            .with_address(address)
            .with_data_dir("artifacts");

        assert_eq!(config.address.port(), 8080);
        assert_eq!(config.data_dir, "artifacts");
    }

    #[test]
    fn server_config_with_metric() {
        let config = ServerConfig::default().with_metric("test_accuracy", Objective::Maximize);

        assert_eq!(config.metric, "test_accuracy");
        assert_eq!(config.objective, Objective::Maximize);
    }

    #[test]
    fn predict_payload_defaults() {
        let json = r#"{"inputs": [{"text": "attention is all you need"}]}"#;
        let payload: PredictPayload = serde_json::from_str(json).unwrap();

        assert_eq!(payload.experiment_id, "latest");
        assert_eq!(payload.inputs.len(), 1);
        assert!(!payload.include_activations);
    }

    #[test]
    fn predict_payload_with_experiment_id() {
        let json = r#"{
            "experiment_id": "abc123",
            "inputs": [{"text": "a"}, {"text": "b"}],
            "include_activations": true
        }"#;
        let payload: PredictPayload = serde_json::from_str(json).unwrap();

        assert_eq!(payload.experiment_id, "abc123");
        assert_eq!(payload.inputs.len(), 2);
        assert!(payload.include_activations);
    }

    #[test]
    fn api_response_success() {
        let response = ApiResponse::success("hello", "req-123");

        assert!(response.success);
        assert_eq!(response.data, Some("hello"));
        assert!(response.error.is_none());
    }

    #[test]
    fn api_response_error() {
        let response: ApiResponse<String> = ApiResponse::error("not found", "req-456");

        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.error, Some("not found".to_string()));
    }

    #[test]
    fn prediction_omits_empty_activations() {
        let prediction = Prediction {
            text: "a".to_string(),
            label: "nlp".to_string(),
            probabilities: BTreeMap::from([("nlp".to_string(), 1.0)]),
            tokens: None,
            activations: None,
        };

        let json = serde_json::to_string(&prediction).unwrap();

        assert!(!json.contains("activations"));
        assert!(!json.contains("tokens"));
    }
}

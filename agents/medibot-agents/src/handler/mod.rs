//! HTTP handler for MediBot agents
//!
//! Every route goes through the message bus, so HTTP callers and agents see
//! the same dispatch path.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use medibot_core::{
    message_types, AgentReply, BusError, Message, MessageBus, MessageRecord, VitalsReading,
};

use crate::agents::{AgentSet, DoctorAssistantAgent, HealthAgent, IngestAgent};
use crate::config::ServiceConfig;
use crate::telemetry::{MetricsRegistry, TelemetryError};

/// Sender id used for messages that originate from HTTP requests
pub const HTTP_SENDER: &str = "http_api";

/// Failures while wiring the application
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Agent registration failed: {0}")]
    Bus(#[from] BusError),

    #[error("Telemetry setup failed: {0}")]
    Telemetry(#[from] TelemetryError),
}

/// Application state
pub struct AppState {
    pub bus: Arc<MessageBus>,
    pub ingest: Arc<IngestAgent>,
    pub metrics: MetricsRegistry,
    pub config: ServiceConfig,
}

impl AppState {
    /// Build the agents, register them on a fresh bus and wire metrics
    pub fn from_config(config: ServiceConfig) -> Result<Self, StartupError> {
        let metrics = MetricsRegistry::new()?;
        let agents = AgentSet::from_config(&config, metrics.metrics());

        let bus = Arc::new(MessageBus::new());
        agents.register(&bus)?;

        tracing::info!(agents = ?bus.agent_ids(), "Agents registered");

        Ok(Self {
            bus,
            ingest: agents.ingest,
            metrics,
            config,
        })
    }

    /// Dispatch through the bus, recording count and duration
    pub async fn dispatch(&self, message: Message) -> Result<AgentReply, BusError> {
        let receiver = message.receiver().to_string();
        let message_type = message.message_type().to_string();
        let metrics = self.metrics.metrics();

        let result = {
            let _timer = metrics.start_dispatch(&receiver);
            self.bus.send_and_wait(message).await
        };

        let outcome = match &result {
            Ok(reply) if reply.is_error() => "error_reply",
            Ok(_) => "ok",
            Err(e) if e.is_not_found() => "not_found",
            Err(_) => "error",
        };
        metrics.record_dispatch(&receiver, &message_type, outcome);

        result
    }
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/api/health/analyze", post(analyze_health))
        .route("/api/doctor-assistant/analyze", post(analyze_doctor))
        .route("/ingest", post(ingest_vitals))
        .route("/ingest/latest", get(latest_vitals))
        .route("/ingest/history", get(vitals_history))
        .route("/ingest/poll", post(poll_sources))
        .route("/api/v1/messages", post(dispatch_message))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

/// Liveness with registered agent ids
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        agents: state.bus.agent_ids(),
    })
}

/// Prometheus text exposition
async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode_text() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                e.to_string(),
            )
        }
    }
}

/// Early-warning triage; the dashboard summary also lands in the ingest cache
async fn analyze_health(
    State(state): State<Arc<AppState>>,
    Json(vitals): Json<Value>,
) -> ApiResult<AnalysisResponse> {
    let message = Message::new(
        HTTP_SENDER,
        HealthAgent::ID,
        message_types::VITALS_UPDATE,
        vitals.clone(),
    );
    let analysis = expect_reply(state.dispatch(message).await)?;

    if let Ok(reading) = VitalsReading::from_json(&vitals) {
        let batch = serde_json::to_value(reading.dashboard_batch()).unwrap_or(Value::Null);
        let store = Message::new(HTTP_SENDER, IngestAgent::ID, message_types::VITALS_INGEST, batch);
        match state.dispatch(store).await {
            Ok(reply) if !reply.is_error() => {}
            Ok(reply) => tracing::warn!(reply = ?reply, "Ingest cache rejected dashboard batch"),
            Err(e) => tracing::warn!(error = %e, "Failed to cache dashboard batch"),
        }
    }

    Ok(Json(AnalysisResponse { analysis }))
}

/// Clinical assessment (AI with graded fallback)
async fn analyze_doctor(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<AnalysisResponse> {
    let message = Message::new(
        HTTP_SENDER,
        DoctorAssistantAgent::ID,
        message_types::ANALYZE_VITALS,
        request.vitals,
    );
    let analysis = expect_reply(state.dispatch(message).await)?;
    Ok(Json(AnalysisResponse { analysis }))
}

async fn ingest_vitals(
    State(state): State<Arc<AppState>>,
    Json(batch): Json<Value>,
) -> ApiResult<AgentReply> {
    let message = Message::new(HTTP_SENDER, IngestAgent::ID, message_types::VITALS_INGEST, batch);
    expect_reply(state.dispatch(message).await).map(Json)
}

async fn latest_vitals(State(state): State<Arc<AppState>>) -> ApiResult<LatestResponse> {
    let message = Message::new(HTTP_SENDER, IngestAgent::ID, message_types::GET_LATEST, Value::Null);
    let latest = expect_reply(state.dispatch(message).await)?;
    Ok(Json(LatestResponse { latest }))
}

async fn vitals_history(State(state): State<Arc<AppState>>) -> ApiResult<HistoryResponse> {
    let message = Message::new(HTTP_SENDER, IngestAgent::ID, message_types::GET_HISTORY, Value::Null);
    let history = expect_reply(state.dispatch(message).await)?;
    Ok(Json(HistoryResponse { history }))
}

async fn poll_sources(State(state): State<Arc<AppState>>) -> ApiResult<LatestResponse> {
    let message = Message::new(HTTP_SENDER, IngestAgent::ID, message_types::POLL_SOURCES, Value::Null);
    let latest = expect_reply(state.dispatch(message).await)?;
    Ok(Json(LatestResponse { latest }))
}

/// Generic envelope dispatch
async fn dispatch_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EnvelopeRequest>,
) -> ApiResult<EnvelopeResponse> {
    let mut message = Message::new(
        request.sender.unwrap_or_else(|| HTTP_SENDER.to_string()),
        request.receiver,
        request.message_type,
        request.payload,
    );
    if let Some(priority) = request.priority {
        message = message.with_priority(priority);
    }
    if let Some(conversation_id) = request.conversation_id {
        message = message.with_conversation_id(conversation_id);
    }

    let record = message.to_record();
    let reply = expect_reply(state.dispatch(message).await)?;

    Ok(Json(EnvelopeResponse {
        message: record,
        reply,
    }))
}

/// Map bus failures and agent error replies onto HTTP statuses
fn expect_reply(
    result: Result<AgentReply, BusError>,
) -> Result<AgentReply, (StatusCode, Json<ApiError>)> {
    match result {
        Ok(AgentReply::Error(reply)) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiError {
                error: reply.error.clone(),
                message: reply
                    .detail
                    .clone()
                    .or_else(|| reply.message_type.clone())
                    .unwrap_or_default(),
            }),
        )),
        Ok(reply) => Ok(reply),
        Err(e) => {
            let status = if e.is_not_found() {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            Err((
                status,
                Json(ApiError {
                    error: match e {
                        BusError::RecipientNotFound(_) => "RecipientNotFound",
                        BusError::AgentAlreadyRegistered(_) => "AgentAlreadyRegistered",
                        BusError::DirectoryUnavailable(_) => "DirectoryUnavailable",
                    }
                    .to_string(),
                    message: e.to_string(),
                }),
            ))
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub agents: Vec<String>,
}

/// Doctor-assistant request body
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default = "empty_vitals")]
    pub vitals: Value,
}

fn empty_vitals() -> Value {
    Value::Object(Default::default())
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub analysis: AgentReply,
}

#[derive(Debug, Serialize)]
pub struct LatestResponse {
    pub latest: AgentReply,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: AgentReply,
}

/// Generic dispatch request
#[derive(Debug, Deserialize)]
pub struct EnvelopeRequest {
    #[serde(default)]
    pub sender: Option<String>,
    pub receiver: String,
    pub message_type: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
}

/// Generic dispatch response: the envelope as sent plus the agent's reply
#[derive(Debug, Serialize)]
pub struct EnvelopeResponse {
    pub message: MessageRecord,
    pub reply: AgentReply,
}

/// API error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
}

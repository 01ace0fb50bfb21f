//! Axum routes for the temporal kernel service.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::analysis::{
    EventPath, GapReport, GapSimulation, GlobalInfluence, InfluenceNetwork, InfluenceReport,
    InfluenceSimulation, OverlapPair,
};
use crate::analyzer::CacheStats;
use crate::error::AnalysisError;
use crate::ingest::{run_ingestion, IngestRecord, IngestionJob, JobId, JobStatus};
use crate::policy::AnalysisPolicy;
use crate::store::EventWriter;
use crate::types::{Event, EventId, Gap, TimeWindow};
use crate::TEMPORAL_KERNEL_SCHEMA_VERSION;

use super::middleware::{record_analysis_metric, record_ingestion_metric};
use super::state::{PolicyRef, ServiceState};

type SharedState<S> = State<Arc<ServiceState<S>>>;

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request for overlaps inside a window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlapRequest {
    /// Window start (RFC 3339).
    pub window_start: DateTime<Utc>,
    /// Window end (RFC 3339).
    pub window_end: DateTime<Utc>,
}

/// Overlap response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlapResponse {
    /// Overlapping pairs.
    pub overlaps: Vec<OverlapPair>,
    /// Number of pairs.
    pub count: usize,
}

/// Request for gaps; omit both window bounds for global mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GapRequest {
    /// Window start (RFC 3339).
    #[serde(default)]
    pub window_start: Option<DateTime<Utc>>,
    /// Window end (RFC 3339).
    #[serde(default)]
    pub window_end: Option<DateTime<Utc>>,
    /// Drop gaps shorter than this.
    #[serde(default)]
    pub min_gap_minutes: i64,
}

/// Largest-gap response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LargestGapResponse {
    /// The longest gap, if any.
    pub gap: Option<Gap>,
}

/// Request to simulate moving an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapSimulationRequest {
    /// Event to move.
    pub event_id: String,
    /// Hypothetical start (RFC 3339).
    pub new_start: DateTime<Utc>,
    /// Hypothetical end (RFC 3339).
    pub new_end: DateTime<Utc>,
}

/// Request for a shortest path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathRequest {
    /// Source event.
    pub source_id: String,
    /// Target event.
    pub target_id: String,
}

/// Path response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathResponse {
    /// Whether a path exists.
    pub found: bool,
    /// The path, when found.
    pub path: Option<EventPath>,
}

/// Request for one event's influence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfluenceRequest {
    /// Source event.
    pub event_id: String,
    /// Depth bound; defaults to the policy's global depth.
    #[serde(default)]
    pub max_depth: Option<u32>,
}

/// Request to simulate re-parenting an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfluenceSimulationRequest {
    /// Event to re-parent.
    pub event_id: String,
    /// New parent; omit or null to detach.
    #[serde(default)]
    pub new_parent_id: Option<String>,
    /// Depth bound; defaults to the policy's global depth.
    #[serde(default)]
    pub max_depth: Option<u32>,
}

/// Bulk ingestion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    /// Records to validate and store.
    pub records: Vec<IngestRecord>,
}

/// Bulk ingestion acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Job to poll.
    pub job_id: JobId,
    /// Records submitted.
    pub submitted: usize,
}

/// Active policy.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyResponse {
    /// Hash-stable reference.
    pub policy_ref: PolicyRef,
    /// Full parameters.
    pub policy: AnalysisPolicy,
    /// Precedence cache statistics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheStats>,
}

/// Service health response (detailed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded".
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Response schema version.
    pub schema_version: String,
    /// Active analysis policy.
    pub policy_id: String,
    /// Hash of the active policy parameters.
    pub params_hash: String,
    /// Whether the event store answered its health check.
    pub store_healthy: bool,
    /// Ingestion jobs currently retained.
    pub tracked_jobs: usize,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    /// Always "alive" while the process serves requests.
    pub status: String,
}

/// Readiness response with dependency status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Whether the service can take traffic.
    pub ready: bool,
    /// Event store status.
    pub store: bool,
    /// Reason when not ready.
    pub details: Option<String>,
}

/// Structured error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
    /// Additional error details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response with code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// HTTP status for an analysis failure.
pub fn status_for(error: &AnalysisError) -> StatusCode {
    match error {
        AnalysisError::NotFound(_) => StatusCode::NOT_FOUND,
        AnalysisError::InvalidInterval { .. }
        | AnalysisError::InvalidRange { .. }
        | AnalysisError::DuplicateEvent(_) => StatusCode::BAD_REQUEST,
        AnalysisError::DeadlineExceeded => StatusCode::SERVICE_UNAVAILABLE,
        AnalysisError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<AnalysisError> for ErrorResponse {
    fn from(error: AnalysisError) -> Self {
        Self::new(error.code(), error.to_string())
    }
}

fn reject(status: StatusCode, body: ErrorResponse) -> ApiError {
    tracing::warn!(
        status = status.as_u16(),
        code = %body.code,
        error = %body.error,
        "Request error"
    );
    (status, Json(body))
}

fn analysis_error(error: AnalysisError) -> ApiError {
    reject(status_for(&error), error.into())
}

fn parse_event_id(raw: &str) -> Result<EventId, ApiError> {
    EventId::from_str(raw).map_err(|e| {
        reject(
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("INVALID_EVENT_ID", format!("Invalid event ID: {}", e))
                .with_details(raw.to_string()),
        )
    })
}

fn window_from(request: &GapRequest) -> Result<Option<TimeWindow>, ApiError> {
    match (request.window_start, request.window_end) {
        (None, None) => Ok(None),
        (Some(start), Some(end)) => TimeWindow::new(start, end).map(Some).map_err(analysis_error),
        _ => Err(reject(
            StatusCode::BAD_REQUEST,
            ErrorResponse::new(
                "INVALID_WINDOW",
                "window_start and window_end must be given together",
            ),
        )),
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn overlaps_handler<S: EventWriter + 'static>(
    State(state): SharedState<S>,
    Json(request): Json<OverlapRequest>,
) -> Result<Json<OverlapResponse>, ApiError> {
    let start = Instant::now();
    let overlaps = state
        .analyzer
        .find_overlaps(request.window_start, request.window_end)
        .await
        .map_err(analysis_error)?;
    record_analysis_metric("overlaps", overlaps.len(), elapsed_ms(start));

    Ok(Json(OverlapResponse {
        count: overlaps.len(),
        overlaps,
    }))
}

/// Gaps with statistics and recommendations.
async fn gaps_handler<S: EventWriter + 'static>(
    State(state): SharedState<S>,
    Json(request): Json<GapRequest>,
) -> Result<Json<GapReport>, ApiError> {
    let start = Instant::now();
    let window = window_from(&request)?;
    let report = state
        .analyzer
        .gap_report(window, request.min_gap_minutes)
        .await
        .map_err(analysis_error)?;
    record_analysis_metric("gaps", report.gaps.len(), elapsed_ms(start));

    Ok(Json(report))
}

async fn largest_gap_handler<S: EventWriter + 'static>(
    State(state): SharedState<S>,
    Json(request): Json<GapRequest>,
) -> Result<Json<LargestGapResponse>, ApiError> {
    let window = window_from(&request)?;
    let gap = state
        .analyzer
        .largest_gap(window, request.min_gap_minutes)
        .await
        .map_err(analysis_error)?;
    Ok(Json(LargestGapResponse { gap }))
}

async fn simulate_gap_handler<S: EventWriter + 'static>(
    State(state): SharedState<S>,
    Json(request): Json<GapSimulationRequest>,
) -> Result<Json<GapSimulation>, ApiError> {
    let event_id = parse_event_id(&request.event_id)?;
    let simulation = state
        .analyzer
        .simulate_gap(&event_id, request.new_start, request.new_end)
        .await
        .map_err(analysis_error)?;
    Ok(Json(simulation))
}

async fn precedence_path_handler<S: EventWriter + 'static>(
    State(state): SharedState<S>,
    Json(request): Json<PathRequest>,
) -> Result<Json<PathResponse>, ApiError> {
    let start = Instant::now();
    let source = parse_event_id(&request.source_id)?;
    let target = parse_event_id(&request.target_id)?;
    let path = state
        .analyzer
        .shortest_precedence_path(&source, &target)
        .await
        .map_err(analysis_error)?;
    record_analysis_metric(
        "precedence_path",
        path.as_ref().map_or(0, |p| p.steps.len()),
        elapsed_ms(start),
    );

    Ok(Json(PathResponse {
        found: path.is_some(),
        path,
    }))
}

async fn hierarchy_path_handler<S: EventWriter + 'static>(
    State(state): SharedState<S>,
    Json(request): Json<PathRequest>,
) -> Result<Json<PathResponse>, ApiError> {
    let source = parse_event_id(&request.source_id)?;
    let target = parse_event_id(&request.target_id)?;
    let path = state
        .analyzer
        .shortest_hierarchy_path(&source, &target)
        .await
        .map_err(analysis_error)?;

    Ok(Json(PathResponse {
        found: path.is_some(),
        path,
    }))
}

async fn influence_handler<S: EventWriter + 'static>(
    State(state): SharedState<S>,
    Json(request): Json<InfluenceRequest>,
) -> Result<Json<InfluenceReport>, ApiError> {
    let event_id = parse_event_id(&request.event_id)?;
    let max_depth = request
        .max_depth
        .unwrap_or(state.analyzer.policy().global_influence_depth);
    let report = state
        .analyzer
        .compute_influence(&event_id, max_depth)
        .await
        .map_err(analysis_error)?;
    Ok(Json(report))
}

async fn simulate_influence_handler<S: EventWriter + 'static>(
    State(state): SharedState<S>,
    Json(request): Json<InfluenceSimulationRequest>,
) -> Result<Json<InfluenceSimulation>, ApiError> {
    let event_id = parse_event_id(&request.event_id)?;
    let new_parent = request
        .new_parent_id
        .as_deref()
        .map(parse_event_id)
        .transpose()?;
    let max_depth = request
        .max_depth
        .unwrap_or(state.analyzer.policy().global_influence_depth);
    let simulation = state
        .analyzer
        .simulate_influence(&event_id, new_parent, max_depth)
        .await
        .map_err(analysis_error)?;
    Ok(Json(simulation))
}

async fn global_influence_handler<S: EventWriter + 'static>(
    State(state): SharedState<S>,
) -> Result<Json<GlobalInfluence>, ApiError> {
    let start = Instant::now();
    let global = state
        .analyzer
        .global_influence_analysis()
        .await
        .map_err(analysis_error)?;
    record_analysis_metric("global_influence", global.event_count, elapsed_ms(start));
    Ok(Json(global))
}

async fn influence_network_handler<S: EventWriter + 'static>(
    State(state): SharedState<S>,
) -> Result<Json<InfluenceNetwork>, ApiError> {
    let network = state
        .analyzer
        .influence_network()
        .await
        .map_err(analysis_error)?;
    Ok(Json(network))
}

async fn get_event_handler<S: EventWriter + 'static>(
    State(state): SharedState<S>,
    Path(event_id): Path<String>,
) -> Result<Json<Event>, ApiError> {
    let event_id = parse_event_id(&event_id)?;
    let event = state
        .analyzer
        .get_event(&event_id)
        .await
        .map_err(analysis_error)?;
    Ok(Json(event))
}

async fn child_events_handler<S: EventWriter + 'static>(
    State(state): SharedState<S>,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let event_id = parse_event_id(&event_id)?;
    let children = state
        .analyzer
        .get_child_events(&event_id)
        .await
        .map_err(analysis_error)?;
    Ok(Json(children))
}

/// Accept a batch and validate/write it in the background.
async fn ingest_handler<S: EventWriter + 'static>(
    State(state): SharedState<S>,
    Json(request): Json<IngestRequest>,
) -> (StatusCode, Json<IngestResponse>) {
    let submitted = request.records.len();
    let job_id = state.jobs.create(submitted);
    tracing::info!(job_id = %job_id, submitted, "ingestion job accepted");

    let jobs = Arc::clone(&state.jobs);
    let store = Arc::clone(&state.store);
    tokio::spawn(async move {
        let status = run_ingestion(&jobs, store.as_ref(), job_id, request.records).await;
        match status {
            JobStatus::Completed { accepted, rejected } => {
                record_ingestion_metric(accepted, rejected, true)
            }
            _ => record_ingestion_metric(0, 0, false),
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(IngestResponse { job_id, submitted }),
    )
}

async fn job_status_handler<S: EventWriter + 'static>(
    State(state): SharedState<S>,
    Path(job_id): Path<String>,
) -> Result<Json<IngestionJob>, ApiError> {
    let id = JobId::from_str(&job_id).map_err(|e| {
        reject(
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("INVALID_JOB_ID", format!("Invalid job ID: {}", e))
                .with_details(job_id.clone()),
        )
    })?;
    state.jobs.get(&id).map(Json).ok_or_else(|| {
        reject(
            StatusCode::NOT_FOUND,
            ErrorResponse::new("JOB_NOT_FOUND", format!("Job not found: {}", id)),
        )
    })
}

async fn policy_handler<S: EventWriter + 'static>(
    State(state): SharedState<S>,
) -> Json<PolicyResponse> {
    Json(PolicyResponse {
        policy_ref: state.policy_ref().clone(),
        policy: state.analyzer.policy().clone(),
        cache: state.analyzer.cache_stats(),
    })
}

/// Health check endpoint (detailed).
async fn health_handler<S: EventWriter + 'static>(
    State(state): SharedState<S>,
) -> Json<HealthResponse> {
    let store_healthy = state.store.is_healthy().await;
    let policy_ref = state.policy_ref();

    Json(HealthResponse {
        status: if store_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version: TEMPORAL_KERNEL_SCHEMA_VERSION.to_string(),
        policy_id: policy_ref.policy_id.clone(),
        params_hash: policy_ref.params_hash.clone(),
        store_healthy,
        tracked_jobs: state.jobs.len(),
    })
}

/// Liveness probe endpoint. Does not check dependencies.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint: 200 when the store answers, 503 otherwise.
async fn readiness_handler<S: EventWriter + 'static>(
    State(state): SharedState<S>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    if state.store.is_healthy().await {
        Ok(Json(ReadinessResponse {
            ready: true,
            store: true,
            details: None,
        }))
    } else {
        Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                ready: false,
                store: false,
                details: Some("Event store unavailable".to_string()),
            }),
        ))
    }
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the temporal kernel service.
pub fn create_router<S: EventWriter + 'static>(state: ServiceState<S>) -> Router {
    let state = Arc::new(state);

    Router::new()
        // Gaps and overlaps
        .route("/api/overlaps", post(overlaps_handler::<S>))
        .route("/api/gaps", post(gaps_handler::<S>))
        .route("/api/gaps/largest", post(largest_gap_handler::<S>))
        .route("/api/gaps/simulate", post(simulate_gap_handler::<S>))
        // Paths
        .route("/api/paths/precedence", post(precedence_path_handler::<S>))
        .route("/api/paths/hierarchy", post(hierarchy_path_handler::<S>))
        // Influence
        .route("/api/influence", post(influence_handler::<S>))
        .route("/api/influence/simulate", post(simulate_influence_handler::<S>))
        .route("/api/influence/global", get(global_influence_handler::<S>))
        .route("/api/influence/network", get(influence_network_handler::<S>))
        // Events and ingestion
        .route("/api/events/ingest", post(ingest_handler::<S>))
        .route("/api/events/:event_id", get(get_event_handler::<S>))
        .route("/api/events/:event_id/children", get(child_events_handler::<S>))
        .route("/api/jobs/:job_id", get(job_status_handler::<S>))
        .route("/api/policy", get(policy_handler::<S>))
        // Health checks
        .route("/health", get(health_handler::<S>))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler::<S>))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_status_mapping() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        assert_eq!(status_for(&AnalysisError::NotFound(EventId::random())), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&AnalysisError::InvalidRange { start: at, end: at }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&AnalysisError::InvalidInterval { start: at, end: at }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_for(&AnalysisError::DeadlineExceeded), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            status_for(&AnalysisError::StoreError("down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_response_uses_code() {
        let body: ErrorResponse = AnalysisError::DeadlineExceeded.into();
        assert_eq!(body.code, "DEADLINE_EXCEEDED");
        assert!(body.details.is_none());
    }

    #[test]
    fn test_window_requires_both_bounds() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let only_start = GapRequest {
            window_start: Some(start),
            ..GapRequest::default()
        };
        let (status, body) = window_from(&only_start).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "INVALID_WINDOW");

        assert!(window_from(&GapRequest::default()).unwrap().is_none());
    }


    mod router {
        use super::super::*;
        use crate::store::InMemoryEventStore;
        use axum::body::{to_bytes, Body};
        use axum::http::Request;
        use chrono::TimeZone;
        use tower::ServiceExt;
        use uuid::Uuid;

        fn id(n: u128) -> EventId {
            EventId::new(Uuid::from_u128(n))
        }

        fn at(hour: u32) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
        }

        fn state() -> ServiceState<InMemoryEventStore> {
            let store = InMemoryEventStore::with_events(vec![
                Event::new(id(1), "Kickoff", at(9), at(10)).unwrap(),
                Event::new(id(2), "Review", at(13), at(14)).unwrap().with_parent(id(1)),
            ])
            .unwrap();
            ServiceState::new(store, AnalysisPolicy::default(), 8)
        }

        fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap()
        }

        fn get(uri: &str) -> Request<Body> {
            Request::builder().uri(uri).body(Body::empty()).unwrap()
        }

        async fn json(response: axum::response::Response) -> serde_json::Value {
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            serde_json::from_slice(&bytes).unwrap()
        }

        #[tokio::test]
        async fn test_liveness() {
            let response = create_router(state()).oneshot(get("/health/live")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        #[tokio::test]
        async fn test_global_gaps_with_empty_body() {
            let response = create_router(state())
                .oneshot(post("/api/gaps", serde_json::json!({})))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let body = json(response).await;
            assert_eq!(body["gaps"][0]["duration_minutes"], 180);
            assert_eq!(body["gaps"][0]["severity"], "high");
        }

        #[tokio::test]
        async fn test_invalid_event_id_is_bad_request() {
            let response = create_router(state())
                .oneshot(post(
                    "/api/paths/precedence",
                    serde_json::json!({"source_id": "nope", "target_id": id(1).to_string()}),
                ))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(json(response).await["code"], "INVALID_EVENT_ID");
        }

        #[tokio::test]
        async fn test_unknown_event_is_not_found() {
            let uri = format!("/api/events/{}", id(42));
            let response = create_router(state()).oneshot(get(&uri)).await.unwrap();

            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            assert_eq!(json(response).await["code"], "NOT_FOUND");
        }

        #[tokio::test]
        async fn test_precedence_path_found() {
            let response = create_router(state())
                .oneshot(post(
                    "/api/paths/precedence",
                    serde_json::json!({
                        "source_id": id(1).to_string(),
                        "target_id": id(2).to_string(),
                    }),
                ))
                .await
                .unwrap();

            let body = json(response).await;
            assert_eq!(body["found"], true);
            assert_eq!(body["path"]["total_duration_minutes"], 120);
        }

        #[tokio::test]
        async fn test_inverted_overlap_window() {
            let response = create_router(state())
                .oneshot(post(
                    "/api/overlaps",
                    serde_json::json!({
                        "window_start": "2024-03-01T12:00:00Z",
                        "window_end": "2024-03-01T08:00:00Z",
                    }),
                ))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(json(response).await["code"], "INVALID_RANGE");
        }

        #[tokio::test]
        async fn test_naive_window_timestamp_is_rejected() {
            let response = create_router(state())
                .oneshot(post(
                    "/api/overlaps",
                    serde_json::json!({
                        "window_start": "2024-03-01T09:00:00",
                        "window_end": "2024-03-01T12:00:00Z",
                    }),
                ))
                .await
                .unwrap();

            assert!(response.status().is_client_error());
        }

        #[tokio::test]
        async fn test_ingest_then_poll_job() {
            let state = state();
            let router = create_router(state.clone());

            let response = router
                .clone()
                .oneshot(post(
                    "/api/events/ingest",
                    serde_json::json!({"records": [
                        {"name": "Late", "start": "2024-03-01T20:00:00Z", "end": "2024-03-01T21:00:00Z"},
                        {"name": "Broken"}
                    ]}),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::ACCEPTED);
            let job_id = json(response).await["job_id"].as_str().unwrap().to_string();

            let uri = format!("/api/jobs/{}", job_id);
            let mut body = serde_json::Value::Null;
            for _ in 0..100 {
                body = json(router.clone().oneshot(get(&uri)).await.unwrap()).await;
                if body["status"]["state"] == "completed" {
                    break;
                }
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }

            assert_eq!(body["status"]["state"], "completed");
            assert_eq!(body["status"]["accepted"], 1);
            assert_eq!(body["status"]["rejected"], 1);
            assert_eq!(state.store.len(), 3);
        }
    }

    #[test]
    fn test_gap_request_accepts_offsets() {
        let request: GapRequest = serde_json::from_str(
            r#"{"window_start":"2024-03-01T11:00:00+02:00","window_end":"2024-03-01T10:00:00Z"}"#,
        )
        .unwrap();
        let window = window_from(&request).unwrap().unwrap();
        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
        assert_eq!(request.min_gap_minutes, 0);
    }
}

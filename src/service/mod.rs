//! Temporal Kernel REST Service
//!
//! Exposes the analyzer and bulk ingestion as a REST API.
//!
//! ## Endpoints
//!
//! - `POST /api/overlaps` - Overlapping pairs inside a window
//! - `POST /api/gaps` - Gap report (windowed or global)
//! - `POST /api/gaps/largest` - Longest gap
//! - `POST /api/gaps/simulate` - Gap impact of moving an event
//! - `POST /api/paths/precedence` - Shortest precedence chain
//! - `POST /api/paths/hierarchy` - Shortest parent/child chain
//! - `POST /api/influence` - Decayed influence of one event
//! - `POST /api/influence/simulate` - Influence impact of re-parenting
//! - `GET /api/influence/global` - Influence ranking and distribution
//! - `GET /api/influence/network` - Influence network for visualization
//! - `GET /api/events/:event_id` - Fetch an event
//! - `GET /api/events/:event_id/children` - Fetch an event's children
//! - `POST /api/events/ingest` - Submit a bulk ingestion job
//! - `GET /api/jobs/:job_id` - Ingestion job status
//! - `GET /api/policy` - Active policy and cache statistics
//! - `GET /health` - Detailed service health check
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::{metrics_middleware, record_analysis_metric, record_ingestion_metric};
pub use routes::{create_router, ApiError, ErrorResponse};
pub use state::{PolicyRef, ServiceState};

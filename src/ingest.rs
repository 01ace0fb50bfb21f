//! Bulk event ingestion with job tracking.
//!
//! Records arrive as loosely-typed JSON and are validated one by one into
//! [`Event`]s. Malformed records are skipped and reported on the job; they
//! never fail the batch. Job state lives in an owned
//! [`IngestionJobRegistry`] that the service injects into its handlers.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use uuid::Uuid;

use crate::store::EventWriter;
use crate::types::{Event, EventId};

/// Default number of jobs retained by a registry.
pub const DEFAULT_JOB_CAPACITY: usize = 1024;

/// One incoming record. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestRecord {
    /// Event UUID; generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// RFC 3339 start.
    #[serde(default)]
    pub start: Option<String>,
    /// RFC 3339 end.
    #[serde(default)]
    pub end: Option<String>,
    /// Parent event UUID.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// JSON object of metadata.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Why a record was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    /// A required field is missing or blank.
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    /// A UUID field failed to parse.
    #[error("invalid UUID in `{field}`: {value}")]
    InvalidId {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: String,
    },
    /// A timestamp is not RFC 3339.
    #[error("invalid RFC 3339 timestamp in `{field}`: {value}")]
    InvalidTimestamp {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: String,
    },
    /// `end <= start`.
    #[error("end {end} is not after start {start}")]
    InvalidInterval {
        /// Parsed start.
        start: DateTime<Utc>,
        /// Parsed end.
        end: DateTime<Utc>,
    },
    /// Metadata is present but not a JSON object.
    #[error("metadata must be a JSON object")]
    InvalidMetadata,
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, IngestError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(IngestError::MissingField(field)),
    }
}

fn parse_id(value: &str, field: &'static str) -> Result<EventId, IngestError> {
    EventId::from_str(value).map_err(|_| IngestError::InvalidId {
        field,
        value: value.to_string(),
    })
}

fn parse_instant(value: &str, field: &'static str) -> Result<DateTime<Utc>, IngestError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| IngestError::InvalidTimestamp {
            field,
            value: value.to_string(),
        })
}

impl IngestRecord {
    /// Validate into a typed event.
    pub fn validate(&self) -> Result<Event, IngestError> {
        let id = match self.id.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_id(raw, "id")?,
            _ => EventId::random(),
        };
        let name = required(&self.name, "name")?;
        let start = parse_instant(required(&self.start, "start")?, "start")?;
        let end = parse_instant(required(&self.end, "end")?, "end")?;

        let mut event = Event::new(id, name, start, end)
            .map_err(|_| IngestError::InvalidInterval { start, end })?;

        if let Some(raw) = self.parent_id.as_deref().map(str::trim) {
            if !raw.is_empty() {
                event.parent_id = Some(parse_id(raw, "parent_id")?);
            }
        }
        event.description = self.description.clone().filter(|d| !d.is_empty());
        match &self.metadata {
            None | Some(serde_json::Value::Null) => {}
            Some(serde_json::Value::Object(map)) => {
                event.metadata = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            }
            Some(_) => return Err(IngestError::InvalidMetadata),
        }
        Ok(event)
    }
}

/// A record skipped during ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRecord {
    /// Position in the submitted batch.
    pub index: usize,
    /// Validation failure.
    pub reason: String,
}

/// Split a batch into valid events and rejections.
pub fn partition_records(records: &[IngestRecord]) -> (Vec<Event>, Vec<RejectedRecord>) {
    let mut accepted = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();
    for (index, record) in records.iter().enumerate() {
        match record.validate() {
            Ok(event) => accepted.push(event),
            Err(e) => {
                tracing::warn!(index, reason = %e, "rejected ingest record");
                rejected.push(RejectedRecord {
                    index,
                    reason: e.to_string(),
                });
            }
        }
    }
    (accepted, rejected)
}

/// Identifier of an ingestion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    /// Generate a new random JobId.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a JobId from a UUID string.
    pub fn from_str(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of an ingestion job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobStatus {
    /// Created, not started.
    Pending,
    /// Validating and writing.
    Running,
    /// Finished; some records may have been rejected.
    Completed {
        /// Events written.
        accepted: usize,
        /// Records skipped.
        rejected: usize,
    },
    /// The write failed.
    Failed {
        /// Failure message.
        error: String,
    },
}

impl JobStatus {
    /// Whether the job has finished, successfully or not.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }
}

/// Snapshot of one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionJob {
    /// Job ID.
    pub id: JobId,
    /// Current state.
    pub status: JobStatus,
    /// Records in the submitted batch.
    pub submitted: usize,
    /// Records skipped, with reasons.
    pub rejected_records: Vec<RejectedRecord>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last state change.
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Jobs {
    by_id: BTreeMap<JobId, IngestionJob>,
    order: VecDeque<JobId>,
}

/// Bounded registry of ingestion jobs.
///
/// When full, creating a job evicts the oldest finished job. Active jobs are
/// never evicted, so the registry may briefly exceed its capacity.
#[derive(Debug)]
pub struct IngestionJobRegistry {
    capacity: usize,
    jobs: RwLock<Jobs>,
}

impl Default for IngestionJobRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_JOB_CAPACITY)
    }
}

impl IngestionJobRegistry {
    /// Create a registry retaining up to `capacity` jobs.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            jobs: RwLock::new(Jobs::default()),
        }
    }

    /// Register a pending job for a batch of `submitted` records.
    pub fn create(&self, submitted: usize) -> JobId {
        let id = JobId::random();
        let now = Utc::now();
        let mut jobs = self.jobs.write();

        while jobs.by_id.len() >= self.capacity {
            let oldest_finished = jobs
                .order
                .iter()
                .position(|j| jobs.by_id.get(j).is_some_and(|job| job.status.is_finished()));
            match oldest_finished.and_then(|i| jobs.order.remove(i)) {
                Some(evicted) => {
                    jobs.by_id.remove(&evicted);
                }
                None => break,
            }
        }

        jobs.by_id.insert(
            id,
            IngestionJob {
                id,
                status: JobStatus::Pending,
                submitted,
                rejected_records: Vec::new(),
                created_at: now,
                updated_at: now,
            },
        );
        jobs.order.push_back(id);
        id
    }

    fn update(&self, id: &JobId, f: impl FnOnce(&mut IngestionJob)) -> bool {
        match self.jobs.write().by_id.get_mut(id) {
            Some(job) => {
                f(job);
                job.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Move a job to `Running`.
    pub fn mark_running(&self, id: &JobId) -> bool {
        self.update(id, |job| job.status = JobStatus::Running)
    }

    /// Move a job to `Completed`.
    pub fn complete(&self, id: &JobId, accepted: usize, rejected: Vec<RejectedRecord>) -> bool {
        self.update(id, |job| {
            job.status = JobStatus::Completed {
                accepted,
                rejected: rejected.len(),
            };
            job.rejected_records = rejected;
        })
    }

    /// Move a job to `Failed`.
    pub fn fail(&self, id: &JobId, error: impl Into<String>) -> bool {
        let error = error.into();
        self.update(id, |job| job.status = JobStatus::Failed { error })
    }

    /// Current state of a job.
    pub fn get(&self, id: &JobId) -> Option<IngestionJob> {
        self.jobs.read().by_id.get(id).cloned()
    }

    /// Number of retained jobs.
    pub fn len(&self) -> usize {
        self.jobs.read().by_id.len()
    }

    /// Whether no jobs are retained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Validate and write one batch, recording progress on `job`.
pub async fn run_ingestion<W: EventWriter>(
    registry: &IngestionJobRegistry,
    writer: &W,
    job: JobId,
    records: Vec<IngestRecord>,
) -> JobStatus {
    registry.mark_running(&job);

    let (accepted, rejected) = partition_records(&records);
    match writer.insert_events(&accepted).await {
        Ok(written) => {
            tracing::info!(
                job_id = %job,
                accepted = written,
                rejected = rejected.len(),
                "ingestion job completed"
            );
            registry.complete(&job, written, rejected);
        }
        Err(e) => {
            tracing::warn!(job_id = %job, error = %e, "ingestion job failed");
            registry.fail(&job, e.to_string());
        }
    }

    registry
        .get(&job)
        .map(|j| j.status)
        .unwrap_or(JobStatus::Failed {
            error: "job evicted".to_string(),
        })
}

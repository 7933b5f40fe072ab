use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::candidate::{
    CandidateLevel, CandidateProgress, CandidateStatus, StepList, StepStatus,
};

/// Full snapshot of a candidate row, taken on every insert/update.
/// Rows are append-only: nothing in the application updates or deletes them,
/// and they survive deletion of the candidate itself.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateHistoryRecord {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub level: CandidateLevel,
    pub location: String,
    pub status: CandidateStatus,
    pub progress: CandidateProgress,
    pub current_step: i32,
    pub steps: Json<StepList>,
    pub cv_url: Option<String>,
    pub created_by: String,
    pub recorded_at: DateTime<Utc>,
}

/// Snapshot of a single interview step, taken whenever its fields change.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewStepHistoryRecord {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub index_position: i32,
    pub name: String,
    pub status: StepStatus,
    pub feedback: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub recorded_at: DateTime<Utc>,
}

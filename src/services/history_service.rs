use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::Result;
use crate::models::candidate::{Candidate, InterviewStep};
use crate::models::history::{CandidateHistoryRecord, InterviewStepHistoryRecord};

const CANDIDATE_HISTORY_COLUMNS: &str = "id, candidate_id, name, email, role, level, location, \
     status, progress, current_step, steps, cv_url, created_by, recorded_at";

const STEP_HISTORY_COLUMNS: &str =
    "id, candidate_id, index_position, name, status, feedback, completed_at, recorded_at";

/// Writes append-only snapshots of candidates and steps, and reads them back
/// for the audit view. Snapshots are never updated or deleted here; the
/// schema has no FK to candidates so they also survive candidate deletion.
#[derive(Clone)]
pub struct HistoryService {
    pool: PgPool,
}

impl HistoryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Snapshot the candidate row inside the caller's transaction so the
    /// write and its audit record commit or roll back together.
    pub async fn record_candidate(
        tx: &mut Transaction<'_, Postgres>,
        candidate: &Candidate,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO candidate_history \
                 (id, candidate_id, name, email, role, level, location, status, progress, \
                  current_step, steps, cv_url, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(Uuid::new_v4())
        .bind(candidate.id)
        .bind(&candidate.name)
        .bind(&candidate.email)
        .bind(&candidate.role)
        .bind(candidate.level)
        .bind(&candidate.location)
        .bind(candidate.status)
        .bind(candidate.progress)
        .bind(candidate.current_step)
        .bind(&candidate.steps)
        .bind(&candidate.cv_url)
        .bind(&candidate.created_by)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn record_step(
        tx: &mut Transaction<'_, Postgres>,
        candidate_id: Uuid,
        step: &InterviewStep,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO interview_step_history \
                 (id, candidate_id, index_position, name, status, feedback, completed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(Uuid::new_v4())
        .bind(candidate_id)
        .bind(step.index_position)
        .bind(step.name.as_str())
        .bind(step.status)
        .bind(&step.feedback)
        .bind(step.completed_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn candidate_history(
        &self,
        candidate_id: Uuid,
    ) -> Result<Vec<CandidateHistoryRecord>> {
        let records = sqlx::query_as::<_, CandidateHistoryRecord>(&format!(
            "SELECT {} FROM candidate_history \
             WHERE candidate_id = $1 ORDER BY recorded_at DESC",
            CANDIDATE_HISTORY_COLUMNS
        ))
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    pub async fn step_history(
        &self,
        candidate_id: Uuid,
    ) -> Result<Vec<InterviewStepHistoryRecord>> {
        let records = sqlx::query_as::<_, InterviewStepHistoryRecord>(&format!(
            "SELECT {} FROM interview_step_history \
             WHERE candidate_id = $1 ORDER BY recorded_at DESC, index_position",
            STEP_HISTORY_COLUMNS
        ))
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}

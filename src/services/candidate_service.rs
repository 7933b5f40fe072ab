use std::str::FromStr;

use chrono::Utc;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::candidate_dto::{
    CreateCandidatePayload, ListCandidatesQuery, PaginatedCandidates,
};
use crate::error::{Error, Result};
use crate::models::candidate::{
    Candidate, CandidateLevel, CandidateProgress, CandidateStatus, StepList,
};
use crate::pipeline::{self, StepAction};
use crate::services::history_service::HistoryService;

const CANDIDATE_COLUMNS: &str = "id, name, email, role, level, location, status, progress, \
     current_step, steps, cv_url, created_by, version, created_at, updated_at";

#[derive(Debug, Clone, Default)]
pub struct CandidateFilter {
    pub name: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub role: Option<String>,
    pub level: Option<CandidateLevel>,
    pub status: Option<CandidateStatus>,
}

impl CandidateFilter {
    /// Build a typed filter out of the raw query string. The UI sends "all"
    /// for enum selects when no filter is chosen.
    pub fn from_query(query: &ListCandidatesQuery) -> Result<Self> {
        Ok(Self {
            name: non_empty(&query.name),
            email: non_empty(&query.email),
            location: non_empty(&query.location),
            role: non_empty(&query.role).filter(|r| !r.eq_ignore_ascii_case("all")),
            level: parse_enum_filter::<CandidateLevel>(&query.level, "level")?,
            status: parse_enum_filter::<CandidateStatus>(&query.status, "status")?,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_enum_filter<T: FromStr<Err = String>>(
    value: &Option<String>,
    field: &str,
) -> Result<Option<T>> {
    match non_empty(value) {
        None => Ok(None),
        Some(raw) if raw.eq_ignore_ascii_case("all") => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::BadRequest(format!("invalid {} filter: {}", field, e))),
    }
}

/// Whitelist of sortable columns. Accepts the camelCase spellings the list
/// view sends alongside the native snake_case ones.
fn sort_column(field: &str) -> Option<&'static str> {
    match field {
        "name" => Some("name"),
        "email" => Some("email"),
        "role" => Some("role"),
        "level" => Some("level"),
        "location" => Some("location"),
        "status" => Some("status"),
        "progress" => Some("progress"),
        "currentStep" | "current_step" => Some("current_step"),
        "createdAt" | "created_at" => Some("created_at"),
        "updatedAt" | "updated_at" => Some("updated_at"),
        _ => None,
    }
}

fn resolve_sort(query: &ListCandidatesQuery) -> Result<(&'static str, &'static str)> {
    let sort = match query.sort_field.as_deref() {
        None => "created_at",
        Some(field) => sort_column(field)
            .ok_or_else(|| Error::BadRequest(format!("unsupported sort field: {}", field)))?,
    };
    let order = match query.sort_order.as_deref() {
        None => "DESC",
        Some(raw) if raw.eq_ignore_ascii_case("asc") => "ASC",
        Some(raw) if raw.eq_ignore_ascii_case("desc") => "DESC",
        Some(raw) => {
            return Err(Error::BadRequest(format!(
                "unsupported sort order: {}",
                raw
            )))
        }
    };
    Ok((sort, order))
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &CandidateFilter) {
    if let Some(ref name) = filter.name {
        qb.push(" AND name ILIKE ").push_bind(format!("%{}%", name));
    }
    if let Some(ref email) = filter.email {
        qb.push(" AND email ILIKE ").push_bind(format!("%{}%", email));
    }
    if let Some(ref location) = filter.location {
        qb.push(" AND location ILIKE ")
            .push_bind(format!("%{}%", location));
    }
    if let Some(ref role) = filter.role {
        qb.push(" AND role = ").push_bind(role.clone());
    }
    if let Some(level) = filter.level {
        qb.push(" AND level = ").push_bind(level);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
}

#[derive(Clone)]
pub struct CandidateService {
    pool: PgPool,
}

impl CandidateService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_candidate(&self, id: Uuid) -> Result<Option<Candidate>> {
        let candidate = sqlx::query_as::<_, Candidate>(&format!(
            "SELECT {} FROM candidates WHERE id = $1",
            CANDIDATE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(candidate)
    }

    async fn require_candidate(&self, id: Uuid) -> Result<Candidate> {
        self.get_candidate(id)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))
    }

    pub async fn create_candidate(&self, payload: CreateCandidatePayload) -> Result<Candidate> {
        let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM candidates WHERE email = $1")
            .bind(&payload.email)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_some() {
            return Err(Error::Conflict(
                "A candidate with this email address already exists.".to_string(),
            ));
        }

        let created_by = payload
            .created_by
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| "System Import".to_string());

        let mut tx = self.pool.begin().await?;
        let candidate = sqlx::query_as::<_, Candidate>(&format!(
            "INSERT INTO candidates \
                 (id, name, email, role, level, location, status, progress, current_step, steps, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {}",
            CANDIDATE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(&payload.role)
        .bind(payload.level)
        .bind(&payload.location)
        .bind(CandidateStatus::Open)
        .bind(CandidateProgress::Pending)
        .bind(0i32)
        .bind(Json(StepList::default_pipeline()))
        .bind(&created_by)
        .fetch_one(&mut *tx)
        .await?;

        HistoryService::record_candidate(&mut tx, &candidate).await?;
        for step in candidate.steps.iter() {
            HistoryService::record_step(&mut tx, candidate.id, step).await?;
        }
        tx.commit().await?;

        tracing::info!(candidate_id = %candidate.id, email = %candidate.email, "candidate created");
        Ok(candidate)
    }

    /// Bulk creation for spreadsheet imports. Rows are created one by one the
    /// same way single creation works; the first failing row aborts the rest.
    pub async fn import_candidates(
        &self,
        rows: Vec<CreateCandidatePayload>,
    ) -> Result<Vec<Candidate>> {
        let mut created = Vec::with_capacity(rows.len());
        for row in rows {
            created.push(self.create_candidate(row).await?);
        }
        Ok(created)
    }

    pub async fn list_candidates(
        &self,
        query: &ListCandidatesQuery,
        default_page_size: u32,
    ) -> Result<PaginatedCandidates> {
        let filter = CandidateFilter::from_query(query)?;

        let page = query.page.unwrap_or(1).max(1);
        let page_size = query.page_size.unwrap_or(default_page_size).clamp(1, 100);
        let offset = (page - 1) as i64 * page_size as i64;

        let (sort, order) = resolve_sort(query)?;

        let mut count_qb =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM candidates WHERE TRUE");
        push_filters(&mut count_qb, &filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM candidates WHERE TRUE",
            CANDIDATE_COLUMNS
        ));
        push_filters(&mut qb, &filter);
        qb.push(" ORDER BY ")
            .push(sort)
            .push(" ")
            .push(order)
            .push(" LIMIT ")
            .push_bind(page_size as i64)
            .push(" OFFSET ")
            .push_bind(offset);

        let items = qb
            .build_query_as::<Candidate>()
            .fetch_all(&self.pool)
            .await?;

        let total_pages = ((total + page_size as i64 - 1) / page_size as i64) as u32;
        Ok(PaginatedCandidates {
            items,
            total,
            page,
            page_size,
            total_pages,
        })
    }

    /// Every candidate matching the filter, in sort order, without
    /// pagination. Used by the spreadsheet export.
    pub async fn list_all(&self, query: &ListCandidatesQuery) -> Result<Vec<Candidate>> {
        let filter = CandidateFilter::from_query(query)?;
        let (sort, order) = resolve_sort(query)?;

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM candidates WHERE TRUE",
            CANDIDATE_COLUMNS
        ));
        push_filters(&mut qb, &filter);
        qb.push(" ORDER BY ").push(sort).push(" ").push(order);

        let items = qb
            .build_query_as::<Candidate>()
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    /// Run one pipeline action against a candidate and persist the outcome.
    /// The transition itself is pure; this method supplies the clock, the
    /// optimistic-concurrency check, and the history snapshots.
    pub async fn apply_step_action(
        &self,
        id: Uuid,
        step_index: usize,
        action: StepAction,
        feedback: Option<String>,
    ) -> Result<Candidate> {
        let mut candidate = self.require_candidate(id).await?;
        let steps_before = candidate.steps.0.clone();

        pipeline::apply_step_action(
            &mut candidate,
            step_index,
            action,
            feedback.as_deref(),
            Utc::now(),
        )?;

        let mut tx = self.pool.begin().await?;
        let persisted = persist_candidate(&mut tx, &candidate).await?;

        HistoryService::record_candidate(&mut tx, &persisted).await?;
        for (idx, step) in persisted.steps.iter().enumerate() {
            if steps_before.get(idx) != Some(step) {
                HistoryService::record_step(&mut tx, persisted.id, step).await?;
            }
        }
        tx.commit().await?;

        tracing::info!(
            candidate_id = %persisted.id,
            action = ?action,
            step_index,
            status = persisted.status.as_str(),
            "pipeline action applied"
        );
        Ok(persisted)
    }

    pub async fn update_progress(
        &self,
        id: Uuid,
        progress: CandidateProgress,
    ) -> Result<Candidate> {
        let mut candidate = self.require_candidate(id).await?;
        candidate.progress = progress;
        self.persist_with_history(candidate).await
    }

    pub async fn update_status(&self, id: Uuid, status: CandidateStatus) -> Result<Candidate> {
        let mut candidate = self.require_candidate(id).await?;
        candidate.status = status;
        self.persist_with_history(candidate).await
    }

    pub async fn update_cv(&self, id: Uuid, cv_url: String) -> Result<Candidate> {
        let mut candidate = self.require_candidate(id).await?;
        candidate.cv_url = Some(cv_url);
        self.persist_with_history(candidate).await
    }

    pub async fn delete_candidate(&self, id: Uuid) -> Result<bool> {
        // History rows intentionally survive the delete.
        let result = sqlx::query("DELETE FROM candidates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn persist_with_history(&self, candidate: Candidate) -> Result<Candidate> {
        let mut tx = self.pool.begin().await?;
        let persisted = persist_candidate(&mut tx, &candidate).await?;
        HistoryService::record_candidate(&mut tx, &persisted).await?;
        tx.commit().await?;
        Ok(persisted)
    }
}

/// UPDATE guarded by the version column: zero rows means somebody else wrote
/// the candidate since it was loaded, which surfaces as a 409.
async fn persist_candidate(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    candidate: &Candidate,
) -> Result<Candidate> {
    let updated = sqlx::query_as::<_, Candidate>(&format!(
        "UPDATE candidates SET \
             name = $1, email = $2, role = $3, level = $4, location = $5, \
             status = $6, progress = $7, current_step = $8, steps = $9, \
             cv_url = $10, version = version + 1, updated_at = NOW() \
         WHERE id = $11 AND version = $12 \
         RETURNING {}",
        CANDIDATE_COLUMNS
    ))
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
    .bind(candidate.id)
    .bind(candidate.version)
    .fetch_optional(&mut **tx)
    .await?;

    updated.ok_or_else(|| {
        Error::Conflict("Candidate was modified concurrently; reload and retry.".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_whitelist_covers_known_fields_only() {
        assert_eq!(sort_column("createdAt"), Some("created_at"));
        assert_eq!(sort_column("created_at"), Some("created_at"));
        assert_eq!(sort_column("currentStep"), Some("current_step"));
        assert_eq!(sort_column("name"), Some("name"));
        assert_eq!(sort_column("id; DROP TABLE candidates"), None);
        assert_eq!(sort_column("steps"), None);
    }

    #[test]
    fn filter_treats_all_sentinel_and_blank_as_no_filter() {
        let query = ListCandidatesQuery {
            role: Some("all".to_string()),
            level: Some("ALL".to_string()),
            status: Some("  ".to_string()),
            name: Some(String::new()),
            ..Default::default()
        };
        let filter = CandidateFilter::from_query(&query).unwrap();
        assert!(filter.role.is_none());
        assert!(filter.level.is_none());
        assert!(filter.status.is_none());
        assert!(filter.name.is_none());
    }

    #[test]
    fn filter_parses_enum_values_case_insensitively() {
        let query = ListCandidatesQuery {
            level: Some("senior".to_string()),
            status: Some("OPEN".to_string()),
            ..Default::default()
        };
        let filter = CandidateFilter::from_query(&query).unwrap();
        assert_eq!(filter.level, Some(CandidateLevel::Senior));
        assert_eq!(filter.status, Some(CandidateStatus::Open));
    }

    #[test]
    fn filter_rejects_unknown_enum_values() {
        let query = ListCandidatesQuery {
            level: Some("WIZARD".to_string()),
            ..Default::default()
        };
        assert!(CandidateFilter::from_query(&query).is_err());
    }

    #[test]
    fn filters_land_in_the_sql() {
        let filter = CandidateFilter {
            name: Some("ada".to_string()),
            level: Some(CandidateLevel::Senior),
            status: Some(CandidateStatus::Open),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM candidates WHERE TRUE");
        push_filters(&mut qb, &filter);
        let sql = qb.sql();
        assert!(sql.contains("name ILIKE"));
        assert!(sql.contains("level ="));
        assert!(sql.contains("status ="));
        assert!(!sql.contains("role ="));
    }
}

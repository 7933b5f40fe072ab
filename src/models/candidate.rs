use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Pipeline stages every new candidate starts with, in order.
pub const DEFAULT_INTERVIEW_STEPS: [&str; 5] = [
    "Resume Screening",
    "Technical Assessment",
    "Technical Interview",
    "Culture Fit Interview",
    "Final Interview",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "candidate_level", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandidateLevel {
    Junior,
    Mid,
    Senior,
    Lead,
}

impl CandidateLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateLevel::Junior => "JUNIOR",
            CandidateLevel::Mid => "MID",
            CandidateLevel::Senior => "SENIOR",
            CandidateLevel::Lead => "LEAD",
        }
    }
}

impl std::str::FromStr for CandidateLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "JUNIOR" => Ok(CandidateLevel::Junior),
            "MID" => Ok(CandidateLevel::Mid),
            "SENIOR" => Ok(CandidateLevel::Senior),
            "LEAD" => Ok(CandidateLevel::Lead),
            other => Err(format!("unknown candidate level: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "candidate_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandidateStatus {
    Open,
    Closed,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Open => "OPEN",
            CandidateStatus::Closed => "CLOSED",
        }
    }
}

impl std::str::FromStr for CandidateStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "OPEN" => Ok(CandidateStatus::Open),
            "CLOSED" => Ok(CandidateStatus::Closed),
            other => Err(format!("unknown candidate status: {}", other)),
        }
    }
}

/// Outcome classification, settable independently of the step cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "candidate_progress", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandidateProgress {
    Pending,
    Shortlisted,
    OnHold,
    Offered,
    OfferAccepted,
    OfferRejected,
    Hired,
    Rejected,
}

impl CandidateProgress {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateProgress::Pending => "PENDING",
            CandidateProgress::Shortlisted => "SHORTLISTED",
            CandidateProgress::OnHold => "ON_HOLD",
            CandidateProgress::Offered => "OFFERED",
            CandidateProgress::OfferAccepted => "OFFER_ACCEPTED",
            CandidateProgress::OfferRejected => "OFFER_REJECTED",
            CandidateProgress::Hired => "HIRED",
            CandidateProgress::Rejected => "REJECTED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "step_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Pending,
    Completed,
    Rejected,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "PENDING",
            StepStatus::Completed => "COMPLETED",
            StepStatus::Rejected => "REJECTED",
        }
    }

    /// COMPLETED and REJECTED are terminal; PENDING awaits action.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StepStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewStep {
    pub index_position: i32,
    pub name: String,
    pub status: StepStatus,
    pub feedback: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl InterviewStep {
    pub fn pending(index_position: i32, name: &str) -> Self {
        Self {
            index_position,
            name: name.to_string(),
            status: StepStatus::Pending,
            feedback: None,
            completed_at: None,
        }
    }

    /// Put the step back into the awaiting-action state, dropping any
    /// outcome it carried.
    pub fn reset(&mut self) {
        self.status = StepStatus::Pending;
        self.feedback = None;
        self.completed_at = None;
    }
}

/// Ordered step list, fixed in length once the candidate is created.
/// Exposes read and in-place-update access only; there is intentionally no
/// way to insert or remove steps after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepList(Vec<InterviewStep>);

impl StepList {
    pub fn new(steps: Vec<InterviewStep>) -> Self {
        Self(steps)
    }

    /// The default pipeline: all steps PENDING, ordinals 0..N-1.
    pub fn default_pipeline() -> Self {
        Self(
            DEFAULT_INTERVIEW_STEPS
                .iter()
                .enumerate()
                .map(|(idx, name)| InterviewStep::pending(idx as i32, name))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&InterviewStep> {
        self.0.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut InterviewStep> {
        self.0.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, InterviewStep> {
        self.0.iter()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Candidate {
    pub id: Uuid,
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
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Candidate {
    /// The step currently awaiting action.
    pub fn current_step_record(&self) -> Option<&InterviewStep> {
        self.steps.get(self.current_step as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn default_pipeline_starts_all_pending() {
        let steps = StepList::default_pipeline();
        assert_eq!(steps.len(), DEFAULT_INTERVIEW_STEPS.len());
        for (idx, step) in steps.iter().enumerate() {
            assert_eq!(step.index_position, idx as i32);
            assert_eq!(step.status, StepStatus::Pending);
            assert!(step.feedback.is_none());
            assert!(step.completed_at.is_none());
        }
        assert_eq!(steps.get(0).unwrap().name, "Resume Screening");
    }

    #[test]
    fn level_round_trips_through_str() {
        for raw in ["JUNIOR", "MID", "SENIOR", "LEAD"] {
            let level = CandidateLevel::from_str(raw).unwrap();
            assert_eq!(level.as_str(), raw);
        }
        assert_eq!(
            CandidateLevel::from_str("senior").unwrap(),
            CandidateLevel::Senior
        );
        assert!(CandidateLevel::from_str("PRINCIPAL").is_err());
    }

    #[test]
    fn step_status_terminality() {
        assert!(!StepStatus::Pending.is_terminal());
        assert!(StepStatus::Completed.is_terminal());
        assert!(StepStatus::Rejected.is_terminal());
    }

    #[test]
    fn step_list_serializes_as_plain_array() {
        let steps = StepList::default_pipeline();
        let json = serde_json::to_value(&steps).unwrap();
        let arr = json.as_array().expect("expected a JSON array");
        assert_eq!(arr.len(), DEFAULT_INTERVIEW_STEPS.len());
        assert_eq!(arr[0]["status"], "PENDING");
        assert_eq!(arr[0]["index_position"], 0);
    }
}

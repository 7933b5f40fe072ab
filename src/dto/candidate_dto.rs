use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::candidate::{Candidate, CandidateLevel, CandidateProgress, CandidateStatus};
use crate::pipeline::StepAction;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCandidatePayload {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub role: String,
    pub level: CandidateLevel,
    #[validate(length(min = 1))]
    pub location: String,
    pub created_by: Option<String>,
}

/// Rows from a spreadsheet the client already parsed; each one goes through
/// the normal creation path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportCandidatesPayload {
    pub candidates: Vec<CreateCandidatePayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StepActionPayload {
    pub action: StepAction,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProgressPayload {
    pub progress: CandidateProgress,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusPayload {
    pub status: CandidateStatus,
}

/// Query string for the candidate list. Filter fields come in as raw text
/// because the UI sends the sentinel "all" for the enum selects.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListCandidatesQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub level: Option<String>,
    pub status: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaginatedCandidates {
    pub items: Vec<Candidate>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validation::validate;

    fn payload() -> CreateCandidatePayload {
        CreateCandidatePayload {
            name: "Grace Hopper".to_string(),
            email: "grace@example.com".to_string(),
            role: "Compiler Engineer".to_string(),
            level: CandidateLevel::Lead,
            location: "Arlington".to_string(),
            created_by: None,
        }
    }

    #[test]
    fn create_payload_accepts_complete_rows() {
        assert!(validate(&payload()).is_ok());
    }

    #[test]
    fn create_payload_rejects_bad_email_and_empty_fields() {
        let mut bad_email = payload();
        bad_email.email = "not-an-email".to_string();
        assert!(validate(&bad_email).is_err());

        let mut empty_name = payload();
        empty_name.name = String::new();
        assert!(validate(&empty_name).is_err());
    }

    #[test]
    fn step_action_payload_parses_action_and_feedback() {
        let parsed: StepActionPayload =
            serde_json::from_str(r#"{"action": "next", "feedback": "solid"}"#).unwrap();
        assert_eq!(parsed.action, StepAction::Next);
        assert_eq!(parsed.feedback.as_deref(), Some("solid"));

        let bare: StepActionPayload = serde_json::from_str(r#"{"action": "back"}"#).unwrap();
        assert_eq!(bare.action, StepAction::Back);
        assert!(bare.feedback.is_none());
    }

    #[test]
    fn level_field_rejects_unknown_values() {
        let raw = r#"{
            "name": "X", "email": "x@example.com", "role": "Dev",
            "level": "WIZARD", "location": "Remote"
        }"#;
        assert!(serde_json::from_str::<CreateCandidatePayload>(raw).is_err());
    }
}

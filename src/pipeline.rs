//! The interview pipeline state machine.
//!
//! Pure logic over an in-memory [`Candidate`]: given a target step and one of
//! five actions, it mutates the step list and the candidate's aggregate
//! `status`/`progress`/`current_step` fields, or refuses without touching
//! anything. No I/O happens here; the caller supplies the clock and persists
//! the result.

use chrono::{DateTime, Utc};

use crate::models::candidate::{Candidate, CandidateProgress, CandidateStatus, StepStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepAction {
    Next,
    Reject,
    Update,
    Back,
    Unreject,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// NEXT and REJECT record an outcome and must say why.
    #[error("feedback is required for this action")]
    MissingFeedback,

    /// The caller passed an index outside the step list. The UI gates on the
    /// list it was served, so this is a programming error upstream.
    #[error("step index {index} is out of range for {len} steps")]
    StepOutOfRange { index: usize, len: usize },

    #[error("candidate is closed; reopen it before advancing")]
    CandidateClosed,

    #[error("step {0} is not the step awaiting action")]
    StepNotCurrent(usize),

    #[error("the preceding step must be completed first")]
    PreviousStepIncomplete,

    #[error("feedback can only be updated on a completed or rejected step")]
    StepNotTerminal(usize),

    #[error("cannot move back from the first step")]
    BackFromFirstStep,

    #[error("step {0} is not rejected")]
    StepNotRejected(usize),
}

impl TransitionError {
    /// Recoverable errors are caller mistakes the UI can surface inline;
    /// everything else indicates a broken caller.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, TransitionError::StepOutOfRange { .. })
    }
}

/// Apply one pipeline action to the candidate, in place.
///
/// On error the candidate is left exactly as it was. `now` stamps step
/// completion times so callers (and tests) control the clock.
pub fn apply_step_action(
    candidate: &mut Candidate,
    step_index: usize,
    action: StepAction,
    feedback: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), TransitionError> {
    let len = candidate.steps.len();
    if step_index >= len {
        return Err(TransitionError::StepOutOfRange {
            index: step_index,
            len,
        });
    }

    match action {
        StepAction::Next => {
            let feedback = require_feedback(feedback)?;
            if candidate.status != CandidateStatus::Open {
                return Err(TransitionError::CandidateClosed);
            }
            if step_index != candidate.current_step as usize {
                return Err(TransitionError::StepNotCurrent(step_index));
            }
            if step_index > 0 {
                let previous = candidate
                    .steps
                    .get(step_index - 1)
                    .expect("index checked against len");
                if previous.status != StepStatus::Completed {
                    return Err(TransitionError::PreviousStepIncomplete);
                }
            }

            let step = candidate
                .steps
                .get_mut(step_index)
                .expect("index checked against len");
            step.status = StepStatus::Completed;
            step.feedback = Some(feedback.to_string());
            step.completed_at = Some(now);

            if step_index + 1 < len {
                candidate.current_step = (step_index + 1) as i32;
            } else {
                // Final step done: the cursor stays on the last index and the
                // candidate leaves the active pipeline.
                candidate.status = CandidateStatus::Closed;
            }
        }

        StepAction::Reject => {
            let feedback = require_feedback(feedback)?;

            let step = candidate
                .steps
                .get_mut(step_index)
                .expect("index checked against len");
            step.status = StepStatus::Rejected;
            step.feedback = Some(feedback.to_string());
            step.completed_at = Some(now);

            candidate.status = CandidateStatus::Closed;
            candidate.progress = CandidateProgress::Rejected;
        }

        StepAction::Update => {
            let step = candidate
                .steps
                .get_mut(step_index)
                .expect("index checked against len");
            if !step.status.is_terminal() {
                return Err(TransitionError::StepNotTerminal(step_index));
            }
            // Only the feedback text changes; status and timestamp stay put.
            if let Some(feedback) = feedback {
                let trimmed = feedback.trim();
                if !trimmed.is_empty() {
                    step.feedback = Some(trimmed.to_string());
                }
            }
        }

        StepAction::Back => {
            if step_index == 0 {
                return Err(TransitionError::BackFromFirstStep);
            }

            let step = candidate
                .steps
                .get_mut(step_index)
                .expect("index checked against len");
            step.reset();

            // The step being returned to loses its completion as well, so the
            // pipeline reads as if it had never advanced past it.
            let previous = candidate
                .steps
                .get_mut(step_index - 1)
                .expect("step_index > 0");
            previous.reset();

            candidate.current_step = (step_index - 1) as i32;
        }

        StepAction::Unreject => {
            let step = candidate
                .steps
                .get_mut(step_index)
                .expect("index checked against len");
            if step.status != StepStatus::Rejected {
                return Err(TransitionError::StepNotRejected(step_index));
            }
            step.reset();

            candidate.status = CandidateStatus::Open;
            candidate.progress = CandidateProgress::Pending;
            candidate.current_step = step_index as i32;
        }
    }

    Ok(())
}

fn require_feedback(feedback: Option<&str>) -> Result<&str, TransitionError> {
    match feedback.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => Ok(trimmed),
        _ => Err(TransitionError::MissingFeedback),
    }
}

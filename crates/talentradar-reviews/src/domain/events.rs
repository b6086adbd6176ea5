//! Domain events for the Reviews context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use talentradar_core::event::EventPayload;
use uuid::Uuid;

/// Event type for [`FeedbackCreated`].
pub const FEEDBACK_CREATED_EVENT_TYPE: &str = "feedback.created";
/// Event type for [`FeedbackDetailsCreated`].
pub const FEEDBACK_DETAILS_CREATED_EVENT_TYPE: &str = "feedback.details_created";
/// Event type for [`FeedbackDetailsUpdated`].
pub const FEEDBACK_DETAILS_UPDATED_EVENT_TYPE: &str = "feedback.details_updated";
/// Event type for [`FeedbackSubmitted`].
pub const FEEDBACK_SUBMITTED_EVENT_TYPE: &str = "feedback.submitted";
/// Event type for [`FeedbackSummaryCreated`].
pub const FEEDBACK_SUMMARY_CREATED_EVENT_TYPE: &str = "feedback.summary_created";
/// Event type for [`FeedbackSummaryUpdated`].
pub const FEEDBACK_SUMMARY_UPDATED_EVENT_TYPE: &str = "feedback.summary_updated";

/// Event type for [`CycleCreated`].
pub const CYCLE_CREATED_EVENT_TYPE: &str = "cycle.created";

/// Emitted when feedback about an employee is requested from someone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackCreated {
    /// The feedback identifier.
    pub id: Uuid,
    /// The owning organization.
    pub organization_id: Uuid,
    /// The employee the feedback is about.
    pub employee_id: Uuid,
    /// The user who requested it.
    pub owner_id: Option<Uuid>,
    /// Who is asked to give feedback.
    pub email: String,
    /// Access code for the feedback form.
    pub code: String,
    /// Deadline for submission.
    pub collection_end_at: DateTime<Utc>,
}

/// Emitted the first time a reviewer saves their answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackDetailsCreated {
    /// The details record identifier.
    pub id: Uuid,
    /// The employee the feedback is about.
    pub employee_id: Uuid,
}

/// Emitted whenever a reviewer saves their answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackDetailsUpdated {
    /// What the employee does well.
    pub strengths: String,
    /// Where the employee can grow.
    pub opportunities: String,
    /// Anything else.
    pub additional: String,
    /// Whether the reviewer felt they had enough to go on.
    pub enough_data: bool,
    /// Overall rating, 0 to 5.
    pub rating: i32,
}

/// Emitted when the reviewer submits. The submission time is the event
/// time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSubmitted {}

/// Emitted the first time a summary is generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSummaryCreated {
    /// The summary record identifier.
    pub id: Uuid,
}

/// Emitted whenever a summary is generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSummaryUpdated {
    /// Prose summary of the feedback.
    pub summary: String,
    /// Follow-up items for the manager.
    pub action_items: Vec<String>,
}

/// Event payload variants for feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeedbackEvent {
    /// Feedback has been requested.
    Created(FeedbackCreated),
    /// Answers have been saved for the first time.
    DetailsCreated(FeedbackDetailsCreated),
    /// Answers have been saved.
    DetailsUpdated(FeedbackDetailsUpdated),
    /// The reviewer has submitted.
    Submitted(FeedbackSubmitted),
    /// A summary has been generated for the first time.
    SummaryCreated(FeedbackSummaryCreated),
    /// A summary has been generated.
    SummaryUpdated(FeedbackSummaryUpdated),
}

impl EventPayload for FeedbackEvent {
    const EVENT_TYPES: &'static [&'static str] = &[
        FEEDBACK_CREATED_EVENT_TYPE,
        FEEDBACK_DETAILS_CREATED_EVENT_TYPE,
        FEEDBACK_DETAILS_UPDATED_EVENT_TYPE,
        FEEDBACK_SUBMITTED_EVENT_TYPE,
        FEEDBACK_SUMMARY_CREATED_EVENT_TYPE,
        FEEDBACK_SUMMARY_UPDATED_EVENT_TYPE,
    ];

    fn event_type(&self) -> &'static str {
        match self {
            Self::Created(_) => FEEDBACK_CREATED_EVENT_TYPE,
            Self::DetailsCreated(_) => FEEDBACK_DETAILS_CREATED_EVENT_TYPE,
            Self::DetailsUpdated(_) => FEEDBACK_DETAILS_UPDATED_EVENT_TYPE,
            Self::Submitted(_) => FEEDBACK_SUBMITTED_EVENT_TYPE,
            Self::SummaryCreated(_) => FEEDBACK_SUMMARY_CREATED_EVENT_TYPE,
            Self::SummaryUpdated(_) => FEEDBACK_SUMMARY_UPDATED_EVENT_TYPE,
        }
    }
}

/// Emitted when a review cycle is opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleCreated {
    /// The cycle identifier.
    pub id: Uuid,
    /// The user who opened it.
    pub owner_id: Option<Uuid>,
    /// The owning organization.
    pub organization_id: Uuid,
    /// Free-form kind, e.g. `quarterly`.
    pub cycle_type: String,
    /// Window start.
    pub start_at: DateTime<Utc>,
    /// Window end.
    pub end_at: DateTime<Utc>,
}

/// Event payload variants for cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CycleEvent {
    /// A cycle has been created.
    Created(CycleCreated),
}

impl EventPayload for CycleEvent {
    const EVENT_TYPES: &'static [&'static str] = &[CYCLE_CREATED_EVENT_TYPE];

    fn event_type(&self) -> &'static str {
        match self {
            Self::Created(_) => CYCLE_CREATED_EVENT_TYPE,
        }
    }
}

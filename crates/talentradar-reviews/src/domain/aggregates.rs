//! Aggregate roots for the Reviews context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use talentradar_core::aggregate::Aggregate;
use talentradar_core::event::Event;
use uuid::Uuid;

use super::events::{CycleEvent, FeedbackEvent};

/// A reviewer's answers. Owned by [`Feedback`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackDetails {
    /// Record identifier.
    pub id: Uuid,
    /// The employee the feedback is about.
    pub employee_id: Uuid,
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
    /// When the answers were last saved.
    pub updated_at: Option<DateTime<Utc>>,
}

/// A generated summary of the answers. Owned by [`Feedback`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSummary {
    /// Record identifier.
    pub id: Uuid,
    /// Prose summary.
    pub summary: String,
    /// Follow-up items for the manager.
    pub action_items: Vec<String>,
}

/// One request for feedback about one employee, sent to one reviewer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    /// Aggregate identifier.
    pub id: Uuid,
    /// The user who requested it.
    pub owner_id: Option<Uuid>,
    /// The employee the feedback is about.
    pub employee_id: Uuid,
    /// Owning tenant.
    pub organization_id: Uuid,
    /// The reviewer.
    pub email: String,
    /// Access code for the feedback form.
    pub code: String,
    /// Set once the reviewer submits.
    pub submitted_at: Option<DateTime<Utc>>,
    /// Deadline for submission.
    pub collection_end_at: DateTime<Utc>,
    /// The reviewer's answers, once saved.
    pub details: Option<FeedbackDetails>,
    /// The generated summary, once available.
    pub summary: Option<FeedbackSummary>,
    /// When the request was created.
    pub created_at: Option<DateTime<Utc>>,
    /// When anything last changed.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Feedback {
    /// `true` once the reviewer has submitted.
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.submitted_at.is_some()
    }
}

impl Aggregate for Feedback {
    const AGGREGATE_TYPE: &'static str = "feedback";
    const TOPIC: &'static str = "events.feedback";
    const TABLE_NAME: &'static str = "feedbacks";
    type Event = FeedbackEvent;

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn organization_id(&self) -> Option<Uuid> {
        (!self.organization_id.is_nil()).then_some(self.organization_id)
    }

    fn apply(&mut self, event: &Event<FeedbackEvent>) {
        match &event.data {
            FeedbackEvent::Created(payload) => {
                self.id = payload.id;
                self.organization_id = payload.organization_id;
                self.employee_id = payload.employee_id;
                self.owner_id = payload.owner_id;
                self.email.clone_from(&payload.email);
                self.code.clone_from(&payload.code);
                self.collection_end_at = payload.collection_end_at;
                self.created_at = Some(event.created_at);
            }
            FeedbackEvent::DetailsCreated(payload) => {
                self.details = Some(FeedbackDetails {
                    id: payload.id,
                    employee_id: payload.employee_id,
                    ..FeedbackDetails::default()
                });
            }
            FeedbackEvent::DetailsUpdated(payload) => {
                let details = self.details.get_or_insert_with(FeedbackDetails::default);
                details.strengths.clone_from(&payload.strengths);
                details.opportunities.clone_from(&payload.opportunities);
                details.additional.clone_from(&payload.additional);
                details.enough_data = payload.enough_data;
                details.rating = payload.rating;
                details.updated_at = Some(event.created_at);
            }
            FeedbackEvent::Submitted(_) => {
                self.submitted_at = Some(event.created_at);
            }
            FeedbackEvent::SummaryCreated(payload) => {
                self.summary = Some(FeedbackSummary {
                    id: payload.id,
                    ..FeedbackSummary::default()
                });
            }
            FeedbackEvent::SummaryUpdated(payload) => {
                let summary = self.summary.get_or_insert_with(FeedbackSummary::default);
                summary.summary.clone_from(&payload.summary);
                summary.action_items.clone_from(&payload.action_items);
            }
        }
        self.updated_at = Some(event.created_at);
    }
}

/// A review period opened by a manager.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    /// Aggregate identifier.
    pub id: Uuid,
    /// The user who opened it.
    pub owner_id: Option<Uuid>,
    /// Owning tenant.
    pub organization_id: Uuid,
    /// Free-form kind.
    pub cycle_type: String,
    /// Window start.
    pub start_at: DateTime<Utc>,
    /// Window end.
    pub end_at: DateTime<Utc>,
    /// When the cycle was created.
    pub created_at: Option<DateTime<Utc>>,
    /// When the cycle last changed.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Cycle {
    /// `true` when this cycle's window intersects `[start_at, end_at)`.
    #[must_use]
    pub fn overlaps(&self, start_at: DateTime<Utc>, end_at: DateTime<Utc>) -> bool {
        self.start_at < end_at && self.end_at > start_at
    }
}

impl Aggregate for Cycle {
    const AGGREGATE_TYPE: &'static str = "cycle";
    const TOPIC: &'static str = "events.cycles";
    const TABLE_NAME: &'static str = "cycles";
    type Event = CycleEvent;

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn organization_id(&self) -> Option<Uuid> {
        (!self.organization_id.is_nil()).then_some(self.organization_id)
    }

    fn apply(&mut self, event: &Event<CycleEvent>) {
        match &event.data {
            CycleEvent::Created(payload) => {
                self.id = payload.id;
                self.owner_id = payload.owner_id;
                self.organization_id = payload.organization_id;
                self.cycle_type.clone_from(&payload.cycle_type);
                self.start_at = payload.start_at;
                self.end_at = payload.end_at;
                self.created_at = Some(event.created_at);
            }
        }
        self.updated_at = Some(event.created_at);
    }
}

//! Command abstractions.

use std::fmt::Debug;

use async_trait::async_trait;
use uuid::Uuid;

use crate::aggregate::{Aggregate, AggregateRoot};
use crate::clock::Clock;
use crate::context::Context;
use crate::error::DomainError;
use crate::event::{Event, EventPayload, Metadata};
use crate::identity::Identity;

/// A unit of intent executed against one aggregate by
/// [`call`](crate::executor::call).
#[async_trait]
pub trait Command: Send + Sync + Debug {
    /// The aggregate this command runs against.
    type Aggregate: Aggregate;

    /// The type name for this command (for logging).
    fn command_type(&self) -> &'static str;

    /// Precondition check against the current state. Must not mutate.
    ///
    /// A failure aborts the call before anything is recorded.
    async fn validate(&self, _ctx: &Context, _aggregate: &Self::Aggregate) -> Result<(), DomainError> {
        Ok(())
    }

    /// Decides what happened and records it through `changes`.
    ///
    /// May read other aggregates through the context's repository, but must
    /// not persist anything itself.
    async fn perform(
        &self,
        ctx: &Context,
        changes: &mut Changes<'_, Self::Aggregate>,
    ) -> Result<(), DomainError>;
}

/// Recording handle given to [`Command::perform`].
///
/// [`apply`](Changes::apply) is the only way a command changes the
/// aggregate: it builds the event envelope, folds it into the state and
/// buffers it for persistence.
pub struct Changes<'a, A: Aggregate> {
    root: &'a mut AggregateRoot<A>,
    metadata: &'a Metadata,
    identity: &'a Identity,
    clock: &'a dyn Clock,
}

impl<'a, A: Aggregate> Changes<'a, A> {
    pub(crate) fn new(
        root: &'a mut AggregateRoot<A>,
        metadata: &'a Metadata,
        identity: &'a Identity,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            root,
            metadata,
            identity,
            clock,
        }
    }

    /// Current fields, including every event applied so far in this call.
    #[must_use]
    pub fn state(&self) -> &A {
        self.root.state()
    }

    /// Events recorded so far in this call.
    #[must_use]
    pub fn pending(&self) -> &[Event<A::Event>] {
        self.root.pending_events()
    }

    /// Records `payload` as the next event of the aggregate.
    pub fn apply(&mut self, payload: A::Event) {
        let event = Event {
            id: Uuid::new_v4(),
            aggregate_id: self.root.id(),
            aggregate_type: A::AGGREGATE_TYPE.to_owned(),
            event_type: payload.event_type().to_owned(),
            version: self.root.next_version(),
            data: payload,
            metadata: self.metadata.clone(),
            organization_id: self.identity.organization_id,
            user_id: self.identity.user_id,
            created_at: self.clock.now(),
        };
        self.root.record(event);
    }

    /// Replaces the working aggregate with one loaded from storage.
    ///
    /// Supports find-or-create commands: when an existing aggregate already
    /// satisfies the intent, the caller's handle ends up pointing at it and
    /// nothing is recorded.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if events were already recorded in
    /// this call.
    pub fn adopt(&mut self, existing: AggregateRoot<A>) -> Result<(), DomainError> {
        if !self.root.pending_events().is_empty() {
            return Err(DomainError::validation(
                "cannot adopt an aggregate after recording events",
            ));
        }
        *self.root = existing;
        Ok(())
    }
}

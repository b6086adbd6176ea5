//! Aggregate abstraction.

use std::fmt::Debug;

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::DomainError;
use crate::event::{Event, EventPayload};

/// A domain object whose fields are derived entirely by folding its events.
///
/// The implementing type is the aggregate's state. It is also the snapshot
/// document, so it must round-trip through serde.
///
/// # Contract
///
/// [`apply`](Aggregate::apply) must be deterministic and total: the same
/// event sequence always yields the same fields, and it never fails. Any
/// check that can fail belongs in the command, before the event exists.
pub trait Aggregate:
    Default + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Type name stored alongside every event (e.g. `organization`).
    const AGGREGATE_TYPE: &'static str;

    /// Event-stream name.
    const TOPIC: &'static str;

    /// Snapshot table.
    const TABLE_NAME: &'static str;

    /// The payload variants this aggregate produces and consumes.
    type Event: EventPayload;

    /// Returns the aggregate identifier, nil before the creation event.
    fn id(&self) -> Uuid;

    /// Overwrites the identifier. Only storage adapters call this, to stamp
    /// the primary key onto a loaded snapshot.
    fn set_id(&mut self, id: Uuid);

    /// Tenant the aggregate belongs to, used to scope snapshot lookups.
    fn organization_id(&self) -> Option<Uuid> {
        None
    }

    /// Folds one event into the current fields.
    fn apply(&mut self, event: &Event<Self::Event>);
}

/// An aggregate's state together with the runtime bookkeeping around it:
/// the committed version and the events recorded but not yet persisted.
///
/// This is the handle callers pass to [`call`](crate::executor::call).
#[derive(Debug, Clone)]
pub struct AggregateRoot<A: Aggregate> {
    state: A,
    version: i64,
    pending: Vec<Event<A::Event>>,
}

impl<A: Aggregate> Default for AggregateRoot<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Aggregate> AggregateRoot<A> {
    /// A fresh, never-persisted aggregate.
    #[must_use]
    pub fn new() -> Self {
        Self::from_snapshot(A::default(), 0)
    }

    /// Wraps state loaded from a snapshot at `version`.
    #[must_use]
    pub fn from_snapshot(state: A, version: i64) -> Self {
        Self {
            state,
            version,
            pending: Vec::new(),
        }
    }

    /// Rebuilds an aggregate by folding its full history in order.
    #[must_use]
    pub fn from_history(events: &[Event<A::Event>]) -> Self {
        let mut state = A::default();
        let mut version = 0;
        for event in events {
            state.apply(event);
            version = event.version;
        }
        Self::from_snapshot(state, version)
    }

    /// Current fields.
    #[must_use]
    pub fn state(&self) -> &A {
        &self.state
    }

    /// Consumes the root, returning the fields.
    #[must_use]
    pub fn into_state(self) -> A {
        self.state
    }

    /// Aggregate identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.state.id()
    }

    /// String form of the identifier, for storage-agnostic code.
    #[must_use]
    pub fn get_id(&self) -> String {
        self.state.id().to_string()
    }

    /// Parses and stamps a string-form identifier.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `id` is not a UUID.
    pub fn set_id(&mut self, id: &str) -> Result<(), DomainError> {
        let id = Uuid::parse_str(id)
            .map_err(|e| DomainError::Validation(format!("invalid aggregate id {id:?}: {e}")))?;
        self.state.set_id(id);
        Ok(())
    }

    /// Version of the last persisted event (0 when never persisted).
    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Version the next recorded event will carry.
    #[allow(clippy::cast_possible_wrap)]
    #[must_use]
    pub fn next_version(&self) -> i64 {
        self.version + self.pending.len() as i64 + 1
    }

    /// Events recorded by the running command, not yet persisted.
    #[must_use]
    pub fn pending_events(&self) -> &[Event<A::Event>] {
        &self.pending
    }

    /// `true` while the identity is still the nil UUID.
    #[must_use]
    pub fn is_new_record(&self) -> bool {
        self.state.id().is_nil()
    }

    /// Event-stream name of `A`.
    #[must_use]
    pub fn topic(&self) -> &'static str {
        A::TOPIC
    }

    /// Snapshot table of `A`.
    #[must_use]
    pub fn table_name(&self) -> &'static str {
        A::TABLE_NAME
    }

    /// Applies an event and buffers it as pending.
    pub(crate) fn record(&mut self, mut event: Event<A::Event>) {
        self.state.apply(&event);
        // Creation events carry the identity they assign.
        if event.aggregate_id.is_nil() {
            event.aggregate_id = self.state.id();
        }
        if event.organization_id.is_none() {
            event.organization_id = self.state.organization_id();
        }
        self.pending.push(event);
    }

    /// Marks every pending event as persisted and hands them back.
    #[allow(clippy::cast_possible_wrap)]
    pub(crate) fn mark_committed(&mut self) -> Vec<Event<A::Event>> {
        self.version += self.pending.len() as i64;
        std::mem::take(&mut self.pending)
    }
}

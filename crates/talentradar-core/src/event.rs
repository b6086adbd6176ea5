//! Domain event abstractions.

use std::collections::BTreeMap;
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::repository::StoredEvent;

/// Audit context attached to every event recorded by one command
/// invocation: actor, request correlation, source.
///
/// Metadata is carried for traceability only. Nothing in the runtime or the
/// domains branches on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, serde_json::Value>);

impl Metadata {
    /// Key under which the acting user is recorded.
    pub const ACTOR: &'static str = "actor";
    /// Key under which the request correlation ID is recorded.
    pub const CORRELATION_ID: &'static str = "correlation_id";
    /// Key under which the originating surface (cli, api, subscription) is
    /// recorded.
    pub const SOURCE: &'static str = "source";

    /// Creates empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an arbitrary entry.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Records the acting user.
    #[must_use]
    pub fn with_actor(self, actor: Uuid) -> Self {
        self.with(Self::ACTOR, actor.to_string())
    }

    /// Records the request correlation ID.
    #[must_use]
    pub fn with_correlation_id(self, correlation_id: Uuid) -> Self {
        self.with(Self::CORRELATION_ID, correlation_id.to_string())
    }

    /// Records the originating surface.
    #[must_use]
    pub fn with_source(self, source: &str) -> Self {
        self.with(Self::SOURCE, source)
    }

    /// Looks up an entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Returns `true` when no entries are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The closed set of payload variants an aggregate produces and consumes.
///
/// Implemented by one `enum` per aggregate; `apply` matches on it
/// exhaustively.
pub trait EventPayload:
    Serialize + DeserializeOwned + Clone + Debug + PartialEq + Send + Sync + 'static
{
    /// Every event type name this payload can carry. Subscriptions are
    /// checked against this list at registration.
    const EVENT_TYPES: &'static [&'static str];

    /// Returns the event type name of this variant (e.g. `user.invited`).
    fn event_type(&self) -> &'static str;
}

/// One fact in an aggregate's history.
#[derive(Debug, Clone, PartialEq)]
pub struct Event<P> {
    /// Unique event identifier.
    pub id: Uuid,
    /// Aggregate this event belongs to.
    pub aggregate_id: Uuid,
    /// Type name of the owning aggregate.
    pub aggregate_type: String,
    /// Discriminator naming the payload variant.
    pub event_type: String,
    /// Ordinal within the aggregate stream, starting at 1.
    pub version: i64,
    /// Typed payload.
    pub data: P,
    /// Caller-supplied audit context.
    pub metadata: Metadata,
    /// Tenant the event was recorded under.
    pub organization_id: Option<Uuid>,
    /// User that issued the command.
    pub user_id: Option<Uuid>,
    /// Timestamp of event creation.
    pub created_at: DateTime<Utc>,
}

impl<P: EventPayload> Event<P> {
    /// Serializes this event into its storage representation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the payload cannot be
    /// serialized.
    pub fn to_stored(&self) -> Result<StoredEvent, DomainError> {
        Ok(StoredEvent {
            id: self.id,
            aggregate_id: self.aggregate_id,
            aggregate_type: self.aggregate_type.clone(),
            event_type: self.event_type.clone(),
            version: self.version,
            data: serde_json::to_value(&self.data)?,
            metadata: self.metadata.clone(),
            organization_id: self.organization_id,
            user_id: self.user_id,
            created_at: self.created_at,
        })
    }

    /// Rebuilds a typed event from its storage representation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the payload does not
    /// deserialize into `P`.
    pub fn from_stored(stored: &StoredEvent) -> Result<Self, DomainError> {
        let data: P = serde_json::from_value(stored.data.clone()).map_err(|e| {
            DomainError::Infrastructure(format!(
                "event {} ({}) deserialization failed: {e}",
                stored.id, stored.event_type
            ))
        })?;
        Ok(Self {
            id: stored.id,
            aggregate_id: stored.aggregate_id,
            aggregate_type: stored.aggregate_type.clone(),
            event_type: stored.event_type.clone(),
            version: stored.version,
            data,
            metadata: stored.metadata.clone(),
            organization_id: stored.organization_id,
            user_id: stored.user_id,
            created_at: stored.created_at,
        })
    }
}

//! Persistence contract: the event log and the snapshot tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::{Aggregate, AggregateRoot};
use crate::error::DomainError;
use crate::event::{Event, Metadata};

/// Stored representation of a domain event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// Aggregate this event belongs to.
    pub aggregate_id: Uuid,
    /// Type name of the owning aggregate.
    pub aggregate_type: String,
    /// Event type name for deserialization routing.
    pub event_type: String,
    /// Ordinal within the aggregate stream.
    pub version: i64,
    /// Serialized event payload.
    pub data: serde_json::Value,
    /// Audit metadata.
    pub metadata: Metadata,
    /// Tenant the event was recorded under.
    pub organization_id: Option<Uuid>,
    /// User that issued the command.
    pub user_id: Option<Uuid>,
    /// Timestamp of event creation.
    pub created_at: DateTime<Utc>,
}

/// The materialized current-state row of one aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Primary key, equal to the aggregate identifier.
    pub id: Uuid,
    /// Table the row lives in.
    pub table: String,
    /// Tenant column, used by scoped lookups.
    pub organization_id: Option<Uuid>,
    /// Version of the last event folded into `state`.
    pub version: i64,
    /// The aggregate's fields.
    pub state: serde_json::Value,
    /// When the row was first written.
    pub created_at: DateTime<Utc>,
    /// When the row was last written.
    pub updated_at: DateTime<Utc>,
}

impl Snapshot {
    /// Captures the state of `root` including its pending events.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the state cannot be
    /// serialized.
    pub fn capture<A: Aggregate>(
        root: &AggregateRoot<A>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id: root.id(),
            table: A::TABLE_NAME.to_owned(),
            organization_id: root.state().organization_id(),
            version: root.next_version() - 1,
            state: serde_json::to_value(root.state())?,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds an aggregate root from this row.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if `state` does not deserialize
    /// into `A`.
    pub fn restore<A: Aggregate>(&self) -> Result<AggregateRoot<A>, DomainError> {
        let mut state: A = serde_json::from_value(self.state.clone()).map_err(|e| {
            DomainError::Infrastructure(format!(
                "snapshot {}/{} deserialization failed: {e}",
                self.table, self.id
            ))
        })?;
        state.set_id(self.id);
        Ok(AggregateRoot::from_snapshot(state, self.version))
    }
}

/// A snapshot upsert guarded by the version the writer last saw.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotWrite {
    /// The row to write.
    pub snapshot: Snapshot,
    /// The stored version this write replaces (0 for a new record).
    pub expected_version: i64,
}

/// Anything a transaction can persist.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Append to the event log.
    Event(StoredEvent),
    /// Upsert into the aggregate's snapshot table.
    Snapshot(SnapshotWrite),
}

/// Returns `true` when `record` must be inserted rather than updated.
///
/// Events are always new. A snapshot is new while the aggregate it was
/// captured from had never been persisted.
#[must_use]
pub fn is_new_record(record: &Record) -> bool {
    match record {
        Record::Event(_) => true,
        Record::Snapshot(write) => write.expected_version == 0,
    }
}

/// Equality lookup over snapshot rows of one table.
///
/// Not a query language: this is only what command validation and
/// subscriptions need to find related aggregates.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotQuery {
    /// Table to search.
    pub table: String,
    /// Tenant predicate. `None` searches every tenant.
    pub organization_id: Option<Uuid>,
    /// Top-level state fields that must equal the given values.
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl SnapshotQuery {
    /// Every row of `A`'s table, across tenants.
    #[must_use]
    pub fn for_aggregate<A: Aggregate>() -> Self {
        Self {
            table: A::TABLE_NAME.to_owned(),
            organization_id: None,
            fields: serde_json::Map::new(),
        }
    }

    /// Restricts the search to one tenant.
    #[must_use]
    pub fn in_organization(mut self, organization_id: Uuid) -> Self {
        self.organization_id = Some(organization_id);
        self
    }

    /// Requires `field` to equal `value`.
    #[must_use]
    pub fn where_eq(mut self, field: &str, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(field.to_owned(), value.into());
        self
    }

    /// Returns `true` when `snapshot` satisfies every predicate.
    #[must_use]
    pub fn matches(&self, snapshot: &Snapshot) -> bool {
        snapshot.table == self.table
            && self
                .organization_id
                .is_none_or(|org| snapshot.organization_id == Some(org))
            && self
                .fields
                .iter()
                .all(|(field, value)| snapshot.state.get(field) == Some(value))
    }
}

/// Storage adapter for the event log and snapshot tables.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Loads a snapshot row by primary key.
    async fn load(&self, table: &str, id: Uuid) -> Result<Option<Snapshot>, DomainError>;

    /// Loads every event of an aggregate, ordered by version.
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError>;

    /// Finds snapshot rows matching `query`.
    async fn find(&self, query: &SnapshotQuery) -> Result<Vec<Snapshot>, DomainError>;

    /// Opens a transaction. Dropping it without committing rolls it back.
    async fn begin(&self) -> Result<Box<dyn Transaction>, DomainError>;
}

/// A unit of work spanning the event-log append and the snapshot upsert.
#[async_trait]
pub trait Transaction: Send {
    /// Persists an event or a snapshot.
    ///
    /// Snapshot writes fail with `DomainError::ConcurrencyConflict` when the
    /// stored version differs from `expected_version`, as do events whose
    /// version is already taken.
    async fn save(&mut self, record: Record) -> Result<(), DomainError>;

    /// Makes every saved record durable.
    async fn commit(self: Box<Self>) -> Result<(), DomainError>;

    /// Discards every saved record.
    async fn rollback(self: Box<Self>) -> Result<(), DomainError>;
}

/// Loads an aggregate from its snapshot.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` on storage or deserialization
/// failure. A missing row is `Ok(None)`.
pub async fn load_aggregate<A: Aggregate>(
    repo: &dyn Repository,
    id: Uuid,
) -> Result<Option<AggregateRoot<A>>, DomainError> {
    repo.load(A::TABLE_NAME, id)
        .await?
        .map(|snapshot| snapshot.restore())
        .transpose()
}

/// Loads an aggregate that must exist.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` when no snapshot exists.
pub async fn load_required<A: Aggregate>(
    repo: &dyn Repository,
    id: Uuid,
) -> Result<AggregateRoot<A>, DomainError> {
    load_aggregate(repo, id)
        .await?
        .ok_or(DomainError::AggregateNotFound(id))
}

/// Rebuilds an aggregate by replaying its log instead of reading the
/// snapshot.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if any event fails to deserialize.
pub async fn replay<A: Aggregate>(
    repo: &dyn Repository,
    id: Uuid,
) -> Result<Option<AggregateRoot<A>>, DomainError> {
    let stored = repo.load_events(id).await?;
    if stored.is_empty() {
        return Ok(None);
    }
    let events = stored
        .iter()
        .map(Event::<A::Event>::from_stored)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(AggregateRoot::from_history(&events)))
}

/// Finds aggregates of type `A` matching `query`.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` on storage or deserialization
/// failure.
pub async fn find_aggregates<A: Aggregate>(
    repo: &dyn Repository,
    query: &SnapshotQuery,
) -> Result<Vec<AggregateRoot<A>>, DomainError> {
    repo.find(query)
        .await?
        .iter()
        .map(Snapshot::restore)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(org: Option<Uuid>, state: serde_json::Value) -> Snapshot {
        let now = Utc::now();
        Snapshot {
            id: Uuid::new_v4(),
            table: "employees".to_owned(),
            organization_id: org,
            version: 1,
            state,
            created_at: now,
            updated_at: now,
        }
    }

    fn query() -> SnapshotQuery {
        SnapshotQuery {
            table: "employees".to_owned(),
            organization_id: None,
            fields: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_query_matches_on_tenant_and_fields() {
        let org = Uuid::new_v4();
        let row = snapshot(Some(org), serde_json::json!({ "email": "a@b.co", "level": 3 }));

        assert!(query().matches(&row));
        assert!(query().in_organization(org).matches(&row));
        assert!(query().where_eq("email", "a@b.co").where_eq("level", 3).matches(&row));
        assert!(!query().in_organization(Uuid::new_v4()).matches(&row));
        assert!(!query().where_eq("email", "x@b.co").matches(&row));
        assert!(!query().where_eq("missing", "a").matches(&row));
    }

    #[test]
    fn test_query_compares_nested_values_whole() {
        // Arrange
        let row = snapshot(
            None,
            serde_json::json!({ "tags": ["a", "b"], "owner": { "id": 1, "name": "x" } }),
        );

        // Act
        let subset_tags = query().where_eq("tags", serde_json::json!(["a"]));
        let subset_owner = query().where_eq("owner", serde_json::json!({ "id": 1 }));
        let exact = query()
            .where_eq("tags", serde_json::json!(["a", "b"]))
            .where_eq("owner", serde_json::json!({ "id": 1, "name": "x" }));

        // Assert
        assert!(!subset_tags.matches(&row));
        assert!(!subset_owner.matches(&row));
        assert!(exact.matches(&row));
    }

    #[test]
    fn test_query_ignores_other_tables() {
        let mut row = snapshot(None, serde_json::json!({}));
        row.table = "teams".to_owned();

        assert!(!query().matches(&row));
    }

    #[test]
    fn test_is_new_record_for_snapshot_depends_on_expected_version() {
        let row = snapshot(None, serde_json::json!({}));

        let insert = Record::Snapshot(SnapshotWrite {
            snapshot: row.clone(),
            expected_version: 0,
        });
        let update = Record::Snapshot(SnapshotWrite {
            snapshot: row,
            expected_version: 4,
        });

        assert!(is_new_record(&insert));
        assert!(!is_new_record(&update));
    }
}

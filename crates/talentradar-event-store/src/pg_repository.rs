//! `PostgreSQL` implementation of the `Repository` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};
use tracing::{debug, instrument};
use uuid::Uuid;

use talentradar_core::error::DomainError;
use talentradar_core::event::Metadata;
use talentradar_core::repository::{
    Record, Repository, Snapshot, SnapshotQuery, SnapshotWrite, StoredEvent, Transaction,
    is_new_record,
};

use crate::schema::is_valid_identifier;

/// PostgreSQL-backed repository over the `events` table and the snapshot
/// tables.
#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    /// Creates a new `PgRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    aggregate_id: Uuid,
    aggregate_type: String,
    version: i64,
    #[sqlx(rename = "type")]
    event_type: String,
    data: serde_json::Value,
    metadata: Json<Metadata>,
    organization_id: Option<Uuid>,
    user_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<EventRow> for StoredEvent {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id,
            aggregate_id: row.aggregate_id,
            aggregate_type: row.aggregate_type,
            event_type: row.event_type,
            version: row.version,
            data: row.data,
            metadata: row.metadata.0,
            organization_id: row.organization_id,
            user_id: row.user_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SnapshotRow {
    id: Uuid,
    organization_id: Option<Uuid>,
    version: i64,
    state: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SnapshotRow {
    fn into_snapshot(self, table: &str) -> Snapshot {
        Snapshot {
            id: self.id,
            table: table.to_owned(),
            organization_id: self.organization_id,
            version: self.version,
            state: self.state,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn infrastructure(err: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(format!("database error: {err}"))
}

fn checked_table(table: &str) -> Result<&str, DomainError> {
    if is_valid_identifier(table) {
        Ok(table)
    } else {
        Err(DomainError::Infrastructure(format!(
            "invalid snapshot table name {table:?}"
        )))
    }
}

const EVENT_COLUMNS: &str =
    "id, aggregate_id, aggregate_type, version, type, data, metadata, organization_id, user_id, created_at";

const SNAPSHOT_COLUMNS: &str = "id, organization_id, version, state, created_at, updated_at";

#[async_trait]
impl Repository for PgRepository {
    #[instrument(skip(self))]
    async fn load(&self, table: &str, id: Uuid) -> Result<Option<Snapshot>, DomainError> {
        let table = checked_table(table)?;
        let row = sqlx::query_as::<_, SnapshotRow>(&format!(
            "SELECT {SNAPSHOT_COLUMNS} FROM {table} WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(infrastructure)?;

        Ok(row.map(|r| r.into_snapshot(table)))
    }

    #[instrument(skip(self))]
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE aggregate_id = $1 ORDER BY version ASC"
        ))
        .bind(aggregate_id)
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;

        Ok(rows.into_iter().map(StoredEvent::from).collect())
    }

    /// Each field must equal its value as a whole, like
    /// [`SnapshotQuery::matches`]; arrays and objects are not matched by
    /// containment.
    #[instrument(skip(self), fields(table = %query.table))]
    async fn find(&self, query: &SnapshotQuery) -> Result<Vec<Snapshot>, DomainError> {
        let table = checked_table(&query.table)?;
        let rows = sqlx::query_as::<_, SnapshotRow>(&format!(
            "SELECT {SNAPSHOT_COLUMNS} FROM {table} \
             WHERE ($1::uuid IS NULL OR organization_id = $1) \
             AND NOT EXISTS ( \
                 SELECT 1 FROM jsonb_each($2) AS wanted(key, value) \
                 WHERE state -> wanted.key IS DISTINCT FROM wanted.value \
             ) \
             ORDER BY created_at ASC, id ASC"
        ))
        .bind(query.organization_id)
        .bind(serde_json::Value::Object(query.fields.clone()))
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;

        Ok(rows.into_iter().map(|r| r.into_snapshot(table)).collect())
    }

    async fn begin(&self) -> Result<Box<dyn Transaction>, DomainError> {
        let tx = self.pool.begin().await.map_err(infrastructure)?;
        Ok(Box::new(PgTransaction { tx }))
    }
}

/// A `PostgreSQL` transaction. Dropping it uncommitted rolls it back.
pub struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

impl PgTransaction {
    async fn append(&mut self, event: StoredEvent) -> Result<(), DomainError> {
        let inserted = sqlx::query(
            "INSERT INTO events \
             (id, aggregate_id, aggregate_type, version, type, data, metadata, organization_id, user_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (aggregate_id, version) DO NOTHING",
        )
        .bind(event.id)
        .bind(event.aggregate_id)
        .bind(&event.aggregate_type)
        .bind(event.version)
        .bind(&event.event_type)
        .bind(&event.data)
        .bind(Json(&event.metadata))
        .bind(event.organization_id)
        .bind(event.user_id)
        .bind(event.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(infrastructure)?
        .rows_affected();

        if inserted == 0 {
            let actual: i64 = sqlx::query_scalar(
                "SELECT COALESCE(MAX(version), 0) FROM events WHERE aggregate_id = $1",
            )
            .bind(event.aggregate_id)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(infrastructure)?;
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id: event.aggregate_id,
                expected: event.version - 1,
                actual,
            });
        }
        Ok(())
    }

    async fn upsert(&mut self, write: SnapshotWrite, insert: bool) -> Result<(), DomainError> {
        let SnapshotWrite {
            snapshot,
            expected_version,
        } = write;
        let table = checked_table(&snapshot.table)?;

        let written = if insert {
            sqlx::query(&format!(
                "INSERT INTO {table} ({SNAPSHOT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) \
                 ON CONFLICT (id) DO NOTHING"
            ))
            .bind(snapshot.id)
            .bind(snapshot.organization_id)
            .bind(snapshot.version)
            .bind(&snapshot.state)
            .bind(snapshot.created_at)
            .bind(snapshot.updated_at)
            .execute(&mut *self.tx)
            .await
        } else {
            sqlx::query(&format!(
                "UPDATE {table} SET organization_id = $2, version = $3, state = $4, updated_at = $5 \
                 WHERE id = $1 AND version = $6"
            ))
            .bind(snapshot.id)
            .bind(snapshot.organization_id)
            .bind(snapshot.version)
            .bind(&snapshot.state)
            .bind(snapshot.updated_at)
            .bind(expected_version)
            .execute(&mut *self.tx)
            .await
        }
        .map_err(infrastructure)?
        .rows_affected();

        if written == 0 {
            let actual: Option<i64> =
                sqlx::query_scalar(&format!("SELECT version FROM {table} WHERE id = $1"))
                    .bind(snapshot.id)
                    .fetch_optional(&mut *self.tx)
                    .await
                    .map_err(infrastructure)?;
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id: snapshot.id,
                expected: expected_version,
                actual: actual.unwrap_or(0),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn save(&mut self, record: Record) -> Result<(), DomainError> {
        let insert = is_new_record(&record);
        match record {
            Record::Event(event) => self.append(event).await,
            Record::Snapshot(write) => self.upsert(write, insert).await,
        }
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        self.tx.commit().await.map_err(infrastructure)?;
        debug!("transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        self.tx.rollback().await.map_err(infrastructure)
    }
}

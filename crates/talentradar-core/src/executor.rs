//! The command executor: validate, perform, persist, dispatch.

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::aggregate::{Aggregate, AggregateRoot};
use crate::command::{Changes, Command};
use crate::context::Context;
use crate::error::DomainError;
use crate::event::{Event, Metadata};
use crate::repository::{Record, Snapshot, SnapshotWrite, StoredEvent};

/// What a successful [`call`] persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    /// The aggregate the command ran against (possibly newly assigned).
    pub aggregate_id: Uuid,
    /// The events appended to the log, in version order.
    pub events: Vec<StoredEvent>,
}

impl CommandOutcome {
    /// IDs of the persisted events.
    #[must_use]
    pub fn event_ids(&self) -> Vec<Uuid> {
        self.events.iter().map(|e| e.id).collect()
    }
}

/// Executes `command` against `root`. This is the only sanctioned way to
/// change an aggregate.
///
/// 1. `validate` runs against the untouched state; failure returns with no
///    side effects.
/// 2. `perform` records events, each folded into `root` as it is recorded.
/// 3. The snapshot and the events are written in one transaction.
/// 4. After commit, each event is dispatched to the subscriptions in order.
///
/// If `perform` or persistence fails, `root` is restored to exactly what it
/// was before the call and nothing is dispatched. A command that records no
/// events succeeds without touching storage.
///
/// # Errors
///
/// Returns the command's own validation/perform errors,
/// `DomainError::ConcurrencyConflict` if another writer persisted the
/// aggregate first, or `DomainError::Infrastructure` on storage failure.
/// Subscription failures are never returned.
#[instrument(
    skip_all,
    fields(
        aggregate_type = <C::Aggregate as Aggregate>::AGGREGATE_TYPE,
        command = command.command_type(),
        aggregate_id = %root.id(),
    )
)]
pub async fn call<C: Command>(
    ctx: &Context,
    root: &mut AggregateRoot<C::Aggregate>,
    command: &C,
    metadata: Metadata,
) -> Result<CommandOutcome, DomainError> {
    if let Err(err) = command.validate(ctx, root.state()).await {
        debug!(error = %err, "command rejected by validation");
        return Err(err);
    }

    let before = root.clone();
    let performed = {
        let mut changes = Changes::new(root, &metadata, ctx.identity(), ctx.clock());
        command.perform(ctx, &mut changes).await
    };
    if let Err(err) = performed {
        debug!(error = %err, "command perform failed, discarding recorded events");
        *root = before;
        return Err(err);
    }

    if root.pending_events().is_empty() {
        debug!("command recorded no events");
        return Ok(CommandOutcome {
            aggregate_id: root.id(),
            events: Vec::new(),
        });
    }

    let stored = match persist(ctx, root).await {
        Ok(stored) => stored,
        Err(err) => {
            warn!(error = %err, "persisting command result failed");
            *root = before;
            return Err(err);
        }
    };

    let committed = root.mark_committed();
    info!(
        aggregate_id = %root.id(),
        version = root.version(),
        events = committed.len(),
        "command committed"
    );

    ctx.subscriptions().dispatch(ctx, root, &committed).await;

    Ok(CommandOutcome {
        aggregate_id: root.id(),
        events: stored,
    })
}

/// Writes the snapshot and the pending events of `root` in one transaction.
async fn persist<A: Aggregate>(
    ctx: &Context,
    root: &AggregateRoot<A>,
) -> Result<Vec<StoredEvent>, DomainError> {
    let stored = root
        .pending_events()
        .iter()
        .map(Event::to_stored)
        .collect::<Result<Vec<_>, _>>()?;
    let write = SnapshotWrite {
        snapshot: Snapshot::capture(root, ctx.clock().now())?,
        expected_version: root.version(),
    };

    let mut tx = ctx.repository().begin().await?;
    let saved = async {
        tx.save(Record::Snapshot(write)).await?;
        for event in &stored {
            tx.save(Record::Event(event.clone())).await?;
        }
        Ok::<_, DomainError>(())
    }
    .await;

    match saved {
        Ok(()) => tx.commit().await?,
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "transaction rollback failed");
            }
            return Err(err);
        }
    }

    Ok(stored)
}

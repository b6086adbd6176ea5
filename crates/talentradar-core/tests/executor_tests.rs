//! Behaviour of `executor::call` against the in-memory repository.

mod common;

use std::sync::Arc;

use async_trait::async_trait;

use talentradar_core::aggregate::{Aggregate, AggregateRoot};
use talentradar_core::command::{Changes, Command};
use talentradar_core::context::Context;
use talentradar_core::error::DomainError;
use talentradar_core::event::Metadata;
use talentradar_core::executor::call;
use talentradar_core::identity::Identity;
use talentradar_core::repository::{load_aggregate, load_required, replay};
use talentradar_core::subscription::SubscriptionRegistry;
use talentradar_test_support::{FailingRepository, FixedClock, context_with, in_memory_context};
use uuid::Uuid;

use common::{Account, AccountEvent, Deposit, DepositThenFail, OpenAccount, Touch};

fn open(owner: &str, deposits: Vec<i64>) -> OpenAccount {
    OpenAccount {
        owner: owner.to_owned(),
        deposits,
    }
}

#[tokio::test]
async fn test_call_persists_snapshot_and_events_in_version_order() {
    // Arrange
    let (ctx, repo) = in_memory_context();
    let mut root = AggregateRoot::<Account>::new();

    // Act
    let outcome = call(&ctx, &mut root, &open("ada", vec![5, 7]), Metadata::new())
        .await
        .unwrap();

    // Assert
    assert!(!root.is_new_record());
    assert_eq!(outcome.aggregate_id, root.id());
    assert_eq!(root.version(), 3);
    assert!(root.pending_events().is_empty());

    let versions: Vec<i64> = outcome.events.iter().map(|e| e.version).collect();
    assert_eq!(versions, vec![1, 2, 3]);
    assert_eq!(
        repo.event_types(),
        vec!["account.opened", "account.deposited", "account.deposited"]
    );
    assert!(outcome.events.iter().all(|e| e.aggregate_id == root.id()));

    let snapshot = repo.snapshot(Account::TABLE_NAME, root.id()).unwrap();
    assert_eq!(snapshot.version, 3);
    assert_eq!(snapshot.state["balance"], 12);
}

#[tokio::test]
async fn test_snapshot_matches_replayed_history() {
    // Arrange
    let (ctx, repo) = in_memory_context();
    let mut root = AggregateRoot::<Account>::new();
    call(&ctx, &mut root, &open("ada", vec![5]), Metadata::new())
        .await
        .unwrap();
    call(&ctx, &mut root, &Deposit { amount: 3 }, Metadata::new())
        .await
        .unwrap();

    // Act
    let from_snapshot = load_required::<Account>(&repo, root.id()).await.unwrap();
    let from_log = replay::<Account>(&repo, root.id()).await.unwrap().unwrap();

    // Assert
    assert_eq!(from_snapshot.state(), from_log.state());
    assert_eq!(from_snapshot.version(), from_log.version());
    assert_eq!(from_snapshot.state().balance, 8);
    assert_eq!(from_snapshot.version(), 3);
}

#[tokio::test]
async fn test_validation_failure_records_and_persists_nothing() {
    // Arrange
    let (ctx, repo) = in_memory_context();
    let mut root = AggregateRoot::<Account>::new();

    // Act
    let result = call(&ctx, &mut root, &open("  ", vec![]), Metadata::new()).await;

    // Assert
    let err = result.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.to_string(), "validation error: owner is required");
    assert!(root.is_new_record());
    assert!(root.pending_events().is_empty());
    assert_eq!(repo.event_count(), 0);
    assert_eq!(repo.snapshot_count(), 0);
}

#[tokio::test]
async fn test_perform_failure_restores_aggregate() {
    // Arrange
    let (ctx, repo) = in_memory_context();
    let mut root = AggregateRoot::<Account>::new();
    call(&ctx, &mut root, &open("ada", vec![5]), Metadata::new())
        .await
        .unwrap();
    let before = root.clone();

    // Act
    let result = call(&ctx, &mut root, &DepositThenFail, Metadata::new()).await;

    // Assert
    assert!(matches!(result, Err(DomainError::Collaborator(_))));
    assert_eq!(root.state(), before.state());
    assert_eq!(root.version(), before.version());
    assert!(root.pending_events().is_empty());
    assert_eq!(repo.event_count(), 2);
}

#[tokio::test]
async fn test_persist_failure_restores_aggregate() {
    // Arrange
    let (ctx, repo) = in_memory_context();
    let mut root = AggregateRoot::<Account>::new();
    call(&ctx, &mut root, &open("ada", vec![]), Metadata::new())
        .await
        .unwrap();
    repo.fail_commits(true);

    // Act
    let result = call(&ctx, &mut root, &Deposit { amount: 9 }, Metadata::new()).await;

    // Assert
    assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    assert_eq!(root.state().balance, 0);
    assert_eq!(root.version(), 1);
    assert!(root.pending_events().is_empty());
    assert_eq!(repo.event_count(), 1);
}

#[tokio::test]
async fn test_call_with_no_events_touches_nothing() {
    // Arrange
    let ctx = context_with(Arc::new(FailingRepository), SubscriptionRegistry::new());
    let mut root = AggregateRoot::<Account>::new();

    // Act
    let outcome = call(&ctx, &mut root, &Touch, Metadata::new()).await.unwrap();

    // Assert
    assert!(outcome.events.is_empty());
    assert!(outcome.event_ids().is_empty());
    assert_eq!(root.version(), 0);
}

#[tokio::test]
async fn test_events_carry_identity_metadata_and_clock() {
    // Arrange
    let (ctx, repo) = in_memory_context();
    let user = Uuid::new_v4();
    let org = Uuid::new_v4();
    let ctx = ctx.with_identity(Identity::new(user, org));
    let correlation = Uuid::new_v4();
    let mut root = AggregateRoot::<Account>::new();

    // Act
    call(
        &ctx,
        &mut root,
        &open("ada", vec![1]),
        Metadata::new().with_correlation_id(correlation),
    )
    .await
    .unwrap();

    // Assert
    let events = repo.events();
    assert_eq!(events.len(), 2);
    for event in &events {
        assert_eq!(event.user_id, Some(user));
        assert_eq!(event.organization_id, Some(org));
        assert_eq!(event.created_at, FixedClock::default_instant().0);
        assert_eq!(
            event.metadata.get(Metadata::CORRELATION_ID),
            Some(&correlation.to_string().into())
        );
    }
    let snapshot = repo.snapshot(Account::TABLE_NAME, root.id()).unwrap();
    assert_eq!(snapshot.organization_id, Some(org));
}

#[tokio::test]
async fn test_stale_writer_gets_concurrency_conflict() {
    // Arrange
    let (ctx, repo) = in_memory_context();
    let mut root = AggregateRoot::<Account>::new();
    call(&ctx, &mut root, &open("ada", vec![]), Metadata::new())
        .await
        .unwrap();
    let mut first = load_required::<Account>(&repo, root.id()).await.unwrap();
    let mut second = load_required::<Account>(&repo, root.id()).await.unwrap();
    call(&ctx, &mut first, &Deposit { amount: 1 }, Metadata::new())
        .await
        .unwrap();

    // Act
    let result = call(&ctx, &mut second, &Deposit { amount: 2 }, Metadata::new()).await;

    // Assert
    match result {
        Err(DomainError::ConcurrencyConflict {
            aggregate_id,
            expected,
            actual,
        }) => {
            assert_eq!(aggregate_id, root.id());
            assert_eq!(expected, 1);
            assert_eq!(actual, 2);
        }
        other => panic!("expected ConcurrencyConflict, got {other:?}"),
    }
    assert_eq!(second.state().balance, 0);
    assert_eq!(repo.event_count(), 2);
}

#[tokio::test]
async fn test_load_aggregate_returns_none_for_unknown_id() {
    let (_ctx, repo) = in_memory_context();
    let id = Uuid::new_v4();

    let loaded = load_aggregate::<Account>(&repo, id).await.unwrap();
    let required = load_required::<Account>(&repo, id).await;

    assert!(loaded.is_none());
    assert!(matches!(required, Err(DomainError::AggregateNotFound(missing)) if missing == id));
}

#[tokio::test]
async fn test_repository_failure_propagates_from_call() {
    let ctx = context_with(Arc::new(FailingRepository), SubscriptionRegistry::new());
    let mut root = AggregateRoot::<Account>::new();

    let result = call(&ctx, &mut root, &open("ada", vec![]), Metadata::new()).await;

    assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    assert!(root.is_new_record());
}

/// Adopts the stored account `id`, optionally recording a deposit first.
#[derive(Debug)]
struct AdoptAccount {
    id: Uuid,
    deposit_first: bool,
}

#[async_trait]
impl Command for AdoptAccount {
    type Aggregate = Account;

    fn command_type(&self) -> &'static str {
        "account.adopt"
    }

    async fn perform(
        &self,
        ctx: &Context,
        changes: &mut Changes<'_, Account>,
    ) -> Result<(), DomainError> {
        if self.deposit_first {
            changes.apply(AccountEvent::Deposited { amount: 1 });
        }
        let existing = load_required::<Account>(ctx.repository(), self.id).await?;
        changes.adopt(existing)
    }
}

#[tokio::test]
async fn test_adopt_points_caller_at_existing_aggregate() {
    // Arrange
    let (ctx, repo) = in_memory_context();
    let mut existing = AggregateRoot::<Account>::new();
    call(&ctx, &mut existing, &open("ada", vec![5]), Metadata::new())
        .await
        .unwrap();
    let mut root = AggregateRoot::<Account>::new();

    // Act
    let outcome = call(
        &ctx,
        &mut root,
        &AdoptAccount {
            id: existing.id(),
            deposit_first: false,
        },
        Metadata::new(),
    )
    .await
    .unwrap();

    // Assert
    assert!(outcome.events.is_empty());
    assert_eq!(outcome.aggregate_id, existing.id());
    assert_eq!(root.state(), existing.state());
    assert_eq!(root.version(), 2);
    assert_eq!(repo.event_count(), 2);
}

#[tokio::test]
async fn test_adopt_after_recording_is_rejected() {
    let (ctx, repo) = in_memory_context();
    let mut existing = AggregateRoot::<Account>::new();
    call(&ctx, &mut existing, &open("ada", vec![]), Metadata::new())
        .await
        .unwrap();
    let mut root = AggregateRoot::<Account>::new();

    let result = call(
        &ctx,
        &mut root,
        &AdoptAccount {
            id: existing.id(),
            deposit_first: true,
        },
        Metadata::new(),
    )
    .await;

    assert!(matches!(result, Err(DomainError::Validation(_))));
    assert!(root.pending_events().is_empty());
    assert_eq!(repo.event_count(), 1);
}

//! Post-commit dispatch through the subscription registry.

mod common;

use std::sync::{Arc, Mutex};

use talentradar_core::aggregate::{Aggregate, AggregateRoot};
use talentradar_core::context::Context;
use talentradar_core::error::DomainError;
use talentradar_core::event::{Event, Metadata};
use talentradar_core::executor::call;
use talentradar_core::repository::load_required;
use talentradar_core::subscription::SubscriptionRegistry;
use talentradar_test_support::{InMemoryRepository, context_with};

use common::{ACCOUNT_DEPOSITED, ACCOUNT_OPENED, Account, AccountEvent, Deposit, OpenAccount};

fn open(deposits: Vec<i64>) -> OpenAccount {
    OpenAccount {
        owner: "ada".to_owned(),
        deposits,
    }
}

#[tokio::test]
async fn test_handlers_run_after_commit_in_event_order() {
    // Arrange
    let repo = InMemoryRepository::new();
    let seen: Arc<Mutex<Vec<(i64, bool)>>> = Arc::new(Mutex::new(Vec::new()));
    let mut registry = SubscriptionRegistry::new();
    for event_type in [ACCOUNT_OPENED, ACCOUNT_DEPOSITED] {
        let seen = Arc::clone(&seen);
        registry
            .subscribe::<Account, _, _>(
                event_type,
                "audit",
                move |ctx: Context, root: AggregateRoot<Account>, event: Event<AccountEvent>| {
                    let seen = Arc::clone(&seen);
                    async move {
                        let persisted = ctx
                            .repository()
                            .load(Account::TABLE_NAME, root.id())
                            .await?
                            .is_some();
                        seen.lock().unwrap().push((event.version, persisted));
                        Ok(())
                    }
                },
            )
            .unwrap();
    }
    let ctx = context_with(Arc::new(repo.clone()), registry);
    let mut root = AggregateRoot::<Account>::new();

    // Act
    call(&ctx, &mut root, &open(vec![2, 3]), Metadata::new())
        .await
        .unwrap();

    // Assert
    assert_eq!(
        *seen.lock().unwrap(),
        vec![(1, true), (2, true), (3, true)]
    );
}

#[tokio::test]
async fn test_handler_failure_does_not_reach_caller() {
    // Arrange
    let repo = InMemoryRepository::new();
    let mut registry = SubscriptionRegistry::new();
    registry
        .subscribe::<Account, _, _>(
            ACCOUNT_OPENED,
            "always_fails",
            |_ctx: Context, _root: AggregateRoot<Account>, _event: Event<AccountEvent>| async {
                Err(DomainError::Collaborator("smtp unavailable".into()))
            },
        )
        .unwrap();
    let ctx = context_with(Arc::new(repo.clone()), registry);
    let mut root = AggregateRoot::<Account>::new();

    // Act
    let result = call(&ctx, &mut root, &open(vec![]), Metadata::new()).await;

    // Assert
    assert!(result.is_ok());
    assert_eq!(repo.event_count(), 1);
    assert_eq!(root.version(), 1);
}

#[tokio::test]
async fn test_handlers_on_one_event_run_in_registration_order_past_failures() {
    // Arrange
    let repo = InMemoryRepository::new();
    let ran: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
    let mut registry = SubscriptionRegistry::new();
    for name in ["a", "b", "c"] {
        let ran = Arc::clone(&ran);
        registry
            .subscribe::<Account, _, _>(
                ACCOUNT_OPENED,
                name,
                move |_ctx: Context, _root: AggregateRoot<Account>, _event: Event<AccountEvent>| {
                    let ran = Arc::clone(&ran);
                    async move {
                        ran.lock().unwrap().push(name);
                        if name == "a" {
                            return Err(DomainError::Collaborator("mailer down".into()));
                        }
                        Ok(())
                    }
                },
            )
            .unwrap();
    }
    let ctx = context_with(Arc::new(repo.clone()), registry);
    let mut root = AggregateRoot::<Account>::new();

    // Act
    let result = call(&ctx, &mut root, &open(vec![]), Metadata::new()).await;

    // Assert
    assert!(result.is_ok());
    assert_eq!(*ran.lock().unwrap(), vec!["a", "b", "c"]);
    assert_eq!(repo.event_count(), 1);
}

#[tokio::test]
async fn test_handler_can_issue_a_follow_up_command() {
    // Arrange
    let repo = InMemoryRepository::new();
    let mut registry = SubscriptionRegistry::new();
    registry
        .subscribe::<Account, _, _>(
            ACCOUNT_OPENED,
            "welcome_bonus",
            |ctx: Context, root: AggregateRoot<Account>, _event: Event<AccountEvent>| async move {
                let mut fresh = load_required::<Account>(ctx.repository(), root.id()).await?;
                call(&ctx, &mut fresh, &Deposit { amount: 10 }, Metadata::new()).await?;
                Ok(())
            },
        )
        .unwrap();
    let ctx = context_with(Arc::new(repo.clone()), registry);
    let mut root = AggregateRoot::<Account>::new();

    // Act
    call(&ctx, &mut root, &open(vec![]), Metadata::new())
        .await
        .unwrap();

    // Assert
    let stored = load_required::<Account>(&repo, root.id()).await.unwrap();
    assert_eq!(stored.state().balance, 10);
    assert_eq!(stored.version(), 2);
    assert_eq!(repo.event_types(), vec!["account.opened", "account.deposited"]);
}

#[tokio::test]
async fn test_nothing_is_dispatched_when_validation_fails() {
    // Arrange
    let calls = Arc::new(Mutex::new(0_u32));
    let mut registry = SubscriptionRegistry::new();
    let counter = Arc::clone(&calls);
    registry
        .subscribe::<Account, _, _>(
            ACCOUNT_DEPOSITED,
            "counter",
            move |_ctx: Context, _root: AggregateRoot<Account>, _event: Event<AccountEvent>| {
                let counter = Arc::clone(&counter);
                async move {
                    *counter.lock().unwrap() += 1;
                    Ok(())
                }
            },
        )
        .unwrap();
    let ctx = context_with(Arc::new(InMemoryRepository::new()), registry);
    let mut root = AggregateRoot::<Account>::new();

    // Act
    let result = call(&ctx, &mut root, &Deposit { amount: 5 }, Metadata::new()).await;

    // Assert
    assert!(result.is_err());
    assert_eq!(*calls.lock().unwrap(), 0);
}

#[test]
fn test_subscribe_rejects_event_type_the_aggregate_never_produces() {
    let mut registry = SubscriptionRegistry::new();

    let result = registry.subscribe::<Account, _, _>(
        "account.closed",
        "never",
        |_ctx: Context, _root: AggregateRoot<Account>, _event: Event<AccountEvent>| async {
            Ok(())
        },
    );

    assert!(matches!(result, Err(DomainError::Validation(_))));
    assert_eq!(registry.handler_count("account", "account.closed"), 0);
}

#[test]
fn test_handler_count_tracks_registrations() {
    let mut registry = SubscriptionRegistry::new();
    for name in ["first", "second"] {
        registry
            .subscribe::<Account, _, _>(
                ACCOUNT_OPENED,
                name,
                |_ctx: Context, _root: AggregateRoot<Account>, _event: Event<AccountEvent>| async {
                    Ok(())
                },
            )
            .unwrap();
    }

    assert_eq!(registry.handler_count("account", ACCOUNT_OPENED), 2);
    assert_eq!(registry.handler_count("account", ACCOUNT_DEPOSITED), 0);
}

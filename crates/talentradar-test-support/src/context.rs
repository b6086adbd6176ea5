//! Context builders wired with deterministic collaborators.

use std::sync::{Arc, Mutex};

use talentradar_core::context::Context;
use talentradar_core::repository::Repository;
use talentradar_core::subscription::SubscriptionRegistry;

use crate::clock::FixedClock;
use crate::repository::InMemoryRepository;
use crate::rng::MockRng;

/// A context over `repository` with a fixed clock, the no-op RNG and the
/// given subscriptions.
pub fn context_with(
    repository: Arc<dyn Repository>,
    subscriptions: SubscriptionRegistry,
) -> Context {
    Context::new(
        repository,
        Arc::new(subscriptions),
        Arc::new(FixedClock::default_instant()),
        Arc::new(Mutex::new(MockRng)),
    )
}

/// A fresh in-memory repository and a context over it with no
/// subscriptions.
#[must_use]
pub fn in_memory_context() -> (Context, InMemoryRepository) {
    let repo = InMemoryRepository::new();
    let ctx = context_with(Arc::new(repo.clone()), SubscriptionRegistry::new());
    (ctx, repo)
}

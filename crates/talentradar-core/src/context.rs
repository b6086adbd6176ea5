//! Per-request context handed to commands and subscription handlers.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::clock::Clock;
use crate::error::DomainError;
use crate::identity::Identity;
use crate::repository::Repository;
use crate::rng::DeterministicRng;
use crate::subscription::SubscriptionRegistry;
use crate::tasks::BackgroundTasks;

/// Everything a command execution needs besides the aggregate itself.
///
/// Built once at start-up with [`Context::new`], then narrowed per request
/// with [`Context::with_identity`]. Cloning is cheap: all shared parts are
/// behind `Arc`.
#[derive(Clone)]
pub struct Context {
    identity: Identity,
    repository: Arc<dyn Repository>,
    subscriptions: Arc<SubscriptionRegistry>,
    clock: Arc<dyn Clock>,
    rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    background: BackgroundTasks,
}

impl Context {
    /// Creates a context with an anonymous identity.
    pub fn new(
        repository: Arc<dyn Repository>,
        subscriptions: Arc<SubscriptionRegistry>,
        clock: Arc<dyn Clock>,
        rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    ) -> Self {
        Self {
            identity: Identity::anonymous(),
            repository,
            subscriptions,
            clock,
            rng,
            background: BackgroundTasks::new(),
        }
    }

    /// Returns a copy acting as `identity`.
    #[must_use]
    pub fn with_identity(&self, identity: Identity) -> Self {
        Self {
            identity,
            ..self.clone()
        }
    }

    /// The caller.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The storage adapter.
    #[must_use]
    pub fn repository(&self) -> &dyn Repository {
        self.repository.as_ref()
    }

    /// The frozen subscription registry.
    #[must_use]
    pub fn subscriptions(&self) -> &SubscriptionRegistry {
        &self.subscriptions
    }

    /// The clock events are stamped with.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Detached work started by subscription handlers. Shared by every
    /// clone of this context.
    #[must_use]
    pub fn background(&self) -> &BackgroundTasks {
        &self.background
    }

    /// Runs `f` with exclusive access to the RNG.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the RNG lock is poisoned.
    pub fn with_rng<T>(
        &self,
        f: impl FnOnce(&mut dyn DeterministicRng) -> T,
    ) -> Result<T, DomainError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| DomainError::Infrastructure("rng lock poisoned".into()))?;
        Ok(f(&mut *rng))
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("identity", &self.identity)
            .field("subscriptions", &self.subscriptions)
            .field("background", &self.background)
            .finish_non_exhaustive()
    }
}

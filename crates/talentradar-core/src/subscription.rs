//! Subscription registry and post-commit dispatch.
//!
//! # Delivery contract
//!
//! Delivery is in-process, at-most-once and best-effort. Handlers run after
//! the transaction that persisted their event has committed, in registration
//! order, one event at a time in version order. A handler error is logged
//! at `warn` and dropped: it never reaches the command caller, and nothing
//! retries it. Handlers that need to outlive the request spawn their own
//! task, and dispatch does not wait for it.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::aggregate::{Aggregate, AggregateRoot};
use crate::context::Context;
use crate::error::DomainError;
use crate::event::{Event, EventPayload};

type ErasedHandler = Arc<
    dyn Fn(
            Context,
            &(dyn Any + Send + Sync),
            &(dyn Any + Send + Sync),
        ) -> Option<BoxFuture<'static, Result<(), DomainError>>>
        + Send
        + Sync,
>;

struct Subscription {
    name: &'static str,
    handler: ErasedHandler,
}

/// Maps `(aggregate type, event type)` to the handlers that react to it.
///
/// Build it at start-up, register every handler, then freeze it in an
/// `Arc` inside the [`Context`]. There is no unregistration.
#[derive(Default)]
pub struct SubscriptionRegistry {
    handlers: HashMap<&'static str, HashMap<&'static str, Vec<Subscription>>>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for events of `event_type` on aggregate `A`.
    ///
    /// `name` identifies the handler in logs. The handler receives a copy of
    /// the committed aggregate and the event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `A` never produces `event_type`.
    pub fn subscribe<A, F, Fut>(
        &mut self,
        event_type: &'static str,
        name: &'static str,
        handler: F,
    ) -> Result<(), DomainError>
    where
        A: Aggregate,
        F: Fn(Context, AggregateRoot<A>, Event<A::Event>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), DomainError>> + Send + 'static,
    {
        if !<A::Event as EventPayload>::EVENT_TYPES.contains(&event_type) {
            return Err(DomainError::Validation(format!(
                "{} does not produce {event_type}",
                A::AGGREGATE_TYPE
            )));
        }

        let handler: ErasedHandler = Arc::new(
            move |ctx: Context,
                  root: &(dyn Any + Send + Sync),
                  event: &(dyn Any + Send + Sync)| {
                let root = root.downcast_ref::<AggregateRoot<A>>()?.clone();
                let event = event.downcast_ref::<Event<A::Event>>()?.clone();
                let future: BoxFuture<'static, Result<(), DomainError>> =
                    Box::pin(handler(ctx, root, event));
                Some(future)
            },
        );

        self.handlers
            .entry(A::AGGREGATE_TYPE)
            .or_default()
            .entry(event_type)
            .or_default()
            .push(Subscription { name, handler });
        debug!(
            aggregate_type = A::AGGREGATE_TYPE,
            event_type, handler = name, "subscription registered"
        );
        Ok(())
    }

    /// Number of handlers registered for a pair.
    #[must_use]
    pub fn handler_count(&self, aggregate_type: &str, event_type: &str) -> usize {
        self.lookup(aggregate_type, event_type).map_or(0, <[_]>::len)
    }

    fn lookup(&self, aggregate_type: &str, event_type: &str) -> Option<&[Subscription]> {
        self.handlers
            .get(aggregate_type)
            .and_then(|by_event| by_event.get(event_type))
            .map(Vec::as_slice)
    }

    /// Runs every handler subscribed to each of `events`, in order.
    ///
    /// Never fails; see the module docs for the delivery contract.
    pub async fn dispatch<A: Aggregate>(
        &self,
        ctx: &Context,
        root: &AggregateRoot<A>,
        events: &[Event<A::Event>],
    ) {
        let root_any: &(dyn Any + Send + Sync) = root;
        for event in events {
            let event_any: &(dyn Any + Send + Sync) = event;
            let Some(subscriptions) = self.lookup(A::AGGREGATE_TYPE, &event.event_type) else {
                continue;
            };
            for subscription in subscriptions {
                let Some(future) = (subscription.handler)(ctx.clone(), root_any, event_any) else {
                    warn!(
                        handler = subscription.name,
                        event_type = %event.event_type,
                        "subscription handler type mismatch"
                    );
                    continue;
                };
                match future.await {
                    Ok(()) => debug!(
                        handler = subscription.name,
                        event_id = %event.id,
                        "subscription handled"
                    ),
                    Err(err) => warn!(
                        handler = subscription.name,
                        event_id = %event.id,
                        event_type = %event.event_type,
                        aggregate_id = %event.aggregate_id,
                        error = %err,
                        "subscription handler failed"
                    ),
                }
            }
        }
    }
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (aggregate_type, by_event) in &self.handlers {
            for (event_type, subscriptions) in by_event {
                let names: Vec<_> = subscriptions.iter().map(|s| s.name).collect();
                map.entry(&format_args!("{aggregate_type}/{event_type}"), &names);
            }
        }
        map.finish()
    }
}

//! Subscriptions for the Accounts context.

use std::sync::Arc;

use talentradar_core::aggregate::AggregateRoot;
use talentradar_core::context::Context;
use talentradar_core::error::DomainError;
use talentradar_core::event::Event;
use talentradar_core::repository::{load_aggregate, load_required};
use talentradar_core::subscription::SubscriptionRegistry;
use tracing::{Instrument, debug, info_span, warn};

use crate::collaborators::{InviteEmail, Mailer};
use crate::domain::aggregates::{Organization, User};
use crate::domain::events::{USER_INVITED_EVENT_TYPE, UserEvent, UserInvited};

/// Shown in the invite email when the inviter is unknown.
pub const DEFAULT_INVITER_NAME: &str = "a coworker";

/// Registers every Accounts subscription.
///
/// # Errors
///
/// Returns `DomainError::Validation` if a subscription names an event type
/// its aggregate does not produce.
pub fn register_subscriptions(
    registry: &mut SubscriptionRegistry,
    mailer: Arc<dyn Mailer>,
) -> Result<(), DomainError> {
    registry.subscribe::<User, _, _>(
        USER_INVITED_EVENT_TYPE,
        "accounts.send_invite_email",
        move |ctx: Context, user: AggregateRoot<User>, event: Event<UserEvent>| {
            let mailer = Arc::clone(&mailer);
            async move {
                send_invite_email(ctx, user, event, mailer);
                Ok(())
            }
        },
    )
}

/// Emails the invitee from a detached task. Failures are logged, never
/// returned.
fn send_invite_email(
    ctx: Context,
    user: AggregateRoot<User>,
    event: Event<UserEvent>,
    mailer: Arc<dyn Mailer>,
) {
    let UserEvent::Invited(invited) = event.data else {
        return;
    };
    let span = info_span!("send_invite_email", user_id = %user.id(), event_id = %event.id);
    let background = ctx.background().clone();
    background.spawn(
        async move {
            match deliver_invite(&ctx, user.state(), &invited, mailer.as_ref()).await {
                Ok(()) => debug!(email = %user.state().email, "invite email sent"),
                Err(err) => warn!(
                    email = %user.state().email,
                    error = %err,
                    "unable to send invite email"
                ),
            }
        }
        .instrument(span),
    );
}

async fn deliver_invite(
    ctx: &Context,
    user: &User,
    invited: &UserInvited,
    mailer: &dyn Mailer,
) -> Result<(), DomainError> {
    let inviter_name = match invited.inviter_id {
        Some(inviter_id) => load_aggregate::<User>(ctx.repository(), inviter_id)
            .await?
            .map(|inviter| inviter.state().first_name.clone())
            .filter(|name| !name.is_empty()),
        None => None,
    }
    .unwrap_or_else(|| DEFAULT_INVITER_NAME.to_owned());

    let organization = load_required::<Organization>(ctx.repository(), user.organization_id).await?;

    mailer
        .send_invite_email(&InviteEmail {
            name: user.first_name.clone(),
            inviter_name,
            email: user.email.clone(),
            accept_link: invited.invite_url.clone(),
            organization_name: organization.state().name.clone(),
        })
        .await
}

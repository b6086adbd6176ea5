//! Subscriptions for the Reviews context.

use std::sync::Arc;

use talentradar_accounts::collaborators::{FeedbackEmail, Mailer};
use talentradar_core::aggregate::AggregateRoot;
use talentradar_core::context::Context;
use talentradar_core::error::DomainError;
use talentradar_core::event::{Event, Metadata};
use talentradar_core::executor::call;
use talentradar_core::repository::load_required;
use talentradar_core::subscription::SubscriptionRegistry;
use talentradar_employees::domain::aggregates::Employee;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::collaborators::{FeedbackText, Summarizer};
use crate::domain::aggregates::Feedback;
use crate::domain::commands::CreateSummary;
use crate::domain::events::{
    FEEDBACK_CREATED_EVENT_TYPE, FEEDBACK_SUBMITTED_EVENT_TYPE, FeedbackEvent,
};

/// Registers every Reviews subscription.
///
/// Feedback form links are built as `{frontend_url}/feedback/form/{code}`.
///
/// # Errors
///
/// Returns `DomainError::Validation` if a subscription names an event type
/// its aggregate does not produce.
pub fn register_subscriptions(
    registry: &mut SubscriptionRegistry,
    mailer: Arc<dyn Mailer>,
    summarizer: Arc<dyn Summarizer>,
    frontend_url: String,
) -> Result<(), DomainError> {
    let frontend_url: Arc<str> = frontend_url.trim_end_matches('/').into();
    registry.subscribe::<Feedback, _, _>(
        FEEDBACK_CREATED_EVENT_TYPE,
        "reviews.send_feedback_email",
        move |ctx: Context, feedback: AggregateRoot<Feedback>, _event: Event<FeedbackEvent>| {
            let mailer = Arc::clone(&mailer);
            let frontend_url = Arc::clone(&frontend_url);
            async move {
                send_feedback_email(ctx, feedback, mailer, frontend_url);
                Ok(())
            }
        },
    )?;
    registry.subscribe::<Feedback, _, _>(
        FEEDBACK_SUBMITTED_EVENT_TYPE,
        "reviews.summarize_feedback",
        move |ctx: Context, feedback: AggregateRoot<Feedback>, _event: Event<FeedbackEvent>| {
            let summarizer = Arc::clone(&summarizer);
            async move {
                summarize_feedback(ctx, feedback, summarizer);
                Ok(())
            }
        },
    )
}

/// Emails the reviewer a link to the form from a detached task.
fn send_feedback_email(
    ctx: Context,
    feedback: AggregateRoot<Feedback>,
    mailer: Arc<dyn Mailer>,
    frontend_url: Arc<str>,
) {
    let span = info_span!("send_feedback_email", feedback_id = %feedback.id());
    let background = ctx.background().clone();
    background.spawn(
        async move {
            let feedback = feedback.state();
            match deliver_request(&ctx, feedback, mailer.as_ref(), &frontend_url).await {
                Ok(()) => debug!(email = %feedback.email, "feedback email sent"),
                Err(err) => warn!(
                    email = %feedback.email,
                    error = %err,
                    "unable to send feedback email"
                ),
            }
        }
        .instrument(span),
    );
}

async fn deliver_request(
    ctx: &Context,
    feedback: &Feedback,
    mailer: &dyn Mailer,
    frontend_url: &str,
) -> Result<(), DomainError> {
    let employee = load_required::<Employee>(ctx.repository(), feedback.employee_id).await?;
    mailer
        .send_feedback_email(&FeedbackEmail {
            name: employee.state().name.clone(),
            email: feedback.email.clone(),
            feedback_url: format!("{frontend_url}/feedback/form/{}", feedback.code),
            collection_end_at: feedback.collection_end_at,
        })
        .await
}

/// Generates and stores the summary of submitted answers from a detached
/// task. Failures are logged and leave the feedback without a summary.
fn summarize_feedback(
    ctx: Context,
    feedback: AggregateRoot<Feedback>,
    summarizer: Arc<dyn Summarizer>,
) {
    let span = info_span!("summarize_feedback", feedback_id = %feedback.id());
    let background = ctx.background().clone();
    background.spawn(
        async move {
            if let Err(err) = store_summary(&ctx, feedback, summarizer.as_ref()).await {
                warn!(error = %err, "unable to summarize feedback");
            }
        }
        .instrument(span),
    );
}

async fn store_summary(
    ctx: &Context,
    mut feedback: AggregateRoot<Feedback>,
    summarizer: &dyn Summarizer,
) -> Result<(), DomainError> {
    let Some(details) = feedback.state().details.as_ref() else {
        warn!("submitted feedback has no answers to summarize");
        return Ok(());
    };
    let text = FeedbackText::from(details);

    let summary = summarizer.summarize_feedback(&text).await?;
    let action_items = summarizer.follow_up_items(&text, &summary).await?;

    call(
        ctx,
        &mut feedback,
        &CreateSummary {
            summary,
            action_items,
        },
        Metadata::new().with_source("subscription"),
    )
    .await?;
    info!("feedback summary stored");
    Ok(())
}

//! External services the Reviews context talks to.
//!
//! Feedback request emails go through the Accounts [`Mailer`]; this module
//! adds the AI completion service that turns submitted answers into a
//! summary for the manager.
//!
//! The `RecordingSummarizer` test double is built for this crate's tests
//! and, behind the `test-support` feature, for downstream crates.
//!
//! [`Mailer`]: talentradar_accounts::collaborators::Mailer

use std::fmt::Debug;

use async_trait::async_trait;
use serde_json::Value;
use talentradar_core::error::DomainError;
use tracing::info;

use crate::domain::aggregates::FeedbackDetails;

#[cfg(any(test, feature = "test-support"))]
mod recording;
#[cfg(any(test, feature = "test-support"))]
pub use recording::RecordingSummarizer;

/// The reviewer's answers, as plain text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackText {
    /// What the employee does well.
    pub strengths: String,
    /// Where the employee can grow.
    pub opportunities: String,
    /// Anything else.
    pub additional: String,
}

impl FeedbackText {
    /// The answers laid out as one prompt body.
    #[must_use]
    pub fn prompt(&self) -> String {
        format!(
            "Strengths: {}\nOpportunities: {}\nAdditional Comments: {}",
            self.strengths, self.opportunities, self.additional
        )
    }
}

impl From<&FeedbackDetails> for FeedbackText {
    fn from(details: &FeedbackDetails) -> Self {
        Self {
            strengths: plain_text(&details.strengths),
            opportunities: plain_text(&details.opportunities),
            additional: plain_text(&details.additional),
        }
    }
}

/// Flattens a rich-text editor document into its text.
///
/// Answers are stored as the editor's JSON node tree. The text of every
/// `"type": "text"` node is concatenated depth first, in document order.
/// Input that is not a JSON object or array is returned unchanged.
#[must_use]
pub fn plain_text(raw: &str) -> String {
    match serde_json::from_str::<Value>(raw) {
        Ok(doc @ (Value::Object(_) | Value::Array(_))) => {
            let mut out = String::new();
            collect_text(&doc, &mut out);
            out
        }
        _ => raw.to_owned(),
    }
}

fn collect_text(node: &Value, out: &mut String) {
    match node {
        Value::Array(nodes) => nodes.iter().for_each(|node| collect_text(node, out)),
        Value::Object(fields) => {
            let text = match fields.get("type").and_then(Value::as_str) {
                Some("text") => fields.get("text").and_then(Value::as_str),
                _ => None,
            };
            if let Some(text) = text {
                out.push_str(text);
            }
            if let Some(content) = fields.get("content") {
                collect_text(content, out);
            }
        }
        _ => {}
    }
}

/// AI completion service.
#[async_trait]
pub trait Summarizer: Send + Sync + Debug {
    /// A concise, professional summary of the feedback.
    async fn summarize_feedback(&self, feedback: &FeedbackText) -> Result<String, DomainError>;

    /// Specific follow-up tasks for the manager, given the feedback and its
    /// summary.
    async fn follow_up_items(
        &self,
        feedback: &FeedbackText,
        summary: &str,
    ) -> Result<Vec<String>, DomainError>;
}

/// Summarizer for local development: logs the request and echoes the
/// answers back.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSummarizer;

#[async_trait]
impl Summarizer for LoggingSummarizer {
    async fn summarize_feedback(&self, feedback: &FeedbackText) -> Result<String, DomainError> {
        let prompt = feedback.prompt();
        info!(prompt_len = prompt.len(), "summarizer: feedback summary requested");
        Ok(prompt)
    }

    async fn follow_up_items(
        &self,
        _feedback: &FeedbackText,
        summary: &str,
    ) -> Result<Vec<String>, DomainError> {
        info!(summary_len = summary.len(), "summarizer: follow-up items requested");
        Ok(Vec::new())
    }
}

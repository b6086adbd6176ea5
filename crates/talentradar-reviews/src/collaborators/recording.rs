//! Test double for the Reviews summarizer.

use std::sync::Mutex;

use async_trait::async_trait;
use talentradar_core::error::DomainError;

use super::{FeedbackText, Summarizer};

/// Test summarizer with canned answers that records each request.
#[derive(Debug, Default)]
pub struct RecordingSummarizer {
    summary: String,
    action_items: Vec<String>,
    fail: bool,
    requests: Mutex<Vec<FeedbackText>>,
}

impl RecordingSummarizer {
    /// Answers every request with `summary` and `action_items`.
    #[must_use]
    pub fn new(summary: &str, action_items: &[&str]) -> Self {
        Self {
            summary: summary.to_owned(),
            action_items: action_items.iter().map(|item| (*item).to_owned()).collect(),
            ..Self::default()
        }
    }

    /// A summarizer whose every call fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// The feedback passed to `summarize_feedback` so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn requests(&self) -> Vec<FeedbackText> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Summarizer for RecordingSummarizer {
    async fn summarize_feedback(&self, feedback: &FeedbackText) -> Result<String, DomainError> {
        self.requests
            .lock()
            .map_err(|_| DomainError::Infrastructure("summarizer lock poisoned".into()))?
            .push(feedback.clone());
        if self.fail {
            return Err(DomainError::Collaborator("completion service unavailable".into()));
        }
        Ok(self.summary.clone())
    }

    async fn follow_up_items(
        &self,
        _feedback: &FeedbackText,
        _summary: &str,
    ) -> Result<Vec<String>, DomainError> {
        if self.fail {
            return Err(DomainError::Collaborator("completion service unavailable".into()));
        }
        Ok(self.action_items.clone())
    }
}

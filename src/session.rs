//! Per-session display state with last-submission-wins semantics.
//!
//! Each session holds a submission ticket. Starting a generation (or importing
//! a document) takes a new ticket and clears whatever was shown before; a
//! generation may only publish its result while its ticket is still current.

use crate::errors::{AppError, GENERATION_FAILED_MESSAGE};
use crate::models::GenerationResponse;
use moka::future::Cache;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Header carrying the session identifier.
pub const SESSION_HEADER: &str = "x-session-id";

/// What the session currently displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SessionView {
    Empty,
    Pending,
    Ready {
        #[serde(flatten)]
        response: GenerationResponse,
    },
    Failed {
        error: String,
    },
}

/// Identifies one submission within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionTicket(u64);

#[derive(Debug)]
struct SessionSlot {
    submission: u64,
    view: SessionView,
}

impl Default for SessionSlot {
    fn default() -> Self {
        Self {
            submission: 0,
            view: SessionView::Empty,
        }
    }
}

/// TTL-bounded session registry.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<String, Arc<Mutex<SessionSlot>>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        let sessions = Cache::builder()
            .time_to_idle(ttl)
            .max_capacity(10_000)
            .build();
        Self { sessions }
    }

    async fn slot(&self, session_id: &str) -> Arc<Mutex<SessionSlot>> {
        self.sessions
            .get_with(session_id.to_string(), async {
                Arc::new(Mutex::new(SessionSlot::default()))
            })
            .await
    }

    /// Starts a submission: takes a fresh ticket and shows `Pending`.
    pub async fn begin_submission(&self, session_id: &str) -> SubmissionTicket {
        let slot = self.slot(session_id).await;
        let mut slot = slot.lock().await;
        slot.submission += 1;
        slot.view = SessionView::Pending;
        tracing::debug!("Session {} submission #{}", session_id, slot.submission);
        SubmissionTicket(slot.submission)
    }

    /// Publishes the outcome of a submission.
    ///
    /// Returns `Conflict` without touching the session when a newer submission
    /// has started since `ticket` was issued. Failures are recorded with the
    /// generic user-facing message.
    pub async fn complete(
        &self,
        session_id: &str,
        ticket: SubmissionTicket,
        result: &Result<GenerationResponse, AppError>,
    ) -> Result<(), AppError> {
        let slot = self.slot(session_id).await;
        let mut slot = slot.lock().await;

        if slot.submission != ticket.0 {
            tracing::info!(
                "Discarding stale result for session {} (submission #{}, latest #{})",
                session_id,
                ticket.0,
                slot.submission
            );
            return Err(AppError::Conflict(
                "A newer submission replaced this one".to_string(),
            ));
        }

        slot.view = match result {
            Ok(response) => SessionView::Ready {
                response: response.clone(),
            },
            Err(_) => SessionView::Failed {
                error: GENERATION_FAILED_MESSAGE.to_string(),
            },
        };
        Ok(())
    }

    /// Shows an imported document, superseding any in-flight submission.
    pub async fn replace_from_import(&self, session_id: &str, response: GenerationResponse) {
        let slot = self.slot(session_id).await;
        let mut slot = slot.lock().await;
        slot.submission += 1;
        slot.view = SessionView::Ready { response };
    }

    pub async fn current(&self, session_id: &str) -> SessionView {
        match self.sessions.get(session_id).await {
            Some(slot) => slot.lock().await.view.clone(),
            None => SessionView::Empty,
        }
    }

    /// The displayed portfolios, if the session is `Ready`.
    pub async fn ready_response(&self, session_id: &str) -> Option<GenerationResponse> {
        match self.current(session_id).await {
            SessionView::Ready { response } => Some(response),
            _ => None,
        }
    }
}

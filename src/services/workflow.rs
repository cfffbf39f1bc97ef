//! Workflow controller: orchestrates get, iterate and clear over the stores
//! and the recommendation provider.
//!
//! The state machine has three states: Idle, Fetching, and Error (Idle with
//! `last_error` set). Every transition publishes an immutable snapshot
//! through a `tokio::sync::watch` channel. At most one fetch is in flight at
//! a time; a second invocation while loading is a no-op, not queued.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    db::{PreferenceStore, RecommendationStore},
    error::{AppError, AppResult},
    models::Recommendation,
    services::providers::RecommendationProvider,
};

/// Immutable view of the workflow state.
///
/// The current recommendation is referenced by id and resolved by store
/// lookup, so a deleted record can never dangle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkflowSnapshot {
    pub pending_query: String,
    pub current_id: Option<Uuid>,
    pub is_loading: bool,
    pub last_error: Option<String>,
}

pub struct WorkflowController {
    preferences: PreferenceStore,
    history: RecommendationStore,
    provider: Arc<dyn RecommendationProvider>,
    state: watch::Sender<WorkflowSnapshot>,
}

impl WorkflowController {
    pub fn new(
        preferences: PreferenceStore,
        history: RecommendationStore,
        provider: Arc<dyn RecommendationProvider>,
    ) -> Self {
        let (state, _) = watch::channel(WorkflowSnapshot::default());
        Self {
            preferences,
            history,
            provider,
            state,
        }
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> WorkflowSnapshot {
        self.state.borrow().clone()
    }

    /// Subscribes to state transitions; the receiver observes every
    /// published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<WorkflowSnapshot> {
        self.state.subscribe()
    }

    /// Resolves the current recommendation by store lookup.
    pub async fn current_recommendation(&self) -> AppResult<Option<Recommendation>> {
        match self.snapshot().current_id {
            Some(id) => self.history.get(id).await,
            None => Ok(None),
        }
    }

    /// Fetches a new recommendation for a free-text query.
    ///
    /// An empty query is ignored, as is a call while a fetch is already in
    /// flight.
    pub async fn get_recommendation(&self, query: &str) -> WorkflowSnapshot {
        let query = query.trim().to_string();
        if query.is_empty() {
            debug!("Ignoring empty recommendation query");
            return self.snapshot();
        }

        if !self.begin_fetch(&query).await {
            debug!("Fetch already in flight, ignoring request");
            return self.snapshot();
        }

        let outcome = self.fetch_and_store(&query).await;
        self.finish_fetch(outcome)
    }

    /// Fetches a refinement of the current recommendation.
    ///
    /// Requires a resolvable current recommendation; the refined query
    /// combines the extra text with the current name, price and summary.
    /// Success replaces the current pointer while the prior recommendation
    /// stays in history.
    pub async fn iterate_recommendation(&self, extra_text: &str) -> WorkflowSnapshot {
        if self.snapshot().is_loading {
            debug!("Fetch already in flight, ignoring iteration");
            return self.snapshot();
        }

        let current = match self.current_recommendation().await {
            Ok(Some(current)) => current,
            Ok(None) => return self.fail_without_fetch("No recommendation to iterate on."),
            Err(e) => {
                warn!(error = %e, "Failed to resolve current recommendation");
                return self.fail_without_fetch("No recommendation to iterate on.");
            }
        };

        let query = refine_query(extra_text, &current);
        debug!(query = %query, "Iterating on current recommendation");

        if !self.begin_fetch(&query).await {
            debug!("Fetch already in flight, ignoring iteration");
            return self.snapshot();
        }

        let outcome = self.fetch_and_store(&query).await;
        self.finish_fetch(outcome)
    }

    /// Clears the current pointer and the pending query. History is
    /// untouched.
    pub fn clear_recommendation(&self) -> WorkflowSnapshot {
        self.state.send_modify(|state| {
            state.current_id = None;
            state.pending_query.clear();
        });
        self.snapshot()
    }

    /// Atomically enters the Fetching state. Returns false when another
    /// fetch already holds it.
    async fn begin_fetch(&self, query: &str) -> bool {
        let mut started = false;
        self.state.send_if_modified(|state| {
            if state.is_loading {
                return false;
            }
            state.is_loading = true;
            state.pending_query = query.to_string();
            state.last_error = None;
            started = true;
            true
        });

        if started {
            // Surface a deferred preference-storage warning on this
            // operation; a successful fetch will clear it again.
            if let Some(warning) = self.preferences.take_warning().await {
                self.state
                    .send_modify(|state| state.last_error = Some(warning));
            }
        }

        started
    }

    async fn fetch_and_store(&self, query: &str) -> AppResult<Recommendation> {
        let preferences = self.preferences.get_or_create().await;
        let product = self.provider.fetch(query, &preferences).await?;
        let recommendation = Recommendation::new(product);
        self.history.insert(&recommendation).await?;
        Ok(recommendation)
    }

    /// Leaves the Fetching state. The pending query clears regardless of
    /// outcome; the current pointer moves only on success, so a failed fetch
    /// leaves the prior recommendation in place.
    fn finish_fetch(&self, outcome: AppResult<Recommendation>) -> WorkflowSnapshot {
        if let Err(e) = &outcome {
            warn!(error = %e, "Recommendation fetch failed");
        }

        self.state.send_modify(|state| {
            state.is_loading = false;
            state.pending_query.clear();
            match &outcome {
                Ok(recommendation) => {
                    state.current_id = Some(recommendation.id);
                    state.last_error = None;
                }
                Err(e) => {
                    state.last_error = Some(user_message(e));
                }
            }
        });

        self.snapshot()
    }

    fn fail_without_fetch(&self, message: &str) -> WorkflowSnapshot {
        self.state.send_modify(|state| {
            state.last_error = Some(message.to_string());
        });
        self.snapshot()
    }
}

/// Builds the deterministic refined query from the extra text and the
/// current recommendation.
fn refine_query(extra_text: &str, current: &Recommendation) -> String {
    format!(
        "return a new product {} refined from {} at {}: {}",
        extra_text.trim(),
        current.name,
        current.price,
        current.summary
    )
}

/// Maps a failure to the human-readable message the caller binds to.
fn user_message(error: &AppError) -> String {
    match error {
        AppError::InvalidInput(msg) | AppError::NotFound(msg) => msg.clone(),
        AppError::MissingCredential => {
            "API key is missing. Please check your configuration.".to_string()
        }
        AppError::Upstream { status, body } => format!("Server error {}: {}", status, body),
        AppError::InvalidResponse(_) | AppError::Decode(_) => {
            "Could not get a recommendation from the server's reply.".to_string()
        }
        AppError::Timeout => "The recommendation request timed out.".to_string(),
        AppError::Database(_) => "Failed to save the recommendation.".to_string(),
        AppError::HttpClient(_) => "Could not reach the recommendation service.".to_string(),
    }
}

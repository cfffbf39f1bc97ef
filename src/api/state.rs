use std::sync::Arc;

use crate::db::{PreferenceStore, RecommendationStore};
use crate::services::workflow::WorkflowController;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<WorkflowController>,
    pub preferences: PreferenceStore,
    pub history: RecommendationStore,
}

impl AppState {
    pub fn new(
        workflow: Arc<WorkflowController>,
        preferences: PreferenceStore,
        history: RecommendationStore,
    ) -> Self {
        Self {
            workflow,
            preferences,
            history,
        }
    }
}

/// Generative recommendation provider abstraction
///
/// The workflow talks to the remote model through this seam so tests can
/// substitute mocks or local stubs. The production implementation calls the
/// OpenAI chat-completion API.
use crate::{
    error::AppResult,
    models::{ProductSuggestion, UserPreferences},
};

pub mod openai;

pub use openai::OpenAiProvider;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationProvider: Send + Sync {
    /// Synthesizes a single product suggestion for the query, biased by the
    /// user's preference sliders.
    ///
    /// One attempt per call; retry policy belongs to the caller.
    async fn fetch(
        &self,
        query: &str,
        preferences: &UserPreferences,
    ) -> AppResult<ProductSuggestion>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

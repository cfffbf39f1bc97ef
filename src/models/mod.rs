pub mod recommendation;
pub mod user_preferences;

pub use recommendation::{ProductSuggestion, Recommendation};
pub use user_preferences::{PreferenceUpdate, UserPreferences};

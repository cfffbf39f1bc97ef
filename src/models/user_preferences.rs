use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-user sliders that bias the remote model's suggestion.
///
/// Exactly one record exists per store lifetime; it is created with defaults
/// on first read and never deleted by normal operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub id: Uuid,
    pub display_name: String,
    /// How tightly suggestions should track the requested budget, in [0, 1]
    pub budget_sensitivity: f64,
    /// How strongly to favor well-known brands, in [0, 1]
    pub brand_loyalty: f64,
}

/// Partial field changes applied to the stored preferences.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferenceUpdate {
    pub display_name: Option<String>,
    pub budget_sensitivity: Option<f64>,
    pub brand_loyalty: Option<f64>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self::new()
    }
}

impl UserPreferences {
    /// Creates the default preference record
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name: "User".to_string(),
            budget_sensitivity: 0.5,
            brand_loyalty: 0.5,
        }
    }

    /// Applies a partial update. Slider values are clamped into [0, 1] so the
    /// stored record always satisfies its domain.
    pub fn apply(&mut self, update: PreferenceUpdate) {
        if let Some(name) = update.display_name {
            self.display_name = name;
        }
        if let Some(value) = update.budget_sensitivity {
            self.budget_sensitivity = value.clamp(0.0, 1.0);
        }
        if let Some(value) = update.brand_loyalty {
            self.brand_loyalty = value.clamp(0.0, 1.0);
        }
    }
}

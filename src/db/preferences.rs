use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

use crate::models::{PreferenceUpdate, UserPreferences};

#[derive(sqlx::FromRow)]
struct PreferenceRow {
    id: Uuid,
    display_name: String,
    budget_sensitivity: f64,
    brand_loyalty: f64,
}

impl From<PreferenceRow> for UserPreferences {
    fn from(row: PreferenceRow) -> Self {
        Self {
            id: row.id,
            display_name: row.display_name,
            budget_sensitivity: row.budget_sensitivity,
            brand_loyalty: row.brand_loyalty,
        }
    }
}

/// Holds the single user-preference record.
///
/// Reads and writes go through an in-memory cell, so a broken store never
/// blocks the workflow: on a storage failure the in-memory value is still
/// served and a warning is stashed for the workflow to surface on its next
/// operation.
#[derive(Clone)]
pub struct PreferenceStore {
    pool: SqlitePool,
    cell: Arc<Mutex<PreferenceCell>>,
}

#[derive(Default)]
struct PreferenceCell {
    cached: Option<UserPreferences>,
    pending_warning: Option<String>,
}

impl PreferenceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            cell: Arc::new(Mutex::new(PreferenceCell::default())),
        }
    }

    /// Returns the stored preference record, creating one with defaults if
    /// none exists. Creation on first read is an idempotent side effect.
    pub async fn get_or_create(&self) -> UserPreferences {
        if let Some(prefs) = self.cell.lock().await.cached.clone() {
            return prefs;
        }

        let fetched = sqlx::query_as::<_, PreferenceRow>(
            "SELECT id, display_name, budget_sensitivity, brand_loyalty \
             FROM user_preferences LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await;

        let prefs = match fetched {
            Ok(Some(row)) => row.into(),
            Ok(None) => {
                let prefs = UserPreferences::new();
                if let Err(e) = self.persist(&prefs).await {
                    warn!(error = %e, "Failed to save default preferences");
                    self.stash_warning(format!("Failed to save preferences: {}", e))
                        .await;
                }
                prefs
            }
            Err(e) => {
                warn!(error = %e, "Failed to load preferences");
                self.stash_warning(format!("Failed to load preferences: {}", e))
                    .await;
                UserPreferences::new()
            }
        };

        self.cell.lock().await.cached = Some(prefs.clone());
        prefs
    }

    /// Applies partial field changes and persists immediately. The in-memory
    /// value is updated and returned even when the write fails; the failure
    /// surfaces through `take_warning`.
    pub async fn update(&self, changes: PreferenceUpdate) -> UserPreferences {
        let mut prefs = self.get_or_create().await;
        prefs.apply(changes);

        if let Err(e) = self.persist(&prefs).await {
            warn!(error = %e, "Failed to persist preference update");
            self.stash_warning(format!("Failed to save preferences: {}", e))
                .await;
        }

        self.cell.lock().await.cached = Some(prefs.clone());
        prefs
    }

    /// Drains the deferred storage warning, if any.
    pub async fn take_warning(&self) -> Option<String> {
        self.cell.lock().await.pending_warning.take()
    }

    async fn persist(&self, prefs: &UserPreferences) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO user_preferences (id, display_name, budget_sensitivity, brand_loyalty) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET \
                 display_name = excluded.display_name, \
                 budget_sensitivity = excluded.budget_sensitivity, \
                 brand_loyalty = excluded.brand_loyalty",
        )
        .bind(prefs.id)
        .bind(&prefs.display_name)
        .bind(prefs.budget_sensitivity)
        .bind(prefs.brand_loyalty)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn stash_warning(&self, message: String) {
        self.cell.lock().await.pending_warning = Some(message);
    }
}

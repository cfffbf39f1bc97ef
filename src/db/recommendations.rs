use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::Recommendation;

#[derive(sqlx::FromRow)]
struct RecommendationRow {
    id: Uuid,
    name: String,
    price: f64,
    summary: String,
    image_url: String,
    affiliate_link: String,
    created_at: DateTime<Utc>,
}

impl From<RecommendationRow> for Recommendation {
    fn from(row: RecommendationRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            price: row.price,
            summary: row.summary,
            image_url: row.image_url,
            affiliate_link: row.affiliate_link,
            created_at: row.created_at,
        }
    }
}

/// Append-only, user-deletable history of fetched recommendations.
///
/// The full history is retained; there is no caching or eviction.
#[derive(Clone)]
pub struct RecommendationStore {
    pool: SqlitePool,
}

impl RecommendationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Appends a recommendation to the history.
    pub async fn insert(&self, recommendation: &Recommendation) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO recommendations \
                 (id, name, price, summary, image_url, affiliate_link, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(recommendation.id)
        .bind(&recommendation.name)
        .bind(recommendation.price)
        .bind(&recommendation.summary)
        .bind(&recommendation.image_url)
        .bind(&recommendation.affiliate_link)
        .bind(recommendation.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Returns the history newest-first; entries sharing a timestamp keep
    /// most-recent-insertion-first order.
    pub async fn list(&self) -> AppResult<Vec<Recommendation>> {
        let rows = sqlx::query_as::<_, RecommendationRow>(
            "SELECT id, name, price, summary, image_url, affiliate_link, created_at \
             FROM recommendations \
             ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Recommendation::from).collect())
    }

    /// Looks up a single recommendation by id.
    pub async fn get(&self, id: Uuid) -> AppResult<Option<Recommendation>> {
        let row = sqlx::query_as::<_, RecommendationRow>(
            "SELECT id, name, price, summary, image_url, affiliate_link, created_at \
             FROM recommendations WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Recommendation::from))
    }

    /// Removes one record. Deleting an unknown id is a no-op.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM recommendations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Removes all records.
    pub async fn clear(&self) -> AppResult<()> {
        sqlx::query("DELETE FROM recommendations")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Product payload as the generative model returns it, before the record is
/// given an identity in the store.
///
/// The wire keys are fixed by the prompt contract (`name`, `price`,
/// `summary`, `imageURL`, `affiliateLink`); anything else is a decode
/// failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductSuggestion {
    pub name: String,
    pub price: f64,
    pub summary: String,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    #[serde(rename = "affiliateLink")]
    pub affiliate_link: String,
}

/// A persisted product suggestion. Immutable after creation; deleted only by
/// explicit user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Unique identifier, generated when the suggestion is accepted
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub summary: String,
    pub image_url: String,
    pub affiliate_link: String,
    pub created_at: DateTime<Utc>,
}

impl Recommendation {
    /// Creates a new recommendation from a model suggestion with a fresh id
    /// and the current timestamp.
    pub fn new(product: ProductSuggestion) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: product.name,
            price: product.price,
            summary: product.summary,
            image_url: product.image_url,
            affiliate_link: product.affiliate_link,
            created_at: Utc::now(),
        }
    }
}

use crate::domain::money::Money;
use crate::domain::recipient::Recipient;
use serde::{Deserialize, Serialize};

/// A call to action that contributions are made through.
///
/// `total_contributors` and `total_contributions` are derived caches,
/// incremented exactly once per contribution creation and decremented exactly
/// once per void or delete, never recomputed by scanning. Every mutation path
/// must go through `CampaignStore::increment_totals` / `decrement_totals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: u64,
    pub title: String,
    /// Ordered recipient catalog, static per request.
    pub recipients: Vec<Recipient>,
    pub total_contributors: u64,
    pub total_contributions: Money,
}

impl Campaign {
    pub fn new(id: u64, title: &str, recipients: Vec<Recipient>) -> Self {
        Self {
            id,
            title: title.to_string(),
            recipients,
            total_contributors: 0,
            total_contributions: Money::ZERO,
        }
    }
}

use crate::domain::campaign::Campaign;
use crate::domain::contribution::{Contribution, VoidEntry};
use crate::domain::money::Money;
use crate::domain::ports::{CampaignStore, ContributionStore};
use crate::error::{ContributionError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for campaigns.
///
/// Totals are adjusted inside a single write-lock critical section, so two
/// contributions created concurrently cannot lose an increment.
#[derive(Default, Clone)]
pub struct InMemoryCampaignStore {
    campaigns: Arc<RwLock<HashMap<u64, Campaign>>>,
}

impl InMemoryCampaignStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CampaignStore for InMemoryCampaignStore {
    async fn store(&self, campaign: Campaign) -> Result<()> {
        let mut campaigns = self.campaigns.write().await;
        campaigns.insert(campaign.id, campaign);
        Ok(())
    }

    async fn get(&self, campaign_id: u64) -> Result<Option<Campaign>> {
        let campaigns = self.campaigns.read().await;
        Ok(campaigns.get(&campaign_id).cloned())
    }

    async fn increment_totals(&self, campaign_id: u64, amount: Money) -> Result<()> {
        let mut campaigns = self.campaigns.write().await;
        let campaign = campaigns
            .get_mut(&campaign_id)
            .ok_or(ContributionError::CampaignNotFound(campaign_id))?;
        campaign.total_contributors += 1;
        campaign.total_contributions += amount;
        Ok(())
    }

    async fn decrement_totals(&self, campaign_id: u64, amount: Money) -> Result<()> {
        let mut campaigns = self.campaigns.write().await;
        let campaign = campaigns
            .get_mut(&campaign_id)
            .ok_or(ContributionError::CampaignNotFound(campaign_id))?;
        campaign.total_contributors -= 1;
        campaign.total_contributions -= amount;
        Ok(())
    }
}

/// A thread-safe in-memory store for contributions, assigning sequential ids
/// on insert.
#[derive(Default, Clone)]
pub struct InMemoryContributionStore {
    inner: Arc<RwLock<ContributionTable>>,
}

#[derive(Default)]
struct ContributionTable {
    rows: HashMap<u64, Contribution>,
    next_id: u64,
}

impl InMemoryContributionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with existing contributions, e.g. a dump loaded for
    /// offline reconciliation.
    pub async fn load(&self, contributions: Vec<Contribution>) {
        let mut table = self.inner.write().await;
        for contribution in contributions {
            table.next_id = table.next_id.max(contribution.id);
            table.rows.insert(contribution.id, contribution);
        }
    }
}

#[async_trait]
impl ContributionStore for InMemoryContributionStore {
    async fn insert(&self, mut contribution: Contribution) -> Result<u64> {
        let mut table = self.inner.write().await;
        table.next_id += 1;
        let id = table.next_id;
        contribution.id = id;
        table.rows.insert(id, contribution);
        Ok(id)
    }

    async fn update(&self, contribution: Contribution) -> Result<()> {
        let mut table = self.inner.write().await;
        if !table.rows.contains_key(&contribution.id) {
            return Err(ContributionError::ContributionNotFound(contribution.id));
        }
        table.rows.insert(contribution.id, contribution);
        Ok(())
    }

    async fn get(&self, contribution_id: u64) -> Result<Option<Contribution>> {
        let table = self.inner.read().await;
        Ok(table.rows.get(&contribution_id).cloned())
    }

    async fn delete(&self, contribution_id: u64) -> Result<()> {
        let mut table = self.inner.write().await;
        table.rows.remove(&contribution_id);
        Ok(())
    }

    async fn append_void_entries(
        &self,
        contribution_id: u64,
        entries: Vec<VoidEntry>,
    ) -> Result<()> {
        let mut table = self.inner.write().await;
        let contribution = table
            .rows
            .get_mut(&contribution_id)
            .ok_or(ContributionError::ContributionNotFound(contribution_id))?;
        contribution.void_record.extend(entries);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Contribution>> {
        let table = self.inner.read().await;
        let mut rows: Vec<Contribution> = table.rows.values().cloned().collect();
        rows.sort_by_key(|c| c.id);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contribution::{ContributionStatus, Contributor};
    use rust_decimal_macros::dec;

    fn contribution(amount: Money) -> Contribution {
        Contribution {
            id: 0,
            campaign_id: 1,
            contributor: Contributor {
                name_first: "Marvin".to_string(),
                name_last: "Berns".to_string(),
                address: "14 Maple Ave".to_string(),
                city: "Hookerton".to_string(),
                state: "BL".to_string(),
                zip: "20100".to_string(),
                employer: "Woogle".to_string(),
                occupation: "staffer".to_string(),
            },
            amount,
            fee: Money::ZERO,
            line_items: vec![],
            transaction: None,
            void_record: vec![],
            status: ContributionStatus::Pending,
            ref_code: None,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = InMemoryContributionStore::new();
        let a = store.insert(contribution(Money::new(dec!(5.00)))).await.unwrap();
        let b = store.insert(contribution(Money::new(dec!(6.00)))).await.unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(store.get(b).await.unwrap().unwrap().id, b);
    }

    #[tokio::test]
    async fn test_campaign_totals_round_trip() {
        let store = InMemoryCampaignStore::new();
        store.store(Campaign::new(1, "test", vec![])).await.unwrap();

        store
            .increment_totals(1, Money::new(dec!(10.00)))
            .await
            .unwrap();
        store
            .increment_totals(1, Money::new(dec!(2.50)))
            .await
            .unwrap();
        let campaign = store.get(1).await.unwrap().unwrap();
        assert_eq!(campaign.total_contributors, 2);
        assert_eq!(campaign.total_contributions, Money::new(dec!(12.50)));

        store
            .decrement_totals(1, Money::new(dec!(10.00)))
            .await
            .unwrap();
        let campaign = store.get(1).await.unwrap().unwrap();
        assert_eq!(campaign.total_contributors, 1);
        assert_eq!(campaign.total_contributions, Money::new(dec!(2.50)));
    }

    #[tokio::test]
    async fn test_totals_for_missing_campaign_fail() {
        let store = InMemoryCampaignStore::new();
        let err = store
            .increment_totals(9, Money::new(dec!(1.00)))
            .await
            .unwrap_err();
        assert!(matches!(err, ContributionError::CampaignNotFound(9)));
    }

    #[tokio::test]
    async fn test_load_preserves_ids_for_later_inserts() {
        let store = InMemoryContributionStore::new();
        let mut existing = contribution(Money::new(dec!(5.00)));
        existing.id = 7;
        store.load(vec![existing]).await;

        let next = store.insert(contribution(Money::new(dec!(1.00)))).await.unwrap();
        assert_eq!(next, 8);
    }
}

use crate::domain::campaign::Campaign;
use crate::domain::contribution::{Contribution, VoidEntry};
use crate::domain::money::Money;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ProcessorError, Result};

/// Remote transaction status as reported by the payment processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Authorized,
    Captured,
    Voided,
    Credited,
    /// Any status this core does not recognize.
    #[serde(other)]
    Unknown,
}

/// One line item as the processor reports it. Amounts come back as strings
/// (sometimes with a leading `$`) and must be parsed as exact decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorLineItem {
    pub recipient_id: String,
    pub recipient_name: String,
    pub amount: String,
    pub transaction_guid: String,
    pub transaction_status: TransactionStatus,
}

/// The processor's record of an executed donation, stored verbatim on the
/// local contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub donation_id: String,
    pub line_items: Vec<ProcessorLineItem>,
}

impl TransactionRecord {
    /// Distinct transaction guids across the line items, in first-seen order.
    /// A donation usually maps to exactly one, but the model tolerates more.
    pub fn transaction_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        for item in &self.line_items {
            if !ids.contains(&item.transaction_guid) {
                ids.push(item.transaction_guid.clone());
            }
        }
        ids
    }
}

/// Status and line items for a single transaction id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDetail {
    pub status: TransactionStatus,
    pub line_items: Vec<ProcessorLineItem>,
}

/// One requested line item, with the amount formatted as a fixed-point
/// decimal string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonationLineItem {
    pub recipient_id: String,
    pub amount: String,
}

impl DonationLineItem {
    pub fn new(recipient_id: &str, amount: Money) -> Self {
        Self {
            recipient_id: recipient_id.to_string(),
            amount: amount.to_string(),
        }
    }
}

/// A donation request sent to the processor. Card fields are handled by the
/// wire client and never pass through this core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonationRequest {
    pub donor_first_name: String,
    pub donor_last_name: String,
    pub donor_address1: String,
    pub donor_city: String,
    pub donor_state: String,
    pub donor_zip: String,
    pub compliance_employer: String,
    pub compliance_occupation: String,
    pub line_items: Vec<DonationLineItem>,
    /// Opaque tracking metadata echoed back in the processor's records.
    pub aux_data: serde_json::Value,
}

/// One donation from the processor's batch ledger, as consumed by the
/// reconciliation checker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonationRecord {
    pub donation_id: String,
    pub authtest_request: bool,
    pub authcapture_request: bool,
    pub line_items: Vec<ProcessorLineItem>,
    #[serde(default)]
    pub aux_data: serde_json::Value,
    #[serde(default)]
    pub donor_first_name: Option<String>,
    #[serde(default)]
    pub donor_last_name: Option<String>,
    #[serde(default)]
    pub donor_address1: Option<String>,
    #[serde(default)]
    pub donor_city: Option<String>,
    #[serde(default)]
    pub donor_state: Option<String>,
    #[serde(default)]
    pub donor_zip: Option<String>,
    #[serde(default)]
    pub compliance_employer: Option<String>,
    #[serde(default)]
    pub compliance_occupation: Option<String>,
}

/// The capability surface this core requires from the external payment
/// processor. The wire client implements this; tests use the in-memory stub.
#[async_trait]
pub trait ProcessorClient: Send + Sync {
    async fn create_donation(
        &self,
        request: DonationRequest,
    ) -> Result<TransactionRecord, ProcessorError>;
    async fn get_transaction(&self, id: &str) -> Result<TransactionDetail, ProcessorError>;
    async fn void_transaction(&self, id: &str) -> Result<(), ProcessorError>;
    async fn credit_transaction(&self, id: &str) -> Result<(), ProcessorError>;
    async fn donations(&self) -> Result<Vec<DonationRecord>, ProcessorError>;
}

#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn store(&self, campaign: Campaign) -> Result<()>;
    async fn get(&self, campaign_id: u64) -> Result<Option<Campaign>>;
    /// Atomically adds one contributor and `amount` to the campaign's running
    /// totals. Must never be implemented as read-modify-write across await
    /// points.
    async fn increment_totals(&self, campaign_id: u64, amount: Money) -> Result<()>;
    /// Atomically reverses one `increment_totals` call.
    async fn decrement_totals(&self, campaign_id: u64, amount: Money) -> Result<()>;
}

#[async_trait]
pub trait ContributionStore: Send + Sync {
    /// Persists a new contribution and assigns its id.
    async fn insert(&self, contribution: Contribution) -> Result<u64>;
    /// Overwrites an existing contribution's mutable fields.
    async fn update(&self, contribution: Contribution) -> Result<()>;
    async fn get(&self, contribution_id: u64) -> Result<Option<Contribution>>;
    async fn delete(&self, contribution_id: u64) -> Result<()>;
    /// Atomically appends void entries to the contribution's void record.
    async fn append_void_entries(&self, contribution_id: u64, entries: Vec<VoidEntry>)
        -> Result<()>;
    async fn all(&self) -> Result<Vec<Contribution>>;
}

pub type ProcessorClientBox = Box<dyn ProcessorClient>;
pub type CampaignStoreBox = Box<dyn CampaignStore>;
pub type ContributionStoreBox = Box<dyn ContributionStore>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_status_deserialization() {
        let status: TransactionStatus = serde_json::from_str("\"captured\"").unwrap();
        assert_eq!(status, TransactionStatus::Captured);

        // Unrecognized statuses collapse to Unknown rather than failing.
        let status: TransactionStatus = serde_json::from_str("\"settling\"").unwrap();
        assert_eq!(status, TransactionStatus::Unknown);
    }

    #[test]
    fn test_transaction_ids_deduplicate_in_order() {
        let item = |guid: &str| ProcessorLineItem {
            recipient_id: "r".to_string(),
            recipient_name: "r".to_string(),
            amount: "1.00".to_string(),
            transaction_guid: guid.to_string(),
            transaction_status: TransactionStatus::Captured,
        };
        let record = TransactionRecord {
            donation_id: "d1".to_string(),
            line_items: vec![item("t2"), item("t1"), item("t2")],
        };
        assert_eq!(record.transaction_ids(), vec!["t2", "t1"]);
    }
}

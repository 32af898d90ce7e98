use crate::application::allocation::allocate;
use crate::domain::contribution::{
    Allocation, Contribution, ContributionStatus, Contributor, TransactionOutcome,
};
use crate::domain::money::Money;
use crate::domain::ports::{
    CampaignStoreBox, ContributionStoreBox, DonationLineItem, DonationRequest, ProcessorClientBox,
};
use crate::domain::recipient::AllocatorConfig;
use crate::error::{ContributionError, ProcessorError, Result};

/// The entry point for previewing and executing contributions.
///
/// Owns the storage backends and the processor client, and ensures the
/// campaign's running totals are adjusted exactly once per contribution
/// lifecycle event.
pub struct ContributionEngine {
    config: AllocatorConfig,
    campaigns: CampaignStoreBox,
    contributions: ContributionStoreBox,
    processor: ProcessorClientBox,
}

impl ContributionEngine {
    pub fn new(
        config: AllocatorConfig,
        campaigns: CampaignStoreBox,
        contributions: ContributionStoreBox,
        processor: ProcessorClientBox,
    ) -> Self {
        Self {
            config,
            campaigns,
            contributions,
            processor,
        }
    }

    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Computes the line items a contribution of `amount` would produce.
    ///
    /// This is the identical computation `execute` performs, so a preview
    /// with the same seed binds exactly.
    pub async fn preview(&self, campaign_id: u64, amount: Money, seed: u64) -> Result<Allocation> {
        let campaign = self
            .campaigns
            .get(campaign_id)
            .await?
            .ok_or(ContributionError::CampaignNotFound(campaign_id))?;
        allocate(&self.config, &campaign.recipients, amount, seed)
    }

    /// Allocates, records, and sends a contribution to the processor.
    ///
    /// A validation-class rejection from the processor discards the
    /// newly-created contribution and surfaces the error. Any other processor
    /// failure leaves the contribution persisted in an errored state for
    /// later manual or reconciled resolution.
    pub async fn execute(
        &self,
        campaign_id: u64,
        contributor: Contributor,
        amount: Money,
        seed: u64,
        ref_code: Option<String>,
    ) -> Result<Contribution> {
        let campaign = self
            .campaigns
            .get(campaign_id)
            .await?
            .ok_or(ContributionError::CampaignNotFound(campaign_id))?;

        let allocation = allocate(&self.config, &campaign.recipients, amount, seed)?;

        let mut contribution = Contribution {
            id: 0, // assigned by the store
            campaign_id,
            contributor,
            amount,
            fee: allocation.fee,
            line_items: allocation.line_items,
            transaction: None,
            void_record: Vec::new(),
            status: ContributionStatus::Pending,
            ref_code,
        };
        contribution.id = self.contributions.insert(contribution.clone()).await?;
        self.campaigns.increment_totals(campaign_id, amount).await?;

        let request = self.donation_request(&contribution);
        match self.processor.create_donation(request).await {
            Ok(record) => {
                contribution.transaction = Some(TransactionOutcome::Record(record));
                contribution.status = ContributionStatus::Executed;
                self.contributions.update(contribution.clone()).await?;
                tracing::info!(
                    contribution = contribution.id,
                    campaign = campaign_id,
                    amount = %amount,
                    "contribution executed"
                );
                Ok(contribution)
            }
            Err(err @ ProcessorError::Validation(_)) => {
                // e.g. a bad card: recoverable, so the record is discarded
                // and the caller can retry with different input.
                self.contributions.delete(contribution.id).await?;
                self.campaigns.decrement_totals(campaign_id, amount).await?;
                Err(err.into())
            }
            Err(err) => {
                contribution.transaction = Some(TransactionOutcome::Error {
                    message: err.to_string(),
                });
                contribution.status = ContributionStatus::Errored;
                self.contributions.update(contribution.clone()).await?;
                tracing::warn!(
                    contribution = contribution.id,
                    error = %err,
                    "processor failed non-diagnosably; contribution kept for later resolution"
                );
                Ok(contribution)
            }
        }
    }

    fn donation_request(&self, contribution: &Contribution) -> DonationRequest {
        let contributor = &contribution.contributor;
        DonationRequest {
            donor_first_name: contributor.name_first.clone(),
            donor_last_name: contributor.name_last.clone(),
            donor_address1: contributor.address.clone(),
            donor_city: contributor.city.clone(),
            donor_state: contributor.state.clone(),
            donor_zip: contributor.zip.clone(),
            compliance_employer: contributor.employer.clone(),
            compliance_occupation: contributor.occupation.clone(),
            line_items: contribution
                .line_items
                .iter()
                .map(|li| DonationLineItem::new(&li.recipient.id, li.amount))
                .collect(),
            aux_data: serde_json::json!({ "contribution": contribution.id }),
        }
    }
}

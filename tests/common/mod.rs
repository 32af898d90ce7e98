#![allow(dead_code)]

use rust_decimal_macros::dec;
use splitfund::application::execution::ContributionEngine;
use splitfund::application::void::VoidService;
use splitfund::domain::campaign::Campaign;
use splitfund::domain::contribution::{Contribution, Contributor};
use splitfund::domain::money::Money;
use splitfund::domain::ports::{
    CampaignStore, DonationRecord, ProcessorLineItem, TransactionStatus,
};
use splitfund::domain::recipient::{AllocatorConfig, Recipient, RecipientType};
use splitfund::infrastructure::in_memory::{InMemoryCampaignStore, InMemoryContributionStore};
use splitfund::infrastructure::stub::StubProcessor;

pub const CAMPAIGN_ID: u64 = 1;

pub fn catalog() -> Vec<Recipient> {
    vec![
        Recipient {
            id: "de-a".to_string(),
            r#type: RecipientType::Candidate,
            name: "Alpha".to_string(),
            points: Some(dec!(2)),
            limit: None,
        },
        Recipient {
            id: "de-b".to_string(),
            r#type: RecipientType::Candidate,
            name: "Beta".to_string(),
            points: Some(dec!(3)),
            limit: None,
        },
        Recipient {
            id: "de-c".to_string(),
            r#type: RecipientType::Candidate,
            name: "Gamma".to_string(),
            points: Some(dec!(4)),
            limit: None,
        },
        Recipient {
            id: "de-pac".to_string(),
            r#type: RecipientType::Pac,
            name: "Overflow PAC".to_string(),
            points: None,
            limit: None,
        },
    ]
}

pub fn contributor() -> Contributor {
    Contributor {
        name_first: "Lucrecia".to_string(),
        name_last: "Wannamaker".to_string(),
        address: "55 Cedar Ct".to_string(),
        city: "La Ward".to_string(),
        state: "PS".to_string(),
        zip: "70433".to_string(),
        employer: "Pear Inc.".to_string(),
        occupation: "chief executive".to_string(),
    }
}

pub struct Harness {
    pub campaigns: InMemoryCampaignStore,
    pub contributions: InMemoryContributionStore,
    pub processor: StubProcessor,
    pub engine: ContributionEngine,
    pub voids: VoidService,
}

/// Wires the in-memory stores and the stub processor into the services,
/// keeping handles to the concrete instances for assertions.
pub async fn harness(config: AllocatorConfig) -> Harness {
    let campaigns = InMemoryCampaignStore::new();
    let contributions = InMemoryContributionStore::new();
    let processor = StubProcessor::new();

    campaigns
        .store(Campaign::new(CAMPAIGN_ID, "test campaign", catalog()))
        .await
        .unwrap();

    let engine = ContributionEngine::new(
        config,
        Box::new(campaigns.clone()),
        Box::new(contributions.clone()),
        Box::new(processor.clone()),
    );
    let voids = VoidService::new(
        Box::new(campaigns.clone()),
        Box::new(contributions.clone()),
        Box::new(processor.clone()),
    );

    Harness {
        campaigns,
        contributions,
        processor,
        engine,
        voids,
    }
}

/// A donation record that agrees with the local contribution on every field.
pub fn matching_donation(contribution: &Contribution) -> DonationRecord {
    let guid = contribution
        .transaction_ids()
        .first()
        .cloned()
        .unwrap_or_else(|| "txn-unknown".to_string());
    let status = if contribution.is_voided() {
        TransactionStatus::Voided
    } else {
        TransactionStatus::Captured
    };
    let line_items = contribution
        .line_items
        .iter()
        .map(|li| ProcessorLineItem {
            recipient_id: li.recipient.id.clone(),
            recipient_name: li.recipient.name.clone(),
            amount: li.amount.to_string(),
            transaction_guid: guid.clone(),
            transaction_status: status,
        })
        .collect();
    let donor = &contribution.contributor;
    DonationRecord {
        donation_id: format!("de-donation-for-{}", contribution.id),
        authtest_request: false,
        authcapture_request: true,
        line_items,
        aux_data: serde_json::json!({ "contribution": contribution.id }),
        donor_first_name: Some(donor.name_first.clone()),
        donor_last_name: Some(donor.name_last.clone()),
        donor_address1: Some(donor.address.clone()),
        donor_city: Some(donor.city.clone()),
        donor_state: Some(donor.state.clone()),
        donor_zip: Some(donor.zip.clone()),
        compliance_employer: Some(donor.employer.clone()),
        compliance_occupation: Some(donor.occupation.clone()),
    }
}

/// The transaction id behind an executed contribution.
pub fn first_transaction_id(contribution: &Contribution) -> String {
    contribution.transaction_ids().first().cloned().unwrap()
}

pub fn money(value: &str) -> Money {
    Money::new(value.parse().unwrap())
}

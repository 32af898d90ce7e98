use crate::domain::money::Money;
use crate::domain::ports::TransactionRecord;
use crate::domain::recipient::Recipient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One recipient's allocated share of a contribution.
///
/// Invariant: `0.01 <= amount <= effective_limit(recipient)`, enforced by the
/// allocation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub recipient: Recipient,
    pub amount: Money,
}

/// The result of splitting a contribution: display-sorted recipient line
/// items plus the extracted service fee.
///
/// Invariant: `fee + Σ line_items == total`, exactly. The allocation engine
/// asserts this; a mismatch is a logic defect, not a user error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub line_items: Vec<LineItem>,
    pub fee: Money,
    pub total: Money,
}

impl Allocation {
    pub fn recipient_total(&self) -> Money {
        self.line_items.iter().map(|li| li.amount).sum()
    }
}

/// Contributor identity, as required for compliance reporting. A closed
/// struct: the reconciliation checker depends on exactly these fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contributor {
    pub name_first: String,
    pub name_last: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub employer: String,
    pub occupation: String,
}

impl Contributor {
    pub fn summary(&self) -> String {
        format!(
            "{} {} {} {}",
            self.name_first, self.name_last, self.city, self.state
        )
    }
}

/// Either the processor's transaction record or the error that prevented one.
///
/// Non-diagnosable processor failures are captured here so the contribution
/// can remain persisted for later manual or reconciled resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionOutcome {
    Record(TransactionRecord),
    Error { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributionStatus {
    /// Created locally, not yet sent to the processor.
    Pending,
    /// The processor accepted the donation.
    Executed,
    /// The processor failed in a non-diagnosable way; kept for later
    /// resolution.
    Errored,
}

/// Outcome of one void attempt against one transaction id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoidOutcome {
    /// The processor already showed the transaction voided or credited.
    Reconciled,
    Voided,
    Credited,
    Error,
}

impl VoidOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            VoidOutcome::Reconciled | VoidOutcome::Voided | VoidOutcome::Credited
        )
    }
}

impl fmt::Display for VoidOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VoidOutcome::Reconciled => "already-reconciled",
            VoidOutcome::Voided => "voided",
            VoidOutcome::Credited => "credited",
            VoidOutcome::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// One entry per transaction id touched during a void attempt. Appended to
/// the contribution's void record, never overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoidEntry {
    pub transaction_id: String,
    pub outcome: VoidOutcome,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

/// A contribution made by a user, created at execution time after a
/// successful allocation.
///
/// The record is append-only except for `transaction`, `void_record` and
/// `status`, which later operations mutate in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub id: u64,
    pub campaign_id: u64,
    pub contributor: Contributor,
    /// The charged total, the same amount as on the user's card.
    pub amount: Money,
    /// The portion of `amount` allocated to fees.
    pub fee: Money,
    pub line_items: Vec<LineItem>,
    pub transaction: Option<TransactionOutcome>,
    pub void_record: Vec<VoidEntry>,
    pub status: ContributionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_code: Option<String>,
}

impl Contribution {
    /// The distinct processor transaction ids behind this contribution, or
    /// empty if execution never produced a record.
    pub fn transaction_ids(&self) -> Vec<String> {
        match &self.transaction {
            Some(TransactionOutcome::Record(record)) => record.transaction_ids(),
            _ => Vec::new(),
        }
    }

    /// True when this transaction id already has a successful void entry.
    pub fn has_successful_void(&self, transaction_id: &str) -> bool {
        self.void_record
            .iter()
            .any(|e| e.transaction_id == transaction_id && e.outcome.is_success())
    }

    /// Fully voided: every transaction id has a successful void entry.
    pub fn is_voided(&self) -> bool {
        let ids = self.transaction_ids();
        !ids.is_empty() && ids.iter().all(|id| self.has_successful_void(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{ProcessorLineItem, TransactionStatus};
    use rust_decimal_macros::dec;

    fn contributor() -> Contributor {
        Contributor {
            name_first: "Jeanie".to_string(),
            name_last: "Ramm".to_string(),
            address: "120 Fir St".to_string(),
            city: "Rudy".to_string(),
            state: "NQ".to_string(),
            zip: "10024".to_string(),
            employer: "self".to_string(),
            occupation: "retired".to_string(),
        }
    }

    fn contribution_with_record(line_items: Vec<ProcessorLineItem>) -> Contribution {
        Contribution {
            id: 1,
            campaign_id: 1,
            contributor: contributor(),
            amount: Money::new(dec!(10.00)),
            fee: Money::ZERO,
            line_items: vec![],
            transaction: Some(TransactionOutcome::Record(TransactionRecord {
                donation_id: "d1".to_string(),
                line_items,
            })),
            void_record: vec![],
            status: ContributionStatus::Executed,
            ref_code: None,
        }
    }

    fn processor_item(guid: &str) -> ProcessorLineItem {
        ProcessorLineItem {
            recipient_id: "r1".to_string(),
            recipient_name: "R1".to_string(),
            amount: "10.00".to_string(),
            transaction_guid: guid.to_string(),
            transaction_status: TransactionStatus::Captured,
        }
    }

    fn void_entry(id: &str, outcome: VoidOutcome) -> VoidEntry {
        VoidEntry {
            transaction_id: id.to_string(),
            outcome,
            detail: String::new(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_not_voided_without_transaction() {
        let mut c = contribution_with_record(vec![processor_item("t1")]);
        c.transaction = None;
        assert!(c.transaction_ids().is_empty());
        assert!(!c.is_voided());
    }

    #[test]
    fn test_voided_when_all_ids_succeeded() {
        let mut c = contribution_with_record(vec![processor_item("t1"), processor_item("t2")]);
        c.void_record.push(void_entry("t1", VoidOutcome::Voided));
        assert!(!c.is_voided());

        c.void_record
            .push(void_entry("t2", VoidOutcome::Reconciled));
        assert!(c.is_voided());
    }

    #[test]
    fn test_error_entries_do_not_count_as_voided() {
        let mut c = contribution_with_record(vec![processor_item("t1")]);
        c.void_record.push(void_entry("t1", VoidOutcome::Error));
        assert!(!c.is_voided());
    }

    #[test]
    fn test_contributor_summary() {
        assert_eq!(contributor().summary(), "Jeanie Ramm Rudy NQ");
    }
}

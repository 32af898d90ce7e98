use crate::domain::contribution::{VoidEntry, VoidOutcome};
use crate::domain::ports::{
    CampaignStoreBox, ContributionStoreBox, ProcessorClientBox, TransactionStatus,
};
use crate::error::{ContributionError, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Negotiates with the processor to void or credit an executed contribution,
/// recording the outcome per transaction id.
///
/// Void attempts on the same contribution are serialized through a keyed
/// mutex so a concurrent double-void cannot slip past the already-voided
/// check.
pub struct VoidService {
    campaigns: CampaignStoreBox,
    contributions: ContributionStoreBox,
    processor: ProcessorClientBox,
    locks: Mutex<HashMap<u64, Arc<Mutex<()>>>>,
}

impl VoidService {
    pub fn new(
        campaigns: CampaignStoreBox,
        contributions: ContributionStoreBox,
        processor: ProcessorClientBox,
    ) -> Self {
        Self {
            campaigns,
            contributions,
            processor,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Voids (or credits) every outstanding transaction behind the
    /// contribution and returns a line-per-transaction summary.
    ///
    /// Idempotent with respect to already-successful transaction ids: a
    /// retry only touches the ids that still need resolution. Fails when the
    /// contribution has no transaction at all or nothing is outstanding.
    pub async fn void(&self, contribution_id: u64) -> Result<String> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(contribution_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _guard = lock.lock().await;

        let contribution = self
            .contributions
            .get(contribution_id)
            .await?
            .ok_or(ContributionError::ContributionNotFound(contribution_id))?;

        let transaction_ids = contribution.transaction_ids();
        if transaction_ids.is_empty() {
            return Err(ContributionError::NoTransaction);
        }
        let outstanding: Vec<String> = transaction_ids
            .into_iter()
            .filter(|id| !contribution.has_successful_void(id))
            .collect();
        if outstanding.is_empty() {
            return Err(ContributionError::AlreadyVoided);
        }

        let mut entries = Vec::new();
        for transaction_id in &outstanding {
            let entry = self.void_transaction(transaction_id).await;
            tracing::info!(
                contribution = contribution_id,
                transaction = %transaction_id,
                outcome = %entry.outcome,
                detail = %entry.detail,
                "void attempt"
            );
            entries.push(entry);
        }

        let mut report = String::new();
        for entry in &entries {
            let _ = writeln!(
                report,
                "{}: {} {}",
                entry.transaction_id, entry.outcome, entry.detail
            );
        }

        // The campaign totals come down exactly once per contribution, on the
        // transition to fully voided. A partial success leaves them intact
        // until a retry resolves the remaining ids.
        let mut resolved = contribution.clone();
        resolved.void_record.extend(entries.iter().cloned());
        self.contributions
            .append_void_entries(contribution_id, entries)
            .await?;
        if resolved.is_voided() {
            self.campaigns
                .decrement_totals(contribution.campaign_id, contribution.amount)
                .await?;
        }

        Ok(report)
    }

    /// Runs the per-transaction state machine. Failures become `Error`
    /// entries; they never abort the batch.
    async fn void_transaction(&self, transaction_id: &str) -> VoidEntry {
        let status = match self.processor.get_transaction(transaction_id).await {
            Ok(detail) => detail.status,
            Err(err) => {
                return entry(
                    transaction_id,
                    VoidOutcome::Error,
                    format!("status lookup failed: {err}"),
                );
            }
        };

        match status {
            TransactionStatus::Voided | TransactionStatus::Credited => entry(
                transaction_id,
                VoidOutcome::Reconciled,
                "processor already shows the transaction reversed".to_string(),
            ),
            TransactionStatus::Authorized | TransactionStatus::Captured => {
                match self.processor.void_transaction(transaction_id).await {
                    Ok(()) => entry(transaction_id, VoidOutcome::Voided, String::new()),
                    Err(err) if err.is_uncaptured_rejection() => {
                        // An uncaptured authorization cannot be credited
                        // either; record the rejection and move on.
                        entry(transaction_id, VoidOutcome::Error, err.to_string())
                    }
                    Err(void_err) => match self.processor.credit_transaction(transaction_id).await
                    {
                        Ok(()) => entry(
                            transaction_id,
                            VoidOutcome::Credited,
                            format!("void rejected ({void_err}); credited instead"),
                        ),
                        Err(credit_err) => entry(
                            transaction_id,
                            VoidOutcome::Error,
                            format!("void failed: {void_err}; credit failed: {credit_err}"),
                        ),
                    },
                }
            }
            TransactionStatus::Unknown => entry(
                transaction_id,
                VoidOutcome::Error,
                "unexpected transaction status".to_string(),
            ),
        }
    }
}

fn entry(transaction_id: &str, outcome: VoidOutcome, detail: String) -> VoidEntry {
    VoidEntry {
        transaction_id: transaction_id.to_string(),
        outcome,
        detail,
        timestamp: Utc::now(),
    }
}

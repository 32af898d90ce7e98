use crate::domain::ports::{
    DonationRecord, DonationRequest, ProcessorClient, ProcessorLineItem, TransactionDetail,
    TransactionRecord, TransactionStatus,
};
use crate::error::ProcessorError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A scripted in-memory stand-in for the external payment processor.
///
/// Captures every call and lets tests drive each per-transaction branch of
/// the void/credit state machine without a process-wide client singleton.
#[derive(Default, Clone)]
pub struct StubProcessor {
    inner: Arc<RwLock<StubState>>,
}

#[derive(Default)]
struct StubState {
    transactions: HashMap<String, TransactionDetail>,
    donations: Vec<DonationRecord>,
    fail_void: HashMap<String, ProcessorError>,
    fail_credit: HashMap<String, ProcessorError>,
    fail_lookup: HashMap<String, ProcessorError>,
    fail_next_create: Option<ProcessorError>,
    create_calls: Vec<DonationRequest>,
    void_calls: Vec<String>,
    credit_calls: Vec<String>,
    next_donation: u64,
}

impl StubProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_transaction(&self, id: &str, status: TransactionStatus) {
        let mut state = self.inner.write().await;
        state.transactions.insert(
            id.to_string(),
            TransactionDetail {
                status,
                line_items: vec![],
            },
        );
    }

    pub async fn fail_void_with(&self, id: &str, error: ProcessorError) {
        let mut state = self.inner.write().await;
        state.fail_void.insert(id.to_string(), error);
    }

    pub async fn fail_credit_with(&self, id: &str, error: ProcessorError) {
        let mut state = self.inner.write().await;
        state.fail_credit.insert(id.to_string(), error);
    }

    pub async fn fail_lookup_with(&self, id: &str, error: ProcessorError) {
        let mut state = self.inner.write().await;
        state.fail_lookup.insert(id.to_string(), error);
    }

    pub async fn clear_lookup_failures(&self) {
        let mut state = self.inner.write().await;
        state.fail_lookup.clear();
    }

    pub async fn fail_next_create(&self, error: ProcessorError) {
        let mut state = self.inner.write().await;
        state.fail_next_create = Some(error);
    }

    pub async fn push_donation(&self, donation: DonationRecord) {
        let mut state = self.inner.write().await;
        state.donations.push(donation);
    }

    pub async fn void_calls(&self) -> Vec<String> {
        self.inner.read().await.void_calls.clone()
    }

    pub async fn credit_calls(&self) -> Vec<String> {
        self.inner.read().await.credit_calls.clone()
    }

    pub async fn create_calls(&self) -> Vec<DonationRequest> {
        self.inner.read().await.create_calls.clone()
    }
}

#[async_trait]
impl ProcessorClient for StubProcessor {
    /// Accepts the request and synthesizes a captured transaction, one guid
    /// per donation, unless a failure was scripted.
    async fn create_donation(
        &self,
        request: DonationRequest,
    ) -> Result<TransactionRecord, ProcessorError> {
        let mut state = self.inner.write().await;
        state.create_calls.push(request.clone());
        if let Some(error) = state.fail_next_create.take() {
            return Err(error);
        }

        state.next_donation += 1;
        let donation_id = format!("de-donation-{}", state.next_donation);
        let guid = format!("txn-{}", state.next_donation);
        let line_items: Vec<ProcessorLineItem> = request
            .line_items
            .iter()
            .map(|li| ProcessorLineItem {
                recipient_id: li.recipient_id.clone(),
                recipient_name: li.recipient_id.clone(),
                amount: li.amount.clone(),
                transaction_guid: guid.clone(),
                transaction_status: TransactionStatus::Captured,
            })
            .collect();
        state.transactions.insert(
            guid.clone(),
            TransactionDetail {
                status: TransactionStatus::Captured,
                line_items: line_items.clone(),
            },
        );
        Ok(TransactionRecord {
            donation_id,
            line_items,
        })
    }

    async fn get_transaction(&self, id: &str) -> Result<TransactionDetail, ProcessorError> {
        let state = self.inner.read().await;
        if let Some(error) = state.fail_lookup.get(id) {
            return Err(error.clone());
        }
        state
            .transactions
            .get(id)
            .cloned()
            .ok_or_else(|| ProcessorError::Unexpected(format!("unknown transaction {id}")))
    }

    async fn void_transaction(&self, id: &str) -> Result<(), ProcessorError> {
        let mut state = self.inner.write().await;
        state.void_calls.push(id.to_string());
        if let Some(error) = state.fail_void.get(id) {
            return Err(error.clone());
        }
        match state.transactions.get_mut(id) {
            Some(detail) => {
                detail.status = TransactionStatus::Voided;
                Ok(())
            }
            None => Err(ProcessorError::Unexpected(format!(
                "unknown transaction {id}"
            ))),
        }
    }

    async fn credit_transaction(&self, id: &str) -> Result<(), ProcessorError> {
        let mut state = self.inner.write().await;
        state.credit_calls.push(id.to_string());
        if let Some(error) = state.fail_credit.get(id) {
            return Err(error.clone());
        }
        match state.transactions.get_mut(id) {
            Some(detail) => {
                detail.status = TransactionStatus::Credited;
                Ok(())
            }
            None => Err(ProcessorError::Unexpected(format!(
                "unknown transaction {id}"
            ))),
        }
    }

    async fn donations(&self) -> Result<Vec<DonationRecord>, ProcessorError> {
        Ok(self.inner.read().await.donations.clone())
    }
}

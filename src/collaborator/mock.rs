//! In-process collaborator used by the engine tests and local development.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::collaborator::{ExecutionCollaborator, ExecutionOutcome, ProposalBlueprint};
use crate::core::domain::SendPayment;
use crate::core::errors::MultisigError;

/// Deterministic collaborator: mints sequential account ids, derives
/// blueprints from its inputs, and replays queued execution outcomes
/// (successful by default).
pub struct MockCollaborator {
    account_counter: AtomicU64,
    proposal_counter: AtomicU64,
    fail_creation: AtomicBool,
    outcomes: Mutex<Vec<ExecutionOutcome>>,
    execute_calls: AtomicU64,
    notes: Mutex<Vec<serde_json::Value>>,
    balances: Mutex<Vec<serde_json::Value>>,
}

impl Default for MockCollaborator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCollaborator {
    pub fn new() -> Self {
        Self {
            account_counter: AtomicU64::new(0),
            proposal_counter: AtomicU64::new(0),
            fail_creation: AtomicBool::new(false),
            outcomes: Mutex::new(Vec::new()),
            execute_calls: AtomicU64::new(0),
            notes: Mutex::new(Vec::new()),
            balances: Mutex::new(Vec::new()),
        }
    }

    /// Queue the outcome returned by the next `execute_transaction` call.
    /// Outcomes are consumed in FIFO order; when the queue is empty a
    /// generic success is returned.
    pub fn push_outcome(&self, outcome: ExecutionOutcome) {
        self.outcomes.lock().unwrap().push(outcome);
    }

    /// Make every blueprint-creation call fail, simulating an unreachable
    /// collaborator during proposal creation.
    pub fn set_fail_creation(&self, fail: bool) {
        self.fail_creation.store(fail, Ordering::SeqCst);
    }

    pub fn execute_calls(&self) -> u64 {
        self.execute_calls.load(Ordering::SeqCst)
    }

    pub fn set_notes(&self, notes: Vec<serde_json::Value>) {
        *self.notes.lock().unwrap() = notes;
    }

    pub fn set_balances(&self, balances: Vec<serde_json::Value>) {
        *self.balances.lock().unwrap() = balances;
    }

    fn next_blueprint(&self, account_id: &str) -> Result<ProposalBlueprint, MultisigError> {
        if self.fail_creation.load(Ordering::SeqCst) {
            return Err(MultisigError::Collaborator(
                "mock collaborator unavailable".to_string(),
            ));
        }
        let n = self.proposal_counter.fetch_add(1, Ordering::SeqCst);
        Ok(ProposalBlueprint {
            summary_commitment: format!("0xcommit{:04}", n),
            summary_bytes_hex: hex::encode(format!("summary-{}-{}", n, account_id)),
            request_bytes_hex: hex::encode(format!("request-{}-{}", n, account_id)),
        })
    }
}

#[async_trait]
impl ExecutionCollaborator for MockCollaborator {
    async fn create_account(
        &self,
        public_keys: &[String],
        threshold: u32,
    ) -> Result<String, MultisigError> {
        if self.fail_creation.load(Ordering::SeqCst) {
            return Err(MultisigError::Collaborator(
                "mock collaborator unavailable".to_string(),
            ));
        }
        if public_keys.is_empty() || threshold == 0 {
            return Err(MultisigError::Collaborator(
                "mock collaborator rejected account parameters".to_string(),
            ));
        }
        let n = self.account_counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!("0xmock{:08x}", n))
    }

    async fn create_consume_proposal(
        &self,
        account_id: &str,
        _note_ids: &[String],
    ) -> Result<ProposalBlueprint, MultisigError> {
        self.next_blueprint(account_id)
    }

    async fn create_send_proposal(
        &self,
        account_id: &str,
        _payment: &SendPayment,
    ) -> Result<ProposalBlueprint, MultisigError> {
        self.next_blueprint(account_id)
    }

    async fn create_batch_send_proposal(
        &self,
        account_id: &str,
        _payments: &[SendPayment],
    ) -> Result<ProposalBlueprint, MultisigError> {
        self.next_blueprint(account_id)
    }

    async fn execute_transaction(
        &self,
        _account_id: &str,
        _request_bytes_hex: &str,
        _summary_bytes_hex: &str,
        _signatures_hex: &[Option<String>],
        _public_keys_hex: &[String],
    ) -> Result<ExecutionOutcome, MultisigError> {
        let call = self.execute_calls.fetch_add(1, Ordering::SeqCst);
        let mut queue = self.outcomes.lock().unwrap();
        if queue.is_empty() {
            Ok(ExecutionOutcome {
                success: true,
                transaction_id: Some(format!("0xtx{:04}", call)),
                error: None,
            })
        } else {
            Ok(queue.remove(0))
        }
    }

    async fn consumable_notes(
        &self,
        _account_id: &str,
    ) -> Result<Vec<serde_json::Value>, MultisigError> {
        Ok(self.notes.lock().unwrap().clone())
    }

    async fn account_balances(
        &self,
        _account_id: &str,
    ) -> Result<Vec<serde_json::Value>, MultisigError> {
        Ok(self.balances.lock().unwrap().clone())
    }
}

//! Execution collaborator seam.
//!
//! Proposal blueprints and transaction execution are delegated to an
//! external service that holds the chain tooling. This module defines the
//! trait boundary, the wire types, and the HTTP implementation; a mock
//! implementation backs the engine tests.

pub mod http;
pub mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::domain::SendPayment;
use crate::core::errors::MultisigError;

/// Blueprint returned by the collaborator when a proposal is created:
/// a commitment over the transaction summary plus the serialized summary
/// and transaction request, both hex-encoded. Stored verbatim and replayed
/// unchanged at execution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalBlueprint {
    pub summary_commitment: String,
    pub summary_bytes_hex: String,
    pub request_bytes_hex: String,
}

/// Outcome of an execution attempt. `success: false` is a business result,
/// not a transport error; the coordinator records it as FAILED.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub success: bool,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[async_trait]
pub trait ExecutionCollaborator: Send + Sync {
    /// Mints a fresh on-chain multisig account for the given approver keys.
    /// Returns the new account identifier.
    async fn create_account(
        &self,
        public_keys: &[String],
        threshold: u32,
    ) -> Result<String, MultisigError>;

    /// Builds the blueprint for consuming the given notes.
    async fn create_consume_proposal(
        &self,
        account_id: &str,
        note_ids: &[String],
    ) -> Result<ProposalBlueprint, MultisigError>;

    /// Builds the blueprint for a single-recipient send.
    async fn create_send_proposal(
        &self,
        account_id: &str,
        payment: &SendPayment,
    ) -> Result<ProposalBlueprint, MultisigError>;

    /// Builds the blueprint for a multi-recipient send.
    async fn create_batch_send_proposal(
        &self,
        account_id: &str,
        payments: &[SendPayment],
    ) -> Result<ProposalBlueprint, MultisigError>;

    /// Executes a fully signed proposal. `signatures_hex` is positional:
    /// one entry per approver key, `None` where that approver did not sign.
    async fn execute_transaction(
        &self,
        account_id: &str,
        request_bytes_hex: &str,
        summary_bytes_hex: &str,
        signatures_hex: &[Option<String>],
        public_keys_hex: &[String],
    ) -> Result<ExecutionOutcome, MultisigError>;

    /// Notes the account can consume. Records are passed through verbatim;
    /// the engine never interprets their fields.
    async fn consumable_notes(
        &self,
        account_id: &str,
    ) -> Result<Vec<serde_json::Value>, MultisigError>;

    /// Current asset balances, passed through verbatim.
    async fn account_balances(
        &self,
        account_id: &str,
    ) -> Result<Vec<serde_json::Value>, MultisigError>;
}

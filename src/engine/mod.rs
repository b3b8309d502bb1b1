//! Multisig coordination engine.
//!
//! Ties the storage layer and the execution collaborator together and
//! enforces the proposal lifecycle: account creation, proposal creation,
//! signature collection with the threshold flip, and single-winner
//! execution.

mod accounts;
mod execute;
mod proposals;
mod signatures;

pub use accounts::CreateAccountParams;
pub use execute::ExecutionResult;
pub use signatures::SubmitSignatureParams;

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::collaborator::ExecutionCollaborator;
use crate::core::domain::{ProposalKind, ProposalStatus, SendPayment};
use crate::core::errors::MultisigError;
use crate::storage::{AccountRecord, MultisigStorage, ProposalRecord, SignatureRecord};

pub struct MultisigEngine {
    storage: Arc<MultisigStorage>,
    collaborator: Arc<dyn ExecutionCollaborator>,
}

impl MultisigEngine {
    pub fn new(storage: Arc<MultisigStorage>, collaborator: Arc<dyn ExecutionCollaborator>) -> Self {
        Self {
            storage,
            collaborator,
        }
    }

    pub fn storage(&self) -> &Arc<MultisigStorage> {
        &self.storage
    }

    pub fn collaborator(&self) -> &Arc<dyn ExecutionCollaborator> {
        &self.collaborator
    }
}

/// Account as exposed over the API.
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    pub account_id: String,
    pub name: String,
    pub public_keys: Vec<String>,
    pub threshold: u32,
    pub company_id: i64,
    pub created_at: NaiveDateTime,
}

impl From<AccountRecord> for AccountView {
    fn from(record: AccountRecord) -> Self {
        Self {
            account_id: record.account_id,
            name: record.name,
            public_keys: record.public_keys,
            threshold: record.threshold,
            company_id: record.company_id,
            created_at: record.created_at,
        }
    }
}

/// An approver slot of an account, joined with the owning team member.
#[derive(Debug, Clone, Serialize)]
pub struct AccountMemberView {
    pub team_member_id: i64,
    pub key_index: u32,
    pub name: String,
    pub public_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignatureView {
    pub approver_index: u32,
    pub approver_public_key: String,
    pub signature_hex: String,
    pub created_at: NaiveDateTime,
}

impl From<SignatureRecord> for SignatureView {
    fn from(record: SignatureRecord) -> Self {
        Self {
            approver_index: record.approver_index,
            approver_public_key: record.approver_public_key,
            signature_hex: record.signature_hex,
            created_at: record.created_at,
        }
    }
}

/// Proposal as exposed over the API: the stored record plus the live
/// signature count and the owning account's threshold.
#[derive(Debug, Clone, Serialize)]
pub struct ProposalView {
    pub id: i64,
    pub uuid: String,
    pub account_id: String,
    pub description: String,
    #[serde(rename = "proposal_type")]
    pub kind: ProposalKind,
    pub summary_commitment: String,
    pub summary_bytes_hex: String,
    pub note_ids: Vec<String>,
    pub recipient_id: Option<String>,
    pub faucet_id: Option<String>,
    pub amount: Option<i64>,
    pub payments: Vec<SendPayment>,
    pub status: ProposalStatus,
    pub transaction_id: Option<String>,
    pub failure_reason: Option<String>,
    pub signatures_count: u32,
    pub threshold: u32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ProposalView {
    pub(crate) fn build(record: ProposalRecord, signatures_count: u32, threshold: u32) -> Self {
        Self {
            id: record.id,
            uuid: record.uuid,
            account_id: record.account_id,
            description: record.description,
            kind: record.kind,
            summary_commitment: record.summary_commitment,
            summary_bytes_hex: record.summary_bytes_hex,
            note_ids: record.note_ids,
            recipient_id: record.recipient_id,
            faucet_id: record.faucet_id,
            amount: record.amount,
            payments: record.payments,
            status: record.status,
            transaction_id: record.transaction_id,
            failure_reason: record.failure_reason,
            signatures_count,
            threshold,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl MultisigEngine {
    pub(crate) async fn require_account(
        &self,
        account_id: &str,
    ) -> Result<AccountRecord, MultisigError> {
        self.storage
            .get_account(account_id)
            .await?
            .ok_or_else(|| MultisigError::AccountNotFound(account_id.to_string()))
    }

    pub(crate) async fn require_proposal(
        &self,
        proposal_id: i64,
    ) -> Result<ProposalRecord, MultisigError> {
        self.storage
            .get_proposal(proposal_id)
            .await?
            .ok_or(MultisigError::ProposalNotFound(proposal_id))
    }

    /// Assembles the full view for a proposal record.
    pub(crate) async fn proposal_view(
        &self,
        record: ProposalRecord,
    ) -> Result<ProposalView, MultisigError> {
        let account = self.require_account(&record.account_id).await?;
        let count = self.storage.count_signatures(record.id).await?;
        Ok(ProposalView::build(record, count, account.threshold))
    }
}

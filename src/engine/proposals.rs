//! Proposal store: creating and querying proposals.
//!
//! Creation asks the collaborator for the blueprint first; if that call
//! fails nothing is persisted. The stored blueprint is immutable for the
//! proposal's lifetime.

use tracing::info;

use crate::core::domain::{ProposalKind, SendPayment};
use crate::core::errors::MultisigError;
use crate::core::validation::validate_amount;
use crate::engine::{MultisigEngine, ProposalView};
use crate::storage::NewProposal;

const MAX_BATCH_PAYMENTS: usize = 50;

impl MultisigEngine {
    /// Creates a consume proposal for the given notes.
    pub async fn create_consume_proposal(
        &self,
        account_id: &str,
        note_ids: Vec<String>,
        description: String,
    ) -> Result<ProposalView, MultisigError> {
        let account = self.require_account(account_id).await?;

        if note_ids.is_empty() || note_ids.iter().any(|n| n.trim().is_empty()) {
            return Err(MultisigError::Validation(
                "note_ids must be a non-empty list of note identifiers".to_string(),
            ));
        }

        let blueprint = self
            .collaborator()
            .create_consume_proposal(&account.account_id, &note_ids)
            .await?;

        let record = self
            .storage()
            .insert_proposal(NewProposal {
                account_id: &account.account_id,
                description: &description,
                kind: ProposalKind::Consume,
                summary_commitment: &blueprint.summary_commitment,
                summary_bytes_hex: &blueprint.summary_bytes_hex,
                request_bytes_hex: &blueprint.request_bytes_hex,
                note_ids: &note_ids,
                recipient_id: None,
                faucet_id: None,
                amount: None,
                payments: &[],
            })
            .await?;

        info!(proposal_id = record.id, account_id = %account.account_id, "Consume proposal created");
        Ok(ProposalView::build(record, 0, account.threshold))
    }

    /// Creates a send proposal for a single recipient.
    pub async fn create_send_proposal(
        &self,
        account_id: &str,
        payment: SendPayment,
        description: String,
    ) -> Result<ProposalView, MultisigError> {
        let account = self.require_account(account_id).await?;

        validate_amount(payment.amount)?;
        if payment.recipient_id.trim().is_empty() || payment.faucet_id.trim().is_empty() {
            return Err(MultisigError::Validation(
                "recipient_id and faucet_id are required".to_string(),
            ));
        }

        let blueprint = self
            .collaborator()
            .create_send_proposal(&account.account_id, &payment)
            .await?;

        let record = self
            .storage()
            .insert_proposal(NewProposal {
                account_id: &account.account_id,
                description: &description,
                kind: ProposalKind::Send,
                summary_commitment: &blueprint.summary_commitment,
                summary_bytes_hex: &blueprint.summary_bytes_hex,
                request_bytes_hex: &blueprint.request_bytes_hex,
                note_ids: &[],
                recipient_id: Some(&payment.recipient_id),
                faucet_id: Some(&payment.faucet_id),
                amount: Some(payment.amount as i64),
                payments: &[],
            })
            .await?;

        info!(proposal_id = record.id, account_id = %account.account_id, "Send proposal created");
        Ok(ProposalView::build(record, 0, account.threshold))
    }

    /// Creates a send proposal covering multiple recipients in a single
    /// transaction.
    pub async fn create_batch_send_proposal(
        &self,
        account_id: &str,
        payments: Vec<SendPayment>,
        description: String,
    ) -> Result<ProposalView, MultisigError> {
        let account = self.require_account(account_id).await?;

        if payments.is_empty() {
            return Err(MultisigError::Validation(
                "payments must not be empty".to_string(),
            ));
        }
        if payments.len() > MAX_BATCH_PAYMENTS {
            return Err(MultisigError::Validation(format!(
                "too many payments in one batch (max {})",
                MAX_BATCH_PAYMENTS
            )));
        }
        for payment in &payments {
            validate_amount(payment.amount)?;
            if payment.recipient_id.trim().is_empty() || payment.faucet_id.trim().is_empty() {
                return Err(MultisigError::Validation(
                    "every payment needs recipient_id and faucet_id".to_string(),
                ));
            }
        }

        let blueprint = self
            .collaborator()
            .create_batch_send_proposal(&account.account_id, &payments)
            .await?;

        let record = self
            .storage()
            .insert_proposal(NewProposal {
                account_id: &account.account_id,
                description: &description,
                kind: ProposalKind::Send,
                summary_commitment: &blueprint.summary_commitment,
                summary_bytes_hex: &blueprint.summary_bytes_hex,
                request_bytes_hex: &blueprint.request_bytes_hex,
                note_ids: &[],
                recipient_id: None,
                faucet_id: None,
                amount: None,
                payments: &payments,
            })
            .await?;

        info!(
            proposal_id = record.id,
            account_id = %account.account_id,
            payments = payments.len(),
            "Batch send proposal created"
        );
        Ok(ProposalView::build(record, 0, account.threshold))
    }

    pub async fn get_proposal_view(&self, proposal_id: i64) -> Result<ProposalView, MultisigError> {
        let record = self.require_proposal(proposal_id).await?;
        self.proposal_view(record).await
    }

    pub async fn list_account_proposals(
        &self,
        account_id: &str,
    ) -> Result<Vec<ProposalView>, MultisigError> {
        let account = self.require_account(account_id).await?;
        let records = self.storage().list_proposals_by_account(account_id).await?;

        let mut views = Vec::with_capacity(records.len());
        for record in records {
            let count = self.storage().count_signatures(record.id).await?;
            views.push(ProposalView::build(record, count, account.threshold));
        }
        Ok(views)
    }

    pub async fn list_company_proposals(
        &self,
        company_id: i64,
    ) -> Result<Vec<ProposalView>, MultisigError> {
        self.storage()
            .get_company(company_id)
            .await?
            .ok_or(MultisigError::CompanyNotFound(company_id))?;

        let records = self.storage().list_proposals_by_company(company_id).await?;
        let mut views = Vec::with_capacity(records.len());
        for (record, threshold) in records {
            let count = self.storage().count_signatures(record.id).await?;
            views.push(ProposalView::build(record, count, threshold));
        }
        Ok(views)
    }
}

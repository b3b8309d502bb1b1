//! Signature ledger: collecting approver signatures and flipping the
//! proposal to READY when the threshold is reached.

use tracing::{debug, info};

use crate::core::errors::MultisigError;
use crate::core::validation::keys_match;
use crate::core::threshold;
use crate::engine::{MultisigEngine, ProposalView, SignatureView};

/// Parameters for recording one approver's signature on a proposal.
#[derive(Debug, Clone)]
pub struct SubmitSignatureParams {
    pub proposal_id: i64,
    pub approver_index: u32,
    pub approver_public_key: String,
    pub signature_hex: String,
}

impl MultisigEngine {
    /// Records a signature for one approver slot.
    ///
    /// Precondition order is fixed: proposal exists, proposal still accepts
    /// signatures, index within range, declared key matches the account key
    /// at that index. Re-signing the same slot overwrites in place. After
    /// the write the count is re-read and the PENDING proposal is flipped
    /// to READY once the threshold is met; the flip is conditional so
    /// concurrent crossers cannot double-transition.
    pub async fn submit_signature(
        &self,
        params: SubmitSignatureParams,
    ) -> Result<ProposalView, MultisigError> {
        let proposal = self.require_proposal(params.proposal_id).await?;

        if !proposal.status.accepts_signatures() {
            return Err(MultisigError::ProposalNotAcceptingSignatures {
                status: proposal.status,
            });
        }

        let account = self.require_account(&proposal.account_id).await?;

        let expected_key = account
            .public_keys
            .get(params.approver_index as usize)
            .ok_or(MultisigError::InvalidApproverIndex {
                index: params.approver_index,
                approvers: account.public_keys.len(),
            })?;

        if !keys_match(expected_key, &params.approver_public_key) {
            return Err(MultisigError::ApproverKeyMismatch {
                index: params.approver_index,
            });
        }

        if params.signature_hex.trim().is_empty() {
            return Err(MultisigError::Validation(
                "signature must not be empty".to_string(),
            ));
        }

        let written = self
            .storage()
            .upsert_signature(
                proposal.id,
                params.approver_index,
                expected_key,
                &params.signature_hex,
            )
            .await?;
        if !written {
            // the proposal went terminal between the status check and the write
            let fresh = self.require_proposal(proposal.id).await?;
            return Err(MultisigError::ProposalNotAcceptingSignatures {
                status: fresh.status,
            });
        }

        let count = self.storage().count_signatures(proposal.id).await?;
        debug!(
            proposal_id = proposal.id,
            count,
            threshold = account.threshold,
            "Signature recorded"
        );

        if threshold::ready(count, account.threshold)
            && self.storage().mark_ready_if_pending(proposal.id).await?
        {
            info!(proposal_id = proposal.id, "Proposal reached threshold, now READY");
        }

        let fresh = self.require_proposal(proposal.id).await?;
        Ok(ProposalView::build(fresh, count, account.threshold))
    }

    pub async fn list_proposal_signatures(
        &self,
        proposal_id: i64,
    ) -> Result<Vec<SignatureView>, MultisigError> {
        self.require_proposal(proposal_id).await?;
        let records = self.storage().list_signatures(proposal_id).await?;
        Ok(records.into_iter().map(SignatureView::from).collect())
    }
}

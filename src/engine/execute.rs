//! Execution coordinator.
//!
//! At most one caller may drive a proposal through the collaborator at a
//! time. The winner of the execution claim always finishes with a terminal
//! commit: a collaborator transport failure is absorbed into FAILED rather
//! than surfaced as an error, so the proposal can never be retried into a
//! double spend.

use serde::Serialize;
use tracing::{error, info, warn};

use crate::core::domain::ProposalStatus;
use crate::core::errors::MultisigError;
use crate::core::threshold;
use crate::engine::MultisigEngine;

/// Final outcome of an execution attempt, mirroring the terminal state the
/// proposal was committed to.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub transaction_id: Option<String>,
    pub error: Option<String>,
    pub status: ProposalStatus,
}

impl MultisigEngine {
    /// Executes a proposal that has collected enough signatures.
    ///
    /// Checks run against fresh reads in this order: proposal not already
    /// terminal, signature count meets the threshold, execution claim won.
    /// Losing the claim yields `ExecutionInProgress`; everything after a
    /// won claim resolves to a terminal commit.
    pub async fn execute_proposal(&self, proposal_id: i64) -> Result<ExecutionResult, MultisigError> {
        let proposal = self.require_proposal(proposal_id).await?;

        if proposal.status.is_terminal() {
            return Err(MultisigError::ProposalAlreadyFinalized {
                status: proposal.status,
            });
        }

        let account = self.require_account(&proposal.account_id).await?;

        let count = self.storage().count_signatures(proposal.id).await?;
        if !threshold::ready(count, account.threshold) {
            return Err(MultisigError::InsufficientSignatures {
                have: count,
                need: account.threshold,
            });
        }

        if !self.storage().claim_execution(proposal.id).await? {
            // either another caller holds the claim or the proposal went
            // terminal between the read and the claim
            let fresh = self.require_proposal(proposal.id).await?;
            if fresh.status.is_terminal() {
                return Err(MultisigError::ProposalAlreadyFinalized {
                    status: fresh.status,
                });
            }
            return Err(MultisigError::ExecutionInProgress);
        }

        info!(proposal_id = proposal.id, account_id = %account.account_id, "Executing proposal");

        let signatures = self.storage().list_signatures(proposal.id).await?;
        let pairs: Vec<(u32, String)> = signatures
            .into_iter()
            .map(|s| (s.approver_index, s.signature_hex))
            .collect();
        let slots = threshold::signature_slots(account.public_keys.len(), &pairs);

        let outcome = self
            .collaborator()
            .execute_transaction(
                &account.account_id,
                &proposal.request_bytes_hex,
                &proposal.summary_bytes_hex,
                &slots,
                &account.public_keys,
            )
            .await;

        match outcome {
            Ok(result) if result.success => match result.transaction_id {
                Some(transaction_id) => {
                    self.storage()
                        .commit_executed(proposal.id, &transaction_id)
                        .await?;
                    info!(proposal_id = proposal.id, %transaction_id, "Proposal executed");
                    Ok(ExecutionResult {
                        success: true,
                        transaction_id: Some(transaction_id),
                        error: None,
                        status: ProposalStatus::Executed,
                    })
                }
                None => {
                    // success without a transaction id is not trustworthy
                    let reason = "collaborator reported success without a transaction id";
                    self.storage().commit_failed(proposal.id, reason).await?;
                    warn!(proposal_id = proposal.id, "{}", reason);
                    Ok(ExecutionResult {
                        success: false,
                        transaction_id: None,
                        error: Some(reason.to_string()),
                        status: ProposalStatus::Failed,
                    })
                }
            },
            Ok(result) => {
                let reason = result
                    .error
                    .unwrap_or_else(|| "execution rejected by collaborator".to_string());
                self.storage().commit_failed(proposal.id, &reason).await?;
                warn!(proposal_id = proposal.id, reason = %reason, "Proposal execution failed");
                Ok(ExecutionResult {
                    success: false,
                    transaction_id: None,
                    error: Some(reason),
                    status: ProposalStatus::Failed,
                })
            }
            Err(e) => {
                let reason = e.to_string();
                self.storage().commit_failed(proposal.id, &reason).await?;
                error!(proposal_id = proposal.id, error = %reason, "Collaborator call failed during execution");
                Ok(ExecutionResult {
                    success: false,
                    transaction_id: None,
                    error: Some(reason),
                    status: ProposalStatus::Failed,
                })
            }
        }
    }
}

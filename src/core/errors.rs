//! Service-wide error type for the multisig coordination engine.
//!
//! Every precondition in the account registry, proposal store, signature
//! ledger and execution coordinator surfaces as its own named variant so
//! callers (and the HTTP layer) can react per failure mode.

use thiserror::Error;

use crate::core::domain::ProposalStatus;

/// Custom error type for multisig coordination operations.
#[derive(Debug, Error)]
pub enum MultisigError {
    /// Referenced company does not exist.
    #[error("Company {0} not found")]
    CompanyNotFound(i64),

    /// Referenced team member does not exist or belongs to another company.
    #[error("Team member {0} not found in this company")]
    TeamMemberNotFound(i64),

    /// A designated approver has no registered public key.
    #[error("Missing public key for team member {member_id}")]
    MissingPublicKey { member_id: i64 },

    /// Caller tried to act on behalf of a company they do not belong to.
    #[error("Cannot create a multisig account for a different company")]
    CompanyMismatch,

    /// Threshold larger than the number of approvers.
    #[error("Threshold ({threshold}) cannot be greater than number of approvers ({approvers})")]
    ThresholdExceedsApproverCount { threshold: u32, approvers: usize },

    /// Referenced multisig account does not exist.
    #[error("Multisig account {0} not found")]
    AccountNotFound(String),

    /// Referenced proposal does not exist.
    #[error("Proposal {0} not found")]
    ProposalNotFound(i64),

    /// Proposal is in a terminal state and rejects further signatures.
    #[error("Cannot add signature to proposal with status {status}")]
    ProposalNotAcceptingSignatures { status: ProposalStatus },

    /// Approver index is outside the account's public-key list.
    #[error("Invalid approver index {index} (account has {approvers} approvers)")]
    InvalidApproverIndex { index: u32, approvers: usize },

    /// Declared public key does not match the account's key at that index.
    #[error("Public key mismatch for approver {index}")]
    ApproverKeyMismatch { index: u32 },

    /// Quorum gate: fewer collected signatures than the account threshold.
    #[error("Not enough signatures ({have}/{need})")]
    InsufficientSignatures { have: u32, need: u32 },

    /// Proposal already reached EXECUTED or FAILED.
    #[error("Proposal is already finalized (status: {status})")]
    ProposalAlreadyFinalized { status: ProposalStatus },

    /// Another caller holds the execution claim for this proposal.
    #[error("Proposal execution already in progress")]
    ExecutionInProgress,

    /// External transaction-execution collaborator failure.
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    /// Input validation failure.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage-related failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration failure.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MultisigError {
    /// Whether the error refers to a missing entity.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            MultisigError::CompanyNotFound(_)
                | MultisigError::TeamMemberNotFound(_)
                | MultisigError::AccountNotFound(_)
                | MultisigError::ProposalNotFound(_)
        )
    }

    /// Whether a retry with the same input can succeed once state changes.
    pub fn is_state_conflict(&self) -> bool {
        matches!(
            self,
            MultisigError::ProposalNotAcceptingSignatures { .. }
                | MultisigError::InsufficientSignatures { .. }
                | MultisigError::ProposalAlreadyFinalized { .. }
                | MultisigError::ExecutionInProgress
        )
    }
}

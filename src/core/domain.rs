//! Domain types shared across the coordination engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a multisig proposal.
///
/// `PENDING → READY → EXECUTED` or `PENDING/READY → FAILED`. The terminal
/// states absorb: nothing transitions out of `EXECUTED` or `FAILED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalStatus {
    Pending,
    Ready,
    Executed,
    Failed,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "PENDING",
            ProposalStatus::Ready => "READY",
            ProposalStatus::Executed => "EXECUTED",
            ProposalStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(ProposalStatus::Pending),
            "READY" => Some(ProposalStatus::Ready),
            "EXECUTED" => Some(ProposalStatus::Executed),
            "FAILED" => Some(ProposalStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProposalStatus::Executed | ProposalStatus::Failed)
    }

    /// Signatures are accepted only while the proposal is still live.
    pub fn accepts_signatures(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a proposal asks the approvers to authorize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalKind {
    /// Consume a set of notes held by the account.
    Consume,
    /// Send funds to one or more recipients.
    Send,
}

impl ProposalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalKind::Consume => "CONSUME",
            ProposalKind::Send => "SEND",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CONSUME" => Some(ProposalKind::Consume),
            "SEND" => Some(ProposalKind::Send),
            _ => None,
        }
    }
}

impl fmt::Display for ProposalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recipient entry of a (batch) send proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendPayment {
    pub recipient_id: String,
    pub faucet_id: String,
    pub amount: u64,
}

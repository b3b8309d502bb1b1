//! Request/response types shared by the HTTP handlers, plus the mapping
//! from engine errors to HTTP responses.

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::core::domain::SendPayment;
use crate::core::errors::MultisigError;

#[derive(Debug, Deserialize)]
pub struct CreateCompanyRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTeamMemberRequest {
    pub name: String,
    #[serde(default)]
    pub public_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
    pub company_id: i64,
    pub creator_member_id: i64,
    #[serde(default)]
    pub team_member_ids: Vec<i64>,
    pub threshold: u32,
}

#[derive(Debug, Deserialize)]
pub struct CreateConsumeProposalRequest {
    pub account_id: String,
    pub note_ids: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSendProposalRequest {
    pub account_id: String,
    pub recipient_id: String,
    pub faucet_id: String,
    pub amount: u64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBatchSendProposalRequest {
    pub account_id: String,
    pub payments: Vec<SendPayment>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitSignatureRequest {
    pub approver_index: u32,
    pub approver_public_key: String,
    pub signature_hex: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Maps an engine error to its HTTP representation. Not-found maps to 404,
/// precondition and validation failures to 400, a lost execution claim to
/// 409, collaborator transport failures to 502.
pub fn error_response(error: MultisigError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, code) = match &error {
        MultisigError::CompanyNotFound(_) => (StatusCode::NOT_FOUND, "COMPANY_NOT_FOUND"),
        MultisigError::TeamMemberNotFound(_) => (StatusCode::NOT_FOUND, "TEAM_MEMBER_NOT_FOUND"),
        MultisigError::AccountNotFound(_) => (StatusCode::NOT_FOUND, "ACCOUNT_NOT_FOUND"),
        MultisigError::ProposalNotFound(_) => (StatusCode::NOT_FOUND, "PROPOSAL_NOT_FOUND"),
        MultisigError::MissingPublicKey { .. } => (StatusCode::BAD_REQUEST, "MISSING_PUBLIC_KEY"),
        MultisigError::CompanyMismatch => (StatusCode::FORBIDDEN, "COMPANY_MISMATCH"),
        MultisigError::ThresholdExceedsApproverCount { .. } => {
            (StatusCode::BAD_REQUEST, "INVALID_THRESHOLD")
        }
        MultisigError::ProposalNotAcceptingSignatures { .. } => {
            (StatusCode::BAD_REQUEST, "PROPOSAL_FINALIZED")
        }
        MultisigError::InvalidApproverIndex { .. } => {
            (StatusCode::BAD_REQUEST, "INVALID_APPROVER_INDEX")
        }
        MultisigError::ApproverKeyMismatch { .. } => {
            (StatusCode::BAD_REQUEST, "APPROVER_KEY_MISMATCH")
        }
        MultisigError::InsufficientSignatures { .. } => {
            (StatusCode::BAD_REQUEST, "INSUFFICIENT_SIGNATURES")
        }
        MultisigError::ProposalAlreadyFinalized { .. } => {
            (StatusCode::BAD_REQUEST, "PROPOSAL_FINALIZED")
        }
        MultisigError::ExecutionInProgress => (StatusCode::CONFLICT, "EXECUTION_IN_PROGRESS"),
        MultisigError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        MultisigError::Collaborator(_) => (StatusCode::BAD_GATEWAY, "COLLABORATOR_FAILED"),
        MultisigError::Storage(_) | MultisigError::Config(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        }
    };

    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            code: code.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let (status, body) = error_response(MultisigError::ProposalNotFound(7));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.code, "PROPOSAL_NOT_FOUND");
    }

    #[test]
    fn test_execution_claim_loss_maps_to_409() {
        let (status, body) = error_response(MultisigError::ExecutionInProgress);
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.code, "EXECUTION_IN_PROGRESS");
    }

    #[test]
    fn test_collaborator_failure_maps_to_502() {
        let (status, _) = error_response(MultisigError::Collaborator("down".to_string()));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}

//! Handlers for proposals, signatures and execution.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;

use crate::api::server::MultisigServer;
use crate::api::types::{
    error_response, CreateBatchSendProposalRequest, CreateConsumeProposalRequest,
    CreateSendProposalRequest, SubmitSignatureRequest,
};
use crate::core::domain::SendPayment;
use crate::engine::SubmitSignatureParams;

fn default_description(kind: &str) -> String {
    format!("{} proposal", kind)
}

pub async fn create_consume_proposal(
    State(server): State<Arc<MultisigServer>>,
    Json(request): Json<CreateConsumeProposalRequest>,
) -> Response {
    let description = request
        .description
        .unwrap_or_else(|| default_description("Consume"));
    match server
        .engine
        .create_consume_proposal(&request.account_id, request.note_ids, description)
        .await
    {
        Ok(proposal) => (StatusCode::CREATED, Json(proposal)).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn create_send_proposal(
    State(server): State<Arc<MultisigServer>>,
    Json(request): Json<CreateSendProposalRequest>,
) -> Response {
    let description = request
        .description
        .unwrap_or_else(|| default_description("Send"));
    let payment = SendPayment {
        recipient_id: request.recipient_id,
        faucet_id: request.faucet_id,
        amount: request.amount,
    };
    match server
        .engine
        .create_send_proposal(&request.account_id, payment, description)
        .await
    {
        Ok(proposal) => (StatusCode::CREATED, Json(proposal)).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn create_batch_send_proposal(
    State(server): State<Arc<MultisigServer>>,
    Json(request): Json<CreateBatchSendProposalRequest>,
) -> Response {
    let description = request
        .description
        .unwrap_or_else(|| default_description("Batch send"));
    match server
        .engine
        .create_batch_send_proposal(&request.account_id, request.payments, description)
        .await
    {
        Ok(proposal) => (StatusCode::CREATED, Json(proposal)).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn get_proposal(
    State(server): State<Arc<MultisigServer>>,
    Path(proposal_id): Path<i64>,
) -> Response {
    match server.engine.get_proposal_view(proposal_id).await {
        Ok(proposal) => Json(proposal).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn list_account_proposals(
    State(server): State<Arc<MultisigServer>>,
    Path(account_id): Path<String>,
) -> Response {
    match server.engine.list_account_proposals(&account_id).await {
        Ok(proposals) => Json(proposals).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn list_company_proposals(
    State(server): State<Arc<MultisigServer>>,
    Path(company_id): Path<i64>,
) -> Response {
    match server.engine.list_company_proposals(company_id).await {
        Ok(proposals) => Json(proposals).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn submit_signature(
    State(server): State<Arc<MultisigServer>>,
    Path(proposal_id): Path<i64>,
    Json(request): Json<SubmitSignatureRequest>,
) -> Response {
    let params = SubmitSignatureParams {
        proposal_id,
        approver_index: request.approver_index,
        approver_public_key: request.approver_public_key,
        signature_hex: request.signature_hex,
    };
    match server.engine.submit_signature(params).await {
        Ok(proposal) => (StatusCode::CREATED, Json(proposal)).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn list_signatures(
    State(server): State<Arc<MultisigServer>>,
    Path(proposal_id): Path<i64>,
) -> Response {
    match server.engine.list_proposal_signatures(proposal_id).await {
        Ok(signatures) => Json(signatures).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn execute_proposal(
    State(server): State<Arc<MultisigServer>>,
    Path(proposal_id): Path<i64>,
) -> Response {
    match server.engine.execute_proposal(proposal_id).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

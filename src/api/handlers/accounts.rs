//! Handlers for companies, team members and multisig accounts.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use crate::api::server::MultisigServer;
use crate::api::types::{
    error_response, CreateAccountRequest, CreateCompanyRequest, CreateTeamMemberRequest,
};
use crate::engine::CreateAccountParams;

pub async fn create_company(
    State(server): State<Arc<MultisigServer>>,
    Json(request): Json<CreateCompanyRequest>,
) -> Response {
    if request.name.trim().is_empty() {
        return error_response(crate::core::errors::MultisigError::Validation(
            "company name must not be empty".to_string(),
        ))
        .into_response();
    }

    match server.engine.storage().create_company(&request.name).await {
        Ok(company) => (
            StatusCode::CREATED,
            Json(json!({
                "id": company.id,
                "name": company.name,
                "created_at": company.created_at,
            })),
        )
            .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn create_team_member(
    State(server): State<Arc<MultisigServer>>,
    Path(company_id): Path<i64>,
    Json(request): Json<CreateTeamMemberRequest>,
) -> Response {
    if request.name.trim().is_empty() {
        return error_response(crate::core::errors::MultisigError::Validation(
            "member name must not be empty".to_string(),
        ))
        .into_response();
    }

    let storage = server.engine.storage();
    match storage.get_company(company_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return error_response(crate::core::errors::MultisigError::CompanyNotFound(
                company_id,
            ))
            .into_response()
        }
        Err(e) => return error_response(e).into_response(),
    }

    if let Some(key) = request.public_key.as_deref() {
        if let Err(e) = crate::core::validation::validate_public_key(key) {
            return error_response(e).into_response();
        }
    }

    let normalized = request
        .public_key
        .as_deref()
        .map(crate::core::validation::normalize_public_key);

    match storage
        .create_team_member(company_id, &request.name, normalized.as_deref())
        .await
    {
        Ok(member) => (
            StatusCode::CREATED,
            Json(json!({
                "id": member.id,
                "company_id": member.company_id,
                "name": member.name,
                "public_key": member.public_key,
                "created_at": member.created_at,
            })),
        )
            .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn create_account(
    State(server): State<Arc<MultisigServer>>,
    Json(request): Json<CreateAccountRequest>,
) -> Response {
    let params = CreateAccountParams {
        name: request.name,
        company_id: request.company_id,
        creator_member_id: request.creator_member_id,
        team_member_ids: request.team_member_ids,
        threshold: request.threshold,
    };

    match server.engine.create_account(params).await {
        Ok(account) => (StatusCode::CREATED, Json(account)).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn get_account(
    State(server): State<Arc<MultisigServer>>,
    Path(account_id): Path<String>,
) -> Response {
    match server.engine.get_account_view(&account_id).await {
        Ok(account) => Json(account).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn list_company_accounts(
    State(server): State<Arc<MultisigServer>>,
    Path(company_id): Path<i64>,
) -> Response {
    match server.engine.list_company_accounts(company_id).await {
        Ok(accounts) => Json(accounts).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

pub async fn list_account_members(
    State(server): State<Arc<MultisigServer>>,
    Path(account_id): Path<String>,
) -> Response {
    match server.engine.list_account_members(&account_id).await {
        Ok(members) => Json(members).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

/// Passthrough to the collaborator: notes the account can consume.
pub async fn get_account_notes(
    State(server): State<Arc<MultisigServer>>,
    Path(account_id): Path<String>,
) -> Response {
    if let Err(e) = server.engine.get_account_view(&account_id).await {
        return error_response(e).into_response();
    }
    match server.engine.collaborator().consumable_notes(&account_id).await {
        Ok(notes) => Json(notes).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

/// Passthrough to the collaborator: current asset balances.
pub async fn get_account_balances(
    State(server): State<Arc<MultisigServer>>,
    Path(account_id): Path<String>,
) -> Response {
    if let Err(e) = server.engine.get_account_view(&account_id).await {
        return error_response(e).into_response();
    }
    match server.engine.collaborator().account_balances(&account_id).await {
        Ok(balances) => Json(balances).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

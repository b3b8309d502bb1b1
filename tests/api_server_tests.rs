//! HTTP surface tests: routing, status codes and response shapes.

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;

use qash_multisig::api::server::MultisigServer;
use qash_multisig::collaborator::mock::MockCollaborator;
use qash_multisig::collaborator::{ExecutionCollaborator, ExecutionOutcome};
use qash_multisig::engine::MultisigEngine;
use qash_multisig::storage::MultisigStorage;

struct TestApi {
    server: TestServer,
    mock: Arc<MockCollaborator>,
}

async fn create_test_server() -> TestApi {
    let storage = Arc::new(
        MultisigStorage::new_with_url("sqlite::memory:")
            .await
            .unwrap(),
    );
    let mock = Arc::new(MockCollaborator::new());
    let collaborator: Arc<dyn ExecutionCollaborator> = mock.clone();
    let engine = MultisigEngine::new(storage, collaborator);
    let server = TestServer::new(MultisigServer::with_engine(engine).create_router()).unwrap();
    TestApi { server, mock }
}

/// Seeds a company with two keyed members and returns
/// (company_id, member_ids).
async fn seed_company(api: &TestApi) -> (i64, Vec<i64>) {
    let response = api.server.post("/companies").json(&json!({"name": "Acme"})).await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let company: Value = response.json();
    let company_id = company["id"].as_i64().unwrap();

    let mut member_ids = Vec::new();
    for (name, key) in [("alice", "aa11"), ("bob", "bb22")] {
        let response = api
            .server
            .post(&format!("/companies/{}/members", company_id))
            .json(&json!({"name": name, "public_key": key}))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        let member: Value = response.json();
        member_ids.push(member["id"].as_i64().unwrap());
    }
    (company_id, member_ids)
}

async fn seed_account(api: &TestApi) -> (String, i64, Vec<i64>) {
    let (company_id, member_ids) = seed_company(api).await;
    let response = api
        .server
        .post("/accounts")
        .json(&json!({
            "name": "treasury",
            "company_id": company_id,
            "creator_member_id": member_ids[0],
            "team_member_ids": [member_ids[1]],
            "threshold": 2,
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let account: Value = response.json();
    (
        account["account_id"].as_str().unwrap().to_string(),
        company_id,
        member_ids,
    )
}

async fn seed_proposal(api: &TestApi, account_id: &str) -> i64 {
    let response = api
        .server
        .post("/proposals/consume")
        .json(&json!({
            "account_id": account_id,
            "note_ids": ["note-1"],
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let proposal: Value = response.json();
    proposal["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let api = create_test_server().await;
    let response = api.server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_create_and_fetch_account() {
    let api = create_test_server().await;
    let (account_id, company_id, _) = seed_account(&api).await;

    let response = api.server.get(&format!("/accounts/{}", account_id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let account: Value = response.json();
    assert_eq!(account["threshold"], 2);
    assert_eq!(account["public_keys"], json!(["aa11", "bb22"]));

    let response = api
        .server
        .get(&format!("/companies/{}/accounts", company_id))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let accounts: Value = response.json();
    assert_eq!(accounts.as_array().unwrap().len(), 1);

    let response = api
        .server
        .get(&format!("/accounts/{}/members", account_id))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let members: Value = response.json();
    assert_eq!(members[0]["key_index"], 0);
    assert_eq!(members[0]["name"], "alice");
}

#[tokio::test]
async fn test_create_account_invalid_threshold_is_400() {
    let api = create_test_server().await;
    let (company_id, member_ids) = seed_company(&api).await;

    let response = api
        .server
        .post("/accounts")
        .json(&json!({
            "name": "bad",
            "company_id": company_id,
            "creator_member_id": member_ids[0],
            "team_member_ids": [member_ids[1]],
            "threshold": 5,
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_THRESHOLD");
}

#[tokio::test]
async fn test_create_account_for_other_company_is_403() {
    let api = create_test_server().await;
    let (_, member_ids) = seed_company(&api).await;

    // a second company the creator does not belong to
    let response = api.server.post("/companies").json(&json!({"name": "Rival"})).await;
    let rival: Value = response.json();

    let response = api
        .server
        .post("/accounts")
        .json(&json!({
            "name": "hijack",
            "company_id": rival["id"],
            "creator_member_id": member_ids[0],
            "team_member_ids": [],
            "threshold": 1,
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["code"], "COMPANY_MISMATCH");
}

#[tokio::test]
async fn test_unknown_account_is_404() {
    let api = create_test_server().await;
    let response = api.server.get("/accounts/0xmissing").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["code"], "ACCOUNT_NOT_FOUND");
}

#[tokio::test]
async fn test_proposal_lifecycle_over_http() {
    let api = create_test_server().await;
    let (account_id, _, _) = seed_account(&api).await;
    let proposal_id = seed_proposal(&api, &account_id).await;

    // first signature: still pending
    let response = api
        .server
        .post(&format!("/proposals/{}/signatures", proposal_id))
        .json(&json!({
            "approver_index": 0,
            "approver_public_key": "0xAA11",
            "signature_hex": "sig-0",
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["signatures_count"], 1);

    // second signature crosses the threshold
    let response = api
        .server
        .post(&format!("/proposals/{}/signatures", proposal_id))
        .json(&json!({
            "approver_index": 1,
            "approver_public_key": "bb22",
            "signature_hex": "sig-1",
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["status"], "READY");

    let response = api
        .server
        .post(&format!("/proposals/{}/execute", proposal_id))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "EXECUTED");
    assert!(body["transaction_id"].is_string());

    let response = api.server.get(&format!("/proposals/{}", proposal_id)).await;
    let body: Value = response.json();
    assert_eq!(body["status"], "EXECUTED");
}

#[tokio::test]
async fn test_execute_below_threshold_is_400() {
    let api = create_test_server().await;
    let (account_id, _, _) = seed_account(&api).await;
    let proposal_id = seed_proposal(&api, &account_id).await;

    let response = api
        .server
        .post(&format!("/proposals/{}/execute", proposal_id))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "INSUFFICIENT_SIGNATURES");
}

#[tokio::test]
async fn test_signature_with_wrong_key_is_400() {
    let api = create_test_server().await;
    let (account_id, _, _) = seed_account(&api).await;
    let proposal_id = seed_proposal(&api, &account_id).await;

    let response = api
        .server
        .post(&format!("/proposals/{}/signatures", proposal_id))
        .json(&json!({
            "approver_index": 0,
            "approver_public_key": "ffff",
            "signature_hex": "sig",
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "APPROVER_KEY_MISMATCH");
}

#[tokio::test]
async fn test_failed_execution_surfaces_reason() {
    let api = create_test_server().await;
    let (account_id, _, _) = seed_account(&api).await;
    let proposal_id = seed_proposal(&api, &account_id).await;

    for (index, key) in [(0, "aa11"), (1, "bb22")] {
        api.server
            .post(&format!("/proposals/{}/signatures", proposal_id))
            .json(&json!({
                "approver_index": index,
                "approver_public_key": key,
                "signature_hex": format!("sig-{}", index),
            }))
            .await;
    }

    api.mock.push_outcome(ExecutionOutcome {
        success: false,
        transaction_id: None,
        error: Some("proof verification failed".to_string()),
    });

    let response = api
        .server
        .post(&format!("/proposals/{}/execute", proposal_id))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["status"], "FAILED");
    assert_eq!(body["error"], "proof verification failed");
}

#[tokio::test]
async fn test_send_batch_proposal() {
    let api = create_test_server().await;
    let (account_id, _, _) = seed_account(&api).await;

    let response = api
        .server
        .post("/proposals/send-batch")
        .json(&json!({
            "account_id": account_id,
            "payments": [
                {"recipient_id": "0xr1", "faucet_id": "0xf", "amount": 100},
                {"recipient_id": "0xr2", "faucet_id": "0xf", "amount": 250},
            ],
            "description": "August payroll",
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["proposal_type"], "SEND");
    assert_eq!(body["payments"].as_array().unwrap().len(), 2);
    assert_eq!(body["description"], "August payroll");
}

#[tokio::test]
async fn test_account_notes_passthrough() {
    let api = create_test_server().await;
    let (account_id, _, _) = seed_account(&api).await;

    api.mock.set_notes(vec![json!({
        "note_id": "note-42",
        "sender": "0xsender",
        "assets": [{"faucet_id": "0xf", "amount": 1000}],
    })]);

    let response = api
        .server
        .get(&format!("/accounts/{}/notes", account_id))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let notes: Value = response.json();
    assert_eq!(notes[0]["note_id"], "note-42");

    // unknown account 404s before the collaborator is consulted
    let response = api.server.get("/accounts/0xmissing/notes").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_company_proposal_listing() {
    let api = create_test_server().await;
    let (account_id, company_id, _) = seed_account(&api).await;
    seed_proposal(&api, &account_id).await;
    seed_proposal(&api, &account_id).await;

    let response = api
        .server
        .get(&format!("/companies/{}/proposals", company_id))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let proposals: Value = response.json();
    assert_eq!(proposals.as_array().unwrap().len(), 2);

    let response = api
        .server
        .get(&format!("/accounts/{}/proposals", account_id))
        .await;
    let proposals: Value = response.json();
    assert_eq!(proposals.as_array().unwrap().len(), 2);
}

//! HTTP client for the transaction-execution collaborator service.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use async_trait::async_trait;

use crate::collaborator::{ExecutionCollaborator, ExecutionOutcome, ProposalBlueprint};
use crate::core::config::CollaboratorConfig;
use crate::core::domain::SendPayment;
use crate::core::errors::MultisigError;

#[derive(Debug, Clone)]
pub struct HttpCollaborator {
    client: reqwest::Client,
    base_url: String,
}

#[derive(serde::Deserialize)]
struct CreateAccountResponse {
    account_id: String,
}

#[derive(serde::Deserialize)]
struct NotesResponse {
    notes: Vec<serde_json::Value>,
}

#[derive(serde::Deserialize)]
struct BalancesResponse {
    balances: Vec<serde_json::Value>,
}

impl HttpCollaborator {
    pub fn new(config: &CollaboratorConfig) -> Result<Self, MultisigError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| MultisigError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, MultisigError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "Calling execution collaborator");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| MultisigError::Collaborator(format!("request to {} failed: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(%url, %status, "Collaborator returned error status");
            return Err(MultisigError::Collaborator(format!(
                "{} returned {}: {}",
                path, status, detail
            )));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| MultisigError::Collaborator(format!("invalid response from {}: {}", path, e)))
    }

    async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, MultisigError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "Querying execution collaborator");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MultisigError::Collaborator(format!("request to {} failed: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(MultisigError::Collaborator(format!(
                "{} returned {}: {}",
                path, status, detail
            )));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| MultisigError::Collaborator(format!("invalid response from {}: {}", path, e)))
    }
}

#[async_trait]
impl ExecutionCollaborator for HttpCollaborator {
    async fn create_account(
        &self,
        public_keys: &[String],
        threshold: u32,
    ) -> Result<String, MultisigError> {
        let response: CreateAccountResponse = self
            .post_json(
                "/multisig/create-account",
                &json!({
                    "public_keys": public_keys,
                    "threshold": threshold,
                }),
            )
            .await?;
        Ok(response.account_id)
    }

    async fn create_consume_proposal(
        &self,
        account_id: &str,
        note_ids: &[String],
    ) -> Result<ProposalBlueprint, MultisigError> {
        self.post_json(
            "/multisig/consume-proposal",
            &json!({
                "account_id": account_id,
                "note_ids": note_ids,
            }),
        )
        .await
    }

    async fn create_send_proposal(
        &self,
        account_id: &str,
        payment: &SendPayment,
    ) -> Result<ProposalBlueprint, MultisigError> {
        self.post_json(
            "/multisig/send-proposal",
            &json!({
                "account_id": account_id,
                "recipient_id": payment.recipient_id,
                "faucet_id": payment.faucet_id,
                "amount": payment.amount,
            }),
        )
        .await
    }

    async fn create_batch_send_proposal(
        &self,
        account_id: &str,
        payments: &[SendPayment],
    ) -> Result<ProposalBlueprint, MultisigError> {
        self.post_json(
            "/multisig/batch-send-proposal",
            &json!({
                "account_id": account_id,
                "recipients": payments,
            }),
        )
        .await
    }

    async fn execute_transaction(
        &self,
        account_id: &str,
        request_bytes_hex: &str,
        summary_bytes_hex: &str,
        signatures_hex: &[Option<String>],
        public_keys_hex: &[String],
    ) -> Result<ExecutionOutcome, MultisigError> {
        self.post_json(
            "/multisig/execute",
            &json!({
                "account_id": account_id,
                "request_bytes_hex": request_bytes_hex,
                "summary_bytes_hex": summary_bytes_hex,
                "signatures_hex": signatures_hex,
                "public_keys_hex": public_keys_hex,
            }),
        )
        .await
    }

    async fn consumable_notes(
        &self,
        account_id: &str,
    ) -> Result<Vec<serde_json::Value>, MultisigError> {
        let response: NotesResponse = self
            .get_json(&format!("/multisig/{}/notes", account_id))
            .await?;
        Ok(response.notes)
    }

    async fn account_balances(
        &self,
        account_id: &str,
    ) -> Result<Vec<serde_json::Value>, MultisigError> {
        let response: BalancesResponse = self
            .get_json(&format!("/multisig/{}/balances", account_id))
            .await?;
        Ok(response.balances)
    }
}

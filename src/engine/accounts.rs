//! Account registry: creating and querying multisig accounts.

use tracing::info;

use crate::core::errors::MultisigError;
use crate::core::validation::normalize_public_key;
use crate::engine::{AccountMemberView, AccountView, MultisigEngine};

/// Parameters for registering a new multisig account.
#[derive(Debug, Clone)]
pub struct CreateAccountParams {
    pub name: String,
    pub company_id: i64,
    /// Team member acting as the creator; always the first approver.
    pub creator_member_id: i64,
    /// Additional approvers. Duplicates and the creator are deduplicated.
    pub team_member_ids: Vec<i64>,
    pub threshold: u32,
}

impl MultisigEngine {
    /// Registers a multisig account: resolves the approver set to public
    /// keys, asks the collaborator to mint the on-chain account, then
    /// persists the account with its member links.
    ///
    /// Approver ordering is creator-first, then the remaining members in
    /// request order with duplicates dropped. The key at index `i` of the
    /// stored account belongs to the `i`-th approver; signature slots are
    /// matched against this ordering for the lifetime of the account.
    pub async fn create_account(
        &self,
        params: CreateAccountParams,
    ) -> Result<AccountView, MultisigError> {
        let storage = self.storage();

        let company = storage
            .get_company(params.company_id)
            .await?
            .ok_or(MultisigError::CompanyNotFound(params.company_id))?;

        if params.threshold < 1 {
            return Err(MultisigError::Validation(
                "threshold must be at least 1".to_string(),
            ));
        }

        // creator first, then the rest in request order, dedup
        let mut member_ids = Vec::with_capacity(params.team_member_ids.len() + 1);
        member_ids.push(params.creator_member_id);
        for id in &params.team_member_ids {
            if !member_ids.contains(id) {
                member_ids.push(*id);
            }
        }

        if params.threshold as usize > member_ids.len() {
            return Err(MultisigError::ThresholdExceedsApproverCount {
                threshold: params.threshold,
                approvers: member_ids.len(),
            });
        }

        let mut public_keys = Vec::with_capacity(member_ids.len());
        let mut member_links = Vec::with_capacity(member_ids.len());
        for (index, member_id) in member_ids.iter().enumerate() {
            let member = storage
                .get_team_member(*member_id)
                .await?
                .ok_or(MultisigError::TeamMemberNotFound(*member_id))?;
            if member.company_id != company.id {
                // acting across company lines is forbidden, not a lookup miss
                if *member_id == params.creator_member_id {
                    return Err(MultisigError::CompanyMismatch);
                }
                return Err(MultisigError::TeamMemberNotFound(*member_id));
            }
            let key = member
                .public_key
                .as_deref()
                .filter(|k| !k.trim().is_empty())
                .ok_or(MultisigError::MissingPublicKey {
                    member_id: *member_id,
                })?;
            public_keys.push(normalize_public_key(key));
            member_links.push((*member_id, index as u32));
        }

        let account_id = self
            .collaborator()
            .create_account(&public_keys, params.threshold)
            .await?;

        let record = storage
            .insert_account(
                &account_id,
                &params.name,
                &public_keys,
                params.threshold,
                company.id,
                &member_links,
            )
            .await?;

        info!(
            account_id = %record.account_id,
            threshold = record.threshold,
            approvers = record.public_keys.len(),
            "Multisig account created"
        );

        Ok(record.into())
    }

    pub async fn get_account_view(&self, account_id: &str) -> Result<AccountView, MultisigError> {
        Ok(self.require_account(account_id).await?.into())
    }

    pub async fn list_company_accounts(
        &self,
        company_id: i64,
    ) -> Result<Vec<AccountView>, MultisigError> {
        let storage = self.storage();
        storage
            .get_company(company_id)
            .await?
            .ok_or(MultisigError::CompanyNotFound(company_id))?;

        let records = storage.list_accounts_by_company(company_id).await?;
        Ok(records.into_iter().map(AccountView::from).collect())
    }

    pub async fn list_account_members(
        &self,
        account_id: &str,
    ) -> Result<Vec<AccountMemberView>, MultisigError> {
        self.require_account(account_id).await?;
        let members = self.storage().list_account_members(account_id).await?;
        Ok(members
            .into_iter()
            .map(|m| AccountMemberView {
                team_member_id: m.team_member_id,
                key_index: m.key_index,
                name: m.name,
                public_key: m.public_key,
            })
            .collect())
    }
}

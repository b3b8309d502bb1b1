//! SQLite-backed storage for the multisig coordination engine.
//!
//! All race-sensitive mutations are expressed as single conditional
//! statements so concurrent HTTP callers cannot interleave partial writes:
//! signature upsert (`ON CONFLICT DO UPDATE`), the PENDING→READY flip
//! (`WHERE status = 'PENDING'`), the execution claim and the terminal
//! commits (`WHERE status IN ('PENDING','READY')`).

use chrono::NaiveDateTime;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::types::chrono::Utc;
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::config::StorageConfig;
use crate::core::domain::{ProposalKind, ProposalStatus, SendPayment};
use crate::core::errors::MultisigError;

type Result<T> = std::result::Result<T, MultisigError>;

fn db_err(context: &str, e: impl std::fmt::Display) -> MultisigError {
    MultisigError::Storage(format!("{}: {}", context, e))
}

#[derive(Debug, Clone)]
pub struct CompanyRecord {
    pub id: i64,
    pub name: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct TeamMemberRecord {
    pub id: i64,
    pub company_id: i64,
    pub name: String,
    pub public_key: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub account_id: String,
    pub name: String,
    pub public_keys: Vec<String>,
    pub threshold: u32,
    pub company_id: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct AccountMemberRecord {
    pub team_member_id: i64,
    pub key_index: u32,
    pub name: String,
    pub public_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProposalRecord {
    pub id: i64,
    pub uuid: String,
    pub account_id: String,
    pub description: String,
    pub kind: ProposalKind,
    pub summary_commitment: String,
    pub summary_bytes_hex: String,
    pub request_bytes_hex: String,
    pub note_ids: Vec<String>,
    pub recipient_id: Option<String>,
    pub faucet_id: Option<String>,
    pub amount: Option<i64>,
    pub payments: Vec<SendPayment>,
    pub status: ProposalStatus,
    pub transaction_id: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct SignatureRecord {
    pub proposal_id: i64,
    pub approver_index: u32,
    pub approver_public_key: String,
    pub signature_hex: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Insert payload for a new proposal row. The blueprint triple
/// (commitment + the two byte blobs) is written here once and no update
/// statement in this module ever touches those columns again.
#[derive(Debug)]
pub struct NewProposal<'a> {
    pub account_id: &'a str,
    pub description: &'a str,
    pub kind: ProposalKind,
    pub summary_commitment: &'a str,
    pub summary_bytes_hex: &'a str,
    pub request_bytes_hex: &'a str,
    pub note_ids: &'a [String],
    pub recipient_id: Option<&'a str>,
    pub faucet_id: Option<&'a str>,
    pub amount: Option<i64>,
    pub payments: &'a [SendPayment],
}

#[derive(Debug)]
pub struct MultisigStorage {
    pool: SqlitePool,
    is_memory: bool,
}

impl MultisigStorage {
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        Self::connect(
            &config.database_url,
            config.max_connections.unwrap_or(20),
            config.connection_timeout_seconds.unwrap_or(30),
        )
        .await
    }

    pub async fn new_with_url(database_url: &str) -> Result<Self> {
        Self::connect(database_url, 20, 30).await
    }

    async fn connect(database_url: &str, max_connections: u32, timeout_seconds: u64) -> Result<Self> {
        // normalize sqlite URLs: accept "sqlite:" or "sqlite://"
        let mut db_url = database_url.to_string();
        if db_url.starts_with("sqlite:") && !db_url.starts_with("sqlite://") {
            db_url = db_url.replacen("sqlite:", "sqlite://", 1);
        }

        // ensure parent directory exists for file-backed sqlite URLs
        if let Some(path) = db_url.strip_prefix("sqlite://") {
            let path_only = path.split('?').next().unwrap_or(path);
            if path_only != ":memory:" && !path_only.is_empty() {
                if let Some(parent) = std::path::Path::new(path_only).parent() {
                    if !parent.as_os_str().is_empty() {
                        if let Err(e) = std::fs::create_dir_all(parent) {
                            warn!("Failed to create database dir {:?}: {}", parent, e);
                        }
                    }
                }
            }
        }

        let is_memory = db_url.contains(":memory:");
        info!(memory = is_memory, "[storage] connecting to database");

        let connect_options = SqliteConnectOptions::from_str(&db_url)
            .map_err(|e| db_err("invalid database URL", e))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        // An in-memory database exists per connection; the pool must not
        // hand out a second connection pointing at an empty database.
        let max_connections = if is_memory { 1 } else { max_connections };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(timeout_seconds))
            .connect_with(connect_options)
            .await
            .map_err(|e| db_err("failed to connect to database", e))?;

        let storage = Self { pool, is_memory };
        storage.initialize_schema().await?;

        info!("Multisig storage initialized");
        Ok(storage)
    }

    pub fn is_in_memory(&self) -> bool {
        self.is_memory
    }

    async fn initialize_schema(&self) -> Result<()> {
        debug!("Initializing database schema");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS companies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                created_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("failed to create companies table", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS team_members (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                company_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                public_key TEXT,
                created_at DATETIME NOT NULL,
                FOREIGN KEY (company_id) REFERENCES companies (id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("failed to create team_members table", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS multisig_accounts (
                account_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                public_keys TEXT NOT NULL,
                threshold INTEGER NOT NULL,
                company_id INTEGER NOT NULL,
                created_at DATETIME NOT NULL,
                FOREIGN KEY (company_id) REFERENCES companies (id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("failed to create multisig_accounts table", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS multisig_account_members (
                account_id TEXT NOT NULL,
                team_member_id INTEGER NOT NULL,
                key_index INTEGER NOT NULL,
                created_at DATETIME NOT NULL,
                PRIMARY KEY (account_id, team_member_id),
                FOREIGN KEY (account_id) REFERENCES multisig_accounts (account_id),
                FOREIGN KEY (team_member_id) REFERENCES team_members (id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("failed to create multisig_account_members table", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS multisig_proposals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                uuid TEXT NOT NULL UNIQUE,
                account_id TEXT NOT NULL,
                description TEXT NOT NULL,
                proposal_type TEXT NOT NULL,
                summary_commitment TEXT NOT NULL,
                summary_bytes_hex TEXT NOT NULL,
                request_bytes_hex TEXT NOT NULL,
                note_ids TEXT NOT NULL,
                recipient_id TEXT,
                faucet_id TEXT,
                amount INTEGER,
                payments TEXT NOT NULL,
                status TEXT NOT NULL,
                transaction_id TEXT,
                failure_reason TEXT,
                executing INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                FOREIGN KEY (account_id) REFERENCES multisig_accounts (account_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("failed to create multisig_proposals table", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS multisig_signatures (
                proposal_id INTEGER NOT NULL,
                approver_index INTEGER NOT NULL,
                approver_public_key TEXT NOT NULL,
                signature_hex TEXT NOT NULL,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL,
                PRIMARY KEY (proposal_id, approver_index),
                FOREIGN KEY (proposal_id) REFERENCES multisig_proposals (id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("failed to create multisig_signatures table", e))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_accounts_company_id ON multisig_accounts (company_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("failed to create index", e))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_proposals_account_id ON multisig_proposals (account_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("failed to create index", e))?;

        debug!("Database schema initialized");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Companies / team members (support records for registry preconditions)
    // ------------------------------------------------------------------

    pub async fn create_company(&self, name: &str) -> Result<CompanyRecord> {
        let now = Utc::now().naive_utc();
        let result = sqlx::query("INSERT INTO companies (name, created_at) VALUES (?1, ?2)")
            .bind(name)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("failed to create company", e))?;

        Ok(CompanyRecord {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            created_at: now,
        })
    }

    pub async fn get_company(&self, id: i64) -> Result<Option<CompanyRecord>> {
        let row = sqlx::query("SELECT id, name, created_at FROM companies WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_err("failed to load company", e))?;

        Ok(row.map(|row| CompanyRecord {
            id: row.get("id"),
            name: row.get("name"),
            created_at: row.get("created_at"),
        }))
    }

    pub async fn create_team_member(
        &self,
        company_id: i64,
        name: &str,
        public_key: Option<&str>,
    ) -> Result<TeamMemberRecord> {
        let now = Utc::now().naive_utc();
        let result = sqlx::query(
            "INSERT INTO team_members (company_id, name, public_key, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(company_id)
        .bind(name)
        .bind(public_key)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("failed to create team member", e))?;

        Ok(TeamMemberRecord {
            id: result.last_insert_rowid(),
            company_id,
            name: name.to_string(),
            public_key: public_key.map(|k| k.to_string()),
            created_at: now,
        })
    }

    pub async fn get_team_member(&self, id: i64) -> Result<Option<TeamMemberRecord>> {
        let row = sqlx::query(
            "SELECT id, company_id, name, public_key, created_at FROM team_members WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("failed to load team member", e))?;

        Ok(row.map(|row| TeamMemberRecord {
            id: row.get("id"),
            company_id: row.get("company_id"),
            name: row.get("name"),
            public_key: row.get("public_key"),
            created_at: row.get("created_at"),
        }))
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    pub async fn insert_account(
        &self,
        account_id: &str,
        name: &str,
        public_keys: &[String],
        threshold: u32,
        company_id: i64,
        members: &[(i64, u32)],
    ) -> Result<AccountRecord> {
        debug!(account_id, "Storing multisig account");

        let now = Utc::now().naive_utc();
        let keys_json = serde_json::to_string(public_keys)
            .map_err(|e| db_err("failed to encode public keys", e))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_err("failed to begin transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO multisig_accounts (account_id, name, public_keys, threshold, company_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(account_id)
        .bind(name)
        .bind(&keys_json)
        .bind(threshold as i64)
        .bind(company_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_err("failed to store multisig account", e))?;

        for (team_member_id, key_index) in members {
            sqlx::query(
                r#"
                INSERT INTO multisig_account_members (account_id, team_member_id, key_index, created_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(account_id)
            .bind(team_member_id)
            .bind(*key_index as i64)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("failed to store account member", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| db_err("failed to commit account", e))?;

        Ok(AccountRecord {
            account_id: account_id.to_string(),
            name: name.to_string(),
            public_keys: public_keys.to_vec(),
            threshold,
            company_id,
            created_at: now,
        })
    }

    pub async fn get_account(&self, account_id: &str) -> Result<Option<AccountRecord>> {
        let row = sqlx::query(
            "SELECT account_id, name, public_keys, threshold, company_id, created_at \
             FROM multisig_accounts WHERE account_id = ?1",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("failed to load multisig account", e))?;

        row.map(|row| account_from_row(&row)).transpose()
    }

    pub async fn list_accounts_by_company(&self, company_id: i64) -> Result<Vec<AccountRecord>> {
        let rows = sqlx::query(
            "SELECT account_id, name, public_keys, threshold, company_id, created_at \
             FROM multisig_accounts WHERE company_id = ?1 ORDER BY created_at DESC",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("failed to list multisig accounts", e))?;

        rows.iter().map(account_from_row).collect()
    }

    pub async fn list_account_members(&self, account_id: &str) -> Result<Vec<AccountMemberRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT m.team_member_id, m.key_index, t.name, t.public_key
            FROM multisig_account_members m
            JOIN team_members t ON t.id = m.team_member_id
            WHERE m.account_id = ?1
            ORDER BY m.key_index ASC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("failed to list account members", e))?;

        Ok(rows
            .iter()
            .map(|row| AccountMemberRecord {
                team_member_id: row.get("team_member_id"),
                key_index: row.get::<i64, _>("key_index") as u32,
                name: row.get("name"),
                public_key: row.get("public_key"),
            })
            .collect())
    }

    // ------------------------------------------------------------------
    // Proposals
    // ------------------------------------------------------------------

    pub async fn insert_proposal(&self, proposal: NewProposal<'_>) -> Result<ProposalRecord> {
        debug!(account_id = proposal.account_id, "Storing proposal");

        let now = Utc::now().naive_utc();
        let uuid = uuid::Uuid::new_v4().to_string();
        let note_ids_json = serde_json::to_string(proposal.note_ids)
            .map_err(|e| db_err("failed to encode note ids", e))?;
        let payments_json = serde_json::to_string(proposal.payments)
            .map_err(|e| db_err("failed to encode payments", e))?;

        let result = sqlx::query(
            r#"
            INSERT INTO multisig_proposals
                (uuid, account_id, description, proposal_type,
                 summary_commitment, summary_bytes_hex, request_bytes_hex,
                 note_ids, recipient_id, faucet_id, amount, payments,
                 status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)
            "#,
        )
        .bind(&uuid)
        .bind(proposal.account_id)
        .bind(proposal.description)
        .bind(proposal.kind.as_str())
        .bind(proposal.summary_commitment)
        .bind(proposal.summary_bytes_hex)
        .bind(proposal.request_bytes_hex)
        .bind(&note_ids_json)
        .bind(proposal.recipient_id)
        .bind(proposal.faucet_id)
        .bind(proposal.amount)
        .bind(&payments_json)
        .bind(ProposalStatus::Pending.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("failed to store proposal", e))?;

        let id = result.last_insert_rowid();
        self.get_proposal(id)
            .await?
            .ok_or_else(|| MultisigError::Storage("inserted proposal not found".to_string()))
    }

    pub async fn get_proposal(&self, id: i64) -> Result<Option<ProposalRecord>> {
        let row = sqlx::query(PROPOSAL_SELECT_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_err("failed to load proposal", e))?;

        row.map(|row| proposal_from_row(&row)).transpose()
    }

    pub async fn list_proposals_by_account(&self, account_id: &str) -> Result<Vec<ProposalRecord>> {
        let rows = sqlx::query(&format!(
            "{} WHERE account_id = ?1 ORDER BY created_at DESC",
            PROPOSAL_SELECT
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("failed to list proposals", e))?;

        rows.iter().map(proposal_from_row).collect()
    }

    /// Proposals across every account of a company, paired with the owning
    /// account's threshold (denormalized for the view layer).
    pub async fn list_proposals_by_company(
        &self,
        company_id: i64,
    ) -> Result<Vec<(ProposalRecord, u32)>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.uuid, p.account_id, p.description, p.proposal_type,
                   p.summary_commitment, p.summary_bytes_hex, p.request_bytes_hex,
                   p.note_ids, p.recipient_id, p.faucet_id, p.amount, p.payments,
                   p.status, p.transaction_id, p.failure_reason, p.created_at, p.updated_at,
                   a.threshold AS account_threshold
            FROM multisig_proposals p
            JOIN multisig_accounts a ON a.account_id = p.account_id
            WHERE a.company_id = ?1
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("failed to list company proposals", e))?;

        rows.iter()
            .map(|row| {
                let threshold = row.get::<i64, _>("account_threshold") as u32;
                proposal_from_row(row).map(|record| (record, threshold))
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Signatures
    // ------------------------------------------------------------------

    /// Atomic insert-or-overwrite on the (proposal, approver index) slot.
    /// A re-sign replaces the signature bytes without creating a second row,
    /// so racing submissions for the same slot leave exactly one winner.
    /// The insert reads the proposal row in the same statement, so a
    /// proposal that went terminal between the caller's status check and
    /// this write takes no signature: returns `false` in that case.
    pub async fn upsert_signature(
        &self,
        proposal_id: i64,
        approver_index: u32,
        approver_public_key: &str,
        signature_hex: &str,
    ) -> Result<bool> {
        let now = Utc::now().naive_utc();
        let result = sqlx::query(
            r#"
            INSERT INTO multisig_signatures
                (proposal_id, approver_index, approver_public_key, signature_hex, created_at, updated_at)
            SELECT id, ?2, ?3, ?4, ?5, ?5
            FROM multisig_proposals
            WHERE id = ?1 AND status IN (?6, ?7)
            ON CONFLICT(proposal_id, approver_index) DO UPDATE SET
                signature_hex = excluded.signature_hex,
                approver_public_key = excluded.approver_public_key,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(proposal_id)
        .bind(approver_index as i64)
        .bind(approver_public_key)
        .bind(signature_hex)
        .bind(now)
        .bind(ProposalStatus::Pending.as_str())
        .bind(ProposalStatus::Ready.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("failed to upsert signature", e))?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_signatures(&self, proposal_id: i64) -> Result<Vec<SignatureRecord>> {
        let rows = sqlx::query(
            "SELECT proposal_id, approver_index, approver_public_key, signature_hex, created_at, updated_at \
             FROM multisig_signatures WHERE proposal_id = ?1 ORDER BY approver_index ASC",
        )
        .bind(proposal_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("failed to list signatures", e))?;

        Ok(rows
            .iter()
            .map(|row| SignatureRecord {
                proposal_id: row.get("proposal_id"),
                approver_index: row.get::<i64, _>("approver_index") as u32,
                approver_public_key: row.get("approver_public_key"),
                signature_hex: row.get("signature_hex"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            })
            .collect())
    }

    pub async fn count_signatures(&self, proposal_id: i64) -> Result<u32> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM multisig_signatures WHERE proposal_id = ?1")
            .bind(proposal_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_err("failed to count signatures", e))?;

        Ok(row.get::<i64, _>("n") as u32)
    }

    // ------------------------------------------------------------------
    // Status transitions
    // ------------------------------------------------------------------

    /// Conditional PENDING→READY flip. Returns whether this caller performed
    /// the transition; concurrent threshold-crossers see `false` and move on.
    pub async fn mark_ready_if_pending(&self, proposal_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE multisig_proposals SET status = ?1, updated_at = ?2 \
             WHERE id = ?3 AND status = ?4",
        )
        .bind(ProposalStatus::Ready.as_str())
        .bind(Utc::now().naive_utc())
        .bind(proposal_id)
        .bind(ProposalStatus::Pending.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("failed to mark proposal ready", e))?;

        Ok(result.rows_affected() > 0)
    }

    /// Claims the proposal for execution. At most one caller wins the claim
    /// while the proposal is still live; the winner is obligated to finish
    /// with a terminal commit.
    pub async fn claim_execution(&self, proposal_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE multisig_proposals SET executing = 1, updated_at = ?1 \
             WHERE id = ?2 AND executing = 0 AND status IN (?3, ?4)",
        )
        .bind(Utc::now().naive_utc())
        .bind(proposal_id)
        .bind(ProposalStatus::Pending.as_str())
        .bind(ProposalStatus::Ready.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("failed to claim execution", e))?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn commit_executed(&self, proposal_id: i64, transaction_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE multisig_proposals \
             SET status = ?1, transaction_id = ?2, executing = 0, updated_at = ?3 \
             WHERE id = ?4 AND status IN (?5, ?6)",
        )
        .bind(ProposalStatus::Executed.as_str())
        .bind(transaction_id)
        .bind(Utc::now().naive_utc())
        .bind(proposal_id)
        .bind(ProposalStatus::Pending.as_str())
        .bind(ProposalStatus::Ready.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("failed to commit executed status", e))?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn commit_failed(&self, proposal_id: i64, reason: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE multisig_proposals \
             SET status = ?1, failure_reason = ?2, executing = 0, updated_at = ?3 \
             WHERE id = ?4 AND status IN (?5, ?6)",
        )
        .bind(ProposalStatus::Failed.as_str())
        .bind(reason)
        .bind(Utc::now().naive_utc())
        .bind(proposal_id)
        .bind(ProposalStatus::Pending.as_str())
        .bind(ProposalStatus::Ready.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("failed to commit failed status", e))?;

        Ok(result.rows_affected() > 0)
    }
}

const PROPOSAL_SELECT: &str = "SELECT id, uuid, account_id, description, proposal_type, \
     summary_commitment, summary_bytes_hex, request_bytes_hex, \
     note_ids, recipient_id, faucet_id, amount, payments, \
     status, transaction_id, failure_reason, created_at, updated_at \
     FROM multisig_proposals";

const PROPOSAL_SELECT_BY_ID: &str = "SELECT id, uuid, account_id, description, proposal_type, \
     summary_commitment, summary_bytes_hex, request_bytes_hex, \
     note_ids, recipient_id, faucet_id, amount, payments, \
     status, transaction_id, failure_reason, created_at, updated_at \
     FROM multisig_proposals WHERE id = ?1";

fn account_from_row(row: &SqliteRow) -> Result<AccountRecord> {
    let keys_json: String = row.get("public_keys");
    let public_keys: Vec<String> =
        serde_json::from_str(&keys_json).map_err(|e| db_err("corrupt public_keys column", e))?;

    Ok(AccountRecord {
        account_id: row.get("account_id"),
        name: row.get("name"),
        public_keys,
        threshold: row.get::<i64, _>("threshold") as u32,
        company_id: row.get("company_id"),
        created_at: row.get("created_at"),
    })
}

fn proposal_from_row(row: &SqliteRow) -> Result<ProposalRecord> {
    let status_raw: String = row.get("status");
    let status = ProposalStatus::parse(&status_raw)
        .ok_or_else(|| db_err("corrupt status column", &status_raw))?;

    let kind_raw: String = row.get("proposal_type");
    let kind = ProposalKind::parse(&kind_raw)
        .ok_or_else(|| db_err("corrupt proposal_type column", &kind_raw))?;

    let note_ids_json: String = row.get("note_ids");
    let note_ids: Vec<String> =
        serde_json::from_str(&note_ids_json).map_err(|e| db_err("corrupt note_ids column", e))?;

    let payments_json: String = row.get("payments");
    let payments: Vec<SendPayment> =
        serde_json::from_str(&payments_json).map_err(|e| db_err("corrupt payments column", e))?;

    Ok(ProposalRecord {
        id: row.get("id"),
        uuid: row.get("uuid"),
        account_id: row.get("account_id"),
        description: row.get("description"),
        kind,
        summary_commitment: row.get("summary_commitment"),
        summary_bytes_hex: row.get("summary_bytes_hex"),
        request_bytes_hex: row.get("request_bytes_hex"),
        note_ids,
        recipient_id: row.get("recipient_id"),
        faucet_id: row.get("faucet_id"),
        amount: row.get("amount"),
        payments,
        status,
        transaction_id: row.get("transaction_id"),
        failure_reason: row.get("failure_reason"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_storage() -> MultisigStorage {
        MultisigStorage::new_with_url("sqlite::memory:").await.unwrap()
    }

    fn sample_proposal<'a>(account_id: &'a str, note_ids: &'a [String]) -> NewProposal<'a> {
        NewProposal {
            account_id,
            description: "test proposal",
            kind: ProposalKind::Consume,
            summary_commitment: "0xcommit",
            summary_bytes_hex: "aabb",
            request_bytes_hex: "ccdd",
            note_ids,
            recipient_id: None,
            faucet_id: None,
            amount: None,
            payments: &[],
        }
    }

    async fn seed_account(storage: &MultisigStorage) -> String {
        let company = storage.create_company("Acme").await.unwrap();
        let member = storage
            .create_team_member(company.id, "alice", Some("aa"))
            .await
            .unwrap();
        storage
            .insert_account(
                "0xacc1",
                "treasury",
                &["aa".to_string(), "bb".to_string()],
                2,
                company.id,
                &[(member.id, 0)],
            )
            .await
            .unwrap();
        "0xacc1".to_string()
    }

    #[tokio::test]
    async fn test_file_backed_database_with_short_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}/nested/multisig.db?mode=rwc", dir.path().display());

        let storage = MultisigStorage::connect(&url, 5, 5).await.unwrap();
        assert!(!storage.is_in_memory());

        let company = storage.create_company("Persisted").await.unwrap();
        assert_eq!(storage.get_company(company.id).await.unwrap().unwrap().name, "Persisted");
    }

    #[tokio::test]
    async fn test_account_roundtrip() {
        let storage = memory_storage().await;
        let account_id = seed_account(&storage).await;

        let account = storage.get_account(&account_id).await.unwrap().unwrap();
        assert_eq!(account.public_keys, vec!["aa", "bb"]);
        assert_eq!(account.threshold, 2);

        let members = storage.list_account_members(&account_id).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].key_index, 0);
        assert_eq!(members[0].public_key.as_deref(), Some("aa"));
    }

    #[tokio::test]
    async fn test_signature_upsert_overwrites_single_row() {
        let storage = memory_storage().await;
        let account_id = seed_account(&storage).await;
        let notes = vec!["n1".to_string()];
        let proposal = storage
            .insert_proposal(sample_proposal(&account_id, &notes))
            .await
            .unwrap();

        assert!(storage.upsert_signature(proposal.id, 0, "aa", "sig1").await.unwrap());
        assert!(storage.upsert_signature(proposal.id, 0, "aa", "sig2").await.unwrap());

        assert_eq!(storage.count_signatures(proposal.id).await.unwrap(), 1);
        let sigs = storage.list_signatures(proposal.id).await.unwrap();
        assert_eq!(sigs[0].signature_hex, "sig2");
    }

    #[tokio::test]
    async fn test_signature_upsert_refuses_terminal_proposal() {
        let storage = memory_storage().await;
        let account_id = seed_account(&storage).await;
        let notes = vec!["n1".to_string()];
        let proposal = storage
            .insert_proposal(sample_proposal(&account_id, &notes))
            .await
            .unwrap();

        storage.commit_failed(proposal.id, "rejected").await.unwrap();

        assert!(!storage.upsert_signature(proposal.id, 0, "aa", "late").await.unwrap());
        assert_eq!(storage.count_signatures(proposal.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ready_flip_only_from_pending() {
        let storage = memory_storage().await;
        let account_id = seed_account(&storage).await;
        let notes = vec!["n1".to_string()];
        let proposal = storage
            .insert_proposal(sample_proposal(&account_id, &notes))
            .await
            .unwrap();

        assert!(storage.mark_ready_if_pending(proposal.id).await.unwrap());
        // second flip is a no-op, not an error
        assert!(!storage.mark_ready_if_pending(proposal.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_execution_claim_is_exclusive_and_terminal_commit_absorbs() {
        let storage = memory_storage().await;
        let account_id = seed_account(&storage).await;
        let notes = vec!["n1".to_string()];
        let proposal = storage
            .insert_proposal(sample_proposal(&account_id, &notes))
            .await
            .unwrap();

        assert!(storage.claim_execution(proposal.id).await.unwrap());
        assert!(!storage.claim_execution(proposal.id).await.unwrap());

        assert!(storage.commit_executed(proposal.id, "0xabc").await.unwrap());
        let stored = storage.get_proposal(proposal.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ProposalStatus::Executed);
        assert_eq!(stored.transaction_id.as_deref(), Some("0xabc"));

        // terminal state absorbs later commits and claims
        assert!(!storage.commit_failed(proposal.id, "late").await.unwrap());
        assert!(!storage.claim_execution(proposal.id).await.unwrap());
    }
}

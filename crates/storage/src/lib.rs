use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::{
    domain::{ContractId, ContractStatus},
    protocol::ContractSummary,
};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct NewContract {
    pub client_name: String,
    pub client_email: String,
    pub payment_amount: String,
    pub net_payment_amount: f64,
    pub requirements: String,
    pub description: String,
    pub code: String,
    pub output_path: String,
}

#[derive(Debug, Clone)]
pub struct StoredContract {
    pub contract_id: ContractId,
    pub client_name: String,
    pub client_email: String,
    pub payment_amount: String,
    pub net_payment_amount: f64,
    pub requirements: String,
    pub description: String,
    pub code: String,
    pub output_path: String,
    pub status: ContractStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredContract {
    pub fn summary(&self) -> ContractSummary {
        ContractSummary {
            contract_id: self.contract_id,
            client_name: self.client_name.clone(),
            client_email: self.client_email.clone(),
            payment_amount: self.payment_amount.clone(),
            net_payment_amount: self.net_payment_amount,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

const CONTRACT_COLUMNS: &str = "id, client_name, client_email, payment_amount, net_payment_amount, \
     requirements, description, code, output_path, status, created_at, updated_at";

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // every connection to an in-memory database opens a fresh, empty one
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Records a freshly generated contract. New contracts always start out
    /// awaiting confirmation.
    pub async fn create_contract(&self, contract: &NewContract) -> Result<ContractId> {
        let now = Utc::now();
        let rec = sqlx::query(
            "INSERT INTO contracts (
                client_name, client_email, payment_amount, net_payment_amount,
                requirements, description, code, output_path, status, created_at, updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(&contract.client_name)
        .bind(&contract.client_email)
        .bind(&contract.payment_amount)
        .bind(contract.net_payment_amount)
        .bind(&contract.requirements)
        .bind(&contract.description)
        .bind(&contract.code)
        .bind(&contract.output_path)
        .bind(ContractStatus::AwaitingConfirmation.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert contract")?;
        Ok(ContractId(rec.get::<i64, _>(0)))
    }

    pub async fn get_contract(&self, contract_id: ContractId) -> Result<Option<StoredContract>> {
        let row = sqlx::query(&format!(
            "SELECT {CONTRACT_COLUMNS} FROM contracts WHERE id = ?"
        ))
        .bind(contract_id.0)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to load contract {}", contract_id.0))?;
        row.map(|row| contract_from_row(&row)).transpose()
    }

    /// Newest first.
    pub async fn list_contracts(&self, limit: u32) -> Result<Vec<StoredContract>> {
        let rows = sqlx::query(&format!(
            "SELECT {CONTRACT_COLUMNS} FROM contracts ORDER BY id DESC LIMIT ?"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .context("failed to list contracts")?;
        rows.iter().map(contract_from_row).collect()
    }

    /// Returns `false` when no contract has the given id.
    pub async fn update_contract_status(
        &self,
        contract_id: ContractId,
        status: ContractStatus,
    ) -> Result<bool> {
        let result =
            sqlx::query("UPDATE contracts SET status = ?, updated_at = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(Utc::now())
                .bind(contract_id.0)
                .execute(&self.pool)
                .await
                .with_context(|| format!("failed to update status of contract {}", contract_id.0))?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_contract(&self, contract_id: ContractId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM contracts WHERE id = ?")
            .bind(contract_id.0)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete contract {}", contract_id.0))?;
        Ok(result.rows_affected() > 0)
    }
}

fn contract_from_row(row: &SqliteRow) -> Result<StoredContract> {
    let raw_status: String = row.try_get("status")?;
    let status = raw_status
        .parse::<ContractStatus>()
        .context("stored contract has an unreadable status")?;

    Ok(StoredContract {
        contract_id: ContractId(row.try_get("id")?),
        client_name: row.try_get("client_name")?,
        client_email: row.try_get("client_email")?,
        payment_amount: row.try_get("payment_amount")?,
        net_payment_amount: row.try_get("net_payment_amount")?,
        requirements: row.try_get("requirements")?,
        description: row.try_get("description")?,
        code: row.try_get("code")?,
        output_path: row.try_get("output_path")?,
        status,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

use std::{path::PathBuf, sync::Arc};

use shared::{
    domain::{ContractId, ContractRequest, ContractStatus},
    error::ApiError,
    protocol::ContractSummary,
};
use storage::{NewContract, Storage};
use thiserror::Error;
use tracing::{error, info, warn};

pub mod email;
pub mod extractor;
pub mod template;

pub use extractor::{ChatCompletionConfig, ChatCompletionExtractor, RequirementsExtractor};
use template::{write_solidity_file, SolidityTemplate};

/// Share of every payment kept by the platform.
pub const PLATFORM_FEE_RATE: f64 = 0.05;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub extractor: Arc<dyn RequirementsExtractor>,
    pub files: ContractFiles,
}

#[derive(Debug, Clone)]
pub struct ContractFiles {
    /// JSON file holding the `contractTemplate` string. Read on every request.
    pub template_path: PathBuf,
    /// Destination of the generated `.sol` file; overwritten each time.
    pub output_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct GeneratedContract {
    pub contract_id: ContractId,
    pub requirements: String,
    pub code: String,
    pub net_payment_amount: f64,
}

/// Failures of the contract generation pipeline. `Display` yields the plain
/// text sent back to the submitting form.
#[derive(Debug, Error)]
pub enum GenerateContractError {
    #[error("Request body is empty")]
    EmptyBody,
    #[error("Failed to decode request body")]
    Decode(#[source] serde_json::Error),
    #[error("Failed to extract requirements")]
    Extraction(anyhow::Error),
    #[error("Failed to generate smart contract")]
    Template(anyhow::Error),
    #[error("Failed to save smart contract")]
    Save(anyhow::Error),
    #[error("Failed to record smart contract")]
    Record(anyhow::Error),
}

impl GenerateContractError {
    pub fn status_code(&self) -> u16 {
        match self {
            GenerateContractError::EmptyBody | GenerateContractError::Decode(_) => 400,
            GenerateContractError::Extraction(_)
            | GenerateContractError::Template(_)
            | GenerateContractError::Save(_)
            | GenerateContractError::Record(_) => 500,
        }
    }

    /// Underlying cause, for logs only.
    pub fn detail(&self) -> String {
        match self {
            GenerateContractError::EmptyBody => self.to_string(),
            GenerateContractError::Decode(err) => err.to_string(),
            GenerateContractError::Extraction(err)
            | GenerateContractError::Template(err)
            | GenerateContractError::Save(err)
            | GenerateContractError::Record(err) => format!("{err:#}"),
        }
    }
}

pub fn net_payment_amount(payment_amount: f64) -> f64 {
    payment_amount - PLATFORM_FEE_RATE * payment_amount
}

/// Payment amounts arrive as raw form text. Anything that is not a finite,
/// non-negative number counts as zero; the raw text is still recorded.
pub fn parse_payment_amount(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed.parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount >= 0.0 => amount,
        _ => {
            warn!(payment_amount = %raw, "payment amount is not a number, using 0");
            0.0
        }
    }
}

pub fn decode_contract_request(body: &[u8]) -> Result<ContractRequest, GenerateContractError> {
    if body.is_empty() {
        return Err(GenerateContractError::EmptyBody);
    }
    serde_json::from_slice(body).map_err(GenerateContractError::Decode)
}

pub async fn generate_contract(
    ctx: &ApiContext,
    body: &[u8],
) -> Result<GeneratedContract, GenerateContractError> {
    let request = decode_contract_request(body)?;
    info!(
        client_name = %request.client_name,
        client_email = %request.client_email,
        payment_amount = %request.payment_amount,
        "received contract request"
    );

    let payment_amount = parse_payment_amount(&request.payment_amount);

    let requirements = ctx
        .extractor
        .extract(&request, payment_amount)
        .await
        .map_err(GenerateContractError::Extraction)?;
    info!(%requirements, "extracted requirements");

    let template = SolidityTemplate::load(&ctx.files.template_path)
        .await
        .map_err(GenerateContractError::Template)?;
    let fields = ContractRequest {
        requirements: requirements.clone(),
        ..request.clone()
    };
    let code = template.populate(&fields);
    info!("generated smart contract");

    write_solidity_file(&code, &ctx.files.output_path)
        .await
        .map_err(GenerateContractError::Save)?;
    info!(path = %ctx.files.output_path.display(), "saved smart contract");

    let net_payment_amount = net_payment_amount(payment_amount);
    let contract_id = ctx
        .storage
        .create_contract(&NewContract {
            client_name: request.client_name,
            client_email: request.client_email,
            payment_amount: request.payment_amount,
            net_payment_amount,
            requirements: requirements.clone(),
            description: request.description,
            code: code.clone(),
            output_path: ctx.files.output_path.display().to_string(),
        })
        .await
        .map_err(GenerateContractError::Record)?;

    Ok(GeneratedContract {
        contract_id,
        requirements,
        code,
        net_payment_amount,
    })
}

pub async fn contract_summary(
    ctx: &ApiContext,
    contract_id: ContractId,
) -> Result<ContractSummary, ApiError> {
    let contract = ctx
        .storage
        .get_contract(contract_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found("contract not found"))?;
    Ok(contract.summary())
}

pub async fn set_contract_status(
    ctx: &ApiContext,
    contract_id: ContractId,
    status: ContractStatus,
) -> Result<(), ApiError> {
    let updated = ctx
        .storage
        .update_contract_status(contract_id, status)
        .await
        .map_err(internal)?;
    if !updated {
        return Err(ApiError::not_found("contract not found"));
    }
    info!(contract_id = contract_id.0, %status, "contract status updated");
    Ok(())
}

fn internal(err: anyhow::Error) -> ApiError {
    error!(error = %format!("{err:#}"), "contract storage failure");
    ApiError::internal(err.to_string())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ContractId, ContractStatus};

pub const GENERATE_CONTRACT_ROUTE: &str = "/generate_contract";
pub const HEALTHZ_ROUTE: &str = "/healthz";

/// Plain-text body returned when a contract was generated and written out.
pub const GENERATE_CONTRACT_SUCCESS: &str = "Contract generated and saved successfully";

pub fn contract_route(contract_id: ContractId) -> String {
    format!("/contracts/{}", contract_id.0)
}

pub fn contract_status_route(contract_id: ContractId) -> String {
    format!("/contracts/{}/status", contract_id.0)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractSummary {
    pub contract_id: ContractId,
    pub client_name: String,
    pub client_email: String,
    pub payment_amount: String,
    pub net_payment_amount: f64,
    pub status: ContractStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateContractStatusRequest {
    pub status: ContractStatus,
}

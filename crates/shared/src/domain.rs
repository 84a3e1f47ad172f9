use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(ContractId);

/// The five form fields submitted for contract generation.
///
/// Values travel exactly as typed: nothing is trimmed, parsed or validated, and
/// every key is always present on the wire even when its value is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContractRequest {
    pub client_name: String,
    pub client_email: String,
    pub payment_amount: String,
    pub requirements: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    AwaitingConfirmation,
    ContractConfirmed,
    PaymentMade,
    ReqsCompleted,
    ContractExecuted,
    PaymentReleased,
}

impl ContractStatus {
    pub const ALL: [ContractStatus; 6] = [
        ContractStatus::AwaitingConfirmation,
        ContractStatus::ContractConfirmed,
        ContractStatus::PaymentMade,
        ContractStatus::ReqsCompleted,
        ContractStatus::ContractExecuted,
        ContractStatus::PaymentReleased,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContractStatus::AwaitingConfirmation => "awaiting_confirmation",
            ContractStatus::ContractConfirmed => "contract_confirmed",
            ContractStatus::PaymentMade => "payment_made",
            ContractStatus::ReqsCompleted => "reqs_completed",
            ContractStatus::ContractExecuted => "contract_executed",
            ContractStatus::PaymentReleased => "payment_released",
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown contract status '{0}'")]
pub struct UnknownContractStatus(pub String);

impl FromStr for ContractStatus {
    type Err = UnknownContractStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        ContractStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == raw)
            .ok_or_else(|| UnknownContractStatus(raw.to_string()))
    }
}

use reqwest::Client;
use shared::{domain::ContractRequest, protocol::GENERATE_CONTRACT_ROUTE};
use tracing::debug;
use url::Url;

pub mod document;
pub mod error;
pub mod form;
pub mod notifier;

pub use document::{FormDocument, InMemoryDocument};
pub use error::{FormError, SubmitError};
pub use form::{read_contract_request, ContractFormHandler, SubmissionOutcome, SubmitEvent};
pub use notifier::{Notifier, RecordingNotifier, StdoutNotifier};

/// HTTP side of the contract form: one POST per submission, no retries and no
/// deadline.
#[derive(Debug, Clone)]
pub struct ContractClient {
    http: Client,
    endpoint: Url,
}

impl ContractClient {
    /// `server_url` plays the role of the page origin; the endpoint path is
    /// resolved against it the same way a root-relative link would be.
    pub fn new(server_url: &str) -> Result<Self, SubmitError> {
        let endpoint = Url::parse(server_url)?.join(GENERATE_CONTRACT_ROUTE)?;
        Ok(Self {
            http: Client::new(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Posts `request` as JSON and returns the whole response body as text.
    /// The status code is not inspected: an error page is returned like any
    /// other body. Only transport failures are errors.
    pub async fn generate_contract(&self, request: &ContractRequest) -> Result<String, SubmitError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;
        debug!(status = %response.status(), url = %self.endpoint, "contract endpoint answered");
        Ok(response.text().await?)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

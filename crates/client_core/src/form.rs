use std::sync::Arc;

use shared::domain::ContractRequest;
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{debug, error, info_span, Instrument};
use uuid::Uuid;

use crate::{
    document::{
        FormDocument, CLIENT_EMAIL_ID, CLIENT_NAME_ID, CONTRACT_FORM_ID, DESCRIPTION_ID,
        PAYMENT_AMOUNT_ID, REQUIREMENTS_ID,
    },
    error::FormError,
    notifier::Notifier,
    ContractClient,
};

/// A submit event raised by the bound form.
#[derive(Debug, Default)]
pub struct SubmitEvent {
    default_prevented: bool,
}

impl SubmitEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops the host from running its own submit action (navigation or
    /// reload).
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// How a submission that got as far as the network ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The response body, whatever its status, was shown to the user.
    Alerted(String),
    /// The request failed; the description went to the log only.
    Failed(String),
}

fn input(document: &dyn FormDocument, id: &str) -> Result<String, FormError> {
    document
        .input_value(id)
        .ok_or_else(|| FormError::MissingElement(id.to_string()))
}

/// Reads the five inputs exactly as typed.
pub fn read_contract_request(document: &dyn FormDocument) -> Result<ContractRequest, FormError> {
    Ok(ContractRequest {
        client_name: input(document, CLIENT_NAME_ID)?,
        client_email: input(document, CLIENT_EMAIL_ID)?,
        payment_amount: input(document, PAYMENT_AMOUNT_ID)?,
        requirements: input(document, REQUIREMENTS_ID)?,
        description: input(document, DESCRIPTION_ID)?,
    })
}

/// Submit handler bound to the `contractForm` element of one document.
///
/// Each submission is sent on its own task. Nothing tracks requests in flight,
/// so repeated submits produce overlapping requests whose alerts may appear in
/// any order.
#[derive(Clone)]
pub struct ContractFormHandler {
    document: Arc<dyn FormDocument>,
    notifier: Arc<dyn Notifier>,
    client: ContractClient,
}

impl ContractFormHandler {
    /// Binds the handler once the document has been fully parsed. Fails if the
    /// form element itself is missing.
    pub fn on_document_ready(
        document: Arc<dyn FormDocument>,
        notifier: Arc<dyn Notifier>,
        client: ContractClient,
    ) -> Result<Self, FormError> {
        if !document.has_element(CONTRACT_FORM_ID) {
            return Err(FormError::MissingElement(CONTRACT_FORM_ID.to_string()));
        }
        debug!(form = CONTRACT_FORM_ID, "submit handler bound");
        Ok(Self {
            document,
            notifier,
            client,
        })
    }

    /// Handles one submit event. The default action is always prevented. A
    /// missing input aborts this submission before anything is sent and is
    /// returned to the caller; the handler stays usable. The request is sent
    /// on the current tokio runtime; without one nothing is sent and
    /// `FormError::NoRuntime` is returned.
    pub fn on_submit(
        &self,
        event: &mut SubmitEvent,
    ) -> Result<JoinHandle<SubmissionOutcome>, FormError> {
        event.prevent_default();

        let request = read_contract_request(self.document.as_ref())?;
        let runtime = Handle::try_current().map_err(|_| FormError::NoRuntime)?;
        let submission_id = Uuid::new_v4();
        let span = info_span!("contract_submission", %submission_id);

        Ok(runtime.spawn(
            deliver(self.client.clone(), self.notifier.clone(), request).instrument(span),
        ))
    }
}

async fn deliver(
    client: ContractClient,
    notifier: Arc<dyn Notifier>,
    request: ContractRequest,
) -> SubmissionOutcome {
    match client.generate_contract(&request).await {
        Ok(text) => {
            notifier.alert(&text);
            SubmissionOutcome::Alerted(text)
        }
        Err(err) => {
            error!(error = %err, "contract submission failed");
            SubmissionOutcome::Failed(err.to_string())
        }
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;

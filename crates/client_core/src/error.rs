use thiserror::Error;

/// Why a submit event could not be turned into a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// A required element is absent from the host document.
    #[error("no element with id '{0}' in the document")]
    MissingElement(String),
    #[error("submit handled outside of an async runtime")]
    NoRuntime,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("invalid server url: {0}")]
    InvalidServerUrl(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

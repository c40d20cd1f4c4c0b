//! Error types for the redemption flow.

use thiserror::Error;

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors produced by the remote gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The remote call did not return a success status. Carries the
    /// response body verbatim for diagnostics.
    #[error("network error: {0}")]
    Network(String),

    /// The response did not match the expected wire contract.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl GatewayError {
    /// The message to surface to the user: the raw server body when we have
    /// one, otherwise the error's own display form.
    #[must_use]
    pub fn surface_message(&self) -> String {
        match self {
            Self::Network(body) if !body.is_empty() => body.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type for flow operations.
pub type FlowResult<T> = Result<T, FlowError>;

/// Errors that can terminate a flow transition.
#[derive(Debug, Error)]
pub enum FlowError {
    /// A required input field is empty. Carries the reason key
    /// (e.g. `codeRequired`, `tokenRequired`).
    #[error("missing input: {0}")]
    InputMissing(&'static str),

    /// The server or a product policy rejected the attempt. Carries the
    /// reason key (e.g. `cdkUsed`, `tokenInvalid`, `tokenIsPremium`).
    #[error("rejected: {0}")]
    RemoteRejected(String),

    /// Transport failure; carries the server body when available.
    #[error("network failure: {0}")]
    Network(String),

    /// The poll loop exceeded its deadline.
    #[error("redemption task timed out")]
    Timeout,

    /// The attempt was abandoned: the flow was cancelled, or its input
    /// changed while the call was in flight. Never surfaced to the user.
    #[error("cancelled")]
    Cancelled,
}

impl From<GatewayError> for FlowError {
    fn from(err: GatewayError) -> Self {
        FlowError::Network(err.surface_message())
    }
}

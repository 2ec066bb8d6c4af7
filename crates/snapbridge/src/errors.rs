use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a single Provider Gateway request.
///
/// One attempt only; whoever calls the gateway decides what the failure means
/// for the operation in flight.
#[derive(Debug, Error, Clone)]
pub enum ProviderError {
    #[error("no compatible wallet reachable at {0}")]
    Unavailable(String),

    /// The wallet itself rejected the call (declined prompt, RPC error).
    #[error("wallet rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("wallet transport failure: {0}")]
    Transport(String),
}

/// Operation-level errors surfaced into the session state.
///
/// Discovery failures never appear here: an absent snap is the common initial
/// case and degrades to an empty result with a diagnostic log.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("wallet provider is unavailable")]
    ProviderUnavailable(#[source] ProviderError),

    #[error("snap connection failed")]
    Connection(#[source] ProviderError),

    #[error("snap invocation failed")]
    Invocation(#[source] ProviderError),

    #[error("unexpected snap response: {0}")]
    MalformedResponse(String),

    #[error("{0}")]
    WrongNetwork(String),

    #[error("invalid input: {0}")]
    Validation(String),
}

/// Uniform display wrapper for any underlying failure.
///
/// `message` always carries the full cause chain so the wallet's own words
/// (e.g. "User rejected request") survive to the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorInfo {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cause: Option<String>,
}

impl From<BridgeError> for ErrorInfo {
    fn from(e: BridgeError) -> Self {
        let cause = std::error::Error::source(&e).map(ToString::to_string);
        let message = match &cause {
            Some(c) => format!("{e}: {c}"),
            None => e.to_string(),
        };
        Self { message, cause }
    }
}

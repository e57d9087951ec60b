use thiserror::Error;

/// Anything that went wrong while sending a query or reading its answer.
///
/// The UI does not distinguish between these; every variant is shown to the
/// user as the same fallback message.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("request to ask endpoint failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("ask endpoint returned malformed JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

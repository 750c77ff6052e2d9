use thiserror::Error;

/// Failures surfaced by the hosted backend, common to every port.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Record not found")]
    NotFound,

    /// The backend understood the request and refused it (bad credentials,
    /// constraint violation, malformed filter).
    #[error("{0}")]
    Rejected(String),

    /// The call itself failed (connect error, timeout, 5xx).
    #[error("Backend call failed: {0}")]
    Service(String),

    /// The backend answered with a payload this service cannot interpret.
    #[error("Unexpected backend response: {0}")]
    Decode(String),
}

//! Crate-wide error types.

use thiserror::Error;

/// Errors surfaced by the control plane's components.
///
/// Transient bus failures and malformed messages are logged and swallowed
/// at the subscription boundary (`spec.md` §7); this enum covers the
/// failures that *do* propagate to a caller: HTTP handlers and the
/// Scheduler's `submit_work_order`.
#[derive(Debug, Error)]
pub enum FleetError {
    /// A caller-supplied value failed validation (empty `area_id`, bad JSON, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The underlying bus rejected a publish.
    #[error("transport error: {0}")]
    Transport(#[from] crate::bus::BusError),

    /// A lookup found nothing for the given key.
    #[error("not found: {0}")]
    NotFound(String),

    /// JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FleetError {
    /// Whether this error should be reported to an HTTP caller as 400 vs 500.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::NotFound(_))
    }
}

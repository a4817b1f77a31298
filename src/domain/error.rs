//! Error types for the queue plugin.
//!
//! This module defines the centralized error type [`QueueError`] and a type alias
//! [`Result`] used by every fallible operation in the crate, plus the cloneable
//! [`ApiFailure`] that travels inside events when the backend rejects a request.
//! All errors are implemented using the `thiserror` crate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type for queue plugin operations.
///
/// Local validation problems (bad dates, nothing selected, an action already in
/// flight) and infrastructure failures (theme files, configuration, I/O) all
/// surface through this enum. None of them is fatal: the handler turns each one
/// into an inline notice and leaves the loaded state untouched.
///
/// # Examples
///
/// ```
/// use bolsas_queue::domain::QueueError;
///
/// fn reject() -> Result<(), QueueError> {
///     Err(QueueError::Validation { message: "fecha inválida".to_string() })
/// }
/// assert!(reject().is_err());
/// ```
#[derive(Debug, Error)]
pub enum QueueError {
    /// No response from the backend (transport failure or timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// Input was rejected, either locally or by the backend with a 4xx.
    ///
    /// The message is shown next to the control that produced it.
    #[error("{message}")]
    Validation {
        /// Human-readable reason, verbatim from the backend when it sent one.
        message: String,
    },

    /// The backend failed with a 5xx status.
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Backend message or a generic fallback.
        message: String,
    },

    /// A response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A bulk or row action is already running.
    #[error("Hay una acción en curso, espere a que termine")]
    Busy,

    /// A bulk action was requested with nothing selected.
    #[error("Seleccione al menos una solicitud")]
    EmptySelection,

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Theme parsing or application failed.
    #[error("Theme error: {0}")]
    Theme(String),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl QueueError {
    /// Shorthand for a local validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// A specialized `Result` type for queue plugin operations.
pub type Result<T> = std::result::Result<T, QueueError>;

/// Classification of a failed backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// No usable response arrived.
    Network,
    /// 4xx with a message.
    Validation,
    /// 5xx.
    Server,
    /// 2xx whose body could not be understood.
    Decode,
}

/// A backend failure carried inside an event.
///
/// Unlike [`QueueError`] this type is `Clone + Eq` so it can live inside
/// [`Event`](crate::app::Event) values and controller state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiFailure {
    /// Failure classification.
    pub kind: FailureKind,
    /// HTTP status, when one was received.
    pub status: Option<u16>,
    /// Message sent by the backend, if any.
    pub message: Option<String>,
}

impl ApiFailure {
    /// Creates a network failure without a backend message.
    #[must_use]
    pub fn network(detail: Option<String>) -> Self {
        Self {
            kind: FailureKind::Network,
            status: None,
            message: detail,
        }
    }

    /// Text to show the user.
    ///
    /// Validation and server failures surface the backend message verbatim when
    /// present; everything else falls back to a generic sentence per kind.
    #[must_use]
    pub fn user_message(&self) -> String {
        match (self.kind, &self.message) {
            (FailureKind::Validation | FailureKind::Server, Some(message)) if !message.trim().is_empty() => {
                message.clone()
            }
            (FailureKind::Network, _) => "No se pudo conectar con el servidor. Presione R para reintentar.".to_string(),
            (FailureKind::Validation, _) => "La solicitud fue rechazada por el servidor.".to_string(),
            (FailureKind::Server, _) => "Error interno del servidor.".to_string(),
            (FailureKind::Decode, _) => "Respuesta inesperada del servidor.".to_string(),
        }
    }

    /// Whether a retry is worth offering.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind, FailureKind::Network | FailureKind::Server)
    }
}

impl From<ApiFailure> for QueueError {
    fn from(failure: ApiFailure) -> Self {
        let message = failure.user_message();
        match failure.kind {
            FailureKind::Network => Self::Network(message),
            FailureKind::Validation => Self::Validation { message },
            FailureKind::Server => Self::Server {
                status: failure.status.unwrap_or(500),
                message,
            },
            FailureKind::Decode => Self::Decode(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_message_is_surfaced_verbatim() {
        let failure = ApiFailure {
            kind: FailureKind::Validation,
            status: Some(400),
            message: Some("La gestora no existe".to_string()),
        };
        assert_eq!(failure.user_message(), "La gestora no existe");
    }

    #[test]
    fn blank_backend_message_uses_fallback() {
        let failure = ApiFailure {
            kind: FailureKind::Server,
            status: Some(500),
            message: Some("   ".to_string()),
        };
        assert_eq!(failure.user_message(), "Error interno del servidor.");
    }

    #[test]
    fn network_failure_is_retryable_and_generic() {
        let failure = ApiFailure::network(Some("connection refused".to_string()));
        assert!(failure.is_retryable());
        assert!(failure.user_message().contains("reintentar"));
    }

    #[test]
    fn converts_into_queue_error() {
        let failure = ApiFailure {
            kind: FailureKind::Server,
            status: Some(503),
            message: None,
        };
        let error: QueueError = failure.into();
        assert!(matches!(error, QueueError::Server { status: 503, .. }));
    }
}

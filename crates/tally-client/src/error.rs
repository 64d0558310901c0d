//! # Client Error Types
//!
//! Error types for backend calls and the checkout protocol.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Client Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │    Transport    │  │     Backend             │ │
//! │  │  (ClientError)  │  │  (BackendError) │  │   (BackendError)        │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Network        │  │  Rejected (4xx/5xx or   │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │    success=false)       │ │
//! │  │  MissingToken   │  │                 │  │  Malformed body         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  SubmitError: what a checkout attempt reports to the UI          │   │
//! │  │  SubmissionInProgress, EmptyCart, NetworkError, NetworkTimeout,  │   │
//! │  │  ServerRejected, MalformedResponse, Cart                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tally_core::CartError;
use thiserror::Error;

/// Result type alias for client setup and inventory loading.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type alias for a single backend call.
pub type BackendResult<T> = Result<T, BackendError>;

/// Result type alias for checkout attempts.
pub type SubmitResult<T> = Result<T, SubmitError>;

// =============================================================================
// Backend Error
// =============================================================================

/// Failure of one backend call, before any checkout-level interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Connection refused, reset, DNS failure, TLS failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The transport-level timeout of the HTTP client fired.
    #[error("Request timed out")]
    Timeout,

    /// Non-2xx status, or a 2xx envelope with `success = false`.
    #[error("Backend rejected the request: {message}")]
    Rejected {
        status: Option<u16>,
        message: String,
    },

    /// A 2xx response whose body could not be interpreted.
    #[error("Malformed backend response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Timeout
        } else if err.is_decode() {
            BackendError::Malformed(err.to_string())
        } else {
            BackendError::Network(err.to_string())
        }
    }
}

// =============================================================================
// Client Error
// =============================================================================

/// Errors raised while configuring the client or loading session data.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Invalid client configuration.
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// Invalid API base URL.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// Failed to read or parse the config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to write the config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    /// No bearer token available for the session.
    #[error("Session token is missing. Sign in first.")]
    MissingToken,

    /// Building the HTTP client failed.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// A backend call failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}

impl ClientError {
    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidConfig(_)
                | ClientError::InvalidUrl(_)
                | ClientError::ConfigLoadFailed(_)
                | ClientError::ConfigSaveFailed(_)
                | ClientError::MissingToken
        )
    }
}

// =============================================================================
// Submit Error
// =============================================================================

/// Why a checkout attempt did not produce a receipt.
///
/// In every case the live cart is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Another submission is still in flight.
    #[error("A sale is already being submitted")]
    SubmissionInProgress,

    /// Nothing to sell.
    #[error("Cart is empty")]
    EmptyCart,

    /// The request never reached the backend or the connection dropped.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// No answer within the configured bound. The sale may or may not exist.
    #[error("No response from server after {secs} seconds")]
    NetworkTimeout { secs: u64 },

    /// The backend answered and refused the sale.
    #[error("Sale rejected: {message}")]
    ServerRejected {
        status: Option<u16>,
        message: String,
    },

    /// The backend answered with something that is not a sale record.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The submission input was invalid (e.g. buyer name too long).
    #[error(transparent)]
    Cart(#[from] CartError),
}

impl SubmitError {
    /// Converts a backend failure, filling in the configured timeout.
    pub fn from_backend(err: BackendError, timeout_secs: u64) -> Self {
        match err {
            BackendError::Network(msg) => SubmitError::NetworkError(msg),
            BackendError::Timeout => SubmitError::NetworkTimeout { secs: timeout_secs },
            BackendError::Rejected { status, message } => {
                SubmitError::ServerRejected { status, message }
            }
            BackendError::Malformed(msg) => SubmitError::MalformedResponse(msg),
        }
    }

    /// Returns true if pressing "Complete Sale" again is a sensible next step.
    ///
    /// ## Retryable Errors
    /// - Network failures
    /// - Timeouts (check the backend first, see [`is_ambiguous`](Self::is_ambiguous))
    ///
    /// ## Non-Retryable Errors
    /// - Server rejections
    /// - Malformed responses
    /// - Empty cart / invalid input
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SubmitError::NetworkError(_) | SubmitError::NetworkTimeout { .. }
        )
    }

    /// True when the backend may have recorded the sale anyway.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, SubmitError::NetworkTimeout { .. })
    }

    /// Short message suitable for a toast.
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::SubmissionInProgress => "Sale is already being processed".to_string(),
            SubmitError::EmptyCart => "Cart is empty".to_string(),
            SubmitError::NetworkError(_) => "Failed to complete sale: network error".to_string(),
            SubmitError::NetworkTimeout { .. } => {
                "No response from server. Check recent sales before retrying".to_string()
            }
            SubmitError::ServerRejected { message, .. } => {
                format!("Failed to complete sale: {}", message)
            }
            SubmitError::MalformedResponse(_) => {
                "Failed to complete sale: unexpected server response".to_string()
            }
            SubmitError::Cart(err) => err.user_message().to_string(),
        }
    }
}

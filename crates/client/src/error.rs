//! Unified error model for the SDK.
//!
//! Every failure that crosses the transport boundary is normalized into an
//! [`ApiError`] before application code sees it; raw `reqwest` errors never
//! escape. [`ClientError`] adds the one failure class that never touches the
//! network: a missing cart session detected before a request is issued.

use thiserror::Error;

use clementine_core::ApiErrorBody;

/// Message used for all network-class failures (offline, DNS, timeout).
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please try again.";

/// Fallback when an error response carries no usable body.
const GENERIC_ERROR_MESSAGE: &str = "An error occurred.";

/// The normalized API error: `{message, status, code?}`.
///
/// `status` is the HTTP status of the response, or `0` when the transport
/// never reached the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    pub status: u16,
    pub code: Option<String>,
}

impl ApiError {
    /// A network-class failure: the request never produced a response.
    #[must_use]
    pub fn network() -> Self {
        Self {
            message: NETWORK_ERROR_MESSAGE.to_string(),
            status: 0,
            code: None,
        }
    }

    /// Normalize an error response, preferring the server-provided body.
    #[must_use]
    pub fn from_response(status: u16, body: Option<ApiErrorBody>) -> Self {
        match body {
            Some(body) => Self {
                message: body.message,
                status,
                code: body.code,
            },
            None => Self {
                message: GENERIC_ERROR_MESSAGE.to_string(),
                status,
                code: None,
            },
        }
    }

    /// True when the transport never reached the server.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        self.status == 0
    }

    /// True for the authentication-failure status that forces a logout.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

/// SDK-level error type.
///
/// Local precondition failures (mutating a cart with no session) are a
/// distinct variant rather than a synthetic [`ApiError`], so callers can
/// tell a programming/ordering bug apart from a server rejection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Normalized transport failure.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A cart mutation was issued with no active cart session. Raised
    /// before any network call.
    #[error("no active cart session")]
    MissingCartSession,
}

impl ClientError {
    /// The HTTP status behind this error, if it came from the transport.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api(err) => Some(err.status),
            Self::MissingCartSession => None,
        }
    }
}

/// Map an error to the message shown to the user.
///
/// Statuses with a well-known meaning get a fixed message; remaining 4xx
/// responses surface the server-provided message verbatim.
#[must_use]
pub fn user_message(error: &ClientError) -> String {
    match error {
        ClientError::MissingCartSession => {
            "No active cart. Please add items to your cart first.".to_string()
        }
        ClientError::Api(err) => match err.status {
            0 => NETWORK_ERROR_MESSAGE.to_string(),
            401 => "Session expired.".to_string(),
            403 => "Access denied.".to_string(),
            404 => "The requested resource was not found.".to_string(),
            s if s >= 500 => "Unexpected server error.".to_string(),
            _ => err.message.clone(),
        },
    }
}

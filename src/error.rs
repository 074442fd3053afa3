//! Error types.
//!
//! This module defines custom error types and handling mechanisms for the
//! `timele` crate. It consolidates the failure scenarios of all three
//! subsystems: the data gateway (database and scheduling failures), the edge
//! API (upstream call failures), and the recommender client.
//!
//! The primary error type is `TimeleError`. Service-level failures carry a
//! `ServiceError` payload whose `ErrorKind` travels across the internal HTTP
//! hop between the edge and the gateway, so that the edge can map it onto an
//! external HTTP status without re-deriving context.
//!
//! # Components
//!
//! - `TimeleError`: an enumeration of all the error types that may occur.
//! - `ServiceError`: a structure representing a typed, sanitized service failure.
//! - `ErrorKind`: the wire-level taxonomy shared by the gateway and the edge.
//! - `Result`: a custom `Result` type alias that uses `TimeleError` as the error type.
//!
use std::env::VarError;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A `Result` alias where the `Err` case is `timele::error::TimeleError`.
pub type Result<T> = std::result::Result<T, TimeleError>;

/// An enumeration of all possible errors that may occur when running the
/// `timele` services.
///
/// This enum provides a consolidated view of all error types, including those
/// originating from external crates like `reqwest`, `sqlx` and `csv`. Each
/// variant represents a specific type of error that can be encountered during
/// the operation of a `timele` process.
///
#[derive(Debug, thiserror::Error)]
pub enum TimeleError {
    #[error("service error: {0}")]
    Service(ServiceError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("environment variable error: {0}")]
    EnvVarError(#[from] VarError),

    #[error("JSON deserialization error: {0}")]
    JSONDeserialize(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    // Internal timele errors
    #[error("Internal `timele` error: {0}")]
    Internal(String),
}

impl From<&str> for TimeleError {
    fn from(value: &str) -> Self {
        TimeleError::Internal(value.to_string())
    }
}

impl TimeleError {
    /// Constructs a typed `Service` error from a kind and a client-safe detail
    /// string.
    pub fn service(kind: ErrorKind, detail: impl Into<String>) -> Self {
        TimeleError::Service(ServiceError::new(kind, detail))
    }

    /// Returns the wire-level kind of this error.
    ///
    /// Errors without a typed service payload collapse into `Internal`, except
    /// transport failures towards an upstream which surface as
    /// `UpstreamUnavailable`.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TimeleError::Service(e) => e.kind,
            TimeleError::Reqwest(_) => ErrorKind::UpstreamUnavailable,
            _ => ErrorKind::Internal,
        }
    }

    /// Returns the client-safe detail string for this error.
    ///
    /// Database messages, SQL text and internal exception messages are never
    /// exposed; untyped errors render as a generic detail.
    pub fn detail(&self) -> String {
        match self {
            TimeleError::Service(e) => e.detail.clone(),
            TimeleError::Reqwest(_) => "upstream service unavailable".to_string(),
            _ => "internal server error".to_string(),
        }
    }
}

/// Represents a typed, sanitized service failure.
///
/// This structure captures what a client is allowed to learn about a failure:
/// the taxonomy kind, a short human-readable detail, and (when raised on a
/// response from the gateway) the endpoint that produced it. The `detail`
/// string must never contain SQL text or internal exception messages.
///
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceError {
    pub kind: ErrorKind,
    pub detail: String,
    pub endpoint: Option<String>,
}

impl ServiceError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            endpoint: None,
        }
    }

    /// Attaches the endpoint this error was observed on.
    pub fn at(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.endpoint {
            Some(endpoint) => write!(f, "{} at `{}`: {}", self.kind, endpoint, self.detail),
            None => write!(f, "{}: {}", self.kind, self.detail),
        }
    }
}

/// The error taxonomy shared by the gateway and the edge.
///
/// The gateway raises these kinds; the edge maps them onto external HTTP
/// statuses through one central table (`ErrorKind::http_status`). The kind is
/// serialized by name in the internal response envelope so that context is
/// preserved across the service hop.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing required fields or bad values for parameters, including an
    /// unknown product id in a cart mutation and an empty update patch.
    InvalidInput,

    /// A path identifier that does not parse as its declared type, e.g. a
    /// malformed user UUID.
    InvalidIdFormat,

    /// The addressed resource does not exist.
    NotFound,

    /// A uniqueness conflict: duplicate email on registration or email change,
    /// or creating a cart for a user that already has one.
    Conflict,

    /// Invalid credentials or a failed password re-verification.
    AuthFailed,

    /// Checkout attempted on a cart with no items.
    EmptyCart,

    /// An order status transition not permitted by the state machine.
    IllegalTransition,

    /// The gateway or the recommender is unreachable or timed out.
    UpstreamUnavailable,

    /// An unclassified error. This should only happen rarely.
    Internal,
}

impl ErrorKind {
    /// The external HTTP status this kind maps to.
    ///
    /// This is the single source of the {error -> status} table used by both
    /// HTTP surfaces; handlers never carry their own status conditionals.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorKind::InvalidInput => 400,
            ErrorKind::EmptyCart => 400,
            ErrorKind::IllegalTransition => 400,
            ErrorKind::AuthFailed => 401,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::InvalidIdFormat => 422,
            ErrorKind::UpstreamUnavailable => 503,
            ErrorKind::Internal => 500,
        }
    }

    /// The wire name of this kind, as carried in the internal envelope.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::InvalidIdFormat => "invalid_id_format",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::AuthFailed => "auth_failed",
            ErrorKind::EmptyCart => "empty_cart",
            ErrorKind::IllegalTransition => "illegal_transition",
            ErrorKind::UpstreamUnavailable => "upstream_unavailable",
            ErrorKind::Internal => "internal",
        }
    }
}

impl From<&str> for ErrorKind {
    fn from(s: &str) -> Self {
        match s {
            "invalid_input" => ErrorKind::InvalidInput,
            "invalid_id_format" => ErrorKind::InvalidIdFormat,
            "not_found" => ErrorKind::NotFound,
            "conflict" => ErrorKind::Conflict,
            "auth_failed" => ErrorKind::AuthFailed,
            "empty_cart" => ErrorKind::EmptyCart,
            "illegal_transition" => ErrorKind::IllegalTransition,
            "upstream_unavailable" => ErrorKind::UpstreamUnavailable,
            _ => ErrorKind::Internal,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Utility function to map deserialization errors to `TimeleError` while
/// logging the JSON string that caused the error.
///
/// Useful for debugging contract drift between the edge and the gateway by
/// capturing the raw body that failed to deserialize.
pub(crate) fn map_deserialization_error(e: serde_json::Error, json_str: &str) -> TimeleError {
    tracing::error!("failed deserialization of: {}", json_str);
    TimeleError::JSONDeserialize(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_status_table() {
        assert_eq!(ErrorKind::InvalidInput.http_status(), 400);
        assert_eq!(ErrorKind::EmptyCart.http_status(), 400);
        assert_eq!(ErrorKind::IllegalTransition.http_status(), 400);
        assert_eq!(ErrorKind::AuthFailed.http_status(), 401);
        assert_eq!(ErrorKind::NotFound.http_status(), 404);
        assert_eq!(ErrorKind::Conflict.http_status(), 409);
        assert_eq!(ErrorKind::InvalidIdFormat.http_status(), 422);
        assert_eq!(ErrorKind::Internal.http_status(), 500);
        assert_eq!(ErrorKind::UpstreamUnavailable.http_status(), 503);
    }

    #[test]
    fn test_error_kind_wire_names_round_trip() {
        let kinds = [
            ErrorKind::InvalidInput,
            ErrorKind::InvalidIdFormat,
            ErrorKind::NotFound,
            ErrorKind::Conflict,
            ErrorKind::AuthFailed,
            ErrorKind::EmptyCart,
            ErrorKind::IllegalTransition,
            ErrorKind::UpstreamUnavailable,
            ErrorKind::Internal,
        ];
        for kind in kinds {
            assert_eq!(ErrorKind::from(kind.as_str()), kind);
        }
    }

    #[test]
    fn test_untyped_errors_never_leak_detail() {
        let err = TimeleError::Internal("connection string was postgres://user:pw@db".into());
        assert_eq!(err.detail(), "internal server error");
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_service_error_display_carries_endpoint() {
        let err = ServiceError::new(ErrorKind::NotFound, "user not found").at("/users/{user_id}");
        assert_eq!(
            err.to_string(),
            "not_found at `/users/{user_id}`: user not found"
        );
    }
}

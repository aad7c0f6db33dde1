//! Transport-level error surface.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned by a unary backend call.
///
/// The transport is expected to map its own failure modes onto these codes;
/// the invocation engine only ever inspects the code, never the transport's
/// native error type.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ApiError {
    /// Classification of the failure.
    pub code: ApiErrorCode,
    /// Human-readable description supplied by the transport or backend.
    pub message: String,
}

impl ApiError {
    /// Creates an error with the given code and message.
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Shorthand for a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::NotFound, message)
    }

    /// Shorthand for an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::Internal, message)
    }

    /// Checks whether this error reports a missing object.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.code == ApiErrorCode::NotFound
    }
}

/// Standard status codes of the assumed RPC transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ApiErrorCode {
    /// Call was cancelled by the caller.
    Cancelled = 1,
    /// Unclassified failure.
    Unknown = 2,
    /// Request was malformed.
    InvalidArgument = 3,
    /// Call exceeded its deadline.
    DeadlineExceeded = 4,
    /// Referenced object does not exist.
    NotFound = 5,
    /// Backend is over capacity.
    ResourceExhausted = 8,
    /// Backend-side invariant violation.
    Internal = 13,
    /// Backend is temporarily unreachable.
    Unavailable = 14,
}

impl ApiErrorCode {
    /// Returns the numeric value of this code.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Creates a code from a numeric value.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Cancelled),
            2 => Some(Self::Unknown),
            3 => Some(Self::InvalidArgument),
            4 => Some(Self::DeadlineExceeded),
            5 => Some(Self::NotFound),
            8 => Some(Self::ResourceExhausted),
            13 => Some(Self::Internal),
            14 => Some(Self::Unavailable),
            _ => None,
        }
    }
}

impl std::fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "cancelled"),
            Self::Unknown => write!(f, "unknown"),
            Self::InvalidArgument => write!(f, "invalid_argument"),
            Self::DeadlineExceeded => write!(f, "deadline_exceeded"),
            Self::NotFound => write!(f, "not_found"),
            Self::ResourceExhausted => write!(f, "resource_exhausted"),
            Self::Internal => write!(f, "internal"),
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}

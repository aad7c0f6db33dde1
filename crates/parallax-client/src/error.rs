//! Client error types.

use std::time::Duration;

use parallax_proto::ApiError;
use thiserror::Error;

/// Convenience alias used throughout the client.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the invocation engine.
///
/// Every error is returned to the caller synchronously; nothing is logged
/// and swallowed. Only [`ClientError::InternalFailure`] is retry-eligible,
/// and only inside the driver's fixed system-retry budget.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Arguments or result not representable in the interchange format, or
    /// the result payload was malformed.
    #[error("serialisation error: {0}")]
    Serialisation(#[from] serde_pickle::Error),

    /// Target function or call does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Blob store rejected the payload upload.
    #[error("blob upload failed with HTTP status {status}")]
    UploadFailed {
        /// Status code of the rejected PUT.
        status: u16,
    },

    /// Blob store rejected the payload download.
    #[error("blob download failed with HTTP status {status}")]
    DownloadFailed {
        /// Status code of the rejected GET.
        status: u16,
    },

    /// Payload exceeds the single-part upload capability of this client.
    #[error("payload of {0} bytes requires multipart upload, which this client does not support")]
    PayloadTooLarge(usize),

    /// Backend-internal transient fault; retried up to the system budget.
    #[error("internal failure: {exception}")]
    InternalFailure {
        /// Backend-supplied description of the fault.
        exception: String,
    },

    /// Remote function raised an exception.
    #[error("remote function failed: {exception}")]
    RemoteFailure {
        /// Backend-supplied exception description.
        exception: String,
    },

    /// Remote execution exceeded its backend-side time limit.
    #[error("remote function timed out: {0}")]
    RemoteTimeout(String),

    /// Remote execution was terminated before completing.
    #[error("remote function was terminated: {0}")]
    RemoteTerminated(String),

    /// Caller-supplied deadline on a detached poll elapsed.
    #[error("no result within {0:?}")]
    PollDeadlineElapsed(Duration),

    /// A success result arrived without a payload.
    #[error("success result carried no payload")]
    MissingResultData,

    /// Operation is not valid for this handle.
    #[error("{0}")]
    InvalidState(String),

    /// Transport-level failure, including caller cancellation.
    #[error("backend call failed: {0}")]
    Api(#[from] ApiError),

    /// HTTP failure while transferring a blob.
    #[error("blob transfer failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl ClientError {
    /// Checks whether the driver may retry after this error.
    ///
    /// Only backend-reported internal failures qualify; remote exceptions,
    /// timeouts, terminations and every client-side error are terminal.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::InternalFailure { .. })
    }
}

//! Submit, poll and retry messages for both invocation planes.

use serde::{Deserialize, Serialize};

use crate::function::{DataFormat, FunctionInput, InvocationType};

/// Submits one input to the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSubmitRequest {
    /// Target function identifier.
    pub function_id: String,
    /// Sync or fire-and-forget.
    pub invocation_type: InvocationType,
    /// The serialised input.
    pub input: FunctionInput,
}

/// Identifiers minted for a control-plane submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSubmitResponse {
    /// Identifier of the logical call; stable across retries.
    pub function_call_id: String,
    /// Identifier of the submitted input.
    pub input_id: String,
    /// Authorisation token for retrying this input.
    pub input_token: String,
    /// Authorisation token scoped to the whole call.
    pub call_token: String,
}

/// Polls the control plane for outputs of a call.
///
/// `timeout_secs` bounds how long the backend may hold the request open
/// before answering with an empty batch; it is a keep-alive window, not a
/// call deadline. `last_entry_id` makes repeated polls resumable so a
/// delivered output is never observed twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionOutputsRequest {
    /// Call to poll.
    pub function_call_id: String,
    /// Maximum number of outputs to deliver in one batch.
    pub max_values: u32,
    /// Bounded server-side wait, in seconds.
    pub timeout_secs: f64,
    /// Cursor of the last observed entry; `None` on the first poll.
    pub last_entry_id: Option<String>,
    /// Drop delivered outputs from the server-side buffer.
    pub clear_on_success: bool,
    /// Client wall-clock at request time, seconds since the epoch.
    pub requested_at: f64,
}

/// One batch of outputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionOutputsResponse {
    /// Delivered outputs; empty when the wait window lapsed.
    pub outputs: Vec<OutputEntry>,
    /// Cursor to resume from on the next poll.
    pub last_entry_id: String,
}

/// Re-submits an input under its original call after a transient failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRetryRequest {
    /// Call-scoped authorisation token from the original submission.
    pub call_token: String,
    /// Input-scoped token being superseded.
    pub input_token: String,
    /// The retained input, re-submitted verbatim.
    pub input: FunctionInput,
    /// Zero-based retry epoch of the superseded attempt.
    pub retry_count: u32,
}

/// Fresh token minted for the retried input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRetryResponse {
    /// Replaces the superseded input token.
    pub input_token: String,
}

/// Cancels a detached function call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCallCancelRequest {
    /// Call to cancel.
    pub function_call_id: String,
}

/// Starts an attempt on a function's dedicated input plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptStartRequest {
    /// Target function identifier.
    pub function_id: String,
    /// The serialised input.
    pub input: FunctionInput,
}

/// Token identifying an input-plane attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptStartResponse {
    /// Handle for awaiting and retrying this attempt.
    pub attempt_token: String,
}

/// Awaits the output of an input-plane attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptAwaitRequest {
    /// Attempt to await.
    pub attempt_token: String,
    /// Bounded server-side wait, in seconds.
    pub timeout_secs: f64,
    /// Client wall-clock at request time, seconds since the epoch.
    pub requested_at: f64,
}

/// Outcome of one bounded await.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttemptAwaitResponse {
    /// The output, or `None` when the wait window lapsed.
    pub output: Option<OutputEntry>,
}

/// Re-submits an input-plane attempt after a transient failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRetryRequest {
    /// Target function identifier.
    pub function_id: String,
    /// The retained input, re-submitted verbatim.
    pub input: FunctionInput,
    /// Token of the superseded attempt.
    pub attempt_token: String,
}

/// Fresh token for the retried attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRetryResponse {
    /// Replaces the superseded attempt token.
    pub attempt_token: String,
}

/// One delivered output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputEntry {
    /// Index of the input this output answers.
    pub idx: u32,
    /// Identifier of the answered input.
    pub input_id: String,
    /// Terminal result of the execution.
    pub result: InvocationResult,
    /// Serialisation format of the result payload.
    pub data_format: DataFormat,
}

/// Terminal result reported by the backend for one execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationResult {
    /// How the execution ended.
    pub status: ResultStatus,
    /// Backend-supplied failure description; empty on success.
    pub exception: String,
    /// Result payload, when the execution produced one.
    pub data: Option<ResultData>,
}

impl InvocationResult {
    /// Creates a success result carrying an inline payload.
    #[must_use]
    pub fn success(payload: Vec<u8>) -> Self {
        Self {
            status: ResultStatus::Success,
            exception: String::new(),
            data: Some(ResultData::Inline(payload)),
        }
    }

    /// Creates a failure result with the given status and description.
    #[must_use]
    pub fn failure(status: ResultStatus, exception: impl Into<String>) -> Self {
        Self {
            status,
            exception: exception.into(),
            data: None,
        }
    }
}

/// Result payload slot, mirroring [`crate::InputData`] on the output side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultData {
    /// Payload embedded in the response.
    Inline(Vec<u8>),
    /// Handle of a payload retrievable out-of-band.
    Blob(String),
}

/// How an execution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ResultStatus {
    /// Function returned a value.
    Success = 1,
    /// Function raised; the exception description is attached.
    Failure = 2,
    /// Backend-internal transient fault; the only retry-eligible status.
    InternalFailure = 3,
    /// Execution exceeded its backend-side time limit.
    Timeout = 4,
    /// Execution was terminated before completing.
    Terminated = 5,
}

impl ResultStatus {
    /// Returns the numeric value of this status.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Creates a status from a numeric value.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Success),
            2 => Some(Self::Failure),
            3 => Some(Self::InternalFailure),
            4 => Some(Self::Timeout),
            5 => Some(Self::Terminated),
            _ => None,
        }
    }

    /// Checks whether this status may be retried by the driver.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::InternalFailure)
    }
}

impl std::fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
            Self::InternalFailure => write!(f, "internal_failure"),
            Self::Timeout => write!(f, "timeout"),
            Self::Terminated => write!(f, "terminated"),
        }
    }
}

//! API message types for Parallax client ↔ backend communication.
//!
//! This crate defines the request/response payloads for every unary call the
//! invocation engine makes, plus the status and error codes shared between
//! the two invocation planes:
//!
//! - Function lookup and input construction
//! - Invocation submit / poll / retry on the control plane
//! - Attempt start / await / retry on the input plane
//! - Blob slot negotiation for out-of-band payload transfer
//!
//! The types are plain data carried over whatever transport the host
//! application has bootstrapped; no connection handling lives here.

mod blob;
mod error;
mod function;
mod invocation;

pub use blob::{BlobCreateRequest, BlobCreateResponse, BlobGetRequest, BlobGetResponse, UploadTarget};
pub use error::{ApiError, ApiErrorCode};
pub use function::{
    DataFormat, FunctionGetRequest, FunctionGetResponse, FunctionHandleMetadata, FunctionInput,
    FunctionStatsRequest, FunctionStatsResponse, InputData, InvocationType,
};
pub use invocation::{
    AttemptAwaitRequest, AttemptAwaitResponse, AttemptRetryRequest, AttemptRetryResponse,
    AttemptStartRequest, AttemptStartResponse, FunctionCallCancelRequest, FunctionOutputsRequest,
    FunctionOutputsResponse, FunctionRetryRequest, FunctionRetryResponse, FunctionSubmitRequest,
    FunctionSubmitResponse, InvocationResult, OutputEntry, ResultData, ResultStatus,
};

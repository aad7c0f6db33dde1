//! Invocation backends: submit, poll and retry on either plane.
//!
//! Both variants expose the same capability set behind [`Invocation`]; the
//! driver never learns which plane a call went through. An invocation is
//! owned exclusively by one driver loop — the retry epoch and poll cursor
//! are its only mutable state, so no locking is needed.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde_pickle::Value;
use tracing::debug;

use parallax_proto::{
    AttemptAwaitRequest, AttemptRetryRequest, AttemptStartRequest, FunctionInput,
    FunctionOutputsRequest, FunctionRetryRequest, FunctionSubmitRequest, InvocationType,
    OutputEntry, ResultData, ResultStatus,
};

use crate::blob::BlobTransfer;
use crate::error::{ClientError, ClientResult};
use crate::serializer;
use crate::transport::BackendApi;

/// Server-side wait window for one poll.
///
/// A transport keep-alive, not a call deadline: a poll that comes back
/// empty after this window is immediately re-issued.
pub(crate) const OUTPUTS_TIMEOUT: Duration = Duration::from_secs(55);

/// Retry budget for backend-internal transient failures.
///
/// Epochs run 0 through 8 inclusive, so one logical call makes at most
/// nine submissions.
pub(crate) const MAX_SYSTEM_RETRIES: u32 = 8;

fn time_now_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

/// A submitted input awaiting its result.
#[async_trait]
pub(crate) trait Invocation: Send {
    /// Polls until a terminal outcome, within an optional caller deadline.
    async fn await_output(&mut self, deadline: Option<Duration>) -> ClientResult<Value>;

    /// Re-submits the same logical call, superseding the current attempt.
    async fn retry(&mut self, retry_count: u32) -> ClientResult<()>;
}

/// Computes the next bounded poll window, honouring a caller deadline.
fn poll_window(deadline: Option<Duration>, started: Instant) -> ClientResult<Duration> {
    match deadline {
        None => Ok(OUTPUTS_TIMEOUT),
        Some(limit) => {
            let remaining = limit.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                return Err(ClientError::PollDeadlineElapsed(limit));
            }
            Ok(remaining.min(OUTPUTS_TIMEOUT))
        }
    }
}

/// Converts a delivered output into the caller-facing result.
///
/// Success payloads may arrive inline or by blob reference; everything
/// else maps onto the terminal error taxonomy. Only internal failures are
/// retry-eligible, and that decision belongs to the driver, not here.
async fn finalise_output(entry: OutputEntry, blobs: &BlobTransfer) -> ClientResult<Value> {
    let result = entry.result;
    match result.status {
        ResultStatus::Success => {
            let payload = match result.data {
                Some(ResultData::Inline(bytes)) => bytes,
                Some(ResultData::Blob(blob_id)) => blobs.download(&blob_id).await?,
                None => return Err(ClientError::MissingResultData),
            };
            serializer::decode(&payload)
        }
        ResultStatus::Failure => Err(ClientError::RemoteFailure {
            exception: result.exception,
        }),
        ResultStatus::InternalFailure => Err(ClientError::InternalFailure {
            exception: result.exception,
        }),
        ResultStatus::Timeout => Err(ClientError::RemoteTimeout(result.exception)),
        ResultStatus::Terminated => Err(ClientError::RemoteTerminated(result.exception)),
    }
}

/// Invocation routed through the primary backend API.
pub(crate) struct ControlPlaneInvocation {
    api: Arc<dyn BackendApi>,
    blobs: BlobTransfer,
    pub(crate) function_call_id: String,
    /// Retry context; absent on handles reattached from a bare call id.
    retry_context: Option<RetryContext>,
    last_entry_id: Option<String>,
}

struct RetryContext {
    input: FunctionInput,
    input_token: String,
    call_token: String,
}

impl ControlPlaneInvocation {
    /// Submits an input, producing the epoch-0 attempt.
    pub(crate) async fn submit(
        api: Arc<dyn BackendApi>,
        blobs: BlobTransfer,
        function_id: &str,
        input: FunctionInput,
        invocation_type: InvocationType,
    ) -> ClientResult<Self> {
        let resp = api
            .function_submit(FunctionSubmitRequest {
                function_id: function_id.to_owned(),
                invocation_type,
                input: input.clone(),
            })
            .await?;

        debug!(
            function_id,
            function_call_id = %resp.function_call_id,
            "invocation submitted on control plane"
        );

        Ok(Self {
            api,
            blobs,
            function_call_id: resp.function_call_id,
            retry_context: Some(RetryContext {
                input,
                input_token: resp.input_token,
                call_token: resp.call_token,
            }),
            last_entry_id: None,
        })
    }

    /// Reattaches to a call by id, for detached polling.
    ///
    /// Without the original input and tokens the handle can poll but not
    /// retry.
    pub(crate) fn from_function_call_id(
        api: Arc<dyn BackendApi>,
        blobs: BlobTransfer,
        function_call_id: String,
    ) -> Self {
        Self {
            api,
            blobs,
            function_call_id,
            retry_context: None,
            last_entry_id: None,
        }
    }
}

#[async_trait]
impl Invocation for ControlPlaneInvocation {
    async fn await_output(&mut self, deadline: Option<Duration>) -> ClientResult<Value> {
        let started = Instant::now();
        loop {
            let window = poll_window(deadline, started)?;
            let resp = self
                .api
                .function_outputs(FunctionOutputsRequest {
                    function_call_id: self.function_call_id.clone(),
                    max_values: 1,
                    timeout_secs: window.as_secs_f64(),
                    last_entry_id: self.last_entry_id.clone(),
                    clear_on_success: true,
                    requested_at: time_now_seconds(),
                })
                .await?;

            if !resp.last_entry_id.is_empty() {
                self.last_entry_id = Some(resp.last_entry_id);
            }

            if let Some(entry) = resp.outputs.into_iter().next() {
                return finalise_output(entry, &self.blobs).await;
            }
            // Wait window lapsed without a result; poll again.
        }
    }

    async fn retry(&mut self, retry_count: u32) -> ClientResult<()> {
        let context = self.retry_context.as_mut().ok_or_else(|| {
            ClientError::InvalidState("cannot retry a detached function call".into())
        })?;

        let resp = self
            .api
            .function_retry(FunctionRetryRequest {
                call_token: context.call_token.clone(),
                input_token: context.input_token.clone(),
                input: context.input.clone(),
                retry_count,
            })
            .await?;

        debug!(
            function_call_id = %self.function_call_id,
            retry_count,
            "invocation re-submitted on control plane"
        );
        context.input_token = resp.input_token;
        Ok(())
    }
}

/// Invocation routed through a function's dedicated input plane.
///
/// The input is retained for the lifetime of the invocation because every
/// retry re-submits it verbatim under a fresh attempt token.
pub(crate) struct InputPlaneInvocation {
    api: Arc<dyn BackendApi>,
    blobs: BlobTransfer,
    function_id: String,
    input: FunctionInput,
    attempt_token: String,
}

impl InputPlaneInvocation {
    /// Starts an attempt, producing the epoch-0 submission.
    pub(crate) async fn submit(
        api: Arc<dyn BackendApi>,
        blobs: BlobTransfer,
        function_id: &str,
        input: FunctionInput,
    ) -> ClientResult<Self> {
        let resp = api
            .attempt_start(AttemptStartRequest {
                function_id: function_id.to_owned(),
                input: input.clone(),
            })
            .await?;

        debug!(function_id, "invocation submitted on input plane");

        Ok(Self {
            api,
            blobs,
            function_id: function_id.to_owned(),
            input,
            attempt_token: resp.attempt_token,
        })
    }
}

#[async_trait]
impl Invocation for InputPlaneInvocation {
    async fn await_output(&mut self, deadline: Option<Duration>) -> ClientResult<Value> {
        let started = Instant::now();
        loop {
            let window = poll_window(deadline, started)?;
            let resp = self
                .api
                .attempt_await(AttemptAwaitRequest {
                    attempt_token: self.attempt_token.clone(),
                    timeout_secs: window.as_secs_f64(),
                    requested_at: time_now_seconds(),
                })
                .await?;

            if let Some(entry) = resp.output {
                return finalise_output(entry, &self.blobs).await;
            }
        }
    }

    async fn retry(&mut self, _retry_count: u32) -> ClientResult<()> {
        let resp = self
            .api
            .attempt_retry(AttemptRetryRequest {
                function_id: self.function_id.clone(),
                input: self.input.clone(),
                attempt_token: self.attempt_token.clone(),
            })
            .await?;

        debug!(function_id = %self.function_id, "invocation re-submitted on input plane");
        self.attempt_token = resp.attempt_token;
        Ok(())
    }
}

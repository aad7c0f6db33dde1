//! Detached handles for fire-and-forget calls.

use std::sync::Arc;
use std::time::Duration;

use serde_pickle::Value;

use parallax_proto::FunctionCallCancelRequest;

use crate::blob::BlobTransfer;
use crate::error::ClientResult;
use crate::invocation::{ControlPlaneInvocation, Invocation};
use crate::transport::{BackendApi, Client};

/// A call started with [`crate::Function::spawn`].
///
/// Outlives the driver loop that created it and is never destroyed
/// automatically; the caller decides when to stop polling. A detached
/// handle carries no retry context, so a backend-internal failure observed
/// here surfaces as-is instead of being re-submitted.
#[derive(Clone)]
pub struct FunctionCall {
    api: Arc<dyn BackendApi>,
    blobs: BlobTransfer,
    function_call_id: String,
}

impl FunctionCall {
    pub(crate) fn new(
        api: Arc<dyn BackendApi>,
        blobs: BlobTransfer,
        function_call_id: String,
    ) -> Self {
        Self {
            api,
            blobs,
            function_call_id,
        }
    }

    /// Reattaches to a call spawned elsewhere, by its identifier.
    #[must_use]
    pub fn from_id(client: &Client, function_call_id: impl Into<String>) -> Self {
        Self {
            api: client.api(),
            blobs: BlobTransfer::new(client.api(), client.http().clone()),
            function_call_id: function_call_id.into(),
        }
    }

    /// Returns the backend-assigned call identifier.
    #[must_use]
    pub fn function_call_id(&self) -> &str {
        &self.function_call_id
    }

    /// Awaits the call's result, optionally bounded by a caller deadline.
    ///
    /// Polling resumes from an advancing cursor, so results are delivered
    /// exactly once however often this is called concurrently with the
    /// backend finishing. With `None` the poll continues indefinitely.
    pub async fn get(&self, deadline: Option<Duration>) -> ClientResult<Value> {
        let mut invocation = ControlPlaneInvocation::from_function_call_id(
            self.api.clone(),
            self.blobs.clone(),
            self.function_call_id.clone(),
        );
        invocation.await_output(deadline).await
    }

    /// Cancels the call on the backend.
    pub async fn cancel(&self) -> ClientResult<()> {
        self.api
            .function_call_cancel(FunctionCallCancelRequest {
                function_call_id: self.function_call_id.clone(),
            })
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for FunctionCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionCall")
            .field("function_call_id", &self.function_call_id)
            .finish_non_exhaustive()
    }
}

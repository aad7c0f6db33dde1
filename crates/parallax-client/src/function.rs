//! Function handles and the invocation driver.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_pickle::Value;
use tracing::warn;

use parallax_proto::{
    DataFormat, FunctionGetRequest, FunctionInput, FunctionStatsRequest, InvocationType,
};

use crate::blob::BlobTransfer;
use crate::error::{ClientError, ClientResult};
use crate::function_call::FunctionCall;
use crate::invocation::{
    ControlPlaneInvocation, InputPlaneInvocation, Invocation, MAX_SYSTEM_RETRIES,
};
use crate::serializer;
use crate::transport::{BackendApi, Client};

/// Options for [`Function::lookup`].
#[derive(Debug, Clone, Default)]
pub struct LookupOptions {
    /// Deployment environment to resolve against.
    pub environment: Option<String>,
}

/// Live statistics for a running function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionStats {
    /// Inputs queued but not yet running.
    pub backlog: usize,
    /// Runners currently provisioned for the function.
    pub total_runners: usize,
}

/// Handle to a deployed remote function.
///
/// The invocation plane is chosen once, from the metadata returned at
/// lookup time, and never re-decided per call. Handles are cheap to clone
/// and safe to drive from many tasks concurrently; every call owns its own
/// invocation state.
#[derive(Clone)]
pub struct Function {
    api: Arc<dyn BackendApi>,
    input_plane: Option<Arc<dyn BackendApi>>,
    blobs: BlobTransfer,
    function_id: String,
    method_name: Option<String>,
    web_url: Option<String>,
}

impl Function {
    /// Resolves a deployed function by application and name.
    ///
    /// A function whose metadata names an input-plane endpoint is bound to
    /// that plane here; everything else stays on the control plane.
    pub async fn lookup(
        client: &Client,
        app_name: &str,
        name: &str,
        options: LookupOptions,
    ) -> ClientResult<Self> {
        let resp = client
            .api()
            .function_get(FunctionGetRequest {
                app_name: app_name.to_owned(),
                function_name: name.to_owned(),
                environment: options.environment,
            })
            .await
            .map_err(|err| {
                if err.is_not_found() {
                    ClientError::NotFound(format!("function '{app_name}/{name}' not found"))
                } else {
                    ClientError::Api(err)
                }
            })?;

        let metadata = resp.metadata.unwrap_or_default();
        let input_plane = match metadata.input_plane_url.as_deref() {
            Some(url) => Some(client.input_plane(url)?),
            None => None,
        };

        Ok(Self {
            api: client.api(),
            input_plane,
            blobs: BlobTransfer::new(client.api(), client.http().clone()),
            function_id: resp.function_id,
            method_name: None,
            web_url: metadata.web_url,
        })
    }

    /// Returns the backend-assigned function identifier.
    #[must_use]
    pub fn function_id(&self) -> &str {
        &self.function_id
    }

    /// Returns the web URL when the function is served as a web endpoint.
    #[must_use]
    pub fn web_url(&self) -> Option<&str> {
        self.web_url.as_deref()
    }

    /// Qualifies the handle with a method name, for class-bound functions.
    #[must_use]
    pub fn with_method_name(mut self, method_name: impl Into<String>) -> Self {
        self.method_name = Some(method_name.into());
        self
    }

    /// Executes a single input remotely and returns its decoded result.
    ///
    /// Backend-internal transient failures are retried with a fresh
    /// submission per epoch, up to the system budget; every other failure
    /// is terminal. There is no overall deadline — cancel by dropping the
    /// future.
    pub async fn remote(
        &self,
        args: Vec<Value>,
        kwargs: BTreeMap<String, Value>,
    ) -> ClientResult<Value> {
        let input = self.create_input(&args, &kwargs).await?;
        let mut invocation = self.create_invocation(input).await?;

        let mut retry_count: u32 = 0;
        loop {
            match invocation.await_output(None).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() => {
                    if retry_count >= MAX_SYSTEM_RETRIES {
                        return Err(err);
                    }
                    warn!(
                        function_id = %self.function_id,
                        retry_count,
                        error = %err,
                        "transient failure, retrying invocation"
                    );
                    invocation.retry(retry_count).await?;
                    retry_count += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Starts a single input remotely without waiting for the result.
    ///
    /// The returned call outlives this handle and can be polled, awaited or
    /// cancelled independently at any later point.
    pub async fn spawn(
        &self,
        args: Vec<Value>,
        kwargs: BTreeMap<String, Value>,
    ) -> ClientResult<FunctionCall> {
        let input = self.create_input(&args, &kwargs).await?;
        let invocation = ControlPlaneInvocation::submit(
            self.api.clone(),
            self.blobs.clone(),
            &self.function_id,
            input,
            InvocationType::Async,
        )
        .await?;

        Ok(FunctionCall::new(
            self.api.clone(),
            self.blobs.clone(),
            invocation.function_call_id,
        ))
    }

    /// Fetches live statistics for this function.
    pub async fn stats(&self) -> ClientResult<FunctionStats> {
        let resp = self
            .api
            .function_stats(FunctionStatsRequest {
                function_id: self.function_id.clone(),
            })
            .await?;

        Ok(FunctionStats {
            backlog: resp.backlog as usize,
            total_runners: resp.total_runners as usize,
        })
    }

    /// Serialises arguments and builds the submission input.
    async fn create_input(
        &self,
        args: &[Value],
        kwargs: &BTreeMap<String, Value>,
    ) -> ClientResult<FunctionInput> {
        let payload = serializer::encode(args, kwargs)?;
        let data = self.blobs.store_payload(payload).await?;

        Ok(FunctionInput {
            data,
            data_format: DataFormat::Pickle,
            method_name: self.method_name.clone(),
        })
    }

    /// Submits through the plane bound at lookup time.
    async fn create_invocation(&self, input: FunctionInput) -> ClientResult<Box<dyn Invocation>> {
        match &self.input_plane {
            Some(api) => Ok(Box::new(
                InputPlaneInvocation::submit(
                    api.clone(),
                    self.blobs.clone(),
                    &self.function_id,
                    input,
                )
                .await?,
            )),
            None => Ok(Box::new(
                ControlPlaneInvocation::submit(
                    self.api.clone(),
                    self.blobs.clone(),
                    &self.function_id,
                    input,
                    InvocationType::Sync,
                )
                .await?,
            )),
        }
    }
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function")
            .field("function_id", &self.function_id)
            .field("method_name", &self.method_name)
            .field("input_plane", &self.input_plane.is_some())
            .finish_non_exhaustive()
    }
}

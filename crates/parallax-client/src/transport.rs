//! Transport seam between the invocation engine and the backend.
//!
//! The RPC transport itself is bootstrapped by the host application and is
//! assumed to provide unary calls with standard error codes; this module
//! only defines the capability surface the engine consumes. Tests substitute
//! queue-driven stubs.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use parallax_proto::{
    ApiError, AttemptAwaitRequest, AttemptAwaitResponse, AttemptRetryRequest,
    AttemptRetryResponse, AttemptStartRequest, AttemptStartResponse, BlobCreateRequest,
    BlobCreateResponse, BlobGetRequest, BlobGetResponse, FunctionCallCancelRequest,
    FunctionGetRequest, FunctionGetResponse, FunctionOutputsRequest, FunctionOutputsResponse,
    FunctionRetryRequest, FunctionRetryResponse, FunctionStatsRequest, FunctionStatsResponse,
    FunctionSubmitRequest, FunctionSubmitResponse,
};

use crate::config::HttpConfig;
use crate::error::{ClientError, ClientResult};

/// Unary calls consumed from the backend.
///
/// One implementation is bound to the control-plane address by the bootstrap
/// layer; further instances are dialled per input-plane URL on demand.
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Resolves a deployed function by name.
    async fn function_get(&self, req: FunctionGetRequest) -> Result<FunctionGetResponse, ApiError>;

    /// Fetches live statistics for a function.
    async fn function_stats(
        &self,
        req: FunctionStatsRequest,
    ) -> Result<FunctionStatsResponse, ApiError>;

    /// Submits one input on the control plane.
    async fn function_submit(
        &self,
        req: FunctionSubmitRequest,
    ) -> Result<FunctionSubmitResponse, ApiError>;

    /// Polls a control-plane call for outputs within a bounded wait.
    async fn function_outputs(
        &self,
        req: FunctionOutputsRequest,
    ) -> Result<FunctionOutputsResponse, ApiError>;

    /// Re-submits a retained input under its original call.
    async fn function_retry(
        &self,
        req: FunctionRetryRequest,
    ) -> Result<FunctionRetryResponse, ApiError>;

    /// Cancels a detached function call.
    async fn function_call_cancel(&self, req: FunctionCallCancelRequest) -> Result<(), ApiError>;

    /// Starts an input-plane attempt.
    async fn attempt_start(&self, req: AttemptStartRequest)
        -> Result<AttemptStartResponse, ApiError>;

    /// Awaits an input-plane attempt within a bounded wait.
    async fn attempt_await(&self, req: AttemptAwaitRequest)
        -> Result<AttemptAwaitResponse, ApiError>;

    /// Re-submits an input-plane attempt.
    async fn attempt_retry(&self, req: AttemptRetryRequest)
        -> Result<AttemptRetryResponse, ApiError>;

    /// Requests an upload slot for an oversized payload.
    async fn blob_create(&self, req: BlobCreateRequest) -> Result<BlobCreateResponse, ApiError>;

    /// Requests a download URL for a stored blob.
    async fn blob_get(&self, req: BlobGetRequest) -> Result<BlobGetResponse, ApiError>;
}

/// Opens additional backend connections for input-plane endpoints.
///
/// Supplied by the bootstrap layer alongside the control-plane connection.
pub trait Dial: Send + Sync {
    /// Returns a connection bound to the given input-plane URL.
    fn dial(&self, url: &str) -> ClientResult<Arc<dyn BackendApi>>;
}

/// Shared client state handed to function handles.
///
/// Holds the control-plane connection, a lazily populated cache of
/// input-plane connections keyed by URL, and the HTTP client used for blob
/// transfer. All fields are read-only after construction; per-call mutable
/// state lives on the invocation owned by each driver loop.
pub struct Client {
    api: Arc<dyn BackendApi>,
    dial: Arc<dyn Dial>,
    input_planes: DashMap<String, Arc<dyn BackendApi>>,
    http: reqwest::Client,
}

impl Client {
    /// Creates a client over an established control-plane connection.
    pub fn new(api: Arc<dyn BackendApi>, dial: Arc<dyn Dial>) -> ClientResult<Self> {
        Self::with_http_config(api, dial, &HttpConfig::default())
    }

    /// Creates a client with explicit blob-transfer HTTP settings.
    pub fn with_http_config(
        api: Arc<dyn BackendApi>,
        dial: Arc<dyn Dial>,
        config: &HttpConfig,
    ) -> ClientResult<Self> {
        Ok(Self {
            api,
            dial,
            input_planes: DashMap::new(),
            http: config.build_http_client()?,
        })
    }

    /// Returns the control-plane connection.
    #[must_use]
    pub fn api(&self) -> Arc<dyn BackendApi> {
        self.api.clone()
    }

    /// Returns the blob-transfer HTTP client.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Returns the connection for an input-plane URL, dialling it on first
    /// use and caching it for the lifetime of the client.
    pub fn input_plane(&self, url: &str) -> ClientResult<Arc<dyn BackendApi>> {
        if let Some(api) = self.input_planes.get(url) {
            return Ok(api.clone());
        }

        let api = self.dial.dial(url)?;
        self.input_planes.insert(url.to_owned(), api.clone());
        Ok(api)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("input_planes", &self.input_planes.len())
            .finish_non_exhaustive()
    }
}

/// Dialler for deployments without input-plane functions.
///
/// Every dial attempt is an error; use it when the bootstrap layer knows no
/// function in the application resolves to a dedicated input plane.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInputPlanes;

impl Dial for NoInputPlanes {
    fn dial(&self, url: &str) -> ClientResult<Arc<dyn BackendApi>> {
        Err(ClientError::InvalidState(format!(
            "no dialler configured for input-plane endpoint {url}"
        )))
    }
}

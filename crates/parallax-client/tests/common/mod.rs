//! Shared harness for invocation and blob-transfer integration tests.
//!
//! `StubApi` is a queue-driven [`BackendApi`] implementation: each method
//! records its request and pops the next queued response, panicking on a
//! call nothing queued for. `spawn_blob_store` serves a real HTTP blob
//! endpoint so upload and download paths are exercised over the wire.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::put;
use axum::Router;

use parallax_client::error::ClientError;
use parallax_client::transport::{BackendApi, Client, Dial, NoInputPlanes};
use parallax_client::{ClientResult, Value};
use parallax_proto::{
    ApiError, AttemptAwaitRequest, AttemptAwaitResponse, AttemptRetryRequest,
    AttemptRetryResponse, AttemptStartRequest, AttemptStartResponse, BlobCreateRequest,
    BlobCreateResponse, BlobGetRequest, BlobGetResponse, DataFormat, FunctionCallCancelRequest,
    FunctionGetRequest, FunctionGetResponse, FunctionHandleMetadata, FunctionOutputsRequest,
    FunctionOutputsResponse, FunctionRetryRequest, FunctionRetryResponse, FunctionStatsRequest,
    FunctionStatsResponse, FunctionSubmitRequest, FunctionSubmitResponse, InvocationResult,
    OutputEntry, ResultStatus,
};

type Queue<T> = Mutex<VecDeque<Result<T, ApiError>>>;

fn pop<T>(queue: &Queue<T>, method: &str) -> Result<T, ApiError> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| panic!("unexpected backend call to {method}"))
}

/// Queue-driven backend stub.
#[derive(Default)]
pub struct StubApi {
    pub function_get_requests: Mutex<Vec<FunctionGetRequest>>,
    pub function_get_responses: Queue<FunctionGetResponse>,

    pub function_stats_requests: Mutex<Vec<FunctionStatsRequest>>,
    pub function_stats_responses: Queue<FunctionStatsResponse>,

    pub submit_requests: Mutex<Vec<FunctionSubmitRequest>>,
    pub submit_responses: Queue<FunctionSubmitResponse>,

    pub outputs_requests: Mutex<Vec<FunctionOutputsRequest>>,
    pub outputs_responses: Queue<FunctionOutputsResponse>,

    pub retry_requests: Mutex<Vec<FunctionRetryRequest>>,
    pub retry_responses: Queue<FunctionRetryResponse>,

    pub cancel_requests: Mutex<Vec<FunctionCallCancelRequest>>,
    pub cancel_responses: Queue<()>,

    pub attempt_start_requests: Mutex<Vec<AttemptStartRequest>>,
    pub attempt_start_responses: Queue<AttemptStartResponse>,

    pub attempt_await_requests: Mutex<Vec<AttemptAwaitRequest>>,
    pub attempt_await_responses: Queue<AttemptAwaitResponse>,

    pub attempt_retry_requests: Mutex<Vec<AttemptRetryRequest>>,
    pub attempt_retry_responses: Queue<AttemptRetryResponse>,

    pub blob_create_requests: Mutex<Vec<BlobCreateRequest>>,
    pub blob_create_responses: Queue<BlobCreateResponse>,

    pub blob_get_requests: Mutex<Vec<BlobGetRequest>>,
    pub blob_get_responses: Queue<BlobGetResponse>,
}

impl StubApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn queue_function_get(&self, resp: Result<FunctionGetResponse, ApiError>) {
        self.function_get_responses.lock().unwrap().push_back(resp);
    }

    pub fn queue_function_stats(&self, resp: FunctionStatsResponse) {
        self.function_stats_responses
            .lock()
            .unwrap()
            .push_back(Ok(resp));
    }

    pub fn queue_submit(&self, resp: FunctionSubmitResponse) {
        self.submit_responses.lock().unwrap().push_back(Ok(resp));
    }

    pub fn queue_outputs(&self, resp: FunctionOutputsResponse) {
        self.outputs_responses.lock().unwrap().push_back(Ok(resp));
    }

    pub fn queue_retry(&self, resp: FunctionRetryResponse) {
        self.retry_responses.lock().unwrap().push_back(Ok(resp));
    }

    pub fn queue_attempt_start(&self, resp: AttemptStartResponse) {
        self.attempt_start_responses
            .lock()
            .unwrap()
            .push_back(Ok(resp));
    }

    pub fn queue_attempt_await(&self, resp: AttemptAwaitResponse) {
        self.attempt_await_responses
            .lock()
            .unwrap()
            .push_back(Ok(resp));
    }

    pub fn queue_attempt_retry(&self, resp: AttemptRetryResponse) {
        self.attempt_retry_responses
            .lock()
            .unwrap()
            .push_back(Ok(resp));
    }

    pub fn queue_blob_create(&self, resp: BlobCreateResponse) {
        self.blob_create_responses.lock().unwrap().push_back(Ok(resp));
    }

    pub fn queue_blob_get(&self, resp: BlobGetResponse) {
        self.blob_get_responses.lock().unwrap().push_back(Ok(resp));
    }

    pub fn queue_cancel(&self) {
        self.cancel_responses.lock().unwrap().push_back(Ok(()));
    }

    /// Total submissions observed: initial submits plus retries.
    pub fn submission_count(&self) -> usize {
        self.submit_requests.lock().unwrap().len() + self.retry_requests.lock().unwrap().len()
    }

    /// Total input-plane submissions observed.
    pub fn attempt_submission_count(&self) -> usize {
        self.attempt_start_requests.lock().unwrap().len()
            + self.attempt_retry_requests.lock().unwrap().len()
    }
}

#[async_trait]
impl BackendApi for StubApi {
    async fn function_get(&self, req: FunctionGetRequest) -> Result<FunctionGetResponse, ApiError> {
        self.function_get_requests.lock().unwrap().push(req);
        pop(&self.function_get_responses, "function_get")
    }

    async fn function_stats(
        &self,
        req: FunctionStatsRequest,
    ) -> Result<FunctionStatsResponse, ApiError> {
        self.function_stats_requests.lock().unwrap().push(req);
        pop(&self.function_stats_responses, "function_stats")
    }

    async fn function_submit(
        &self,
        req: FunctionSubmitRequest,
    ) -> Result<FunctionSubmitResponse, ApiError> {
        self.submit_requests.lock().unwrap().push(req);
        pop(&self.submit_responses, "function_submit")
    }

    async fn function_outputs(
        &self,
        req: FunctionOutputsRequest,
    ) -> Result<FunctionOutputsResponse, ApiError> {
        self.outputs_requests.lock().unwrap().push(req);
        pop(&self.outputs_responses, "function_outputs")
    }

    async fn function_retry(
        &self,
        req: FunctionRetryRequest,
    ) -> Result<FunctionRetryResponse, ApiError> {
        self.retry_requests.lock().unwrap().push(req);
        pop(&self.retry_responses, "function_retry")
    }

    async fn function_call_cancel(&self, req: FunctionCallCancelRequest) -> Result<(), ApiError> {
        self.cancel_requests.lock().unwrap().push(req);
        pop(&self.cancel_responses, "function_call_cancel")
    }

    async fn attempt_start(
        &self,
        req: AttemptStartRequest,
    ) -> Result<AttemptStartResponse, ApiError> {
        self.attempt_start_requests.lock().unwrap().push(req);
        pop(&self.attempt_start_responses, "attempt_start")
    }

    async fn attempt_await(
        &self,
        req: AttemptAwaitRequest,
    ) -> Result<AttemptAwaitResponse, ApiError> {
        self.attempt_await_requests.lock().unwrap().push(req);
        pop(&self.attempt_await_responses, "attempt_await")
    }

    async fn attempt_retry(
        &self,
        req: AttemptRetryRequest,
    ) -> Result<AttemptRetryResponse, ApiError> {
        self.attempt_retry_requests.lock().unwrap().push(req);
        pop(&self.attempt_retry_responses, "attempt_retry")
    }

    async fn blob_create(&self, req: BlobCreateRequest) -> Result<BlobCreateResponse, ApiError> {
        self.blob_create_requests.lock().unwrap().push(req);
        pop(&self.blob_create_responses, "blob_create")
    }

    async fn blob_get(&self, req: BlobGetRequest) -> Result<BlobGetResponse, ApiError> {
        self.blob_get_requests.lock().unwrap().push(req);
        pop(&self.blob_get_responses, "blob_get")
    }
}

/// Dialler resolving input-plane URLs from a fixed map of stubs.
pub struct StaticDial(pub HashMap<String, Arc<StubApi>>);

impl Dial for StaticDial {
    fn dial(&self, url: &str) -> ClientResult<Arc<dyn BackendApi>> {
        self.0
            .get(url)
            .cloned()
            .map(|api| api as Arc<dyn BackendApi>)
            .ok_or_else(|| {
                ClientError::InvalidState(format!("unexpected input-plane dial to {url}"))
            })
    }
}

pub fn make_client(api: Arc<StubApi>) -> Client {
    Client::new(api, Arc::new(NoInputPlanes)).unwrap()
}

pub fn make_client_with_planes(api: Arc<StubApi>, planes: HashMap<String, Arc<StubApi>>) -> Client {
    Client::new(api, Arc::new(StaticDial(planes))).unwrap()
}

pub fn pickled(value: &Value) -> Vec<u8> {
    serde_pickle::value_to_vec(value, serde_pickle::SerOptions::new()).unwrap()
}

pub fn success_entry(value: &Value) -> OutputEntry {
    OutputEntry {
        idx: 0,
        input_id: "in-0".into(),
        result: InvocationResult::success(pickled(value)),
        data_format: DataFormat::Pickle,
    }
}

pub fn failure_entry(status: ResultStatus, exception: &str) -> OutputEntry {
    OutputEntry {
        idx: 0,
        input_id: "in-0".into(),
        result: InvocationResult::failure(status, exception),
        data_format: DataFormat::Pickle,
    }
}

pub fn outputs_with(entry: OutputEntry, cursor: &str) -> FunctionOutputsResponse {
    FunctionOutputsResponse {
        outputs: vec![entry],
        last_entry_id: cursor.into(),
    }
}

pub fn empty_outputs(cursor: &str) -> FunctionOutputsResponse {
    FunctionOutputsResponse {
        outputs: Vec::new(),
        last_entry_id: cursor.into(),
    }
}

pub fn submit_ok(function_call_id: &str) -> FunctionSubmitResponse {
    FunctionSubmitResponse {
        function_call_id: function_call_id.into(),
        input_id: "in-0".into(),
        input_token: "it-0".into(),
        call_token: "ct-0".into(),
    }
}

pub fn function_get_ok(function_id: &str, input_plane_url: Option<&str>) -> FunctionGetResponse {
    FunctionGetResponse {
        function_id: function_id.into(),
        metadata: Some(FunctionHandleMetadata {
            input_plane_url: input_plane_url.map(str::to_owned),
            web_url: None,
        }),
    }
}

pub fn no_kwargs() -> BTreeMap<String, Value> {
    BTreeMap::new()
}

/// In-memory blob store served over HTTP.
#[derive(Default)]
pub struct BlobStoreState {
    /// `(Content-MD5 header, body)` for every accepted PUT.
    pub puts: Mutex<Vec<(Option<String>, Vec<u8>)>>,
    pub objects: Mutex<HashMap<String, Vec<u8>>>,
}

async fn put_blob(
    State(state): State<Arc<BlobStoreState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if id == "reject" {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }

    let content_md5 = headers
        .get("content-md5")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    state.puts.lock().unwrap().push((content_md5, body.to_vec()));
    state.objects.lock().unwrap().insert(id, body.to_vec());
    StatusCode::OK
}

async fn get_blob(
    State(state): State<Arc<BlobStoreState>>,
    Path(id): Path<String>,
) -> Result<Vec<u8>, StatusCode> {
    state
        .objects
        .lock()
        .unwrap()
        .get(&id)
        .cloned()
        .ok_or(StatusCode::NOT_FOUND)
}

/// Serves the blob store on an ephemeral port; returns its base URL.
pub async fn spawn_blob_store() -> (String, Arc<BlobStoreState>) {
    let state = Arc::new(BlobStoreState::default());
    let app = Router::new()
        .route("/blobs/{id}", put(put_blob).get(get_blob))
        .layer(DefaultBodyLimit::max(16 * 1024 * 1024))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), state)
}

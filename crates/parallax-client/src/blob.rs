//! Out-of-band payload transfer.
//!
//! Payloads above the inline threshold are uploaded before submission and
//! referenced by blob id; oversized results come back the same way. The
//! whole payload is held in memory — there are no local disk writes.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use md5::Md5;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use parallax_proto::{
    BlobCreateRequest, BlobGetRequest, InputData, UploadTarget,
};

use crate::error::{ClientError, ClientResult};
use crate::transport::BackendApi;

/// Largest payload embedded inline in a submission, in bytes.
///
/// Fixed by the backend protocol: anything strictly larger must be
/// offloaded to blob storage.
pub const MAX_INLINE_PAYLOAD: usize = 2 * 1024 * 1024;

/// Moves payloads between the client and blob storage.
#[derive(Clone)]
pub struct BlobTransfer {
    api: Arc<dyn BackendApi>,
    http: reqwest::Client,
}

impl BlobTransfer {
    /// Creates a transfer bound to a backend connection and HTTP client.
    #[must_use]
    pub fn new(api: Arc<dyn BackendApi>, http: reqwest::Client) -> Self {
        Self { api, http }
    }

    /// Keeps a payload inline or offloads it, depending on its size.
    ///
    /// Exactly one representation is returned; payloads of up to
    /// [`MAX_INLINE_PAYLOAD`] bytes (inclusive) stay inline.
    pub async fn store_payload(&self, payload: Vec<u8>) -> ClientResult<InputData> {
        if payload.len() <= MAX_INLINE_PAYLOAD {
            return Ok(InputData::Inline(payload));
        }

        debug!(
            size = payload.len(),
            limit = MAX_INLINE_PAYLOAD,
            "payload exceeds inline limit, offloading"
        );
        let blob_id = self.upload(&payload).await?;
        Ok(InputData::Blob(blob_id))
    }

    /// Uploads a payload and returns its backend-assigned blob id.
    ///
    /// Digests are computed over the full payload before the slot request;
    /// the MD5 digest is repeated as the PUT's integrity header. A
    /// multipart descriptor means the payload is too large for this client,
    /// which is a hard error rather than a transient condition.
    pub async fn upload(&self, data: &[u8]) -> ClientResult<String> {
        let content_md5 = BASE64.encode(Md5::digest(data));
        let content_sha256 = BASE64.encode(Sha256::digest(data));

        let resp = self
            .api
            .blob_create(BlobCreateRequest {
                content_md5: content_md5.clone(),
                content_sha256,
                content_length: data.len() as u64,
            })
            .await?;

        match resp.target {
            UploadTarget::Multipart => Err(ClientError::PayloadTooLarge(data.len())),
            UploadTarget::SinglePart { put_url } => {
                let put = self
                    .http
                    .put(&put_url)
                    .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                    .header("Content-MD5", &content_md5)
                    .body(data.to_vec())
                    .send()
                    .await?;

                if !put.status().is_success() {
                    return Err(ClientError::UploadFailed {
                        status: put.status().as_u16(),
                    });
                }

                info!(blob_id = %resp.blob_id, size = data.len(), "blob uploaded");
                Ok(resp.blob_id)
            }
        }
    }

    /// Downloads the content of a stored blob.
    pub async fn download(&self, blob_id: &str) -> ClientResult<Vec<u8>> {
        let resp = self
            .api
            .blob_get(BlobGetRequest {
                blob_id: blob_id.to_owned(),
            })
            .await?;

        let get = self.http.get(&resp.download_url).send().await?;
        if !get.status().is_success() {
            return Err(ClientError::DownloadFailed {
                status: get.status().as_u16(),
            });
        }

        let bytes = get.bytes().await?;
        debug!(blob_id = %blob_id, size = bytes.len(), "blob downloaded");
        Ok(bytes.to_vec())
    }
}

impl std::fmt::Debug for BlobTransfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobTransfer").finish_non_exhaustive()
    }
}

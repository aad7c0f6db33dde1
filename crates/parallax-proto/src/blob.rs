//! Blob slot negotiation for out-of-band payload transfer.

use serde::{Deserialize, Serialize};

/// Requests an upload slot for a payload too large to embed inline.
///
/// Both digests are computed client-side over the full payload before the
/// slot is requested; the backend verifies them on upload completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobCreateRequest {
    /// Base64-encoded MD5 digest of the payload.
    pub content_md5: String,
    /// Base64-encoded SHA-256 digest of the payload.
    pub content_sha256: String,
    /// Exact payload length in bytes.
    pub content_length: u64,
}

/// Upload slot assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobCreateResponse {
    /// Identifier the payload will be referenced by after upload.
    pub blob_id: String,
    /// Where and how to upload the bytes.
    pub target: UploadTarget,
}

/// Upload path selected by the backend based on the declared length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UploadTarget {
    /// Single HTTP PUT of the full payload to a pre-signed URL.
    SinglePart {
        /// Destination for the PUT.
        put_url: String,
    },
    /// Multipart descriptor; not supported by this client.
    Multipart,
}

/// Requests a download URL for a previously stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobGetRequest {
    /// Blob to fetch.
    pub blob_id: String,
}

/// Pre-signed location of the blob content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobGetResponse {
    /// URL serving the raw bytes via HTTP GET.
    pub download_url: String,
}

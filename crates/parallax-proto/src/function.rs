//! Function lookup and input construction types.

use serde::{Deserialize, Serialize};

/// Request to resolve a deployed function by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionGetRequest {
    /// Application the function was deployed under.
    pub app_name: String,
    /// Function name within the application.
    pub function_name: String,
    /// Deployment environment, when the backend is multi-environment.
    pub environment: Option<String>,
}

/// Response to a function lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionGetResponse {
    /// Backend-assigned function identifier.
    pub function_id: String,
    /// Routing metadata attached to the handle at lookup time.
    pub metadata: Option<FunctionHandleMetadata>,
}

/// Routing metadata resolved once at lookup time.
///
/// The invocation plane for a handle is decided from this metadata exactly
/// once and never re-decided per call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionHandleMetadata {
    /// Dedicated input-plane endpoint, when the function has one.
    pub input_plane_url: Option<String>,
    /// Public URL, when the function is served as a web endpoint.
    pub web_url: Option<String>,
}

/// Requests live statistics for a deployed function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionStatsRequest {
    /// Function to report on.
    pub function_id: String,
}

/// Live statistics for a deployed function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionStatsResponse {
    /// Inputs queued but not yet running.
    pub backlog: u32,
    /// Runners currently provisioned for the function.
    pub total_runners: u32,
}

/// A serialised input ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInput {
    /// Argument payload, inline or offloaded.
    pub data: InputData,
    /// Serialisation format of the payload.
    pub data_format: DataFormat,
    /// Method qualifier for class-bound functions.
    pub method_name: Option<String>,
}

impl FunctionInput {
    /// Creates an input carrying its payload inline.
    #[must_use]
    pub fn inline(payload: Vec<u8>, data_format: DataFormat) -> Self {
        Self {
            data: InputData::Inline(payload),
            data_format,
            method_name: None,
        }
    }

    /// Creates an input referencing a previously uploaded blob.
    #[must_use]
    pub fn blob(blob_id: impl Into<String>, data_format: DataFormat) -> Self {
        Self {
            data: InputData::Blob(blob_id.into()),
            data_format,
            method_name: None,
        }
    }

    /// Sets the method qualifier.
    #[must_use]
    pub fn with_method_name(mut self, method_name: impl Into<String>) -> Self {
        self.method_name = Some(method_name.into());
        self
    }
}

/// Payload slot of a [`FunctionInput`].
///
/// Exactly one representation exists by construction; an empty inline
/// payload is permitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputData {
    /// Payload embedded in the request.
    Inline(Vec<u8>),
    /// Handle of a payload uploaded out-of-band.
    Blob(String),
}

impl InputData {
    /// Checks whether the payload is carried inline.
    #[must_use]
    pub const fn is_inline(&self) -> bool {
        matches!(self, Self::Inline(_))
    }

    /// Checks whether the payload was offloaded.
    #[must_use]
    pub const fn is_blob(&self) -> bool {
        matches!(self, Self::Blob(_))
    }
}

/// Serialisation format tag carried alongside every payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DataFormat {
    /// Format not stated; treated as an error by the backend.
    Unspecified = 0,
    /// Python pickle object graph.
    Pickle = 1,
}

impl DataFormat {
    /// Returns the numeric value of this format tag.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Creates a format tag from a numeric value.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Unspecified),
            1 => Some(Self::Pickle),
            _ => None,
        }
    }
}

/// How the backend should treat the submitted call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum InvocationType {
    /// Caller polls for the result.
    Sync = 1,
    /// Fire-and-forget; the result is fetched later, if ever.
    Async = 2,
}

impl InvocationType {
    /// Returns the numeric value of this invocation type.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Creates an invocation type from a numeric value.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Sync),
            2 => Some(Self::Async),
            _ => None,
        }
    }
}

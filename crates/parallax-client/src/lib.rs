//! Client-side engine for invoking remote Parallax functions.
//!
//! This crate implements the function invocation protocol: argument
//! serialisation, size-based out-of-band blob transfer, dispatch to one of
//! two interchangeable invocation planes, bounded-time result polling and
//! transient-failure retry.
//!
//! Application bootstrap (establishing the backend connection, resolving
//! credentials) is the host's concern: it hands this crate an implementation
//! of [`BackendApi`] plus a [`Dial`] hook for input-plane endpoints, and
//! everything else flows from [`Function::lookup`].
//!
//! # Example
//!
//! ```ignore
//! use parallax_client::{Client, Function, LookupOptions, Value};
//!
//! let client = Client::new(api, dial)?;
//! let function = Function::lookup(&client, "demo", "echo", LookupOptions::default()).await?;
//!
//! let result = function
//!     .remote(vec![Value::String("hello".into())], Default::default())
//!     .await?;
//! ```
//!
//! Every network operation is cancellable by dropping the future; the
//! driver holds no locks and shares no mutable state between calls.

pub mod blob;
pub mod config;
pub mod error;
pub mod serializer;
pub mod transport;

mod function;
mod function_call;
mod invocation;

pub use blob::{BlobTransfer, MAX_INLINE_PAYLOAD};
pub use config::HttpConfig;
pub use error::{ClientError, ClientResult};
pub use function::{Function, FunctionStats, LookupOptions};
pub use function_call::FunctionCall;
pub use transport::{BackendApi, Client, Dial, NoInputPlanes};

// Argument and result values use the pickle object model directly.
pub use serde_pickle::{HashableValue, Value};

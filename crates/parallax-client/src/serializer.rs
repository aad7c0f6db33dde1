//! Argument and result serialisation.
//!
//! The remote execution environment is Python-based, so payloads use the
//! Python pickle object graph format; this is an external compatibility
//! constraint, not a design choice. Arguments travel as a pickled 2-tuple
//! `(args, kwargs)` that the backend can splat directly into the target
//! function.

use std::collections::BTreeMap;

use serde_pickle::{DeOptions, HashableValue, SerOptions, Value};

use crate::error::ClientResult;

/// Encodes positional and named arguments into a single pickle payload.
///
/// Named arguments are keyed by string, matching what the Python side can
/// splat as keyword arguments. Map ordering is irrelevant to the backend
/// but the encoding is deterministic, so equal logical inputs produce
/// byte-identical payloads.
pub fn encode(args: &[Value], kwargs: &BTreeMap<String, Value>) -> ClientResult<Vec<u8>> {
    let kwargs_dict: BTreeMap<HashableValue, Value> = kwargs
        .iter()
        .map(|(key, value)| (HashableValue::String(key.clone()), value.clone()))
        .collect();

    let payload = Value::Tuple(vec![
        Value::Tuple(args.to_vec()),
        Value::Dict(kwargs_dict),
    ]);

    Ok(serde_pickle::value_to_vec(&payload, SerOptions::new())?)
}

/// Decodes a pickle payload into a structured value.
pub fn decode(bytes: &[u8]) -> ClientResult<Value> {
    Ok(serde_pickle::value_from_slice(bytes, DeOptions::new())?)
}

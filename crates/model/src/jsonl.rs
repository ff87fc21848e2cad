//! Deterministic JSON-Lines encoding.
//!
//! §6 requires every intermediate artifact to emit "keys in sorted order
//! within each object". `serde_json`'s direct `to_string` writes struct
//! fields in declaration order, so we round-trip through `serde_json::Value`
//! first: `Value::Object` is backed by a `BTreeMap` (as long as the
//! `preserve_order` cargo feature stays off anywhere in the build), so
//! serializing the `Value` back out yields lexicographically sorted keys at
//! every nesting level.
use serde::Serialize;

/// Serialize `value` to a single JSON line with keys sorted at every level,
/// no trailing newline.
pub fn to_sorted_line<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let as_value = serde_json::to_value(value)?;
    serde_json::to_string(&as_value)
}

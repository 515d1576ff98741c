// src/utils/serialization.rs
//! Serialization utilities for credential documents.

use serde::Serialize;

/// Serializes a value to its canonical JSON form.
///
/// The value is first converted to a `serde_json::Value`, which stores
/// object members in key order, so two structurally equal documents always
/// produce the same byte string. This is the form that gets hashed for
/// commitments and signed by issuers.
pub fn canonical_json<T: Serialize>(data: &T) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(data)?;
    serde_json::to_string(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorts_object_keys() {
        let a = json!({"b": 1, "a": 2});
        let b = json!({"a": 2, "b": 1});
        assert_eq!(canonical_json(&a).unwrap(), canonical_json(&b).unwrap());
    }

    #[test]
    fn test_canonical_json_stable_for_same_value() {
        let v = json!({"name": "Acme Inc.", "jurisdiction": "DE"});
        assert_eq!(canonical_json(&v).unwrap(), canonical_json(&v).unwrap());
    }
}

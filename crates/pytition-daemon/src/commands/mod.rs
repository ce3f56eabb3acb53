//! RPC command handlers.
//!
//! Each submodule implements the commands for one entity family. Handlers
//! hold the database lock only for the duration of the storage calls and
//! emit events after the write has committed.

pub mod accounts;
pub mod diagnostics;
pub mod organizations;
pub mod petitions;
pub mod signatures;
pub mod templates;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::rpc::RpcError;

/// Required parameter `key`, deserialized.
pub(crate) fn param<T: DeserializeOwned>(params: &Value, key: &str) -> Result<T, RpcError> {
    let value = params
        .get(key)
        .ok_or_else(|| RpcError::invalid_params(&format!("{key} required")))?;
    serde_json::from_value(value.clone())
        .map_err(|e| RpcError::invalid_params(&format!("{key}: {e}")))
}

/// Optional parameter `key`; absent and `null` both yield `None`.
pub(crate) fn optional_param<T: DeserializeOwned>(
    params: &Value,
    key: &str,
) -> Result<Option<T>, RpcError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| RpcError::invalid_params(&format!("{key}: {e}"))),
    }
}

pub(crate) fn to_value<T: Serialize>(value: &T) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError::internal_error(&format!("encode: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_helpers() {
        let params = serde_json::json!({"id": 3, "flag": null, "name": "x"});
        assert_eq!(param::<i64>(&params, "id").expect("id"), 3);
        assert!(param::<i64>(&params, "missing").is_err());
        assert!(param::<i64>(&params, "name").is_err());
        assert_eq!(optional_param::<bool>(&params, "flag").expect("flag"), None);
        assert_eq!(optional_param::<bool>(&params, "other").expect("other"), None);
        assert_eq!(
            optional_param::<String>(&params, "name").expect("name"),
            Some("x".to_string())
        );
    }
}

//! Daemon status and event subscription handlers.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::events::EventFilter;
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Get daemon status.
pub async fn get_daemon_status(state: &Arc<DaemonState>) -> Result {
    Ok(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "schema_version": pytition_db::SCHEMA_VERSION,
        "events_emitted": state.event_bus.sequence(),
    }))
}

/// Subscribe to daemon events.
///
/// Only validates the filter here; the connection handler streams the
/// events once this call succeeds.
pub async fn subscribe_events(_state: &Arc<DaemonState>, params: &Value) -> Result {
    if let Some(filter) = params.get("filter").filter(|f| !f.is_null()) {
        EventFilter::deserialize(filter)
            .map_err(|e| RpcError::invalid_params(&format!("filter: {e}")))?;
    }

    let mut sub_id = [0u8; 16];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut sub_id);

    Ok(serde_json::json!({
        "subscription_id": hex::encode(sub_id),
    }))
}

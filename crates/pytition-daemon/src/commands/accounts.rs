//! Account and profile command handlers.

use std::sync::Arc;

use serde_json::Value;

use pytition_db::queries::users;
use pytition_types::events::EventType;
use pytition_types::owner::Owner;
use pytition_types::{NewAccount, UserId, UserProfile};

use super::{optional_param, param, to_value};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

fn profile_json(profile: &UserProfile) -> Result {
    let mut value = to_value(profile)?;
    value["kind"] = Value::String(profile.kind().to_string());
    value["display_name"] = Value::String(profile.display_name());
    Ok(value)
}

/// Create an account and its profile together.
pub async fn register_account(state: &Arc<DaemonState>, params: &Value) -> Result {
    let account = NewAccount {
        username: param(params, "username")?,
        first_name: optional_param(params, "first_name")?.unwrap_or_default(),
        last_name: optional_param(params, "last_name")?.unwrap_or_default(),
        email: optional_param(params, "email")?.unwrap_or_default(),
    };

    let profile = {
        let db = state.db.lock().await;
        state.profiles.register(&db, &account)?
    };

    state.event_bus.publish(
        EventType::AccountRegistered,
        serde_json::json!({"user_id": profile.id(), "username": profile.username()}),
    );

    profile_json(&profile)
}

/// Look up a profile by `user_id` or by `username`. Missing yields `null`.
pub async fn get_user(state: &Arc<DaemonState>, params: &Value) -> Result {
    let user_id: Option<UserId> = optional_param(params, "user_id")?;
    let username: Option<String> = optional_param(params, "username")?;

    let db = state.db.lock().await;
    let profile = match (user_id, username) {
        (Some(id), _) => users::profile(&db, id)?,
        (None, Some(name)) => users::profile_by_username(&db, &name)?,
        (None, None) => return Err(RpcError::invalid_params("user_id or username required")),
    };

    match profile {
        Some(profile) => profile_json(&profile),
        None => Ok(Value::Null),
    }
}

/// Delete a profile and the account behind it.
pub async fn delete_user(state: &Arc<DaemonState>, params: &Value) -> Result {
    let user_id: UserId = param(params, "user_id")?;
    let deleted = {
        let db = state.db.lock().await;
        state.profiles.delete_profile(&db, user_id)?
    };
    if deleted {
        state
            .event_bus
            .publish(EventType::AccountDeleted, serde_json::json!({"user_id": user_id}));
    }
    Ok(serde_json::json!({"deleted": deleted}))
}

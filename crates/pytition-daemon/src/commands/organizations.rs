//! Organization, membership and permission command handlers.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use pytition_db::queries::{organizations, permissions};
use pytition_types::events::EventType;
use pytition_types::{OrganizationId, Permission, UserId};

use super::{param, to_value};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

fn member_params(params: &Value) -> std::result::Result<(OrganizationId, UserId), RpcError> {
    Ok((param(params, "organization_id")?, param(params, "user_id")?))
}

fn member_event(state: &DaemonState, event_type: EventType, org_id: OrganizationId, user_id: UserId) {
    state.event_bus.publish(
        event_type,
        serde_json::json!({"organization_id": org_id, "user_id": user_id}),
    );
}

pub async fn create_organization(state: &Arc<DaemonState>, params: &Value) -> Result {
    let name: String = param(params, "name")?;
    let db = state.db.lock().await;
    let org = organizations::create(&db, &name)?;
    info!(organization_id = org.id, "organization created");
    to_value(&org)
}

/// Look up an organization with its member and invitee usernames.
/// A missing organization yields `null`.
pub async fn get_organization(state: &Arc<DaemonState>, params: &Value) -> Result {
    let org_id: OrganizationId = param(params, "organization_id")?;
    let db = state.db.lock().await;
    let Some(org) = organizations::get(&db, org_id)? else {
        return Ok(Value::Null);
    };

    let members = organizations::members(&db, org.id)?
        .iter()
        .map(|p| p.username().to_string())
        .collect::<Vec<_>>();
    let invited = organizations::invited(&db, org.id)?
        .iter()
        .map(|p| p.username().to_string())
        .collect::<Vec<_>>();

    let mut value = to_value(&org)?;
    value["members"] = to_value(&members)?;
    value["invited"] = to_value(&invited)?;
    Ok(value)
}

pub async fn list_organizations(state: &Arc<DaemonState>) -> Result {
    let db = state.db.lock().await;
    to_value(&organizations::list(&db)?)
}

pub async fn delete_organization(state: &Arc<DaemonState>, params: &Value) -> Result {
    let org_id: OrganizationId = param(params, "organization_id")?;
    let db = state.db.lock().await;
    let deleted = organizations::delete(&db, org_id)?;
    if deleted {
        info!(organization_id = org_id, "organization deleted");
    }
    Ok(serde_json::json!({"deleted": deleted}))
}

/// Add a member directly. Returns the new, all-false permission.
pub async fn add_member(state: &Arc<DaemonState>, params: &Value) -> Result {
    let (org_id, user_id) = member_params(params)?;
    let permission = {
        let db = state.db.lock().await;
        organizations::add_member(&db, org_id, user_id)?
    };
    member_event(state, EventType::MemberAdded, org_id, user_id);
    to_value(&permission)
}

pub async fn remove_member(state: &Arc<DaemonState>, params: &Value) -> Result {
    let (org_id, user_id) = member_params(params)?;
    let removed = {
        let db = state.db.lock().await;
        organizations::remove_member(&db, org_id, user_id)?
    };
    if removed {
        member_event(state, EventType::MemberRemoved, org_id, user_id);
    }
    Ok(serde_json::json!({"removed": removed}))
}

pub async fn invite_member(state: &Arc<DaemonState>, params: &Value) -> Result {
    let (org_id, user_id) = member_params(params)?;
    let invited = {
        let db = state.db.lock().await;
        organizations::invite(&db, org_id, user_id)?
    };
    if invited {
        member_event(state, EventType::MemberInvited, org_id, user_id);
    }
    Ok(serde_json::json!({"invited": invited}))
}

/// Turn a pending invitation into a membership.
pub async fn accept_invitation(state: &Arc<DaemonState>, params: &Value) -> Result {
    let (org_id, user_id) = member_params(params)?;
    let permission = {
        let db = state.db.lock().await;
        organizations::accept_invitation(&db, org_id, user_id)?
    };
    member_event(state, EventType::MemberAdded, org_id, user_id);
    to_value(&permission)
}

/// The permission a member holds, with its "org : username" label.
pub async fn get_permission(state: &Arc<DaemonState>, params: &Value) -> Result {
    let (org_id, user_id) = member_params(params)?;
    let db = state.db.lock().await;
    match permissions::for_member(&db, user_id, org_id)? {
        Some(permission) => {
            let label = permissions::label(&db, permission.id)?;
            Ok(serde_json::json!({"permission": permission, "label": label}))
        }
        None => Ok(Value::Null),
    }
}

pub async fn update_permission(state: &Arc<DaemonState>, params: &Value) -> Result {
    let permission: Permission = param(params, "permission")?;
    let db = state.db.lock().await;
    permissions::update(&db, &permission)?;
    info!(
        permission_id = permission.id,
        granted = permission.granted().len(),
        "permission updated"
    );
    Ok(serde_json::json!({"updated": true}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DaemonConfig;
    use pytition_db::accounts::{AccountStore, SqliteAccountStore};
    use pytition_db::queries::users;
    use pytition_types::NewAccount;

    async fn setup() -> (Arc<DaemonState>, OrganizationId, UserId) {
        let conn = pytition_db::open_memory().expect("open test db");
        let state = Arc::new(DaemonState::new(conn, DaemonConfig::default()));
        let ids = {
            let db = state.db.lock().await;
            let account = SqliteAccountStore
                .create(&db, &NewAccount::new("grace"))
                .expect("account");
            let (user, _) = users::ensure_for_account(&db, account.id).expect("user");
            let org = organizations::create(&db, "Org").expect("org");
            (org.id, user.id)
        };
        (state, ids.0, ids.1)
    }

    #[tokio::test]
    async fn test_add_member_and_lookup() {
        let (state, oid, uid) = setup().await;
        let mut rx = state.event_bus.subscribe();
        let params = serde_json::json!({"organization_id": oid, "user_id": uid});

        let permission = add_member(&state, &params).await.expect("add");
        assert_eq!(permission["organization_id"], oid);
        assert_eq!(rx.try_recv().expect("event").event_type, EventType::MemberAdded);

        let org = get_organization(&state, &serde_json::json!({"organization_id": oid}))
            .await
            .expect("get");
        assert_eq!(org["members"], serde_json::json!(["grace"]));

        let err = add_member(&state, &params).await.expect_err("duplicate");
        assert_eq!(err.message, "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn test_add_unknown_member_not_found() {
        let (state, oid, _) = setup().await;
        let err = add_member(&state, &serde_json::json!({"organization_id": oid, "user_id": 404}))
            .await
            .expect_err("unknown user");
        assert_eq!(err.message, "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_accept_without_invitation() {
        let (state, oid, uid) = setup().await;
        let err = accept_invitation(
            &state,
            &serde_json::json!({"organization_id": oid, "user_id": uid}),
        )
        .await
        .expect_err("no invitation");
        assert_eq!(err.message, "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_invite_member_twice() {
        let (state, oid, uid) = setup().await;
        let params = serde_json::json!({"organization_id": oid, "user_id": uid});
        let first = invite_member(&state, &params).await.expect("invite");
        let second = invite_member(&state, &params).await.expect("invite");
        assert_eq!(first["invited"], true);
        assert_eq!(second["invited"], false);
    }

    #[tokio::test]
    async fn test_permission_of_non_member_is_null() {
        let (state, oid, uid) = setup().await;
        let fetched = get_permission(
            &state,
            &serde_json::json!({"organization_id": oid, "user_id": uid}),
        )
        .await
        .expect("get");
        assert!(fetched.is_null());
    }

    #[tokio::test]
    async fn test_delete_organization() {
        let (state, oid, _) = setup().await;
        let deleted = delete_organization(&state, &serde_json::json!({"organization_id": oid}))
            .await
            .expect("delete");
        assert_eq!(deleted["deleted"], true);
        let listed = list_organizations(&state).await.expect("list");
        assert_eq!(listed, serde_json::json!([]));
    }
}

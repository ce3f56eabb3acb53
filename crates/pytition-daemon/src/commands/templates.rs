//! Petition template command handlers.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use pytition_db::queries::{ownership, templates};
use pytition_types::{NewTemplate, OwnerRef, PetitionContent, TemplateId};

use super::{optional_param, param, to_value};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Create a template, owned by `owner` when given.
pub async fn create_template(state: &Arc<DaemonState>, params: &Value) -> Result {
    let name: String = param(params, "name")?;
    let target: Option<i64> = optional_param(params, "target")?;
    let content: Option<PetitionContent> = optional_param(params, "content")?;
    let owner: Option<OwnerRef> = optional_param(params, "owner")?;

    let new = NewTemplate {
        name,
        target,
        content: content.unwrap_or_else(|| state.config.email.seed_content()),
    };

    let db = state.db.lock().await;
    let template = match owner {
        Some(owner) => ownership::create_template_for(&db, owner, &new)?,
        None => templates::insert(&db, &new)?,
    };
    info!(template_id = template.id, "template created");

    to_value(&template)
}

/// Look up a template. A missing template yields `null`.
pub async fn get_template(state: &Arc<DaemonState>, params: &Value) -> Result {
    let template_id: TemplateId = param(params, "template_id")?;
    let db = state.db.lock().await;
    match templates::get(&db, template_id)? {
        Some(template) => {
            let owners = ownership::for_template(&db, template.id)?
                .iter()
                .filter_map(|row| row.owner().ok())
                .collect::<Vec<_>>();
            let mut value = to_value(&template)?;
            value["owners"] = to_value(&owners)?;
            Ok(value)
        }
        None => Ok(Value::Null),
    }
}

pub async fn find_template(state: &Arc<DaemonState>, params: &Value) -> Result {
    let name: String = param(params, "name")?;
    let db = state.db.lock().await;
    to_value(&templates::find_by_name(&db, &name)?)
}

/// All templates, or those of one owner.
pub async fn list_templates(state: &Arc<DaemonState>, params: &Value) -> Result {
    let owner: Option<OwnerRef> = optional_param(params, "owner")?;
    let db = state.db.lock().await;
    let list = match owner {
        Some(owner) => ownership::templates_of(&db, owner)?,
        None => templates::list(&db)?,
    };
    to_value(&list)
}

pub async fn delete_template(state: &Arc<DaemonState>, params: &Value) -> Result {
    let template_id: TemplateId = param(params, "template_id")?;
    let db = state.db.lock().await;
    let deleted = templates::delete(&db, template_id)?;
    Ok(serde_json::json!({"deleted": deleted}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DaemonConfig;

    fn test_state() -> Arc<DaemonState> {
        let conn = pytition_db::open_memory().expect("open test db");
        Arc::new(DaemonState::new(conn, DaemonConfig::default()))
    }

    #[tokio::test]
    async fn test_owned_template() {
        let state = test_state();
        let org_id = {
            let db = state.db.lock().await;
            pytition_db::queries::organizations::create(&db, "Org")
                .expect("org")
                .id
        };
        let owner = serde_json::json!({"kind": "organization", "id": org_id});

        let created = create_template(&state, &serde_json::json!({"name": "t", "owner": owner}))
            .await
            .expect("create");
        let fetched = get_template(&state, &serde_json::json!({"template_id": created["id"]}))
            .await
            .expect("get");
        assert_eq!(fetched["owners"][0], owner);

        let listed = list_templates(&state, &serde_json::json!({"owner": owner}))
            .await
            .expect("list");
        assert_eq!(listed.as_array().map(Vec::len), Some(1));
        let found = find_template(&state, &serde_json::json!({"name": "t"}))
            .await
            .expect("find");
        assert_eq!(found.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_missing_template_is_null() {
        let state = test_state();
        let fetched = get_template(&state, &serde_json::json!({"template_id": 9}))
            .await
            .expect("get");
        assert!(fetched.is_null());
        let deleted = delete_template(&state, &serde_json::json!({"template_id": 9}))
            .await
            .expect("delete");
        assert_eq!(deleted["deleted"], false);
    }
}

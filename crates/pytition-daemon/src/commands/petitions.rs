//! Petition command handlers.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use pytition_db::queries::{organizations, petitions, templates, users};
use pytition_types::events::EventType;
use pytition_types::{
    NewPetition, OwnerRef, Petition, PetitionContent, PetitionId, TemplateId, DEFAULT_TARGET,
};

use super::{optional_param, param, to_value};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

fn petition_json(petition: &Petition, signature_number: u64) -> Result {
    let mut value = to_value(petition)?;
    value["raw_title"] = Value::String(petition.raw_title());
    value["signature_number"] = Value::from(signature_number);
    Ok(value)
}

/// Create a petition, optionally seeded from a template and linked to an owner.
pub async fn create_petition(state: &Arc<DaemonState>, params: &Value) -> Result {
    let title: String = param(params, "title")?;
    let template_id: Option<TemplateId> = optional_param(params, "template_id")?;
    let target: Option<i64> = optional_param(params, "target")?;
    let content: Option<PetitionContent> = optional_param(params, "content")?;
    let owner: Option<OwnerRef> = optional_param(params, "owner")?;

    let db = state.db.lock().await;
    let mut new = match template_id {
        Some(id) => NewPetition::from_template(&templates::require(&db, id)?, title),
        None => NewPetition {
            title,
            target: DEFAULT_TARGET,
            content: state.config.email.seed_content(),
        },
    };
    if let Some(target) = target {
        new.target = target;
    }
    if let Some(content) = content {
        new.content = content;
    }

    let petition = pytition_db::atomic(&db, |conn| {
        let petition = petitions::insert(conn, &new)?;
        match owner {
            Some(OwnerRef::User(user_id)) => users::add_petition(conn, user_id, petition.id)?,
            Some(OwnerRef::Organization(org_id)) => {
                organizations::add_petition(conn, org_id, petition.id)?
            }
            None => {}
        }
        Ok(petition)
    })?;
    info!(petition_id = petition.id, "petition created");

    to_value(&petition)
}

/// Look up a petition. A missing petition yields `null`.
pub async fn get_petition(state: &Arc<DaemonState>, params: &Value) -> Result {
    let petition_id: PetitionId = param(params, "petition_id")?;
    let db = state.db.lock().await;
    match petitions::get(&db, petition_id)? {
        Some(petition) => {
            let number = petitions::signature_number(&db, petition.id)?;
            petition_json(&petition, number)
        }
        None => Ok(Value::Null),
    }
}

/// List petitions, optionally those of one owner and/or one visibility.
pub async fn list_petitions(state: &Arc<DaemonState>, params: &Value) -> Result {
    let published: Option<bool> = optional_param(params, "published")?;
    let owner: Option<OwnerRef> = optional_param(params, "owner")?;

    let db = state.db.lock().await;
    let mut list = match owner {
        Some(OwnerRef::User(user_id)) => users::petitions(&db, user_id)?,
        Some(OwnerRef::Organization(org_id)) => organizations::petitions(&db, org_id)?,
        None => petitions::list(&db, published)?,
    };
    if let Some(published) = published {
        list.retain(|p| p.published == published);
    }

    let items = list
        .iter()
        .map(|p| petition_json(p, petitions::signature_number(&db, p.id)?))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Value::Array(items))
}

pub async fn update_petition(state: &Arc<DaemonState>, params: &Value) -> Result {
    let petition: Petition = param(params, "petition")?;
    let db = state.db.lock().await;
    petitions::update(&db, &petition)?;
    Ok(serde_json::json!({"updated": true}))
}

pub async fn delete_petition(state: &Arc<DaemonState>, params: &Value) -> Result {
    let petition_id: PetitionId = param(params, "petition_id")?;
    let db = state.db.lock().await;
    let deleted = petitions::delete(&db, petition_id)?;
    if deleted {
        info!(petition_id, "petition deleted");
    }
    Ok(serde_json::json!({"deleted": deleted}))
}

pub async fn publish_petition(state: &Arc<DaemonState>, params: &Value) -> Result {
    set_published(state, params, true).await
}

pub async fn unpublish_petition(state: &Arc<DaemonState>, params: &Value) -> Result {
    set_published(state, params, false).await
}

async fn set_published(state: &Arc<DaemonState>, params: &Value, published: bool) -> Result {
    let petition_id: PetitionId = param(params, "petition_id")?;
    {
        let db = state.db.lock().await;
        petitions::set_published(&db, petition_id, published)?;
    }

    let event_type = if published {
        EventType::PetitionPublished
    } else {
        EventType::PetitionUnpublished
    };
    state
        .event_bus
        .publish(event_type, serde_json::json!({"petition_id": petition_id}));

    Ok(serde_json::json!({"published": published}))
}

/// Confirmed signatures by default; `"all": true` counts pending ones too.
pub async fn get_signature_count(state: &Arc<DaemonState>, params: &Value) -> Result {
    let petition_id: PetitionId = param(params, "petition_id")?;
    let all = optional_param::<bool>(params, "all")?.unwrap_or(false);

    let db = state.db.lock().await;
    let petition = petitions::require(&db, petition_id)?;
    let filter = if all { None } else { Some(true) };
    let count = petitions::signature_count(&db, petition.id, filter)?;

    Ok(serde_json::json!({
        "petition_id": petition.id,
        "count": count,
        "target": petition.target,
    }))
}

//! Signature command handlers.
//!
//! A confirmation token is as good as the signer's consent: whoever holds
//! it can confirm the signature. Tokens therefore only leave the daemon in
//! the `sign_petition` reply and in `ConfirmationRequested` events, which go
//! to subscribers of the mail category alone. `SignatureRecorded` is public
//! and never carries the token.

use std::sync::Arc;

use serde_json::Value;

use pytition_db::queries::{petitions, signatures};
use pytition_types::events::EventType;
use pytition_types::{NewSignature, PetitionId, SignatureId};

use super::{optional_param, param, to_value};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Record a pending signature. The token goes to the caller and to the mail
/// transport, which puts it in the confirmation link.
pub async fn sign_petition(state: &Arc<DaemonState>, params: &Value) -> Result {
    let petition_id: PetitionId = param(params, "petition_id")?;
    let fields: NewSignature = param(params, "signature")?;

    let signature = {
        let db = state.db.lock().await;
        signatures::record(&db, petition_id, &fields)?
    };

    state.event_bus.publish(
        EventType::SignatureRecorded,
        serde_json::json!({
            "petition_id": petition_id,
            "signature_id": signature.id,
        }),
    );
    state.event_bus.publish(
        EventType::ConfirmationRequested,
        serde_json::json!({
            "petition_id": petition_id,
            "signature_id": signature.id,
            "email": signature.email,
            "confirmation_hash": signature.confirmation_hash,
        }),
    );

    to_value(&signature)
}

/// Confirm by token. An unknown token is reported, not raised.
pub async fn confirm_signature(state: &Arc<DaemonState>, params: &Value) -> Result {
    let petition_id: PetitionId = param(params, "petition_id")?;
    let token: String = param(params, "token")?;

    let message = {
        let db = state.db.lock().await;
        petitions::confirm_signature(&db, petition_id, &token)?
    };

    if message.is_some() {
        state.event_bus.publish(
            EventType::SignatureConfirmed,
            serde_json::json!({"petition_id": petition_id}),
        );
    }

    Ok(serde_json::json!({
        "confirmed": message.is_some(),
        "message": message,
    }))
}

pub async fn list_signatures(state: &Arc<DaemonState>, params: &Value) -> Result {
    let petition_id: PetitionId = param(params, "petition_id")?;
    let confirmed: Option<bool> = optional_param(params, "confirmed")?;

    let db = state.db.lock().await;
    petitions::require(&db, petition_id)?;
    let list = signatures::list(&db, petition_id, confirmed)?;

    let items = list
        .iter()
        .map(|s| {
            let mut value = to_value(s)?;
            value["display"] = Value::String(s.to_string());
            Ok(value)
        })
        .collect::<std::result::Result<Vec<_>, RpcError>>()?;
    Ok(Value::Array(items))
}

pub async fn delete_signature(state: &Arc<DaemonState>, params: &Value) -> Result {
    let signature_id: SignatureId = param(params, "signature_id")?;
    let db = state.db.lock().await;
    let deleted = signatures::delete(&db, signature_id)?;
    Ok(serde_json::json!({"deleted": deleted}))
}

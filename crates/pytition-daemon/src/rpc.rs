//! JSON-RPC server over Unix socket.
//!
//! Listens on a Unix domain socket, accepts connections, and dispatches
//! newline-delimited JSON-RPC method calls to the command handlers. A
//! connection that calls `subscribe_events` is switched to streaming mode
//! and receives `event` notifications until it disconnects.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::UnixListener;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

use pytition_db::DbError;
use pytition_types::ValidationError;

use crate::commands;
use crate::events::EventFilter;
use crate::DaemonState;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    pub id: serde_json::Value,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// Server-initiated notification (no id).
#[derive(Debug, Serialize)]
struct RpcNotification<'a, T: Serialize> {
    jsonrpc: &'static str,
    method: &'static str,
    params: &'a T,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RpcError {
    pub code: i32,
    /// Error name.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcResponse {
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl RpcError {
    // Standard JSON-RPC errors

    /// Parse error (-32700).
    pub fn parse_error() -> Self {
        Self {
            code: -32700,
            message: "PARSE_ERROR".to_string(),
            data: None,
        }
    }

    /// Invalid request (-32600).
    pub fn invalid_request() -> Self {
        Self {
            code: -32600,
            message: "INVALID_REQUEST".to_string(),
            data: None,
        }
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "METHOD_NOT_FOUND".to_string(),
            data: Some(serde_json::json!({"method": method})),
        }
    }

    /// Invalid params (-32602).
    pub fn invalid_params(detail: &str) -> Self {
        Self {
            code: -32602,
            message: "INVALID_PARAMS".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Internal error (-32603).
    pub fn internal_error(detail: &str) -> Self {
        Self {
            code: -32603,
            message: "INTERNAL_ERROR".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    // Domain errors

    /// Required record missing (-32020).
    pub fn not_found(detail: &str) -> Self {
        Self {
            code: -32020,
            message: "NOT_FOUND".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Write rejected by a field or domain rule (-32030).
    pub fn validation_failed(detail: &str) -> Self {
        Self {
            code: -32030,
            message: "VALIDATION_FAILED".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Email already has a confirmed signature on the petition (-32031).
    pub fn already_signed() -> Self {
        Self {
            code: -32031,
            message: "ALREADY_SIGNED".to_string(),
            data: Some(serde_json::json!({"detail": ValidationError::AlreadySigned.to_string()})),
        }
    }

    /// Stored rows contradict an invariant (-32040).
    pub fn integrity_violation(detail: &str) -> Self {
        Self {
            code: -32040,
            message: "INTEGRITY_VIOLATION".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }
}

impl From<DbError> for RpcError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(what) => Self::not_found(&what),
            DbError::Validation(ValidationError::AlreadySigned) => Self::already_signed(),
            DbError::Validation(v) => Self::validation_failed(&v.to_string()),
            DbError::Constraint(detail) => Self::validation_failed(&detail),
            DbError::Integrity(detail) => Self::integrity_violation(&detail),
            other => {
                error!("database error: {other}");
                Self::internal_error(&format!("db error: {other}"))
            }
        }
    }
}

/// The RPC server.
pub struct RpcServer {
    state: Arc<DaemonState>,
    socket_path: PathBuf,
}

impl RpcServer {
    pub fn new(state: Arc<DaemonState>, socket_path: PathBuf) -> Self {
        Self { state, socket_path }
    }

    /// Run the server, accepting connections.
    pub async fn run(&self) -> anyhow::Result<()> {
        // Remove stale socket file
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(state, stream).await {
                            warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

async fn write_line<T: Serialize>(writer: &mut OwnedWriteHalf, message: &T) -> anyhow::Result<()> {
    let mut json = serde_json::to_string(message)?;
    json.push('\n');
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Handle a single client connection.
async fn handle_connection(
    state: Arc<DaemonState>,
    stream: tokio::net::UnixStream,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break; // EOF
        }

        let request = match serde_json::from_str::<RpcRequest>(&line) {
            Ok(request) => request,
            Err(_) => {
                let response = RpcResponse::error(serde_json::Value::Null, RpcError::parse_error());
                write_line(&mut writer, &response).await?;
                continue;
            }
        };

        // Subscribe before answering so no event slips between the two
        let subscription = if request.method == "subscribe_events" {
            Some(state.event_bus.subscribe())
        } else {
            None
        };
        let params = request.params.clone();
        let response = dispatch_request(state.clone(), request).await;
        let accepted = response.error.is_none();
        write_line(&mut writer, &response).await?;

        if let (Some(rx), true) = (subscription, accepted) {
            let filter = EventFilter::deserialize(params.get("filter").unwrap_or(&serde_json::Value::Null))
                .unwrap_or_default();
            return stream_events(rx, filter, writer).await;
        }
    }

    Ok(())
}

/// Forward matching events to a subscribed connection until it goes away.
async fn stream_events(
    mut rx: tokio::sync::broadcast::Receiver<pytition_types::events::Event>,
    filter: EventFilter,
    mut writer: OwnedWriteHalf,
) -> anyhow::Result<()> {
    loop {
        match rx.recv().await {
            Ok(event) => {
                if !filter.matches(&event) {
                    continue;
                }
                let notification = RpcNotification {
                    jsonrpc: "2.0",
                    method: "event",
                    params: &event,
                };
                if write_line(&mut writer, &notification).await.is_err() {
                    debug!("Subscriber disconnected");
                    return Ok(());
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Subscriber lagging, {skipped} events dropped");
            }
            Err(RecvError::Closed) => return Ok(()),
        }
    }
}

/// Dispatch a JSON-RPC request to the appropriate command handler.
pub async fn dispatch_request(state: Arc<DaemonState>, request: RpcRequest) -> RpcResponse {
    let id = request.id.clone();
    let method = request.method.as_str();

    if request.jsonrpc != "2.0" {
        return RpcResponse::error(id, RpcError::invalid_request());
    }

    debug!("Dispatching RPC method: {}", method);

    let params = &request.params;
    let result = match method {
        // Petitions
        "create_petition" => commands::petitions::create_petition(&state, params).await,
        "get_petition" => commands::petitions::get_petition(&state, params).await,
        "list_petitions" => commands::petitions::list_petitions(&state, params).await,
        "update_petition" => commands::petitions::update_petition(&state, params).await,
        "delete_petition" => commands::petitions::delete_petition(&state, params).await,
        "publish_petition" => commands::petitions::publish_petition(&state, params).await,
        "unpublish_petition" => commands::petitions::unpublish_petition(&state, params).await,
        "get_signature_count" => commands::petitions::get_signature_count(&state, params).await,

        // Signatures
        "sign_petition" => commands::signatures::sign_petition(&state, params).await,
        "confirm_signature" => commands::signatures::confirm_signature(&state, params).await,
        "list_signatures" => commands::signatures::list_signatures(&state, params).await,
        "delete_signature" => commands::signatures::delete_signature(&state, params).await,

        // Templates
        "create_template" => commands::templates::create_template(&state, params).await,
        "get_template" => commands::templates::get_template(&state, params).await,
        "find_template" => commands::templates::find_template(&state, params).await,
        "list_templates" => commands::templates::list_templates(&state, params).await,
        "delete_template" => commands::templates::delete_template(&state, params).await,

        // Organizations
        "create_organization" => {
            commands::organizations::create_organization(&state, params).await
        }
        "get_organization" => commands::organizations::get_organization(&state, params).await,
        "list_organizations" => commands::organizations::list_organizations(&state).await,
        "delete_organization" => {
            commands::organizations::delete_organization(&state, params).await
        }
        "add_member" => commands::organizations::add_member(&state, params).await,
        "remove_member" => commands::organizations::remove_member(&state, params).await,
        "invite_member" => commands::organizations::invite_member(&state, params).await,
        "accept_invitation" => commands::organizations::accept_invitation(&state, params).await,
        "get_permission" => commands::organizations::get_permission(&state, params).await,
        "update_permission" => commands::organizations::update_permission(&state, params).await,

        // Accounts
        "register_account" => commands::accounts::register_account(&state, params).await,
        "get_user" => commands::accounts::get_user(&state, params).await,
        "delete_user" => commands::accounts::delete_user(&state, params).await,

        // Diagnostics
        "get_daemon_status" => commands::diagnostics::get_daemon_status(&state).await,
        "subscribe_events" => commands::diagnostics::subscribe_events(&state, params).await,

        _ => Err(RpcError::method_not_found(method)),
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => RpcResponse::error(id, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DaemonConfig;
    use pytition_types::events::EventType;

    fn test_state() -> Arc<DaemonState> {
        let conn = pytition_db::open_memory().expect("open test db");
        Arc::new(DaemonState::new(conn, DaemonConfig::default()))
    }

    async fn call(
        state: &Arc<DaemonState>,
        method: &str,
        params: serde_json::Value,
    ) -> RpcResponse {
        let request = RpcRequest {
            jsonrpc: "2.0".to_string(),
            id: serde_json::json!(1),
            method: method.to_string(),
            params,
        };
        dispatch_request(state.clone(), request).await
    }

    async fn ok(state: &Arc<DaemonState>, method: &str, params: serde_json::Value) -> serde_json::Value {
        let response = call(state, method, params).await;
        assert!(
            response.error.is_none(),
            "{method} failed: {:?}",
            response.error
        );
        response.result.expect("result")
    }

    #[test]
    fn test_rpc_error_codes() {
        let err = RpcError::method_not_found("unknown");
        assert_eq!(err.code, -32601);

        let err: RpcError = DbError::NotFound("petition 1".into()).into();
        assert_eq!(err.message, "NOT_FOUND");

        let err: RpcError = DbError::Validation(ValidationError::AlreadySigned).into();
        assert_eq!(err.message, "ALREADY_SIGNED");

        let err: RpcError = DbError::Validation(ValidationError::OwnerMissing).into();
        assert_eq!(err.message, "VALIDATION_FAILED");

        let err: RpcError = DbError::Integrity("two rows".into()).into();
        assert_eq!(err.message, "INTEGRITY_VIOLATION");
    }

    #[test]
    fn test_rpc_response_shapes() {
        let resp = RpcResponse::success(serde_json::json!(1), serde_json::json!({"n": 1}));
        assert!(resp.result.is_some());
        assert!(resp.error.is_none());

        let resp = RpcResponse::error(serde_json::json!(1), RpcError::internal_error("test"));
        assert!(resp.result.is_none());
        assert!(resp.error.is_some());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let state = test_state();
        let response = call(&state, "drop_tables", serde_json::json!({})).await;
        assert_eq!(response.error.expect("error").code, -32601);
    }

    #[tokio::test]
    async fn test_bad_version_rejected() {
        let state = test_state();
        let request = RpcRequest {
            jsonrpc: "1.0".to_string(),
            id: serde_json::json!(1),
            method: "list_petitions".to_string(),
            params: serde_json::Value::Null,
        };
        let response = dispatch_request(state, request).await;
        assert_eq!(response.error.expect("error").code, -32600);
    }

    #[tokio::test]
    async fn test_signing_flow() {
        let state = test_state();
        let mut events = state.event_bus.subscribe();

        let created = ok(&state, "create_petition", serde_json::json!({"title": "Bees"})).await;
        let pid = created["id"].as_i64().expect("id");
        assert_eq!(created["target"], 500);

        ok(&state, "publish_petition", serde_json::json!({"petition_id": pid})).await;

        let signed = ok(
            &state,
            "sign_petition",
            serde_json::json!({
                "petition_id": pid,
                "signature": {"first_name": "Ada", "last_name": "L", "email": "a@x.com"}
            }),
        )
        .await;
        let token = signed["confirmation_hash"].as_str().expect("token").to_string();

        let count = ok(&state, "get_signature_count", serde_json::json!({"petition_id": pid})).await;
        assert_eq!(count["count"], 0);

        let confirmed = ok(
            &state,
            "confirm_signature",
            serde_json::json!({"petition_id": pid, "token": token}),
        )
        .await;
        assert_eq!(confirmed["confirmed"], true);
        assert_eq!(confirmed["message"], pytition_types::CONFIRMATION_MESSAGE);

        let count = ok(&state, "get_signature_count", serde_json::json!({"petition_id": pid})).await;
        assert_eq!(count["count"], 1);

        let again = call(
            &state,
            "sign_petition",
            serde_json::json!({
                "petition_id": pid,
                "signature": {"first_name": "X", "last_name": "Y", "email": "a@x.com"}
            }),
        )
        .await;
        assert_eq!(again.error.expect("error").message, "ALREADY_SIGNED");

        let unknown = ok(
            &state,
            "confirm_signature",
            serde_json::json!({"petition_id": pid, "token": "nope"}),
        )
        .await;
        assert_eq!(unknown["confirmed"], false);

        let kinds: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
            .map(|e| e.event_type)
            .collect();
        assert_eq!(
            kinds,
            vec![
                EventType::PetitionPublished,
                EventType::SignatureRecorded,
                EventType::ConfirmationRequested,
                EventType::SignatureConfirmed,
            ]
        );
    }

    #[tokio::test]
    async fn test_get_missing_petition_is_null() {
        let state = test_state();
        let result = ok(&state, "get_petition", serde_json::json!({"petition_id": 41})).await;
        assert!(result.is_null());

        let response = call(&state, "publish_petition", serde_json::json!({"petition_id": 41})).await;
        assert_eq!(response.error.expect("error").message, "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_membership_flow() {
        let state = test_state();
        let user = ok(&state, "register_account", serde_json::json!({"username": "ada"})).await;
        let uid = user["user"]["id"].as_i64().expect("user id");
        let org = ok(&state, "create_organization", serde_json::json!({"name": "RSF"})).await;
        let oid = org["id"].as_i64().expect("org id");

        ok(
            &state,
            "invite_member",
            serde_json::json!({"organization_id": oid, "user_id": uid}),
        )
        .await;
        let permission = ok(
            &state,
            "accept_invitation",
            serde_json::json!({"organization_id": oid, "user_id": uid}),
        )
        .await;
        assert_eq!(permission["can_add_members"], false);

        let mut updated = permission.clone();
        updated["can_view_signatures"] = serde_json::json!(true);
        ok(&state, "update_permission", serde_json::json!({"permission": updated})).await;

        let fetched = ok(
            &state,
            "get_permission",
            serde_json::json!({"organization_id": oid, "user_id": uid}),
        )
        .await;
        assert_eq!(fetched["permission"]["can_view_signatures"], true);
        assert_eq!(fetched["label"], "RSF : ada");

        let removed = ok(
            &state,
            "remove_member",
            serde_json::json!({"organization_id": oid, "user_id": uid}),
        )
        .await;
        assert_eq!(removed["removed"], true);
    }

    #[tokio::test]
    async fn test_invalid_params() {
        let state = test_state();
        let response = call(&state, "sign_petition", serde_json::json!({"petition_id": 1})).await;
        assert_eq!(response.error.expect("error").code, -32602);
    }
}

//! JSON-RPC 2.0 Server
//!
//! Exposes the netcalc engine over JSON-RPC 2.0. Every request yields
//! exactly one response line, including requests that fail to parse.
//!
//! # Methods
//!
//! - `validate`, `classify`, `check_private`, `check_cdn`: `{"address": ...}`
//! - `subnet_info`: `{"address": ..., "cloud_mode"?: ...}`
//! - `ping`
//!
//! # Examples
//!
//! ```
//! use netcalc_engine::Engine;
//! use netcalc_rpc::RpcServer;
//!
//! let server = RpcServer::new(Engine::default());
//!
//! let request = r#"{
//!     "jsonrpc": "2.0",
//!     "method": "classify",
//!     "params": {"address": "10.0.0.5"},
//!     "id": 1
//! }"#;
//!
//! let response = server.handle_request(request).unwrap();
//! assert!(response.contains("Private-RFC1918"));
//! ```

use netcalc_core::NetcalcError;
use netcalc_engine::{Engine, Operation, Request};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod transport;

pub use transport::StdioTransport;

/// RPC server errors
#[derive(Error, Debug)]
pub enum RpcError {
    /// Body is not JSON
    #[error("Parse error: {0}")]
    ParseError(String),

    /// JSON that is not a JSON-RPC 2.0 request object
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Method not found
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Params missing or of the wrong shape
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Engine rejected the input
    #[error(transparent)]
    Engine(#[from] NetcalcError),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Transport I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RpcError>;

/// JSON-RPC 2.0 request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub id: serde_json::Value,
}

/// JSON-RPC 2.0 response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: serde_json::Value,
}

impl JsonRpcResponse {
    fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    fn failure(id: serde_json::Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

/// JSON-RPC 2.0 error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    fn new(code: i32, message: String) -> Self {
        Self {
            code,
            message,
            data: None,
        }
    }
}

impl From<RpcError> for JsonRpcError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::ParseError(msg) => Self::new(Self::PARSE_ERROR, msg),
            RpcError::InvalidRequest(msg) => Self::new(Self::INVALID_REQUEST, msg),
            RpcError::MethodNotFound(msg) => {
                Self::new(Self::METHOD_NOT_FOUND, format!("Method not found: {}", msg))
            }
            RpcError::InvalidParams(msg) => Self::new(Self::INVALID_PARAMS, msg),
            RpcError::Engine(e) => Self {
                code: Self::INVALID_PARAMS,
                message: e.to_string(),
                data: Some(serde_json::json!({
                    "kind": e.kind(),
                    "detail": e.to_string(),
                })),
            },
            RpcError::InternalError(msg) => Self::new(Self::INTERNAL_ERROR, msg),
            RpcError::Io(e) => Self::new(Self::INTERNAL_ERROR, e.to_string()),
        }
    }
}

/// Params shared by every address method
#[derive(Debug, Deserialize)]
struct AddressParams {
    address: String,
    #[serde(default, alias = "mode")]
    cloud_mode: Option<String>,
}

/// JSON-RPC server over a shared engine
pub struct RpcServer {
    engine: Engine,
}

impl RpcServer {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Handle one JSON-RPC 2.0 request
    ///
    /// Protocol and engine failures become error responses; only a failure
    /// to serialize the response itself is returned as `Err`.
    pub fn handle_request(&self, request_str: &str) -> Result<String> {
        let response = match self.parse_request(request_str) {
            Ok(request) => {
                tracing::debug!(method = %request.method, "rpc request");
                let id = request.id.clone();
                match self.dispatch(&request) {
                    Ok(result) => JsonRpcResponse::success(id, result),
                    Err(e) => {
                        tracing::debug!(method = %request.method, error = %e, "rpc request failed");
                        JsonRpcResponse::failure(id, e.into())
                    }
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "rejected rpc request");
                JsonRpcResponse::failure(serde_json::Value::Null, e.into())
            }
        };

        serde_json::to_string(&response).map_err(|e| RpcError::InternalError(e.to_string()))
    }

    fn parse_request(&self, request_str: &str) -> Result<JsonRpcRequest> {
        let value: serde_json::Value =
            serde_json::from_str(request_str).map_err(|e| RpcError::ParseError(e.to_string()))?;
        let request: JsonRpcRequest =
            serde_json::from_value(value).map_err(|e| RpcError::InvalidRequest(e.to_string()))?;

        if request.jsonrpc != "2.0" {
            return Err(RpcError::InvalidRequest(
                "Invalid JSON-RPC version".to_string(),
            ));
        }
        Ok(request)
    }

    fn dispatch(&self, request: &JsonRpcRequest) -> Result<serde_json::Value> {
        let operation = match request.method.as_str() {
            "validate" => Operation::Validate,
            "classify" => Operation::Classify,
            "subnet_info" => Operation::SubnetInfo,
            "check_private" => Operation::CheckPrivate,
            "check_cdn" => Operation::CheckCdn,
            "ping" => return Ok(serde_json::json!({"status": "ok"})),
            _ => return Err(RpcError::MethodNotFound(request.method.clone())),
        };

        let params: AddressParams = serde_json::from_value(request.params.clone())
            .map_err(|e| RpcError::InvalidParams(format!("Invalid params: {}", e)))?;

        let response = self.engine.handle(&Request {
            operation,
            address: params.address,
            cloud_mode: params.cloud_mode,
        })?;

        serde_json::to_value(&response).map_err(|e| RpcError::InternalError(e.to_string()))
    }
}

impl Default for RpcServer {
    fn default() -> Self {
        Self::new(Engine::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn call(server: &RpcServer, request: Value) -> Value {
        let response = server.handle_request(&request.to_string()).unwrap();
        serde_json::from_str(&response).unwrap()
    }

    #[test]
    fn test_parse_request() {
        let request = r#"{
            "jsonrpc": "2.0",
            "method": "ping",
            "params": {},
            "id": 1
        }"#;

        let parsed: JsonRpcRequest = serde_json::from_str(request).unwrap();
        assert_eq!(parsed.jsonrpc, "2.0");
        assert_eq!(parsed.method, "ping");
    }

    #[test]
    fn test_ping_method() {
        let server = RpcServer::default();
        let response = server
            .handle_request(r#"{"jsonrpc": "2.0", "method": "ping", "id": 1}"#)
            .unwrap();
        assert!(response.contains("\"status\":\"ok\""));
    }

    #[test]
    fn test_method_not_found() {
        let server = RpcServer::default();
        let resp = call(
            &server,
            json!({"jsonrpc": "2.0", "method": "lookup_ip", "params": {}, "id": 1}),
        );
        assert_eq!(resp["error"]["code"], JsonRpcError::METHOD_NOT_FOUND);
        assert_eq!(resp["id"], 1);
    }

    #[test]
    fn test_invalid_jsonrpc_version() {
        let server = RpcServer::default();
        let resp = call(
            &server,
            json!({"jsonrpc": "1.0", "method": "ping", "params": {}, "id": 1}),
        );
        assert_eq!(resp["error"]["code"], JsonRpcError::INVALID_REQUEST);
    }

    #[test]
    fn test_parse_error_still_answers() {
        let server = RpcServer::default();
        let response = server.handle_request("{not json").unwrap();
        let resp: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(resp["error"]["code"], JsonRpcError::PARSE_ERROR);
        assert_eq!(resp["id"], Value::Null);
    }

    #[test]
    fn test_non_object_is_invalid_request() {
        let server = RpcServer::default();
        let response = server.handle_request("[1, 2, 3]").unwrap();
        let resp: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(resp["error"]["code"], JsonRpcError::INVALID_REQUEST);
    }

    #[test]
    fn test_missing_params() {
        let server = RpcServer::default();
        let resp = call(
            &server,
            json!({"jsonrpc": "2.0", "method": "classify", "id": "a"}),
        );
        assert_eq!(resp["error"]["code"], JsonRpcError::INVALID_PARAMS);
        assert!(resp["error"].get("data").is_none());
        assert_eq!(resp["id"], "a");
    }

    #[test]
    fn test_engine_error_carries_kind() {
        let server = RpcServer::default();
        let resp = call(
            &server,
            json!({
                "jsonrpc": "2.0",
                "method": "subnet_info",
                "params": {"address": "10.0.0.0/30", "cloud_mode": "AWS"},
                "id": 7
            }),
        );
        assert_eq!(resp["error"]["code"], JsonRpcError::INVALID_PARAMS);
        assert_eq!(resp["error"]["data"]["kind"], "InsufficientAddressSpace");
        assert!(resp.get("result").is_none());
    }

    #[test]
    fn test_subnet_info_method() {
        let server = RpcServer::default();
        let resp = call(
            &server,
            json!({
                "jsonrpc": "2.0",
                "method": "subnet_info",
                "params": {"address": "10.0.0.0/24", "mode": "oci"},
                "id": 2
            }),
        );
        assert_eq!(resp["result"]["first_usable"], "10.0.0.2");
        assert_eq!(resp["result"]["usable_addresses"], 253);
        assert_eq!(resp["result"]["mode"], "OCI");
    }

    #[test]
    fn test_validate_invalid_is_a_result() {
        let server = RpcServer::default();
        let resp = call(
            &server,
            json!({
                "jsonrpc": "2.0",
                "method": "validate",
                "params": {"address": "10.0.0.01"},
                "id": 3
            }),
        );
        assert!(resp.get("error").is_none());
        assert_eq!(resp["result"]["valid"], false);
        assert_eq!(resp["result"]["reason"], "InvalidFormat");
    }

    #[test]
    fn test_check_methods() {
        let server = RpcServer::default();
        let resp = call(
            &server,
            json!({
                "jsonrpc": "2.0",
                "method": "check_private",
                "params": {"address": "100.100.0.1"},
                "id": 4
            }),
        );
        assert_eq!(resp["result"]["is_rfc6598"], true);

        let resp = call(
            &server,
            json!({
                "jsonrpc": "2.0",
                "method": "check_cdn",
                "params": {"address": "162.158.1.1"},
                "id": 5
            }),
        );
        assert_eq!(resp["result"]["is_cdn"], true);
        assert_eq!(resp["result"]["matched_ranges"][0]["range"], "162.158.0.0/15");
    }

    #[test]
    fn test_check_private_ipv6_is_invalid_params() {
        let server = RpcServer::default();
        let resp = call(
            &server,
            json!({
                "jsonrpc": "2.0",
                "method": "check_private",
                "params": {"address": "fd00::1"},
                "id": 6
            }),
        );
        assert!(resp.get("result").is_none());
        assert_eq!(resp["error"]["code"], -32602);
        assert_eq!(resp["error"]["data"]["kind"], "UnsupportedFamily");
        assert_eq!(resp["id"], 6);
    }
}

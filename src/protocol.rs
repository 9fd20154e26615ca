//! Wire protocol definitions for client-server communication.
//!
//! The protocol uses UTF-8 JSON text frames over a websocket. Every request
//! carries an `action` string and a `payload` object; every reply carries a
//! single `payload` object.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The `status` value a successful reply carries.
pub const STATUS_SUCCESS: &str = "success";

/// Request sent from client to server.
///
/// Serializes to the `{"action": <verb>, "payload": {...}}` envelope, with
/// one variant per wire action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "snake_case")]
pub enum Request {
    /// Load a network description file on the server.
    LoadNetwork { file: String },
    /// Pin a discrete node to one of its states.
    SetEvidence { node: String, state: i64 },
    /// Remove any evidence set on a node.
    ClearEvidence { node: String },
    /// Feed a continuous observation into a node.
    Observe { node: String, value: f64 },
    /// Query the current belief of a node.
    GetBelief { node: String },
}

/// Response sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub payload: ResponsePayload,
}

/// The payload of a reply.
///
/// Belief values arrive under a dynamic key equal to the queried node's
/// name, so everything beyond `status` and `error` is kept as a generic
/// string-keyed mapping and looked up by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsePayload {
    /// Outcome marker; anything other than `"success"` is a reported error.
    pub status: String,
    /// Human-readable message accompanying a non-success status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Remaining payload fields, keyed by node name.
    #[serde(flatten)]
    pub values: BTreeMap<String, serde_json::Value>,
}

impl Request {
    /// Encode this request as a JSON text frame.
    pub fn to_frame(&self) -> Result<String> {
        serde_json::to_string(self).context("failed to encode request")
    }
}

impl Response {
    /// Decode a reply from a JSON text frame.
    ///
    /// An undecodable frame is a transport-level failure, not a reported
    /// error: the caller is expected to treat it as fatal.
    pub fn from_frame(frame: &str) -> Result<Self> {
        serde_json::from_str(frame)
            .with_context(|| format!("failed to decode reply: {frame:?}"))
    }
}

impl ResponsePayload {
    /// Whether the server reported success.
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// Look up the belief value returned for `node`.
    pub fn belief(&self, node: &str) -> Option<&serde_json::Value> {
        self.values.get(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_envelope() {
        let request = Request::LoadNetwork {
            file: "net.xml".to_string(),
        };
        let frame = request.to_frame().unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(
            value,
            json!({"action": "load_network", "payload": {"file": "net.xml"}})
        );
    }

    #[test]
    fn test_set_evidence_state_is_integer() {
        let request = Request::SetEvidence {
            node: "rain".to_string(),
            state: 3,
        };
        let value: serde_json::Value =
            serde_json::from_str(&request.to_frame().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"action": "set_evidence", "payload": {"node": "rain", "state": 3}})
        );
    }

    #[test]
    fn test_response_success_with_belief() {
        let response =
            Response::from_frame(r#"{"payload":{"status":"success","X":0.42}}"#).unwrap();
        assert!(response.payload.is_success());
        assert_eq!(response.payload.belief("X"), Some(&json!(0.42)));
        assert!(response.payload.belief("Y").is_none());
    }

    #[test]
    fn test_response_error() {
        let response = Response::from_frame(
            r#"{"payload":{"status":"error","error":"no such node"}}"#,
        )
        .unwrap();
        assert!(!response.payload.is_success());
        assert_eq!(response.payload.error.as_deref(), Some("no such node"));
    }

    #[test]
    fn test_undecodable_reply_is_an_error() {
        assert!(Response::from_frame("not json").is_err());
    }
}

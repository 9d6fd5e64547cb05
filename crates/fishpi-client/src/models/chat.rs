//! Chat room HTTP models: node discovery, message send, reward claim.

use serde::{Deserialize, Serialize};

/// `/chat-room/node/get` response.
///
/// Unlike the standard envelope, the payload fields sit at the top level.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct NodeResponse {
    pub code: i32,
    pub msg: Option<String>,
    /// Auto-assigned websocket address.
    pub data: Option<String>,
    /// Spelled this way on the wire.
    pub avaliable: Vec<ChatNode>,
    pub api_key: Option<String>,
}

/// One chat room node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatNode {
    /// Node websocket address, without key.
    pub node: String,
    /// Display name.
    pub name: String,
    /// Users currently connected.
    pub online: i64,
    /// Scheduling weight.
    pub weight: i64,
}

/// Result of endpoint discovery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeInfo {
    /// Ready-to-use websocket URL assigned by the server.
    pub url: String,
    /// All nodes the server advertises.
    pub nodes: Vec<ChatNode>,
    /// Generated key for joining a hand-picked node.
    pub api_key: Option<String>,
}

impl NodeInfo {
    /// Websocket URL for a hand-picked node, if a generated key was issued.
    pub fn url_for(&self, node: &ChatNode) -> Option<String> {
        self.api_key
            .as_deref()
            .map(|key| format!("{}?apiKey={key}", node.node))
    }

    /// The node with the fewest users online.
    pub fn least_busy(&self) -> Option<&ChatNode> {
        self.nodes.iter().min_by_key(|n| n.online)
    }
}

/// `/chat-room/send` request body.
#[derive(Clone, Debug, Serialize)]
pub struct SendMessageRequest {
    /// Markdown content.
    pub content: String,
    /// Client label.
    pub client: String,
}

/// `/chat-room/red-packet/open` payload.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RedPacketClaim {
    /// Reward message id.
    pub o_id: String,
    /// Sender login name.
    pub user_name: String,
    /// Blessing text.
    pub msg: String,
    /// Restricted receivers (spelled this way on the wire).
    pub recivers: serde_json::Value,
    /// Total shares.
    pub count: i64,
    /// Shares already taken.
    pub got: i64,
    /// Points won by this claim.
    pub money: i64,
    /// Reward kind label.
    #[serde(rename = "type")]
    pub kind: String,
    /// Claimers so far; shape differs by kind.
    pub who: serde_json::Value,
    /// Creation time, epoch millis.
    pub time: i64,
    /// Gesture played by the sender in rock-paper-scissors rewards.
    pub gesture_type: Option<i32>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

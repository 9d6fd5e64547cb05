//! Chat room HTTP calls: endpoint discovery, message send, reward claim.

use std::sync::Arc;

use reqwest::Method;
use serde_json::{Value, json};
use tracing::{debug, info, instrument};

use crate::dispatcher::{AuthMode, Envelope, RequestDispatcher};
use crate::errors::{ClientError, Result};
use crate::models::chat::NodeResponse;
use crate::models::{NodeInfo, RedPacketClaim, SendMessageRequest};

/// Chat room endpoints.
#[derive(Clone)]
pub struct ChatApi {
    dispatcher: Arc<RequestDispatcher>,
    client_name: String,
}

impl ChatApi {
    /// Wrap a dispatcher; `client_name` labels outbound messages.
    pub fn new(dispatcher: Arc<RequestDispatcher>, client_name: impl Into<String>) -> Self {
        Self {
            dispatcher,
            client_name: client_name.into(),
        }
    }

    /// The shared dispatcher.
    pub fn dispatcher(&self) -> &Arc<RequestDispatcher> {
        &self.dispatcher
    }

    /// Ask the server which websocket node to join.
    #[instrument(skip(self))]
    pub async fn discover_node(&self) -> Result<NodeInfo> {
        let response: NodeResponse = self
            .dispatcher
            .issue(Method::GET, "/chat-room/node/get", None, AuthMode::QueryKey)
            .await?;

        if response.code != 0 {
            return Err(ClientError::RequestFailed {
                status: response.code,
                body: response.msg.unwrap_or_default(),
            });
        }

        let url = response
            .data
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ClientError::DecodeFailed {
                raw: String::new(),
                reason: "node response carried no websocket address".to_string(),
            })?;

        info!(nodes = response.avaliable.len(), "chat node assigned");
        Ok(NodeInfo {
            url,
            nodes: response.avaliable,
            api_key: response.api_key,
        })
    }

    /// Post a markdown message to the chat room.
    #[instrument(skip(self, content), fields(len = content.len()))]
    pub async fn send_message(&self, content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(ClientError::InvalidRequest("message is empty".to_string()));
        }
        let request = SendMessageRequest {
            content: content.to_string(),
            client: self.client_name.clone(),
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;

        let _ = self
            .dispatcher
            .issue::<Envelope<Value>>(Method::POST, "/chat-room/send", Some(body), AuthMode::QueryKey)
            .await?
            .ensure_success()?;
        debug!("message sent");
        Ok(())
    }

    /// Claim a share of a reward. `gesture` is required for rock-paper-scissors
    /// rewards and omitted otherwise.
    #[instrument(skip(self))]
    pub async fn open_red_packet(&self, id: &str, gesture: Option<u8>) -> Result<RedPacketClaim> {
        let mut body = json!({ "oId": id });
        if let Some(g) = gesture {
            body["gesture"] = json!(g);
        }

        let envelope = self
            .dispatcher
            .issue::<Envelope<RedPacketClaim>>(
                Method::POST,
                "/chat-room/red-packet/open",
                Some(body),
                AuthMode::BodyKey,
            )
            .await?
            .ensure_success()?;

        let claim = envelope.data.unwrap_or_default();
        info!(amount = claim.money, "reward claimed");
        Ok(claim)
    }
}

//! Wire shapes of inbound chat frames.

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;

use fishpi_client::models::json_util::null_as_default;

/// Timestamp format used by chat frames (`2025-10-29 10:49:55`).
pub const CHAT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One chat envelope as sent on the websocket.
///
/// Every field is optional on the wire; missing or `null` ones decode as empty.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatFrame {
    /// Message id.
    #[serde(deserialize_with = "null_as_default")]
    pub o_id: String,
    /// Frame type, e.g. `msg`, `online`, `revoke`.
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    /// Author login name.
    #[serde(deserialize_with = "null_as_default")]
    pub user_name: String,
    /// Author nickname.
    #[serde(deserialize_with = "null_as_default")]
    pub user_nickname: String,
    /// Author avatar.
    #[serde(rename = "userAvatarURL", deserialize_with = "null_as_default")]
    pub user_avatar_url: String,
    /// HTML content, or a JSON object for rewards.
    #[serde(deserialize_with = "null_as_default")]
    pub content: String,
    /// Markdown source, absent for rewards.
    #[serde(deserialize_with = "null_as_default")]
    pub md: String,
    /// Human-readable timestamp.
    #[serde(deserialize_with = "null_as_default")]
    pub time: String,
    /// Author's medals as embedded JSON.
    #[serde(deserialize_with = "null_as_default")]
    pub sys_metal: String,
    /// Sending client label.
    #[serde(deserialize_with = "null_as_default")]
    pub client: String,
}

impl ChatFrame {
    /// Whether the content carries an embedded JSON object.
    pub fn has_structured_content(&self) -> bool {
        self.content.trim_start().starts_with('{')
    }
}

/// Reward payload embedded in [`ChatFrame::content`].
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RedPacketPayload {
    /// Always `redPacket`.
    #[serde(deserialize_with = "null_as_default")]
    pub msg_type: String,
    /// Blessing text.
    #[serde(deserialize_with = "null_as_default")]
    pub msg: String,
    /// Sender id.
    #[serde(deserialize_with = "null_as_default")]
    pub sender_id: String,
    /// Restricted receivers: a JSON array, or a string holding one.
    pub recivers: Value,
    /// Total points.
    #[serde(deserialize_with = "null_as_default")]
    pub money: i64,
    /// Total shares.
    #[serde(deserialize_with = "null_as_default")]
    pub count: i64,
    /// Reward kind.
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    /// Shares already taken.
    #[serde(deserialize_with = "null_as_default")]
    pub got: i64,
    /// Claimers so far.
    #[serde(deserialize_with = "null_as_default")]
    pub who: Vec<Claimer>,
}

impl RedPacketPayload {
    /// Decode the receiver list, which the remote sends as stringified JSON.
    pub fn receivers(&self) -> Result<Vec<String>, serde_json::Error> {
        match &self.recivers {
            Value::Null => Ok(Vec::new()),
            Value::String(s) if s.trim().is_empty() => Ok(Vec::new()),
            Value::String(s) => serde_json::from_str(s),
            other => serde_json::from_value(other.clone()),
        }
    }
}

/// One entry of a reward's claimer list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Claimer {
    /// Claimer login name.
    #[serde(deserialize_with = "null_as_default")]
    pub user_name: String,
    /// Claimer avatar.
    #[serde(deserialize_with = "null_as_default")]
    pub avatar: String,
    /// Points won.
    #[serde(deserialize_with = "null_as_default")]
    pub user_money: i64,
    /// Claim time.
    #[serde(deserialize_with = "null_as_default")]
    pub time: String,
}

/// A chat timestamp: the raw string plus its parsed form when valid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChatTime {
    raw: String,
    parsed: Option<NaiveDateTime>,
}

impl ChatTime {
    /// Parse a frame's `time` field.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        Self {
            raw: raw.to_string(),
            parsed: NaiveDateTime::parse_from_str(raw, CHAT_TIME_FORMAT).ok(),
        }
    }

    /// The string as received.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Parsed timestamp, if the string matched the expected format.
    pub fn parsed(&self) -> Option<NaiveDateTime> {
        self.parsed
    }

    /// `HH:MM:SS`, falling back to the raw string.
    pub fn short(&self) -> String {
        match self.parsed {
            Some(ts) => ts.format("%H:%M:%S").to_string(),
            None => self.raw.clone(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn frame_decodes_wire_names() {
        let frame: ChatFrame = serde_json::from_value(json!({
            "oId": "1761706195000",
            "type": "msg",
            "userOId": 1_630_000_000_000_i64,
            "userName": "bob",
            "userNickname": "Bobby",
            "userAvatarURL": "https://example.com/a.png",
            "content": "<p>hello</p>",
            "md": "hello",
            "time": "2025-10-29 10:49:55",
            "client": "Web/fishpi"
        }))
        .unwrap();
        assert_eq!(frame.o_id, "1761706195000");
        assert_eq!(frame.kind, "msg");
        assert_eq!(frame.user_avatar_url, "https://example.com/a.png");
        assert!(!frame.has_structured_content());
    }

    #[test]
    fn structured_content_ignores_leading_whitespace() {
        let frame = ChatFrame {
            content: "  \n{\"msgType\":\"redPacket\"}".to_string(),
            ..ChatFrame::default()
        };
        assert!(frame.has_structured_content());
    }

    #[test]
    fn receivers_from_stringified_array() {
        let payload = RedPacketPayload {
            recivers: json!("[\"alice\",\"bob\"]"),
            ..RedPacketPayload::default()
        };
        assert_eq!(payload.receivers().unwrap(), vec!["alice", "bob"]);
    }

    #[test]
    fn receivers_from_real_array_and_empty() {
        let payload = RedPacketPayload {
            recivers: json!(["carol"]),
            ..RedPacketPayload::default()
        };
        assert_eq!(payload.receivers().unwrap(), vec!["carol"]);
        assert!(RedPacketPayload::default().receivers().unwrap().is_empty());
    }

    #[test]
    fn receivers_bad_string_is_error() {
        let payload = RedPacketPayload {
            recivers: json!("alice,bob"),
            ..RedPacketPayload::default()
        };
        assert!(payload.receivers().is_err());
    }

    #[test]
    fn chat_time_short_form() {
        let t = ChatTime::parse("2025-10-29 10:49:55");
        assert!(t.parsed().is_some());
        assert_eq!(t.short(), "10:49:55");
    }

    #[test]
    fn chat_time_unparsable_keeps_raw() {
        let t = ChatTime::parse("yesterday");
        assert!(t.parsed().is_none());
        assert_eq!(t.short(), "yesterday");
        assert_eq!(t.raw(), "yesterday");
    }
}

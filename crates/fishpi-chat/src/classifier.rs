//! Turns raw websocket frames into [`InboundEvent`]s.
//!
//! Classification is pure and total: every input string maps to exactly one
//! variant, and decode failures become variants instead of errors so the
//! pump never stops on a bad frame.

use fishpi_core::constants::SYSTEM_AUTHOR;

use crate::frame::{ChatFrame, ChatTime, RedPacketPayload};
use crate::types::{InboundEvent, PlainMessage, RewardEvent, RewardKind};

/// Classify one text frame.
pub fn classify(frame: &str) -> InboundEvent {
    match serde_json::from_str::<ChatFrame>(frame) {
        Ok(envelope) => classify_message(&envelope),
        Err(e) => InboundEvent::Undecodable {
            raw: frame.to_string(),
            error: e.to_string(),
        },
    }
}

/// Classify an already decoded chat envelope.
pub fn classify_message(frame: &ChatFrame) -> InboundEvent {
    if frame.has_structured_content() {
        return match decode_reward(frame) {
            Ok(reward) => InboundEvent::Reward(reward),
            Err(error) => InboundEvent::MalformedReward {
                id: frame.o_id.clone(),
                author: author_label(frame).to_string(),
                error,
            },
        };
    }

    let display_text = if frame.md.trim().is_empty() {
        frame.content.trim()
    } else {
        frame.md.trim()
    };
    let author = author_name(frame);

    if display_text.is_empty() && author.is_empty() {
        return InboundEvent::Ignorable;
    }

    InboundEvent::Plain(PlainMessage {
        id: frame.o_id.clone(),
        author: if author.is_empty() { SYSTEM_AUTHOR } else { author }.to_string(),
        display_text: display_text.to_string(),
        timestamp: ChatTime::parse(&frame.time),
    })
}

/// Decode the reward payload embedded in a frame's content.
pub fn decode_reward(frame: &ChatFrame) -> Result<RewardEvent, String> {
    let payload: RedPacketPayload =
        serde_json::from_str(frame.content.trim()).map_err(|e| e.to_string())?;
    let receivers = payload
        .receivers()
        .map_err(|e| format!("invalid receiver list: {e}"))?;

    Ok(RewardEvent {
        id: frame.o_id.clone(),
        author: author_label(frame).to_string(),
        kind: RewardKind::from_wire(&payload.kind),
        blessing: payload.msg,
        total_amount: payload.money,
        claimed_count: payload.got,
        total_count: payload.count,
        sender_id: payload.sender_id,
        receivers,
        claimers: payload.who,
        timestamp: ChatTime::parse(&frame.time),
    })
}

/// Nickname, then login name; empty when both are blank.
fn author_name(frame: &ChatFrame) -> &str {
    let nickname = frame.user_nickname.trim();
    if nickname.is_empty() {
        frame.user_name.trim()
    } else {
        nickname
    }
}

fn author_label(frame: &ChatFrame) -> &str {
    let name = author_name(frame);
    if name.is_empty() { SYSTEM_AUTHOR } else { name }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

//! User profile and account status models.

use serde::{Deserialize, Serialize};

use super::json_util::null_as_default;

/// A user profile, as returned by `/api/user` and `/user/{name}`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    /// Object id.
    #[serde(deserialize_with = "null_as_default")]
    pub o_id: String,
    /// Registration number.
    #[serde(deserialize_with = "null_as_default")]
    pub user_no: i64,
    /// Login name.
    #[serde(deserialize_with = "null_as_default")]
    pub user_name: String,
    /// Display nickname, may be empty.
    #[serde(deserialize_with = "null_as_default")]
    pub user_nickname: String,
    /// Role label.
    #[serde(deserialize_with = "null_as_default")]
    pub user_role: String,
    /// Avatar URL.
    #[serde(rename = "userAvatarURL", deserialize_with = "null_as_default")]
    pub user_avatar_url: String,
    /// City shown on the profile.
    #[serde(deserialize_with = "null_as_default")]
    pub user_city: String,
    /// Whether the user is online.
    #[serde(deserialize_with = "null_as_default")]
    pub user_online_flag: bool,
    /// Total minutes online.
    #[serde(deserialize_with = "null_as_default")]
    pub online_minute: i64,
    /// Point balance.
    #[serde(deserialize_with = "null_as_default")]
    pub user_point: i64,
    /// App role; sent as a number or a string.
    pub user_app_role: serde_json::Value,
    /// Self introduction.
    #[serde(deserialize_with = "null_as_default")]
    pub user_intro: String,
    /// Personal homepage.
    #[serde(rename = "userURL", deserialize_with = "null_as_default")]
    pub user_url: String,
    /// Profile card background.
    #[serde(deserialize_with = "null_as_default")]
    pub card_bg: String,
    /// Number of users followed.
    #[serde(deserialize_with = "null_as_default")]
    pub following_user_count: i64,
    /// Medal list as an embedded JSON string (`{"list": [...]}`).
    #[serde(deserialize_with = "null_as_default")]
    pub sys_metal: String,
    /// Province shown on the profile.
    #[serde(deserialize_with = "null_as_default")]
    pub user_province: String,
    /// Current consecutive check-in days.
    #[serde(deserialize_with = "null_as_default")]
    pub user_current_checkin_streak: i64,
}

impl Profile {
    /// Nickname if set, else the login name.
    pub fn display_name(&self) -> &str {
        if self.user_nickname.trim().is_empty() {
            &self.user_name
        } else {
            &self.user_nickname
        }
    }

    /// Decode the medals embedded in `sys_metal`.
    pub fn medals(&self) -> Result<Vec<Medal>, serde_json::Error> {
        if self.sys_metal.trim().is_empty() {
            return Ok(Vec::new());
        }
        let list: MedalList = serde_json::from_str(&self.sys_metal)?;
        Ok(list.list)
    }
}

#[derive(Deserialize)]
struct MedalList {
    #[serde(default)]
    list: Vec<Medal>,
}

/// One profile medal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Medal {
    /// Medal title.
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// Medal description.
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    /// `&`-separated `key=value` display attributes (`url`, `backcolor`, `fontcolor`).
    #[serde(deserialize_with = "null_as_default")]
    pub attr: String,
    /// Free-form extra data.
    #[serde(deserialize_with = "null_as_default")]
    pub data: String,
}

impl Medal {
    /// Look up one display attribute, e.g. `backcolor`.
    pub fn attr_value(&self, key: &str) -> Option<&str> {
        self.attr
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }
}

/// `/user/liveness` response.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Liveness {
    /// Today's liveness percentage.
    pub liveness: f64,
}

/// `/user/checkedIn` response.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckIn {
    /// Whether today's check-in is done.
    pub checked_in: bool,
}

/// `/activity/yesterday-liveness-reward-api` response.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LivenessReward {
    /// Points awarded; `-1` when already claimed.
    pub sum: i64,
}

/// `/api/activity/is-collected-liveness` response.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LivenessCollectedStatus {
    /// Whether yesterday's liveness reward was collected.
    pub is_collected_yesterday_liveness_reward: bool,
}

/// Outcome of claiming yesterday's liveness reward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum YesterdayReward {
    /// Points awarded by this call.
    Claimed(i64),
    /// The reward was collected earlier.
    AlreadyClaimed,
}

impl From<LivenessReward> for YesterdayReward {
    fn from(reward: LivenessReward) -> Self {
        if reward.sum == -1 {
            Self::AlreadyClaimed
        } else {
            Self::Claimed(reward.sum)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

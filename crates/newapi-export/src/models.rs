//! Row types read from a New API database.
//!
//! Field names follow the New API JSON tags so that a serialized
//! [`Channel`] can be kept verbatim as a forensic snapshot.

use serde::{Deserialize, Serialize};

/// A row of the `channels` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Channel ID.
    pub id: i64,
    /// Channel kind code (see [`crate::mapping::provider_type`]).
    #[serde(rename = "type")]
    pub kind: i64,
    /// Upstream secret(s), newline separated for multi-key channels.
    pub key: String,
    /// OpenAI organization ID.
    pub openai_organization: Option<String>,
    /// Model used by channel health checks.
    pub test_model: Option<String>,
    /// Lifecycle code: 1 enabled, 2 manually disabled, 3 auto disabled.
    pub status: i64,
    /// Channel name.
    pub name: String,
    /// Load balancing weight.
    pub weight: Option<i64>,
    /// Creation timestamp.
    pub created_time: i64,
    /// Last test timestamp.
    pub test_time: i64,
    /// Last response time in ms.
    pub response_time: i64,
    /// Custom base URL.
    pub base_url: Option<String>,
    /// Legacy per-kind configuration.
    pub other: String,
    /// Balance in USD.
    pub balance: f64,
    /// Balance update timestamp.
    pub balance_updated_time: i64,
    /// Supported models, comma separated.
    pub models: String,
    /// Groups, comma separated.
    pub group: String,
    /// Used quota.
    pub used_quota: i64,
    /// Model mapping JSON.
    pub model_mapping: Option<String>,
    /// Status code mapping JSON.
    pub status_code_mapping: Option<String>,
    /// Priority.
    pub priority: Option<i64>,
    /// Auto-ban flag (1 = on).
    pub auto_ban: Option<i64>,
    /// Other info JSON.
    pub other_info: String,
    /// Tag.
    pub tag: Option<String>,
    /// Extra settings JSON.
    pub setting: Option<String>,
    /// Request parameter override JSON.
    pub param_override: Option<String>,
    /// Request header override JSON.
    pub header_override: Option<String>,
    /// Remark.
    pub remark: Option<String>,
    /// Multi-key management state.
    pub channel_info: Option<serde_json::Value>,
    /// Other settings (e.g. Azure API version).
    pub settings: String,
}

/// A row of the `tokens` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Token ID.
    pub id: i64,
    /// Owning user.
    pub user_id: i64,
    /// Plaintext token secret.
    pub key: String,
    /// Lifecycle code: 1 enabled, 2 disabled, 3 expired, 4 exhausted.
    pub status: i64,
    /// Token name.
    pub name: String,
    /// Creation timestamp.
    pub created_time: i64,
    /// Last access timestamp.
    pub accessed_time: i64,
    /// Expiry timestamp; -1 or 0 means never.
    pub expired_time: i64,
    /// Remaining quota.
    pub remain_quota: i64,
    /// Unlimited quota flag.
    pub unlimited_quota: bool,
    /// Whether `model_limits` is enforced.
    pub model_limits_enabled: bool,
    /// Allowed models, comma separated.
    pub model_limits: String,
    /// IP allow-list, comma separated.
    pub allow_ips: Option<String>,
    /// Used quota.
    pub used_quota: i64,
    /// Group.
    pub group: String,
}

/// A row of the `users` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User ID.
    pub id: i64,
    /// Login name.
    pub username: String,
    /// Display name.
    pub display_name: String,
    /// Role: 0 guest, 1 common, 10 admin, 100 root.
    pub role: i64,
    /// Lifecycle code: 1 enabled, 2 disabled.
    pub status: i64,
    /// Email address.
    pub email: String,
    /// Group.
    pub group: String,
}

impl User {
    /// Returns true for admin and root users.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role >= 10
    }
}

/// A row of the `abilities` table: one (group, model, channel) capability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ability {
    /// Group.
    pub group: String,
    /// Model name.
    pub model: String,
    /// Channel providing the model.
    pub channel_id: i64,
    /// Enabled flag.
    pub enabled: bool,
    /// Priority.
    pub priority: Option<i64>,
    /// Weight.
    pub weight: i64,
    /// Tag.
    pub tag: Option<String>,
}

//! Entity conversions from New API rows to EZ-API records.
//!
//! Every function here is pure: warnings are pushed into a caller-provided
//! sink, nothing touches the database.

use chrono::{TimeZone, Utc};
use serde_json::value::to_raw_value;

use crate::mapping;
use crate::models::{Ability, Channel, Token, User};
use crate::schema::{Binding, BindingStatus, Key, Master, Provider};

/// Group used when a row carries none.
pub const DEFAULT_GROUP: &str = "default";

/// Scopes granted to every migrated key.
pub const KEY_SCOPES: [&str; 2] = ["chat:*", "completions:*"];

/// Child key limit of a migrated master.
pub const DEFAULT_MAX_CHILD_KEYS: i64 = 10;

/// QPS limit of a migrated master.
pub const DEFAULT_GLOBAL_QPS: i64 = 3;

/// What [`split_list`] returns when no non-empty item remains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback<'a> {
    /// An empty list.
    Empty,
    /// The untrimmed input as the only item.
    Raw,
    /// The given value as the only item.
    Value(&'a str),
}

/// Splits `raw` on `separator`, trims each item and drops empty ones.
#[must_use]
pub fn split_list(raw: &str, separator: char, fallback: Fallback<'_>) -> Vec<String> {
    let items: Vec<String> = raw
        .split(separator)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect();

    if !items.is_empty() {
        return items;
    }
    match fallback {
        Fallback::Empty => items,
        Fallback::Raw => vec![raw.to_string()],
        Fallback::Value(value) => vec![value.to_string()],
    }
}

/// Secrets of a channel, one per line.
#[must_use]
pub fn parse_keys(raw: &str) -> Vec<String> {
    split_list(raw, '\n', Fallback::Raw)
}

/// Groups of a channel; never empty.
#[must_use]
pub fn parse_groups(raw: &str) -> Vec<String> {
    split_list(raw, ',', Fallback::Value(DEFAULT_GROUP))
}

/// Comma separated model names.
#[must_use]
pub fn parse_models(raw: &str) -> Vec<String> {
    split_list(raw, ',', Fallback::Empty)
}

fn non_empty(field: Option<&String>) -> bool {
    field.is_some_and(|v| !v.is_empty())
}

type Rule = (fn(&Channel) -> bool, fn(&Channel) -> String);

/// Channel settings EZ-API cannot represent, checked in order.
const UNMAPPABLE_FIELDS: &[Rule] = &[
    (
        |ch| ch.priority.is_some_and(|p| p != 0),
        |ch| {
            format!(
                "has priority={} which is not supported in EZ-API",
                ch.priority.unwrap_or_default()
            )
        },
    ),
    (
        |ch| non_empty(ch.model_mapping.as_ref()),
        |_| "has model_mapping which is not migrated. Use EZ-API Binding instead.".to_string(),
    ),
    (
        |ch| non_empty(ch.status_code_mapping.as_ref()),
        |_| "has status_code_mapping which is not supported in EZ-API".to_string(),
    ),
    (
        |ch| non_empty(ch.setting.as_ref()),
        |_| "has custom settings which are not migrated".to_string(),
    ),
    (
        |ch| non_empty(ch.param_override.as_ref()),
        |_| "has param_override which is not supported in EZ-API".to_string(),
    ),
    (
        |ch| non_empty(ch.header_override.as_ref()),
        |_| "has header_override which is not supported in EZ-API".to_string(),
    ),
    (
        |ch| parse_groups(&ch.group).len() > 1,
        |ch| {
            let groups = parse_groups(&ch.group);
            format!(
                "belongs to multiple groups [{}]. Only '{}' is used as primary group. \
                 Consider creating Bindings for other groups.",
                groups.join(" "),
                groups[0]
            )
        },
    ),
];

fn channel_warning(channel: &Channel, detail: &str) -> String {
    format!("Channel '{}' (ID={}) {}", channel.name, channel.id, detail)
}

/// Warnings for the channel settings that are dropped by the migration.
#[must_use]
pub fn unmappable_field_warnings(channel: &Channel) -> Vec<String> {
    UNMAPPABLE_FIELDS
        .iter()
        .filter(|(applies, _)| applies(channel))
        .map(|(_, detail)| channel_warning(channel, &detail(channel)))
        .collect()
}

/// Converts a channel into one provider per secret.
///
/// A channel with `n > 1` secrets yields `n` providers named `name`,
/// `name-2`, ..., `name-n`, each carrying its 1-based index and the channel
/// name. Warnings for an unknown kind and for unmappable settings are
/// appended to `warnings`.
pub fn channel_to_providers(channel: &Channel, warnings: &mut Vec<String>) -> Vec<Provider> {
    let keys = parse_keys(&channel.key);
    let is_multi_key = keys.len() > 1;

    let groups = parse_groups(&channel.group);
    let primary_group = groups[0].clone();

    let (provider_type, known) = mapping::provider_type(channel.kind);
    if !known {
        warnings.push(channel_warning(
            channel,
            &format!(
                "has unknown type {}, mapped to '{}'",
                channel.kind,
                mapping::CUSTOM_PROVIDER_TYPE
            ),
        ));
    }

    let priority = channel.priority.filter(|p| *p > 0);
    let weight = channel
        .weight
        .filter(|w| *w > 0)
        .or(priority)
        .unwrap_or(1);
    let auto_ban = channel.auto_ban.map_or(true, |flag| flag == 1);
    let models = parse_models(&channel.models);
    let original = to_raw_value(channel).ok();

    warnings.extend(unmappable_field_warnings(channel));

    keys.into_iter()
        .enumerate()
        .map(|(i, api_key)| {
            let index = i as i64 + 1;
            Provider {
                original_id: channel.id,
                name: if i == 0 {
                    channel.name.clone()
                } else {
                    format!("{}-{}", channel.name, index)
                },
                provider_type: provider_type.to_string(),
                base_url: channel.base_url.clone().unwrap_or_default(),
                api_key,
                models: models.clone(),
                primary_group: primary_group.clone(),
                all_groups: groups.clone(),
                weight,
                priority: priority.unwrap_or(0),
                status: mapping::channel_status(channel.status),
                auto_ban,
                is_multi_key,
                multi_key_index: if is_multi_key { index } else { 0 },
                original_name: if is_multi_key {
                    channel.name.clone()
                } else {
                    String::new()
                },
                original: original.clone(),
            }
        })
        .collect()
}

/// Converts a user into a master named after the username.
#[must_use]
pub fn user_to_master(user: &User) -> Master {
    Master {
        name: user.username.clone(),
        group: user.group.clone(),
        namespaces: vec![user.group.clone()],
        default_namespace: user.group.clone(),
        max_child_keys: DEFAULT_MAX_CHILD_KEYS,
        global_qps: DEFAULT_GLOBAL_QPS,
        status: mapping::user_status(user.status),
        source_user_id: user.id,
        source_email: user.email.clone(),
    }
}

/// Converts a token into a key owned by `master_ref`.
#[must_use]
pub fn token_to_key(token: &Token, master_ref: &str) -> Key {
    let model_limits = (token.model_limits_enabled && !token.model_limits.is_empty())
        .then(|| parse_models(&token.model_limits))
        .filter(|models| !models.is_empty());

    // -1 and 0 both mean "never expires".
    let expires_at = (token.expired_time > 0)
        .then(|| Utc.timestamp_opt(token.expired_time, 0).single())
        .flatten();

    let allow_ips = token
        .allow_ips
        .as_deref()
        .filter(|ips| !ips.is_empty())
        .map(|ips| ips.split(',').map(|ip| ip.trim().to_string()).collect());

    let (quota_limit, quota_used) = if token.unlimited_quota {
        (None, None)
    } else {
        (Some(token.remain_quota), Some(token.used_quota))
    };

    Key {
        master_ref: master_ref.to_string(),
        original_token: token.key.clone(),
        group: token.group.clone(),
        status: mapping::token_status(token.status),
        scopes: KEY_SCOPES.iter().map(|s| (*s).to_string()).collect(),
        namespaces: vec![token.group.clone()],
        model_limits_enabled: token.model_limits_enabled,
        model_limits,
        expires_at,
        allow_ips,
        quota_limit,
        quota_used,
        unlimited_quota: token.unlimited_quota,
        original_id: token.id,
        token_plaintext_available: true,
    }
}

/// Converts an ability into a binding routed by its group.
#[must_use]
pub fn ability_to_binding(ability: &Ability) -> Binding {
    Binding {
        namespace: ability.group.clone(),
        route_group: ability.group.clone(),
        model: ability.model.clone(),
        status: if ability.enabled {
            BindingStatus::Active
        } else {
            BindingStatus::Disabled
        },
    }
}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod tests;

//! Intermediate JSON format consumed by the EZ-API importer.
//!
//! Field names and nesting are a compatibility contract with the import
//! tooling: `version`, `source.{type,version,exported_at}`,
//! `data.{providers,masters,keys,bindings}` and `warnings`.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;

use crate::error::{Error, Result};

/// Version of the intermediate format.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Source type tag written into every export.
pub const SOURCE_TYPE: &str = "newapi";

/// Provider lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderStatus {
    /// Routable.
    Active,
    /// Not routable.
    Disabled,
}

/// Master lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MasterStatus {
    /// Account in good standing.
    Active,
    /// Account suspended.
    Suspended,
}

/// Key lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStatus {
    /// Usable.
    Active,
    /// Disabled by its owner or an admin.
    Disabled,
    /// Past its expiry time.
    Expired,
    /// Quota used up.
    Exhausted,
}

/// Binding state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingStatus {
    /// Route enabled.
    Active,
    /// Route disabled.
    Disabled,
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// An EZ-API provider: one upstream endpoint with a single secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    /// ID of the channel this provider came from.
    pub original_id: i64,
    /// Provider name.
    pub name: String,
    /// Provider type.
    #[serde(rename = "type")]
    pub provider_type: String,
    /// Custom base URL.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub base_url: String,
    /// Single upstream secret.
    pub api_key: String,
    /// Supported models.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<String>,
    /// First group of the channel.
    pub primary_group: String,
    /// Every group of the channel.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_groups: Vec<String>,
    /// Load balancing weight.
    pub weight: i64,
    /// Channel priority.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub priority: i64,
    /// Lifecycle state.
    pub status: ProviderStatus,
    /// Ban the provider automatically on upstream failures.
    pub auto_ban: bool,
    /// Whether the channel held more than one secret.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_multi_key: bool,
    /// 1-based position of the secret in a multi-key channel.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub multi_key_index: i64,
    /// Channel name before splitting.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub original_name: String,
    /// Verbatim copy of the source channel.
    #[serde(rename = "_original", default, skip_serializing_if = "Option::is_none")]
    pub original: Option<Box<RawValue>>,
}

/// An EZ-API master account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Master {
    /// Master name (the source username).
    pub name: String,
    /// Group.
    pub group: String,
    /// Accessible namespaces.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<String>,
    /// Default namespace.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_namespace: String,
    /// Maximum number of child keys.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub max_child_keys: i64,
    /// Global QPS limit.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub global_qps: i64,
    /// Lifecycle state.
    pub status: MasterStatus,
    /// Source user ID.
    #[serde(rename = "_source_user_id")]
    pub source_user_id: i64,
    /// Source user email.
    #[serde(rename = "_source_email", default, skip_serializing_if = "String::is_empty")]
    pub source_email: String,
}

/// An EZ-API key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Key {
    /// Name of the owning master.
    pub master_ref: String,
    /// Plaintext token.
    pub original_token: String,
    /// Group.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
    /// Lifecycle state.
    pub status: KeyStatus,
    /// Permission scopes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
    /// Accessible namespaces.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<String>,
    /// Whether `model_limits` was enforced at the source.
    #[serde(default, skip_serializing_if = "is_false")]
    pub model_limits_enabled: bool,
    /// Allowed models.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_limits: Option<Vec<String>>,
    /// Expiry instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// IP allow-list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_ips: Option<Vec<String>>,
    /// Remaining quota.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_limit: Option<i64>,
    /// Used quota.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_used: Option<i64>,
    /// Unlimited quota flag.
    #[serde(default, skip_serializing_if = "is_false")]
    pub unlimited_quota: bool,
    /// Source token ID.
    #[serde(rename = "_original_id")]
    pub original_id: i64,
    /// Whether the plaintext token was readable at the source.
    #[serde(
        rename = "_token_plaintext_available",
        default,
        skip_serializing_if = "is_false"
    )]
    pub token_plaintext_available: bool,
}

/// An EZ-API binding (from a New API ability).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    /// Namespace.
    pub namespace: String,
    /// Route group.
    pub route_group: String,
    /// Model name.
    pub model: String,
    /// State.
    pub status: BindingStatus,
}

/// Source system descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Source type, always `newapi`.
    #[serde(rename = "type")]
    pub source_type: String,
    /// Source version, if detectable.
    pub version: String,
    /// Export timestamp.
    pub exported_at: DateTime<Utc>,
}

/// Exported entity collections, in processing order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Data {
    /// Providers (from channels).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub providers: Vec<Provider>,
    /// Masters (from users owning tokens).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub masters: Vec<Master>,
    /// Keys (from tokens).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<Key>,
    /// Bindings (from abilities).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<Binding>,
}

/// Complete export output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResult {
    /// Schema version.
    pub version: String,
    /// Source descriptor.
    pub source: Source,
    /// Exported entities.
    pub data: Data,
    /// Non-fatal warnings, in emission order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Source user ID → master name, kept for traceability only.
    #[serde(skip)]
    master_refs: BTreeMap<i64, String>,
}

impl Default for ExportResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportResult {
    /// Creates an empty result stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        Self::with_timestamp(Utc::now())
    }

    /// Creates an empty result stamped with `exported_at`.
    #[must_use]
    pub fn with_timestamp(exported_at: DateTime<Utc>) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            source: Source {
                source_type: SOURCE_TYPE.to_string(),
                version: "unknown".to_string(),
                exported_at,
            },
            data: Data::default(),
            warnings: Vec::new(),
            master_refs: BTreeMap::new(),
        }
    }

    /// Appends a warning.
    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    /// Appends a provider.
    pub fn add_provider(&mut self, provider: Provider) {
        self.data.providers.push(provider);
    }

    /// Appends a master and records which source user it came from.
    pub fn add_master(&mut self, master: Master) {
        self.master_refs
            .insert(master.source_user_id, master.name.clone());
        self.data.masters.push(master);
    }

    /// Appends a key.
    pub fn add_key(&mut self, key: Key) {
        self.data.keys.push(key);
    }

    /// Appends a binding.
    pub fn add_binding(&mut self, binding: Binding) {
        self.data.bindings.push(binding);
    }

    /// Name of the master generated for a source user.
    #[must_use]
    pub fn master_for_user(&self, user_id: i64) -> Option<&str> {
        self.master_refs.get(&user_id).map(String::as_str)
    }

    /// Entity and warning counts.
    #[must_use]
    pub fn summary(&self) -> Summary {
        Summary {
            providers: self.data.providers.len(),
            masters: self.data.masters.len(),
            keys: self.data.keys.len(),
            bindings: self.data.bindings.len(),
            warnings: self.warnings.len(),
        }
    }

    /// Serializes to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Writes the JSON artifact to `path`, returning the number of bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write_to(&self, path: &Path) -> Result<u64> {
        let data = self.to_json()?;
        std::fs::write(path, &data)?;
        Ok(data.len() as u64)
    }
}

/// Entity and warning counts of an export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Provider count.
    pub providers: usize,
    /// Master count.
    pub masters: usize,
    /// Key count.
    pub keys: usize,
    /// Binding count.
    pub bindings: usize,
    /// Warning count.
    pub warnings: usize,
}

/// Outcome of [`validate_document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Schema version.
    pub version: String,
    /// `source.type`, if present.
    pub source_type: Option<String>,
    /// `source.exported_at`, if present.
    pub exported_at: Option<String>,
    /// Counts of the collections present under `data`.
    pub summary: Summary,
}

/// Checks the structure of a parsed export file.
///
/// # Errors
///
/// Returns [`Error::InvalidExport`] if a required field is missing or has
/// the wrong type.
pub fn validate_document(doc: &Value) -> Result<ValidationReport> {
    let obj = doc
        .as_object()
        .ok_or_else(|| Error::InvalidExport("top level must be an object".to_string()))?;

    for field in ["version", "source", "data"] {
        if !obj.contains_key(field) {
            return Err(Error::InvalidExport(format!(
                "missing required field: {}",
                field
            )));
        }
    }

    let version = obj["version"]
        .as_str()
        .ok_or_else(|| Error::InvalidExport("version must be a string".to_string()))?;
    let source = obj["source"]
        .as_object()
        .ok_or_else(|| Error::InvalidExport("source must be an object".to_string()))?;
    let data = obj["data"]
        .as_object()
        .ok_or_else(|| Error::InvalidExport("data must be an object".to_string()))?;

    let count = |name: &str| data.get(name).and_then(Value::as_array).map_or(0, Vec::len);
    let text = |name: &str| source.get(name).and_then(Value::as_str).map(String::from);

    Ok(ValidationReport {
        version: version.to_string(),
        source_type: text("type"),
        exported_at: text("exported_at"),
        summary: Summary {
            providers: count("providers"),
            masters: count("masters"),
            keys: count("keys"),
            bindings: count("bindings"),
            warnings: obj
                .get("warnings")
                .and_then(Value::as_array)
                .map_or(0, Vec::len),
        },
    })
}

/// Reads and validates an export file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not JSON, or fails
/// [`validate_document`].
pub fn validate_file(path: &Path) -> Result<ValidationReport> {
    let content = std::fs::read(path)?;
    let doc: Value = serde_json::from_slice(&content)?;
    validate_document(&doc)
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;

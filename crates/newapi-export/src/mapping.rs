//! Lookup tables from New API integer codes to EZ-API enums.
//!
//! Every function here is total: unknown codes fall back to a fixed value
//! instead of failing. [`provider_type`] additionally reports whether the
//! code was known so the caller can emit a warning.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::schema::{KeyStatus, MasterStatus, ProviderStatus};

/// Provider type used for unknown channel kinds.
pub const CUSTOM_PROVIDER_TYPE: &str = "custom";

/// (kind code, provider type, display name) for every known channel kind.
const CHANNEL_KINDS: &[(i64, &str, &str)] = &[
    (0, "custom", "Unknown"),
    (1, "openai", "OpenAI"),
    (2, "midjourney", "Midjourney"),
    (3, "azure", "Azure"),
    (4, "ollama", "Ollama"),
    (5, "midjourney", "MidjourneyPlus"),
    (6, "openai", "OpenAIMax"),
    (7, "openai", "OhMyGPT"),
    (8, "custom", "Custom"),
    (9, "openai", "AILS"),
    (10, "openai", "AIProxy"),
    (11, "palm", "PaLM"),
    (12, "openai", "API2GPT"),
    (13, "openai", "AIGC2D"),
    (14, "anthropic", "Anthropic"),
    (15, "baidu", "Baidu"),
    (16, "zhipu", "Zhipu"),
    (17, "ali", "Ali"),
    (18, "xunfei", "Xunfei"),
    (19, "360", "360"),
    (20, "openrouter", "OpenRouter"),
    (21, "openai", "AIProxyLibrary"),
    (22, "openai", "FastGPT"),
    (23, "tencent", "Tencent"),
    (24, "gemini", "Gemini"),
    (25, "moonshot", "Moonshot"),
    (26, "zhipu", "ZhipuV4"),
    (27, "perplexity", "Perplexity"),
    (31, "lingyiwanwu", "LingYiWanWu"),
    (33, "aws", "AWS"),
    (34, "cohere", "Cohere"),
    (35, "minimax", "MiniMax"),
    (36, "suno", "SunoAPI"),
    (37, "dify", "Dify"),
    (38, "jina", "Jina"),
    (39, "cloudflare", "Cloudflare"),
    (40, "siliconflow", "SiliconFlow"),
    (41, "vertex", "VertexAI"),
    (42, "mistral", "Mistral"),
    (43, "deepseek", "DeepSeek"),
    (44, "mokaai", "MokaAI"),
    (45, "volcengine", "VolcEngine"),
    (46, "baidu", "BaiduV2"),
    (47, "xinference", "Xinference"),
    (48, "xai", "xAI"),
    (49, "coze", "Coze"),
    (50, "kling", "Kling"),
    (51, "jimeng", "Jimeng"),
    (52, "vidu", "Vidu"),
    (53, "submodel", "Submodel"),
    (54, "doubao", "DoubaoVideo"),
    (55, "openai", "Sora"),
    (56, "replicate", "Replicate"),
];

static PROVIDER_TYPES: LazyLock<HashMap<i64, &'static str>> = LazyLock::new(|| {
    CHANNEL_KINDS
        .iter()
        .map(|&(code, provider, _)| (code, provider))
        .collect()
});

static DISPLAY_NAMES: LazyLock<HashMap<i64, &'static str>> = LazyLock::new(|| {
    CHANNEL_KINDS
        .iter()
        .map(|&(code, _, name)| (code, name))
        .collect()
});

/// Maps a channel kind code to an EZ-API provider type.
///
/// Returns `("custom", false)` for unknown codes.
#[must_use]
pub fn provider_type(kind: i64) -> (&'static str, bool) {
    match PROVIDER_TYPES.get(&kind) {
        Some(provider) => (provider, true),
        None => (CUSTOM_PROVIDER_TYPE, false),
    }
}

/// Human-readable name of a channel kind, `"Unknown"` when unmapped.
#[must_use]
pub fn channel_kind_name(kind: i64) -> &'static str {
    DISPLAY_NAMES.get(&kind).copied().unwrap_or("Unknown")
}

/// Maps a channel lifecycle code. Only 1 (enabled) is active.
#[must_use]
pub fn channel_status(code: i64) -> ProviderStatus {
    match code {
        1 => ProviderStatus::Active,
        _ => ProviderStatus::Disabled,
    }
}

/// Maps a token lifecycle code; unknown codes are disabled.
#[must_use]
pub fn token_status(code: i64) -> KeyStatus {
    match code {
        1 => KeyStatus::Active,
        2 => KeyStatus::Disabled,
        3 => KeyStatus::Expired,
        4 => KeyStatus::Exhausted,
        _ => KeyStatus::Disabled,
    }
}

/// Maps a user lifecycle code. Only 1 (enabled) is active.
#[must_use]
pub fn user_status(code: i64) -> MasterStatus {
    match code {
        1 => MasterStatus::Active,
        _ => MasterStatus::Suspended,
    }
}

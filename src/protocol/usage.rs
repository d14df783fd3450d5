//! Token usage tracking types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::de::null_default;

/// Token usage statistics reported by the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Usage {
    /// Number of input tokens consumed.
    #[serde(deserialize_with = "null_default")]
    pub input_tokens: u64,
    /// Number of output tokens generated.
    #[serde(deserialize_with = "null_default")]
    pub output_tokens: u64,
    /// Tokens read from cache (if caching enabled).
    #[serde(skip_serializing_if = "is_zero", deserialize_with = "null_default")]
    pub cache_read_input_tokens: u64,
    /// Tokens written to cache (if caching enabled).
    #[serde(skip_serializing_if = "is_zero", deserialize_with = "null_default")]
    pub cache_creation_input_tokens: u64,
    /// Server-side tool counters such as `web_search_requests`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", deserialize_with = "null_default")]
    pub server_tool_use: BTreeMap<String, u64>,
    /// Service tier the request ran on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_tier: Option<String>,
    /// Cache creation breakdown by TTL bucket.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", deserialize_with = "null_default")]
    pub cache_creation: BTreeMap<String, u64>,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

impl Usage {
    /// Create a new empty Usage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total input tokens including cache operations.
    pub fn total_input_tokens(&self) -> u64 {
        self.input_tokens + self.cache_read_input_tokens + self.cache_creation_input_tokens
    }

    /// Total tokens (input + output).
    pub fn total_tokens(&self) -> u64 {
        self.total_input_tokens() + self.output_tokens
    }

    /// Accumulate token counters from another Usage instance.
    ///
    /// Tier and breakdown maps are left untouched.
    pub fn accumulate(&mut self, other: &Usage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.cache_read_input_tokens += other.cache_read_input_tokens;
        self.cache_creation_input_tokens += other.cache_creation_input_tokens;
    }
}

impl std::ops::AddAssign for Usage {
    fn add_assign(&mut self, other: Usage) {
        self.accumulate(&other);
    }
}

/// Per-model usage counters from a result message's `modelUsage` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelUsage {
    #[serde(deserialize_with = "null_default")]
    pub input_tokens: u64,
    #[serde(deserialize_with = "null_default")]
    pub output_tokens: u64,
    #[serde(deserialize_with = "null_default")]
    pub cache_read_input_tokens: u64,
    #[serde(deserialize_with = "null_default")]
    pub cache_creation_input_tokens: u64,
    #[serde(deserialize_with = "null_default")]
    pub web_search_requests: u64,
    #[serde(rename = "costUSD", deserialize_with = "null_default")]
    pub cost_usd: f64,
    #[serde(deserialize_with = "null_default")]
    pub context_window: u64,
    #[serde(deserialize_with = "null_default")]
    pub max_output_tokens: u64,
}

use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Default cap on pages fetched by any list-style remote call.
///
/// At a page size of 100 this is 10,000 resources, twice the largest
/// default service limit.
pub const DEFAULT_MAX_PAGES: u32 = 100;

/// Default wait before the single eventual-consistency retry.
pub const DEFAULT_CONSISTENCY_DELAY_MS: u64 = 1000;

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub aws: AwsConfig,
    pub remote: RemoteTuning,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `FDSYNC_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("FDSYNC_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            aws: AwsConfig::from_env_profiled(p),
            remote: RemoteTuning::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  aws:         region={}, endpoint={}",
            self.aws.region,
            self.aws.endpoint_url.as_deref().unwrap_or("(default)")
        );
        tracing::info!(
            "  remote:      max_pages={}, consistency_delay_ms={}",
            self.remote.max_pages,
            self.remote.consistency_delay_ms
        );
    }

    /// Return a redacted view safe for diagnostics (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "aws": {
                "region": self.aws.region,
                "endpoint_url": self.aws.endpoint_url,
            },
            "remote": {
                "max_pages": self.remote.max_pages,
                "consistency_delay_ms": self.remote.consistency_delay_ms,
            },
        })
    }
}

// ── AWS ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    pub region: String,
    pub endpoint_url: Option<String>,
}

impl AwsConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            region: profiled_env_or(p, "AWS_REGION", "us-east-1"),
            endpoint_url: profiled_env_opt(p, "AWS_ENDPOINT_URL"),
        }
    }
}

// ── Remote call tuning ────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteTuning {
    /// Maximum pages fetched per list-style call; results past the cap are dropped.
    pub max_pages: u32,
    /// Delay before retrying a read that reported not-found right after a write.
    pub consistency_delay_ms: u64,
}

impl RemoteTuning {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            max_pages: profiled_env_u32(p, "FDSYNC_MAX_PAGES", DEFAULT_MAX_PAGES).max(1),
            consistency_delay_ms: profiled_env_u64(
                p,
                "FDSYNC_CONSISTENCY_DELAY_MS",
                DEFAULT_CONSISTENCY_DELAY_MS,
            ),
        }
    }
}

impl Default for RemoteTuning {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            consistency_delay_ms: DEFAULT_CONSISTENCY_DELAY_MS,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

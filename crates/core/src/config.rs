use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::record::ComponentType;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

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

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Active profile name (empty = default).
    pub profile: String,
    pub peaks: PeakConfig,
    pub ingest: IngestConfig,
    pub output: OutputConfig,
}

impl MatchConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `SALTMATCH_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("SALTMATCH_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            peaks: PeakConfig::from_env_profiled(p),
            ingest: IngestConfig::from_env_profiled(p),
            output: OutputConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  peaks:   component={}, max_truth_rows={}, safeguard={}, pileup_area>{}",
            self.peaks.component,
            self.peaks.max_truth_rows,
            self.peaks.safeguard,
            self.peaks.pileup_area_threshold
        );
        tracing::info!("  ingest:  require_dense_events={}", self.ingest.require_dense_events);
        tracing::info!("  output:  dir={}", self.output.dir.display());
    }

    /// JSON view embedded in run summaries.
    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "peaks": {
                "component": self.peaks.component.code(),
                "max_truth_rows": self.peaks.max_truth_rows,
                "safeguard": self.peaks.safeguard,
                "pileup_area_threshold": self.peaks.pileup_area_threshold,
            },
            "ingest": { "require_dense_events": self.ingest.require_dense_events },
            "output": { "dir": self.output.dir },
        })
    }
}

// ── Peak matching ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeakConfig {
    /// Component whose reconstruction must be "found" and whose salted peaks are paired.
    pub component: ComponentType,
    /// Truth/match rows considered; later rows are dropped before filtering.
    pub max_truth_rows: usize,
    /// Overlap tolerance in time units, widening both intervals.
    pub safeguard: i64,
    /// Salted S2 peaks with `area` at or below this are treated as pile-up.
    pub pileup_area_threshold: f64,
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            component: ComponentType::S2,
            max_truth_rows: 10_000,
            safeguard: 1_000,
            pileup_area_threshold: 5.0,
        }
    }
}

impl PeakConfig {
    fn from_env_profiled(p: &str) -> Self {
        let defaults = Self::default();
        Self {
            component: ComponentType::from_code(profiled_env_parse(
                p,
                "PEAK_COMPONENT",
                defaults.component.code(),
            )),
            max_truth_rows: profiled_env_parse(p, "MAX_TRUTH_ROWS", defaults.max_truth_rows),
            safeguard: profiled_env_parse(p, "PEAK_SAFEGUARD", defaults.safeguard),
            pileup_area_threshold: profiled_env_parse(
                p,
                "PILEUP_AREA_THRESHOLD",
                defaults.pileup_area_threshold,
            ),
        }
    }
}

// ── Ingest ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Reject raw truth tables whose event numbers are not 1, 2, 3, ...
    pub require_dense_events: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            require_dense_events: true,
        }
    }
}

impl IngestConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            require_dense_events: profiled_env_bool(p, "REQUIRE_DENSE_EVENTS", true),
        }
    }
}

// ── Output ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("matched"),
        }
    }
}

impl OutputConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            dir: PathBuf::from(profiled_env_or(p, "OUTPUT_DIR", "matched")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_peak_matching_constants() {
        let config = MatchConfig::default();
        assert_eq!(config.peaks.component, ComponentType::S2);
        assert_eq!(config.peaks.max_truth_rows, 10_000);
        assert_eq!(config.peaks.safeguard, 1_000);
        assert_eq!(config.peaks.pileup_area_threshold, 5.0);
        assert!(config.ingest.require_dense_events);
        assert_eq!(config.profile_label(), "default");
    }

    #[test]
    fn profiled_keys_take_precedence() {
        env::set_var("CFGTEST_PEAK_SAFEGUARD", "250");
        env::set_var("CFGTEST_PEAK_COMPONENT", "1");
        env::set_var("CFGTEST_REQUIRE_DENSE_EVENTS", "false");
        env::set_var("CFGTEST_MAX_TRUTH_ROWS", "not-a-number");

        let config = MatchConfig::for_profile("cfgtest");
        assert_eq!(config.profile, "CFGTEST");
        assert_eq!(config.peaks.safeguard, 250);
        assert_eq!(config.peaks.component, ComponentType::S1);
        assert!(!config.ingest.require_dense_events);
        assert_eq!(config.peaks.max_truth_rows, 10_000, "unparseable value falls back");
    }

    #[test]
    fn summary_is_json_object() {
        let summary = MatchConfig::default().summary();
        assert_eq!(summary["profile"], "default");
        assert_eq!(summary["peaks"]["component"], 2);
    }
}

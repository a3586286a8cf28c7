use std::path::{Path, PathBuf};

use harvestor_core::{HarvestorError, HarvestorResult};
use harvestor_dispatch::TimingConfig;
use harvestor_planner::CompoundGrowth;
use serde::Deserialize;
use tracing::info;

/// Top-level `harvestor.toml` configuration.
#[derive(Debug, Default, Deserialize)]
pub struct HarvestorConfig {
    #[serde(default)]
    pub snapshots: SnapshotConfig,
    #[serde(default)]
    pub growth: GrowthConfig,
    #[serde(default)]
    pub timing: TimingSettings,
}

/// Where the snapshot collaborators read fleet and target state from.
#[derive(Debug, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_fleet_path")]
    pub fleet_path: PathBuf,
    #[serde(default = "default_target_path")]
    pub target_path: PathBuf,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            fleet_path: default_fleet_path(),
            target_path: default_target_path(),
        }
    }
}

/// Yield-growth model parameters.
#[derive(Debug, Deserialize)]
pub struct GrowthConfig {
    #[serde(default = "default_rate_per_unit")]
    pub rate_per_unit: f64,
    #[serde(default = "default_headroom")]
    pub headroom: f64,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            rate_per_unit: default_rate_per_unit(),
            headroom: default_headroom(),
        }
    }
}

impl GrowthConfig {
    /// Builds the growth model these parameters describe.
    pub fn model(&self) -> CompoundGrowth {
        CompoundGrowth::new(self.rate_per_unit).with_headroom(self.headroom)
    }
}

/// Cadence tunables, mirroring [`TimingConfig`].
#[derive(Debug, Deserialize)]
pub struct TimingSettings {
    #[serde(default = "default_safety_margin_ms")]
    pub safety_margin_ms: u64,
    #[serde(default = "default_settle_margin_ms")]
    pub settle_margin_ms: u64,
    #[serde(default = "default_slice_ms")]
    pub slice_ms: u64,
    #[serde(default = "default_batches_per_slice")]
    pub batches_per_slice: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            safety_margin_ms: default_safety_margin_ms(),
            settle_margin_ms: default_settle_margin_ms(),
            slice_ms: default_slice_ms(),
            batches_per_slice: default_batches_per_slice(),
        }
    }
}

impl From<&TimingSettings> for TimingConfig {
    fn from(settings: &TimingSettings) -> Self {
        Self {
            safety_margin_ms: settings.safety_margin_ms,
            settle_margin_ms: settings.settle_margin_ms,
            slice_ms: settings.slice_ms,
            batches_per_slice: settings.batches_per_slice,
        }
    }
}

fn default_fleet_path() -> PathBuf {
    PathBuf::from("fleet.json")
}
fn default_target_path() -> PathBuf {
    PathBuf::from("target.json")
}
fn default_rate_per_unit() -> f64 {
    0.01
}
fn default_headroom() -> f64 {
    1.1
}
fn default_safety_margin_ms() -> u64 {
    1000
}
fn default_settle_margin_ms() -> u64 {
    1000
}
fn default_slice_ms() -> u64 {
    1
}
fn default_batches_per_slice() -> u64 {
    1
}

impl HarvestorConfig {
    /// Loads the config file, or falls back to defaults when it is absent.
    pub async fn load_or_default(path: &Path) -> HarvestorResult<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => toml::from_str(&text).map_err(|e| {
                HarvestorError::Config(format!("{}: {e}", path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(HarvestorError::Config(format!("{}: {e}", path.display()))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: HarvestorConfig = toml::from_str("").unwrap();
        assert_eq!(config.snapshots.fleet_path, PathBuf::from("fleet.json"));
        assert_eq!(config.growth.headroom, 1.1);
        assert_eq!(config.timing.safety_margin_ms, 1000);
        assert_eq!(config.timing.batches_per_slice, 1);
    }

    #[test]
    fn test_partial_toml_overrides_only_named_keys() {
        let text = r#"
            [timing]
            safety_margin_ms = 250

            [growth]
            rate_per_unit = 0.02
        "#;
        let config: HarvestorConfig = toml::from_str(text).unwrap();
        assert_eq!(config.timing.safety_margin_ms, 250);
        assert_eq!(config.timing.settle_margin_ms, 1000);
        assert_eq!(config.growth.rate_per_unit, 0.02);
        assert_eq!(config.growth.headroom, 1.1);
    }

    #[test]
    fn test_timing_settings_convert_to_engine_config() {
        let settings = TimingSettings {
            safety_margin_ms: 10,
            settle_margin_ms: 20,
            slice_ms: 2,
            batches_per_slice: 3,
        };
        let timing = TimingConfig::from(&settings);
        assert_eq!(timing.safety_margin_ms, 10);
        assert_eq!(timing.settle_margin_ms, 20);
        assert_eq!(timing.slice_ms, 2);
        assert_eq!(timing.batches_per_slice, 3);
    }

    #[tokio::test]
    async fn test_missing_file_falls_back_to_defaults() {
        let config = HarvestorConfig::load_or_default(Path::new("/nonexistent/harvestor.toml"))
            .await
            .unwrap();
        assert_eq!(config.growth.rate_per_unit, 0.01);
    }
}

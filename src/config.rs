// src/config.rs

//! Manages daemon configuration: loading, resolving defaults, and validation.
//!
//! Grounded on `original_source/config.go` (`GetConfig`, `validateCluster`,
//! the `details.<name>` cluster map and `monitor.*` keys) and on the
//! teacher's own `Config::from_file` pattern in the pre-transform
//! `src/config.rs`: parse a `RawConfig` with `toml::from_str`, then resolve
//! and validate it into the `Config` the rest of the daemon uses. This is
//! the teacher's actual pattern — the `config` crate present in its
//! `Cargo.toml` is never invoked anywhere in its own source, so it was
//! dropped rather than carried forward (see DESIGN.md).

use std::collections::HashMap;
use std::fs;
use std::time::Duration;

use serde::Deserialize;
use tracing::error;

use crate::core::errors::{ReplwardenError, Result};

/// One entry in `details.<name>` (§3 "Cluster configuration entry").
///
/// All five fields must be non-empty for the entry to be valid; an invalid
/// entry is skipped with an error log, never fatal (§3, §7 tier 2).
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    #[serde(rename = "replicationapi")]
    pub repl_api_url: String,
    #[serde(rename = "brokeraddress")]
    pub broker_address: String,
    #[serde(rename = "sourcebroker")]
    pub source_broker: String,
    #[serde(rename = "zkaddress")]
    pub zk_address: String,
    #[serde(rename = "zkroot")]
    pub zk_root: String,
}

impl ClusterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.repl_api_url.is_empty()
            || self.broker_address.is_empty()
            || self.source_broker.is_empty()
            || self.zk_address.is_empty()
            || self.zk_root.is_empty()
        {
            return Err(ReplwardenError::InvalidClusterConfig(
                "one or more required fields are empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_leader_check() -> Duration {
    Duration::from_secs(60)
}
fn default_peer_check() -> Duration {
    Duration::from_secs(120)
}
fn default_reconcile() -> Duration {
    Duration::from_secs(300)
}
fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}
fn default_bind_port() -> u16 {
    7946
}
fn default_api_port() -> String {
    "8500".to_string()
}

/// `monitor.*` (§3 "Monitor configuration").
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    #[serde(rename = "bindaddress", default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(rename = "bindport", default = "default_bind_port")]
    pub bind_port: u16,
    #[serde(rename = "apiport", default = "default_api_port")]
    pub api_port: String,
    #[serde(default)]
    pub peers: Vec<String>,
    #[serde(rename = "leadercheck", default = "default_leader_check", with = "humantime_serde")]
    pub leader_check_interval: Duration,
    #[serde(rename = "peercheck", default = "default_peer_check", with = "humantime_serde")]
    pub peer_check_interval: Duration,
    #[serde(rename = "reconcile", default = "default_reconcile", with = "humantime_serde")]
    pub reconcile_interval: Duration,
    #[serde(default)]
    pub execute: bool,
    #[serde(default)]
    pub whitelist: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// A raw representation of the config file before validation and name
/// collection (mirrors the teacher's own `RawConfig` staging pattern).
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default = "default_log_level")]
    loglevel: String,
    monitor: MonitorConfig,
    #[serde(default)]
    details: HashMap<String, ClusterConfig>,
}

/// The fully resolved daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub monitor: MonitorConfig,
    /// Cluster entries, keyed by logical name, in ascending name order —
    /// same iteration order the original's `sort.SliceStable` over map keys
    /// produces (`original_source/config.go: GetConfig`).
    pub clusters: Vec<(String, ClusterConfig)>,
}

impl Config {
    /// Reads and parses a TOML config file (§6 "Configuration file").
    ///
    /// The CLI's `--config` flag format is TOML rather than the original's
    /// YAML — see `SPEC_FULL.md` §6 and the Open Question note in
    /// DESIGN.md. Unrecognized keys are ignored (`serde` default, no
    /// `deny_unknown_fields`).
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| ReplwardenError::ConfigLoad {
            path: path.to_string(),
            source,
        })?;
        let raw: RawConfig = toml::from_str(&contents)?;

        let mut clusters: Vec<(String, ClusterConfig)> = raw.details.into_iter().collect();
        clusters.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(Config {
            log_level: raw.loglevel,
            monitor: raw.monitor,
            clusters,
        })
    }
}

/// Drops cluster entries that fail `ClusterConfig::validate`, logging each
/// one (§3 "an invalid entry is skipped with an error log, never fatal").
pub fn valid_clusters(clusters: &[(String, ClusterConfig)]) -> Vec<(String, ClusterConfig)> {
    clusters
        .iter()
        .filter(|(name, cfg)| match cfg.validate() {
            Ok(()) => true,
            Err(err) => {
                error!(cluster = name, error = %err, "could not reconcile cluster: invalid configuration");
                false
            }
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_config_requires_all_five_fields() {
        let cfg = ClusterConfig {
            repl_api_url: "http://api".to_string(),
            broker_address: "broker:9092".to_string(),
            source_broker: "src:9092".to_string(),
            zk_address: String::new(),
            zk_root: "/kafka-repl".to_string(),
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn from_file_parses_toml_and_sorts_clusters() -> anyhow::Result<()> {
        let toml_text = r#"
loglevel = "debug"

[monitor]
bindaddress = "0.0.0.0"
bindport = 7946
apiport = "8500"
peers = ["node-a", "node-b"]
leadercheck = "1m"
peercheck = "2m"
reconcile = "5m"
execute = true
whitelist = true

[details.zz-cluster]
replicationapi = "http://api"
brokeraddress = "broker:9092"
sourcebroker = "src:9092"
zkaddress = "zk:2181"
zkroot = "/kafka-repl"

[details.aa-cluster]
replicationapi = "http://api2"
brokeraddress = "broker2:9092"
sourcebroker = "src2:9092"
zkaddress = "zk2:2181"
zkroot = "/kafka-repl2"
"#;
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, toml_text)?;

        let config = Config::from_file(path.to_str().unwrap())?;
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.monitor.leader_check_interval, Duration::from_secs(60));
        assert_eq!(config.clusters.len(), 2);
        assert_eq!(config.clusters[0].0, "aa-cluster");
        assert_eq!(config.clusters[1].0, "zz-cluster");
        Ok(())
    }
}

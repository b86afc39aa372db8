// src/core/errors.rs

//! Defines the primary error type for the reconcile daemon.
//!
//! Using `thiserror` keeps each failure family self-describing and gives us
//! `From` conversions for the underlying library errors, the way the
//! teacher's `SpinelDBError` does for `reqwest`/`std::io`.

use thiserror::Error;

/// The main error enum, covering the one module boundary in this crate
/// where failure must be reported to a caller rather than logged and
/// absorbed: configuration loading. Everything downstream of a valid
/// config (ZK, Kafka, HTTP, cluster join) treats its own failures as
/// contained to one pass or one attempt and uses `anyhow::Result`
/// internally instead, the same split as the teacher's `main.rs` /
/// `core::warden::mod::run` versus `core::commands`.
#[derive(Error, Debug)]
pub enum ReplwardenError {
    #[error("unable to read configuration file '{path}': {source}")]
    ConfigLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid cluster configuration for '{0}': one or more required fields are empty")]
    InvalidClusterConfig(String),
}

/// Short form alias for functions returning `ReplwardenError`s.
pub type Result<T> = std::result::Result<T, ReplwardenError>;

// src/core/metrics.rs

//! Defines and registers Prometheus metrics for the reconcile daemon.
//!
//! This module uses `lazy_static` to ensure that metrics are registered only
//! once globally for the entire process lifetime, mirroring the teacher's
//! `core::metrics` module.

use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, TextEncoder, register_counter, register_counter_vec,
    register_gauge,
};

lazy_static! {
    /// 1 if this node currently believes it is the cluster leader, else 0.
    pub static ref IS_LEADER: Gauge =
        register_gauge!("replwarden_is_leader", "Whether this node is the elected leader (1) or not (0).").unwrap();

    /// The current shared-counter generation, as observed locally.
    pub static ref COUNTER_GENERATION: Gauge =
        register_gauge!("replwarden_counter_generation", "Current generation of the shared leader counter.").unwrap();

    /// The number of live members this node currently sees in the gossip cluster.
    pub static ref CLUSTER_MEMBERS: Gauge =
        register_gauge!("replwarden_cluster_members", "Number of live members visible in the gossip cluster.").unwrap();

    /// Total number of reconcile passes attempted, labeled by cluster name.
    pub static ref RECONCILE_PASSES_TOTAL: CounterVec =
        register_counter_vec!("replwarden_reconcile_passes_total", "Total reconcile passes attempted, labeled by cluster.", &["cluster"]).unwrap();

    /// Total number of reconcile passes aborted before dispatch, labeled by cluster and reason.
    pub static ref RECONCILE_ABORTS_TOTAL: CounterVec =
        register_counter_vec!("replwarden_reconcile_aborts_total", "Total reconcile passes aborted, labeled by cluster and reason.", &["cluster", "reason"]).unwrap();

    /// Total number of topics blacklisted via the replication controller API.
    pub static ref TOPICS_BLACKLISTED_TOTAL: Counter =
        register_counter!("replwarden_topics_blacklisted_total", "Total number of topics blacklisted.").unwrap();

    /// Total number of topics whitelisted (re-added) via the replication controller API.
    pub static ref TOPICS_WHITELISTED_TOTAL: Counter =
        register_counter!("replwarden_topics_whitelisted_total", "Total number of topics whitelisted.").unwrap();

    /// Total number of peer notifications sent.
    pub static ref PEER_NOTIFICATIONS_SENT_TOTAL: Counter =
        register_counter!("replwarden_peer_notifications_sent_total", "Total number of peer notifications sent.").unwrap();

    /// Total number of peer notifications that hit the 3s deadline.
    pub static ref PEER_NOTIFICATIONS_TIMEOUT_TOTAL: Counter =
        register_counter!("replwarden_peer_notifications_timeout_total", "Total number of peer notifications that timed out.").unwrap();
}

/// Gathers all registered metrics and encodes them in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode_to_string(&metric_families).unwrap()
}

// src/daemon.rs

//! The control loop: a single supervising event loop selecting over four
//! periodic tickers plus the process shutdown signal.
//!
//! Grounded on `original_source/main.go`'s top-level `select` over
//! `debugDataPrinterTicker` / `numberBroadcastTicker` /
//! `leaderBroadcastTicker` / `leaderWorkTicker`, reworked onto
//! `tokio::time::interval` the way the teacher's
//! `core::warden::worker::MasterMonitor::run_tick_loop` drives its own
//! periodic checks, with peer-notify and reconcile dispatched as detached
//! tasks so the loop stays responsive (§4.9, §5 "at most one reconcile in
//! flight").

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use crate::config::Config;
use crate::core::counter::SharedCounter;
use crate::core::elector;
use crate::core::membership::{self, GossipCluster};
use crate::core::metrics::{CLUSTER_MEMBERS, COUNTER_GENERATION, IS_LEADER};
use crate::core::notifier;
use crate::core::reconcile::{self, ReconcileAction};

/// Process-lifetime state, as recommended by `spec.md` §9's
/// "process-wide state → explicit context" note: the counter, the config,
/// and the cluster handle live here; everything scoped to one reconcile
/// pass (ZK/Kafka clients, the replication target) is created and dropped
/// inside [`reconcile::reconcile`] instead.
pub struct Daemon {
    config: Config,
    cluster: Arc<dyn GossipCluster>,
    counter: Arc<SharedCounter>,
    http: reqwest::Client,
    am_leader: AtomicBool,
}

impl Daemon {
    pub fn new(config: Config, cluster: Arc<dyn GossipCluster>, counter: Arc<SharedCounter>) -> Self {
        Daemon {
            config,
            cluster,
            counter,
            http: reqwest::Client::new(),
            am_leader: AtomicBool::new(false),
        }
    }

    fn reconcile_action(&self) -> ReconcileAction {
        if self.config.monitor.whitelist {
            ReconcileAction::Both
        } else {
            ReconcileAction::Blacklist
        }
    }

    /// Runs the four-ticker control loop until `shutdown` fires. On exit,
    /// leaves the gossip cluster gracefully (§4.9 "Process exit").
    pub async fn run(self: Arc<Self>, mut shutdown: tokio::sync::broadcast::Receiver<()>) {
        let mut debug_tick = tokio::time::interval(std::time::Duration::from_secs(5));
        let mut peer_tick = tokio::time::interval(self.config.monitor.peer_check_interval);
        let mut leader_tick = tokio::time::interval(self.config.monitor.leader_check_interval);
        let mut reconcile_tick = tokio::time::interval(self.config.monitor.reconcile_interval);

        loop {
            tokio::select! {
                _ = debug_tick.tick() => self.on_debug_tick(),
                _ = peer_tick.tick() => self.on_peer_tick(),
                _ = leader_tick.tick() => self.on_leader_tick(),
                _ = reconcile_tick.tick() => self.on_reconcile_tick(),
                _ = shutdown.recv() => {
                    info!("shutdown signal received, leaving cluster");
                    self.cluster.leave().await;
                    break;
                }
            }
        }
    }

    fn on_debug_tick(&self) {
        if self.config.log_level != "debug" {
            return;
        }
        let members: Vec<String> = self.cluster.members().into_iter().map(|m| m.name).collect();
        let snap = self.counter.get();
        CLUSTER_MEMBERS.set(members.len() as f64);
        COUNTER_GENERATION.set(snap.generation as f64);
        debug!(count = self.cluster.num_nodes(), members = ?members, "cluster members");
        debug!(value = snap.value, generation = snap.generation, leader = %snap.meta, "cluster status");
    }

    fn on_peer_tick(&self) {
        let others = membership::other_live_members(self.cluster.as_ref());
        let counter = self.counter.clone();
        let http = self.http.clone();
        let api_port = self.config.monitor.api_port.clone();
        let local_name = self.cluster.local_member().name;
        tokio::spawn(async move {
            let snap = counter.get();
            notifier::notify_others(&http, &api_port, &local_name, &others, snap.value, snap.generation).await;
        });
    }

    fn on_leader_tick(&self) {
        let outcome = elector::run_election(self.cluster.as_ref(), &self.counter);
        self.am_leader.store(outcome.am_leader, Ordering::Relaxed);
        IS_LEADER.set(if outcome.am_leader { 1.0 } else { 0.0 });
    }

    fn on_reconcile_tick(&self) {
        let am_leader = self.am_leader.load(Ordering::Relaxed);
        info!(leader = am_leader, "check topics for any reconciliation");
        if !am_leader {
            info!(leader = am_leader, "skipping reconciliation, i am not the leader");
            return;
        }
        info!("beginning reconcile work");
        let clusters = crate::config::valid_clusters(&self.config.clusters);
        let action = self.reconcile_action();
        let execute = self.config.monitor.execute;
        let http = self.http.clone();
        tokio::spawn(async move {
            for (name, cfg) in clusters {
                info!(cluster = %name, "reconciling cluster");
                reconcile::reconcile(&http, &cfg, &name, action, execute, &[]).await;
            }
        });
    }
}

// src/core/membership.rs

//! Gossip cluster membership.
//!
//! Wraps `chitchat`, a SWIM-style gossip library, behind a small internal
//! trait so the rest of the core never touches its concrete types directly —
//! the same isolation the teacher gives its own cluster transport.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chitchat::transport::UdpTransport;
use chitchat::{ChitchatConfig, ChitchatHandle, ChitchatId, FailureDetectorConfig, spawn_chitchat};
use tracing::warn;

/// Status of a gossip peer, mirroring the upstream library's three
/// terminal states plus the transient `leaving` phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    Alive,
    Failed,
    Left,
    Leaving,
}

/// A gossip peer as seen by the local node.
#[derive(Debug, Clone)]
pub struct Member {
    pub name: String,
    pub ip_address: String,
    pub status: MemberStatus,
}

/// The contract the rest of the core depends on. Kept deliberately narrow —
/// create, join, enumerate, leave — so a different gossip transport could be
/// substituted without touching the elector, notifier, or control loop.
#[async_trait]
pub trait GossipCluster: Send + Sync {
    fn local_member(&self) -> Member;
    fn members(&self) -> Vec<Member>;
    fn num_nodes(&self) -> usize;
    async fn leave(&self);
}

/// `chitchat`-backed implementation of [`GossipCluster`].
///
/// The elector and control loop read membership synchronously every tick,
/// but `chitchat`'s live-node view sits behind an async mutex. A background
/// task polls it on the library's own gossip cadence and publishes the
/// result into a `parking_lot::RwLock`, the same "sync snapshot of async
/// state" shape the teacher uses for `core::warden::state::MasterState`.
pub struct ChitchatMembership {
    handle: ChitchatHandle,
    local_name: String,
    local_ip: String,
    live_members: Arc<parking_lot::RwLock<Vec<Member>>>,
}

impl ChitchatMembership {
    /// Creates and joins the gossip cluster.
    ///
    /// Seed peers equal to the local member (by name or address) are
    /// filtered out before join, per the membership contract. Join failure
    /// is logged as a warning, never fatal — the node starts alone and
    /// waits for peers to find it.
    pub async fn create(
        bind_addr: &str,
        bind_port: u16,
        local_name: &str,
        seed_peers: &[String],
    ) -> Result<Self> {
        let listen_addr: SocketAddr = format!("{bind_addr}:{bind_port}")
            .parse()
            .with_context(|| format!("invalid bind address '{bind_addr}:{bind_port}'"))?;

        let chitchat_id = ChitchatId::new(local_name.to_string(), 0, listen_addr);

        let filtered: Vec<String> = seed_peers
            .iter()
            .filter(|p| p.as_str() != local_name && p.as_str() != bind_addr)
            .cloned()
            .collect();

        let config = ChitchatConfig {
            cluster_id: "replwarden".to_string(),
            chitchat_id: chitchat_id.clone(),
            gossip_interval: Duration::from_secs(1),
            listen_addr,
            seed_nodes: filtered,
            failure_detector_config: FailureDetectorConfig::default(),
            marked_for_deletion_grace_period: Duration::from_secs(60 * 60),
            catchup_callback: None,
        };

        let handle = spawn_chitchat(config, Vec::new(), &UdpTransport)
            .await
            .context("unable to create gossip cluster")?;

        let local = Member {
            name: local_name.to_string(),
            ip_address: bind_addr.to_string(),
            status: MemberStatus::Alive,
        };

        let live_members = Arc::new(parking_lot::RwLock::new(vec![local.clone()]));
        spawn_membership_poller(handle.chitchat(), live_members.clone(), local);

        Ok(ChitchatMembership {
            handle,
            local_name: local_name.to_string(),
            local_ip: bind_addr.to_string(),
            live_members,
        })
    }
}

/// Polls the chitchat instance's live-node view once per second and
/// publishes a snapshot into `live_members`, so synchronous callers (the
/// elector, the debug tick) never need to await a lock.
///
/// `chitchat::Chitchat::live_nodes()` is the library's peer-only
/// failure-detector view — it never reports the local node, and it drops a
/// node the moment it stops being live rather than reporting it as
/// `Failed` (§3 "Member lifecycle"). This mirrors the
/// known-minus-current bookkeeping other gossip-backed cluster managers in
/// this codebase use to detect departures: `known` accumulates every name
/// ever seen live; a name that was live and has since dropped out of
/// `live_nodes()` is kept in the snapshot as `Failed` instead of vanishing,
/// and `local` is always present so `members()` matches Serf's
/// `Members()` contract of always including the local node.
fn spawn_membership_poller(
    chitchat: Arc<tokio::sync::Mutex<chitchat::Chitchat>>,
    live_members: Arc<parking_lot::RwLock<Vec<Member>>>,
    local: Member,
) {
    tokio::spawn(async move {
        let mut known: std::collections::HashMap<String, Member> = std::collections::HashMap::new();
        let mut tick = tokio::time::interval(Duration::from_secs(1));
        loop {
            tick.tick().await;
            let guard = chitchat.lock().await;
            let current: Vec<Member> = guard
                .live_nodes()
                .filter(|node_id| node_id.node_id != local.name)
                .map(|node_id| Member {
                    name: node_id.node_id.clone(),
                    ip_address: node_id.gossip_advertise_addr.ip().to_string(),
                    status: MemberStatus::Alive,
                })
                .collect();
            drop(guard);

            let current_names: std::collections::HashSet<&str> =
                current.iter().map(|m| m.name.as_str()).collect();
            for (name, member) in known.iter_mut() {
                if !current_names.contains(name.as_str()) {
                    member.status = MemberStatus::Failed;
                }
            }
            for member in current {
                known.insert(member.name.clone(), member);
            }

            let mut snapshot: Vec<Member> = known.values().cloned().collect();
            snapshot.push(local.clone());
            *live_members.write() = snapshot;
        }
    });
}

#[async_trait]
impl GossipCluster for ChitchatMembership {
    fn local_member(&self) -> Member {
        Member {
            name: self.local_name.clone(),
            ip_address: self.local_ip.clone(),
            status: MemberStatus::Alive,
        }
    }

    /// Always includes the local node, plus every peer the gossip poller
    /// has ever seen alive — failed/departed peers are kept with
    /// `status == Failed` rather than dropped, per the §3 Member lifecycle.
    fn members(&self) -> Vec<Member> {
        self.live_members.read().clone()
    }

    fn num_nodes(&self) -> usize {
        self.live_members.read().len()
    }

    async fn leave(&self) {
        if let Err(err) = self.handle.shutdown().await {
            warn!(error = %err, "error leaving gossip cluster");
        }
    }
}

/// Thread-safe handle shared between the control loop, notifier, and HTTP
/// surface.
pub type SharedCluster = Arc<dyn GossipCluster>;

/// Convenience used by tests and the control loop's debug tick: members
/// excluding the local node and anything not `alive`.
pub fn other_live_members(cluster: &dyn GossipCluster) -> Vec<Member> {
    let local = cluster.local_member();
    cluster
        .members()
        .into_iter()
        .filter(|m| m.status == MemberStatus::Alive && m.name != local.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeCluster {
        local: Member,
        members: Vec<Member>,
    }

    #[async_trait]
    impl GossipCluster for FakeCluster {
        fn local_member(&self) -> Member {
            self.local.clone()
        }
        fn members(&self) -> Vec<Member> {
            self.members.clone()
        }
        fn num_nodes(&self) -> usize {
            self.members.len()
        }
        async fn leave(&self) {}
    }

    #[test]
    fn other_live_members_excludes_self_and_non_alive() {
        let local = Member {
            name: "n1".into(),
            ip_address: "10.0.0.1".into(),
            status: MemberStatus::Alive,
        };
        let cluster = FakeCluster {
            local: local.clone(),
            members: vec![
                local,
                Member {
                    name: "n2".into(),
                    ip_address: "10.0.0.2".into(),
                    status: MemberStatus::Alive,
                },
                Member {
                    name: "n3".into(),
                    ip_address: "10.0.0.3".into(),
                    status: MemberStatus::Failed,
                },
            ],
        };
        let others = other_live_members(&cluster);
        assert_eq!(others.len(), 1);
        assert_eq!(others[0].name, "n2");
    }
}

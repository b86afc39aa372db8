// src/core/elector.rs

//! Deterministic leader election over the gossip member set.
//!
//! Grounded on `original_source/leader.go: leaderCheck`, with the tie-break
//! redesign from `spec.md` §9 applied: collisions on octet-sum score are
//! broken lexically on `(score, name)` rather than the gossip library's
//! member-enumeration order, which the spec explicitly flags as
//! non-deterministic and not worth preserving.

use tracing::{debug, info};

use crate::core::counter::SharedCounter;
use crate::core::membership::{GossipCluster, Member, MemberStatus};

/// Sum of the four dotted-decimal octets of an IPv4 address. Addresses that
/// don't parse as four octets score zero, same as a non-alive member.
fn octet_score(ip_address: &str) -> i64 {
    let parts: Vec<&str> = ip_address.split('.').collect();
    if parts.len() != 4 {
        return 0;
    }
    let mut total = 0i64;
    for part in parts {
        match part.parse::<i64>() {
            Ok(v) => total += v,
            Err(_) => return 0,
        }
    }
    total
}

fn score_of(member: &Member) -> i64 {
    match member.status {
        MemberStatus::Alive => octet_score(&member.ip_address),
        _ => 0,
    }
}

/// Picks the best `(score, name)` pair, breaking ties lexically on name
/// (the smaller name wins) — the deterministic redesign from `spec.md` §9.
fn best_candidate(members: &[Member]) -> (i64, String) {
    let mut best: Option<(i64, String)> = None;
    for m in members {
        let score = score_of(m);
        if score == 0 {
            continue;
        }
        let candidate = (score, m.name.clone());
        best = Some(match best {
            None => candidate,
            Some((best_score, best_name)) => {
                if score > best_score || (score == best_score && m.name < best_name) {
                    candidate
                } else {
                    (best_score, best_name)
                }
            }
        });
    }
    best.unwrap_or((0, String::new()))
}

/// Result of one election pass, reported to the control loop so it can
/// update its local `am_leader` flag.
pub struct ElectionOutcome {
    pub am_leader: bool,
}

/// Runs one `leader_check` tick: scores every member, and if the winner's
/// score differs from what the shared counter currently holds, either
/// claims leadership (bumping the counter) or steps down.
///
/// Per §4.5, a non-winning node never calls `counter.set` — the rightful
/// leader does, and the peer notifier propagates it.
pub fn run_election(cluster: &dyn GossipCluster, counter: &SharedCounter) -> ElectionOutcome {
    debug!("checking leader status");
    let members = cluster.members();
    let (best_score, best_name) = best_candidate(&members);
    debug!(leader_choice = %best_name, score = best_score, "leader candidate results");

    let current = counter.get();
    if current.value != best_score {
        info!(new_leader = %best_name, "changing leader");
        let local = cluster.local_member();
        if best_name == local.name {
            counter.set(best_score, best_name.clone());
            info!(node = %local.name, "i am the new leader");
            return ElectionOutcome { am_leader: true };
        }
        info!(node = %local.name, "i am not the new leader");
        return ElectionOutcome { am_leader: false };
    }

    let local = cluster.local_member();
    ElectionOutcome {
        am_leader: best_name == local.name && best_score != 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FakeCluster {
        local_name: String,
        members: Vec<Member>,
    }

    #[async_trait]
    impl GossipCluster for FakeCluster {
        fn local_member(&self) -> Member {
            self.members
                .iter()
                .find(|m| m.name == self.local_name)
                .cloned()
                .unwrap()
        }
        fn members(&self) -> Vec<Member> {
            self.members.clone()
        }
        fn num_nodes(&self) -> usize {
            self.members.len()
        }
        async fn leave(&self) {}
    }

    fn m(name: &str, ip: &str, status: MemberStatus) -> Member {
        Member {
            name: name.to_string(),
            ip_address: ip.to_string(),
            status,
        }
    }

    /// S4 — Leader election determinism.
    #[test]
    fn leader_election_is_deterministic_over_the_alive_set() {
        let cluster = FakeCluster {
            local_name: "n2".to_string(),
            members: vec![
                m("n1", "10.0.0.1", MemberStatus::Alive),
                m("n2", "10.0.0.5", MemberStatus::Alive),
                m("n3", "10.0.0.3", MemberStatus::Alive),
                m("n4", "10.0.0.99", MemberStatus::Failed),
            ],
        };
        let counter = SharedCounter::new();
        let outcome = run_election(&cluster, &counter);
        assert!(outcome.am_leader);
        assert_eq!(counter.get().value, 15);

        let cluster2 = FakeCluster {
            local_name: "n5".to_string(),
            members: vec![
                m("n1", "10.0.0.1", MemberStatus::Alive),
                m("n2", "10.0.0.5", MemberStatus::Failed),
                m("n3", "10.0.0.3", MemberStatus::Alive),
                m("n5", "10.0.0.10", MemberStatus::Alive),
            ],
        };
        let outcome2 = run_election(&cluster2, &counter);
        assert!(outcome2.am_leader);
        assert_eq!(counter.get().value, 20);
    }

    #[test]
    fn ties_break_lexically_on_name() {
        let members = vec![
            m("zeta", "10.0.0.5", MemberStatus::Alive),
            m("alpha", "10.0.5.0", MemberStatus::Alive),
        ];
        let (score, name) = best_candidate(&members);
        assert_eq!(score, 15);
        assert_eq!(name, "alpha");
    }

    #[test]
    fn failed_members_score_zero() {
        let members = vec![m("n1", "10.0.0.99", MemberStatus::Failed)];
        let (score, _) = best_candidate(&members);
        assert_eq!(score, 0);
    }
}

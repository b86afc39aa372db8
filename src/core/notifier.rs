// src/core/notifier.rs

//! Broadcasts the shared counter to a bounded window of other live members.
//!
//! Grounded on `original_source/main.go: notifyOthers/notifyMember/timeoutCancel`:
//! one task per notified peer, each raced against a hard deadline, the whole
//! batch run concurrently and awaited together. The Go errgroup + explicit
//! `time.AfterFunc` cancellation becomes `futures::future::join_all` over
//! tasks individually wrapped in `tokio::time::timeout`.

use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::core::membership::Member;
use crate::core::metrics::{PEER_NOTIFICATIONS_SENT_TOTAL, PEER_NOTIFICATIONS_TIMEOUT_TOTAL};

/// At most this many peers are notified per broadcast pass.
const MEMBERS_TO_NOTIFY: usize = 2;

/// Hard per-call deadline; on expiry the call is abandoned and logged.
const NOTIFY_TIMEOUT: Duration = Duration::from_secs(3);

/// Picks the notification targets for this pass.
///
/// If `others.len() <= K` every member is notified; otherwise a uniformly
/// random start index selects a contiguous window of `K` members, wrapping
/// modulo the list length.
fn pick_targets(others: &[Member]) -> Vec<Member> {
    if others.len() <= MEMBERS_TO_NOTIFY {
        return others.to_vec();
    }
    let n = others.len();
    let start = rand::thread_rng().gen_range(0..n);
    (0..MEMBERS_TO_NOTIFY)
        .map(|i| others[(start + i) % n].clone())
        .collect()
}

/// Sends `POST /notify/{value}/{generation}?notifier={local_name}` to one
/// peer, bounded by [`NOTIFY_TIMEOUT`]. Never returns an error to the
/// caller — failures are logged and absorbed, per §4.3's "never blocks the
/// next tick" contract.
async fn notify_member(
    client: &reqwest::Client,
    api_port: &str,
    local_name: &str,
    value: i64,
    generation: u64,
    member: &Member,
) {
    let url = format!(
        "http://{}:{}/notify/{}/{}?notifier={}",
        member.ip_address, api_port, value, generation, local_name
    );
    debug!(notifier = local_name, recipient = %member.name, "sending peer notification");

    let call = client.post(&url).send();
    match tokio::time::timeout(NOTIFY_TIMEOUT, call).await {
        Ok(Ok(resp)) => {
            PEER_NOTIFICATIONS_SENT_TOTAL.inc();
            debug!(recipient = %member.name, status = %resp.status(), "member notification successful");
        }
        Ok(Err(err)) => {
            warn!(recipient = %member.name, error = %err, "error notifying member");
        }
        Err(_) => {
            PEER_NOTIFICATIONS_TIMEOUT_TOTAL.inc();
            warn!(recipient = %member.name, notifier = local_name, "context deadline exceeded notifying member");
        }
    }
}

/// Runs one notification pass over `others`, concurrently, to completion.
///
/// `others` must already be the live, non-local member set (see
/// [`crate::core::membership::other_live_members`]); this function applies
/// only the K-window selection on top of it.
pub async fn notify_others(
    client: &reqwest::Client,
    api_port: &str,
    local_name: &str,
    others: &[Member],
    value: i64,
    generation: u64,
) {
    let targets = pick_targets(others);
    let calls = targets
        .iter()
        .map(|m| notify_member(client, api_port, local_name, value, generation, m));
    futures::future::join_all(calls).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::membership::MemberStatus;

    fn member(name: &str) -> Member {
        Member {
            name: name.to_string(),
            ip_address: "127.0.0.1".to_string(),
            status: MemberStatus::Alive,
        }
    }

    #[test]
    fn pick_targets_notifies_everyone_when_at_or_under_k() {
        let others = vec![member("n1"), member("n2")];
        let targets = pick_targets(&others);
        assert_eq!(targets.len(), 2);
    }

    #[test]
    fn pick_targets_picks_a_bounded_window_when_over_k() {
        let others = vec![member("n1"), member("n2"), member("n3"), member("n4")];
        let targets = pick_targets(&others);
        assert_eq!(targets.len(), MEMBERS_TO_NOTIFY);
    }
}

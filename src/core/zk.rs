// src/core/zk.rs

//! ZooKeeper inventory reader.
//!
//! Grounded on `original_source/zk.go` (connect/validate, retrying
//! `Children` listing) and `original_source/ops.go: getZKTarget` (datacenter
//! target resolution, including the `"adhoc"` sentinel). Backed by
//! `zookeeper-async`, a tokio-friendly ZooKeeper client, replacing the
//! original's `github.com/jbvmio/zk`.

use std::time::Duration;

use tracing::error;
use zookeeper_async::{WatchedEvent, Watcher, ZooKeeper};

const TOPICS_PATH: &str = "/CONFIGS/RESOURCE";
const BLACKLIST_PATH: &str = "/BLACKLISTED_TOPICS";

const RETRY_ATTEMPTS: usize = 3;
const RETRY_SLEEP: Duration = Duration::from_millis(333);

/// A no-op watcher; this reader never registers watches, it only lists
/// children on demand each reconcile pass.
struct NoopWatcher;

impl Watcher for NoopWatcher {
    fn handle(&self, _event: WatchedEvent) {}
}

/// Connected ZooKeeper client plus the resolved per-datacenter target for
/// one reconcile pass. Scoped to a single pass, never stored process-wide
/// (§9 "shared-resource discipline").
pub struct ZkReader {
    client: ZooKeeper,
    zk_root: String,
    target: String,
}

impl ZkReader {
    /// Connects and verifies the server by checking that `/` exists,
    /// failing closed on any error (§4.6 `launch`).
    pub async fn connect(zk_address: &str, zk_root: &str, cluster_name: &str) -> anyhow::Result<Self> {
        let client = ZooKeeper::connect(zk_address, Duration::from_secs(15), NoopWatcher)
            .await
            .map_err(|e| anyhow::anyhow!("error validating zookeeper configuration: {e}"))?;

        let exists = client
            .exists(&["/"].concat(), false)
            .await
            .map_err(|e| anyhow::anyhow!("error validating zookeeper configuration: {e}"))?;
        if exists.is_none() {
            anyhow::bail!("error validating zookeeper configuration: {zk_address}");
        }

        let target = resolve_target(&client, zk_root, cluster_name).await?;

        Ok(ZkReader {
            client,
            zk_root: zk_root.to_string(),
            target,
        })
    }

    pub async fn list_configured(&self) -> Vec<String> {
        let path = format!("{}/{}{TOPICS_PATH}", self.zk_root, self.target);
        list_children(&self.client, &path).await
    }

    pub async fn list_blacklisted(&self) -> Vec<String> {
        let path = format!("{}/{}{BLACKLIST_PATH}", self.zk_root, self.target);
        list_children(&self.client, &path).await
    }
}

/// Lists children with a shallow, fixed-interval retry. Final failure
/// returns an empty list and logs an error — it never raises, because
/// reconcile is periodic and a transient failure resolves on the next
/// tick (§9 "Retry policy").
async fn list_children(client: &ZooKeeper, path: &str) -> Vec<String> {
    let mut last_err = None;
    for attempt in 0..RETRY_ATTEMPTS {
        match client.get_children(path, false).await {
            Ok(children) => return children,
            Err(err) => {
                last_err = Some(err);
                if attempt + 1 < RETRY_ATTEMPTS {
                    tokio::time::sleep(RETRY_SLEEP).await;
                }
            }
        }
    }
    if let Some(err) = last_err {
        error!(path, error = %err, "error retrieving path, retrying");
    }
    Vec::new()
}

/// Resolves the replication target directory under `zk_root` (§4.6
/// `resolve_target`).
async fn resolve_target(client: &ZooKeeper, zk_root: &str, cluster_name: &str) -> anyhow::Result<String> {
    let dcs = list_children(client, zk_root).await;

    if dcs.is_empty() {
        anyhow::bail!("No DC Replications Found");
    }

    if cluster_name == "adhoc" {
        return if dcs.len() == 1 {
            Ok(dcs[0].clone())
        } else {
            anyhow::bail!("Multiple Replications Found: {dcs:?}")
        };
    }

    dcs.into_iter()
        .find(|dc| dc == cluster_name)
        .ok_or_else(|| anyhow::anyhow!("No Replications found for {cluster_name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_and_blacklist_suffixes_match_original_layout() {
        assert_eq!(TOPICS_PATH, "/CONFIGS/RESOURCE");
        assert_eq!(BLACKLIST_PATH, "/BLACKLISTED_TOPICS");
    }
}

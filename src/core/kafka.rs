// src/core/kafka.rs

//! Kafka topic inventory reader.
//!
//! Grounded on `original_source/kafka.go` (independent source/destination
//! clients, both-must-succeed connect) and `original_source/ops.go:
//! whitelistTopics` (partition counts from source metadata). Backed by
//! `rdkafka`, the Kafka client crate the retrieval pack's
//! `sunjudev0213-materialize` workspace also depends on.

use std::collections::HashMap;
use std::time::Duration;

use rdkafka::ClientConfig;
use rdkafka::consumer::{BaseConsumer, Consumer};

const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// One connected metadata client, paired with the broker it talks to.
pub struct KafkaReader {
    consumer: BaseConsumer,
}

impl KafkaReader {
    fn connect(broker: &str) -> anyhow::Result<Self> {
        let consumer: BaseConsumer = ClientConfig::new()
            .set("bootstrap.servers", broker)
            .set("client.id", "replwarden")
            .create()
            .map_err(|e| anyhow::anyhow!("error connecting to kafka cluster '{broker}': {e}"))?;
        Ok(KafkaReader { consumer })
    }

    /// Lists the topic names currently visible in cluster metadata (§4.7
    /// `list_topics`).
    pub fn list_topics(&self) -> anyhow::Result<Vec<String>> {
        let metadata = self
            .consumer
            .fetch_metadata(None, METADATA_TIMEOUT)
            .map_err(|e| anyhow::anyhow!("unable to list kafka topics: {e}"))?;
        Ok(metadata
            .topics()
            .iter()
            .map(|t| t.name().to_string())
            .collect())
    }

    /// Partition counts per topic, used only by the whitelist path (§4.7
    /// `topic_partition_counts`).
    pub fn topic_partition_counts(&self) -> anyhow::Result<HashMap<String, usize>> {
        let metadata = self
            .consumer
            .fetch_metadata(None, METADATA_TIMEOUT)
            .map_err(|e| anyhow::anyhow!("unable to list kafka topics: {e}"))?;
        Ok(metadata
            .topics()
            .iter()
            .map(|t| (t.name().to_string(), t.partitions().len()))
            .collect())
    }
}

/// Opens both metadata clients. Both must succeed or the whole reconcile
/// pass aborts with a logged error (§4.7 `connect`, §7 tier 2).
pub fn connect(src_broker: &str, dst_broker: &str) -> anyhow::Result<(KafkaReader, KafkaReader)> {
    let src = KafkaReader::connect(src_broker)
        .map_err(|e| anyhow::anyhow!("error connecting to source kafka cluster: {e}"))?;
    let dst = KafkaReader::connect(dst_broker)
        .map_err(|e| anyhow::anyhow!("error connecting to destination kafka cluster: {e}"))?;
    Ok((src, dst))
}

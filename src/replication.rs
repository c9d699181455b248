//! The Replication Bus: best-effort synchronous broadcast of a newly
//! created topic's owners to every peer, so their Ownership Registries
//! agree. No retry, no anti-entropy — a peer that misses this rediscovers
//! the topic from its own on-disk metadata at startup instead
//! (spec.md §4.5, §9).

use crate::wire::InternalCreateTopicRequest;

pub async fn propagate_create_topic(
    client: &reqwest::Client,
    self_address: &str,
    peers: &[String],
    topic: &str,
    owners: &[String],
) {
    let body = InternalCreateTopicRequest {
        topic: topic.to_string(),
        owners: owners.to_vec(),
    };

    for peer in peers {
        if peer == self_address {
            continue;
        }
        let url = format!("http://{peer}/internal-create-topic");
        match client.post(&url).json(&body).send().await {
            Ok(resp) if !resp.status().is_success() => {
                tracing::warn!(peer, status = %resp.status(), "peer rejected internal-create-topic");
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(peer, %err, "failed to propagate topic creation to peer");
            }
        }
    }
}

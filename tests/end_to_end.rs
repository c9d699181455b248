//! End-to-end scenarios from spec.md §8 (S1-S6), run against a real
//! 3-broker cluster bound to ephemeral localhost ports within this test
//! process. Each broker is the exact `App`/router `kafka_lite::build_app`
//! and `kafka_lite::build_router` produce for the `broker` binary; only
//! the process-per-broker and fixed-port parts are swapped for an
//! in-process, hermetic harness.

use std::sync::Arc;

use kafka_lite::router::App;
use kafka_lite::wire::{
    ConsumeResponse, CreateTopicResponse, MetadataResponse, ProduceResponse,
    RegisterSchemaResponse,
};
use serde_json::json;
use tempfile::TempDir;

struct TestBroker {
    address: String,
    _data_dir: TempDir,
    handle: tokio::task::JoinHandle<()>,
}

async fn bind_ephemeral() -> (tokio::net::TcpListener, String) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = format!("127.0.0.1:{}", listener.local_addr().unwrap().port());
    (listener, addr)
}

async fn spawn_broker(id: u32, listener: tokio::net::TcpListener, address: String, peers: Vec<String>) -> TestBroker {
    let data_dir = TempDir::new().unwrap();
    let app = kafka_lite::build_app(id, address.clone(), peers, data_dir.path());
    let router = kafka_lite::build_router(app);
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    TestBroker {
        address,
        _data_dir: data_dir,
        handle,
    }
}

/// Restarts a broker against the *same* on-disk data directory, simulating
/// a process restart that must recover its owned partitions (S6).
async fn restart_broker(old: TestBroker, peers: Vec<String>, id: u32) -> TestBroker {
    old.handle.abort();
    let address = old.address.clone();
    let port: u16 = address.rsplit(':').next().unwrap().parse().unwrap();
    let data_dir = old._data_dir;

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await.unwrap();
    let app = kafka_lite::build_app(id, address.clone(), peers, data_dir.path());
    let router = kafka_lite::build_router(app);
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    TestBroker {
        address,
        _data_dir: data_dir,
        handle,
    }
}

#[tokio::test]
async fn end_to_end_scenarios() {
    let (l0, a0) = bind_ephemeral().await;
    let (l1, a1) = bind_ephemeral().await;
    let (l2, a2) = bind_ephemeral().await;
    let addrs = vec![a0.clone(), a1.clone(), a2.clone()];

    let b0 = spawn_broker(1, l0, a0.clone(), vec![a1.clone(), a2.clone()]).await;
    let mut b1 = spawn_broker(2, l1, a1.clone(), vec![a0.clone(), a2.clone()]).await;
    let b2 = spawn_broker(3, l2, a2.clone(), vec![a0.clone(), a1.clone()]).await;
    // Give the servers a moment to start accepting connections.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let client = reqwest::Client::new();

    // --- S1: create + produce + consume round trip ---------------------
    let resp = client
        .post(format!("http://{a0}/create-topic"))
        .json(&json!({"topic": "events", "partitions": 3}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: CreateTopicResponse = resp.json().await.unwrap();
    assert_eq!(body.status, "created");

    // Owner agreement: every node's metadata agrees, in partition order.
    let meta: MetadataResponse = client
        .get(format!("http://{a1}/metadata"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let parts = &meta.topic_partitions["events"].partitions;
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0].broker, a0);
    assert_eq!(parts[1].broker, a1);
    assert_eq!(parts[2].broker, a2);

    // Produce against the non-owner (broker 2, a2) for partition 1 (owned
    // by a1): must be forwarded transparently.
    let resp = client
        .post(format!("http://{a2}/produce"))
        .json(&json!({"topic": "events", "partition": 1, "message": "hello"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let produced: ProduceResponse = resp.json().await.unwrap();
    assert_eq!(produced.offset, 0);

    // Consume from yet another non-owner.
    let resp = client
        .get(format!("http://{a0}/consume?topic=events&partition=1&offset=0"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let consumed: ConsumeResponse = resp.json().await.unwrap();
    assert_eq!(consumed.offset, 0);
    assert_eq!(consumed.message, "hello");

    // --- S2: key-based partitioning is stable and increments -----------
    client
        .post(format!("http://{a0}/create-topic"))
        .json(&json!({"topic": "users", "partitions": 4}))
        .send()
        .await
        .unwrap();

    let expected_partition = kafka_lite::hash::fnv1a32("alice".as_bytes()) % 4;
    let resp1: ProduceResponse = client
        .post(format!("http://{a0}/produce"))
        .json(&json!({"topic": "users", "key": "alice", "message": "one"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let resp2: ProduceResponse = client
        .post(format!("http://{a0}/produce"))
        .json(&json!({"topic": "users", "key": "alice", "message": "two"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(resp2.offset, resp1.offset + 1);

    let owner_of_alice = &addrs[expected_partition as usize];
    let resp = client
        .get(format!(
            "http://{owner_of_alice}/consume?topic=users&partition={expected_partition}&offset={}",
            resp1.offset
        ))
        .send()
        .await
        .unwrap();
    let consumed: ConsumeResponse = resp.json().await.unwrap();
    assert_eq!(consumed.message, "one");

    // --- S3: round-robin keyless produces populate partitions in order -
    client
        .post(format!("http://{a0}/create-topic"))
        .json(&json!({"topic": "logs", "partitions": 2}))
        .send()
        .await
        .unwrap();

    let mut chosen_partitions = Vec::new();
    for i in 0..5 {
        let message = format!("m{i}");
        // The partition actually used is implied by where the message
        // ends up; read back via metadata + both partitions afterwards.
        client
            .post(format!("http://{a0}/produce"))
            .json(&json!({"topic": "logs", "message": message}))
            .send()
            .await
            .unwrap();
    }
    for partition in 0..2u32 {
        let len_resp = client
            .get(format!("http://{a0}/consume?topic=logs&partition={partition}&offset=0"))
            .send()
            .await
            .unwrap();
        if len_resp.status() == 200 {
            chosen_partitions.push(partition);
        }
    }
    // Partition 0 got ceil(5/2)=3 messages, partition 1 got 2: both were used.
    assert_eq!(chosen_partitions, vec![0, 1]);

    // --- S4: schema rejection --------------------------------------------
    let resp = client
        .post(format!("http://{a1}/register-schema"))
        .json(&json!({"topic": "events", "schema": {"type": "object", "required": ["id"]}}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: RegisterSchemaResponse = resp.json().await.unwrap();
    assert_eq!(body.status, "schema registered");

    let resp = client
        .post(format!("http://{a1}/produce"))
        .json(&json!({"topic": "events", "partition": 1, "message": "{\"x\":1}"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .post(format!("http://{a1}/produce"))
        .json(&json!({"topic": "events", "partition": 1, "message": "{\"id\":7}"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // A node with no schema for this topic accepts the same payload that
    // a1 would reject, since schema presence is local, not cluster-wide.
    let resp = client
        .post(format!("http://{a0}/produce"))
        .json(&json!({"topic": "events", "partition": 0, "message": "{\"x\":1}"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // --- S5: out-of-range consume is 204, not an error -------------------
    client
        .post(format!("http://{a0}/create-topic"))
        .json(&json!({"topic": "t", "partitions": 1}))
        .send()
        .await
        .unwrap();
    let resp = client
        .get(format!("http://{a0}/consume?topic=t&partition=0&offset=0"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    // --- S6: restart recovery --------------------------------------------
    b1 = restart_broker(b1, vec![a0.clone(), a2.clone()], 2).await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let resp = client
        .get(format!("http://{a1}/consume?topic=events&partition=1&offset=0"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let consumed: ConsumeResponse = resp.json().await.unwrap();
    assert_eq!(consumed.message, "hello");

    b0.handle.abort();
    b1.handle.abort();
    b2.handle.abort();
}

#[tokio::test]
async fn idempotent_creation_does_not_alter_owners() {
    let (l0, a0) = bind_ephemeral().await;
    let b0 = spawn_broker(1, l0, a0.clone(), vec![]).await;
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let client = reqwest::Client::new();
    client
        .post(format!("http://{a0}/create-topic"))
        .json(&json!({"topic": "t", "partitions": 3}))
        .send()
        .await
        .unwrap();
    let before: MetadataResponse = client
        .get(format!("http://{a0}/metadata"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // A second create-topic with a different partition count is a no-op.
    client
        .post(format!("http://{a0}/create-topic"))
        .json(&json!({"topic": "t", "partitions": 9}))
        .send()
        .await
        .unwrap();
    let after: MetadataResponse = client
        .get(format!("http://{a0}/metadata"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(
        before.topic_partitions["t"].partitions.len(),
        after.topic_partitions["t"].partitions.len()
    );

    b0.handle.abort();
}

#[allow(dead_code)]
fn assert_app_is_send_sync(_app: &Arc<App>) {}

//! JSON wire types for the HTTP surface (see spec.md §6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateTopicRequest {
    pub topic: String,
    pub partitions: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTopicResponse {
    pub status: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct InternalCreateTopicRequest {
    pub topic: String,
    pub owners: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RegisterSchemaRequest {
    pub topic: String,
    pub schema: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterSchemaResponse {
    pub status: String,
}

/// Carried through the forwarding path: the entry node fills in `partition`
/// before proxying to the owner, so the owner never re-routes (spec.md §4.4).
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProduceRequest {
    pub topic: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProduceResponse {
    pub offset: u64,
}

#[derive(Debug, Deserialize)]
pub struct ConsumeQuery {
    pub topic: String,
    pub partition: u32,
    pub offset: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConsumeResponse {
    pub offset: u64,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PartitionInfo {
    pub partition: u32,
    pub broker: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TopicMetadata {
    pub partitions: Vec<PartitionInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MetadataResponse {
    pub topic_partitions: std::collections::BTreeMap<String, TopicMetadata>,
}

#[derive(Debug, Serialize)]
pub struct ListTopicsResponse {
    pub topics: Vec<String>,
}

//! Shared, mutex-guarded broker state: the Ownership Registry, the
//! in-memory partition logs, the Schema Registry's compiled validators,
//! and the round-robin cursors. Ported from `internal/broker/types.go`'s
//! `Broker` struct, which guards exactly this set of maps behind one
//! `sync.Mutex` (spec.md §5).

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::BrokerError;
use crate::hash::fnv1a32;
use crate::schema::{self, CompiledSchema};
use crate::storage::PartitionStore;
use crate::wire::{MetadataResponse, PartitionInfo, TopicMetadata};

struct Inner {
    /// topic -> owner address per partition, length = partition count.
    ownership: HashMap<String, Vec<String>>,
    /// topic -> partition -> messages. Only owned partitions are ever
    /// appended to; non-owned partitions exist as empty, unused vectors.
    topics: HashMap<String, Vec<Vec<String>>>,
    schemas: HashMap<String, Arc<CompiledSchema>>,
    round_robin: HashMap<String, usize>,
}

pub struct BrokerState {
    pub id: u32,
    pub address: String,
    pub peers: Vec<String>,
    pub store: PartitionStore,
    inner: Mutex<Inner>,
}

impl BrokerState {
    pub fn new(id: u32, address: String, peers: Vec<String>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            id,
            address,
            peers,
            store: PartitionStore::new(data_dir),
            inner: Mutex::new(Inner {
                ownership: HashMap::new(),
                topics: HashMap::new(),
                schemas: HashMap::new(),
                round_robin: HashMap::new(),
            }),
        }
    }

    /// `[self] ++ peers`, in the order owners are computed over
    /// (spec.md §4.1).
    fn all_addresses(&self) -> Vec<String> {
        let mut all = Vec::with_capacity(self.peers.len() + 1);
        all.push(self.address.clone());
        all.extend(self.peers.iter().cloned());
        all
    }

    /// Computes a fresh owners vector by round-robin over `[self] ++
    /// peers`, without installing anything. The caller (the external
    /// `/create-topic` path) installs locally, then propagates this exact
    /// vector to every peer so they agree (spec.md §4.1).
    pub fn compute_owners(&self, partition_count: u32) -> Vec<String> {
        let all = self.all_addresses();
        (0..partition_count)
            .map(|i| all[(i as usize) % all.len()].clone())
            .collect()
    }

    /// Installs a topic with exactly the given owners. Idempotent: a
    /// second install for an already-present topic is a silent no-op
    /// (spec.md §4.1, §4.6). Recovers on-disk state for any partition this
    /// node owns.
    pub fn install_topic(&self, topic: &str, owners: Vec<String>) {
        let mut inner = self.inner.lock().unwrap();
        if inner.ownership.contains_key(topic) {
            return;
        }

        let partitions = owners
            .iter()
            .enumerate()
            .map(|(i, owner)| {
                if *owner == self.address {
                    self.store.recover(topic, i as u32).unwrap_or_else(|err| {
                        tracing::warn!(topic, partition = i, %err, "failed to recover partition log, starting empty");
                        Vec::new()
                    })
                } else {
                    Vec::new()
                }
            })
            .collect();

        inner.ownership.insert(topic.to_string(), owners.clone());
        inner.topics.insert(topic.to_string(), partitions);
        drop(inner);

        if let Err(err) = crate::persistence::save_owners(self.store.data_dir(), topic, &owners) {
            tracing::warn!(topic, %err, "failed to persist topic metadata");
        }
    }

    pub fn owners(&self, topic: &str) -> Option<Vec<String>> {
        self.inner.lock().unwrap().ownership.get(topic).cloned()
    }

    pub fn list_topics(&self) -> Vec<String> {
        self.inner.lock().unwrap().ownership.keys().cloned().collect()
    }

    pub fn metadata(&self) -> MetadataResponse {
        let inner = self.inner.lock().unwrap();
        let mut topic_partitions = BTreeMap::new();
        for (topic, owners) in inner.ownership.iter() {
            let partitions = owners
                .iter()
                .enumerate()
                .map(|(partition, broker)| PartitionInfo {
                    partition: partition as u32,
                    broker: broker.clone(),
                })
                .collect();
            topic_partitions.insert(topic.clone(), TopicMetadata { partitions });
        }
        MetadataResponse { topic_partitions }
    }

    /// Compiles and installs a schema, replacing any prior one for this
    /// topic. Registration is local-only and never propagated
    /// (spec.md §4.3, §9: frozen, non-replicated by design).
    pub fn register_schema(&self, topic: &str, doc: serde_json::Value) -> Result<(), BrokerError> {
        let compiled = Arc::new(CompiledSchema::compile(doc.clone())?);
        self.inner
            .lock()
            .unwrap()
            .schemas
            .insert(topic.to_string(), compiled);

        if let Err(err) = schema::persist(self.store.data_dir(), topic, &doc) {
            tracing::warn!(topic, %err, "failed to persist schema to disk");
        }
        Ok(())
    }

    pub fn load_schemas(&self) {
        let loaded = schema::load_all(self.store.data_dir());
        let mut inner = self.inner.lock().unwrap();
        for (topic, compiled) in loaded {
            inner.schemas.insert(topic, Arc::new(compiled));
        }
    }

    /// Recovers any topic this node has on-disk metadata for, restoring
    /// ownership awareness even when propagation from the coordinator was
    /// missed (spec.md §9: self-correction from local metadata).
    pub fn load_topics(&self) {
        for topic in crate::persistence::list_persisted_topics(self.store.data_dir()) {
            match crate::persistence::load_owners(self.store.data_dir(), &topic) {
                Ok(owners) => self.install_topic(&topic, owners),
                Err(err) => tracing::warn!(topic, %err, "failed to load persisted topic metadata"),
            }
        }
    }

    /// Validates a produce payload against any schema registered for this
    /// topic on this node. No schema registered means "ok" (spec.md §4.3).
    pub fn validate_produce(&self, topic: &str, message: &str) -> Result<(), BrokerError> {
        let schema = self.inner.lock().unwrap().schemas.get(topic).cloned();
        match schema {
            Some(schema) => schema.validate(message),
            None => Ok(()),
        }
    }

    /// Resolves the partition to produce to, in spec.md §4.4's priority
    /// order: explicit, then key hash, then the node-local round-robin
    /// cursor (mutated here, never synchronized across the cluster).
    pub fn select_partition(
        &self,
        topic: &str,
        partition_count: u32,
        explicit: Option<u32>,
        key: Option<&str>,
    ) -> Result<u32, BrokerError> {
        if let Some(partition) = explicit {
            return if partition < partition_count {
                Ok(partition)
            } else {
                Err(BrokerError::Input(format!(
                    "partition {partition} out of range [0, {partition_count})"
                )))
            };
        }

        if let Some(key) = key.filter(|k| !k.is_empty()) {
            return Ok(fnv1a32(key.as_bytes()) % partition_count);
        }

        let mut inner = self.inner.lock().unwrap();
        let cursor = inner.round_robin.entry(topic.to_string()).or_insert(0);
        let chosen = *cursor as u32 % partition_count;
        *cursor = (*cursor + 1) % partition_count as usize;
        Ok(chosen)
    }

    /// Appends to the in-memory log and assigns the offset. The critical
    /// section is exactly the memory mutation (spec.md §5 step 1-3); the
    /// caller persists to disk afterwards, outside any lock.
    pub fn append_in_memory(
        &self,
        topic: &str,
        partition: u32,
        message: String,
    ) -> Result<u64, BrokerError> {
        let mut inner = self.inner.lock().unwrap();
        let partitions = inner.topics.get_mut(topic).ok_or(BrokerError::NotFound)?;
        let slice = partitions
            .get_mut(partition as usize)
            .ok_or(BrokerError::NotFound)?;
        slice.push(message);
        Ok(slice.len() as u64 - 1)
    }

    pub fn read(&self, topic: &str, partition: u32, offset: u64) -> Result<Option<String>, BrokerError> {
        let inner = self.inner.lock().unwrap();
        let partitions = inner.topics.get(topic).ok_or(BrokerError::NotFound)?;
        let slice = partitions
            .get(partition as usize)
            .ok_or(BrokerError::NotFound)?;
        Ok(slice.get(offset as usize).cloned())
    }

    pub fn length(&self, topic: &str, partition: u32) -> Result<u64, BrokerError> {
        let inner = self.inner.lock().unwrap();
        let partitions = inner.topics.get(topic).ok_or(BrokerError::NotFound)?;
        let slice = partitions
            .get(partition as usize)
            .ok_or(BrokerError::NotFound)?;
        Ok(slice.len() as u64)
    }
}

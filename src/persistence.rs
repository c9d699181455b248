//! Topic metadata persistence: `data/<topic>.meta.json`, ported from
//! `SaveTopicMetadata` / `LoadAllTopicMetadata` (referenced but not
//! retained in the original source's surviving drafts; the format below
//! follows spec.md §6 directly).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct TopicMeta {
    topic: String,
    owners: Vec<String>,
}

fn meta_path(data_dir: &Path, topic: &str) -> PathBuf {
    data_dir.join(format!("{topic}.meta.json"))
}

pub fn save_owners(data_dir: &Path, topic: &str, owners: &[String]) -> std::io::Result<()> {
    std::fs::create_dir_all(data_dir)?;
    let meta = TopicMeta {
        topic: topic.to_string(),
        owners: owners.to_vec(),
    };
    let text = serde_json::to_vec_pretty(&meta).expect("TopicMeta always serializes");
    std::fs::write(meta_path(data_dir, topic), text)
}

pub fn load_owners(data_dir: &Path, topic: &str) -> Result<Vec<String>, String> {
    let bytes = std::fs::read(meta_path(data_dir, topic)).map_err(|e| e.to_string())?;
    let meta: TopicMeta = serde_json::from_slice(&bytes).map_err(|e| e.to_string())?;
    Ok(meta.owners)
}

/// Scans `data_dir` for `*.meta.json` files, returning the topic names.
/// Used at startup so a node can rediscover the topics it owns even if it
/// missed a peer's propagation (spec.md §9).
pub fn list_persisted_topics(data_dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(data_dir) else {
        return Vec::new();
    };
    entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name();
            let name = name.to_str()?;
            name.strip_suffix(".meta.json").map(str::to_string)
        })
        .collect()
}

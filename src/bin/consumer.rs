//! Interactive consumer tail. A thin external collaborator (spec.md §1):
//! polls `/consume`, sleeping on 204/error, since out-of-range consume is
//! a normal condition, not an error (spec.md §7). Ported from
//! `internal/client/client.go`'s `RunConsumer`.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use clap::Parser;
use kafka_lite::wire::{ConsumeResponse, MetadataResponse};

#[derive(Debug, Parser)]
#[command(about, version)]
struct Cli {
    /// host:port of any broker; used to resolve topic metadata.
    #[arg(long, default_value = "localhost:8080", env = "BROKER_META")]
    meta: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    let topic = prompt("Enter topic: ", &mut lines)?;

    let meta: MetadataResponse = client
        .get(format!("http://{}/metadata", cli.meta))
        .send()
        .await?
        .json()
        .await?;

    let partitions = meta
        .topic_partitions
        .get(&topic)
        .map(|t| t.partitions.as_slice())
        .unwrap_or(&[]);
    println!("Partitions:");
    for p in partitions {
        println!("  {} on {}", p.partition, p.broker);
    }

    let partition: u32 = prompt("Partition?> ", &mut lines)?.trim().parse()?;

    let mut offset: u64 = 0;
    loop {
        let url = format!(
            "http://{}/consume?topic={topic}&partition={partition}&offset={offset}",
            cli.meta
        );
        let resp = match client.get(&url).send().await {
            Ok(resp) => resp,
            Err(_) => {
                tokio::time::sleep(Duration::from_millis(500)).await;
                continue;
            }
        };
        if resp.status() == reqwest::StatusCode::NO_CONTENT {
            tokio::time::sleep(Duration::from_millis(500)).await;
            continue;
        }
        if !resp.status().is_success() {
            tokio::time::sleep(Duration::from_secs(1)).await;
            continue;
        }

        let data: ConsumeResponse = resp.json().await?;
        println!("[Offset {}] {}", data.offset, data.message);
        offset += 1;
    }
}

fn prompt(label: &str, lines: &mut impl Iterator<Item = io::Result<String>>) -> anyhow::Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    Ok(lines.next().transpose()?.unwrap_or_default().trim().to_string())
}

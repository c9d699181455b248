//! Interactive producer REPL. A thin external collaborator (spec.md §1):
//! it drives `/metadata` and `/produce` over HTTP and has no access to
//! broker internals. Ported from `internal/client/client.go`'s
//! `RunProducer`.

use std::io::{self, BufRead, Write};

use clap::Parser;
use kafka_lite::wire::{MetadataResponse, ProduceRequest, ProduceResponse};

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

    println!("Type messages (or 'exit'):");
    loop {
        let text = prompt("> ", &mut lines)?;
        if text == "exit" {
            break;
        }

        let req = ProduceRequest {
            topic: topic.clone(),
            message: text,
            key: None,
            partition: Some(partition),
        };
        let resp = client
            .post(format!("http://{}/produce", cli.meta))
            .json(&req)
            .send()
            .await?;
        if resp.status().is_success() {
            let out: ProduceResponse = resp.json().await?;
            println!("offset: {}", out.offset);
        } else {
            println!("produce failed: {}", resp.status());
        }
    }
    Ok(())
}

fn prompt(label: &str, lines: &mut impl Iterator<Item = io::Result<String>>) -> anyhow::Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    Ok(lines.next().transpose()?.unwrap_or_default().trim().to_string())
}

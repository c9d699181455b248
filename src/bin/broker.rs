//! The `broker` binary: runs a single broker node, or — with `--count` —
//! self-spawns a local cluster of them. Ported from
//! `cmd/kafka-lite-cluster/main.go`'s `main()`, in the `dekaf::Cli`
//! clap-derive style.

use std::process::Command;

use clap::Parser;
use kafka_lite::build_app;

/// Runs a kafka-lite broker node.
#[derive(Debug, Parser)]
#[command(about, version)]
struct Cli {
    /// This broker's numeric id, used only for logging.
    #[arg(long, default_value_t = 1, env = "BROKER_ID")]
    id: u32,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080, env = "BROKER_PORT")]
    port: u16,

    /// Comma-separated addresses (host:port) of peer brokers.
    #[arg(long, default_value = "", env = "BROKER_PEERS", value_delimiter = ',')]
    peers: Vec<String>,

    /// Directory to store partition logs and metadata under.
    #[arg(long, default_value = "data", env = "BROKER_DATA_DIR")]
    data_dir: std::path::PathBuf,

    /// When set, self-spawns this many brokers on ports `8080..8080+N-1`,
    /// each wired with every other as a peer, instead of running one.
    #[arg(long, default_value_t = 0)]
    count: usize,

    /// Path to this binary, used when self-spawning a cluster.
    #[arg(long)]
    bin: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    kafka_lite::logging::install();
    let cli = Cli::parse();

    if cli.count > 1 {
        spawn_cluster(cli.count, cli.bin)?;
        return Ok(());
    }

    let peers: Vec<String> = cli.peers.into_iter().filter(|p| !p.is_empty()).collect();
    let address = format!("localhost:{}", cli.port);
    let app = build_app(cli.id, address.clone(), peers, cli.data_dir);

    tracing::info!(id = cli.id, %address, "broker starting");

    let router = kafka_lite::build_router(app);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", cli.port)).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

/// Self-spawns `count` broker processes on ports `8080..8080+count-1`,
/// each receiving every other broker's address as a peer. This is the
/// thin process-launcher wrapper spec.md §1 places out of core scope;
/// it only shells out, it implements no broker logic itself.
fn spawn_cluster(count: usize, bin: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let bin = match bin {
        Some(bin) => bin,
        None => std::env::current_exe()?,
    };

    let all_addrs: Vec<String> = (0..count).map(|i| format!("localhost:{}", 8080 + i)).collect();
    let mut children = Vec::with_capacity(count);

    for i in 0..count {
        let id = i + 1;
        let port = 8080 + i;
        let peers: Vec<&str> = all_addrs
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, addr)| addr.as_str())
            .collect();

        tracing::info!(id, port, peers = %peers.join(","), "starting broker");
        let child = Command::new(&bin)
            .arg(format!("--id={id}"))
            .arg(format!("--port={port}"))
            .arg(format!("--peers={}", peers.join(",")))
            .spawn();

        match child {
            Ok(child) => children.push(child),
            Err(err) => tracing::error!(id, %err, "failed to start broker"),
        }
        std::thread::sleep(std::time::Duration::from_millis(500));
    }

    for mut child in children {
        let _ = child.wait();
    }
    Ok(())
}

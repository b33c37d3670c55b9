//! Monitor relay.
//!
//! Reads log-like records from stdin, turns each into a readable message and
//! forwards it to a collector, never more than the configured number of
//! messages per second.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────────┐
//!                 │                      MONITOR RELAY                        │
//!                 │                                                           │
//!  producer       │  ┌────────┐   ┌──────────┐   ┌────────────┐   ┌────────┐ │   collector
//!  ── stdin ──────┼─▶│ source │──▶│ classify │──▶│ rate_limit │──▶│transport├─┼──▶ (Socket.IO)
//!                 │  └────────┘   └──────────┘   └────────────┘   └────────┘ │
//!                 │        └──────────── forwarder loop ─────────────┘        │
//!                 │                                                           │
//!                 │  config · lifecycle (signals, shutdown) · observability   │
//!                 └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Configuration
//! Environment: `CLIENTNAME`, `URL`, `PASSWORD`, `INTERFACE`,
//! `MAX_MESSAGES_PER_SECOND`. An optional TOML file (`--config`) sets the
//! same keys plus timings and observability; the environment wins.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "monitor-relay")]
#[command(about = "Forward piped log records to a collector with a per-second cap", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let code = monitor_relay::lifecycle::startup::run(cli.config.as_deref()).await;

    // The stdin reader thread cannot be cancelled; exit without waiting on it.
    std::process::exit(code);
}

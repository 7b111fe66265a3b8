//! `fleet-cli` -- a thin HTTP client mirroring the Fleet's REST surface
//! (`spec.md` §6) 1:1: submit a work order, trigger the simulated firmware
//! campaign, read aggregated state, or check health.
//!
//! Grounded on `src/bin/caxton-cli.rs`'s `clap::Parser` derive shape,
//! expanded with real subcommands since this binary has a user-facing
//! client role the teacher's stub never filled in.

use clap::{Parser, Subcommand};

/// Command-line client for the fleet control plane's HTTP surface.
#[derive(Parser)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Base URL of the Fleet HTTP API.
    #[arg(long, env = "FLEET_URL", default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check the Fleet's health endpoint.
    Health,
    /// Submit a work order.
    Submit {
        /// The area this order is routed to.
        #[arg(long)]
        area_id: String,
        /// Scheduling priority.
        #[arg(long, default_value_t = 1)]
        priority: i64,
        /// Raw JSON or text payload.
        #[arg(long, default_value = "")]
        payload: String,
        /// Optional RFC3339 deadline.
        #[arg(long)]
        deadline: Option<String>,
    },
    /// Trigger the simulated firmware campaign.
    Firmware {
        /// Submit this many plain work orders first so some robots are
        /// already BUSY and will defer the firmware update.
        #[arg(long, default_value_t = 0)]
        seed_busy: u32,
    },
    /// List work orders, most recent first.
    WorkOrders,
    /// Read fleet-wide aggregated state.
    State,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let client = reqwest::Client::new();

    let response = match args.command {
        Command::Health => client.get(format!("{}/health", args.url)).send().await?,
        Command::Submit { area_id, priority, payload, deadline } => {
            client
                .post(format!("{}/work_orders", args.url))
                .json(&serde_json::json!({
                    "area_id": area_id,
                    "priority": priority,
                    "payload": payload,
                    "deadline": deadline,
                }))
                .send()
                .await?
        }
        Command::Firmware { seed_busy } => {
            client
                .post(format!("{}/firmware/simulate", args.url))
                .json(&serde_json::json!({ "seed_busy": seed_busy }))
                .send()
                .await?
        }
        Command::WorkOrders => client.get(format!("{}/work_orders", args.url)).send().await?,
        Command::State => client.get(format!("{}/state", args.url)).send().await?,
    };

    let status = response.status();
    let body: serde_json::Value = response.json().await.unwrap_or(serde_json::Value::Null);
    println!("{}", serde_json::to_string_pretty(&body)?);
    if !status.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

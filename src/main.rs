//! `fleetplane` -- runs Fleet, Area, Zone, and Edge in one process over a
//! shared bus. Grounded on `original_source/cmd/all/main.go`'s dev/demo
//! entry point and the teacher's `tracing-subscriber` + `axum::serve`
//! bootstrap in `src/main.rs`.

use anyhow::Result;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("fleetplane=info".parse()?),
        )
        .init();

    info!("starting fleetplane control plane");

    let all_in_one = fleetplane::runtime::from_env().await?;
    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        let _ = signal::ctrl_c().await;
        info!("shutdown signal received");
        shutdown.cancel();
    });

    all_in_one.run(cancel).await?;
    info!("fleetplane shut down cleanly");
    Ok(())
}

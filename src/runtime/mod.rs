//! All-in-one process wiring: one shared bus, one Fleet, one Area, one
//! Zone, and an Edge layer sized either per-robot or as a single
//! simulator, depending on `SIMULATE_ROBOTS`.
//!
//! Grounded on `original_source/cmd/all/main.go`: the dev/demo entry point
//! that runs every layer in one process over a shared in-memory bus. Our
//! `EdgeNode` already generalizes the Go source's Gateway/Simulator split
//! (see `src/edge/mod.rs`), so there is no separate simulator type to
//! switch on here -- only the robot count construction differs.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::area::AreaController;
use crate::bus::memory::InMemoryBus;
use crate::bus::network::TcpBus;
use crate::bus::Bus;
use crate::edge::EdgeNode;
use crate::fleet::FleetService;
use crate::ids::{AreaId, RobotId, ZoneId};
use crate::time::{system_clock, SharedClock};
use crate::zone::ZoneController;

/// The robot count at or above which the Edge layer runs as a single
/// simulator rather than one task per robot, matching
/// `useSimulatorThreshold` in `original_source/cmd/all/main.go`.
pub const USE_SIMULATOR_THRESHOLD: usize = 25;

/// The largest `SIMULATE_ROBOTS` value accepted, matching the Go source's
/// `n <= 1000000` guard.
const MAX_SIMULATED_ROBOTS: usize = 1_000_000;

/// Fleet HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    /// Address the Fleet's `axum::Router` binds to.
    pub api_listen: String,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self { api_listen: "0.0.0.0:8080".to_string() }
    }
}

/// Area controller configuration: one area owning a fixed set of zones.
#[derive(Debug, Clone)]
pub struct AreaConfig {
    /// The area's identifier.
    pub area_id: AreaId,
    /// Zones this area routes work orders to.
    pub zones: Vec<ZoneId>,
}

impl Default for AreaConfig {
    fn default() -> Self {
        Self {
            area_id: AreaId::try_new("area-1".to_string()).expect("literal area id is never empty"),
            zones: vec![ZoneId::try_new("zone-1".to_string()).expect("literal zone id is never empty")],
        }
    }
}

/// Zone controller configuration: one zone owning a fixed set of robots.
#[derive(Debug, Clone)]
pub struct ZoneConfig {
    /// The zone's identifier.
    pub zone_id: ZoneId,
    /// Robots this zone dispatches commands to.
    pub robots: Vec<RobotId>,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            zone_id: ZoneId::try_new("zone-1".to_string()).expect("literal zone id is never empty"),
            robots: vec![RobotId::try_new("robot-1".to_string()).expect("literal robot id is never empty")],
        }
    }
}

/// Edge layer timing configuration.
#[derive(Debug, Clone)]
pub struct EdgeConfig {
    /// How often each robot publishes `RobotStatus`.
    pub status_interval: Duration,
    /// How long a simulated task or firmware phase takes.
    pub task_duration: Duration,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            status_interval: Duration::from_secs(2),
            task_duration: Duration::from_secs(2),
        }
    }
}

/// Reads `SIMULATE_ROBOTS` and, if set to a valid positive count, returns a
/// `robot-1..=N` override for the zone's robot set. Mirrors the Go source's
/// `os.Getenv("SIMULATE_ROBOTS")` handling in `cmd/all/main.go`.
fn simulated_robots_override() -> Option<Vec<RobotId>> {
    let raw = env::var("SIMULATE_ROBOTS").ok()?;
    let n: usize = raw.parse().ok()?;
    if n == 0 || n > MAX_SIMULATED_ROBOTS {
        return None;
    }
    info!(count = n, "simulation: using simulated robots (SIMULATE_ROBOTS={})", raw);
    Some(
        (1..=n)
            .map(|i| RobotId::try_new(format!("robot-{i}")).expect("generated id is never empty"))
            .collect(),
    )
}

/// Connects the configured bus transport: `MESSAGING_URL` unset or
/// `"memory"` selects the in-process bus, anything else is treated as a
/// broker URL for [`TcpBus`].
///
/// # Errors
///
/// Returns an error if a networked `MESSAGING_URL` fails to connect.
pub async fn connect_bus() -> Result<Arc<dyn Bus>, crate::bus::BusError> {
    match env::var("MESSAGING_URL") {
        Ok(url) if !url.is_empty() && url != "memory" => {
            info!(%url, "connecting to networked message bus");
            Ok(TcpBus::connect(&url).await?)
        }
        _ => Ok(Arc::new(InMemoryBus::new())),
    }
}

/// Everything the all-in-one process needs to run every layer.
pub struct AllInOne {
    /// The shared bus every layer publishes and subscribes through.
    pub bus: Arc<dyn Bus>,
    /// The Fleet service backing the HTTP surface.
    pub fleet: Arc<FleetService>,
    area: Arc<AreaController>,
    zone: Arc<ZoneController>,
    edge: Arc<EdgeNode>,
    fleet_config: FleetConfig,
}

impl AllInOne {
    /// Wires Fleet, Area, Zone, and Edge over `bus`, applying any
    /// `SIMULATE_ROBOTS` override to the zone's robot set.
    ///
    /// # Errors
    ///
    /// Returns an error if subscribing the Fleet's global-state aggregator
    /// fails.
    pub async fn wire(
        bus: Arc<dyn Bus>,
        fleet_config: FleetConfig,
        area_config: AreaConfig,
        zone_config: ZoneConfig,
        edge_config: EdgeConfig,
        clock: SharedClock,
    ) -> Result<Self, crate::error::FleetError> {
        let robots = simulated_robots_override().unwrap_or(zone_config.robots);
        if robots.len() >= USE_SIMULATOR_THRESHOLD {
            info!(count = robots.len(), zone_id = %zone_config.zone_id, "edge: running as simulator");
        } else {
            info!(count = robots.len(), zone_id = %zone_config.zone_id, "edge: running one task per robot");
        }

        let fleet = FleetService::new(bus.clone(), clock.clone());
        fleet.subscribe(&bus).await?;

        let area = AreaController::new(
            area_config.area_id,
            area_config.zones,
            bus.clone(),
            clock.clone(),
            Duration::from_secs(10),
        );

        let zone = ZoneController::new(
            zone_config.zone_id.clone(),
            robots.clone(),
            bus.clone(),
            clock.clone(),
            Duration::from_secs(5),
        );

        let edge = EdgeNode::new(
            zone_config.zone_id,
            robots,
            bus.clone(),
            clock,
            edge_config.status_interval,
            edge_config.task_duration,
        );

        Ok(Self { bus, fleet, area, zone, edge, fleet_config })
    }

    /// Spawns the Area, Zone, and Edge control loops, and serves the
    /// Fleet's HTTP surface, all under `cancel`. Returns once every task
    /// has shut down (on cancellation) or one has failed to bind/serve.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP listener fails to bind.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), std::io::Error> {
        let bus = self.bus.clone();
        let area = self.area.clone();
        let area_cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = area.run(bus, area_cancel).await {
                tracing::error!(%err, "area controller exited");
            }
        });

        let bus = self.bus.clone();
        let zone = self.zone.clone();
        let zone_cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = zone.run(bus, zone_cancel).await {
                tracing::error!(%err, "zone controller exited");
            }
        });

        let bus = self.bus.clone();
        let edge = self.edge.clone();
        let edge_cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = edge.run(bus, edge_cancel).await {
                tracing::error!(%err, "edge node exited");
            }
        });

        let app = crate::fleet::http::router(self.fleet);
        let listener = tokio::net::TcpListener::bind(&self.fleet_config.api_listen).await?;
        info!(addr = %self.fleet_config.api_listen, "fleet: API listening");
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await
    }
}

/// Builds an `AllInOne` process from environment variables and defaults,
/// using the real system clock.
///
/// # Errors
///
/// Returns an error if connecting the configured bus fails.
pub async fn from_env() -> Result<AllInOne, crate::error::FleetError> {
    let bus = connect_bus().await?;
    let mut fleet_config = FleetConfig::default();
    if let Ok(listen) = env::var("FLEET_API_LISTEN") {
        if !listen.is_empty() {
            fleet_config.api_listen = listen;
        }
    }
    AllInOne::wire(
        bus,
        fleet_config,
        AreaConfig::default(),
        ZoneConfig::default(),
        EdgeConfig::default(),
        system_clock(),
    )
    .await
}

//! The publish/subscribe bus connecting Fleet, Area, Zone, and Edge.
//!
//! A [`Bus`] is topic-partitioned, at-most-once, and fire-and-forget: publish
//! never blocks on a subscriber, and a subscriber that errors only loses its
//! own delivery. Two implementations exist: [`memory::InMemoryBus`] for a
//! single process, and [`network::TcpBus`] for a multi-process deployment.

pub mod memory;
pub mod network;
pub mod publishers;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub use publishers::{
    AreaSummaryPublisher, RobotCommandPublisher, RobotStatusPublisher, WorkOrderPublisher,
    ZoneSummaryPublisher, ZoneTaskPublisher,
};

/// Errors a [`Bus`] implementation can surface.
#[derive(Debug, Error)]
pub enum BusError {
    /// The underlying transport failed (connection reset, write failure, etc).
    #[error("transport error: {0}")]
    Transport(String),
    /// A message could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
    /// A subscriber's handler returned an error while processing a message.
    #[error("handler error: {0}")]
    Handler(String),
}

/// The well-known topics exchanged between layers.
///
/// Each variant maps to a stable wire name; `TcpBus` frames carry this name
/// verbatim so that a Rust and a hypothetical non-Rust peer could interoperate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Fleet -> Area: `WorkOrder` messages, keyed by `area_id`.
    WorkOrders,
    /// Area -> Zone: `ZoneTask` messages, keyed by `zone_id`.
    ZoneTasks,
    /// Zone -> Edge: `RobotCommand` messages, keyed by `robot_id`.
    RobotCommands,
    /// Edge -> Zone: `RobotStatus` messages, keyed by `robot_id`.
    RobotStatus,
    /// Zone -> Area: `ZoneSummary` messages, keyed by `zone_id`.
    ZoneSummary,
    /// Area -> Fleet: `AreaSummary` messages, keyed by `area_id`.
    AreaSummary,
}

impl Topic {
    /// The wire name for this topic, stable across processes.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WorkOrders => "fleet.work_orders",
            Self::ZoneTasks => "area.zone_tasks",
            Self::RobotCommands => "zone.robot_commands",
            Self::RobotStatus => "edge.robot_status",
            Self::ZoneSummary => "zone.summary",
            Self::AreaSummary => "area.summary",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives messages delivered to a subscribed topic.
///
/// Implementors should treat `key` as a routing hint only (e.g. for logging);
/// the bus does not use it to filter delivery, every subscriber on a topic
/// sees every message published to it.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handles one delivered message.
    async fn handle(&self, key: &str, value: &[u8]) -> Result<(), BusError>;
}

/// A pub/sub transport shared by every layer of the hierarchy.
#[async_trait]
pub trait Bus: Send + Sync {
    /// Publishes `value` to `topic`, fanning out to every current subscriber.
    async fn publish(&self, topic: Topic, key: &str, value: &[u8]) -> Result<(), BusError>;

    /// Registers `handler` to receive every future message published to `topic`.
    async fn subscribe(
        &self,
        topic: Topic,
        handler: std::sync::Arc<dyn MessageHandler>,
    ) -> Result<(), BusError>;
}

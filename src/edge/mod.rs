//! The Edge layer: one process (or one task, when many robots share a
//! process) per robot cell, executing commands and reporting status.
//!
//! Grounded on `original_source/internal/edge/{gateway,simulator}.go`.
//! Rather than keep Go's two separate types (`Gateway` for one robot,
//! `Simulator` for many), [`EdgeNode`] owns a [`DashMap`] of robots and
//! handles both shapes uniformly -- a deployment with one robot ID is just
//! a `DashMap` with one entry.

mod state;

pub use state::RobotRuntimeState;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::bus::{Bus, BusError, MessageHandler, RobotStatusPublisher, Topic};
use crate::ids::{ModelId, RobotId, ZoneId};
use crate::model::{
    CommandType, FirmwareRollbackPayload, FirmwareUpdatePayload, RobotCommand, RobotState,
    RobotStatus,
};
use crate::time::SharedClock;

use self::state::is_firmware_command;

/// Simulates the robots owned by one zone cell: executes `TASK` and
/// firmware commands, publishes periodic [`RobotStatus`].
pub struct EdgeNode {
    zone_id: ZoneId,
    robots: DashMap<RobotId, RobotRuntimeState>,
    status_pub: RobotStatusPublisher,
    clock: SharedClock,
    status_interval: Duration,
    task_duration: Duration,
}

impl EdgeNode {
    /// Creates a node owning `robot_ids`, all starting `IDLE` at the
    /// default simulated model/firmware version.
    #[must_use]
    pub fn new(
        zone_id: ZoneId,
        robot_ids: Vec<RobotId>,
        bus: Arc<dyn Bus>,
        clock: SharedClock,
        status_interval: Duration,
        task_duration: Duration,
    ) -> Arc<Self> {
        let robots = DashMap::new();
        for id in robot_ids {
            robots.insert(id, RobotRuntimeState::new());
        }
        Arc::new(Self {
            zone_id,
            robots,
            status_pub: RobotStatusPublisher::new(bus),
            clock,
            status_interval,
            task_duration,
        })
    }

    /// Subscribes to `zone.robot_commands` and runs the periodic status
    /// loop until `cancel` fires.
    pub async fn run(
        self: Arc<Self>,
        bus: Arc<dyn Bus>,
        cancel: CancellationToken,
    ) -> Result<(), BusError> {
        bus.subscribe(
            Topic::RobotCommands,
            Arc::new(CommandHandler { node: self.clone() }),
        )
        .await?;

        let mut interval = tokio::time::interval(self.status_interval);
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!(zone_id = %self.zone_id, "edge node shutting down");
                    return Ok(());
                }
                _ = interval.tick() => {
                    self.publish_all_status().await;
                }
            }
        }
    }

    fn owns(&self, robot_id: &RobotId) -> bool {
        self.robots.contains_key(robot_id)
    }

    async fn dispatch(self: Arc<Self>, cmd: RobotCommand) {
        if !self.owns(&cmd.robot_id) {
            return;
        }
        match cmd.kind {
            CommandType::Task => self.handle_task(cmd),
            CommandType::FirmwareUpdate => self.handle_firmware_update(cmd),
            CommandType::FirmwareRollback => self.handle_firmware_rollback(cmd),
        }
    }

    fn handle_task(self: Arc<Self>, cmd: RobotCommand) {
        {
            let Some(mut robot) = self.robots.get_mut(&cmd.robot_id) else {
                return;
            };
            robot.start_task();
        }
        let node = self.clone();
        tokio::spawn(async move {
            node.clock.sleep(node.task_duration).await;
            let pending = {
                let Some(mut robot) = node.robots.get_mut(&cmd.robot_id) else {
                    return;
                };
                robot.finish_task()
            };
            if let Some(pending) = pending {
                info!(robot_id = %cmd.robot_id, "applying deferred firmware command");
                node.dispatch(pending).await;
            }
        });
    }

    fn handle_firmware_update(self: Arc<Self>, cmd: RobotCommand) {
        let payload: FirmwareUpdatePayload = match serde_json::from_value(cmd.payload.clone()) {
            Ok(p) => p,
            Err(err) => {
                warn!(robot_id = %cmd.robot_id, error = %err, "invalid firmware update payload");
                return;
            }
        };
        let target = payload.model_id.as_ref().map(ToString::to_string);
        let deferred = {
            let Some(mut robot) = self.robots.get_mut(&cmd.robot_id) else {
                return;
            };
            if !RobotRuntimeState::targets_this_model(target.as_deref(), &robot.model_id) {
                info!(robot_id = %cmd.robot_id, model_id = %robot.model_id, "skipping firmware update for other model");
                return;
            }
            if robot.state == RobotState::Busy {
                robot.defer_firmware(cmd.clone());
                true
            } else {
                robot.begin_firmware_download();
                false
            }
        };
        if deferred {
            info!(robot_id = %cmd.robot_id, "firmware update deferred until task complete");
            return;
        }
        let node = self.clone();
        tokio::spawn(async move {
            node.run_firmware_apply(cmd.robot_id.clone(), payload.version).await;
        });
    }

    fn handle_firmware_rollback(self: Arc<Self>, cmd: RobotCommand) {
        let payload: FirmwareRollbackPayload = match serde_json::from_value(cmd.payload.clone()) {
            Ok(p) => p,
            Err(err) => {
                warn!(robot_id = %cmd.robot_id, error = %err, "invalid firmware rollback payload");
                return;
            }
        };
        let deferred = {
            let Some(mut robot) = self.robots.get_mut(&cmd.robot_id) else {
                return;
            };
            if robot.state == RobotState::Busy {
                robot.defer_firmware(cmd.clone());
                true
            } else {
                robot.begin_firmware_download();
                false
            }
        };
        if deferred {
            info!(robot_id = %cmd.robot_id, "firmware rollback deferred until task complete");
            return;
        }
        let node = self.clone();
        tokio::spawn(async move {
            node.run_firmware_rollback(cmd.robot_id.clone(), payload.version).await;
        });
    }

    async fn run_firmware_apply(self: Arc<Self>, robot_id: RobotId, version: String) {
        self.clock.sleep(self.task_duration).await;
        if let Some(mut robot) = self.robots.get_mut(&robot_id) {
            robot.begin_firmware_apply();
        } else {
            return;
        }
        self.clock.sleep(self.task_duration).await;
        let pending = if let Some(mut robot) = self.robots.get_mut(&robot_id) {
            robot.complete_firmware_update(version.clone());
            robot.pending_firmware.take()
        } else {
            None
        };
        info!(%robot_id, %version, "firmware update complete");
        if let Some(pending) = pending {
            self.dispatch(pending).await;
        }
    }

    async fn run_firmware_rollback(self: Arc<Self>, robot_id: RobotId, version: String) {
        self.clock.sleep(self.task_duration).await;
        if let Some(mut robot) = self.robots.get_mut(&robot_id) {
            robot.begin_firmware_apply();
        } else {
            return;
        }
        self.clock.sleep(self.task_duration).await;
        let pending = if let Some(mut robot) = self.robots.get_mut(&robot_id) {
            robot.complete_firmware_rollback(version.clone());
            robot.pending_firmware.take()
        } else {
            None
        };
        info!(%robot_id, %version, "firmware rollback complete");
        if let Some(pending) = pending {
            self.dispatch(pending).await;
        }
    }

    async fn publish_all_status(&self) {
        let snapshots: Vec<(RobotId, RobotRuntimeState)> = self
            .robots
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        for (robot_id, robot) in snapshots {
            let mut extra = std::collections::HashMap::new();
            extra.insert(
                crate::model::extra_keys::MODEL_ID.to_string(),
                serde_json::json!(robot.model_id),
            );
            extra.insert(
                crate::model::extra_keys::FIRMWARE_VERSION.to_string(),
                serde_json::json!(robot.firmware_version),
            );
            extra.insert(
                crate::model::extra_keys::FIRMWARE_UPDATE_STATUS.to_string(),
                serde_json::to_value(robot.firmware_update_status).unwrap_or_default(),
            );
            let status = RobotStatus {
                robot_id: robot_id.clone(),
                state: robot.state,
                battery: robot.battery,
                updated_at: self.clock.now(),
                extra,
            };
            if let Err(err) = self.status_pub.publish(&status).await {
                warn!(%robot_id, error = %err, "publish robot status failed");
            }
        }
    }

    /// A snapshot of `robot_id`'s simulated state, for tests and diagnostics.
    /// Returns `None` if this node does not own `robot_id`.
    #[must_use]
    pub fn status_snapshot(&self, robot_id: &RobotId) -> Option<RobotStatusSnapshot> {
        self.robots.get(robot_id).map(|robot| RobotStatusSnapshot {
            state: robot.state,
            firmware_version: robot.firmware_version.clone(),
        })
    }

    /// Overrides `robot_id`'s model id, for exercising model-heterogeneity
    /// targeting in tests. No-op if this node does not own `robot_id`.
    pub fn set_model_id(&self, robot_id: &RobotId, model_id: ModelId) {
        if let Some(mut robot) = self.robots.get_mut(robot_id) {
            robot.model_id = model_id.to_string();
        }
    }
}

/// A public snapshot of one robot's simulated state.
#[derive(Debug, Clone)]
pub struct RobotStatusSnapshot {
    /// Coarse operational state.
    pub state: RobotState,
    /// Currently-installed firmware version.
    pub firmware_version: String,
}

struct CommandHandler {
    node: Arc<EdgeNode>,
}

#[async_trait]
impl MessageHandler for CommandHandler {
    async fn handle(&self, _key: &str, value: &[u8]) -> Result<(), BusError> {
        let cmd: RobotCommand = serde_json::from_slice(value)?;
        if is_firmware_command(&cmd) || cmd.kind == CommandType::Task {
            self.node.clone().dispatch(cmd).await;
        }
        Ok(())
    }
}

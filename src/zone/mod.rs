//! The Zone layer: dispatches tasks to robots round-robin, aggregates
//! robot status, and reports a [`ZoneSummary`] up to its owning Area.
//!
//! Grounded on `original_source/internal/zone/controller.go`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::bus::{Bus, BusError, MessageHandler, RobotCommandPublisher, Topic, ZoneSummaryPublisher};
use crate::ids::{RobotId, ZoneId};
use crate::model::{CommandType, RobotCommand, RobotState, RobotStatus, ZoneSummary, ZoneTask};
use crate::time::SharedClock;

/// Runs the zone control loop for one zone: fan-out to robots, status
/// intake, periodic summary.
pub struct ZoneController {
    zone_id: ZoneId,
    robots: Vec<RobotId>,
    cmd_pub: RobotCommandPublisher,
    summary_pub: ZoneSummaryPublisher,
    clock: SharedClock,
    report_interval: Duration,
    robot_status: DashMap<RobotId, RobotStatus>,
    cmd_seq: AtomicU64,
}

impl ZoneController {
    /// Creates a controller owning `robots`. No status is known for any
    /// robot until its first `RobotStatus` arrives.
    #[must_use]
    pub fn new(
        zone_id: ZoneId,
        robots: Vec<RobotId>,
        bus: Arc<dyn Bus>,
        clock: SharedClock,
        report_interval: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            zone_id,
            robots,
            cmd_pub: RobotCommandPublisher::new(bus.clone()),
            summary_pub: ZoneSummaryPublisher::new(bus),
            clock,
            report_interval,
            robot_status: DashMap::new(),
            cmd_seq: AtomicU64::new(0),
        })
    }

    /// Subscribes to `area.zone_tasks` and `edge.robot_status`, then runs
    /// the periodic summary loop until `cancel` fires.
    pub async fn run(self: Arc<Self>, bus: Arc<dyn Bus>, cancel: CancellationToken) -> Result<(), BusError> {
        bus.subscribe(Topic::ZoneTasks, Arc::new(TaskHandler { controller: self.clone() }))
            .await?;
        bus.subscribe(Topic::RobotStatus, Arc::new(StatusHandler { controller: self.clone() }))
            .await?;

        let mut interval = tokio::time::interval(self.report_interval);
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!(zone_id = %self.zone_id, "zone controller shutting down");
                    return Ok(());
                }
                _ = interval.tick() => {
                    self.publish_summary().await;
                }
            }
        }
    }

    fn owns_robot(&self, robot_id: &RobotId) -> bool {
        self.robots.iter().any(|id| id == robot_id)
    }

    async fn handle_task(&self, task: ZoneTask) {
        if task.zone_id != self.zone_id {
            return;
        }
        if self.robots.is_empty() {
            warn!(zone_id = %self.zone_id, task_id = %task.id, "no robots in zone, dropping task");
            return;
        }

        if task.is_firmware_broadcast() {
            self.broadcast_firmware(task).await;
            return;
        }

        let seq = self.cmd_seq.fetch_add(1, Ordering::SeqCst);
        let robot_id = self.robots[(seq as usize) % self.robots.len()].clone();
        let cmd = RobotCommand {
            id: task.id.clone(),
            robot_id: robot_id.clone(),
            kind: CommandType::Task,
            payload: task.payload,
            created_at: self.clock.now(),
        };
        if let Err(err) = self.cmd_pub.publish(&cmd).await {
            warn!(zone_id = %self.zone_id, %robot_id, error = %err, "publish robot command failed");
            return;
        }
        info!(zone_id = %self.zone_id, task_id = %task.id, %robot_id, "dispatched task");
    }

    async fn broadcast_firmware(&self, task: ZoneTask) {
        for robot_id in &self.robots {
            let cmd_id = crate::ids::TaskId::for_firmware_command(&task.id, robot_id);
            let cmd = RobotCommand {
                id: cmd_id,
                robot_id: robot_id.clone(),
                kind: CommandType::FirmwareUpdate,
                payload: task.payload.clone(),
                created_at: self.clock.now(),
            };
            if let Err(err) = self.cmd_pub.publish(&cmd).await {
                warn!(zone_id = %self.zone_id, %robot_id, error = %err, "publish firmware command failed");
            }
        }
        info!(zone_id = %self.zone_id, task_id = %task.id, robot_count = self.robots.len(), "broadcast firmware task");
    }

    fn handle_status(&self, status: RobotStatus) {
        if !self.owns_robot(&status.robot_id) {
            return;
        }
        self.robot_status.insert(status.robot_id.clone(), status);
    }

    async fn publish_summary(&self) {
        let robot_count = self.robots.len();
        let mut healthy = 0;
        let mut busy = 0;
        for entry in &self.robot_status {
            if entry.value().state != RobotState::Error {
                healthy += 1;
            }
            if entry.value().state == RobotState::Busy {
                busy += 1;
            }
        }
        let summary = ZoneSummary {
            zone_id: self.zone_id.clone(),
            robot_count,
            healthy,
            busy,
            updated_at: self.clock.now(),
        };
        if let Err(err) = self.summary_pub.publish(&summary).await {
            warn!(zone_id = %self.zone_id, error = %err, "publish zone summary failed");
        }
    }
}

struct TaskHandler {
    controller: Arc<ZoneController>,
}

#[async_trait]
impl MessageHandler for TaskHandler {
    async fn handle(&self, _key: &str, value: &[u8]) -> Result<(), BusError> {
        let task: ZoneTask = serde_json::from_slice(value)?;
        self.controller.handle_task(task).await;
        Ok(())
    }
}

struct StatusHandler {
    controller: Arc<ZoneController>,
}

#[async_trait]
impl MessageHandler for StatusHandler {
    async fn handle(&self, _key: &str, value: &[u8]) -> Result<(), BusError> {
        let status: RobotStatus = serde_json::from_slice(value)?;
        self.controller.handle_status(status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::memory::InMemoryBus;
    use crate::ids::{TaskId, WorkOrderId};
    use crate::time::test_clock;
    use proptest::prelude::*;
    use std::sync::atomic::AtomicUsize;

    fn task(zone_id: &str, payload: serde_json::Value) -> ZoneTask {
        ZoneTask {
            id: TaskId::try_new("zone-1-20260101120000".to_string()).unwrap(),
            zone_id: ZoneId::try_new(zone_id.to_string()).unwrap(),
            order_id: WorkOrderId::try_new("wo-1-1".to_string()).unwrap(),
            payload,
            created_at: chrono::Utc::now(),
        }
    }

    struct CountingHandler(Arc<AtomicUsize>);

    #[async_trait]
    impl MessageHandler for CountingHandler {
        async fn handle(&self, _key: &str, _value: &[u8]) -> Result<(), BusError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn robots(n: usize) -> Vec<RobotId> {
        (0..n)
            .map(|i| RobotId::try_new(format!("robot-{i}")).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn round_robins_across_robots() {
        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let controller = ZoneController::new(
            ZoneId::try_new("zone-1".to_string()).unwrap(),
            robots(3),
            bus.clone(),
            test_clock(),
            Duration::from_secs(10),
        );
        let counts: Vec<Arc<AtomicUsize>> = (0..3).map(|_| Arc::new(AtomicUsize::new(0))).collect();
        bus.subscribe(Topic::RobotCommands, Arc::new(RoutingHandler { counts: counts.clone() }))
            .await
            .unwrap();

        for _ in 0..6 {
            controller
                .handle_task(task("zone-1", serde_json::json!({"sku": "S"})))
                .await;
        }
        for count in &counts {
            assert_eq!(count.load(Ordering::SeqCst), 2);
        }
    }

    struct RoutingHandler {
        counts: Vec<Arc<AtomicUsize>>,
    }

    #[async_trait]
    impl MessageHandler for RoutingHandler {
        async fn handle(&self, _key: &str, value: &[u8]) -> Result<(), BusError> {
            let cmd: RobotCommand = serde_json::from_slice(value)?;
            let idx: usize = cmd.robot_id.to_string().trim_start_matches("robot-").parse().unwrap();
            self.counts[idx].fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn firmware_task_broadcasts_to_every_robot() {
        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let controller = ZoneController::new(
            ZoneId::try_new("zone-1".to_string()).unwrap(),
            robots(4),
            bus.clone(),
            test_clock(),
            Duration::from_secs(10),
        );
        let count = Arc::new(AtomicUsize::new(0));
        bus.subscribe(Topic::RobotCommands, Arc::new(CountingHandler(count.clone())))
            .await
            .unwrap();

        controller
            .handle_task(task(
                "zone-1",
                serde_json::json!({"type": "firmware_update", "campaign_id": "c-1", "version": "2.0.0"}),
            ))
            .await;
        assert_eq!(count.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn task_for_other_zone_is_ignored() {
        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let controller = ZoneController::new(
            ZoneId::try_new("zone-1".to_string()).unwrap(),
            robots(2),
            bus.clone(),
            test_clock(),
            Duration::from_secs(10),
        );
        let count = Arc::new(AtomicUsize::new(0));
        bus.subscribe(Topic::RobotCommands, Arc::new(CountingHandler(count.clone())))
            .await
            .unwrap();

        controller.handle_task(task("zone-2", serde_json::json!({}))).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn summary_counts_busy_and_excludes_error_from_healthy() {
        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let controller = ZoneController::new(
            ZoneId::try_new("zone-1".to_string()).unwrap(),
            robots(3),
            bus.clone(),
            test_clock(),
            Duration::from_secs(10),
        );
        controller.handle_status(RobotStatus {
            robot_id: RobotId::try_new("robot-0".to_string()).unwrap(),
            state: RobotState::Busy,
            battery: 90.0,
            updated_at: chrono::Utc::now(),
            extra: std::collections::HashMap::new(),
        });
        controller.handle_status(RobotStatus {
            robot_id: RobotId::try_new("robot-1".to_string()).unwrap(),
            state: RobotState::Error,
            battery: 10.0,
            updated_at: chrono::Utc::now(),
            extra: std::collections::HashMap::new(),
        });

        let count = Arc::new(AtomicUsize::new(0));
        bus.subscribe(Topic::ZoneSummary, Arc::new(CountingHandler(count.clone())))
            .await
            .unwrap();
        controller.publish_summary().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    proptest! {
        /// Over N consecutive TASK-type zone-tasks to a zone of K robots,
        /// each robot receives floor(N/K) or ceil(N/K) commands (`spec.md` §8.2),
        /// driven through the real `handle_task` dispatch path.
        #[test]
        fn round_robin_fairness_holds_for_any_robot_and_task_count(
            robot_count in 1usize..12,
            task_count in 0usize..40,
        ) {
            tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .unwrap()
                .block_on(async {
                    let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
                    let controller = ZoneController::new(
                        ZoneId::try_new("zone-1".to_string()).unwrap(),
                        robots(robot_count),
                        bus.clone(),
                        test_clock(),
                        Duration::from_secs(10),
                    );
                    let counts: Vec<Arc<AtomicUsize>> =
                        (0..robot_count).map(|_| Arc::new(AtomicUsize::new(0))).collect();
                    bus.subscribe(
                        Topic::RobotCommands,
                        Arc::new(RoutingHandler { counts: counts.clone() }),
                    )
                    .await
                    .unwrap();

                    for _ in 0..task_count {
                        controller.handle_task(task("zone-1", serde_json::json!({"sku": "S"}))).await;
                    }

                    let min = task_count / robot_count;
                    let max = min + usize::from(task_count % robot_count != 0);
                    for count in &counts {
                        let observed = count.load(Ordering::SeqCst);
                        prop_assert!(observed == min || observed == max);
                    }
                    Ok(())
                })?;
        }

        /// For any mix of cached robot states, `busy <= healthy <= robot_count`
        /// (`spec.md` §8.6): a busy robot is never in `ERROR`, so it is always
        /// counted as healthy too, and the cache never holds more entries than
        /// the configured robot set.
        #[test]
        fn zone_summary_stays_within_bounds(
            robot_count in 1usize..20,
            state_seeds in proptest::collection::vec(0u8..4, 0..20),
        ) {
            tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .unwrap()
                .block_on(async {
                    let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
                    let controller = ZoneController::new(
                        ZoneId::try_new("zone-1".to_string()).unwrap(),
                        robots(robot_count),
                        bus.clone(),
                        test_clock(),
                        Duration::from_secs(10),
                    );
                    for (i, seed) in state_seeds.iter().enumerate().take(robot_count) {
                        let state = match seed % 4 {
                            0 => RobotState::Idle,
                            1 => RobotState::Busy,
                            2 => RobotState::Error,
                            _ => RobotState::Charging,
                        };
                        controller.handle_status(RobotStatus {
                            robot_id: RobotId::try_new(format!("robot-{i}")).unwrap(),
                            state,
                            battery: 50.0,
                            updated_at: chrono::Utc::now(),
                            extra: std::collections::HashMap::new(),
                        });
                    }

                    let counted = Arc::new(std::sync::Mutex::new(None));
                    struct SummaryCapture(Arc<std::sync::Mutex<Option<ZoneSummary>>>);
                    #[async_trait]
                    impl MessageHandler for SummaryCapture {
                        async fn handle(&self, _key: &str, value: &[u8]) -> Result<(), BusError> {
                            let summary: ZoneSummary = serde_json::from_slice(value)?;
                            *self.0.lock().unwrap() = Some(summary);
                            Ok(())
                        }
                    }
                    bus.subscribe(Topic::ZoneSummary, Arc::new(SummaryCapture(counted.clone())))
                        .await
                        .unwrap();
                    controller.publish_summary().await;

                    let summary = counted.lock().unwrap().clone().expect("summary published");
                    prop_assert!(summary.busy <= summary.healthy);
                    prop_assert!(summary.healthy <= summary.robot_count);
                    prop_assert_eq!(summary.robot_count, robot_count);
                    Ok(())
                })?;
        }
    }
}

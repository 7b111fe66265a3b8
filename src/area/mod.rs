//! The Area layer: dispatches work orders to zones round-robin, aggregates
//! zone summaries, and reports an [`AreaSummary`] up to the Fleet.
//!
//! Grounded on `original_source/internal/area/controller.go`. The original
//! leaves its round-robin as a "for simplicity: first zone" comment over a
//! counter that is never actually read round-robin-style elsewhere in the
//! stack; this implementation keeps the `atomic` counter and applies it
//! consistently, matching the Zone layer's own dispatch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::bus::{AreaSummaryPublisher, Bus, BusError, MessageHandler, Topic, ZoneTaskPublisher};
use crate::ids::{AreaId, TaskId, ZoneId};
use crate::model::{AreaSummary, WorkOrder, ZoneSummary, ZoneTask};
use crate::time::SharedClock;

/// Runs the area control loop for one area: fan-out to zones, zone-summary
/// intake, periodic summary.
pub struct AreaController {
    area_id: AreaId,
    zones: Vec<ZoneId>,
    zone_pub: ZoneTaskPublisher,
    summary_pub: AreaSummaryPublisher,
    clock: SharedClock,
    report_interval: Duration,
    zone_summary: DashMap<ZoneId, ZoneSummary>,
    task_seq: AtomicU64,
}

impl AreaController {
    /// Creates a controller owning `zones`. No summary is known for any
    /// zone until its first `ZoneSummary` arrives.
    #[must_use]
    pub fn new(
        area_id: AreaId,
        zones: Vec<ZoneId>,
        bus: Arc<dyn Bus>,
        clock: SharedClock,
        report_interval: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            area_id,
            zones,
            zone_pub: ZoneTaskPublisher::new(bus.clone()),
            summary_pub: AreaSummaryPublisher::new(bus),
            clock,
            report_interval,
            zone_summary: DashMap::new(),
            task_seq: AtomicU64::new(0),
        })
    }

    /// Subscribes to `fleet.work_orders` and `zone.summary`, then runs the
    /// periodic summary loop until `cancel` fires.
    pub async fn run(self: Arc<Self>, bus: Arc<dyn Bus>, cancel: CancellationToken) -> Result<(), BusError> {
        bus.subscribe(Topic::WorkOrders, Arc::new(WorkOrderHandler { controller: self.clone() }))
            .await?;
        bus.subscribe(Topic::ZoneSummary, Arc::new(SummaryHandler { controller: self.clone() }))
            .await?;

        let mut interval = tokio::time::interval(self.report_interval);
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!(area_id = %self.area_id, "area controller shutting down");
                    return Ok(());
                }
                _ = interval.tick() => {
                    self.publish_summary().await;
                }
            }
        }
    }

    fn owns_zone(&self, zone_id: &ZoneId) -> bool {
        self.zones.iter().any(|id| id == zone_id)
    }

    async fn handle_work_order(&self, order: WorkOrder) {
        if order.area_id != self.area_id {
            return;
        }
        if self.zones.is_empty() {
            warn!(area_id = %self.area_id, order_id = %order.id, "no zones configured, dropping work order");
            return;
        }

        let seq = self.task_seq.fetch_add(1, Ordering::SeqCst);
        let zone_id = self.zones[(seq as usize) % self.zones.len()].clone();
        let timestamp = self.clock.now().format("%Y%m%d%H%M%S").to_string();
        let task = ZoneTask {
            id: TaskId::for_zone_task(&zone_id, &timestamp),
            zone_id: zone_id.clone(),
            order_id: order.id.clone(),
            payload: order.payload,
            created_at: self.clock.now(),
        };
        if let Err(err) = self.zone_pub.publish(&task).await {
            warn!(area_id = %self.area_id, %zone_id, error = %err, "publish zone task failed");
            return;
        }
        info!(area_id = %self.area_id, order_id = %order.id, %zone_id, task_id = %task.id, "dispatched work order");
    }

    fn handle_zone_summary(&self, summary: ZoneSummary) {
        if !self.owns_zone(&summary.zone_id) {
            return;
        }
        self.zone_summary.insert(summary.zone_id.clone(), summary);
    }

    async fn publish_summary(&self) {
        let zone_count = self.zone_summary.len();
        let robot_count: usize = self.zone_summary.iter().map(|entry| entry.value().robot_count).sum();
        let summary = AreaSummary {
            area_id: self.area_id.clone(),
            zone_count,
            robot_count,
            updated_at: self.clock.now(),
        };
        if let Err(err) = self.summary_pub.publish(&summary).await {
            warn!(area_id = %self.area_id, error = %err, "publish area summary failed");
        }
    }
}

struct WorkOrderHandler {
    controller: Arc<AreaController>,
}

#[async_trait]
impl MessageHandler for WorkOrderHandler {
    async fn handle(&self, _key: &str, value: &[u8]) -> Result<(), BusError> {
        let order: WorkOrder = serde_json::from_slice(value)?;
        self.controller.handle_work_order(order).await;
        Ok(())
    }
}

struct SummaryHandler {
    controller: Arc<AreaController>,
}

#[async_trait]
impl MessageHandler for SummaryHandler {
    async fn handle(&self, _key: &str, value: &[u8]) -> Result<(), BusError> {
        let summary: ZoneSummary = serde_json::from_slice(value)?;
        self.controller.handle_zone_summary(summary);
        Ok(())
    }
}

//! Work-order intake and the firmware campaign trigger.
//!
//! Grounded on `original_source/internal/fleet/scheduler.go`: assigns an ID
//! and a `created_at` to every incoming order, then publishes it to
//! `fleet.work_orders`. `CancelWorkOrder` has no counterpart here; the Go
//! source itself leaves it a `// TODO: publish cancel event` stub, and a
//! no-op that silently "succeeds" would be worse than the method's absence.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::bus::{Bus, WorkOrderPublisher};
use crate::error::FleetError;
use crate::ids::{AreaId, WorkOrderId};
use crate::model::WorkOrder;
use crate::time::SharedClock;

/// A caller-supplied work order before the scheduler has assigned it an
/// ID and a creation timestamp.
#[derive(Debug, Clone)]
pub struct WorkOrderDraft {
    /// The area this order is routed to.
    pub area_id: AreaId,
    /// Scheduling priority.
    pub priority: i64,
    /// Opaque payload.
    pub payload: Value,
    /// Optional deadline for completion.
    pub deadline: Option<DateTime<Utc>>,
}

/// Assigns IDs/timestamps to incoming work orders and publishes them.
pub struct Scheduler {
    publisher: WorkOrderPublisher,
    clock: SharedClock,
    seq: AtomicU64,
}

impl Scheduler {
    /// Builds a scheduler publishing through `bus`.
    #[must_use]
    pub fn new(bus: Arc<dyn Bus>, clock: SharedClock) -> Self {
        Self {
            publisher: WorkOrderPublisher::new(bus),
            clock,
            seq: AtomicU64::new(0),
        }
    }

    /// Stamps `draft` with a generated `wo-<epoch_ms>-<seq>` ID and the
    /// current time, publishes the resulting order to `fleet.work_orders`,
    /// and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::Transport`] if the publish fails.
    pub async fn submit_work_order(&self, draft: WorkOrderDraft) -> Result<WorkOrder, FleetError> {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        let order = WorkOrder {
            id: WorkOrderId::generate(self.clock.epoch_millis(), seq),
            area_id: draft.area_id,
            priority: draft.priority,
            payload: draft.payload,
            created_at: self.clock.now(),
            deadline: draft.deadline,
        };
        self.publisher.publish(&order).await?;
        Ok(order)
    }
}

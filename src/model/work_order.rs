//! `WorkOrder`: a job entering the fleet, routed by `AreaId`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{AreaId, WorkOrderId};

/// A job submitted to the Fleet scheduler. Payload is opaque except where
/// the Zone controller inspects a `type` discriminator for firmware
/// broadcasts, or the Fleet HTTP surface summarizes it for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrder {
    /// Unique identifier, assigned by the Fleet scheduler if unset on submission.
    pub id: WorkOrderId,
    /// The area this order is routed to.
    pub area_id: AreaId,
    /// Scheduling priority; higher values are not otherwise interpreted by the core.
    pub priority: i64,
    /// Opaque payload, typically a JSON object with a `type` discriminator.
    pub payload: Value,
    /// When the order was created, stamped by the scheduler if unset.
    pub created_at: DateTime<Utc>,
    /// Optional deadline for completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
}

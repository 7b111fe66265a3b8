//! `ZoneTask`: an Area controller's decomposition of a `WorkOrder` to one Zone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{TaskId, WorkOrderId, ZoneId};

/// One Area's dispatch of a `WorkOrder` to a specific Zone. Payload is
/// inherited verbatim from the originating order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneTask {
    /// Unique identifier, of the form `<zone_id>-<YYYYMMDDhhmmss>`.
    pub id: TaskId,
    /// The zone this task is routed to.
    pub zone_id: ZoneId,
    /// The work order this task was derived from.
    pub order_id: WorkOrderId,
    /// Payload inherited verbatim from the originating work order.
    pub payload: Value,
    /// When the task was created.
    pub created_at: DateTime<Utc>,
}

/// Minimal shape used to detect a firmware broadcast without committing to
/// the full `FirmwareUpdatePayload` schema: a task's payload qualifies if
/// `type == "firmware_update"`, or if it carries both `campaign_id` and
/// `version` (`spec.md` §4.4).
#[derive(Debug, Deserialize)]
struct FirmwareDiscriminator {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    campaign_id: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

impl ZoneTask {
    /// Whether this task's payload should be treated as a firmware broadcast.
    #[must_use]
    pub fn is_firmware_broadcast(&self) -> bool {
        let Ok(discriminator) = serde_json::from_value::<FirmwareDiscriminator>(self.payload.clone())
        else {
            return false;
        };
        discriminator.kind.as_deref() == Some("firmware_update")
            || (discriminator.campaign_id.is_some() && discriminator.version.is_some())
    }
}

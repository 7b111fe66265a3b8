//! Strongly-typed identifiers for the fleet control plane.
//!
//! Every identifier in the system is an opaque string with a distinct
//! nominal type, so a `ZoneId` can never be passed where an `AreaId` is
//! expected even though both are backed by `String`.

use nutype::nutype;

/// Identifies a single robot, owned by exactly one zone's configured robot set.
#[nutype(
    validate(len_char_min = 1),
    derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, TryFrom, Into)
)]
pub struct RobotId(String);

/// Identifies a zone controller's domain within an area.
#[nutype(
    validate(len_char_min = 1),
    derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, TryFrom, Into)
)]
pub struct ZoneId(String);

/// Identifies an area controller's domain within the fleet.
#[nutype(
    validate(len_char_min = 1),
    derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, TryFrom, Into)
)]
pub struct AreaId(String);

/// Identifies a work order submitted to the fleet.
#[nutype(
    validate(len_char_min = 1),
    derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, TryFrom, Into)
)]
pub struct WorkOrderId(String);

/// Identifies a zone-level task, or the robot command derived from it.
#[nutype(
    validate(len_char_min = 1),
    derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, TryFrom, Into)
)]
pub struct TaskId(String);

/// Identifies a robot model (e.g. `"stub-model"`, `"picker-v2"`), used for
/// pull-side firmware targeting.
#[nutype(
    validate(len_char_min = 1),
    derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, TryFrom, Into)
)]
pub struct ModelId(String);

/// Identifies a firmware campaign across the fleet.
#[nutype(
    validate(len_char_min = 1),
    derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, TryFrom, Into)
)]
pub struct CampaignId(String);

impl WorkOrderId {
    /// Generates a monotonically unique ID of the form `wo-<epoch_ms>-<seq>`.
    #[must_use]
    pub fn generate(epoch_ms: u128, seq: u64) -> Self {
        Self::try_new(format!("wo-{epoch_ms}-{seq}")).expect("generated id is never empty")
    }
}

impl TaskId {
    /// Generates a zone-task ID of the form `<zone_id>-<YYYYMMDDhhmmss>`.
    #[must_use]
    pub fn for_zone_task(zone_id: &ZoneId, timestamp: &str) -> Self {
        Self::try_new(format!("{zone_id}-{timestamp}")).expect("generated id is never empty")
    }

    /// Generates a per-robot firmware command ID of the form `<task_id>-<robot_id>`.
    #[must_use]
    pub fn for_firmware_command(task_id: &TaskId, robot_id: &RobotId) -> Self {
        Self::try_new(format!("{task_id}-{robot_id}")).expect("generated id is never empty")
    }
}

//! `RobotStatus`: telemetry published periodically by each Edge gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ids::RobotId;

/// A robot's coarse operational state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RobotState {
    /// Not executing a task or firmware update.
    Idle,
    /// Executing a task or firmware update.
    Busy,
    /// In an error condition; excluded from a zone's `healthy` count.
    Error,
    /// Charging.
    Charging,
}

/// The firmware-update sub-state carried in `RobotStatus.extra`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirmwareUpdateStatus {
    /// No update in progress.
    Idle,
    /// Simulated download phase.
    Downloading,
    /// Simulated apply phase.
    Applying,
    /// Update completed and `firmware_version` advanced.
    Success,
    /// Update failed; `firmware_version` unchanged.
    Failed,
    /// A rollback completed and `firmware_version` was set back.
    Rollback,
}

/// Telemetry published by an Edge gateway for one robot. The latest status
/// per `RobotId` overwrites prior status in a Zone's cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotStatus {
    /// The robot this status describes.
    pub robot_id: RobotId,
    /// Coarse operational state.
    pub state: RobotState,
    /// Battery charge, 0-100.
    pub battery: f64,
    /// When this status was produced.
    pub updated_at: DateTime<Utc>,
    /// Always contains at least `model_id`, `firmware_version`, and
    /// `firmware_update_status`; open for future extension without a schema change.
    pub extra: HashMap<String, serde_json::Value>,
}

/// Keys always present in `RobotStatus.extra`.
pub mod extra_keys {
    /// The robot's model identifier, used for pull-side firmware targeting.
    pub const MODEL_ID: &str = "model_id";
    /// The robot's currently-installed firmware version.
    pub const FIRMWARE_VERSION: &str = "firmware_version";
    /// The robot's firmware-update sub-state.
    pub const FIRMWARE_UPDATE_STATUS: &str = "firmware_update_status";
}

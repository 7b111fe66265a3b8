//! Per-robot runtime state held by an [`super::EdgeNode`].
//!
//! Mirrors the Go simulator's `robotSimState`: one entry per owned robot,
//! mutated under the node's `DashMap` shard lock rather than a `sync.Mutex`.

use crate::model::{CommandType, FirmwareUpdateStatus, RobotCommand, RobotState};

/// The simulated state of one robot.
#[derive(Debug, Clone)]
pub struct RobotRuntimeState {
    pub(crate) state: RobotState,
    pub(crate) battery: f64,
    pub(crate) model_id: String,
    pub(crate) firmware_version: String,
    pub(crate) firmware_update_status: FirmwareUpdateStatus,
    /// A `FIRMWARE_UPDATE` or `FIRMWARE_ROLLBACK` command received while
    /// `BUSY`, applied on the next transition to `IDLE`.
    pub(crate) pending_firmware: Option<RobotCommand>,
}

impl RobotRuntimeState {
    /// A freshly provisioned robot: idle, full battery, at the default
    /// model and firmware version used throughout the simulation.
    pub fn new() -> Self {
        Self {
            state: RobotState::Idle,
            battery: 100.0,
            model_id: "stub-model".to_string(),
            firmware_version: "1.0.0".to_string(),
            firmware_update_status: FirmwareUpdateStatus::Idle,
            pending_firmware: None,
        }
    }

    /// Marks the robot `BUSY` for the duration of a `TASK` command.
    pub fn start_task(&mut self) {
        self.state = RobotState::Busy;
    }

    /// Completes a `TASK`, returning a pending firmware command to apply if
    /// one arrived while this robot was busy.
    pub fn finish_task(&mut self) -> Option<RobotCommand> {
        if self.state == RobotState::Busy {
            self.state = RobotState::Idle;
        }
        self.pending_firmware.take()
    }

    /// Whether `cmd`'s firmware payload targets this robot's model. A
    /// missing or empty `model_id` targets every model.
    pub fn targets_this_model(target_model_id: Option<&str>, this_model_id: &str) -> bool {
        match target_model_id {
            Some(id) if !id.is_empty() => id == this_model_id,
            _ => true,
        }
    }

    /// Records `cmd` as deferred because the robot is currently busy.
    pub fn defer_firmware(&mut self, cmd: RobotCommand) {
        self.pending_firmware = Some(cmd);
    }

    /// Begins the two-phase download/apply simulation immediately.
    pub fn begin_firmware_download(&mut self) {
        self.state = RobotState::Busy;
        self.firmware_update_status = FirmwareUpdateStatus::Downloading;
    }

    /// Transitions from download to apply.
    pub fn begin_firmware_apply(&mut self) {
        self.firmware_update_status = FirmwareUpdateStatus::Applying;
    }

    /// Completes a firmware update, advancing the installed version.
    pub fn complete_firmware_update(&mut self, version: String) {
        self.state = RobotState::Idle;
        self.firmware_version = version;
        self.firmware_update_status = FirmwareUpdateStatus::Success;
    }

    /// Completes a rollback, reverting to `version`.
    pub fn complete_firmware_rollback(&mut self, version: String) {
        self.state = RobotState::Idle;
        self.firmware_version = version;
        self.firmware_update_status = FirmwareUpdateStatus::Rollback;
    }

    /// Marks the in-flight firmware operation as failed without changing
    /// the installed version.
    pub fn fail_firmware(&mut self) {
        self.state = RobotState::Idle;
        self.firmware_update_status = FirmwareUpdateStatus::Failed;
    }
}

impl Default for RobotRuntimeState {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `cmd` is a firmware command (as opposed to `TASK`).
pub fn is_firmware_command(cmd: &RobotCommand) -> bool {
    matches!(cmd.kind, CommandType::FirmwareUpdate | CommandType::FirmwareRollback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_task_returns_pending_firmware() {
        let mut robot = RobotRuntimeState::new();
        robot.start_task();
        assert_eq!(robot.state, RobotState::Busy);
        robot.defer_firmware(sample_command());
        let pending = robot.finish_task();
        assert_eq!(robot.state, RobotState::Idle);
        assert!(pending.is_some());
    }

    #[test]
    fn finish_task_without_pending_returns_none() {
        let mut robot = RobotRuntimeState::new();
        robot.start_task();
        assert!(robot.finish_task().is_none());
    }

    #[test]
    fn model_targeting_matches_exact_id() {
        assert!(RobotRuntimeState::targets_this_model(Some("model-a"), "model-a"));
        assert!(!RobotRuntimeState::targets_this_model(Some("model-b"), "model-a"));
    }

    #[test]
    fn model_targeting_empty_or_absent_matches_everything() {
        assert!(RobotRuntimeState::targets_this_model(None, "model-a"));
        assert!(RobotRuntimeState::targets_this_model(Some(""), "model-a"));
    }

    #[test]
    fn firmware_lifecycle_transitions() {
        let mut robot = RobotRuntimeState::new();
        robot.begin_firmware_download();
        assert_eq!(robot.firmware_update_status, FirmwareUpdateStatus::Downloading);
        robot.begin_firmware_apply();
        assert_eq!(robot.firmware_update_status, FirmwareUpdateStatus::Applying);
        robot.complete_firmware_update("2.0.0".to_string());
        assert_eq!(robot.state, RobotState::Idle);
        assert_eq!(robot.firmware_version, "2.0.0");
        assert_eq!(robot.firmware_update_status, FirmwareUpdateStatus::Success);
    }

    fn sample_command() -> RobotCommand {
        use crate::ids::{RobotId, TaskId};
        RobotCommand {
            id: TaskId::try_new("t-1".to_string()).unwrap(),
            robot_id: RobotId::try_new("robot-1".to_string()).unwrap(),
            kind: CommandType::FirmwareUpdate,
            payload: serde_json::json!({}),
            created_at: chrono::Utc::now(),
        }
    }
}

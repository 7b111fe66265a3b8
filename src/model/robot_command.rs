//! `RobotCommand`: a Zone controller's dispatch of a task to one robot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{RobotId, TaskId};

/// The kind of command a Zone sends to a robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandType {
    /// Execute the task carried in the command's payload.
    Task,
    /// Download and apply firmware described by the command's payload.
    FirmwareUpdate,
    /// Download and apply a rollback firmware described by the command's payload.
    FirmwareRollback,
}

/// A command sent from a Zone controller to a single robot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotCommand {
    /// Unique identifier: the originating task's ID for a `TASK` command, or
    /// `<task_id>-<robot_id>` for a broadcast firmware command.
    pub id: TaskId,
    /// The robot this command targets.
    pub robot_id: RobotId,
    /// The kind of command.
    #[serde(rename = "type")]
    pub kind: CommandType,
    /// Payload inherited verbatim from the originating task.
    pub payload: Value,
    /// When the command was created.
    pub created_at: DateTime<Utc>,
}

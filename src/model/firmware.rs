//! Firmware payload and catalog types.
//!
//! `FirmwareUpdatePayload`/`FirmwareRollbackPayload` ride inside a
//! `RobotCommand`'s opaque payload; `FirmwareImage`/`FirmwareCampaign` are
//! fleet-side bookkeeping that feeds the campaign trigger (`SPEC_FULL.md`
//! §3) and are never published to the bus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AreaId, CampaignId, ModelId, ZoneId};

/// The JSON payload for a `FIRMWARE_UPDATE` `RobotCommand`. Each robot
/// decides whether it is a target by comparing `model_id` to its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirmwareUpdatePayload {
    /// The campaign this update belongs to.
    pub campaign_id: CampaignId,
    /// The firmware version being installed.
    pub version: String,
    /// Which robot model this update targets; empty/absent means "all models".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<ModelId>,
    /// Where to download the firmware image from.
    pub download_url: String,
    /// SHA-256 checksum of the firmware image.
    pub checksum_sha256: String,
    /// The version to roll back to if this update needs to be reverted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollback_version: Option<String>,
    /// Where to download the rollback image from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollback_url: Option<String>,
    /// Optional deadline for completing the update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
}

/// The JSON payload for a `FIRMWARE_ROLLBACK` `RobotCommand`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirmwareRollbackPayload {
    /// The campaign this rollback belongs to.
    pub campaign_id: CampaignId,
    /// The version to roll back to.
    pub version: String,
    /// Where to download the rollback firmware image from.
    pub download_url: String,
    /// SHA-256 checksum of the rollback image.
    pub checksum_sha256: String,
}

/// A single firmware artifact the Fleet knows about, keyed by `model_id`
/// in a `FirmwareCatalog`. Feeds the campaign trigger's `download_url`,
/// `checksum_sha256`, and `rollback_version` instead of hardcoding them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirmwareImage {
    /// The model this image applies to.
    pub model_id: ModelId,
    /// The version this image installs.
    pub version: String,
    /// Where to download the image from.
    pub download_url: String,
    /// SHA-256 checksum of the image.
    pub checksum_sha256: String,
    /// The version to roll back to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollback_version: Option<String>,
    /// Where to download the rollback image from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollback_url: Option<String>,
}

/// Which robots a campaign's update applies to. Mirrors
/// `original_source/pkg/api/firmware.go`'s `FirmwareCampaignTarget`, minus
/// the per-zone concurrency cap and health-gate fields, which only matter
/// to the staged multi-zone rollout this crate does not implement (see
/// `SPEC_FULL.md` §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirmwareCampaignTarget {
    /// The robot model this campaign updates.
    pub model_id: ModelId,
    /// The firmware version being rolled out.
    pub target_version: String,
    /// Restrict the rollout to robots currently on this version, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_version: Option<String>,
    /// Restrict the rollout to these zones, if non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub zone_ids: Vec<ZoneId>,
    /// Restrict the rollout to these areas, if non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub area_ids: Vec<AreaId>,
}

/// A firmware campaign's lifecycle state, as tracked by the catalog.
/// Collapses `original_source`'s `pending | running | paused | completed |
/// rolled_back` to the two states this crate's single-shot (unstaged)
/// trigger actually produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    /// Recorded in the catalog but not yet dispatched as a `WorkOrder`.
    Pending,
    /// Dispatched as a `WorkOrder`; zone broadcast is the fleet's last word on it.
    Triggered,
}

/// A record of a firmware campaign the Fleet has triggered. Retained for
/// display; the core's dispatch behavior does not consult it once the
/// triggering `WorkOrder` has been published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirmwareCampaign {
    /// Unique campaign identifier.
    pub id: CampaignId,
    /// Which robots this campaign targets.
    pub target: FirmwareCampaignTarget,
    /// The image this campaign installs.
    pub image: FirmwareImage,
    /// The campaign's current lifecycle state.
    pub status: CampaignStatus,
    /// When the campaign was triggered.
    pub created_at: DateTime<Utc>,
}

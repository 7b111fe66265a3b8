//! An in-memory catalog of known firmware images, keyed by robot model.
//!
//! Feeds the firmware campaign trigger's `download_url`/`checksum_sha256`/
//! `rollback_version` instead of hardcoding them, per `SPEC_FULL.md` §4.2.
//! `original_source/internal/fleet/server.go::handleFirmwareSimulate`
//! hardcodes these fields inline for `stub-model`; seeding the catalog with
//! the same values reproduces that behavior while giving the HTTP surface a
//! natural place to register other models later.

use dashmap::DashMap;

use crate::ids::{CampaignId, ModelId};
use crate::model::{CampaignStatus, FirmwareCampaign, FirmwareImage};

/// Firmware images the fleet knows how to deploy, keyed by `model_id`, plus
/// the campaigns that have drawn from them.
pub struct FirmwareCatalog {
    images: DashMap<ModelId, FirmwareImage>,
    campaigns: DashMap<CampaignId, FirmwareCampaign>,
}

impl FirmwareCatalog {
    /// An empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self { images: DashMap::new(), campaigns: DashMap::new() }
    }

    /// A catalog seeded with the default `stub-model` entry used by the
    /// simulated fleet, matching `handleFirmwareSimulate`'s hardcoded
    /// `2.0.0` image with a `1.0.0` rollback target.
    #[must_use]
    pub fn with_default_stub_model() -> Self {
        let catalog = Self::new();
        let model_id = ModelId::try_new("stub-model".to_string()).expect("non-empty literal");
        catalog.images.insert(
            model_id.clone(),
            FirmwareImage {
                model_id,
                version: "2.0.0".to_string(),
                download_url: "https://cdn.example/fw/stub-model/2.0.0.bin".to_string(),
                checksum_sha256: "simulated".to_string(),
                rollback_version: Some("1.0.0".to_string()),
                rollback_url: None,
            },
        );
        catalog
    }

    /// Registers or replaces the image for `image.model_id`.
    pub fn insert(&self, image: FirmwareImage) {
        self.images.insert(image.model_id.clone(), image);
    }

    /// Looks up the current image for `model_id`.
    #[must_use]
    pub fn get(&self, model_id: &ModelId) -> Option<FirmwareImage> {
        self.images.get(model_id).map(|entry| entry.value().clone())
    }

    /// Records a newly triggered campaign, keyed by its own id.
    pub fn record_campaign(&self, campaign: FirmwareCampaign) {
        self.campaigns.insert(campaign.id.clone(), campaign);
    }

    /// Advances `campaign_id`'s lifecycle state. No-op if unknown.
    pub fn set_campaign_status(&self, campaign_id: &CampaignId, status: CampaignStatus) {
        if let Some(mut campaign) = self.campaigns.get_mut(campaign_id) {
            campaign.status = status;
        }
    }

    /// Looks up a previously recorded campaign.
    #[must_use]
    pub fn get_campaign(&self, campaign_id: &CampaignId) -> Option<FirmwareCampaign> {
        self.campaigns.get(campaign_id).map(|entry| entry.value().clone())
    }
}

impl Default for FirmwareCatalog {
    fn default() -> Self {
        Self::new()
    }
}

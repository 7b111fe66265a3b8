//! The Fleet layer: work-order intake, the firmware campaign trigger,
//! fleet-wide aggregation, and the HTTP surface external collaborators
//! bind to.
//!
//! Grounded on `original_source/internal/fleet/{scheduler,state,server}.go`.

mod catalog;
pub mod http;
mod scheduler;

pub use catalog::FirmwareCatalog;
pub use global_state::GlobalState;
pub use scheduler::{Scheduler, WorkOrderDraft};

mod global_state;

use std::sync::Arc;

use crate::bus::Bus;
use crate::error::FleetError;
use crate::ids::{AreaId, CampaignId, ModelId};
use crate::model::{CampaignStatus, FirmwareCampaign, FirmwareCampaignTarget, FirmwareUpdatePayload, WorkOrder};
use crate::time::SharedClock;

use self::scheduler::WorkOrderDraft as Draft;

/// The area targeted by the simulated firmware campaign, matching
/// `handleFirmwareSimulate`'s hardcoded `"area-1"`.
const SIMULATED_CAMPAIGN_AREA: &str = "area-1";

/// The model targeted by the simulated firmware campaign.
const SIMULATED_CAMPAIGN_MODEL: &str = "stub-model";

/// Everything the Fleet HTTP surface needs: scheduler, firmware catalog,
/// and the global state aggregator.
pub struct FleetService {
    scheduler: Scheduler,
    catalog: FirmwareCatalog,
    state: Arc<GlobalState>,
    clock: SharedClock,
}

/// The outcome of triggering the simulated firmware campaign.
pub struct CampaignOutcome {
    /// The work order that carries the firmware broadcast to the target area.
    pub order: WorkOrder,
    /// The catalog's record of this campaign, reflecting its status after
    /// dispatch.
    pub campaign: FirmwareCampaign,
    /// Human-readable description of the rollout, for the HTTP response.
    pub message: String,
    /// Description of the routing path, for the HTTP response.
    pub target: String,
}

impl FleetService {
    /// Builds a service publishing through `bus`, seeded with the default
    /// firmware catalog.
    #[must_use]
    pub fn new(bus: Arc<dyn Bus>, clock: SharedClock) -> Arc<Self> {
        Arc::new(Self {
            scheduler: Scheduler::new(bus, clock.clone()),
            catalog: FirmwareCatalog::with_default_stub_model(),
            state: GlobalState::new(),
            clock,
        })
    }

    /// Subscribes the global-state aggregator to `area.summary`.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription fails.
    pub async fn subscribe(&self, bus: &Arc<dyn Bus>) -> Result<(), FleetError> {
        self.state.subscribe(bus).await?;
        Ok(())
    }

    /// Submits a caller-supplied work order.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError`] if the publish fails.
    pub async fn submit_work_order(&self, draft: Draft) -> Result<WorkOrder, FleetError> {
        self.scheduler.submit_work_order(draft).await
    }

    /// Every area's latest reported summary.
    #[must_use]
    pub fn get_all_areas(&self) -> Vec<crate::model::AreaSummary> {
        self.state.get_all_areas()
    }

    /// Sum of `robot_count` across every area's latest summary.
    #[must_use]
    pub fn total_robots(&self) -> usize {
        self.state.total_robots()
    }

    /// The catalog's record of a previously triggered campaign, if any.
    #[must_use]
    pub fn get_campaign(&self, campaign_id: &CampaignId) -> Option<FirmwareCampaign> {
        self.catalog.get_campaign(campaign_id)
    }

    /// Optionally seeds `seed_busy` plain work orders (so robots are
    /// already `BUSY` and will defer the upcoming firmware update), then
    /// submits a firmware campaign targeting [`SIMULATED_CAMPAIGN_AREA`]
    /// and [`SIMULATED_CAMPAIGN_MODEL`], drawing its image from the
    /// firmware catalog. Mirrors `handleFirmwareSimulate`.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError`] if publishing the campaign's own work order
    /// fails. Failures seeding individual `seed_busy` orders are logged
    /// and swallowed, matching `spec.md` §7's stated tolerance.
    pub async fn trigger_firmware_campaign(
        &self,
        seed_busy: u32,
    ) -> Result<CampaignOutcome, FleetError> {
        let area_id = AreaId::try_new(SIMULATED_CAMPAIGN_AREA.to_string())
            .expect("literal area id is never empty");

        for _ in 0..seed_busy {
            let seed = Draft {
                area_id: area_id.clone(),
                priority: 2,
                payload: serde_json::json!({"task": "work", "seed": true}),
                deadline: None,
            };
            if let Err(err) = self.scheduler.submit_work_order(seed).await {
                tracing::warn!(error = %err, "seed work order failed to submit");
            }
        }

        let model_id =
            ModelId::try_new(SIMULATED_CAMPAIGN_MODEL.to_string()).expect("literal model id is never empty");
        let image = self.catalog.get(&model_id).unwrap_or_else(|| crate::model::FirmwareImage {
            model_id: model_id.clone(),
            version: "2.0.0".to_string(),
            download_url: "https://cdn.example/fw/stub-model/2.0.0.bin".to_string(),
            checksum_sha256: "simulated".to_string(),
            rollback_version: Some("1.0.0".to_string()),
            rollback_url: None,
        });
        let campaign_id = CampaignId::try_new(format!(
            "sim-{}",
            self.clock.now().format("%Y%m%d%H%M%S")
        ))
        .expect("generated campaign id is never empty");

        let mut campaign = FirmwareCampaign {
            id: campaign_id.clone(),
            target: FirmwareCampaignTarget {
                model_id: model_id.clone(),
                target_version: image.version.clone(),
                current_version: None,
                zone_ids: Vec::new(),
                area_ids: vec![area_id.clone()],
            },
            image: image.clone(),
            status: CampaignStatus::Pending,
            created_at: self.clock.now(),
        };
        self.catalog.record_campaign(campaign.clone());

        let payload = FirmwareUpdatePayload {
            campaign_id,
            version: image.version,
            model_id: Some(image.model_id),
            download_url: image.download_url,
            checksum_sha256: image.checksum_sha256,
            rollback_version: image.rollback_version,
            rollback_url: image.rollback_url,
            deadline: None,
        };

        let draft = Draft {
            area_id: area_id.clone(),
            priority: 1,
            payload: serde_json::to_value(&payload)?,
            deadline: None,
        };
        let order = self.scheduler.submit_work_order(draft).await?;

        self.catalog.set_campaign_status(&campaign.id, CampaignStatus::Triggered);
        campaign.status = CampaignStatus::Triggered;

        let message = if seed_busy > 0 {
            format!(
                "Submitted {seed_busy} seed work orders, then firmware campaign. Busy robots will defer firmware until task complete."
            )
        } else {
            "firmware campaign submitted; zone broadcasts to all robots. Busy robots defer update until work complete.".to_string()
        };
        let target = format!(
            "{area_id} -> zone -> all robots ({SIMULATED_CAMPAIGN_MODEL} firmware rollout)"
        );

        Ok(CampaignOutcome { order, campaign, message, target })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::memory::InMemoryBus;
    use crate::time::test_clock;

    #[tokio::test]
    async fn campaign_payload_parses_back_as_firmware_update() {
        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let service = FleetService::new(bus, test_clock());

        let outcome = service.trigger_firmware_campaign(0).await.unwrap();
        let payload: FirmwareUpdatePayload = serde_json::from_value(outcome.order.payload).unwrap();
        assert_eq!(payload.version, "2.0.0");
        assert_eq!(payload.model_id.unwrap().to_string(), "stub-model");

        assert_eq!(outcome.campaign.status, CampaignStatus::Triggered);
        assert_eq!(outcome.campaign.target.model_id.to_string(), "stub-model");
        let recorded = service.get_campaign(&outcome.campaign.id).unwrap();
        assert_eq!(recorded.status, CampaignStatus::Triggered);
    }

    #[tokio::test]
    async fn campaign_with_seed_busy_reports_it_in_message() {
        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let service = FleetService::new(bus, test_clock());

        let outcome = service.trigger_firmware_campaign(3).await.unwrap();
        assert!(outcome.message.contains("3 seed work orders"));
    }

    #[tokio::test]
    async fn global_state_starts_empty() {
        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let service = FleetService::new(bus, test_clock());
        assert_eq!(service.total_robots(), 0);
        assert!(service.get_all_areas().is_empty());
    }
}

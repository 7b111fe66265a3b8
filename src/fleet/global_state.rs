//! Fleet-wide view built by subscribing to `area.summary`.
//!
//! Grounded on `original_source/internal/fleet/state.go`'s `GlobalState`:
//! an eventually-consistent snapshot per `AreaId`, overwritten wholesale on
//! every `AreaSummary` received, never a delta.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::bus::{Bus, BusError, MessageHandler, Topic};
use crate::ids::AreaId;
use crate::model::AreaSummary;

/// Aggregates the latest `AreaSummary` reported by each area.
pub struct GlobalState {
    areas: DashMap<AreaId, AreaSummary>,
}

impl GlobalState {
    /// An empty aggregator; call [`Self::subscribe`] to start receiving
    /// summaries.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self { areas: DashMap::new() })
    }

    /// Subscribes to `area.summary` so future summaries update this state.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] if the subscription itself fails.
    pub async fn subscribe(self: &Arc<Self>, bus: &Arc<dyn Bus>) -> Result<(), BusError> {
        bus.subscribe(Topic::AreaSummary, Arc::new(SummaryHandler { state: self.clone() }))
            .await
    }

    fn handle_summary(&self, summary: AreaSummary) {
        self.areas.insert(summary.area_id.clone(), summary);
    }

    /// The latest known summary for `area_id`, if any has been reported.
    #[must_use]
    pub fn get_area(&self, area_id: &AreaId) -> Option<AreaSummary> {
        self.areas.get(area_id).map(|entry| entry.value().clone())
    }

    /// Every area's latest known summary, in no particular order.
    #[must_use]
    pub fn get_all_areas(&self) -> Vec<AreaSummary> {
        self.areas.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Sum of `robot_count` across every area's latest summary.
    #[must_use]
    pub fn total_robots(&self) -> usize {
        self.areas.iter().map(|entry| entry.value().robot_count).sum()
    }
}

struct SummaryHandler {
    state: Arc<GlobalState>,
}

#[async_trait]
impl MessageHandler for SummaryHandler {
    async fn handle(&self, _key: &str, value: &[u8]) -> Result<(), BusError> {
        let summary: AreaSummary = serde_json::from_slice(value)?;
        self.state.handle_summary(summary);
        Ok(())
    }
}

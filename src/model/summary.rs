//! `ZoneSummary` and `AreaSummary`: periodic roll-ups published up the hierarchy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AreaId, ZoneId};

/// A Zone controller's periodic roll-up of its robots' latest known status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSummary {
    /// The zone this summary describes.
    pub zone_id: ZoneId,
    /// Configured robot count (not the count of robots with known status).
    pub robot_count: usize,
    /// Count of robots with known status whose state is not `ERROR`.
    pub healthy: usize,
    /// Count of robots with known status whose state is `BUSY`.
    pub busy: usize,
    /// When this summary was produced.
    pub updated_at: DateTime<Utc>,
}

/// An Area controller's periodic roll-up of its zones' latest summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaSummary {
    /// The area this summary describes.
    pub area_id: AreaId,
    /// Count of owned zones whose summary has ever been received.
    pub zone_count: usize,
    /// Sum of `robot_count` across zones that have reported.
    pub robot_count: usize,
    /// When this summary was produced.
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_summary_round_trips() {
        let sum = ZoneSummary {
            zone_id: ZoneId::try_new("zone-1".to_string()).unwrap(),
            robot_count: 3,
            healthy: 2,
            busy: 1,
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&sum).unwrap();
        let back: ZoneSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back.robot_count, sum.robot_count);
    }
}

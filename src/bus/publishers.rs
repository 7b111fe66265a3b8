//! Thin typed wrappers around [`Bus::publish`], one per topic, so callers
//! serialize a concrete type instead of juggling `Topic` and raw bytes.
//! Grounded on the one-struct-per-topic shape of
//! `original_source/pkg/messaging/{workorder,zonetask,robotcommand,
//! robotstatus,zonesummary,areasummary}.go`.

use std::sync::Arc;

use crate::model::{AreaSummary, RobotCommand, RobotStatus, WorkOrder, ZoneSummary, ZoneTask};

use super::{Bus, BusError, Topic};

macro_rules! publisher {
    ($name:ident, $payload:ty, $topic:expr, $key:ident) => {
        #[doc = concat!("Publishes [`", stringify!($payload), "`] messages to its topic.")]
        pub struct $name {
            bus: Arc<dyn Bus>,
        }

        impl $name {
            #[doc = concat!("Wraps `bus` for publishing ", stringify!($payload), " messages.")]
            #[must_use]
            pub fn new(bus: Arc<dyn Bus>) -> Self {
                Self { bus }
            }

            /// Serializes `message` and publishes it, keyed by its routing field.
            pub async fn publish(&self, message: &$payload) -> Result<(), BusError> {
                let value = serde_json::to_vec(message)?;
                let key = message.$key.to_string();
                self.bus.publish($topic, &key, &value).await
            }
        }
    };
}

publisher!(WorkOrderPublisher, WorkOrder, Topic::WorkOrders, area_id);
publisher!(ZoneTaskPublisher, ZoneTask, Topic::ZoneTasks, zone_id);
publisher!(RobotCommandPublisher, RobotCommand, Topic::RobotCommands, robot_id);
publisher!(RobotStatusPublisher, RobotStatus, Topic::RobotStatus, robot_id);
publisher!(ZoneSummaryPublisher, ZoneSummary, Topic::ZoneSummary, zone_id);
publisher!(AreaSummaryPublisher, AreaSummary, Topic::AreaSummary, area_id);

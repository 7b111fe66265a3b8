//! Property-based tests for message schema round-trips (`spec.md` §8:
//! "JSON encode/decode of every message type in §3 is the identity modulo
//! field ordering and zero-value elision").
//!
//! Grounded on `tests/message_router_disabled/test_property_based.rs`'s
//! `prop_compose!` strategy shape for constructing valid domain values.

use proptest::prelude::*;

use fleetplane::ids::{AreaId, CampaignId, ModelId, RobotId, TaskId, WorkOrderId, ZoneId};
use fleetplane::model::{
    AreaSummary, CommandType, FirmwareUpdatePayload, RobotCommand, RobotState, RobotStatus,
    WorkOrder, ZoneSummary, ZoneTask,
};

prop_compose! {
    fn arb_robot_id()(id in "[a-z][a-z0-9-]{0,30}") -> RobotId {
        RobotId::try_new(id).unwrap()
    }
}

prop_compose! {
    fn arb_zone_id()(id in "[a-z][a-z0-9-]{0,30}") -> ZoneId {
        ZoneId::try_new(id).unwrap()
    }
}

prop_compose! {
    fn arb_area_id()(id in "[a-z][a-z0-9-]{0,30}") -> AreaId {
        AreaId::try_new(id).unwrap()
    }
}

prop_compose! {
    fn arb_work_order_id()(id in "wo-[0-9]{10,13}-[0-9]{1,4}") -> WorkOrderId {
        WorkOrderId::try_new(id).unwrap()
    }
}

prop_compose! {
    fn arb_task_id()(id in "[a-z][a-z0-9-]{0,30}") -> TaskId {
        TaskId::try_new(id).unwrap()
    }
}

prop_compose! {
    fn arb_model_id()(id in "[a-z][a-z0-9-]{0,20}") -> ModelId {
        ModelId::try_new(id).unwrap()
    }
}

prop_compose! {
    fn arb_campaign_id()(id in "[a-z][a-z0-9-]{0,20}") -> CampaignId {
        CampaignId::try_new(id).unwrap()
    }
}

fn arb_command_type() -> impl Strategy<Value = CommandType> {
    prop_oneof![
        Just(CommandType::Task),
        Just(CommandType::FirmwareUpdate),
        Just(CommandType::FirmwareRollback),
    ]
}

fn arb_robot_state() -> impl Strategy<Value = RobotState> {
    prop_oneof![
        Just(RobotState::Idle),
        Just(RobotState::Busy),
        Just(RobotState::Error),
        Just(RobotState::Charging),
    ]
}

prop_compose! {
    fn arb_work_order()(
        id in arb_work_order_id(),
        area_id in arb_area_id(),
        priority in any::<i64>(),
        sku in "[A-Z]{2,10}",
        quantity in 1i64..1000,
        has_deadline in any::<bool>(),
    ) -> WorkOrder {
        WorkOrder {
            id,
            area_id,
            priority,
            payload: serde_json::json!({"sku": sku, "quantity": quantity}),
            created_at: chrono::Utc::now(),
            deadline: if has_deadline { Some(chrono::Utc::now()) } else { None },
        }
    }
}

prop_compose! {
    fn arb_zone_task()(
        id in arb_task_id(),
        zone_id in arb_zone_id(),
        order_id in arb_work_order_id(),
        sku in "[A-Z]{2,10}",
    ) -> ZoneTask {
        ZoneTask {
            id,
            zone_id,
            order_id,
            payload: serde_json::json!({"sku": sku}),
            created_at: chrono::Utc::now(),
        }
    }
}

prop_compose! {
    fn arb_robot_command()(
        id in arb_task_id(),
        robot_id in arb_robot_id(),
        kind in arb_command_type(),
    ) -> RobotCommand {
        RobotCommand {
            id,
            robot_id,
            kind,
            payload: serde_json::json!({"sku": "S"}),
            created_at: chrono::Utc::now(),
        }
    }
}

prop_compose! {
    fn arb_robot_status()(
        robot_id in arb_robot_id(),
        state in arb_robot_state(),
        battery in 0.0f64..100.0,
        firmware_version in "[0-9]\\.[0-9]\\.[0-9]",
    ) -> RobotStatus {
        let mut extra = std::collections::HashMap::new();
        extra.insert("model_id".to_string(), serde_json::json!("stub-model"));
        extra.insert("firmware_version".to_string(), serde_json::json!(firmware_version));
        extra.insert("firmware_update_status".to_string(), serde_json::json!("idle"));
        RobotStatus {
            robot_id,
            state,
            battery,
            updated_at: chrono::Utc::now(),
            extra,
        }
    }
}

prop_compose! {
    fn arb_zone_summary()(
        zone_id in arb_zone_id(),
        robot_count in 0usize..1000,
        healthy in 0usize..1000,
        busy in 0usize..1000,
    ) -> ZoneSummary {
        ZoneSummary { zone_id, robot_count, healthy, busy, updated_at: chrono::Utc::now() }
    }
}

prop_compose! {
    fn arb_area_summary()(
        area_id in arb_area_id(),
        zone_count in 0usize..100,
        robot_count in 0usize..10000,
    ) -> AreaSummary {
        AreaSummary { area_id, zone_count, robot_count, updated_at: chrono::Utc::now() }
    }
}

prop_compose! {
    fn arb_firmware_update_payload()(
        campaign_id in arb_campaign_id(),
        version in "[0-9]\\.[0-9]\\.[0-9]",
        model_id in arb_model_id(),
        checksum in "[a-f0-9]{8,64}",
    ) -> FirmwareUpdatePayload {
        FirmwareUpdatePayload {
            campaign_id,
            version,
            model_id: Some(model_id),
            download_url: "https://cdn.example/fw.bin".to_string(),
            checksum_sha256: checksum,
            rollback_version: None,
            rollback_url: None,
            deadline: None,
        }
    }
}

proptest! {
    #[test]
    fn work_order_round_trips(order in arb_work_order()) {
        let json = serde_json::to_string(&order).unwrap();
        let back: WorkOrder = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back.id, order.id);
        prop_assert_eq!(back.area_id, order.area_id);
        prop_assert_eq!(back.priority, order.priority);
        prop_assert_eq!(back.payload, order.payload);
        prop_assert_eq!(back.deadline.is_some(), order.deadline.is_some());
    }
}

proptest! {
    #[test]
    fn zone_task_round_trips(task in arb_zone_task()) {
        let json = serde_json::to_string(&task).unwrap();
        let back: ZoneTask = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back.id, task.id);
        prop_assert_eq!(back.zone_id, task.zone_id);
        prop_assert_eq!(back.order_id, task.order_id);
        prop_assert_eq!(back.payload, task.payload);
    }
}

proptest! {
    #[test]
    fn robot_command_round_trips(cmd in arb_robot_command()) {
        let json = serde_json::to_string(&cmd).unwrap();
        let back: RobotCommand = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back.id, cmd.id);
        prop_assert_eq!(back.robot_id, cmd.robot_id);
        prop_assert_eq!(back.kind, cmd.kind);
        prop_assert_eq!(back.payload, cmd.payload);
    }
}

proptest! {
    #[test]
    fn robot_status_round_trips(status in arb_robot_status()) {
        let json = serde_json::to_string(&status).unwrap();
        let back: RobotStatus = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back.robot_id, status.robot_id);
        prop_assert_eq!(back.state, status.state);
        prop_assert_eq!(back.extra.get("firmware_version"), status.extra.get("firmware_version"));
    }
}

proptest! {
    #[test]
    fn zone_summary_round_trips(summary in arb_zone_summary()) {
        let json = serde_json::to_string(&summary).unwrap();
        let back: ZoneSummary = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back.zone_id, summary.zone_id);
        prop_assert_eq!(back.robot_count, summary.robot_count);
        prop_assert_eq!(back.healthy, summary.healthy);
        prop_assert_eq!(back.busy, summary.busy);
    }
}

proptest! {
    #[test]
    fn area_summary_round_trips(summary in arb_area_summary()) {
        let json = serde_json::to_string(&summary).unwrap();
        let back: AreaSummary = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back.area_id, summary.area_id);
        prop_assert_eq!(back.zone_count, summary.zone_count);
        prop_assert_eq!(back.robot_count, summary.robot_count);
    }
}

proptest! {
    #[test]
    fn firmware_update_payload_round_trips(payload in arb_firmware_update_payload()) {
        let json = serde_json::to_string(&payload).unwrap();
        let back: FirmwareUpdatePayload = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back.campaign_id, payload.campaign_id);
        prop_assert_eq!(back.version, payload.version);
        prop_assert_eq!(back.model_id.map(|m| m.to_string()), payload.model_id.map(|m| m.to_string()));
        prop_assert_eq!(back.checksum_sha256, payload.checksum_sha256);
    }
}

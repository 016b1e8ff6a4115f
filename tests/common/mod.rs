//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use plandb::coordinator::PlanCoordinator;
use plandb::model::{CostShare, LinkedPlanService, Plan, Service};
use plandb::observability::MetricsRegistry;
use plandb::storage::{MemoryRecordStore, RecordStore};

/// A plan as a client would post it.
pub const PLAN_JSON: &str = r#"{
    "planCostShares": {
        "deductible": 2000,
        "_org": "example.com",
        "copay": 23,
        "objectId": "1234vxc2324sdf-501",
        "objectType": "membercostshare"
    },
    "linkedPlanServices": [
        {
            "linkedService": {
                "_org": "example.com",
                "objectId": "1234520xvc30asdf-502",
                "objectType": "service",
                "name": "Yearly physical"
            },
            "planserviceCostShares": {
                "deductible": 10,
                "_org": "example.com",
                "copay": 0,
                "objectId": "1234512xvc1314asdfs-503",
                "objectType": "membercostshare"
            },
            "_org": "example.com",
            "objectId": "27283xvx9asdff-504",
            "objectType": "planservice"
        },
        {
            "linkedService": {
                "_org": "example.com",
                "objectId": "1234520xvc30sfs-505",
                "objectType": "service",
                "name": "well baby"
            },
            "planserviceCostShares": {
                "deductible": 10,
                "_org": "example.com",
                "copay": 175,
                "objectId": "1234512xvc1314sdfsd-506",
                "objectType": "membercostshare"
            },
            "_org": "example.com",
            "objectId": "27283xvx9sdf-507",
            "objectType": "planservice"
        }
    ],
    "_org": "example.com",
    "objectId": "12xvxc345ssdsds-508",
    "objectType": "plan",
    "planType": "inNetwork",
    "creationDate": "12-12-2017"
}"#;

pub const PLAN_ID: &str = "12xvxc345ssdsds-508";

pub fn sample_plan() -> Plan {
    serde_json::from_str(PLAN_JSON).expect("fixture plan parses")
}

pub fn cost_share(id: &str, copay: i64) -> CostShare {
    CostShare {
        deductible: 2000,
        copay,
        object_id: id.to_string(),
        object_type: "membercostshare".to_string(),
        org: "example.com".to_string(),
    }
}

pub fn linked(id: &str, service_id: &str, cost_share_id: &str, copay: i64) -> LinkedPlanService {
    LinkedPlanService {
        linked_service: Service {
            object_id: service_id.to_string(),
            object_type: "service".to_string(),
            name: "Yearly physical".to_string(),
            org: "example.com".to_string(),
        },
        plan_service_cost_shares: cost_share(cost_share_id, copay),
        object_id: id.to_string(),
        object_type: "planservice".to_string(),
        org: "example.com".to_string(),
    }
}

/// `p1` with cost-share `cs1` and one linked service `lps1 -> {s1, scs1}`.
pub fn small_plan(id: &str) -> Plan {
    Plan {
        plan_cost_shares: cost_share("cs1", 23),
        linked_plan_services: vec![linked("lps1", "s1", "scs1", 175)],
        object_id: id.to_string(),
        object_type: "plan".to_string(),
        plan_type: "inNetwork".to_string(),
        creation_date: "12-12-2017".to_string(),
        org: "example.com".to_string(),
    }
}

pub fn memory_coordinator() -> (PlanCoordinator, Arc<MemoryRecordStore>) {
    let store = Arc::new(MemoryRecordStore::new());
    let coordinator = PlanCoordinator::new(
        Arc::clone(&store) as Arc<dyn RecordStore>,
        Arc::new(MetricsRegistry::new()),
    );
    (coordinator, store)
}

//! Decomposition engine
//!
//! Explodes a plan tree into independently addressable records and reads
//! them back. The root key holds the whole embedded tree and is the only
//! thing consulted when reassembling a plan; the standalone child records
//! exist so children can be fetched, deleted, or re-indexed on their own.
//!
//! # Decomposition order
//!
//! 1. the plan
//! 2. the plan's cost-share
//! 3. for each linked service, in list order: the linked service, its
//!    service, its service cost-share
//!
//! A plan with `n` linked services always yields `2 + 3n` records.

use serde::Deserialize;

use crate::errors::{PlanError, PlanResult};
use crate::model::{Plan, RecordKind, StoredRecord};
use crate::storage::RecordStore;

/// Splits a plan into `(id, record)` pairs in decomposition order.
pub fn decompose(plan: &Plan) -> Vec<(String, StoredRecord)> {
    let mut records = Vec::with_capacity(2 + 3 * plan.linked_plan_services.len());

    records.push((plan.object_id.clone(), StoredRecord::Plan(plan.clone())));
    records.push((
        plan.plan_cost_shares.object_id.clone(),
        StoredRecord::CostShare(plan.plan_cost_shares.clone()),
    ));

    for lps in &plan.linked_plan_services {
        records.push((
            lps.object_id.clone(),
            StoredRecord::LinkedPlanService(lps.clone()),
        ));
        records.push((
            lps.linked_service.object_id.clone(),
            StoredRecord::Service(lps.linked_service.clone()),
        ));
        records.push((
            lps.plan_service_cost_shares.object_id.clone(),
            StoredRecord::CostShare(lps.plan_service_cost_shares.clone()),
        ));
    }

    records
}

/// Serializes a record into the bytes kept in the store.
pub fn encode_record(record: &StoredRecord) -> PlanResult<Vec<u8>> {
    serde_json::to_vec(record).map_err(|e| {
        PlanError::Dependency(format!(
            "Failed to encode {} {}: {}",
            record.kind(),
            record.object_id(),
            e
        ))
    })
}

/// Maps an `objectType` discriminant to a record shape, defaulting to `Plan`.
pub fn classify(object_type: &str) -> RecordKind {
    RecordKind::from_object_type(object_type)
}

/// Decodes root bytes into a plan.
pub fn decode_plan(id: &str, bytes: &[u8]) -> PlanResult<Plan> {
    serde_json::from_slice(bytes).map_err(|e| PlanError::corrupt(id, e))
}

/// Reads a whole plan from its root key.
///
/// Fails with `NotFound` if the key is absent or holds a child record rather
/// than a plan, and `Corrupt` if the stored bytes do not decode.
pub fn reassemble(store: &dyn RecordStore, id: &str) -> PlanResult<Plan> {
    let bytes = store.get(id)?;
    if stored_kind(id, &bytes)? != RecordKind::Plan {
        return Err(PlanError::NotFound(id.to_string()));
    }
    decode_plan(id, &bytes)
}

#[derive(Deserialize)]
struct KindTag {
    #[serde(rename = "objectType", default)]
    object_type: String,
}

/// Reads just the `objectType` discriminant of stored bytes.
fn stored_kind(id: &str, bytes: &[u8]) -> PlanResult<RecordKind> {
    let tag: KindTag = serde_json::from_slice(bytes).map_err(|e| PlanError::corrupt(id, e))?;
    Ok(classify(&tag.object_type))
}

/// Reads any record by id and decodes it as the shape its discriminant names.
pub fn read_record(store: &dyn RecordStore, id: &str) -> PlanResult<StoredRecord> {
    let bytes = store.get(id)?;
    let kind = stored_kind(id, &bytes)?;

    StoredRecord::decode(kind, &bytes)
        .map_err(|e| PlanError::corrupt(id, format!("not a valid {}: {}", kind, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::plan_fixtures as fixtures;
    use crate::storage::MemoryRecordStore;

    fn store_all(store: &MemoryRecordStore, plan: &Plan) {
        for (id, record) in decompose(plan) {
            store.set(&id, &encode_record(&record).unwrap(), None).unwrap();
        }
    }

    #[test]
    fn test_decompose_order_and_count() {
        let mut plan = fixtures::plan("p1");
        plan.linked_plan_services
            .push(fixtures::linked("lps2", "s2", "scs2", 10));

        let records = decompose(&plan);
        assert_eq!(records.len(), 2 + 3 * 2);

        let ids: Vec<&str> = records.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "cs1", "lps1", "s1", "scs1", "lps2", "s2", "scs2"]);

        let kinds: Vec<RecordKind> = records.iter().map(|(_, r)| r.kind()).collect();
        assert_eq!(
            kinds[..5],
            [
                RecordKind::Plan,
                RecordKind::CostShare,
                RecordKind::LinkedPlanService,
                RecordKind::Service,
                RecordKind::CostShare,
            ]
        );
    }

    #[test]
    fn test_decompose_no_linked_services() {
        let mut plan = fixtures::plan("p1");
        plan.linked_plan_services.clear();
        assert_eq!(decompose(&plan).len(), 2);
    }

    #[test]
    fn test_embedded_and_standalone_copies_identical() {
        let plan = fixtures::plan("p1");
        let store = MemoryRecordStore::new();
        store_all(&store, &plan);

        let root: serde_json::Value =
            serde_json::from_slice(&store.get("p1").unwrap()).unwrap();
        let standalone: serde_json::Value =
            serde_json::from_slice(&store.get("lps1").unwrap()).unwrap();
        assert_eq!(root["linkedPlanServices"][0], standalone);

        let embedded_bytes = serde_json::to_vec(&plan.linked_plan_services[0]).unwrap();
        assert_eq!(store.get("lps1").unwrap(), embedded_bytes);
    }

    #[test]
    fn test_reassemble_roundtrip() {
        let plan = fixtures::plan("p1");
        let store = MemoryRecordStore::new();
        store_all(&store, &plan);
        assert_eq!(reassemble(&store, "p1").unwrap(), plan);
    }

    #[test]
    fn test_reassemble_missing_and_corrupt() {
        let store = MemoryRecordStore::new();
        assert!(matches!(reassemble(&store, "p1"), Err(PlanError::NotFound(_))));

        store.set("p1", b"{not json", None).unwrap();
        assert!(matches!(reassemble(&store, "p1"), Err(PlanError::Corrupt { .. })));

        store
            .set("p2", br#"{"objectId":"p2","objectType":"plan"}"#, None)
            .unwrap();
        assert!(matches!(reassemble(&store, "p2"), Err(PlanError::Corrupt { .. })));
    }

    #[test]
    fn test_reassemble_child_id_is_not_a_plan() {
        let plan = fixtures::plan("p1");
        let store = MemoryRecordStore::new();
        store_all(&store, &plan);

        for id in ["cs1", "lps1", "s1", "scs1"] {
            let err = reassemble(&store, id).unwrap_err();
            assert!(matches!(err, PlanError::NotFound(ref missing) if missing == id));
        }
    }

    #[test]
    fn test_read_record_serves_each_shape() {
        let plan = fixtures::plan("p1");
        let store = MemoryRecordStore::new();
        store_all(&store, &plan);

        assert_eq!(read_record(&store, "p1").unwrap().kind(), RecordKind::Plan);
        assert_eq!(read_record(&store, "cs1").unwrap().kind(), RecordKind::CostShare);
        assert_eq!(
            read_record(&store, "lps1").unwrap().kind(),
            RecordKind::LinkedPlanService
        );
        assert_eq!(read_record(&store, "s1").unwrap().kind(), RecordKind::Service);
        assert_eq!(
            read_record(&store, "scs1").unwrap(),
            StoredRecord::CostShare(plan.linked_plan_services[0].plan_service_cost_shares.clone())
        );
    }

    #[test]
    fn test_read_record_wrong_shape_is_corrupt() {
        let store = MemoryRecordStore::new();
        store
            .set("s9", br#"{"objectId":"s9","objectType":"service"}"#, None)
            .unwrap();
        let err = read_record(&store, "s9").unwrap_err();
        assert!(matches!(err, PlanError::Corrupt { ref id, .. } if id == "s9"));
    }

    #[test]
    fn test_classify_defaults_to_plan() {
        assert_eq!(classify(""), RecordKind::Plan);
        assert_eq!(classify("planservice"), RecordKind::LinkedPlanService);
    }
}

//! Record kinds stored in the flat key namespace

use std::fmt;

use serde::Serialize;

use super::plan::{CostShare, LinkedPlanService, Plan, Service};

/// Shape of a stored record, keyed by its `objectType` discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Plan,
    CostShare,
    Service,
    LinkedPlanService,
}

impl RecordKind {
    /// Maps an `objectType` value to a record shape.
    ///
    /// Unknown discriminants fall back to `Plan`.
    pub fn from_object_type(object_type: &str) -> Self {
        match object_type {
            "membercostshare" | "PlanServiceCostShares" => RecordKind::CostShare,
            "service" => RecordKind::Service,
            "planservice" => RecordKind::LinkedPlanService,
            _ => RecordKind::Plan,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Plan => "plan",
            RecordKind::CostShare => "costShare",
            RecordKind::Service => "service",
            RecordKind::LinkedPlanService => "linkedPlanService",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One independently addressable record.
///
/// Serializes untagged, so the stored bytes are exactly the node's own JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StoredRecord {
    Plan(Plan),
    CostShare(CostShare),
    Service(Service),
    LinkedPlanService(LinkedPlanService),
}

impl StoredRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            StoredRecord::Plan(_) => RecordKind::Plan,
            StoredRecord::CostShare(_) => RecordKind::CostShare,
            StoredRecord::Service(_) => RecordKind::Service,
            StoredRecord::LinkedPlanService(_) => RecordKind::LinkedPlanService,
        }
    }

    pub fn object_id(&self) -> &str {
        match self {
            StoredRecord::Plan(p) => &p.object_id,
            StoredRecord::CostShare(c) => &c.object_id,
            StoredRecord::Service(s) => &s.object_id,
            StoredRecord::LinkedPlanService(l) => &l.object_id,
        }
    }

    /// Decodes bytes as the given kind.
    pub fn decode(kind: RecordKind, bytes: &[u8]) -> serde_json::Result<Self> {
        Ok(match kind {
            RecordKind::Plan => StoredRecord::Plan(serde_json::from_slice(bytes)?),
            RecordKind::CostShare => StoredRecord::CostShare(serde_json::from_slice(bytes)?),
            RecordKind::Service => StoredRecord::Service(serde_json::from_slice(bytes)?),
            RecordKind::LinkedPlanService => {
                StoredRecord::LinkedPlanService(serde_json::from_slice(bytes)?)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::plan::fixtures;

    #[test]
    fn test_kind_from_object_type() {
        assert_eq!(RecordKind::from_object_type("membercostshare"), RecordKind::CostShare);
        assert_eq!(
            RecordKind::from_object_type("PlanServiceCostShares"),
            RecordKind::CostShare
        );
        assert_eq!(RecordKind::from_object_type("service"), RecordKind::Service);
        assert_eq!(
            RecordKind::from_object_type("planservice"),
            RecordKind::LinkedPlanService
        );
        assert_eq!(RecordKind::from_object_type("plan"), RecordKind::Plan);
        assert_eq!(RecordKind::from_object_type("something-else"), RecordKind::Plan);
    }

    #[test]
    fn test_untagged_serialization_matches_node() {
        let cs = fixtures::cost_share("cs1", 10);
        let record = StoredRecord::CostShare(cs.clone());
        assert_eq!(
            serde_json::to_vec(&record).unwrap(),
            serde_json::to_vec(&cs).unwrap()
        );
    }

    #[test]
    fn test_decode_wrong_shape_fails() {
        let bytes = serde_json::to_vec(&fixtures::cost_share("cs1", 10)).unwrap();
        assert!(StoredRecord::decode(RecordKind::Service, &bytes).is_err());
        let record = StoredRecord::decode(RecordKind::CostShare, &bytes).unwrap();
        assert_eq!(record.object_id(), "cs1");
        assert_eq!(record.kind(), RecordKind::CostShare);
    }
}

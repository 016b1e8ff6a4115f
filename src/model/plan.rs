//! Plan tree types and input validation

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Cost-share node.
///
/// Used both as a plan's own cost-share and as a linked service's cost-share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostShare {
    pub deductible: i64,
    pub copay: i64,
    #[serde(rename = "objectId")]
    pub object_id: String,
    #[serde(rename = "objectType")]
    pub object_type: String,
    #[serde(rename = "_org")]
    pub org: String,
}

/// Service leaf node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    #[serde(rename = "objectId")]
    pub object_id: String,
    #[serde(rename = "objectType")]
    pub object_type: String,
    pub name: String,
    #[serde(rename = "_org")]
    pub org: String,
}

/// Links a service and its cost-share under a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedPlanService {
    #[serde(rename = "linkedService")]
    pub linked_service: Service,
    #[serde(rename = "planserviceCostShares")]
    pub plan_service_cost_shares: CostShare,
    #[serde(rename = "objectId")]
    pub object_id: String,
    #[serde(rename = "objectType")]
    pub object_type: String,
    #[serde(rename = "_org")]
    pub org: String,
}

/// Root of a plan hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(rename = "planCostShares")]
    pub plan_cost_shares: CostShare,
    #[serde(rename = "linkedPlanServices")]
    pub linked_plan_services: Vec<LinkedPlanService>,
    #[serde(rename = "objectId")]
    pub object_id: String,
    #[serde(rename = "objectType")]
    pub object_type: String,
    #[serde(rename = "planType")]
    pub plan_type: String,
    #[serde(rename = "creationDate")]
    pub creation_date: String,
    #[serde(rename = "_org")]
    pub org: String,
}

/// Body of a PATCH request.
///
/// Only the linked-service list takes part in a merge; any other top-level
/// fields in the request body are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPatch {
    #[serde(rename = "linkedPlanServices")]
    pub linked_plan_services: Vec<LinkedPlanService>,
}

fn require(field: &str, owner: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} of {} must not be empty", field, owner))
    } else {
        Ok(())
    }
}

impl CostShare {
    fn validate(&self, owner: &str) -> Result<(), String> {
        require("objectId", owner, &self.object_id)?;
        require("objectType", owner, &self.object_type)?;
        require("_org", owner, &self.org)
    }
}

impl Service {
    fn validate(&self, owner: &str) -> Result<(), String> {
        require("objectId", owner, &self.object_id)?;
        require("objectType", owner, &self.object_type)?;
        require("name", owner, &self.name)?;
        require("_org", owner, &self.org)
    }
}

impl LinkedPlanService {
    /// Checks required fields of this node and its children.
    pub fn validate(&self) -> Result<(), String> {
        require("objectId", "linkedPlanService", &self.object_id)?;
        require("objectType", "linkedPlanService", &self.object_type)?;
        require("_org", "linkedPlanService", &self.org)?;
        self.linked_service.validate("linkedService")?;
        self.plan_service_cost_shares
            .validate("planserviceCostShares")
    }

    /// Ids of this node and its children, in decomposition order.
    pub fn node_ids(&self) -> [&str; 3] {
        [
            &self.object_id,
            &self.linked_service.object_id,
            &self.plan_service_cost_shares.object_id,
        ]
    }
}

impl Plan {
    /// Checks required fields of the whole tree and that no id repeats inside it.
    pub fn validate(&self) -> Result<(), String> {
        require("objectId", "plan", &self.object_id)?;
        require("objectType", "plan", &self.object_type)?;
        require("planType", "plan", &self.plan_type)?;
        require("creationDate", "plan", &self.creation_date)?;
        require("_org", "plan", &self.org)?;
        self.plan_cost_shares.validate("planCostShares")?;
        for lps in &self.linked_plan_services {
            lps.validate()?;
        }

        let mut seen = HashSet::new();
        for id in self.node_ids() {
            if !seen.insert(id) {
                return Err(format!("objectId '{}' appears more than once", id));
            }
        }
        Ok(())
    }

    /// Every node id in the tree, in decomposition order.
    pub fn node_ids(&self) -> Vec<&str> {
        let mut ids = Vec::with_capacity(2 + 3 * self.linked_plan_services.len());
        ids.push(self.object_id.as_str());
        ids.push(self.plan_cost_shares.object_id.as_str());
        for lps in &self.linked_plan_services {
            ids.extend(lps.node_ids());
        }
        ids
    }

    /// Whether a value decoded as a plan actually looks like one.
    ///
    /// Listing runs over a mixed-kind namespace, so records that happen to
    /// decode but lack the identifying fields are skipped.
    pub fn is_complete(&self) -> bool {
        !self.object_id.is_empty()
            && !self.object_type.is_empty()
            && !self.plan_cost_shares.object_id.is_empty()
    }
}

impl PlanPatch {
    pub fn validate(&self) -> Result<(), String> {
        for lps in &self.linked_plan_services {
            lps.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

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

    pub fn plan(id: &str) -> Plan {
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
}

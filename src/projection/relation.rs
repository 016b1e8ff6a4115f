//! Join relations attached to indexed plan nodes
//!
//! ```text
//! plan ─┬─ costShare
//!       └─ linkedPlanService ─┬─ service
//!                             └─ serviceCostShare
//! ```

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::model::Plan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinRelation {
    Plan,
    CostShare,
    LinkedPlanService,
    Service,
    ServiceCostShare,
}

impl JoinRelation {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinRelation::Plan => "plan",
            JoinRelation::CostShare => "costShare",
            JoinRelation::LinkedPlanService => "linkedPlanService",
            JoinRelation::Service => "service",
            JoinRelation::ServiceCostShare => "serviceCostShare",
        }
    }
}

impl fmt::Display for JoinRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A search document derived from one plan node.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedNode {
    pub id: String,
    pub relation: JoinRelation,
    /// Parent node id; also the routing key. `None` for the plan itself.
    pub parent: Option<String>,
    pub document: Value,
}

/// Derives one search document per node, in decomposition order.
pub fn project_nodes(plan: &Plan) -> serde_json::Result<Vec<ProjectedNode>> {
    let mut nodes = Vec::with_capacity(2 + 3 * plan.linked_plan_services.len());

    nodes.push(node(&plan.object_id, plan, JoinRelation::Plan, None)?);
    nodes.push(node(
        &plan.plan_cost_shares.object_id,
        &plan.plan_cost_shares,
        JoinRelation::CostShare,
        Some(&plan.object_id),
    )?);

    for lps in &plan.linked_plan_services {
        nodes.push(node(
            &lps.object_id,
            lps,
            JoinRelation::LinkedPlanService,
            Some(&plan.object_id),
        )?);
        nodes.push(node(
            &lps.linked_service.object_id,
            &lps.linked_service,
            JoinRelation::Service,
            Some(&lps.object_id),
        )?);
        nodes.push(node(
            &lps.plan_service_cost_shares.object_id,
            &lps.plan_service_cost_shares,
            JoinRelation::ServiceCostShare,
            Some(&lps.object_id),
        )?);
    }

    Ok(nodes)
}

fn node<T: Serialize>(
    id: &str,
    value: &T,
    relation: JoinRelation,
    parent: Option<&str>,
) -> serde_json::Result<ProjectedNode> {
    let mut fields = Map::new();
    if let Value::Object(object) = serde_json::to_value(value)? {
        for (key, field) in object {
            if !field.is_object() && !field.is_array() {
                fields.insert(key, field);
            }
        }
    }

    let mut join = Map::new();
    join.insert("name".to_string(), Value::String(relation.as_str().to_string()));
    if let Some(parent) = parent {
        join.insert("parent".to_string(), Value::String(parent.to_string()));
    }
    fields.insert("plan_join".to_string(), Value::Object(join));

    Ok(ProjectedNode {
        id: id.to_string(),
        relation,
        parent: parent.map(str::to_string),
        document: Value::Object(fields),
    })
}

//! Messages carried by the projection queue

use std::fmt;

use crate::model::Plan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionOp {
    /// Index every node of the plan
    Upsert,
    /// Remove every node of the plan from the index
    Remove,
}

impl ProjectionOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectionOp::Upsert => "upsert",
            ProjectionOp::Remove => "remove",
        }
    }
}

impl fmt::Display for ProjectionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One committed write, as seen by the projector.
///
/// The payload is the full serialized plan tree, so a remove still knows
/// which child ids to drop from the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionMessage {
    pub op: ProjectionOp,
    pub plan_id: String,
    pub payload: Vec<u8>,
}

impl ProjectionMessage {
    pub fn upsert(plan: &Plan) -> serde_json::Result<Self> {
        Self::build(ProjectionOp::Upsert, plan)
    }

    pub fn remove(plan: &Plan) -> serde_json::Result<Self> {
        Self::build(ProjectionOp::Remove, plan)
    }

    fn build(op: ProjectionOp, plan: &Plan) -> serde_json::Result<Self> {
        Ok(Self {
            op,
            plan_id: plan.object_id.clone(),
            payload: serde_json::to_vec(plan)?,
        })
    }
}

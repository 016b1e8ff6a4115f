//! Merge engine for partial plan updates
//!
//! Patch semantics are upsert-only on the linked-service list: an incoming
//! item with a known `objectId` replaces the existing item wholesale (no
//! field-level merge), unknown ids are appended, and nothing is ever removed.
//! Removal needs a full replace or a delete.

use std::collections::HashMap;

use crate::model::LinkedPlanService;

/// Applies `incoming` to `existing` with upsert-only semantics.
///
/// Existing items keep their positions. Incoming items whose id matched
/// nothing are appended in their original relative order. If `incoming`
/// repeats an id, the last occurrence wins and takes the first one's slot.
pub fn merge_linked_services(
    existing: Vec<LinkedPlanService>,
    incoming: Vec<LinkedPlanService>,
) -> Vec<LinkedPlanService> {
    let mut order: Vec<String> = Vec::with_capacity(incoming.len());
    let mut lookup: HashMap<String, LinkedPlanService> = HashMap::with_capacity(incoming.len());
    for item in incoming {
        if !lookup.contains_key(&item.object_id) {
            order.push(item.object_id.clone());
        }
        lookup.insert(item.object_id.clone(), item);
    }

    let mut merged: Vec<LinkedPlanService> = existing
        .into_iter()
        .map(|current| lookup.remove(&current.object_id).unwrap_or(current))
        .collect();

    for id in order {
        if let Some(item) = lookup.remove(&id) {
            merged.push(item);
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::plan_fixtures::linked;

    fn ids(items: &[LinkedPlanService]) -> Vec<&str> {
        items.iter().map(|l| l.object_id.as_str()).collect()
    }

    #[test]
    fn test_replace_existing_and_append_new() {
        let existing = vec![linked("lps1", "s1", "scs1", 175), linked("lps0", "s0", "scs0", 5)];
        let incoming = vec![linked("lps1", "s1", "scs1", 250), linked("lps2", "s2", "scs2", 10)];

        let merged = merge_linked_services(existing, incoming);

        assert_eq!(ids(&merged), vec!["lps1", "lps0", "lps2"]);
        assert_eq!(merged[0].plan_service_cost_shares.copay, 250);
        assert_eq!(merged[1].plan_service_cost_shares.copay, 5);
    }

    #[test]
    fn test_replacement_is_wholesale() {
        let existing = vec![linked("lps1", "s1", "scs1", 175)];
        let incoming = vec![linked("lps1", "s-new", "scs-new", 1)];

        let merged = merge_linked_services(existing, incoming.clone());
        assert_eq!(merged, incoming);
    }

    #[test]
    fn test_empty_incoming_keeps_everything() {
        let existing = vec![linked("lps1", "s1", "scs1", 175)];
        let merged = merge_linked_services(existing.clone(), Vec::new());
        assert_eq!(merged, existing);
    }

    #[test]
    fn test_new_items_keep_relative_order() {
        let incoming = vec![
            linked("c", "sc", "scc", 1),
            linked("a", "sa", "sca", 1),
            linked("b", "sb", "scb", 1),
        ];
        let merged = merge_linked_services(Vec::new(), incoming);
        assert_eq!(ids(&merged), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_repeated_incoming_id_last_wins() {
        let incoming = vec![
            linked("n", "s", "sc", 1),
            linked("m", "sm", "scm", 1),
            linked("n", "s", "sc", 2),
        ];
        let merged = merge_linked_services(Vec::new(), incoming);
        assert_eq!(ids(&merged), vec!["n", "m"]);
        assert_eq!(merged[0].plan_service_cost_shares.copay, 2);
    }
}

//! In-process search index
//!
//! Documents are kept per index in a `BTreeMap` keyed by id, so query results
//! come back in id order.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use serde_json::Value;

use super::errors::{SearchError, SearchResult};
use super::facade::{SearchFacade, SearchHit};
use super::key::{lookup, FieldKey};

#[derive(Debug, Clone)]
struct IndexedDocument {
    routing: Option<String>,
    source: Value,
}

type IndexTable = BTreeMap<String, IndexedDocument>;

/// Search index held entirely in memory.
///
/// Writing to an index that does not exist creates it; querying one does not.
#[derive(Debug, Default)]
pub struct MemorySearchIndex {
    indices: RwLock<HashMap<String, IndexTable>>,
}

impl MemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty index if it does not exist yet.
    pub fn create_index(&self, index: &str) -> SearchResult<()> {
        let mut indices = self.write_lock()?;
        indices.entry(index.to_string()).or_default();
        Ok(())
    }

    /// Number of documents in an index, zero if it does not exist.
    pub fn count(&self, index: &str) -> usize {
        self.indices
            .read()
            .map(|indices| indices.get(index).map(|t| t.len()).unwrap_or(0))
            .unwrap_or(0)
    }

    /// Fetches one document by id.
    pub fn get(&self, index: &str, id: &str) -> SearchResult<Option<SearchHit>> {
        let indices = self.read_lock()?;
        let table = indices
            .get(index)
            .ok_or_else(|| SearchError::IndexNotFound(index.to_string()))?;
        Ok(table.get(id).map(|doc| SearchHit {
            id: id.to_string(),
            routing: doc.routing.clone(),
            source: doc.source.clone(),
        }))
    }

    fn read_lock(
        &self,
    ) -> SearchResult<std::sync::RwLockReadGuard<'_, HashMap<String, IndexTable>>> {
        self.indices
            .read()
            .map_err(|_| SearchError::Backend("index lock poisoned".to_string()))
    }

    fn write_lock(
        &self,
    ) -> SearchResult<std::sync::RwLockWriteGuard<'_, HashMap<String, IndexTable>>> {
        self.indices
            .write()
            .map_err(|_| SearchError::Backend("index lock poisoned".to_string()))
    }
}

impl SearchFacade for MemorySearchIndex {
    fn index(
        &self,
        index: &str,
        id: &str,
        routing: Option<&str>,
        document: Value,
    ) -> SearchResult<()> {
        if id.is_empty() {
            return Err(SearchError::Backend("document id must not be empty".to_string()));
        }
        let mut indices = self.write_lock()?;
        indices.entry(index.to_string()).or_default().insert(
            id.to_string(),
            IndexedDocument {
                routing: routing.map(str::to_string),
                source: document,
            },
        );
        Ok(())
    }

    fn remove(&self, index: &str, id: &str) -> SearchResult<()> {
        let mut indices = self.write_lock()?;
        if let Some(table) = indices.get_mut(index) {
            table.remove(id);
        }
        Ok(())
    }

    fn query(&self, index: &str, field: &str, value: &str) -> SearchResult<Vec<SearchHit>> {
        let indices = self.read_lock()?;
        let table = indices
            .get(index)
            .ok_or_else(|| SearchError::IndexNotFound(index.to_string()))?;

        let hits = table
            .iter()
            .filter(|(_, doc)| {
                lookup(&doc.source, field)
                    .and_then(FieldKey::from_json)
                    .map(|key| key.matches(value))
                    .unwrap_or(false)
            })
            .map(|(id, doc)| SearchHit {
                id: id.clone(),
                routing: doc.routing.clone(),
                source: doc.source.clone(),
            })
            .collect();
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_index_is_upsert() {
        let search = MemorySearchIndex::new();
        search.index("plans", "cs1", Some("p1"), json!({"copay": 23})).unwrap();
        search.index("plans", "cs1", Some("p1"), json!({"copay": 30})).unwrap();

        assert_eq!(search.count("plans"), 1);
        let hit = search.get("plans", "cs1").unwrap().unwrap();
        assert_eq!(hit.source["copay"], 30);
        assert_eq!(hit.routing.as_deref(), Some("p1"));
    }

    #[test]
    fn test_query_nested_field_in_id_order() {
        let search = MemorySearchIndex::new();
        search
            .index("plans", "s1", Some("lps1"), json!({"plan_join": {"parent": "lps1"}}))
            .unwrap();
        search
            .index("plans", "scs1", Some("lps1"), json!({"plan_join": {"parent": "lps1"}}))
            .unwrap();
        search
            .index("plans", "cs1", Some("p1"), json!({"plan_join": {"parent": "p1"}}))
            .unwrap();

        let hits = search.query("plans", "plan_join.parent", "lps1").unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "scs1"]);
    }

    #[test]
    fn test_query_unknown_index() {
        let search = MemorySearchIndex::new();
        assert!(matches!(
            search.query("nope", "a", "b"),
            Err(SearchError::IndexNotFound(_))
        ));
        search.create_index("nope").unwrap();
        assert!(search.query("nope", "a", "b").unwrap().is_empty());
    }

    #[test]
    fn test_remove_absent_is_ok() {
        let search = MemorySearchIndex::new();
        search.remove("plans", "ghost").unwrap();
        search.index("plans", "p1", None, json!({})).unwrap();
        search.remove("plans", "p1").unwrap();
        assert_eq!(search.count("plans"), 0);
    }
}

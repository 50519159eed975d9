//! Logical-to-physical endpoint routing.
//!
//! A multi-function device exposes its sub-units (pump, pH probe, chlorine
//! probe, ...) as numbered physical endpoints. The endpoint map makes that
//! assignment an explicit, auditable table keyed by logical role name
//! instead of relying on declaration order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::capability::{GatewayError, GatewayResult};

/// Mapping from logical sub-unit names to physical endpoint numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointMap {
    entries: BTreeMap<String, u8>,
}

impl EndpointMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from (logical name, physical endpoint) pairs.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u8)>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Insert one logical endpoint. Re-inserting a name replaces its
    /// physical endpoint.
    pub fn insert(&mut self, logical: impl Into<String>, physical: u8) {
        self.entries.insert(logical.into(), physical);
    }

    /// Resolve a logical name to its physical endpoint.
    pub fn resolve(&self, logical: &str) -> GatewayResult<u8> {
        self.entries
            .get(logical)
            .copied()
            .ok_or_else(|| GatewayError::UnknownEndpoint(logical.to_string()))
    }

    /// Reverse lookup: the logical names mapped to a physical endpoint.
    pub fn logical_names_for(&self, physical: u8) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(move |(_, p)| **p == physical)
            .map(|(name, _)| name.as_str())
    }

    /// Whether a logical name is mapped.
    pub fn contains(&self, logical: &str) -> bool {
        self.entries.contains_key(logical)
    }

    /// Iterate (logical, physical) pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// The set of physical endpoints this map references, deduplicated.
    pub fn physical_endpoints(&self) -> Vec<u8> {
        let mut endpoints: Vec<u8> = self.entries.values().copied().collect();
        endpoints.sort_unstable();
        endpoints.dedup();
        endpoints
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_map() -> EndpointMap {
        EndpointMap::from_entries([("pump", 2u8), ("ph", 3u8), ("chlorine", 4u8)])
    }

    #[test]
    fn test_resolve() {
        let map = pool_map();
        assert_eq!(map.resolve("ph").unwrap(), 3);
        assert_eq!(map.resolve("chlorine").unwrap(), 4);
    }

    #[test]
    fn test_unknown_endpoint() {
        let err = pool_map().resolve("algaecide").unwrap_err();
        assert_eq!(err, GatewayError::UnknownEndpoint("algaecide".to_string()));
    }

    #[test]
    fn test_reverse_lookup() {
        let map = pool_map();
        let names: Vec<&str> = map.logical_names_for(3).collect();
        assert_eq!(names, vec!["ph"]);
        assert_eq!(map.logical_names_for(9).count(), 0);
    }

    #[test]
    fn test_physical_endpoints_sorted_dedup() {
        let mut map = pool_map();
        map.insert("ph_alt", 3);
        assert_eq!(map.physical_endpoints(), vec![2, 3, 4]);
    }

    #[test]
    fn test_serde_is_a_plain_map() {
        let json = serde_json::to_string(&pool_map()).unwrap();
        assert_eq!(json, r#"{"chlorine":4,"ph":3,"pump":2}"#);
    }
}

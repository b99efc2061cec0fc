//! Entity Map
//!
//! Registry of the entities resolved so far in one environment's deployment.
//! Components deploy concurrently, so every access goes through one lock.
//!
//! ```text
//! put(entity) ──► entities[coordinate] = entity
//!             └─► names[type] += name     (only if !skip && name != "")
//! ```

use parking_lot::RwLock;
use shared_types::{Coordinate, ResolvedEntity};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
struct Inner {
    entities: HashMap<Coordinate, ResolvedEntity>,
    /// Entity names per config type, for uniqueness checks
    names: HashMap<String, HashSet<String>>,
}

/// Thread-safe registry of resolved entities.
#[derive(Debug, Default)]
pub struct EntityMap {
    inner: RwLock<Inner>,
}

impl EntityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a resolved entity.
    ///
    /// Skipped entities are recorded so dependents can see them, but never
    /// count toward name uniqueness.
    pub fn put(&self, entity: ResolvedEntity) {
        let mut inner = self.inner.write();
        if !entity.skip && !entity.entity_name.is_empty() {
            inner
                .names
                .entry(entity.coordinate.config_type.clone())
                .or_default()
                .insert(entity.entity_name.clone());
        }
        inner.entities.insert(entity.coordinate.clone(), entity);
    }

    /// Snapshot of every entity recorded so far.
    pub fn get(&self) -> HashMap<Coordinate, ResolvedEntity> {
        self.inner.read().entities.clone()
    }

    /// The entity recorded for one coordinate.
    pub fn get_entity(&self, coordinate: &Coordinate) -> Option<ResolvedEntity> {
        self.inner.read().entities.get(coordinate).cloned()
    }

    /// Whether a deployed entity of `config_type` already uses `name`.
    pub fn contains(&self, config_type: &str, name: &str) -> bool {
        self.inner
            .read()
            .names
            .get(config_type)
            .is_some_and(|names| names.contains(name))
    }

    pub fn contains_coordinate(&self, coordinate: &Coordinate) -> bool {
        self.inner.read().entities.contains_key(coordinate)
    }

    pub fn len(&self) -> usize {
        self.inner.read().entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::Properties;
    use std::sync::Arc;

    fn entity(id: &str, name: &str) -> ResolvedEntity {
        ResolvedEntity::new(Coordinate::new("p", "alerting-profile", id), name, Properties::new())
            .with_property("id", format!("remote-{id}"))
    }

    #[test]
    fn test_put_and_get() {
        let map = EntityMap::new();
        map.put(entity("a", "Profile A"));

        let snapshot = map.get();
        assert_eq!(snapshot.len(), 1);
        let stored = &snapshot[&Coordinate::new("p", "alerting-profile", "a")];
        assert_eq!(stored.id(), Some("remote-a"));
    }

    #[test]
    fn test_same_type_and_name_detected() {
        let map = EntityMap::new();
        map.put(entity("a", "Shared"));

        assert!(map.contains("alerting-profile", "Shared"));
        assert!(!map.contains("alerting-profile", "Other"));
        assert!(!map.contains("management-zone", "Shared"));

        map.put(entity("b", "Shared"));
        assert!(map.contains("alerting-profile", "Shared"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_skipped_entity_recorded_but_not_named() {
        let map = EntityMap::new();
        let mut skipped = entity("a", "Hidden");
        skipped.skip = true;
        map.put(skipped);

        assert!(map.contains_coordinate(&Coordinate::new("p", "alerting-profile", "a")));
        assert!(!map.contains("alerting-profile", "Hidden"));
    }

    #[test]
    fn test_empty_name_not_registered() {
        let map = EntityMap::new();
        map.put(entity("a", ""));

        assert!(!map.contains("alerting-profile", ""));
        assert!(!map.is_empty());
    }

    #[test]
    fn test_concurrent_puts() {
        let map = Arc::new(EntityMap::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let map = Arc::clone(&map);
                std::thread::spawn(move || {
                    for j in 0..50 {
                        map.put(entity(&format!("{i}-{j}"), &format!("name-{i}-{j}")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(map.len(), 400);
        assert!(map.contains("alerting-profile", "name-7-49"));
    }
}

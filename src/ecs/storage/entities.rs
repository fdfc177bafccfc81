//! Tracks where each spawned entity lives in storage.
//!
//! This is the glue between an [`entity::Entity`] handle and its [`Location`] (archetype,
//! table and row). Entities are looked up by their full handle, so a stale handle (wrong
//! generation) simply fails to resolve rather than returning another entity's data.

use std::collections::HashMap;

use crate::ecs::{entity, storage::Location};

/// A registry mapping live entities to their storage location.
#[derive(Default)]
pub struct Entities {
    locations: HashMap<entity::Entity, Location>,
}

impl Entities {
    /// Create a new, empty entity registry.
    #[inline]
    pub fn new() -> Self {
        Self {
            locations: HashMap::new(),
        }
    }

    /// Returns `true` if the given entity is currently spawned.
    #[inline]
    pub fn is_spawned(&self, entity: entity::Entity) -> bool {
        self.locations.contains_key(&entity)
    }

    /// Get the storage location for the given entity, if it's spawned.
    #[inline]
    pub fn location(&self, entity: entity::Entity) -> Option<Location> {
        self.locations.get(&entity).copied()
    }

    /// Record the storage location for an entity, replacing any previous location.
    #[inline]
    pub fn set(&mut self, entity: entity::Entity, location: Location) {
        self.locations.insert(entity, location);
    }

    /// Remove an entity's location, returning it if it was present.
    #[inline]
    pub fn remove(&mut self, entity: entity::Entity) -> Option<Location> {
        self.locations.remove(&entity)
    }

    /// Get the number of currently spawned entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Returns `true` if no entities are currently spawned.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::storage::{archetype, table};

    fn entity(id: u32) -> entity::Entity {
        entity::Entity::new(id.into())
    }

    fn location(row: usize) -> Location {
        Location::new(archetype::Id::new(0), table::Id::new(0), row.into())
    }

    #[test]
    fn new_entities_registry_is_empty() {
        let entities = Entities::new();
        assert!(entities.is_empty());
        assert_eq!(entities.len(), 0);
    }

    #[test]
    fn set_and_get_location() {
        let mut entities = Entities::new();
        let e = entity(1);

        entities.set(e, location(0));

        assert!(entities.is_spawned(e));
        assert_eq!(entities.location(e), Some(location(0)));
    }

    #[test]
    fn unspawned_entity_has_no_location() {
        let entities = Entities::new();
        assert!(!entities.is_spawned(entity(1)));
        assert_eq!(entities.location(entity(1)), None);
    }

    #[test]
    fn remove_clears_location() {
        let mut entities = Entities::new();
        let e = entity(1);
        entities.set(e, location(0));

        let removed = entities.remove(e);

        assert_eq!(removed, Some(location(0)));
        assert!(!entities.is_spawned(e));
    }

    #[test]
    fn stale_generation_does_not_resolve() {
        let mut entities = Entities::new();
        let e = entity(1);
        entities.set(e, location(0));

        let stale = e.genned();

        assert!(!entities.is_spawned(stale));
        assert!(entities.is_spawned(e));
    }

    #[test]
    fn set_overwrites_previous_location() {
        let mut entities = Entities::new();
        let e = entity(1);
        entities.set(e, location(0));
        entities.set(e, location(5));

        assert_eq!(entities.location(e), Some(location(5)));
    }
}

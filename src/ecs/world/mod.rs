//! The World is the central container for all entities, components, and systems in the ECS.
//!
//! A `World` manages the lifecycle of entities and their associated component data. It provides
//! the primary API for spawning and despawning entities, as well as accessing and modifying
//! their components.
//!
//! # Architecture
//!
//! The World coordinates several subsystems:
//! - **Entity Allocator**: Manages entity ID allocation and reuse
//! - **Entity Registry**: Tracks which entities are spawned and their storage locations
//! - **Component Registry**: Maintains metadata about registered component types
//! - **Storage**: Manages the actual component data organized by archetype
//! - **Archetype Registry**: Tracks unique combinations of component types
//!
//! # Example
//!
//! ```ignore
//! use rusty_engine::ecs::world::World;
//!
//! let mut world = World::new(Id(1));
//!
//! // Spawn an entity with components
//! let entity = world.spawn((Position { x: 0.0, y: 0.0 }, Velocity { dx: 1.0, dy: 0.0 }));
//!
//! // Access the entity
//! if let Some(entity_ref) = world.entity(entity) {
//!     let pos = entity_ref.get::<Position>().unwrap();
//! }
//!
//! // Despawn the entity
//! world.despawn(entity);
//! ```
mod access;
mod shard;
mod type_registry;

use std::cell::RefCell;
use std::marker::PhantomData;

use crate::ecs::{
    component::{self},
    entity,
    query::{self},
    storage::{self},
    unique,
    world::access::{ConflictError, GrantTracker},
};

/// Exported types for world access control.
pub use access::{AccessGrant, AccessPolicy, AccessRequest};
pub use shard::Shard;
pub use type_registry::{TypeId, TypeInfo, TypeRegistry};

/// A world identifier. This is a unique identifier for a world in the ECS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u32);

impl Id {
    /// Create a new world identifier.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Id(id)
    }

    /// Get the raw identifier value.
    #[inline]
    pub const fn id(&self) -> u32 {
        self.0
    }
}

/// The World is the central container for all entities, components, and their relationships.
///
/// A World manages entity lifecycles, component storage, and provides the primary API for
/// interacting with the ECS. Each world is isolated from other worlds and maintains its own
/// set of entities and components.
pub struct World {
    /// The world's unique identifier.
    id: Id,

    /// The world's entity allocator.
    entity_allocator: entity::Allocator,

    /// The registry of all know resource types in the world.
    resources: TypeRegistry,

    /// The storage for components in the world.
    storage: storage::Storage,

    /// The current access grants for the world.
    active_grants: RefCell<GrantTracker>,

    /// Marker to make World !Send. World must stay on the main thread.
    _not_send: PhantomData<*mut ()>,
}

impl World {
    pub fn new(id: Id) -> Self {
        Self {
            id,
            entity_allocator: entity::Allocator::default(),
            resources: TypeRegistry::default(),
            storage: storage::Storage::default(),
            active_grants: RefCell::new(GrantTracker::default()),
            _not_send: PhantomData,
        }
    }

    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    #[inline]
    pub fn resources(&self) -> &TypeRegistry {
        &self.resources
    }

    /// Alias of [`Self::resources`] for call sites that look up component (rather than
    /// unique) type info; both share the same underlying registry.
    #[inline]
    pub fn components(&self) -> &TypeRegistry {
        &self.resources
    }

    #[inline]
    pub fn archetypes(&self) -> &storage::archetype::Archetypes {
        self.storage.archetypes()
    }

    #[inline]
    pub fn storage(&self) -> &storage::Storage {
        &self.storage
    }

    #[inline]
    pub fn storage_mut(&mut self) -> &mut storage::Storage {
        &mut self.storage
    }

    /// Spawn a new entity with the given set of components in the world.
    /// This will establish the entity in the appropriate archetype and storage table.
    pub fn spawn<V: storage::Values>(&mut self, set: V) -> entity::Entity {
        // Allocate a new entity.
        let entity = self.entity_allocator.alloc();

        // Spawn the entity in storage.
        self.storage.spawn_entity(entity, set, &self.resources);

        entity
    }

    /// Spawn a new entity with the given set of components in the world.
    /// This will establish the entity in the appropriate archetype and storage table.
    pub fn spawn_many<V: storage::Values>(
        &mut self,
        values: impl IntoIterator<Item = V>,
    ) -> Vec<entity::Entity> {
        // Get the component sets as a vec.
        let sets = values.into_iter();

        // Allocate a new entities based on the number of values.
        let entities = self.entity_allocator.alloc_many(sets.size_hint().0);

        // Spawn the entities in storage with the component sets.
        self.storage
            .spawn_entities(entities.iter().copied().zip(sets), &self.resources);

        entities
    }

    /// Spawn a new entity from a type-erased component set.
    ///
    /// Dynamic equivalent of [`Self::spawn`], used by the command buffer where the component
    /// types aren't known at compile time.
    pub fn spawn_dynamic(&mut self, entity: entity::Entity, components: component::BoxedSet) {
        self.storage.spawn_dynamic(entity, components, &self.resources);
    }

    /// Despawn the given entity from the world. This will remove the entity and all its components
    /// from storage.
    ///
    /// If the entity is not currently spawned, this method does nothing.
    pub fn despawn(&mut self, entity: entity::Entity) {
        // Delegate to storage to despawn the entity.
        self.storage.despawn_entity(entity);
    }

    /// Add a component to an existing entity.
    ///
    /// This migrates the entity to a new archetype that includes the new component.
    /// If the entity already has this component type, this method does nothing.
    ///
    /// # Returns
    /// - `true` if the component was added
    /// - `false` if the entity doesn't exist or already has this component
    pub fn add_components<V: storage::Values>(
        &mut self,
        entity: entity::Entity,
        components: V,
    ) -> bool {
        self.storage
            .add_components(entity, components, &self.resources)
    }

    /// Remove a component from an existing entity.
    ///
    /// This migrates the entity to a new archetype that excludes the component.
    /// If the entity doesn't have this component type, this method does nothing.
    ///
    /// # Returns
    /// - `true` if the component was removed
    /// - `false` if the entity doesn't exist or doesn't have this component
    pub fn remove_components<S: component::IntoSpec>(&mut self, entity: entity::Entity) -> bool {
        self.storage.remove_components::<S>(entity, &self.resources)
    }

    /// Add components to an existing entity from a type-erased component set.
    ///
    /// Dynamic equivalent of [`Self::add_components`], used by the command buffer where the
    /// component types aren't known at compile time.
    pub fn add_components_dynamic(
        &mut self,
        entity: entity::Entity,
        components: component::BoxedSet,
    ) -> bool {
        self.storage
            .add_components_dynamic(entity, components, &self.resources)
    }

    /// Remove components from an existing entity by a runtime [`component::Spec`].
    ///
    /// Dynamic equivalent of [`Self::remove_components`], used by the command buffer where the
    /// component types aren't known at compile time.
    pub fn remove_components_dynamic(
        &mut self,
        entity: entity::Entity,
        spec: &component::Spec,
    ) -> bool {
        self.storage
            .remove_components_dynamic(entity, spec, &self.resources)
    }
    /// Get a reference to the given entity, if it's spawned.
    ///
    /// Returns `None` if the entity is not currently spawned in the world.
    pub fn entity(&self, entity: entity::Entity) -> Option<entity::Ref<'_>> {
        self.storage_for(entity)
            .map(|(table, row)| entity::Ref::new(entity, table, row))
    }

    /// Get a mutable reference to the given entity, if it's spawned.
    ///
    /// Returns `None` if the entity is not currently spawned in the world.
    ///
    /// # Note
    /// This method holds a mutable reference to the entire world's storage, preventing
    /// any other access while the `RefMut` is held. For performance-critical code,
    /// consider using queries/systems that can access multiple entities efficiently.
    pub fn entity_mut(&mut self, entity: entity::Entity) -> Option<entity::RefMut<'_>> {
        let loc = self.storage.location_for(entity)?;
        let table = self.storage.get_table_mut(loc.table_id());
        Some(entity::RefMut::new(entity, table, loc.row()))
    }

    /// Get the storage table and row for a reference to the given entity, if the entity is spawned.
    pub fn storage_for(&self, entity: entity::Entity) -> Option<(&storage::Table, storage::Row)> {
        let loc = self.storage.location_for(entity)?;
        Some((self.storage.get_table(loc.table_id()), loc.row()))
    }

    /// Get the storage table and row for a mutable reference to the given entity, if the entity is
    /// spawned.
    pub fn storage_for_mut(
        &mut self,
        entity: entity::Entity,
    ) -> Option<(&mut storage::Table, storage::Row)> {
        let loc = self.storage.location_for(entity)?;
        Some((self.storage.get_table_mut(loc.table_id()), loc.row()))
    }

    /// Register a new component type in the world.
    pub fn register_component<C: component::Component>(&mut self) -> TypeId {
        self.resources.register_component::<C>()
    }

    /// Perform a world query to access all entities that match the query data `D`.
    ///
    ///
    /// Note: This holds a mutable reference to the entire world while the query result is active
    /// (use wisely).
    pub fn query<'w, D: query::Data>(&'w mut self) -> query::Result<'w, D> {
        let query = query::Query::<D>::new(&self.resources);
        query.invoke(self)
    }

    /// Register a new resource type in the world.
    pub fn register_unique<U: unique::Unique>(&mut self) -> TypeId {
        self.resources.register_unique::<U>()
    }

    /// Add a unique resource to the world.
    #[inline]
    pub fn add_unique<U: unique::Unique>(&mut self, resource: U) {
        self.storage.uniques_mut().insert::<U>(resource);
    }

    /// Get access to a unique resource stored in the world, if it exists.
    #[inline]
    pub fn get_unique<U: unique::Unique>(&self) -> Option<&U> {
        self.storage.uniques().get::<U>()
    }

    /// Get mutable access to a unique resource stored in the world, if it exists.
    #[inline]
    pub fn get_unique_mut<U: unique::Unique>(&mut self) -> Option<&mut U> {
        self.storage.uniques_mut().get_mut::<U>()
    }

    /// Remove a unique resource from the world, returning it if it existed.
    #[inline]
    pub fn remove_unique<U: unique::Unique>(&mut self) -> Option<U> {
        self.storage.uniques_mut().remove::<U>()
    }

    /// Create a shard with the requested access.
    ///
    /// Takes `&self` to allow multiple shards to coexist.
    /// Uses interior mutability to track active grants.
    pub fn shard(&self, access: &AccessRequest) -> Result<Shard<'_>, ConflictError> {
        // Check for conflicts and register grant
        let grant = self.active_grants.borrow_mut().check_and_grant(access)?;
        // Return the shard
        Ok(Shard::new(self as *const World as *mut World, grant))
    }

    /// Release a shard of this world.
    ///
    /// Must be called on the main thread (where the World lives).
    pub fn release_shard(&self, shard: Shard) {
        self.active_grants.borrow_mut().remove(&shard.into_grant());
    }

    /// Release a grant that was returned from a shard via `into_grant()`. This should consume the
    /// grant to prevent double-releasing.
    ///
    /// Note: Its generally safer to use `release_shard()` when possible.
    ///
    /// Must be called on the main thread (where the World lives).
    pub fn release_grant(&self, grant: &AccessGrant) {
        self.active_grants.borrow_mut().remove(grant);
    }
}

// World is intentionally !Send and !Sync:
// - !Send: World must stay on the main thread where it was created
// - !Sync: RefCell<GrantTracker> is !Sync, and we don't want &World shared across threads
//
// The _not_send marker ensures !Send (RefCell is Send, so we need the marker).
// RefCell naturally provides !Sync.

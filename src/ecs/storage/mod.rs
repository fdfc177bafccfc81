//! Type-erased columnar storage for Entity Component System (ECS).
//!
//! This module provides the foundational storage layer for the ECS, implementing efficient,
//! cache-friendly columnar storage with type erasure. It enables storing heterogeneous component
//! types in a uniform, high-performance manner while maintaining memory safety through careful
//! abstraction layers.
//!
//! # Architecture Overview
//!
//! The storage system is built on a layered architecture where each layer provides progressively
//! safer abstractions:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Application Layer                                              │
//! │  - Queries, Systems, Component Access                           │
//! └────────────────────────────┬────────────────────────────────────┘
//!                              │
//! ┌────────────────────────────▼────────────────────────────────────┐
//! │  Tables (this module)                                           │
//! │  - High-level: Multi-column entity storage (archetype pattern)  │
//! │  - Type-safe API with runtime validation                        │
//! │  - Entity → Row index mapping                                   │
//! └──────────────┬───────────────────────────┬──────────────────────┘
//!                │                           │
//!       ┌────────▼─────────┐        ┌────────▼─────────┐
//!       │  Column          │        │  Index           │
//!       │  - Type-erased   │        │  - Entity → Row  │
//!       │  - Debug checks  │        │  - O(1) lookup   │
//!       └────────┬─────────┘        └──────────────────┘
//!                │
//!       ┌────────▼─────────┐
//!       │  IndexedMemory   │
//!       │  - Raw unsafe    │
//!       │  - Zero-cost     │
//!       └──────────────────┘
//! ```
//!
//! # Core Concepts
//!
//! ## Columnar Storage (Structure of Arrays)
//!
//! Instead of storing entity data as `Vec<(Entity, ComponentA, ComponentB)>`, we use
//! **columnar storage** where each component type gets its own contiguous array:
//!
//! ```text
//!
//! Columnar (Structure of Arrays):
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Entities: [E1, E2, E3]                                      │
//! │                                                             │
//! │ Position Column: [Pos{x:1,y:2}, Pos{x:3,y:4}, Pos{x:5,y:6}] │ ← Cache-friendly!
//! │                  ▲▲▲▲▲▲▲▲▲▲▲▲▲▲▲▲▲▲▲▲▲▲▲▲▲▲▲▲▲▲▲▲▲▲▲▲▲▲▲▲   │
//! │                  All sequential in memory                   │
//! │                                                             │
//! │ Velocity Column: [Vel{dx:0.5}, Vel{dx:-0.2}, Vel{dx:0.0}]   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! **Benefits:**
//! - **Cache efficiency**: Iterating positions reads sequential memory
//! - **SIMD potential**: Contiguous data enables vectorization
//! - **No wasted space**: No `Option<Component>` for missing components
//! - **Flexible schemas**: Easy to add/remove component types
//!
//! ## Archetype Pattern
//!
//! Entities with the **exact same set of components** are stored in the same [`Table`].
//! Each unique component combination creates a new archetype:
//!
//! ```text
//! World:
//!   Table 1: [Position, Velocity]          ← Archetype A
//!     - Entity 0: Pos, Vel
//!     - Entity 1: Pos, Vel
//!     - Entity 5: Pos, Vel
//!
//!   Table 2: [Position, Health]            ← Archetype B
//!     - Entity 2: Pos, Health
//!     - Entity 4: Pos, Health
//!
//!   Table 3: [Position, Velocity, Health]  ← Archetype C
//!     - Entity 3: Pos, Vel, Health
//! ```
//!
//! **Benefits:**
//! - Fast iteration (no sparse checks)
//! - Clear ownership (entity in exactly one table)
//! - Efficient queries (know which tables to scan)
//!
//! **Trade-off:**
//! - Adding/removing components moves entity to different table
//!
//! ## Type Erasure
//!
//! Component types are erased at runtime, allowing:
//! - Dynamic component registration
//! - Uniform storage for heterogeneous types
//! - Runtime-defined component combinations
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ Column<Position>                         │
//! │  - Knows: Layout, drop function          │
//! │  - Stores: Raw bytes (*mut u8)           │
//! │  - Type checked in debug mode            │
//! └────────────┬─────────────────────────────┘
//!              │
//!              ▼
//! ┌──────────────────────────────────────────┐
//! │ IndexedMemory                            │
//! │  - Just bytes: [u8; N * sizeof(T)]       │
//! │  - No type info at this level            │
//! └──────────────────────────────────────────┘
//! ```
//!
//! # Module Structure
//!
//! ## Public Types
//!
//! - [`Table`] - Multi-column storage for entities with the same component set
//! - [`Tables`] - Collection of tables (archetype manager)
//!
//! ## Internal Types
//!
//! - `Column` - Single-type columnar storage (type-erased)
//! - `IndexedMemory` - Low-level memory allocation (unsafe)
//! - `Cell` / `CellMut` - Type-safe component access
//! - `Row` - Type-safe row index
//! - `Index` - Entity → Row mapping trait
//! - `DynamicIndex` - Block-based entity index (default)
//! - `HashIndex` - HashMap-based entity index (fallback)
//!
//! # Usage Example
//!
//! ```rust,ignore
//! use rusty_engine::ecs::storage::{Table, Tables};
//! use rusty_engine::ecs::{component, entity};
//! use rusty_macros::Component;
//!
//! // Define components
//! #[derive(Component)]
//! struct Position { x: f32, y: f32 }
//!
//! #[derive(Component)]
//! struct Velocity { dx: f32, dy: f32 }
//!
//! // Setup
//! let mut registry = component::Registry::new();
//! let pos_id = registry.register_component::<Position>();
//! let vel_id = registry.register_component::<Velocity>();
//!
//! // Create table for [Position, Velocity] archetype
//! let spec = component::Spec::new(vec![pos_id, vel_id]);
//! let mut table = Table::new(Id::new(0), spec, &mut registry);
//!
//! // Add entity with both components atomically
//! let mut allocator = entity::Allocator::new();
//! let entity = allocator.alloc();
//!
//! table.add_entity(
//!     entity,
//!     (Position { x: 1.0, y: 2.0 }, Velocity { dx: 0.5, dy: 0.3 }),
//!     &mut registry
//! );
//!
//! // Access components via column iteration (cache-friendly!)
//! let pos_column = table.get_column(pos_id).unwrap();
//! unsafe {
//!     for pos in pos_column.iter::<Position>() {
//!         println!("Entity at ({}, {})", pos.x, pos.y);
//!     }
//! }
//!
//! // Or access specific entity components
//! unsafe {
//!     if let Some(pos) = table.get::<Position>(entity, pos_id) {
//!         println!("Entity {} at ({}, {})", entity.index(), pos.x, pos.y);
//!     }
//! }
//! ```
//!
//! # Safety Guarantees
//!
//! The storage layer maintains several critical invariants:
//!
//! ## Table Invariants
//! - **Synchronization**: `entities.len() == columns[i].len()` for all columns
//! - **Index consistency**: Entity → Row mapping always correct
//! - **Type safety**: Components match their registered types
//! - **Atomicity**: All components added/removed together
//!
//! ## Column Invariants
//! - **Initialization**: Elements [0..len) always initialized
//! - **Capacity**: `len <= capacity` at all times
//! - **Drop safety**: Removed components properly dropped
//! - **Type consistency**: All elements are the same type
//!
//! ## Memory Invariants
//! - **Valid pointers**: Non-null when capacity > 0
//! - **No double-free**: Each allocation freed exactly once
//! - **No leaks**: All elements dropped before deallocation
//! - **Layout consistency**: Matches component type layout
//!
//! # Performance Characteristics
//!
//! | Operation | Time | Notes |
//! |-----------|------|-------|
//! | Column iteration | O(n) | Cache-friendly, ~3-10ns per element |
//! | Entity lookup | O(1) | Via index, ~25-50µs typical |
//! | Add entity | O(c) | c = number of components |
//! | Remove entity | O(c) | Swap-remove, c = number of components |
//! | Get component | O(1) | Direct index, bounds-checked in debug |
//!
//! # Design Decisions
//!
//! ## Why Type Erasure?
//!
//! - **Runtime flexibility**: Components registered at runtime
//! - **Dynamic archetypes**: Unknown component combinations
//! - **Uniform storage**: Single implementation for all types
//!
//! ## Why Columnar Storage?
//!
//! - **Cache efficiency**: 80-90% of systems iterate single component types
//! - **SIMD opportunities**: Contiguous data enables vectorization
//! - **Query performance**: Common case (single-component iteration) is fastest
//!
//! ## Why Archetype Pattern?
//!
//! - **No sparse storage**: Every entity has all components in its table
//! - **Fast iteration**: No branch prediction failures from Option checks
//! - **Clear semantics**: Entity existence tied to archetype membership
//!
//! ## Trade-offs
//!
//! **Pros:**
//! - Extremely fast iteration (main ECS operation)
//! - Memory efficient (no Option overhead)
//! - Good cache locality
//!
//! **Cons:**
//! - Adding/removing components requires table migration
//! - Entity lookup is O(1) but not free (~25-50µs)
//! - More tables for diverse entity types
//!
//! # Thread Safety
//!
//! The storage types are **not** thread-safe by default:
//! - No internal synchronization
//! - Designed for single-threaded access per table
//! - Use external synchronization (e.g., RwLock) for parallel access
//!
//! # Future Work
//! - may add parallel iteration support
//! - Consider the approach used by Legion ECS to keep all component data in a single allocation and index from archetype into it.
//!
//! # Related Documentation
//!
//! For implementation details, see the source code of internal modules:
//! - `mem` - Low-level memory allocation details
//! - `column` - Type-erased column implementation  
//! - `index` - Entity-to-row index implementations
//! - `table` - Multi-column table implementation
//!

use std::collections::HashMap;

pub use location::Location;
pub use row::Row;
pub use table::{Id as TableId, Table};

use crate::ecs::{component, entity, storage::table::Id};

pub mod archetype;
pub(crate) mod cell;
pub(crate) mod column;
pub(crate) mod entities;
pub(crate) mod index;
pub(crate) mod location;
pub(crate) mod mem;
pub(crate) mod row;
pub(crate) mod table;
pub mod unique;
pub mod value;
pub mod view;

pub use entities::Entities;
pub use unique::Uniques;
pub use value::Values;

/// A collection of tables, each storing entities with a specific component layout.
#[derive(Default)]
pub struct Storage {
    /// The vec of know tables.
    tables: Vec<Table>,

    /// A map from archetype to table.
    table_map: HashMap<component::Spec, table::Id>,

    /// The archetypes known to storage, one per unique component combination.
    archetypes: archetype::Archetypes,

    /// Tracks where each spawned entity currently lives.
    entities: Entities,

    /// Singleton values stored alongside entity data.
    uniques: Uniques,
}

impl Storage {
    /// Create a new empty Tables collection.
    #[inline]
    pub fn new() -> Self {
        Self {
            tables: Vec::new(),
            table_map: HashMap::new(),
            archetypes: archetype::Archetypes::new(),
            entities: Entities::new(),
            uniques: Uniques::new(),
        }
    }

    /// Get the archetype registry.
    #[inline]
    pub fn archetypes(&self) -> &archetype::Archetypes {
        &self.archetypes
    }

    /// Get the entity location registry.
    #[inline]
    pub fn entities(&self) -> &Entities {
        &self.entities
    }

    /// Get the storage location for a given entity, if it's spawned.
    #[inline]
    pub fn location_for(&self, entity: entity::Entity) -> Option<Location> {
        self.entities.location(entity)
    }

    /// Get a reference to the singleton value storage.
    #[inline]
    pub fn uniques(&self) -> &Uniques {
        &self.uniques
    }

    /// Get a mutable reference to the singleton value storage.
    #[inline]
    pub fn uniques_mut(&mut self) -> &mut Uniques {
        &mut self.uniques
    }

    /// Get or create the archetype for the given component spec, backed by the given table.
    fn ensure_archetype(&mut self, spec: component::Spec, table_id: table::Id) -> archetype::Id {
        if let Some(existing) = self.archetypes.get_by_spec(&spec) {
            existing.id()
        } else {
            self.archetypes.create(spec, table_id)
        }
    }

    /// Spawn a new entity into storage with the given component values.
    pub fn spawn_entity<V: Values>(
        &mut self,
        entity: entity::Entity,
        values: V,
        registry: &component::Registry,
    ) {
        let spec = V::into_spec(registry);
        let table_id = self.get_or_create_table(spec.clone(), registry).id();
        let archetype_id = self.ensure_archetype(spec, table_id);

        let row = self.get_table_mut(table_id).add_entity(entity, values);
        self.entities
            .set(entity, Location::new(archetype_id, table_id, row));
    }

    /// Spawn many entities sharing the same component set into storage.
    pub fn spawn_entities<V: Values>(
        &mut self,
        values: impl IntoIterator<Item = (entity::Entity, V)>,
        registry: &component::Registry,
    ) {
        let spec = V::into_spec(registry);
        let table_id = self.get_or_create_table(spec.clone(), registry).id();
        let archetype_id = self.ensure_archetype(spec, table_id);

        let placed = self.get_table_mut(table_id).add_entities(values);
        for (row, entity) in placed {
            self.entities
                .set(entity, Location::new(archetype_id, table_id, row));
        }
    }

    /// Spawn a new entity into storage from a type-erased component set.
    ///
    /// Dynamic equivalent of [`Self::spawn_entity`], for callers (such as the command buffer)
    /// that don't know the component types at compile time.
    pub fn spawn_dynamic(
        &mut self,
        entity: entity::Entity,
        components: component::BoxedSet,
        registry: &component::Registry,
    ) {
        let spec = components.spec().clone();
        let table_id = self.get_or_create_table(spec.clone(), registry).id();
        let archetype_id = self.ensure_archetype(spec, table_id);

        let row = self
            .get_table_mut(table_id)
            .add_entity_dynamic(entity, components, registry);
        self.entities
            .set(entity, Location::new(archetype_id, table_id, row));
    }

    /// Despawn an entity, removing it and all its components from storage.
    ///
    /// Does nothing if the entity isn't currently spawned.
    pub fn despawn_entity(&mut self, entity: entity::Entity) {
        let Some(location) = self.entities.remove(entity) else {
            return;
        };

        let table = self.get_table_mut(location.table_id());
        if let Some(moved_entity) = table.swap_remove_row(location.row()) {
            self.entities.set(moved_entity, location);
        }
    }

    /// Add components to an existing entity, migrating it to a new archetype.
    ///
    /// Returns `false` if the entity isn't spawned, or if it already has every component
    /// in `values`.
    pub fn add_components<V: Values>(
        &mut self,
        entity: entity::Entity,
        values: V,
        registry: &component::Registry,
    ) -> bool {
        let Some(location) = self.entities.location(entity) else {
            return false;
        };

        let current_spec = self.get_table(location.table_id()).components();
        let additions_spec = V::into_spec(registry);
        let target_spec = current_spec.merge(&additions_spec);
        if target_spec == current_spec {
            // Entity already has every component being added.
            return false;
        }

        let target_table_id = self.get_or_create_table(target_spec.clone(), registry).id();
        let target_archetype_id = self.ensure_archetype(target_spec, target_table_id);

        let (extract, moved_entity) = self
            .get_table_mut(location.table_id())
            .extract_and_swap_row(location.row(), &current_spec);
        if let Some(moved) = moved_entity {
            self.entities.set(moved, location);
        }

        let new_row = self
            .get_table_mut(target_table_id)
            .add_entity_from_extract(entity, extract, values);
        self.entities
            .set(entity, Location::new(target_archetype_id, target_table_id, new_row));

        true
    }

    /// Add components to an existing entity from a type-erased component set, migrating it to a
    /// new archetype.
    ///
    /// Dynamic equivalent of [`Self::add_components`], for callers (such as the command buffer)
    /// that don't know the component types at compile time.
    ///
    /// Returns `false` if the entity isn't spawned, or if it already has every component being
    /// added.
    pub fn add_components_dynamic(
        &mut self,
        entity: entity::Entity,
        components: component::BoxedSet,
        registry: &component::Registry,
    ) -> bool {
        let Some(location) = self.entities.location(entity) else {
            return false;
        };

        let current_spec = self.get_table(location.table_id()).components();
        let target_spec = current_spec.merge(components.spec());
        if target_spec == current_spec {
            return false;
        }

        let target_table_id = self.get_or_create_table(target_spec.clone(), registry).id();
        let target_archetype_id = self.ensure_archetype(target_spec, target_table_id);

        let (extract, moved_entity) = self
            .get_table_mut(location.table_id())
            .extract_and_swap_row(location.row(), &current_spec);
        if let Some(moved) = moved_entity {
            self.entities.set(moved, location);
        }

        let new_row = self.get_table_mut(target_table_id).add_entity_from_extract_dynamic(
            entity,
            extract,
            components,
            registry,
        );
        self.entities
            .set(entity, Location::new(target_archetype_id, target_table_id, new_row));

        true
    }

    /// Remove components from an existing entity, migrating it to a new archetype.
    ///
    /// Returns `false` if the entity isn't spawned, or if it doesn't have every component
    /// in `S`.
    pub fn remove_components<S: component::IntoSpec>(
        &mut self,
        entity: entity::Entity,
        registry: &component::Registry,
    ) -> bool {
        let Some(location) = self.entities.location(entity) else {
            return false;
        };

        let current_spec = self.get_table(location.table_id()).components();
        let removal_spec = S::into_spec(registry);
        if !current_spec.contains_all(&removal_spec) {
            return false;
        }

        let remaining_spec = current_spec.difference(&removal_spec);

        let target_table_id = self
            .get_or_create_table(remaining_spec.clone(), registry)
            .id();
        let target_archetype_id = self.ensure_archetype(remaining_spec.clone(), target_table_id);

        let (extract, moved_entity) = self
            .get_table_mut(location.table_id())
            .extract_and_swap_row(location.row(), &remaining_spec);
        if let Some(moved) = moved_entity {
            self.entities.set(moved, location);
        }

        let new_row = self
            .get_table_mut(target_table_id)
            .add_entity_from_extract(entity, extract, ());
        self.entities
            .set(entity, Location::new(target_archetype_id, target_table_id, new_row));

        true
    }

    /// Remove components from an existing entity by a runtime [`component::Spec`], migrating it
    /// to a new archetype.
    ///
    /// Dynamic equivalent of [`Self::remove_components`], for callers (such as the command
    /// buffer) that only have the component types as a type-erased spec.
    ///
    /// Returns `false` if the entity isn't spawned, or if it doesn't have every component in
    /// `removal_spec`.
    pub fn remove_components_dynamic(
        &mut self,
        entity: entity::Entity,
        removal_spec: &component::Spec,
        registry: &component::Registry,
    ) -> bool {
        let Some(location) = self.entities.location(entity) else {
            return false;
        };

        let current_spec = self.get_table(location.table_id()).components();
        if !current_spec.contains_all(removal_spec) {
            return false;
        }

        let remaining_spec = current_spec.difference(removal_spec);

        let target_table_id = self
            .get_or_create_table(remaining_spec.clone(), registry)
            .id();
        let target_archetype_id = self.ensure_archetype(remaining_spec.clone(), target_table_id);

        let (extract, moved_entity) = self
            .get_table_mut(location.table_id())
            .extract_and_swap_row(location.row(), &remaining_spec);
        if let Some(moved) = moved_entity {
            self.entities.set(moved, location);
        }

        let new_row = self
            .get_table_mut(target_table_id)
            .add_entity_from_extract(entity, extract, ());
        self.entities
            .set(entity, Location::new(target_archetype_id, target_table_id, new_row));

        true
    }

    pub fn create(
        &mut self,
        components: component::Spec,
        registry: &component::Registry,
    ) -> &mut Table {
        // Grab the index the table will be stored at.
        let id = table::Id::new(self.tables.len() as u32);
        // Create a new table from this archetype's components.
        let table = Table::from_spec(id, &components, registry);
        // Add the table to the map (requires one clone for HashMap key)
        self.table_map.insert(components, id);
        self.tables.push(table);
        // Return a mutable reference
        self.get_table_mut(id)
    }

    /// Get an existing table for the given component spec, or create a new one if it doesn't
    /// exist.
    ///
    /// # Panics
    ///  - if any component in the spec is not registered in the provided registry.
    pub fn get_or_create_table(
        &mut self,
        components: component::Spec,
        registry: &component::Registry,
    ) -> &mut Table {
        if let Some(id) = self.table_map.get(&components) {
            return self.get_table_mut(*id);
        }
        self.create(components, registry)
    }

    /// Get an existing table by id, if it exists, otherwise panic.
    ///
    /// # Panics
    /// - if the id is out of bounds
    pub fn get_table(&self, table_id: Id) -> &Table {
        assert!(
            table_id.index() < self.tables.len(),
            "table id out of bounds"
        );
        &self.tables[table_id.index()]
    }

    /// Get an existing mutable table, if it exists, otherwise panic.
    ///
    /// # Panics
    /// - if the id is out of bounds
    pub fn get_table_mut(&mut self, table_id: Id) -> &mut Table {
        assert!(
            table_id.index() < self.tables.len(),
            "table id out of bounds"
        );
        &mut self.tables[table_id.index()]
    }

    /// Returns a list of table IDs that support all the provided components.
    pub fn supporting(&self, components: &component::Spec) -> Vec<table::Id> {
        self.tables
            .iter()
            .filter_map(|table| {
                if table.components().contains_all(components) {
                    Some(table.id())
                } else {
                    None
                }
            })
            .collect()
    }
}

//! View trait and implementations for accessing components of a single entity from a table.
//!
//! This module provides the [`View`] trait, which enables type-safe, ergonomic access to
//! component data for a single entity row within a table. Views are the read-side complement
//! to the [`Set`](crate::ecs::component::Set) trait used for writing components.
//!
//! # Overview
//!
//! A [`View`] represents a query for one or more component types for a single entity.
//! It provides compile-time type safety and zero-cost abstraction over direct column access.
//!
//! # Usage Examples
//!
//! ## Single Component View
//!
//! ```rust,ignore
//! use rusty_engine::ecs::storage::{Table, view::View};
//! use rusty_macros::Component;
//!
//! #[derive(Component)]
//! struct Position { x: f32, y: f32 }
//!
//! // Read-only access
//! let pos: Option<&Position> = unsafe {
//!     table.view(row, &registry)
//! };
//!
//! // Mutable access
//! let pos: Option<&mut Position> = unsafe {
//!     table.view_mut(row, &registry)
//! };
//! ```
//!
//! ## Multiple Component View (Tuples)
//!
//! ```rust,ignore
//! #[derive(Component)]
//! struct Position { x: f32, y: f32 }
//!
//! #[derive(Component)]
//! struct Velocity { dx: f32, dy: f32 }
//!
//! // Read multiple components
//! let view: Option<(&Position, &Velocity)> = unsafe {
//!     table.view(row, &registry)
//! };
//!
//! if let Some((pos, vel)) = view {
//!     println!("Entity at ({}, {}) moving ({}, {})", pos.x, pos.y, vel.dx, vel.dy);
//! }
//!
//! // Mixed mutability
//! let view: Option<(&Position, &mut Velocity)> = unsafe {
//!     table.view_mut(row, &registry)
//! };
//!
//! if let Some((pos, vel)) = view {
//!     vel.dx += pos.x * 0.1; // Modify velocity based on position
//! }
//! ```
//!
//! # Design
//!
//! The [`View`] trait mirrors the [`Set`](crate::ecs::component::Set) trait's design:
//! - **Single components**: `&C` and `&mut C` implement [`View`]
//! - **Tuples**: `(&A, &B, &mut C, ...)` implement [`View`] via macros
//! - **Specification**: [`View::spec()`] returns the required components
//! - **Fetching**: [`View::fetch()`] retrieves component references from a table row
//!
//! # Safety
//!
//! The [`View::fetch()`] method is `unsafe` because:
//! - Type `C` must match the actual type stored for the given component ID
//!
//! The following are **not** safety requirements, as they are checked at runtime:
//! - Row validity (checked, returns `None` if invalid)
//! - Component existence in table (checked, returns `None` if missing)
//! - Component registration (checked, returns `None` if unregistered)
//!
//! For tuple views with mutable components, the caller must also ensure the same
//! component is not requested multiple times to avoid aliasing violations.
//!
//! Debug builds validate type correctness via assertions in the underlying
//! [`Table::get()`](super::Table::get) and [`Table::get_mut()`](super::Table::get_mut) methods.
//!
//! # Performance
//!
//! Views are **zero-cost abstractions**:
//! - No allocations
//! - Compiles to direct column pointer access
//! - Same performance as manual `table.get::<C>(row, id)`
//!
//! # Comparison with Direct Access
//!
//! ```rust,ignore
//! // Manual access (verbose)
//! let pos_id = registry.get::<Position>()?;
//! let vel_id = registry.get::<Velocity>()?;
//! let pos = unsafe { table.get::<Position>(row, pos_id)? };
//! let vel = unsafe { table.get::<Velocity>(row, vel_id)? };
//!
//! // With View (ergonomic)
//! let (pos, vel): (&Position, &Velocity) = unsafe {
//!     table.view(row, &registry)?
//! };
//! ```
//!
//! # Further Considerations
//! - Should we support more complex views (e.g., optional components)?
//! - Should we require component registration upfront for better safety instead of registering?

use std::{any::TypeId, collections::HashSet};

use crate::ecs::{
    component::Component,
    entity,
    storage::{row::Row, table::Table},
};

/// Trait for types that can be fetched as a view of components for a single entity row.
///
/// This trait enables type-safe retrieval of component references from a table row.
/// It is implemented for:
/// - Single component references: `&C`, `&mut C`
/// - Tuples of component references: `(&A, &B)`, `(&A, &mut B)`, etc.
///
/// # Type Parameters
///
/// * `'a` - The lifetime of the component references. Tied to the table's borrow.
///
/// # Examples
///
/// ```rust,ignore
/// use rusty_engine::ecs::storage::view::View;
///
/// // Fetch a single component
/// let health: Option<&Health> = unsafe {
///     <&Health>::fetch(table, row, &registry)
/// };
///
/// // Fetch multiple components
/// let view: Option<(&Position, &mut Velocity)> = unsafe {
///     <(&Position, &mut Velocity)>::fetch(table, row, &registry)
/// };
/// ```
pub trait View<'a>: Sized {
    /// Fetch component references for a single entity row from a table.
    ///
    /// Returns `None` if:
    /// - Any required component is missing from the table
    /// - The row index is invalid (>= table.len())
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    /// - Component types `C` match the actual types stored for their component IDs
    ///
    /// Type safety is ensured through the component registry's type-to-ID mapping.
    /// Row validity and component existence are checked at runtime.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if component type doesn't match the registered type.
    ///
    /// # Parameters
    ///
    /// * `table` - The table to fetch components from
    /// * `row` - The row index within the table
    unsafe fn fetch(table: &'a Table, row: Row) -> Option<Self>;

    /// Fetch component references for a single entity row from a mutable table.
    ///
    /// This is the mutable variant of [`fetch`](View::fetch), allowing mutable access
    /// to components when needed.
    ///
    /// Returns `None` if:
    /// - Any required component is missing from the table
    /// - The row index is invalid (>= table.len())
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    /// - Component types `C` match the actual types stored for their component IDs
    /// - When fetching tuples with mutable components, the same component is not requested multiple times
    ///
    /// Type safety is ensured through the table's type-to-ID mapping.
    /// Row validity and component existence are checked at runtime.
    unsafe fn fetch_mut(table: &'a mut Table, row: Row) -> Option<Self>;

    /// Returns the TypeIds of all components accessed mutably by this view.
    ///
    /// This is used to detect aliasing violations at runtime when creating
    /// mutable view iterators. If the same component is requested multiple times
    /// with mutable access, it would create aliased mutable references (UB).
    ///
    /// # Returns
    ///
    /// A vector containing the TypeId of each mutably-accessed component.
    /// For immutable views, this returns an empty vector.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// // Immutable view - no mutable components
    /// assert_eq!(<&Position>::mutable_component_ids(), vec![]);
    ///
    /// // Mutable view - one mutable component
    /// assert_eq!(<&mut Position>::mutable_component_ids(), vec![TypeId::of::<Position>()]);
    ///
    /// // Mixed tuple - only mutable components listed
    /// let ids = <(&Position, &mut Velocity)>::mutable_component_ids();
    /// assert_eq!(ids, vec![TypeId::of::<Velocity>()]);
    /// ```
    fn mutable_component_ids() -> Vec<TypeId> {
        vec![]
    }
}

/// Iterator over views of entities in a table.
///
/// This iterator yields views for each entity in the table, providing ergonomic
/// iteration over component data. Each result will have both the entity and its view.
///
/// # Invariants
///
/// Since tables enforce that all columns have the same length (archetype pattern),
/// this iterator will successfully yield a view for every row in the table, assuming
/// the view's component requirements match the table's specification.
///
/// # Type Parameters
///
/// * `'a` - The lifetime of the table borrow
/// * `V` - The view type (e.g., `&Position`, `(&Position, &Velocity)`)
///
/// # Examples
///
/// ```rust,ignore
/// // Iterate over single components
/// let iter: ViewIter<&Position> = unsafe { table.iter_views(&registry) };
/// for (entity, pos) in iter {
///     println!("Position: ({}, {}) for entity: {}", pos.x, pos.y, entity);
/// }
///
/// // Iterate over multiple components
/// let iter: ViewIter<(&Position, &Velocity)> = unsafe { table.iter_views(&registry) };
/// for (entity, (pos, vel)) in iter {
///     println!("Entity {} at ({}, {}) moving ({}, {})", entity.id(), pos.x, pos.y, vel.dx, vel.dy);
/// }
/// ```
pub struct ViewIter<'a, V: View<'a>> {
    table: &'a Table,
    current_row: usize,
    _marker: std::marker::PhantomData<V>,
}

impl<'a, V: View<'a>> ViewIter<'a, V> {
    /// Create a new ViewIter for the given table.
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    /// - Component types in V match the types registered in the registry
    /// - The table contains all components required by V (view spec ⊆ table spec)
    ///
    /// If the view requires components not in the table, all iterations will
    /// return None and the iterator will be empty.
    #[inline]
    pub unsafe fn new(table: &'a Table) -> Self {
        Self {
            table,
            current_row: 0,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<'a, V: View<'a>> Iterator for ViewIter<'a, V> {
    type Item = (entity::Entity, V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_row >= self.table.len() {
            return None;
        }

        let row = Row::new(self.current_row);
        self.current_row += 1;

        let entity = self.table.entity(row)?;

        // SAFETY: We're iterating within table.len() bounds, and the caller
        // ensures component types match via the unsafe constructor.
        // Due to the archetype pattern, if the first row succeeds, all rows will succeed.
        unsafe {
            let components = V::fetch(self.table, row)?;
            Some((entity, components))
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.table.len().saturating_sub(self.current_row);
        // Both bounds are exact because archetype pattern ensures all entities
        // have the same components. If the view matches, all rows yield Some.
        (remaining, Some(remaining))
    }
}

impl<'a, V: View<'a>> ExactSizeIterator for ViewIter<'a, V> {
    #[inline]
    fn len(&self) -> usize {
        self.table.len() - self.current_row
    }
}

/// Mutable iterator over views of entities in a table.
///
/// This iterator yields mutable views for each entity in the table, allowing
/// modification of component data during iteration.
///
/// # Invariants
///
/// Since tables enforce that all columns have the same length (archetype pattern),
/// this iterator will successfully yield a view for every row in the table, assuming
/// the view's component requirements match the table's specification.
///
/// # Type Parameters
///
/// * `'a` - The lifetime of the table borrow
/// * `V` - The view type (e.g., `&mut Position`, `(&Position, &mut Velocity)`)
///
/// # Examples
///
/// ```rust,ignore
/// // Iterate and modify single components
/// let iter: ViewIterMut<&mut Position> = unsafe { table.iter_views_mut(&registry) };
/// for pos in iter {
///     pos.x += 1.0;
///     pos.y += 1.0;
/// }
///
/// // Iterate over multiple components with mixed mutability
/// let iter: ViewIterMut<(&Position, &mut Velocity)> = unsafe {
///     table.iter_views_mut(&registry)
/// };
/// for (pos, vel) in iter {
///     vel.dx = pos.x * 0.1;  // Update velocity based on position
/// }
/// ```
pub struct ViewIterMut<'a, V: View<'a>> {
    table: &'a mut Table,
    current_row: usize,
    table_len: usize,
    _marker: std::marker::PhantomData<V>,
}

impl<'a, V: View<'a>> ViewIterMut<'a, V> {
    /// Create a new ViewIterMut for the given table.
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    /// - Component types in V match the types registered in the registry
    /// - The table contains all components required by V (view spec ⊆ table spec)
    ///
    /// # Panics
    ///
    /// Panics if the view requests the same mutable component multiple times,
    /// which would create aliased mutable references (undefined behavior).
    ///
    /// If the view requires components not in the table, all iterations will
    /// return None and the iterator will be empty.
    #[inline]
    pub unsafe fn new(table: &'a mut Table) -> Self {
        // Validate that we don't have duplicate mutable components (aliasing)
        let mut_ids = V::mutable_component_ids();
        let unique_ids: HashSet<_> = mut_ids.iter().collect();

        assert_eq!(
            mut_ids.len(),
            unique_ids.len(),
            "View aliasing violation: The view requests the same mutable component multiple times. \
             This would create aliased mutable references, which is undefined behavior. \
             Each mutable component can only appear once in a view."
        );

        let table_len = table.len();
        Self {
            table,
            current_row: 0,
            table_len,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<'a, V: View<'a>> Iterator for ViewIterMut<'a, V> {
    type Item = (entity::Entity, V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_row >= self.table_len {
            return None;
        }

        let row = Row::new(self.current_row);
        self.current_row += 1;

        let entity = self.table.entity(row)?;

        // SAFETY: We're iterating within table.len() bounds.
        // We use raw pointer casting to allow mutable iteration.
        // The caller ensures no aliasing violations via the unsafe constructor.
        // Due to the archetype pattern, if the first row succeeds, all rows will succeed.
        unsafe {
            let table_ptr = self.table as *mut Table;
            let components = V::fetch_mut(&mut *table_ptr, row)?;
            Some((entity, components))
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.table_len.saturating_sub(self.current_row);
        // Both bounds are exact because archetype pattern ensures all entities
        // have the same components. If the view matches, all rows yield Some.
        (remaining, Some(remaining))
    }
}

impl<'a, V: View<'a>> ExactSizeIterator for ViewIterMut<'a, V> {
    #[inline]
    fn len(&self) -> usize {
        self.table_len - self.current_row
    }
}

/// Implement View for single component references (&C).
///
/// Enables read-only access to a single component type.
impl<'a, C: Component> View<'a> for &'a C {
    unsafe fn fetch(table: &'a Table, row: Row) -> Option<Self> {
        // SAFETY: The caller ensures C matches an actual stored type in the table.
        unsafe { table.get::<C>(row) }
    }

    unsafe fn fetch_mut(table: &'a mut Table, row: Row) -> Option<Self> {
        // SAFETY: The caller ensures C matches the actual stored type in the table.
        unsafe { table.get::<C>(row) }
    }

    fn mutable_component_ids() -> Vec<TypeId> {
        // Immutable reference - no mutable access
        vec![]
    }
}

/// Implement View for single mutable component references (&mut C).
///
/// Enables mutable access to a single component type.
impl<'a, C: Component> View<'a> for &'a mut C {
    unsafe fn fetch(_table: &'a Table, _row: Row) -> Option<Self> {
        // Cannot fetch mutable reference from immutable table
        None
    }

    unsafe fn fetch_mut(table: &'a mut Table, row: Row) -> Option<Self> {
        // SAFETY: The caller ensures C matches an actual stored type in the table.
        unsafe { table.get_mut::<C>(row) }
    }

    fn mutable_component_ids() -> Vec<TypeId> {
        // Mutable reference - report this component
        vec![TypeId::of::<C>()]
    }
}

/// Implement View for empty tuple ().
///
/// Always succeeds, returns no components. Useful for testing or as a base case.
impl<'a> View<'a> for () {
    unsafe fn fetch(_table: &'a Table, _row: Row) -> Option<Self> {
        Some(())
    }

    unsafe fn fetch_mut(_table: &'a mut Table, _row: Row) -> Option<Self> {
        Some(())
    }

    fn mutable_component_ids() -> Vec<TypeId> {
        // Empty tuple - no components
        vec![]
    }
}

/// Macro to implement View for tuples of component references.
///
/// This generates implementations for tuples of various sizes, supporting
/// both immutable and mutable component references.
macro_rules! tuple_view_impl {
    ($($name: ident),*) => {
        impl<'a, $($name: View<'a>),*> View<'a> for ($($name,)*) {
            unsafe fn fetch(table: &'a Table, row: Row) -> Option<Self> {
                // SAFETY: Each component fetch is independent. The caller ensures component types
                // match their registered types. Row validity and component existence are checked
                // at runtime by each fetch call.
                Some((
                    $(unsafe { $name::fetch(table, row)? },)*
                ))
            }

            unsafe fn fetch_mut(table: &'a mut Table, row: Row) -> Option<Self> {
                // SAFETY: We create multiple mutable references from the same table using raw pointers,
                // but they point to different component columns, so no aliasing occurs.
                // The caller must ensure:
                // 1. Component types match their registered types
                // 2. The same component is not requested multiple times in the tuple
                //    (validated at runtime by ViewIterMut::new())
                #[allow(unused_unsafe)]
                unsafe {
                    Some((
                        $(unsafe {
                            $name::fetch_mut(
                                // SAFETY: Creating aliased mutable table pointers is safe because each
                                // fetch_mut call accesses different component columns
                                &mut *(table as *mut Table),
                                row,
                            )?
                        },)*
                    ))
                }
            }

            fn mutable_component_ids() -> Vec<TypeId> {
                // Collect mutable component IDs from all tuple elements
                let mut ids = Vec::new();
                $(
                    ids.extend($name::mutable_component_ids());
                )*
                ids
            }
        }
    }
}

/// Generate View implementations for tuples of increasing size.
macro_rules! tuple_view {
    ($head:ident) => {
        tuple_view_impl!($head);
    };
    ($head:ident, $($tail:ident),*) => {
        tuple_view_impl!($head, $($tail),*);
        tuple_view!($($tail),*);
    };
}

// Generate implementations for tuples up to 26 elements (A-Z)
tuple_view! {
    A, B, C, D, E, F, G, H, I, J, K, L, M, N, O, P, Q, R, S, T, U, V, W, X, Y, Z
}

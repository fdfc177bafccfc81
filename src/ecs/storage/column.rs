use std::{alloc::Layout, any::TypeId, ptr};

use crate::ecs::{
    component::{self, Component},
    storage::{
        cell::{Cell, CellMut},
        mem::IndexedMemory,
        row::Row,
    },
};

/// A type-erased, contiguous storage for uniform-sized elements.
/// This is similar to Vec<T> but stores elements without compile-time type information.
/// Elements can be downcast when the type is known from context.
///
/// This provides cache-friendly storage for ECS component columns where all elements
/// in a column are the same type, but different columns may store different types.
///
/// # Example Usage
///
/// ```ignore
/// use rusty_engine::ecs::storage::column::Column;
/// use rusty_macros::Component;
///
/// #[derive(Component, Debug, PartialEq)]
/// struct Position { x: f32, y: f32 }
///
/// let registry = rusty_engine::ecs::world::TypeRegistry::new();
/// registry.register_component::<Position>();
///
/// // Create a type-erased column for Position components
/// let mut column = Column::new(registry.get_info_of::<Position>().unwrap());
///
/// // Reserve space for 3 elements
/// column.reserve(3);
///
/// // Write to reserved space (requires unsafe because type is erased)
/// unsafe {
///     column.write(0.into(), Position { x: 1.0, y: 2.0 });
///     column.write(1.into(), Position { x: 2.0, y: 3.0 });
///     column.write(2.into(), Position { x: 3.0, y: 4.0 });
///     column.set_len(3);  // Mark all values as initialized
/// }
///
/// // Iterate over all elements efficiently
/// unsafe {
///     for pos in column.iter::<Position>() {
///         println!("Position: ({}, {})", pos.x, pos.y);
///     }
/// }
///
/// // Mutate elements
/// unsafe {
///     for pos in column.iter_mut::<Position>() {
///         pos.x *= 2.0;
///     }
/// }
/// ```
///
/// # Safety
/// This structure maintains the following invariants:
/// - `ptr` points to a valid allocation if `capacity > 0`
/// - `len <= capacity`
/// - All elements from 0..len are properly initialized
/// - The layout used matches the actual element type
pub struct Column {
    /// Raw pointer to the start of the allocated memory.
    data: IndexedMemory,

    /// Number of elements currently stored.
    len: usize,

    /// Info about the column item (size, align and drop).
    info: component::Info,
}

impl Column {
    /// Create a new empty column with the given component Info.
    #[inline]
    pub fn new(info: component::Info) -> Self {
        Self {
            data: IndexedMemory::new(info.layout(), super::mem::GrowthStrategy::Multiply(2)),
            len: 0,
            info,
        }
    }

    /// Reserves capacity for at least `additional` more elements.
    ///
    /// This ensures the column has space for `self.len() + additional` elements
    /// without reallocating. Does not modify the length - use `set_len()` to
    /// mark reserved memory as initialized after writing values.
    pub fn reserve(&mut self, additional: usize) {
        self.data.reserve(additional);
        // Does NOT modify self.len - that's set_len()'s job
    }

    /// Sets the length of the column.
    ///
    /// This will explicitly set the size of the column, without actually
    /// modifying its contents. The caller must ensure that all elements
    /// in the range `[0..new_len)` are properly initialized.
    ///
    /// # Safety
    /// - `new_len` must be less than or equal to `capacity()`
    /// - All elements in `[0..new_len)` must be properly initialized
    /// - The type of the elements must match the column's component type
    pub unsafe fn set_len(&mut self, new_len: usize) {
        debug_assert!(
            new_len <= self.data.capacity(),
            "new_len ({}) exceeds capacity ({})",
            new_len,
            self.data.capacity()
        );
        self.len = new_len;
    }

    /// Write a value into the column at the given index.
    ///
    /// This writes to reserved but potentially uninitialized memory.
    /// After writing all values, call `set_len()` to mark them as initialized.
    ///
    /// # Safety
    /// The caller must ensure that:
    /// - `row.index() < self.capacity()` (index is within reserved capacity)
    /// - value C is the correct type for this column's layout
    /// - All indices `[0..new_len)` are written before calling `set_len(new_len)`
    pub unsafe fn write<C: Component>(&mut self, row: Row, value: C) {
        debug_assert!(row.index() < self.data.capacity(), "index out of bounds");

        // Safety - Caller must ensure type is valid for column/cell.
        unsafe { self.cell_mut(row).write(value) };
    }

    /// Write raw, type-erased bytes into the column at the given row.
    ///
    /// Used by the archetype migration path where the destination component type isn't known
    /// at compile time - the bytes were previously extracted from a matching column via
    /// [`Self::read_bytes`].
    ///
    /// # Safety
    /// The caller must ensure that:
    /// - `bytes.len()` matches this column's component layout size
    /// - `row.index() < self.capacity()`
    pub unsafe fn write_bytes(&mut self, row: Row, bytes: &[u8]) {
        debug_assert_eq!(
            bytes.len(),
            self.info.layout().size(),
            "byte length does not match column's component size"
        );
        let dst = self.data.ptr_at_mut(row.index());
        // SAFETY: caller guarantees bytes.len() matches the column's element size and the row
        // is within capacity.
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), dst.as_ptr(), bytes.len());
        }
    }

    /// Read the raw bytes for the component stored at `row` without moving or dropping it.
    ///
    /// This is used by the migration path to copy a component's bytes into a new table before
    /// the original row is swap-removed (see [`Self::swap_remove_no_drop`]).
    ///
    /// # Safety
    /// The caller must ensure that `row.index() < self.len()`.
    pub unsafe fn read_bytes(&self, row: Row) -> &[u8] {
        debug_assert!(self.is_row_valid(row), "invalid row index");
        let ptr = self.data.ptr_at(row.index());
        // SAFETY: caller guarantees the row is initialized; the slice covers exactly one
        // element's worth of bytes per the column's layout.
        unsafe { std::slice::from_raw_parts(ptr.as_ptr(), self.info.layout().size()) }
    }

    /// Remove the element at the given row using swap-remove, without running its destructor.
    ///
    /// Used when the bytes have already been copied out via [`Self::read_bytes`] as part of a
    /// migration, so the value's ownership has logically moved elsewhere.
    ///
    /// # Safety
    /// The caller must ensure that `row.index() < self.len()`.
    pub unsafe fn swap_remove_no_drop(&mut self, row: Row) {
        debug_assert!(self.is_row_valid(row), "index out of bounds");

        let row_index = row.index();
        let last_index = self.len - 1;

        if row_index != last_index {
            let element_ptr = self.data.ptr_at_mut(row_index);
            let last_ptr = self.data.ptr_at_mut(last_index);
            // SAFETY: Both pointers are valid and within bounds.
            unsafe {
                ptr::swap_nonoverlapping(
                    element_ptr.as_ptr(),
                    last_ptr.as_ptr(),
                    self.info.layout().size(),
                );
            }
        }

        self.len -= 1;
    }

    /// Push a value onto the column.
    ///
    /// # Panics
    /// - Panics if allocation fails.
    /// - Panics if the type `C` doesn't match the column's component type.
    ///
    /// # Safety
    /// The caller must ensure that:
    /// - value C is the correct type for this column's layout
    pub unsafe fn push<C: Component>(&mut self, value: C) {
        // Validate type matches column's component type
        self.ensure_type::<C>();

        // Reserve an additional row.
        self.reserve(1);
        // SAFETY: len < capacity after reserve(1), and we're writing to self.len which is valid
        unsafe {
            self.write(Row::new(self.len), value);
        }
        // Update length to mark row initialized
        self.len += 1;
    }

    /// Get an immutable reference to the component at the given row.
    ///
    /// Returns `None` if the row index is out of bounds (>= len).
    ///
    /// # Safety
    /// The caller must ensure that:
    /// - Component type `C` matches the column's component type
    ///
    /// # Panics
    /// In debug builds, panics if type `C` doesn't match the column's type.
    pub unsafe fn get<C: Component>(&self, row: Row) -> Option<&C> {
        if !self.is_row_valid(row) {
            return None;
        }
        Some(self.cell(row).as_ref())
    }

    /// Get a mutable reference to the component at the given row.
    ///
    /// Returns `None` if the row index is out of bounds (>= len).
    ///
    /// # Safety
    /// The caller must ensure that:
    /// - Component type `C` matches the column's component type
    ///
    /// # Panics
    /// In debug builds, panics if type `C` doesn't match the column's type.
    pub unsafe fn get_mut<C: Component>(&mut self, row: Row) -> Option<&mut C> {
        if !self.is_row_valid(row) {
            return None;
        }
        Some(self.cell_mut(row).into_mut())
    }

    /// Remove the element at the given index using swap-remove.
    ///
    /// # Safety
    /// The caller must ensure that:
    /// - `index < self.len()`
    pub unsafe fn swap_remove(&mut self, row: Row) {
        debug_assert!(self.is_row_valid(row), "index out of bounds");

        // Start by tracking the indexes of the rows impacted
        let row_index = row.index();
        let last_index = self.len - 1;

        // Get pointers to the element to remove and the last element
        let element_ptr = self.data.ptr_at_mut(row.index());
        let last_ptr = self.data.ptr_at_mut(last_index);

        if row_index != last_index {
            // Swap with the last element
            // SAFETY: Both pointers are valid and within bounds
            unsafe {
                ptr::swap_nonoverlapping(
                    element_ptr.as_ptr(),
                    last_ptr.as_ptr(),
                    self.info.layout().size(),
                );
            }
        }
        // Drop the element now at last_index
        unsafe {
            (self.info.drop_fn())(last_ptr);
        }

        self.len -= 1;
    }

    /// Get the column info.
    #[inline]
    pub fn info(&self) -> &component::Info {
        &self.info
    }

    /// Get the number of elements in the column.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Check if the column is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the capacity of the column.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Get a cell for the given row.
    ///
    /// # Safety
    /// - The caller must ensure the row index is valid (< len for initialized access)
    #[inline]
    pub fn cell(&self, row: Row) -> Cell<'_> {
        debug_assert!(self.is_row_valid(row), "invalid row index");
        Cell::new(self.data.ptr_at(row.index()), &self.info)
    }

    /// Get a mutable cell for the given row.
    ///
    /// # Safety
    /// - The caller must ensure the row index is within capacity (< capacity for reserved access)
    #[inline]
    pub fn cell_mut(&mut self, row: Row) -> CellMut<'_> {
        debug_assert!(row.index() < self.capacity(), "row index exceeds capacity");
        CellMut::new(self.data.ptr_at_mut(row.index()), &self.info)
    }

    /// Clear all elements from the column, calling their destructors.
    pub fn clear(&mut self) {
        unsafe {
            for i in 0..self.len {
                let ptr = self.data.ptr_at_mut(i);
                (self.info.drop_fn())(ptr);
            }
        }
        self.len = 0;
    }

    /// Returns an iterator over references to the elements.
    ///
    /// # Safety
    /// The caller must ensure that `T` matches the type used to create this column.
    ///
    /// # Panics
    /// Panics if the generic type `C` doesn't match the column's component type.
    pub unsafe fn iter<C: Component>(&self) -> ColumnIter<'_, C> {
        self.ensure_type::<C>();

        ColumnIter {
            column: self,
            index: 0,
            _marker: std::marker::PhantomData,
        }
    }

    /// Returns an iterator over mutable references to the elements.
    ///
    /// # Safety
    /// The caller must ensure that `T` matches the type used to create this column.
    ///
    /// # Panics
    /// Panics if the generic type `C` doesn't match the column's component type.
    pub unsafe fn iter_mut<'a, C: Component>(&'a mut self) -> ColumnIterMut<'a, C> {
        self.ensure_type::<C>();
        let len = self.len;

        ColumnIterMut {
            column: self,
            len,
            index: 0,
            _marker: std::marker::PhantomData,
        }
    }

    /// Ensure the type `C` is valid for this column.
    ///
    /// This validates both TypeId and Layout to catch type mismatches at iterator creation.
    ///
    /// # Panics
    /// Panics if:
    /// - The TypeId of `C` doesn't match the column's stored type
    /// - The Layout of `C` doesn't match the column's layout
    #[inline]
    pub fn ensure_type<C: Component>(&self) {
        assert!(
            TypeId::of::<C>() == self.info.type_id(),
            "Type mismatch: attempted to use type {} with column storing {:?}",
            std::any::type_name::<C>(),
            self.info
        );
        assert!(
            Layout::new::<C>() == self.info.layout(),
            "Layout mismatch: component layout does not match column layout"
        );
    }

    /// Determine if a row is valid for this column.
    #[inline]
    pub fn is_row_valid(&self, row: Row) -> bool {
        row.index() < self.len
    }
}

/// Iterator over column elements.
pub struct ColumnIter<'a, C: Component> {
    column: &'a Column,
    index: usize,
    _marker: std::marker::PhantomData<&'a C>,
}

impl<'a, C: Component> Iterator for ColumnIter<'a, C> {
    type Item = &'a C;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index < self.column.len {
            let item = unsafe { self.column.get::<C>(Row::new(self.index)) };
            self.index += 1;
            item
        } else {
            None
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.column.len - self.index;
        (remaining, Some(remaining))
    }
}

impl<'a, C: Component> ExactSizeIterator for ColumnIter<'a, C> {}

/// Mutable iterator over column elements.
pub struct ColumnIterMut<'a, C: Component> {
    column: &'a mut Column,
    len: usize,
    index: usize,
    _marker: std::marker::PhantomData<&'a mut C>,
}

impl<'a, C: Component> Iterator for ColumnIterMut<'a, C> {
    type Item = &'a mut C;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index < self.len {
            let ptr = self.column.data.ptr_at(self.index);
            self.index += 1;
            // SAFETY:
            // - index < len, so this is a valid element
            // - We increment index, so we never return the same element twice
            // - The lifetime 'a ensures exclusive access for the iterator's lifetime
            unsafe { Some(&mut *(ptr.as_ptr() as *mut C)) }
        } else {
            None
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.index;
        (remaining, Some(remaining))
    }
}

impl<'a, C: Component> ExactSizeIterator for ColumnIterMut<'a, C> {}

impl Drop for Column {
    fn drop(&mut self) {
        // Drop all elements - the IndexedMemory will handle memory deallocation
        self.clear();
    }
}

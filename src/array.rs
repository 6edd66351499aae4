use std::alloc::{Layout, alloc, dealloc, handle_alloc_error, realloc};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};
use std::slice;

use tracing::{debug, trace};

use crate::cursor::{ConstCursor, Cursor, Generation};
use crate::error::{ArrayError, Result};

/// Factor applied to the capacity when an append finds the buffer full.
pub const GROWTH_FACTOR: usize = 2;

/// A contiguous growable array that owns a single heap buffer.
///
/// Elements live in `[0, len)`; slots in `[len, capacity)` are allocated but
/// uninitialized. Appends double the capacity when the buffer is full, while
/// explicit requests (`reserve`, `resize`, `assign`, `shrink_to_fit`) allocate
/// exactly what they ask for.
///
/// Positions are expressed with [`Cursor`] / [`ConstCursor`]; see the
/// [`cursor`](crate::cursor) module for their invalidation rules.
pub struct DynamicArray<T> {
    /// `None` once the buffer has been moved out with [`DynamicArray::take`].
    ptr: Option<NonNull<T>>,
    cap: usize,
    len: usize,
    generation: Generation,
    _marker: PhantomData<T>,
}

// SAFETY: the array owns its elements exclusively, like `Vec<T>`.
unsafe impl<T: Send> Send for DynamicArray<T> {}
// SAFETY: shared access only hands out `&T`.
unsafe impl<T: Sync> Sync for DynamicArray<T> {}

impl<T> DynamicArray<T> {
    /// Creates an empty array. Nothing is allocated.
    pub fn new() -> Self {
        assert!(mem::size_of::<T>() != 0, "zero-sized types are not supported");
        Self {
            ptr: Some(NonNull::dangling()),
            cap: 0,
            len: 0,
            generation: Generation::default(),
            _marker: PhantomData,
        }
    }

    /// Creates an empty array with room for exactly `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut array = Self::new();
        if capacity != 0 {
            array.reallocate(capacity);
        }
        array
    }

    /// `n` default-valued elements, capacity `n`.
    pub fn with_len(n: usize) -> Self
    where
        T: Default,
    {
        let mut array = Self::with_capacity(n);
        array.fill_with(n, T::default);
        array
    }

    /// `n` clones of `value`, capacity `n`.
    pub fn from_elem(n: usize, value: T) -> Self
    where
        T: Clone,
    {
        let mut array = Self::with_capacity(n);
        array.fill_with(n, || value.clone());
        array
    }

    fn detached() -> Self {
        Self {
            ptr: None,
            cap: 0,
            len: 0,
            generation: Generation::default(),
            _marker: PhantomData,
        }
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` when `len() == 0`.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Slots allocated; always `>= len()`.
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// `false` only after the buffer was moved out with [`DynamicArray::take`]
    /// and nothing has been allocated since.
    pub fn has_storage(&self) -> bool {
        self.ptr.is_some()
    }

    /// Pointer to the first slot. Dangling when nothing is allocated.
    pub fn as_ptr(&self) -> *const T {
        self.base()
    }

    /// Mutable pointer to the first slot.
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.base()
    }

    pub fn as_slice(&self) -> &[T] {
        self
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self
    }

    fn base(&self) -> *mut T {
        self.ptr.unwrap_or(NonNull::dangling()).as_ptr()
    }
}

// Storage and capacity management.
impl<T> DynamicArray<T> {
    /// Grows the buffer to exactly `new_capacity` slots if that is larger than
    /// the current capacity. Smaller requests are ignored.
    pub fn reserve(&mut self, new_capacity: usize) {
        if new_capacity > self.cap {
            self.reallocate(new_capacity);
        }
    }

    /// Fallible [`reserve`](Self::reserve): reports overflow and allocator
    /// failure instead of aborting. The array is unchanged on error.
    pub fn try_reserve(&mut self, new_capacity: usize) -> Result<()> {
        if new_capacity > self.cap {
            self.try_reallocate(new_capacity)?;
        }
        Ok(())
    }

    /// Reallocates to exactly `len` slots, even when `len == capacity`.
    /// An empty array releases its allocation.
    pub fn shrink_to_fit(&mut self) {
        debug!(len = self.len, capacity = self.cap, "shrinking buffer to fit");
        self.reallocate(self.len);
    }

    /// Moves the whole buffer out, leaving `self` empty with no backing storage.
    ///
    /// The detached array reports length and capacity 0, refuses to hand out
    /// cursors, and re-attaches on its next non-zero allocation.
    pub fn take(&mut self) -> Self {
        debug!(len = self.len, capacity = self.cap, "moving buffer out");
        mem::replace(self, Self::detached())
    }

    /// Exchanges buffers, lengths and capacities. Cursors follow their buffer.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    fn grow(&mut self) {
        let new_cap = if self.cap == 0 {
            1
        } else {
            match self.cap.checked_mul(GROWTH_FACTOR) {
                Some(cap) => cap,
                None => capacity_overflow(),
            }
        };
        self.reallocate(new_cap);
    }

    fn reallocate(&mut self, new_cap: usize) {
        if let Err(err) = self.try_reallocate(new_cap) {
            match (err, layout_for::<T>(new_cap)) {
                (ArrayError::AllocFailed { .. }, Ok(layout)) => handle_alloc_error(layout),
                _ => capacity_overflow(),
            }
        }
    }

    /// Relocates the live elements into a block of exactly `new_cap` slots.
    /// `realloc` moves them bitwise, so no element is cloned or dropped.
    fn try_reallocate(&mut self, new_cap: usize) -> Result<()> {
        debug_assert!(new_cap >= self.len);
        let new_layout = layout_for::<T>(new_cap)?;
        let old = self.ptr.filter(|_| self.cap != 0);

        // A detached array with nothing to allocate stays detached.
        let new_ptr = if new_cap == 0 {
            if let Some(old) = old {
                // SAFETY: `old` was allocated with the layout for `self.cap`.
                unsafe { deallocate(old, self.cap) };
            }
            self.ptr.map(|_| NonNull::dangling())
        } else {
            let raw = match old {
                // SAFETY: `new_layout` has a non-zero size.
                None => unsafe { alloc(new_layout) },
                // SAFETY: `old` came from this allocator with the layout for
                // `self.cap`, and the new size is non-zero.
                Some(old) => unsafe {
                    realloc(old.as_ptr().cast(), layout_for::<T>(self.cap)?, new_layout.size())
                },
            };
            Some(NonNull::new(raw.cast::<T>()).ok_or(ArrayError::AllocFailed { capacity: new_cap })?)
        };

        trace!(
            old_capacity = self.cap,
            new_capacity = new_cap,
            len = self.len,
            "reallocated buffer"
        );
        self.ptr = new_ptr;
        self.cap = new_cap;
        self.generation.bump();
        Ok(())
    }

    /// Writes values produced by `f` into `[len, new_len)`.
    /// The capacity must already cover `new_len`.
    fn fill_with(&mut self, new_len: usize, mut f: impl FnMut() -> T) {
        debug_assert!(new_len <= self.cap);
        while self.len < new_len {
            let value = f();
            // SAFETY: `len < new_len <= cap`, so the slot is allocated and vacant.
            unsafe { ptr::write(self.base().add(self.len), value) };
            self.len += 1;
        }
    }
}

// Element access and lifecycle.
impl<T> DynamicArray<T> {
    /// Bounds-checked access.
    pub fn at(&self, index: usize) -> Result<&T> {
        let len = self.len;
        self.as_slice().get(index).ok_or(ArrayError::OutOfRange { index, len })
    }

    /// Checked mutable access, failing with `OutOfRange` when `index >= len()`.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T> {
        let len = self.len;
        self.as_mut_slice().get_mut(index).ok_or(ArrayError::OutOfRange { index, len })
    }

    /// First element.
    ///
    /// # Panics
    /// If the array is empty.
    pub fn front(&self) -> &T {
        self.first().expect("front() called on an empty DynamicArray")
    }

    /// First element, mutably. Panics when empty.
    pub fn front_mut(&mut self) -> &mut T {
        self.first_mut().expect("front_mut() called on an empty DynamicArray")
    }

    /// Last element.
    ///
    /// # Panics
    /// If the array is empty.
    pub fn back(&self) -> &T {
        self.last().expect("back() called on an empty DynamicArray")
    }

    /// Last element, mutably. Panics when empty.
    pub fn back_mut(&mut self) -> &mut T {
        self.last_mut().expect("back_mut() called on an empty DynamicArray")
    }

    /// Appends `value`, doubling the capacity when the buffer is full.
    pub fn push_back(&mut self, value: T) {
        if self.len == self.cap {
            self.grow();
        }
        // SAFETY: `len < cap` after growing, so the slot is allocated and vacant.
        unsafe { ptr::write(self.base().add(self.len), value) };
        self.len += 1;
    }

    /// Removes and returns the last element. An empty array is left untouched
    /// and `None` is returned.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        self.generation.bump();
        // SAFETY: the slot at the old `len - 1` holds a live element that is
        // no longer counted, so reading it out transfers ownership.
        Some(unsafe { ptr::read(self.base().add(self.len)) })
    }

    /// Constructs a value with `f` at the end and returns a reference to it.
    pub fn emplace_back<F>(&mut self, f: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        let value = f();
        if self.len == self.cap {
            self.grow();
        }
        // SAFETY: `len < cap`; the reference targets the slot just written,
        // before `len` moves past it.
        unsafe {
            let slot = self.base().add(self.len);
            ptr::write(slot, value);
            self.len += 1;
            &mut *slot
        }
    }

    /// Drops the elements in `[new_len, len)`. Capacity is unchanged.
    pub fn truncate(&mut self, new_len: usize) {
        if new_len >= self.len {
            return;
        }
        // SAFETY: `[new_len, len)` are live; `len` is lowered first so a
        // panicking destructor cannot cause a double drop.
        unsafe {
            let tail = ptr::slice_from_raw_parts_mut(self.base().add(new_len), self.len - new_len);
            self.len = new_len;
            self.generation.bump();
            ptr::drop_in_place(tail);
        }
    }

    /// Drops every element. Capacity is unchanged.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Resizes to `new_len`, filling new slots with clones of `value`.
    ///
    /// Growing beyond the capacity reallocates to exactly `new_len`; shrinking
    /// keeps the capacity.
    pub fn resize(&mut self, new_len: usize, value: T)
    where
        T: Clone,
    {
        self.resize_with(new_len, || value.clone());
    }

    /// Resizes to `new_len`, filling new slots with `T::default()`.
    pub fn resize_default(&mut self, new_len: usize)
    where
        T: Default,
    {
        self.resize_with(new_len, T::default);
    }

    fn resize_with(&mut self, new_len: usize, f: impl FnMut() -> T) {
        if new_len <= self.len {
            self.truncate(new_len);
            return;
        }
        if new_len > self.cap {
            self.reallocate(new_len);
        }
        self.fill_with(new_len, f);
    }

    /// Replaces the contents with `count` clones of `value`, reallocating to
    /// exactly `count` slots.
    pub fn assign(&mut self, count: usize, value: T)
    where
        T: Clone,
    {
        self.clear();
        self.reallocate(count);
        self.fill_with(count, || value.clone());
    }

    /// Replaces the contents with a literal list, reallocating to exactly `N`.
    pub fn assign_list<const N: usize>(&mut self, items: [T; N]) {
        self.clear();
        self.reallocate(N);
        let mut items = items.into_iter();
        self.fill_with(N, || match items.next() {
            Some(item) => item,
            None => unreachable!("array iterator yields exactly N items"),
        });
    }
}

// Cursors and positional mutation.
impl<T> DynamicArray<T> {
    /// Cursor to the first slot.
    ///
    /// Fails with [`ArrayError::InvalidCursor`] when the array has no backing
    /// storage (after [`take`](Self::take)). An empty array that still owns
    /// its (possibly zero-sized) buffer returns `begin() == end()`.
    pub fn begin(&self) -> Result<Cursor<T>> {
        let base = self.ptr.ok_or(ArrayError::InvalidCursor)?;
        Ok(Cursor::new(base.as_ptr(), self.generation))
    }

    /// Cursor one past the last element.
    pub fn end(&self) -> Result<Cursor<T>> {
        Ok(self.begin()? + self.len as isize)
    }

    pub fn cbegin(&self) -> Result<ConstCursor<T>> {
        self.begin().map(ConstCursor::from)
    }

    pub fn cend(&self) -> Result<ConstCursor<T>> {
        self.end().map(ConstCursor::from)
    }

    /// Safely dereferences a cursor by checking it against this array.
    ///
    /// The cursor must be non-null, point at a live element of this buffer,
    /// and (in debug builds) not predate an invalidating operation.
    pub fn resolve(&self, pos: impl Into<ConstCursor<T>>) -> Result<&T> {
        let index = self.live_index(pos.into())?;
        Ok(&self[index])
    }

    pub fn resolve_mut(&mut self, pos: impl Into<ConstCursor<T>>) -> Result<&mut T> {
        let index = self.live_index(pos.into())?;
        Ok(&mut self[index])
    }

    /// Inserts `value` before `pos` and returns a cursor to it.
    ///
    /// `pos` may be `end()`. Every cursor into the array is invalidated.
    ///
    /// # Panics
    /// If `pos` lies outside `[begin, end]`.
    pub fn insert(&mut self, pos: impl Into<ConstCursor<T>>, value: T) -> Cursor<T> {
        let index = self.offset_of(pos.into());
        assert!(index <= self.len, "cursor out of range");
        self.insert_at(index, value);
        self.cursor_at(index)
    }

    /// Like [`insert`](Self::insert), with the value built by `f`.
    pub fn emplace<F>(&mut self, pos: impl Into<ConstCursor<T>>, f: F) -> Cursor<T>
    where
        F: FnOnce() -> T,
    {
        let index = self.offset_of(pos.into());
        assert!(index <= self.len, "cursor out of range");
        let value = f();
        self.insert_at(index, value);
        self.cursor_at(index)
    }

    /// Removes the element at `pos` and returns a cursor to its follower
    /// (`end()` when the last element was erased).
    ///
    /// # Panics
    /// If `pos` does not point at a live element.
    pub fn erase(&mut self, pos: impl Into<ConstCursor<T>>) -> Cursor<T> {
        let index = self.offset_of(pos.into());
        assert!(index < self.len, "cursor out of range");
        drop(self.remove(index));
        self.cursor_at(index)
    }

    /// Removes and returns the element at `index`, shifting the tail left.
    ///
    /// # Panics
    /// If `index >= len`.
    pub fn remove(&mut self, index: usize) -> T {
        assert!(index < self.len, "Index out of bounds");
        self.generation.bump();
        // SAFETY: `index` is live. The tail `(index, len)` is moved one slot
        // left with memmove, which is the front-to-back order a shift needs.
        unsafe {
            self.len -= 1;
            let p = self.base().add(index);
            let result = ptr::read(p);
            ptr::copy(p.add(1), p, self.len - index);
            result
        }
    }

    fn insert_at(&mut self, index: usize, value: T) {
        debug_assert!(index <= self.len);
        if self.len == self.cap {
            self.grow();
        }
        self.generation.bump();
        // SAFETY: `len < cap`, so `[index, len]` is inside the buffer. memmove
        // shifts `[index, len)` right as if copied back to front.
        unsafe {
            let p = self.base().add(index);
            ptr::copy(p, p.add(1), self.len - index);
            ptr::write(p, value);
        }
        self.len += 1;
    }

    fn cursor_at(&self, index: usize) -> Cursor<T> {
        Cursor::new(self.base().wrapping_add(index), self.generation)
    }

    /// Element offset of `pos` from the start of the buffer, captured before
    /// any reallocation can move the buffer.
    fn offset_of(&self, pos: ConstCursor<T>) -> usize {
        debug_assert!(pos.generation == self.generation, "stale cursor");
        let bytes = (pos.ptr as usize).wrapping_sub(self.base() as usize);
        let size = mem::size_of::<T>();
        assert!(bytes % size == 0, "cursor out of range");
        bytes / size
    }

    fn live_index(&self, pos: ConstCursor<T>) -> Result<usize> {
        if pos.ptr.is_null() || self.ptr.is_none() || pos.generation != self.generation {
            return Err(ArrayError::InvalidCursor);
        }
        let bytes = (pos.ptr as usize).wrapping_sub(self.base() as usize);
        let size = mem::size_of::<T>();
        match (bytes % size, bytes / size) {
            (0, index) if index < self.len => Ok(index),
            _ => Err(ArrayError::InvalidCursor),
        }
    }

    /// Hands the buffer over to an owning iterator without dropping anything.
    pub(crate) fn into_raw_parts(self) -> (Option<NonNull<T>>, usize, usize) {
        let this = mem::ManuallyDrop::new(self);
        (this.ptr, this.cap, this.len)
    }
}

pub(crate) fn layout_for<T>(capacity: usize) -> Result<Layout> {
    Layout::array::<T>(capacity).map_err(|_| ArrayError::CapacityOverflow)
}

/// Frees a block of `capacity` slots without touching its contents.
///
/// # Safety
/// `ptr` must have been allocated by this module for exactly `capacity` > 0
/// slots and must not be used afterwards.
pub(crate) unsafe fn deallocate<T>(ptr: NonNull<T>, capacity: usize) {
    if let Ok(layout) = layout_for::<T>(capacity) {
        // SAFETY: upheld by the caller.
        unsafe { dealloc(ptr.as_ptr().cast(), layout) };
    }
}

#[cold]
fn capacity_overflow() -> ! {
    panic!("capacity overflow");
}

impl<T> Drop for DynamicArray<T> {
    fn drop(&mut self) {
        // SAFETY: `[0, len)` are live and dropped once; the block is then freed
        // with the layout it was allocated with.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.base(), self.len));
            if let Some(ptr) = self.ptr.filter(|_| self.cap != 0) {
                deallocate(ptr, self.cap);
            }
        }
    }
}

impl<T> Deref for DynamicArray<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        // SAFETY: `[0, len)` are initialized; the base is dangling but aligned
        // when nothing is allocated, which is valid for an empty slice.
        unsafe { slice::from_raw_parts(self.base(), self.len) }
    }
}

impl<T> DerefMut for DynamicArray<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        // SAFETY: as in `deref`, and `&mut self` guarantees uniqueness.
        unsafe { slice::from_raw_parts_mut(self.base(), self.len) }
    }
}

impl<T> AsRef<[T]> for DynamicArray<T> {
    fn as_ref(&self) -> &[T] {
        self
    }
}

impl<T> AsMut<[T]> for DynamicArray<T> {
    fn as_mut(&mut self) -> &mut [T] {
        self
    }
}

impl<T> Default for DynamicArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep copy with the same contents and the same capacity.
impl<T: Clone> Clone for DynamicArray<T> {
    fn clone(&self) -> Self {
        if self.ptr.is_none() {
            return Self::detached();
        }
        let mut copy = Self::with_capacity(self.cap);
        let mut items = self.iter();
        copy.fill_with(self.len, || match items.next() {
            Some(item) => item.clone(),
            None => unreachable!("source holds len items"),
        });
        copy
    }

    /// Mirrors the source's storage state: a detached source detaches
    /// `self`, an attached one attaches it.
    fn clone_from(&mut self, source: &Self) {
        self.clear();
        if self.cap != source.cap {
            self.reallocate(source.cap);
        }
        // Capacities match here, so a `None` side has capacity 0 and no buffer.
        match (source.ptr, self.ptr) {
            (None, Some(_)) => {
                self.ptr = None;
                self.generation.bump();
            }
            (Some(_), None) => {
                self.ptr = Some(NonNull::dangling());
                self.generation.bump();
            }
            _ => {}
        }
        let mut items = source.iter();
        self.fill_with(source.len, || match items.next() {
            Some(item) => item.clone(),
            None => unreachable!("source holds len items"),
        });
    }
}

impl<T, const N: usize> From<[T; N]> for DynamicArray<T> {
    fn from(items: [T; N]) -> Self {
        let mut array = Self::with_capacity(N);
        let mut items = items.into_iter();
        array.fill_with(N, || match items.next() {
            Some(item) => item,
            None => unreachable!("array iterator yields exactly N items"),
        });
        array
    }
}

impl<T: fmt::Debug> fmt::Debug for DynamicArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq<U>, U> PartialEq<DynamicArray<U>> for DynamicArray<T> {
    fn eq(&self, other: &DynamicArray<U>) -> bool {
        self[..] == other[..]
    }
}

impl<T: Eq> Eq for DynamicArray<T> {}

impl<T: PartialEq<U>, U, const N: usize> PartialEq<[U; N]> for DynamicArray<T> {
    fn eq(&self, other: &[U; N]) -> bool {
        self[..] == other[..]
    }
}

impl<T: PartialEq<U>, U> PartialEq<[U]> for DynamicArray<T> {
    fn eq(&self, other: &[U]) -> bool {
        self[..] == *other
    }
}

impl<T: PartialEq<U>, U> PartialEq<Vec<U>> for DynamicArray<T> {
    fn eq(&self, other: &Vec<U>) -> bool {
        self[..] == other[..]
    }
}

impl<T: Hash> Hash for DynamicArray<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self[..].hash(state);
    }
}

impl<'a, T> IntoIterator for &'a DynamicArray<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut DynamicArray<T> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

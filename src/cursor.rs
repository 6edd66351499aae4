//! Pointer-style position handles into a [`DynamicArray`](crate::DynamicArray).
//!
//! A cursor is a raw slot position, nothing more. It does not borrow the array,
//! so it can be handed back to `&mut self` methods such as
//! [`insert`](crate::DynamicArray::insert), and it does not keep the buffer
//! alive.
//!
//! # Invalidation
//!
//! Every cursor into an array becomes dangling after any operation that
//! reallocates the buffer (growth, `reserve`, `shrink_to_fit`, exact `resize`)
//! or that shifts or removes elements (`insert`, `emplace`, `erase`, `remove`,
//! `pop_back`, `truncate`, `clear`). Dereferencing a dangling cursor is
//! undefined behavior, which is why [`Cursor::get`] is `unsafe`. Debug builds
//! stamp cursors with the array's generation so the array can reject stale
//! ones when they are passed back to it.

use std::cmp::Ordering;
use std::fmt;
use std::mem;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::ptr;

use crate::error::{ArrayError, Result};

/// Counts invalidating mutations. Zero-sized in release builds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Generation {
    #[cfg(debug_assertions)]
    value: u64,
}

impl Generation {
    #[inline]
    pub(crate) fn bump(&mut self) {
        #[cfg(debug_assertions)]
        {
            self.value = self.value.wrapping_add(1);
        }
    }
}

/// Mutable cursor, the analogue of a `T*` iterator.
pub struct Cursor<T> {
    pub(crate) ptr: *mut T,
    pub(crate) generation: Generation,
}

/// Read-only cursor. Always constructible from a [`Cursor`], never the reverse.
pub struct ConstCursor<T> {
    pub(crate) ptr: *const T,
    pub(crate) generation: Generation,
}

impl<T> Cursor<T> {
    pub(crate) fn new(ptr: *mut T, generation: Generation) -> Self {
        Self { ptr, generation }
    }

    /// A cursor that points nowhere. Dereferencing it reports
    /// [`ArrayError::InvalidCursor`].
    pub fn null() -> Self {
        Self::new(ptr::null_mut(), Generation::default())
    }

    pub fn as_ptr(&self) -> *mut T {
        self.ptr
    }

    /// Dereferences the cursor.
    ///
    /// # Safety
    /// A non-null cursor must point at a live element of an array that has not
    /// been reallocated or shifted since the cursor was produced, and no other
    /// reference to that element may be active for `'a`.
    pub unsafe fn get<'a>(self) -> Result<&'a T> {
        if self.ptr.is_null() {
            return Err(ArrayError::InvalidCursor);
        }
        // SAFETY: non-null, and the caller vouches for liveness.
        Ok(unsafe { &*self.ptr })
    }

    /// Mutable dereference.
    ///
    /// # Safety
    /// Same contract as [`Cursor::get`], and the returned reference must be the
    /// only one to that element while it lives.
    pub unsafe fn get_mut<'a>(self) -> Result<&'a mut T> {
        if self.ptr.is_null() {
            return Err(ArrayError::InvalidCursor);
        }
        // SAFETY: non-null, and the caller vouches for liveness and uniqueness.
        Ok(unsafe { &mut *self.ptr })
    }
}

impl<T> ConstCursor<T> {
    pub(crate) fn new(ptr: *const T, generation: Generation) -> Self {
        Self { ptr, generation }
    }

    pub fn null() -> Self {
        Self::new(ptr::null(), Generation::default())
    }

    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }

    /// Dereferences the cursor.
    ///
    /// # Safety
    /// See [`Cursor::get`].
    pub unsafe fn get<'a>(self) -> Result<&'a T> {
        if self.ptr.is_null() {
            return Err(ArrayError::InvalidCursor);
        }
        // SAFETY: non-null, and the caller vouches for liveness.
        Ok(unsafe { &*self.ptr })
    }
}

impl<T> From<Cursor<T>> for ConstCursor<T> {
    fn from(cursor: Cursor<T>) -> Self {
        Self::new(cursor.ptr, cursor.generation)
    }
}

// Arithmetic never dereferences, so it is safe even on dangling cursors:
// positions are computed with wrapping offsets and compared by address.
macro_rules! cursor_common {
    ($name:ident) => {
        impl<T> $name<T> {
            pub fn is_null(&self) -> bool {
                self.ptr.is_null()
            }

            /// Steps to the next slot (`++it`).
            pub fn inc(&mut self) -> &mut Self {
                self.ptr = self.ptr.wrapping_add(1);
                self
            }

            /// Steps to the previous slot (`--it`).
            pub fn dec(&mut self) -> &mut Self {
                self.ptr = self.ptr.wrapping_sub(1);
                self
            }
        }

        impl<T> Clone for $name<T> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<T> Copy for $name<T> {}

        impl<T> Default for $name<T> {
            fn default() -> Self {
                Self::null()
            }
        }

        impl<T> fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.ptr).finish()
            }
        }

        impl<T> PartialEq for $name<T> {
            fn eq(&self, other: &Self) -> bool {
                self.ptr == other.ptr
            }
        }

        impl<T> Eq for $name<T> {}

        impl<T> PartialOrd for $name<T> {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl<T> Ord for $name<T> {
            fn cmp(&self, other: &Self) -> Ordering {
                self.ptr.cmp(&other.ptr)
            }
        }

        impl<T> Add<isize> for $name<T> {
            type Output = Self;

            fn add(self, n: isize) -> Self {
                Self::new(self.ptr.wrapping_offset(n), self.generation)
            }
        }

        impl<T> Sub<isize> for $name<T> {
            type Output = Self;

            fn sub(self, n: isize) -> Self {
                Self::new(self.ptr.wrapping_offset(n.wrapping_neg()), self.generation)
            }
        }

        impl<T> AddAssign<isize> for $name<T> {
            fn add_assign(&mut self, n: isize) {
                *self = *self + n;
            }
        }

        impl<T> SubAssign<isize> for $name<T> {
            fn sub_assign(&mut self, n: isize) {
                *self = *self - n;
            }
        }

        /// Distance in elements between two cursors into the same buffer.
        impl<T> Sub for $name<T> {
            type Output = isize;

            fn sub(self, other: Self) -> isize {
                let bytes = (self.ptr as usize).wrapping_sub(other.ptr as usize) as isize;
                bytes / mem::size_of::<T>().max(1) as isize
            }
        }
    };
}

cursor_common!(Cursor);
cursor_common!(ConstCursor);

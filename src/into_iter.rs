use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};

use crate::array::{DynamicArray, deallocate};

/// Owning iterator over the elements of a [`DynamicArray`].
///
/// Takes over the buffer; elements not consumed are dropped together with it.
pub struct IntoIter<T> {
    buf: Option<NonNull<T>>,
    cap: usize,
    start: *const T,
    end: *const T,
    _marker: PhantomData<T>,
}

// SAFETY: the iterator owns the remaining elements exclusively.
unsafe impl<T: Send> Send for IntoIter<T> {}
// SAFETY: `&IntoIter` exposes nothing but `as_slice`.
unsafe impl<T: Sync> Sync for IntoIter<T> {}

impl<T> IntoIter<T> {
    fn remaining(&self) -> usize {
        (self.end as usize - self.start as usize) / mem::size_of::<T>()
    }

    /// The elements not yet yielded.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `[start, end)` are live elements still owned by the iterator.
        unsafe { std::slice::from_raw_parts(self.start, self.remaining()) }
    }
}

impl<T> IntoIterator for DynamicArray<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        let (buf, cap, len) = self.into_raw_parts();
        let start: *const T = buf.unwrap_or(NonNull::dangling()).as_ptr();
        IntoIter {
            buf,
            cap,
            start,
            // SAFETY: `len <= cap`, so this stays inside (or one past) the block.
            end: unsafe { start.add(len) },
            _marker: PhantomData,
        }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        // SAFETY: `start` is a live element; advancing past it hands ownership out.
        unsafe {
            let item = ptr::read(self.start);
            self.start = self.start.add(1);
            Some(item)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.remaining();
        (len, Some(len))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        // SAFETY: `end - 1` is a live element; moving `end` down hands it out.
        unsafe {
            self.end = self.end.sub(1);
            Some(ptr::read(self.end))
        }
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

impl<T> Drop for IntoIter<T> {
    fn drop(&mut self) {
        // SAFETY: `[start, end)` are the unconsumed elements; the block is then
        // freed with the capacity it was allocated for.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.start as *mut T, self.remaining()));
            if let Some(buf) = self.buf.filter(|_| self.cap != 0) {
                deallocate(buf, self.cap);
            }
        }
    }
}

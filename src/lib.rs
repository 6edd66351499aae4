//! A contiguous, growable array written directly against the global allocator.
//!
//! [`DynamicArray`] owns one heap block and keeps its elements packed at the
//! front of it. Appends double the capacity when it runs out, explicit
//! capacity requests are honoured exactly, and positional edits go through
//! pointer-style [`Cursor`]s in the `[begin, end)` convention.
//!
//! ```
//! use dynarray::{DynamicArray, dynarray};
//!
//! let mut a: DynamicArray<i32> = DynamicArray::new();
//! a.insert(a.begin()?, 5);
//! a.insert(a.begin()? + 1, 15);
//! a.insert(a.end()?, 20);
//! assert_eq!(a, [5, 15, 20]);
//!
//! let it = a.erase(a.begin()? + 1);
//! assert_eq!(a.resolve(it)?, &20);
//! assert_eq!(a, dynarray![5, 20]);
//! # Ok::<(), dynarray::ArrayError>(())
//! ```
//!
//! Indexing goes through the slice the array dereferences to, so `a[i]`
//! panics out of range while `at` reports [`ArrayError::OutOfRange`] and
//! `get_unchecked` skips the check entirely.

mod array;
pub mod cli;
pub mod cursor;
pub mod error;
mod into_iter;
mod macros;

pub use array::{DynamicArray, GROWTH_FACTOR};
pub use cursor::{ConstCursor, Cursor};
pub use error::{ArrayError, Result};
pub use into_iter::IntoIter;

#[cfg(test)]
mod tests;

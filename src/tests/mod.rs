use super::*;
use crossbeam::scope;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct Droppable(Arc<AtomicUsize>);

impl Drop for Droppable {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

fn droppables(counter: &Arc<AtomicUsize>, n: usize) -> DynamicArray<Droppable> {
    let mut v = DynamicArray::new();
    for _ in 0..n {
        v.push_back(Droppable(counter.clone()));
    }
    v
}

#[test]
fn test_basic_push_pop() {
    let mut v = DynamicArray::new();
    v.push_back(1);
    v.push_back(2);
    v.push_back(3);
    assert_eq!(v.len(), 3);
    assert_eq!(v[0], 1);
    assert_eq!(v[1], 2);
    assert_eq!(v[2], 3);
    assert_eq!(v.pop_back(), Some(3));
    assert_eq!(v.pop_back(), Some(2));
    assert_eq!(v.pop_back(), Some(1));
    assert_eq!(v.pop_back(), None);
}

#[test]
fn test_pop_back_on_empty_is_noop() {
    let mut v: DynamicArray<i32> = DynamicArray::with_capacity(4);
    assert_eq!(v.pop_back(), None);
    assert_eq!(v.len(), 0);
    assert_eq!(v.capacity(), 4);

    let mut moved = v.take();
    assert_eq!(v.pop_back(), None);
    assert!(!v.has_storage());
    assert_eq!(moved.pop_back(), None);
    assert_eq!(moved.capacity(), 4);
}

#[test]
fn test_growth_doubles_from_one() {
    let mut v = DynamicArray::new();
    assert_eq!(v.capacity(), 0);
    let mut seen = Vec::new();
    for i in 0..17 {
        v.push_back(i);
        if seen.last() != Some(&v.capacity()) {
            seen.push(v.capacity());
        }
    }
    assert_eq!(seen, vec![1, 2, 4, 8, 16, 32]);
}

#[test]
fn test_reserve_is_exact_and_never_shrinks() {
    let mut v: DynamicArray<u8> = DynamicArray::new();
    v.reserve(10);
    assert_eq!(v.capacity(), 10);
    v.reserve(3);
    assert_eq!(v.capacity(), 10);
    v.reserve(11);
    assert_eq!(v.capacity(), 11);
}

#[test]
fn test_grow_and_shrink() {
    let mut v = DynamicArray::with_capacity(2);
    assert_eq!(v.capacity(), 2);
    v.push_back(1);
    v.push_back(2);
    v.push_back(3);
    assert_eq!(v.capacity(), 4);
    v.shrink_to_fit();
    assert_eq!(v.capacity(), 3);
    assert_eq!(v, [1, 2, 3]);
    v.shrink_to_fit();
    assert_eq!(v.capacity(), 3);
    v.clear();
    v.shrink_to_fit();
    assert_eq!(v.capacity(), 0);
    assert!(v.has_storage());
}

#[test]
fn test_try_reserve() {
    let mut v: DynamicArray<i32> = DynamicArray::new();
    assert!(v.try_reserve(10).is_ok());
    assert_eq!(v.capacity(), 10);
    assert_eq!(v.try_reserve(usize::MAX), Err(ArrayError::CapacityOverflow));
    assert_eq!(v.capacity(), 10);
}

#[test]
fn test_try_reserve_reports_alloc_failure() {
    let mut v: DynamicArray<u64> = dynarray![1, 2, 3];
    let capacity = v.capacity();
    let before = v.as_ptr();
    // The largest count whose layout is valid; no allocator can satisfy it.
    let huge = isize::MAX as usize / std::mem::size_of::<u64>();
    assert!(matches!(
        v.try_reserve(huge),
        Err(ArrayError::AllocFailed { capacity: requested }) if requested == huge
    ));
    assert_eq!(v.capacity(), capacity);
    assert_eq!(v.as_ptr(), before);
    assert_eq!(v, [1, 2, 3]);
    v.push_back(4);
    assert_eq!(v, [1, 2, 3, 4]);
}

#[test]
fn test_at_boundaries() {
    let mut v = DynamicArray::from_elem(3, 5);
    assert_eq!(v.at(2), Ok(&5));
    assert_eq!(v.at(3), Err(ArrayError::OutOfRange { index: 3, len: 3 }));
    assert_eq!(v.at(usize::MAX), Err(ArrayError::OutOfRange { index: usize::MAX, len: 3 }));
    *v.at_mut(1).unwrap() = 20;
    assert_eq!(v, [5, 20, 5]);
    assert!(v.at_mut(7).is_err());
    assert_eq!(v, [5, 20, 5]);
}

#[test]
fn test_front_back() {
    let mut v = dynarray![1, 2, 3];
    assert_eq!(*v.front(), 1);
    assert_eq!(*v.back(), 3);
    *v.front_mut() = 10;
    *v.back_mut() = 30;
    assert_eq!(v, [10, 2, 30]);
}

#[test]
#[should_panic(expected = "back() called on an empty DynamicArray")]
fn test_back_on_empty_panics() {
    let v: DynamicArray<i32> = DynamicArray::new();
    v.back();
}

#[test]
fn test_emplace_back_returns_written_slot() {
    let mut v = DynamicArray::with_capacity(1);
    let first = v.emplace_back(|| 7);
    assert_eq!(*first, 7);
    // The second call has to grow; the reference must still be the new slot.
    let second = v.emplace_back(|| 8);
    *second += 1;
    assert_eq!(v, [7, 9]);
    assert_eq!(*v.back(), 9);
}

#[test]
fn test_insert_remove() {
    let mut v = DynamicArray::new();
    v.push_back(1);
    v.push_back(3);
    let it = v.insert(v.begin().unwrap() + 1, 2);
    assert_eq!(v.as_ref(), &[1, 2, 3]);
    assert_eq!(v.resolve(it), Ok(&2));
    assert_eq!(v.remove(1), 2);
    assert_eq!(v.as_ref(), &[1, 3]);
}

#[test]
fn test_insert_into_empty_matches_push() {
    let mut a = DynamicArray::new();
    let it = a.insert(a.begin().unwrap(), 5);
    let mut b = DynamicArray::new();
    b.push_back(5);
    assert_eq!(a, b);
    assert_eq!(a.capacity(), b.capacity());
    assert_eq!(it, a.begin().unwrap());
}

#[test]
fn test_erase_returns_follower() {
    let mut v = dynarray![1, 2, 3, 4];
    let it = v.erase(v.begin().unwrap() + 1);
    assert_eq!(v, [1, 3, 4]);
    assert_eq!(v.resolve(it), Ok(&3));
    let it = v.erase(v.end().unwrap() - 1);
    assert_eq!(it, v.end().unwrap());
    assert_eq!(v.resolve(it), Err(ArrayError::InvalidCursor));
    assert_eq!(v.capacity(), 4);
}

#[test]
fn test_emplace_shifts_right() {
    let mut v = dynarray![String::from("a"), String::from("c")];
    let it = v.emplace(v.begin().unwrap() + 1, || String::from("b"));
    assert_eq!(v, ["a", "b", "c"]);
    assert_eq!(v.resolve(it).map(String::as_str), Ok("b"));
    let it = v.emplace(v.end().unwrap(), || String::from("d"));
    assert_eq!(it + 1, v.end().unwrap());
    assert_eq!(v.len(), 4);
}

#[test]
#[should_panic(expected = "Index out of bounds")]
fn test_out_of_bounds_remove() {
    let mut v: DynamicArray<i32> = DynamicArray::new();
    v.remove(0);
}

#[test]
#[should_panic(expected = "cursor out of range")]
fn test_out_of_bounds_insert() {
    let mut v: DynamicArray<i32> = DynamicArray::new();
    v.insert(v.begin().unwrap() + 1, 10);
}

#[test]
#[should_panic(expected = "cursor out of range")]
fn test_erase_at_end_panics() {
    let mut v = dynarray![1];
    v.erase(v.end().unwrap());
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "stale cursor")]
fn test_stale_cursor_is_caught_in_debug() {
    let mut v = DynamicArray::with_capacity(1);
    v.push_back(1);
    let stale = v.begin().unwrap();
    v.push_back(2);
    v.insert(stale, 0);
}

#[cfg(debug_assertions)]
#[test]
fn test_stale_cursor_does_not_resolve_in_debug() {
    let mut v = dynarray![1, 2, 3];
    let it = v.begin().unwrap();
    v.pop_back();
    assert_eq!(v.resolve(it), Err(ArrayError::InvalidCursor));
}

#[test]
fn test_cursor_walk_and_arithmetic() {
    let v = dynarray![10, 20, 30];
    let begin = v.cbegin().unwrap();
    let end = v.cend().unwrap();
    assert_eq!(end - begin, 3);
    assert!(begin < end);

    let mut seen = Vec::new();
    let mut it = begin;
    while it != end {
        seen.push(*v.resolve(it).unwrap());
        it.inc();
    }
    assert_eq!(seen, vec![10, 20, 30]);

    it.dec();
    assert_eq!(unsafe { it.get() }, Ok(&30));
    it -= 2;
    assert_eq!(it, begin);
    it += 1;
    assert_eq!(v.resolve(it), Ok(&20));
}

#[test]
fn test_null_cursor_dereference_fails() {
    let c: Cursor<i32> = Cursor::null();
    assert!(c.is_null());
    assert_eq!(unsafe { c.get() }, Err(ArrayError::InvalidCursor));
    assert!(unsafe { c.get_mut() }.is_err());
    let cc: ConstCursor<i32> = ConstCursor::default();
    assert_eq!(unsafe { cc.get() }, Err(ArrayError::InvalidCursor));
    assert_eq!(dynarray![1].resolve(cc), Err(ArrayError::InvalidCursor));
}

#[test]
fn test_cursor_write_through_get_mut() {
    let mut v = dynarray![1, 2, 3];
    let it = v.begin().unwrap() + 2;
    unsafe { *it.get_mut().unwrap() = 9 };
    *v.resolve_mut(v.begin().unwrap()).unwrap() = 0;
    assert_eq!(v, [0, 2, 9]);
}

#[test]
fn test_const_cursor_from_cursor() {
    let v = dynarray![1, 2];
    let c = v.begin().unwrap() + 1;
    let cc: ConstCursor<i32> = c.into();
    assert_eq!(cc.as_ptr(), c.as_ptr() as *const i32);
    assert_eq!(unsafe { cc.get() }, Ok(&2));
}

#[test]
fn test_take_detaches_source() {
    let mut a = dynarray![1, 2, 3];
    let b = a.take();
    assert_eq!(b, [1, 2, 3]);
    assert_eq!(a.len(), 0);
    assert_eq!(a.capacity(), 0);
    assert_eq!(a.begin(), Err(ArrayError::InvalidCursor));
    assert_eq!(a.cend(), Err(ArrayError::InvalidCursor));

    a.push_back(4);
    assert!(a.has_storage());
    assert_eq!(a, [4]);
}

#[test]
fn test_shrink_to_fit_keeps_detached_state() {
    let mut a = dynarray![1, 2, 3];
    let _ = a.take();
    a.shrink_to_fit();
    assert!(!a.has_storage());
    assert_eq!(a.capacity(), 0);
    assert_eq!(a.begin(), Err(ArrayError::InvalidCursor));
}

#[test]
fn test_clone_from_attached_source_attaches() {
    let mut a: DynamicArray<i32> = dynarray![1, 2];
    let _ = a.take();
    a.clone_from(&DynamicArray::new());
    assert!(a.has_storage());
    assert!(a.is_empty());
    assert!(a.begin().is_ok());

    let _ = a.take();
    a.clone_from(&dynarray![7, 8]);
    assert!(a.has_storage());
    assert_eq!(a, [7, 8]);
}

#[test]
fn test_clone_from_detached_source_detaches() {
    let mut source = dynarray![String::from("x")];
    let _ = source.take();

    let mut a = dynarray![String::from("a"), String::from("b")];
    a.clone_from(&source);
    assert_eq!(a.has_storage(), source.clone().has_storage());
    assert!(!a.has_storage());
    assert_eq!(a.capacity(), 0);
    assert_eq!(a.begin(), Err(ArrayError::InvalidCursor));

    let mut empty: DynamicArray<String> = DynamicArray::new();
    empty.clone_from(&source);
    assert!(!empty.has_storage());
}

#[test]
fn test_cursor_survives_take() {
    let mut a = dynarray![1, 2, 3];
    let it = a.begin().unwrap() + 1;
    let b = a.take();
    assert_eq!(b.resolve(it), Ok(&2));
}

#[test]
fn test_resize_variants() {
    let mut v = DynamicArray::from_elem(3, 5);
    v.resize(5, 10);
    assert_eq!(v, [5, 5, 5, 10, 10]);
    assert_eq!(v.capacity(), 5);
    v.resize(1, 0);
    assert_eq!(v, [5]);
    assert_eq!(v.capacity(), 5);
    v.resize(3, 7);
    assert_eq!(v, [5, 7, 7]);
    assert_eq!(v.capacity(), 5);

    let mut d: DynamicArray<u32> = DynamicArray::with_len(2);
    d.resize_default(4);
    assert_eq!(d, [0, 0, 0, 0]);
}

#[test]
fn test_assign_reallocates_exactly() {
    let mut v = DynamicArray::with_capacity(16);
    v.push_back(1);
    v.assign(3, 9);
    assert_eq!(v, [9, 9, 9]);
    assert_eq!(v.capacity(), 3);
    v.assign_list([4, 5]);
    assert_eq!(v, [4, 5]);
    assert_eq!(v.capacity(), 2);
}

#[test]
fn test_clone_keeps_capacity_and_is_independent() {
    let mut a = DynamicArray::with_capacity(8);
    a.push_back(vec![1]);
    let mut b = a.clone();
    assert_eq!(b.capacity(), 8);
    b[0].push(2);
    assert_eq!(a[0], vec![1]);

    let mut c = dynarray![vec![0]; 3];
    c.clone_from(&a);
    assert_eq!(c, a);
    assert_eq!(c.capacity(), 8);
}

#[test]
fn test_swap() {
    let mut a = dynarray![1, 2, 3];
    let mut b = dynarray![4, 5];
    a.swap(&mut b);
    assert_eq!(a, [4, 5]);
    assert_eq!(b, [1, 2, 3]);
    assert_eq!(a.capacity(), 2);
    assert_eq!(b.capacity(), 3);
}

#[test]
fn test_raii_drop() {
    let counter = Arc::new(AtomicUsize::new(0));
    {
        let _v = droppables(&counter, 10);
    }
    assert_eq!(counter.load(Ordering::SeqCst), 10);
}

#[test]
fn test_every_removal_path_drops_once() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut v = droppables(&counter, 10);

    drop(v.pop_back());
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    v.erase(v.begin().unwrap());
    assert_eq!(counter.load(Ordering::SeqCst), 2);
    v.truncate(6);
    assert_eq!(counter.load(Ordering::SeqCst), 4);
    v.shrink_to_fit();
    assert_eq!(counter.load(Ordering::SeqCst), 4);
    v.clear();
    assert_eq!(counter.load(Ordering::SeqCst), 10);
    assert_eq!(v.capacity(), 6);
}

#[test]
fn test_into_iter_drops_remainder() {
    let counter = Arc::new(AtomicUsize::new(0));
    let v = droppables(&counter, 5);
    let mut it = v.into_iter();
    assert_eq!(it.len(), 5);
    drop(it.next());
    drop(it.next_back());
    assert_eq!(counter.load(Ordering::SeqCst), 2);
    assert_eq!(it.as_slice().len(), 3);
    drop(it);
    assert_eq!(counter.load(Ordering::SeqCst), 5);
}

#[test]
fn test_iterators() {
    let mut v = DynamicArray::new();
    v.push_back(10);
    v.push_back(20);
    v.push_back(30);

    let mut sum = 0;
    for &x in &v {
        sum += x;
    }
    assert_eq!(sum, 60);

    for x in &mut v {
        *x += 1;
    }
    assert_eq!(v[0], 11);

    let collected: Vec<i32> = v.into_iter().rev().collect();
    assert_eq!(collected, vec![31, 21, 11]);
}

#[test]
fn test_shared_reads_across_threads() {
    let mut v = DynamicArray::new();
    for i in 0..100 {
        v.push_back(i);
    }

    let sums = scope(|s| {
        let a = s.spawn(|_| v.iter().sum::<i32>());
        let b = s.spawn(|_| v.iter().sum::<i32>());
        (a.join().unwrap(), b.join().unwrap())
    })
    .unwrap();
    assert_eq!(sums, (4950, 4950));
}

#[test]
fn test_debug_and_macro_forms() {
    let empty: DynamicArray<u8> = dynarray![];
    assert!(empty.is_empty());
    assert_eq!(format!("{:?}", dynarray![1, 2]), "[1, 2]");
    let filled = dynarray!['x'; 3];
    assert_eq!(filled, ['x', 'x', 'x']);
    assert_eq!(filled.capacity(), 3);
}

#[test]
#[should_panic(expected = "zero-sized types are not supported")]
fn test_zero_sized_types_rejected() {
    let _v: DynamicArray<()> = DynamicArray::new();
}

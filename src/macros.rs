/// Builds a [`DynamicArray`](crate::DynamicArray) from a literal list, the way
/// `vec!` builds a `Vec`.
///
/// ```
/// use dynarray::dynarray;
///
/// let a = dynarray![1, 2, 3];
/// assert_eq!(a, [1, 2, 3]);
/// assert_eq!(a.capacity(), 3);
///
/// let b = dynarray![7; 4];
/// assert_eq!(b, [7, 7, 7, 7]);
/// ```
#[macro_export]
macro_rules! dynarray {
    () => {
        $crate::DynamicArray::new()
    };
    ($elem:expr; $n:expr) => {
        $crate::DynamicArray::from_elem($n, $elem)
    };
    ($($x:expr),+ $(,)?) => {
        $crate::DynamicArray::from([$($x),+])
    };
}

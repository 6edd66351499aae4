use dynarray::DynamicArray;

fn main() {
    println!("--- Basic Usage Example ---");
    let mut arr = DynamicArray::new();

    // Push elements
    for i in 1..=5 {
        arr.push_back(i * 10);
        println!("Pushed: {}, len: {}, cap: {}", i * 10, arr.len(), arr.capacity());
    }

    // Iterate using Deref to slice
    println!("Elements: {:?}", &arr[..]);

    arr.shrink_to_fit();
    println!("After shrink_to_fit, cap: {}", arr.capacity());

    // Pop elements
    while let Some(val) = arr.pop_back() {
        println!("Popped: {}, len: {}", val, arr.len());
    }
}

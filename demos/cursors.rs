use dynarray::{ArrayError, dynarray};

fn main() -> Result<(), ArrayError> {
    println!("--- Cursor Example ---");
    let mut arr = dynarray![1, 2, 3, 4];

    let it = arr.insert(arr.begin()? + 2, 99);
    println!("Inserted {} -> {:?}", arr.resolve(it)?, arr);

    let it = arr.erase(arr.begin()?);
    println!("Erased front, now at {} -> {:?}", arr.resolve(it)?, arr);

    // Walk [begin, end) by hand
    let end = arr.cend()?;
    let mut it = arr.cbegin()?;
    while it != end {
        print!("{} ", arr.resolve(it)?);
        it.inc();
    }
    println!();

    let moved = arr.take();
    println!("Moved out {:?}; source begin() -> {:?}", moved, arr.begin());
    Ok(())
}

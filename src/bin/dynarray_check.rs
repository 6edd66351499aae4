use anyhow::{Context, Result, anyhow};
use dynarray::cli::Cli;
use dynarray::{DynamicArray, dynarray};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type Scenario = fn() -> Result<(), String>;

const SCENARIOS: &[(&str, Scenario)] = &[
    ("access_operator", run_access_operator),
    ("at_method", run_at_method),
    ("push_back_pop_back", run_push_pop),
    ("erase", run_erase),
    ("insert", run_insert),
    ("resize", run_resize),
    ("swap", run_swap),
    ("copy", run_copy),
    ("move", run_move),
    ("emplace", run_emplace),
    ("capacity", run_capacity),
];

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let selected: Vec<&(&str, Scenario)> = match &cli.scenario {
        Some(name) => {
            let found: Vec<_> = SCENARIOS.iter().filter(|(n, _)| *n == name.as_str()).collect();
            if found.is_empty() {
                return Err(anyhow!("Unknown scenario: {name}"));
            }
            found
        }
        None => SCENARIOS.iter().collect(),
    };

    let mut failed = Vec::new();
    for (name, scenario) in selected {
        match scenario() {
            Ok(()) => println!("{name} passed!"),
            Err(e) => {
                println!("{name} failed: {e}");
                failed.push(*name);
            }
        }
    }

    if cli.scenario.is_none() {
        let seed = cli.seed.unwrap_or_else(rand::random);
        println!("--- Differential run: {} ops, seed {seed} ---", cli.ops);
        run_differential(cli.ops, seed)
            .map_err(|e| anyhow!(e))
            .with_context(|| format!("Differential run failed (replay with --seed {seed})"))?;
        println!("Differential run passed!");
    }

    if !failed.is_empty() {
        return Err(anyhow!("{} scenario(s) failed: {}", failed.len(), failed.join(", ")));
    }
    Ok(())
}

fn check(cond: bool, msg: &str) -> Result<(), String> {
    if cond { Ok(()) } else { Err(msg.to_string()) }
}

fn run_access_operator() -> Result<(), String> {
    let mut arr = DynamicArray::from_elem(3, 5i64);
    check(arr[0] == 5, "Wrong element value receive")?;
    arr[0] = 10;
    check(arr[0] == 10, "Wrong element after change")
}

fn run_at_method() -> Result<(), String> {
    let mut arr = DynamicArray::from_elem(3, 5);
    check(arr.at(1) == Ok(&5), "Wrong element value receive")?;
    *arr.at_mut(1).map_err(|e| e.to_string())? = 20;
    check(arr.at(1) == Ok(&20), "Wrong element after change")?;
    check(arr.at(5).is_err(), "No error after request outside the bounds of the array")?;
    check(arr.at(3).is_err(), "No error at index == len")
}

fn run_push_pop() -> Result<(), String> {
    let mut arr = DynamicArray::new();
    arr.push_back(5);
    check(arr.len() == 1, "Wrong size after 1 push")?;
    check(arr[0] == 5, "Wrong value after 1 push")?;
    arr.clear();

    let mut reference = vec![1, 2, 3, 4, 5, 6, 10];
    for &x in &reference {
        arr.push_back(x);
    }
    check(arr == reference, "Wrong contents after push")?;

    arr.pop_back();
    reference.pop();
    check(arr == reference, "Wrong contents after pop")?;

    arr.clear();
    check(arr.pop_back().is_none() && arr.is_empty(), "Pop on empty is not a no-op")
}

fn run_erase() -> Result<(), String> {
    let mut arr = dynarray![1, 2, 3, 4];
    let begin = arr.begin().map_err(|e| e.to_string())?;
    let next = arr.erase(begin + 1);
    check(arr == [1, 3, 4], "Wrong contents after erase")?;
    check(arr.resolve(next) == Ok(&3), "Erase returned wrong cursor")?;
    let end = arr.end().map_err(|e| e.to_string())?;
    let tail = arr.erase(end - 1);
    check(arr == [1, 3], "Wrong contents after erase at end")?;
    check(Ok(tail) == arr.end(), "Erasing the last element should return end()")
}

fn run_insert() -> Result<(), String> {
    let mut arr = DynamicArray::new();
    arr.insert(arr.begin().map_err(|e| e.to_string())?, 5);
    arr.insert(arr.begin().map_err(|e| e.to_string())? + 1, 15);
    arr.insert(arr.end().map_err(|e| e.to_string())?, 20);
    check(arr == [5, 15, 20], "Wrong contents after inserts")
}

fn run_resize() -> Result<(), String> {
    let mut arr = DynamicArray::from_elem(3, 5);
    arr.resize(5, 10);
    check(arr == [5, 5, 5, 10, 10], "Wrong contents after growing resize")?;
    check(arr.capacity() == 5, "Growing resize should allocate exactly")?;
    arr.resize(2, 0);
    check(arr == [5, 5] && arr.capacity() == 5, "Shrinking resize changed capacity")
}

fn run_swap() -> Result<(), String> {
    let mut a = dynarray![1, 2, 3];
    let mut b = dynarray![4, 5];
    a.swap(&mut b);
    check(a == [4, 5], "First array wrong after swap")?;
    check(b == [1, 2, 3], "Second array wrong after swap")
}

fn run_copy() -> Result<(), String> {
    let mut original = dynarray![String::from("a"), String::from("b")];
    original.reserve(8);
    let mut copy = original.clone();
    check(copy == original, "Copy differs from original")?;
    check(copy.capacity() == original.capacity(), "Copy lost the capacity")?;
    copy[0].push('!');
    original.push_back(String::from("c"));
    check(original == ["a", "b", "c"], "Original changed through copy")?;
    check(copy == ["a!", "b"], "Copy changed through original")
}

fn run_move() -> Result<(), String> {
    let mut a = dynarray![1, 2, 3];
    let b = a.take();
    check(a.is_empty() && a.capacity() == 0, "Source not empty after move")?;
    check(a.begin().is_err(), "Detached array handed out a cursor")?;
    check(b == [1, 2, 3], "Destination lost contents")
}

fn run_emplace() -> Result<(), String> {
    let mut arr: DynamicArray<(i32, String)> = DynamicArray::new();
    let slot = arr.emplace_back(|| (1, String::from("one")));
    check(slot.0 == 1, "emplace_back returned the wrong slot")?;
    slot.1.push('!');
    check(arr[0].1 == "one!", "emplace_back reference does not alias the element")?;
    let at = arr.emplace(arr.begin().map_err(|e| e.to_string())?, || (0, String::from("zero")));
    check(arr.resolve(at).map(|v| v.0) == Ok(0), "emplace returned the wrong cursor")?;
    check(arr.len() == 2 && arr[1].0 == 1, "emplace did not shift")
}

fn run_capacity() -> Result<(), String> {
    let mut arr = DynamicArray::new();
    let mut reallocations = 0;
    let mut last = arr.capacity();
    for i in 0..1000 {
        arr.push_back(i);
        if arr.capacity() != last {
            reallocations += 1;
            last = arr.capacity();
        }
    }
    debug!(reallocations, capacity = arr.capacity(), "growth after 1000 pushes");
    check(reallocations == 11 && arr.capacity() == 1024, "Growth is not doubling")?;
    arr.reserve(10);
    check(arr.capacity() == 1024, "reserve shrank the buffer")?;
    arr.shrink_to_fit();
    check(arr.capacity() == 1000, "shrink_to_fit is not exact")
}

fn run_differential(ops: usize, seed: u64) -> Result<(), String> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut arr: DynamicArray<u32> = DynamicArray::new();
    let mut reference: Vec<u32> = Vec::new();

    for step in 0..ops {
        let value: u32 = rng.random();
        let op = rng.random_range(0..9);
        match op {
            0 | 1 => {
                arr.push_back(value);
                reference.push(value);
            }
            2 => {
                if arr.pop_back() != reference.pop() {
                    return Err(format!("pop_back diverged at step {step}"));
                }
            }
            3 | 4 => {
                let k = rng.random_range(0..=reference.len());
                let begin = arr.begin().map_err(|e| e.to_string())?;
                arr.insert(begin + k as isize, value);
                reference.insert(k, value);
            }
            5 if !reference.is_empty() => {
                let k = rng.random_range(0..reference.len());
                let begin = arr.begin().map_err(|e| e.to_string())?;
                arr.erase(begin + k as isize);
                reference.remove(k);
            }
            6 => {
                let n = rng.random_range(0..=reference.len() + 8);
                arr.resize(n, value);
                reference.resize(n, value);
            }
            7 => {
                let cap = rng.random_range(0..=arr.capacity() * 2 + 4);
                let before = arr.capacity();
                arr.reserve(cap);
                if arr.capacity() != before.max(cap) {
                    return Err(format!("reserve({cap}) gave capacity {} at step {step}", arr.capacity()));
                }
            }
            _ => {
                if rng.random_ratio(1, 50) {
                    arr.clear();
                    reference.clear();
                } else if rng.random_ratio(1, 20) {
                    arr.shrink_to_fit();
                }
            }
        }

        if arr.len() > arr.capacity() {
            return Err(format!("len {} exceeds capacity {} at step {step}", arr.len(), arr.capacity()));
        }
        if arr != reference {
            return Err(format!("contents diverged after op {op} at step {step}"));
        }
    }

    info!(ops, seed, len = arr.len(), capacity = arr.capacity(), "differential run finished");
    Ok(())
}

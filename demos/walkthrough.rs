use std::process;

use poolalloc::{Error, LinkedList, MemoryManager};
use tracing_subscriber::EnvFilter;

const POOL_SIZE: usize = 256;

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("poolalloc=debug")),
    )
    .init();

  // Without a pool nothing else can run, so this is the one place we give up.
  let mut manager = match MemoryManager::with_capacity(POOL_SIZE) {
    Ok(manager) => manager,
    Err(err) => {
      eprintln!("Error: {err}");
      process::exit(1);
    }
  };

  if let Err(err) = run(&mut manager) {
    eprintln!("Error: {err}");
    process::exit(1);
  }
}

fn run(manager: &mut MemoryManager) -> Result<(), Error> {
  println!("[start] {manager}");

  // --------------------------------------------------------------------
  // 1) Three allocations carve the pool from the front.
  // --------------------------------------------------------------------
  let a = manager.alloc(32)?;
  let b = manager.alloc(32)?;
  let c = manager.alloc(32)?;
  manager.bytes_mut(a)?.fill(0xAA);
  println!("\n[1] alloc a={a} b={b} c={c}");
  println!("[1] {manager}");

  // --------------------------------------------------------------------
  // 2) Freeing b then a merges them into one free block ahead of c.
  // --------------------------------------------------------------------
  manager.free(b)?;
  manager.free(a)?;
  println!("\n[2] free b, free a");
  println!("[2] {manager}");

  // --------------------------------------------------------------------
  // 3) A small request reuses the first hole (first fit).
  // --------------------------------------------------------------------
  let d = manager.alloc(8)?;
  println!("\n[3] alloc d={d} (reused a's slot? {})", d == a);
  println!("[3] {manager}");

  // --------------------------------------------------------------------
  // 4) Growing d past its block moves it and keeps its bytes.
  // --------------------------------------------------------------------
  manager.bytes_mut(d)?.copy_from_slice(b"poolside");
  let d = manager.resize(Some(d), 80)?;
  println!(
    "\n[4] resize d -> {d}, first bytes = {:?}",
    String::from_utf8_lossy(&manager.bytes(d)?[..8])
  );
  println!("[4] {manager}");

  // --------------------------------------------------------------------
  // 5) Requests that cannot fit are reported, not fatal.
  // --------------------------------------------------------------------
  match manager.alloc(POOL_SIZE + 1) {
    Err(err) => println!("\n[5] alloc({}) failed as expected: {err}", POOL_SIZE + 1),
    Ok(addr) => println!("\n[5] unexpected allocation at {addr}"),
  }

  manager.free(d)?;
  manager.free(c)?;
  println!("[5] {manager}");

  // --------------------------------------------------------------------
  // 6) A list whose nodes all live in the pool.
  // --------------------------------------------------------------------
  let mut list = LinkedList::new(manager);
  for value in [3, 7, 2] {
    list.insert(value)?;
  }
  let seven = list.search(7)?;
  list.insert_after(seven, 5)?;
  list.insert_before(list.head(), 1)?;
  println!("\n[6] list = {list} ({} nodes)", list.count()?);
  println!("[6] {}", list.manager());

  list.delete(7)?;
  let two = list.search(2)?.ok_or(Error::InvalidArgument("2 is missing"))?;
  println!("[6] after delete 7: {list}, up to 2: {}", list.display_range(None, two)?);

  // --------------------------------------------------------------------
  // 7) Cleanup frees every node and releases the pool.
  // --------------------------------------------------------------------
  list.cleanup()?;
  println!("\n[7] {manager}");

  Ok(())
}

use std::sync::Barrier;
use std::thread;
use triomphe::Arc;

use bedrock::name::EntryId;
use bedrock::name::KnownName;
use bedrock::name::Name;
use bedrock::name::NamePool;

#[test]
fn stress_concurrent_same_name() {
  let pool: Arc<NamePool> = Arc::new(NamePool::new());
  let barrier: Arc<Barrier> = Arc::new(Barrier::new(64));

  let threads: Vec<_> = (0..64)
    .map(|_| {
      let pool: Arc<NamePool> = Arc::clone(&pool);
      let barrier: Arc<Barrier> = Arc::clone(&barrier);

      thread::spawn(move || {
        barrier.wait();
        pool.store("Contended")
      })
    })
    .collect();

  let ids: Vec<EntryId> = threads
    .into_iter()
    .map(|handle| handle.join().unwrap())
    .collect();

  assert!(ids.windows(2).all(|window| window[0] == window[1]));
  assert_eq!(pool.find("Contended"), Some(ids[0]));
  assert_eq!(pool.entry_count() as usize, KnownName::COUNT + 1);
}

#[test]
fn stress_concurrent_distinct_names() {
  let pool: Arc<NamePool> = Arc::new(NamePool::new());
  let barrier: Arc<Barrier> = Arc::new(Barrier::new(8));

  // Every thread stores the same 200 names; interning must yield one
  // handle per name no matter how the stores interleave.
  let threads: Vec<_> = (0..8)
    .map(|_| {
      let pool: Arc<NamePool> = Arc::clone(&pool);
      let barrier: Arc<Barrier> = Arc::clone(&barrier);

      thread::spawn(move || {
        barrier.wait();

        (0..200)
          .map(|index| pool.store(&format!("Shared{index}")))
          .collect::<Vec<EntryId>>()
      })
    })
    .collect();

  let results: Vec<Vec<EntryId>> = threads
    .into_iter()
    .map(|handle| handle.join().unwrap())
    .collect();

  for ids in results.iter() {
    assert_eq!(ids, &results[0]);
  }

  assert_eq!(pool.entry_count() as usize, KnownName::COUNT + 200);
}

#[test]
fn growth_preserves_existing_handles() {
  let pool: NamePool = NamePool::new();
  let initial_slots: u32 = pool.slot_capacity();

  let names: Vec<String> = (0..30_000).map(|index| format!("Grown{index}")).collect();
  let ids: Vec<EntryId> = names.iter().map(|name| pool.store(name)).collect();

  // ~940 entries per comparison shard forces several doublings of the
  // 256-slot initial tables.
  assert!(pool.slot_capacity() >= initial_slots * 4);

  for (name, id) in names.iter().zip(ids.iter().copied()) {
    assert_eq!(pool.find(name), Some(id), "find changed after growth");
    assert_eq!(pool.store(name), id, "store duplicated an entry");
    assert_eq!(pool.resolve(id).as_str(), name);
  }

  assert_eq!(pool.entry_count() as usize, KnownName::COUNT + names.len());
}

#[test]
fn case_insensitive_identity_preserves_display() {
  let pool: NamePool = NamePool::new();

  let first: EntryId = pool.store("MixedCase");
  let second: EntryId = pool.store("MIXEDCASE");
  let third: EntryId = pool.store("mixedcase");

  assert_eq!(pool.resolve(first).comparison_id(), first);
  assert_eq!(pool.resolve(second).comparison_id(), first);
  assert_eq!(pool.resolve(third).comparison_id(), first);

  assert_eq!(pool.resolve(first).as_str(), "MixedCase");
  assert_eq!(pool.resolve(second).as_str(), "MIXEDCASE");
  assert_eq!(pool.resolve(third).as_str(), "mixedcase");

  // Finds hit the stored casings and fall back to the sticky first-seen
  // comparison entry for unseen casings.
  assert_eq!(pool.find("MIXEDCASE"), Some(second));
  assert_eq!(pool.find("MiXeDcAsE"), Some(first));
}

#[test]
fn wide_names_round_trip() {
  let pool: NamePool = NamePool::new();

  let id: EntryId = pool.store("こんにちは");

  assert!(pool.resolve(id).is_wide());
  assert_eq!(pool.resolve(id).as_str(), "こんにちは");
  assert_eq!(pool.find("こんにちは"), Some(id));
  assert_eq!(pool.wide_count(), 1);
}

#[test]
fn hardcoded_names_share_identity_space() {
  // Storing an engine-reserved literal yields the pre-registered handle.
  let stored: Name = Name::new("Cylinder");

  assert_eq!(stored, Name::from_known(KnownName::Cylinder));
  assert_eq!(stored.known(), Some(KnownName::Cylinder));

  let pool: NamePool = NamePool::new();

  assert_eq!(pool.store("Cylinder"), pool.find_known(KnownName::Cylinder));
}

#[test]
fn empty_inputs_intern_to_none() {
  assert_eq!(Name::new(""), Name::NONE);
  assert_eq!(Name::with_number("", Some(7)), Name::NONE);
  assert_eq!(Name::find(""), Some(Name::NONE));
  assert!(Name::new("").is_none());
}

#[test]
fn numeric_suffix_is_split() {
  let name: Name = Name::new("ABC_10");

  assert_eq!(name.number(), Some(10));
  assert_eq!(name.plain_str(), "ABC");
  assert_eq!(name.to_string(), "ABC_10");

  // The suffix lives in the handle, not the pool.
  assert_eq!(Name::new("ABC").display_id(), name.display_id());
}

#[test]
fn find_is_read_only() {
  let pool: NamePool = NamePool::new();
  let before: u32 = pool.entry_count();

  assert_eq!(pool.find("NeverInterned"), None);
  assert_eq!(pool.entry_count(), before);

  assert_eq!(Name::find("NeverInterned.Anywhere"), None);
}

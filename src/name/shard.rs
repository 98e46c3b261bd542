use hashbrown::DefaultHashBuilder;
use parking_lot::RwLock;
use std::mem;

use crate::consts::INITIAL_SLOTS_PER_SHARD;
use crate::consts::LOAD_FACTOR_DIVISOR;
use crate::consts::LOAD_FACTOR_QUOTIENT;
use crate::name::arena::EntryArena;
use crate::name::entry::EntryId;
use crate::name::entry::EntryRef;
use crate::name::hash::NameHash;
use crate::name::view::NameCase;
use crate::name::view::NameView;
use crate::name::view::equals_same_dimensions;

// -----------------------------------------------------------------------------
// Name Slot
// -----------------------------------------------------------------------------

/// One bucket of a shard's hash table.
///
/// Packs an entry id (29 bits) and a probe hash (3 bits) into one word.
/// An all-zero slot is unused; the "None" name, whose entry id is zero,
/// is distinguishable because its hash always carries a forced probe bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub(crate) struct NameSlot {
  bits: u32,
}

impl NameSlot {
  pub(crate) const UNUSED: Self = Self { bits: 0 };

  pub(crate) const ID_MASK: u32 = (1 << EntryId::BITS) - 1;
  pub(crate) const PROBE_SHIFT: u32 = EntryId::BITS;
  pub(crate) const PROBE_MASK: u32 = !Self::ID_MASK;

  #[inline]
  fn new(id: EntryId, probe_hash: u32) -> Self {
    debug_assert_eq!(id.to_u32() & Self::PROBE_MASK, 0);
    debug_assert_eq!(probe_hash & Self::ID_MASK, 0);

    let slot: Self = Self {
      bits: id.to_u32() | probe_hash,
    };

    debug_assert!(slot.used());
    slot
  }

  #[inline]
  const fn used(self) -> bool {
    self.bits != 0
  }

  #[inline]
  const fn id(self) -> EntryId {
    EntryId::from_u32(self.bits & Self::ID_MASK)
  }

  #[inline]
  const fn probe_hash(self) -> u32 {
    self.bits & Self::PROBE_MASK
  }
}

// -----------------------------------------------------------------------------
// Name Value
// -----------------------------------------------------------------------------

/// A candidate name paired with its hash, ready to probe one dimension of
/// the pool.
pub(crate) struct NameValue<'a> {
  pub(crate) view: NameView<'a>,
  pub(crate) hash: NameHash,
  pub(crate) comparison_id: Option<EntryId>,
}

impl<'a> NameValue<'a> {
  pub(crate) fn new(hasher: &DefaultHashBuilder, view: NameView<'a>, case: NameCase) -> Self {
    Self {
      view,
      hash: NameHash::new(hasher, view, case),
      comparison_id: None,
    }
  }
}

// -----------------------------------------------------------------------------
// Pool Shard
// -----------------------------------------------------------------------------

/// One independent hash table covering a partition of the hash space.
///
/// Reads probe under a shared lock; insertion and growth take the shard's
/// exclusive lock, so write contention is limited to same-shard writers.
pub(crate) struct PoolShard {
  case: NameCase,
  hasher: DefaultHashBuilder,
  table: RwLock<SlotTable>,
}

struct SlotTable {
  slots: Box<[NameSlot]>,
  used: u32,
}

impl PoolShard {
  pub(crate) fn new(case: NameCase, hasher: DefaultHashBuilder) -> Self {
    Self {
      case,
      hasher,
      table: RwLock::new(SlotTable {
        slots: vec![NameSlot::UNUSED; INITIAL_SLOTS_PER_SHARD].into_boxed_slice(),
        used: 0,
      }),
    }
  }

  /// Returns the current slot capacity of this shard.
  pub(crate) fn capacity(&self) -> u32 {
    self.table.read().slots.len() as u32
  }

  /// Probes for an existing entry equal to `value`. Never allocates.
  pub(crate) fn find(&self, entries: &EntryArena, value: &NameValue<'_>) -> Option<EntryId> {
    let table = self.table.read();
    let index: usize = table.probe(value.hash.unmasked_slot_index, |slot| {
      self.slot_matches(entries, slot, value)
    });

    let slot: NameSlot = table.slots[index];
    slot.used().then(|| slot.id())
  }

  /// Inserts `value`, creating a new entry on miss.
  ///
  /// The probe is repeated under the exclusive lock, so two threads racing
  /// to insert the same name both return the single winning entry; the
  /// boolean reports whether this call created it.
  pub(crate) fn insert(&self, entries: &EntryArena, value: &NameValue<'_>) -> (EntryId, bool) {
    let mut table = self.table.write();
    let index: usize = table.probe(value.hash.unmasked_slot_index, |slot| {
      self.slot_matches(entries, slot, value)
    });

    let slot: NameSlot = table.slots[index];

    if slot.used() {
      return (slot.id(), false);
    }

    let id: EntryId = entries
      .create(value.view, value.comparison_id, value.hash.entry_probe_header)
      .into();

    self.claim(&mut table, entries, index, NameSlot::new(id, value.hash.slot_probe_hash));

    (id, true)
  }

  /// Registers an entry created by another dimension under `hash`, without
  /// allocating. No-op when an identical slot is already present.
  pub(crate) fn insert_existing(&self, entries: &EntryArena, hash: &NameHash, id: EntryId) {
    let lookup: NameSlot = NameSlot::new(id, hash.slot_probe_hash);

    let mut table = self.table.write();
    let index: usize = table.probe(hash.unmasked_slot_index, |slot| slot == lookup);

    if !table.slots[index].used() {
      self.claim(&mut table, entries, index, lookup);
    }
  }

  fn slot_matches(&self, entries: &EntryArena, slot: NameSlot, value: &NameValue<'_>) -> bool {
    if slot.probe_hash() != value.hash.slot_probe_hash {
      return false;
    }

    let entry: EntryRef<'_> = entries.resolve(slot.id().into());

    entry.header() == value.hash.entry_probe_header
      && equals_same_dimensions(entry.as_str().as_bytes(), value.view.bytes(), self.case)
  }

  fn claim(&self, table: &mut SlotTable, entries: &EntryArena, index: usize, slot: NameSlot) {
    table.slots[index] = slot;
    table.used += 1;

    if table.used * LOAD_FACTOR_DIVISOR >= LOAD_FACTOR_QUOTIENT * table.slots.len() as u32 {
      self.grow(table, entries);
    }
  }

  /// Doubles the slot array and reinserts every used slot.
  ///
  /// Hashes are re-derived from the stored entries (slots cache only three
  /// probe bits), and slots keep their packed value, so growth never
  /// invalidates a published entry id.
  fn grow(&self, table: &mut SlotTable, entries: &EntryArena) {
    let doubled: Box<[NameSlot]> =
      vec![NameSlot::UNUSED; table.slots.len() * 2].into_boxed_slice();

    let old_slots: Box<[NameSlot]> = mem::replace(&mut table.slots, doubled);
    let old_used: u32 = table.used;

    tracing::trace!(capacity = table.slots.len(), "name shard grown");

    table.used = 0;

    for slot in old_slots.iter().copied().filter(|slot| slot.used()) {
      let hash: NameHash = self.rehash(entries, slot.id());
      let index: usize = table.probe(hash.unmasked_slot_index, |_| false);

      table.slots[index] = slot;
      table.used += 1;
    }

    debug_assert_eq!(old_used, table.used);
  }

  fn rehash(&self, entries: &EntryArena, id: EntryId) -> NameHash {
    let entry: EntryRef<'_> = entries.resolve(id.into());
    NameHash::new(&self.hasher, entry.view(), self.case)
  }
}

impl SlotTable {
  /// Finds the slot fulfilling `predicate`, or the first unused slot of the
  /// probe sequence. The load factor guarantees the table is never full,
  /// so the scan always terminates.
  fn probe(&self, unmasked_slot_index: u32, predicate: impl Fn(NameSlot) -> bool) -> usize {
    let mask: u32 = self.slots.len() as u32 - 1;
    let mut index: u32 = unmasked_slot_index & mask;

    loop {
      let slot: NameSlot = self.slots[index as usize];

      if !slot.used() || predicate(slot) {
        return index as usize;
      }

      index = (index + 1) & mask;
    }
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use hashbrown::DefaultHashBuilder;

  use crate::name::arena::EntryArena;
  use crate::name::entry::EntryId;
  use crate::name::shard::NameValue;
  use crate::name::shard::PoolShard;
  use crate::name::view::NameCase;
  use crate::name::view::NameView;

  fn value<'a>(hasher: &DefaultHashBuilder, text: &'a str) -> NameValue<'a> {
    NameValue::new(hasher, NameView::new(text), NameCase::Ignore)
  }

  #[test]
  fn test_insert_then_find() {
    let hasher: DefaultHashBuilder = DefaultHashBuilder::default();
    let entries: EntryArena = EntryArena::new();
    let shard: PoolShard = PoolShard::new(NameCase::Ignore, hasher.clone());

    assert_eq!(shard.find(&entries, &value(&hasher, "Widget")), None);

    let (id, created) = shard.insert(&entries, &value(&hasher, "Widget"));
    assert!(created);

    let (again, created) = shard.insert(&entries, &value(&hasher, "Widget"));
    assert!(!created);
    assert_eq!(id, again);

    assert_eq!(shard.find(&entries, &value(&hasher, "widget")), Some(id));
  }

  #[test]
  fn test_growth_preserves_ids() {
    let hasher: DefaultHashBuilder = DefaultHashBuilder::default();
    let entries: EntryArena = EntryArena::new();
    let shard: PoolShard = PoolShard::new(NameCase::Ignore, hasher.clone());

    let before: u32 = shard.capacity();

    let names: Vec<String> = (0..2048).map(|index| format!("Grown{index}")).collect();
    let ids: Vec<EntryId> = names
      .iter()
      .map(|name| shard.insert(&entries, &value(&hasher, name)).0)
      .collect();

    // 2048 inserts at 90% load forces at least two doublings of 256 slots.
    assert!(shard.capacity() >= before * 4);

    for (name, id) in names.iter().zip(ids) {
      assert_eq!(shard.find(&entries, &value(&hasher, name)), Some(id));

      let (found, created) = shard.insert(&entries, &value(&hasher, name));
      assert!(!created);
      assert_eq!(found, id);
    }
  }
}

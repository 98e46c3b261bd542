use crossbeam_utils::CachePadded;
use hashbrown::DefaultHashBuilder;
use hashbrown::HashMap;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;

use crate::consts::MAX_NAME_BYTES;
use crate::consts::SHARD_COUNT;
use crate::error::fatal;
use crate::error::raise;
use crate::name::arena::EntryArena;
use crate::name::entry::EntryHandle;
use crate::name::entry::EntryId;
use crate::name::entry::EntryRef;
use crate::name::known::KnownName;
use crate::name::shard::NameValue;
use crate::name::shard::PoolShard;
use crate::name::view::NameCase;
use crate::name::view::NameView;
use crate::name::view::equals_same_dimensions;

// -----------------------------------------------------------------------------
// Name Pool
// -----------------------------------------------------------------------------

/// Process-wide string interning table.
///
/// A pool maps strings to stable 32-bit [`EntryId`] handles. Identity is
/// case-insensitive, but the casing a name was first stored with is
/// preserved: storing `"Cylinder"` and then `"CYLINDER"` yields two handles
/// that share one comparison id while resolving to their own spellings.
///
/// Internally the pool keeps two sets of [`SHARD_COUNT`] hash-table shards
/// (one comparison set, one display set) over a shared append-only entry
/// arena. Lookups take one shard read lock; insertion takes one shard
/// write lock; [`resolve`][Self::resolve] takes no lock at all.
///
/// The crate's [`Name`] type uses a lazily constructed global pool;
/// independent pools can be created freely, but handles are only
/// meaningful to the pool that produced them.
///
/// [`Name`]: crate::name::Name
pub struct NamePool {
  entries: EntryArena,
  hasher: DefaultHashBuilder,
  narrow_count: AtomicU32,
  wide_count: AtomicU32,
  comparison_shards: Box<[CachePadded<PoolShard>]>,
  display_shards: Box<[CachePadded<PoolShard>]>,
  known_to_entry: [EntryId; KnownName::COUNT],
  entry_to_known: HashMap<EntryId, KnownName, DefaultHashBuilder>,
  largest_known_id: u32,
}

impl NamePool {
  /// Creates a pool with every [`KnownName`] pre-registered.
  ///
  /// # Aborts
  ///
  /// Aborts the process if two well-known names collide - that indicates
  /// an inconsistent registration table, not a runtime condition.
  pub fn new() -> Self {
    let hasher: DefaultHashBuilder = DefaultHashBuilder::default();

    let mut pool: Self = Self {
      entries: EntryArena::new(),
      hasher: hasher.clone(),
      narrow_count: AtomicU32::new(0),
      wide_count: AtomicU32::new(0),
      comparison_shards: make_shards(NameCase::Ignore, &hasher),
      display_shards: make_shards(NameCase::Sensitive, &hasher),
      known_to_entry: [EntryId::NONE; KnownName::COUNT],
      entry_to_known: HashMap::with_capacity_and_hasher(KnownName::COUNT, hasher),
      largest_known_id: 0,
    };

    for known in KnownName::ALL.iter().copied() {
      let id: EntryId = pool.store(known.as_str());

      pool.known_to_entry[known.index()] = id;
      pool.entry_to_known.insert(id, known);
      pool.largest_known_id = pool.largest_known_id.max(id.to_u32());
    }

    if pool.entry_to_known.len() != KnownName::COUNT {
      fatal!("duplicate well-known name");
    }

    if !pool.known_to_entry[KnownName::None.index()].is_none() {
      fatal!("the None name must occupy entry id zero");
    }

    pool
  }

  /// Looks up the handle of `text` without ever allocating.
  ///
  /// Returns [`None`] when the string was never stored - indistinguishable,
  /// by design, from any other never-interned string.
  pub fn find(&self, text: &str) -> Option<EntryId> {
    if text.is_empty() || text.len() > MAX_NAME_BYTES {
      return None;
    }

    let view: NameView<'_> = NameView::new(text);

    let display: NameValue<'_> = NameValue::new(&self.hasher, view, NameCase::Sensitive);
    let shard: &PoolShard = &self.display_shards[display.hash.shard_index as usize];

    if let Some(existing) = shard.find(&self.entries, &display) {
      return Some(existing);
    }

    let comparison: NameValue<'_> = NameValue::new(&self.hasher, view, NameCase::Ignore);
    let shard: &PoolShard = &self.comparison_shards[comparison.hash.shard_index as usize];

    shard.find(&self.entries, &comparison)
  }

  /// Interns `text` and returns its handle.
  ///
  /// Repeated calls with equal strings (from any thread, concurrently)
  /// return one and the same handle.
  ///
  /// # Panics
  ///
  /// Panics if `text` is empty or longer than [`MAX_NAME_BYTES`] - both
  /// are caller-checked preconditions, not pool-level errors.
  pub fn store(&self, text: &str) -> EntryId {
    if text.is_empty() {
      raise!(BadArg, "cannot store an empty name");
    }

    if text.len() > MAX_NAME_BYTES {
      raise!(SysCap, "name exceeds maximum length");
    }

    self.store_view(NameView::new(text))
  }

  fn store_view(&self, view: NameView<'_>) -> EntryId {
    let display: NameValue<'_> = NameValue::new(&self.hasher, view, NameCase::Sensitive);
    let display_shard: &PoolShard = &self.display_shards[display.hash.shard_index as usize];

    if let Some(existing) = display_shard.find(&self.entries, &display) {
      return existing;
    }

    // The comparison entry goes in first: a display entry must be able to
    // point at its comparison identity.
    let comparison: NameValue<'_> = NameValue::new(&self.hasher, view, NameCase::Ignore);
    let comparison_shard: &PoolShard = &self.comparison_shards[comparison.hash.shard_index as usize];

    let (comparison_id, added) = comparison_shard.insert(&self.entries, &comparison);
    self.count_entry(view, added);

    let stored: EntryRef<'_> = self.resolve(comparison_id);

    if added || equals_same_dimensions(stored.as_str().as_bytes(), view.bytes(), NameCase::Sensitive)
    {
      // First-seen casing matches the input: one entry serves both
      // dimensions.
      display_shard.insert_existing(&self.entries, &display.hash, comparison_id);
      return comparison_id;
    }

    let display: NameValue<'_> = NameValue {
      comparison_id: Some(comparison_id),
      ..display
    };

    let (display_id, added) = display_shard.insert(&self.entries, &display);
    self.count_entry(view, added);

    display_id
  }

  /// Resolves a handle into its entry. Lock-free.
  ///
  /// The handle must have been produced by this pool; a foreign or
  /// fabricated handle is rejected by bounds checks in debug builds and
  /// yields unspecified (but memory-safe for ids from [`is_valid`]
  /// handles) text otherwise.
  ///
  /// [`is_valid`]: Self::is_valid
  #[inline]
  pub fn resolve(&self, id: EntryId) -> EntryRef<'_> {
    self.entries.resolve(EntryHandle::from(id))
  }

  /// Returns `true` when `id` points into allocated entry storage.
  pub fn is_valid(&self, id: EntryId) -> bool {
    EntryHandle::from(id).block < self.entries.num_blocks()
  }

  // ---------------------------------------------------------------------------
  // Well-Known Names
  // ---------------------------------------------------------------------------

  /// Returns the handle a [`KnownName`] was registered under.
  #[inline]
  pub fn find_known(&self, known: KnownName) -> EntryId {
    self.known_to_entry[known.index()]
  }

  /// Reverse lookup: the [`KnownName`] registered under `id`, if any.
  pub fn known_for(&self, id: EntryId) -> Option<KnownName> {
    if id.to_u32() > self.largest_known_id {
      return None;
    }

    self.entry_to_known.get(&id).copied()
  }

  // ---------------------------------------------------------------------------
  // Stats
  // ---------------------------------------------------------------------------

  /// Total number of distinct entries (comparison plus display).
  pub fn entry_count(&self) -> u32 {
    self.narrow_count() + self.wide_count()
  }

  /// Number of entries containing only ASCII bytes.
  pub fn narrow_count(&self) -> u32 {
    self.narrow_count.load(Ordering::Relaxed)
  }

  /// Number of entries containing non-ASCII bytes.
  pub fn wide_count(&self) -> u32 {
    self.wide_count.load(Ordering::Relaxed)
  }

  /// Number of entry blocks allocated so far.
  pub fn block_count(&self) -> u32 {
    self.entries.num_blocks()
  }

  /// Total slot capacity across every shard of both dimensions.
  pub fn slot_capacity(&self) -> u32 {
    let comparison: u32 = self.comparison_shards.iter().map(|shard| shard.capacity()).sum();
    let display: u32 = self.display_shards.iter().map(|shard| shard.capacity()).sum();

    comparison + display
  }

  /// Emits a stats line through the crate's diagnostics.
  pub fn log_stats(&self) {
    tracing::debug!(
      entries = self.entry_count(),
      blocks = self.block_count(),
      slots = self.slot_capacity(),
      "name pool stats"
    );
  }

  /// Snapshots every entry in allocation order.
  ///
  /// Exclusive access guarantees no store is in flight during the walk.
  pub fn debug_dump(&mut self) -> Vec<(EntryId, String)> {
    let mut out: Vec<(EntryId, String)> = Vec::with_capacity(self.entry_count() as usize);

    self.entries.for_each_entry(|handle, entry| {
      out.push((handle.into(), entry.as_str().to_owned()));
    });

    out
  }

  fn count_entry(&self, view: NameView<'_>, added: bool) {
    if added {
      let count: &AtomicU32 = if view.is_wide() {
        &self.wide_count
      } else {
        &self.narrow_count
      };

      count.fetch_add(1, Ordering::Relaxed);
    }
  }
}

impl Default for NamePool {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

fn make_shards(case: NameCase, hasher: &DefaultHashBuilder) -> Box<[CachePadded<PoolShard>]> {
  (0..SHARD_COUNT)
    .map(|_| CachePadded::new(PoolShard::new(case, hasher.clone())))
    .collect()
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

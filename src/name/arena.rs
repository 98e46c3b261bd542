//! Paged bump allocator for name entries.
//!
//! Entries are stored back to back inside fixed-size blocks and addressed
//! by `(block, offset)` handles, never by pointer. An entry is written
//! exactly once, before its handle is published through a shard, and is
//! never moved, resized, or freed afterwards; whole blocks are released
//! only when the arena itself is dropped. This append-only discipline is
//! what allows [`resolve`][EntryArena::resolve] to run without a lock.
//!
//! # Entry Layout
//!
//! ```text
//! offset 0: comparison id  (u32)
//! offset 4: header         (u16: width flag + byte length)
//! offset 6: UTF-8 bytes    (header.len() bytes, no terminator)
//! ```
//!
//! Entries start at 4-byte strides; a 16-bit stride offset therefore spans
//! a 256 KiB block.

use parking_lot::Mutex;
use std::ptr;
use std::ptr::null_mut;
use std::slice;
use std::str;

use crate::consts::BLOCK_SIZE_BYTES;
use crate::consts::ENTRY_STRIDE;
use crate::consts::MAX_BLOCKS;
use crate::error::fatal;
use crate::loom::alloc::Layout;
use crate::loom::alloc::alloc;
use crate::loom::alloc::dealloc;
use crate::loom::sync::atomic::AtomicPtr;
use crate::loom::sync::atomic::Ordering;
use crate::name::entry::EntryHandle;
use crate::name::entry::EntryHeader;
use crate::name::entry::EntryId;
use crate::name::entry::EntryRef;
use crate::name::view::NameView;

/// Byte offset of the character data inside an entry.
const DATA_OFFSET: usize = 6;

/// Alignment of entry blocks. Larger than the 4-byte stride requires, but
/// keeps blocks from sharing cache lines with unrelated allocations.
const BLOCK_ALIGN: usize = 64;

// -----------------------------------------------------------------------------
// Entry Arena
// -----------------------------------------------------------------------------

/// Thread-safe paged entry allocator.
pub(crate) struct EntryArena {
  /// Block pointer table, fixed at [`MAX_BLOCKS`] entries. Slots past the
  /// cursor's block are null; published pointers are never replaced.
  blocks: Box<[AtomicPtr<u8>]>,
  cursor: Mutex<Cursor>,
}

struct Cursor {
  block: u32,
  used_bytes: u32,
}

impl EntryArena {
  pub(crate) fn new() -> Self {
    let blocks: Box<[AtomicPtr<u8>]> = (0..MAX_BLOCKS)
      .map(|_| AtomicPtr::new(null_mut()))
      .collect();

    let this: Self = Self {
      blocks,
      cursor: Mutex::new(Cursor {
        block: 0,
        used_bytes: 0,
      }),
    };

    this.blocks[0].store(allocate_block(), Ordering::Release);
    this
  }

  /// Reserves `bytes` (rounded up to the stride) and returns the handle of
  /// the reservation. The reserved region is written by the caller before
  /// the handle escapes.
  fn allocate(&self, bytes: usize) -> EntryHandle {
    let bytes: usize = (bytes + ENTRY_STRIDE - 1) & !(ENTRY_STRIDE - 1);
    debug_assert!(bytes <= BLOCK_SIZE_BYTES);

    let mut cursor = self.cursor.lock();

    if BLOCK_SIZE_BYTES - (cursor.used_bytes as usize) < bytes {
      self.advance_block(&mut cursor);
    }

    let offset_bytes: u32 = cursor.used_bytes;
    cursor.used_bytes += bytes as u32;

    debug_assert_eq!(offset_bytes as usize % ENTRY_STRIDE, 0);

    EntryHandle {
      block: cursor.block,
      offset: offset_bytes / ENTRY_STRIDE as u32,
    }
  }

  /// Allocates and writes a new entry, returning its handle.
  ///
  /// A `comparison_id` of `None` marks the entry as its own comparison
  /// identity (the comparison-dimension case).
  pub(crate) fn create(
    &self,
    view: NameView<'_>,
    comparison_id: Option<EntryId>,
    header: EntryHeader,
  ) -> EntryHandle {
    debug_assert_eq!(view.len(), header.len());

    let handle: EntryHandle = self.allocate(DATA_OFFSET + view.len());
    let comparison: EntryId = comparison_id.unwrap_or_else(|| handle.into());
    let base: *mut u8 = self.entry_ptr(handle);

    // SAFETY: `allocate` reserved `DATA_OFFSET + view.len()` bytes starting
    // at `base` exclusively for this entry. `base` is 4-aligned (stride 4),
    // so the u32 at +0 and the u16 at +4 are aligned. No other thread reads
    // this region until the returned handle is published.
    unsafe {
      ptr::write(base.cast::<u32>(), comparison.to_u32());
      ptr::write(base.add(4).cast::<u16>(), header.to_bits());
      ptr::copy_nonoverlapping(view.bytes().as_ptr(), base.add(DATA_OFFSET), view.len());
    }

    handle
  }

  /// Resolves a handle into an entry view without taking any lock.
  ///
  /// Entries are immutable once their handle has been published, and block
  /// pointers are published with release ordering before any handle into
  /// them escapes, so the acquire load below observes fully written data.
  pub(crate) fn resolve(&self, handle: EntryHandle) -> EntryRef<'_> {
    let base: *const u8 = self.entry_ptr(handle);

    // SAFETY: `handle` was produced by `allocate`, so the entry header and
    // character data it addresses are in bounds, initialized, and frozen.
    // The bytes were copied from a `&str` and are valid UTF-8.
    unsafe {
      let comparison: EntryId = EntryId::from_u32(ptr::read(base.cast::<u32>()));
      let header: EntryHeader = EntryHeader::from_bits(ptr::read(base.add(4).cast::<u16>()));

      debug_assert!(
        handle.offset as usize * ENTRY_STRIDE + DATA_OFFSET + header.len() <= BLOCK_SIZE_BYTES
      );

      let bytes: &[u8] = slice::from_raw_parts(base.add(DATA_OFFSET), header.len());
      let text: &str = str::from_utf8_unchecked(bytes);

      EntryRef::new(comparison, header, text)
    }
  }

  /// Returns the number of blocks allocated so far.
  pub(crate) fn num_blocks(&self) -> u32 {
    self.cursor.lock().block + 1
  }

  /// Visits every entry in allocation order.
  ///
  /// Takes `&mut self`: exclusive access guarantees no entry write is still
  /// in flight, so the walk observes only complete entries.
  pub(crate) fn for_each_entry(&mut self, mut f: impl FnMut(EntryHandle, EntryRef<'_>)) {
    let last_block: u32 = self.cursor.get_mut().block;
    let used_bytes: u32 = self.cursor.get_mut().used_bytes;

    for block in 0..=last_block {
      let end: usize = if block == last_block {
        used_bytes as usize
      } else {
        BLOCK_SIZE_BYTES
      };

      let mut offset_bytes: usize = 0;

      while offset_bytes + DATA_OFFSET <= end {
        let handle: EntryHandle = EntryHandle {
          block,
          offset: (offset_bytes / ENTRY_STRIDE) as u32,
        };

        let base: *const u8 = self.entry_ptr(handle);

        // SAFETY: `offset_bytes` stays within the written span of the
        // block, and a zero header marks the abandoned tail of full blocks.
        let header: EntryHeader =
          EntryHeader::from_bits(unsafe { ptr::read(base.add(4).cast::<u16>()) });

        if header.len() == 0 {
          break;
        }

        f(handle, self.resolve(handle));

        let entry_bytes: usize = DATA_OFFSET + header.len();
        offset_bytes += (entry_bytes + ENTRY_STRIDE - 1) & !(ENTRY_STRIDE - 1);
      }
    }
  }

  fn entry_ptr(&self, handle: EntryHandle) -> *mut u8 {
    let block: *mut u8 = self.blocks[handle.block as usize].load(Ordering::Acquire);
    debug_assert!(!block.is_null());

    // SAFETY: offsets produced by `allocate` are always within the block.
    unsafe { block.add(handle.offset as usize * ENTRY_STRIDE) }
  }

  fn advance_block(&self, cursor: &mut Cursor) {
    // Zero header terminates the abandoned tail for entry iteration.
    if cursor.used_bytes as usize + DATA_OFFSET <= BLOCK_SIZE_BYTES {
      let block: *mut u8 = self.blocks[cursor.block as usize].load(Ordering::Acquire);

      // SAFETY: the terminator lands in the unused tail of the block.
      unsafe {
        ptr::write(
          block.add(cursor.used_bytes as usize + 4).cast::<u16>(),
          0_u16,
        );
      }
    }

    let next: u32 = cursor.block + 1;

    if next as usize >= MAX_BLOCKS {
      fatal!("entry block table exhausted");
    }

    debug_assert!(self.blocks[next as usize].load(Ordering::Relaxed).is_null());

    self.blocks[next as usize].store(allocate_block(), Ordering::Release);

    cursor.block = next;
    cursor.used_bytes = 0;
  }
}

impl Drop for EntryArena {
  fn drop(&mut self) {
    for block in self.blocks.iter() {
      let ptr: *mut u8 = block.load(Ordering::Acquire);

      if !ptr.is_null() {
        // SAFETY: the pointer was produced by `allocate_block` with this
        // exact layout and is dropped exactly once.
        unsafe { dealloc(ptr, block_layout()) };
      }
    }
  }
}

fn block_layout() -> Layout {
  match Layout::from_size_align(BLOCK_SIZE_BYTES, BLOCK_ALIGN) {
    Ok(layout) => layout,
    Err(error) => fatal!(error),
  }
}

fn allocate_block() -> *mut u8 {
  let layout: Layout = block_layout();

  // SAFETY: `layout` has a non-zero size.
  let ptr: *mut u8 = unsafe { alloc(layout) };

  if ptr.is_null() {
    std::alloc::handle_alloc_error(layout);
  }

  ptr
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use crate::name::arena::EntryArena;
  use crate::name::entry::EntryHandle;
  use crate::name::entry::EntryHeader;
  use crate::name::entry::EntryId;
  use crate::name::entry::EntryRef;
  use crate::name::view::NameView;

  fn create(arena: &EntryArena, text: &str) -> EntryHandle {
    let view: NameView<'_> = NameView::new(text);
    arena.create(view, None, EntryHeader::new(view.len(), view.is_wide()))
  }

  #[test]
  fn test_create_resolve_round_trip() {
    let arena: EntryArena = EntryArena::new();

    let a: EntryHandle = create(&arena, "Cylinder");
    let b: EntryHandle = create(&arena, "こんにちは");

    assert_eq!(arena.resolve(a).as_str(), "Cylinder");
    assert!(!arena.resolve(a).is_wide());

    assert_eq!(arena.resolve(b).as_str(), "こんにちは");
    assert!(arena.resolve(b).is_wide());
  }

  #[test]
  fn test_first_entry_is_id_zero() {
    let arena: EntryArena = EntryArena::new();
    let handle: EntryHandle = create(&arena, "None");

    assert_eq!(EntryId::from(handle), EntryId::NONE);
  }

  #[test]
  fn test_self_comparison_id() {
    let arena: EntryArena = EntryArena::new();

    let first: EntryHandle = create(&arena, "First");
    let second: EntryHandle = {
      let view: NameView<'_> = NameView::new("second");
      arena.create(
        view,
        Some(first.into()),
        EntryHeader::new(view.len(), view.is_wide()),
      )
    };

    assert_eq!(arena.resolve(first).comparison_id(), first.into());
    assert_eq!(arena.resolve(second).comparison_id(), first.into());
  }

  #[test]
  fn test_block_advance_keeps_entries_valid() {
    let arena: EntryArena = EntryArena::new();
    let text: String = "x".repeat(1000);

    // Each entry takes ~1008 bytes; a 256 KiB block holds ~260 of them.
    let handles: Vec<EntryHandle> = (0..600).map(|_| create(&arena, &text)).collect();

    assert!(arena.num_blocks() >= 3);

    for handle in handles {
      assert_eq!(arena.resolve(handle).as_str(), text);
    }
  }

  #[test]
  fn test_for_each_entry_visits_in_order() {
    let mut arena: EntryArena = EntryArena::new();

    create(&arena, "Alpha");
    create(&arena, "Beta");
    create(&arena, "Gamma");

    let mut seen: Vec<String> = Vec::new();
    arena.for_each_entry(|_, entry: EntryRef<'_>| seen.push(entry.as_str().to_owned()));

    assert_eq!(seen, ["Alpha", "Beta", "Gamma"]);
  }
}

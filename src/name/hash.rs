use hashbrown::DefaultHashBuilder;
use std::hash::BuildHasher;

use crate::consts::MAX_NAME_BYTES;
use crate::consts::SHARD_COUNT;
use crate::name::entry::EntryHeader;
use crate::name::shard::NameSlot;
use crate::name::view::NameCase;
use crate::name::view::NameView;

// -----------------------------------------------------------------------------
// Name Hash
// -----------------------------------------------------------------------------

/// A name hashed into the parts the pool's tables consume.
///
/// One 64-bit hash determines the owning shard, the slot index to start
/// probing at, and a 3-bit probe tag stored in the slot word. The probe tag
/// culls almost all false candidates before any entry bytes are compared.
///
/// The shard mask uses the low bits of the high word and the probe mask its
/// top bits, so the two never overlap; the slot index comes from the low
/// word and is re-masked by each shard to its current capacity.
pub(crate) struct NameHash {
  pub(crate) shard_index: u32,
  pub(crate) unmasked_slot_index: u32,
  pub(crate) slot_probe_hash: u32,
  pub(crate) entry_probe_header: EntryHeader,
}

const SHARD_MASK: u32 = SHARD_COUNT as u32 - 1;

const _: () = assert!(SHARD_MASK & NameSlot::PROBE_MASK == 0, "masks overlap");

impl NameHash {
  pub(crate) fn new(hasher: &DefaultHashBuilder, view: NameView<'_>, case: NameCase) -> Self {
    let hash: u64 = match case {
      NameCase::Sensitive => hasher.hash_one(view.bytes()),
      NameCase::Ignore => hash_folded(hasher, view.bytes()),
    };

    let hi: u32 = (hash >> 32) as u32;
    let lo: u32 = hash as u32;

    // The "None" name has an entry id of zero, which is also the unused
    // slot value. Force a probe bit for it so its slot always reads as
    // used, regardless of what the hash produced.
    let none_bit: u32 = u32::from(is_none_name(view.bytes())) << NameSlot::PROBE_SHIFT;

    Self {
      shard_index: hi & SHARD_MASK,
      unmasked_slot_index: lo,
      slot_probe_hash: (hi & NameSlot::PROBE_MASK) | none_bit,
      entry_probe_header: EntryHeader::new(view.len(), view.is_wide()),
    }
  }
}

/// Hashes the ASCII-lowercased copy of `bytes`.
fn hash_folded(hasher: &DefaultHashBuilder, bytes: &[u8]) -> u64 {
  debug_assert!(bytes.len() <= MAX_NAME_BYTES);

  let mut buffer: [u8; MAX_NAME_BYTES] = [0; MAX_NAME_BYTES];
  let folded: &mut [u8] = &mut buffer[..bytes.len()];

  for (dst, src) in folded.iter_mut().zip(bytes) {
    *dst = src.to_ascii_lowercase();
  }

  hasher.hash_one(&*folded)
}

#[inline]
fn is_none_name(bytes: &[u8]) -> bool {
  bytes.len() == 4 && bytes.eq_ignore_ascii_case(b"none")
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use hashbrown::DefaultHashBuilder;

  use crate::name::hash::NameHash;
  use crate::name::shard::NameSlot;
  use crate::name::view::NameCase;
  use crate::name::view::NameView;

  #[test]
  fn test_ignore_case_hashes_agree() {
    let hasher: DefaultHashBuilder = DefaultHashBuilder::default();

    let a: NameHash = NameHash::new(&hasher, NameView::new("Cylinder"), NameCase::Ignore);
    let b: NameHash = NameHash::new(&hasher, NameView::new("CYLINDER"), NameCase::Ignore);

    assert_eq!(a.shard_index, b.shard_index);
    assert_eq!(a.unmasked_slot_index, b.unmasked_slot_index);
    assert_eq!(a.slot_probe_hash, b.slot_probe_hash);
  }

  #[test]
  fn test_sensitive_hashes_differ_by_case() {
    let hasher: DefaultHashBuilder = DefaultHashBuilder::default();

    let a: NameHash = NameHash::new(&hasher, NameView::new("Cylinder"), NameCase::Sensitive);
    let b: NameHash = NameHash::new(&hasher, NameView::new("CYLINDER"), NameCase::Sensitive);

    // A 64-bit hash collision between these two would be remarkable.
    assert!(
      a.shard_index != b.shard_index
        || a.unmasked_slot_index != b.unmasked_slot_index
        || a.slot_probe_hash != b.slot_probe_hash
    );
  }

  #[test]
  fn test_none_name_forces_probe_bit() {
    let hasher: DefaultHashBuilder = DefaultHashBuilder::default();

    for text in ["None", "NONE", "none", "nOnE"] {
      let hash: NameHash = NameHash::new(&hasher, NameView::new(text), NameCase::Ignore);
      assert_ne!(hash.slot_probe_hash & NameSlot::PROBE_MASK, 0);
    }

    assert!(NameSlot::PROBE_MASK.count_ones() == 3);
  }
}

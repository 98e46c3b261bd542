//! Global name interning.
//!
//! This module provides a sharded, concurrent string-interning table and a
//! lightweight [`Name`] handle type on top of it.
//!
//! # Name Semantics
//!
//! Names are immutable, interned strings with the following properties:
//!
//! - **Permanent storage**: Once created, entries live for the pool's
//!   lifetime and are never moved or freed
//! - **Case-insensitive identity**: `"Cylinder"` and `"CYLINDER"` are the
//!   same name, while each keeps the casing it was first stored with
//! - **Fast comparison**: Equality compares two 32-bit values, never bytes
//! - **Numeric suffixes**: `"Foo_3"` interns the entry `"Foo"` once and
//!   carries the `3` in the handle
//!
//! # Thread Safety
//!
//! The pool is sharded by hash: lookups take one shard's read lock,
//! insertion takes one shard's write lock, and handle resolution takes no
//! lock at all. Entries are append-only, which is what makes the lock-free
//! read side sound.
//!
//! # Memory Considerations
//!
//! Entries are **never deallocated** while the pool is alive. Avoid
//! interning unbounded untrusted input; the arena's block table is a hard
//! capacity ceiling and exhausting it aborts the process.

mod arena;
mod entry;
mod hash;
mod known;
mod name;
mod pool;
mod shard;
mod view;

pub use self::entry::EntryId;
pub use self::entry::EntryRef;
pub use self::known::KnownName;
pub use self::name::Name;
pub use self::pool::NamePool;

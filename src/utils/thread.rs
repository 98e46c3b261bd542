use std::cell::Cell;
use std::num::NonZeroU32;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::thread::AccessError;

use crate::error::fatal;

thread_local! {
  static CURRENT: Cell<Option<ThreadId>> = const { Cell::new(None) };
}

/// A small, dense identifier for a running thread.
///
/// Identifiers are handed out from a process-wide counter on first use and
/// cached in thread-local storage, so comparing the calling thread against
/// a stored id costs a TLS read.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[repr(transparent)]
pub(crate) struct ThreadId {
  inner: NonZeroU32,
}

impl ThreadId {
  /// Returns the unique identifier of the calling thread.
  ///
  /// # Errors
  ///
  /// Returns [`AccessError`] when called while the thread's local storage
  /// is being destroyed. Callers on that path must degrade gracefully;
  /// the log redirector treats it as "not the owner thread".
  #[inline]
  pub(crate) fn current() -> Result<Self, AccessError> {
    CURRENT.try_with(|thread| match thread.get() {
      Some(id) => id,
      None => {
        let id: ThreadId = next_thread_id();
        thread.set(Some(id));
        id
      }
    })
  }

  /// Returns this `ThreadId` as a numeric identifier.
  #[inline]
  pub(crate) fn as_u32(&self) -> NonZeroU32 {
    self.inner
  }
}

#[cold]
fn next_thread_id() -> ThreadId {
  static NEXT: AtomicU32 = AtomicU32::new(1);

  // Wrapping back to zero after u32::MAX threads would hand out duplicate
  // identifiers; give up instead.
  match NonZeroU32::new(NEXT.fetch_add(1, Ordering::Relaxed)) {
    Some(inner) => ThreadId { inner },
    None => fatal!("failed to generate unique thread ID: bitspace exhausted"),
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

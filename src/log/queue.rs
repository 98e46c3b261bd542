//! Lock-free multi-producer queue for buffered log lines.
//!
//! Producers push onto an atomic list head with a CAS loop; the consumer
//! detaches the whole list with one swap and reverses it, restoring global
//! arrival order. Detached nodes are owned exclusively by the [`Drain`]
//! that holds them, so no reclamation scheme is needed.
//!
//! The contract the redirector relies on: lines from one producer are
//! drained in the order that producer pushed them, and a drain observes
//! every push that happened before it. Two concurrent drains each receive
//! a disjoint, internally ordered batch.

use std::ptr::null_mut;

use crate::log::line::LogLine;
use crate::loom::sync::atomic::AtomicPtr;
use crate::loom::sync::atomic::Ordering;

// -----------------------------------------------------------------------------
// Line Queue
// -----------------------------------------------------------------------------

/// Unbounded multi-producer, single-consumer queue of [`LogLine`]s.
pub struct LineQueue {
  head: AtomicPtr<Node>,
}

struct Node {
  line: LogLine,
  next: *mut Node,
}

impl LineQueue {
  #[inline]
  pub fn new() -> Self {
    Self {
      head: AtomicPtr::new(null_mut()),
    }
  }

  /// Enqueues a line. Never blocks; callable from any thread.
  pub fn push(&self, line: LogLine) {
    let node: *mut Node = Box::into_raw(Box::new(Node {
      line,
      next: null_mut(),
    }));

    let mut head: *mut Node = self.head.load(Ordering::Relaxed);

    loop {
      // SAFETY: `node` is owned by this call until the CAS below succeeds
      // and is not yet visible to any other thread.
      unsafe { (*node).next = head };

      match self
        .head
        .compare_exchange_weak(head, node, Ordering::Release, Ordering::Relaxed)
      {
        Ok(_) => break,
        Err(current) => head = current,
      }
    }
  }

  /// Detaches every pending line and returns them oldest first.
  pub fn drain(&self) -> Drain {
    let detached: *mut Node = self.head.swap(null_mut(), Ordering::Acquire);

    Drain {
      head: reverse(detached),
    }
  }

  /// Returns `true` when no lines are pending.
  ///
  /// Only a hint under concurrent pushes.
  pub fn is_empty(&self) -> bool {
    self.head.load(Ordering::Relaxed).is_null()
  }
}

impl Default for LineQueue {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

impl Drop for LineQueue {
  fn drop(&mut self) {
    drop(self.drain());
  }
}

/// Reverses a detached push-ordered (newest-first) list in place.
fn reverse(mut node: *mut Node) -> *mut Node {
  let mut reversed: *mut Node = null_mut();

  while !node.is_null() {
    // SAFETY: `node` came off a detached list that only the caller owns.
    let next: *mut Node = unsafe { (*node).next };

    unsafe { (*node).next = reversed };

    reversed = node;
    node = next;
  }

  reversed
}

// -----------------------------------------------------------------------------
// Drain
// -----------------------------------------------------------------------------

/// Owning iterator over one detached batch of lines, oldest first.
pub struct Drain {
  head: *mut Node,
}

impl Iterator for Drain {
  type Item = LogLine;

  fn next(&mut self) -> Option<LogLine> {
    if self.head.is_null() {
      return None;
    }

    // SAFETY: nodes in a detached batch are exclusively owned by this
    // iterator; each is boxed back exactly once.
    let node: Box<Node> = unsafe { Box::from_raw(self.head) };

    self.head = node.next;
    Some(node.line)
  }
}

impl Drop for Drain {
  fn drop(&mut self) {
    while self.next().is_some() {}
  }
}

// SAFETY: a `Drain` exclusively owns its nodes; sending it to another
// thread transfers that ownership wholesale.
unsafe impl Send for Drain {}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(all(test, not(loom)))]
mod tests {
  use std::sync::Barrier;
  use std::thread;
  use triomphe::Arc;

  use crate::log::device::Verbosity;
  use crate::log::line::LogLine;
  use crate::log::queue::LineQueue;
  use crate::name::Name;

  fn line(text: &str) -> LogLine {
    LogLine::new(text, Verbosity::Info, Name::NONE, None)
  }

  #[test]
  fn test_drain_restores_push_order() {
    let queue: LineQueue = LineQueue::new();

    queue.push(line("a"));
    queue.push(line("b"));
    queue.push(line("c"));

    let texts: Vec<String> = queue.drain().map(|line| line.text().to_owned()).collect();

    assert_eq!(texts, ["a", "b", "c"]);
    assert!(queue.is_empty());
  }

  #[test]
  fn test_drain_detaches_batch() {
    let queue: LineQueue = LineQueue::new();

    queue.push(line("before"));

    let drain = queue.drain();

    queue.push(line("after"));

    assert_eq!(drain.count(), 1);
    assert_eq!(queue.drain().count(), 1);
  }

  #[test]
  fn test_per_producer_order_survives_contention() {
    let queue: Arc<LineQueue> = Arc::new(LineQueue::new());
    let barrier: Arc<Barrier> = Arc::new(Barrier::new(8));

    let threads: Vec<_> = (0..8)
      .map(|producer| {
        let queue: Arc<LineQueue> = Arc::clone(&queue);
        let barrier: Arc<Barrier> = Arc::clone(&barrier);

        thread::spawn(move || {
          barrier.wait();

          for index in 0..100 {
            queue.push(line(&format!("{producer}:{index}")));
          }
        })
      })
      .collect();

    for handle in threads {
      handle.join().unwrap();
    }

    let mut last_seen: [i32; 8] = [-1; 8];
    let mut total: usize = 0;

    for entry in queue.drain() {
      let (producer, index) = entry.text().split_once(':').unwrap();
      let producer: usize = producer.parse().unwrap();
      let index: i32 = index.parse().unwrap();

      assert!(index > last_seen[producer], "per-producer order violated");
      last_seen[producer] = index;
      total += 1;
    }

    assert_eq!(total, 800);
  }
}

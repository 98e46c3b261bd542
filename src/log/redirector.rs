use parking_lot::Mutex;
use parking_lot::RwLock;
use std::io::Write;
use std::mem;
use std::sync::Arc;
use std::sync::LazyLock;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::error::fatal;
use crate::error::raise;
use crate::log::device::DeviceCapabilities;
use crate::log::device::OutputDevice;
use crate::log::device::Verbosity;
use crate::log::line::LogLine;
use crate::log::queue::LineQueue;
use crate::name::Name;
use crate::utils::ThreadId;

// -----------------------------------------------------------------------------
// Device Lists
// -----------------------------------------------------------------------------

#[derive(Default)]
struct DeviceLists {
  /// Devices driven only by the owner thread, fed through the line queue.
  buffered: Vec<Arc<dyn OutputDevice>>,
  /// Thread-safe devices, written directly from the producing thread.
  unbuffered: Vec<Arc<dyn OutputDevice>>,
}

impl DeviceLists {
  fn is_empty(&self) -> bool {
    self.buffered.is_empty() && self.unbuffered.is_empty()
  }

  fn contains(&self, device: &Arc<dyn OutputDevice>) -> bool {
    self
      .buffered
      .iter()
      .chain(self.unbuffered.iter())
      .any(|attached| Arc::ptr_eq(attached, device))
  }
}

// -----------------------------------------------------------------------------
// Backlog
// -----------------------------------------------------------------------------

#[derive(Default)]
struct Backlog {
  enabled: bool,
  lines: Vec<LogLine>,
}

// -----------------------------------------------------------------------------
// Log Redirector
// -----------------------------------------------------------------------------

/// Fan-out point routing log lines to registered output devices.
///
/// One thread is the *owner*: it drains buffered lines and performs the
/// synchronous I/O on buffered devices. Every other thread only ever
/// appends to a lock-free queue, so logging from a producer thread never
/// blocks on a slow sink.
///
/// A process-wide instance is available through
/// [`global`][LogRedirector::global] (owned by whichever thread touches it
/// first); independent instances can be constructed for tests, each owned
/// by its constructing thread.
///
/// # Ordering
///
/// Within one thread, devices observe lines in issue order. Across
/// threads, buffered devices observe queue insertion order - a global
/// FIFO over all producer threads, with the owner's directly written
/// lines interleaved at drain points.
pub struct LogRedirector {
  devices: RwLock<DeviceLists>,
  queue: LineQueue,
  backlog: Mutex<Backlog>,
  /// `ThreadId` of the owner, zero when unknowable.
  owner: AtomicU32,
  dead: AtomicBool,
}

impl LogRedirector {
  /// Creates a redirector owned by the calling thread.
  pub fn new() -> Self {
    let owner: u32 = ThreadId::current().map_or(0, |thread| thread.as_u32().get());

    Self {
      devices: RwLock::new(DeviceLists::default()),
      queue: LineQueue::new(),
      backlog: Mutex::new(Backlog::default()),
      owner: AtomicU32::new(owner),
      dead: AtomicBool::new(false),
    }
  }

  /// Returns the process-wide redirector.
  ///
  /// Constructed on first access; the first caller's thread becomes the
  /// owner until [`set_current_thread_as_owner`] is called.
  ///
  /// [`set_current_thread_as_owner`]: Self::set_current_thread_as_owner
  pub fn global() -> &'static Self {
    static GLOBAL: LazyLock<LogRedirector> = LazyLock::new(LogRedirector::new);
    &GLOBAL
  }

  // ---------------------------------------------------------------------------
  // Device Registration
  // ---------------------------------------------------------------------------

  /// Attaches a device, routing it as buffered or unbuffered according to
  /// its [`DeviceCapabilities`]. Attaching a device twice is a no-op.
  pub fn add_output_device(&self, device: Arc<dyn OutputDevice>) {
    let mut lists = self.devices.write();

    if lists.contains(&device) {
      return;
    }

    let unbuffered: bool = device.capabilities().contains(DeviceCapabilities::ANY_THREAD);

    tracing::trace!(unbuffered, "log device attached");

    if unbuffered {
      lists.unbuffered.push(device);
    } else {
      lists.buffered.push(device);
    }
  }

  /// Detaches a device. Lines already queued are still delivered to the
  /// remaining devices only.
  pub fn remove_output_device(&self, device: &Arc<dyn OutputDevice>) {
    let mut lists = self.devices.write();

    lists.buffered.retain(|attached| !Arc::ptr_eq(attached, device));
    lists.unbuffered.retain(|attached| !Arc::ptr_eq(attached, device));
  }

  /// Returns `true` while `device` is attached.
  pub fn is_redirecting_to(&self, device: &Arc<dyn OutputDevice>) -> bool {
    self.devices.read().contains(device)
  }

  // ---------------------------------------------------------------------------
  // Serialization
  // ---------------------------------------------------------------------------

  /// Routes one log line.
  ///
  /// Unbuffered devices are written immediately regardless of the calling
  /// thread. If the caller is the owner thread, pending queued lines are
  /// drained first and buffered devices are then written directly;
  /// otherwise the line is enqueued and the call returns without touching
  /// any buffered device.
  ///
  /// After [`tear_down`][Self::tear_down], or while no devices are
  /// attached, lines degrade to a best-effort direct stdout write.
  pub fn serialize(
    &self,
    text: &str,
    verbosity: Verbosity,
    category: Name,
    time: Option<Duration>,
  ) {
    if self.dead.load(Ordering::Acquire) {
      fallback_print(text, verbosity, category);
      return;
    }

    {
      let mut backlog = self.backlog.lock();

      if backlog.enabled {
        backlog.lines.push(LogLine::new(text, verbosity, category, time));
      }
    }

    let lists = self.devices.read();

    if lists.is_empty() {
      drop(lists);
      fallback_print(text, verbosity, category);
      return;
    }

    for device in lists.unbuffered.iter() {
      device.serialize(text, verbosity, category, time);
    }

    if self.is_owner() {
      self.drain_queue_to(&lists.buffered);

      for device in lists.buffered.iter() {
        device.serialize(text, verbosity, category, time);
      }
    } else {
      self.queue.push(LogLine::new(text, verbosity, category, time));
    }
  }

  // ---------------------------------------------------------------------------
  // Flushing
  // ---------------------------------------------------------------------------

  /// Drains every pending queued line into the buffered devices, oldest
  /// first.
  ///
  /// # Panics
  ///
  /// Panics when called from a thread other than the owner.
  pub fn flush_threaded_logs(&self) {
    self.assert_owner();

    let lists = self.devices.read();
    self.drain_queue_to(&lists.buffered);
  }

  /// Terminal-failure flush, callable from any thread.
  ///
  /// Drains the queue under the shared lock and flushes every device that
  /// tolerates it, trading strict thread affinity for forward progress.
  /// Only meant for crash paths.
  pub fn panic_flush_threaded_logs(&self) {
    let owner: bool = self.is_owner();
    let lists = self.devices.read();

    self.drain_queue_to(&lists.buffered);

    for device in lists.buffered.iter().chain(lists.unbuffered.iter()) {
      if owner
        || device
          .capabilities()
          .contains(DeviceCapabilities::MULTI_THREADED)
      {
        device.flush();
      }
    }
  }

  /// Full flush: drains the queue, then flushes every device.
  ///
  /// # Panics
  ///
  /// Panics when called from a thread other than the owner.
  pub fn flush(&self) {
    self.assert_owner();

    let lists = self.devices.read();
    self.drain_queue_to(&lists.buffered);

    for device in lists.buffered.iter().chain(lists.unbuffered.iter()) {
      device.flush();
    }
  }

  /// Makes the calling thread the owner.
  ///
  /// Pending queued lines are flushed to the buffered devices first, so
  /// lines issued under the previous owner are not stranded behind the
  /// ownership change.
  pub fn set_current_thread_as_owner(&self) {
    let Ok(current) = ThreadId::current() else {
      raise!(SysOwn, "cannot designate an exiting thread as owner");
    };

    {
      let lists = self.devices.read();
      self.drain_queue_to(&lists.buffered);
    }

    self.owner.store(current.as_u32().get(), Ordering::Release);
  }

  // ---------------------------------------------------------------------------
  // Backlog
  // ---------------------------------------------------------------------------

  /// Enables or disables backlog capture. Disabling clears any lines
  /// already captured.
  ///
  /// While enabled, every serialized line is also copied into a rolling
  /// unbounded backlog, so a device attached late can be brought up to
  /// date with [`serialize_backlog`][Self::serialize_backlog].
  pub fn enable_backlog(&self, enable: bool) {
    let mut backlog = self.backlog.lock();

    backlog.enabled = enable;

    if !enable {
      backlog.lines.clear();
    }
  }

  /// Replays the captured backlog into `device`, verbatim and in order.
  pub fn serialize_backlog(&self, device: &dyn OutputDevice) {
    let backlog = self.backlog.lock();

    for line in backlog.lines.iter() {
      line.forward(device);
    }
  }

  // ---------------------------------------------------------------------------
  // Teardown
  // ---------------------------------------------------------------------------

  /// Shuts the redirector down: delivers pending queued lines, detaches
  /// every device, and flushes and tears each one down exactly once.
  ///
  /// Afterwards the redirector stays usable but routes everything to the
  /// stdout fallback, so post-shutdown diagnostics are not lost.
  ///
  /// # Panics / Aborts
  ///
  /// Panics when called from a thread other than the owner; aborts on
  /// reentrant teardown.
  pub fn tear_down(&self) {
    self.assert_owner();

    if self.dead.swap(true, Ordering::SeqCst) {
      fatal!("log redirector torn down twice");
    }

    tracing::trace!("log redirector teardown");

    {
      let lists = self.devices.read();
      self.drain_queue_to(&lists.buffered);
    }

    let detached: DeviceLists = {
      let mut lists = self.devices.write();
      mem::take(&mut *lists)
    };

    for device in detached.unbuffered.into_iter().chain(detached.buffered) {
      device.flush();
      device.tear_down();
    }
  }

  // ---------------------------------------------------------------------------
  // Internals
  // ---------------------------------------------------------------------------

  fn drain_queue_to(&self, buffered: &[Arc<dyn OutputDevice>]) {
    for line in self.queue.drain() {
      for device in buffered {
        line.forward(&**device);
      }
    }
  }

  fn is_owner(&self) -> bool {
    ThreadId::current()
      .map(|thread| thread.as_u32().get() == self.owner.load(Ordering::Acquire))
      .unwrap_or(false)
  }

  fn assert_owner(&self) {
    if !self.is_owner() {
      raise!(SysOwn, "operation restricted to the owner thread");
    }
  }
}

impl Default for LogRedirector {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

/// Best-effort direct write used after teardown and when no devices are
/// attached. Failures to write are deliberately ignored.
fn fallback_print(text: &str, verbosity: Verbosity, category: Name) {
  let mut out = std::io::stdout().lock();

  let _ = if category.is_none() {
    writeln!(out, "{verbosity}: {text}")
  } else {
    writeln!(out, "{category}: {verbosity}: {text}")
  };
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

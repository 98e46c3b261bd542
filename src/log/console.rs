use parking_lot::Mutex;
use std::io::Write;
use std::time::Duration;

use crate::log::device::DeviceCapabilities;
use crate::log::device::OutputDevice;
use crate::log::device::Verbosity;
use crate::log::line::LogLine;
use crate::name::Name;

// -----------------------------------------------------------------------------
// Console Device
// -----------------------------------------------------------------------------

/// Line-oriented stdout device.
///
/// Thread-safe, so the redirector routes it as unbuffered and producer
/// threads write it directly. Output failures are ignored; a console that
/// has gone away is not worth crashing over.
pub struct ConsoleDevice {
  timestamps: bool,
}

impl ConsoleDevice {
  /// Creates a console device that prefixes lines with their timestamp
  /// when one is supplied.
  #[inline]
  pub const fn new() -> Self {
    Self { timestamps: true }
  }

  /// Creates a console device that never prints timestamps.
  #[inline]
  pub const fn without_timestamps() -> Self {
    Self { timestamps: false }
  }
}

impl Default for ConsoleDevice {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

impl OutputDevice for ConsoleDevice {
  fn serialize(&self, text: &str, verbosity: Verbosity, category: Name, time: Option<Duration>) {
    let mut out = std::io::stdout().lock();

    if self.timestamps {
      if let Some(time) = time {
        let _ = write!(out, "[{:.3}]", time.as_secs_f64());
      }
    }

    let _ = if category.is_none() {
      if verbosity == Verbosity::Info {
        writeln!(out, "{text}")
      } else {
        writeln!(out, "{verbosity}: {text}")
      }
    } else if verbosity == Verbosity::Info {
      writeln!(out, "{category}: {text}")
    } else {
      writeln!(out, "{category}: {verbosity}: {text}")
    };
  }

  fn flush(&self) {
    let _ = std::io::stdout().lock().flush();
  }

  fn capabilities(&self) -> DeviceCapabilities {
    DeviceCapabilities::ANY_THREAD | DeviceCapabilities::MULTI_THREADED
  }
}

// -----------------------------------------------------------------------------
// Memory Device
// -----------------------------------------------------------------------------

/// Device that captures every line it receives in memory.
///
/// Useful for tests and for verifying backlog replay. Buffered by default;
/// [`unbuffered`][MemoryDevice::unbuffered] constructs a fully thread-safe
/// variant.
pub struct MemoryDevice {
  lines: Mutex<Vec<LogLine>>,
  capabilities: DeviceCapabilities,
}

impl MemoryDevice {
  /// Creates a buffered capture device (owner-driven).
  pub fn new() -> Self {
    Self::with_capabilities(DeviceCapabilities::empty())
  }

  /// Creates a thread-safe capture device (written directly by producers).
  pub fn unbuffered() -> Self {
    Self::with_capabilities(DeviceCapabilities::ANY_THREAD | DeviceCapabilities::MULTI_THREADED)
  }

  /// Creates a capture device with explicit capabilities.
  pub fn with_capabilities(capabilities: DeviceCapabilities) -> Self {
    Self {
      lines: Mutex::new(Vec::new()),
      capabilities,
    }
  }

  /// Returns a snapshot of every captured line.
  pub fn lines(&self) -> Vec<LogLine> {
    self.lines.lock().clone()
  }

  /// Returns a snapshot of the captured line texts.
  pub fn texts(&self) -> Vec<String> {
    self
      .lines
      .lock()
      .iter()
      .map(|line| line.text().to_owned())
      .collect()
  }

  /// Returns the number of captured lines.
  pub fn len(&self) -> usize {
    self.lines.lock().len()
  }

  /// Returns `true` when nothing has been captured.
  pub fn is_empty(&self) -> bool {
    self.lines.lock().is_empty()
  }

  /// Discards every captured line.
  pub fn clear(&self) {
    self.lines.lock().clear();
  }
}

impl Default for MemoryDevice {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

impl OutputDevice for MemoryDevice {
  fn serialize(&self, text: &str, verbosity: Verbosity, category: Name, time: Option<Duration>) {
    self
      .lines
      .lock()
      .push(LogLine::new(text, verbosity, category, time));
  }

  fn capabilities(&self) -> DeviceCapabilities {
    self.capabilities
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use crate::log::console::MemoryDevice;
  use crate::log::device::OutputDevice;
  use crate::log::device::Verbosity;
  use crate::log::line::LogLine;
  use crate::name::Name;

  #[test]
  fn test_memory_device_captures_in_order() {
    let device: MemoryDevice = MemoryDevice::new();

    device.serialize("first", Verbosity::Info, Name::NONE, None);
    device.serialize("second", Verbosity::Error, Name::NONE, None);

    assert_eq!(device.texts(), ["first", "second"]);
    assert_eq!(device.len(), 2);

    let lines: Vec<LogLine> = device.lines();

    assert_eq!(lines[1].verbosity(), Verbosity::Error);

    device.clear();
    assert!(device.is_empty());
  }
}

use bitflags::bitflags;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::time::Duration;

use crate::name::Name;

// -----------------------------------------------------------------------------
// Verbosity
// -----------------------------------------------------------------------------

/// Severity of a log line, most severe first.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum Verbosity {
  /// The process is about to terminate abnormally.
  Fatal,
  Error,
  Warning,
  /// Operator-facing output that is not a warning.
  Display,
  Info,
  Trace,
}

impl Verbosity {
  /// Returns the canonical label of this level.
  #[inline]
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Fatal => "Fatal",
      Self::Error => "Error",
      Self::Warning => "Warning",
      Self::Display => "Display",
      Self::Info => "Info",
      Self::Trace => "Trace",
    }
  }
}

impl Display for Verbosity {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.write_str(self.as_str())
  }
}

// -----------------------------------------------------------------------------
// Device Capabilities
// -----------------------------------------------------------------------------

bitflags! {
  /// Threading capabilities advertised by an output device.
  #[derive(Clone, Copy, Debug, PartialEq, Eq)]
  pub struct DeviceCapabilities: u8 {
    /// `serialize` is safe to call concurrently from any thread. Devices
    /// with this flag are routed as *unbuffered*: the redirector writes
    /// them directly from the producing thread. Devices without it are
    /// *buffered* and only ever driven by the owner thread.
    const ANY_THREAD = 1 << 0;

    /// `flush` and `tear_down` may be driven from a thread other than the
    /// owner, which the panic-flush path relies on.
    const MULTI_THREADED = 1 << 1;
  }
}

// -----------------------------------------------------------------------------
// Output Device
// -----------------------------------------------------------------------------

/// A sink that receives forwarded log lines.
///
/// Implementations declare their threading constraints through
/// [`capabilities`][Self::capabilities]; the default is the most
/// conservative one (single-threaded, owner-driven, buffered).
pub trait OutputDevice: Send + Sync {
  /// Writes one log line to the device.
  fn serialize(&self, text: &str, verbosity: Verbosity, category: Name, time: Option<Duration>);

  /// Flushes any internal buffering to the underlying medium.
  fn flush(&self) {}

  /// Finalizes the device. Called exactly once, after a final flush.
  fn tear_down(&self) {}

  /// Returns the threading capabilities of this device.
  fn capabilities(&self) -> DeviceCapabilities {
    DeviceCapabilities::empty()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use crate::log::device::Verbosity;

  #[test]
  fn test_severity_ordering() {
    assert!(Verbosity::Fatal < Verbosity::Error);
    assert!(Verbosity::Error < Verbosity::Warning);
    assert!(Verbosity::Warning < Verbosity::Trace);
  }

  #[test]
  fn test_labels() {
    assert_eq!(Verbosity::Warning.to_string(), "Warning");
  }
}

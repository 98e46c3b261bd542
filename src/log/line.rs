use std::time::Duration;

use crate::log::device::OutputDevice;
use crate::log::device::Verbosity;
use crate::name::Name;

// -----------------------------------------------------------------------------
// Log Line
// -----------------------------------------------------------------------------

/// One buffered log line: an owned copy of everything a device needs.
///
/// Created when a non-owner thread logs through the redirector (the
/// producing thread must not hold borrows into the caller's buffers) and
/// dropped once every buffered device has seen it.
#[derive(Clone, Debug)]
pub struct LogLine {
  text: Box<str>,
  verbosity: Verbosity,
  category: Name,
  time: Option<Duration>,
}

impl LogLine {
  #[inline]
  pub fn new(text: &str, verbosity: Verbosity, category: Name, time: Option<Duration>) -> Self {
    Self {
      text: Box::from(text),
      verbosity,
      category,
      time,
    }
  }

  #[inline]
  pub fn text(&self) -> &str {
    &self.text
  }

  #[inline]
  pub const fn verbosity(&self) -> Verbosity {
    self.verbosity
  }

  #[inline]
  pub const fn category(&self) -> Name {
    self.category
  }

  #[inline]
  pub const fn time(&self) -> Option<Duration> {
    self.time
  }

  /// Replays this line into `device`.
  #[inline]
  pub(crate) fn forward(&self, device: &dyn OutputDevice) {
    device.serialize(&self.text, self.verbosity, self.category, self.time);
  }
}

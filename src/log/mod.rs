//! Deferred multithreaded log redirection.
//!
//! This module provides the process-wide [`LogRedirector`], the
//! [`OutputDevice`] sink trait, and a pair of bundled devices. Producer
//! threads hand their lines to the redirector and continue immediately;
//! the designated owner thread performs the synchronous I/O on devices
//! that are not thread-safe.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use bedrock::log::LogRedirector;
//! use bedrock::log::MemoryDevice;
//! use bedrock::log::Verbosity;
//! use bedrock::name::Name;
//!
//! let redirector = LogRedirector::new();
//! let capture = Arc::new(MemoryDevice::new());
//!
//! redirector.add_output_device(capture.clone());
//! redirector.serialize("hello", Verbosity::Info, Name::new("Core"), None);
//!
//! assert_eq!(capture.texts(), ["hello"]);
//! ```

use std::time::Duration;
use std::time::SystemTime;

mod console;
mod device;
mod line;
mod queue;
mod redirector;

pub use self::console::ConsoleDevice;
pub use self::console::MemoryDevice;
pub use self::device::DeviceCapabilities;
pub use self::device::OutputDevice;
pub use self::device::Verbosity;
pub use self::line::LogLine;
pub use self::queue::Drain;
pub use self::queue::LineQueue;
pub use self::redirector::LogRedirector;

/// Returns the current wall-clock time as a duration since the Unix epoch,
/// the timestamp form log lines carry.
///
/// Clocks before the epoch collapse to [`Duration::ZERO`].
pub fn timestamp() -> Duration {
  SystemTime::now()
    .duration_since(SystemTime::UNIX_EPOCH)
    .unwrap_or(Duration::ZERO)
}

// -----------------------------------------------------------------------------
// emit!
// -----------------------------------------------------------------------------

/// Formats and routes one line through the global [`LogRedirector`].
///
/// # Examples
///
/// ```
/// use bedrock::emit;
///
/// emit!(Warning, "Engine", "low on {}", "fuel");
/// ```
#[macro_export]
macro_rules! emit {
  ($verbosity:ident, $category:expr, $($arg:tt)*) => {{
    let text: ::std::string::String = ::std::format!($($arg)*);

    $crate::log::LogRedirector::global().serialize(
      &text,
      $crate::log::Verbosity::$verbosity,
      $crate::name::Name::new($category),
      ::core::option::Option::Some($crate::log::timestamp()),
    );
  }};
}

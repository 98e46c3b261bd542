//! Fault classification for invariant and capacity violations.
//!
//! Neither subsystem in this crate returns errors from its steady-state
//! operations: a lookup miss is an expected [`None`], and logging never
//! reports failure to the caller. What remains are faults - conditions
//! that indicate a bug or an exceeded hard limit - which panic or abort
//! loudly at the point of detection.

use std::error::Error;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

mod macros;

pub(crate) use self::macros::fatal;
pub(crate) use self::macros::raise;

// -----------------------------------------------------------------------------
// Fault Group
// -----------------------------------------------------------------------------

/// Broad classification of a detected fault.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[non_exhaustive]
pub enum FaultGroup {
  /// Errors were found with the given argument(s).
  BadArg,
  /// A hard capacity limit has been reached.
  SysCap,
  /// An operation was invoked from a thread that does not own it.
  SysOwn,
}

impl FaultGroup {
  #[inline]
  const fn label(&self) -> &'static str {
    match self {
      Self::BadArg => "(BadArg) errors were found with the given argument(s)",
      Self::SysCap => "(SysCap) a system limit has been reached",
      Self::SysOwn => "(SysOwn) an owner-only operation was called from another thread",
    }
  }
}

// -----------------------------------------------------------------------------
// Fault
// -----------------------------------------------------------------------------

/// Fault raised from an invalid name-pool or redirector operation.
///
/// This type is the payload of the panics produced by precondition checks;
/// it is public so that harnesses catching panics can classify them.
pub struct Fault {
  group: FaultGroup,
  error: &'static str,
}

impl Fault {
  /// Creates a new `Fault`.
  #[inline]
  pub(crate) const fn new(group: FaultGroup, error: &'static str) -> Self {
    Self { group, error }
  }

  /// Returns the fault group.
  #[inline]
  pub const fn group(&self) -> FaultGroup {
    self.group
  }

  /// Returns the fault error message.
  #[inline]
  pub const fn error(&self) -> &'static str {
    self.error
  }
}

impl Debug for Fault {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    Display::fmt(self, f)
  }
}

impl Display for Fault {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    write!(f, "[bedrock]: {}: {}", self.group.label(), self.error)
  }
}

impl Error for Fault {}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

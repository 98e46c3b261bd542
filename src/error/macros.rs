//! Internal fault-handling macros.
//!
//! Two categories of faults exist in this crate:
//!
//! - [`fatal!`]: For unrecoverable bugs (broken invariants, duplicate
//!   well-known names, reentrant teardown)
//! - [`raise!`]: For violated capacity preconditions (over-long names,
//!   owner-thread misuse)

/// Displays a fault message and aborts the process.
///
/// Use this for conditions that indicate a bug in the host program or in
/// this crate itself. Continuing past one of these would corrupt shared,
/// lock-free-read structures, so the process prints a diagnostic and
/// immediately aborts without unwinding.
///
/// # Examples
///
/// ```ignore
/// if block_index >= MAX_BLOCKS {
///   fatal!("entry block table exhausted");
/// }
/// ```
macro_rules! fatal {
  ($error:expr) => {{
    ::std::eprintln!(
      "{}:{}: (SysInv) a system invariant has been broken: {}",
      ::std::file!(),
      ::std::line!(),
      $error,
    );

    ::std::process::abort();
  }};
}

/// Panics with a structured precondition fault.
///
/// Use this for caller mistakes that are detectable before any shared
/// state has been touched: the panic is loud and local, and the process
/// state remains consistent.
///
/// # Examples
///
/// ```ignore
/// if text.len() > MAX_NAME_BYTES {
///   raise!(BadArg, "name exceeds maximum length");
/// }
/// ```
macro_rules! raise {
  ($group:ident, $error:expr $(,)?) => {
    ::std::panic!(
      "{}",
      $crate::error::Fault::new($crate::error::FaultGroup::$group, $error),
    )
  };
}

pub(crate) use fatal;
pub(crate) use raise;

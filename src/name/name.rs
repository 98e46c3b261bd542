use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::LazyLock;

use crate::consts::MAX_NAME_BYTES;
use crate::error::raise;
use crate::name::entry::EntryId;
use crate::name::entry::EntryRef;
use crate::name::known::KnownName;
use crate::name::pool::NamePool;
use crate::name::view::cmp_ignore_ascii_case;

// -----------------------------------------------------------------------------
// Global Name Pool
// -----------------------------------------------------------------------------

/// Global pool backing the [`Name`] type.
///
/// Lazily constructed on first use; well-known names are registered before
/// the pool becomes visible to any caller.
static NAME_POOL: LazyLock<NamePool> = LazyLock::new(NamePool::new);

#[inline]
pub(crate) fn global_pool() -> &'static NamePool {
  &NAME_POOL
}

/// Internal numeric-suffix value meaning "no suffix".
const NO_NUMBER: u32 = 0;

// -----------------------------------------------------------------------------
// Name
// -----------------------------------------------------------------------------

/// Interned, immutable identifier with an optional numeric suffix.
///
/// A `Name` is a pair of entry handles into the global pool (one for
/// case-insensitive identity, one for display casing) plus a small number
/// for auto-disambiguated spellings such as `Foo_3`. It is `Copy`, 12
/// bytes, and cheap to compare: equality looks only at the comparison
/// handle and the number.
///
/// # Equality and Ordering
///
/// Two names are equal when they compare equal ignoring case - the display
/// casing does not participate. Ordering compares numbers when the
/// identities match and otherwise falls back to a case-folded comparison
/// of the decoded strings.
///
/// # Examples
///
/// ```
/// use bedrock::name::Name;
///
/// let a = Name::new("Rocket_3");
///
/// assert_eq!(a.plain_str(), "Rocket");
/// assert_eq!(a.number(), Some(3));
/// assert_eq!(a, Name::new("ROCKET_3")); // Identity ignores case
/// assert_eq!(a.to_string(), "Rocket_3");
/// ```
#[derive(Clone, Copy)]
pub struct Name {
  comparison: EntryId,
  display: EntryId,
  number: u32,
}

impl Name {
  /// The reserved empty name.
  pub const NONE: Self = Self {
    comparison: EntryId::NONE,
    display: EntryId::NONE,
    number: NO_NUMBER,
  };

  /// Interns `text` and returns its name, splitting a numeric suffix.
  ///
  /// A trailing `_<digits>` suffix is detected and stored as the name's
  /// number rather than as part of the string, so `"Rocket_3"` and a
  /// third auto-generated `"Rocket"` intern one shared entry. Suffixes
  /// with redundant leading zeros (`"Rocket_04"`) and values that do not
  /// fit 32 bits are kept verbatim in the string.
  ///
  /// Empty input maps to [`Name::NONE`].
  ///
  /// # Panics
  ///
  /// Panics if the plain part exceeds [`MAX_NAME_BYTES`].
  pub fn new(text: &str) -> Self {
    let (plain, number) = split_numeric_suffix(text);
    Self::store_internal(plain, number)
  }

  /// Looks up `text` (with suffix splitting) without interning anything.
  ///
  /// Returns [`None`] when the plain part was never stored.
  pub fn find(text: &str) -> Option<Self> {
    let (plain, number) = split_numeric_suffix(text);

    if plain.is_empty() {
      return Some(Self::NONE);
    }

    if plain.len() > MAX_NAME_BYTES {
      return Option::None;
    }

    let pool: &NamePool = global_pool();
    let display: EntryId = pool.find(plain)?;

    Some(Self {
      comparison: pool.resolve(display).comparison_id(),
      display,
      number,
    })
  }

  /// Interns `text` verbatim with an explicit numeric suffix.
  ///
  /// No suffix detection is performed on `text`. Empty input maps to
  /// [`Name::NONE`], ignoring the supplied number.
  ///
  /// # Panics
  ///
  /// Panics if `number` is `u32::MAX` or `text` exceeds [`MAX_NAME_BYTES`].
  pub fn with_number(text: &str, number: Option<u32>) -> Self {
    let internal: u32 = match number {
      Some(external) => match external.checked_add(1) {
        Some(internal) => internal,
        Option::None => raise!(BadArg, "numeric suffix out of range"),
      },
      Option::None => NO_NUMBER,
    };

    Self::store_internal(text, internal)
  }

  /// Returns the name registered for `known`.
  pub fn from_known(known: KnownName) -> Self {
    let pool: &NamePool = global_pool();
    let display: EntryId = pool.find_known(known);

    Self {
      comparison: pool.resolve(display).comparison_id(),
      display,
      number: NO_NUMBER,
    }
  }

  fn store_internal(plain: &str, number: u32) -> Self {
    if plain.is_empty() {
      return Self::NONE;
    }

    if plain.len() > MAX_NAME_BYTES {
      raise!(SysCap, "name exceeds maximum length");
    }

    let pool: &NamePool = global_pool();
    let display: EntryId = pool.store(plain);

    Self {
      comparison: pool.resolve(display).comparison_id(),
      display,
      number,
    }
  }

  /// Returns the plain name string in its stored casing, without the
  /// numeric suffix. [`Name::NONE`] renders as `"None"`.
  #[inline]
  pub fn plain_str(&self) -> &'static str {
    global_pool().resolve(self.display).as_str()
  }

  /// Returns the numeric suffix, if the name carries one.
  #[inline]
  pub const fn number(&self) -> Option<u32> {
    match self.number {
      NO_NUMBER => Option::None,
      internal => Some(internal - 1),
    }
  }

  /// Returns `true` for the reserved empty name.
  #[inline]
  pub const fn is_none(&self) -> bool {
    self.comparison.is_none() && self.number == NO_NUMBER
  }

  /// Returns the case-insensitive identity handle.
  #[inline]
  pub const fn comparison_id(&self) -> EntryId {
    self.comparison
  }

  /// Returns the display-casing handle.
  #[inline]
  pub const fn display_id(&self) -> EntryId {
    self.display
  }

  /// Returns the [`KnownName`] this name's identity was registered for,
  /// ignoring any numeric suffix.
  #[inline]
  pub fn known(&self) -> Option<KnownName> {
    global_pool().known_for(self.comparison)
  }

  fn comparison_entry(&self) -> EntryRef<'static> {
    global_pool().resolve(self.comparison)
  }
}

impl Default for Name {
  #[inline]
  fn default() -> Self {
    Self::NONE
  }
}

impl Debug for Name {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    Display::fmt(self, f)
  }
}

impl Display for Name {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    match self.number() {
      Some(number) => write!(f, "{}_{}", self.plain_str(), number),
      Option::None => f.write_str(self.plain_str()),
    }
  }
}

impl PartialEq for Name {
  #[inline]
  fn eq(&self, other: &Self) -> bool {
    self.comparison == other.comparison && self.number == other.number
  }
}

impl Eq for Name {}

impl Hash for Name {
  #[inline]
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.comparison.hash(state);
    self.number.hash(state);
  }
}

impl PartialOrd for Name {
  #[inline]
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Name {
  fn cmp(&self, other: &Self) -> Ordering {
    if self.comparison == other.comparison {
      return self.number.cmp(&other.number);
    }

    let a: EntryRef<'static> = self.comparison_entry();
    let b: EntryRef<'static> = other.comparison_entry();

    cmp_ignore_ascii_case(a.as_str().as_bytes(), b.as_str().as_bytes())
      .then_with(|| self.number.cmp(&other.number))
  }
}

// -----------------------------------------------------------------------------
// Numeric Suffix
// -----------------------------------------------------------------------------

/// Splits a trailing `_<digits>` suffix off `text`.
///
/// Returns the plain prefix and the internal number (external value plus
/// one, [`NO_NUMBER`] when no suffix was split). The suffix is kept
/// verbatim when it has redundant leading zeros or does not fit below
/// `u32::MAX`, and a bare `_<digits>` string reduces to an empty plain
/// part, which interns as [`Name::NONE`].
fn split_numeric_suffix(text: &str) -> (&str, u32) {
  let bytes: &[u8] = text.as_bytes();
  let digits: usize = bytes
    .iter()
    .rev()
    .take_while(|byte| byte.is_ascii_digit())
    .count();

  if digits == 0 || digits == bytes.len() {
    return (text, NO_NUMBER);
  }

  let first_digit: usize = bytes.len() - digits;

  if bytes[first_digit - 1] != b'_' {
    return (text, NO_NUMBER);
  }

  // "Rocket_04" cannot round-trip through a number; "Rocket_0" can.
  if digits > 1 && bytes[first_digit] == b'0' {
    return (text, NO_NUMBER);
  }

  let mut value: u64 = 0;

  for byte in bytes[first_digit..].iter().copied() {
    value = value * 10 + u64::from(byte - b'0');

    if value >= u64::from(u32::MAX) {
      return (text, NO_NUMBER);
    }
  }

  (&text[..first_digit - 1], value as u32 + 1)
}

// -----------------------------------------------------------------------------
// String Equality
// -----------------------------------------------------------------------------

/// Compares `plain` plus an internal suffix number against a full textual
/// spelling, case-insensitively and without allocating.
fn string_and_number_equals(plain: &str, internal: u32, text: &str) -> bool {
  let name_len: usize = plain.len();
  let bytes: &[u8] = text.as_bytes();

  if bytes.len() < name_len || !plain.as_bytes().eq_ignore_ascii_case(&bytes[..name_len]) {
    return false;
  }

  match internal.checked_sub(1) {
    Option::None => bytes.len() == name_len,
    Some(external) => {
      bytes.len() > name_len + 1
        && bytes[name_len] == b'_'
        && number_equals(&bytes[name_len + 1..], external)
    }
  }
}

/// Numeric comparison of a digit run against `external`; redundant leading
/// zeros are accepted (`"abc_010"` equals `abc` number 10).
fn number_equals(digits: &[u8], external: u32) -> bool {
  if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
    return false;
  }

  let mut value: u64 = 0;

  for byte in digits.iter().copied() {
    value = value * 10 + u64::from(byte - b'0');

    if value > u64::from(u32::MAX) {
      return false;
    }
  }

  value == u64::from(external)
}

impl PartialEq<str> for Name {
  fn eq(&self, other: &str) -> bool {
    // An empty string equals the reserved name, consistent with
    // `Name::new("")` producing `Name::NONE`.
    if other.is_empty() {
      return self.is_none();
    }

    string_and_number_equals(self.comparison_entry().as_str(), self.number, other)
  }
}

impl PartialEq<Name> for str {
  #[inline]
  fn eq(&self, other: &Name) -> bool {
    other == self
  }
}

impl PartialEq<&str> for Name {
  #[inline]
  fn eq(&self, other: &&str) -> bool {
    *self == **other
  }
}

impl PartialEq<Name> for &str {
  #[inline]
  fn eq(&self, other: &Name) -> bool {
    *other == **self
  }
}

impl PartialEq<String> for Name {
  #[inline]
  fn eq(&self, other: &String) -> bool {
    *self == **other
  }
}

impl PartialEq<Name> for String {
  #[inline]
  fn eq(&self, other: &Name) -> bool {
    *other == **self
  }
}

// -----------------------------------------------------------------------------
// Extensions - From
// -----------------------------------------------------------------------------

impl From<&str> for Name {
  #[inline]
  fn from(other: &str) -> Name {
    Name::new(other)
  }
}

impl From<String> for Name {
  #[inline]
  fn from(other: String) -> Name {
    Name::new(other.as_str())
  }
}

impl From<Cow<'_, str>> for Name {
  #[inline]
  fn from(other: Cow<'_, str>) -> Name {
    Name::new(other.as_ref())
  }
}

impl From<KnownName> for Name {
  #[inline]
  fn from(other: KnownName) -> Name {
    Name::from_known(other)
  }
}

impl From<Name> for String {
  #[inline]
  fn from(other: Name) -> Self {
    other.to_string()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use crate::name::Name;
  use crate::name::known::KnownName;
  use crate::name::name::split_numeric_suffix;

  #[test]
  fn test_new_interns() {
    assert_eq!(Name::new("test").plain_str(), "test");
  }

  #[test]
  fn test_empty_is_none() {
    assert_eq!(Name::new(""), Name::NONE);
    assert!(Name::new("").is_none());
    assert_eq!(Name::NONE.plain_str(), "None");
  }

  #[test]
  fn test_bare_suffix_is_none() {
    assert_eq!(Name::new("_3"), Name::NONE);
  }

  #[test]
  fn test_with_number_on_empty_ignores_number() {
    assert_eq!(Name::with_number("", Some(5)), Name::NONE);
  }

  #[test]
  fn test_unicode() {
    assert_eq!(Name::new("こんにちは").plain_str(), "こんにちは");
  }

  #[test]
  #[should_panic]
  fn test_new_too_long() {
    Name::new(&"x".repeat(1024));
  }

  #[test]
  fn test_interning_is_idempotent() {
    let a: Name = Name::new("hello");
    let b: Name = Name::new("hello");
    let c: Name = Name::new("world");

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.display_id(), b.display_id());
  }

  #[test]
  fn test_case_insensitive_identity() {
    let lower: Name = Name::new("autotest");
    let upper: Name = Name::new("AUTOTEST");

    assert_eq!(lower, upper);
    assert_eq!(lower.comparison_id(), upper.comparison_id());

    // Display casing survives the round trip.
    assert_eq!(lower.plain_str(), "autotest");
    assert_eq!(upper.plain_str(), "AUTOTEST");
  }

  #[test]
  fn test_numeric_suffix_detection() {
    let name: Name = Name::new("ABC_10");

    assert_eq!(name.plain_str(), "ABC");
    assert_eq!(name.number(), Some(10));
    assert_eq!(name, Name::with_number("ABC", Some(10)));
  }

  #[test]
  fn test_numbers_distinguish_names() {
    assert_ne!(Name::new("Rocket_1"), Name::new("Rocket_2"));
    assert_ne!(Name::new("Rocket_1"), Name::new("Rocket"));
    assert_eq!(Name::new("RocketB_2").number(), Name::new("Rocket_2").number());
  }

  #[test]
  fn test_suffix_split_rules() {
    assert_eq!(split_numeric_suffix("Rocket_4"), ("Rocket", 5));
    assert_eq!(split_numeric_suffix("Rocket_0"), ("Rocket", 1));
    assert_eq!(split_numeric_suffix("Rocket_04"), ("Rocket_04", 0));
    assert_eq!(split_numeric_suffix("Rocket4"), ("Rocket4", 0));
    assert_eq!(split_numeric_suffix("Rocket_"), ("Rocket_", 0));
    assert_eq!(split_numeric_suffix("42"), ("42", 0));
    assert_eq!(split_numeric_suffix("Rocket_4294967295"), ("Rocket_4294967295", 0));
    assert_eq!(split_numeric_suffix("Rocket_4294967294"), ("Rocket", 4294967295));
  }

  #[test]
  fn test_display_appends_suffix() {
    assert_eq!(Name::new("Rocket_3").to_string(), "Rocket_3");
    assert_eq!(Name::new("Rocket").to_string(), "Rocket");
    assert_eq!(format!("{:?}", Name::new("Rocket_3")), "Rocket_3");
  }

  #[test]
  fn test_string_equality() {
    let name: Name = Name::new("Rocket_10");

    assert_eq!(name, "Rocket_10");
    assert_eq!(name, "ROCKET_10");
    assert_eq!(name, "Rocket_010");
    assert_ne!(name, "Rocket_1");
    assert_ne!(name, "Rocket");
    assert_eq!("rocket_10", name);

    assert_eq!(Name::NONE, "");
    assert_ne!(Name::new("Rocket"), "");
  }

  #[test]
  fn test_known_names_share_identity_space() {
    let stored: Name = Name::new("Cylinder");

    assert_eq!(stored, Name::from_known(KnownName::Cylinder));
    assert_eq!(stored.known(), Some(KnownName::Cylinder));
    assert_eq!(Name::new("Freshly-Minted").known(), None);
  }

  #[test]
  fn test_ordering_is_lexical() {
    let a: Name = Name::new("apple");
    let b: Name = Name::new("Banana");
    let c: Name = Name::new("cherry");

    assert!(a < b);
    assert!(b < c);
    assert!(Name::new("pear_2") < Name::new("pear_10"));
  }

  #[test]
  fn test_hash_follows_identity() {
    let mut set: HashSet<Name> = HashSet::new();

    set.insert(Name::new("alpha"));
    set.insert(Name::new("ALPHA"));
    set.insert(Name::new("beta"));

    assert_eq!(set.len(), 2);
    assert!(set.contains(&Name::new("Alpha")));
  }

  #[test]
  fn test_default_is_none() {
    assert_eq!(<Name as Default>::default(), Name::NONE);
  }

  #[test]
  fn test_from_conversions() {
    assert_eq!(Name::from("test"), Name::new("test"));
    assert_eq!(Name::from(String::from("test")), Name::new("test"));
    assert_eq!(String::from(Name::new("test_7")), "test_7");
  }
}

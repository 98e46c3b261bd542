//! Well-known names registered at pool construction.
//!
//! These identifiers occupy the pool before any runtime string is interned,
//! giving them stable, process-independent handles. `None` must stay first:
//! the reserved none handle is entry id zero, which only the very first
//! stored name receives.

macro_rules! known_names {
  ($(($index:literal, $variant:ident, $value:literal),)*) => {
    /// Closed set of names pre-registered in every [`NamePool`].
    ///
    /// [`NamePool`]: crate::name::NamePool
    #[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
    #[repr(u32)]
    #[non_exhaustive]
    pub enum KnownName {
      $($variant = $index,)*
    }

    impl KnownName {
      /// Every well-known name, in registration order.
      pub const ALL: &'static [KnownName] = &[$(Self::$variant,)*];

      /// Number of well-known names.
      pub const COUNT: usize = Self::ALL.len();

      /// Returns the canonical spelling of this name.
      #[inline]
      pub const fn as_str(self) -> &'static str {
        match self {
          $(Self::$variant => $value,)*
        }
      }

      /// Returns this name's position in the registration table.
      #[inline]
      pub const fn index(self) -> usize {
        self as usize
      }
    }
  };
}

known_names! {
  (0, None, "None"),
  (1, True, "True"),
  (2, False, "False"),
  (3, Boolean, "Boolean"),
  (4, Byte, "Byte"),
  (5, Int, "Int"),
  (6, Float, "Float"),
  (7, Double, "Double"),
  (8, String, "String"),
  (9, Text, "Text"),
  (10, Object, "Object"),
  (11, Class, "Class"),
  (12, Struct, "Struct"),
  (13, Enum, "Enum"),
  (14, Function, "Function"),
  (15, Property, "Property"),
  (16, Package, "Package"),
  (17, Array, "Array"),
  (18, Map, "Map"),
  (19, Set, "Set"),
  (20, Default, "Default"),
  (21, Core, "Core"),
  (22, Engine, "Engine"),
  (23, Game, "Game"),
  (24, Editor, "Editor"),
  (25, Timer, "Timer"),
  (26, Init, "Init"),
  (27, Exit, "Exit"),
  (28, Error, "Error"),
  (29, Warning, "Warning"),
  (30, Display, "Display"),
  (31, Log, "Log"),
  (32, Point, "Point"),
  (33, Line, "Line"),
  (34, Plane, "Plane"),
  (35, Box, "Box"),
  (36, Sphere, "Sphere"),
  (37, Cylinder, "Cylinder"),
  (38, Capsule, "Capsule"),
  (39, Cone, "Cone"),
  (40, Vector, "Vector"),
  (41, Rotator, "Rotator"),
  (42, Transform, "Transform"),
  (43, Color, "Color"),
  (44, User, "User"),
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use crate::name::known::KnownName;

  #[test]
  fn test_none_is_first() {
    assert_eq!(KnownName::ALL[0], KnownName::None);
    assert_eq!(KnownName::None.index(), 0);
  }

  #[test]
  fn test_indices_are_dense() {
    for (position, known) in KnownName::ALL.iter().enumerate() {
      assert_eq!(known.index(), position);
    }
  }

  #[test]
  fn test_spellings_are_case_insensitively_unique() {
    let folded: HashSet<String> = KnownName::ALL
      .iter()
      .map(|known| known.as_str().to_ascii_lowercase())
      .collect();

    assert_eq!(folded.len(), KnownName::COUNT);
  }
}

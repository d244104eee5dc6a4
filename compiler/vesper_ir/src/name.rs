//! Interned string identifiers.
//!
//! Pattern-variable names, property names and type names are interned once
//! and compared as 32-bit indices. The match compiler is single-threaded
//! over immutable inputs, so one flat table suffices; callers populate the
//! interner before compilation and only read from it afterwards.

use std::fmt;

use rustc_hash::FxHashMap;

/// Interned string identifier.
///
/// A plain index into a [`NameInterner`]. Two names from the same interner
/// are equal iff their strings are equal.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Name(u32);

impl Name {
    /// Pre-interned empty string.
    pub const EMPTY: Name = Name(0);

    /// Create from a raw u32 value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Name(raw)
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Get the index into the interner's table.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// String interner mapping strings to [`Name`]s.
///
/// O(1) lookup in both directions. Index 0 is always the empty string so
/// `Name::EMPTY` resolves without special cases.
pub struct NameInterner {
    map: FxHashMap<String, u32>,
    strings: Vec<String>,
}

impl NameInterner {
    /// Create an interner with the empty string pre-interned at index 0.
    pub fn new() -> Self {
        let mut interner = NameInterner {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(64),
        };
        interner.map.insert(String::new(), 0);
        interner.strings.push(String::new());
        interner
    }

    /// Intern a string, returning its `Name`.
    ///
    /// # Panics
    /// Panics if more than `u32::MAX` distinct strings are interned.
    pub fn intern(&mut self, s: &str) -> Name {
        if let Some(&idx) = self.map.get(s) {
            return Name(idx);
        }
        let idx = u32::try_from(self.strings.len())
            .unwrap_or_else(|_| panic!("interner exceeded u32::MAX strings"));
        self.map.insert(s.to_owned(), idx);
        self.strings.push(s.to_owned());
        Name(idx)
    }

    /// Resolve a `Name` back to its string.
    ///
    /// A name minted by a different interner resolves to the empty string
    /// rather than panicking.
    pub fn resolve(&self, name: Name) -> &str {
        self.strings.get(name.index()).map_or("", String::as_str)
    }

    /// Number of interned strings (including the empty string).
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Returns `true` if only the empty string is interned.
    pub fn is_empty(&self) -> bool {
        self.strings.len() == 1
    }
}

impl Default for NameInterner {
    fn default() -> Self {
        Self::new()
    }
}

// Size assertions to prevent accidental regressions
#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::Name;
    crate::static_assert_size!(Name, 4);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_dedups() {
        let mut interner = NameInterner::new();
        let a = interner.intern("x");
        let b = interner.intern("x");
        let c = interner.intern("y");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.len(), 3); // "", "x", "y"
    }

    #[test]
    fn resolve_round_trip() {
        let mut interner = NameInterner::new();
        let name = interner.intern("scrutinee");
        assert_eq!(interner.resolve(name), "scrutinee");
        assert_eq!(interner.resolve(Name::EMPTY), "");
    }

    #[test]
    fn empty_string_is_name_empty() {
        let mut interner = NameInterner::new();
        assert_eq!(interner.intern(""), Name::EMPTY);
        assert!(interner.is_empty());
    }

    #[test]
    fn resolve_foreign_name_is_empty() {
        let interner = NameInterner::new();
        assert_eq!(interner.resolve(Name::from_raw(999)), "");
    }
}

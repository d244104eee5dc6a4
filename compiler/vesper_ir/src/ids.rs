//! ID newtypes for construct-level handles.
//!
//! Type-safe indices that keep pattern nodes, clause labels and guard
//! expressions in separate index spaces. The match compiler never looks
//! inside a `LabelId` or `GuardId`; both are opaque handles minted by the
//! caller and handed back through leaves and guard tests.

use std::fmt;

/// Index into a [`PatternArena`](crate::PatternArena).
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct PatternId(u32);

impl PatternId {
    /// Sentinel value indicating "no pattern".
    pub const INVALID: PatternId = PatternId(u32::MAX);

    /// Create a new `PatternId` from a raw index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the raw index into the arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Get the raw `u32` value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns `true` if this is a valid (non-sentinel) ID.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl fmt::Debug for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "PatternId::INVALID")
        } else {
            write!(f, "PatternId({})", self.0)
        }
    }
}

impl Default for PatternId {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Opaque clause label: the caller's handle for "this arm matched".
///
/// The match compiler threads labels through to leaves untouched; the
/// caller maps them back to case bodies.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct LabelId(u32);

impl LabelId {
    /// Create a new `LabelId` from a raw index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the raw index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Get the raw `u32` value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LabelId({})", self.0)
    }
}

/// Opaque guard-expression handle.
///
/// Guard expressions stay bound and owned by the caller; the DAG only
/// records which guard gates which clause.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct GuardId(u32);

impl GuardId {
    /// Create a new `GuardId` from a raw index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the raw index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Get the raw `u32` value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for GuardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GuardId({})", self.0)
    }
}

// Size assertions to prevent accidental regressions
#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::{GuardId, LabelId, PatternId};
    crate::static_assert_size!(PatternId, 4);
    crate::static_assert_size!(LabelId, 4);
    crate::static_assert_size!(GuardId, 4);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_id_sentinel() {
        assert!(!PatternId::INVALID.is_valid());
        assert!(PatternId::new(0).is_valid());
        assert_eq!(format!("{:?}", PatternId::INVALID), "PatternId::INVALID");
        assert_eq!(format!("{:?}", PatternId::new(7)), "PatternId(7)");
    }

    #[test]
    fn ids_round_trip() {
        assert_eq!(PatternId::new(3).index(), 3);
        assert_eq!(LabelId::new(5).raw(), 5);
        assert_eq!(GuardId::new(9).index(), 9);
    }
}

//! Constant-folded literal values.
//!
//! The binder folds constant pattern operands before match compilation, so
//! this enum only carries finished values. Floats are stored as raw bits to
//! keep `Eq`/`Hash` (interning and test dedup need both); strings are
//! interned `Name`s.

use crate::Name;

/// A constant value appearing in a constant or relational pattern.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConstValue {
    /// The `null` literal.
    Null,
    Bool(bool),
    Int(i64),
    /// f64 bits; use [`ConstValue::from_f64`] / [`ConstValue::as_f64`].
    Float(u64),
    Char(char),
    Str(Name),
}

impl ConstValue {
    /// Wrap an `f64` as its bit pattern.
    #[inline]
    pub fn from_f64(value: f64) -> Self {
        ConstValue::Float(value.to_bits())
    }

    /// Recover the `f64` from a `Float` constant, `None` otherwise.
    #[inline]
    pub fn as_f64(self) -> Option<f64> {
        match self {
            ConstValue::Float(bits) => Some(f64::from_bits(bits)),
            _ => None,
        }
    }

    /// Returns `true` for the `null` literal.
    #[inline]
    pub fn is_null(self) -> bool {
        matches!(self, ConstValue::Null)
    }

    /// Returns `true` if the value is numeric or char (orderable by the
    /// relational operators).
    #[inline]
    pub fn is_orderable(self) -> bool {
        matches!(
            self,
            ConstValue::Int(_) | ConstValue::Float(_) | ConstValue::Char(_)
        )
    }
}

// Size assertions to prevent accidental regressions
#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::ConstValue;
    crate::static_assert_size!(ConstValue, 16);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_bits_round_trip() {
        let c = ConstValue::from_f64(1.5);
        assert_eq!(c.as_f64(), Some(1.5));
        assert_eq!(c, ConstValue::from_f64(1.5));
        assert_ne!(c, ConstValue::from_f64(-1.5));
    }

    #[test]
    fn float_nan_is_hashable() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(ConstValue::from_f64(f64::NAN));
        set.insert(ConstValue::from_f64(f64::NAN));
        // Same NaN bit pattern interns to one entry.
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn orderable_classification() {
        assert!(ConstValue::Int(3).is_orderable());
        assert!(ConstValue::Char('c').is_orderable());
        assert!(ConstValue::from_f64(0.5).is_orderable());
        assert!(!ConstValue::Bool(true).is_orderable());
        assert!(!ConstValue::Null.is_orderable());
        assert!(!ConstValue::Str(Name::EMPTY).is_orderable());
    }

    #[test]
    fn null_check() {
        assert!(ConstValue::Null.is_null());
        assert!(!ConstValue::Int(0).is_null());
    }
}

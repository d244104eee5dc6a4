//! Resolved member symbols.
//!
//! The binder resolves every property subpattern to a property symbol and
//! every positional pattern list to a deconstructor before match
//! compilation; this module is the table those resolutions index into.

use std::fmt;

use smallvec::SmallVec;

use crate::{Name, TypeId};

/// Index of a resolved property symbol in [`Symbols`].
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct PropertyId(u32);

impl PropertyId {
    /// Create a new `PropertyId` from a raw index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the raw index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyId({})", self.0)
    }
}

/// Index of a resolved deconstructor in [`Symbols`].
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct DeconstructId(u32);

impl DeconstructId {
    /// Create a new `DeconstructId` from a raw index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the raw index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for DeconstructId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeconstructId({})", self.0)
    }
}

/// A resolved property: its source name and result type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertySym {
    pub name: Name,
    pub ty: TypeId,
}

/// A resolved deconstructor: the element types it produces, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeconstructSym {
    pub outputs: SmallVec<[TypeId; 4]>,
}

impl DeconstructSym {
    /// Number of elements the deconstructor produces.
    pub fn arity(&self) -> usize {
        self.outputs.len()
    }
}

/// Table of resolved member symbols, built by the caller.
#[derive(Default)]
pub struct Symbols {
    properties: Vec<PropertySym>,
    deconstructs: Vec<DeconstructSym>,
}

impl Symbols {
    /// Create an empty table.
    pub fn new() -> Self {
        Symbols::default()
    }

    /// Register a property symbol.
    pub fn add_property(&mut self, name: Name, ty: TypeId) -> PropertyId {
        let id = u32::try_from(self.properties.len())
            .unwrap_or_else(|_| panic!("symbol table exceeded u32::MAX properties"));
        self.properties.push(PropertySym { name, ty });
        PropertyId::new(id)
    }

    /// Register a deconstructor producing the given element types.
    pub fn add_deconstruct(&mut self, outputs: impl IntoIterator<Item = TypeId>) -> DeconstructId {
        let id = u32::try_from(self.deconstructs.len())
            .unwrap_or_else(|_| panic!("symbol table exceeded u32::MAX deconstructors"));
        self.deconstructs.push(DeconstructSym {
            outputs: outputs.into_iter().collect(),
        });
        DeconstructId::new(id)
    }

    /// Look up a property symbol.
    ///
    /// # Panics
    /// Panics on an id from a different table.
    pub fn property(&self, id: PropertyId) -> &PropertySym {
        self.properties
            .get(id.index())
            .unwrap_or_else(|| panic!("property id {id:?} out of range"))
    }

    /// Look up a deconstructor.
    ///
    /// # Panics
    /// Panics on an id from a different table.
    pub fn deconstruct(&self, id: DeconstructId) -> &DeconstructSym {
        self.deconstructs
            .get(id.index())
            .unwrap_or_else(|| panic!("deconstruct id {id:?} out of range"))
    }
}

// Size assertions to prevent accidental regressions
#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::{DeconstructId, PropertyId};
    crate::static_assert_size!(PropertyId, 4);
    crate::static_assert_size!(DeconstructId, 4);
}

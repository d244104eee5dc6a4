//! Temp identity for decision-DAG values.
//!
//! Every intermediate value the compiled match manipulates (the original
//! input, cast results, property reads, deconstructor elements) is a
//! *temp*. Temps are interned by their producing operation, so the same
//! fetch requested by two different clauses resolves to the same
//! [`TempId`]. That shared identity is what lets the optimizer recognize
//! "this value was already computed on this path" across clause
//! boundaries.
//!
//! Identity is `(operation, input temp, output index)`. The output index
//! distinguishes the elements of a multi-output deconstruction; casts and
//! property reads always use index 0. The match input itself is temp 0,
//! seeded at construction with the scrutinee's static type.

use rustc_hash::FxHashMap;

use vesper_ir::{DeconstructId, PropertyId, TypeId};

/// Index of a temp in a [`TempTable`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TempId(u32);

impl TempId {
    /// The match input, present in every table.
    pub const INPUT: TempId = TempId(0);

    /// Create a new `TempId` from a raw index.
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

impl std::fmt::Debug for TempId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TempId({})", self.0)
    }
}

/// The operation that produces a temp from its input temp.
///
/// Also the payload of evaluation nodes in the DAG: an evaluation node
/// *performs* one of these, and the temps it defines are the ones interned
/// against it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DagOp {
    /// Reinterpret the input at a narrower type after a successful type
    /// test. Single output.
    Cast(TypeId),
    /// Read a property of the input. Single output.
    Property(PropertyId),
    /// Invoke a deconstructor on the input. One output per element.
    Deconstruct(DeconstructId),
}

#[derive(Copy, Clone)]
struct TempInfo {
    ty: TypeId,
    source: Option<(DagOp, TempId, u32)>,
}

/// Interning table of temps for one match compilation.
///
/// Append-only; the input temp is seeded by [`TempTable::new`] and every
/// other temp is created through [`TempTable::intern`], which returns the
/// existing id when the same `(op, input, index)` was requested before.
pub struct TempTable {
    temps: Vec<TempInfo>,
    interned: FxHashMap<(DagOp, TempId, u32), TempId>,
}

impl TempTable {
    /// Create a table holding only the input temp.
    pub fn new(input_ty: TypeId) -> Self {
        TempTable {
            temps: vec![TempInfo {
                ty: input_ty,
                source: None,
            }],
            interned: FxHashMap::default(),
        }
    }

    /// The match input temp (always [`TempId::INPUT`]).
    #[inline]
    #[must_use]
    pub fn input(&self) -> TempId {
        TempId::INPUT
    }

    /// Intern the temp produced by `op` on `input` at `index`.
    ///
    /// Returns the existing id if this exact derivation was interned
    /// before; the type is recorded on first interning only.
    ///
    /// # Panics
    /// Panics if the table exceeds `u32::MAX` temps.
    pub fn intern(&mut self, op: DagOp, input: TempId, index: u32, ty: TypeId) -> TempId {
        if let Some(&id) = self.interned.get(&(op, input, index)) {
            return id;
        }
        let id = u32::try_from(self.temps.len())
            .unwrap_or_else(|_| panic!("temp table exceeded u32::MAX temps"));
        let id = TempId::new(id);
        self.temps.push(TempInfo {
            ty,
            source: Some((op, input, index)),
        });
        self.interned.insert((op, input, index), id);
        id
    }

    /// Look up an already-interned derivation without creating it.
    pub fn lookup(&self, op: DagOp, input: TempId, index: u32) -> Option<TempId> {
        self.interned.get(&(op, input, index)).copied()
    }

    /// Static type of a temp.
    ///
    /// # Panics
    /// Panics on an id from a different table.
    pub fn ty(&self, temp: TempId) -> TypeId {
        self.temps
            .get(temp.index())
            .unwrap_or_else(|| panic!("temp id {temp:?} out of range"))
            .ty
    }

    /// The derivation that produces a temp; `None` for the input.
    pub fn source(&self, temp: TempId) -> Option<(DagOp, TempId, u32)> {
        self.temps.get(temp.index()).and_then(|info| info.source)
    }

    /// Number of temps, including the input.
    pub fn len(&self) -> usize {
        self.temps.len()
    }

    /// Always `false`; the input temp is seeded at construction.
    pub fn is_empty(&self) -> bool {
        false
    }
}

// Size assertions to prevent accidental regressions
#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::{DagOp, TempId};
    vesper_ir::static_assert_size!(TempId, 4);
    vesper_ir::static_assert_size!(DagOp, 8);
}

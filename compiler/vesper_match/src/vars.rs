//! Pattern variables and their binding sites.
//!
//! A *variable* is a name the pattern introduces; a *designation* is one
//! textual site that binds it. The two are distinct because combinators
//! multiply binding sites: `var c or var c` is one variable with (after
//! unification) one designation, while `not C(1) c and not C(2) c` is one
//! variable with two designations that bind on different paths. Binding
//! nodes in the DAG carry the designation, not just the variable, so the
//! resolver can tell "bound everywhere by one site" from "bound somewhere
//! by each of several sites".
//!
//! Conflicting redeclarations (same name, different type or different
//! part of the input) are recorded here during the declare pass and
//! reported by the resolver.

use vesper_ir::{Name, Span, TypeId};

use crate::temps::TempId;

/// Index of a variable in a [`VarTable`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct VarId(u32);

impl VarId {
    /// Create a new `VarId` from a raw index.
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

impl std::fmt::Debug for VarId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VarId({})", self.0)
    }
}

/// Index of a designation in a [`VarTable`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct DesignationId(u32);

impl DesignationId {
    /// Create a new `DesignationId` from a raw index.
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

impl std::fmt::Debug for DesignationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DesignationId({})", self.0)
    }
}

/// A declared pattern variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VarDecl {
    pub name: Name,
    pub ty: TypeId,
    /// The temp the variable's first designation binds. Later
    /// designations of the same variable must bind the same temp or the
    /// declare pass records a conflict.
    pub first_temp: TempId,
    /// Span of the first declaration site.
    pub span: Span,
    /// Index of the clause that declares the variable. Variables are
    /// clause-scoped; the same name in two clauses is two variables.
    pub clause: u32,
}

/// One textual binding site of a variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Designation {
    pub variable: VarId,
    pub temp: TempId,
    pub span: Span,
}

/// Why a redeclaration of a variable is rejected.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConflictKind {
    /// Same name declared at two different types.
    TypeMismatch { first: TypeId, second: TypeId },
    /// Same name bound to two different parts of the input.
    DivergentTemps,
}

/// A recorded redeclaration conflict, reported as a diagnostic by the
/// resolver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conflict {
    pub variable: VarId,
    /// Span of the offending redeclaration.
    pub span: Span,
    pub kind: ConflictKind,
}

/// All variables, designations, and conflicts of one match compilation.
#[derive(Default)]
pub struct VarTable {
    vars: Vec<VarDecl>,
    designations: Vec<Designation>,
    conflicts: Vec<Conflict>,
}

impl VarTable {
    /// Create an empty table.
    pub fn new() -> Self {
        VarTable::default()
    }

    /// Declare a variable.
    ///
    /// # Panics
    /// Panics if the table exceeds `u32::MAX` variables.
    pub fn add_var(
        &mut self,
        name: Name,
        ty: TypeId,
        first_temp: TempId,
        span: Span,
        clause: u32,
    ) -> VarId {
        let id = u32::try_from(self.vars.len())
            .unwrap_or_else(|_| panic!("var table exceeded u32::MAX variables"));
        self.vars.push(VarDecl {
            name,
            ty,
            first_temp,
            span,
            clause,
        });
        VarId::new(id)
    }

    /// Record a binding site for an existing variable.
    ///
    /// # Panics
    /// Panics if the table exceeds `u32::MAX` designations.
    pub fn add_designation(&mut self, variable: VarId, temp: TempId, span: Span) -> DesignationId {
        let id = u32::try_from(self.designations.len())
            .unwrap_or_else(|_| panic!("var table exceeded u32::MAX designations"));
        self.designations.push(Designation {
            variable,
            temp,
            span,
        });
        DesignationId::new(id)
    }

    /// Record a redeclaration conflict.
    pub fn add_conflict(&mut self, variable: VarId, span: Span, kind: ConflictKind) {
        self.conflicts.push(Conflict {
            variable,
            span,
            kind,
        });
    }

    /// Look up a variable.
    ///
    /// # Panics
    /// Panics on an id from a different table.
    pub fn var(&self, id: VarId) -> &VarDecl {
        self.vars
            .get(id.index())
            .unwrap_or_else(|| panic!("var id {id:?} out of range"))
    }

    /// Look up a designation.
    ///
    /// # Panics
    /// Panics on an id from a different table.
    pub fn designation(&self, id: DesignationId) -> &Designation {
        self.designations
            .get(id.index())
            .unwrap_or_else(|| panic!("designation id {id:?} out of range"))
    }

    /// All variables with their ids, in declaration order.
    pub fn vars(&self) -> impl Iterator<Item = (VarId, &VarDecl)> {
        self.vars
            .iter()
            .enumerate()
            .map(|(i, decl)| (VarId::new(i as u32), decl))
    }

    /// All designations of one variable, in declaration order.
    pub fn designations_of(&self, variable: VarId) -> impl Iterator<Item = DesignationId> + '_ {
        self.designations
            .iter()
            .enumerate()
            .filter(move |(_, d)| d.variable == variable)
            .map(|(i, _)| DesignationId::new(i as u32))
    }

    /// Recorded conflicts, in declaration order.
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// Number of variables.
    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    /// Number of designations.
    pub fn designation_count(&self) -> usize {
        self.designations.len()
    }
}

// Size assertions to prevent accidental regressions
#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::{DesignationId, VarId};
    vesper_ir::static_assert_size!(VarId, 4);
    vesper_ir::static_assert_size!(DesignationId, 4);
}

#[cfg(test)]
mod tests {
    use vesper_ir::{Name, Span, TypeId};

    use super::{ConflictKind, VarTable};
    use crate::temps::TempId;

    #[test]
    fn var_with_two_designations() {
        let mut vars = VarTable::new();
        let c = vars.add_var(Name::from_raw(1), TypeId::INT, TempId::INPUT, Span::DUMMY, 0);
        let d0 = vars.add_designation(c, TempId::INPUT, Span::DUMMY);
        let d1 = vars.add_designation(c, TempId::INPUT, Span::DUMMY);
        assert_ne!(d0, d1);
        let of_c: Vec<_> = vars.designations_of(c).collect();
        assert_eq!(of_c, vec![d0, d1]);
        assert_eq!(vars.var_count(), 1);
        assert_eq!(vars.designation_count(), 2);
    }

    #[test]
    fn conflicts_are_recorded() {
        let mut vars = VarTable::new();
        let v = vars.add_var(Name::from_raw(1), TypeId::INT, TempId::INPUT, Span::DUMMY, 0);
        vars.add_conflict(
            v,
            Span::new(4, 5),
            ConflictKind::TypeMismatch {
                first: TypeId::INT,
                second: TypeId::STR,
            },
        );
        assert_eq!(vars.conflicts().len(), 1);
        assert_eq!(vars.conflicts()[0].span, Span::new(4, 5));
    }

    #[test]
    fn vars_are_clause_scoped_by_index() {
        let mut vars = VarTable::new();
        let a = vars.add_var(Name::from_raw(1), TypeId::INT, TempId::INPUT, Span::DUMMY, 0);
        let b = vars.add_var(Name::from_raw(1), TypeId::INT, TempId::INPUT, Span::DUMMY, 1);
        assert_ne!(a, b);
        assert_eq!(vars.var(a).clause, 0);
        assert_eq!(vars.var(b).clause, 1);
    }
}

//! The bound pattern tree.
//!
//! Patterns arrive from the binder fully typed and resolved: every type is
//! a `TypeId`, every property subpattern carries its `PropertyId`, every
//! positional list its `DeconstructId`. Nodes live in a flat arena and
//! reference children by `PatternId`, so combinator nesting costs no
//! allocation per level and the match compiler can walk by index.

use std::cmp::Ordering;
use std::fmt;

use smallvec::SmallVec;

use crate::{ConstValue, DeconstructId, GuardId, LabelId, Name, PatternId, PropertyId, Span, TypeId};

/// Relational pattern operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RelOp {
    Lt,
    Le,
    Gt,
    Ge,
}

impl RelOp {
    /// Source-level spelling, used by dumps.
    pub const fn as_str(self) -> &'static str {
        match self {
            RelOp::Lt => "<",
            RelOp::Le => "<=",
            RelOp::Gt => ">",
            RelOp::Ge => ">=",
        }
    }

    /// Does `input <op> constant` hold given `input.cmp(constant)`?
    pub const fn holds(self, ord: Ordering) -> bool {
        match self {
            RelOp::Lt => matches!(ord, Ordering::Less),
            RelOp::Le => !matches!(ord, Ordering::Greater),
            RelOp::Gt => matches!(ord, Ordering::Greater),
            RelOp::Ge => !matches!(ord, Ordering::Less),
        }
    }
}

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One pattern node. Children are arena indices, never boxes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatternKind {
    /// `_`: matches anything, binds nothing.
    Discard,
    /// `var x`: matches anything, binds the input.
    Var { name: Name, ty: TypeId },
    /// Literal comparison, including `null`.
    Constant { value: ConstValue },
    /// `is T` with no designation.
    TypeTest { ty: TypeId },
    /// `T x`: type test plus binding of the narrowed value.
    Declaration { ty: TypeId, name: Name },
    /// Positional/property pattern, e.g. `C(1, var x) { Prop: 2 } d`.
    ///
    /// `deconstruct` is present iff `positional` is non-empty; the binder
    /// resolves it against `ty`. `designation` binds the narrowed input.
    Recursive {
        ty: TypeId,
        deconstruct: Option<DeconstructId>,
        positional: SmallVec<[PatternId; 4]>,
        properties: SmallVec<[(PropertyId, PatternId); 4]>,
        designation: Option<Name>,
    },
    /// `< k`, `<= k`, `> k`, `>= k`.
    Relational { op: RelOp, value: ConstValue },
    /// `not p`.
    Negation { inner: PatternId },
    /// `p and q`.
    Conjunction { left: PatternId, right: PatternId },
    /// `p or q`.
    Disjunction { left: PatternId, right: PatternId },
    /// Binder error sentinel; lowers to a single failing test.
    Error,
}

/// Flat arena of pattern nodes with parallel span storage.
#[derive(Default)]
pub struct PatternArena {
    kinds: Vec<PatternKind>,
    spans: Vec<Span>,
}

impl PatternArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        PatternArena::default()
    }

    /// Append a node, returning its id.
    ///
    /// # Panics
    /// Panics if the arena exceeds `u32::MAX` nodes.
    pub fn push(&mut self, kind: PatternKind, span: Span) -> PatternId {
        let id = u32::try_from(self.kinds.len())
            .unwrap_or_else(|_| panic!("pattern arena exceeded u32::MAX nodes"));
        self.kinds.push(kind);
        self.spans.push(span);
        PatternId::new(id)
    }

    /// Look up a node's kind.
    ///
    /// # Panics
    /// Panics on an id from a different arena.
    pub fn kind(&self, id: PatternId) -> &PatternKind {
        self.kinds
            .get(id.index())
            .unwrap_or_else(|| panic!("pattern id {id:?} out of range"))
    }

    /// Look up a node's span.
    pub fn span(&self, id: PatternId) -> Span {
        self.spans.get(id.index()).copied().unwrap_or(Span::DUMMY)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Returns `true` if no nodes have been pushed.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

/// One input clause: pattern, optional guard, caller label.
///
/// Clause order is semantically significant: the first clause whose
/// pattern matches and whose guard passes wins.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Clause {
    pub pattern: PatternId,
    pub guard: Option<GuardId>,
    pub label: LabelId,
    pub span: Span,
}

impl Clause {
    /// Clause without a guard.
    pub const fn new(pattern: PatternId, label: LabelId, span: Span) -> Self {
        Clause {
            pattern,
            guard: None,
            label,
            span,
        }
    }

    /// Clause gated by a guard expression.
    pub const fn guarded(pattern: PatternId, guard: GuardId, label: LabelId, span: Span) -> Self {
        Clause {
            pattern,
            guard: Some(guard),
            label,
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_push_and_get() {
        let mut arena = PatternArena::new();
        assert!(arena.is_empty());
        let discard = arena.push(PatternKind::Discard, Span::new(0, 1));
        let var = arena.push(
            PatternKind::Var {
                name: Name::from_raw(1),
                ty: TypeId::INT,
            },
            Span::new(2, 7),
        );
        assert_eq!(arena.len(), 2);
        assert_eq!(*arena.kind(discard), PatternKind::Discard);
        assert!(matches!(arena.kind(var), PatternKind::Var { .. }));
        assert_eq!(arena.span(var), Span::new(2, 7));
    }

    #[test]
    fn rel_op_holds() {
        use std::cmp::Ordering::{Equal, Greater, Less};
        assert!(RelOp::Lt.holds(Less));
        assert!(!RelOp::Lt.holds(Equal));
        assert!(RelOp::Le.holds(Equal));
        assert!(!RelOp::Le.holds(Greater));
        assert!(RelOp::Gt.holds(Greater));
        assert!(RelOp::Ge.holds(Equal));
        assert!(!RelOp::Ge.holds(Less));
    }

    #[test]
    fn rel_op_display() {
        assert_eq!(RelOp::Lt.to_string(), "<");
        assert_eq!(RelOp::Ge.to_string(), ">=");
    }

    #[test]
    fn clause_constructors() {
        let c = Clause::new(PatternId::new(0), LabelId::new(0), Span::DUMMY);
        assert!(c.guard.is_none());
        let g = Clause::guarded(PatternId::new(1), GuardId::new(0), LabelId::new(1), Span::DUMMY);
        assert_eq!(g.guard, Some(GuardId::new(0)));
    }
}

//! Decision DAG construction for the Vesper compiler.
//!
//! This crate provides:
//!
//! - **DAG construction** ([`build_dag`]): lowers a list of match
//!   clauses into a raw decision DAG of hash-consed test, eval, bind,
//!   and leaf nodes ([`DagArena`], [`DagNode`]).
//!
//! - **Optimization** ([`optimize`]): rewrites the raw DAG under path
//!   contexts, removing tests whose outcome is already decided and
//!   evals that already ran on the path.
//!
//! - **Resolution** ([`resolve`]): forward dataflow computing per-leaf
//!   binding guarantees and reachability ([`Resolution`]), which also
//!   reports the construct's diagnostics (duplicate variables,
//!   unreachable clauses, always/never matches).
//!
//! - **Tooling** ([`dump`], [`walk`]): a deterministic text rendering
//!   and a reference interpreter, used heavily by the tests.
//!
//! [`MatchCompiler`] runs the passes in order and packages the results
//! as a [`MatchDag`].
//!
//! # Design
//!
//! Lowering is continuation-style, after Maranget's backtracking
//! automata and the C# compiler's `DecisionDagBuilder`: clauses are
//! lowered last to first so every pattern's failure continuation
//! already exists, and hash-consing merges the shared suffixes that
//! arise. Tests, evals, and bindings are separate nodes so that later
//! phases can reason about what has been evaluated on each path.
//!
//! # Crate Dependencies
//!
//! `vesper_match` depends on `vesper_ir` (patterns, types, names,
//! constants) and `vesper_diagnostic` (error reporting). Nothing here
//! generates code; the DAG is an analysis result for later phases to
//! consume.

use vesper_diagnostic::DiagnosticBag;
use vesper_ir::{Clause, GuardId, NameInterner, PatternArena, Symbols, TypeId, TypeTable};

pub mod build;
pub mod dag;
pub mod dump;
pub mod optimize;
pub mod resolve;
pub mod temps;
pub mod vars;
pub mod walk;

#[cfg(test)]
mod test_helpers;

pub use build::build_dag;
pub use dag::{DagArena, DagNode, DagTest, LeafLabel, NodeId};
pub use dump::dump;
pub use optimize::optimize;
pub use resolve::{resolve, DesigSet, LeafInfo, Resolution};
pub use temps::{DagOp, TempId, TempTable};
pub use vars::{Conflict, ConflictKind, Designation, DesignationId, VarDecl, VarId, VarTable};
pub use walk::{walk, walk_bound, MatchValue, WalkError, WalkOutcome};

/// Borrowed context a match compilation reads.
///
/// Everything is immutable during compilation, so the struct is a plain
/// bundle of references and is freely copyable.
#[derive(Clone, Copy)]
pub struct MatchEnv<'a> {
    pub types: &'a TypeTable,
    pub symbols: &'a Symbols,
    pub names: &'a NameInterner,
    pub patterns: &'a PatternArena,
}

/// Compiles match constructs against one [`MatchEnv`].
pub struct MatchCompiler<'a> {
    env: MatchEnv<'a>,
}

impl<'a> MatchCompiler<'a> {
    pub fn new(env: MatchEnv<'a>) -> Self {
        MatchCompiler { env }
    }

    /// Compile the clauses of one match construct over an input of
    /// static type `input_ty`.
    ///
    /// Diagnostics for the construct (duplicate variables, unreachable
    /// clauses, malformed patterns) are pushed into `diags`; a DAG is
    /// produced even when there are errors, with `never` tests standing
    /// in for the parts that could not be compiled.
    pub fn compile(
        &self,
        clauses: &[Clause],
        input_ty: TypeId,
        diags: &mut DiagnosticBag,
    ) -> MatchDag {
        let mut temps = TempTable::new(input_ty);
        let mut raw = DagArena::new();
        let mut vars = VarTable::new();
        let raw_root = build::build_dag(&self.env, clauses, &mut temps, &mut raw, &mut vars, diags);
        let (arena, root) = optimize::optimize(&raw, raw_root);
        let resolution = resolve::resolve(&self.env, &arena, root, &vars, clauses, diags);
        tracing::debug!(
            clauses = clauses.len(),
            raw_nodes = raw.len(),
            nodes = arena.len(),
            temps = temps.len(),
            "compiled match construct"
        );
        MatchDag {
            arena,
            root,
            temps,
            vars,
            clauses: clauses.to_vec(),
            resolution,
        }
    }
}

/// A compiled match construct: the optimized DAG plus the tables that
/// give its nodes meaning.
pub struct MatchDag {
    arena: DagArena,
    root: NodeId,
    temps: TempTable,
    vars: VarTable,
    clauses: Vec<Clause>,
    resolution: Resolution,
}

impl MatchDag {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn arena(&self) -> &DagArena {
        &self.arena
    }

    pub fn temps(&self) -> &TempTable {
        &self.temps
    }

    pub fn vars(&self) -> &VarTable {
        &self.vars
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    /// Whether every input value selects some clause.
    pub fn is_exhaustive(&self) -> bool {
        !self.resolution.fail_reachable
    }

    /// Whether the clause at `index` can be selected by some input.
    pub fn clause_reachable(&self, index: usize) -> bool {
        self.clauses
            .get(index)
            .is_some_and(|c| self.resolution.label_reachable(c.label))
    }

    /// The leaf node selecting the clause at `index`, if reachable.
    pub fn clause_leaf(&self, index: usize) -> Option<NodeId> {
        let clause = self.clauses.get(index)?;
        self.resolution
            .clause_leaf(clause.label)
            .map(|info| info.node)
    }

    /// Variables certainly bound when the clause at `index` is selected.
    pub fn guaranteed_vars(&self, index: usize) -> Vec<VarId> {
        match self.clause_leaf(index) {
            Some(node) => self.resolution.guaranteed_at(node, &self.vars),
            None => Vec::new(),
        }
    }

    /// Variables bound on some but not all paths to the clause at
    /// `index`.
    pub fn partial_vars(&self, index: usize) -> Vec<VarId> {
        match self.clause_leaf(index) {
            Some(node) => self.resolution.partially_bound_at(node, &self.vars),
            None => Vec::new(),
        }
    }

    /// Render the DAG as text. See [`dump`].
    pub fn dump(&self, env: &MatchEnv<'_>) -> String {
        dump::dump(env, &self.arena, self.root, &self.temps, &self.vars, &self.clauses)
    }

    /// Run a value through the DAG. See [`walk`].
    pub fn walk(
        &self,
        env: &MatchEnv<'_>,
        value: &MatchValue,
        guard: &dyn Fn(GuardId) -> bool,
    ) -> Result<LeafLabel, WalkError> {
        walk::walk(env, &self.arena, self.root, &self.temps, value, guard)
    }

    /// Run a value through the DAG, collecting the variable bindings
    /// performed on the way. See [`walk_bound`].
    pub fn walk_bound(
        &self,
        env: &MatchEnv<'_>,
        value: &MatchValue,
        guard: &dyn Fn(GuardId) -> bool,
    ) -> Result<WalkOutcome, WalkError> {
        walk::walk_bound(env, &self.arena, self.root, &self.temps, value, guard)
    }
}

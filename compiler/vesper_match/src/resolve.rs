//! Binding and reachability analysis over the optimized DAG.
//!
//! Answers, for every leaf, "which variables are certainly bound when
//! execution arrives here, and which only might be?". Those are the
//! facts a definite-assignment pass needs. As a by-product it learns
//! which leaves are reachable at all, which yields the
//! unreachable-clause and always/never-matches diagnostics.
//!
//! # Algorithm
//!
//! Forward dataflow in a single pass over a topological order (the DAG
//! is acyclic, so reverse postorder needs no fixed point):
//!
//! - `definite(n)` = ∩ of predecessors' out-states: designations bound
//!   on *every* path reaching `n`.
//! - `maybe(n)` = ∪ of predecessors' out-states: designations bound on
//!   *some* path.
//! - A binding node adds its designation to both sets.
//!
//! Sets hold `DesignationId`s, not variables: a variable is guaranteed
//! at a leaf only if some *single* binding site of it lies on every
//! path, which is exactly "one of its designations is in `definite`".
//! Two sites that each cover half the paths guarantee nothing, which is
//! why `not C(1) c and not C(2) c` leaves `c` possibly-unassigned at
//! the fail leaf.

use rustc_hash::FxHashSet;

use vesper_diagnostic::{Diagnostic, DiagnosticBag, ErrorCode};
use vesper_ir::{Clause, LabelId};

use crate::dag::{DagArena, DagNode, LeafLabel, NodeId};
use crate::vars::{ConflictKind, DesignationId, VarId, VarTable};
use crate::MatchEnv;

/// Set of designations at a program point.
///
/// Uses `FxHashSet` for simplicity. A bitset indexed by
/// `DesignationId::raw()` would be faster for patterns with many binding
/// sites; revisit if profiling shows it matters.
pub type DesigSet = FxHashSet<DesignationId>;

/// Binding facts at one leaf of the DAG.
#[derive(Debug)]
pub struct LeafInfo {
    pub node: NodeId,
    pub label: LeafLabel,
    /// Designations bound on every path to this leaf.
    pub definite: DesigSet,
    /// Designations bound on at least one path to this leaf.
    pub maybe: DesigSet,
}

/// Result of the analysis: per-leaf binding facts plus reachability.
#[derive(Debug)]
pub struct Resolution {
    /// Reachable leaves in topological order.
    pub leaves: Vec<LeafInfo>,
    /// Whether any input value falls through every clause.
    pub fail_reachable: bool,
}

impl Resolution {
    /// Facts at a leaf node, if it is reachable.
    pub fn leaf(&self, node: NodeId) -> Option<&LeafInfo> {
        self.leaves.iter().find(|info| info.node == node)
    }

    /// Facts at the leaf selecting `label`, if it is reachable.
    pub fn clause_leaf(&self, label: LabelId) -> Option<&LeafInfo> {
        self.leaves
            .iter()
            .find(|info| info.label == LeafLabel::Clause(label))
    }

    /// Facts at the fail leaf, if any input can fall through.
    pub fn fail_leaf(&self) -> Option<&LeafInfo> {
        self.leaves.iter().find(|info| info.label == LeafLabel::Fail)
    }

    /// Whether the clause labelled `label` can be selected.
    pub fn label_reachable(&self, label: LabelId) -> bool {
        self.clause_leaf(label).is_some()
    }

    /// Variables certainly bound on arrival at `node`, ascending by id.
    pub fn guaranteed_at(&self, node: NodeId, vars: &VarTable) -> Vec<VarId> {
        let Some(info) = self.leaf(node) else {
            return Vec::new();
        };
        vars.vars()
            .filter(|&(v, _)| is_definite(info, vars, v))
            .map(|(v, _)| v)
            .collect()
    }

    /// Variables bound on some but not all paths to `node`, ascending by
    /// id. These are the ones a definite-assignment pass must reject
    /// reads of.
    pub fn partially_bound_at(&self, node: NodeId, vars: &VarTable) -> Vec<VarId> {
        let Some(info) = self.leaf(node) else {
            return Vec::new();
        };
        vars.vars()
            .filter(|&(v, _)| is_partial(info, vars, v))
            .map(|(v, _)| v)
            .collect()
    }

    /// Leaves where `variable` is certainly bound, in analysis order.
    /// Semantic-model queries use this to answer "where is this pattern
    /// variable in scope and assigned".
    pub fn leaves_binding(&self, variable: VarId, vars: &VarTable) -> Vec<NodeId> {
        self.leaves
            .iter()
            .filter(|info| is_definite(info, vars, variable))
            .map(|info| info.node)
            .collect()
    }
}

#[derive(Clone)]
struct State {
    definite: DesigSet,
    maybe: DesigSet,
}

/// Analyze the optimized DAG and report the construct's diagnostics.
pub fn resolve(
    env: &MatchEnv<'_>,
    arena: &DagArena,
    root: NodeId,
    vars: &VarTable,
    clauses: &[Clause],
    diags: &mut DiagnosticBag,
) -> Resolution {
    let mut order = arena.postorder(root);
    order.reverse();

    let mut states: Vec<Option<State>> = Vec::new();
    states.resize_with(arena.len(), || None);
    if let Some(slot) = states.get_mut(root.index()) {
        *slot = Some(State {
            definite: DesigSet::default(),
            maybe: DesigSet::default(),
        });
    }

    let mut leaves = Vec::new();
    for &id in &order {
        // Predecessors all precede `id` in topological order, so its
        // in-state is complete by now.
        let Some(mut state) = states.get_mut(id.index()).and_then(Option::take) else {
            continue;
        };
        match arena.node(id) {
            DagNode::Leaf(label) => leaves.push(LeafInfo {
                node: id,
                label,
                definite: state.definite,
                maybe: state.maybe,
            }),
            DagNode::Bind {
                designation, next, ..
            } => {
                state.definite.insert(designation);
                state.maybe.insert(designation);
                merge_into(&mut states, next, &state);
            }
            DagNode::Eval { next, .. } => merge_into(&mut states, next, &state),
            DagNode::Test {
                when_true,
                when_false,
                ..
            } => {
                merge_into(&mut states, when_true, &state);
                merge_into(&mut states, when_false, &state);
            }
        }
    }

    let fail_reachable = leaves.iter().any(|info| info.label == LeafLabel::Fail);
    let resolution = Resolution {
        leaves,
        fail_reachable,
    };

    report_conflicts(env, vars, diags);
    report_partial_bindings(env, &resolution, vars, clauses, diags);
    report_reachability(&resolution, clauses, diags);

    tracing::debug!(
        leaves = resolution.leaves.len(),
        fail_reachable = resolution.fail_reachable,
        "resolved decision dag"
    );

    resolution
}

fn merge_into(states: &mut [Option<State>], target: NodeId, incoming: &State) {
    let Some(slot) = states.get_mut(target.index()) else {
        return;
    };
    match slot {
        None => *slot = Some(incoming.clone()),
        Some(existing) => {
            existing
                .definite
                .retain(|d| incoming.definite.contains(d));
            existing.maybe.extend(incoming.maybe.iter().copied());
        }
    }
}

/// Report redeclaration conflicts recorded by the declare pass.
fn report_conflicts(env: &MatchEnv<'_>, vars: &VarTable, diags: &mut DiagnosticBag) {
    for conflict in vars.conflicts() {
        let decl = vars.var(conflict.variable);
        let name = env.names.resolve(decl.name);
        let diag = Diagnostic::error(ErrorCode::E3001)
            .with_message(format!("duplicate pattern variable `{name}`"))
            .with_label(conflict.span, "redeclared here")
            .with_secondary_label(decl.span, "first declared here");
        let diag = match conflict.kind {
            ConflictKind::TypeMismatch { first, second } => diag.with_note(format!(
                "first declared as `{}`, redeclared as `{}`",
                env.types.display(first, env.names),
                env.types.display(second, env.names)
            )),
            ConflictKind::DivergentTemps => {
                diag.with_note("the two declarations bind different parts of the input")
            }
        };
        diags.push(diag);
    }
}

/// Warn about variables that are bound on some but not all paths to the
/// leaf where they would be read: their own clause's leaf, plus the fail
/// leaf for single-clause constructs (an `is` expression's variables stay
/// in scope when the match fails; a multi-clause construct's variables
/// are scoped to their own arm). The fail-leaf check skips variables the
/// clause leaf already guarantees: those are merely unbound when a
/// refutable pattern fails. It catches site-split bindings like
/// `not C(1) c and not C(2) c`, where neither leaf guarantees `c`.
fn report_partial_bindings(
    env: &MatchEnv<'_>,
    resolution: &Resolution,
    vars: &VarTable,
    clauses: &[Clause],
    diags: &mut DiagnosticBag,
) {
    let single_clause = clauses.len() == 1;
    for (v, decl) in vars.vars() {
        let Some(clause) = clauses.get(decl.clause as usize) else {
            continue;
        };
        let own = resolution.clause_leaf(clause.label);
        let mut partial = own.is_some_and(|info| is_partial(info, vars, v));
        let guaranteed = own.is_some_and(|info| is_definite(info, vars, v));
        if !partial && !guaranteed && single_clause {
            partial = resolution
                .fail_leaf()
                .is_some_and(|info| is_partial(info, vars, v));
        }
        if partial {
            let name = env.names.resolve(decl.name);
            diags.push(
                Diagnostic::warning(ErrorCode::E3002)
                    .with_message(format!("pattern variable `{name}` is not bound on every path"))
                    .with_label(decl.span, "declared here")
                    .with_note("a disjunction or negation binds it on only some of the paths"),
            );
        }
    }
}

fn is_partial(info: &LeafInfo, vars: &VarTable, v: VarId) -> bool {
    vars.designations_of(v).any(|d| info.maybe.contains(&d)) && !is_definite(info, vars, v)
}

fn is_definite(info: &LeafInfo, vars: &VarTable, v: VarId) -> bool {
    vars.designations_of(v).any(|d| info.definite.contains(&d))
}

/// Report unreachable clauses and degenerate single-clause matches.
fn report_reachability(resolution: &Resolution, clauses: &[Clause], diags: &mut DiagnosticBag) {
    for clause in clauses {
        if !resolution.label_reachable(clause.label) {
            if clauses.len() == 1 {
                diags.push(
                    Diagnostic::warning(ErrorCode::E3005)
                        .with_message("pattern never matches the input")
                        .with_label(clause.span, "cannot match"),
                );
            } else {
                diags.push(
                    Diagnostic::warning(ErrorCode::E3003)
                        .with_message("unreachable match clause")
                        .with_label(clause.span, "no input value reaches this clause"),
                );
            }
        }
    }
    if let [clause] = clauses {
        if !resolution.fail_reachable && resolution.label_reachable(clause.label) {
            diags.push(
                Diagnostic::warning(ErrorCode::E3004)
                    .with_message("pattern always matches the input")
                    .with_label(clause.span, "always matches"),
            );
        }
    }
}

// Tests

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]

//! Lowering of clause lists into the raw decision DAG.
//!
//! The builder is clause-ordered: it never reorders or merges clauses, so
//! first-match-wins semantics hold by construction and the optimizer's
//! sharing never changes which clause is selected.
//!
//! # Algorithm
//!
//! Clauses are lowered **last to first** so that every clause's failure
//! continuation (the next clause's entry node, or the shared fail leaf)
//! already exists when it is needed; interning then requires no
//! back-patching. Each clause runs two passes:
//!
//! 1. **Declare** walks the pattern collecting variables and their
//!    binding sites (designations) into the [`VarTable`], recording
//!    redeclaration conflicts and unifying the designations of
//!    disjunction alternatives that bind exactly the same sites.
//! 2. **Lower** walks the pattern again in continuation style: each
//!    pattern form receives a success and a failure continuation and
//!    returns its entry node. Negation swaps the two continuations
//!    instead of duplicating anything; conjunction chains through the
//!    left pattern's success; disjunction routes the left pattern's
//!    failure into the right pattern's entry.
//!
//! Narrowing to a pattern's type emits the cheapest sufficient check:
//! nothing when the input's static type already guarantees the value
//! (value types), a null test when only `null` could escape (reference
//! types at or above the pattern type), and a full type test plus cast
//! otherwise.
//!
//! # References
//!
//! - Maranget: "Compiling Pattern Matching to Good Decision Trees" (ML'08)
//! - C# Roslyn: `DecisionDagBuilder.cs` (lowering of positional/property
//!   patterns and the `and`/`or`/`not` combinators)

use rustc_hash::FxHashMap;

use vesper_diagnostic::{Diagnostic, DiagnosticBag, ErrorCode};
use vesper_ir::{
    Clause, ConstValue, DeconstructId, Name, PatternId, PatternKind, PropertyId, RelOp, TypeId,
};

use crate::dag::{DagArena, DagNode, DagTest, LeafLabel, NodeId};
use crate::temps::{DagOp, TempId, TempTable};
use crate::vars::{ConflictKind, DesignationId, VarId, VarTable};
use crate::MatchEnv;

/// One binding site as seen by the declare pass: name, declared type, and
/// the temp it binds.
type Site = (Name, TypeId, TempId);

/// A binding site together with the designation the declare pass assigned.
type Event = (Name, TypeId, TempId, DesignationId);

/// Name-to-variable scope of a single clause.
type Scope = FxHashMap<Name, VarId>;

/// Designations of a disjunction's left alternative, keyed by site, used
/// to unify the right alternative's sites onto the same ids.
type MergeMap = FxHashMap<Site, DesignationId>;

/// Lower `clauses` into a raw decision DAG rooted at the returned node.
///
/// The DAG tries clauses in order; each clause's pattern failure (and
/// guard failure) continues with the next clause, and the last clause
/// falls through to the shared fail leaf. An empty clause list returns
/// the fail leaf itself.
pub fn build_dag(
    env: &MatchEnv<'_>,
    clauses: &[Clause],
    temps: &mut TempTable,
    arena: &mut DagArena,
    vars: &mut VarTable,
    diags: &mut DiagnosticBag,
) -> NodeId {
    let mut builder = Builder {
        env,
        temps,
        arena,
        vars,
        diags,
        designation_of: FxHashMap::default(),
        clause: 0,
    };

    let fail = builder.arena.leaf(LeafLabel::Fail);
    let mut entry = fail;
    for (idx, clause) in clauses.iter().enumerate().rev() {
        builder.clause = idx as u32;
        builder.declare_clause(clause.pattern);
        entry = builder.lower_clause(clause, entry);
    }

    tracing::debug!(
        clauses = clauses.len(),
        nodes = builder.arena.len(),
        temps = builder.temps.len(),
        variables = builder.vars.var_count(),
        "built raw decision dag"
    );

    entry
}

struct Builder<'a, 'e> {
    env: &'a MatchEnv<'e>,
    temps: &'a mut TempTable,
    arena: &'a mut DagArena,
    vars: &'a mut VarTable,
    diags: &'a mut DiagnosticBag,
    /// Designation assigned to each binding pattern node by the declare
    /// pass, consumed by the lower pass.
    designation_of: FxHashMap<PatternId, DesignationId>,
    clause: u32,
}

impl Builder<'_, '_> {
    // ── Declare pass ────────────────────────────────────────────────

    fn declare_clause(&mut self, pattern: PatternId) {
        let mut scope = Scope::default();
        let mut events = Vec::new();
        self.declare(pattern, TempId::INPUT, &mut scope, None, &mut events);
    }

    fn declare(
        &mut self,
        pat: PatternId,
        input: TempId,
        scope: &mut Scope,
        merge: Option<&MergeMap>,
        events: &mut Vec<Event>,
    ) {
        match self.env.patterns.kind(pat) {
            PatternKind::Discard
            | PatternKind::Constant { .. }
            | PatternKind::TypeTest { .. }
            | PatternKind::Relational { .. }
            | PatternKind::Error => {}
            PatternKind::Var { name, ty } => {
                self.declare_binding(pat, *name, *ty, input, scope, merge, events);
            }
            PatternKind::Declaration { ty, name } => {
                let temp = self.narrow_temp(input, *ty);
                self.declare_binding(pat, *name, *ty, temp, scope, merge, events);
            }
            PatternKind::Recursive {
                ty,
                deconstruct,
                positional,
                properties,
                designation,
            } => {
                let temp = self.narrow_temp(input, *ty);
                if let Some(dec) = *deconstruct {
                    let outputs = self.env.symbols.deconstruct(dec).outputs.clone();
                    for (i, &sub) in positional.iter().enumerate() {
                        // Excess elements past the deconstructor's arity
                        // get error-typed temps; lowering rejects the
                        // whole pattern before they are ever tested.
                        let out_ty = outputs.get(i).copied().unwrap_or(TypeId::ERROR);
                        let out = self.temps.intern(DagOp::Deconstruct(dec), temp, i as u32, out_ty);
                        self.declare(sub, out, scope, merge, events);
                    }
                }
                for &(prop, sub) in properties {
                    let prop_ty = self.env.symbols.property(prop).ty;
                    let out = self.temps.intern(DagOp::Property(prop), temp, 0, prop_ty);
                    self.declare(sub, out, scope, merge, events);
                }
                if let Some(name) = *designation {
                    self.declare_binding(pat, name, *ty, temp, scope, merge, events);
                }
            }
            PatternKind::Negation { inner } => self.declare(*inner, input, scope, merge, events),
            PatternKind::Conjunction { left, right } => {
                self.declare(*left, input, scope, merge, events);
                self.declare(*right, input, scope, merge, events);
            }
            PatternKind::Disjunction { left, right } => {
                self.declare_disjunction(*left, *right, input, scope, merge, events);
            }
        }
    }

    /// Declare both alternatives of a disjunction.
    ///
    /// When the alternatives bind exactly the same sites (same name, type,
    /// and temp, as multisets), the right alternative reuses the left's
    /// designations. A unified designation's binding node is then interned
    /// identically on both branches, so the variable is bound on every
    /// path through the disjunction and never reported possibly-unassigned.
    ///
    /// When the site sets differ, each alternative keeps its own
    /// designations and the ordinary scope rules apply, so `c` bound at
    /// different temps on the two sides is a redeclaration conflict even
    /// though only one side executes. Accepting that would require proving
    /// the binds never overlap, which this compiler does not attempt.
    fn declare_disjunction(
        &mut self,
        left: PatternId,
        right: PatternId,
        input: TempId,
        scope: &mut Scope,
        merge: Option<&MergeMap>,
        events: &mut Vec<Event>,
    ) {
        let mut left_sites = Vec::new();
        let mut right_sites = Vec::new();
        self.scan_sites(left, input, &mut left_sites);
        self.scan_sites(right, input, &mut right_sites);

        if multiset_eq(&left_sites, &right_sites) {
            let mut left_events = Vec::new();
            self.declare(left, input, scope, merge, &mut left_events);
            let mut unified = MergeMap::default();
            for &(name, ty, temp, d) in &left_events {
                unified.insert((name, ty, temp), d);
            }
            // Same sites, same ids: the right alternative's events are
            // duplicates of the left's, so only the left's are recorded.
            let mut duplicates = Vec::new();
            self.declare(right, input, scope, Some(&unified), &mut duplicates);
            events.extend(left_events);
        } else {
            self.declare(left, input, scope, merge, events);
            self.declare(right, input, scope, merge, events);
        }
    }

    fn declare_binding(
        &mut self,
        pat: PatternId,
        name: Name,
        ty: TypeId,
        temp: TempId,
        scope: &mut Scope,
        merge: Option<&MergeMap>,
        events: &mut Vec<Event>,
    ) {
        let span = self.env.patterns.span(pat);

        if let Some(map) = merge {
            if let Some(&d) = map.get(&(name, ty, temp)) {
                self.designation_of.insert(pat, d);
                scope.insert(name, self.vars.designation(d).variable);
                events.push((name, ty, temp, d));
                return;
            }
        }

        let variable = if let Some(&existing) = scope.get(&name) {
            let decl = self.vars.var(existing);
            let (first_ty, first_temp) = (decl.ty, decl.first_temp);
            if first_ty != ty {
                self.vars.add_conflict(
                    existing,
                    span,
                    ConflictKind::TypeMismatch {
                        first: first_ty,
                        second: ty,
                    },
                );
            } else if first_temp != temp {
                self.vars.add_conflict(existing, span, ConflictKind::DivergentTemps);
            }
            existing
        } else {
            let v = self.vars.add_var(name, ty, temp, span, self.clause);
            scope.insert(name, v);
            v
        };

        let d = self.vars.add_designation(variable, temp, span);
        self.designation_of.insert(pat, d);
        events.push((name, ty, temp, d));
    }

    /// Collect the binding sites of `pat` without declaring anything.
    ///
    /// Mirrors [`Builder::declare`]'s temp derivations exactly; interning
    /// temps here is idempotent with the declare and lower passes.
    fn scan_sites(&mut self, pat: PatternId, input: TempId, out: &mut Vec<Site>) {
        match self.env.patterns.kind(pat) {
            PatternKind::Discard
            | PatternKind::Constant { .. }
            | PatternKind::TypeTest { .. }
            | PatternKind::Relational { .. }
            | PatternKind::Error => {}
            PatternKind::Var { name, ty } => out.push((*name, *ty, input)),
            PatternKind::Declaration { ty, name } => {
                let temp = self.narrow_temp(input, *ty);
                out.push((*name, *ty, temp));
            }
            PatternKind::Recursive {
                ty,
                deconstruct,
                positional,
                properties,
                designation,
            } => {
                let temp = self.narrow_temp(input, *ty);
                if let Some(dec) = *deconstruct {
                    let outputs = self.env.symbols.deconstruct(dec).outputs.clone();
                    for (i, &sub) in positional.iter().enumerate() {
                        let out_ty = outputs.get(i).copied().unwrap_or(TypeId::ERROR);
                        let elem = self.temps.intern(DagOp::Deconstruct(dec), temp, i as u32, out_ty);
                        self.scan_sites(sub, elem, out);
                    }
                }
                for &(prop, sub) in properties {
                    let prop_ty = self.env.symbols.property(prop).ty;
                    let elem = self.temps.intern(DagOp::Property(prop), temp, 0, prop_ty);
                    self.scan_sites(sub, elem, out);
                }
                if let Some(name) = *designation {
                    out.push((name, *ty, temp));
                }
            }
            PatternKind::Negation { inner } => self.scan_sites(*inner, input, out),
            PatternKind::Conjunction { left, right } => {
                self.scan_sites(*left, input, out);
                self.scan_sites(*right, input, out);
            }
            PatternKind::Disjunction { left, right } => {
                let mut left_sites = Vec::new();
                let mut right_sites = Vec::new();
                self.scan_sites(*left, input, &mut left_sites);
                self.scan_sites(*right, input, &mut right_sites);
                // Alternatives that will unify contribute one copy of
                // their sites; alternatives that will not contribute both.
                if multiset_eq(&left_sites, &right_sites) {
                    out.extend(left_sites);
                } else {
                    out.extend(left_sites);
                    out.extend(right_sites);
                }
            }
        }
    }

    // ── Lower pass ──────────────────────────────────────────────────

    fn lower_clause(&mut self, clause: &Clause, fail: NodeId) -> NodeId {
        let leaf = self.arena.leaf(LeafLabel::Clause(clause.label));
        let succ = match clause.guard {
            None => leaf,
            // Guard failure falls through to the next clause, exactly
            // like pattern failure.
            Some(guard) => self.test(TempId::INPUT, DagTest::Guard(guard), leaf, fail),
        };
        self.lower(clause.pattern, TempId::INPUT, succ, fail)
    }

    /// Lower `pat` against `input`, continuing with `succ` on match and
    /// `fail` otherwise. Returns the entry node.
    fn lower(&mut self, pat: PatternId, input: TempId, succ: NodeId, fail: NodeId) -> NodeId {
        match self.env.patterns.kind(pat) {
            PatternKind::Discard => succ,
            PatternKind::Var { .. } => {
                let d = self.designation(pat);
                self.bind(d, input, succ)
            }
            PatternKind::Constant { value } => self.lower_constant(*value, input, succ, fail),
            PatternKind::TypeTest { ty } => {
                let ty = *ty;
                // Intern the narrowed temp even though no binding uses
                // it; the cast on the success path defines it.
                self.narrow_temp(input, ty);
                self.wrap_narrow(input, ty, succ, fail)
            }
            PatternKind::Declaration { ty, .. } => {
                let ty = *ty;
                let temp = self.narrow_temp(input, ty);
                let d = self.designation(pat);
                let body = self.bind(d, temp, succ);
                self.wrap_narrow(input, ty, body, fail)
            }
            PatternKind::Recursive {
                ty,
                deconstruct,
                positional,
                properties,
                designation,
            } => self.lower_recursive(
                pat,
                *ty,
                *deconstruct,
                positional,
                properties,
                designation.is_some(),
                input,
                succ,
                fail,
            ),
            PatternKind::Relational { op, value } => {
                self.lower_relational(pat, *op, *value, input, succ, fail)
            }
            // `not p` matches exactly when `p` does not: swap the
            // continuations and lower `p` once. No subgraph duplication.
            PatternKind::Negation { inner } => self.lower(*inner, input, fail, succ),
            PatternKind::Conjunction { left, right } => {
                let rest = self.lower(*right, input, succ, fail);
                self.lower(*left, input, rest, fail)
            }
            PatternKind::Disjunction { left, right } => {
                let alternative = self.lower(*right, input, succ, fail);
                self.lower(*left, input, succ, alternative)
            }
            PatternKind::Error => {
                let span = self.env.patterns.span(pat);
                self.diags.push(
                    Diagnostic::error(ErrorCode::E3008)
                        .with_message("pattern could not be bound")
                        .with_label(span, "malformed pattern"),
                );
                self.never(input, succ, fail)
            }
        }
    }

    fn lower_constant(
        &mut self,
        value: ConstValue,
        input: TempId,
        succ: NodeId,
        fail: NodeId,
    ) -> NodeId {
        let input_ty = self.temps.ty(input);
        if value.is_null() {
            return if self.env.types.is_value_type(input_ty) {
                // A value type can never hold null; reachability analysis
                // reports the clause this sinks.
                self.never(input, succ, fail)
            } else {
                self.test(input, DagTest::Null, succ, fail)
            };
        }
        let const_ty = const_type(value);
        if self.env.types.is_subtype(input_ty, const_ty) {
            self.test(input, DagTest::Const(value), succ, fail)
        } else {
            // Wider input: narrow to the constant's type first, as a
            // declaration pattern would.
            let temp = self.narrow_temp(input, const_ty);
            let body = self.test(temp, DagTest::Const(value), succ, fail);
            self.wrap_narrow(input, const_ty, body, fail)
        }
    }

    fn lower_relational(
        &mut self,
        pat: PatternId,
        op: RelOp,
        value: ConstValue,
        input: TempId,
        succ: NodeId,
        fail: NodeId,
    ) -> NodeId {
        let span = self.env.patterns.span(pat);
        if !value.is_orderable() {
            self.diags.push(
                Diagnostic::error(ErrorCode::E3007)
                    .with_message("relational pattern compares against a non-orderable constant")
                    .with_label(span, "not orderable"),
            );
            return self.never(input, succ, fail);
        }
        let input_ty = self.temps.ty(input);
        let const_ty = const_type(value);
        if self.env.types.is_subtype(input_ty, const_ty) {
            return self.test(input, DagTest::Relational(op, value), succ, fail);
        }
        if self.env.types.is_value_type(input_ty) || input_ty == TypeId::ERROR {
            // int against a char constant, bool against anything: no
            // conversion exists, so the comparison is malformed.
            self.diags.push(
                Diagnostic::error(ErrorCode::E3007)
                    .with_message(format!(
                        "relational pattern cannot apply to an operand of type `{}`",
                        self.env.types.display(input_ty, self.env.names)
                    ))
                    .with_label(span, "not comparable"),
            );
            return self.never(input, succ, fail);
        }
        // Reference-typed input narrows to the constant's type first.
        let temp = self.narrow_temp(input, const_ty);
        let body = self.test(temp, DagTest::Relational(op, value), succ, fail);
        self.wrap_narrow(input, const_ty, body, fail)
    }

    #[expect(
        clippy::too_many_arguments,
        reason = "continuation-style lowering threads both continuations"
    )]
    fn lower_recursive(
        &mut self,
        pat: PatternId,
        ty: TypeId,
        deconstruct: Option<DeconstructId>,
        positional: &[PatternId],
        properties: &[(PropertyId, PatternId)],
        has_designation: bool,
        input: TempId,
        succ: NodeId,
        fail: NodeId,
    ) -> NodeId {
        let span = self.env.patterns.span(pat);

        if !positional.is_empty() && deconstruct.is_none() {
            self.diags.push(
                Diagnostic::error(ErrorCode::E3008)
                    .with_message("positional pattern has no resolved deconstructor")
                    .with_label(span, "cannot deconstruct"),
            );
            return self.never(input, succ, fail);
        }
        if let Some(dec) = deconstruct {
            let arity = self.env.symbols.deconstruct(dec).arity();
            if positional.len() != arity {
                self.diags.push(
                    Diagnostic::error(ErrorCode::E3006)
                        .with_message(format!(
                            "pattern has {} elements but the deconstructor produces {arity}",
                            positional.len()
                        ))
                        .with_label(span, "wrong number of elements"),
                );
                return self.never(input, succ, fail);
            }
        }

        let temp = self.narrow_temp(input, ty);

        // Built back to front: the continuation chain runs narrow, then
        // deconstruct, then positional subpatterns left to right, then
        // properties in order, then the designation binding.
        let mut next = succ;
        if has_designation {
            let d = self.designation(pat);
            next = self.bind(d, temp, next);
        }
        for &(prop, sub) in properties.iter().rev() {
            let prop_ty = self.env.symbols.property(prop).ty;
            let out = self.temps.intern(DagOp::Property(prop), temp, 0, prop_ty);
            let body = self.lower(sub, out, next, fail);
            next = self.arena.intern(DagNode::Eval {
                input: temp,
                op: DagOp::Property(prop),
                next: body,
            });
        }
        if let Some(dec) = deconstruct {
            let outputs = self.env.symbols.deconstruct(dec).outputs.clone();
            for (i, &sub) in positional.iter().enumerate().rev() {
                let out = self.temps.intern(DagOp::Deconstruct(dec), temp, i as u32, outputs[i]);
                next = self.lower(sub, out, next, fail);
            }
            next = self.arena.intern(DagNode::Eval {
                input: temp,
                op: DagOp::Deconstruct(dec),
                next,
            });
        }
        self.wrap_narrow(input, ty, next, fail)
    }

    // ── Narrowing ───────────────────────────────────────────────────

    /// The temp holding `input` narrowed to `ty`: the input itself when
    /// its static type already guarantees `ty`, the cast output otherwise.
    fn narrow_temp(&mut self, input: TempId, ty: TypeId) -> TempId {
        let input_ty = self.temps.ty(input);
        if self.env.types.is_subtype(input_ty, ty) {
            input
        } else {
            self.temps.intern(DagOp::Cast(ty), input, 0, ty)
        }
    }

    /// Wrap `body` in the cheapest check that `input` is a `ty`.
    ///
    /// `body` must already consume [`Builder::narrow_temp`]`(input, ty)`.
    fn wrap_narrow(&mut self, input: TempId, ty: TypeId, body: NodeId, fail: NodeId) -> NodeId {
        let input_ty = self.temps.ty(input);
        if self.env.types.is_subtype(input_ty, ty) {
            if self.env.types.is_value_type(input_ty) {
                // Statically guaranteed; nothing to check at runtime.
                body
            } else {
                // Only null escapes a statically-assignable reference.
                self.test(input, DagTest::NonNull, body, fail)
            }
        } else {
            let eval = self.arena.intern(DagNode::Eval {
                input,
                op: DagOp::Cast(ty),
                next: body,
            });
            self.test(input, DagTest::Type(ty), eval, fail)
        }
    }

    // ── Node helpers ────────────────────────────────────────────────

    fn test(&mut self, input: TempId, test: DagTest, when_true: NodeId, when_false: NodeId) -> NodeId {
        self.arena.intern(DagNode::Test {
            input,
            test,
            when_true,
            when_false,
        })
    }

    fn never(&mut self, input: TempId, succ: NodeId, fail: NodeId) -> NodeId {
        self.test(input, DagTest::Never, succ, fail)
    }

    fn bind(&mut self, designation: DesignationId, temp: TempId, next: NodeId) -> NodeId {
        let variable = self.vars.designation(designation).variable;
        self.arena.intern(DagNode::Bind {
            variable,
            designation,
            temp,
            next,
        })
    }

    fn designation(&self, pat: PatternId) -> DesignationId {
        self.designation_of
            .get(&pat)
            .copied()
            .unwrap_or_else(|| panic!("pattern {pat:?} has no designation"))
    }
}

/// Static type of a non-null constant.
fn const_type(value: ConstValue) -> TypeId {
    match value {
        // Null is handled before the type is ever asked for.
        ConstValue::Null => TypeId::OBJECT,
        ConstValue::Bool(_) => TypeId::BOOL,
        ConstValue::Int(_) => TypeId::INT,
        ConstValue::Float(_) => TypeId::FLOAT,
        ConstValue::Char(_) => TypeId::CHAR,
        ConstValue::Str(_) => TypeId::STR,
    }
}

fn multiset_eq(a: &[Site], b: &[Site]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let key = |&(name, ty, temp): &Site| (name.raw(), ty.raw(), temp.raw());
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_unstable_by_key(key);
    b.sort_unstable_by_key(key);
    a == b
}

// Tests

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]

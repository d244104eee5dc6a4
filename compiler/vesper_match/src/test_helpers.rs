//! Shared scaffolding for the crate's tests: a fixture owning the tables
//! a compilation borrows, and a naive clause-by-clause matcher that
//! serves as the oracle for DAG equivalence tests.

use vesper_diagnostic::DiagnosticBag;
use vesper_ir::{
    Clause, ConstValue, GuardId, Name, NameInterner, PatternArena, PatternId, PatternKind, RelOp,
    Span, Symbols, TypeId, TypeTable,
};

use crate::dag::LeafLabel;
use crate::walk::MatchValue;
use crate::{MatchCompiler, MatchDag, MatchEnv};

/// Owns everything a [`MatchEnv`] borrows. Build types, symbols, and
/// patterns first, then call [`Fixture::compile`].
pub struct Fixture {
    pub types: TypeTable,
    pub symbols: Symbols,
    pub names: NameInterner,
    pub patterns: PatternArena,
}

impl Fixture {
    pub fn new() -> Self {
        Fixture {
            types: TypeTable::new(),
            symbols: Symbols::new(),
            names: NameInterner::new(),
            patterns: PatternArena::new(),
        }
    }

    pub fn env(&self) -> MatchEnv<'_> {
        MatchEnv {
            types: &self.types,
            symbols: &self.symbols,
            names: &self.names,
            patterns: &self.patterns,
        }
    }

    pub fn name(&mut self, s: &str) -> Name {
        self.names.intern(s)
    }

    /// Push a pattern node with a fresh one-byte span, so every node's
    /// diagnostics stay distinguishable.
    pub fn pat(&mut self, kind: PatternKind) -> PatternId {
        let at = self.patterns.len() as u32;
        self.patterns.push(kind, Span::new(at, at + 1))
    }

    /// Run the full pipeline over `clauses` with the given input type.
    pub fn compile(&self, input_ty: TypeId, clauses: &[Clause]) -> (MatchDag, DiagnosticBag) {
        let mut diags = DiagnosticBag::new();
        let dag = MatchCompiler::new(self.env()).compile(clauses, input_ty, &mut diags);
        (dag, diags)
    }
}

/// First-match-wins reference semantics, evaluated clause by clause
/// directly over the pattern tree.
pub fn naive_select(
    env: &MatchEnv<'_>,
    clauses: &[Clause],
    value: &MatchValue,
    guard: &dyn Fn(GuardId) -> bool,
) -> LeafLabel {
    for clause in clauses {
        if naive_matches(env, clause.pattern, value) && clause.guard.map_or(true, guard) {
            return LeafLabel::Clause(clause.label);
        }
    }
    LeafLabel::Fail
}

/// Does `pat` match `value`? Direct recursion over the pattern tree,
/// no temps, no sharing. Slow and obviously correct.
pub fn naive_matches(env: &MatchEnv<'_>, pat: PatternId, value: &MatchValue) -> bool {
    match env.patterns.kind(pat) {
        PatternKind::Discard | PatternKind::Var { .. } => true,
        PatternKind::Constant { value: c } => const_matches(env, value, *c),
        PatternKind::TypeTest { ty } | PatternKind::Declaration { ty, .. } => {
            is_runtime(env, value, *ty)
        }
        PatternKind::Recursive {
            ty,
            deconstruct,
            positional,
            properties,
            ..
        } => {
            if !is_runtime(env, value, *ty) {
                return false;
            }
            if let Some(dec) = deconstruct {
                if positional.len() != env.symbols.deconstruct(*dec).arity() {
                    return false;
                }
                let MatchValue::Obj { elements, .. } = value else {
                    return false;
                };
                if elements.len() != positional.len() {
                    return false;
                }
                for (&sub, element) in positional.iter().zip(elements) {
                    if !naive_matches(env, sub, element) {
                        return false;
                    }
                }
            } else if !positional.is_empty() {
                return false;
            }
            for &(prop, sub) in properties {
                let MatchValue::Obj {
                    properties: have, ..
                } = value
                else {
                    return false;
                };
                let Some((_, v)) = have.iter().find(|&&(id, _)| id == prop) else {
                    return false;
                };
                if !naive_matches(env, sub, v) {
                    return false;
                }
            }
            true
        }
        PatternKind::Relational { op, value: c } => rel_matches(value, *op, *c),
        PatternKind::Negation { inner } => !naive_matches(env, *inner, value),
        PatternKind::Conjunction { left, right } => {
            naive_matches(env, *left, value) && naive_matches(env, *right, value)
        }
        PatternKind::Disjunction { left, right } => {
            naive_matches(env, *left, value) || naive_matches(env, *right, value)
        }
        PatternKind::Error => false,
    }
}

/// Walk every value through the DAG and assert agreement with the oracle.
pub fn assert_dag_agrees(
    fx: &Fixture,
    dag: &MatchDag,
    clauses: &[Clause],
    values: &[MatchValue],
    guard: &dyn Fn(GuardId) -> bool,
) {
    let env = fx.env();
    for value in values {
        let via_dag = match dag.walk(&env, value, guard) {
            Ok(label) => label,
            Err(e) => panic!("walk failed for {value:?}: {e:?}"),
        };
        let via_naive = naive_select(&env, clauses, value, guard);
        assert_eq!(via_dag, via_naive, "dag and oracle disagree on {value:?}");
    }
}

fn is_runtime(env: &MatchEnv<'_>, value: &MatchValue, ty: TypeId) -> bool {
    value
        .runtime_type()
        .is_some_and(|rt| env.types.is_subtype(rt, ty))
}

fn const_matches(env: &MatchEnv<'_>, value: &MatchValue, constant: ConstValue) -> bool {
    match (value, constant) {
        (MatchValue::Null, c) => c.is_null(),
        (MatchValue::Bool(b), ConstValue::Bool(c)) => *b == c,
        (MatchValue::Int(i), ConstValue::Int(c)) => *i == c,
        (MatchValue::Float(f), ConstValue::Float(bits)) => f.to_bits() == bits,
        (MatchValue::Char(ch), ConstValue::Char(c)) => *ch == c,
        (MatchValue::Str(s), ConstValue::Str(name)) => s == env.names.resolve(name),
        _ => false,
    }
}

fn rel_matches(value: &MatchValue, op: RelOp, constant: ConstValue) -> bool {
    let ord = match (value, constant) {
        (MatchValue::Int(i), ConstValue::Int(c)) => i.partial_cmp(&c),
        (MatchValue::Float(f), ConstValue::Float(bits)) => f.partial_cmp(&f64::from_bits(bits)),
        (MatchValue::Char(ch), ConstValue::Char(c)) => ch.partial_cmp(&c),
        _ => None,
    };
    ord.is_some_and(|o| op.holds(o))
}

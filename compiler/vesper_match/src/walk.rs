//! Reference interpreter for a compiled decision DAG.
//!
//! Feeds a runtime value through the DAG and reports which leaf it
//! reaches and, via [`walk_bound`], which variables were bound on the
//! way. Tests use this to check the compiled DAG against a naive
//! clause-by-clause evaluator; it is also handy for debugging a
//! surprising dump, and consumers use it to fold matches over values
//! known at compile time.
//!
//! Semantics notes:
//!
//! - a type test on `null` is false, matching `is`;
//! - float constants compare by bit pattern, so a NaN constant matches
//!   a NaN input;
//! - relational tests use partial order, so NaN compares false against
//!   everything.

use rustc_hash::FxHashMap;

use vesper_ir::{ConstValue, GuardId, PropertyId, RelOp, TypeId};

use crate::dag::{DagArena, DagNode, DagTest, LeafLabel, NodeId};
use crate::temps::{DagOp, TempId, TempTable};
use crate::vars::VarId;
use crate::MatchEnv;

/// A runtime value fed to [`walk`].
#[derive(Clone, Debug, PartialEq)]
pub enum MatchValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Str(String),
    /// A non-primitive object: its runtime type, the elements its
    /// deconstructor produces, and its readable properties.
    Obj {
        ty: TypeId,
        elements: Vec<MatchValue>,
        properties: Vec<(PropertyId, MatchValue)>,
    },
}

impl MatchValue {
    /// An object of type `ty` with no elements or properties.
    pub fn obj(ty: TypeId) -> Self {
        MatchValue::Obj {
            ty,
            elements: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// Replace the elements the object's deconstructor produces.
    ///
    /// # Panics
    ///
    /// Panics if the value is not an object.
    pub fn with_elements(self, elements: Vec<MatchValue>) -> Self {
        match self {
            MatchValue::Obj { ty, properties, .. } => MatchValue::Obj {
                ty,
                elements,
                properties,
            },
            other => panic!("with_elements on non-object value {other:?}"),
        }
    }

    /// Add a readable property.
    ///
    /// # Panics
    ///
    /// Panics if the value is not an object.
    pub fn with_property(self, property: PropertyId, value: MatchValue) -> Self {
        match self {
            MatchValue::Obj {
                ty,
                elements,
                mut properties,
            } => {
                properties.push((property, value));
                MatchValue::Obj {
                    ty,
                    elements,
                    properties,
                }
            }
            other => panic!("with_property on non-object value {other:?}"),
        }
    }

    /// Whether the value is `null`.
    pub fn is_null(&self) -> bool {
        matches!(self, MatchValue::Null)
    }

    /// Runtime type of the value; `None` for `null`.
    pub fn runtime_type(&self) -> Option<TypeId> {
        match self {
            MatchValue::Null => None,
            MatchValue::Bool(_) => Some(TypeId::BOOL),
            MatchValue::Int(_) => Some(TypeId::INT),
            MatchValue::Float(_) => Some(TypeId::FLOAT),
            MatchValue::Char(_) => Some(TypeId::CHAR),
            MatchValue::Str(_) => Some(TypeId::STR),
            MatchValue::Obj { ty, .. } => Some(*ty),
        }
    }
}

/// A value that does not fit the shape the DAG was compiled against.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WalkError {
    /// A node consulted a temp no eval on the path produced.
    UnknownTemp(TempId),
    /// A property eval ran against a value lacking that property.
    MissingProperty(PropertyId),
    /// A deconstruct eval ran against a value of the wrong shape.
    NotDeconstructable(TempId),
    /// A relational test compared values of different kinds.
    Incomparable(TempId),
}

/// What a walk produced: the leaf reached and the variables bound on
/// the way.
///
/// `bound` lists the traversed Bind nodes in path order. A clause that
/// partially matched before failing leaves its early bindings here,
/// just as the lowered code would have stored them.
#[derive(Clone, Debug, PartialEq)]
pub struct WalkOutcome {
    pub label: LeafLabel,
    pub bound: Vec<(VarId, MatchValue)>,
}

/// Walk `value` through the DAG and return the leaf it reaches.
///
/// Wrapper over [`walk_bound`] for callers that do not need the
/// bindings.
pub fn walk(
    env: &MatchEnv<'_>,
    arena: &DagArena,
    root: NodeId,
    temps: &TempTable,
    value: &MatchValue,
    guard: &dyn Fn(GuardId) -> bool,
) -> Result<LeafLabel, WalkError> {
    Ok(walk_bound(env, arena, root, temps, value, guard)?.label)
}

/// Walk `value` through the DAG, returning the leaf it reaches and the
/// variable bindings performed on the way.
///
/// `guard` decides guard tests; it is consulted once per guard node
/// visited. The arena is acyclic by construction (a node's successors
/// are interned before it), so the walk terminates.
///
/// # Panics
///
/// Panics if the DAG refers to temps not interned in `temps`; that
/// means the arguments come from different compilations.
pub fn walk_bound(
    env: &MatchEnv<'_>,
    arena: &DagArena,
    root: NodeId,
    temps: &TempTable,
    value: &MatchValue,
    guard: &dyn Fn(GuardId) -> bool,
) -> Result<WalkOutcome, WalkError> {
    let mut walker = Walker {
        env,
        temps,
        values: FxHashMap::default(),
    };
    walker.values.insert(TempId::INPUT, value.clone());
    let mut bound = Vec::new();
    let mut current = root;
    loop {
        match arena.node(current) {
            DagNode::Leaf(label) => return Ok(WalkOutcome { label, bound }),
            DagNode::Bind {
                variable,
                temp,
                next,
                ..
            } => {
                let v = walker
                    .values
                    .get(&temp)
                    .ok_or(WalkError::UnknownTemp(temp))?
                    .clone();
                bound.push((variable, v));
                current = next;
            }
            DagNode::Eval { input, op, next } => {
                walker.run_eval(input, op)?;
                current = next;
            }
            DagNode::Test {
                input,
                test,
                when_true,
                when_false,
            } => {
                let holds = match test {
                    DagTest::Guard(g) => guard(g),
                    DagTest::Never => false,
                    _ => walker.test_holds(input, test)?,
                };
                current = if holds { when_true } else { when_false };
            }
        }
    }
}

struct Walker<'a> {
    env: &'a MatchEnv<'a>,
    temps: &'a TempTable,
    values: FxHashMap<TempId, MatchValue>,
}

impl Walker<'_> {
    fn run_eval(&mut self, input: TempId, op: DagOp) -> Result<(), WalkError> {
        let value = self
            .values
            .get(&input)
            .ok_or(WalkError::UnknownTemp(input))?
            .clone();
        match op {
            DagOp::Cast(_) => {
                let out = self.output(op, input, 0);
                self.values.insert(out, value);
            }
            DagOp::Property(p) => {
                let MatchValue::Obj { properties, .. } = &value else {
                    return Err(WalkError::MissingProperty(p));
                };
                let Some((_, v)) = properties.iter().find(|&&(id, _)| id == p) else {
                    return Err(WalkError::MissingProperty(p));
                };
                let v = v.clone();
                let out = self.output(op, input, 0);
                self.values.insert(out, v);
            }
            DagOp::Deconstruct(d) => {
                let arity = self.env.symbols.deconstruct(d).arity();
                let MatchValue::Obj { elements, .. } = &value else {
                    return Err(WalkError::NotDeconstructable(input));
                };
                if elements.len() != arity {
                    return Err(WalkError::NotDeconstructable(input));
                }
                for (i, element) in elements.iter().enumerate() {
                    let out = self.output(op, input, i as u32);
                    self.values.insert(out, element.clone());
                }
            }
        }
        Ok(())
    }

    /// Evaluate a value-consuming test. Guard and never tests are
    /// decided by the caller without touching the value environment.
    fn test_holds(&self, input: TempId, test: DagTest) -> Result<bool, WalkError> {
        let value = self
            .values
            .get(&input)
            .ok_or(WalkError::UnknownTemp(input))?;
        Ok(match test {
            DagTest::Type(ty) => value
                .runtime_type()
                .is_some_and(|rt| self.env.types.is_subtype(rt, ty)),
            DagTest::NonNull => !value.is_null(),
            DagTest::Null => value.is_null(),
            DagTest::Const(constant) => self.const_eq(value, constant),
            DagTest::Relational(op, constant) => {
                return relational_holds(value, op, constant, input)
            }
            DagTest::Guard(_) | DagTest::Never => false,
        })
    }

    fn const_eq(&self, value: &MatchValue, constant: ConstValue) -> bool {
        match (value, constant) {
            (MatchValue::Null, c) => c.is_null(),
            (MatchValue::Bool(b), ConstValue::Bool(c)) => *b == c,
            (MatchValue::Int(i), ConstValue::Int(c)) => *i == c,
            (MatchValue::Float(f), ConstValue::Float(bits)) => f.to_bits() == bits,
            (MatchValue::Char(ch), ConstValue::Char(c)) => *ch == c,
            (MatchValue::Str(s), ConstValue::Str(name)) => s == self.env.names.resolve(name),
            _ => false,
        }
    }

    fn output(&self, op: DagOp, input: TempId, index: u32) -> TempId {
        self.temps
            .lookup(op, input, index)
            .unwrap_or_else(|| panic!("output {index} of {op:?} was never interned"))
    }
}

fn relational_holds(
    value: &MatchValue,
    op: RelOp,
    constant: ConstValue,
    input: TempId,
) -> Result<bool, WalkError> {
    let ord = match (value, constant) {
        (MatchValue::Int(i), ConstValue::Int(c)) => i.partial_cmp(&c),
        (MatchValue::Float(f), ConstValue::Float(bits)) => f.partial_cmp(&f64::from_bits(bits)),
        (MatchValue::Char(ch), ConstValue::Char(c)) => ch.partial_cmp(&c),
        _ => return Err(WalkError::Incomparable(input)),
    };
    Ok(ord.is_some_and(|o| op.holds(o)))
}

// Tests

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]

//! Plain-text rendering of a decision DAG.
//!
//! One line per node, nodes in preorder with the true branch first, so
//! two structurally identical DAGs render byte-identically regardless of
//! interning order. Node numbers are preorder positions; temp numbers
//! are assigned by first appearance in that same order. Tests assert on
//! this text, and it is the quickest way to see what the compiler built:
//!
//! ```text
//! [0]: t0 is Pair ? [1] : [6]
//! [1]: t1 = (Pair)t0; [2]
//! [2]: (t2, t3) = t1.Deconstruct(); [3]
//! [3]: t2 == 0 ? [4] : [6]
//! [4]: bind y = t3; [5]
//! [5]: leaf `case 0`
//! [6]: leaf <fail>
//! ```

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use vesper_ir::{Clause, ConstValue};

use crate::dag::{DagArena, DagNode, DagTest, LeafLabel, NodeId};
use crate::temps::{DagOp, TempId, TempTable};
use crate::vars::VarTable;
use crate::MatchEnv;

/// Render the DAG reachable from `root` as one line per node.
///
/// # Panics
///
/// Panics if the DAG refers to temps not interned in `temps` or to
/// labels not present in `clauses`; both mean the arguments come from
/// different compilations.
pub fn dump(
    env: &MatchEnv<'_>,
    arena: &DagArena,
    root: NodeId,
    temps: &TempTable,
    vars: &VarTable,
    clauses: &[Clause],
) -> String {
    let order = arena.preorder(root);
    let mut printer = Printer {
        env,
        temps,
        vars,
        clauses,
        node_no: order.iter().enumerate().map(|(i, &id)| (id, i)).collect(),
        temp_no: FxHashMap::default(),
    };
    for &id in &order {
        printer.note_temps(arena.node(id));
    }
    let mut out = String::new();
    for &id in &order {
        out.push_str(&printer.line(id, arena.node(id)));
        out.push('\n');
    }
    out
}

struct Printer<'a> {
    env: &'a MatchEnv<'a>,
    temps: &'a TempTable,
    vars: &'a VarTable,
    clauses: &'a [Clause],
    node_no: FxHashMap<NodeId, usize>,
    temp_no: FxHashMap<TempId, usize>,
}

impl Printer<'_> {
    /// Assign display numbers to every temp a node mentions, input first
    /// then outputs, so numbering is a function of display order alone.
    fn note_temps(&mut self, node: DagNode) {
        match node {
            DagNode::Test { input, .. } => self.note(input),
            DagNode::Eval { input, op, .. } => {
                self.note(input);
                for temp in self.eval_outputs(op, input) {
                    self.note(temp);
                }
            }
            DagNode::Bind { temp, .. } => self.note(temp),
            DagNode::Leaf(_) => {}
        }
    }

    fn note(&mut self, temp: TempId) {
        let next = self.temp_no.len();
        self.temp_no.entry(temp).or_insert(next);
    }

    fn eval_outputs(&self, op: DagOp, input: TempId) -> SmallVec<[TempId; 4]> {
        let arity = match op {
            DagOp::Cast(_) | DagOp::Property(_) => 1,
            DagOp::Deconstruct(d) => self.env.symbols.deconstruct(d).arity(),
        };
        (0..arity)
            .map(|i| {
                self.temps
                    .lookup(op, input, i as u32)
                    .unwrap_or_else(|| panic!("output {i} of {op:?} was never interned"))
            })
            .collect()
    }

    fn line(&self, id: NodeId, node: DagNode) -> String {
        let n = self.node_no[&id];
        match node {
            DagNode::Test {
                input,
                test,
                when_true,
                when_false,
            } => format!(
                "[{n}]: {} ? [{}] : [{}]",
                self.test_str(input, test),
                self.node_no[&when_true],
                self.node_no[&when_false],
            ),
            DagNode::Eval { input, op, next } => {
                format!("[{n}]: {}; [{}]", self.eval_str(input, op), self.node_no[&next])
            }
            DagNode::Bind {
                variable,
                temp,
                next,
                ..
            } => {
                let name = self.env.names.resolve(self.vars.var(variable).name);
                format!(
                    "[{n}]: bind {name} = {}; [{}]",
                    self.temp_str(temp),
                    self.node_no[&next],
                )
            }
            DagNode::Leaf(LeafLabel::Fail) => format!("[{n}]: leaf <fail>"),
            DagNode::Leaf(LeafLabel::Clause(label)) => {
                let index = self
                    .clauses
                    .iter()
                    .position(|c| c.label == label)
                    .unwrap_or_else(|| panic!("label {label:?} does not belong to this match"));
                format!("[{n}]: leaf `case {index}`")
            }
        }
    }

    fn test_str(&self, input: TempId, test: DagTest) -> String {
        let t = self.temp_str(input);
        match test {
            DagTest::Type(ty) => {
                format!("{t} is {}", self.env.types.display(ty, self.env.names))
            }
            DagTest::NonNull => format!("{t} != null"),
            DagTest::Null => format!("{t} == null"),
            DagTest::Const(value) => format!("{t} == {}", self.const_str(value)),
            DagTest::Relational(op, value) => {
                format!("{t} {} {}", op.as_str(), self.const_str(value))
            }
            DagTest::Guard(guard) => format!("when <g{}>", guard.index()),
            DagTest::Never => "never".to_owned(),
        }
    }

    fn eval_str(&self, input: TempId, op: DagOp) -> String {
        match op {
            DagOp::Cast(ty) => format!(
                "{} = ({}){}",
                self.temp_str(self.output(op, input, 0)),
                self.env.types.display(ty, self.env.names),
                self.temp_str(input),
            ),
            DagOp::Property(p) => format!(
                "{} = {}.{}",
                self.temp_str(self.output(op, input, 0)),
                self.temp_str(input),
                self.env.names.resolve(self.env.symbols.property(p).name),
            ),
            DagOp::Deconstruct(_) => {
                let outs: Vec<String> = self
                    .eval_outputs(op, input)
                    .iter()
                    .map(|&t| self.temp_str(t))
                    .collect();
                format!("({}) = {}.Deconstruct()", outs.join(", "), self.temp_str(input))
            }
        }
    }

    fn output(&self, op: DagOp, input: TempId, index: u32) -> TempId {
        self.temps
            .lookup(op, input, index)
            .unwrap_or_else(|| panic!("output {index} of {op:?} was never interned"))
    }

    fn temp_str(&self, temp: TempId) -> String {
        format!("t{}", self.temp_no[&temp])
    }

    fn const_str(&self, value: ConstValue) -> String {
        match value {
            ConstValue::Null => "null".to_owned(),
            ConstValue::Bool(b) => b.to_string(),
            ConstValue::Int(i) => i.to_string(),
            ConstValue::Float(bits) => format!("{:?}", f64::from_bits(bits)),
            ConstValue::Char(c) => format!("'{c}'"),
            ConstValue::Str(name) => format!("{:?}", self.env.names.resolve(name)),
        }
    }
}

// Tests

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]
mod tests;

//! Path-sensitive simplification of the raw decision DAG.
//!
//! The raw DAG repeats work across clauses: clause 2 re-tests what
//! clause 1 already established on the path that reaches it. This pass
//! removes those repeats without ever changing which clause a value
//! selects.
//!
//! # Algorithm
//!
//! One recursive rewrite from the root, carrying a *path context*: the
//! evaluations already performed and the test outcomes already decided
//! on the path to the current node.
//!
//! - An evaluation whose `(input, op)` is in the context is skipped;
//!   its outputs were already defined upstream.
//! - A test whose `(input, test)` is decided in the context is replaced
//!   by the decided branch.
//! - A never-test is replaced by its false branch.
//! - A test whose branches rewrite to the same node is dropped, except
//!   guard tests, whose evaluation is observable and must stay.
//!
//! Only *identical* test keys fold. `t0 == 1` deciding `t0 == 2` (or any
//! other cross-constant implication) is deliberately out of scope; the
//! rewrite stays a pure de-duplicator, which keeps it obviously
//! selection-preserving.
//!
//! Results intern into a fresh arena, so structurally equal subgraphs
//! share nodes. Contexts are interned parent-pointer chains and the
//! rewrite memoizes on `(node, context)`; re-running the pass on its own
//! output changes nothing, node numbering included.

use rustc_hash::FxHashMap;

use crate::dag::{DagArena, DagNode, DagTest, NodeId};
use crate::temps::{DagOp, TempId};

/// Rewrite `raw` into a simplified DAG, returning the new arena and root.
pub fn optimize(raw: &DagArena, root: NodeId) -> (DagArena, NodeId) {
    let mut optimizer = Optimizer {
        raw,
        out: DagArena::new(),
        ctx_entries: Vec::new(),
        ctx_interned: FxHashMap::default(),
        memo: FxHashMap::default(),
    };
    let new_root = optimizer.rewrite(root, CtxId::EMPTY);

    tracing::debug!(
        raw_nodes = raw.len(),
        nodes = optimizer.out.len(),
        "optimized decision dag"
    );

    (optimizer.out, new_root)
}

/// A path context: a parent-pointer chain of facts.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
struct CtxId(u32);

impl CtxId {
    const EMPTY: CtxId = CtxId(u32::MAX);
}

/// One fact established on the path to a node.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
enum Fact {
    /// The evaluation `(input, op)` was performed.
    Ran(TempId, DagOp),
    /// The test `(input, test)` took the recorded branch.
    Decided(TempId, DagTest, bool),
}

struct Optimizer<'a> {
    raw: &'a DagArena,
    out: DagArena,
    /// Chain storage: each context is `(parent, fact)`.
    ctx_entries: Vec<(CtxId, Fact)>,
    ctx_interned: FxHashMap<(CtxId, Fact), CtxId>,
    memo: FxHashMap<(NodeId, CtxId), NodeId>,
}

impl Optimizer<'_> {
    fn push(&mut self, parent: CtxId, fact: Fact) -> CtxId {
        if let Some(&id) = self.ctx_interned.get(&(parent, fact)) {
            return id;
        }
        let raw = u32::try_from(self.ctx_entries.len())
            .unwrap_or_else(|_| panic!("optimizer exceeded u32::MAX path contexts"));
        debug_assert_ne!(raw, u32::MAX);
        let id = CtxId(raw);
        self.ctx_entries.push((parent, fact));
        self.ctx_interned.insert((parent, fact), id);
        id
    }

    fn has_ran(&self, mut ctx: CtxId, input: TempId, op: DagOp) -> bool {
        while ctx != CtxId::EMPTY {
            let (parent, fact) = self.ctx_entries[ctx.0 as usize];
            if fact == Fact::Ran(input, op) {
                return true;
            }
            ctx = parent;
        }
        false
    }

    fn decided(&self, mut ctx: CtxId, input: TempId, test: DagTest) -> Option<bool> {
        while ctx != CtxId::EMPTY {
            let (parent, fact) = self.ctx_entries[ctx.0 as usize];
            if let Fact::Decided(t, k, outcome) = fact {
                if t == input && k == test {
                    return Some(outcome);
                }
            }
            ctx = parent;
        }
        None
    }

    fn rewrite(&mut self, node: NodeId, ctx: CtxId) -> NodeId {
        if let Some(&done) = self.memo.get(&(node, ctx)) {
            return done;
        }
        let result = match self.raw.node(node) {
            DagNode::Leaf(label) => self.out.leaf(label),
            DagNode::Bind {
                variable,
                designation,
                temp,
                next,
            } => {
                let next = self.rewrite(next, ctx);
                self.out.intern(DagNode::Bind {
                    variable,
                    designation,
                    temp,
                    next,
                })
            }
            DagNode::Eval { input, op, next } => {
                if self.has_ran(ctx, input, op) {
                    self.rewrite(next, ctx)
                } else {
                    let inner = self.push(ctx, Fact::Ran(input, op));
                    let next = self.rewrite(next, inner);
                    self.out.intern(DagNode::Eval { input, op, next })
                }
            }
            DagNode::Test {
                test: DagTest::Never,
                when_false,
                ..
            } => self.rewrite(when_false, ctx),
            DagNode::Test {
                input,
                test,
                when_true,
                when_false,
            } => match self.decided(ctx, input, test) {
                Some(true) => self.rewrite(when_true, ctx),
                Some(false) => self.rewrite(when_false, ctx),
                None => {
                    let true_ctx = self.push(ctx, Fact::Decided(input, test, true));
                    let new_true = self.rewrite(when_true, true_ctx);
                    let false_ctx = self.push(ctx, Fact::Decided(input, test, false));
                    let new_false = self.rewrite(when_false, false_ctx);
                    // A guard with equal branches still runs: its
                    // evaluation can be observed (it may diverge).
                    if new_true == new_false && !matches!(test, DagTest::Guard(_)) {
                        new_true
                    } else {
                        self.out.intern(DagNode::Test {
                            input,
                            test,
                            when_true: new_true,
                            when_false: new_false,
                        })
                    }
                }
            },
        };
        self.memo.insert((node, ctx), result);
        result
    }
}

// Tests

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]

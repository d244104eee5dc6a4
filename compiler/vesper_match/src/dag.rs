//! Decision-DAG node arena.
//!
//! Nodes are immutable and hash-consed: [`DagArena::intern`] returns the
//! existing id for a structurally identical node, so clauses with common
//! suffixes share subgraphs for free and node equality is id equality.
//! Interning requires successors to exist before their predecessors, which
//! the builder satisfies by lowering clauses last-to-first and patterns
//! inside-out.
//!
//! The graph is acyclic by construction: a node can only reference ids
//! interned before it.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use vesper_ir::{ConstValue, GuardId, LabelId, RelOp, TypeId};

use crate::temps::{DagOp, TempId};
use crate::vars::{DesignationId, VarId};

/// Index of a node in a [`DagArena`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Create a new `NodeId` from a raw index.
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

impl std::fmt::Debug for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// A runtime predicate on a single temp.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DagTest {
    /// Runtime type test, `input is T`. Fails on `null`.
    Type(TypeId),
    /// `input != null`.
    NonNull,
    /// `input == null`.
    Null,
    /// Equality against a folded constant.
    Const(ConstValue),
    /// Ordered comparison against a folded constant.
    Relational(RelOp, ConstValue),
    /// Evaluate a clause's guard expression. Opaque to the compiler;
    /// each clause's guard has its own id, so the same guard never
    /// appears twice on one path.
    Guard(GuardId),
    /// Statically known to fail, e.g. `null` against a value type.
    /// The optimizer replaces it with its false branch; reachability
    /// analysis then reports the clause it came from.
    Never,
}

/// Where a path through the DAG ends.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LeafLabel {
    /// The clause with this label was selected.
    Clause(LabelId),
    /// No clause matched.
    Fail,
}

/// One decision-DAG node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DagNode {
    /// Branch on a predicate.
    Test {
        input: TempId,
        test: DagTest,
        when_true: NodeId,
        when_false: NodeId,
    },
    /// Perform an operation, defining its output temps, then continue.
    /// Evaluations cannot fail; failure is expressed by tests.
    Eval {
        input: TempId,
        op: DagOp,
        next: NodeId,
    },
    /// Record that a pattern variable receives the value of `temp`, then
    /// continue. `designation` identifies which textual binding site this
    /// is; one variable can have several.
    Bind {
        variable: VarId,
        designation: DesignationId,
        temp: TempId,
        next: NodeId,
    },
    /// Terminal.
    Leaf(LeafLabel),
}

impl DagNode {
    /// Successor ids in deterministic order (`when_true` first).
    pub fn successors(self) -> SmallVec<[NodeId; 2]> {
        match self {
            DagNode::Test {
                when_true,
                when_false,
                ..
            } => SmallVec::from_slice(&[when_true, when_false]),
            DagNode::Eval { next, .. } | DagNode::Bind { next, .. } => {
                SmallVec::from_slice(&[next])
            }
            DagNode::Leaf(_) => SmallVec::new(),
        }
    }
}

/// Hash-consing arena of DAG nodes.
#[derive(Default)]
pub struct DagArena {
    nodes: Vec<DagNode>,
    interned: FxHashMap<DagNode, NodeId>,
}

impl DagArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        DagArena::default()
    }

    /// Intern a node, returning the existing id for a structural duplicate.
    ///
    /// # Panics
    /// Panics if the arena exceeds `u32::MAX` nodes.
    pub fn intern(&mut self, node: DagNode) -> NodeId {
        if let Some(&id) = self.interned.get(&node) {
            return id;
        }
        let id = u32::try_from(self.nodes.len())
            .unwrap_or_else(|_| panic!("dag arena exceeded u32::MAX nodes"));
        let id = NodeId::new(id);
        self.nodes.push(node);
        self.interned.insert(node, id);
        id
    }

    /// Intern a leaf.
    pub fn leaf(&mut self, label: LeafLabel) -> NodeId {
        self.intern(DagNode::Leaf(label))
    }

    /// Look up a node.
    ///
    /// # Panics
    /// Panics on an id from a different arena.
    pub fn node(&self, id: NodeId) -> DagNode {
        *self
            .nodes
            .get(id.index())
            .unwrap_or_else(|| panic!("node id {id:?} out of range"))
    }

    /// Number of interned nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no nodes have been interned.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes reachable from `root` in DFS preorder, `when_true` before
    /// `when_false`. This is the order dumps number nodes in.
    pub fn preorder(&self, root: NodeId) -> Vec<NodeId> {
        let mut visited = vec![false; self.nodes.len()];
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if id.index() >= visited.len() || visited[id.index()] {
                continue;
            }
            visited[id.index()] = true;
            order.push(id);
            // Reversed so when_true pops first.
            for succ in self.node(id).successors().into_iter().rev() {
                if !visited[succ.index()] {
                    stack.push(succ);
                }
            }
        }
        order
    }

    /// Nodes reachable from `root` in DFS postorder.
    ///
    /// Iterative with an explicit stack to avoid recursion depth issues
    /// on long clause chains. Since the graph is acyclic, the reverse of
    /// this order is a topological order, which forward dataflow wants.
    pub fn postorder(&self, root: NodeId) -> Vec<NodeId> {
        let mut visited = vec![false; self.nodes.len()];
        let mut order = Vec::new();

        // Stack entries: (node, children_processed).
        // When children_processed is false, we push successors.
        // When true, we emit the node to postorder.
        let mut stack: Vec<(NodeId, bool)> = vec![(root, false)];

        while let Some(&mut (id, ref mut children_done)) = stack.last_mut() {
            if *children_done {
                order.push(id);
                stack.pop();
                continue;
            }
            *children_done = true;

            if id.index() >= visited.len() || visited[id.index()] {
                stack.pop();
                continue;
            }
            visited[id.index()] = true;

            for succ in self.node(id).successors().into_iter().rev() {
                if !visited[succ.index()] {
                    stack.push((succ, false));
                }
            }
        }
        order
    }
}

// Size assertions to prevent accidental regressions
#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::{DagTest, NodeId};
    vesper_ir::static_assert_size!(NodeId, 4);
    vesper_ir::static_assert_size!(DagTest, 24);
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]
mod tests {
    use vesper_ir::LabelId;

    use super::{DagArena, DagNode, DagTest, LeafLabel, NodeId};
    use crate::temps::TempId;

    fn test_node(when_true: NodeId, when_false: NodeId) -> DagNode {
        DagNode::Test {
            input: TempId::INPUT,
            test: DagTest::NonNull,
            when_true,
            when_false,
        }
    }

    #[test]
    fn interning_dedups_structural_duplicates() {
        let mut arena = DagArena::new();
        let fail = arena.leaf(LeafLabel::Fail);
        let ok = arena.leaf(LeafLabel::Clause(LabelId::new(0)));
        let a = arena.intern(test_node(ok, fail));
        let b = arena.intern(test_node(ok, fail));
        assert_eq!(a, b);
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn leaves_are_shared() {
        let mut arena = DagArena::new();
        let a = arena.leaf(LeafLabel::Fail);
        let b = arena.leaf(LeafLabel::Fail);
        assert_eq!(a, b);
    }

    #[test]
    fn preorder_visits_true_branch_first() {
        let mut arena = DagArena::new();
        let fail = arena.leaf(LeafLabel::Fail);
        let ok = arena.leaf(LeafLabel::Clause(LabelId::new(0)));
        let inner = arena.intern(test_node(ok, fail));
        let root = arena.intern(DagNode::Test {
            input: TempId::INPUT,
            test: DagTest::Null,
            when_true: fail,
            when_false: inner,
        });
        let order = arena.preorder(root);
        assert_eq!(order, vec![root, fail, inner, ok]);
    }

    #[test]
    fn postorder_reverse_is_topological() {
        let mut arena = DagArena::new();
        let fail = arena.leaf(LeafLabel::Fail);
        let ok = arena.leaf(LeafLabel::Clause(LabelId::new(0)));
        let inner = arena.intern(test_node(ok, fail));
        let root = arena.intern(DagNode::Test {
            input: TempId::INPUT,
            test: DagTest::Null,
            when_true: fail,
            when_false: inner,
        });
        let mut topo = arena.postorder(root);
        topo.reverse();
        let position = |id: NodeId| topo.iter().position(|&n| n == id).unwrap();
        assert!(position(root) < position(inner));
        assert!(position(inner) < position(ok));
        assert!(position(root) < position(fail));
        // Shared leaf appears exactly once.
        assert_eq!(topo.iter().filter(|&&n| n == fail).count(), 1);
    }
}

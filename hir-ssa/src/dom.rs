//! Dominator tree and block orders.
//!
//! Orders and immediate dominators come from `ssa_impls` over the
//! `cfg_traits` view of the graph. The tree is stamped with the graph
//! revision it was computed at; [`Graph::dominators`] refuses (in debug
//! builds) to hand out a tree the CFG has moved past. A pass that keeps
//! editing the CFG while it still wants the old answers clones the tree up
//! front and queries the clone.
//!
//! Two ways to bring things up to date:
//!
//! - [`Graph::build_dominator_tree`] recomputes orders, dominators, loops and
//!   try membership from scratch.
//! - [`Graph::compute_dominance_information`] recomputes orders, dominators
//!   and try membership, and only prunes deleted blocks out of the existing
//!   loop information. Use it when the edit cannot have changed loop shape.
use std::collections::BTreeMap;

use ssa_impls::dom::{dominates, domtree};

use crate::{BlockId, Graph, LoopInformation};

#[derive(Clone, Debug, Default)]
pub struct DominatorTree {
    generation: Option<u64>,
    rpo: Vec<BlockId>,
    order: BTreeMap<BlockId, usize>,
    /// Keyed the way `ssa_impls` keys it; the entry has no entry.
    idom: BTreeMap<Option<BlockId>, BlockId>,
}
impl DominatorTree {
    pub fn compute(graph: &Graph) -> Self {
        let mut rpo = ssa_impls::cfg::postorder(graph);
        rpo.reverse();
        let order = rpo.iter().enumerate().map(|(i, b)| (*b, i)).collect();
        Self {
            generation: Some(graph.revision()),
            rpo,
            order,
            idom: domtree(graph),
        }
    }
    /// Graph revision this tree describes.
    pub fn generation(&self) -> Option<u64> {
        self.generation
    }
    pub fn is_reachable(&self, b: BlockId) -> bool {
        self.order.contains_key(&b)
    }
    /// `None` for the entry block and unreachable blocks.
    pub fn immediate_dominator(&self, b: BlockId) -> Option<BlockId> {
        self.idom.get(&Some(b)).copied()
    }
    /// Reflexive: every reachable block dominates itself.
    pub fn dominates(&self, a: BlockId, b: BlockId) -> bool {
        self.is_reachable(a) && dominates::<Graph>(&self.idom, Some(a), Some(b))
    }
    pub fn strictly_dominates(&self, a: BlockId, b: BlockId) -> bool {
        a != b && self.dominates(a, b)
    }
    pub fn reverse_post_order(&self) -> &[BlockId] {
        &self.rpo
    }
    pub fn post_order(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.rpo.iter().rev().copied()
    }
    /// Position in reverse post-order.
    pub fn rpo_index(&self, b: BlockId) -> Option<usize> {
        self.order.get(&b).copied()
    }
}

impl Graph {
    pub fn dominators(&self) -> &DominatorTree {
        debug_assert_eq!(
            self.dom.generation,
            Some(self.revision),
            "dominator tree queried after the CFG changed"
        );
        &self.dom
    }
    pub fn is_dominance_fresh(&self) -> bool {
        self.dom.generation == Some(self.revision)
    }
    pub fn loop_information(&self) -> &LoopInformation {
        debug_assert_eq!(
            self.loops.generation(),
            Some(self.revision),
            "loop information queried after the CFG changed"
        );
        &self.loops
    }
    pub fn has_irreducible_loops(&self) -> bool {
        self.loop_information().has_irreducible_loops()
    }
    /// Full rebuild: orders, dominators, loops and try membership.
    pub fn build_dominator_tree(&mut self) {
        self.dom = DominatorTree::compute(self);
        let loops = LoopInformation::compute(self, &self.dom);
        self.loops = loops;
        self.compute_try_block_information();
        tracing::trace!(revision = self.revision, "rebuilt dominator tree and loops");
    }
    /// Cheap update after edits that leave loop shape alone.
    pub fn compute_dominance_information(&mut self) {
        self.dom = DominatorTree::compute(self);
        let loops = std::mem::take(&mut self.loops).pruned(self);
        self.loops = loops;
        self.compute_try_block_information();
        tracing::trace!(revision = self.revision, "recomputed dominance");
    }
}

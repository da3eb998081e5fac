//! Natural loops.
//!
//! A back edge is an edge whose target dominates its source; the target is
//! the loop header and the body is everything that reaches the source
//! without passing through the header. A retreating edge of the depth-first
//! walk whose target does not dominate its source makes the graph
//! irreducible.
use std::collections::{BTreeMap, BTreeSet};

use crate::{BlockId, DominatorTree, Graph};

#[derive(Clone, Debug, Default)]
pub struct LoopInformation {
    generation: Option<u64>,
    /// Header to body; bodies include their header.
    bodies: BTreeMap<BlockId, BTreeSet<BlockId>>,
    irreducible: bool,
}
impl LoopInformation {
    pub fn compute(graph: &Graph, dom: &DominatorTree) -> Self {
        let mut bodies: BTreeMap<BlockId, BTreeSet<BlockId>> = BTreeMap::new();
        let mut irreducible = false;
        // true while on the stack, false once finished
        let mut state: BTreeMap<BlockId, bool> = BTreeMap::new();
        let mut stack = vec![(graph.entry, 0usize)];
        state.insert(graph.entry, true);
        while let Some(&(b, i)) = stack.last() {
            match graph.successor_at(b, i) {
                Some(s) => {
                    if let Some(top) = stack.last_mut() {
                        top.1 += 1;
                    }
                    match state.get(&s) {
                        None => {
                            state.insert(s, true);
                            stack.push((s, 0));
                        }
                        Some(true) if dom.dominates(s, b) => {
                            collect_body(graph, s, b, bodies.entry(s).or_default());
                        }
                        Some(true) => irreducible = true,
                        Some(false) => {}
                    }
                }
                None => {
                    state.insert(b, false);
                    stack.pop();
                }
            }
        }
        Self {
            generation: Some(graph.revision()),
            bodies,
            irreducible,
        }
    }
    pub fn generation(&self) -> Option<u64> {
        self.generation
    }
    pub fn has_irreducible_loops(&self) -> bool {
        self.irreducible
    }
    pub fn is_loop_header(&self, b: BlockId) -> bool {
        self.bodies.contains_key(&b)
    }
    pub fn is_in_loop(&self, b: BlockId) -> bool {
        self.bodies.values().any(|body| body.contains(&b))
    }
    pub fn headers(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.bodies.keys().copied()
    }
    pub fn body(&self, header: BlockId) -> Option<&BTreeSet<BlockId>> {
        self.bodies.get(&header)
    }
    /// Drops deleted blocks and re-stamps for the graph's current revision.
    pub(crate) fn pruned(mut self, graph: &Graph) -> Self {
        self.bodies.retain(|h, _| !graph.blocks[*h].removed);
        for body in self.bodies.values_mut() {
            body.retain(|b| !graph.blocks[*b].removed);
        }
        self.generation = Some(graph.revision());
        self
    }
}

fn collect_body(graph: &Graph, header: BlockId, latch: BlockId, body: &mut BTreeSet<BlockId>) {
    body.insert(header);
    let mut work = vec![latch];
    while let Some(b) = work.pop() {
        if body.insert(b) {
            work.extend(graph.blocks[b].preds.iter().copied());
        }
    }
}

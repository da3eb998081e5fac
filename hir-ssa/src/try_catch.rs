//! Try-region membership.
//!
//! Membership is not stored by the front end. It is recovered by walking the
//! blocks in reverse post-order and inheriting from the first predecessor
//! already visited, so a loop header never reads its own latch: a `TryBoundary` entry puts its successor inside that try, a
//! `TryBoundary` exit takes it out, and anything else passes membership on
//! unchanged. Catch blocks keep their own marking.
use crate::{BlockId, BoundaryKind, Graph, Term};

impl Graph {
    /// Requires a fresh dominator tree for the traversal order.
    pub fn compute_try_block_information(&mut self) {
        let rpo = self.dominators().reverse_post_order().to_vec();
        for b in rpo.iter() {
            self.blocks[*b].try_entry = None;
        }
        for &b in rpo.iter().skip(1) {
            if self.blocks[b].is_catch {
                continue;
            }
            let dom = self.dominators();
            let here = dom.rpo_index(b);
            let Some(&p) = self.blocks[b]
                .preds
                .iter()
                .find(|p| dom.rpo_index(**p).is_some_and(|i| Some(i) < here))
            else {
                continue;
            };
            let entry = match &self.blocks[p].end {
                Term::TryBoundary {
                    kind: BoundaryKind::Entry,
                    ..
                } => Some(p),
                Term::TryBoundary {
                    kind: BoundaryKind::Exit,
                    ..
                } => None,
                _ => self.blocks[p].try_entry,
            };
            self.blocks[b].try_entry = entry;
        }
    }
    pub fn is_try_block(&self, b: BlockId) -> bool {
        self.blocks[b].try_entry.is_some()
    }
    pub fn is_catch_block(&self, b: BlockId) -> bool {
        self.blocks[b].is_catch
    }
    /// Handlers of the `TryBoundary` ending `b`; empty for other terminators.
    pub fn exception_handlers(&self, b: BlockId) -> &[BlockId] {
        match &self.blocks[b].end {
            Term::TryBoundary { handlers, .. } => handlers,
            _ => &[],
        }
    }
    /// Both blocks end in `TryBoundary`s with the same handlers, in order.
    pub fn has_same_exception_handlers(&self, a: BlockId, b: BlockId) -> bool {
        matches!(self.blocks[a].end, Term::TryBoundary { .. })
            && matches!(self.blocks[b].end, Term::TryBoundary { .. })
            && self.exception_handlers(a) == self.exception_handlers(b)
    }
}

//! Edit primitives.
//!
//! Every method here keeps def-use lists, predecessor lists and phi inputs
//! consistent with each other. Methods that change the CFG bump the graph
//! revision, which makes the dominator tree and loop information stale until
//! one of the recompute entry points in [`crate::dom`] runs.
use std::collections::BTreeSet;
use std::mem::take;

use crate::{BasicBlock, BlockId, DataType, Graph, InstId, InstKind, Literal, Term, Use, User};

impl Graph {
    pub(crate) fn add_use(&mut self, producer: InstId, user: User, index: usize) {
        self.insts[producer].uses.push(Use { user, index });
    }
    pub(crate) fn remove_use(&mut self, producer: InstId, user: User, index: usize) {
        let uses = &mut self.insts[producer].uses;
        if let Some(p) = uses.iter().position(|u| u.user == user && u.index == index) {
            uses.swap_remove(p);
        }
    }
    fn input_slot(&mut self, user: User, index: usize) -> Option<&mut InstId> {
        match user {
            User::Inst(i) => self.insts[i].kind.inputs_mut().nth(index),
            User::Term(b) => self.blocks[b].end.inputs_mut().nth(index),
        }
    }
    fn release_inputs(&mut self, user: User) {
        let inputs: Vec<InstId> = match user {
            User::Inst(i) => self.insts[i].kind.inputs().copied().collect(),
            User::Term(b) => self.blocks[b].end.inputs().copied().collect(),
        };
        for (index, x) in inputs.into_iter().enumerate() {
            self.remove_use(x, user, index);
        }
    }

    /// Points input `index` of `user` at `new`.
    pub fn replace_input(&mut self, user: User, index: usize, new: InstId) {
        let Some(slot) = self.input_slot(user, index) else {
            return;
        };
        let old = std::mem::replace(slot, new);
        self.remove_use(old, user, index);
        self.add_use(new, user, index);
    }
    /// Moves every use of `old` over to `new`; returns how many moved.
    pub fn replace_uses_with(&mut self, old: InstId, new: InstId) -> usize {
        if old == new {
            return 0;
        }
        let uses = take(&mut self.insts[old].uses);
        for u in uses.iter() {
            if let Some(slot) = self.input_slot(u.user, u.index) {
                *slot = new;
            }
        }
        let n = uses.len();
        self.insts[new].uses.extend(uses);
        n
    }
    /// Replaces the uses of `value` that sit in blocks dominated by `block`
    /// with `replacement`. A phi use counts as sitting at the end of the
    /// matching predecessor. Returns how many uses were replaced.
    pub fn replace_uses_dominated_by(
        &mut self,
        value: InstId,
        block: BlockId,
        replacement: InstId,
    ) -> usize {
        let hits: Vec<Use> = {
            let dom = self.dominators();
            self.insts[value]
                .uses
                .iter()
                .filter(|u| {
                    let site = match u.user {
                        User::Term(b) => Some(b),
                        User::Inst(i) => {
                            let inst = &self.insts[i];
                            match inst.block {
                                Some(b) if inst.kind.is_phi() && !self.blocks[b].is_catch => {
                                    self.blocks[b].preds.get(u.index).copied()
                                }
                                b => b,
                            }
                        }
                    };
                    site.is_some_and(|s| dom.dominates(block, s))
                })
                .copied()
                .collect()
        };
        for u in hits.iter() {
            self.replace_input(u.user, u.index, replacement);
        }
        hits.len()
    }

    pub fn is_dead_and_removable(&self, i: InstId) -> bool {
        let inst = &self.insts[i];
        inst.uses.is_empty() && inst.is_removable()
    }
    /// Unlinks `i` from its block and from its inputs' use lists. The
    /// instruction must be unused.
    pub fn remove_instruction(&mut self, i: InstId) {
        debug_assert!(
            self.insts[i].uses.is_empty(),
            "removing i{} while it still has uses",
            i.index()
        );
        self.release_inputs(User::Inst(i));
        if let Some(b) = self.insts[i].block.take() {
            let blk = &mut self.blocks[b];
            blk.phis.retain(|a| *a != i);
            blk.insts.retain(|a| *a != i);
        }
        if let InstKind::Constant(lit) = self.insts[i].kind {
            if self.constants.get(&lit) == Some(&i) {
                self.constants.remove(&lit);
            }
        }
    }
    /// Drops input `index` of a phi, renumbering the later inputs' uses.
    pub fn remove_phi_input(&mut self, phi: InstId, index: usize) {
        let inputs = self.phi_inputs(phi).to_vec();
        let Some(&gone) = inputs.get(index) else {
            return;
        };
        self.remove_use(gone, User::Inst(phi), index);
        for (j, x) in inputs.iter().enumerate().skip(index + 1) {
            if let Some(u) = self.insts[*x]
                .uses
                .iter_mut()
                .find(|u| u.user == User::Inst(phi) && u.index == j)
            {
                u.index = j - 1;
            }
        }
        if let InstKind::Phi { inputs } = &mut self.insts[phi].kind {
            inputs.remove(index);
        }
    }

    /// Removes predecessor `index` of `b` together with the matching input
    /// of every phi in `b`.
    pub fn remove_predecessor_at(&mut self, b: BlockId, index: usize) {
        self.blocks[b].preds.remove(index);
        if !self.blocks[b].is_catch {
            for phi in self.blocks[b].phis.clone() {
                self.remove_phi_input(phi, index);
            }
        }
        self.invalidate();
    }
    /// Drops one `from -> to` entry from `to`'s predecessors.
    fn unlink(&mut self, from: BlockId, to: BlockId) {
        if let Some(index) = self.blocks[to].preds.iter().position(|p| *p == from) {
            self.remove_predecessor_at(to, index);
        }
    }
    /// Retargets the first edge `b -> old` to `new`. `new` gains `b` as its
    /// last predecessor, so it must not have phis.
    pub fn replace_successor(&mut self, b: BlockId, old: BlockId, new: BlockId) {
        debug_assert!(self.blocks[new].phis.is_empty());
        let Some(t) = self.blocks[b].end.targets_mut().find(|t| **t == old) else {
            return;
        };
        *t = new;
        self.unlink(b, old);
        self.blocks[new].preds.push(b);
        self.invalidate();
    }
    /// Retargets the edge from predecessor `index` of `b` to `new`.
    pub fn redirect_edge(&mut self, b: BlockId, index: usize, new: BlockId) {
        debug_assert!(self.blocks[new].phis.is_empty());
        let p = self.blocks[b].preds[index];
        if let Some(t) = self.blocks[p].end.targets_mut().find(|t| **t == b) {
            *t = new;
        }
        self.remove_predecessor_at(b, index);
        self.blocks[new].preds.push(p);
        self.invalidate();
    }
    /// Turns a branch of `b` into `goto keep`, dropping every other edge.
    /// The kept edge stays in place in `keep`'s predecessors.
    pub fn fold_branch(&mut self, b: BlockId, keep: BlockId) {
        self.release_inputs(User::Term(b));
        let old = take(&mut self.blocks[b].end);
        let mut kept = false;
        for t in old.targets().copied().collect::<Vec<_>>() {
            if t == keep && !kept {
                kept = true;
            } else {
                self.unlink(b, t);
            }
        }
        debug_assert!(kept, "B{} does not branch to B{}", b.index(), keep.index());
        self.blocks[b].end = Term::Goto(keep);
        self.invalidate();
    }
    /// Turns a `TryBoundary` into a `goto` to its normal successor and
    /// returns the handlers it was connected to.
    pub fn boundary_to_goto(&mut self, b: BlockId) -> Vec<BlockId> {
        let Term::TryBoundary { next, handlers, .. } = &self.blocks[b].end else {
            return vec![];
        };
        let (next, handlers) = (*next, handlers.clone());
        for h in handlers.iter() {
            self.unlink(b, *h);
        }
        self.blocks[b].end = Term::Goto(next);
        self.invalidate();
        handlers
    }

    /// Appends the body of `succ` to `b`. Requires `b` to end in
    /// `goto succ` and to be its only predecessor.
    pub fn merge_with(&mut self, b: BlockId, succ: BlockId) {
        debug_assert!(matches!(self.blocks[b].end, Term::Goto(s) if s == succ));
        debug_assert_eq!(self.blocks[succ].preds, [b]);
        while let Some(&phi) = self.blocks[succ].phis.first() {
            if let Some(&v) = self.phi_inputs(phi).first() {
                self.replace_uses_with(phi, v);
            }
            self.remove_instruction(phi);
        }
        self.blocks[succ].preds.clear();
        let insts = take(&mut self.blocks[succ].insts);
        for i in insts.iter() {
            self.insts[*i].block = Some(b);
        }
        self.blocks[b].insts.extend(insts);
        let end = take(&mut self.blocks[succ].end);
        for (index, x) in end.inputs().copied().enumerate().collect::<Vec<_>>() {
            if let Some(u) = self.insts[x]
                .uses
                .iter_mut()
                .find(|u| u.user == User::Term(succ) && u.index == index)
            {
                u.user = User::Term(b);
            }
        }
        for t in end.targets().copied().collect::<Vec<_>>() {
            for p in self.blocks[t].preds.iter_mut() {
                if *p == succ {
                    *p = b;
                }
            }
        }
        self.blocks[b].end = end;
        self.blocks[succ].removed = true;
        self.invalidate();
    }

    /// Deletes a set of blocks that no live block branches to. Edges into
    /// surviving blocks are removed along with the matching phi inputs.
    /// Returns the number of instructions (phis included) deleted.
    pub fn disconnect_and_delete(&mut self, dead: &BTreeSet<BlockId>) -> usize {
        for &b in dead.iter() {
            for t in self.successors(b) {
                if !dead.contains(&t) {
                    self.unlink(b, t);
                }
            }
        }
        let mut removed = 0;
        for &b in dead.iter() {
            self.release_inputs(User::Term(b));
            let blk = &self.blocks[b];
            let all: Vec<InstId> = blk.phis.iter().chain(blk.insts.iter()).copied().collect();
            for i in all.iter() {
                self.release_inputs(User::Inst(*i));
            }
            removed += all.len();
        }
        for &b in dead.iter() {
            let blk = &mut self.blocks[b];
            let all: Vec<InstId> = take(&mut blk.phis)
                .into_iter()
                .chain(take(&mut blk.insts))
                .collect();
            blk.end = Term::Default;
            blk.preds.clear();
            blk.try_entry = None;
            blk.removed = true;
            for i in all {
                debug_assert!(
                    self.insts[i]
                        .uses
                        .iter()
                        .all(|u| self.user_block(u.user).is_none_or(|ub| dead.contains(&ub))),
                    "i{} is still used outside the deleted blocks",
                    i.index()
                );
                self.insts[i].block = None;
                self.insts[i].uses.clear();
                if let InstKind::Constant(lit) = self.insts[i].kind {
                    if self.constants.get(&lit) == Some(&i) {
                        self.constants.remove(&lit);
                    }
                }
            }
            if self.exit == Some(b) {
                self.exit = None;
            }
        }
        self.invalidate();
        removed
    }
    /// Block holding `user`, if it is placed.
    pub fn user_block(&self, user: User) -> Option<BlockId> {
        match user {
            User::Inst(i) => self.insts[i].block,
            User::Term(b) => Some(b),
        }
    }

    /// Inserts an empty block on every normal-flow edge from a block with
    /// several successors to a block with several predecessors. Edges into
    /// catch blocks and the exit block are left alone. Returns the number of
    /// blocks inserted.
    pub fn split_critical_edges(&mut self) -> usize {
        let mut n = 0;
        for b in self.live_blocks().collect::<Vec<_>>() {
            if self.blocks[b].end.targets().count() < 2 {
                continue;
            }
            for pos in 0..self.blocks[b].end.normal_target_count() {
                let Some(t) = self.successor_at(b, pos) else {
                    continue;
                };
                if self.blocks[t].preds.len() < 2 || self.blocks[t].is_catch || self.is_exit(t) {
                    continue;
                }
                let mid = self.blocks.alloc(BasicBlock {
                    end: Term::Goto(t),
                    preds: vec![b],
                    ..Default::default()
                });
                if let Some(slot) = self.blocks[b].end.targets_mut().nth(pos) {
                    *slot = mid;
                }
                if let Some(slot) = self.blocks[t].preds.iter_mut().find(|p| **p == b) {
                    *slot = mid;
                }
                n += 1;
            }
        }
        if n != 0 {
            self.invalidate();
        }
        n
    }

    /// Live interned constant for `lit`, without creating one.
    pub fn find_constant(&self, lit: Literal) -> Option<InstId> {
        self.constants
            .get(&lit)
            .copied()
            .filter(|i| self.is_live(*i))
    }
    /// Interned constant, created at the start of the entry block on first
    /// request.
    pub fn constant(&mut self, lit: Literal) -> InstId {
        if let Some(&i) = self.constants.get(&lit) {
            if self.is_live(i) {
                return i;
            }
        }
        let i = self
            .insts
            .alloc(crate::Instruction::new(InstKind::Constant(lit), lit.ty()));
        self.insts[i].block = Some(self.entry);
        self.blocks[self.entry].insts.insert(0, i);
        self.constants.insert(lit, i);
        i
    }
    pub fn int_constant(&mut self, v: i32) -> InstId {
        self.constant(Literal::Int(v))
    }
    pub fn long_constant(&mut self, v: i64) -> InstId {
        self.constant(Literal::Long(v))
    }
    pub fn float_constant(&mut self, v: f32) -> InstId {
        self.constant(Literal::float(v))
    }
    pub fn double_constant(&mut self, v: f64) -> InstId {
        self.constant(Literal::double(v))
    }
    pub fn null_constant(&mut self) -> InstId {
        self.constant(Literal::Null)
    }
    /// Constant of `ty` holding `value`; see [`Literal::of_type`].
    pub fn constant_of_type(&mut self, ty: DataType, value: i64) -> InstId {
        self.constant(Literal::of_type(ty, value))
    }
}

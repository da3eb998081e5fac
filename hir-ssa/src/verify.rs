//! Structural checker.
//!
//! Checks that predecessor and successor lists mirror each other, that phis
//! have one input per predecessor, and that def-use lists agree with
//! instruction inputs in both directions. When the dominator tree is current
//! it also checks reachability and that definitions dominate their uses.
use anyhow::{Context, bail, ensure};

use crate::{BlockId, Graph, InstId, InstKind, Term, User};

impl Graph {
    pub fn verify(&self) -> anyhow::Result<()> {
        ensure!(!self.blocks[self.entry].removed, "entry block was removed");
        for b in self.live_blocks() {
            self.verify_block(b)
                .with_context(|| format!("in block B{}", b.index()))?;
        }
        for (lit, i) in self.constants().iter() {
            if self.is_live(*i) {
                ensure!(
                    self.insts[*i].kind == InstKind::Constant(*lit),
                    "constant table entry {lit:?} points at i{}",
                    i.index()
                );
            }
        }
        Ok(())
    }
    fn verify_block(&self, b: BlockId) -> anyhow::Result<()> {
        let blk = &self.blocks[b];
        match (&blk.end, self.is_exit(b)) {
            (Term::Default, _) => bail!("block has no terminator"),
            (Term::Exit, false) => bail!("Exit terminator outside the exit block"),
            (Term::Exit, true) => {}
            (_, true) => bail!("exit block must end in Exit"),
            _ => {}
        }
        let succs = self.successors(b);
        for t in succs.iter() {
            ensure!(!self.blocks[*t].removed, "successor B{} was removed", t.index());
            let edges = succs.iter().filter(|s| *s == t).count();
            let back = self.blocks[*t].preds.iter().filter(|p| **p == b).count();
            ensure!(
                edges == back,
                "{edges} edge(s) to B{} but listed {back} time(s) among its predecessors",
                t.index()
            );
        }
        for p in blk.preds.iter() {
            ensure!(!self.blocks[*p].removed, "predecessor B{} was removed", p.index());
            ensure!(
                self.successors(*p).contains(&b),
                "predecessor B{} does not branch here",
                p.index()
            );
        }
        if let Term::TryBoundary { handlers, .. } = &blk.end {
            for h in handlers.iter() {
                ensure!(self.blocks[*h].is_catch, "handler B{} is not a catch block", h.index());
            }
        }
        for phi in blk.phis.iter() {
            let inst = &self.insts[*phi];
            ensure!(inst.kind.is_phi(), "i{} in the phi list is not a phi", phi.index());
            ensure!(inst.block == Some(b), "phi i{} is not placed here", phi.index());
            if !blk.is_catch {
                ensure!(
                    self.phi_inputs(*phi).len() == blk.preds.len(),
                    "phi i{} has {} inputs for {} predecessors",
                    phi.index(),
                    self.phi_inputs(*phi).len(),
                    blk.preds.len()
                );
            }
        }
        for i in blk.insts.iter() {
            let inst = &self.insts[*i];
            ensure!(!inst.kind.is_phi(), "phi i{} among instructions", i.index());
            ensure!(inst.block == Some(b), "i{} is not placed here", i.index());
        }
        for i in blk.phis.iter().chain(blk.insts.iter()) {
            self.verify_uses(*i)
                .with_context(|| format!("uses of i{}", i.index()))?;
            self.verify_inputs(User::Inst(*i))
                .with_context(|| format!("inputs of i{}", i.index()))?;
        }
        self.verify_inputs(User::Term(b))
            .context("inputs of the terminator")?;
        if self.is_dominance_fresh() {
            ensure!(
                self.dominators().is_reachable(b),
                "block is unreachable from the entry"
            );
        }
        Ok(())
    }
    fn verify_uses(&self, i: InstId) -> anyhow::Result<()> {
        for u in self.insts[i].uses.iter() {
            if let User::Inst(user) = u.user {
                ensure!(self.is_live(user), "used by removed i{}", user.index());
            }
            ensure!(
                self.input(u.user, u.index) == Some(i),
                "use {:?} slot {} does not point back",
                u.user,
                u.index
            );
        }
        Ok(())
    }
    fn verify_inputs(&self, user: User) -> anyhow::Result<()> {
        let inputs: Vec<InstId> = match user {
            User::Inst(i) => self.insts[i].kind.inputs().copied().collect(),
            User::Term(b) => self.blocks[b].end.inputs().copied().collect(),
        };
        for (index, x) in inputs.into_iter().enumerate() {
            ensure!(self.is_live(x), "input {index} is removed i{}", x.index());
            let recorded = self.insts[x]
                .uses
                .iter()
                .filter(|u| u.user == user && u.index == index)
                .count();
            ensure!(
                recorded == 1,
                "input {index} (i{}) records this use {recorded} time(s)",
                x.index()
            );
            if self.is_dominance_fresh() {
                self.verify_dominates(x, user, index)
                    .with_context(|| format!("input {index}"))?;
            }
        }
        Ok(())
    }
    fn verify_dominates(&self, def: InstId, user: User, index: usize) -> anyhow::Result<()> {
        let Some(def_block) = self.insts[def].block else {
            bail!("definition is not placed");
        };
        let dom = self.dominators();
        let ok = match user {
            User::Term(b) => dom.dominates(def_block, b),
            User::Inst(u) => {
                let Some(use_block) = self.insts[u].block else {
                    return Ok(());
                };
                let ub = &self.blocks[use_block];
                if self.insts[u].kind.is_phi() {
                    if ub.is_catch {
                        return Ok(());
                    }
                    ub.preds
                        .get(index)
                        .is_some_and(|p| dom.dominates(def_block, *p))
                } else if def_block == use_block {
                    self.insts[def].kind.is_phi()
                        || ub.insts.iter().position(|a| *a == def)
                            < ub.insts.iter().position(|a| *a == u)
                } else {
                    dom.dominates(def_block, use_block)
                }
            }
        };
        ensure!(ok, "i{} does not dominate its use", def.index());
        Ok(())
    }
}

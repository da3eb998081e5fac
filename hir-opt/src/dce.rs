//! Dead code elimination.
//!
//! Runs, in order: merging of straight-line blocks, redirection of blocks
//! that end in an always-throwing call, if-chain threading, removal of
//! unreachable blocks and removal of try regions nothing in them can throw
//! out of. Those CFG phases are skipped entirely on graphs with irreducible
//! loops. Redundant phis and unused side-effect-free instructions are
//! swept last in every case.
//!
//! Each CFG phase leaves the dominator tree current. Phases that edit the
//! CFG while still iterating take a snapshot of the tree (and of the loop
//! information) up front and answer their questions from it.
use std::collections::{BTreeMap, BTreeSet};

use hir_ssa::{
    BlockId, DominatorTree, Graph, InstFlags, InstId, InstKind, Literal, LoopInformation, Term,
    User,
};
use sable_common::{DataType, IfCondition, MethodCompilationStat};
use tracing::{debug, debug_span, trace};

use crate::{
    CompilerStats, OptFlags, Optimization, OptimizerCfg,
    eval::{evaluate_condition_of, try_static_evaluation},
    maybe_record_stat,
    phi_elim::eliminate_redundant_phis,
};

pub struct DeadCodeElimination<'a> {
    cfg: &'a OptimizerCfg,
    stats: Option<&'a mut CompilerStats>,
}

/// Blocks covered by one logical try.
#[derive(Default)]
struct TryBelonging {
    blocks: BTreeSet<BlockId>,
    /// Other entries with the same handlers.
    coalesced: Vec<BlockId>,
}

/// The successor a branch on a constant will take, if it is one.
fn constant_branch_target(graph: &Graph, b: BlockId) -> Option<BlockId> {
    match &graph.blocks[b].end {
        Term::If {
            cond,
            if_true,
            if_false,
        } => match graph.int_value(*cond)? {
            0 => Some(*if_false),
            _ => Some(*if_true),
        },
        Term::PackedSwitch {
            input,
            start,
            targets,
            default,
        } => {
            // out-of-range values wrap around and land on the default
            let index = (graph.int_value(*input)? as u32).wrapping_sub(*start as u32) as usize;
            Some(*targets.get(index).unwrap_or(default))
        }
        _ => None,
    }
}

fn mark_reachable_blocks(graph: &Graph) -> BTreeSet<BlockId> {
    let mut visited = BTreeSet::from([graph.entry]);
    let mut work = vec![graph.entry];
    while let Some(b) = work.pop() {
        let live = match constant_branch_target(graph, b) {
            Some(t) => vec![t],
            None => graph.successors(b),
        };
        for s in live {
            if visited.insert(s) {
                work.push(s);
            }
        }
    }
    visited
}

/// Null checks of `obj` that become redundant once `throws`, reached from
/// `block` only when `obj` is null, no longer rejoins normal flow.
fn remove_non_null_control_dependences(
    graph: &mut Graph,
    dom: &DominatorTree,
    block: BlockId,
    throws: BlockId,
) -> bool {
    let Term::If {
        cond,
        if_true,
        if_false,
    } = graph.blocks[block].end
    else {
        return false;
    };
    let InstKind::Condition {
        cond: test,
        left,
        right,
        ..
    } = graph.insts[cond].kind
    else {
        return false;
    };
    let not_throws = match test {
        IfCondition::Eq if throws == if_true => if_false,
        IfCondition::Ne if throws == if_false => if_true,
        _ => return false,
    };
    let obj = if graph.is_null_constant(right) {
        left
    } else if graph.is_null_constant(left) {
        right
    } else {
        return false;
    };
    let checks: BTreeSet<InstId> = graph
        .uses(obj)
        .iter()
        .filter_map(|u| match u.user {
            User::Inst(i) if matches!(graph.insts[i].kind, InstKind::NullCheck { .. }) => Some(i),
            _ => None,
        })
        .filter(|i| {
            graph.insts[*i]
                .block
                .is_some_and(|ub| ub != block && ub != throws && dom.dominates(block, ub))
        })
        .collect();
    if checks.is_empty() {
        return false;
    }
    let ty = graph.insts[obj].ty;
    let bound = graph.create_instruction(InstKind::BoundType { input: obj }, ty, InstFlags::empty());
    graph.insert_at_start(not_throws, bound);
    for c in checks {
        trace!(check = c.index(), bound = bound.index(), "null check made redundant");
        graph.replace_uses_with(c, bound);
        graph.remove_instruction(c);
    }
    true
}

impl<'a> DeadCodeElimination<'a> {
    pub fn new(cfg: &'a OptimizerCfg, stats: Option<&'a mut CompilerStats>) -> Self {
        Self { cfg, stats }
    }
    fn enabled(&self, flag: OptFlags) -> bool {
        self.cfg.flags.contains(flag)
    }

    /// Merges each block ending in `goto s` with `s` when it is the only way
    /// into `s`, repeating on the grown block.
    pub fn connect_successive_blocks(&mut self, graph: &mut Graph) -> bool {
        let rpo = graph.dominators().reverse_post_order().to_vec();
        let mut merged = 0;
        for &b in rpo.iter().skip(1) {
            while !graph.blocks[b].removed {
                let Term::Goto(s) = graph.blocks[b].end else {
                    break;
                };
                if s == b
                    || graph.is_exit(s)
                    || graph.blocks[s].is_catch
                    || graph.predecessors(s).len() != 1
                {
                    break;
                }
                graph.merge_with(b, s);
                merged += 1;
            }
        }
        if merged == 0 {
            return false;
        }
        trace!(merged, "connected successive blocks");
        graph.compute_dominance_information();
        true
    }

    /// Sends a block that ends in an always-throwing instruction and then
    /// rejoins normal flow straight to the exit block instead.
    pub fn simplify_always_throws(&mut self, graph: &mut Graph) -> bool {
        let Some(exit) = graph.exit else {
            return false;
        };
        let dom = graph.dominators().clone();
        let mut changed = false;
        for &b in dom.reverse_post_order() {
            let blk = &graph.blocks[b];
            // a throw inside a try goes to a handler, not to the exit
            if blk.removed || blk.is_catch || blk.try_entry.is_some() {
                continue;
            }
            let Some(&last) = blk.insts.last() else {
                continue;
            };
            let Term::Goto(succ) = blk.end else {
                continue;
            };
            if !graph.insts[last].always_throws() || !blk.phis.is_empty() || blk.preds.len() != 1
            {
                continue;
            }
            let pred = blk.preds[0];
            if succ == exit
                || dom.dominates(b, pred)
                || !dom.dominates(pred, succ)
                || graph.predecessors(succ).len() < 2
                || !graph.blocks[succ].phis.is_empty()
            {
                continue;
            }
            graph.replace_successor(b, succ, exit);
            changed = true;
            trace!(block = b.index(), "always-throwing block now exits");
            maybe_record_stat(&mut self.stats, MethodCompilationStat::SimplifyThrowingInvoke, 1);
            if remove_non_null_control_dependences(graph, &dom, pred, b) {
                maybe_record_stat(&mut self.stats, MethodCompilationStat::RemovedNullCheck, 1);
            }
        }
        if changed {
            graph.build_dominator_tree();
        }
        changed
    }

    /// Gives an `if` that repeats the test of its immediate dominator a
    /// phi of the outcomes each predecessor already implies.
    fn maybe_add_phi(&mut self, graph: &mut Graph, dom: &DominatorTree, b: BlockId) -> bool {
        let Term::If { cond: input, .. } = graph.blocks[b].end else {
            return false;
        };
        if graph.is_constant(input)
            || graph.predecessors(b).len() < 2
            || !graph.blocks[b].phis.is_empty()
        {
            return false;
        }
        let Some(d) = dom.immediate_dominator(b) else {
            return false;
        };
        let Term::If {
            cond: dom_input,
            if_true: dom_true,
            if_false: dom_false,
        } = graph.blocks[d].end
        else {
            return false;
        };
        let same_input = dom_input == input;
        if !same_input {
            let (
                InstKind::Condition {
                    cond: c,
                    left,
                    right,
                    ..
                },
                InstKind::Condition {
                    cond: dc,
                    left: dl,
                    right: dr,
                    ..
                },
            ) = (&graph.insts[input].kind, &graph.insts[dom_input].kind)
            else {
                return false;
            };
            if left != dl
                || right != dr
                || c.opposite() != *dc
                || graph.insts[*left].ty.is_floating_point()
            {
                return false;
            }
        }
        if graph
            .successors(b)
            .iter()
            .any(|s| graph.predecessors(*s).len() != 1)
        {
            return false;
        }
        let mut outcomes = vec![];
        for &p in graph.predecessors(b) {
            let from_true = dom.dominates(dom_true, p);
            let from_false = dom.dominates(dom_false, p);
            outcomes.push(if from_true == from_false {
                // reachable from both arms, decide at run time
                if !same_input {
                    return false;
                }
                None
            } else {
                Some(same_input == from_true)
            });
        }
        if outcomes.iter().all(Option::is_none) {
            return false;
        }
        let inputs: Vec<InstId> = outcomes
            .into_iter()
            .map(|o| match o {
                Some(v) => graph.constant(Literal::bool(v)),
                None => input,
            })
            .collect();
        let phi = graph.create_instruction(InstKind::Phi { inputs }, DataType::Bool, InstFlags::empty());
        graph.append(b, phi);
        graph.replace_input(User::Term(b), 0, phi);
        if graph.is_dead_and_removable(input) {
            graph.remove_instruction(input);
        }
        trace!(block = b.index(), dominator = d.index(), "added phi for repeated if");
        maybe_record_stat(&mut self.stats, MethodCompilationStat::SimplifyIfAddedPhi, 1);
        true
    }

    /// Threads predecessors of an `if` on a phi straight to the arm their
    /// phi input selects.
    pub fn simplify_ifs(&mut self, graph: &mut Graph) -> bool {
        let dom = graph.dominators().clone();
        let loops = graph.loop_information().clone();
        // post-order lets a whole chain of ifs gain phis off one tree
        let order: Vec<BlockId> = dom.post_order().collect();
        let mut simplified = false;
        let mut rerun = false;
        for b in order {
            if graph.blocks[b].removed || graph.blocks[b].is_catch {
                continue;
            }
            let Term::If { .. } = graph.blocks[b].end else {
                continue;
            };
            // threading into a loop header could make the loop irreducible
            if loops.is_loop_header(b) {
                continue;
            }
            if self.enabled(OptFlags::ADD_PHI_FOR_IFS) {
                self.maybe_add_phi(graph, &dom, b);
            }
            let Term::If {
                cond,
                if_true,
                if_false,
            } = graph.blocks[b].end
            else {
                continue;
            };
            let blk = &graph.blocks[b];
            let [phi] = blk.phis[..] else {
                continue;
            };
            if graph.uses(phi).len() != 1 {
                continue;
            }
            let only_phi_and_if = blk.insts.is_empty() && cond == phi;
            let condition = match blk.insts[..] {
                [c] if !only_phi_and_if && c == cond && graph.uses(c).len() == 1 => {
                    match graph.insts[c].kind {
                        InstKind::Condition {
                            cond: test,
                            left,
                            right,
                            bias,
                        } if left == phi || right == phi => Some((test, left, right, bias)),
                        _ => None,
                    }
                }
                _ => None,
            };
            if !only_phi_and_if && condition.is_none() {
                continue;
            }

            let mut redirected = false;
            let mut i = 0;
            while i < graph.phi_inputs(phi).len() {
                let input = graph.phi_inputs(phi)[i];
                let value = match condition {
                    None => match graph.int_value(input) {
                        Some(0) => Some(false),
                        Some(1) => Some(true),
                        _ => None,
                    },
                    Some((test, left, right, bias)) if left == phi => {
                        evaluate_condition_of(graph, test, bias, input, right)
                    }
                    Some((test, left, _, bias)) => {
                        evaluate_condition_of(graph, test, bias, left, input)
                    }
                };
                let Some(value) = value else {
                    i += 1;
                    continue;
                };
                let target = if value { if_true } else { if_false };
                if !graph.blocks[target].phis.is_empty() {
                    i += 1;
                    continue;
                }
                trace!(
                    block = b.index(),
                    pred = graph.predecessors(b)[i].index(),
                    target = target.index(),
                    "threaded edge past if"
                );
                graph.redirect_edge(b, i, target);
                redirected = true;
                rerun |= loops.is_in_loop(b);
                // leave b reachable, dead block removal handles the rest
                if graph.phi_inputs(phi).len() == 1 {
                    break;
                }
            }
            if graph.predecessors(b).len() == 1 {
                let v = graph.phi_inputs(phi)[0];
                graph.replace_uses_with(phi, v);
                graph.remove_instruction(phi);
                if condition.is_some() {
                    if let Some(k) = try_static_evaluation(graph, cond) {
                        graph.replace_uses_with(cond, k);
                        graph.remove_instruction(cond);
                    }
                }
            }
            if redirected {
                simplified = true;
                maybe_record_stat(&mut self.stats, MethodCompilationStat::SimplifyIf, 1);
            }
        }
        if simplified {
            let split = graph.split_critical_edges();
            if rerun || (split != 0 && loops.headers().next().is_some()) {
                graph.build_dominator_tree();
            } else {
                graph.compute_dominance_information();
            }
        }
        simplified
    }

    pub fn remove_dead_blocks(&mut self, graph: &mut Graph) -> bool {
        let loops = graph.loop_information().clone();
        self.remove_dead_blocks_with(graph, &loops)
    }

    /// Folds branches on constants and deletes what the entry no longer
    /// reaches. Only `loops` is consulted, never the graph's own derived
    /// structures, so this may run right after other CFG edits.
    fn remove_dead_blocks_with(&mut self, graph: &mut Graph, loops: &LoopInformation) -> bool {
        let reachable = mark_reachable_blocks(graph);
        let mut rerun = false;
        let mut folded = 0;
        for &b in reachable.iter() {
            let Some(t) = constant_branch_target(graph, b) else {
                continue;
            };
            graph.fold_branch(b, t);
            rerun |= loops.is_in_loop(b);
            folded += 1;
        }
        let dead: BTreeSet<BlockId> = graph
            .live_blocks()
            .filter(|b| !reachable.contains(b))
            .collect();
        rerun |= dead.iter().any(|b| loops.is_in_loop(*b));
        if folded == 0 && dead.is_empty() {
            return false;
        }
        let insts = graph.disconnect_and_delete(&dead);
        debug!(blocks = dead.len(), insts, folded, "removed dead blocks");
        maybe_record_stat(&mut self.stats, MethodCompilationStat::RemovedDeadBlock, dead.len());
        maybe_record_stat(&mut self.stats, MethodCompilationStat::RemovedDeadInstruction, insts);
        if rerun {
            graph.build_dominator_tree();
        } else {
            graph.compute_dominance_information();
        }
        true
    }

    /// Turns every boundary of `entry`'s try into a `goto`, cutting the
    /// handler edges.
    fn remove_try(
        &mut self,
        graph: &mut Graph,
        entry: BlockId,
        info: &TryBelonging,
        loops: &LoopInformation,
        any_handler_in_loop: &mut bool,
    ) {
        for e in std::iter::once(entry).chain(info.coalesced.iter().copied()) {
            for h in graph.boundary_to_goto(e) {
                *any_handler_in_loop |= loops.is_in_loop(h);
            }
        }
        for &b in info.blocks.iter() {
            graph.blocks[b].try_entry = None;
            if !matches!(graph.blocks[b].end, Term::TryBoundary { .. }) {
                continue;
            }
            for h in graph.boundary_to_goto(b) {
                *any_handler_in_loop |= loops.is_in_loop(h);
            }
            // a goto into the exit block stands for nothing; route around it
            let Some(exit) = graph.exit else {
                continue;
            };
            if graph.blocks[b].end == Term::Goto(exit) {
                if let [pred] = graph.blocks[b].preds[..] {
                    graph.replace_successor(pred, b, exit);
                }
            }
        }
    }

    /// Removes try regions none of whose blocks can throw.
    pub fn remove_unneeded_tries(&mut self, graph: &mut Graph) -> bool {
        if !graph.has_try_catch {
            return false;
        }
        let loops = graph.loop_information().clone();
        let mut tries: BTreeMap<BlockId, TryBelonging> = BTreeMap::new();
        for &b in graph.dominators().reverse_post_order().iter().skip(1) {
            if let Some(e) = graph.blocks[b].try_entry {
                tries.entry(e).or_default().blocks.insert(b);
            }
        }
        // entries with the same handlers belong to the same try
        let keys: Vec<BlockId> = tries.keys().copied().collect();
        for (n, &k) in keys.iter().enumerate() {
            if !tries.contains_key(&k) {
                continue;
            }
            for &other in keys[n + 1..].iter() {
                if !tries.contains_key(&other) || !graph.has_same_exception_handlers(k, other) {
                    continue;
                }
                if let Some(taken) = tries.remove(&other) {
                    if let Some(group) = tries.get_mut(&k) {
                        group.blocks.extend(taken.blocks);
                        group.coalesced.push(other);
                        group.coalesced.extend(taken.coalesced);
                    }
                }
            }
        }

        let total = tries.len();
        let mut removed = 0;
        let mut any_handler_in_loop = false;
        for (&entry, info) in tries.iter() {
            let can_throw = info.blocks.iter().any(|b| {
                graph.blocks[*b]
                    .insts
                    .iter()
                    .any(|i| graph.insts[*i].can_throw())
                    || graph.blocks[*b].end.can_throw()
            });
            if can_throw {
                continue;
            }
            trace!(entry = entry.index(), blocks = info.blocks.len(), "removing try");
            self.remove_try(graph, entry, info, &loops, &mut any_handler_in_loop);
            removed += 1;
        }
        if removed == 0 {
            return false;
        }
        if removed == total {
            graph.has_try_catch = false;
        }
        // handlers left without a boundary are deleted here; otherwise
        // bring dominance up to date ourselves
        if !self.remove_dead_blocks_with(graph, &loops) {
            if any_handler_in_loop {
                graph.build_dominator_tree();
            } else {
                graph.compute_dominance_information();
            }
        }
        maybe_record_stat(&mut self.stats, MethodCompilationStat::RemovedTry, removed);
        true
    }

    /// Sweeps unused side-effect-free instructions, users before their
    /// inputs.
    pub fn remove_dead_instructions(&mut self, graph: &mut Graph) -> usize {
        let order: Vec<BlockId> = graph.dominators().post_order().collect();
        let mut removed = 0;
        for b in order {
            let blk = &graph.blocks[b];
            let list: Vec<InstId> = blk
                .insts
                .iter()
                .rev()
                .chain(blk.phis.iter().rev())
                .copied()
                .collect();
            for i in list {
                if graph.is_live(i) && graph.is_dead_and_removable(i) {
                    graph.remove_instruction(i);
                    removed += 1;
                }
            }
        }
        maybe_record_stat(&mut self.stats, MethodCompilationStat::RemovedDeadInstruction, removed);
        removed
    }
}

impl Optimization for DeadCodeElimination<'_> {
    fn name(&self) -> &'static str {
        "dead_code_elimination"
    }
    fn run(&mut self, graph: &mut Graph) -> bool {
        let _span = debug_span!("dead_code_elimination").entered();
        let mut changed = false;
        // the loop representation assumes single-entry loops
        if graph.has_irreducible_loops() {
            debug!("irreducible loops, leaving the CFG alone");
        } else {
            if self.enabled(OptFlags::CONNECT_SUCCESSIVE_BLOCKS) {
                changed |= self.connect_successive_blocks(graph);
            }
            let mut did = false;
            if self.enabled(OptFlags::SIMPLIFY_ALWAYS_THROWS) {
                did |= self.simplify_always_throws(graph);
            }
            if self.enabled(OptFlags::SIMPLIFY_IFS) {
                did |= self.simplify_ifs(graph);
            }
            // before try removal, so dead throwing code does not keep a try alive
            did |= self.remove_dead_blocks(graph);
            if self.enabled(OptFlags::REMOVE_TRIES) {
                did |= self.remove_unneeded_tries(graph);
            }
            if did && self.enabled(OptFlags::CONNECT_SUCCESSIVE_BLOCKS) {
                self.connect_successive_blocks(graph);
            }
            changed |= did;
        }
        changed |= eliminate_redundant_phis(graph, &mut self.stats) != 0;
        changed |= self.remove_dead_instructions(graph) != 0;
        debug!(changed, "dead code elimination done");
        changed
    }
}

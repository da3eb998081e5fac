//! Removal of phis that merge a single value.
//!
//! A phi whose inputs are all either one value `v` or the phi itself is
//! replaced by `v`. Users that are phis are revisited since they may have
//! become redundant in turn. Catch-block phis are left alone: their inputs
//! do not follow the predecessor list.
use std::collections::{BTreeSet, VecDeque};

use hir_ssa::{Graph, InstId, User};
use sable_common::MethodCompilationStat;
use tracing::trace;

use crate::{CompilerStats, maybe_record_stat};

fn single_input(graph: &Graph, phi: InstId) -> Option<InstId> {
    let mut found = None;
    for &x in graph.phi_inputs(phi) {
        if x == phi || Some(x) == found {
            continue;
        }
        if found.is_some() {
            return None;
        }
        found = Some(x);
    }
    found
}

/// Returns the number of phis removed.
pub fn eliminate_redundant_phis(
    graph: &mut Graph,
    stats: &mut Option<&mut CompilerStats>,
) -> usize {
    let mut work: VecDeque<InstId> = graph
        .live_blocks()
        .filter(|b| !graph.blocks[*b].is_catch)
        .flat_map(|b| graph.blocks[b].phis.iter().copied())
        .collect();
    let mut queued: BTreeSet<InstId> = work.iter().copied().collect();
    let mut removed = 0;
    while let Some(phi) = work.pop_front() {
        queued.remove(&phi);
        if !graph.is_live(phi) {
            continue;
        }
        let Some(v) = single_input(graph, phi) else {
            continue;
        };
        for u in graph.uses(phi).to_vec() {
            if let User::Inst(user) = u.user {
                if user != phi && graph.insts[user].kind.is_phi() && queued.insert(user) {
                    work.push_back(user);
                }
            }
        }
        // self references go away with the phi
        for index in (0..graph.phi_inputs(phi).len()).rev() {
            if graph.phi_inputs(phi)[index] == phi {
                graph.replace_input(User::Inst(phi), index, v);
            }
        }
        graph.replace_uses_with(phi, v);
        graph.remove_instruction(phi);
        trace!(phi = phi.index(), with = v.index(), "removed redundant phi");
        removed += 1;
    }
    maybe_record_stat(stats, MethodCompilationStat::RemovedRedundantPhi, removed);
    removed
}

#[cfg(test)]
mod tests {
    use hir_ssa::Term;
    use sable_common::DataType;

    use super::*;

    #[test]
    fn loop_phi_of_one_value_collapses() {
        // entry -> head; head: phi(x, phi) ; if p -> head, out
        let mut g = Graph::new();
        let [head, out] = [g.add_block(), g.add_block()];
        let exit = g.add_exit_block();
        let x = g.add_parameter(DataType::Int32);
        let p = g.add_parameter(DataType::Bool);
        g.set_term(g.entry, Term::Goto(head));
        let phi = g.add_phi(head, DataType::Int32, vec![x, x]);
        g.replace_input(User::Inst(phi), 1, phi);
        g.set_term(head, Term::If {
            cond: p,
            if_true: head,
            if_false: out,
        });
        g.set_term(out, Term::Return {
            value: Some(phi),
            exit,
        });
        g.finish().unwrap();
        assert_eq!(eliminate_redundant_phis(&mut g, &mut None), 1);
        assert!(!g.is_live(phi));
        assert_eq!(g.blocks[out].end, Term::Return {
            value: Some(x),
            exit
        });
        g.verify().unwrap();
    }
}

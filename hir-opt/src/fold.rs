//! Constant folding.
//!
//! Blocks are visited in reverse post-order so that the inputs of an
//! instruction are folded before the instruction itself. After a block's
//! instructions, an `if` ending it seeds each arm with what the branch
//! proved about its condition.
use hir_ssa::{BlockId, Graph, InstId, InstKind, Literal, Term};
use sable_common::{DataType, IfCondition, MethodCompilationStat};
use tracing::{debug, debug_span, trace};

use crate::{
    CompilerStats, OptFlags, Optimization, OptimizerCfg, absorb::try_absorb,
    eval::try_static_evaluation, maybe_record_stat,
};

pub struct ConstantFolding<'a> {
    cfg: &'a OptimizerCfg,
    stats: Option<&'a mut CompilerStats>,
}
impl<'a> ConstantFolding<'a> {
    pub fn new(cfg: &'a OptimizerCfg, stats: Option<&'a mut CompilerStats>) -> Self {
        Self { cfg, stats }
    }

    fn replace(&mut self, graph: &mut Graph, i: InstId, with: InstId, stat: MethodCompilationStat) {
        trace!(inst = i.index(), with = with.index(), ?stat, "folding");
        graph.replace_uses_with(i, with);
        graph.remove_instruction(i);
        maybe_record_stat(&mut self.stats, stat, 1);
    }

    fn visit_instruction(&mut self, graph: &mut Graph, i: InstId) -> bool {
        match graph.insts[i].kind {
            InstKind::Unary { .. } | InstKind::TypeConversion { .. } => {
                let Some(c) = try_static_evaluation(graph, i) else {
                    return false;
                };
                self.replace(graph, i, c, MethodCompilationStat::ConstantFolded);
            }
            InstKind::Binary { .. } | InstKind::Condition { .. } | InstKind::Compare { .. } => {
                if let Some(c) = try_static_evaluation(graph, i) {
                    self.replace(graph, i, c, MethodCompilationStat::ConstantFolded);
                } else if self.cfg.flags.contains(OptFlags::ABSORBING_INPUTS) {
                    match try_absorb(graph, i) {
                        Some(r) if r != i => self.replace(
                            graph,
                            i,
                            r,
                            MethodCompilationStat::SimplifiedAbsorbingInput,
                        ),
                        _ => return false,
                    }
                } else {
                    return false;
                }
            }
            // A check of a non-zero constant cannot fail.
            InstKind::DivZeroCheck { input } => {
                match graph.literal(input) {
                    Some(l) if !l.is_arithmetic_zero() => {
                        self.replace(graph, i, input, MethodCompilationStat::ConstantFolded)
                    }
                    _ => return false,
                }
            }
            _ => return false,
        }
        true
    }

    /// Rewrites uses of `variable` dominated by `start` to the constant
    /// `lit`. `start` must be reached only from `branch`.
    fn propagate_value(
        &mut self,
        graph: &mut Graph,
        branch: BlockId,
        start: BlockId,
        variable: InstId,
        lit: Literal,
    ) -> usize {
        if start == branch || graph.predecessors(start) != [branch] {
            return 0;
        }
        let existed = graph.find_constant(lit).is_some();
        let c = graph.constant(lit);
        let n = graph.replace_uses_dominated_by(variable, start, c);
        if n == 0 {
            if !existed {
                graph.remove_instruction(c);
            }
            return 0;
        }
        trace!(
            variable = variable.index(),
            block = start.index(),
            %lit,
            uses = n,
            "propagated branch value"
        );
        maybe_record_stat(&mut self.stats, MethodCompilationStat::PropagatedIfValue, n);
        n
    }

    fn visit_if(&mut self, graph: &mut Graph, b: BlockId) -> bool {
        let Term::If {
            cond,
            if_true,
            if_false,
        } = graph.blocks[b].end
        else {
            return false;
        };
        if !self.cfg.flags.contains(OptFlags::PROPAGATE_IF_VALUES)
            || graph.is_constant(cond)
            || if_true == if_false
        {
            return false;
        }
        let mut n = self.propagate_value(graph, b, if_true, cond, Literal::bool(true));
        n += self.propagate_value(graph, b, if_false, cond, Literal::bool(false));

        let InstKind::Condition {
            cond: test,
            left,
            right,
            ..
        } = graph.insts[cond].kind
        else {
            return n != 0;
        };
        if !matches!(test, IfCondition::Eq | IfCondition::Ne) {
            return n != 0;
        }
        let Some((mut variable, mut lit)) = single_constant(graph, left, right) else {
            return n != 0;
        };
        // compare(x, c) == 0 tests x == c
        if let InstKind::Compare { left, right, .. } = graph.insts[variable].kind {
            if !lit.is_arithmetic_zero() {
                return n != 0;
            }
            let Some(inner) = single_constant(graph, left, right) else {
                return n != 0;
            };
            (variable, lit) = inner;
        }
        // -0.0 == 0.0 does not make the bits equal
        if graph.insts[variable].ty.is_floating_point() {
            return n != 0;
        }
        let (equal_side, other_side) = match test {
            IfCondition::Eq => (if_true, if_false),
            _ => (if_false, if_true),
        };
        n += self.propagate_value(graph, b, equal_side, variable, lit);
        if graph.insts[variable].ty == DataType::Bool {
            let negated = match lit {
                Literal::Int(0) => Some(Literal::bool(true)),
                Literal::Int(1) => Some(Literal::bool(false)),
                _ => None,
            };
            if let Some(neg) = negated {
                n += self.propagate_value(graph, b, other_side, variable, neg);
            }
        }
        n != 0
    }
}

/// The non-constant operand and the constant one, when exactly one of the
/// two is a constant.
fn single_constant(graph: &Graph, left: InstId, right: InstId) -> Option<(InstId, Literal)> {
    match (graph.literal(left), graph.literal(right)) {
        (None, Some(r)) => Some((left, r)),
        (Some(l), None) => Some((right, l)),
        _ => None,
    }
}

impl Optimization for ConstantFolding<'_> {
    fn name(&self) -> &'static str {
        "constant_folding"
    }
    fn run(&mut self, graph: &mut Graph) -> bool {
        let _span = debug_span!("constant_folding").entered();
        let rpo = graph.dominators().reverse_post_order().to_vec();
        let mut changed = false;
        for b in rpo {
            let blk = &graph.blocks[b];
            let list: Vec<InstId> = blk.phis.iter().chain(blk.insts.iter()).copied().collect();
            for i in list {
                if graph.is_live(i) {
                    changed |= self.visit_instruction(graph, i);
                }
            }
            changed |= self.visit_if(graph, b);
        }
        debug!(changed, "constant folding done");
        changed
    }
}

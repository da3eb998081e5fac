//! Constant folding and dead code elimination over [`hir_ssa::Graph`].
//!
//! [`optimize`] runs the two passes in order. Each pass can also be driven
//! on its own through [`Optimization`]. Both expect a graph whose dominator
//! tree is current and leave it current.
use anyhow::Context;
use hir_ssa::Graph;

pub mod absorb;
pub mod dce;
pub mod eval;
pub mod fold;
pub mod phi_elim;
pub mod stats;

pub use dce::DeadCodeElimination;
pub use fold::ConstantFolding;
pub use stats::{CompilerStats, maybe_record_stat};

bitflags::bitflags! {
    /// Switches for individual rewrites.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
    pub struct OptFlags: u64{
        /// Substitute 1/0 for a branch condition in the region each arm
        /// dominates, and the compared constant for `x == c` / `x != c`.
        const PROPAGATE_IF_VALUES = 0x1;
        /// Apply absorbing-input identities to binary operations that do
        /// not fold outright.
        const ABSORBING_INPUTS = 0x2;
        const CONNECT_SUCCESSIVE_BLOCKS = 0x4;
        /// Send the successor of an always-throwing call straight to exit.
        const SIMPLIFY_ALWAYS_THROWS = 0x8;
        /// Thread predecessors past `if`s whose outcome they decide.
        const SIMPLIFY_IFS = 0x10;
        /// Synthesize a 0/1 phi for an `if` that repeats its dominator's test.
        const ADD_PHI_FOR_IFS = 0x20;
        const REMOVE_TRIES = 0x40;
        /// Run the graph checker after each pass.
        const VERIFY = 0x80;
    }
}
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct OptimizerCfg {
    pub flags: OptFlags,
}
impl Default for OptimizerCfg {
    fn default() -> Self {
        Self {
            flags: OptFlags::all(),
        }
    }
}
impl OptimizerCfg {
    pub fn with_flags(flags: OptFlags) -> Self {
        Self { flags }
    }
}

/// A pass over one graph.
pub trait Optimization {
    fn name(&self) -> &'static str;
    /// Returns whether the graph changed.
    fn run(&mut self, graph: &mut Graph) -> bool;
}

fn run_pass(
    pass: &mut dyn Optimization,
    graph: &mut Graph,
    cfg: &OptimizerCfg,
) -> anyhow::Result<bool> {
    let changed = pass.run(graph);
    if cfg.flags.contains(OptFlags::VERIFY) {
        graph
            .verify()
            .with_context(|| format!("after {}", pass.name()))?;
    }
    Ok(changed)
}

/// Constant folding followed by dead code elimination.
pub fn optimize(
    graph: &mut Graph,
    cfg: &OptimizerCfg,
    mut stats: Option<&mut CompilerStats>,
) -> anyhow::Result<bool> {
    let mut changed = run_pass(
        &mut ConstantFolding::new(cfg, stats.as_deref_mut()),
        graph,
        cfg,
    )?;
    changed |= run_pass(
        &mut DeadCodeElimination::new(cfg, stats.as_deref_mut()),
        graph,
        cfg,
    )?;
    Ok(changed)
}

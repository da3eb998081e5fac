//! SSA control-flow graph of a single method.
//!
//! A [`Graph`] owns its blocks and instructions in arenas and refers to them
//! by [`BlockId`] and [`InstId`]. Blocks hold phis, a list of ordinary
//! instructions and a [`Term`]inator. Predecessor lists are explicit and
//! their order matches the inputs of every phi in the block.
//!
//! # Def-use
//!
//! Each instruction records every place that consumes it as a [`Use`]: the
//! consuming instruction or terminator and the input slot. All edits go
//! through the methods in [`edit`], which keep both directions in sync.
//!
//! # Derived structures
//!
//! Dominators, loops and try membership are derived from the CFG. Each CFG
//! edit bumps [`Graph::revision`]; the derived structures remember the
//! revision they were computed at and their accessors assert that it is
//! still current. See [`dom`].
use std::collections::BTreeMap;

use id_arena::{Arena, Id};
pub use sable_common::*;

pub mod build;
pub mod display;
pub mod dom;
pub mod edit;
pub mod impls;
pub mod inst;
pub mod loops;
pub mod term;
pub mod try_catch;
pub mod verify;

pub use dom::DominatorTree;
pub use inst::{InstFlags, InstKind, Literal};
pub use loops::LoopInformation;
pub use term::{BoundaryKind, Term};

pub type BlockId = Id<BasicBlock>;
pub type InstId = Id<Instruction>;

/// Consumer side of a def-use edge.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum User {
    Inst(InstId),
    /// The terminator of the block.
    Term(BlockId),
}
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Use {
    pub user: User,
    /// Input slot of the user.
    pub index: usize,
}

#[derive(Clone, Debug)]
pub struct Instruction {
    pub kind: InstKind,
    pub ty: DataType,
    pub flags: InstFlags,
    /// `None` before insertion and after removal.
    pub block: Option<BlockId>,
    pub uses: Vec<Use>,
}
impl Instruction {
    pub fn new(kind: InstKind, ty: DataType) -> Self {
        Self {
            kind,
            ty,
            flags: InstFlags::empty(),
            block: None,
            uses: vec![],
        }
    }
    pub fn always_throws(&self) -> bool {
        self.flags.contains(InstFlags::ALWAYS_THROWS)
    }
    pub fn can_throw(&self) -> bool {
        if self.always_throws() {
            return true;
        }
        match &self.kind {
            InstKind::DivZeroCheck { .. }
            | InstKind::NullCheck { .. }
            | InstKind::NewInstance { .. } => true,
            InstKind::Invoke { .. } => !self.flags.contains(InstFlags::NO_THROW),
            _ => false,
        }
    }
    /// Could be deleted if nothing used its value.
    pub fn is_removable(&self) -> bool {
        !self.kind.side_effects().does_any_write()
            && !self.can_throw()
            && !matches!(self.kind, InstKind::Parameter { .. })
    }
}

#[derive(Clone, Debug, Default)]
pub struct BasicBlock {
    pub phis: Vec<InstId>,
    pub insts: Vec<InstId>,
    pub end: Term,
    pub preds: Vec<BlockId>,
    pub is_catch: bool,
    /// Block ending in the `TryBoundary` entry of the try this block is
    /// covered by.
    pub try_entry: Option<BlockId>,
    pub removed: bool,
}

#[derive(Clone, Debug)]
pub struct Graph {
    pub blocks: Arena<BasicBlock>,
    pub insts: Arena<Instruction>,
    pub entry: BlockId,
    pub exit: Option<BlockId>,
    pub has_try_catch: bool,
    constants: BTreeMap<Literal, InstId>,
    revision: u64,
    dom: DominatorTree,
    loops: LoopInformation,
}
impl Graph {
    /// Counter bumped by every CFG edit.
    pub fn revision(&self) -> u64 {
        self.revision
    }
    pub(crate) fn invalidate(&mut self) {
        self.revision += 1;
    }
    pub fn live_blocks(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.blocks
            .iter()
            .filter(|(_, b)| !b.removed)
            .map(|(a, _)| a)
    }
    pub fn successors(&self, b: BlockId) -> Vec<BlockId> {
        cfg_traits::Term::targets(&self.blocks[b].end)
            .copied()
            .collect()
    }
    pub fn successor_at(&self, b: BlockId, index: usize) -> Option<BlockId> {
        cfg_traits::Term::targets(&self.blocks[b].end)
            .nth(index)
            .copied()
    }
    pub fn predecessors(&self, b: BlockId) -> &[BlockId] {
        &self.blocks[b].preds
    }
    pub fn is_exit(&self, b: BlockId) -> bool {
        self.exit == Some(b)
    }
    pub fn is_live(&self, i: InstId) -> bool {
        match self.insts[i].block {
            Some(b) => !self.blocks[b].removed,
            None => false,
        }
    }
    pub fn uses(&self, i: InstId) -> &[Use] {
        &self.insts[i].uses
    }
    pub fn input(&self, user: User, index: usize) -> Option<InstId> {
        match user {
            User::Inst(i) => self.insts[i].kind.inputs().nth(index).copied(),
            User::Term(b) => self.blocks[b].end.inputs().nth(index).copied(),
        }
    }
    pub fn literal(&self, i: InstId) -> Option<Literal> {
        match self.insts[i].kind {
            InstKind::Constant(l) => Some(l),
            _ => None,
        }
    }
    pub fn int_value(&self, i: InstId) -> Option<i32> {
        match self.literal(i)? {
            Literal::Int(v) => Some(v),
            _ => None,
        }
    }
    pub fn is_constant(&self, i: InstId) -> bool {
        self.literal(i).is_some()
    }
    pub fn is_null_constant(&self, i: InstId) -> bool {
        self.literal(i) == Some(Literal::Null)
    }
    /// Conservative nullness of a reference value.
    pub fn can_be_null(&self, i: InstId) -> bool {
        let inst = &self.insts[i];
        if !inst.ty.is_reference() {
            return false;
        }
        match &inst.kind {
            InstKind::Constant(l) => *l == Literal::Null,
            InstKind::NullCheck { .. }
            | InstKind::BoundType { .. }
            | InstKind::NewInstance { .. } => false,
            InstKind::Parameter { .. } | InstKind::Invoke { .. } => {
                inst.flags.contains(InstFlags::CAN_BE_NULL)
            }
            _ => true,
        }
    }
    /// First non-phi instruction of `b`.
    pub fn first_instruction(&self, b: BlockId) -> Option<InstId> {
        self.blocks[b].insts.first().copied()
    }
    pub fn phi_inputs(&self, phi: InstId) -> &[InstId] {
        match &self.insts[phi].kind {
            InstKind::Phi { inputs } => inputs,
            _ => &[],
        }
    }
    pub(crate) fn constants(&self) -> &BTreeMap<Literal, InstId> {
        &self.constants
    }
}

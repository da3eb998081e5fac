//! Construction API used by front ends and tests.
use std::collections::BTreeMap;

use anyhow::Context;
use id_arena::Arena;
use sable_common::{BinaryOp, ComparisonBias, DataType, IfCondition};

use crate::{
    BasicBlock, BlockId, DominatorTree, Graph, InstFlags, InstId, InstKind, Instruction,
    LoopInformation, Term, User,
};

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
impl Graph {
    /// Graph with an empty entry block and no exit block.
    pub fn new() -> Self {
        let mut blocks = Arena::new();
        let entry = blocks.alloc(BasicBlock::default());
        Self {
            blocks,
            insts: Arena::new(),
            entry,
            exit: None,
            has_try_catch: false,
            constants: BTreeMap::new(),
            revision: 0,
            dom: DominatorTree::default(),
            loops: LoopInformation::default(),
        }
    }
    pub fn add_block(&mut self) -> BlockId {
        self.invalidate();
        self.blocks.alloc(BasicBlock::default())
    }
    pub fn add_exit_block(&mut self) -> BlockId {
        let b = self.add_block();
        self.blocks[b].end = Term::Exit;
        self.exit = Some(b);
        b
    }
    pub fn mark_catch(&mut self, b: BlockId) {
        self.blocks[b].is_catch = true;
    }
    /// Sets the terminator of a block that has none yet. Each target gains
    /// `b` as its last predecessor.
    pub fn set_term(&mut self, b: BlockId, term: Term) {
        debug_assert!(
            matches!(self.blocks[b].end, Term::Default),
            "B{} already has a terminator",
            b.index()
        );
        for t in term.targets().copied().collect::<Vec<_>>() {
            self.blocks[t].preds.push(b);
        }
        for (index, x) in term.inputs().copied().enumerate().collect::<Vec<_>>() {
            self.add_use(x, User::Term(b), index);
        }
        if matches!(term, Term::TryBoundary { .. }) {
            self.has_try_catch = true;
        }
        self.blocks[b].end = term;
        self.invalidate();
    }
    /// Allocates an instruction outside any block and registers it as a
    /// user of its inputs.
    pub fn create_instruction(&mut self, kind: InstKind, ty: DataType, flags: InstFlags) -> InstId {
        let inputs: Vec<InstId> = kind.inputs().copied().collect();
        let i = self.insts.alloc(Instruction {
            flags,
            ..Instruction::new(kind, ty)
        });
        for (index, x) in inputs.into_iter().enumerate() {
            self.add_use(x, User::Inst(i), index);
        }
        i
    }
    pub fn append(&mut self, b: BlockId, i: InstId) {
        self.insts[i].block = Some(b);
        if self.insts[i].kind.is_phi() {
            self.blocks[b].phis.push(i);
        } else {
            self.blocks[b].insts.push(i);
        }
    }
    /// Places `i` before the first non-phi instruction of `b`.
    pub fn insert_at_start(&mut self, b: BlockId, i: InstId) {
        self.insts[i].block = Some(b);
        self.blocks[b].insts.insert(0, i);
    }
    pub fn add_inst(&mut self, b: BlockId, kind: InstKind, ty: DataType) -> InstId {
        self.add_inst_with_flags(b, kind, ty, InstFlags::empty())
    }
    pub fn add_inst_with_flags(
        &mut self,
        b: BlockId,
        kind: InstKind,
        ty: DataType,
        flags: InstFlags,
    ) -> InstId {
        let i = self.create_instruction(kind, ty, flags);
        self.append(b, i);
        i
    }
    pub fn add_phi(&mut self, b: BlockId, ty: DataType, inputs: Vec<InstId>) -> InstId {
        self.add_inst(b, InstKind::Phi { inputs }, ty)
    }
    /// Next parameter, appended to the entry block. Reference parameters
    /// may be null.
    pub fn add_parameter(&mut self, ty: DataType) -> InstId {
        let index = self.blocks[self.entry]
            .insts
            .iter()
            .filter(|i| matches!(self.insts[**i].kind, InstKind::Parameter { .. }))
            .count() as u32;
        let flags = if ty.is_reference() {
            InstFlags::CAN_BE_NULL
        } else {
            InstFlags::empty()
        };
        let entry = self.entry;
        self.add_inst_with_flags(entry, InstKind::Parameter { index }, ty, flags)
    }
    pub fn add_binary(
        &mut self,
        b: BlockId,
        op: BinaryOp,
        ty: DataType,
        left: InstId,
        right: InstId,
    ) -> InstId {
        self.add_inst(b, InstKind::Binary { op, left, right }, ty)
    }
    pub fn add_condition(
        &mut self,
        b: BlockId,
        cond: IfCondition,
        left: InstId,
        right: InstId,
    ) -> InstId {
        self.add_inst(
            b,
            InstKind::Condition {
                cond,
                left,
                right,
                bias: ComparisonBias::NoBias,
            },
            DataType::Bool,
        )
    }
    /// Computes the derived structures and checks the result.
    pub fn finish(&mut self) -> anyhow::Result<()> {
        self.build_dominator_tree();
        self.verify().context("graph handed to the optimizer is malformed")
    }
}

//! `cfg-traits` implementations for the graph.
//!
//! - `cfg_traits::Func` for [`Graph`]
//! - `cfg_traits::Block` for [`BasicBlock`]
//! - `cfg_traits::Term` for [`Term`] and for bare block ids
//! - `cfg_traits::Target` for bare block ids
//!
//! Successor enumeration inside this crate goes through these impls.
use std::iter::once;

use id_arena::Arena;

use crate::{BasicBlock, BlockId, Graph, Term};

impl cfg_traits::Func for Graph {
    type Block = BlockId;
    type Blocks = Arena<BasicBlock>;
    fn blocks(&self) -> &Self::Blocks {
        &self.blocks
    }
    fn blocks_mut(&mut self) -> &mut Self::Blocks {
        &mut self.blocks
    }
    fn entry(&self) -> Self::Block {
        self.entry
    }
}
impl cfg_traits::Block<Graph> for BasicBlock {
    type Terminator = Term;
    fn term(&self) -> &Self::Terminator {
        &self.end
    }
    fn term_mut(&mut self) -> &mut Self::Terminator {
        &mut self.end
    }
}
impl cfg_traits::Term<Graph> for Term {
    type Target = BlockId;
    fn targets<'a>(&'a self) -> Box<dyn Iterator<Item = &'a Self::Target> + 'a>
    where
        Graph: 'a,
    {
        Term::targets(self)
    }
    fn targets_mut<'a>(&'a mut self) -> Box<dyn Iterator<Item = &'a mut Self::Target> + 'a>
    where
        Graph: 'a,
    {
        Term::targets_mut(self)
    }
}
impl cfg_traits::Term<Graph> for BlockId {
    type Target = BlockId;
    fn targets<'a>(&'a self) -> Box<dyn Iterator<Item = &'a Self::Target> + 'a>
    where
        Graph: 'a,
    {
        Box::new(once(self))
    }
    fn targets_mut<'a>(&'a mut self) -> Box<dyn Iterator<Item = &'a mut Self::Target> + 'a>
    where
        Graph: 'a,
    {
        Box::new(once(self))
    }
}
impl cfg_traits::Target<Graph> for BlockId {
    fn block(&self) -> <Graph as cfg_traits::Func>::Block {
        *self
    }
    fn block_mut(&mut self) -> &mut <Graph as cfg_traits::Func>::Block {
        self
    }
}

use either::Either;
use std::iter::{empty, once};

use crate::{BlockId, InstId};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum BoundaryKind {
    /// Control enters a try region.
    Entry,
    /// Control leaves a try region.
    Exit,
}

/// Control-flow instruction ending a block.
///
/// The order of the targets is the successor order of the block:
/// `If` lists its true successor first, `PackedSwitch` lists its cases and
/// then its default, and `TryBoundary` lists its normal successor followed
/// by its exception handlers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum Term<I = InstId, B = BlockId> {
    Goto(B),
    If {
        cond: I,
        if_true: B,
        if_false: B,
    },
    /// Case `k` matches `start + k`.
    PackedSwitch {
        input: I,
        start: i32,
        targets: Vec<B>,
        default: B,
    },
    TryBoundary {
        kind: BoundaryKind,
        next: B,
        handlers: Vec<B>,
    },
    /// `exit` is the exit block, or a try exit in front of it.
    Return {
        value: Option<I>,
        exit: B,
    },
    Throw {
        value: I,
        exit: B,
    },
    /// Terminator of the exit block.
    Exit,
    /// Not yet set, or cleared on a dead block.
    #[default]
    Default,
}
impl<I, B> Term<I, B> {
    pub fn targets<'a>(&'a self) -> Box<dyn Iterator<Item = &'a B> + 'a> {
        match self {
            Term::Goto(b) => Box::new(once(b)),
            Term::If {
                if_true, if_false, ..
            } => Box::new([if_true, if_false].into_iter()),
            Term::PackedSwitch {
                targets, default, ..
            } => Box::new(targets.iter().chain(once(default))),
            Term::TryBoundary { next, handlers, .. } => Box::new(once(next).chain(handlers.iter())),
            Term::Return { exit, .. } | Term::Throw { exit, .. } => Box::new(once(exit)),
            Term::Exit | Term::Default => Box::new(empty()),
        }
    }
    pub fn targets_mut<'a>(&'a mut self) -> Box<dyn Iterator<Item = &'a mut B> + 'a> {
        match self {
            Term::Goto(b) => Box::new(once(b)),
            Term::If {
                if_true, if_false, ..
            } => Box::new([if_true, if_false].into_iter()),
            Term::PackedSwitch {
                targets, default, ..
            } => Box::new(targets.iter_mut().chain(once(default))),
            Term::TryBoundary { next, handlers, .. } => {
                Box::new(once(next).chain(handlers.iter_mut()))
            }
            Term::Return { exit, .. } | Term::Throw { exit, .. } => Box::new(once(exit)),
            Term::Exit | Term::Default => Box::new(empty()),
        }
    }
    /// Targets reached without an exception; handlers are excluded.
    pub fn normal_target_count(&self) -> usize {
        match self {
            Term::TryBoundary { .. } => 1,
            a => a.targets().count(),
        }
    }
    pub fn inputs(&self) -> impl Iterator<Item = &I> + '_ {
        match self {
            Term::If { cond: a, .. }
            | Term::PackedSwitch { input: a, .. }
            | Term::Throw { value: a, .. }
            | Term::Return { value: Some(a), .. } => Either::Left(once(a)),
            _ => Either::Right(empty()),
        }
    }
    pub fn inputs_mut(&mut self) -> impl Iterator<Item = &mut I> + '_ {
        match self {
            Term::If { cond: a, .. }
            | Term::PackedSwitch { input: a, .. }
            | Term::Throw { value: a, .. }
            | Term::Return { value: Some(a), .. } => Either::Left(once(a)),
            _ => Either::Right(empty()),
        }
    }
    pub fn can_throw(&self) -> bool {
        matches!(self, Term::Throw { .. })
    }
    pub fn name(&self) -> &'static str {
        match self {
            Term::Goto(_) => "Goto",
            Term::If { .. } => "If",
            Term::PackedSwitch { .. } => "PackedSwitch",
            Term::TryBoundary {
                kind: BoundaryKind::Entry,
                ..
            } => "TryBoundary(entry)",
            Term::TryBoundary {
                kind: BoundaryKind::Exit,
                ..
            } => "TryBoundary(exit)",
            Term::Return { .. } => "Return",
            Term::Throw { .. } => "Throw",
            Term::Exit => "Exit",
            Term::Default => "<none>",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn successor_order() {
        let t: Term<u32, u32> = Term::If {
            cond: 0,
            if_true: 7,
            if_false: 8,
        };
        assert_eq!(t.targets().copied().collect::<Vec<_>>(), vec![7, 8]);
        let t: Term<u32, u32> = Term::PackedSwitch {
            input: 0,
            start: 3,
            targets: vec![1, 2],
            default: 9,
        };
        assert_eq!(t.targets().copied().collect::<Vec<_>>(), vec![1, 2, 9]);
        let t: Term<u32, u32> = Term::TryBoundary {
            kind: BoundaryKind::Entry,
            next: 4,
            handlers: vec![5, 6],
        };
        assert_eq!(t.targets().copied().collect::<Vec<_>>(), vec![4, 5, 6]);
        assert_eq!(t.normal_target_count(), 1);
    }
    #[test]
    fn return_without_value_has_no_inputs() {
        let t: Term<u32, u32> = Term::Return {
            value: None,
            exit: 1,
        };
        assert_eq!(t.inputs().count(), 0);
        let t: Term<u32, u32> = Term::Return {
            value: Some(3),
            exit: 1,
        };
        assert_eq!(t.inputs().copied().collect::<Vec<_>>(), vec![3]);
    }
}

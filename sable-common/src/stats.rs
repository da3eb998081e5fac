/// Events a pass may report to a statistics sink.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, linearize::Linearize)]
#[non_exhaustive]
pub enum MethodCompilationStat {
    ConstantFolded,
    SimplifiedAbsorbingInput,
    PropagatedIfValue,
    RemovedDeadInstruction,
    RemovedDeadBlock,
    SimplifyIf,
    SimplifyIfAddedPhi,
    SimplifyThrowingInvoke,
    RemovedNullCheck,
    RemovedTry,
    RemovedRedundantPhi,
}

use std::fmt::{self, Display, Formatter};

use crate::{BlockId, Graph, InstId, InstKind, Literal, Term};

struct B(BlockId);
impl Display for B {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0.index())
    }
}
struct I(InstId);
impl Display for I {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.0.index())
    }
}
fn list<T: Display>(f: &mut Formatter<'_>, items: impl Iterator<Item = T>) -> fmt::Result {
    for (n, a) in items.enumerate() {
        if n != 0 {
            write!(f, ", ")?;
        }
        write!(f, "{a}")?;
    }
    Ok(())
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            Literal::Int(a) => write!(f, "{a}"),
            Literal::Long(a) => write!(f, "{a}L"),
            Literal::Float(bits) => write!(f, "{:?}f", f32::from_bits(bits)),
            Literal::Double(bits) => write!(f, "{:?}d", f64::from_bits(bits)),
            Literal::Null => write!(f, "null"),
        }
    }
}

impl Graph {
    fn fmt_inst(&self, f: &mut Formatter<'_>, i: InstId) -> fmt::Result {
        let inst = &self.insts[i];
        write!(f, "  {}: {} = {}", I(i), inst.ty.name(), inst.kind.name())?;
        match &inst.kind {
            InstKind::Constant(l) => write!(f, " {l}")?,
            InstKind::Parameter { index } => write!(f, " #{index}")?,
            InstKind::Condition { cond, .. } => write!(f, "[{}]", cond.symbol())?,
            InstKind::FieldGet { field, .. } | InstKind::FieldSet { field, .. } => {
                write!(f, "[f{field}]")?
            }
            InstKind::Invoke { method, .. } => write!(f, "[m{method}]")?,
            InstKind::NewInstance { class } => write!(f, "[c{class}]")?,
            _ => {}
        }
        if inst.kind.inputs().next().is_some() {
            write!(f, " ")?;
            list(f, inst.kind.inputs().map(|a| I(*a)))?;
        }
        if !inst.flags.is_empty() {
            write!(f, " {:?}", inst.flags)?;
        }
        writeln!(f)
    }
    fn fmt_term(&self, f: &mut Formatter<'_>, b: BlockId) -> fmt::Result {
        let end = &self.blocks[b].end;
        write!(f, "  {}", end.name())?;
        if let Term::PackedSwitch { start, .. } = end {
            write!(f, "[{start}]")?;
        }
        if end.inputs().next().is_some() {
            write!(f, " ")?;
            list(f, end.inputs().map(|a| I(*a)))?;
        }
        if end.targets().next().is_some() {
            write!(f, " -> ")?;
            list(f, end.targets().map(|a| B(*a)))?;
        }
        writeln!(f)
    }
}

impl Display for Graph {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for b in self.live_blocks() {
            let blk = &self.blocks[b];
            write!(f, "{}", B(b))?;
            if b == self.entry {
                write!(f, " (entry)")?;
            }
            if self.is_exit(b) {
                write!(f, " (exit)")?;
            }
            if blk.is_catch {
                write!(f, " (catch)")?;
            }
            if let Some(t) = blk.try_entry {
                write!(f, " (try {})", B(t))?;
            }
            if !blk.preds.is_empty() {
                write!(f, " <- ")?;
                list(f, blk.preds.iter().map(|a| B(*a)))?;
            }
            writeln!(f, ":")?;
            for i in blk.phis.iter().chain(blk.insts.iter()) {
                self.fmt_inst(f, *i)?;
            }
            self.fmt_term(f, b)?;
        }
        Ok(())
    }
}

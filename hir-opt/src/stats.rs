use std::fmt::{self, Display, Formatter};

use linearize::{StaticMap, static_map};
use sable_common::MethodCompilationStat;

/// Counters for the events passes report.
#[derive(Clone)]
pub struct CompilerStats {
    counts: StaticMap<MethodCompilationStat, usize>,
}
impl Default for CompilerStats {
    fn default() -> Self {
        Self {
            counts: static_map! {_ => 0},
        }
    }
}
impl CompilerStats {
    pub fn record(&mut self, stat: MethodCompilationStat, count: usize) {
        self.counts[stat] += count;
    }
    pub fn get(&self, stat: MethodCompilationStat) -> usize {
        self.counts[stat]
    }
}
impl Display for CompilerStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (stat, n) in self.counts.iter().filter(|(_, n)| **n != 0) {
            writeln!(f, "{stat:?}: {n}")?;
        }
        Ok(())
    }
}

/// Records into the sink if there is one.
pub fn maybe_record_stat(
    stats: &mut Option<&mut CompilerStats>,
    stat: MethodCompilationStat,
    count: usize,
) {
    if let Some(s) = stats.as_deref_mut() {
        s.record(stat, count);
    }
}

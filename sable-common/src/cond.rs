use core::cmp::Ordering;

/// Comparison performed by a condition instruction.
///
/// `B`, `Be`, `A` and `Ae` compare their operands as unsigned integers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum IfCondition {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    B,
    Be,
    A,
    Ae,
}
impl IfCondition {
    pub fn opposite(self) -> Self {
        match self {
            IfCondition::Eq => IfCondition::Ne,
            IfCondition::Ne => IfCondition::Eq,
            IfCondition::Lt => IfCondition::Ge,
            IfCondition::Le => IfCondition::Gt,
            IfCondition::Gt => IfCondition::Le,
            IfCondition::Ge => IfCondition::Lt,
            IfCondition::B => IfCondition::Ae,
            IfCondition::Be => IfCondition::A,
            IfCondition::A => IfCondition::Be,
            IfCondition::Ae => IfCondition::B,
        }
    }
    /// Holds whenever both operands are the same value.
    pub fn has_equality(self) -> bool {
        matches!(
            self,
            IfCondition::Eq | IfCondition::Le | IfCondition::Ge | IfCondition::Be | IfCondition::Ae
        )
    }
    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            IfCondition::B | IfCondition::Be | IfCondition::A | IfCondition::Ae
        )
    }
    /// Tests an already-computed ordering of left against right. Callers
    /// produce an unsigned ordering for the unsigned conditions.
    pub fn test(self, ord: Ordering) -> bool {
        match self {
            IfCondition::Eq => ord == Ordering::Equal,
            IfCondition::Ne => ord != Ordering::Equal,
            IfCondition::Lt | IfCondition::B => ord == Ordering::Less,
            IfCondition::Le | IfCondition::Be => ord != Ordering::Greater,
            IfCondition::Gt | IfCondition::A => ord == Ordering::Greater,
            IfCondition::Ge | IfCondition::Ae => ord != Ordering::Less,
        }
    }
    pub fn symbol(self) -> &'static str {
        match self {
            IfCondition::Eq => "==",
            IfCondition::Ne => "!=",
            IfCondition::Lt => "<",
            IfCondition::Le => "<=",
            IfCondition::Gt => ">",
            IfCondition::Ge => ">=",
            IfCondition::B => "<u",
            IfCondition::Be => "<=u",
            IfCondition::A => ">u",
            IfCondition::Ae => ">=u",
        }
    }
}

/// How an ordered floating-point comparison resolves when an operand is NaN.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub enum ComparisonBias {
    #[default]
    NoBias,
    /// NaN compares as greater.
    GtBias,
    /// NaN compares as less.
    LtBias,
}
impl ComparisonBias {
    /// Three-way result an unordered comparison produces under this bias.
    pub fn unordered_result(self) -> Option<i32> {
        match self {
            ComparisonBias::NoBias => None,
            ComparisonBias::GtBias => Some(1),
            ComparisonBias::LtBias => Some(-1),
        }
    }
}

//! Static evaluation over constant inputs.
//!
//! The `evaluate_*` functions are pure functions of literals and return
//! `None` whenever the result is not a compile-time constant: mismatched
//! operand kinds, integral division or remainder by zero, or an unordered
//! floating-point comparison without a NaN bias. Integer arithmetic wraps
//! and shift distances are masked to the operand width, so folding agrees
//! with what the code would compute at run time.
use std::cmp::Ordering;

use hir_ssa::{Graph, InstId, InstKind, Literal};
use num_traits::Float;
use sable_common::{BinaryOp, ComparisonBias, DataType, IfCondition, UnaryOp};

pub fn evaluate_unary(op: UnaryOp, x: Literal) -> Option<Literal> {
    Some(match (op, x) {
        (UnaryOp::Neg, Literal::Int(a)) => Literal::Int(a.wrapping_neg()),
        (UnaryOp::Neg, Literal::Long(a)) => Literal::Long(a.wrapping_neg()),
        (UnaryOp::Neg, Literal::Float(_)) => Literal::float(-x.as_f32()?),
        (UnaryOp::Neg, Literal::Double(_)) => Literal::double(-x.as_f64()?),
        (UnaryOp::Not, Literal::Int(a)) => Literal::Int(!a),
        (UnaryOp::Not, Literal::Long(a)) => Literal::Long(!a),
        (UnaryOp::BooleanNot, Literal::Int(a)) => Literal::Int((a == 0) as i32),
        _ => return None,
    })
}

macro_rules! int_binary {
    ($op:expr, $a:expr, $b:expr, $ity:ty, $uty:ty, $mask:expr) => {
        match $op {
            BinaryOp::Add => Some($a.wrapping_add($b)),
            BinaryOp::Sub => Some($a.wrapping_sub($b)),
            BinaryOp::Mul => Some($a.wrapping_mul($b)),
            BinaryOp::Div if $b == 0 => None,
            BinaryOp::Div => Some($a.wrapping_div($b)),
            BinaryOp::Rem if $b == 0 => None,
            BinaryOp::Rem => Some($a.wrapping_rem($b)),
            BinaryOp::And => Some($a & $b),
            BinaryOp::Or => Some($a | $b),
            BinaryOp::Xor => Some($a ^ $b),
            BinaryOp::Shl => Some($a.wrapping_shl(($b as u32) & $mask)),
            BinaryOp::Shr => Some($a.wrapping_shr(($b as u32) & $mask)),
            BinaryOp::UShr => Some((($a as $uty) >> (($b as u32) & $mask)) as $ity),
        }
    };
}

fn fp_binary<T: Float>(op: BinaryOp, a: T, b: T) -> Option<T> {
    match op {
        BinaryOp::Add => Some(a + b),
        BinaryOp::Sub => Some(a - b),
        BinaryOp::Mul => Some(a * b),
        BinaryOp::Div => Some(a / b),
        BinaryOp::Rem => Some(a % b),
        _ => None,
    }
}

pub fn evaluate_binary(op: BinaryOp, l: Literal, r: Literal) -> Option<Literal> {
    match (l, r) {
        (Literal::Int(a), Literal::Int(b)) => int_binary!(op, a, b, i32, u32, 31).map(Literal::Int),
        (Literal::Long(a), Literal::Int(b)) if op.is_shift() => {
            let b = b as i64;
            int_binary!(op, a, b, i64, u64, 63).map(Literal::Long)
        }
        (Literal::Long(a), Literal::Long(b)) if !op.is_shift() => {
            int_binary!(op, a, b, i64, u64, 63).map(Literal::Long)
        }
        (Literal::Float(_), Literal::Float(_)) => {
            fp_binary(op, l.as_f32()?, r.as_f32()?).map(Literal::float)
        }
        (Literal::Double(_), Literal::Double(_)) => {
            fp_binary(op, l.as_f64()?, r.as_f64()?).map(Literal::double)
        }
        _ => None,
    }
}

/// Three-way comparison of floats; NaN resolves through `bias`.
pub fn compare_fp<T: Float>(a: T, b: T, bias: ComparisonBias) -> Option<i32> {
    match a.partial_cmp(&b) {
        Some(o) => Some(o as i32),
        None => bias.unordered_result(),
    }
}

fn fp_condition<T: Float>(cond: IfCondition, bias: ComparisonBias, a: T, b: T) -> Option<bool> {
    match cond {
        IfCondition::Eq => Some(a == b),
        IfCondition::Ne => Some(a != b),
        c if c.is_unsigned() => None,
        c => Some(c.test(compare_fp(a, b, bias)?.cmp(&0))),
    }
}

pub fn evaluate_condition(
    cond: IfCondition,
    bias: ComparisonBias,
    l: Literal,
    r: Literal,
) -> Option<bool> {
    let ord = match (l, r) {
        (Literal::Int(a), Literal::Int(b)) if cond.is_unsigned() => (a as u32).cmp(&(b as u32)),
        (Literal::Int(a), Literal::Int(b)) => a.cmp(&b),
        (Literal::Long(a), Literal::Long(b)) if cond.is_unsigned() => (a as u64).cmp(&(b as u64)),
        (Literal::Long(a), Literal::Long(b)) => a.cmp(&b),
        (Literal::Null, Literal::Null) if matches!(cond, IfCondition::Eq | IfCondition::Ne) => {
            Ordering::Equal
        }
        (Literal::Float(_), Literal::Float(_)) => {
            return fp_condition(cond, bias, l.as_f32()?, r.as_f32()?);
        }
        (Literal::Double(_), Literal::Double(_)) => {
            return fp_condition(cond, bias, l.as_f64()?, r.as_f64()?);
        }
        _ => return None,
    };
    Some(cond.test(ord))
}

pub fn evaluate_compare(bias: ComparisonBias, l: Literal, r: Literal) -> Option<i32> {
    match (l, r) {
        (Literal::Int(a), Literal::Int(b)) => Some(a.cmp(&b) as i32),
        (Literal::Long(a), Literal::Long(b)) => Some(a.cmp(&b) as i32),
        (Literal::Float(_), Literal::Float(_)) => compare_fp(l.as_f32()?, r.as_f32()?, bias),
        (Literal::Double(_), Literal::Double(_)) => compare_fp(l.as_f64()?, r.as_f64()?, bias),
        _ => None,
    }
}

/// Float-to-integer conversions saturate and send NaN to zero.
pub fn evaluate_conversion(x: Literal, to: DataType) -> Option<Literal> {
    Some(match (x, to) {
        (Literal::Int(v), DataType::Int8) => Literal::Int(v as i8 as i32),
        (Literal::Int(v), DataType::Uint8) => Literal::Int(v as u8 as i32),
        (Literal::Int(v), DataType::Int16) => Literal::Int(v as i16 as i32),
        (Literal::Int(v), DataType::Uint16) => Literal::Int(v as u16 as i32),
        (Literal::Int(v), DataType::Int64) => Literal::Long(v as i64),
        (Literal::Int(v), DataType::Float32) => Literal::float(v as f32),
        (Literal::Int(v), DataType::Float64) => Literal::double(v as f64),
        (Literal::Long(v), DataType::Int8) => Literal::Int(v as i8 as i32),
        (Literal::Long(v), DataType::Uint8) => Literal::Int(v as u8 as i32),
        (Literal::Long(v), DataType::Int16) => Literal::Int(v as i16 as i32),
        (Literal::Long(v), DataType::Uint16) => Literal::Int(v as u16 as i32),
        (Literal::Long(v), DataType::Int32) => Literal::Int(v as i32),
        (Literal::Long(v), DataType::Float32) => Literal::float(v as f32),
        (Literal::Long(v), DataType::Float64) => Literal::double(v as f64),
        (Literal::Float(_), DataType::Int32) => Literal::Int(x.as_f32()? as i32),
        (Literal::Float(_), DataType::Int64) => Literal::Long(x.as_f32()? as i64),
        (Literal::Float(_), DataType::Float64) => Literal::double(x.as_f32()? as f64),
        (Literal::Double(_), DataType::Int32) => Literal::Int(x.as_f64()? as i32),
        (Literal::Double(_), DataType::Int64) => Literal::Long(x.as_f64()? as i64),
        (Literal::Double(_), DataType::Float32) => Literal::float(x.as_f64()? as f32),
        _ => return None,
    })
}

/// Outcome of a condition over two values, including the non-floating
/// `x op x` case where the operands need not be constant.
pub fn evaluate_condition_of(
    graph: &Graph,
    cond: IfCondition,
    bias: ComparisonBias,
    left: InstId,
    right: InstId,
) -> Option<bool> {
    if left == right && !graph.insts[left].ty.is_floating_point() {
        return Some(cond.has_equality());
    }
    evaluate_condition(cond, bias, graph.literal(left)?, graph.literal(right)?)
}

/// Interned constant equal to `i`, if its inputs make it one.
pub fn try_static_evaluation(graph: &mut Graph, i: InstId) -> Option<InstId> {
    let lit = {
        let inst = &graph.insts[i];
        let lit = |x: &InstId| graph.literal(*x);
        match &inst.kind {
            InstKind::Unary { op, input } => evaluate_unary(*op, lit(input)?)?,
            InstKind::Binary { op, left, right } => evaluate_binary(*op, lit(left)?, lit(right)?)?,
            InstKind::Condition {
                cond,
                left,
                right,
                bias,
            } => Literal::bool(evaluate_condition(*cond, *bias, lit(left)?, lit(right)?)?),
            InstKind::Compare { left, right, bias } => {
                Literal::Int(evaluate_compare(*bias, lit(left)?, lit(right)?)?)
            }
            InstKind::TypeConversion { input } => evaluate_conversion(lit(input)?, inst.ty)?,
            _ => return None,
        }
    };
    Some(graph.constant(lit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_arithmetic_wraps() {
        assert_eq!(
            evaluate_binary(BinaryOp::Add, Literal::Int(i32::MAX), Literal::Int(1)),
            Some(Literal::Int(i32::MIN))
        );
        assert_eq!(
            evaluate_binary(BinaryOp::Div, Literal::Int(i32::MIN), Literal::Int(-1)),
            Some(Literal::Int(i32::MIN))
        );
        assert_eq!(
            evaluate_binary(BinaryOp::Rem, Literal::Long(i64::MIN), Literal::Long(-1)),
            Some(Literal::Long(0))
        );
    }
    #[test]
    fn division_by_zero_is_not_folded() {
        assert_eq!(evaluate_binary(BinaryOp::Div, Literal::Int(1), Literal::Int(0)), None);
        assert_eq!(evaluate_binary(BinaryOp::Rem, Literal::Long(1), Literal::Long(0)), None);
        assert_eq!(
            evaluate_binary(BinaryOp::Div, Literal::float(1.0), Literal::float(0.0)),
            Some(Literal::float(f32::INFINITY))
        );
    }
    #[test]
    fn shift_distance_is_masked() {
        assert_eq!(
            evaluate_binary(BinaryOp::Shl, Literal::Int(1), Literal::Int(33)),
            Some(Literal::Int(2))
        );
        assert_eq!(
            evaluate_binary(BinaryOp::UShr, Literal::Int(-1), Literal::Int(28)),
            Some(Literal::Int(0xf))
        );
        assert_eq!(
            evaluate_binary(BinaryOp::Shr, Literal::Long(-16), Literal::Int(66)),
            Some(Literal::Long(-4))
        );
        assert_eq!(
            evaluate_binary(BinaryOp::UShr, Literal::Long(-1), Literal::Int(60)),
            Some(Literal::Long(0xf))
        );
    }
    #[test]
    fn mismatched_kinds_do_not_fold() {
        assert_eq!(evaluate_binary(BinaryOp::Add, Literal::Int(1), Literal::Long(1)), None);
        assert_eq!(evaluate_binary(BinaryOp::Shl, Literal::Long(1), Literal::Long(1)), None);
        assert_eq!(evaluate_binary(BinaryOp::And, Literal::float(1.0), Literal::float(1.0)), None);
    }
    #[test]
    fn unsigned_conditions() {
        assert_eq!(
            evaluate_condition(IfCondition::B, ComparisonBias::NoBias, Literal::Int(1), Literal::Int(-1)),
            Some(true)
        );
        assert_eq!(
            evaluate_condition(IfCondition::Lt, ComparisonBias::NoBias, Literal::Int(1), Literal::Int(-1)),
            Some(false)
        );
    }
    #[test]
    fn nan_comparisons_follow_bias() {
        let nan = Literal::double(f64::NAN);
        let one = Literal::double(1.0);
        assert_eq!(evaluate_compare(ComparisonBias::GtBias, nan, one), Some(1));
        assert_eq!(evaluate_compare(ComparisonBias::LtBias, one, nan), Some(-1));
        assert_eq!(evaluate_compare(ComparisonBias::NoBias, one, nan), None);
        assert_eq!(
            evaluate_condition(IfCondition::Lt, ComparisonBias::GtBias, nan, one),
            Some(false)
        );
        assert_eq!(
            evaluate_condition(IfCondition::Lt, ComparisonBias::LtBias, nan, one),
            Some(true)
        );
        assert_eq!(evaluate_condition(IfCondition::Eq, ComparisonBias::GtBias, nan, nan), Some(false));
        assert_eq!(evaluate_condition(IfCondition::Ne, ComparisonBias::NoBias, nan, nan), Some(true));
    }
    #[test]
    fn conversions_saturate() {
        assert_eq!(
            evaluate_conversion(Literal::float(f32::NAN), DataType::Int32),
            Some(Literal::Int(0))
        );
        assert_eq!(
            evaluate_conversion(Literal::double(1e300), DataType::Int64),
            Some(Literal::Long(i64::MAX))
        );
        assert_eq!(evaluate_conversion(Literal::Int(300), DataType::Int8), Some(Literal::Int(44)));
        assert_eq!(
            evaluate_conversion(Literal::Int(-1), DataType::Uint16),
            Some(Literal::Int(0xffff))
        );
        assert_eq!(evaluate_conversion(Literal::Long(1), DataType::Bool), None);
    }
    #[test]
    fn unary() {
        assert_eq!(evaluate_unary(UnaryOp::Neg, Literal::Int(i32::MIN)), Some(Literal::Int(i32::MIN)));
        assert_eq!(evaluate_unary(UnaryOp::Not, Literal::Long(0)), Some(Literal::Long(-1)));
        assert_eq!(evaluate_unary(UnaryOp::BooleanNot, Literal::Int(1)), Some(Literal::Int(0)));
        assert_eq!(evaluate_unary(UnaryOp::Not, Literal::float(1.0)), None);
    }
}

//! Identities where one input decides the result regardless of the other.
//!
//! | pattern                               | result        |
//! |---------------------------------------|---------------|
//! | `0 << x`, `0 >> x`, `0 >>> x`         | the zero      |
//! | `x & 0`, `x & ~x`                     | 0             |
//! | `x * 0` (int, long)                   | 0             |
//! | `x \| -1`                             | -1            |
//! | `0 % x`, `x % ±1`, `x % x` (integral) | 0             |
//! | `x - x` (integral), `x ^ x`           | 0             |
//! | `non_null == null` / `!=`             | false / true  |
//! | `0 >u x`, `x <u 0`                    | false         |
//! | `x >=u 0`, `0 <=u x`                  | true          |
//! | `compare(x, NaN)` (floating)          | +1 gt bias, -1 lt bias |
use hir_ssa::{Graph, InstId, InstKind, Literal};
use sable_common::{BinaryOp, IfCondition, UnaryOp};

enum Absorbed {
    Existing(InstId),
    Lit(Literal),
}

/// The constant side of a pair of operands, right preferred, along with the
/// other side.
fn constant_side(graph: &Graph, left: InstId, right: InstId) -> Option<(Literal, InstId, InstId)> {
    if let Some(l) = graph.literal(right) {
        return Some((l, right, left));
    }
    graph.literal(left).map(|l| (l, left, right))
}
fn is_not_of(graph: &Graph, a: InstId, b: InstId) -> bool {
    matches!(graph.insts[a].kind, InstKind::Unary { op: UnaryOp::Not, input } if input == b)
}
fn is_zero(graph: &Graph, i: InstId) -> bool {
    graph.literal(i).is_some_and(Literal::is_arithmetic_zero)
}

fn binary(graph: &Graph, i: InstId, op: BinaryOp, left: InstId, right: InstId) -> Option<Absorbed> {
    let ty = graph.insts[i].ty;
    let zero = Absorbed::Lit(Literal::of_type(ty, 0));
    match op {
        BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr if is_zero(graph, left) => {
            Some(Absorbed::Existing(left))
        }
        BinaryOp::And => match constant_side(graph, left, right) {
            Some((c, cst, _)) if c.is_zero_bit_pattern() => Some(Absorbed::Existing(cst)),
            _ if is_not_of(graph, left, right) || is_not_of(graph, right, left) => Some(zero),
            _ => None,
        },
        BinaryOp::Mul if ty.is_int_or_long() => match constant_side(graph, left, right) {
            Some((c, cst, _)) if c.is_arithmetic_zero() => Some(Absorbed::Existing(cst)),
            _ => None,
        },
        BinaryOp::Or => match constant_side(graph, left, right) {
            Some((c, cst, _)) if c.is_minus_one() => Some(Absorbed::Existing(cst)),
            _ => None,
        },
        BinaryOp::Rem if ty.is_integral() => {
            if is_zero(graph, left) {
                Some(Absorbed::Existing(left))
            } else if graph
                .literal(right)
                .is_some_and(|c| c.is_one() || c.is_minus_one())
                || left == right
            {
                Some(zero)
            } else {
                None
            }
        }
        BinaryOp::Sub if ty.is_integral() && left == right => Some(zero),
        BinaryOp::Xor if left == right => Some(zero),
        _ => None,
    }
}

fn condition(graph: &Graph, cond: IfCondition, left: InstId, right: InstId) -> Option<Absorbed> {
    let result = match cond {
        IfCondition::Eq | IfCondition::Ne => {
            let non_null_vs_null = (graph.is_null_constant(left) && !graph.can_be_null(right))
                || (graph.is_null_constant(right) && !graph.can_be_null(left));
            if !non_null_vs_null {
                return None;
            }
            cond == IfCondition::Ne
        }
        IfCondition::A if is_zero(graph, left) => false,
        IfCondition::Ae if is_zero(graph, right) => true,
        IfCondition::B if is_zero(graph, right) => false,
        IfCondition::Be if is_zero(graph, left) => true,
        _ => return None,
    };
    Some(Absorbed::Lit(Literal::bool(result)))
}

/// Replacement value for `i` under the identities above. Constants needed
/// for the result are interned on demand.
pub fn try_absorb(graph: &mut Graph, i: InstId) -> Option<InstId> {
    let absorbed = match graph.insts[i].kind {
        InstKind::Binary { op, left, right } => binary(graph, i, op, left, right)?,
        InstKind::Condition {
            cond, left, right, ..
        } => condition(graph, cond, left, right)?,
        InstKind::Compare { left, right, bias } => {
            let (c, _, other) = constant_side(graph, left, right)?;
            if !c.is_nan() || !graph.insts[other].ty.is_floating_point() {
                return None;
            }
            Absorbed::Lit(Literal::Int(bias.unordered_result()?))
        }
        _ => return None,
    };
    Some(match absorbed {
        Absorbed::Existing(x) => x,
        Absorbed::Lit(l) => graph.constant(l),
    })
}

//! Instruction payloads.
//!
//! An [`InstKind`] is generic over its operand type so that the same shape
//! can be matched on ids (`InstKind<InstId>`, the default) or on anything a
//! pass wants to substitute.
use sable_common::{BinaryOp, ComparisonBias, DataType, IfCondition, SideEffects, UnaryOp};

use crate::InstId;

/// Value of a constant, keyed by bit pattern.
///
/// Floating-point payloads are stored as raw bits so that `0.0` and `-0.0`,
/// or two NaNs with different payloads, intern to distinct constants.
/// Booleans, bytes, shorts and chars all travel as `Int`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Literal {
    Int(i32),
    Long(i64),
    Float(u32),
    Double(u64),
    Null,
}
impl Literal {
    pub fn float(v: f32) -> Self {
        Literal::Float(v.to_bits())
    }
    pub fn double(v: f64) -> Self {
        Literal::Double(v.to_bits())
    }
    pub fn bool(v: bool) -> Self {
        Literal::Int(v as i32)
    }
    /// A constant of `ty` holding `value`, with floating types taking
    /// `value` as their bit pattern.
    pub fn of_type(ty: DataType, value: i64) -> Self {
        match ty.kind() {
            DataType::Int64 => Literal::Long(value),
            DataType::Float32 => Literal::Float(value as u32),
            DataType::Float64 => Literal::Double(value as u64),
            DataType::Reference => Literal::Null,
            _ => Literal::Int(value as i32),
        }
    }
    pub fn ty(self) -> DataType {
        match self {
            Literal::Int(_) => DataType::Int32,
            Literal::Long(_) => DataType::Int64,
            Literal::Float(_) => DataType::Float32,
            Literal::Double(_) => DataType::Float64,
            Literal::Null => DataType::Reference,
        }
    }
    pub fn as_f32(self) -> Option<f32> {
        match self {
            Literal::Float(bits) => Some(f32::from_bits(bits)),
            _ => None,
        }
    }
    pub fn as_f64(self) -> Option<f64> {
        match self {
            Literal::Double(bits) => Some(f64::from_bits(bits)),
            _ => None,
        }
    }
    /// Integral payload widened to 64 bits.
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Literal::Int(a) => Some(a as i64),
            Literal::Long(a) => Some(a),
            _ => None,
        }
    }
    /// Equal to zero under the type's own `==`, so `-0.0` counts.
    pub fn is_arithmetic_zero(self) -> bool {
        match self {
            Literal::Int(a) => a == 0,
            Literal::Long(a) => a == 0,
            Literal::Float(bits) => f32::from_bits(bits) == 0.0,
            Literal::Double(bits) => f64::from_bits(bits) == 0.0,
            Literal::Null => false,
        }
    }
    pub fn is_zero_bit_pattern(self) -> bool {
        match self {
            Literal::Int(a) => a == 0,
            Literal::Long(a) => a == 0,
            Literal::Float(bits) => bits == 0,
            Literal::Double(bits) => bits == 0,
            Literal::Null => true,
        }
    }
    pub fn is_one(self) -> bool {
        self.as_i64() == Some(1)
    }
    pub fn is_minus_one(self) -> bool {
        self.as_i64() == Some(-1)
    }
    pub fn is_nan(self) -> bool {
        match self {
            Literal::Float(bits) => f32::from_bits(bits).is_nan(),
            Literal::Double(bits) => f64::from_bits(bits).is_nan(),
            _ => false,
        }
    }
}

bitflags::bitflags! {
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
    pub struct InstFlags: u32{
        /// Every execution ends in an exception.
        const ALWAYS_THROWS = 0x1;
        /// A reference result may be null.
        const CAN_BE_NULL = 0x2;
        /// The call is known not to throw.
        const NO_THROW = 0x4;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum InstKind<I = InstId> {
    Constant(Literal),
    Parameter {
        index: u32,
    },
    /// Inputs are index-correlated with the block's predecessors.
    Phi {
        inputs: Vec<I>,
    },
    Unary {
        op: UnaryOp,
        input: I,
    },
    /// Shift distances are always `Int32`, also for `Int64` shifts.
    Binary {
        op: BinaryOp,
        left: I,
        right: I,
    },
    Condition {
        cond: IfCondition,
        left: I,
        right: I,
        bias: ComparisonBias,
    },
    /// Three-way comparison yielding -1, 0 or 1.
    Compare {
        left: I,
        right: I,
        bias: ComparisonBias,
    },
    /// Converts `input` to the instruction's own type.
    TypeConversion {
        input: I,
    },
    Select {
        cond: I,
        if_true: I,
        if_false: I,
    },
    /// Passes its input through, throwing if it is zero.
    DivZeroCheck {
        input: I,
    },
    /// Passes its input through, throwing if it is null.
    NullCheck {
        input: I,
    },
    /// Alias of `input` known to be non-null.
    BoundType {
        input: I,
    },
    NewInstance {
        class: u32,
    },
    FieldGet {
        obj: I,
        field: u32,
    },
    FieldSet {
        obj: I,
        field: u32,
        value: I,
    },
    Invoke {
        method: u32,
        args: Vec<I>,
    },
}
impl<I> InstKind<I> {
    pub fn inputs<'a>(&'a self) -> Box<dyn Iterator<Item = &'a I> + 'a> {
        match self {
            InstKind::Constant(_) | InstKind::Parameter { .. } | InstKind::NewInstance { .. } => {
                Box::new(std::iter::empty())
            }
            InstKind::Phi { inputs } => Box::new(inputs.iter()),
            InstKind::Invoke { args, .. } => Box::new(args.iter()),
            InstKind::Unary { input, .. }
            | InstKind::TypeConversion { input }
            | InstKind::DivZeroCheck { input }
            | InstKind::NullCheck { input }
            | InstKind::BoundType { input }
            | InstKind::FieldGet { obj: input, .. } => Box::new(std::iter::once(input)),
            InstKind::Binary { left, right, .. }
            | InstKind::Condition { left, right, .. }
            | InstKind::Compare { left, right, .. }
            | InstKind::FieldSet {
                obj: left,
                value: right,
                ..
            } => Box::new([left, right].into_iter()),
            InstKind::Select {
                cond,
                if_true,
                if_false,
            } => Box::new([cond, if_true, if_false].into_iter()),
        }
    }
    pub fn inputs_mut<'a>(&'a mut self) -> Box<dyn Iterator<Item = &'a mut I> + 'a> {
        match self {
            InstKind::Constant(_) | InstKind::Parameter { .. } | InstKind::NewInstance { .. } => {
                Box::new(std::iter::empty())
            }
            InstKind::Phi { inputs } => Box::new(inputs.iter_mut()),
            InstKind::Invoke { args, .. } => Box::new(args.iter_mut()),
            InstKind::Unary { input, .. }
            | InstKind::TypeConversion { input }
            | InstKind::DivZeroCheck { input }
            | InstKind::NullCheck { input }
            | InstKind::BoundType { input }
            | InstKind::FieldGet { obj: input, .. } => Box::new(std::iter::once(input)),
            InstKind::Binary { left, right, .. }
            | InstKind::Condition { left, right, .. }
            | InstKind::Compare { left, right, .. }
            | InstKind::FieldSet {
                obj: left,
                value: right,
                ..
            } => Box::new([left, right].into_iter()),
            InstKind::Select {
                cond,
                if_true,
                if_false,
            } => Box::new([cond, if_true, if_false].into_iter()),
        }
    }
    pub fn is_phi(&self) -> bool {
        matches!(self, InstKind::Phi { .. })
    }
    pub fn side_effects(&self) -> SideEffects {
        match self {
            InstKind::FieldGet { .. } => SideEffects::FIELD_READ,
            InstKind::FieldSet { .. } => SideEffects::FIELD_WRITE,
            InstKind::NewInstance { .. } => SideEffects::ALLOCATION,
            InstKind::Invoke { .. } => SideEffects::CALL,
            _ => SideEffects::empty(),
        }
    }
    pub fn name(&self) -> &'static str {
        match self {
            InstKind::Constant(Literal::Int(_)) => "IntConstant",
            InstKind::Constant(Literal::Long(_)) => "LongConstant",
            InstKind::Constant(Literal::Float(_)) => "FloatConstant",
            InstKind::Constant(Literal::Double(_)) => "DoubleConstant",
            InstKind::Constant(Literal::Null) => "NullConstant",
            InstKind::Parameter { .. } => "Parameter",
            InstKind::Phi { .. } => "Phi",
            InstKind::Unary { op, .. } => op.name(),
            InstKind::Binary { op, .. } => op.name(),
            InstKind::Condition { .. } => "Condition",
            InstKind::Compare { .. } => "Compare",
            InstKind::TypeConversion { .. } => "TypeConversion",
            InstKind::Select { .. } => "Select",
            InstKind::DivZeroCheck { .. } => "DivZeroCheck",
            InstKind::NullCheck { .. } => "NullCheck",
            InstKind::BoundType { .. } => "BoundType",
            InstKind::NewInstance { .. } => "NewInstance",
            InstKind::FieldGet { .. } => "InstanceFieldGet",
            InstKind::FieldSet { .. } => "InstanceFieldSet",
            InstKind::Invoke { .. } => "Invoke",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn literal_predicates_follow_type_semantics() {
        assert!(Literal::float(-0.0).is_arithmetic_zero());
        assert!(!Literal::float(-0.0).is_zero_bit_pattern());
        assert!(Literal::double(0.0).is_zero_bit_pattern());
        assert!(Literal::Long(-1).is_minus_one());
        assert!(Literal::double(f64::NAN).is_nan());
        assert_ne!(Literal::float(0.0), Literal::float(-0.0));
        assert_eq!(Literal::of_type(DataType::Bool, 1), Literal::Int(1));
        assert_eq!(Literal::of_type(DataType::Int64, 0), Literal::Long(0));
    }
    #[test]
    fn inputs_follow_declaration_order() {
        let k: InstKind<u32> = InstKind::FieldSet {
            obj: 1,
            field: 0,
            value: 2,
        };
        assert_eq!(k.inputs().copied().collect::<Vec<_>>(), vec![1, 2]);
        let mut k: InstKind<u32> = InstKind::Select {
            cond: 0,
            if_true: 1,
            if_false: 2,
        };
        for a in k.inputs_mut() {
            *a += 10;
        }
        assert_eq!(k.inputs().copied().collect::<Vec<_>>(), vec![10, 11, 12]);
    }
}

//! Vocabulary shared by the sable graph and its optimizations.
//!
//! Everything in here is plain data: primitive types, comparison conditions,
//! arithmetic operators, side-effect sets and the kinds of compilation
//! statistics the passes report. None of it knows about blocks or
//! instructions, which keeps the crate `no_std`.
#![cfg_attr(not(test), no_std)]
pub mod cond;
pub mod effects;
pub mod ops;
pub mod stats;
pub use cond::{ComparisonBias, IfCondition};
pub use effects::SideEffects;
pub use ops::{BinaryOp, UnaryOp};
pub use stats::MethodCompilationStat;

/// Primitive type of an SSA value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[non_exhaustive]
pub enum DataType {
    Bool,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Int64,
    Float32,
    Float64,
    Reference,
    #[default]
    Void,
}
impl DataType {
    /// Integral in the arithmetic sense; `Bool` is not.
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            DataType::Int8
                | DataType::Uint8
                | DataType::Int16
                | DataType::Uint16
                | DataType::Int32
                | DataType::Int64
        )
    }
    pub fn is_int_or_long(self) -> bool {
        matches!(self, DataType::Int32 | DataType::Int64)
    }
    pub fn is_floating_point(self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }
    pub fn is_reference(self) -> bool {
        matches!(self, DataType::Reference)
    }
    /// The type values of `self` are held in once loaded: sub-word integers
    /// and booleans widen to `Int32`.
    pub fn kind(self) -> DataType {
        match self {
            DataType::Bool
            | DataType::Int8
            | DataType::Uint8
            | DataType::Int16
            | DataType::Uint16 => DataType::Int32,
            a => a,
        }
    }
    pub fn name(self) -> &'static str {
        match self {
            DataType::Bool => "bool",
            DataType::Int8 => "i8",
            DataType::Uint8 => "u8",
            DataType::Int16 => "i16",
            DataType::Uint16 => "u16",
            DataType::Int32 => "i32",
            DataType::Int64 => "i64",
            DataType::Float32 => "f32",
            DataType::Float64 => "f64",
            DataType::Reference => "ref",
            DataType::Void => "void",
        }
    }
}

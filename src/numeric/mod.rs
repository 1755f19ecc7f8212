// ============================================================================
// Numeric Module
// Fixed-point values and the per-format arithmetic contract
// ============================================================================
//
// This module provides:
// - FixValue: one raw word plus the format identity interpreting it
// - ArithmeticContract: the complete stateless operation set of one format
// - NumericError: error types for derivation and arithmetic
//
// Design principles:
// - Deterministic: no floating point inside the arithmetic core, every
//   intermediate runs in a double-width integer accumulator
// - All fallible arithmetic returns Result (no panics)
// - Overflow on unchecked paths wraps per two's complement, by contract

pub mod contract;
pub mod errors;
pub mod value;

pub use contract::{half_unit_bias, ArithmeticContract};
pub use errors::{NumericError, NumericResult};
pub use value::FixValue;

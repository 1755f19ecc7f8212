// ============================================================================
// qformat Library
// Deterministic fixed-point format family engine with mixed-precision
// promotion
// ============================================================================

//! # qformat
//!
//! A family of parameterized binary fixed-point formats ("Qm.f": m integer
//! bits, f fractional bits, signed or unsigned, 8/16/32/64-bit words) for
//! deterministic, allocation-free arithmetic where floating point is
//! unavailable, non-deterministic, or too slow.
//!
//! ## Features
//!
//! - **Format derivation** from (word, fractional bits): bit masks,
//!   representable range, canonical name, double-width accumulator word,
//!   signed counterpart
//! - **Rounding-correct arithmetic** per format: conversions, add/sub,
//!   half-bias multiply, precision-preserving divide, frac/whole split
//! - **Mixed-precision promotion**: derived rules for every eligible
//!   ordered format pair, with alignment shifting and result-format
//!   selection
//! - **Derived aggregate types** (vectors, complex) composed over one
//!   scalar format
//! - **Emitter seam** for external code generators; the core never renders
//!   or writes artifacts
//!
//! ## Example
//!
//! ```rust
//! use qformat::prelude::*;
//! use std::sync::Arc;
//!
//! // Derive the classic signed 32-bit family
//! let config = FamilyConfig::signed_32bit();
//! let family = FormatFamily::build(&config, Arc::new(NoOpDiagnostics)).unwrap();
//!
//! // Pick a format and do exact arithmetic through its contract
//! let q16 = family.by_name("qs15_16").unwrap();
//! let contract = family.contract(q16.spec()).unwrap();
//!
//! let a = contract.from_double(1.5).unwrap();
//! let b = contract.from_double(2.0).unwrap();
//! let product = contract.mul(a, b).unwrap();
//! assert_eq!(contract.to_double(product).unwrap(), 3.0);
//!
//! // Combine different formats through a derived promotion rule; the
//! // result lands in the anchoring (left) format
//! let q8 = family.by_name("qs23_8").unwrap();
//! let c8 = family.contract(q8.spec()).unwrap();
//! let coarse = c8.from_int(2).unwrap();
//! let sum = family.promote(OperatorKind::Add, coarse, a).unwrap();
//! assert_eq!(c8.to_double(sum).unwrap(), 3.5);
//! ```

pub mod aggregate;
pub mod domain;
pub mod engine;
pub mod interfaces;
pub mod numeric;

// Re-exports for convenience
pub mod prelude {
    pub use crate::aggregate::{ComplexType, ComplexValue, VectorType, VectorValue};
    pub use crate::domain::{
        FamilyConfig, FixedPointFormat, FormatSpec, FractionalSelection, MaskSet, OperatorKind,
        RangeInfo, ShiftDirection, WordFormat, WordWidth,
    };
    pub use crate::engine::{create_from_config, FamilyBuilder, FormatFamily, PromotionRule};
    pub use crate::interfaces::{
        DiagnosticsHandler, FamilyEvent, FormatDescriptor, LoggingDiagnostics, NoOpDiagnostics,
        TypeEmitter,
    };
    pub use crate::numeric::{ArithmeticContract, FixValue, NumericError, NumericResult};
}

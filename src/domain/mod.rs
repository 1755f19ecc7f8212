// ============================================================================
// Domain Models Module
// Contains the format-family value types and configuration
// ============================================================================

pub mod config;
pub mod format;
pub mod masks;
pub mod operator;
pub mod word;

pub use config::{FamilyConfig, FractionalSelection};
pub use format::{FixedPointFormat, FormatSpec, RangeInfo};
pub use masks::MaskSet;
pub use operator::{OperatorKind, ShiftDirection};
pub use word::{WordFormat, WordWidth};

// ============================================================================
// Engine Module
// Contains the family derivation and promotion-rule logic
// ============================================================================

mod family;
mod promotion;

pub mod factory;

pub use factory::{create_from_config, FamilyBuilder};
pub use family::FormatFamily;
pub use promotion::{eligible, PromotionRule};

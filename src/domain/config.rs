// ============================================================================
// Family Configuration
// Word set, fractional-bit selection, and checking flags for a family build
// ============================================================================

use super::format::FormatSpec;
use super::word::{WordFormat, WordWidth};
use smallvec::SmallVec;

// ============================================================================
// Fractional-Bit Selection
// ============================================================================

/// How the fractional-bit axis of the family is enumerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FractionalSelection {
    /// Every fractional-bit count each word can carry (0 through
    /// `width - sign_bit`).
    FullRange,
    /// An explicit curated list, applied to every word. Counts a word
    /// cannot carry are skipped for that word during the build.
    Explicit(Vec<u32>),
}

// ============================================================================
// Family Configuration
// ============================================================================

/// Configuration consumed by a family build.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyConfig {
    /// The word formats to enumerate. At most the 8 constructible words.
    pub words: SmallVec<[WordFormat; 8]>,

    /// Fractional-bit enumeration across those words.
    pub fractional_bits: FractionalSelection,

    /// Reject out-of-range conversion inputs with `OutOfRange`. When off,
    /// inputs truncate per two's-complement wraparound — accepted behavior
    /// for the real-time target, not a defect.
    pub range_checks: bool,

    /// Test multiply intermediates against the overflow-check mask and log
    /// a non-fatal warning on overflow. Results still wrap.
    pub overflow_checks: bool,
}

impl FamilyConfig {
    /// Create a configuration from an explicit word list.
    pub fn new(words: impl IntoIterator<Item = WordFormat>) -> Self {
        Self {
            words: words.into_iter().collect(),
            fractional_bits: FractionalSelection::FullRange,
            range_checks: false,
            overflow_checks: false,
        }
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Builder method: restrict fractional bits to an explicit list.
    pub fn with_fractional_bits(mut self, fractional_bits: impl IntoIterator<Item = u32>) -> Self {
        self.fractional_bits = FractionalSelection::Explicit(fractional_bits.into_iter().collect());
        self
    }

    /// Builder method: enable or disable conversion range checks.
    pub fn with_range_checks(mut self, enabled: bool) -> Self {
        self.range_checks = enabled;
        self
    }

    /// Builder method: enable or disable multiply overflow checks.
    pub fn with_overflow_checks(mut self, enabled: bool) -> Self {
        self.overflow_checks = enabled;
        self
    }

    // ========================================================================
    // Presets
    // ========================================================================

    /// Every constructible format: all 8 words, full fractional range.
    pub fn standard() -> Self {
        Self::new(WordFormat::all())
    }

    /// The classic signed 32-bit sweep (qs31_0 through qs0_31).
    pub fn signed_32bit() -> Self {
        Self::new([WordFormat::new(WordWidth::W32, true)])
    }

    /// Small-word profile for 8/16-bit targets, with both checks on.
    pub fn embedded() -> Self {
        Self::new([
            WordFormat::new(WordWidth::W8, false),
            WordFormat::new(WordWidth::W8, true),
            WordFormat::new(WordWidth::W16, false),
            WordFormat::new(WordWidth::W16, true),
        ])
        .with_range_checks(true)
        .with_overflow_checks(true)
    }

    // ========================================================================
    // Validation and enumeration
    // ========================================================================

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.words.is_empty() {
            return Err("Word format list cannot be empty".to_string());
        }

        if self.words.iter().any(|w| w.width == WordWidth::W128) {
            return Err("128-bit words are accumulators only, not format words".to_string());
        }

        let mut seen = self.words.to_vec();
        seen.sort();
        seen.dedup();
        if seen.len() != self.words.len() {
            return Err("Word format list contains duplicates".to_string());
        }

        if let FractionalSelection::Explicit(list) = &self.fractional_bits {
            if list.is_empty() {
                return Err("Explicit fractional-bit list cannot be empty".to_string());
            }
            if list.iter().any(|&f| f > 64) {
                return Err("Fractional bits cannot exceed 64".to_string());
            }
        }

        Ok(())
    }

    /// The cartesian product this configuration describes, in deterministic
    /// order. Specs that fail the bit-budget invariant are *included* here;
    /// the family build is what skips and reports them.
    pub fn enumerate(&self) -> Vec<FormatSpec> {
        let mut specs = Vec::new();
        for &word in &self.words {
            match &self.fractional_bits {
                FractionalSelection::FullRange => {
                    for f in 0..=(word.bits() - word.sign_bit()) {
                        specs.push(FormatSpec::new(word, f));
                    }
                },
                FractionalSelection::Explicit(list) => {
                    for &f in list {
                        specs.push(FormatSpec::new(word, f));
                    }
                },
            }
        }
        specs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_preset() {
        let config = FamilyConfig::standard();
        assert_eq!(config.words.len(), 8);
        assert!(config.validate().is_ok());
        assert!(!config.range_checks);
        assert!(!config.overflow_checks);
    }

    #[test]
    fn test_signed_32bit_enumeration() {
        let config = FamilyConfig::signed_32bit();
        let specs = config.enumerate();
        // f in 0..=31 for a signed 32-bit word
        assert_eq!(specs.len(), 32);
        assert!(specs.iter().all(|s| s.is_valid()));
        assert_eq!(specs[16].name(), "qs15_16");
    }

    #[test]
    fn test_builder_pattern() {
        let config = FamilyConfig::signed_32bit()
            .with_fractional_bits([8, 16, 24])
            .with_range_checks(true)
            .with_overflow_checks(true);

        assert!(config.range_checks);
        assert!(config.overflow_checks);
        assert_eq!(config.enumerate().len(), 3);
    }

    #[test]
    fn test_validation_rejects_empty_words() {
        let config = FamilyConfig::new([]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_accumulator_word() {
        let config = FamilyConfig::new([WordFormat::new(WordWidth::W128, true)]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_duplicates() {
        let w = WordFormat::new(WordWidth::W16, true);
        let config = FamilyConfig::new([w, w]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_list_keeps_invalid_specs_for_build() {
        // 12 fractional bits fit a 16-bit word but not an 8-bit one; the
        // enumeration carries both and the build decides.
        let config = FamilyConfig::new([
            WordFormat::new(WordWidth::W8, true),
            WordFormat::new(WordWidth::W16, true),
        ])
        .with_fractional_bits([12]);

        let specs = config.enumerate();
        assert_eq!(specs.len(), 2);
        assert!(!specs[0].is_valid());
        assert!(specs[1].is_valid());
    }

    #[test]
    fn test_embedded_preset() {
        let config = FamilyConfig::embedded();
        assert!(config.validate().is_ok());
        assert!(config.range_checks);
        assert!(config.overflow_checks);
        assert!(config.words.iter().all(|w| w.bits() <= 16));
    }
}

// ============================================================================
// Family Factory
// Creates format families with proper configuration
// ============================================================================

use crate::domain::config::FamilyConfig;
use crate::domain::word::WordFormat;
use crate::engine::family::FormatFamily;
use crate::interfaces::event_handler::DiagnosticsHandler;
use std::sync::Arc;

// ============================================================================
// Factory Functions
// ============================================================================

/// Creates a format family from configuration
///
/// # Arguments
/// * `config` - Family configuration (words, fractional bits, checks)
/// * `handler` - Diagnostics handler for build and overflow events
///
/// # Returns
/// * `Result<FormatFamily, String>` - Derived family or validation error
///
/// # Example
/// ```
/// use qformat::domain::FamilyConfig;
/// use qformat::engine::factory::create_from_config;
/// use qformat::interfaces::NoOpDiagnostics;
/// use std::sync::Arc;
///
/// let config = FamilyConfig::signed_32bit();
/// let family = create_from_config(config, Arc::new(NoOpDiagnostics)).unwrap();
/// assert_eq!(family.len(), 32);
/// ```
pub fn create_from_config(
    config: FamilyConfig,
    handler: Arc<dyn DiagnosticsHandler>,
) -> Result<FormatFamily, String> {
    // Validation happens inside the build, before any derivation
    FormatFamily::build(&config, handler)
}

// ============================================================================
// Builder Pattern for Advanced Configuration
// ============================================================================

/// Builder for creating format families with fluent API
///
/// # Example
/// ```
/// use qformat::engine::factory::FamilyBuilder;
/// use qformat::interfaces::NoOpDiagnostics;
/// use std::sync::Arc;
///
/// let family = FamilyBuilder::standard()
///     .fractional_bits([0, 4, 8, 16])
///     .range_checks(true)
///     .build(Arc::new(NoOpDiagnostics))
///     .unwrap();
/// assert!(family.by_name("qs15_16").is_some());
/// ```
pub struct FamilyBuilder {
    config: FamilyConfig,
    parallel: bool,
}

impl FamilyBuilder {
    /// Start from an explicit word list.
    pub fn new(words: impl IntoIterator<Item = WordFormat>) -> Self {
        Self {
            config: FamilyConfig::new(words),
            parallel: false,
        }
    }

    // ========================================================================
    // Preset Configurations
    // ========================================================================

    /// All 8 words, full fractional range.
    pub fn standard() -> Self {
        Self {
            config: FamilyConfig::standard(),
            parallel: false,
        }
    }

    /// The signed 32-bit sweep.
    pub fn signed_32bit() -> Self {
        Self {
            config: FamilyConfig::signed_32bit(),
            parallel: false,
        }
    }

    /// 8/16-bit words with both checks enabled.
    pub fn embedded() -> Self {
        Self {
            config: FamilyConfig::embedded(),
            parallel: false,
        }
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Restrict fractional bits to an explicit list.
    pub fn fractional_bits(mut self, fractional_bits: impl IntoIterator<Item = u32>) -> Self {
        self.config = self.config.with_fractional_bits(fractional_bits);
        self
    }

    /// Enable or disable conversion range checks.
    pub fn range_checks(mut self, enabled: bool) -> Self {
        self.config = self.config.with_range_checks(enabled);
        self
    }

    /// Enable or disable multiply overflow checks.
    pub fn overflow_checks(mut self, enabled: bool) -> Self {
        self.config = self.config.with_overflow_checks(enabled);
        self
    }

    /// Fan pass 1 out across scoped threads.
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build the family.
    pub fn build(self, handler: Arc<dyn DiagnosticsHandler>) -> Result<FormatFamily, String> {
        if self.parallel {
            FormatFamily::build_parallel(&self.config, handler)
        } else {
            FormatFamily::build(&self.config, handler)
        }
    }

    /// Get the configuration without building (for inspection)
    pub fn get_config(&self) -> &FamilyConfig {
        &self.config
    }
}

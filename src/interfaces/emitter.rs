// ============================================================================
// Type Emitter Interface
// Defines the contract between the family core and external emitters
// ============================================================================

use crate::domain::format::FixedPointFormat;
use crate::domain::masks::MaskSet;
use crate::engine::PromotionRule;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Everything the core exposes about one format, bundled for an emitter:
/// the validated descriptor (name, range, companions), its mask set, and
/// the promotion rules anchored on it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FormatDescriptor {
    pub format: FixedPointFormat,
    pub masks: MaskSet,
    pub rules: Vec<PromotionRule>,
}

/// Strategy interface for external type emitters.
///
/// Rendering a descriptor into host-language source, compiling it, and
/// placing artifacts are mechanical packaging concerns with no numeric
/// content; they live entirely behind this seam.
pub trait TypeEmitter: Send + Sync {
    /// Emit one format descriptor.
    fn emit_format(&self, descriptor: &FormatDescriptor) -> Result<(), String>;

    /// Emit a whole family. Formats are independent; implementations may
    /// parallelize, serializing only their own artifact writes.
    fn emit_family(&self, descriptors: &[FormatDescriptor]) -> Result<(), String> {
        for descriptor in descriptors {
            self.emit_format(descriptor)?;
        }
        Ok(())
    }

    /// Get the emitter name for logging/metrics
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::FamilyConfig;
    use crate::domain::word::{WordFormat, WordWidth};
    use crate::engine::FormatFamily;
    use crate::interfaces::event_handler::NoOpDiagnostics;
    use std::sync::{Arc, Mutex};

    /// Collects emitted names instead of writing artifacts.
    struct CollectingEmitter(Mutex<Vec<String>>);

    impl TypeEmitter for CollectingEmitter {
        fn emit_format(&self, descriptor: &FormatDescriptor) -> Result<(), String> {
            self.0
                .lock()
                .unwrap()
                .push(descriptor.format.name().to_string());
            Ok(())
        }

        fn name(&self) -> &str {
            "collecting"
        }
    }

    #[test]
    fn test_emit_family_default_impl() {
        let config = FamilyConfig::new([WordFormat::new(WordWidth::W8, true)]);
        let family = FormatFamily::build(&config, Arc::new(NoOpDiagnostics)).unwrap();

        let emitter = CollectingEmitter(Mutex::new(Vec::new()));
        emitter.emit_family(&family.descriptors()).unwrap();

        let emitted = emitter.0.lock().unwrap();
        assert_eq!(emitted.len(), family.len());
        assert!(emitted.contains(&"qs3_4".to_string()));
    }
}

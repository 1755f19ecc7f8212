// ============================================================================
// Diagnostics Handler Interface
// Defines the contract for observing family-build and arithmetic events
// ============================================================================

use crate::domain::operator::OperatorKind;
use crate::domain::word::WordFormat;
use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Events emitted during family derivation and checked arithmetic
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FamilyEvent {
    /// A format passed validation and joined the family
    FormatDerived {
        name: String,
        timestamp: DateTime<Utc>,
    },

    /// A (word, fractional bits) combination failed validation and was
    /// skipped; the rest of the family build continues
    FormatRejected {
        word: WordFormat,
        fractional_bits: u32,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// A multiply's double-width intermediate exceeded the overflow-check
    /// mask; the wrapped result was still produced
    OverflowDetected {
        format: String,
        operator: OperatorKind,
        timestamp: DateTime<Utc>,
    },

    /// The promotion-rule pass finished
    RulesDerived {
        format_count: usize,
        rule_count: usize,
        timestamp: DateTime<Utc>,
    },
}

/// Handler trait for processing family diagnostics
/// Implementations can handle logging, metrics, test capture, etc.
pub trait DiagnosticsHandler: Send + Sync {
    /// Handle a single event
    fn on_event(&self, event: FamilyEvent);

    /// Batch event handler (optional optimization)
    fn on_events(&self, events: Vec<FamilyEvent>) {
        for event in events {
            self.on_event(event);
        }
    }
}

/// No-op handler for testing
pub struct NoOpDiagnostics;

impl DiagnosticsHandler for NoOpDiagnostics {
    fn on_event(&self, _event: FamilyEvent) {
        // Do nothing
    }
}

/// Logging handler; warnings and rejections go to `warn`, the rest to
/// `debug`
pub struct LoggingDiagnostics;

impl DiagnosticsHandler for LoggingDiagnostics {
    fn on_event(&self, event: FamilyEvent) {
        match &event {
            FamilyEvent::FormatRejected { .. } | FamilyEvent::OverflowDetected { .. } => {
                tracing::warn!("Family diagnostics event: {:?}", event);
            },
            _ => {
                tracing::debug!("Family diagnostics event: {:?}", event);
            },
        }
    }
}

// ============================================================================
// Format Family
// Two-pass derivation of the format set and its promotion rules
// ============================================================================

use super::promotion::PromotionRule;
use crate::domain::config::FamilyConfig;
use crate::domain::format::{FixedPointFormat, FormatSpec};
use crate::domain::masks::MaskSet;
use crate::domain::operator::OperatorKind;
use crate::interfaces::emitter::FormatDescriptor;
use crate::interfaces::event_handler::{DiagnosticsHandler, FamilyEvent};
use crate::numeric::contract::ArithmeticContract;
use crate::numeric::errors::{NumericError, NumericResult};
use crate::numeric::value::FixValue;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

/// The derived family: every validated format plus the full promotion-rule
/// set over its eligible ordered pairs.
///
/// Building runs in two passes. Pass 1 derives each format independently
/// from its own (word, fractional bits) — a combination that fails the bit
/// budget is skipped and reported, never fatal. Pass 2 needs the whole
/// format set and derives one rule per eligible (lhs, rhs, operator)
/// triple. Everything is immutable once built.
pub struct FormatFamily {
    range_checks: bool,
    overflow_checks: bool,
    formats: Vec<FixedPointFormat>,
    index: HashMap<FormatSpec, usize>,
    rules: HashMap<(FormatSpec, FormatSpec, OperatorKind), PromotionRule>,
    handler: Arc<dyn DiagnosticsHandler>,
}

impl FormatFamily {
    // ========================================================================
    // Building
    // ========================================================================

    /// Build a family sequentially.
    ///
    /// # Errors
    /// Returns the configuration's validation error; individual format
    /// rejections are events, not errors.
    pub fn build(
        config: &FamilyConfig,
        handler: Arc<dyn DiagnosticsHandler>,
    ) -> Result<Self, String> {
        config.validate()?;
        let outcomes: Vec<_> = Self::deduped_specs(config)
            .into_iter()
            .map(|spec| (spec, FixedPointFormat::from_spec(spec)))
            .collect();
        Ok(Self::assemble(config, outcomes, handler))
    }

    /// Build a family with pass 1 fanned out across one scoped thread per
    /// configured word. Identical results to [`FormatFamily::build`];
    /// per-format derivation depends on nothing but the format's own spec.
    pub fn build_parallel(
        config: &FamilyConfig,
        handler: Arc<dyn DiagnosticsHandler>,
    ) -> Result<Self, String> {
        config.validate()?;
        let specs = Self::deduped_specs(config);

        let mut chunks: Vec<Vec<FormatSpec>> = Vec::new();
        for spec in specs {
            let same_word = chunks
                .last()
                .is_some_and(|chunk| chunk[0].word == spec.word);
            if same_word {
                if let Some(chunk) = chunks.last_mut() {
                    chunk.push(spec);
                }
            } else {
                chunks.push(vec![spec]);
            }
        }

        let outcomes = crossbeam::thread::scope(|scope| {
            let handles: Vec<_> = chunks
                .iter()
                .map(|chunk| {
                    scope.spawn(move |_| {
                        chunk
                            .iter()
                            .map(|&spec| (spec, FixedPointFormat::from_spec(spec)))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().expect("format derivation does not panic"))
                .collect::<Vec<_>>()
        })
        .expect("scoped threads do not panic");

        Ok(Self::assemble(config, outcomes, handler))
    }

    fn deduped_specs(config: &FamilyConfig) -> Vec<FormatSpec> {
        let mut seen = std::collections::HashSet::new();
        config
            .enumerate()
            .into_iter()
            .filter(|spec| seen.insert(*spec))
            .collect()
    }

    fn assemble(
        config: &FamilyConfig,
        outcomes: Vec<(FormatSpec, NumericResult<FixedPointFormat>)>,
        handler: Arc<dyn DiagnosticsHandler>,
    ) -> Self {
        let mut formats = Vec::with_capacity(outcomes.len());
        for (spec, outcome) in outcomes {
            match outcome {
                Ok(format) => {
                    tracing::debug!(name = %format.name(), "derived format");
                    handler.on_event(FamilyEvent::FormatDerived {
                        name: format.name().to_string(),
                        timestamp: Utc::now(),
                    });
                    formats.push(format);
                },
                Err(reason) => {
                    tracing::warn!(
                        word = %spec.word,
                        fractional_bits = spec.fractional_bits,
                        %reason,
                        "skipping format"
                    );
                    handler.on_event(FamilyEvent::FormatRejected {
                        word: spec.word,
                        fractional_bits: spec.fractional_bits,
                        reason: reason.to_string(),
                        timestamp: Utc::now(),
                    });
                },
            }
        }

        let index = formats
            .iter()
            .enumerate()
            .map(|(i, f)| (f.spec(), i))
            .collect();

        // Pass 2: rules over all eligible ordered pairs. Each triple is
        // independent, but the pass as a whole needs the full format set.
        let mut rules = HashMap::new();
        for lhs in &formats {
            for rhs in &formats {
                for operator in OperatorKind::ALL {
                    if let Some(rule) = PromotionRule::derive(operator, lhs, rhs) {
                        rules.insert((lhs.spec(), rhs.spec(), operator), rule);
                    }
                }
            }
        }

        handler.on_event(FamilyEvent::RulesDerived {
            format_count: formats.len(),
            rule_count: rules.len(),
            timestamp: Utc::now(),
        });

        Self {
            range_checks: config.range_checks,
            overflow_checks: config.overflow_checks,
            formats,
            index,
            rules,
            handler,
        }
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    #[inline]
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    #[inline]
    pub fn formats(&self) -> &[FixedPointFormat] {
        &self.formats
    }

    pub fn get(&self, spec: FormatSpec) -> Option<&FixedPointFormat> {
        self.index.get(&spec).map(|&i| &self.formats[i])
    }

    pub fn by_name(&self, name: &str) -> Option<&FixedPointFormat> {
        self.formats.iter().find(|f| f.name() == name)
    }

    #[inline]
    pub const fn range_checks(&self) -> bool {
        self.range_checks
    }

    #[inline]
    pub const fn overflow_checks(&self) -> bool {
        self.overflow_checks
    }

    /// The arithmetic contract of a member format, wired to the family's
    /// checking flags and diagnostics handler.
    pub fn contract(&self, spec: FormatSpec) -> Option<ArithmeticContract> {
        self.get(spec).map(|format| {
            ArithmeticContract::new(format.clone(), self.range_checks, self.overflow_checks)
                .with_handler(self.handler.clone())
        })
    }

    // ========================================================================
    // Promotion
    // ========================================================================

    /// The rule for one (lhs, rhs, operator) triple, when the pair is
    /// eligible.
    pub fn rule(
        &self,
        operator: OperatorKind,
        lhs: FormatSpec,
        rhs: FormatSpec,
    ) -> Option<&PromotionRule> {
        self.rules.get(&(lhs, rhs, operator))
    }

    /// Every rule anchored on `lhs`, in deterministic (rhs, operator)
    /// order.
    pub fn rules_for(&self, lhs: FormatSpec) -> Vec<&PromotionRule> {
        let mut rules = Vec::new();
        for rhs in &self.formats {
            for operator in OperatorKind::ALL {
                if let Some(rule) = self.rules.get(&(lhs, rhs.spec(), operator)) {
                    rules.push(rule);
                }
            }
        }
        rules
    }

    /// Execute a mixed-format operation through its derived rule.
    ///
    /// # Errors
    /// `IneligiblePromotion` when no rule covers the pair under this
    /// operator; `DivideByZero` propagates from Div.
    pub fn promote(
        &self,
        operator: OperatorKind,
        lhs: FixValue,
        rhs: FixValue,
    ) -> NumericResult<FixValue> {
        let rule = self
            .rule(operator, lhs.spec(), rhs.spec())
            .ok_or(NumericError::IneligiblePromotion)?;
        let result = rule.apply(lhs, rhs)?;

        if operator == OperatorKind::Mul && self.overflow_checks {
            self.check_promoted_overflow(rule, lhs, rhs);
        }
        Ok(result)
    }

    /// Same overflow policy as the single-format contract: warn, never
    /// abort.
    fn check_promoted_overflow(&self, rule: &PromotionRule, lhs: FixValue, rhs: FixValue) {
        let magnitude = lhs
            .widened()
            .unsigned_abs()
            .wrapping_mul(rhs.widened().unsigned_abs());
        // The rescale shift is sized to the rhs scale, so the valid window
        // ends at result_width - sign_bit + rhs_fractional_bits.
        let word = rule.result.word;
        let mask = MaskSet::overflow_window(
            word.bits() - word.sign_bit() + rule.shift_amount,
            word.bits() * 2,
        );
        if magnitude & mask == 0 {
            return;
        }
        tracing::warn!(
            lhs = %rule.lhs.name(),
            rhs = %rule.rhs.name(),
            "promoted multiply intermediate exceeds the overflow-check mask; result wraps"
        );
        self.handler.on_event(FamilyEvent::OverflowDetected {
            format: rule.result.name(),
            operator: OperatorKind::Mul,
            timestamp: Utc::now(),
        });
    }

    // ========================================================================
    // Emission surface
    // ========================================================================

    /// Descriptor bundles for an external type emitter, one per format, in
    /// family order.
    pub fn descriptors(&self) -> Vec<FormatDescriptor> {
        self.formats
            .iter()
            .map(|format| FormatDescriptor {
                format: format.clone(),
                masks: MaskSet::derive(format.spec()),
                rules: self
                    .rules_for(format.spec())
                    .into_iter()
                    .copied()
                    .collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::word::{WordFormat, WordWidth};
    use crate::interfaces::event_handler::NoOpDiagnostics;
    use std::sync::Mutex;

    struct RecordingDiagnostics(Mutex<Vec<FamilyEvent>>);

    impl DiagnosticsHandler for RecordingDiagnostics {
        fn on_event(&self, event: FamilyEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    fn build(config: &FamilyConfig) -> FormatFamily {
        FormatFamily::build(config, Arc::new(NoOpDiagnostics)).unwrap()
    }

    #[test]
    fn test_signed_32bit_family() {
        let family = build(&FamilyConfig::signed_32bit());
        assert_eq!(family.len(), 32);
        assert!(family.by_name("qs15_16").is_some());
        assert!(family.by_name("qs31_0").is_some());
        assert!(family.by_name("qu15_16").is_none());
    }

    #[test]
    fn test_invalid_formats_are_skipped_not_fatal() {
        // 12 fractional bits don't fit an 8-bit word; the 16-bit one stays
        let config = FamilyConfig::new([
            WordFormat::new(WordWidth::W8, true),
            WordFormat::new(WordWidth::W16, true),
        ])
        .with_fractional_bits([12]);

        let recorder = Arc::new(RecordingDiagnostics(Mutex::new(Vec::new())));
        let family = FormatFamily::build(&config, recorder.clone()).unwrap();
        assert_eq!(family.len(), 1);
        assert_eq!(family.formats()[0].name(), "qs3_12");

        let events = recorder.0.lock().unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, FamilyEvent::FormatRejected { .. })));
    }

    #[test]
    fn test_parallel_build_matches_sequential() {
        let config = FamilyConfig::standard();
        let sequential = FormatFamily::build(&config, Arc::new(NoOpDiagnostics)).unwrap();
        let parallel = FormatFamily::build_parallel(&config, Arc::new(NoOpDiagnostics)).unwrap();

        assert_eq!(sequential.len(), parallel.len());
        for (a, b) in sequential.formats().iter().zip(parallel.formats()) {
            assert_eq!(a, b);
        }
        assert_eq!(sequential.rules.len(), parallel.rules.len());
    }

    #[test]
    fn test_rule_set_is_exactly_the_eligible_pairs() {
        let family = build(&FamilyConfig::signed_32bit());
        for lhs in family.formats() {
            for rhs in family.formats() {
                for operator in OperatorKind::ALL {
                    let expected = super::super::promotion::eligible(operator, lhs, rhs);
                    let present = family.rule(operator, lhs.spec(), rhs.spec()).is_some();
                    assert_eq!(expected, present);
                }
            }
        }
    }

    #[test]
    fn test_promote_add() {
        let config = FamilyConfig::new([WordFormat::new(WordWidth::W8, true)]);
        let family = build(&config);

        let qs7_0 = family.by_name("qs7_0").unwrap().spec();
        let qs3_4 = family.by_name("qs3_4").unwrap().spec();
        let cl = family.contract(qs7_0).unwrap();
        let cr = family.contract(qs3_4).unwrap();

        let a = cl.from_int(5).unwrap();
        let b = cr.from_int(-3).unwrap();
        let sum = family.promote(OperatorKind::Add, a, b).unwrap();
        assert_eq!(cl.to_int(sum).unwrap(), 2);
    }

    #[test]
    fn test_promote_rejects_ineligible() {
        let family = build(&FamilyConfig::new([WordFormat::new(WordWidth::W8, true)]));
        let qs7_0 = family.by_name("qs7_0").unwrap().spec();
        let qs3_4 = family.by_name("qs3_4").unwrap().spec();
        let cl = family.contract(qs7_0).unwrap();
        let cr = family.contract(qs3_4).unwrap();

        // qs3_4 cannot anchor an add against qs7_0
        let a = cr.from_int(1).unwrap();
        let b = cl.from_int(1).unwrap();
        assert_eq!(
            family.promote(OperatorKind::Add, a, b).unwrap_err(),
            NumericError::IneligiblePromotion
        );
    }

    #[test]
    fn test_contract_inherits_family_flags() {
        let config = FamilyConfig::signed_32bit().with_range_checks(true);
        let family = build(&config);
        let c = family.contract(family.by_name("qs15_16").unwrap().spec()).unwrap();
        assert_eq!(c.from_int(40000).unwrap_err(), NumericError::OutOfRange);
    }

    #[test]
    fn test_descriptors_cover_every_format() {
        let family = build(&FamilyConfig::new([WordFormat::new(WordWidth::W8, false)]));
        let descriptors = family.descriptors();
        assert_eq!(descriptors.len(), family.len());
        for d in &descriptors {
            assert!(d.rules.iter().all(|r| r.lhs == d.format.spec()));
        }
    }
}

// ============================================================================
// Arithmetic Contract
// The complete stateless operation semantics of one fixed-point format
// ============================================================================

use crate::domain::format::{FixedPointFormat, FormatSpec};
use crate::domain::masks::MaskSet;
use crate::domain::operator::OperatorKind;
use crate::interfaces::event_handler::{DiagnosticsHandler, FamilyEvent, NoOpDiagnostics};
use crate::numeric::errors::{NumericError, NumericResult};
use crate::numeric::value::FixValue;
use chrono::Utc;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Rounding Bias
// ============================================================================

/// Half-unit rounding bias added to a double-width product before the
/// rescaling shift: `1 << (fractional_bits - 1)`, or 0 for pure-integer
/// formats.
///
/// Omitting this bias silently rounds every product toward negative
/// infinity instead of to nearest. It must stay a named constant, never an
/// inlined literal.
#[inline]
pub const fn half_unit_bias(fractional_bits: u32) -> i128 {
    if fractional_bits == 0 {
        0
    } else {
        1i128 << (fractional_bits - 1)
    }
}

// ============================================================================
// Arithmetic Contract
// ============================================================================

/// The full operation contract of one format.
///
/// A contract is stateless: it bundles the format descriptor, its masks,
/// and the two checking flags, and every operation is a pure function of
/// its operands. Mixed-format operands are rejected with `FormatMismatch`;
/// combining different formats is the promotion engine's job.
///
/// Conversions round **half away from zero** (`f64::round` semantics).
/// `add`/`sub`/`incr`/`decr` are raw word arithmetic and deliberately not
/// overflow-checked; out-of-range results wrap per two's complement.
#[derive(Clone)]
pub struct ArithmeticContract {
    format: FixedPointFormat,
    masks: MaskSet,
    range_checks: bool,
    overflow_checks: bool,
    handler: Arc<dyn DiagnosticsHandler>,
}

impl ArithmeticContract {
    /// Build the contract for a format.
    pub fn new(format: FixedPointFormat, range_checks: bool, overflow_checks: bool) -> Self {
        let masks = MaskSet::derive(format.spec());
        Self {
            format,
            masks,
            range_checks,
            overflow_checks,
            handler: Arc::new(NoOpDiagnostics),
        }
    }

    /// Builder method: route overflow warnings through a diagnostics
    /// handler in addition to the log.
    pub fn with_handler(mut self, handler: Arc<dyn DiagnosticsHandler>) -> Self {
        self.handler = handler;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub const fn format(&self) -> &FixedPointFormat {
        &self.format
    }

    #[inline]
    pub const fn masks(&self) -> &MaskSet {
        &self.masks
    }

    #[inline]
    const fn spec(&self) -> FormatSpec {
        self.format.spec()
    }

    #[inline]
    fn scale(&self) -> f64 {
        2f64.powi(self.format.fractional_bits() as i32)
    }

    /// The multiply rounding bias for this format. See [`half_unit_bias`].
    #[inline]
    pub const fn rounding_bias(&self) -> i128 {
        half_unit_bias(self.format.fractional_bits())
    }

    /// The value 0.
    #[inline]
    pub fn zero(&self) -> FixValue {
        FixValue::from_raw(0, self.spec())
    }

    /// The smallest positive increment (raw word 1).
    #[inline]
    pub fn epsilon_value(&self) -> FixValue {
        FixValue::from_raw(1, self.spec())
    }

    /// The value 1, when the format can represent it.
    pub fn one(&self) -> NumericResult<FixValue> {
        self.from_int(1)
    }

    // ========================================================================
    // Guards
    // ========================================================================

    #[inline]
    fn guard(&self, v: FixValue) -> NumericResult<()> {
        if v.spec() == self.spec() {
            Ok(())
        } else {
            Err(NumericError::FormatMismatch)
        }
    }

    #[inline]
    fn guard_pair(&self, a: FixValue, b: FixValue) -> NumericResult<()> {
        self.guard(a)?;
        self.guard(b)
    }

    // ========================================================================
    // Conversions in
    // ========================================================================

    /// Scale an integer into the format.
    ///
    /// # Errors
    /// `OutOfRange` when range checks are enabled and the input exceeds the
    /// representable range; with checks off the raw word silently wraps.
    pub fn from_int(&self, x: i64) -> NumericResult<FixValue> {
        let range = self.format.range();
        if self.range_checks && ((x as i128) < range.min_int || (x as i128) > range.max_int) {
            return Err(NumericError::OutOfRange);
        }
        let scaled = (x as i128) << self.format.fractional_bits();
        Ok(FixValue::from_raw(self.spec().canonical(scaled), self.spec()))
    }

    /// Scale an f32 into the format, rounding half away from zero.
    pub fn from_float(&self, x: f32) -> NumericResult<FixValue> {
        let range = self.format.range();
        if self.range_checks && ((x as f64) < range.min_double || (x as f64) > range.max_double) {
            return Err(NumericError::OutOfRange);
        }
        let scaled = (x * 2f32.powi(self.format.fractional_bits() as i32)).round();
        Ok(FixValue::from_raw(self.spec().canonical(scaled as i128), self.spec()))
    }

    /// Scale an f64 into the format, rounding half away from zero.
    pub fn from_double(&self, x: f64) -> NumericResult<FixValue> {
        let range = self.format.range();
        if self.range_checks && (x < range.min_double || x > range.max_double) {
            return Err(NumericError::OutOfRange);
        }
        let scaled = (x * self.scale()).round();
        Ok(FixValue::from_raw(self.spec().canonical(scaled as i128), self.spec()))
    }

    // ========================================================================
    // Conversions out
    // ========================================================================

    /// The integer part, truncated toward negative infinity (arithmetic
    /// right shift of the raw word, never toward-zero truncation).
    pub fn to_int(&self, v: FixValue) -> NumericResult<i64> {
        self.guard(v)?;
        Ok((v.widened() >> self.format.fractional_bits()) as i64)
    }

    pub fn to_float(&self, v: FixValue) -> NumericResult<f32> {
        self.guard(v)?;
        Ok((v.widened() as f64 / self.scale()) as f32)
    }

    pub fn to_double(&self, v: FixValue) -> NumericResult<f64> {
        self.guard(v)?;
        Ok(v.widened() as f64 / self.scale())
    }

    // ========================================================================
    // Fraction / whole decomposition
    // ========================================================================

    /// The fractional component, sign-preserving: a negative value with a
    /// nonzero fraction keeps a negative fraction (low bits OR'd with the
    /// integer mask); otherwise the plain masked low bits.
    pub fn frac(&self, v: FixValue) -> NumericResult<FixValue> {
        self.guard(v)?;
        let raw_bits = (v.raw() as u64) & self.spec().width_mask();
        let frac_bits = raw_bits & self.masks.fraction_mask;

        let raw = if self.negative_with_fraction(raw_bits, frac_bits) {
            self.spec().canonical((frac_bits | self.masks.integer_mask) as i128)
        } else {
            frac_bits as i64
        };
        Ok(FixValue::from_raw(raw, self.spec()))
    }

    /// The whole component, truncated toward zero. Invariant:
    /// `whole(v) + frac(v) == v` bit-exactly for every value.
    pub fn whole(&self, v: FixValue) -> NumericResult<FixValue> {
        self.guard(v)?;
        let raw_bits = (v.raw() as u64) & self.spec().width_mask();
        let frac_bits = raw_bits & self.masks.fraction_mask;
        let whole_bits = (raw_bits & self.masks.integer_mask) as i128;

        // A negative non-integer's masked bits are its floor; stepping one
        // whole unit up makes whole + (negative) frac reconstruct exactly.
        let raw = if self.negative_with_fraction(raw_bits, frac_bits) {
            self.spec()
                .canonical(whole_bits + (1i128 << self.format.fractional_bits()))
        } else {
            self.spec().canonical(whole_bits)
        };
        Ok(FixValue::from_raw(raw, self.spec()))
    }

    #[inline]
    fn negative_with_fraction(&self, raw_bits: u64, frac_bits: u64) -> bool {
        self.spec().word.signed && (raw_bits & self.masks.sign_mask) != 0 && frac_bits != 0
    }

    // ========================================================================
    // Addition / subtraction
    // ========================================================================

    /// Raw word addition of equal-format operands. Not overflow-checked;
    /// results wrap.
    pub fn add(&self, a: FixValue, b: FixValue) -> NumericResult<FixValue> {
        self.guard_pair(a, b)?;
        let sum = a.widened().wrapping_add(b.widened());
        Ok(FixValue::from_raw(self.spec().canonical(sum), self.spec()))
    }

    /// Raw word subtraction of equal-format operands. Not overflow-checked;
    /// results wrap.
    pub fn sub(&self, a: FixValue, b: FixValue) -> NumericResult<FixValue> {
        self.guard_pair(a, b)?;
        let diff = a.widened().wrapping_sub(b.widened());
        Ok(FixValue::from_raw(self.spec().canonical(diff), self.spec()))
    }

    /// Step up by one raw unit (one epsilon).
    pub fn incr(&self, v: FixValue) -> NumericResult<FixValue> {
        self.guard(v)?;
        let raw = v.widened().wrapping_add(1);
        Ok(FixValue::from_raw(self.spec().canonical(raw), self.spec()))
    }

    /// Step down by one raw unit (one epsilon).
    pub fn decr(&self, v: FixValue) -> NumericResult<FixValue> {
        self.guard(v)?;
        let raw = v.widened().wrapping_sub(1);
        Ok(FixValue::from_raw(self.spec().canonical(raw), self.spec()))
    }

    // ========================================================================
    // Multiplication / division
    // ========================================================================

    /// Rounding-correct multiply: widen both operands to the double-width
    /// accumulator, multiply, add [`half_unit_bias`], shift right by the
    /// fractional bits, narrow back to the word.
    ///
    /// With overflow checks enabled, a pre-shift magnitude that reaches the
    /// overflow-check mask is logged and reported as a non-fatal warning;
    /// the wrapped result is still returned.
    pub fn mul(&self, a: FixValue, b: FixValue) -> NumericResult<FixValue> {
        self.guard_pair(a, b)?;
        let f = self.format.fractional_bits();

        let shifted = if self.spec().word.signed {
            let product = a.widened().wrapping_mul(b.widened());
            self.check_overflow(product.unsigned_abs(), OperatorKind::Mul);
            product.wrapping_add(self.rounding_bias()) >> f
        } else {
            let product = (a.widened() as u128).wrapping_mul(b.widened() as u128);
            self.check_overflow(product, OperatorKind::Mul);
            (product.wrapping_add(self.rounding_bias() as u128) >> f) as i128
        };

        Ok(FixValue::from_raw(self.spec().canonical(shifted), self.spec()))
    }

    /// Precision-preserving divide: widen the dividend to the accumulator,
    /// left-shift it by the fractional bits *before* dividing by the
    /// single-width divisor.
    ///
    /// # Errors
    /// `DivideByZero` is fatal and always propagated.
    pub fn div(&self, a: FixValue, b: FixValue) -> NumericResult<FixValue> {
        self.guard_pair(a, b)?;
        if b.raw() == 0 {
            return Err(NumericError::DivideByZero);
        }
        let quotient = (a.widened() << self.format.fractional_bits()).wrapping_div(b.widened());
        Ok(FixValue::from_raw(self.spec().canonical(quotient), self.spec()))
    }

    fn check_overflow(&self, magnitude: u128, operator: OperatorKind) {
        if !self.overflow_checks || magnitude & self.masks.overflow_check_mask == 0 {
            return;
        }
        tracing::warn!(
            format = %self.format.name(),
            %operator,
            "double-width intermediate exceeds the overflow-check mask; result wraps"
        );
        self.handler.on_event(FamilyEvent::OverflowDetected {
            format: self.format.name().to_string(),
            operator,
            timestamp: Utc::now(),
        });
    }

    // ========================================================================
    // Comparison
    // ========================================================================

    /// Equality on the raw word (representation is monotone in value for
    /// one fixed format).
    pub fn eq(&self, a: FixValue, b: FixValue) -> NumericResult<bool> {
        self.guard_pair(a, b)?;
        Ok(a.raw() == b.raw())
    }

    /// Ordering on the raw word.
    pub fn cmp(&self, a: FixValue, b: FixValue) -> NumericResult<Ordering> {
        self.guard_pair(a, b)?;
        Ok(a.raw().cmp(&b.raw()))
    }

    // ========================================================================
    // Decimal boundary conversions
    // ========================================================================

    /// Convert from `rust_decimal::Decimal`. Intended for API boundaries
    /// only (parsing external input); goes through f64.
    pub fn from_decimal(&self, d: rust_decimal::Decimal) -> NumericResult<FixValue> {
        use rust_decimal::prelude::ToPrimitive;
        let x = d.to_f64().ok_or(NumericError::OutOfRange)?;
        self.from_double(x)
    }

    /// Convert to `rust_decimal::Decimal`. Intended for display/debugging
    /// only.
    pub fn to_decimal(&self, v: FixValue) -> NumericResult<rust_decimal::Decimal> {
        use rust_decimal::prelude::FromPrimitive;
        let x = self.to_double(v)?;
        rust_decimal::Decimal::from_f64(x).ok_or(NumericError::OutOfRange)
    }
}

impl fmt::Debug for ArithmeticContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArithmeticContract")
            .field("format", &self.format.name())
            .field("range_checks", &self.range_checks)
            .field("overflow_checks", &self.overflow_checks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::word::{WordFormat, WordWidth};
    use std::sync::Mutex;

    fn contract(width: WordWidth, signed: bool, f: u32) -> ArithmeticContract {
        let format = FixedPointFormat::new(WordFormat::new(width, signed), f).unwrap();
        ArithmeticContract::new(format, false, false)
    }

    fn qs3_4() -> ArithmeticContract {
        contract(WordWidth::W8, true, 4)
    }

    /// Captures events for assertions.
    struct RecordingDiagnostics(Mutex<Vec<FamilyEvent>>);

    impl RecordingDiagnostics {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(Vec::new())))
        }

        fn overflow_count(&self) -> usize {
            self.0
                .lock()
                .unwrap()
                .iter()
                .filter(|e| matches!(e, FamilyEvent::OverflowDetected { .. }))
                .count()
        }
    }

    impl DiagnosticsHandler for RecordingDiagnostics {
        fn on_event(&self, event: FamilyEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[test]
    fn test_from_int_qs3_4() {
        let c = qs3_4();
        assert_eq!(c.from_int(3).unwrap().raw(), 48);
        assert_eq!(c.from_int(-3).unwrap().raw(), -48);
    }

    #[test]
    fn test_int_round_trip() {
        let c = qs3_4();
        for k in -8..=7i64 {
            let v = c.from_int(k).unwrap();
            assert_eq!(c.to_int(v).unwrap(), k);
        }
    }

    #[test]
    fn test_to_int_floors() {
        let c = qs3_4();
        // -0.1875 floors to -1 under the arithmetic-shift definition
        let v = FixValue::from_raw(-3, c.spec());
        assert_eq!(c.to_int(v).unwrap(), -1);
        // +0.1875 floors to 0
        let w = FixValue::from_raw(3, c.spec());
        assert_eq!(c.to_int(w).unwrap(), 0);
    }

    #[test]
    fn test_whole_frac_negative() {
        let c = qs3_4();
        // raw -3 is -0.1875: whole truncates to 0, frac keeps the sign
        let v = FixValue::from_raw(-3, c.spec());
        assert_eq!(c.whole(v).unwrap().raw(), 0);
        assert_eq!(c.frac(v).unwrap().raw(), -3);
    }

    #[test]
    fn test_whole_frac_reconstruction() {
        let c = qs3_4();
        for raw in -128..=127i64 {
            let v = FixValue::from_raw(raw, c.spec());
            let whole = c.whole(v).unwrap();
            let frac = c.frac(v).unwrap();
            assert_eq!(
                whole.raw() + frac.raw(),
                raw,
                "reconstruction failed for raw {}",
                raw
            );
        }
    }

    #[test]
    fn test_frac_of_exact_integer_is_zero() {
        let c = qs3_4();
        let minus_one = c.from_int(-1).unwrap();
        assert_eq!(c.frac(minus_one).unwrap().raw(), 0);
        assert_eq!(c.whole(minus_one).unwrap(), minus_one);
    }

    #[test]
    fn test_rounding_bias_is_half_unit() {
        assert_eq!(half_unit_bias(0), 0);
        assert_eq!(half_unit_bias(1), 1);
        assert_eq!(half_unit_bias(4), 8);
        assert_eq!(half_unit_bias(16), 1 << 15);
        assert_eq!(qs3_4().rounding_bias(), 8);
    }

    #[test]
    fn test_one_times_one_is_one() {
        // the half-unit bias makes 1.0 * 1.0 land exactly on 1.0
        for f in [1, 4, 8, 16, 24] {
            let c = contract(WordWidth::W32, true, f);
            let one = c.from_double(1.0).unwrap();
            assert_eq!(c.mul(one, one).unwrap(), one, "failed for f = {}", f);
        }
    }

    #[test]
    fn test_mul_rounds_to_nearest() {
        let c = qs3_4();
        // 0.25 * 0.25 = 0.0625: raw 4*4 = 16, biased 24, >> 4 -> 1 (one epsilon)
        let quarter = c.from_double(0.25).unwrap();
        assert_eq!(c.mul(quarter, quarter).unwrap().raw(), 1);

        // without the bias this truncates to 0: 1/16 * 1/16 rounds to 0 only
        // because the true product is below half an epsilon
        let eps = c.epsilon_value();
        assert_eq!(c.mul(eps, eps).unwrap().raw(), 0);
    }

    #[test]
    fn test_mul_overflow_warns_and_wraps() {
        let format = FixedPointFormat::new(WordFormat::new(WordWidth::W8, false), 0).unwrap();
        let recorder = RecordingDiagnostics::new();
        let c = ArithmeticContract::new(format, false, true).with_handler(recorder.clone());

        let two_hundred = c.from_int(200).unwrap();
        let result = c.mul(two_hundred, two_hundred).unwrap();

        // 40000 wraps to 40000 mod 256
        assert_eq!(result.raw(), 40000 % 256);
        assert_eq!(recorder.overflow_count(), 1);

        // in-range products stay silent
        let ten = c.from_int(10).unwrap();
        assert_eq!(c.mul(ten, ten).unwrap().raw(), 100);
        assert_eq!(recorder.overflow_count(), 1);
    }

    #[test]
    fn test_mul_overflow_silent_when_disabled() {
        let format = FixedPointFormat::new(WordFormat::new(WordWidth::W8, false), 0).unwrap();
        let recorder = RecordingDiagnostics::new();
        let c = ArithmeticContract::new(format, false, false).with_handler(recorder.clone());

        let two_hundred = c.from_int(200).unwrap();
        assert_eq!(c.mul(two_hundred, two_hundred).unwrap().raw(), 40000 % 256);
        assert_eq!(recorder.overflow_count(), 0);
    }

    #[test]
    fn test_div_preserves_fraction() {
        let c = qs3_4();
        let one = c.from_int(1).unwrap();
        let two = c.from_int(2).unwrap();
        let half = c.div(one, two).unwrap();
        assert_eq!(c.to_double(half).unwrap(), 0.5);
    }

    #[test]
    fn test_div_by_zero_is_fatal() {
        let c = qs3_4();
        let one = c.from_int(1).unwrap();
        assert_eq!(c.div(one, c.zero()).unwrap_err(), NumericError::DivideByZero);
    }

    #[test]
    fn test_range_checks() {
        let format = FixedPointFormat::new(WordFormat::new(WordWidth::W8, true), 4).unwrap();
        let checked = ArithmeticContract::new(format.clone(), true, false);
        assert_eq!(checked.from_int(8).unwrap_err(), NumericError::OutOfRange);
        assert_eq!(checked.from_int(-9).unwrap_err(), NumericError::OutOfRange);
        assert_eq!(checked.from_double(7.9375).unwrap().raw(), 127);
        assert_eq!(checked.from_double(8.0).unwrap_err(), NumericError::OutOfRange);

        // with checks off the raw word wraps instead
        let unchecked = ArithmeticContract::new(format, false, false);
        assert_eq!(unchecked.from_int(8).unwrap().raw(), -128);
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        let c = qs3_4();
        // half an epsilon rounds away from zero in both directions
        assert_eq!(c.from_double(0.03125).unwrap().raw(), 1);
        assert_eq!(c.from_double(-0.03125).unwrap().raw(), -1);
        assert_eq!(c.from_float(0.03125f32).unwrap().raw(), 1);
    }

    #[test]
    fn test_add_sub_incr_decr() {
        let c = qs3_4();
        let a = c.from_double(1.5).unwrap();
        let b = c.from_double(0.25).unwrap();

        assert_eq!(c.to_double(c.add(a, b).unwrap()).unwrap(), 1.75);
        assert_eq!(c.to_double(c.sub(a, b).unwrap()).unwrap(), 1.25);
        assert_eq!(c.incr(a).unwrap().raw(), a.raw() + 1);
        assert_eq!(c.decr(a).unwrap().raw(), a.raw() - 1);
    }

    #[test]
    fn test_add_wraps_without_checks() {
        let c = contract(WordWidth::W8, false, 0);
        let a = c.from_int(200).unwrap();
        let b = c.from_int(100).unwrap();
        assert_eq!(c.add(a, b).unwrap().raw(), 44);
    }

    #[test]
    fn test_compare() {
        let c = qs3_4();
        let a = c.from_int(2).unwrap();
        let b = c.from_int(3).unwrap();
        assert_eq!(c.cmp(a, b).unwrap(), Ordering::Less);
        assert!(c.eq(a, a).unwrap());
        assert!(!c.eq(a, b).unwrap());
    }

    #[test]
    fn test_format_mismatch_is_rejected() {
        let c = qs3_4();
        let other = contract(WordWidth::W16, true, 4);
        let foreign = other.from_int(1).unwrap();
        assert_eq!(
            c.add(c.zero(), foreign).unwrap_err(),
            NumericError::FormatMismatch
        );
        assert_eq!(c.to_int(foreign).unwrap_err(), NumericError::FormatMismatch);
    }

    #[test]
    fn test_decimal_boundary_conversions() {
        use std::str::FromStr;
        let c = contract(WordWidth::W32, true, 16);
        let d = rust_decimal::Decimal::from_str("2.5").unwrap();
        let v = c.from_decimal(d).unwrap();
        assert_eq!(c.to_double(v).unwrap(), 2.5);
        assert_eq!(c.to_decimal(v).unwrap(), d);
    }

    #[test]
    fn test_unsigned_full_fraction_format() {
        // qu0_8: all 8 bits fractional, range [0, 1)
        let c = contract(WordWidth::W8, false, 8);
        let half = c.from_double(0.5).unwrap();
        assert_eq!(half.raw(), 128);
        let quarter = c.mul(half, half).unwrap();
        assert_eq!(c.to_double(quarter).unwrap(), 0.25);
    }
}

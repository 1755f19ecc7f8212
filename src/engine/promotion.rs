// ============================================================================
// Promotion Rules
// Mixed-format operator derivation: eligibility, alignment, and execution
// ============================================================================

use crate::domain::format::{FixedPointFormat, FormatSpec};
use crate::domain::operator::{OperatorKind, ShiftDirection};
use crate::numeric::contract::half_unit_bias;
use crate::numeric::errors::{NumericError, NumericResult};
use crate::numeric::value::FixValue;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Eligibility Predicates
// ============================================================================

type Predicate = fn(&FixedPointFormat, &FixedPointFormat) -> bool;

/// Add/Sub require the left format to carry at least as many integer bits,
/// so the right operand's high end cannot silently truncate.
fn add_sub_eligible(lhs: &FixedPointFormat, rhs: &FixedPointFormat) -> bool {
    lhs.integer_bits() >= rhs.integer_bits()
}

/// Sub additionally needs the left format's signed counterpart to exist,
/// because that counterpart is the result format.
fn sub_eligible(lhs: &FixedPointFormat, rhs: &FixedPointFormat) -> bool {
    add_sub_eligible(lhs, rhs) && lhs.signed_counterpart().is_some()
}

/// Mul/Div require the left format to carry at least as many fractional
/// bits, so the rescaling shift is sized to the right operand.
fn mul_div_eligible(lhs: &FixedPointFormat, rhs: &FixedPointFormat) -> bool {
    lhs.fractional_bits() >= rhs.fractional_bits()
}

/// The declarative eligibility table: one predicate per operator kind.
/// The concrete rule set of a family is exactly the ordered pairs that
/// satisfy these predicates — nothing else is generated.
pub(crate) const ELIGIBILITY: [(OperatorKind, Predicate); 4] = [
    (OperatorKind::Add, add_sub_eligible),
    (OperatorKind::Sub, sub_eligible),
    (OperatorKind::Mul, mul_div_eligible),
    (OperatorKind::Div, mul_div_eligible),
];

/// Whether a rule exists for this ordered pair under this operator.
pub fn eligible(operator: OperatorKind, lhs: &FixedPointFormat, rhs: &FixedPointFormat) -> bool {
    ELIGIBILITY
        .iter()
        .find(|(op, _)| *op == operator)
        .map(|(_, predicate)| predicate(lhs, rhs))
        .unwrap_or(false)
}

// ============================================================================
// Promotion Rule
// ============================================================================

/// One derived mixed-format operator: how the right operand is aligned or
/// rescaled, which format the result lands in, and the rounding bias.
/// Derived once per (lhs, rhs, operator) at family-build time; immutable
/// afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PromotionRule {
    pub lhs: FormatSpec,
    pub rhs: FormatSpec,
    pub operator: OperatorKind,
    pub shift_amount: u32,
    pub shift_direction: ShiftDirection,
    pub result: FormatSpec,
    pub rounding_bias: u128,
}

impl PromotionRule {
    /// Derive the rule for an ordered pair under one operator, or `None`
    /// when the pair is ineligible.
    pub fn derive(
        operator: OperatorKind,
        lhs: &FixedPointFormat,
        rhs: &FixedPointFormat,
    ) -> Option<PromotionRule> {
        if !eligible(operator, lhs, rhs) {
            return None;
        }

        let rule = match operator {
            // Align binary points by shifting the right operand into the
            // left format's scale, then combine in the left word.
            OperatorKind::Add | OperatorKind::Sub => {
                let delta = lhs.fractional_bits() as i64 - rhs.fractional_bits() as i64;
                let (shift_amount, shift_direction) = match delta {
                    0 => (0, ShiftDirection::None),
                    d if d > 0 => (d as u32, ShiftDirection::Left),
                    d => ((-d) as u32, ShiftDirection::Right),
                };
                // Unsigned formats are not closed under subtraction: Sub
                // lands in the signed counterpart of the left format.
                let result = if operator == OperatorKind::Sub {
                    lhs.signed_counterpart().expect("checked by eligibility")
                } else {
                    lhs.spec()
                };
                PromotionRule {
                    lhs: lhs.spec(),
                    rhs: rhs.spec(),
                    operator,
                    shift_amount,
                    shift_direction,
                    result,
                    rounding_bias: 0,
                }
            },

            // Multiply in the left format's accumulator; bias and rescale
            // shift are sized to the right operand's fractional bits.
            OperatorKind::Mul => PromotionRule {
                lhs: lhs.spec(),
                rhs: rhs.spec(),
                operator,
                shift_amount: rhs.fractional_bits(),
                shift_direction: ShiftDirection::Right,
                result: lhs.spec(),
                rounding_bias: half_unit_bias(rhs.fractional_bits()) as u128,
            },

            // Pre-shift the dividend by the right operand's fractional bits
            // so the quotient keeps the left scale.
            OperatorKind::Div => PromotionRule {
                lhs: lhs.spec(),
                rhs: rhs.spec(),
                operator,
                shift_amount: rhs.fractional_bits(),
                shift_direction: ShiftDirection::Left,
                result: lhs.spec(),
                rounding_bias: 0,
            },
        };

        Some(rule)
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Apply the rule to a value pair.
    ///
    /// # Errors
    /// `FormatMismatch` when the operands do not match the rule's formats;
    /// `DivideByZero` for a zero right operand under Div.
    pub fn apply(&self, lhs: FixValue, rhs: FixValue) -> NumericResult<FixValue> {
        if lhs.spec() != self.lhs || rhs.spec() != self.rhs {
            return Err(NumericError::FormatMismatch);
        }

        let ll = lhs.widened();
        let lr = rhs.widened();

        let raw = match self.operator {
            OperatorKind::Add => ll.wrapping_add(self.aligned(lr)),
            OperatorKind::Sub => ll.wrapping_sub(self.aligned(lr)),
            OperatorKind::Mul => {
                // Raw magnitudes multiply in the accumulator; the result
                // sign is the XOR of the operand signs.
                let negative = (ll < 0) ^ (lr < 0);
                let magnitude = ll
                    .unsigned_abs()
                    .wrapping_mul(lr.unsigned_abs())
                    .wrapping_add(self.rounding_bias)
                    >> self.shift_amount;
                if negative {
                    (magnitude as i128).wrapping_neg()
                } else {
                    magnitude as i128
                }
            },
            OperatorKind::Div => {
                if rhs.raw() == 0 {
                    return Err(NumericError::DivideByZero);
                }
                (ll << self.shift_amount).wrapping_div(lr)
            },
        };

        Ok(FixValue::from_raw(self.result.canonical(raw), self.result))
    }

    #[inline]
    fn aligned(&self, widened_rhs: i128) -> i128 {
        match self.shift_direction {
            ShiftDirection::Left => widened_rhs << self.shift_amount,
            ShiftDirection::Right => widened_rhs >> self.shift_amount,
            ShiftDirection::None => widened_rhs,
        }
    }
}

// ============================================================================
// Complex Builder
// Complex numbers over one scalar format
// ============================================================================

use crate::numeric::contract::ArithmeticContract;
use crate::numeric::errors::{NumericError, NumericResult};
use crate::numeric::value::FixValue;

// ============================================================================
// Complex Value
// ============================================================================

/// A complex number: real and imaginary components of one scalar format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComplexValue {
    pub r: FixValue,
    pub i: FixValue,
}

// ============================================================================
// Complex Type
// ============================================================================

/// The descriptor and operation set of a complex type over one scalar
/// format. Multiplication uses the standard formula evaluated with the
/// scalar's rounding-correct multiply, so it inherits the scalar's bias
/// and overflow behavior. Division is not defined for this type.
pub struct ComplexType {
    contract: ArithmeticContract,
    name: String,
}

impl ComplexType {
    pub fn new(contract: ArithmeticContract) -> Self {
        let name = format!("complex_{}", contract.format().name());
        Self { contract, name }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Canonical name, e.g. `complex_qs15_16`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn contract(&self) -> &ArithmeticContract {
        &self.contract
    }

    // ========================================================================
    // Construction of values
    // ========================================================================

    pub fn from_ints(&self, r: i64, i: i64) -> NumericResult<ComplexValue> {
        Ok(ComplexValue {
            r: self.contract.from_int(r)?,
            i: self.contract.from_int(i)?,
        })
    }

    pub fn from_doubles(&self, r: f64, i: f64) -> NumericResult<ComplexValue> {
        Ok(ComplexValue {
            r: self.contract.from_double(r)?,
            i: self.contract.from_double(i)?,
        })
    }

    pub fn zero(&self) -> ComplexValue {
        ComplexValue {
            r: self.contract.zero(),
            i: self.contract.zero(),
        }
    }

    pub fn to_doubles(&self, v: ComplexValue) -> NumericResult<(f64, f64)> {
        Ok((self.contract.to_double(v.r)?, self.contract.to_double(v.i)?))
    }

    // ========================================================================
    // Arithmetic
    // ========================================================================

    pub fn add(&self, a: ComplexValue, b: ComplexValue) -> NumericResult<ComplexValue> {
        Ok(ComplexValue {
            r: self.contract.add(a.r, b.r)?,
            i: self.contract.add(a.i, b.i)?,
        })
    }

    pub fn sub(&self, a: ComplexValue, b: ComplexValue) -> NumericResult<ComplexValue> {
        Ok(ComplexValue {
            r: self.contract.sub(a.r, b.r)?,
            i: self.contract.sub(a.i, b.i)?,
        })
    }

    /// `(a.r·b.r − a.i·b.i, a.r·b.i + a.i·b.r)`, each product through the
    /// scalar's rounding-correct multiply.
    pub fn mul(&self, a: ComplexValue, b: ComplexValue) -> NumericResult<ComplexValue> {
        Ok(ComplexValue {
            r: self
                .contract
                .sub(self.contract.mul(a.r, b.r)?, self.contract.mul(a.i, b.i)?)?,
            i: self
                .contract
                .add(self.contract.mul(a.r, b.i)?, self.contract.mul(a.i, b.r)?)?,
        })
    }

    /// Complex division is explicitly unsupported.
    pub fn div(&self, _a: ComplexValue, _b: ComplexValue) -> NumericResult<ComplexValue> {
        Err(NumericError::UnsupportedOperation)
    }

    pub fn conjugate(&self, v: ComplexValue) -> NumericResult<ComplexValue> {
        Ok(ComplexValue {
            r: v.r,
            i: self.contract.sub(self.contract.zero(), v.i)?,
        })
    }

    pub fn eq(&self, a: ComplexValue, b: ComplexValue) -> NumericResult<bool> {
        Ok(self.contract.eq(a.r, b.r)? && self.contract.eq(a.i, b.i)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::format::FixedPointFormat;
    use crate::domain::word::{WordFormat, WordWidth};

    fn complex_type() -> ComplexType {
        let format = FixedPointFormat::new(WordFormat::new(WordWidth::W32, true), 16).unwrap();
        ComplexType::new(ArithmeticContract::new(format, false, false))
    }

    #[test]
    fn test_naming() {
        assert_eq!(complex_type().name(), "complex_qs15_16");
    }

    #[test]
    fn test_add_sub() {
        let c = complex_type();
        let a = c.from_doubles(1.0, 2.0).unwrap();
        let b = c.from_doubles(0.5, -1.0).unwrap();

        assert_eq!(c.to_doubles(c.add(a, b).unwrap()).unwrap(), (1.5, 1.0));
        assert_eq!(c.to_doubles(c.sub(a, b).unwrap()).unwrap(), (0.5, 3.0));
    }

    #[test]
    fn test_mul_standard_formula() {
        let c = complex_type();
        // (1 + 2i)(3 + 4i) = 3 - 8 + (4 + 6)i = -5 + 10i
        let a = c.from_ints(1, 2).unwrap();
        let b = c.from_ints(3, 4).unwrap();
        assert_eq!(c.to_doubles(c.mul(a, b).unwrap()).unwrap(), (-5.0, 10.0));
    }

    #[test]
    fn test_mul_i_squared() {
        let c = complex_type();
        let i = c.from_ints(0, 1).unwrap();
        assert_eq!(c.to_doubles(c.mul(i, i).unwrap()).unwrap(), (-1.0, 0.0));
    }

    #[test]
    fn test_div_unsupported() {
        let c = complex_type();
        let a = c.from_ints(1, 0).unwrap();
        assert_eq!(c.div(a, a).unwrap_err(), NumericError::UnsupportedOperation);
    }

    #[test]
    fn test_conjugate() {
        let c = complex_type();
        let v = c.from_doubles(1.5, -2.5).unwrap();
        let conj = c.conjugate(v).unwrap();
        assert_eq!(c.to_doubles(conj).unwrap(), (1.5, 2.5));

        // z * conj(z) is purely real: |z|^2
        let product = c.mul(v, conj).unwrap();
        let (re, im) = c.to_doubles(product).unwrap();
        assert_eq!(im, 0.0);
        assert_eq!(re, 1.5 * 1.5 + 2.5 * 2.5);
    }

    #[test]
    fn test_eq() {
        let c = complex_type();
        let a = c.from_ints(1, 2).unwrap();
        let b = c.from_ints(1, 3).unwrap();
        assert!(c.eq(a, a).unwrap());
        assert!(!c.eq(a, b).unwrap());
    }
}

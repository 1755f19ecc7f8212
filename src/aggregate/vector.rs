// ============================================================================
// Vector Builder
// Fixed-size componentwise vectors over one scalar format
// ============================================================================

use crate::domain::format::FixedPointFormat;
use crate::domain::operator::OperatorKind;
use crate::engine::PromotionRule;
use crate::numeric::contract::ArithmeticContract;
use crate::numeric::errors::{NumericError, NumericResult};
use crate::numeric::value::FixValue;
use arrayvec::ArrayVec;

/// Vectors carry 1 to 4 components.
pub const MAX_DIMENSIONS: usize = 4;

/// Conventional component names, in order.
pub const COMPONENT_NAMES: [&str; MAX_DIMENSIONS] = ["x", "y", "z", "w"];

// ============================================================================
// Vector Value
// ============================================================================

/// An N-component vector of equal-format scalar values. Components live
/// inline; no allocation on the arithmetic path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorValue {
    components: ArrayVec<FixValue, MAX_DIMENSIONS>,
}

impl VectorValue {
    #[inline]
    pub fn components(&self) -> &[FixValue] {
        &self.components
    }

    #[inline]
    pub fn dimensions(&self) -> usize {
        self.components.len()
    }
}

// ============================================================================
// Vector Type
// ============================================================================

/// The descriptor and operation set of an N-component vector over one
/// scalar format. Componentwise semantics come straight from the scalar
/// contract; subtraction lands in the scalar's signed counterpart, exactly
/// as scalar promotion does.
#[derive(Debug)]
pub struct VectorType {
    contract: ArithmeticContract,
    dimensions: usize,
    name: String,
    sub_rule: Option<PromotionRule>,
}

impl VectorType {
    /// Build a vector type over a scalar contract.
    ///
    /// # Errors
    /// `InvalidDimension` outside 1..=4.
    pub fn new(contract: ArithmeticContract, dimensions: usize) -> NumericResult<Self> {
        if dimensions == 0 || dimensions > MAX_DIMENSIONS {
            return Err(NumericError::InvalidDimension);
        }
        let name = format!("vec{}_{}", dimensions, contract.format().name());
        let sub_rule =
            PromotionRule::derive(OperatorKind::Sub, contract.format(), contract.format());
        Ok(Self {
            contract,
            dimensions,
            name,
            sub_rule,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Canonical name, e.g. `vec3_qs15_16`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn scalar(&self) -> &FixedPointFormat {
        self.contract.format()
    }

    #[inline]
    pub fn contract(&self) -> &ArithmeticContract {
        &self.contract
    }

    // ========================================================================
    // Construction of values
    // ========================================================================

    pub fn from_ints(&self, components: &[i64]) -> NumericResult<VectorValue> {
        if components.len() != self.dimensions {
            return Err(NumericError::InvalidDimension);
        }
        self.collect(components.iter().map(|&x| self.contract.from_int(x)))
    }

    pub fn from_doubles(&self, components: &[f64]) -> NumericResult<VectorValue> {
        if components.len() != self.dimensions {
            return Err(NumericError::InvalidDimension);
        }
        self.collect(components.iter().map(|&x| self.contract.from_double(x)))
    }

    pub fn zero(&self) -> VectorValue {
        VectorValue {
            components: (0..self.dimensions).map(|_| self.contract.zero()).collect(),
        }
    }

    pub fn to_doubles(&self, v: &VectorValue) -> NumericResult<ArrayVec<f64, MAX_DIMENSIONS>> {
        self.guard(v)?;
        v.components
            .iter()
            .map(|&c| self.contract.to_double(c))
            .collect()
    }

    fn collect(
        &self,
        components: impl Iterator<Item = NumericResult<FixValue>>,
    ) -> NumericResult<VectorValue> {
        let components: ArrayVec<FixValue, MAX_DIMENSIONS> =
            components.collect::<NumericResult<_>>()?;
        if components.len() != self.dimensions {
            return Err(NumericError::InvalidDimension);
        }
        Ok(VectorValue { components })
    }

    fn guard(&self, v: &VectorValue) -> NumericResult<()> {
        if v.dimensions() != self.dimensions {
            return Err(NumericError::InvalidDimension);
        }
        if v.components
            .iter()
            .any(|c| c.spec() != self.contract.format().spec())
        {
            return Err(NumericError::FormatMismatch);
        }
        Ok(())
    }

    // ========================================================================
    // Componentwise arithmetic
    // ========================================================================

    pub fn add(&self, a: &VectorValue, b: &VectorValue) -> NumericResult<VectorValue> {
        self.guard(a)?;
        self.guard(b)?;
        let components = a
            .components
            .iter()
            .zip(&b.components)
            .map(|(&x, &y)| self.contract.add(x, y))
            .collect::<NumericResult<_>>()?;
        Ok(VectorValue { components })
    }

    /// Componentwise subtraction. The result vector is over the scalar's
    /// signed counterpart, matching scalar promotion.
    ///
    /// # Errors
    /// `IneligiblePromotion` when the scalar has no signed counterpart.
    pub fn sub(&self, a: &VectorValue, b: &VectorValue) -> NumericResult<VectorValue> {
        self.guard(a)?;
        self.guard(b)?;
        let rule = self.sub_rule.ok_or(NumericError::IneligiblePromotion)?;
        let components = a
            .components
            .iter()
            .zip(&b.components)
            .map(|(&x, &y)| rule.apply(x, y))
            .collect::<NumericResult<_>>()?;
        Ok(VectorValue { components })
    }

    /// Componentwise scalar multiply.
    pub fn scale(&self, v: &VectorValue, s: FixValue) -> NumericResult<VectorValue> {
        self.guard(v)?;
        let components = v
            .components
            .iter()
            .map(|&c| self.contract.mul(c, s))
            .collect::<NumericResult<_>>()?;
        Ok(VectorValue { components })
    }

    /// Componentwise scalar divide. `DivideByZero` propagates.
    pub fn div_scalar(&self, v: &VectorValue, s: FixValue) -> NumericResult<VectorValue> {
        self.guard(v)?;
        let components = v
            .components
            .iter()
            .map(|&c| self.contract.div(c, s))
            .collect::<NumericResult<_>>()?;
        Ok(VectorValue { components })
    }

    // ========================================================================
    // Products
    // ========================================================================

    /// Dot product: componentwise products accumulated in the scalar
    /// format, with the same overflow caveat as scalar multiply.
    pub fn dot(&self, a: &VectorValue, b: &VectorValue) -> NumericResult<FixValue> {
        self.guard(a)?;
        self.guard(b)?;
        let mut acc = self.contract.zero();
        for (&x, &y) in a.components.iter().zip(&b.components) {
            acc = self.contract.add(acc, self.contract.mul(x, y)?)?;
        }
        Ok(acc)
    }

    /// Squared length, `dot(v, v)`.
    pub fn length_squared(&self, v: &VectorValue) -> NumericResult<FixValue> {
        self.dot(v, v)
    }

    /// Pairwise-cyclic-difference cross product.
    ///
    /// Defined for 3 components (the standard cross product) and for 2
    /// (the scalar z-component, returned as a 1-component vector). The
    /// formula has no established meaning for other dimensions and is not
    /// generated for them.
    ///
    /// # Errors
    /// `UnsupportedOperation` for dimensions outside {2, 3}.
    pub fn cross(&self, a: &VectorValue, b: &VectorValue) -> NumericResult<VectorValue> {
        self.guard(a)?;
        self.guard(b)?;
        let x = a.components();
        let y = b.components();

        let components = match self.dimensions {
            2 => {
                let z = self.contract.sub(
                    self.contract.mul(x[0], y[1])?,
                    self.contract.mul(x[1], y[0])?,
                )?;
                let mut c = ArrayVec::new();
                c.push(z);
                c
            },
            3 => {
                let mut c = ArrayVec::new();
                for i in 0..3 {
                    let (j, k) = ((i + 1) % 3, (i + 2) % 3);
                    c.push(self.contract.sub(
                        self.contract.mul(x[j], y[k])?,
                        self.contract.mul(x[k], y[j])?,
                    )?);
                }
                c
            },
            _ => return Err(NumericError::UnsupportedOperation),
        };

        Ok(VectorValue { components })
    }
}

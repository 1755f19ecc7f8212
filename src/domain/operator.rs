// ============================================================================
// Operator Vocabulary
// Operator kinds and shift directions shared by contracts and promotion
// ============================================================================

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The binary operators a promotion rule can be derived for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OperatorKind {
    Add,
    Sub,
    Mul,
    Div,
}

impl OperatorKind {
    pub const ALL: [OperatorKind; 4] = [
        OperatorKind::Add,
        OperatorKind::Sub,
        OperatorKind::Mul,
        OperatorKind::Div,
    ];
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperatorKind::Add => "add",
            OperatorKind::Sub => "sub",
            OperatorKind::Mul => "mul",
            OperatorKind::Div => "div",
        };
        write!(f, "{}", name)
    }
}

/// Which way a promotion rule shifts to align or rescale raw words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ShiftDirection {
    Left,
    Right,
    /// Operands already share a scale.
    None,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_display() {
        assert_eq!(OperatorKind::Add.to_string(), "add");
        assert_eq!(OperatorKind::Div.to_string(), "div");
    }

    #[test]
    fn test_all_operators() {
        assert_eq!(OperatorKind::ALL.len(), 4);
    }
}

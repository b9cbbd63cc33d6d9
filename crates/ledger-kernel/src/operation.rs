//! Operation descriptors
//!
//! A closed set of mutation kinds. Adding a kind means adding a variant here,
//! a discriminant in [`OperationKind`] and an arm in [`Operation::apply`];
//! every match over the enum is exhaustive.

use crate::error::BatchError;
use serde::{Deserialize, Serialize};

/// One mutation, applied to the record at the same batch position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Increase the value by `amount`
    Add { amount: u64 },
    /// Decrease the value by `amount`; the value may not go below zero
    Subtract { amount: u64 },
}

/// Discriminant of an [`Operation`], independent of its operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// [`Operation::Add`]
    Add,
    /// [`Operation::Subtract`]
    Subtract,
}

impl OperationKind {
    /// Every kind the kernel knows how to apply
    pub const ALL: [OperationKind; 2] = [OperationKind::Add, OperationKind::Subtract];

    /// Tag byte used in the signed encoding
    pub fn as_u8(self) -> u8 {
        match self {
            OperationKind::Add => 0,
            OperationKind::Subtract => 1,
        }
    }
}

/// Checked-arithmetic failure, before it is tied to a batch position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticFault {
    /// Result above `u64::MAX`
    Overflow,
    /// Result below zero
    Underflow,
}

impl ArithmeticFault {
    /// Attach the failing batch position
    pub fn at(self, index: usize) -> BatchError {
        match self {
            ArithmeticFault::Overflow => BatchError::ArithmeticOverflow { index },
            ArithmeticFault::Underflow => BatchError::ArithmeticUnderflow { index },
        }
    }
}

impl Operation {
    /// `Add { amount }`
    pub fn add(amount: u64) -> Self {
        Operation::Add { amount }
    }

    /// `Subtract { amount }`
    pub fn subtract(amount: u64) -> Self {
        Operation::Subtract { amount }
    }

    /// Discriminant without the operand
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Add { .. } => OperationKind::Add,
            Operation::Subtract { .. } => OperationKind::Subtract,
        }
    }

    /// Operand
    pub fn amount(&self) -> u64 {
        match *self {
            Operation::Add { amount } | Operation::Subtract { amount } => amount,
        }
    }

    /// Compute the value this operation produces from `current`.
    ///
    /// Pure: nothing is written. Never wraps or saturates.
    pub fn apply(&self, current: u64) -> Result<u64, ArithmeticFault> {
        match *self {
            Operation::Add { amount } => current.checked_add(amount).ok_or(ArithmeticFault::Overflow),
            Operation::Subtract { amount } => {
                current.checked_sub(amount).ok_or(ArithmeticFault::Underflow)
            }
        }
    }

    /// Canonical encoding used in signed batch messages: kind byte, then the
    /// amount little-endian.
    pub(crate) fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.kind().as_u8());
        out.extend_from_slice(&self.amount().to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_checked() {
        assert_eq!(Operation::add(10).apply(0), Ok(10));
        assert_eq!(Operation::add(1).apply(u64::MAX - 1), Ok(u64::MAX));
        assert_eq!(Operation::add(1).apply(u64::MAX), Err(ArithmeticFault::Overflow));
    }

    #[test]
    fn test_subtract_is_checked() {
        assert_eq!(Operation::subtract(4).apply(10), Ok(6));
        assert_eq!(Operation::subtract(10).apply(10), Ok(0));
        assert_eq!(Operation::subtract(11).apply(10), Err(ArithmeticFault::Underflow));
    }

    #[test]
    fn test_fault_carries_index() {
        assert_eq!(
            ArithmeticFault::Overflow.at(3),
            BatchError::ArithmeticOverflow { index: 3 }
        );
        assert_eq!(
            ArithmeticFault::Underflow.at(0),
            BatchError::ArithmeticUnderflow { index: 0 }
        );
    }

    #[test]
    fn test_encoding_distinguishes_kinds() {
        let mut add = Vec::new();
        Operation::add(7).encode_into(&mut add);
        let mut sub = Vec::new();
        Operation::subtract(7).encode_into(&mut sub);

        assert_eq!(add.len(), 9);
        assert_ne!(add, sub);
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&Operation::add(10)).unwrap();
        assert_eq!(json, r#"{"op":"add","amount":10}"#);
        let back: Operation = serde_json::from_str(r#"{"op":"subtract","amount":3}"#).unwrap();
        assert_eq!(back, Operation::subtract(3));
    }
}

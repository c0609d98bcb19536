//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  └── CoreError        - Unparseable names and settings                 │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Store failures, broken link chains, config     │
//! │                                                                         │
//! │  Flow: CoreError → DbError → CLI exit message                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The calculation functions themselves never fail: totals, VAT, change
//! and turnover are total functions over typed input. Errors only arise
//! at the edges, where strings become enums and settings.

use thiserror::Error;

/// Core domain errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A payment-method name outside the classifier table.
    ///
    /// ## When This Occurs
    /// - `PaymentMethod::from_str("invalid")`
    ///
    /// Breakdowns themselves tolerate unknown keys; this is only raised
    /// when a caller explicitly asks for a method by name.
    #[error("Unknown payment method: {0}")]
    UnknownPaymentMethod(String),

    /// A coupon sub-type that is not one of A/U/I/T/C/space/O.
    #[error("Unknown coupon type: '{0}'")]
    UnknownCouponType(String),

    /// A tenant setting could not be parsed or is out of range.
    #[error("Invalid setting {key}: {reason}")]
    InvalidSetting { key: String, reason: String },
}

impl CoreError {
    /// Creates an InvalidSetting error.
    pub fn invalid_setting(key: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidSetting {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::UnknownPaymentMethod("bitcoin".to_string());
        assert_eq!(err.to_string(), "Unknown payment method: bitcoin");

        let err = CoreError::UnknownCouponType("X".to_string());
        assert_eq!(err.to_string(), "Unknown coupon type: 'X'");
    }

    #[test]
    fn test_invalid_setting_message() {
        let err = CoreError::invalid_setting("vat.high", "must be between 0 and 100");
        assert_eq!(
            err.to_string(),
            "Invalid setting vat.high: must be between 0 and 100"
        );
    }
}

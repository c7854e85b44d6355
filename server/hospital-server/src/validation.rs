//! Request validation utilities
//!
//! A `RequestValidation` trait plus helper macros keep validation logic and
//! error messages consistent across handlers.

use crate::error::ApiError;

/// Trait for validating request payloads
///
/// Implemented by all create/update request types; handlers call
/// `req.validate()?` before touching the database.
pub trait RequestValidation {
    /// Validates the request
    ///
    /// # Errors
    ///
    /// Returns an `ApiError::Validation` with a field-level message when a
    /// constraint is violated.
    fn validate(&self) -> Result<(), ApiError>;
}

/// Validate a field with a custom predicate
#[macro_export]
macro_rules! validate_field {
    ($field:expr, $predicate:expr, $message:expr) => {
        if !$predicate {
            return Err($crate::error::ApiError::validation($message));
        }
    };
}

/// Validate that a string field is non-empty
#[macro_export]
macro_rules! validate_required {
    ($field:expr, $message:expr) => {
        $crate::validate_field!($field, !$field.trim().is_empty(), $message);
    };
}

/// Validate string length bounds
#[macro_export]
macro_rules! validate_length {
    ($field:expr, $min:expr, $max:expr, $message:expr) => {
        let len = $field.len();
        $crate::validate_field!($field, len >= $min && len <= $max, $message);
    };
}

/// Validate email format (basic check)
#[macro_export]
macro_rules! validate_email {
    ($field:expr, $message:expr) => {
        $crate::validate_field!($field, $field.contains('@') && $field.contains('.'), $message);
    };
}

/// Validate that a decimal amount is non-negative
#[macro_export]
macro_rules! validate_non_negative {
    ($field:expr, $message:expr) => {
        $crate::validate_field!($field, $field >= rust_decimal::Decimal::ZERO, $message);
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    struct TestRequest {
        nom: String,
        email: String,
        montant: Decimal,
    }

    impl RequestValidation for TestRequest {
        fn validate(&self) -> Result<(), ApiError> {
            validate_required!(self.nom, "Le nom est requis");
            validate_length!(self.nom, 1, 100, "Le nom doit faire entre 1 et 100 caractères");
            validate_email!(self.email, "Format d'email invalide");
            validate_non_negative!(self.montant, "Le montant ne peut pas être négatif");
            Ok(())
        }
    }

    #[test]
    fn valid_request_passes() {
        let req = TestRequest {
            nom: "Dupont".to_string(),
            email: "dupont@example.fr".to_string(),
            montant: dec!(10),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn empty_name_rejected() {
        let req = TestRequest {
            nom: "  ".to_string(),
            email: "dupont@example.fr".to_string(),
            montant: dec!(10),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn malformed_email_rejected() {
        let req = TestRequest {
            nom: "Dupont".to_string(),
            email: "pas-un-email".to_string(),
            montant: dec!(10),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn negative_amount_rejected() {
        let req = TestRequest {
            nom: "Dupont".to_string(),
            email: "dupont@example.fr".to_string(),
            montant: dec!(-1),
        };
        assert!(req.validate().is_err());
    }
}

//! Payment application
//!
//! Applies a payment to an invoice and recomputes its status. The amount
//! paid only ever increases; a payment moves the status to `paye` or
//! `partiel` and never restores `impaye` or `annule` (inherited policy).

use crate::error::{BillingError, BillingResult};
use crate::models::PaymentStatus;
use rust_decimal::Decimal;

/// Result of applying a payment to an invoice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOutcome {
    /// Amount paid after the payment
    pub montant_paye: Decimal,
    /// Remaining balance (`montant - montant_paye`)
    pub solde: Decimal,
    /// Recomputed payment status
    pub statut: PaymentStatus,
}

/// Apply a payment of `paiement` to an invoice with total `montant` and
/// prior paid amount `montant_paye`.
///
/// # Errors
///
/// Returns `BillingError::Validation` when the payment is zero or negative;
/// the invoice is left untouched in that case.
pub fn apply_payment(
    montant: Decimal,
    montant_paye: Decimal,
    paiement: Decimal,
) -> BillingResult<PaymentOutcome> {
    if paiement <= Decimal::ZERO {
        return Err(BillingError::Validation(
            "Le montant doit être positif".to_string(),
        ));
    }

    let nouveau_paye = montant_paye + paiement;
    let statut = if nouveau_paye >= montant {
        PaymentStatus::Paye
    } else {
        PaymentStatus::Partiel
    };

    tracing::debug!(
        %montant,
        %nouveau_paye,
        statut = ?statut,
        "payment applied"
    );

    Ok(PaymentOutcome {
        montant_paye: nouveau_paye,
        solde: montant - nouveau_paye,
        statut,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn partial_payment_sets_partiel() {
        let outcome = apply_payment(dec!(100), dec!(0), dec!(40)).unwrap();
        assert_eq!(outcome.montant_paye, dec!(40));
        assert_eq!(outcome.solde, dec!(60));
        assert_eq!(outcome.statut, PaymentStatus::Partiel);
    }

    #[test]
    fn full_payment_sets_paye() {
        let outcome = apply_payment(dec!(100), dec!(40), dec!(60)).unwrap();
        assert_eq!(outcome.montant_paye, dec!(100));
        assert_eq!(outcome.solde, dec!(0));
        assert_eq!(outcome.statut, PaymentStatus::Paye);
    }

    #[test]
    fn overpayment_still_paye_with_negative_balance() {
        let outcome = apply_payment(dec!(100), dec!(90), dec!(20)).unwrap();
        assert_eq!(outcome.montant_paye, dec!(110));
        assert_eq!(outcome.solde, dec!(-10));
        assert_eq!(outcome.statut, PaymentStatus::Paye);
    }

    #[test]
    fn zero_payment_rejected() {
        let err = apply_payment(dec!(100), dec!(40), dec!(0)).unwrap_err();
        assert!(matches!(err, BillingError::Validation(_)));
    }

    #[test]
    fn negative_payment_rejected() {
        let err = apply_payment(dec!(100), dec!(40), dec!(-5)).unwrap_err();
        assert!(matches!(err, BillingError::Validation(_)));
    }

    #[test]
    fn payment_arithmetic_matches_prior_paid() {
        // p + a for arbitrary prior paid p
        let outcome = apply_payment(dec!(250.50), dec!(100.25), dec!(50)).unwrap();
        assert_eq!(outcome.montant_paye, dec!(150.25));
        assert_eq!(outcome.solde, dec!(100.25));
        assert_eq!(outcome.statut, PaymentStatus::Partiel);
    }

    #[test]
    fn end_to_end_scenario() {
        // invoice 100, paid 40; pay 60 then attempt 0
        let first = apply_payment(dec!(100), dec!(40), dec!(60)).unwrap();
        assert_eq!(first.montant_paye, dec!(100));
        assert_eq!(first.statut, PaymentStatus::Paye);
        assert_eq!(first.solde, dec!(0));

        let second = apply_payment(dec!(100), first.montant_paye, dec!(0));
        assert!(second.is_err());
    }
}

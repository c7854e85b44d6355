//! Billing totals
//!
//! Recomputed from the full invoice collection on every call; there is no
//! caching or incremental maintenance.

use crate::models::{InvoiceFigures, PaymentStatus};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

/// Portfolio-wide billing statistics
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BillingStatistics {
    pub total_facturation: Decimal,
    pub total_paye: Decimal,
    pub total_impaye: Decimal,
    pub nombre_factures_impayees: i64,
}

/// Billing totals scoped to one patient's invoices
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PatientBalance {
    pub total: Decimal,
    pub paye: Decimal,
    pub solde: Decimal,
}

/// Sum billed and paid amounts across all invoices and count the ones whose
/// status is exactly `impaye`. An empty collection yields all-zero results.
pub fn compute_statistics<'a, I>(invoices: I) -> BillingStatistics
where
    I: IntoIterator<Item = &'a InvoiceFigures>,
{
    let mut total_facturation = Decimal::ZERO;
    let mut total_paye = Decimal::ZERO;
    let mut impayees = 0i64;

    for invoice in invoices {
        total_facturation += invoice.montant;
        total_paye += invoice.montant_paye;
        if invoice.statut == PaymentStatus::Impaye {
            impayees += 1;
        }
    }

    BillingStatistics {
        total_facturation,
        total_paye,
        total_impaye: total_facturation - total_paye,
        nombre_factures_impayees: impayees,
    }
}

/// Billed/paid/balance totals over one patient's invoices
pub fn compute_patient_balance<'a, I>(invoices: I) -> PatientBalance
where
    I: IntoIterator<Item = &'a InvoiceFigures>,
{
    let mut total = Decimal::ZERO;
    let mut paye = Decimal::ZERO;

    for invoice in invoices {
        total += invoice.montant;
        paye += invoice.montant_paye;
    }

    PatientBalance {
        total,
        paye,
        solde: total - paye,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn invoice(montant: Decimal, paye: Decimal, statut: PaymentStatus) -> InvoiceFigures {
        InvoiceFigures {
            montant,
            montant_paye: paye,
            statut,
        }
    }

    #[test]
    fn statistics_sum_all_columns() {
        let invoices = vec![
            invoice(dec!(100), dec!(100), PaymentStatus::Paye),
            invoice(dec!(200), dec!(50), PaymentStatus::Partiel),
            invoice(dec!(80), dec!(0), PaymentStatus::Impaye),
            invoice(dec!(40), dec!(0), PaymentStatus::Impaye),
        ];

        let stats = compute_statistics(&invoices);
        assert_eq!(stats.total_facturation, dec!(420));
        assert_eq!(stats.total_paye, dec!(150));
        assert_eq!(stats.total_impaye, dec!(270));
        assert_eq!(stats.nombre_factures_impayees, 2);
    }

    #[test]
    fn cancelled_invoices_count_toward_totals_not_unpaid() {
        let invoices = vec![
            invoice(dec!(60), dec!(0), PaymentStatus::Annule),
            invoice(dec!(30), dec!(0), PaymentStatus::Impaye),
        ];

        let stats = compute_statistics(&invoices);
        assert_eq!(stats.total_facturation, dec!(90));
        assert_eq!(stats.nombre_factures_impayees, 1);
    }

    #[test]
    fn empty_collection_yields_zeros() {
        let stats = compute_statistics(&[]);
        assert_eq!(stats.total_facturation, Decimal::ZERO);
        assert_eq!(stats.total_paye, Decimal::ZERO);
        assert_eq!(stats.total_impaye, Decimal::ZERO);
        assert_eq!(stats.nombre_factures_impayees, 0);
    }

    #[test]
    fn patient_balance_totals() {
        let invoices = vec![
            invoice(dec!(120), dec!(120), PaymentStatus::Paye),
            invoice(dec!(75.50), dec!(25.50), PaymentStatus::Partiel),
        ];

        let balance = compute_patient_balance(&invoices);
        assert_eq!(balance.total, dec!(195.50));
        assert_eq!(balance.paye, dec!(145.50));
        assert_eq!(balance.solde, dec!(50));
    }

    #[test]
    fn patient_balance_empty() {
        let balance = compute_patient_balance(&[]);
        assert_eq!(balance.total, Decimal::ZERO);
        assert_eq!(balance.solde, Decimal::ZERO);
    }

    #[test]
    fn figures_solde() {
        let inv = invoice(dec!(100), dec!(40), PaymentStatus::Partiel);
        assert_eq!(inv.solde(), dec!(60));
    }
}

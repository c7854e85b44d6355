use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Payment status of an invoice
///
/// Wire spellings match the historical French API; the Postgres binding
/// targets the `statut_paiement` enum type created by the initial migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "statut_paiement", rename_all = "snake_case")]
pub enum PaymentStatus {
    Paye,
    Partiel,
    Impaye,
    Annule,
}

/// The monetary fields of one invoice, as seen by the aggregator
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InvoiceFigures {
    pub montant: Decimal,
    pub montant_paye: Decimal,
    pub statut: PaymentStatus,
}

impl InvoiceFigures {
    /// Remaining balance (`montant - montant_paye`)
    pub fn solde(&self) -> Decimal {
        self.montant - self.montant_paye
    }
}

//! Billing domain logic for the hospital API
//!
//! Provides the two pieces of derived computation the invoicing layer needs:
//! - payment application against an invoice, with status recomputation
//! - portfolio-wide and per-patient billing totals

pub mod error;
pub mod ledger;
pub mod models;
pub mod reporting;

pub use error::*;
pub use ledger::*;
pub use models::*;
pub use reporting::*;

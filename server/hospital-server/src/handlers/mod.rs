//! HTTP handlers, one module per resource

pub mod appointments;
pub mod auth;
pub mod consultations;
pub mod doctors;
pub mod health;
pub mod invoices;
pub mod medications;
pub mod patients;
pub mod prescriptions;

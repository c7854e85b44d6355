pub mod paths;

use crate::handlers::{
    appointments, auth, consultations, doctors, health, invoices, medications, patients,
    prescriptions,
};
use crate::server::HospitalServer;
use axum::routing::{get, post};
use axum::Router;

/// Health check routes
pub fn health_routes() -> Router<HospitalServer> {
    Router::new().route(paths::health::HEALTH, get(health::health_check))
}

/// Token obtain/refresh routes (the only unauthenticated endpoints)
pub fn token_routes() -> Router<HospitalServer> {
    Router::new()
        .route(paths::token::OBTAIN, post(auth::obtain_token))
        .route(paths::token::REFRESH, post(auth::refresh_token))
}

/// Patient CRUD and sub-resource routes
pub fn patient_routes() -> Router<HospitalServer> {
    Router::new()
        .route(
            paths::patients::COLLECTION,
            get(patients::list_patients).post(patients::create_patient),
        )
        .route(
            paths::patients::BY_ID,
            get(patients::get_patient)
                .put(patients::update_patient)
                .patch(patients::update_patient)
                .delete(patients::delete_patient),
        )
        .route(
            paths::patients::CONSULTATIONS,
            get(patients::patient_consultations),
        )
        .route(paths::patients::FACTURATIONS, get(patients::patient_invoices))
        .route(
            paths::patients::RENDEZ_VOUS,
            get(patients::patient_appointments),
        )
}

/// Doctor CRUD and sub-resource routes
pub fn doctor_routes() -> Router<HospitalServer> {
    Router::new()
        .route(
            paths::medecins::COLLECTION,
            get(doctors::list_doctors).post(doctors::create_doctor),
        )
        .route(
            paths::medecins::BY_ID,
            get(doctors::get_doctor)
                .put(doctors::update_doctor)
                .patch(doctors::update_doctor)
                .delete(doctors::delete_doctor),
        )
        .route(
            paths::medecins::CONSULTATIONS,
            get(doctors::doctor_consultations),
        )
        .route(
            paths::medecins::RENDEZ_VOUS,
            get(doctors::doctor_appointments),
        )
}

/// Appointment CRUD and status-transition routes
pub fn appointment_routes() -> Router<HospitalServer> {
    Router::new()
        .route(
            paths::rendez_vous::COLLECTION,
            get(appointments::list_appointments).post(appointments::create_appointment),
        )
        .route(
            paths::rendez_vous::BY_ID,
            get(appointments::get_appointment)
                .put(appointments::update_appointment)
                .patch(appointments::update_appointment)
                .delete(appointments::delete_appointment),
        )
        .route(
            paths::rendez_vous::CONFIRMER,
            post(appointments::confirm_appointment),
        )
        .route(
            paths::rendez_vous::ANNULER,
            post(appointments::cancel_appointment),
        )
}

/// Consultation CRUD routes
pub fn consultation_routes() -> Router<HospitalServer> {
    Router::new()
        .route(
            paths::consultations::COLLECTION,
            get(consultations::list_consultations).post(consultations::create_consultation),
        )
        .route(
            paths::consultations::BY_ID,
            get(consultations::get_consultation)
                .put(consultations::update_consultation)
                .patch(consultations::update_consultation)
                .delete(consultations::delete_consultation),
        )
        .route(
            paths::consultations::ORDONNANCE,
            get(consultations::consultation_prescription),
        )
}

/// Medication CRUD routes
pub fn medication_routes() -> Router<HospitalServer> {
    Router::new()
        .route(
            paths::medicaments::COLLECTION,
            get(medications::list_medications).post(medications::create_medication),
        )
        .route(
            paths::medicaments::BY_ID,
            get(medications::get_medication)
                .put(medications::update_medication)
                .patch(medications::update_medication)
                .delete(medications::delete_medication),
        )
}

/// Prescription CRUD and line-management routes
pub fn prescription_routes() -> Router<HospitalServer> {
    Router::new()
        .route(
            paths::ordonnances::COLLECTION,
            get(prescriptions::list_prescriptions).post(prescriptions::create_prescription),
        )
        .route(
            paths::ordonnances::BY_ID,
            get(prescriptions::get_prescription)
                .put(prescriptions::update_prescription)
                .patch(prescriptions::update_prescription)
                .delete(prescriptions::delete_prescription),
        )
        .route(
            paths::ordonnances::AJOUTER_MEDICAMENT,
            post(prescriptions::add_prescription_line),
        )
}

/// Invoice CRUD, payment and statistics routes
pub fn invoice_routes() -> Router<HospitalServer> {
    Router::new()
        .route(
            paths::facturations::COLLECTION,
            get(invoices::list_invoices).post(invoices::create_invoice),
        )
        .route(
            paths::facturations::STATISTIQUES,
            get(invoices::billing_statistics),
        )
        .route(
            paths::facturations::BY_ID,
            get(invoices::get_invoice)
                .put(invoices::update_invoice)
                .patch(invoices::update_invoice)
                .delete(invoices::delete_invoice),
        )
        .route(
            paths::facturations::ENREGISTRER_PAIEMENT,
            post(invoices::register_payment),
        )
}

/// Assemble all route groups
pub fn create_routes() -> Router<HospitalServer> {
    Router::new()
        .merge(health_routes())
        .merge(token_routes())
        .merge(patient_routes())
        .merge(doctor_routes())
        .merge(appointment_routes())
        .merge(consultation_routes())
        .merge(medication_routes())
        .merge(prescription_routes())
        .merge(invoice_routes())
}

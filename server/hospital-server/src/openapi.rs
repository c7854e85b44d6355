use crate::server::HospitalServer;
use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

/// Main OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health endpoints
        crate::handlers::health::health_check,

        // Authentication endpoints
        crate::handlers::auth::obtain_token,
        crate::handlers::auth::refresh_token,

        // Patient endpoints
        crate::handlers::patients::list_patients,
        crate::handlers::patients::create_patient,
        crate::handlers::patients::get_patient,
        crate::handlers::patients::update_patient,
        crate::handlers::patients::delete_patient,
        crate::handlers::patients::patient_consultations,
        crate::handlers::patients::patient_invoices,
        crate::handlers::patients::patient_appointments,

        // Doctor endpoints
        crate::handlers::doctors::list_doctors,
        crate::handlers::doctors::create_doctor,
        crate::handlers::doctors::get_doctor,
        crate::handlers::doctors::update_doctor,
        crate::handlers::doctors::delete_doctor,
        crate::handlers::doctors::doctor_consultations,
        crate::handlers::doctors::doctor_appointments,

        // Appointment endpoints
        crate::handlers::appointments::list_appointments,
        crate::handlers::appointments::create_appointment,
        crate::handlers::appointments::get_appointment,
        crate::handlers::appointments::update_appointment,
        crate::handlers::appointments::delete_appointment,
        crate::handlers::appointments::confirm_appointment,
        crate::handlers::appointments::cancel_appointment,

        // Consultation endpoints
        crate::handlers::consultations::list_consultations,
        crate::handlers::consultations::create_consultation,
        crate::handlers::consultations::get_consultation,
        crate::handlers::consultations::update_consultation,
        crate::handlers::consultations::delete_consultation,
        crate::handlers::consultations::consultation_prescription,

        // Medication endpoints
        crate::handlers::medications::list_medications,
        crate::handlers::medications::create_medication,
        crate::handlers::medications::get_medication,
        crate::handlers::medications::update_medication,
        crate::handlers::medications::delete_medication,

        // Prescription endpoints
        crate::handlers::prescriptions::list_prescriptions,
        crate::handlers::prescriptions::create_prescription,
        crate::handlers::prescriptions::get_prescription,
        crate::handlers::prescriptions::update_prescription,
        crate::handlers::prescriptions::delete_prescription,
        crate::handlers::prescriptions::add_prescription_line,

        // Invoice endpoints
        crate::handlers::invoices::list_invoices,
        crate::handlers::invoices::create_invoice,
        crate::handlers::invoices::get_invoice,
        crate::handlers::invoices::update_invoice,
        crate::handlers::invoices::delete_invoice,
        crate::handlers::invoices::register_payment,
        crate::handlers::invoices::billing_statistics,
    ),
    components(
        schemas(
            // Health schemas
            crate::handlers::health::HealthResponse,

            // Authentication schemas
            crate::handlers::auth::TokenObtainRequest,
            crate::handlers::auth::TokenPairResponse,
            crate::handlers::auth::TokenRefreshRequest,
            crate::handlers::auth::TokenRefreshResponse,

            // Patient schemas
            crate::handlers::patients::Gender,
            crate::handlers::patients::PatientStatus,
            crate::handlers::patients::Patient,
            crate::handlers::patients::PatientResponse,
            crate::handlers::patients::CreatePatientRequest,
            crate::handlers::patients::UpdatePatientRequest,
            crate::handlers::patients::PatientInvoicesResponse,

            // Doctor schemas
            crate::handlers::doctors::Specialty,
            crate::handlers::doctors::Doctor,
            crate::handlers::doctors::CreateDoctorRequest,
            crate::handlers::doctors::UpdateDoctorRequest,

            // Appointment schemas
            crate::handlers::appointments::AppointmentStatus,
            crate::handlers::appointments::Appointment,
            crate::handlers::appointments::CreateAppointmentRequest,
            crate::handlers::appointments::UpdateAppointmentRequest,
            crate::handlers::appointments::AppointmentActionResponse,

            // Consultation schemas
            crate::handlers::consultations::ConsultationStatus,
            crate::handlers::consultations::Consultation,
            crate::handlers::consultations::CreateConsultationRequest,
            crate::handlers::consultations::UpdateConsultationRequest,

            // Medication schemas
            crate::handlers::medications::Medication,
            crate::handlers::medications::CreateMedicationRequest,
            crate::handlers::medications::UpdateMedicationRequest,

            // Prescription schemas
            crate::handlers::prescriptions::Prescription,
            crate::handlers::prescriptions::PrescriptionResponse,
            crate::handlers::prescriptions::PrescriptionLine,
            crate::handlers::prescriptions::MedicationSummary,
            crate::handlers::prescriptions::CreatePrescriptionRequest,
            crate::handlers::prescriptions::UpdatePrescriptionRequest,
            crate::handlers::prescriptions::AddPrescriptionLineRequest,

            // Invoice schemas
            billing_core::models::PaymentStatus,
            billing_core::reporting::BillingStatistics,
            crate::handlers::invoices::Invoice,
            crate::handlers::invoices::InvoiceResponse,
            crate::handlers::invoices::CreateInvoiceRequest,
            crate::handlers::invoices::UpdateInvoiceRequest,
            crate::handlers::invoices::RegisterPaymentRequest,
            crate::handlers::invoices::RegisterPaymentResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "System health endpoints"),
        (name = "auth", description = "Token issuance and refresh"),
        (name = "patients", description = "Patient management and records"),
        (name = "medecins", description = "Doctor management"),
        (name = "rendez-vous", description = "Appointment scheduling"),
        (name = "consultations", description = "Consultation records"),
        (name = "medicaments", description = "Medication catalog"),
        (name = "ordonnances", description = "Prescriptions and medication lines"),
        (name = "facturations", description = "Invoicing and payments"),
    ),
    info(
        title = "Hospital Management API",
        version = "0.1.0",
        description = "REST backend for hospital management: patients, doctors, appointments, consultations, prescriptions and billing.",
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server"),
    ),
)]
pub struct ApiDoc;

/// Registers the bearer JWT scheme referenced by the secured endpoints
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Swagger UI at `/docs`, OpenAPI document at `/api-docs/openapi.json`
pub fn swagger_router() -> Router<HospitalServer> {
    SwaggerUi::new("/docs")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}

//! Patient CRUD and sub-resource endpoints

use crate::error::{api_success, api_success_with_meta, ApiError, ApiResponse};
use crate::handlers::appointments::Appointment;
use crate::handlers::consultations::Consultation;
use crate::handlers::invoices::{invoice_figures, Invoice, InvoiceResponse};
use crate::middleware::AuthContext;
use crate::server::HospitalServer;
use crate::types::pagination::PaginationParams;
use crate::utils::query_builder::PaginatedQuery;
use crate::validation::RequestValidation;
use crate::{validate_email, validate_length, validate_required};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use billing_core::reporting::compute_patient_balance;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const SEARCH_COLUMNS: &[&str] = &["nom", "prenom", "email", "telephone"];
const ORDERING_FIELDS: &[&str] = &["date_enregistrement", "nom", "prenom"];

/// Patient gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "genre_patient")]
pub enum Gender {
    M,
    F,
    A,
}

/// Patient record status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "statut_patient", rename_all = "snake_case")]
pub enum PatientStatus {
    Actif,
    Inactif,
    Suspendu,
}

/// Patient record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Patient {
    pub id: Uuid,
    pub nom: String,
    pub prenom: String,
    pub date_naissance: NaiveDate,
    pub genre: Gender,
    pub adresse: String,
    pub telephone: String,
    pub email: String,
    pub numero_secu: Option<String>,
    pub statut: PatientStatus,
    pub notes: Option<String>,
    pub date_enregistrement: DateTime<Utc>,
    pub date_modification: DateTime<Utc>,
}

impl Patient {
    /// Age in full years as of `today`
    pub fn age_at(&self, today: NaiveDate) -> i32 {
        let mut age = today.year() - self.date_naissance.year();
        if (today.month(), today.day()) < (self.date_naissance.month(), self.date_naissance.day())
        {
            age -= 1;
        }
        age
    }
}

/// Patient wire representation with the computed `age` field
#[derive(Debug, Serialize, ToSchema)]
pub struct PatientResponse {
    #[serde(flatten)]
    pub patient: Patient,
    pub age: i32,
}

impl From<Patient> for PatientResponse {
    fn from(patient: Patient) -> Self {
        let age = patient.age_at(Utc::now().date_naive());
        Self { patient, age }
    }
}

/// Create Patient request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePatientRequest {
    pub nom: String,
    pub prenom: String,
    pub date_naissance: NaiveDate,
    pub genre: Option<Gender>,
    pub adresse: String,
    pub telephone: String,
    pub email: String,
    pub numero_secu: Option<String>,
    pub statut: Option<PatientStatus>,
    pub notes: Option<String>,
}

impl RequestValidation for CreatePatientRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.nom, "Le nom est requis");
        validate_required!(self.prenom, "Le prénom est requis");
        validate_required!(self.adresse, "L'adresse est requise");
        validate_required!(self.telephone, "Le téléphone est requis");

        validate_length!(self.nom, 1, 100, "Le nom doit faire au plus 100 caractères");
        validate_length!(self.prenom, 1, 100, "Le prénom doit faire au plus 100 caractères");
        validate_length!(self.telephone, 1, 20, "Le téléphone doit faire au plus 20 caractères");
        validate_email!(self.email, "Format d'email invalide");

        if let Some(ref numero_secu) = self.numero_secu {
            validate_length!(
                numero_secu,
                1,
                15,
                "Le numéro de sécurité sociale doit faire au plus 15 caractères"
            );
        }

        Ok(())
    }
}

/// Update Patient request (all fields optional)
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePatientRequest {
    pub nom: Option<String>,
    pub prenom: Option<String>,
    pub date_naissance: Option<NaiveDate>,
    pub genre: Option<Gender>,
    pub adresse: Option<String>,
    pub telephone: Option<String>,
    pub email: Option<String>,
    pub numero_secu: Option<String>,
    pub statut: Option<PatientStatus>,
    pub notes: Option<String>,
}

impl RequestValidation for UpdatePatientRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(ref nom) = self.nom {
            validate_length!(nom, 1, 100, "Le nom doit faire au plus 100 caractères");
        }
        if let Some(ref prenom) = self.prenom {
            validate_length!(prenom, 1, 100, "Le prénom doit faire au plus 100 caractères");
        }
        if let Some(ref email) = self.email {
            validate_email!(email, "Format d'email invalide");
        }
        Ok(())
    }
}

/// List Patients query parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListPatientsParams {
    pub statut: Option<PatientStatus>,
    pub genre: Option<Gender>,
    /// Free-text search across nom, prenom, email, telephone
    pub search: Option<String>,
    /// Ordering field, `-` prefix for descending
    pub ordering: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

/// Patient invoices with billing totals
#[derive(Debug, Serialize, ToSchema)]
pub struct PatientInvoicesResponse {
    pub facturations: Vec<InvoiceResponse>,
    pub total: Decimal,
    pub paye: Decimal,
    pub solde: Decimal,
}

/// Return 404 unless the patient exists
async fn ensure_patient_exists(server: &HospitalServer, id: Uuid) -> Result<(), ApiError> {
    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM patients WHERE id = $1)")
            .bind(id)
            .fetch_one(&server.db_pool)
            .await?;
    if exists {
        Ok(())
    } else {
        Err(ApiError::not_found("patient"))
    }
}

/// List patients
#[utoipa::path(
    get,
    path = "/api/patients/",
    responses(
        (status = 200, description = "Patients retrieved", body = Vec<PatientResponse>),
        (status = 401, description = "Unauthorized")
    ),
    params(ListPatientsParams),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn list_patients(
    State(server): State<HospitalServer>,
    Query(params): Query<ListPatientsParams>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<PatientResponse>>>, ApiError> {
    let mut query = PaginatedQuery::new("SELECT * FROM patients WHERE 1=1");
    query
        .filter_eq("statut", params.statut)
        .filter_eq("genre", params.genre)
        .search_ilike(SEARCH_COLUMNS, params.search.as_deref())
        .order_by_param(
            params.ordering.as_deref(),
            ORDERING_FIELDS,
            ("date_enregistrement", "DESC"),
        )
        .paginate(params.pagination.page, params.pagination.page_size);

    let patients: Vec<Patient> = query.build_query_as().fetch_all(&server.db_pool).await?;

    let total_count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM patients
        WHERE ($1::statut_patient IS NULL OR statut = $1)
          AND ($2::genre_patient IS NULL OR genre = $2)
          AND ($3::text IS NULL
               OR nom ILIKE '%' || $3 || '%'
               OR prenom ILIKE '%' || $3 || '%'
               OR email ILIKE '%' || $3 || '%'
               OR telephone ILIKE '%' || $3 || '%')
        "#,
    )
    .bind(params.statut)
    .bind(params.genre)
    .bind(params.search.as_deref())
    .fetch_one(&server.db_pool)
    .await?;

    let metadata = params.pagination.to_metadata(total_count);
    let responses: Vec<PatientResponse> = patients.into_iter().map(Into::into).collect();
    Ok(Json(api_success_with_meta(responses, metadata)))
}

/// Get a patient by ID
#[utoipa::path(
    get,
    path = "/api/patients/{id}/",
    responses(
        (status = 200, description = "Patient retrieved", body = PatientResponse),
        (status = 404, description = "Patient not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Patient ID")),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn get_patient(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<PatientResponse>>, ApiError> {
    let patient = sqlx::query_as::<_, Patient>("SELECT * FROM patients WHERE id = $1")
        .bind(id)
        .fetch_optional(&server.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("patient"))?;

    Ok(Json(api_success(patient.into())))
}

/// Create a patient
#[utoipa::path(
    post,
    path = "/api/patients/",
    request_body = CreatePatientRequest,
    responses(
        (status = 201, description = "Patient created", body = PatientResponse),
        (status = 400, description = "Invalid request or duplicate email"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn create_patient(
    State(server): State<HospitalServer>,
    _auth: AuthContext,
    Json(req): Json<CreatePatientRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PatientResponse>>), ApiError> {
    req.validate()?;

    let patient = sqlx::query_as::<_, Patient>(
        r#"
        INSERT INTO patients (
            nom, prenom, date_naissance, genre, adresse, telephone, email,
            numero_secu, statut, notes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(&req.nom)
    .bind(&req.prenom)
    .bind(req.date_naissance)
    .bind(req.genre.unwrap_or(Gender::M))
    .bind(&req.adresse)
    .bind(&req.telephone)
    .bind(&req.email)
    .bind(&req.numero_secu)
    .bind(req.statut.unwrap_or(PatientStatus::Actif))
    .bind(&req.notes)
    .fetch_one(&server.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(api_success(patient.into()))))
}

/// Update a patient (full or partial)
#[utoipa::path(
    put,
    path = "/api/patients/{id}/",
    request_body = UpdatePatientRequest,
    responses(
        (status = 200, description = "Patient updated", body = PatientResponse),
        (status = 404, description = "Patient not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Patient ID")),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn update_patient(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
    Json(req): Json<UpdatePatientRequest>,
) -> Result<Json<ApiResponse<PatientResponse>>, ApiError> {
    req.validate()?;

    let patient = sqlx::query_as::<_, Patient>(
        r#"
        UPDATE patients
        SET
            nom = COALESCE($1, nom),
            prenom = COALESCE($2, prenom),
            date_naissance = COALESCE($3, date_naissance),
            genre = COALESCE($4, genre),
            adresse = COALESCE($5, adresse),
            telephone = COALESCE($6, telephone),
            email = COALESCE($7, email),
            numero_secu = COALESCE($8, numero_secu),
            statut = COALESCE($9, statut),
            notes = COALESCE($10, notes),
            date_modification = NOW()
        WHERE id = $11
        RETURNING *
        "#,
    )
    .bind(&req.nom)
    .bind(&req.prenom)
    .bind(req.date_naissance)
    .bind(req.genre)
    .bind(&req.adresse)
    .bind(&req.telephone)
    .bind(&req.email)
    .bind(&req.numero_secu)
    .bind(req.statut)
    .bind(&req.notes)
    .bind(id)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::not_found("patient"))?;

    Ok(Json(api_success(patient.into())))
}

/// Delete a patient (cascades to appointments, consultations,
/// prescriptions and invoices)
#[utoipa::path(
    delete,
    path = "/api/patients/{id}/",
    responses(
        (status = 204, description = "Patient deleted"),
        (status = 404, description = "Patient not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Patient ID")),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn delete_patient(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM patients WHERE id = $1")
        .bind(id)
        .execute(&server.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("patient"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// List one patient's consultations
#[utoipa::path(
    get,
    path = "/api/patients/{id}/consultations/",
    responses(
        (status = 200, description = "Consultations retrieved", body = Vec<Consultation>),
        (status = 404, description = "Patient not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Patient ID")),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn patient_consultations(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<Consultation>>>, ApiError> {
    ensure_patient_exists(&server, id).await?;

    let consultations = sqlx::query_as::<_, Consultation>(
        "SELECT * FROM consultations WHERE patient_id = $1 ORDER BY date_consultation DESC",
    )
    .bind(id)
    .fetch_all(&server.db_pool)
    .await?;

    Ok(Json(api_success(consultations)))
}

/// List one patient's invoices with billing totals
#[utoipa::path(
    get,
    path = "/api/patients/{id}/facturations/",
    responses(
        (status = 200, description = "Invoices and balance retrieved", body = PatientInvoicesResponse),
        (status = 404, description = "Patient not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Patient ID")),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn patient_invoices(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<PatientInvoicesResponse>>, ApiError> {
    ensure_patient_exists(&server, id).await?;

    let invoices = sqlx::query_as::<_, Invoice>(
        "SELECT * FROM facturations WHERE patient_id = $1 ORDER BY date_facturation DESC",
    )
    .bind(id)
    .fetch_all(&server.db_pool)
    .await?;

    let figures: Vec<_> = invoices.iter().map(invoice_figures).collect();
    let balance = compute_patient_balance(&figures);

    Ok(Json(api_success(PatientInvoicesResponse {
        facturations: invoices.into_iter().map(Into::into).collect(),
        total: balance.total,
        paye: balance.paye,
        solde: balance.solde,
    })))
}

/// List one patient's appointments
#[utoipa::path(
    get,
    path = "/api/patients/{id}/rendez_vous/",
    responses(
        (status = 200, description = "Appointments retrieved", body = Vec<Appointment>),
        (status = 404, description = "Patient not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Patient ID")),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn patient_appointments(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<Appointment>>>, ApiError> {
    ensure_patient_exists(&server, id).await?;

    let appointments = sqlx::query_as::<_, Appointment>(
        "SELECT * FROM rendez_vous WHERE patient_id = $1 ORDER BY date_heure DESC",
    )
    .bind(id)
    .fetch_all(&server.db_pool)
    .await?;

    Ok(Json(api_success(appointments)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient(date_naissance: NaiveDate) -> Patient {
        Patient {
            id: Uuid::new_v4(),
            nom: "Dupont".to_string(),
            prenom: "Marie".to_string(),
            date_naissance,
            genre: Gender::F,
            adresse: "1 rue de la Paix".to_string(),
            telephone: "0612345678".to_string(),
            email: "marie.dupont@example.fr".to_string(),
            numero_secu: None,
            statut: PatientStatus::Actif,
            notes: None,
            date_enregistrement: Utc::now(),
            date_modification: Utc::now(),
        }
    }

    #[test]
    fn age_counts_full_years_only() {
        let p = patient(NaiveDate::from_ymd_opt(1990, 6, 15).unwrap());
        let before_birthday = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let on_birthday = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(p.age_at(before_birthday), 33);
        assert_eq!(p.age_at(on_birthday), 34);
    }

    #[test]
    fn status_serializes_french_spellings() {
        assert_eq!(
            serde_json::to_string(&PatientStatus::Actif).unwrap(),
            "\"actif\""
        );
        assert_eq!(serde_json::to_string(&Gender::F).unwrap(), "\"F\"");
    }

    #[test]
    fn create_request_rejects_bad_email() {
        let req = CreatePatientRequest {
            nom: "Dupont".to_string(),
            prenom: "Marie".to_string(),
            date_naissance: NaiveDate::from_ymd_opt(1990, 6, 15).unwrap(),
            genre: None,
            adresse: "1 rue de la Paix".to_string(),
            telephone: "0612345678".to_string(),
            email: "pas-un-email".to_string(),
            numero_secu: None,
            statut: None,
            notes: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn response_embeds_age() {
        let p = patient(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        let resp = PatientResponse::from(p);
        let value = serde_json::to_value(&resp).unwrap();
        assert!(value.get("age").is_some());
        assert_eq!(value.get("nom").unwrap(), "Dupont");
    }
}

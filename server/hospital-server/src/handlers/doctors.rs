//! Doctor CRUD and sub-resource endpoints

use crate::error::{api_success, api_success_with_meta, ApiError, ApiResponse};
use crate::handlers::appointments::Appointment;
use crate::handlers::consultations::Consultation;
use crate::middleware::AuthContext;
use crate::server::HospitalServer;
use crate::types::pagination::PaginationParams;
use crate::utils::query_builder::PaginatedQuery;
use crate::validation::RequestValidation;
use crate::{validate_email, validate_length, validate_required};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const SEARCH_COLUMNS: &[&str] = &["nom", "prenom", "email", "specialite"];
const ORDERING_FIELDS: &[&str] = &["nom", "prenom", "specialite"];

/// Medical specialty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "specialite_medecin", rename_all = "snake_case")]
pub enum Specialty {
    Cardiologie,
    Dermatologie,
    Neurologie,
    Pediatrie,
    Psychiatrie,
    Chirurgie,
    Ophtalmologie,
    Dentiste,
    Autre,
}

/// Doctor record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Doctor {
    pub id: Uuid,
    pub nom: String,
    pub prenom: String,
    pub specialite: Specialty,
    pub telephone: String,
    pub email: String,
    pub numero_licence: String,
    pub adresse_cabinet: String,
    pub date_ajout: DateTime<Utc>,
}

/// Create Doctor request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDoctorRequest {
    pub nom: String,
    pub prenom: String,
    pub specialite: Specialty,
    pub telephone: String,
    pub email: String,
    pub numero_licence: String,
    pub adresse_cabinet: String,
}

impl RequestValidation for CreateDoctorRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.nom, "Le nom est requis");
        validate_required!(self.prenom, "Le prénom est requis");
        validate_required!(self.telephone, "Le téléphone est requis");
        validate_required!(self.numero_licence, "Le numéro de licence est requis");
        validate_required!(self.adresse_cabinet, "L'adresse du cabinet est requise");

        validate_length!(self.nom, 1, 100, "Le nom doit faire au plus 100 caractères");
        validate_length!(self.prenom, 1, 100, "Le prénom doit faire au plus 100 caractères");
        validate_length!(
            self.numero_licence,
            1,
            20,
            "Le numéro de licence doit faire au plus 20 caractères"
        );
        validate_email!(self.email, "Format d'email invalide");
        Ok(())
    }
}

/// Update Doctor request (all fields optional)
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDoctorRequest {
    pub nom: Option<String>,
    pub prenom: Option<String>,
    pub specialite: Option<Specialty>,
    pub telephone: Option<String>,
    pub email: Option<String>,
    pub numero_licence: Option<String>,
    pub adresse_cabinet: Option<String>,
}

impl RequestValidation for UpdateDoctorRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(ref nom) = self.nom {
            validate_length!(nom, 1, 100, "Le nom doit faire au plus 100 caractères");
        }
        if let Some(ref email) = self.email {
            validate_email!(email, "Format d'email invalide");
        }
        Ok(())
    }
}

/// List Doctors query parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListDoctorsParams {
    pub specialite: Option<Specialty>,
    /// Free-text search across nom, prenom, email, specialite
    pub search: Option<String>,
    /// Ordering field, `-` prefix for descending
    pub ordering: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

async fn ensure_doctor_exists(server: &HospitalServer, id: Uuid) -> Result<(), ApiError> {
    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM medecins WHERE id = $1)")
            .bind(id)
            .fetch_one(&server.db_pool)
            .await?;
    if exists {
        Ok(())
    } else {
        Err(ApiError::not_found("medecin"))
    }
}

/// List doctors
#[utoipa::path(
    get,
    path = "/api/medecins/",
    responses(
        (status = 200, description = "Doctors retrieved", body = Vec<Doctor>),
        (status = 401, description = "Unauthorized")
    ),
    params(ListDoctorsParams),
    tag = "medecins",
    security(("bearer_auth" = []))
)]
pub async fn list_doctors(
    State(server): State<HospitalServer>,
    Query(params): Query<ListDoctorsParams>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<Doctor>>>, ApiError> {
    let mut query = PaginatedQuery::new("SELECT * FROM medecins WHERE 1=1");
    query
        .filter_eq("specialite", params.specialite)
        .search_ilike(SEARCH_COLUMNS, params.search.as_deref())
        .order_by_param(params.ordering.as_deref(), ORDERING_FIELDS, ("nom", "ASC"))
        .paginate(params.pagination.page, params.pagination.page_size);

    let doctors: Vec<Doctor> = query.build_query_as().fetch_all(&server.db_pool).await?;

    let total_count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM medecins
        WHERE ($1::specialite_medecin IS NULL OR specialite = $1)
          AND ($2::text IS NULL
               OR nom ILIKE '%' || $2 || '%'
               OR prenom ILIKE '%' || $2 || '%'
               OR email ILIKE '%' || $2 || '%'
               OR specialite::text ILIKE '%' || $2 || '%')
        "#,
    )
    .bind(params.specialite)
    .bind(params.search.as_deref())
    .fetch_one(&server.db_pool)
    .await?;

    let metadata = params.pagination.to_metadata(total_count);
    Ok(Json(api_success_with_meta(doctors, metadata)))
}

/// Get a doctor by ID
#[utoipa::path(
    get,
    path = "/api/medecins/{id}/",
    responses(
        (status = 200, description = "Doctor retrieved", body = Doctor),
        (status = 404, description = "Doctor not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Doctor ID")),
    tag = "medecins",
    security(("bearer_auth" = []))
)]
pub async fn get_doctor(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Doctor>>, ApiError> {
    let doctor = sqlx::query_as::<_, Doctor>("SELECT * FROM medecins WHERE id = $1")
        .bind(id)
        .fetch_optional(&server.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("medecin"))?;

    Ok(Json(api_success(doctor)))
}

/// Create a doctor
#[utoipa::path(
    post,
    path = "/api/medecins/",
    request_body = CreateDoctorRequest,
    responses(
        (status = 201, description = "Doctor created", body = Doctor),
        (status = 400, description = "Invalid request or duplicate email/license"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "medecins",
    security(("bearer_auth" = []))
)]
pub async fn create_doctor(
    State(server): State<HospitalServer>,
    _auth: AuthContext,
    Json(req): Json<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Doctor>>), ApiError> {
    req.validate()?;

    let doctor = sqlx::query_as::<_, Doctor>(
        r#"
        INSERT INTO medecins (
            nom, prenom, specialite, telephone, email, numero_licence, adresse_cabinet
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(&req.nom)
    .bind(&req.prenom)
    .bind(req.specialite)
    .bind(&req.telephone)
    .bind(&req.email)
    .bind(&req.numero_licence)
    .bind(&req.adresse_cabinet)
    .fetch_one(&server.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(api_success(doctor))))
}

/// Update a doctor (full or partial)
#[utoipa::path(
    put,
    path = "/api/medecins/{id}/",
    request_body = UpdateDoctorRequest,
    responses(
        (status = 200, description = "Doctor updated", body = Doctor),
        (status = 404, description = "Doctor not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Doctor ID")),
    tag = "medecins",
    security(("bearer_auth" = []))
)]
pub async fn update_doctor(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
    Json(req): Json<UpdateDoctorRequest>,
) -> Result<Json<ApiResponse<Doctor>>, ApiError> {
    req.validate()?;

    let doctor = sqlx::query_as::<_, Doctor>(
        r#"
        UPDATE medecins
        SET
            nom = COALESCE($1, nom),
            prenom = COALESCE($2, prenom),
            specialite = COALESCE($3, specialite),
            telephone = COALESCE($4, telephone),
            email = COALESCE($5, email),
            numero_licence = COALESCE($6, numero_licence),
            adresse_cabinet = COALESCE($7, adresse_cabinet)
        WHERE id = $8
        RETURNING *
        "#,
    )
    .bind(&req.nom)
    .bind(&req.prenom)
    .bind(req.specialite)
    .bind(&req.telephone)
    .bind(&req.email)
    .bind(&req.numero_licence)
    .bind(&req.adresse_cabinet)
    .bind(id)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::not_found("medecin"))?;

    Ok(Json(api_success(doctor)))
}

/// Delete a doctor
#[utoipa::path(
    delete,
    path = "/api/medecins/{id}/",
    responses(
        (status = 204, description = "Doctor deleted"),
        (status = 404, description = "Doctor not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Doctor ID")),
    tag = "medecins",
    security(("bearer_auth" = []))
)]
pub async fn delete_doctor(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM medecins WHERE id = $1")
        .bind(id)
        .execute(&server.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("medecin"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// List one doctor's consultations
#[utoipa::path(
    get,
    path = "/api/medecins/{id}/consultations/",
    responses(
        (status = 200, description = "Consultations retrieved", body = Vec<Consultation>),
        (status = 404, description = "Doctor not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Doctor ID")),
    tag = "medecins",
    security(("bearer_auth" = []))
)]
pub async fn doctor_consultations(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<Consultation>>>, ApiError> {
    ensure_doctor_exists(&server, id).await?;

    let consultations = sqlx::query_as::<_, Consultation>(
        "SELECT * FROM consultations WHERE medecin_id = $1 ORDER BY date_consultation DESC",
    )
    .bind(id)
    .fetch_all(&server.db_pool)
    .await?;

    Ok(Json(api_success(consultations)))
}

/// List one doctor's confirmed appointments
#[utoipa::path(
    get,
    path = "/api/medecins/{id}/rendez_vous/",
    responses(
        (status = 200, description = "Confirmed appointments retrieved", body = Vec<Appointment>),
        (status = 404, description = "Doctor not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Doctor ID")),
    tag = "medecins",
    security(("bearer_auth" = []))
)]
pub async fn doctor_appointments(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<Appointment>>>, ApiError> {
    ensure_doctor_exists(&server, id).await?;

    // Only the confirmed slots matter for the doctor's planning view
    let appointments = sqlx::query_as::<_, Appointment>(
        "SELECT * FROM rendez_vous
         WHERE medecin_id = $1 AND statut = 'confirme'
         ORDER BY date_heure",
    )
    .bind(id)
    .fetch_all(&server.db_pool)
    .await?;

    Ok(Json(api_success(appointments)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specialty_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Specialty::Cardiologie).unwrap(),
            "\"cardiologie\""
        );
        assert_eq!(
            serde_json::from_str::<Specialty>("\"ophtalmologie\"").unwrap(),
            Specialty::Ophtalmologie
        );
    }

    #[test]
    fn create_request_requires_license_number() {
        let req = CreateDoctorRequest {
            nom: "Martin".to_string(),
            prenom: "Luc".to_string(),
            specialite: Specialty::Cardiologie,
            telephone: "0102030405".to_string(),
            email: "luc.martin@hopital.fr".to_string(),
            numero_licence: String::new(),
            adresse_cabinet: "2 avenue des Lilas".to_string(),
        };
        assert!(req.validate().is_err());
    }
}

//! Consultation CRUD endpoints

use crate::error::{api_success, api_success_with_meta, ApiError, ApiResponse};
use crate::handlers::prescriptions::{self, Prescription, PrescriptionResponse};
use crate::middleware::AuthContext;
use crate::server::HospitalServer;
use crate::types::pagination::PaginationParams;
use crate::utils::query_builder::PaginatedQuery;
use crate::validation::RequestValidation;
use crate::validate_required;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const ORDERING_FIELDS: &[&str] = &["date_consultation", "statut"];

/// Consultation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "statut_consultation", rename_all = "snake_case")]
pub enum ConsultationStatus {
    EnCours,
    Complete,
    Suspendue,
}

/// Consultation record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Consultation {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub medecin_id: Uuid,
    pub rendez_vous_id: Option<Uuid>,
    pub date_consultation: DateTime<Utc>,
    pub diagnostic: String,
    pub traitement: String,
    pub statut: ConsultationStatus,
    pub notes_supplementaires: Option<String>,
}

/// Create Consultation request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateConsultationRequest {
    pub patient_id: Uuid,
    pub medecin_id: Uuid,
    pub rendez_vous_id: Option<Uuid>,
    pub date_consultation: Option<DateTime<Utc>>,
    pub diagnostic: String,
    pub traitement: String,
    pub statut: Option<ConsultationStatus>,
    pub notes_supplementaires: Option<String>,
}

impl RequestValidation for CreateConsultationRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.diagnostic, "Le diagnostic est requis");
        validate_required!(self.traitement, "Le traitement est requis");
        Ok(())
    }
}

/// Update Consultation request (all fields optional)
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateConsultationRequest {
    pub rendez_vous_id: Option<Uuid>,
    pub date_consultation: Option<DateTime<Utc>>,
    pub diagnostic: Option<String>,
    pub traitement: Option<String>,
    pub statut: Option<ConsultationStatus>,
    pub notes_supplementaires: Option<String>,
}

impl RequestValidation for UpdateConsultationRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(ref diagnostic) = self.diagnostic {
            validate_required!(diagnostic, "Le diagnostic ne peut pas être vide");
        }
        if let Some(ref traitement) = self.traitement {
            validate_required!(traitement, "Le traitement ne peut pas être vide");
        }
        Ok(())
    }
}

/// List Consultations query parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListConsultationsParams {
    pub statut: Option<ConsultationStatus>,
    pub medecin: Option<Uuid>,
    pub patient: Option<Uuid>,
    /// Ordering field, `-` prefix for descending
    pub ordering: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

/// List consultations
#[utoipa::path(
    get,
    path = "/api/consultations/",
    responses(
        (status = 200, description = "Consultations retrieved", body = Vec<Consultation>),
        (status = 401, description = "Unauthorized")
    ),
    params(ListConsultationsParams),
    tag = "consultations",
    security(("bearer_auth" = []))
)]
pub async fn list_consultations(
    State(server): State<HospitalServer>,
    Query(params): Query<ListConsultationsParams>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<Consultation>>>, ApiError> {
    let mut query = PaginatedQuery::new("SELECT * FROM consultations WHERE 1=1");
    query
        .filter_eq("statut", params.statut)
        .filter_eq("medecin_id", params.medecin)
        .filter_eq("patient_id", params.patient)
        .order_by_param(
            params.ordering.as_deref(),
            ORDERING_FIELDS,
            ("date_consultation", "DESC"),
        )
        .paginate(params.pagination.page, params.pagination.page_size);

    let consultations: Vec<Consultation> =
        query.build_query_as().fetch_all(&server.db_pool).await?;

    let total_count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM consultations
        WHERE ($1::statut_consultation IS NULL OR statut = $1)
          AND ($2::uuid IS NULL OR medecin_id = $2)
          AND ($3::uuid IS NULL OR patient_id = $3)
        "#,
    )
    .bind(params.statut)
    .bind(params.medecin)
    .bind(params.patient)
    .fetch_one(&server.db_pool)
    .await?;

    let metadata = params.pagination.to_metadata(total_count);
    Ok(Json(api_success_with_meta(consultations, metadata)))
}

/// Get a consultation by ID
#[utoipa::path(
    get,
    path = "/api/consultations/{id}/",
    responses(
        (status = 200, description = "Consultation retrieved", body = Consultation),
        (status = 404, description = "Consultation not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Consultation ID")),
    tag = "consultations",
    security(("bearer_auth" = []))
)]
pub async fn get_consultation(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Consultation>>, ApiError> {
    let consultation =
        sqlx::query_as::<_, Consultation>("SELECT * FROM consultations WHERE id = $1")
            .bind(id)
            .fetch_optional(&server.db_pool)
            .await?
            .ok_or_else(|| ApiError::not_found("consultation"))?;

    Ok(Json(api_success(consultation)))
}

/// Create a consultation
#[utoipa::path(
    post,
    path = "/api/consultations/",
    request_body = CreateConsultationRequest,
    responses(
        (status = 201, description = "Consultation created", body = Consultation),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "consultations",
    security(("bearer_auth" = []))
)]
pub async fn create_consultation(
    State(server): State<HospitalServer>,
    _auth: AuthContext,
    Json(req): Json<CreateConsultationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Consultation>>), ApiError> {
    req.validate()?;

    let consultation = sqlx::query_as::<_, Consultation>(
        r#"
        INSERT INTO consultations (
            patient_id, medecin_id, rendez_vous_id, date_consultation,
            diagnostic, traitement, statut, notes_supplementaires
        )
        VALUES ($1, $2, $3, COALESCE($4, NOW()), $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(req.patient_id)
    .bind(req.medecin_id)
    .bind(req.rendez_vous_id)
    .bind(req.date_consultation)
    .bind(&req.diagnostic)
    .bind(&req.traitement)
    .bind(req.statut.unwrap_or(ConsultationStatus::Complete))
    .bind(&req.notes_supplementaires)
    .fetch_one(&server.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(api_success(consultation))))
}

/// Update a consultation (full or partial)
#[utoipa::path(
    put,
    path = "/api/consultations/{id}/",
    request_body = UpdateConsultationRequest,
    responses(
        (status = 200, description = "Consultation updated", body = Consultation),
        (status = 404, description = "Consultation not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Consultation ID")),
    tag = "consultations",
    security(("bearer_auth" = []))
)]
pub async fn update_consultation(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
    Json(req): Json<UpdateConsultationRequest>,
) -> Result<Json<ApiResponse<Consultation>>, ApiError> {
    req.validate()?;

    let consultation = sqlx::query_as::<_, Consultation>(
        r#"
        UPDATE consultations
        SET
            rendez_vous_id = COALESCE($1, rendez_vous_id),
            date_consultation = COALESCE($2, date_consultation),
            diagnostic = COALESCE($3, diagnostic),
            traitement = COALESCE($4, traitement),
            statut = COALESCE($5, statut),
            notes_supplementaires = COALESCE($6, notes_supplementaires)
        WHERE id = $7
        RETURNING *
        "#,
    )
    .bind(req.rendez_vous_id)
    .bind(req.date_consultation)
    .bind(&req.diagnostic)
    .bind(&req.traitement)
    .bind(req.statut)
    .bind(&req.notes_supplementaires)
    .bind(id)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::not_found("consultation"))?;

    Ok(Json(api_success(consultation)))
}

/// Delete a consultation (cascades to the prescription, keeps the
/// invoice with a nulled reference)
#[utoipa::path(
    delete,
    path = "/api/consultations/{id}/",
    responses(
        (status = 204, description = "Consultation deleted"),
        (status = 404, description = "Consultation not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Consultation ID")),
    tag = "consultations",
    security(("bearer_auth" = []))
)]
pub async fn delete_consultation(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM consultations WHERE id = $1")
        .bind(id)
        .execute(&server.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("consultation"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Get the prescription attached to a consultation
#[utoipa::path(
    get,
    path = "/api/consultations/{id}/ordonnance/",
    responses(
        (status = 200, description = "Prescription retrieved", body = PrescriptionResponse),
        (status = 404, description = "Consultation or prescription not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Consultation ID")),
    tag = "consultations",
    security(("bearer_auth" = []))
)]
pub async fn consultation_prescription(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<PrescriptionResponse>>, ApiError> {
    let prescription = sqlx::query_as::<_, Prescription>(
        "SELECT * FROM ordonnances WHERE consultation_id = $1",
    )
    .bind(id)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::not_found("ordonnance"))?;

    let response = prescriptions::with_lines(&server.db_pool, prescription).await?;
    Ok(Json(api_success(response)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_french_spellings() {
        assert_eq!(
            serde_json::to_string(&ConsultationStatus::EnCours).unwrap(),
            "\"en_cours\""
        );
        assert_eq!(
            serde_json::from_str::<ConsultationStatus>("\"suspendue\"").unwrap(),
            ConsultationStatus::Suspendue
        );
    }

    #[test]
    fn create_request_requires_diagnostic() {
        let req = CreateConsultationRequest {
            patient_id: Uuid::new_v4(),
            medecin_id: Uuid::new_v4(),
            rendez_vous_id: None,
            date_consultation: None,
            diagnostic: String::new(),
            traitement: "Repos".to_string(),
            statut: None,
            notes_supplementaires: None,
        };
        assert!(req.validate().is_err());
    }
}

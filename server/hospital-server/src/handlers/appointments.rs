//! Appointment CRUD and status-transition endpoints

use crate::error::{api_success, api_success_with_meta, ApiError, ApiResponse};
use crate::middleware::AuthContext;
use crate::server::HospitalServer;
use crate::types::pagination::PaginationParams;
use crate::utils::query_builder::PaginatedQuery;
use crate::validation::RequestValidation;
use crate::{validate_length, validate_required};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const ORDERING_FIELDS: &[&str] = &["date_heure", "date_creation"];

/// Appointment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "statut_rendez_vous", rename_all = "snake_case")]
pub enum AppointmentStatus {
    Confirme,
    Annule,
    Complete,
    Reporte,
}

/// Appointment record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub medecin_id: Uuid,
    pub date_heure: DateTime<Utc>,
    pub motif: String,
    pub statut: AppointmentStatus,
    pub notes: Option<String>,
    pub date_creation: DateTime<Utc>,
}

/// Create Appointment request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAppointmentRequest {
    pub patient_id: Uuid,
    pub medecin_id: Uuid,
    pub date_heure: DateTime<Utc>,
    pub motif: String,
    pub statut: Option<AppointmentStatus>,
    pub notes: Option<String>,
}

impl RequestValidation for CreateAppointmentRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.motif, "Le motif est requis");
        validate_length!(self.motif, 1, 255, "Le motif doit faire au plus 255 caractères");
        Ok(())
    }
}

/// Update Appointment request (all fields optional)
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAppointmentRequest {
    pub date_heure: Option<DateTime<Utc>>,
    pub motif: Option<String>,
    pub statut: Option<AppointmentStatus>,
    pub notes: Option<String>,
}

impl RequestValidation for UpdateAppointmentRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(ref motif) = self.motif {
            validate_length!(motif, 1, 255, "Le motif doit faire au plus 255 caractères");
        }
        Ok(())
    }
}

/// List Appointments query parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListAppointmentsParams {
    pub statut: Option<AppointmentStatus>,
    pub medecin: Option<Uuid>,
    /// Ordering field, `-` prefix for descending
    pub ordering: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

/// Status-transition response
#[derive(Debug, Serialize, ToSchema)]
pub struct AppointmentActionResponse {
    #[schema(example = "Rendez-vous confirmé")]
    pub status: String,
    pub rendez_vous: Appointment,
}

async fn set_appointment_status(
    server: &HospitalServer,
    id: Uuid,
    statut: AppointmentStatus,
) -> Result<Appointment, ApiError> {
    sqlx::query_as::<_, Appointment>(
        "UPDATE rendez_vous SET statut = $1 WHERE id = $2 RETURNING *",
    )
    .bind(statut)
    .bind(id)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::not_found("rendez-vous"))
}

/// List appointments
#[utoipa::path(
    get,
    path = "/api/rendez-vous/",
    responses(
        (status = 200, description = "Appointments retrieved", body = Vec<Appointment>),
        (status = 401, description = "Unauthorized")
    ),
    params(ListAppointmentsParams),
    tag = "rendez-vous",
    security(("bearer_auth" = []))
)]
pub async fn list_appointments(
    State(server): State<HospitalServer>,
    Query(params): Query<ListAppointmentsParams>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<Appointment>>>, ApiError> {
    let mut query = PaginatedQuery::new("SELECT * FROM rendez_vous WHERE 1=1");
    query
        .filter_eq("statut", params.statut)
        .filter_eq("medecin_id", params.medecin)
        .order_by_param(
            params.ordering.as_deref(),
            ORDERING_FIELDS,
            ("date_heure", "DESC"),
        )
        .paginate(params.pagination.page, params.pagination.page_size);

    let appointments: Vec<Appointment> =
        query.build_query_as().fetch_all(&server.db_pool).await?;

    let total_count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM rendez_vous
        WHERE ($1::statut_rendez_vous IS NULL OR statut = $1)
          AND ($2::uuid IS NULL OR medecin_id = $2)
        "#,
    )
    .bind(params.statut)
    .bind(params.medecin)
    .fetch_one(&server.db_pool)
    .await?;

    let metadata = params.pagination.to_metadata(total_count);
    Ok(Json(api_success_with_meta(appointments, metadata)))
}

/// Get an appointment by ID
#[utoipa::path(
    get,
    path = "/api/rendez-vous/{id}/",
    responses(
        (status = 200, description = "Appointment retrieved", body = Appointment),
        (status = 404, description = "Appointment not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Appointment ID")),
    tag = "rendez-vous",
    security(("bearer_auth" = []))
)]
pub async fn get_appointment(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Appointment>>, ApiError> {
    let appointment = sqlx::query_as::<_, Appointment>("SELECT * FROM rendez_vous WHERE id = $1")
        .bind(id)
        .fetch_optional(&server.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("rendez-vous"))?;

    Ok(Json(api_success(appointment)))
}

/// Create an appointment. The doctor/time slot is unique, a second
/// booking for the same slot comes back as a validation error.
#[utoipa::path(
    post,
    path = "/api/rendez-vous/",
    request_body = CreateAppointmentRequest,
    responses(
        (status = 201, description = "Appointment created", body = Appointment),
        (status = 400, description = "Invalid request or slot already booked"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "rendez-vous",
    security(("bearer_auth" = []))
)]
pub async fn create_appointment(
    State(server): State<HospitalServer>,
    _auth: AuthContext,
    Json(req): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Appointment>>), ApiError> {
    req.validate()?;

    let appointment = sqlx::query_as::<_, Appointment>(
        r#"
        INSERT INTO rendez_vous (patient_id, medecin_id, date_heure, motif, statut, notes)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(req.patient_id)
    .bind(req.medecin_id)
    .bind(req.date_heure)
    .bind(&req.motif)
    .bind(req.statut.unwrap_or(AppointmentStatus::Confirme))
    .bind(&req.notes)
    .fetch_one(&server.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(api_success(appointment))))
}

/// Update an appointment (full or partial)
#[utoipa::path(
    put,
    path = "/api/rendez-vous/{id}/",
    request_body = UpdateAppointmentRequest,
    responses(
        (status = 200, description = "Appointment updated", body = Appointment),
        (status = 404, description = "Appointment not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Appointment ID")),
    tag = "rendez-vous",
    security(("bearer_auth" = []))
)]
pub async fn update_appointment(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
    Json(req): Json<UpdateAppointmentRequest>,
) -> Result<Json<ApiResponse<Appointment>>, ApiError> {
    req.validate()?;

    let appointment = sqlx::query_as::<_, Appointment>(
        r#"
        UPDATE rendez_vous
        SET
            date_heure = COALESCE($1, date_heure),
            motif = COALESCE($2, motif),
            statut = COALESCE($3, statut),
            notes = COALESCE($4, notes)
        WHERE id = $5
        RETURNING *
        "#,
    )
    .bind(req.date_heure)
    .bind(&req.motif)
    .bind(req.statut)
    .bind(&req.notes)
    .bind(id)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::not_found("rendez-vous"))?;

    Ok(Json(api_success(appointment)))
}

/// Delete an appointment
#[utoipa::path(
    delete,
    path = "/api/rendez-vous/{id}/",
    responses(
        (status = 204, description = "Appointment deleted"),
        (status = 404, description = "Appointment not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Appointment ID")),
    tag = "rendez-vous",
    security(("bearer_auth" = []))
)]
pub async fn delete_appointment(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM rendez_vous WHERE id = $1")
        .bind(id)
        .execute(&server.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("rendez-vous"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Mark an appointment as confirmed
#[utoipa::path(
    post,
    path = "/api/rendez-vous/{id}/confirmer/",
    responses(
        (status = 200, description = "Appointment confirmed", body = AppointmentActionResponse),
        (status = 404, description = "Appointment not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Appointment ID")),
    tag = "rendez-vous",
    security(("bearer_auth" = []))
)]
pub async fn confirm_appointment(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<AppointmentActionResponse>>, ApiError> {
    let appointment = set_appointment_status(&server, id, AppointmentStatus::Confirme).await?;
    tracing::info!(rendez_vous_id = %id, "appointment confirmed");
    Ok(Json(api_success(AppointmentActionResponse {
        status: "Rendez-vous confirmé".to_string(),
        rendez_vous: appointment,
    })))
}

/// Mark an appointment as cancelled
#[utoipa::path(
    post,
    path = "/api/rendez-vous/{id}/annuler/",
    responses(
        (status = 200, description = "Appointment cancelled", body = AppointmentActionResponse),
        (status = 404, description = "Appointment not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Appointment ID")),
    tag = "rendez-vous",
    security(("bearer_auth" = []))
)]
pub async fn cancel_appointment(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<AppointmentActionResponse>>, ApiError> {
    let appointment = set_appointment_status(&server, id, AppointmentStatus::Annule).await?;
    tracing::info!(rendez_vous_id = %id, "appointment cancelled");
    Ok(Json(api_success(AppointmentActionResponse {
        status: "Rendez-vous annulé".to_string(),
        rendez_vous: appointment,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_french_spellings() {
        assert_eq!(
            serde_json::to_string(&AppointmentStatus::Confirme).unwrap(),
            "\"confirme\""
        );
        assert_eq!(
            serde_json::from_str::<AppointmentStatus>("\"reporte\"").unwrap(),
            AppointmentStatus::Reporte
        );
    }

    #[test]
    fn create_request_requires_motif() {
        let req = CreateAppointmentRequest {
            patient_id: Uuid::new_v4(),
            medecin_id: Uuid::new_v4(),
            date_heure: Utc::now(),
            motif: "   ".to_string(),
            statut: None,
            notes: None,
        };
        assert!(req.validate().is_err());
    }
}

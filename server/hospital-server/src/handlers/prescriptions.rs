//! Prescription CRUD and line-management endpoints
//!
//! Prescription responses embed their medication lines; the patient and
//! doctor references are denormalized from the consultation at create time.

use crate::error::{api_success, api_success_with_meta, ApiError, ApiResponse};
use crate::middleware::AuthContext;
use crate::server::HospitalServer;
use crate::types::pagination::PaginationParams;
use crate::utils::query_builder::PaginatedQuery;
use crate::validation::RequestValidation;
use crate::validate_required;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const ORDERING_FIELDS: &[&str] = &["date_ordonnance"];

/// Prescription record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Prescription {
    pub id: Uuid,
    pub consultation_id: Uuid,
    pub patient_id: Uuid,
    pub medecin_id: Uuid,
    pub date_ordonnance: DateTime<Utc>,
    pub date_expiration: NaiveDate,
    pub instructions: String,
    pub notes: Option<String>,
}

/// Medication summary embedded in a prescription line
#[derive(Debug, Serialize, ToSchema)]
pub struct MedicationSummary {
    pub id: Uuid,
    pub nom: String,
    pub prix: Decimal,
    pub dosage: String,
}

/// Prescription line with its medication
#[derive(Debug, Serialize, ToSchema)]
pub struct PrescriptionLine {
    pub id: Uuid,
    pub medicament: MedicationSummary,
    pub dosage: String,
    pub frequence: String,
    pub duree: String,
    pub notes: Option<String>,
}

/// Prescription wire representation with nested lines
#[derive(Debug, Serialize, ToSchema)]
pub struct PrescriptionResponse {
    #[serde(flatten)]
    pub ordonnance: Prescription,
    pub medicaments: Vec<PrescriptionLine>,
}

#[derive(Debug, FromRow)]
struct LineRow {
    id: Uuid,
    ordonnance_id: Uuid,
    dosage: String,
    frequence: String,
    duree: String,
    notes: Option<String>,
    medicament_id: Uuid,
    medicament_nom: String,
    medicament_prix: Decimal,
    medicament_dosage: String,
}

impl From<LineRow> for PrescriptionLine {
    fn from(row: LineRow) -> Self {
        Self {
            id: row.id,
            medicament: MedicationSummary {
                id: row.medicament_id,
                nom: row.medicament_nom,
                prix: row.medicament_prix,
                dosage: row.medicament_dosage,
            },
            dosage: row.dosage,
            frequence: row.frequence,
            duree: row.duree,
            notes: row.notes,
        }
    }
}

const LINE_QUERY: &str = r#"
    SELECT
        om.id, om.ordonnance_id, om.dosage, om.frequence, om.duree, om.notes,
        m.id AS medicament_id, m.nom AS medicament_nom,
        m.prix AS medicament_prix, m.dosage AS medicament_dosage
    FROM ordonnance_medicaments om
    JOIN medicaments m ON m.id = om.medicament_id
"#;

/// Load one prescription's lines and build its wire representation
pub async fn with_lines(
    pool: &PgPool,
    prescription: Prescription,
) -> Result<PrescriptionResponse, ApiError> {
    let rows = sqlx::query_as::<_, LineRow>(&format!(
        "{LINE_QUERY} WHERE om.ordonnance_id = $1 ORDER BY om.id"
    ))
    .bind(prescription.id)
    .fetch_all(pool)
    .await?;

    Ok(PrescriptionResponse {
        ordonnance: prescription,
        medicaments: rows.into_iter().map(Into::into).collect(),
    })
}

/// Batch variant of [`with_lines`] for list endpoints, one query for all
/// prescriptions on the page
async fn attach_lines(
    pool: &PgPool,
    prescriptions: Vec<Prescription>,
) -> Result<Vec<PrescriptionResponse>, ApiError> {
    let ids: Vec<Uuid> = prescriptions.iter().map(|p| p.id).collect();
    let rows = sqlx::query_as::<_, LineRow>(&format!(
        "{LINE_QUERY} WHERE om.ordonnance_id = ANY($1) ORDER BY om.id"
    ))
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut by_prescription: HashMap<Uuid, Vec<PrescriptionLine>> = HashMap::new();
    for row in rows {
        by_prescription
            .entry(row.ordonnance_id)
            .or_default()
            .push(row.into());
    }

    Ok(prescriptions
        .into_iter()
        .map(|p| {
            let medicaments = by_prescription.remove(&p.id).unwrap_or_default();
            PrescriptionResponse {
                ordonnance: p,
                medicaments,
            }
        })
        .collect())
}

/// Create Prescription request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePrescriptionRequest {
    pub consultation_id: Uuid,
    pub date_expiration: NaiveDate,
    pub instructions: String,
    pub notes: Option<String>,
}

impl RequestValidation for CreatePrescriptionRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.instructions, "Les instructions sont requises");
        Ok(())
    }
}

/// Update Prescription request (all fields optional)
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePrescriptionRequest {
    pub date_expiration: Option<NaiveDate>,
    pub instructions: Option<String>,
    pub notes: Option<String>,
}

impl RequestValidation for UpdatePrescriptionRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(ref instructions) = self.instructions {
            validate_required!(instructions, "Les instructions ne peuvent pas être vides");
        }
        Ok(())
    }
}

/// Add-line request
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddPrescriptionLineRequest {
    pub medicament_id: Uuid,
    pub dosage: String,
    pub frequence: String,
    pub duree: String,
    pub notes: Option<String>,
}

impl RequestValidation for AddPrescriptionLineRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.dosage, "Le dosage est requis");
        validate_required!(self.frequence, "La fréquence est requise");
        validate_required!(self.duree, "La durée est requise");
        Ok(())
    }
}

/// List Prescriptions query parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListPrescriptionsParams {
    pub patient: Option<Uuid>,
    pub medecin: Option<Uuid>,
    /// Ordering field, `-` prefix for descending
    pub ordering: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

/// List prescriptions with their medication lines
#[utoipa::path(
    get,
    path = "/api/ordonnances/",
    responses(
        (status = 200, description = "Prescriptions retrieved", body = Vec<PrescriptionResponse>),
        (status = 401, description = "Unauthorized")
    ),
    params(ListPrescriptionsParams),
    tag = "ordonnances",
    security(("bearer_auth" = []))
)]
pub async fn list_prescriptions(
    State(server): State<HospitalServer>,
    Query(params): Query<ListPrescriptionsParams>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<PrescriptionResponse>>>, ApiError> {
    let mut query = PaginatedQuery::new("SELECT * FROM ordonnances WHERE 1=1");
    query
        .filter_eq("patient_id", params.patient)
        .filter_eq("medecin_id", params.medecin)
        .order_by_param(
            params.ordering.as_deref(),
            ORDERING_FIELDS,
            ("date_ordonnance", "DESC"),
        )
        .paginate(params.pagination.page, params.pagination.page_size);

    let prescriptions: Vec<Prescription> =
        query.build_query_as().fetch_all(&server.db_pool).await?;

    let total_count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM ordonnances
        WHERE ($1::uuid IS NULL OR patient_id = $1)
          AND ($2::uuid IS NULL OR medecin_id = $2)
        "#,
    )
    .bind(params.patient)
    .bind(params.medecin)
    .fetch_one(&server.db_pool)
    .await?;

    let metadata = params.pagination.to_metadata(total_count);
    let responses = attach_lines(&server.db_pool, prescriptions).await?;
    Ok(Json(api_success_with_meta(responses, metadata)))
}

/// Get a prescription by ID
#[utoipa::path(
    get,
    path = "/api/ordonnances/{id}/",
    responses(
        (status = 200, description = "Prescription retrieved", body = PrescriptionResponse),
        (status = 404, description = "Prescription not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Prescription ID")),
    tag = "ordonnances",
    security(("bearer_auth" = []))
)]
pub async fn get_prescription(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<PrescriptionResponse>>, ApiError> {
    let prescription = sqlx::query_as::<_, Prescription>("SELECT * FROM ordonnances WHERE id = $1")
        .bind(id)
        .fetch_optional(&server.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("ordonnance"))?;

    let response = with_lines(&server.db_pool, prescription).await?;
    Ok(Json(api_success(response)))
}

/// Create a prescription. Patient and doctor are taken from the
/// consultation, which already carries both.
#[utoipa::path(
    post,
    path = "/api/ordonnances/",
    request_body = CreatePrescriptionRequest,
    responses(
        (status = 201, description = "Prescription created", body = PrescriptionResponse),
        (status = 400, description = "Invalid request, unknown consultation or duplicate prescription"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "ordonnances",
    security(("bearer_auth" = []))
)]
pub async fn create_prescription(
    State(server): State<HospitalServer>,
    _auth: AuthContext,
    Json(req): Json<CreatePrescriptionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PrescriptionResponse>>), ApiError> {
    req.validate()?;

    let prescription = sqlx::query_as::<_, Prescription>(
        r#"
        INSERT INTO ordonnances (
            consultation_id, patient_id, medecin_id, date_expiration, instructions, notes
        )
        SELECT c.id, c.patient_id, c.medecin_id, $2, $3, $4
        FROM consultations c
        WHERE c.id = $1
        RETURNING *
        "#,
    )
    .bind(req.consultation_id)
    .bind(req.date_expiration)
    .bind(&req.instructions)
    .bind(&req.notes)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::validation("Consultation inconnue"))?;

    let response = with_lines(&server.db_pool, prescription).await?;
    Ok((StatusCode::CREATED, Json(api_success(response))))
}

/// Update a prescription (full or partial)
#[utoipa::path(
    put,
    path = "/api/ordonnances/{id}/",
    request_body = UpdatePrescriptionRequest,
    responses(
        (status = 200, description = "Prescription updated", body = PrescriptionResponse),
        (status = 404, description = "Prescription not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Prescription ID")),
    tag = "ordonnances",
    security(("bearer_auth" = []))
)]
pub async fn update_prescription(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
    Json(req): Json<UpdatePrescriptionRequest>,
) -> Result<Json<ApiResponse<PrescriptionResponse>>, ApiError> {
    req.validate()?;

    let prescription = sqlx::query_as::<_, Prescription>(
        r#"
        UPDATE ordonnances
        SET
            date_expiration = COALESCE($1, date_expiration),
            instructions = COALESCE($2, instructions),
            notes = COALESCE($3, notes)
        WHERE id = $4
        RETURNING *
        "#,
    )
    .bind(req.date_expiration)
    .bind(&req.instructions)
    .bind(&req.notes)
    .bind(id)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::not_found("ordonnance"))?;

    let response = with_lines(&server.db_pool, prescription).await?;
    Ok(Json(api_success(response)))
}

/// Delete a prescription and its lines
#[utoipa::path(
    delete,
    path = "/api/ordonnances/{id}/",
    responses(
        (status = 204, description = "Prescription deleted"),
        (status = 404, description = "Prescription not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Prescription ID")),
    tag = "ordonnances",
    security(("bearer_auth" = []))
)]
pub async fn delete_prescription(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM ordonnances WHERE id = $1")
        .bind(id)
        .execute(&server.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("ordonnance"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Add a medication line to a prescription
#[utoipa::path(
    post,
    path = "/api/ordonnances/{id}/ajouter_medicament/",
    request_body = AddPrescriptionLineRequest,
    responses(
        (status = 200, description = "Line added", body = PrescriptionResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Prescription or medication not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Prescription ID")),
    tag = "ordonnances",
    security(("bearer_auth" = []))
)]
pub async fn add_prescription_line(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
    Json(req): Json<AddPrescriptionLineRequest>,
) -> Result<Json<ApiResponse<PrescriptionResponse>>, ApiError> {
    req.validate()?;

    let prescription = sqlx::query_as::<_, Prescription>("SELECT * FROM ordonnances WHERE id = $1")
        .bind(id)
        .fetch_optional(&server.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("ordonnance"))?;

    let medication_exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM medicaments WHERE id = $1)")
            .bind(req.medicament_id)
            .fetch_one(&server.db_pool)
            .await?;
    if !medication_exists {
        return Err(ApiError::not_found("medicament"));
    }

    sqlx::query(
        r#"
        INSERT INTO ordonnance_medicaments (
            ordonnance_id, medicament_id, dosage, frequence, duree, notes
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(req.medicament_id)
    .bind(&req.dosage)
    .bind(&req.frequence)
    .bind(&req.duree)
    .bind(&req.notes)
    .execute(&server.db_pool)
    .await?;

    tracing::info!(ordonnance_id = %id, medicament_id = %req.medicament_id, "prescription line added");

    let response = with_lines(&server.db_pool, prescription).await?;
    Ok(Json(api_success(response)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn line_row_nests_its_medication() {
        let row = LineRow {
            id: Uuid::new_v4(),
            ordonnance_id: Uuid::new_v4(),
            dosage: "1 comprimé".to_string(),
            frequence: "3 fois par jour".to_string(),
            duree: "7 jours".to_string(),
            notes: None,
            medicament_id: Uuid::new_v4(),
            medicament_nom: "Paracétamol".to_string(),
            medicament_prix: dec!(2.50),
            medicament_dosage: "500mg".to_string(),
        };
        let medicament_id = row.medicament_id;
        let line = PrescriptionLine::from(row);
        assert_eq!(line.medicament.id, medicament_id);
        assert_eq!(line.medicament.nom, "Paracétamol");
    }

    #[test]
    fn add_line_request_requires_dosage() {
        let req = AddPrescriptionLineRequest {
            medicament_id: Uuid::new_v4(),
            dosage: String::new(),
            frequence: "2 fois par jour".to_string(),
            duree: "5 jours".to_string(),
            notes: None,
        };
        assert!(req.validate().is_err());
    }
}

//! Medication catalog CRUD endpoints

use crate::error::{api_success, api_success_with_meta, ApiError, ApiResponse};
use crate::middleware::AuthContext;
use crate::server::HospitalServer;
use crate::types::pagination::PaginationParams;
use crate::utils::query_builder::PaginatedQuery;
use crate::validation::RequestValidation;
use crate::{validate_length, validate_non_negative, validate_required};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const SEARCH_COLUMNS: &[&str] = &["nom", "description", "fabricant"];
const ORDERING_FIELDS: &[&str] = &["nom", "prix"];

/// Medication catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Medication {
    pub id: Uuid,
    pub nom: String,
    pub description: String,
    pub prix: Decimal,
    pub composition: Option<String>,
    pub dosage: String,
    pub fabricant: String,
    pub date_creation: DateTime<Utc>,
}

/// Create Medication request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMedicationRequest {
    pub nom: String,
    pub description: String,
    pub prix: Decimal,
    pub composition: Option<String>,
    pub dosage: String,
    pub fabricant: String,
}

impl RequestValidation for CreateMedicationRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.nom, "Le nom est requis");
        validate_required!(self.description, "La description est requise");
        validate_required!(self.dosage, "Le dosage est requis");
        validate_required!(self.fabricant, "Le fabricant est requis");
        validate_length!(self.nom, 1, 100, "Le nom doit faire au plus 100 caractères");
        validate_non_negative!(self.prix, "Le prix ne peut pas être négatif");
        Ok(())
    }
}

/// Update Medication request (all fields optional)
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMedicationRequest {
    pub nom: Option<String>,
    pub description: Option<String>,
    pub prix: Option<Decimal>,
    pub composition: Option<String>,
    pub dosage: Option<String>,
    pub fabricant: Option<String>,
}

impl RequestValidation for UpdateMedicationRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(ref nom) = self.nom {
            validate_length!(nom, 1, 100, "Le nom doit faire au plus 100 caractères");
        }
        if let Some(prix) = self.prix {
            validate_non_negative!(prix, "Le prix ne peut pas être négatif");
        }
        Ok(())
    }
}

/// List Medications query parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListMedicationsParams {
    /// Free-text search across nom, description, fabricant
    pub search: Option<String>,
    /// Ordering field, `-` prefix for descending
    pub ordering: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

/// List medications
#[utoipa::path(
    get,
    path = "/api/medicaments/",
    responses(
        (status = 200, description = "Medications retrieved", body = Vec<Medication>),
        (status = 401, description = "Unauthorized")
    ),
    params(ListMedicationsParams),
    tag = "medicaments",
    security(("bearer_auth" = []))
)]
pub async fn list_medications(
    State(server): State<HospitalServer>,
    Query(params): Query<ListMedicationsParams>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<Medication>>>, ApiError> {
    let mut query = PaginatedQuery::new("SELECT * FROM medicaments WHERE 1=1");
    query
        .search_ilike(SEARCH_COLUMNS, params.search.as_deref())
        .order_by_param(params.ordering.as_deref(), ORDERING_FIELDS, ("nom", "ASC"))
        .paginate(params.pagination.page, params.pagination.page_size);

    let medications: Vec<Medication> = query.build_query_as().fetch_all(&server.db_pool).await?;

    let total_count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM medicaments
        WHERE ($1::text IS NULL
               OR nom ILIKE '%' || $1 || '%'
               OR description ILIKE '%' || $1 || '%'
               OR fabricant ILIKE '%' || $1 || '%')
        "#,
    )
    .bind(params.search.as_deref())
    .fetch_one(&server.db_pool)
    .await?;

    let metadata = params.pagination.to_metadata(total_count);
    Ok(Json(api_success_with_meta(medications, metadata)))
}

/// Get a medication by ID
#[utoipa::path(
    get,
    path = "/api/medicaments/{id}/",
    responses(
        (status = 200, description = "Medication retrieved", body = Medication),
        (status = 404, description = "Medication not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Medication ID")),
    tag = "medicaments",
    security(("bearer_auth" = []))
)]
pub async fn get_medication(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Medication>>, ApiError> {
    let medication = sqlx::query_as::<_, Medication>("SELECT * FROM medicaments WHERE id = $1")
        .bind(id)
        .fetch_optional(&server.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("medicament"))?;

    Ok(Json(api_success(medication)))
}

/// Create a medication
#[utoipa::path(
    post,
    path = "/api/medicaments/",
    request_body = CreateMedicationRequest,
    responses(
        (status = 201, description = "Medication created", body = Medication),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "medicaments",
    security(("bearer_auth" = []))
)]
pub async fn create_medication(
    State(server): State<HospitalServer>,
    _auth: AuthContext,
    Json(req): Json<CreateMedicationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Medication>>), ApiError> {
    req.validate()?;

    let medication = sqlx::query_as::<_, Medication>(
        r#"
        INSERT INTO medicaments (nom, description, prix, composition, dosage, fabricant)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(&req.nom)
    .bind(&req.description)
    .bind(req.prix)
    .bind(&req.composition)
    .bind(&req.dosage)
    .bind(&req.fabricant)
    .fetch_one(&server.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(api_success(medication))))
}

/// Update a medication (full or partial)
#[utoipa::path(
    put,
    path = "/api/medicaments/{id}/",
    request_body = UpdateMedicationRequest,
    responses(
        (status = 200, description = "Medication updated", body = Medication),
        (status = 404, description = "Medication not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Medication ID")),
    tag = "medicaments",
    security(("bearer_auth" = []))
)]
pub async fn update_medication(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
    Json(req): Json<UpdateMedicationRequest>,
) -> Result<Json<ApiResponse<Medication>>, ApiError> {
    req.validate()?;

    let medication = sqlx::query_as::<_, Medication>(
        r#"
        UPDATE medicaments
        SET
            nom = COALESCE($1, nom),
            description = COALESCE($2, description),
            prix = COALESCE($3, prix),
            composition = COALESCE($4, composition),
            dosage = COALESCE($5, dosage),
            fabricant = COALESCE($6, fabricant)
        WHERE id = $7
        RETURNING *
        "#,
    )
    .bind(&req.nom)
    .bind(&req.description)
    .bind(req.prix)
    .bind(&req.composition)
    .bind(&req.dosage)
    .bind(&req.fabricant)
    .bind(id)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::not_found("medicament"))?;

    Ok(Json(api_success(medication)))
}

/// Delete a medication
#[utoipa::path(
    delete,
    path = "/api/medicaments/{id}/",
    responses(
        (status = 204, description = "Medication deleted"),
        (status = 404, description = "Medication not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Medication ID")),
    tag = "medicaments",
    security(("bearer_auth" = []))
)]
pub async fn delete_medication(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM medicaments WHERE id = $1")
        .bind(id)
        .execute(&server.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("medicament"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn create_request_rejects_negative_price() {
        let req = CreateMedicationRequest {
            nom: "Paracétamol".to_string(),
            description: "Antalgique".to_string(),
            prix: dec!(-1),
            composition: None,
            dosage: "500mg".to_string(),
            fabricant: "Labo".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn update_request_allows_partial_body() {
        let req = UpdateMedicationRequest {
            nom: None,
            description: None,
            prix: Some(dec!(3.50)),
            composition: None,
            dosage: None,
            fabricant: None,
        };
        assert!(req.validate().is_ok());
    }
}

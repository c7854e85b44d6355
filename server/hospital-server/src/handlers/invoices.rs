//! Invoice CRUD, payment and statistics endpoints
//!
//! The payment arithmetic lives in `billing_core`; this module only moves
//! rows in and out of the `facturations` table around it.

use crate::error::{api_success, api_success_with_meta, ApiError, ApiResponse};
use crate::middleware::AuthContext;
use crate::server::HospitalServer;
use crate::types::pagination::PaginationParams;
use crate::utils::query_builder::PaginatedQuery;
use crate::validation::RequestValidation;
use crate::{validate_non_negative, validate_required};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use billing_core::ledger::apply_payment;
use billing_core::models::{InvoiceFigures, PaymentStatus};
use billing_core::reporting::{compute_statistics, BillingStatistics};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const ORDERING_FIELDS: &[&str] = &["date_facturation", "montant", "statut"];

/// Invoice record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Invoice {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub consultation_id: Option<Uuid>,
    pub montant: Decimal,
    pub montant_paye: Decimal,
    pub date_facturation: NaiveDate,
    pub date_echeance: NaiveDate,
    pub statut: PaymentStatus,
    pub description: String,
    pub notes: Option<String>,
}

/// Invoice wire representation with the computed `solde` field
#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceResponse {
    #[serde(flatten)]
    pub facturation: Invoice,
    pub solde: Decimal,
}

impl From<Invoice> for InvoiceResponse {
    fn from(facturation: Invoice) -> Self {
        let solde = facturation.montant - facturation.montant_paye;
        Self { facturation, solde }
    }
}

/// Monetary columns of an invoice, for the aggregation helpers
pub fn invoice_figures(invoice: &Invoice) -> InvoiceFigures {
    InvoiceFigures {
        montant: invoice.montant,
        montant_paye: invoice.montant_paye,
        statut: invoice.statut,
    }
}

/// Create Invoice request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateInvoiceRequest {
    pub patient_id: Uuid,
    pub consultation_id: Option<Uuid>,
    pub montant: Decimal,
    pub montant_paye: Option<Decimal>,
    pub date_facturation: Option<NaiveDate>,
    pub date_echeance: NaiveDate,
    pub statut: Option<PaymentStatus>,
    pub description: String,
    pub notes: Option<String>,
}

impl RequestValidation for CreateInvoiceRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_required!(self.description, "La description est requise");
        validate_non_negative!(self.montant, "Le montant ne peut pas être négatif");
        if let Some(montant_paye) = self.montant_paye {
            validate_non_negative!(montant_paye, "Le montant payé ne peut pas être négatif");
        }
        Ok(())
    }
}

/// Update Invoice request (all fields optional)
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateInvoiceRequest {
    pub consultation_id: Option<Uuid>,
    pub montant: Option<Decimal>,
    pub montant_paye: Option<Decimal>,
    pub date_facturation: Option<NaiveDate>,
    pub date_echeance: Option<NaiveDate>,
    pub statut: Option<PaymentStatus>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

impl RequestValidation for UpdateInvoiceRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(montant) = self.montant {
            validate_non_negative!(montant, "Le montant ne peut pas être négatif");
        }
        if let Some(montant_paye) = self.montant_paye {
            validate_non_negative!(montant_paye, "Le montant payé ne peut pas être négatif");
        }
        Ok(())
    }
}

/// Payment request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterPaymentRequest {
    #[schema(example = "40.00")]
    pub montant: Decimal,
}

/// Extract and parse the `montant` field of a payment body
///
/// The amount arrives as a JSON string or number; a missing field or any
/// unparseable value is a 400, never a deserialization rejection.
fn payment_amount(body: &serde_json::Value) -> Result<Decimal, ApiError> {
    let parsed = match body.get("montant") {
        Some(serde_json::Value::String(raw)) => raw.trim().parse::<Decimal>().ok(),
        Some(serde_json::Value::Number(raw)) => raw.to_string().parse::<Decimal>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ApiError::validation("Montant invalide"))
}

/// Payment response
#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterPaymentResponse {
    #[schema(example = "Paiement enregistré")]
    pub status: String,
    pub montant_paye: Decimal,
    pub solde: Decimal,
}

/// List Invoices query parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListInvoicesParams {
    pub statut: Option<PaymentStatus>,
    pub patient: Option<Uuid>,
    /// Ordering field, `-` prefix for descending
    pub ordering: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

/// List invoices
#[utoipa::path(
    get,
    path = "/api/facturations/",
    responses(
        (status = 200, description = "Invoices retrieved", body = Vec<InvoiceResponse>),
        (status = 401, description = "Unauthorized")
    ),
    params(ListInvoicesParams),
    tag = "facturations",
    security(("bearer_auth" = []))
)]
pub async fn list_invoices(
    State(server): State<HospitalServer>,
    Query(params): Query<ListInvoicesParams>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<InvoiceResponse>>>, ApiError> {
    let mut query = PaginatedQuery::new("SELECT * FROM facturations WHERE 1=1");
    query
        .filter_eq("statut", params.statut)
        .filter_eq("patient_id", params.patient)
        .order_by_param(
            params.ordering.as_deref(),
            ORDERING_FIELDS,
            ("date_facturation", "DESC"),
        )
        .paginate(params.pagination.page, params.pagination.page_size);

    let invoices: Vec<Invoice> = query.build_query_as().fetch_all(&server.db_pool).await?;

    let total_count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM facturations
        WHERE ($1::statut_paiement IS NULL OR statut = $1)
          AND ($2::uuid IS NULL OR patient_id = $2)
        "#,
    )
    .bind(params.statut)
    .bind(params.patient)
    .fetch_one(&server.db_pool)
    .await?;

    let metadata = params.pagination.to_metadata(total_count);
    let responses: Vec<InvoiceResponse> = invoices.into_iter().map(Into::into).collect();
    Ok(Json(api_success_with_meta(responses, metadata)))
}

/// Get an invoice by ID
#[utoipa::path(
    get,
    path = "/api/facturations/{id}/",
    responses(
        (status = 200, description = "Invoice retrieved", body = InvoiceResponse),
        (status = 404, description = "Invoice not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Invoice ID")),
    tag = "facturations",
    security(("bearer_auth" = []))
)]
pub async fn get_invoice(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<InvoiceResponse>>, ApiError> {
    let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM facturations WHERE id = $1")
        .bind(id)
        .fetch_optional(&server.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("facturation"))?;

    Ok(Json(api_success(invoice.into())))
}

/// Create an invoice
#[utoipa::path(
    post,
    path = "/api/facturations/",
    request_body = CreateInvoiceRequest,
    responses(
        (status = 201, description = "Invoice created", body = InvoiceResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "facturations",
    security(("bearer_auth" = []))
)]
pub async fn create_invoice(
    State(server): State<HospitalServer>,
    _auth: AuthContext,
    Json(req): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InvoiceResponse>>), ApiError> {
    req.validate()?;

    let invoice = sqlx::query_as::<_, Invoice>(
        r#"
        INSERT INTO facturations (
            patient_id, consultation_id, montant, montant_paye,
            date_facturation, date_echeance, statut, description, notes
        )
        VALUES ($1, $2, $3, $4, COALESCE($5, CURRENT_DATE), $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(req.patient_id)
    .bind(req.consultation_id)
    .bind(req.montant)
    .bind(req.montant_paye.unwrap_or(Decimal::ZERO))
    .bind(req.date_facturation)
    .bind(req.date_echeance)
    .bind(req.statut.unwrap_or(PaymentStatus::Impaye))
    .bind(&req.description)
    .bind(&req.notes)
    .fetch_one(&server.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(api_success(invoice.into()))))
}

/// Update an invoice (full or partial)
#[utoipa::path(
    put,
    path = "/api/facturations/{id}/",
    request_body = UpdateInvoiceRequest,
    responses(
        (status = 200, description = "Invoice updated", body = InvoiceResponse),
        (status = 404, description = "Invoice not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Invoice ID")),
    tag = "facturations",
    security(("bearer_auth" = []))
)]
pub async fn update_invoice(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
    Json(req): Json<UpdateInvoiceRequest>,
) -> Result<Json<ApiResponse<InvoiceResponse>>, ApiError> {
    req.validate()?;

    let invoice = sqlx::query_as::<_, Invoice>(
        r#"
        UPDATE facturations
        SET
            consultation_id = COALESCE($1, consultation_id),
            montant = COALESCE($2, montant),
            montant_paye = COALESCE($3, montant_paye),
            date_facturation = COALESCE($4, date_facturation),
            date_echeance = COALESCE($5, date_echeance),
            statut = COALESCE($6, statut),
            description = COALESCE($7, description),
            notes = COALESCE($8, notes)
        WHERE id = $9
        RETURNING *
        "#,
    )
    .bind(req.consultation_id)
    .bind(req.montant)
    .bind(req.montant_paye)
    .bind(req.date_facturation)
    .bind(req.date_echeance)
    .bind(req.statut)
    .bind(&req.description)
    .bind(&req.notes)
    .bind(id)
    .fetch_optional(&server.db_pool)
    .await?
    .ok_or_else(|| ApiError::not_found("facturation"))?;

    Ok(Json(api_success(invoice.into())))
}

/// Delete an invoice
#[utoipa::path(
    delete,
    path = "/api/facturations/{id}/",
    responses(
        (status = 204, description = "Invoice deleted"),
        (status = 404, description = "Invoice not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Invoice ID")),
    tag = "facturations",
    security(("bearer_auth" = []))
)]
pub async fn delete_invoice(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM facturations WHERE id = $1")
        .bind(id)
        .execute(&server.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("facturation"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Register a payment on an invoice
///
/// The row is locked for the duration of the transaction so two concurrent
/// payments cannot both read the same prior paid amount.
#[utoipa::path(
    post,
    path = "/api/facturations/{id}/enregistrer_paiement/",
    request_body = RegisterPaymentRequest,
    responses(
        (status = 200, description = "Payment registered", body = RegisterPaymentResponse),
        (status = 400, description = "Non-positive or unparseable amount"),
        (status = 404, description = "Invoice not found"),
        (status = 401, description = "Unauthorized")
    ),
    params(("id" = Uuid, Path, description = "Invoice ID")),
    tag = "facturations",
    security(("bearer_auth" = []))
)]
pub async fn register_payment(
    State(server): State<HospitalServer>,
    Path(id): Path<Uuid>,
    _auth: AuthContext,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<ApiResponse<RegisterPaymentResponse>>, ApiError> {
    let montant = payment_amount(&body)?;

    let mut tx = server.db_pool.begin().await?;

    let figures = sqlx::query_as::<_, InvoiceFigures>(
        "SELECT montant, montant_paye, statut FROM facturations WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("facturation"))?;

    let outcome = apply_payment(figures.montant, figures.montant_paye, montant)?;

    sqlx::query("UPDATE facturations SET montant_paye = $1, statut = $2 WHERE id = $3")
        .bind(outcome.montant_paye)
        .bind(outcome.statut)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        facturation_id = %id,
        %montant,
        statut = ?outcome.statut,
        "payment registered"
    );

    Ok(Json(api_success(RegisterPaymentResponse {
        status: "Paiement enregistré".to_string(),
        montant_paye: outcome.montant_paye,
        solde: outcome.solde,
    })))
}

/// Portfolio-wide billing statistics
#[utoipa::path(
    get,
    path = "/api/facturations/statistiques/",
    responses(
        (status = 200, description = "Statistics computed", body = BillingStatistics),
        (status = 401, description = "Unauthorized")
    ),
    tag = "facturations",
    security(("bearer_auth" = []))
)]
pub async fn billing_statistics(
    State(server): State<HospitalServer>,
    _auth: AuthContext,
) -> Result<Json<ApiResponse<BillingStatistics>>, ApiError> {
    let figures = sqlx::query_as::<_, InvoiceFigures>(
        "SELECT montant, montant_paye, statut FROM facturations",
    )
    .fetch_all(&server.db_pool)
    .await?;

    Ok(Json(api_success(compute_statistics(&figures))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn invoice() -> Invoice {
        Invoice {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            consultation_id: None,
            montant: dec!(100),
            montant_paye: dec!(40),
            date_facturation: Utc::now().date_naive(),
            date_echeance: Utc::now().date_naive(),
            statut: PaymentStatus::Partiel,
            description: "Consultation cardiologie".to_string(),
            notes: None,
        }
    }

    #[test]
    fn response_embeds_balance() {
        let resp = InvoiceResponse::from(invoice());
        assert_eq!(resp.solde, dec!(60));
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value.get("solde").unwrap().as_str().unwrap(), "60");
        assert!(value.get("montant").is_some());
    }

    #[test]
    fn figures_mirror_monetary_columns() {
        let inv = invoice();
        let figures = invoice_figures(&inv);
        assert_eq!(figures.montant, inv.montant);
        assert_eq!(figures.montant_paye, inv.montant_paye);
        assert_eq!(figures.statut, PaymentStatus::Partiel);
    }

    #[test]
    fn payment_amount_parses_string_and_number() {
        let amount = payment_amount(&serde_json::json!({"montant": "40.50"})).unwrap();
        assert_eq!(amount, dec!(40.50));
        let amount = payment_amount(&serde_json::json!({"montant": 25})).unwrap();
        assert_eq!(amount, dec!(25));
    }

    #[test]
    fn non_numeric_payment_amount_is_a_validation_error() {
        for body in [
            serde_json::json!({"montant": "abc"}),
            serde_json::json!({"montant": null}),
            serde_json::json!({"montant": ["40"]}),
            serde_json::json!({}),
        ] {
            let err = payment_amount(&body).unwrap_err();
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
            assert_eq!(err.to_string(), "Montant invalide");
        }
    }

    #[test]
    fn create_request_rejects_negative_amount() {
        let req = CreateInvoiceRequest {
            patient_id: Uuid::new_v4(),
            consultation_id: None,
            montant: dec!(-10),
            montant_paye: None,
            date_facturation: None,
            date_echeance: Utc::now().date_naive(),
            statut: None,
            description: "Consultation".to_string(),
            notes: None,
        };
        assert!(req.validate().is_err());
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Validation error: {0}")]
    Validation(String),
}

pub type BillingResult<T> = Result<T, BillingError>;

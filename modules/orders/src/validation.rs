//! Validation logic for order-creation requests
//!
//! Collects every failing rule so the caller gets the full list of
//! field-level messages in one pass, not just the first failure.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::CreateOrderRequest;

/// Validation errors for order-creation parameters
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Customer must be a positive id, got {0}")]
    InvalidCustomerId(i64),

    #[error("Product name can't be blank")]
    BlankProductName,

    #[error("Quantity must be greater than 0, got {0}")]
    InvalidQuantity(i32),

    #[error("Price must be greater than 0, got {0}")]
    InvalidPrice(Decimal),
}

/// Validate an order-creation request
///
/// # Validation Rules
///
/// - `customer_id`: must be positive
/// - `product_name`: must be non-empty (whitespace-only counts as blank)
/// - `quantity`: must be > 0
/// - `price`: must be > 0
///
/// Returns every violated rule; an empty vector means the request is valid.
pub fn validate_create_order(req: &CreateOrderRequest) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if req.customer_id <= 0 {
        errors.push(ValidationError::InvalidCustomerId(req.customer_id));
    }

    if req.product_name.trim().is_empty() {
        errors.push(ValidationError::BlankProductName);
    }

    if req.quantity <= 0 {
        errors.push(ValidationError::InvalidQuantity(req.quantity));
    }

    if req.price <= Decimal::ZERO {
        errors.push(ValidationError::InvalidPrice(req.price));
    }

    errors
}

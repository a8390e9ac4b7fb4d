use serde::Serialize;
use thiserror::Error;

use crate::model::{AxisId, ProductId, Signature, ValueId, VariantId};

/// Local, synchronous rejections. Raised before any state is touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("axis name must not be empty")]
    EmptyAxisName,
    #[error("an axis named '{0}' already exists")]
    DuplicateAxisName(String),
    #[error("value label must not be empty")]
    EmptyValueLabel,
    #[error("value '{label}' already exists on axis {axis_id}")]
    DuplicateValueLabel { axis_id: AxisId, label: String },
    #[error("'{0}' is not a valid hex colour (expected #RGB or #RRGGBB)")]
    InvalidColorHex(String),
    #[error("invalid price '{0}': must be a non-negative number")]
    InvalidPrice(String),
    #[error("invalid stock '{0}': must be a non-negative whole number")]
    InvalidStock(String),
    #[error("row index {index} is out of range for {len} variants")]
    RowOutOfRange { index: usize, len: usize },
    #[error("axis {0} is not part of the configuration")]
    UnknownAxis(AxisId),
    #[error("no variant group is keyed by value {0}")]
    UnknownGroup(ValueId),
    #[error("SKU prefix must not be empty")]
    EmptySkuPrefix,
    #[error("image '{0}' is not in the product image pool")]
    UnknownImage(String),
    #[error("the default variant cannot be deleted")]
    DefaultVariantNotDeletable,
}

/// A single failed item of a batch creation
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("failed to create '{label}': {reason}")]
pub struct RemoteCreateError {
    pub label: String,
    pub reason: String,
}

/// A generated combination whose shape disagrees with the configured axes
#[derive(Debug, Clone, PartialEq, Error)]
#[error("combination {signature} has {actual} value ids, expected {expected}")]
pub struct InvariantViolation {
    pub signature: Signature,
    pub expected: usize,
    pub actual: usize,
}

#[derive(Debug, Error)]
pub enum MatrixError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    RemoteCreate(#[from] RemoteCreateError),
    #[error("failed to delete variant {variant_id}: {reason}")]
    RemoteDelete { variant_id: VariantId, reason: String },
    #[error("deletion of variant {0} is already in progress")]
    DeleteInFlight(VariantId),
    #[error("no variant with signature {0}")]
    VariantNotFound(Signature),
    #[error("failed to load existing variants of product {product_id}: {reason}")]
    RemoteLoad { product_id: ProductId, reason: String },
}

impl MatrixError {
    pub fn is_validation(&self) -> bool {
        matches!(self, MatrixError::Validation(_))
    }

    /// Whether the operation can be retried as-is
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MatrixError::RemoteDelete { .. }
                | MatrixError::RemoteCreate(_)
                | MatrixError::RemoteLoad { .. }
        )
    }
}

pub type MatrixResult<T> = Result<T, MatrixError>;

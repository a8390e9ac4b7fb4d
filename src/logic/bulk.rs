use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::logic::{parse_price, parse_stock, validate_price, validate_stock};
use crate::model::{ImageRef, VariantRow};

/// Field targeted by a bulk edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkField {
    Price,
    Stock,
    ImageRef,
}

/// A single field assignment applied to many rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum BulkEdit {
    Price(f64),
    Stock(i64),
    /// `None` clears the reference so the variant inherits the pool
    ImageRef(Option<ImageRef>),
}

impl BulkEdit {
    /// Parse a numeric field from form text. Image edits are never typed in.
    pub fn parse(field: BulkField, raw: &str) -> Result<Self, ValidationError> {
        match field {
            BulkField::Price => parse_price(raw).map(BulkEdit::Price),
            BulkField::Stock => parse_stock(raw).map(BulkEdit::Stock),
            BulkField::ImageRef => Err(ValidationError::UnknownImage(raw.trim().to_string())),
        }
    }

    pub fn field(&self) -> BulkField {
        match self {
            BulkEdit::Price(_) => BulkField::Price,
            BulkEdit::Stock(_) => BulkField::Stock,
            BulkEdit::ImageRef(_) => BulkField::ImageRef,
        }
    }

    /// Reject NaN, negative values and images outside the pool
    pub fn validate(&self, pool: &[ImageRef]) -> Result<(), ValidationError> {
        match self {
            BulkEdit::Price(price) => validate_price(*price).map(|_| ()),
            BulkEdit::Stock(stock) => validate_stock(*stock).map(|_| ()),
            BulkEdit::ImageRef(None) => Ok(()),
            BulkEdit::ImageRef(Some(image)) => {
                if pool.iter().any(|candidate| candidate.same_image(image)) {
                    Ok(())
                } else {
                    Err(ValidationError::UnknownImage(image.url.clone()))
                }
            }
        }
    }

    fn apply_to(&self, row: &mut VariantRow) {
        match self {
            BulkEdit::Price(price) => row.price = *price,
            BulkEdit::Stock(stock) => row.stock = *stock,
            BulkEdit::ImageRef(image) => row.image_ref = image.clone(),
        }
    }
}

/// Applies one field update to a set of rows as a single transition
pub struct BulkEditCoordinator;

impl BulkEditCoordinator {
    /// Build the updated row list, or reject without touching anything.
    ///
    /// Indices may be any subset of the list; duplicates collapse. The caller swaps
    /// the returned list in wholesale so observers never see a partial update.
    pub fn apply(
        rows: &[VariantRow],
        indices: &[usize],
        edit: &BulkEdit,
        pool: &[ImageRef],
    ) -> Result<Vec<VariantRow>, ValidationError> {
        edit.validate(pool)?;

        if let Some(&index) = indices.iter().find(|&&index| index >= rows.len()) {
            return Err(ValidationError::RowOutOfRange {
                index,
                len: rows.len(),
            });
        }

        let targets: Vec<usize> = indices.iter().copied().unique().collect();
        let mut updated = rows.to_vec();
        for index in targets {
            if let Some(row) = updated.get_mut(index) {
                edit.apply_to(row);
            }
        }

        Ok(updated)
    }
}

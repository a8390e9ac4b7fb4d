use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type AxisId = i64;
pub type ValueId = i64;
pub type VariantId = i64;
pub type ProductId = i64;

/// Base price and stock of the product form.
/// Used for combinations that match no existing row and for a fresh default variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariantDefaults {
    pub price: f64,
    pub stock: i64,
}

impl VariantDefaults {
    pub fn new(price: f64, stock: i64) -> Self {
        Self { price, stock }
    }
}

impl Default for VariantDefaults {
    fn default() -> Self {
        Self {
            price: 0.0,
            stock: 0,
        }
    }
}

/// Generate a temporary id for pool images that have not been persisted yet
pub fn generate_temp_id() -> String {
    Uuid::new_v4().to_string()
}

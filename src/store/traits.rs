use crate::model::{AxisId, NewOptionValue, OptionValue, ProductId, VariantId, VariantRow};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Axis as acknowledged by the attribute service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisRecord {
    pub id: AxisId,
    pub name: String,
    pub slug: String,
}

#[async_trait::async_trait]
pub trait AttributeStore: Send + Sync {
    /// Create a new option axis; the service assigns the id
    async fn create_axis(&self, name: &str, slug: &str) -> Result<AxisRecord>;
    /// Create one value on an existing axis
    async fn create_axis_value(&self, axis_id: AxisId, value: &NewOptionValue) -> Result<OptionValue>;
}

#[async_trait::async_trait]
pub trait VariantStore: Send + Sync {
    /// Existing variants of a saved product, in server order
    async fn load_variants(&self, product_id: ProductId) -> Result<Vec<VariantRow>>;
    /// Delete one persisted variant
    async fn delete_variant(&self, product_id: ProductId, variant_id: VariantId) -> Result<()>;
}

pub trait CatalogStore: AttributeStore + VariantStore + Send + Sync {}
impl<T: AttributeStore + VariantStore> CatalogStore for T {}

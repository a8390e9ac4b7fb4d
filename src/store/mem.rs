use anyhow::{anyhow, bail, Result};
use log::debug;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::model::{AxisId, NewOptionValue, OptionValue, ProductId, ValueId, VariantId, VariantRow};
use crate::store::{AttributeStore, AxisRecord, VariantStore};

#[derive(Debug, Default)]
struct MemoryState {
    next_axis_id: AxisId,
    next_value_id: ValueId,
    next_variant_id: VariantId,
    axes: HashMap<AxisId, AxisRecord>,
    values: HashMap<AxisId, Vec<OptionValue>>,
    variants: HashMap<ProductId, Vec<VariantRow>>,
    failing_labels: HashSet<String>,
    failing_axes: HashSet<String>,
    failing_deletes: HashSet<VariantId>,
    failing_loads: HashSet<ProductId>,
    delete_calls: Vec<VariantId>,
    delete_delay: Option<Duration>,
}

/// In-memory catalog used by the demo binary and tests.
///
/// Failures can be injected per value label, axis name, variant id or product id.
/// Deletion can be slowed down to keep a request in flight.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store existing variants for a product, assigning server ids where missing
    pub fn seed_variants(&self, product_id: ProductId, rows: Vec<VariantRow>) -> Vec<VariantRow> {
        let mut state = self.state.lock();
        let mut stored = Vec::with_capacity(rows.len());
        for mut row in rows {
            if row.server_id.is_none() {
                state.next_variant_id += 1;
                row.server_id = Some(state.next_variant_id);
            }
            stored.push(row);
        }
        state.variants.insert(product_id, stored.clone());
        stored
    }

    pub fn variants_for(&self, product_id: ProductId) -> Vec<VariantRow> {
        self.state
            .lock()
            .variants
            .get(&product_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn values_for(&self, axis_id: AxisId) -> Vec<OptionValue> {
        self.state.lock().values.get(&axis_id).cloned().unwrap_or_default()
    }

    pub fn fail_value(&self, label: &str) {
        self.state.lock().failing_labels.insert(label.to_lowercase());
    }

    pub fn fail_axis(&self, name: &str) {
        self.state.lock().failing_axes.insert(name.to_lowercase());
    }

    pub fn fail_delete(&self, variant_id: VariantId) {
        self.state.lock().failing_deletes.insert(variant_id);
    }

    pub fn clear_delete_failure(&self, variant_id: VariantId) {
        self.state.lock().failing_deletes.remove(&variant_id);
    }

    pub fn fail_load(&self, product_id: ProductId) {
        self.state.lock().failing_loads.insert(product_id);
    }

    pub fn set_delete_delay(&self, delay: Duration) {
        self.state.lock().delete_delay = Some(delay);
    }

    /// Variant ids passed to `delete_variant`, in call order
    pub fn delete_calls(&self) -> Vec<VariantId> {
        self.state.lock().delete_calls.clone()
    }
}

#[async_trait::async_trait]
impl AttributeStore for MemoryStore {
    async fn create_axis(&self, name: &str, slug: &str) -> Result<AxisRecord> {
        let mut state = self.state.lock();
        if state.failing_axes.contains(&name.to_lowercase()) {
            bail!("attribute service rejected axis '{}'", name);
        }

        state.next_axis_id += 1;
        let record = AxisRecord {
            id: state.next_axis_id,
            name: name.to_string(),
            slug: slug.to_string(),
        };
        state.axes.insert(record.id, record.clone());
        debug!("Created axis {} '{}'", record.id, record.name);
        Ok(record)
    }

    async fn create_axis_value(&self, axis_id: AxisId, value: &NewOptionValue) -> Result<OptionValue> {
        let mut state = self.state.lock();
        if !state.axes.contains_key(&axis_id) {
            bail!("axis {} does not exist", axis_id);
        }
        if state.failing_labels.contains(&value.label.to_lowercase()) {
            bail!("attribute service rejected value '{}'", value.label);
        }

        state.next_value_id += 1;
        let id = state.next_value_id;
        let values = state.values.entry(axis_id).or_default();
        let created = OptionValue {
            id,
            label: value.label.clone(),
            slug: value.slug.clone(),
            color_hex: value.color_hex.clone(),
            position: values.len() as i32,
        };
        values.push(created.clone());
        Ok(created)
    }
}

#[async_trait::async_trait]
impl VariantStore for MemoryStore {
    async fn load_variants(&self, product_id: ProductId) -> Result<Vec<VariantRow>> {
        let state = self.state.lock();
        if state.failing_loads.contains(&product_id) {
            bail!("variant service unavailable for product {}", product_id);
        }
        Ok(state.variants.get(&product_id).cloned().unwrap_or_default())
    }

    async fn delete_variant(&self, product_id: ProductId, variant_id: VariantId) -> Result<()> {
        let delay = {
            let mut state = self.state.lock();
            state.delete_calls.push(variant_id);
            state.delete_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        if state.failing_deletes.contains(&variant_id) {
            bail!("variant service refused to delete {}", variant_id);
        }
        let rows = state
            .variants
            .get_mut(&product_id)
            .ok_or_else(|| anyhow!("product {} has no variants", product_id))?;
        let before = rows.len();
        rows.retain(|row| row.server_id != Some(variant_id));
        if rows.len() == before {
            bail!("variant {} not found on product {}", variant_id, product_id);
        }
        Ok(())
    }
}

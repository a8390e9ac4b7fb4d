use futures::future::join_all;
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::{MatrixError, MatrixResult, RemoteCreateError, ValidationError};
use crate::logic::{
    signature, slugify, validate_axis_name, validate_new_values, MatrixSettings, MatrixSnapshot,
    MatrixSummary, ReconcileReport, RemovalReport, VariantMatrix,
};
use crate::model::{
    AxisId, ImageRef, NewOptionValue, OptionAxis, OptionValue, ProductId, ValueId, VariantId,
    VariantPayload, VariantRow,
};
use crate::store::CatalogStore;

/// Outcome of a batch of value creations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreationReport {
    pub axis_id: AxisId,
    pub requested: usize,
    pub created: Vec<OptionValue>,
    pub failures: Vec<RemoteCreateError>,
    /// Pass triggered by merging the created values, if any were created
    #[serde(skip)]
    pub reconcile: Option<ReconcileReport>,
}

impl CreationReport {
    fn new(axis_id: AxisId, requested: usize) -> Self {
        Self {
            axis_id,
            requested,
            created: Vec::new(),
            failures: Vec::new(),
            reconcile: None,
        }
    }

    pub fn created_count(&self) -> usize {
        self.created.len()
    }

    /// Some values were created and some were not
    pub fn is_partial(&self) -> bool {
        !self.created.is_empty() && !self.failures.is_empty()
    }
}

/// Edit session for one product.
///
/// Wraps the synchronous `VariantMatrix` for operations that wait on the catalog
/// services. Engine state sits behind a lock that is never held across an await,
/// so concurrent calls on the same session interleave safely.
pub struct ProductEditSession<S: CatalogStore> {
    id: Uuid,
    product_id: ProductId,
    store: Arc<S>,
    matrix: Mutex<VariantMatrix>,
    deleting: Mutex<HashSet<VariantId>>,
}

impl<S: CatalogStore> ProductEditSession<S> {
    /// Session for a product that has never been saved
    pub fn new(product_id: ProductId, store: Arc<S>, settings: MatrixSettings) -> Self {
        Self::with_matrix_state(
            product_id,
            store,
            VariantMatrix::load(settings, Vec::new(), Vec::new(), None),
        )
    }

    /// Open a saved product: its existing variants seed the first pass
    pub async fn open(
        product_id: ProductId,
        store: Arc<S>,
        settings: MatrixSettings,
        axes: Vec<OptionAxis>,
        image_pool: Vec<ImageRef>,
    ) -> MatrixResult<Self> {
        let snapshot = store
            .load_variants(product_id)
            .await
            .map_err(|e| MatrixError::RemoteLoad {
                product_id,
                reason: e.to_string(),
            })?;
        info!(
            "Opening product {} with {} existing variant(s)",
            product_id,
            snapshot.len()
        );

        let matrix = VariantMatrix::load(settings, axes, image_pool, Some(snapshot));
        Ok(Self::with_matrix_state(product_id, store, matrix))
    }

    fn with_matrix_state(product_id: ProductId, store: Arc<S>, matrix: VariantMatrix) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            store,
            matrix: Mutex::new(matrix),
            deleting: Mutex::new(HashSet::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// Run synchronous engine operations under the session lock
    pub fn with_matrix<R>(&self, f: impl FnOnce(&mut VariantMatrix) -> R) -> R {
        f(&mut self.matrix.lock())
    }

    pub fn rows(&self) -> Vec<VariantRow> {
        self.matrix.lock().rows().to_vec()
    }

    pub fn axes(&self) -> Vec<OptionAxis> {
        self.matrix.lock().axes().to_vec()
    }

    pub fn payload(&self) -> Vec<VariantPayload> {
        self.matrix.lock().payload()
    }

    pub fn summary(&self) -> MatrixSummary {
        self.matrix.lock().summary()
    }

    pub fn subscribe(&self) -> watch::Receiver<MatrixSnapshot> {
        self.matrix.lock().subscribe()
    }

    pub fn is_deleting(&self, variant_id: VariantId) -> bool {
        self.deleting.lock().contains(&variant_id)
    }

    /// Re-read the saved variants and run a snapshot pass against them
    pub async fn refresh(&self) -> MatrixResult<ReconcileReport> {
        let snapshot = self
            .store
            .load_variants(self.product_id)
            .await
            .map_err(|e| MatrixError::RemoteLoad {
                product_id: self.product_id,
                reason: e.to_string(),
            })?;
        Ok(self.matrix.lock().load_snapshot(snapshot))
    }

    /// Create a new axis with its initial values and add it to the configuration.
    ///
    /// Fails as a whole only when the axis itself cannot be created. Values that
    /// fail are reported and left out; the rest are merged in request order.
    pub async fn create_axis(
        &self,
        name: &str,
        values: Vec<NewOptionValue>,
    ) -> MatrixResult<CreationReport> {
        let (name, position) = {
            let matrix = self.matrix.lock();
            let name = validate_axis_name(name, matrix.axes())?;
            validate_new_values(&OptionAxis::new(0, name.as_str(), 0), &values)?;
            let position = matrix
                .axes()
                .iter()
                .map(|axis| axis.position + 1)
                .max()
                .unwrap_or(0);
            (name, position)
        };

        let record = self
            .store
            .create_axis(&name, &slugify(&name))
            .await
            .map_err(|e| RemoteCreateError {
                label: name.clone(),
                reason: e.to_string(),
            })?;

        let mut report = CreationReport::new(record.id, values.len());
        let (created, failures) = self.create_values(record.id, &values).await;
        report.failures = failures;
        if created.is_empty() {
            warn!("Axis '{}' created without any values; not added", record.name);
            return Ok(report);
        }

        let mut axis = OptionAxis::new(record.id, record.name, position);
        for (offset, mut value) in created.into_iter().enumerate() {
            value.position = offset as i32;
            axis.push_value(value.clone());
            report.created.push(value);
        }

        let mut matrix = self.matrix.lock();
        let mut axes = matrix.axes().to_vec();
        axes.push(axis);
        report.reconcile = Some(matrix.set_axes(axes));
        Ok(report)
    }

    /// Create values on an existing axis and merge the ones that succeed
    pub async fn add_values(
        &self,
        axis_id: AxisId,
        values: Vec<NewOptionValue>,
    ) -> MatrixResult<CreationReport> {
        {
            let matrix = self.matrix.lock();
            let axis = matrix
                .axes()
                .iter()
                .find(|axis| axis.axis_id == axis_id)
                .ok_or(ValidationError::UnknownAxis(axis_id))?;
            validate_new_values(axis, &values)?;
        }

        let mut report = CreationReport::new(axis_id, values.len());
        let (created, failures) = self.create_values(axis_id, &values).await;
        report.failures = failures;
        if created.is_empty() {
            return Ok(report);
        }

        let mut matrix = self.matrix.lock();
        let mut axes = matrix.axes().to_vec();
        let Some(axis) = axes.iter_mut().find(|axis| axis.axis_id == axis_id) else {
            warn!(
                "Axis {} left the configuration while its values were created",
                axis_id
            );
            report.created = created;
            return Ok(report);
        };

        let mut position = axis.next_value_position();
        for mut value in created {
            value.position = position;
            if axis.push_value(value.clone()) {
                position += 1;
                report.created.push(value);
            }
        }
        report.reconcile = Some(matrix.set_axes(axes));
        Ok(report)
    }

    /// Issue all creations at once; results come back in request order
    async fn create_values(
        &self,
        axis_id: AxisId,
        values: &[NewOptionValue],
    ) -> (Vec<OptionValue>, Vec<RemoteCreateError>) {
        let requests = values
            .iter()
            .map(|value| self.store.create_axis_value(axis_id, value));
        let results = join_all(requests).await;

        let mut created = Vec::new();
        let mut failures = Vec::new();
        for (value, result) in values.iter().zip(results) {
            match result {
                Ok(option_value) => created.push(option_value),
                Err(e) => {
                    let failure = RemoteCreateError {
                        label: value.label.clone(),
                        reason: e.to_string(),
                    };
                    warn!("{}", failure);
                    failures.push(failure);
                }
            }
        }
        debug!(
            "Axis {}: {} of {} value(s) created",
            axis_id,
            created.len(),
            values.len()
        );
        (created, failures)
    }

    /// Delete the variant with exactly these value ids. Persisted rows are deleted
    /// remotely first and only removed locally once that succeeds.
    pub async fn delete_variant(&self, value_ids: &[ValueId]) -> MatrixResult<RemovalReport> {
        let server_id = {
            let matrix = self.matrix.lock();
            let row = matrix
                .row_by_value_ids(value_ids)
                .ok_or_else(|| MatrixError::VariantNotFound(signature(value_ids)))?;
            if row.is_default() {
                return Err(ValidationError::DefaultVariantNotDeletable.into());
            }
            row.server_id
        };

        let Some(variant_id) = server_id else {
            return self.matrix.lock().remove_row(value_ids);
        };

        let claimed = self.deleting.lock().insert(variant_id);
        if !claimed {
            return Err(MatrixError::DeleteInFlight(variant_id));
        }

        let result = self.store.delete_variant(self.product_id, variant_id).await;
        self.deleting.lock().remove(&variant_id);

        if let Err(e) = result {
            warn!("Failed to delete variant {}: {}", variant_id, e);
            return Err(MatrixError::RemoteDelete {
                variant_id,
                reason: e.to_string(),
            });
        }

        // The list may have been regenerated meanwhile; find the same row again
        self.matrix.lock().remove_persisted_row(value_ids, variant_id)
    }

    pub async fn delete_variant_at(&self, index: usize) -> MatrixResult<RemovalReport> {
        let value_ids = {
            let matrix = self.matrix.lock();
            let len = matrix.rows().len();
            matrix
                .row(index)
                .map(|row| row.value_ids.clone())
                .ok_or(ValidationError::RowOutOfRange { index, len })?
        };
        self.delete_variant(&value_ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::BulkEdit;
    use crate::store::MemoryStore;

    fn session() -> ProductEditSession<MemoryStore> {
        ProductEditSession::new(1, Arc::new(MemoryStore::new()), MatrixSettings::default())
    }

    #[tokio::test]
    async fn test_create_axis_merges_values() {
        let session = session();
        let report = session
            .create_axis("Color", vec![NewOptionValue::new("Red"), NewOptionValue::new("Blue")])
            .await
            .unwrap();

        assert_eq!(report.created_count(), 2);
        assert!(report.reconcile.as_ref().is_some_and(|r| r.regenerated()));
        assert_eq!(session.rows().len(), 2);
        assert_eq!(session.rows()[0].display_label, "Red");
    }

    #[tokio::test]
    async fn test_invalid_axis_is_rejected_before_any_call() {
        let session = session();
        session
            .create_axis("Color", vec![NewOptionValue::new("Red")])
            .await
            .unwrap();

        let err = session
            .create_axis(" color ", vec![NewOptionValue::new("Red")])
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = session
            .create_axis("Size", vec![NewOptionValue::new("S"), NewOptionValue::new("s")])
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(session.axes().len(), 1);
    }

    #[tokio::test]
    async fn test_unsaved_rows_are_deleted_locally() {
        let session = session();
        session
            .create_axis("Size", vec![NewOptionValue::new("S"), NewOptionValue::new("M")])
            .await
            .unwrap();
        let small = session.rows()[0].value_ids.clone();

        let report = session.delete_variant(&small).await.unwrap();
        assert!(report.prune.changed());
        assert_eq!(session.rows().len(), 1);
        assert_eq!(session.axes()[0].values.len(), 1);
        assert!(session.delete_variant(&[]).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_by_index_with_ids_shared_across_axes() {
        let session = session();
        session.with_matrix(|matrix| {
            matrix.set_axes(vec![
                OptionAxis::new(1, "Color", 0).with_values(vec![
                    OptionValue::new(1, "Red", 0),
                    OptionValue::new(2, "Blue", 1),
                ]),
                OptionAxis::new(2, "Size", 1).with_values(vec![
                    OptionValue::new(1, "S", 0),
                    OptionValue::new(2, "M", 1),
                ]),
            ]);
            matrix.update_field(1, BulkEdit::Price(11.0)).unwrap();
            matrix.update_field(2, BulkEdit::Price(22.0)).unwrap();
        });

        // Red / M and Blue / S share the signature 1_2
        let report = session.delete_variant_at(2).await.unwrap();
        assert_eq!(report.removed.display_label, "Blue / S");
        assert_eq!(report.removed.price, 22.0);

        let remaining: Vec<(String, f64)> = session
            .rows()
            .into_iter()
            .map(|row| (row.display_label, row.price))
            .collect();
        assert_eq!(
            remaining,
            vec![
                ("Red / S".to_string(), 0.0),
                ("Red / M".to_string(), 11.0),
                ("Blue / M".to_string(), 0.0),
            ]
        );
    }
}

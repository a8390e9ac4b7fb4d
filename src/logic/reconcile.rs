use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::watch;

use crate::error::{InvariantViolation, MatrixError, MatrixResult, ValidationError};
use crate::logic::{
    display_label, fingerprint, generate, reverse_prune, signature, validate_price, validate_stock,
    BulkEdit, BulkEditCoordinator, GroupProjector, PruneOutcome,
};
use crate::model::{
    build_payload, sort_axes, AxisId, ImageRef, OptionAxis, Signature, ValueId, VariantDefaults,
    VariantGroup, VariantId, VariantPayload, VariantRow,
};

pub const DEFAULT_LABEL_SEPARATOR: &str = " / ";

/// Engine settings, usually built from `AppConfig`
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixSettings {
    pub defaults: VariantDefaults,
    pub label_separator: String,
}

impl Default for MatrixSettings {
    fn default() -> Self {
        Self {
            defaults: VariantDefaults::default(),
            label_separator: DEFAULT_LABEL_SEPARATOR.to_string(),
        }
    }
}

/// What started a reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassOrigin {
    /// The operator changed the axis configuration or the base defaults
    Operator,
    /// An existing-variants snapshot arrived
    Snapshot,
    /// Deletions pruned the configuration
    ReversePrune,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// Rows were rebuilt and differ from the previous list
    Regenerated,
    /// Nothing changed; no revision was published
    Unchanged,
    /// A pass is running; the change was coalesced into the next one
    Queued,
    /// The configuration was adopted without regenerating rows
    Suppressed,
    /// The user is editing a field; the change waits for the edit to end
    Deferred,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub outcome: ReconcileOutcome,
    pub origin: PassOrigin,
    pub row_count: usize,
    /// Rows matched against the in-memory list
    pub carried: usize,
    /// Rows matched against the server snapshot
    pub from_snapshot: usize,
    /// Rows filled with defaults
    pub fresh: usize,
    #[serde(skip)]
    pub skipped: Vec<InvariantViolation>,
}

impl ReconcileReport {
    fn empty(outcome: ReconcileOutcome, origin: PassOrigin, row_count: usize) -> Self {
        Self {
            outcome,
            origin,
            row_count,
            carried: 0,
            from_snapshot: 0,
            fresh: 0,
            skipped: Vec::new(),
        }
    }

    pub fn regenerated(&self) -> bool {
        self.outcome == ReconcileOutcome::Regenerated
    }
}

/// Outcome of removing one row locally
#[derive(Debug, Clone, PartialEq)]
pub struct RemovalReport {
    pub removed: VariantRow,
    pub prune: PruneOutcome,
    pub reconcile: ReconcileReport,
}

/// Consistent view published to observers after every state transition
#[derive(Debug, Clone, Default)]
pub struct MatrixSnapshot {
    pub revision: u64,
    pub axes: Arc<Vec<OptionAxis>>,
    pub rows: Arc<Vec<VariantRow>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatrixSummary {
    pub variant_count: usize,
    pub total_stock: i64,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

#[derive(Debug, Clone)]
struct PendingPass {
    axes: Vec<OptionAxis>,
    origin: PassOrigin,
    regenerate: bool,
    force: bool,
}

/// Per-session reconciliation state.
///
/// Created when a product edit form opens and reset when the product changes, so
/// two sessions never share fingerprints, guards or snapshots.
#[derive(Debug, Clone, Default)]
pub struct ReconcileContext {
    last_fingerprint: Option<String>,
    last_defaults: Option<VariantDefaults>,
    reconciling: bool,
    user_editing: bool,
    deferred_defaults: Option<VariantDefaults>,
    pending: Option<PendingPass>,
    snapshot: Option<Vec<VariantRow>>,
    snapshot_consumed: bool,
    deleted_server_ids: HashSet<VariantId>,
}

impl ReconcileContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_reconciling(&self) -> bool {
        self.reconciling
    }

    pub fn is_user_editing(&self) -> bool {
        self.user_editing
    }

    pub fn last_fingerprint(&self) -> Option<&str> {
        self.last_fingerprint.as_deref()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether a snapshot is loaded and still usable for matching
    pub fn snapshot_available(&self) -> bool {
        self.snapshot.is_some() && !self.snapshot_consumed
    }

    /// Coalesce with any queued pass: the latest configuration wins, flags accumulate
    fn queue(&mut self, mut pass: PendingPass) {
        if let Some(previous) = self.pending.take() {
            pass.regenerate |= previous.regenerate;
            pass.force |= previous.force;
        }
        self.pending = Some(pass);
    }

    fn take_pending(&mut self) -> Option<PendingPass> {
        self.pending.take()
    }

    /// Snapshot rows usable for matching, minus rows deleted since it was loaded
    fn snapshot_rows(&self) -> impl Iterator<Item = &VariantRow> {
        self.snapshot
            .iter()
            .filter(|_| !self.snapshot_consumed)
            .flatten()
            .filter(|row| {
                row.server_id
                    .map_or(true, |id| !self.deleted_server_ids.contains(&id))
            })
    }
}

/// Owner of the canonical variant list of one product.
///
/// Regenerates rows from the axis configuration while carrying forward edited data
/// by signature, prunes the configuration after deletions, and applies field and
/// bulk edits. Every transition publishes exactly one `MatrixSnapshot`.
#[derive(Debug)]
pub struct VariantMatrix {
    axes: Vec<OptionAxis>,
    rows: Vec<VariantRow>,
    image_pool: Vec<ImageRef>,
    defaults: VariantDefaults,
    label_separator: String,
    ctx: ReconcileContext,
    revision: u64,
    publisher: watch::Sender<MatrixSnapshot>,
}

impl VariantMatrix {
    /// Empty matrix; rows appear with the first pass
    pub fn new(settings: MatrixSettings) -> Self {
        let (publisher, _) = watch::channel(MatrixSnapshot::default());
        Self {
            axes: Vec::new(),
            rows: Vec::new(),
            image_pool: Vec::new(),
            defaults: settings.defaults,
            label_separator: settings.label_separator,
            ctx: ReconcileContext::new(),
            revision: 0,
            publisher,
        }
    }

    /// Matrix for a product being opened: the snapshot seeds the first pass
    pub fn load(
        settings: MatrixSettings,
        axes: Vec<OptionAxis>,
        image_pool: Vec<ImageRef>,
        snapshot: Option<Vec<VariantRow>>,
    ) -> Self {
        let mut matrix = Self::new(settings);
        matrix.image_pool = image_pool;
        if let Some(rows) = snapshot {
            matrix.ctx.snapshot = Some(rows);
        }
        matrix.submit(PendingPass {
            axes,
            origin: PassOrigin::Snapshot,
            regenerate: true,
            force: true,
        });
        matrix
    }

    pub fn axes(&self) -> &[OptionAxis] {
        &self.axes
    }

    pub fn rows(&self) -> &[VariantRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&VariantRow> {
        self.rows.get(index)
    }

    /// Row with exactly these value ids, in axis order
    pub fn row_by_value_ids(&self, value_ids: &[ValueId]) -> Option<&VariantRow> {
        self.rows.iter().find(|row| row.value_ids.as_slice() == value_ids)
    }

    pub fn image_pool(&self) -> &[ImageRef] {
        &self.image_pool
    }

    pub fn defaults(&self) -> VariantDefaults {
        self.defaults
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn context(&self) -> &ReconcileContext {
        &self.ctx
    }

    pub fn subscribe(&self) -> watch::Receiver<MatrixSnapshot> {
        self.publisher.subscribe()
    }

    /// Persistence-ready projection of the canonical list
    pub fn payload(&self) -> Vec<VariantPayload> {
        build_payload(&self.rows, &self.image_pool)
    }

    pub fn groups(&self) -> Vec<VariantGroup<'_>> {
        GroupProjector::project(&self.rows, &self.axes)
    }

    pub fn summary(&self) -> MatrixSummary {
        let prices = self.rows.iter().map(|row| row.price);
        MatrixSummary {
            variant_count: self.rows.len(),
            total_stock: self.rows.iter().map(|row| row.stock).sum(),
            min_price: prices.clone().reduce(f64::min),
            max_price: prices.reduce(f64::max),
        }
    }

    // ---- Configuration changes ----

    /// The operator changed the axis configuration
    pub fn set_axes(&mut self, axes: Vec<OptionAxis>) -> ReconcileReport {
        self.submit(PendingPass {
            axes,
            origin: PassOrigin::Operator,
            regenerate: true,
            force: false,
        })
    }

    /// Run several configuration changes as one pass.
    /// Changes made inside the closure are queued and coalesced; the latest wins.
    pub fn batch<R, F>(&mut self, f: F) -> (R, ReconcileReport)
    where
        F: FnOnce(&mut Self) -> R,
    {
        if self.ctx.reconciling {
            let result = f(self);
            let report = ReconcileReport::empty(
                ReconcileOutcome::Queued,
                PassOrigin::Operator,
                self.rows.len(),
            );
            return (result, report);
        }

        self.ctx.reconciling = true;
        let result = f(self);
        self.ctx.reconciling = false;
        (result, self.drain())
    }

    /// Base price/stock typed into the product form
    pub fn set_defaults(&mut self, defaults: VariantDefaults) -> MatrixResult<ReconcileReport> {
        validate_price(defaults.price)?;
        validate_stock(defaults.stock)?;

        if self.ctx.user_editing {
            self.ctx.deferred_defaults = Some(defaults);
            return Ok(ReconcileReport::empty(
                ReconcileOutcome::Deferred,
                PassOrigin::Operator,
                self.rows.len(),
            ));
        }

        self.defaults = defaults;
        Ok(self.set_axes(self.axes.clone()))
    }

    pub fn begin_field_edit(&mut self) {
        self.ctx.user_editing = true;
    }

    /// End of a field edit; applies base defaults typed meanwhile
    pub fn end_field_edit(&mut self) -> MatrixResult<Option<ReconcileReport>> {
        self.ctx.user_editing = false;
        match self.ctx.deferred_defaults.take() {
            Some(defaults) => self.set_defaults(defaults).map(Some),
            None => Ok(None),
        }
    }

    // ---- Existing variants ----

    /// Existing variants of an already saved product. Stored untouched and used
    /// for matching until a pass with a non-empty configuration consumes it.
    pub fn load_snapshot(&mut self, rows: Vec<VariantRow>) -> ReconcileReport {
        self.ctx.snapshot = Some(rows);
        self.ctx.snapshot_consumed = false;
        self.submit(PendingPass {
            axes: self.axes.clone(),
            origin: PassOrigin::Snapshot,
            regenerate: true,
            force: true,
        })
    }

    // ---- Deletion ----

    /// Remove the row with exactly these value ids and prune the configuration.
    /// Remote deletion of persisted rows happens before this is called.
    pub fn remove_row(&mut self, value_ids: &[ValueId]) -> MatrixResult<RemovalReport> {
        self.remove_matching(value_ids, None)
    }

    /// Like `remove_row`, but only if the row still carries this server id
    pub fn remove_persisted_row(
        &mut self,
        value_ids: &[ValueId],
        server_id: VariantId,
    ) -> MatrixResult<RemovalReport> {
        self.remove_matching(value_ids, Some(server_id))
    }

    fn remove_matching(
        &mut self,
        value_ids: &[ValueId],
        server_id: Option<VariantId>,
    ) -> MatrixResult<RemovalReport> {
        // Exact tuples: value ids repeat across axes, so signatures can collide
        let index = self
            .rows
            .iter()
            .position(|row| {
                row.value_ids.as_slice() == value_ids
                    && server_id.map_or(true, |id| row.server_id == Some(id))
            })
            .ok_or_else(|| MatrixError::VariantNotFound(signature(value_ids)))?;
        if self.rows[index].is_default() {
            return Err(ValidationError::DefaultVariantNotDeletable.into());
        }

        let removed = self.rows.remove(index);
        if let Some(id) = removed.server_id {
            self.ctx.deleted_server_ids.insert(id);
        }

        let prune = reverse_prune(&self.axes, &self.rows);
        let reconcile = if prune.changed() {
            info!(
                "Pruned {} value(s) and {} axis/axes after deleting {}",
                prune.removed_values.len(),
                prune.removed_axes.len(),
                removed.display_label
            );
            // The rows are already right unless no axis survived
            let regenerate = prune.axes.is_empty();
            self.submit(PendingPass {
                axes: prune.axes.clone(),
                origin: PassOrigin::ReversePrune,
                regenerate,
                force: regenerate,
            })
        } else {
            self.publish();
            ReconcileReport::empty(
                ReconcileOutcome::Unchanged,
                PassOrigin::ReversePrune,
                self.rows.len(),
            )
        };

        Ok(RemovalReport {
            removed,
            prune,
            reconcile,
        })
    }

    // ---- Field and bulk edits ----

    /// Edit one row's price, stock or image. Never regenerates.
    pub fn update_field(&mut self, index: usize, edit: BulkEdit) -> MatrixResult<()> {
        self.apply_bulk(&[index], edit).map(|_| ())
    }

    pub fn set_sku(&mut self, index: usize, sku: Option<String>) -> MatrixResult<()> {
        let len = self.rows.len();
        let row = self
            .rows
            .get_mut(index)
            .ok_or(ValidationError::RowOutOfRange { index, len })?;
        row.sku = sku.filter(|s| !s.trim().is_empty());
        self.publish();
        Ok(())
    }

    /// Apply one field update to the given rows as a single transition.
    /// Returns the number of distinct rows updated.
    pub fn apply_bulk(&mut self, indices: &[usize], edit: BulkEdit) -> MatrixResult<usize> {
        let updated = BulkEditCoordinator::apply(&self.rows, indices, &edit, &self.image_pool)?;
        let changed = updated
            .iter()
            .zip(&self.rows)
            .filter(|(new, old)| new != old)
            .count();

        debug!(
            "Bulk {:?} over {} index(es), {} row(s) changed",
            edit.field(),
            indices.len(),
            changed
        );
        self.rows = updated;
        self.publish();
        Ok(changed)
    }

    pub fn apply_to_all(&mut self, edit: BulkEdit) -> MatrixResult<usize> {
        let indices: Vec<usize> = (0..self.rows.len()).collect();
        self.apply_bulk(&indices, edit)
    }

    /// Apply to every row of the group keyed by a first-axis value
    pub fn apply_to_group(&mut self, key: ValueId, edit: BulkEdit) -> MatrixResult<usize> {
        let indices = self
            .groups()
            .into_iter()
            .find(|group| group.key == key)
            .map(|group| group.indices)
            .ok_or(ValidationError::UnknownGroup(key))?;
        self.apply_bulk(&indices, edit)
    }

    /// Replace the product image pool. References to images that left the pool are cleared.
    pub fn set_image_pool(&mut self, pool: Vec<ImageRef>) -> usize {
        let mut cleared = 0;
        for row in &mut self.rows {
            let orphaned = row
                .image_ref
                .as_ref()
                .is_some_and(|image| !pool.iter().any(|p| p.same_image(image)));
            if orphaned {
                row.image_ref = None;
                cleared += 1;
            }
        }
        self.image_pool = pool;
        self.publish();
        cleared
    }

    /// Fill missing SKUs as `BASE-SLUG-SLUG`, upper-cased. Returns the number filled.
    pub fn autofill_skus(&mut self, base_sku: &str) -> MatrixResult<usize> {
        let base = base_sku.trim();
        if base.is_empty() {
            return Err(ValidationError::EmptySkuPrefix.into());
        }

        let ordered = sort_axes(&self.axes);
        let mut filled = 0;
        for row in &mut self.rows {
            if row.trimmed_sku().is_some() {
                continue;
            }
            let mut parts = vec![base.to_string()];
            parts.extend(
                ordered
                    .iter()
                    .zip(&row.value_ids)
                    .filter_map(|(axis, id)| axis.value(*id))
                    .map(|value| value.slug.to_uppercase()),
            );
            row.sku = Some(parts.join("-"));
            filled += 1;
        }

        if filled > 0 {
            self.publish();
        }
        Ok(filled)
    }

    /// Start over for a different product
    pub fn reset(&mut self, defaults: VariantDefaults) {
        self.axes.clear();
        self.rows.clear();
        self.image_pool.clear();
        self.defaults = defaults;
        self.ctx.reset();
        self.publish();
    }

    /// Remove one value from an axis; an axis left empty leaves the configuration
    pub fn remove_axis_value(&mut self, axis_id: AxisId, value_id: ValueId) -> MatrixResult<ReconcileReport> {
        let mut axes = self.axes.clone();
        let axis = axes
            .iter_mut()
            .find(|axis| axis.axis_id == axis_id)
            .ok_or(ValidationError::UnknownAxis(axis_id))?;
        axis.retain_values(|value| value.id != value_id);
        Ok(self.set_axes(axes))
    }

    pub fn remove_axis(&mut self, axis_id: AxisId) -> MatrixResult<ReconcileReport> {
        if !self.axes.iter().any(|axis| axis.axis_id == axis_id) {
            return Err(ValidationError::UnknownAxis(axis_id).into());
        }
        let axes = self
            .axes
            .iter()
            .filter(|axis| axis.axis_id != axis_id)
            .cloned()
            .collect();
        Ok(self.set_axes(axes))
    }

    // ---- Pass machinery ----

    fn submit(&mut self, pass: PendingPass) -> ReconcileReport {
        let origin = pass.origin;
        self.ctx.queue(pass);
        if self.ctx.reconciling {
            debug!("Reconciliation running; {:?} change queued", origin);
            return ReconcileReport::empty(ReconcileOutcome::Queued, origin, self.rows.len());
        }
        self.drain()
    }

    fn drain(&mut self) -> ReconcileReport {
        self.ctx.reconciling = true;
        let mut report =
            ReconcileReport::empty(ReconcileOutcome::Unchanged, PassOrigin::Operator, self.rows.len());
        while let Some(pass) = self.ctx.take_pending() {
            report = self.run_pass(pass);
        }
        self.ctx.reconciling = false;
        report
    }

    fn run_pass(&mut self, pass: PendingPass) -> ReconcileReport {
        let axes = normalize_axes(pass.axes);
        let fingerprint = fingerprint(&axes);
        let structural = self.ctx.last_fingerprint.as_deref() != Some(fingerprint.as_str());
        let defaults_due = self.ctx.last_defaults != Some(self.defaults) && !self.ctx.user_editing;

        if !pass.regenerate {
            // Reverse prune: the rows already reflect the pruned configuration
            self.axes = axes;
            self.ctx.last_fingerprint = Some(fingerprint);
            self.publish();
            return ReconcileReport::empty(ReconcileOutcome::Suppressed, pass.origin, self.rows.len());
        }

        if !structural && !pass.force && !defaults_due {
            return ReconcileReport::empty(ReconcileOutcome::Unchanged, pass.origin, self.rows.len());
        }

        let (rows, mut report) = if axes.is_empty() {
            self.build_default_row()
        } else {
            self.build_rows(&axes)
        };
        report.origin = pass.origin;
        let changed = rows != self.rows || axes != self.axes;

        if !axes.is_empty() && self.ctx.snapshot_available() {
            debug!("Existing-variants snapshot consumed");
            self.ctx.snapshot_consumed = true;
        }
        self.rows = rows;
        self.axes = axes;
        self.ctx.last_fingerprint = Some(fingerprint);
        self.ctx.last_defaults = Some(self.defaults);
        report.row_count = self.rows.len();

        if changed {
            info!(
                "Reconciled {} variant(s): {} carried, {} from snapshot, {} fresh",
                report.row_count, report.carried, report.from_snapshot, report.fresh
            );
            report.outcome = ReconcileOutcome::Regenerated;
            self.publish();
        } else {
            report.outcome = ReconcileOutcome::Unchanged;
        }
        report
    }

    /// No axes: the canonical list is the single default variant.
    ///
    /// An edited default row is carried forward; otherwise the snapshot's default row
    /// wins, then an untouched local row refreshed from the base defaults, then a new one.
    fn build_default_row(&self) -> (Vec<VariantRow>, ReconcileReport) {
        let mut report = ReconcileReport::empty(ReconcileOutcome::Regenerated, PassOrigin::Operator, 1);
        let current = self.rows.iter().find(|row| row.is_default());
        let edited = current.filter(|row| !self.is_untouched_default(row));

        let mut row = if let Some(row) = edited {
            report.carried = 1;
            row.clone()
        } else if let Some(saved) = self.ctx.snapshot_rows().find(|row| row.is_default()) {
            report.from_snapshot = 1;
            saved.clone()
        } else if let Some(row) = current {
            report.carried = 1;
            let mut row = row.clone();
            row.price = self.defaults.price;
            row.stock = self.defaults.stock;
            row
        } else {
            report.fresh = 1;
            VariantRow::default_variant(self.defaults)
        };
        row.display_label = String::new();

        (vec![row], report)
    }

    fn build_rows(&self, axes: &[OptionAxis]) -> (Vec<VariantRow>, ReconcileReport) {
        let mut report = ReconcileReport::empty(ReconcileOutcome::Regenerated, PassOrigin::Operator, 0);
        let combinations = generate(axes);
        // Rows whose tuple is generated again are only ever matched exactly
        let targets: HashSet<Vec<ValueId>> =
            combinations.iter().map(|c| c.value_ids().to_vec()).collect();
        let current_exact = index_by_value_ids(self.rows.iter());
        let mut current = index_by_signature(
            self.rows.iter().filter(|row| !targets.contains(&row.value_ids)),
        );
        let saved_exact = index_by_value_ids(self.ctx.snapshot_rows());
        let mut saved = index_by_signature(
            self.ctx
                .snapshot_rows()
                .filter(|row| !targets.contains(&row.value_ids)),
        );
        let seed = self.first_axis_seed();
        let pool_image = self.image_pool.first().cloned();

        let mut rows = Vec::with_capacity(combinations.len());
        for (position, combination) in combinations.into_iter().enumerate() {
            let signature = combination.signature();
            if combination.len() != axes.len() {
                let violation = InvariantViolation {
                    signature,
                    expected: axes.len(),
                    actual: combination.len(),
                };
                warn!("Skipping malformed combination: {}", violation);
                report.skipped.push(violation);
                continue;
            }

            let ids = combination.value_ids();
            let mut row = if let Some(existing) =
                current_exact.get(ids).copied().or_else(|| current.remove(&signature))
            {
                report.carried += 1;
                existing.clone()
            } else if let Some(existing) =
                saved_exact.get(ids).copied().or_else(|| saved.remove(&signature))
            {
                report.from_snapshot += 1;
                existing.clone()
            } else {
                report.fresh += 1;
                let mut row = VariantRow::new(Vec::new(), self.defaults.price, self.defaults.stock);
                match seed.filter(|_| position == 0) {
                    Some(default_row) => {
                        row.price = default_row.price;
                        row.stock = default_row.stock;
                        row.image_ref = default_row.image_ref.clone();
                    }
                    None => row.image_ref = pool_image.clone(),
                }
                row
            };

            row.display_label = display_label(combination.value_ids(), axes, &self.label_separator);
            row.value_ids = combination.into_value_ids();
            rows.push(row);
        }

        (rows, report)
    }

    /// The default row seeds the first combination when a product gains its first
    /// axis and the snapshot knows no axis-aware variants
    fn first_axis_seed(&self) -> Option<&VariantRow> {
        if !self.axes.is_empty() {
            return None;
        }
        if self.ctx.snapshot_rows().any(|row| !row.is_default()) {
            return None;
        }
        self.rows.iter().find(|row| row.is_default())
    }

    /// A local default row nobody has edited since the defaults were applied
    fn is_untouched_default(&self, row: &VariantRow) -> bool {
        row.server_id.is_none()
            && row.trimmed_sku().is_none()
            && row.image_ref.is_none()
            && self.ctx.last_defaults == Some(VariantDefaults::new(row.price, row.stock))
    }

    fn publish(&mut self) {
        self.revision += 1;
        self.publisher.send_replace(MatrixSnapshot {
            revision: self.revision,
            axes: Arc::new(self.axes.clone()),
            rows: Arc::new(self.rows.clone()),
        });
    }
}

/// First row wins when two rows carry the same tuple
fn index_by_value_ids<'a>(
    rows: impl Iterator<Item = &'a VariantRow>,
) -> HashMap<&'a [ValueId], &'a VariantRow> {
    let mut index = HashMap::new();
    for row in rows {
        index.entry(row.value_ids.as_slice()).or_insert(row);
    }
    index
}

/// Signature fallback for tuples whose axis order changed. Each entry is claimed
/// at most once. Signatures shared by different tuples are ambiguous and left out.
fn index_by_signature<'a>(
    rows: impl Iterator<Item = &'a VariantRow>,
) -> HashMap<Signature, &'a VariantRow> {
    let mut index: HashMap<Signature, &'a VariantRow> = HashMap::new();
    let mut ambiguous = HashSet::new();
    for row in rows {
        let key = row.signature();
        match index.get(&key) {
            Some(existing) if existing.value_ids != row.value_ids => {
                warn!(
                    "Variants {:?} and {:?} share signature {}; matching them by exact value ids only",
                    existing.value_ids, row.value_ids, key
                );
                ambiguous.insert(key);
            }
            Some(_) => {}
            None => {
                index.insert(key, row);
            }
        }
    }
    for key in &ambiguous {
        index.remove(key);
    }
    index
}

/// Drop axes without values and duplicate value ids within an axis
fn normalize_axes(axes: Vec<OptionAxis>) -> Vec<OptionAxis> {
    axes.into_iter()
        .filter_map(|axis| {
            let OptionAxis {
                axis_id,
                axis_name,
                position,
                values,
            } = axis;
            let normalized = OptionAxis::new(axis_id, axis_name, position).with_values(values);
            if normalized.values.is_empty() {
                debug!("Axis '{}' has no values; left out of generation", normalized.axis_name);
                None
            } else {
                Some(normalized)
            }
        })
        .collect()
}

use std::collections::HashSet;

use crate::model::{sort_axes, AxisId, OptionAxis, ValueId, VariantRow};

/// Result of pruning unreferenced values out of an axis configuration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PruneOutcome {
    pub axes: Vec<OptionAxis>,
    pub removed_values: Vec<(AxisId, ValueId)>,
    pub removed_axes: Vec<AxisId>,
}

impl PruneOutcome {
    pub fn changed(&self) -> bool {
        !self.removed_values.is_empty() || !self.removed_axes.is_empty()
    }
}

/// Drop every axis value no remaining row references, then every axis left empty.
///
/// Value ids are only unique within an axis, so a row's ids are attributed to axes
/// positionally (the generator emits one id per axis in position order). Rows whose
/// shape does not match the axis count fall back to id-only attribution.
pub fn reverse_prune(axes: &[OptionAxis], rows: &[VariantRow]) -> PruneOutcome {
    let ordered = sort_axes(axes);
    let mut referenced: HashSet<(AxisId, ValueId)> = HashSet::new();
    let mut loose: HashSet<ValueId> = HashSet::new();

    for row in rows.iter().filter(|row| !row.is_default()) {
        if row.value_ids.len() == ordered.len() {
            for (axis, id) in ordered.iter().zip(&row.value_ids) {
                referenced.insert((axis.axis_id, *id));
            }
        } else {
            loose.extend(row.value_ids.iter().copied());
        }
    }

    let mut outcome = PruneOutcome::default();
    for axis in axes {
        let mut pruned = axis.clone();
        let removed = pruned.retain_values(|value| {
            referenced.contains(&(axis.axis_id, value.id)) || loose.contains(&value.id)
        });
        outcome
            .removed_values
            .extend(removed.into_iter().map(|id| (axis.axis_id, id)));

        if pruned.values.is_empty() {
            outcome.removed_axes.push(axis.axis_id);
        } else {
            outcome.axes.push(pruned);
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OptionValue;

    fn axes() -> Vec<OptionAxis> {
        vec![
            OptionAxis::new(1, "Color", 0).with_values(vec![
                OptionValue::new(1, "Red", 0),
                OptionValue::new(2, "Blue", 1),
            ]),
            OptionAxis::new(2, "Size", 1).with_values(vec![
                OptionValue::new(1, "S", 0),
                OptionValue::new(2, "M", 1),
            ]),
        ]
    }

    fn row(ids: &[ValueId]) -> VariantRow {
        VariantRow::new(ids.to_vec(), 10.0, 1)
    }

    #[test]
    fn test_nothing_pruned_while_all_values_referenced() {
        let rows = vec![row(&[1, 2]), row(&[2, 1])];
        let outcome = reverse_prune(&axes(), &rows);
        assert!(!outcome.changed());
        assert_eq!(outcome.axes, axes());
    }

    #[test]
    fn test_prunes_per_axis_despite_shared_ids() {
        // Red/S and Red/M remain. Blue and M share id 2; only Blue goes.
        let rows = vec![row(&[1, 1]), row(&[1, 2])];
        let outcome = reverse_prune(&axes(), &rows);

        assert_eq!(outcome.removed_values, vec![(1, 2)]);
        assert!(outcome.removed_axes.is_empty());
        assert_eq!(outcome.axes[0].values.len(), 1);
        assert_eq!(outcome.axes[1].values.len(), 2);
    }

    #[test]
    fn test_emptied_axes_are_dropped() {
        let outcome = reverse_prune(&axes(), &[]);
        assert_eq!(outcome.removed_axes, vec![1, 2]);
        assert!(outcome.axes.is_empty());
        assert_eq!(outcome.removed_values.len(), 4);
    }
}

use log::debug;
use std::collections::HashMap;

use crate::model::{first_axis, Common, ImageRef, OptionAxis, ValueId, VariantGroup, VariantRow};

/// Derives the collapsed display grouping of a variant list
pub struct GroupProjector;

impl GroupProjector {
    /// Group rows by their value on the lowest-position axis.
    ///
    /// Needs at least two axes: with a single axis every row is already a top-level
    /// item, so no groups are produced. Groups appear in first-appearance order.
    pub fn project<'a>(rows: &'a [VariantRow], axes: &[OptionAxis]) -> Vec<VariantGroup<'a>> {
        if axes.len() < 2 {
            return Vec::new();
        }
        let Some(first) = first_axis(axes) else {
            return Vec::new();
        };

        let mut order: Vec<ValueId> = Vec::new();
        let mut members: HashMap<ValueId, Vec<usize>> = HashMap::new();

        for (index, row) in rows.iter().enumerate() {
            match Self::group_key(row, first) {
                Some(key) => {
                    let entry = members.entry(key).or_insert_with(|| {
                        order.push(key);
                        Vec::new()
                    });
                    entry.push(index);
                }
                None => debug!(
                    "Row {} ({}) has no value on axis '{}'; left ungrouped",
                    index,
                    row.signature(),
                    first.axis_name
                ),
            }
        }

        order
            .into_iter()
            .filter_map(|key| {
                let indices = members.remove(&key)?;
                let group_rows: Vec<&'a VariantRow> = indices.iter().map(|&i| &rows[i]).collect();
                let label = first
                    .value(key)
                    .map(|v| v.label.clone())
                    .unwrap_or_else(|| key.to_string());

                Some(VariantGroup {
                    key,
                    label,
                    common_price: common_of(&group_rows, |r| r.price, |a, b| a == b),
                    common_stock: common_of(&group_rows, |r| r.stock, |a, b| a == b),
                    common_image: common_of(&group_rows, |r| r.image_ref.clone(), same_image),
                    indices,
                    rows: group_rows,
                })
            })
            .collect()
    }

    /// The row's value on the given axis; the generator puts it first
    fn group_key(row: &VariantRow, axis: &OptionAxis) -> Option<ValueId> {
        row.value_ids
            .first()
            .copied()
            .filter(|id| axis.contains_value(*id))
            .or_else(|| row.value_ids.iter().copied().find(|id| axis.contains_value(*id)))
    }
}

pub fn project<'a>(rows: &'a [VariantRow], axes: &[OptionAxis]) -> Vec<VariantGroup<'a>> {
    GroupProjector::project(rows, axes)
}

fn common_of<T, F, E>(rows: &[&VariantRow], field: F, eq: E) -> Common<T>
where
    F: Fn(&VariantRow) -> T,
    E: Fn(&T, &T) -> bool,
{
    let mut values = rows.iter().map(|row| field(row));
    let Some(first) = values.next() else {
        return Common::Mixed;
    };

    for value in values {
        if !eq(&first, &value) {
            return Common::Mixed;
        }
    }
    Common::Uniform(first)
}

fn same_image(a: &Option<ImageRef>, b: &Option<ImageRef>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.same_image(b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::generate;
    use crate::model::OptionValue;

    fn axes() -> Vec<OptionAxis> {
        vec![
            OptionAxis::new(1, "Color", 0).with_values(vec![
                OptionValue::new(1, "Red", 0),
                OptionValue::new(2, "Blue", 1),
                OptionValue::new(3, "Green", 2),
            ]),
            OptionAxis::new(2, "Size", 1).with_values(vec![
                OptionValue::new(10, "S", 0),
                OptionValue::new(11, "M", 1),
            ]),
        ]
    }

    fn rows(axes: &[OptionAxis]) -> Vec<VariantRow> {
        generate(axes)
            .into_iter()
            .map(|c| VariantRow::new(c.into_value_ids(), 5.0, 2))
            .collect()
    }

    #[test]
    fn test_groups_by_first_axis() {
        let axes = axes();
        let mut rows = rows(&axes);
        rows[0].price = 10.0;

        let groups = project(&rows, &axes);
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Red", "Blue", "Green"]);
        assert!(groups.iter().all(|g| g.len() == 2));

        assert_eq!(groups[0].common_price, Common::Mixed);
        assert_eq!(groups[1].common_price, Common::Uniform(5.0));
        assert_eq!(groups[1].common_stock, Common::Uniform(2));
        assert_eq!(groups[1].common_image, Common::Uniform(None));
        assert_eq!(groups[2].indices, vec![4, 5]);
    }

    #[test]
    fn test_group_totals_match_row_count() {
        let axes = axes();
        let mut rows = rows(&axes);
        rows.remove(3);

        let groups = project(&rows, &axes);
        let total: usize = groups.iter().map(|g| g.len()).sum();
        assert_eq!(total, rows.len());
    }

    #[test]
    fn test_groups_borrow_rows_only() {
        let rows = rows(&axes());
        let groups = {
            let axes = axes();
            project(&rows, &axes)
        };
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[1].rows[0].value_ids, rows[2].value_ids);
    }

    #[test]
    fn test_single_axis_has_no_groups() {
        let axes = vec![axes().remove(0)];
        let rows = rows(&axes);
        assert!(project(&rows, &axes).is_empty());
    }

    #[test]
    fn test_first_axis_is_chosen_by_position() {
        let mut axes = axes();
        axes[0].position = 5;

        let rows = rows(&axes);
        let groups = project(&rows, &axes);
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["S", "M"]);
        assert_eq!(groups[0].len(), 3);
    }

    #[test]
    fn test_mixed_image_serializes_as_sentinel() {
        let axes = axes();
        let mut rows = rows(&axes);
        rows[0].image_ref = Some(ImageRef::persisted(1, "https://cdn/red.jpg", 0));

        let groups = project(&rows, &axes);
        assert!(groups[0].common_image.is_mixed());

        let json = serde_json::to_value(&groups[0]).unwrap();
        assert_eq!(json["common_image"], "mixed");
        assert_eq!(json["common_stock"], 2);
    }
}

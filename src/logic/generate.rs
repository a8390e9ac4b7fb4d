use itertools::Itertools;

use crate::model::{sort_axes, Combination, OptionAxis, ValueId};

/// Cartesian product of option axes
pub struct CombinationGenerator;

impl CombinationGenerator {
    /// Generate every combination of the given axes.
    ///
    /// Axes are ordered by position and each axis's values by position; both sorts are
    /// stable so ties keep their input order. The output is lexicographic over
    /// (axis position, value position), which is what grouped display relies on.
    /// An empty axis list yields exactly one empty combination (the default variant).
    pub fn generate(axes: &[OptionAxis]) -> Vec<Combination> {
        let levels: Vec<Vec<ValueId>> = sort_axes(axes)
            .into_iter()
            .map(|axis| axis.sorted_values().into_iter().map(|v| v.id).collect())
            .collect();

        let mut combinations = Vec::with_capacity(Self::count(axes));
        let mut partial = Vec::with_capacity(levels.len());
        Self::extend(&levels, &mut partial, &mut combinations);
        combinations
    }

    fn extend(levels: &[Vec<ValueId>], partial: &mut Vec<ValueId>, out: &mut Vec<Combination>) {
        match levels.split_first() {
            None => out.push(Combination::new(partial.clone())),
            Some((values, rest)) => {
                for &value_id in values {
                    partial.push(value_id);
                    Self::extend(rest, partial, out);
                    partial.pop();
                }
            }
        }
    }

    /// Number of combinations `generate` produces for these axes
    pub fn count(axes: &[OptionAxis]) -> usize {
        axes.iter().map(|axis| axis.values.len()).product()
    }
}

pub fn generate(axes: &[OptionAxis]) -> Vec<Combination> {
    CombinationGenerator::generate(axes)
}

/// Axis-value labels of a generated combination, joined in axis position order
pub fn display_label(value_ids: &[ValueId], axes: &[OptionAxis], separator: &str) -> String {
    sort_axes(axes)
        .into_iter()
        .zip(value_ids)
        .filter_map(|(axis, id)| axis.value(*id))
        .map(|value| value.label.as_str())
        .join(separator)
}

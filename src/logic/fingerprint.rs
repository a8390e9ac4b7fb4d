use sha2::{Digest, Sha256};

use crate::model::{sort_axes, OptionAxis};

/// SHA-256 fingerprint of an axis configuration.
///
/// Covers everything that changes generated rows or their labels: axis ids, names and
/// positions, and each value's id, label and position, all in generation order.
pub fn fingerprint(axes: &[OptionAxis]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("axes:{}\n", axes.len()));

    for axis in sort_axes(axes) {
        hasher.update(format!(
            "axis:{}:{}:{}\n",
            axis.axis_id, axis.position, axis.axis_name
        ));
        for value in axis.sorted_values() {
            hasher.update(format!(
                "value:{}:{}:{}\n",
                value.id, value.position, value.label
            ));
        }
    }

    hex::encode(hasher.finalize())
}

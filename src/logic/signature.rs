use itertools::Itertools;

use crate::model::{Signature, ValueId};

/// Joins sorted value ids. Never part of a decimal integer, negative ids included.
pub const SIGNATURE_SEPARATOR: &str = "_";

/// Canonical, order-independent identity key for a set of value ids.
///
/// Value ids are only unique within an axis, so tuples from different axes can
/// share a key: Red=1 / M=2 and Blue=2 / S=1 both give `1_2`. Rows are located by
/// their exact value ids; the signature is a fallback for reordered axes and is
/// dropped wherever it is ambiguous.
pub fn signature(value_ids: &[ValueId]) -> Signature {
    Signature::from_key(value_ids.iter().sorted().join(SIGNATURE_SEPARATOR))
}

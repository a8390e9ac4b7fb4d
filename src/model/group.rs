use serde::{Serialize, Serializer};

use crate::model::{ImageRef, ValueId, VariantRow};

/// Field value shared by every member of a group, or the "mixed" sentinel
#[derive(Debug, Clone, PartialEq)]
pub enum Common<T> {
    Uniform(T),
    Mixed,
}

impl<T> Common<T> {
    pub fn is_mixed(&self) -> bool {
        matches!(self, Common::Mixed)
    }
}

impl<T: Serialize> Serialize for Common<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Common::Uniform(value) => value.serialize(serializer),
            Common::Mixed => serializer.serialize_str("mixed"),
        }
    }
}

/// Rows sharing the same first-axis value.
/// Borrows from the variant list it was projected from.
#[derive(Debug, Clone, Serialize)]
pub struct VariantGroup<'a> {
    pub key: ValueId,
    pub label: String,
    /// Positions of the member rows in the projected list
    pub indices: Vec<usize>,
    pub rows: Vec<&'a VariantRow>,
    pub common_price: Common<f64>,
    pub common_stock: Common<i64>,
    /// `Uniform(None)` means no member has an image
    pub common_image: Common<Option<ImageRef>>,
}

impl<'a> VariantGroup<'a> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

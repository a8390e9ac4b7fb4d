use serde::{Deserialize, Serialize};

use crate::model::{generate_temp_id, Signature, ValueId, VariantDefaults, VariantId};

/// Reference into the product's shared image pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
    /// Set for images that exist locally but have not been persisted yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_id: Option<String>,
}

impl ImageRef {
    pub fn persisted(id: i64, url: impl Into<String>, position: i32) -> Self {
        Self {
            id: Some(id),
            url: url.into(),
            position: Some(position),
            temp_id: None,
        }
    }

    pub fn temporary(url: impl Into<String>) -> Self {
        Self {
            id: None,
            url: url.into(),
            position: None,
            temp_id: Some(generate_temp_id()),
        }
    }

    /// Whether both references point at the same pool image.
    /// Server ids win over temporary ids, which win over urls.
    pub fn same_image(&self, other: &ImageRef) -> bool {
        if let (Some(a), Some(b)) = (self.id, other.id) {
            return a == b;
        }
        if let (Some(a), Some(b)) = (&self.temp_id, &other.temp_id) {
            return a == b;
        }
        self.url == other.url
    }
}

/// One purchasable variant of the product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<VariantId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub price: f64,
    pub stock: i64,
    /// Empty only for the default variant
    #[serde(default)]
    pub value_ids: Vec<ValueId>,
    /// Derived from axis value labels; never authoritative
    #[serde(default)]
    pub display_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<ImageRef>,
}

impl VariantRow {
    pub fn new(value_ids: Vec<ValueId>, price: f64, stock: i64) -> Self {
        Self {
            server_id: None,
            sku: None,
            price,
            stock,
            value_ids,
            display_label: String::new(),
            image_ref: None,
        }
    }

    /// The singleton row of a product without configured axes
    pub fn default_variant(defaults: VariantDefaults) -> Self {
        Self::new(Vec::new(), defaults.price, defaults.stock)
    }

    pub fn is_default(&self) -> bool {
        self.value_ids.is_empty()
    }

    pub fn signature(&self) -> Signature {
        crate::logic::signature(&self.value_ids)
    }

    /// SKU with surrounding whitespace removed, or None when blank
    pub fn trimmed_sku(&self) -> Option<&str> {
        self.sku
            .as_deref()
            .map(str::trim)
            .filter(|sku| !sku.is_empty())
    }

    pub fn with_server_id(mut self, server_id: VariantId) -> Self {
        self.server_id = Some(server_id);
        self
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    pub fn with_image(mut self, image_ref: ImageRef) -> Self {
        self.image_ref = Some(image_ref);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_image_prefers_server_ids() {
        let a = ImageRef::persisted(1, "https://cdn/a.jpg", 0);
        let mut b = ImageRef::persisted(1, "https://cdn/a-resized.jpg", 3);
        assert!(a.same_image(&b));

        b.id = Some(2);
        assert!(!a.same_image(&b));

        let tmp = ImageRef::temporary("blob:local-1");
        let mut tmp_copy = tmp.clone();
        tmp_copy.url = "blob:local-2".to_string();
        assert!(tmp.same_image(&tmp_copy));
    }

    #[test]
    fn test_blank_sku_is_treated_as_missing() {
        let row = VariantRow::new(vec![1, 2], 10.0, 1).with_sku("   ");
        assert_eq!(row.trimmed_sku(), None);
        let row = row.with_sku(" TS-RED ");
        assert_eq!(row.trimmed_sku(), Some("TS-RED"));
    }
}

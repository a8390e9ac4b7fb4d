use serde::{Deserialize, Serialize};

use crate::model::{ImageRef, ValueId, VariantId, VariantRow};

/// Persistence-ready shape of one variant.
/// Only configured variants carry value ids and an image reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VariantPayload {
    Default(DefaultVariantPayload),
    Configured(ConfiguredVariantPayload),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultVariantPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<VariantId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub price: f64,
    pub stock: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfiguredVariantPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<VariantId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub price: f64,
    pub stock: i64,
    pub value_ids: Vec<ValueId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<ImagePayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub url: String,
    pub position: i32,
}

impl ImagePayload {
    /// Missing positions fall back to the image's index in the pool, else 0
    pub fn from_ref(image: &ImageRef, pool: &[ImageRef]) -> Self {
        let position = image.position.unwrap_or_else(|| {
            pool.iter()
                .position(|candidate| candidate.same_image(image))
                .and_then(|idx| i32::try_from(idx).ok())
                .unwrap_or(0)
        });
        Self {
            id: image.id,
            url: image.url.clone(),
            position,
        }
    }
}

impl VariantPayload {
    pub fn from_row(row: &VariantRow, pool: &[ImageRef]) -> Self {
        let sku = row.trimmed_sku().map(str::to_string);
        if row.is_default() {
            return VariantPayload::Default(DefaultVariantPayload {
                id: row.server_id,
                sku,
                price: row.price,
                stock: row.stock,
            });
        }

        VariantPayload::Configured(ConfiguredVariantPayload {
            id: row.server_id,
            sku,
            price: row.price,
            stock: row.stock,
            value_ids: row.value_ids.clone(),
            image_ref: row
                .image_ref
                .as_ref()
                .map(|image| ImagePayload::from_ref(image, pool)),
        })
    }
}

/// Project a variant list into the outbound payload shape
pub fn build_payload(rows: &[VariantRow], pool: &[ImageRef]) -> Vec<VariantPayload> {
    rows.iter()
        .map(|row| VariantPayload::from_row(row, pool))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_variant_payload_has_no_image() {
        let row = VariantRow::new(Vec::new(), 12.5, 3)
            .with_server_id(7)
            .with_image(ImageRef::persisted(1, "https://cdn/a.jpg", 0));

        let payload = VariantPayload::from_row(&row, &[]);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["kind"], "default");
        assert_eq!(json["id"], 7);
        assert!(json.get("image_ref").is_none());
        assert!(json.get("value_ids").is_none());
        assert!(json.get("sku").is_none());
    }

    #[test]
    fn test_configured_payload_fills_image_position_from_pool() {
        let pool = vec![
            ImageRef::persisted(1, "https://cdn/a.jpg", 0),
            ImageRef {
                id: Some(2),
                url: "https://cdn/b.jpg".to_string(),
                position: None,
                temp_id: None,
            },
        ];
        let row = VariantRow::new(vec![3, 9], 20.0, 4)
            .with_sku("")
            .with_image(pool[1].clone());

        match VariantPayload::from_row(&row, &pool) {
            VariantPayload::Configured(p) => {
                assert_eq!(p.sku, None);
                assert_eq!(p.value_ids, vec![3, 9]);
                let image = p.image_ref.expect("image should be projected");
                assert_eq!(image.id, Some(2));
                assert_eq!(image.position, 1);
            }
            other => panic!("expected configured payload, got {:?}", other),
        }
    }
}

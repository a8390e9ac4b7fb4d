use crate::model::{ImageRef, NewOptionValue, OptionAxis, OptionValue, ProductId, VariantRow};
use crate::store::{AttributeStore, MemoryStore};
use anyhow::Result;
use log::info;

pub const DEMO_PRODUCT_ID: ProductId = 1;

/// Everything a session needs to open the demo product
#[derive(Debug, Clone)]
pub struct SeedCatalog {
    pub product_id: ProductId,
    pub axes: Vec<OptionAxis>,
    pub image_pool: Vec<ImageRef>,
}

/// Seed a saved T-shirt with Color x Size and four existing variants
pub async fn load_seed_data(store: &MemoryStore) -> Result<SeedCatalog> {
    let color = create_axis(
        store,
        "Color",
        0,
        vec![
            NewOptionValue::new("Red").with_color("#D32F2F"),
            NewOptionValue::new("Blue").with_color("#1976D2"),
        ],
    )
    .await?;
    let size = create_axis(
        store,
        "Size",
        1,
        vec![NewOptionValue::new("S"), NewOptionValue::new("M")],
    )
    .await?;

    let image_pool = vec![
        ImageRef::persisted(501, "https://cdn.example.com/tshirt/front.jpg", 0),
        ImageRef::persisted(502, "https://cdn.example.com/tshirt/red.jpg", 1),
    ];

    let mut existing = Vec::new();
    for color_value in &color.values {
        for size_value in &size.values {
            let mut row = VariantRow::new(vec![color_value.id, size_value.id], 19.9, 10).with_sku(format!(
                "TS-{}-{}",
                color_value.slug.to_uppercase(),
                size_value.slug.to_uppercase()
            ));
            if color_value.label == "Red" {
                row = row.with_image(image_pool[1].clone());
            }
            existing.push(row);
        }
    }
    let stored = store.seed_variants(DEMO_PRODUCT_ID, existing);
    info!("Seeded product {} with {} variant(s)", DEMO_PRODUCT_ID, stored.len());

    Ok(SeedCatalog {
        product_id: DEMO_PRODUCT_ID,
        axes: vec![color, size],
        image_pool,
    })
}

async fn create_axis(
    store: &MemoryStore,
    name: &str,
    position: i32,
    values: Vec<NewOptionValue>,
) -> Result<OptionAxis> {
    let record = store.create_axis(name, &crate::logic::slugify(name)).await?;
    let mut created: Vec<OptionValue> = Vec::with_capacity(values.len());
    for value in &values {
        created.push(store.create_axis_value(record.id, value).await?);
    }
    Ok(OptionAxis::new(record.id, record.name, position).with_values(created))
}

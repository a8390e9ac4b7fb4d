use std::sync::Arc;

use log::info;
use variant_matrix::config::AppConfig;
use variant_matrix::seed;
use variant_matrix::store::MemoryStore;
use variant_matrix::{BulkEdit, NewOptionValue, ProductEditSession};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log.level.as_str()))
        .init();

    println!("Variant Matrix: demo edit session");
    info!(
        "Configuration loaded: defaults={}/{} separator='{}'",
        config.defaults.price, config.defaults.stock, config.display.label_separator
    );

    let store = Arc::new(MemoryStore::new());
    let catalog = seed::load_seed_data(&store).await?;

    let session = ProductEditSession::open(
        catalog.product_id,
        store.clone(),
        config.matrix_settings(),
        catalog.axes,
        catalog.image_pool,
    )
    .await?;
    info!("Edit session {} started", session.id());
    println!("Opened product {} with {} variant(s)", session.product_id(), session.rows().len());

    // Add a colour; existing variants keep their prices and SKUs
    let color_axis = session
        .axes()
        .first()
        .map(|axis| axis.axis_id)
        .ok_or_else(|| anyhow::anyhow!("seeded product has no axes"))?;
    let report = session
        .add_values(color_axis, vec![NewOptionValue::new("Green").with_color("#388E3C")])
        .await?;
    println!("Created {} of {} value(s)", report.created_count(), report.requested);

    // Restock everything at once and give the new rows SKUs
    session.with_matrix(|matrix| -> anyhow::Result<()> {
        matrix.apply_to_all(BulkEdit::Stock(25))?;
        matrix.autofill_skus("TS")?;
        Ok(())
    })?;

    // Drop the blue medium; the saved row is deleted remotely first
    let axes = session.axes();
    let find = |label: &str| {
        axes.iter()
            .flat_map(|axis| &axis.values)
            .find(|value| value.label == label)
            .map(|value| value.id)
    };
    let (blue, medium) = (find("Blue"), find("M"));
    if let (Some(blue), Some(medium)) = (blue, medium) {
        let removal = session.delete_variant(&[blue, medium]).await?;
        println!("Deleted {}", removal.removed.display_label);
    }

    let summary = session.summary();
    println!(
        "{} variant(s), {} in stock, prices {:?}..{:?}",
        summary.variant_count, summary.total_stock, summary.min_price, summary.max_price
    );
    println!("{}", serde_json::to_string_pretty(&session.payload())?);

    Ok(())
}

use std::sync::Arc;
use std::time::Duration;

use variant_matrix::seed::{load_seed_data, SeedCatalog};
use variant_matrix::{
    BulkEdit, MatrixError, MatrixSettings, MemoryStore, NewOptionValue, ProductEditSession,
    ReconcileOutcome, VariantDefaults, VariantPayload,
};

fn settings() -> MatrixSettings {
    MatrixSettings {
        defaults: VariantDefaults::new(15.0, 2),
        ..MatrixSettings::default()
    }
}

async fn open_seeded() -> (Arc<MemoryStore>, SeedCatalog, ProductEditSession<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let catalog = load_seed_data(&store).await.unwrap();
    let session = ProductEditSession::open(
        catalog.product_id,
        store.clone(),
        settings(),
        catalog.axes.clone(),
        catalog.image_pool.clone(),
    )
    .await
    .unwrap();
    (store, catalog, session)
}

fn value_id(catalog: &SeedCatalog, label: &str) -> i64 {
    catalog
        .axes
        .iter()
        .flat_map(|axis| &axis.values)
        .find(|value| value.label == label)
        .map(|value| value.id)
        .unwrap()
}

#[tokio::test]
async fn test_new_product_builds_matrix_from_created_axes() {
    let store = Arc::new(MemoryStore::new());
    let session = ProductEditSession::new(9, store, settings());
    assert_eq!(session.rows().len(), 1);

    session
        .create_axis("Color", vec![NewOptionValue::new("Red"), NewOptionValue::new("Blue")])
        .await
        .unwrap();
    session
        .create_axis("Size", vec![NewOptionValue::new("S"), NewOptionValue::new("M")])
        .await
        .unwrap();

    let labels: Vec<String> = session.rows().into_iter().map(|row| row.display_label).collect();
    assert_eq!(labels, vec!["Red / S", "Red / M", "Blue / S", "Blue / M"]);
    assert!(session.rows().iter().all(|row| row.value_ids.len() == 2));
}

#[tokio::test]
async fn test_open_matches_saved_variants() {
    let (_store, _catalog, session) = open_seeded().await;

    let rows = session.rows();
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|row| row.server_id.is_some()));
    assert_eq!(rows[0].sku.as_deref(), Some("TS-RED-S"));
    assert_eq!(rows[0].price, 19.9);

    let payload = session.payload();
    assert!(matches!(payload[0], VariantPayload::Configured(_)));
    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(json[0]["kind"], "configured");
    assert_eq!(json[0]["image_ref"]["position"], 1);
    assert!(json[2].get("image_ref").is_none());
}

#[tokio::test]
async fn test_added_value_keeps_saved_rows() {
    let (_store, catalog, session) = open_seeded().await;
    let color = catalog.axes[0].axis_id;

    let report = session
        .add_values(color, vec![NewOptionValue::new("Green")])
        .await
        .unwrap();
    assert_eq!(report.created_count(), 1);

    let rows = session.rows();
    assert_eq!(rows.len(), 6);
    assert!(rows[..4].iter().all(|row| row.server_id.is_some()));
    assert_eq!(rows[0].price, 19.9);
    assert_eq!(rows[4].display_label, "Green / S");
    assert_eq!((rows[4].price, rows[4].stock), (15.0, 2));
    assert_eq!(rows[4].server_id, None);
}

#[tokio::test]
async fn test_partial_value_creation_merges_successes() {
    let (store, catalog, session) = open_seeded().await;
    store.fail_value("Green");

    let report = session
        .add_values(
            catalog.axes[0].axis_id,
            vec![NewOptionValue::new("Green"), NewOptionValue::new("Yellow")],
        )
        .await
        .unwrap();

    assert!(report.is_partial());
    assert_eq!(report.requested, 2);
    assert_eq!(report.failures[0].label, "Green");
    assert_eq!(report.created[0].label, "Yellow");
    assert_eq!(report.created[0].position, 2);
    assert_eq!(session.rows().len(), 6);
    assert!(!session.axes()[0].has_label("Green"));
}

#[tokio::test]
async fn test_axis_creation_failure_is_surfaced() {
    let (store, _catalog, session) = open_seeded().await;
    store.fail_axis("Material");

    let err = session
        .create_axis("Material", vec![NewOptionValue::new("Cotton")])
        .await
        .unwrap_err();
    assert!(matches!(err, MatrixError::RemoteCreate(_)));
    assert_eq!(session.axes().len(), 2);
}

#[tokio::test]
async fn test_failed_load_is_reported() {
    let store = Arc::new(MemoryStore::new());
    store.fail_load(3);

    let result = ProductEditSession::open(3, store, settings(), Vec::new(), Vec::new()).await;
    assert!(matches!(result, Err(MatrixError::RemoteLoad { product_id: 3, .. })));
}

#[tokio::test]
async fn test_refresh_keeps_local_edits() {
    let (store, _catalog, session) = open_seeded().await;
    session.with_matrix(|matrix| matrix.update_field(1, BulkEdit::Price(30.0))).unwrap();
    let before = session.rows();

    session.refresh().await.unwrap();
    assert_eq!(session.rows(), before);
    assert_eq!(session.rows()[1].price, 30.0);

    store.fail_load(session.product_id());
    let err = session.refresh().await.unwrap_err();
    assert!(matches!(err, MatrixError::RemoteLoad { .. }));
    assert!(err.is_retryable());
    assert_eq!(session.rows(), before);
}

#[tokio::test]
async fn test_failed_delete_keeps_row() {
    let (store, catalog, session) = open_seeded().await;
    let red_s = [value_id(&catalog, "Red"), value_id(&catalog, "S")];
    let server_id = session.rows()[0].server_id.unwrap();
    store.fail_delete(server_id);

    let err = session.delete_variant(&red_s).await.unwrap_err();
    assert!(matches!(err, MatrixError::RemoteDelete { variant_id, .. } if variant_id == server_id));
    assert!(err.is_retryable());
    assert_eq!(session.rows().len(), 4);
    assert!(!session.is_deleting(server_id));

    store.clear_delete_failure(server_id);
    session.delete_variant(&red_s).await.unwrap();
    assert_eq!(session.rows().len(), 3);
    assert_eq!(store.variants_for(catalog.product_id).len(), 3);
}

#[tokio::test]
async fn test_duplicate_delete_is_rejected_while_in_flight() {
    let (store, catalog, session) = open_seeded().await;
    store.set_delete_delay(Duration::from_millis(50));
    let blue_m = [value_id(&catalog, "Blue"), value_id(&catalog, "M")];

    let (first, second) = tokio::join!(session.delete_variant(&blue_m), session.delete_variant(&blue_m));

    assert!(first.is_ok());
    assert!(matches!(second, Err(MatrixError::DeleteInFlight(_))));
    assert_eq!(store.delete_calls().len(), 1);
    assert_eq!(session.rows().len(), 3);
}

#[tokio::test]
async fn test_deleting_every_row_of_a_colour_prunes_it() {
    let (store, catalog, session) = open_seeded().await;
    let blue = value_id(&catalog, "Blue");

    session.delete_variant(&[blue, value_id(&catalog, "S")]).await.unwrap();
    let report = session
        .delete_variant(&[blue, value_id(&catalog, "M")])
        .await
        .unwrap();

    assert_eq!(report.reconcile.outcome, ReconcileOutcome::Suppressed);
    assert_eq!(session.axes()[0].values.len(), 1);
    assert_eq!(session.rows().len(), 2);
    assert_eq!(session.payload().len(), 2);
    assert_eq!(store.variants_for(catalog.product_id).len(), 2);
}

#[tokio::test]
async fn test_bulk_stock_is_one_observable_change() {
    let (_store, _catalog, session) = open_seeded().await;
    let mut rx = session.subscribe();
    rx.borrow_and_update();

    let changed = session
        .with_matrix(|matrix| matrix.apply_bulk(&[0, 1, 2, 3], BulkEdit::Stock(50)))
        .unwrap();
    assert_eq!(changed, 4);

    rx.changed().await.unwrap();
    let published = rx.borrow_and_update().clone();
    assert!(published.rows.iter().all(|row| row.stock == 50));
    assert!(!rx.has_changed().unwrap());
}

#[tokio::test]
async fn test_group_view_of_saved_product() {
    let (_store, catalog, session) = open_seeded().await;
    session
        .add_values(catalog.axes[0].axis_id, vec![NewOptionValue::new("Green")])
        .await
        .unwrap();

    let (labels, mixed_images) = session.with_matrix(|matrix| {
        let groups = matrix.groups();
        let labels: Vec<String> = groups.iter().map(|g| g.label.clone()).collect();
        let mixed: Vec<bool> = groups.iter().map(|g| g.common_image.is_mixed()).collect();
        (labels, mixed)
    });
    assert_eq!(labels, vec!["Red", "Blue", "Green"]);
    assert_eq!(mixed_images, vec![false, false, false]);
}

//! End-to-end properties of the order-placement transaction, exercised
//! against the in-memory backend.

use bazaar_catalog::{NewProduct, Product, ProductFilter, ProductId, ProductUpdate};
use bazaar_core::{EntityId, UserId, Version};
use bazaar_infra::{
    CartService, Catalog, Checkout, InMemoryStore, OrderStore, Pagination, ProductStore,
    ServiceError, StoreError,
};
use bazaar_orders::{ItemRequest, Order, OrderId, OrderLine};
use chrono::Utc;

fn checkout(store: &InMemoryStore) -> Checkout<InMemoryStore> {
    Checkout::new(store.clone())
}

async fn seed_product(store: &InMemoryStore, stock: u32, price: u64) -> Product {
    let product = Product::create(
        ProductId::new(EntityId::new()),
        UserId::new(),
        NewProduct {
            name: "Ceramic mug".to_string(),
            description: String::new(),
            price,
            stock,
            category: "kitchen".to_string(),
            image_url: None,
        },
        Utc::now(),
    )
    .unwrap();
    store.insert_product(product.clone()).await.unwrap();
    product
}

fn item(product: &Product, quantity: u32) -> ItemRequest {
    ItemRequest {
        product_id: product.id,
        quantity,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn scenario_a_two_buyers_race_for_the_last_unit() {
    let store = InMemoryStore::new();
    let product = seed_product(&store, 1, 900).await;

    let first = {
        let checkout = checkout(&store);
        let request = vec![item(&product, 1)];
        tokio::spawn(async move { checkout.place_order(UserId::new(), &request).await })
    };
    let second = {
        let checkout = checkout(&store);
        let request = vec![item(&product, 1)];
        tokio::spawn(async move { checkout.place_order(UserId::new(), &request).await })
    };

    let outcomes = [first.await.unwrap(), second.await.unwrap()];
    let successes = outcomes.iter().filter(|o| o.is_ok()).count();
    assert_eq!(successes, 1);

    for outcome in &outcomes {
        if let Err(err) = outcome {
            assert!(
                matches!(
                    err,
                    ServiceError::Conflict(_) | ServiceError::InsufficientStock(_)
                ),
                "unexpected error: {err:?}"
            );
        }
    }

    let row = store.product(product.id).await.unwrap().unwrap();
    assert_eq!(row.stock, 0);
    assert_eq!(row.version, Version::new(1));
}

#[tokio::test]
async fn scenario_b_partial_insufficiency_aborts_everything() {
    let store = InMemoryStore::new();
    let p1 = seed_product(&store, 2, 1_000).await;
    let p2 = seed_product(&store, 1, 2_000).await;
    let buyer = UserId::new();

    let err = checkout(&store)
        .place_order(buyer, &[item(&p1, 2), item(&p2, 3)])
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientStock(_)));

    let row1 = store.product(p1.id).await.unwrap().unwrap();
    assert_eq!(row1.stock, 2);
    assert_eq!(row1.version, Version::ZERO);

    let orders = store
        .orders_for(buyer, Pagination::default())
        .await
        .unwrap();
    assert!(orders.is_empty());
    assert!(!store.has_purchased(buyer, p1.id).await.unwrap());
}

#[tokio::test]
async fn scenario_c_checkout_clears_cart_and_flips_purchase_history() {
    let store = InMemoryStore::new();
    let product = seed_product(&store, 10, 500).await;
    let buyer = UserId::new();
    let cart = CartService::new(store.clone());

    cart.add_item(buyer, product.id, 4).await.unwrap();
    assert_eq!(cart.items(buyer).await.unwrap().len(), 1);

    let checkout = checkout(&store);
    let order = checkout
        .place_order(buyer, &[item(&product, 4)])
        .await
        .unwrap();

    assert!(cart.items(buyer).await.unwrap().is_empty());
    assert!(checkout.has_purchased(buyer, product.id).await.unwrap());

    let orders = checkout
        .orders_for(buyer, Pagination::default())
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id(), order.id());
}

#[tokio::test]
async fn unknown_product_aborts_the_whole_placement() {
    let store = InMemoryStore::new();
    let product = seed_product(&store, 5, 700).await;
    let ghost = ItemRequest {
        product_id: ProductId::new(EntityId::new()),
        quantity: 1,
    };
    let buyer = UserId::new();

    let err = checkout(&store)
        .place_order(buyer, &[item(&product, 1), ghost])
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound));

    let row = store.product(product.id).await.unwrap().unwrap();
    assert_eq!(row.stock, 5);
    assert_eq!(row.version, Version::ZERO);
    assert!(store
        .orders_for(buyer, Pagination::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn empty_request_is_rejected() {
    let store = InMemoryStore::new();
    let err = checkout(&store)
        .place_order(UserId::new(), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn order_price_survives_later_catalog_changes() {
    let store = InMemoryStore::new();
    let product = seed_product(&store, 5, 900).await;
    let seller = product.seller_id;
    let buyer = UserId::new();

    checkout(&store)
        .place_order(buyer, &[item(&product, 2)])
        .await
        .unwrap();

    Catalog::new(store.clone())
        .update(
            seller,
            product.id,
            ProductUpdate {
                name: product.name.clone(),
                description: product.description.clone(),
                price: 9_900,
                stock: 3,
                category: product.category.clone(),
                image_url: None,
            },
        )
        .await
        .unwrap();

    let orders = store
        .orders_for(buyer, Pagination::default())
        .await
        .unwrap();
    assert_eq!(orders[0].lines()[0].unit_price, 900);
    assert_eq!(orders[0].total(), 1_800);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn versions_are_gapless_under_contention_with_caller_retry() {
    let store = InMemoryStore::new();
    let product = seed_product(&store, 8, 100).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let checkout = checkout(&store);
        let request = vec![item(&product, 1)];
        handles.push(tokio::spawn(async move {
            let buyer = UserId::new();
            loop {
                match checkout.place_order(buyer, &request).await {
                    Ok(order) => break order,
                    // A conflict means "someone else committed first"; the
                    // caller is free to re-issue the whole placement.
                    Err(ServiceError::Conflict(_)) => continue,
                    Err(other) => panic!("unexpected error: {other:?}"),
                }
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    let row = store.product(product.id).await.unwrap().unwrap();
    assert_eq!(row.stock, 0);
    // Eight committed decrements, eight version increments, no gaps.
    assert_eq!(row.version, Version::new(8));
}

#[tokio::test]
async fn conflicted_placement_can_be_reissued_and_commits_exactly_once() {
    let store = InMemoryStore::new();
    let product = seed_product(&store, 5, 400).await;
    let buyer = UserId::new();

    // A competing commit with the same observed version: the loser sees a
    // conflict and nothing of its attempt is visible.
    let reservation = product.reserve(1, product.version).unwrap();
    let competing = Order::new(
        OrderId::new(EntityId::new()),
        UserId::new(),
        vec![OrderLine::freeze(&product, 1).unwrap()],
        Utc::now(),
    )
    .unwrap();
    store
        .commit_order(competing, vec![reservation.clone()])
        .await
        .unwrap();

    let stale = Order::new(
        OrderId::new(EntityId::new()),
        buyer,
        vec![OrderLine::freeze(&product, 1).unwrap()],
        Utc::now(),
    )
    .unwrap();
    let err = store
        .commit_order(stale, vec![reservation])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
    assert!(store
        .orders_for(buyer, Pagination::default())
        .await
        .unwrap()
        .is_empty());

    // Re-issuing the whole placement reads fresh state and commits once.
    checkout(&store)
        .place_order(buyer, &[item(&product, 1)])
        .await
        .unwrap();

    let orders = store
        .orders_for(buyer, Pagination::default())
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
    let row = store.product(product.id).await.unwrap().unwrap();
    assert_eq!(row.stock, 3);
    assert_eq!(row.version, Version::new(2));
}

#[tokio::test]
async fn repeated_product_in_one_request_is_accounted_per_line() {
    let store = InMemoryStore::new();
    let product = seed_product(&store, 5, 250).await;
    let buyer = UserId::new();

    let order = checkout(&store)
        .place_order(buyer, &[item(&product, 2), item(&product, 2)])
        .await
        .unwrap();
    assert_eq!(order.lines().len(), 2);

    let row = store.product(product.id).await.unwrap().unwrap();
    assert_eq!(row.stock, 1);
    assert_eq!(row.version, Version::new(2));

    // And when the combined quantity cannot be satisfied, nothing commits.
    let err = checkout(&store)
        .place_order(buyer, &[item(&product, 1), item(&product, 1)])
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientStock(_)));

    let row = store.product(product.id).await.unwrap().unwrap();
    assert_eq!(row.stock, 1);
    assert_eq!(row.version, Version::new(2));
}

#[tokio::test]
async fn cart_reconciliation_touches_only_ordered_products() {
    let store = InMemoryStore::new();
    let ordered = seed_product(&store, 3, 100).await;
    let kept = seed_product(&store, 3, 200).await;
    let buyer = UserId::new();
    let cart = CartService::new(store.clone());

    cart.add_item(buyer, ordered.id, 1).await.unwrap();
    cart.add_item(buyer, kept.id, 2).await.unwrap();

    // Ordering without a cart entry must also work; the entry for `ordered`
    // exists here, the one for a direct purchase would simply be absent.
    checkout(&store)
        .place_order(buyer, &[item(&ordered, 1)])
        .await
        .unwrap();

    let remaining = cart.items(buyer).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].product_id, kept.id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn placements_on_disjoint_products_do_not_disturb_each_other() {
    let store = InMemoryStore::new();
    let p1 = seed_product(&store, 4, 100).await;
    let p2 = seed_product(&store, 4, 100).await;

    let first = {
        let checkout = checkout(&store);
        let request = vec![item(&p1, 4)];
        tokio::spawn(async move { checkout.place_order(UserId::new(), &request).await })
    };
    let second = {
        let checkout = checkout(&store);
        let request = vec![item(&p2, 4)];
        tokio::spawn(async move { checkout.place_order(UserId::new(), &request).await })
    };

    assert!(first.await.unwrap().is_ok());
    assert!(second.await.unwrap().is_ok());

    for id in [p1.id, p2.id] {
        let row = store.product(id).await.unwrap().unwrap();
        assert_eq!(row.stock, 0);
        assert_eq!(row.version, Version::new(1));
    }
}

#[tokio::test]
async fn listing_filters_and_pages_like_the_catalog_promises() {
    let store = InMemoryStore::new();
    seed_product(&store, 1, 500).await;
    seed_product(&store, 1, 1_500).await;
    seed_product(&store, 1, 2_500).await;

    let catalog = Catalog::new(store.clone());
    let filter = ProductFilter {
        category: Some("kitchen".to_string()),
        min_price: Some(1_000),
        max_price: Some(2_000),
    };
    let listed = catalog
        .list(&filter, Pagination::default())
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].price, 1_500);

    let paged = catalog
        .list(&ProductFilter::default(), Pagination::page(1, 2))
        .await
        .unwrap();
    assert_eq!(paged.len(), 1);
}

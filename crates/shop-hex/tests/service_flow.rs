use shop_hex::application::category_service::CategoryService;
use shop_hex::application::order_service::OrderService;
use shop_repo::memory::MemoryStore;
use shop_types::domain::category::Category;
use shop_types::domain::order::{OrderDetail, OrderHeader, OrderStatus, PaymentStatus};
use shop_types::ports::order_repository::OrderHeaderInclude;
use shop_types::ports::unit_of_work::{UnitOfWork, UnitOfWorkFactory};
use uuid::Uuid;

// End-to-end admin flow against the in-memory store.
#[tokio::test]
async fn category_catalogue_flow() {
    let store = MemoryStore::new();
    let svc = CategoryService::new(store);

    let mut draft = Category::new("Fruits".into(), 1).unwrap();
    draft.id = Uuid::nil();
    let created = svc.create_update(draft).await.unwrap();
    assert!(!created.category.id.is_nil());

    let mut category = created.category;
    category.rename("Dried Fruits".into(), 5);
    svc.create_update(category.clone()).await.unwrap();

    let listed = svc.list().await.unwrap();
    assert_eq!(listed.categories.len(), 1);
    assert_eq!(listed.categories[0].name, "Dried Fruits");

    svc.delete(category.id).await.unwrap();
    assert!(svc.list().await.unwrap().categories.is_empty());
}

#[tokio::test]
async fn order_fulfillment_flow() {
    let store = MemoryStore::new();

    let mut header = OrderHeader::new("Eve".into(), "eve@example.com".into()).unwrap();
    header.payment_status = PaymentStatus::Approved;
    let detail = OrderDetail::new(header.id, "Gadget".into(), 3, 700).unwrap();
    header.recalculate_total(std::slice::from_ref(&detail));

    let uow = store.begin().await.unwrap();
    uow.order_headers().add(header.clone()).await.unwrap();
    uow.order_details().add(detail).await.unwrap();
    uow.save().await.unwrap();

    let svc = OrderService::new(store);

    let vm = svc.order_details(header.id).await.unwrap();
    assert_eq!(vm.order_header.order_total_cents, 2100);
    assert_eq!(vm.order_details.len(), 1);

    svc.set_to_in_process(header.id).await.unwrap();
    let listed = svc
        .list(Some(OrderStatus::InProcess), OrderHeaderInclude::Details)
        .await
        .unwrap();
    assert_eq!(listed.orders.len(), 1);
    assert_eq!(listed.orders[0].details.len(), 1);

    svc.set_to_shipped(header.id, "DHL".into(), "TRACK-7".into())
        .await
        .unwrap();
    let vm = svc.order_details(header.id).await.unwrap();
    assert_eq!(vm.order_header.order_status, OrderStatus::Shipped);
    assert_eq!(vm.order_header.carrier.as_deref(), Some("DHL"));
}

///  To run :
///  cargo r --example admin_console
use shop_client::{AdminClient, ShipOrderRequest, UpsertCategoryRequest};
use shop_hex::application::category_service::CategoryService;
use shop_hex::application::order_service::OrderService;
use shop_hex::inbound::http::{HttpServer, HttpServerConfig};
use shop_repo::build_store;
use shop_types::domain::order::{OrderDetail, OrderHeader, OrderStatus, PaymentStatus};
use shop_types::ports::unit_of_work::{UnitOfWork, UnitOfWorkFactory};
use tempfile::tempdir;

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Start server on an ephemeral port.
    let port = find_free_port();
    let addr = format!("http://127.0.0.1:{port}/");

    // Use a temp file-backed SQLite DB so multiple connections see the same data.
    let tmp = tempdir()?;
    let db_path = tmp.path().join("shopadmin.db");
    let db_url = format!("sqlite://{}", db_path.display());

    let store = build_store(Some(&db_url)).await?;

    // Seed one paid order the way the storefront would have left it.
    let mut header = OrderHeader::new("Demo Customer".into(), "demo@example.com".into())?;
    header.payment_status = PaymentStatus::Approved;
    let detail = OrderDetail::new(header.id, "Espresso Beans 1kg".into(), 2, 1850)?;
    header.recalculate_total(std::slice::from_ref(&detail));
    let order_id = header.id.to_string();

    let uow = store.begin().await?;
    uow.order_headers().add(header).await?;
    uow.order_details().add(detail).await?;
    uow.save().await?;

    let categories = CategoryService::new(store.clone());
    let orders = OrderService::new(store);
    let server = HttpServer::new(
        categories,
        orders,
        HttpServerConfig {
            port: port.to_string(),
        },
    )
    .await?;

    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    // Drive the admin API with the client.
    let client = AdminClient::new(&addr)?;

    let category = client
        .upsert_category(UpsertCategoryRequest {
            id: None,
            name: "Coffee".into(),
            display_order: 1,
        })
        .await?;
    println!("Created category id={} name={}", category.id, category.name);

    let listed = client.list_categories().await?;
    println!("Catalogue has {} categories", listed.len());

    let order = client.order_details(&order_id).await?;
    println!(
        "Order {} total_cents={} lines={}",
        order.order_header.id,
        order.order_header.order_total_cents,
        order.order_details.len()
    );

    client.start_processing(&order_id).await?;
    client
        .ship_order(
            &order_id,
            ShipOrderRequest {
                carrier: "DHL".into(),
                tracking_number: "TRACK-1234".into(),
            },
        )
        .await?;

    let shipped = client.list_orders(Some(OrderStatus::Shipped), true).await?;
    println!("Shipped orders: {}", shipped.len());
    assert_eq!(shipped.len(), 1);
    assert_eq!(shipped[0].carrier.as_deref(), Some("DHL"));

    // A captured payment cannot be cancelled from the admin surface.
    match client.cancel_order(&order_id).await {
        Ok(()) => println!("Cancelled order"),
        Err(err) => println!("Cancellation refused: {err}"),
    }

    handle.abort();
    Ok(())
}

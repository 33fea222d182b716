use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    serve, Json, Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::application::category_service::CategoryService;
use crate::application::order_service::OrderService;
use crate::application::view_models::{CategoryListVm, CategoryVm, OrderListVm, OrderVm};
use crate::errors::AppError;
use shop_types::domain::category::Category;
use shop_types::domain::order::OrderStatus;
use shop_types::ports::order_repository::OrderHeaderInclude;
use shop_types::ports::unit_of_work::UnitOfWorkFactory;

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
}

pub struct AdminState<F: UnitOfWorkFactory> {
    pub categories: CategoryService<F>,
    pub orders: OrderService<F>,
}

#[derive(Clone)]
pub struct HttpServer<F: UnitOfWorkFactory> {
    pub state: Arc<AdminState<F>>,
    pub config: HttpServerConfig,
}

#[derive(Deserialize)]
pub struct UpsertCategoryRequest {
    pub id: Option<Uuid>,
    pub name: String,
    pub display_order: i32,
}

#[derive(Deserialize)]
pub struct ListOrdersParams {
    pub status: Option<OrderStatus>,
    pub include: Option<String>,
}

#[derive(Deserialize)]
pub struct ShipOrderRequest {
    pub carrier: String,
    pub tracking_number: String,
}

#[derive(Deserialize)]
pub struct UpdateOrderInfoRequest {
    pub customer_name: String,
    pub email: String,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
}

impl<F> HttpServer<F>
where
    F: UnitOfWorkFactory + Send + Sync + 'static,
{
    pub async fn new(
        categories: CategoryService<F>,
        orders: OrderService<F>,
        config: HttpServerConfig,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            state: Arc::new(AdminState { categories, orders }),
            config,
        })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_request(
                |request: &axum::extract::Request<_>, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        method = %request.method(),
                        uri = %request.uri(),
                        "request"
                    );
                },
            )
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        let state = self.state.clone();
        let app = Router::new()
            .route("/health", get(health))
            .route("/categories", get(list_categories::<F>))
            .route("/categories", post(upsert_category::<F>))
            .route("/categories/{id}", get(get_category::<F>))
            .route("/categories/{id}", delete(delete_category::<F>))
            .route("/orders", get(list_orders::<F>))
            .route("/orders/{id}", get(order_details::<F>))
            .route("/orders/{id}/processing", post(set_to_in_process::<F>))
            .route("/orders/{id}/shipment", post(set_to_shipped::<F>))
            .route("/orders/{id}/cancellation", post(set_to_cancel::<F>))
            .route("/orders/{id}/info", put(update_order_info::<F>))
            .layer(trace_layer)
            .with_state(state);

        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!("starting server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}

async fn health() -> (axum::http::StatusCode, Json<serde_json::Value>) {
    (
        axum::http::StatusCode::OK,
        Json(serde_json::json!({ "status": "ok" })),
    )
}

fn parse_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|e| AppError::BadRequest(e.to_string()))
}

async fn list_categories<F>(
    State(state): State<Arc<AdminState<F>>>,
) -> Result<Json<CategoryListVm>, AppError>
where
    F: UnitOfWorkFactory + Send + Sync + 'static,
{
    let vm = state.categories.list().await?;
    Ok(Json(vm))
}

async fn get_category<F>(
    State(state): State<Arc<AdminState<F>>>,
    Path(id): Path<String>,
) -> Result<Json<CategoryVm>, AppError>
where
    F: UnitOfWorkFactory + Send + Sync + 'static,
{
    let id = parse_id(&id)?;
    let vm = state.categories.get(id).await?;
    Ok(Json(vm))
}

async fn upsert_category<F>(
    State(state): State<Arc<AdminState<F>>>,
    Json(payload): Json<UpsertCategoryRequest>,
) -> Result<Json<CategoryVm>, AppError>
where
    F: UnitOfWorkFactory + Send + Sync + 'static,
{
    let mut category = Category::new(payload.name, payload.display_order)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    // An absent id marks an entity without identity; the service picks
    // the add branch for it.
    category.id = payload.id.unwrap_or_else(Uuid::nil);
    let vm = state.categories.create_update(category).await?;
    Ok(Json(vm))
}

async fn delete_category<F>(
    State(state): State<Arc<AdminState<F>>>,
    Path(id): Path<String>,
) -> Result<axum::http::StatusCode, AppError>
where
    F: UnitOfWorkFactory + Send + Sync + 'static,
{
    let id = parse_id(&id)?;
    state.categories.delete(id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

async fn list_orders<F>(
    State(state): State<Arc<AdminState<F>>>,
    Query(params): Query<ListOrdersParams>,
) -> Result<Json<OrderListVm>, AppError>
where
    F: UnitOfWorkFactory + Send + Sync + 'static,
{
    let include = match params.include.as_deref() {
        Some("details") => OrderHeaderInclude::Details,
        _ => OrderHeaderInclude::None,
    };
    let vm = state.orders.list(params.status, include).await?;
    Ok(Json(vm))
}

async fn order_details<F>(
    State(state): State<Arc<AdminState<F>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderVm>, AppError>
where
    F: UnitOfWorkFactory + Send + Sync + 'static,
{
    let id = parse_id(&id)?;
    let vm = state.orders.order_details(id).await?;
    Ok(Json(vm))
}

async fn set_to_in_process<F>(
    State(state): State<Arc<AdminState<F>>>,
    Path(id): Path<String>,
) -> Result<axum::http::StatusCode, AppError>
where
    F: UnitOfWorkFactory + Send + Sync + 'static,
{
    let id = parse_id(&id)?;
    state.orders.set_to_in_process(id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

async fn set_to_shipped<F>(
    State(state): State<Arc<AdminState<F>>>,
    Path(id): Path<String>,
    Json(payload): Json<ShipOrderRequest>,
) -> Result<axum::http::StatusCode, AppError>
where
    F: UnitOfWorkFactory + Send + Sync + 'static,
{
    let id = parse_id(&id)?;
    state
        .orders
        .set_to_shipped(id, payload.carrier, payload.tracking_number)
        .await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

async fn set_to_cancel<F>(
    State(state): State<Arc<AdminState<F>>>,
    Path(id): Path<String>,
) -> Result<axum::http::StatusCode, AppError>
where
    F: UnitOfWorkFactory + Send + Sync + 'static,
{
    let id = parse_id(&id)?;
    state.orders.set_to_cancel(id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

async fn update_order_info<F>(
    State(state): State<Arc<AdminState<F>>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateOrderInfoRequest>,
) -> Result<axum::http::StatusCode, AppError>
where
    F: UnitOfWorkFactory + Send + Sync + 'static,
{
    let id = parse_id(&id)?;
    state
        .orders
        .update_order_info(
            id,
            payload.customer_name,
            payload.email,
            payload.carrier,
            payload.tracking_number,
        )
        .await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

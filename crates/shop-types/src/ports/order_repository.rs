use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::order::{OrderDetail, OrderHeader, OrderStatus, PaymentStatus};
use crate::ports::RepoError;

/// Related rows that can be fetched together with an order header.
///
/// Typed replacement for a free-text eager-load list: the only relation a
/// header has is its detail lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderHeaderInclude {
    /// Header row only; `details` stays empty.
    #[default]
    None,
    /// Also load the order's detail lines.
    Details,
}

/// Column filters for order header reads. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct OrderHeaderQuery {
    pub id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

impl OrderHeaderQuery {
    pub fn by_id(id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_payment_status(mut self, payment_status: PaymentStatus) -> Self {
        self.payment_status = Some(payment_status);
        self
    }
}

/// Column filters for detail-line reads.
#[derive(Debug, Clone, Default)]
pub struct OrderDetailQuery {
    pub order_header_id: Option<Uuid>,
}

impl OrderDetailQuery {
    pub fn for_order(order_header_id: Uuid) -> Self {
        Self {
            order_header_id: Some(order_header_id),
        }
    }
}

/// Gateway for order headers.
///
/// Same staging contract as [`crate::ports::category_repository::CategoryRepository`];
/// `update_status` is a targeted partial update that bypasses the
/// full-entity `update`.
#[async_trait]
pub trait OrderHeaderRepository: Send + Sync {
    /// Matching headers, in insertion order.
    async fn get_all(
        &self,
        query: OrderHeaderQuery,
        include: OrderHeaderInclude,
    ) -> Result<Vec<OrderHeader>, RepoError>;
    /// First header matching the query, if any.
    async fn get(
        &self,
        query: OrderHeaderQuery,
        include: OrderHeaderInclude,
    ) -> Result<Option<OrderHeader>, RepoError>;
    async fn add(&self, header: OrderHeader) -> Result<(), RepoError>;
    async fn update(&self, header: OrderHeader) -> Result<(), RepoError>;
    async fn delete(&self, header: OrderHeader) -> Result<(), RepoError>;
    /// Stage a status change for one order. `None` leaves the payment
    /// status untouched. Unknown ids are skipped at commit rather than
    /// failing it.
    async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        payment_status: Option<PaymentStatus>,
    ) -> Result<(), RepoError>;
}

/// Gateway for order detail lines.
#[async_trait]
pub trait OrderDetailRepository: Send + Sync {
    /// Matching detail lines, in insertion order.
    async fn get_all(&self, query: OrderDetailQuery) -> Result<Vec<OrderDetail>, RepoError>;
    async fn get(&self, id: Uuid) -> Result<Option<OrderDetail>, RepoError>;
    async fn add(&self, detail: OrderDetail) -> Result<(), RepoError>;
    async fn update(&self, detail: OrderDetail) -> Result<(), RepoError>;
    async fn delete(&self, detail: OrderDetail) -> Result<(), RepoError>;
}

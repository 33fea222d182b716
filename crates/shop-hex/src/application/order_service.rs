use uuid::Uuid;

use crate::application::repo_error;
use crate::application::view_models::{OrderListVm, OrderVm};
use crate::errors::AppError;
use shop_types::domain::order::{OrderHeader, OrderStatus, PaymentStatus};
use shop_types::ports::order_repository::{
    OrderDetailQuery, OrderHeaderInclude, OrderHeaderQuery,
};
use shop_types::ports::unit_of_work::{UnitOfWork, UnitOfWorkFactory};

/// Admin operations over orders: read views plus the fulfillment state
/// machine. Each call runs in its own unit of work and saves at most once.
pub struct OrderService<F: UnitOfWorkFactory> {
    uow: F,
}

impl<F: UnitOfWorkFactory> OrderService<F> {
    pub fn new(uow: F) -> Self {
        Self { uow }
    }

    async fn begin(&self) -> Result<F::Uow, AppError> {
        self.uow.begin().await.map_err(repo_error)
    }

    async fn fetch_header(uow: &F::Uow, id: Uuid) -> Result<OrderHeader, AppError> {
        match uow
            .order_headers()
            .get(OrderHeaderQuery::by_id(id), OrderHeaderInclude::None)
            .await
            .map_err(repo_error)?
        {
            Some(header) => Ok(header),
            None => Err(AppError::NotFound(format!("order {}", id))),
        }
    }

    pub async fn list(
        &self,
        status: Option<OrderStatus>,
        include: OrderHeaderInclude,
    ) -> Result<OrderListVm, AppError> {
        let uow = self.begin().await?;
        let mut query = OrderHeaderQuery::default();
        if let Some(status) = status {
            query = query.with_status(status);
        }
        let orders = uow
            .order_headers()
            .get_all(query, include)
            .await
            .map_err(repo_error)?;
        Ok(OrderListVm { orders })
    }

    /// The header plus every detail line belonging to it.
    pub async fn order_details(&self, id: Uuid) -> Result<OrderVm, AppError> {
        let uow = self.begin().await?;
        let order_header = Self::fetch_header(&uow, id).await?;
        let order_details = uow
            .order_details()
            .get_all(OrderDetailQuery::for_order(id))
            .await
            .map_err(repo_error)?;
        Ok(OrderVm {
            order_header,
            order_details,
        })
    }

    /// Move the order to in-process via the targeted status update; the
    /// payment track is untouched.
    pub async fn set_to_in_process(&self, id: Uuid) -> Result<(), AppError> {
        let uow = self.begin().await?;
        uow.order_headers()
            .update_status(id, OrderStatus::InProcess, None)
            .await
            .map_err(repo_error)?;
        uow.save().await.map_err(repo_error)
    }

    /// Record dispatch: overwrite carrier and tracking number, mark the
    /// order shipped, and write the whole header back.
    pub async fn set_to_shipped(
        &self,
        id: Uuid,
        carrier: String,
        tracking_number: String,
    ) -> Result<(), AppError> {
        let uow = self.begin().await?;
        let mut header = Self::fetch_header(&uow, id).await?;
        header.ship(carrier, tracking_number);
        uow.order_headers()
            .update(header)
            .await
            .map_err(repo_error)?;
        uow.save().await.map_err(repo_error)
    }

    /// Cancel an order whose payment has not been captured; anything else
    /// is refused with a conflict.
    pub async fn set_to_cancel(&self, id: Uuid) -> Result<(), AppError> {
        let uow = self.begin().await?;
        let header = Self::fetch_header(&uow, id).await?;
        match header.payment_status {
            PaymentStatus::Pending | PaymentStatus::DelayedPayment => {
                uow.order_headers()
                    .update_status(id, OrderStatus::Cancelled, Some(PaymentStatus::Cancelled))
                    .await
                    .map_err(repo_error)?;
                uow.save().await.map_err(repo_error)
            }
            _ => Err(AppError::Conflict(format!(
                "cannot cancel order {} with payment status {:?}",
                id, header.payment_status
            ))),
        }
    }

    /// Overwrite the customer contact fields; carrier and tracking number
    /// only when supplied.
    pub async fn update_order_info(
        &self,
        id: Uuid,
        customer_name: String,
        email: String,
        carrier: Option<String>,
        tracking_number: Option<String>,
    ) -> Result<(), AppError> {
        let uow = self.begin().await?;
        let mut header = Self::fetch_header(&uow, id).await?;
        header.update_contact(customer_name, email);
        if let Some(carrier) = carrier {
            header.carrier = Some(carrier);
        }
        if let Some(tracking_number) = tracking_number {
            header.tracking_number = Some(tracking_number);
        }
        uow.order_headers()
            .update(header)
            .await
            .map_err(repo_error)?;
        uow.save().await.map_err(repo_error)
    }
}

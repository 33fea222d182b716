use uuid::Uuid;

use shop_types::domain::category::Category;
use shop_types::domain::order::{OrderDetail, OrderHeader, OrderStatus, PaymentStatus};

/// One pending mutation, recorded by a repository and replayed at save time.
///
/// Full updates and deletes of rows that turn out to be missing fail the
/// commit; `SetOrderStatus` of an unknown id is skipped instead.
#[derive(Debug, Clone)]
pub(crate) enum StagedOp {
    AddCategory(Category),
    UpdateCategory(Category),
    DeleteCategory(Uuid),
    AddOrderHeader(OrderHeader),
    UpdateOrderHeader(OrderHeader),
    DeleteOrderHeader(Uuid),
    AddOrderDetail(OrderDetail),
    UpdateOrderDetail(OrderDetail),
    DeleteOrderDetail(Uuid),
    SetOrderStatus {
        id: Uuid,
        status: OrderStatus,
        payment_status: Option<PaymentStatus>,
    },
}

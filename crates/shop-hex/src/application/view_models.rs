//! Response-shaped compositions of domain entities, built fresh per request.

use serde::{Deserialize, Serialize};

use shop_types::domain::category::Category;
use shop_types::domain::order::{OrderDetail, OrderHeader};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryVm {
    pub category: Category,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryListVm {
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderVm {
    pub order_header: OrderHeader,
    pub order_details: Vec<OrderDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderListVm {
    pub orders: Vec<OrderHeader>,
}

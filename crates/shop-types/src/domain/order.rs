use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fulfillment lifecycle of an order.
///
/// Observable transitions: `Pending -> InProcess -> Shipped`, with
/// `Pending -> Cancelled` as the alternate branch. Nothing leaves
/// `Shipped` or `Cancelled`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Approved,
    InProcess,
    Shipped,
    Cancelled,
}

/// Payment progress, tracked independently of fulfillment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Approved,
    /// Invoice terms; nothing captured yet.
    DelayedPayment,
    Rejected,
    Cancelled,
}

/// One line of an order. Product data is denormalized onto the line,
/// so detail rows carry no navigation relations of their own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderDetail {
    pub id: Uuid,
    pub order_header_id: Uuid,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

impl OrderDetail {
    pub fn new(
        order_header_id: Uuid,
        product_name: String,
        quantity: u32,
        unit_price_cents: i64,
    ) -> anyhow::Result<Self> {
        if product_name.trim().is_empty() {
            anyhow::bail!("product_name empty");
        }
        if quantity == 0 {
            anyhow::bail!("quantity must be > 0");
        }
        Ok(Self {
            id: Uuid::new_v4(),
            order_header_id,
            product_name,
            quantity,
            unit_price_cents,
        })
    }

    pub fn line_total_cents(&self) -> i64 {
        (self.quantity as i64) * self.unit_price_cents
    }
}

/// An order as the admin area sees it: customer contact, totals, and the
/// two status tracks plus shipping metadata filled in on dispatch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderHeader {
    pub id: Uuid,
    pub customer_name: String,
    pub email: String,
    pub order_total_cents: i64,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub order_date: DateTime<Utc>,
    pub shipping_date: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    /// Detail lines, populated only when a read eagerly loads them.
    #[serde(default)]
    pub details: Vec<OrderDetail>,
}

impl OrderHeader {
    pub fn new(customer_name: String, email: String) -> anyhow::Result<Self> {
        if customer_name.trim().is_empty() {
            anyhow::bail!("customer_name empty");
        }
        if !email.contains('@') {
            anyhow::bail!("invalid email");
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            customer_name,
            email,
            order_total_cents: 0,
            order_status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            carrier: None,
            tracking_number: None,
            order_date: now,
            shipping_date: None,
            updated_at: now,
            details: Vec::new(),
        })
    }

    pub fn update_status(&mut self, status: OrderStatus) {
        self.order_status = status;
        self.updated_at = Utc::now();
    }

    /// Records dispatch: carrier and tracking number overwrite whatever was
    /// there, status moves to `Shipped` and the shipping date is stamped.
    pub fn ship(&mut self, carrier: String, tracking_number: String) {
        self.carrier = Some(carrier);
        self.tracking_number = Some(tracking_number);
        self.order_status = OrderStatus::Shipped;
        let now = Utc::now();
        self.shipping_date = Some(now);
        self.updated_at = now;
    }

    pub fn update_contact(&mut self, customer_name: String, email: String) {
        self.customer_name = customer_name;
        self.email = email;
        self.updated_at = Utc::now();
    }

    pub fn recalculate_total(&mut self, details: &[OrderDetail]) {
        self.order_total_cents = details.iter().map(OrderDetail::line_total_cents).sum();
    }
}

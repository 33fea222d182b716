use std::time::Duration;

use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use shop_types::domain::category::Category;
use shop_types::domain::order::{OrderDetail, OrderHeader, OrderStatus};

#[derive(Clone)]
pub struct AdminClientBuilder {
    base: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
    client: Option<reqwest::Client>,
}

/// Typed client for the shop admin API.
#[derive(Clone)]
pub struct AdminClient {
    base: Url,
    client: reqwest::Client,
}

impl AdminClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::builder(base_url)?.build()
    }

    pub fn builder(base_url: &str) -> anyhow::Result<AdminClientBuilder> {
        let base = Url::parse(base_url).context("invalid base url")?;
        Ok(AdminClientBuilder {
            base,
            headers: HeaderMap::new(),
            timeout: None,
            client: None,
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base.join(path).context("failed to join url")
    }

    pub async fn list_categories(&self) -> anyhow::Result<Vec<Category>> {
        let res = self
            .client
            .get(self.url("categories")?)
            .send()
            .await?
            .error_for_status()?;
        let body: CategoryListResponse = res.json().await?;
        Ok(body.categories)
    }

    pub async fn get_category(&self, id: &str) -> anyhow::Result<Category> {
        let res = self
            .client
            .get(self.url(&format!("categories/{id}"))?)
            .send()
            .await?
            .error_for_status()?;
        let body: CategoryResponse = res.json().await?;
        Ok(body.category)
    }

    pub async fn upsert_category(&self, req: UpsertCategoryRequest) -> anyhow::Result<Category> {
        let res = self
            .client
            .post(self.url("categories")?)
            .json(&req)
            .send()
            .await?
            .error_for_status()?;
        let body: CategoryResponse = res.json().await?;
        Ok(body.category)
    }

    pub async fn delete_category(&self, id: &str) -> anyhow::Result<()> {
        self.client
            .delete(self.url(&format!("categories/{id}"))?)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn list_orders(
        &self,
        status: Option<OrderStatus>,
        include_details: bool,
    ) -> anyhow::Result<Vec<OrderHeader>> {
        let mut url = self.url("orders")?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(status) = status {
                pairs.append_pair("status", &format!("{:?}", status));
            }
            if include_details {
                pairs.append_pair("include", "details");
            }
        }
        let res = self.client.get(url).send().await?.error_for_status()?;
        let body: OrderListResponse = res.json().await?;
        Ok(body.orders)
    }

    pub async fn order_details(&self, id: &str) -> anyhow::Result<OrderDetailsResponse> {
        let res = self
            .client
            .get(self.url(&format!("orders/{id}"))?)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }

    pub async fn start_processing(&self, id: &str) -> anyhow::Result<()> {
        self.client
            .post(self.url(&format!("orders/{id}/processing"))?)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn ship_order(&self, id: &str, req: ShipOrderRequest) -> anyhow::Result<()> {
        self.client
            .post(self.url(&format!("orders/{id}/shipment"))?)
            .json(&req)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn cancel_order(&self, id: &str) -> anyhow::Result<()> {
        self.client
            .post(self.url(&format!("orders/{id}/cancellation"))?)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn update_order_info(
        &self,
        id: &str,
        req: UpdateOrderInfoRequest,
    ) -> anyhow::Result<()> {
        self.client
            .put(self.url(&format!("orders/{id}/info"))?)
            .json(&req)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

impl AdminClientBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(
        mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> anyhow::Result<Self> {
        let header_name =
            HeaderName::from_bytes(key.as_ref().as_bytes()).context("invalid header name")?;
        let header_value = HeaderValue::from_str(value.as_ref()).context("invalid header value")?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> anyhow::Result<AdminClient> {
        if let Some(client) = self.client {
            return Ok(AdminClient {
                base: self.base,
                client,
            });
        }

        let mut builder = reqwest::Client::builder();
        if !self.headers.is_empty() {
            builder = builder.default_headers(self.headers);
        }
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        Ok(AdminClient {
            base: self.base,
            client,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UpsertCategoryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<uuid::Uuid>,
    pub name: String,
    pub display_order: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ShipOrderRequest {
    pub carrier: String,
    pub tracking_number: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UpdateOrderInfoRequest {
    pub customer_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct CategoryResponse {
    category: Category,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct CategoryListResponse {
    categories: Vec<Category>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct OrderListResponse {
    orders: Vec<OrderHeader>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OrderDetailsResponse {
    pub order_header: OrderHeader,
    pub order_details: Vec<OrderDetail>,
}

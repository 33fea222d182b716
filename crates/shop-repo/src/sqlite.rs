use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use shop_types::domain::category::Category;
use shop_types::domain::order::{OrderDetail, OrderHeader, OrderStatus, PaymentStatus};
use shop_types::ports::category_repository::CategoryRepository;
use shop_types::ports::order_repository::{
    OrderDetailQuery, OrderDetailRepository, OrderHeaderInclude, OrderHeaderQuery,
    OrderHeaderRepository,
};
use shop_types::ports::unit_of_work::{UnitOfWork, UnitOfWorkFactory};
use shop_types::ports::RepoError;

use crate::staging::StagedOp;

/// SQLite-backed store. Cloning shares the connection pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePool::connect_with(options).await?;

        // Run migration from migration file, one statement at a time.
        let ddl = include_str!("../migrations/0001_create_shop_tables.sql");
        for statement in ddl.split(';') {
            if statement.trim().is_empty() {
                continue;
            }
            sqlx::query(statement).execute(&pool).await?;
        }

        Ok(Self { pool })
    }
}

#[async_trait]
impl UnitOfWorkFactory for SqliteStore {
    type Uow = SqliteUnitOfWork;

    async fn begin(&self) -> Result<SqliteUnitOfWork, RepoError> {
        Ok(SqliteUnitOfWork::new(self.pool.clone()))
    }
}

#[derive(FromRow)]
struct DbCategory {
    id: String,
    name: String,
    display_order: i64,
    created_at: String,
    updated_at: String,
}

impl DbCategory {
    fn into_category(self) -> Result<Category, RepoError> {
        Ok(Category {
            id: parse_uuid(&self.id)?,
            name: self.name,
            display_order: self.display_order as i32,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbOrderHeader {
    id: String,
    customer_name: String,
    email: String,
    order_total_cents: i64,
    order_status: String,
    payment_status: String,
    carrier: Option<String>,
    tracking_number: Option<String>,
    order_date: String,
    shipping_date: Option<String>,
    updated_at: String,
}

impl DbOrderHeader {
    fn into_header(self) -> Result<OrderHeader, RepoError> {
        let order_status = match self.order_status.as_str() {
            "Pending" => OrderStatus::Pending,
            "Approved" => OrderStatus::Approved,
            "InProcess" => OrderStatus::InProcess,
            "Shipped" => OrderStatus::Shipped,
            "Cancelled" => OrderStatus::Cancelled,
            _ => OrderStatus::Pending,
        };
        let payment_status = match self.payment_status.as_str() {
            "Pending" => PaymentStatus::Pending,
            "Approved" => PaymentStatus::Approved,
            "DelayedPayment" => PaymentStatus::DelayedPayment,
            "Rejected" => PaymentStatus::Rejected,
            "Cancelled" => PaymentStatus::Cancelled,
            _ => PaymentStatus::Pending,
        };
        let shipping_date = match self.shipping_date {
            Some(s) => Some(parse_timestamp(&s)?),
            None => None,
        };
        Ok(OrderHeader {
            id: parse_uuid(&self.id)?,
            customer_name: self.customer_name,
            email: self.email,
            order_total_cents: self.order_total_cents,
            order_status,
            payment_status,
            carrier: self.carrier,
            tracking_number: self.tracking_number,
            order_date: parse_timestamp(&self.order_date)?,
            shipping_date,
            updated_at: parse_timestamp(&self.updated_at)?,
            details: Vec::new(),
        })
    }
}

#[derive(FromRow)]
struct DbOrderDetail {
    id: String,
    order_header_id: String,
    product_name: String,
    quantity: i64,
    unit_price_cents: i64,
}

impl DbOrderDetail {
    fn into_detail(self) -> Result<OrderDetail, RepoError> {
        Ok(OrderDetail {
            id: parse_uuid(&self.id)?,
            order_header_id: parse_uuid(&self.order_header_id)?,
            product_name: self.product_name,
            quantity: self.quantity as u32,
            unit_price_cents: self.unit_price_cents,
        })
    }
}

fn parse_uuid(s: &str) -> Result<Uuid, RepoError> {
    Uuid::parse_str(s).map_err(|e| RepoError::DbError(e.to_string()))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, RepoError> {
    Ok(DateTime::parse_from_rfc3339(s)
        .map_err(|e| RepoError::DbError(e.to_string()))?
        .with_timezone(&Utc))
}

type Staged = Arc<Mutex<Vec<StagedOp>>>;

fn stage(staged: &Staged, op: StagedOp) -> Result<(), RepoError> {
    lock_staged(staged)?.push(op);
    Ok(())
}

fn lock_staged(staged: &Staged) -> Result<MutexGuard<'_, Vec<StagedOp>>, RepoError> {
    staged
        .lock()
        .map_err(|_| RepoError::DbError("staging buffer poisoned".into()))
}

async fn fetch_details(
    pool: &SqlitePool,
    query: &OrderDetailQuery,
) -> Result<Vec<OrderDetail>, RepoError> {
    let rows: Vec<DbOrderDetail> = match query.order_header_id {
        Some(header_id) => sqlx::query_as(
            "SELECT id, order_header_id, product_name, quantity, unit_price_cents
             FROM order_details WHERE order_header_id = ? ORDER BY rowid",
        )
        .bind(header_id.to_string())
        .fetch_all(pool)
        .await
        .map_err(|e| RepoError::DbError(e.to_string()))?,
        None => sqlx::query_as(
            "SELECT id, order_header_id, product_name, quantity, unit_price_cents
             FROM order_details ORDER BY rowid",
        )
        .fetch_all(pool)
        .await
        .map_err(|e| RepoError::DbError(e.to_string()))?,
    };
    rows.into_iter().map(DbOrderDetail::into_detail).collect()
}

async fn fetch_headers(
    pool: &SqlitePool,
    query: &OrderHeaderQuery,
    include: OrderHeaderInclude,
    limit_one: bool,
) -> Result<Vec<OrderHeader>, RepoError> {
    let mut sql = String::from(
        "SELECT id, customer_name, email, order_total_cents, order_status, payment_status,
                carrier, tracking_number, order_date, shipping_date, updated_at
         FROM order_headers WHERE 1=1",
    );
    if query.id.is_some() {
        sql.push_str(" AND id = ?");
    }
    if query.status.is_some() {
        sql.push_str(" AND order_status = ?");
    }
    if query.payment_status.is_some() {
        sql.push_str(" AND payment_status = ?");
    }
    sql.push_str(" ORDER BY rowid");
    if limit_one {
        sql.push_str(" LIMIT 1");
    }

    let mut q = sqlx::query_as::<_, DbOrderHeader>(&sql);
    if let Some(id) = query.id {
        q = q.bind(id.to_string());
    }
    if let Some(status) = &query.status {
        q = q.bind(format!("{:?}", status));
    }
    if let Some(payment_status) = &query.payment_status {
        q = q.bind(format!("{:?}", payment_status));
    }

    let rows = q
        .fetch_all(pool)
        .await
        .map_err(|e| RepoError::DbError(e.to_string()))?;
    let mut headers = rows
        .into_iter()
        .map(DbOrderHeader::into_header)
        .collect::<Result<Vec<_>, _>>()?;

    if include == OrderHeaderInclude::Details {
        for header in &mut headers {
            header.details = fetch_details(pool, &OrderDetailQuery::for_order(header.id)).await?;
        }
    }
    Ok(headers)
}

pub struct SqliteCategoryRepo {
    pool: SqlitePool,
    staged: Staged,
}

#[async_trait]
impl CategoryRepository for SqliteCategoryRepo {
    async fn get_all(&self) -> Result<Vec<Category>, RepoError> {
        let rows: Vec<DbCategory> = sqlx::query_as(
            "SELECT id, name, display_order, created_at, updated_at
             FROM categories ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::DbError(e.to_string()))?;
        rows.into_iter().map(DbCategory::into_category).collect()
    }

    async fn get(&self, id: Uuid) -> Result<Option<Category>, RepoError> {
        let row: Option<DbCategory> = sqlx::query_as(
            "SELECT id, name, display_order, created_at, updated_at
             FROM categories WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::DbError(e.to_string()))?;
        row.map(DbCategory::into_category).transpose()
    }

    async fn add(&self, category: Category) -> Result<(), RepoError> {
        stage(&self.staged, StagedOp::AddCategory(category))
    }

    async fn update(&self, category: Category) -> Result<(), RepoError> {
        stage(&self.staged, StagedOp::UpdateCategory(category))
    }

    async fn delete(&self, category: Category) -> Result<(), RepoError> {
        stage(&self.staged, StagedOp::DeleteCategory(category.id))
    }
}

pub struct SqliteOrderHeaderRepo {
    pool: SqlitePool,
    staged: Staged,
}

#[async_trait]
impl OrderHeaderRepository for SqliteOrderHeaderRepo {
    async fn get_all(
        &self,
        query: OrderHeaderQuery,
        include: OrderHeaderInclude,
    ) -> Result<Vec<OrderHeader>, RepoError> {
        fetch_headers(&self.pool, &query, include, false).await
    }

    async fn get(
        &self,
        query: OrderHeaderQuery,
        include: OrderHeaderInclude,
    ) -> Result<Option<OrderHeader>, RepoError> {
        Ok(fetch_headers(&self.pool, &query, include, true)
            .await?
            .into_iter()
            .next())
    }

    async fn add(&self, header: OrderHeader) -> Result<(), RepoError> {
        stage(&self.staged, StagedOp::AddOrderHeader(header))
    }

    async fn update(&self, header: OrderHeader) -> Result<(), RepoError> {
        stage(&self.staged, StagedOp::UpdateOrderHeader(header))
    }

    async fn delete(&self, header: OrderHeader) -> Result<(), RepoError> {
        stage(&self.staged, StagedOp::DeleteOrderHeader(header.id))
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        payment_status: Option<PaymentStatus>,
    ) -> Result<(), RepoError> {
        stage(
            &self.staged,
            StagedOp::SetOrderStatus {
                id,
                status,
                payment_status,
            },
        )
    }
}

pub struct SqliteOrderDetailRepo {
    pool: SqlitePool,
    staged: Staged,
}

#[async_trait]
impl OrderDetailRepository for SqliteOrderDetailRepo {
    async fn get_all(&self, query: OrderDetailQuery) -> Result<Vec<OrderDetail>, RepoError> {
        fetch_details(&self.pool, &query).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<OrderDetail>, RepoError> {
        let row: Option<DbOrderDetail> = sqlx::query_as(
            "SELECT id, order_header_id, product_name, quantity, unit_price_cents
             FROM order_details WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::DbError(e.to_string()))?;
        row.map(DbOrderDetail::into_detail).transpose()
    }

    async fn add(&self, detail: OrderDetail) -> Result<(), RepoError> {
        stage(&self.staged, StagedOp::AddOrderDetail(detail))
    }

    async fn update(&self, detail: OrderDetail) -> Result<(), RepoError> {
        stage(&self.staged, StagedOp::UpdateOrderDetail(detail))
    }

    async fn delete(&self, detail: OrderDetail) -> Result<(), RepoError> {
        stage(&self.staged, StagedOp::DeleteOrderDetail(detail.id))
    }
}

/// One request's unit of work: reads go straight to the pool, writes are
/// staged and committed inside a single transaction by `save`.
pub struct SqliteUnitOfWork {
    pool: SqlitePool,
    staged: Staged,
    categories: SqliteCategoryRepo,
    order_headers: SqliteOrderHeaderRepo,
    order_details: SqliteOrderDetailRepo,
}

impl SqliteUnitOfWork {
    fn new(pool: SqlitePool) -> Self {
        let staged: Staged = Arc::new(Mutex::new(Vec::new()));
        Self {
            categories: SqliteCategoryRepo {
                pool: pool.clone(),
                staged: staged.clone(),
            },
            order_headers: SqliteOrderHeaderRepo {
                pool: pool.clone(),
                staged: staged.clone(),
            },
            order_details: SqliteOrderDetailRepo {
                pool: pool.clone(),
                staged: staged.clone(),
            },
            pool,
            staged,
        }
    }
}

#[async_trait]
impl UnitOfWork for SqliteUnitOfWork {
    fn categories(&self) -> &dyn CategoryRepository {
        &self.categories
    }

    fn order_headers(&self) -> &dyn OrderHeaderRepository {
        &self.order_headers
    }

    fn order_details(&self) -> &dyn OrderDetailRepository {
        &self.order_details
    }

    async fn save(&self) -> Result<(), RepoError> {
        let ops: Vec<StagedOp> = lock_staged(&self.staged)?.drain(..).collect();
        if ops.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::DbError(e.to_string()))?;

        // Returning early drops the transaction, rolling everything back.
        for op in ops {
            match op {
                StagedOp::AddCategory(c) => {
                    sqlx::query(
                        "INSERT INTO categories (id, name, display_order, created_at, updated_at)
                         VALUES (?, ?, ?, ?, ?)",
                    )
                    .bind(c.id.to_string())
                    .bind(&c.name)
                    .bind(c.display_order as i64)
                    .bind(c.created_at.to_rfc3339())
                    .bind(c.updated_at.to_rfc3339())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| RepoError::DbError(e.to_string()))?;
                }
                StagedOp::UpdateCategory(c) => {
                    let res = sqlx::query(
                        "UPDATE categories SET name = ?, display_order = ?, updated_at = ?
                         WHERE id = ?",
                    )
                    .bind(&c.name)
                    .bind(c.display_order as i64)
                    .bind(c.updated_at.to_rfc3339())
                    .bind(c.id.to_string())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| RepoError::DbError(e.to_string()))?;
                    if res.rows_affected() == 0 {
                        return Err(RepoError::RowNotFound(c.id));
                    }
                }
                StagedOp::DeleteCategory(id) => {
                    let res = sqlx::query("DELETE FROM categories WHERE id = ?")
                        .bind(id.to_string())
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| RepoError::DbError(e.to_string()))?;
                    if res.rows_affected() == 0 {
                        return Err(RepoError::RowNotFound(id));
                    }
                }
                StagedOp::AddOrderHeader(h) => {
                    sqlx::query(
                        "INSERT INTO order_headers (id, customer_name, email, order_total_cents,
                            order_status, payment_status, carrier, tracking_number, order_date,
                            shipping_date, updated_at)
                         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    )
                    .bind(h.id.to_string())
                    .bind(&h.customer_name)
                    .bind(&h.email)
                    .bind(h.order_total_cents)
                    .bind(format!("{:?}", h.order_status))
                    .bind(format!("{:?}", h.payment_status))
                    .bind(&h.carrier)
                    .bind(&h.tracking_number)
                    .bind(h.order_date.to_rfc3339())
                    .bind(h.shipping_date.map(|d| d.to_rfc3339()))
                    .bind(h.updated_at.to_rfc3339())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| RepoError::DbError(e.to_string()))?;
                }
                StagedOp::UpdateOrderHeader(h) => {
                    let res = sqlx::query(
                        "UPDATE order_headers SET customer_name = ?, email = ?,
                            order_total_cents = ?, order_status = ?, payment_status = ?,
                            carrier = ?, tracking_number = ?, shipping_date = ?, updated_at = ?
                         WHERE id = ?",
                    )
                    .bind(&h.customer_name)
                    .bind(&h.email)
                    .bind(h.order_total_cents)
                    .bind(format!("{:?}", h.order_status))
                    .bind(format!("{:?}", h.payment_status))
                    .bind(&h.carrier)
                    .bind(&h.tracking_number)
                    .bind(h.shipping_date.map(|d| d.to_rfc3339()))
                    .bind(h.updated_at.to_rfc3339())
                    .bind(h.id.to_string())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| RepoError::DbError(e.to_string()))?;
                    if res.rows_affected() == 0 {
                        return Err(RepoError::RowNotFound(h.id));
                    }
                }
                StagedOp::DeleteOrderHeader(id) => {
                    let res = sqlx::query("DELETE FROM order_headers WHERE id = ?")
                        .bind(id.to_string())
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| RepoError::DbError(e.to_string()))?;
                    if res.rows_affected() == 0 {
                        return Err(RepoError::RowNotFound(id));
                    }
                }
                StagedOp::AddOrderDetail(d) => {
                    sqlx::query(
                        "INSERT INTO order_details (id, order_header_id, product_name,
                            quantity, unit_price_cents)
                         VALUES (?, ?, ?, ?, ?)",
                    )
                    .bind(d.id.to_string())
                    .bind(d.order_header_id.to_string())
                    .bind(&d.product_name)
                    .bind(d.quantity as i64)
                    .bind(d.unit_price_cents)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| RepoError::DbError(e.to_string()))?;
                }
                StagedOp::UpdateOrderDetail(d) => {
                    let res = sqlx::query(
                        "UPDATE order_details SET order_header_id = ?, product_name = ?,
                            quantity = ?, unit_price_cents = ?
                         WHERE id = ?",
                    )
                    .bind(d.order_header_id.to_string())
                    .bind(&d.product_name)
                    .bind(d.quantity as i64)
                    .bind(d.unit_price_cents)
                    .bind(d.id.to_string())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| RepoError::DbError(e.to_string()))?;
                    if res.rows_affected() == 0 {
                        return Err(RepoError::RowNotFound(d.id));
                    }
                }
                StagedOp::DeleteOrderDetail(id) => {
                    let res = sqlx::query("DELETE FROM order_details WHERE id = ?")
                        .bind(id.to_string())
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| RepoError::DbError(e.to_string()))?;
                    if res.rows_affected() == 0 {
                        return Err(RepoError::RowNotFound(id));
                    }
                }
                StagedOp::SetOrderStatus {
                    id,
                    status,
                    payment_status,
                } => {
                    let now = Utc::now().to_rfc3339();
                    match payment_status {
                        Some(p) => {
                            sqlx::query(
                                "UPDATE order_headers SET order_status = ?, payment_status = ?,
                                    updated_at = ?
                                 WHERE id = ?",
                            )
                            .bind(format!("{:?}", status))
                            .bind(format!("{:?}", p))
                            .bind(now)
                            .bind(id.to_string())
                            .execute(&mut *tx)
                            .await
                            .map_err(|e| RepoError::DbError(e.to_string()))?;
                        }
                        None => {
                            sqlx::query(
                                "UPDATE order_headers SET order_status = ?, updated_at = ?
                                 WHERE id = ?",
                            )
                            .bind(format!("{:?}", status))
                            .bind(now)
                            .bind(id.to_string())
                            .execute(&mut *tx)
                            .await
                            .map_err(|e| RepoError::DbError(e.to_string()))?;
                        }
                    }
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| RepoError::DbError(e.to_string()))
    }
}

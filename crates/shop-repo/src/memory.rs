use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use dashmap::DashMap;
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

struct Row<T> {
    seq: u64,
    value: T,
}

/// Committed state shared by every unit of work minted from one store.
/// `seq` is a monotonic insertion counter; listings sort by it so that
/// read order matches write order. Updates keep the original seq.
#[derive(Default)]
struct MemTables {
    categories: DashMap<Uuid, Row<Category>>,
    headers: DashMap<Uuid, Row<OrderHeader>>,
    details: DashMap<Uuid, Row<OrderDetail>>,
    seq: AtomicU64,
}

impl MemTables {
    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Validate every staged op against current state, then apply.
    /// Validation tracks ids added or deleted earlier in the same batch,
    /// so nothing is written unless the whole batch can land.
    fn commit(&self, ops: Vec<StagedOp>) -> Result<(), RepoError> {
        let mut category_ids: HashSet<Uuid> = self.categories.iter().map(|r| *r.key()).collect();
        let mut header_ids: HashSet<Uuid> = self.headers.iter().map(|r| *r.key()).collect();
        let mut detail_ids: HashSet<Uuid> = self.details.iter().map(|r| *r.key()).collect();

        for op in &ops {
            match op {
                StagedOp::AddCategory(c) => {
                    if !category_ids.insert(c.id) {
                        return Err(RepoError::DbError(format!("duplicate category id {}", c.id)));
                    }
                }
                StagedOp::UpdateCategory(c) => {
                    if !category_ids.contains(&c.id) {
                        return Err(RepoError::RowNotFound(c.id));
                    }
                }
                StagedOp::DeleteCategory(id) => {
                    if !category_ids.remove(id) {
                        return Err(RepoError::RowNotFound(*id));
                    }
                }
                StagedOp::AddOrderHeader(h) => {
                    if !header_ids.insert(h.id) {
                        return Err(RepoError::DbError(format!("duplicate order id {}", h.id)));
                    }
                }
                StagedOp::UpdateOrderHeader(h) => {
                    if !header_ids.contains(&h.id) {
                        return Err(RepoError::RowNotFound(h.id));
                    }
                }
                StagedOp::DeleteOrderHeader(id) => {
                    if !header_ids.remove(id) {
                        return Err(RepoError::RowNotFound(*id));
                    }
                }
                StagedOp::AddOrderDetail(d) => {
                    if !detail_ids.insert(d.id) {
                        return Err(RepoError::DbError(format!("duplicate detail id {}", d.id)));
                    }
                }
                StagedOp::UpdateOrderDetail(d) => {
                    if !detail_ids.contains(&d.id) {
                        return Err(RepoError::RowNotFound(d.id));
                    }
                }
                StagedOp::DeleteOrderDetail(id) => {
                    if !detail_ids.remove(id) {
                        return Err(RepoError::RowNotFound(*id));
                    }
                }
                StagedOp::SetOrderStatus { .. } => {}
            }
        }

        for op in ops {
            match op {
                StagedOp::AddCategory(c) => {
                    self.categories.insert(
                        c.id,
                        Row {
                            seq: self.next_seq(),
                            value: c,
                        },
                    );
                }
                StagedOp::UpdateCategory(mut c) => {
                    if let Some(mut row) = self.categories.get_mut(&c.id) {
                        // created_at is immutable once committed.
                        c.created_at = row.value.created_at;
                        row.value = c;
                    }
                }
                StagedOp::DeleteCategory(id) => {
                    self.categories.remove(&id);
                }
                StagedOp::AddOrderHeader(mut h) => {
                    // Detail lines live in their own table.
                    h.details = Vec::new();
                    self.headers.insert(
                        h.id,
                        Row {
                            seq: self.next_seq(),
                            value: h,
                        },
                    );
                }
                StagedOp::UpdateOrderHeader(mut h) => {
                    h.details = Vec::new();
                    if let Some(mut row) = self.headers.get_mut(&h.id) {
                        // order_date is immutable once committed.
                        h.order_date = row.value.order_date;
                        row.value = h;
                    }
                }
                StagedOp::DeleteOrderHeader(id) => {
                    self.headers.remove(&id);
                    self.details.retain(|_, row| row.value.order_header_id != id);
                }
                StagedOp::AddOrderDetail(d) => {
                    self.details.insert(
                        d.id,
                        Row {
                            seq: self.next_seq(),
                            value: d,
                        },
                    );
                }
                StagedOp::UpdateOrderDetail(d) => {
                    if let Some(mut row) = self.details.get_mut(&d.id) {
                        row.value = d;
                    }
                }
                StagedOp::DeleteOrderDetail(id) => {
                    self.details.remove(&id);
                }
                StagedOp::SetOrderStatus {
                    id,
                    status,
                    payment_status,
                } => {
                    if let Some(mut row) = self.headers.get_mut(&id) {
                        row.value.update_status(status);
                        if let Some(p) = payment_status {
                            row.value.payment_status = p;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn categories_ordered(&self) -> Vec<Category> {
        let mut rows: Vec<(u64, Category)> = self
            .categories
            .iter()
            .map(|r| (r.seq, r.value.clone()))
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);
        rows.into_iter().map(|(_, c)| c).collect()
    }

    fn headers_ordered(&self, query: &OrderHeaderQuery) -> Vec<OrderHeader> {
        let mut rows: Vec<(u64, OrderHeader)> = self
            .headers
            .iter()
            .filter(|r| header_matches(&r.value, query))
            .map(|r| (r.seq, r.value.clone()))
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);
        rows.into_iter().map(|(_, h)| h).collect()
    }

    fn details_ordered(&self, query: &OrderDetailQuery) -> Vec<OrderDetail> {
        let mut rows: Vec<(u64, OrderDetail)> = self
            .details
            .iter()
            .filter(|r| match query.order_header_id {
                Some(header_id) => r.value.order_header_id == header_id,
                None => true,
            })
            .map(|r| (r.seq, r.value.clone()))
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);
        rows.into_iter().map(|(_, d)| d).collect()
    }

    fn attach_details(&self, header: &mut OrderHeader) {
        header.details = self.details_ordered(&OrderDetailQuery::for_order(header.id));
    }
}

fn header_matches(header: &OrderHeader, query: &OrderHeaderQuery) -> bool {
    if let Some(id) = query.id {
        if header.id != id {
            return false;
        }
    }
    if let Some(status) = &query.status {
        if header.order_status != *status {
            return false;
        }
    }
    if let Some(payment_status) = &query.payment_status {
        if header.payment_status != *payment_status {
            return false;
        }
    }
    true
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

/// In-memory store. Cloning shares the underlying tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<MemTables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UnitOfWorkFactory for MemoryStore {
    type Uow = MemoryUnitOfWork;

    async fn begin(&self) -> Result<MemoryUnitOfWork, RepoError> {
        Ok(MemoryUnitOfWork::new(self.tables.clone()))
    }
}

pub struct MemoryCategoryRepo {
    tables: Arc<MemTables>,
    staged: Staged,
}

#[async_trait]
impl CategoryRepository for MemoryCategoryRepo {
    async fn get_all(&self) -> Result<Vec<Category>, RepoError> {
        Ok(self.tables.categories_ordered())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Category>, RepoError> {
        Ok(self.tables.categories.get(&id).map(|r| r.value.clone()))
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

pub struct MemoryOrderHeaderRepo {
    tables: Arc<MemTables>,
    staged: Staged,
}

#[async_trait]
impl OrderHeaderRepository for MemoryOrderHeaderRepo {
    async fn get_all(
        &self,
        query: OrderHeaderQuery,
        include: OrderHeaderInclude,
    ) -> Result<Vec<OrderHeader>, RepoError> {
        let mut headers = self.tables.headers_ordered(&query);
        if include == OrderHeaderInclude::Details {
            for header in &mut headers {
                self.tables.attach_details(header);
            }
        }
        Ok(headers)
    }

    async fn get(
        &self,
        query: OrderHeaderQuery,
        include: OrderHeaderInclude,
    ) -> Result<Option<OrderHeader>, RepoError> {
        let mut found = self.tables.headers_ordered(&query).into_iter().next();
        if include == OrderHeaderInclude::Details {
            if let Some(header) = &mut found {
                self.tables.attach_details(header);
            }
        }
        Ok(found)
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

pub struct MemoryOrderDetailRepo {
    tables: Arc<MemTables>,
    staged: Staged,
}

#[async_trait]
impl OrderDetailRepository for MemoryOrderDetailRepo {
    async fn get_all(&self, query: OrderDetailQuery) -> Result<Vec<OrderDetail>, RepoError> {
        Ok(self.tables.details_ordered(&query))
    }

    async fn get(&self, id: Uuid) -> Result<Option<OrderDetail>, RepoError> {
        Ok(self.tables.details.get(&id).map(|r| r.value.clone()))
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

/// One request's view of the store: shared committed tables plus a private
/// staging buffer drained by `save`.
pub struct MemoryUnitOfWork {
    tables: Arc<MemTables>,
    staged: Staged,
    categories: MemoryCategoryRepo,
    order_headers: MemoryOrderHeaderRepo,
    order_details: MemoryOrderDetailRepo,
}

impl MemoryUnitOfWork {
    fn new(tables: Arc<MemTables>) -> Self {
        let staged: Staged = Arc::new(Mutex::new(Vec::new()));
        Self {
            categories: MemoryCategoryRepo {
                tables: tables.clone(),
                staged: staged.clone(),
            },
            order_headers: MemoryOrderHeaderRepo {
                tables: tables.clone(),
                staged: staged.clone(),
            },
            order_details: MemoryOrderDetailRepo {
                tables: tables.clone(),
                staged: staged.clone(),
            },
            tables,
            staged,
        }
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
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
        self.tables.commit(ops)
    }
}

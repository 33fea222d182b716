//! Call-contract tests for the admin services, driven through a recording
//! unit-of-work double: each test pins down exactly which repository calls
//! an operation makes and how many times it saves.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use shop_hex::application::category_service::CategoryService;
use shop_hex::application::order_service::OrderService;
use shop_hex::errors::AppError;
use shop_types::domain::category::Category;
use shop_types::domain::order::{OrderDetail, OrderHeader, OrderStatus, PaymentStatus};
use shop_types::ports::category_repository::CategoryRepository;
use shop_types::ports::order_repository::{
    OrderDetailQuery, OrderDetailRepository, OrderHeaderInclude, OrderHeaderQuery,
    OrderHeaderRepository,
};
use shop_types::ports::unit_of_work::{UnitOfWork, UnitOfWorkFactory};
use shop_types::ports::RepoError;

#[derive(Default)]
struct CallLog {
    category_adds: Vec<Category>,
    category_updates: Vec<Category>,
    category_deletes: Vec<Category>,
    header_adds: Vec<OrderHeader>,
    header_updates: Vec<OrderHeader>,
    header_deletes: Vec<OrderHeader>,
    status_updates: Vec<(Uuid, OrderStatus, Option<PaymentStatus>)>,
    detail_writes: usize,
    saves: usize,
}

#[derive(Default)]
struct RecordingState {
    categories: Vec<Category>,
    headers: Vec<OrderHeader>,
    details: Vec<OrderDetail>,
    log: Mutex<CallLog>,
}

struct RecordingCategoryRepo(Arc<RecordingState>);
struct RecordingOrderHeaderRepo(Arc<RecordingState>);
struct RecordingOrderDetailRepo(Arc<RecordingState>);

/// Hand-rolled unit-of-work double: canned rows in, recorded calls out.
struct RecordingUow {
    state: Arc<RecordingState>,
    categories: RecordingCategoryRepo,
    order_headers: RecordingOrderHeaderRepo,
    order_details: RecordingOrderDetailRepo,
}

impl RecordingUow {
    fn new(categories: Vec<Category>, headers: Vec<OrderHeader>, details: Vec<OrderDetail>) -> Self {
        Self::from_state(Arc::new(RecordingState {
            categories,
            headers,
            details,
            log: Mutex::default(),
        }))
    }

    fn from_state(state: Arc<RecordingState>) -> Self {
        Self {
            categories: RecordingCategoryRepo(state.clone()),
            order_headers: RecordingOrderHeaderRepo(state.clone()),
            order_details: RecordingOrderDetailRepo(state.clone()),
            state,
        }
    }

    fn log(&self) -> MutexGuard<'_, CallLog> {
        self.state.log.lock().unwrap()
    }
}

impl Clone for RecordingUow {
    fn clone(&self) -> Self {
        Self::from_state(self.state.clone())
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

#[async_trait]
impl CategoryRepository for RecordingCategoryRepo {
    async fn get_all(&self) -> Result<Vec<Category>, RepoError> {
        Ok(self.0.categories.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Category>, RepoError> {
        Ok(self.0.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn add(&self, category: Category) -> Result<(), RepoError> {
        self.0.log.lock().unwrap().category_adds.push(category);
        Ok(())
    }

    async fn update(&self, category: Category) -> Result<(), RepoError> {
        self.0.log.lock().unwrap().category_updates.push(category);
        Ok(())
    }

    async fn delete(&self, category: Category) -> Result<(), RepoError> {
        self.0.log.lock().unwrap().category_deletes.push(category);
        Ok(())
    }
}

#[async_trait]
impl OrderHeaderRepository for RecordingOrderHeaderRepo {
    async fn get_all(
        &self,
        query: OrderHeaderQuery,
        include: OrderHeaderInclude,
    ) -> Result<Vec<OrderHeader>, RepoError> {
        let mut headers: Vec<OrderHeader> = self
            .0
            .headers
            .iter()
            .filter(|h| header_matches(h, &query))
            .cloned()
            .collect();
        if include == OrderHeaderInclude::Details {
            for header in &mut headers {
                header.details = self
                    .0
                    .details
                    .iter()
                    .filter(|d| d.order_header_id == header.id)
                    .cloned()
                    .collect();
            }
        }
        Ok(headers)
    }

    async fn get(
        &self,
        query: OrderHeaderQuery,
        include: OrderHeaderInclude,
    ) -> Result<Option<OrderHeader>, RepoError> {
        Ok(self.get_all(query, include).await?.into_iter().next())
    }

    async fn add(&self, header: OrderHeader) -> Result<(), RepoError> {
        self.0.log.lock().unwrap().header_adds.push(header);
        Ok(())
    }

    async fn update(&self, header: OrderHeader) -> Result<(), RepoError> {
        self.0.log.lock().unwrap().header_updates.push(header);
        Ok(())
    }

    async fn delete(&self, header: OrderHeader) -> Result<(), RepoError> {
        self.0.log.lock().unwrap().header_deletes.push(header);
        Ok(())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        payment_status: Option<PaymentStatus>,
    ) -> Result<(), RepoError> {
        self.0
            .log
            .lock()
            .unwrap()
            .status_updates
            .push((id, status, payment_status));
        Ok(())
    }
}

#[async_trait]
impl OrderDetailRepository for RecordingOrderDetailRepo {
    async fn get_all(&self, query: OrderDetailQuery) -> Result<Vec<OrderDetail>, RepoError> {
        Ok(self
            .0
            .details
            .iter()
            .filter(|d| match query.order_header_id {
                Some(header_id) => d.order_header_id == header_id,
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<OrderDetail>, RepoError> {
        Ok(self.0.details.iter().find(|d| d.id == id).cloned())
    }

    async fn add(&self, _detail: OrderDetail) -> Result<(), RepoError> {
        self.0.log.lock().unwrap().detail_writes += 1;
        Ok(())
    }

    async fn update(&self, _detail: OrderDetail) -> Result<(), RepoError> {
        self.0.log.lock().unwrap().detail_writes += 1;
        Ok(())
    }

    async fn delete(&self, _detail: OrderDetail) -> Result<(), RepoError> {
        self.0.log.lock().unwrap().detail_writes += 1;
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for RecordingUow {
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
        self.state.log.lock().unwrap().saves += 1;
        Ok(())
    }
}

#[async_trait]
impl UnitOfWorkFactory for RecordingUow {
    type Uow = RecordingUow;

    async fn begin(&self) -> Result<RecordingUow, RepoError> {
        Ok(self.clone())
    }
}

fn category_dataset() -> Vec<Category> {
    vec![
        Category::new("Fruits".into(), 1).unwrap(),
        Category::new("Vegetables".into(), 2).unwrap(),
        Category::new("Beverages".into(), 3).unwrap(),
    ]
}

fn sample_header(payment_status: PaymentStatus) -> OrderHeader {
    let mut header = OrderHeader::new("Alice".into(), "a@b.com".into()).unwrap();
    header.payment_status = payment_status;
    header
}

#[tokio::test]
async fn list_returns_all_categories_in_order() {
    let dataset = category_dataset();
    let uow = RecordingUow::new(dataset.clone(), vec![], vec![]);
    let svc = CategoryService::new(uow.clone());

    let vm = svc.list().await.unwrap();

    assert_eq!(vm.categories, dataset);
    assert_eq!(uow.log().saves, 0);
}

#[tokio::test]
async fn get_returns_category_by_id() {
    let dataset = category_dataset();
    let wanted = dataset[1].clone();
    let uow = RecordingUow::new(dataset, vec![], vec![]);
    let svc = CategoryService::new(uow.clone());

    let vm = svc.get(wanted.id).await.unwrap();

    assert_eq!(vm.category, wanted);
}

#[tokio::test]
async fn create_update_adds_once_when_identity_unset() {
    let mut draft = Category::new("Fruits".into(), 1).unwrap();
    draft.id = Uuid::nil();
    let uow = RecordingUow::new(vec![], vec![], vec![]);
    let svc = CategoryService::new(uow.clone());

    svc.create_update(draft).await.unwrap();

    let log = uow.log();
    assert_eq!(log.category_adds.len(), 1);
    assert!(!log.category_adds[0].id.is_nil());
    assert!(log.category_updates.is_empty());
    assert_eq!(log.saves, 1);
}

#[tokio::test]
async fn create_update_updates_once_when_identity_set() {
    let existing = Category::new("Fruits".into(), 1).unwrap();
    let uow = RecordingUow::new(vec![existing.clone()], vec![], vec![]);
    let svc = CategoryService::new(uow.clone());

    svc.create_update(existing.clone()).await.unwrap();

    let log = uow.log();
    assert_eq!(log.category_updates.len(), 1);
    assert_eq!(log.category_updates[0].id, existing.id);
    assert!(log.category_adds.is_empty());
    assert_eq!(log.saves, 1);
}

#[tokio::test]
async fn delete_removes_matching_category_once() {
    let dataset = category_dataset();
    let target = dataset[0].clone();
    let uow = RecordingUow::new(dataset, vec![], vec![]);
    let svc = CategoryService::new(uow.clone());

    svc.delete(target.id).await.unwrap();

    let log = uow.log();
    assert_eq!(log.category_deletes, vec![target]);
    assert_eq!(log.saves, 1);
}

#[tokio::test]
async fn order_details_returns_header_and_matching_lines() {
    let header = sample_header(PaymentStatus::Pending);
    let other = sample_header(PaymentStatus::Pending);
    let mut details: Vec<OrderDetail> = (0..4)
        .map(|i| OrderDetail::new(header.id, format!("Item {}", i), 1, 100).unwrap())
        .collect();
    let stray = OrderDetail::new(other.id, "Stray".into(), 1, 100).unwrap();
    details.push(stray);

    let uow = RecordingUow::new(vec![], vec![header.clone(), other], details.clone());
    let svc = OrderService::new(uow.clone());

    let vm = svc.order_details(header.id).await.unwrap();

    assert_eq!(vm.order_header, header);
    assert_eq!(vm.order_details, details[..4].to_vec());
    let log = uow.log();
    assert_eq!(log.saves, 0);
    assert_eq!(log.detail_writes, 0);
}

#[tokio::test]
async fn set_to_in_process_targets_status_update_once() {
    let header = sample_header(PaymentStatus::Pending);
    let uow = RecordingUow::new(vec![], vec![header.clone()], vec![]);
    let svc = OrderService::new(uow.clone());

    svc.set_to_in_process(header.id).await.unwrap();

    let log = uow.log();
    assert_eq!(
        log.status_updates,
        vec![(header.id, OrderStatus::InProcess, None)]
    );
    assert!(log.header_updates.is_empty());
    assert_eq!(log.saves, 1);
}

#[tokio::test]
async fn set_to_shipped_full_update_retains_carrier_and_tracking() {
    let header = sample_header(PaymentStatus::Approved);
    let uow = RecordingUow::new(vec![], vec![header.clone()], vec![]);
    let svc = OrderService::new(uow.clone());

    svc.set_to_shipped(header.id, "Test carrier".into(), "Test number".into())
        .await
        .unwrap();

    let log = uow.log();
    assert_eq!(log.header_updates.len(), 1);
    let updated = &log.header_updates[0];
    assert_eq!(updated.id, header.id);
    assert_eq!(updated.order_status, OrderStatus::Shipped);
    assert_eq!(updated.carrier.as_deref(), Some("Test carrier"));
    assert_eq!(updated.tracking_number.as_deref(), Some("Test number"));
    assert!(log.status_updates.is_empty());
    assert_eq!(log.saves, 1);
}

#[tokio::test]
async fn cancel_with_pending_payment_targets_status_update_once() {
    let header = sample_header(PaymentStatus::Pending);
    let uow = RecordingUow::new(vec![], vec![header.clone()], vec![]);
    let svc = OrderService::new(uow.clone());

    svc.set_to_cancel(header.id).await.unwrap();

    let log = uow.log();
    assert_eq!(log.status_updates.len(), 1);
    let (id, status, _) = &log.status_updates[0];
    assert_eq!(*id, header.id);
    assert_eq!(*status, OrderStatus::Cancelled);
    assert_eq!(log.saves, 1);
}

#[tokio::test]
async fn cancel_with_captured_payment_is_refused_without_writes() {
    let header = sample_header(PaymentStatus::Approved);
    let uow = RecordingUow::new(vec![], vec![header.clone()], vec![]);
    let svc = OrderService::new(uow.clone());

    let refused = svc.set_to_cancel(header.id).await;

    assert!(matches!(refused, Err(AppError::Conflict(_))));
    let log = uow.log();
    assert!(log.status_updates.is_empty());
    assert!(log.header_updates.is_empty());
    assert!(log.header_adds.is_empty());
    assert!(log.header_deletes.is_empty());
    assert_eq!(log.saves, 0);
}

use async_trait::async_trait;

use crate::ports::category_repository::CategoryRepository;
use crate::ports::order_repository::{OrderDetailRepository, OrderHeaderRepository};
use crate::ports::RepoError;

/// Request-scoped aggregation of the per-entity repositories.
///
/// All repositories share one staging context; `save` commits every staged
/// operation across them as a single logical write. On failure nothing is
/// applied.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn categories(&self) -> &dyn CategoryRepository;
    fn order_headers(&self) -> &dyn OrderHeaderRepository;
    fn order_details(&self) -> &dyn OrderDetailRepository;
    /// Commit all staged mutations.
    async fn save(&self) -> Result<(), RepoError>;
}

/// Mints a fresh unit of work per request.
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync + 'static {
    type Uow: UnitOfWork;
    async fn begin(&self) -> Result<Self::Uow, RepoError>;
}

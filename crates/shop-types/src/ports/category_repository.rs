use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::category::Category;
use crate::ports::RepoError;

/// Gateway for category rows.
///
/// Reads see committed state only. `add`, `update` and `delete` stage a
/// mutation that becomes visible once the owning unit of work saves.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// All categories, in insertion order.
    async fn get_all(&self) -> Result<Vec<Category>, RepoError>;
    /// The category with the given id, if any.
    async fn get(&self, id: Uuid) -> Result<Option<Category>, RepoError>;
    async fn add(&self, category: Category) -> Result<(), RepoError>;
    async fn update(&self, category: Category) -> Result<(), RepoError>;
    async fn delete(&self, category: Category) -> Result<(), RepoError>;
}

use uuid::Uuid;

use crate::application::repo_error;
use crate::application::view_models::{CategoryListVm, CategoryVm};
use crate::errors::AppError;
use shop_types::domain::category::Category;
use shop_types::ports::unit_of_work::{UnitOfWork, UnitOfWorkFactory};

/// Admin operations over the category catalogue. Each call runs in its own
/// unit of work and saves at most once.
pub struct CategoryService<F: UnitOfWorkFactory> {
    uow: F,
}

impl<F: UnitOfWorkFactory> CategoryService<F> {
    pub fn new(uow: F) -> Self {
        Self { uow }
    }

    async fn begin(&self) -> Result<F::Uow, AppError> {
        self.uow.begin().await.map_err(repo_error)
    }

    pub async fn list(&self) -> Result<CategoryListVm, AppError> {
        let uow = self.begin().await?;
        let categories = uow.categories().get_all().await.map_err(repo_error)?;
        Ok(CategoryListVm { categories })
    }

    pub async fn get(&self, id: Uuid) -> Result<CategoryVm, AppError> {
        let uow = self.begin().await?;
        match uow.categories().get(id).await.map_err(repo_error)? {
            Some(category) => Ok(CategoryVm { category }),
            None => Err(AppError::NotFound(format!("category {}", id))),
        }
    }

    /// Upsert: a nil id means the category has no identity yet and is added;
    /// anything else is a full-entity update. One save either way.
    pub async fn create_update(&self, category: Category) -> Result<CategoryVm, AppError> {
        let uow = self.begin().await?;
        let category = if category.id.is_nil() {
            let mut fresh = category;
            fresh.id = Uuid::new_v4();
            uow.categories()
                .add(fresh.clone())
                .await
                .map_err(repo_error)?;
            fresh
        } else {
            uow.categories()
                .update(category.clone())
                .await
                .map_err(repo_error)?;
            category
        };
        uow.save().await.map_err(repo_error)?;
        Ok(CategoryVm { category })
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let uow = self.begin().await?;
        let category = match uow.categories().get(id).await.map_err(repo_error)? {
            Some(category) => category,
            None => return Err(AppError::NotFound(format!("category {}", id))),
        };
        uow.categories()
            .delete(category)
            .await
            .map_err(repo_error)?;
        uow.save().await.map_err(repo_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_repo::memory::MemoryStore;

    fn draft(name: &str, display_order: i32) -> Category {
        let mut category = Category::new(name.into(), display_order).unwrap();
        category.id = Uuid::nil();
        category
    }

    #[tokio::test]
    async fn create_assigns_identity_and_persists() {
        let svc = CategoryService::new(MemoryStore::new());
        let created = svc.create_update(draft("Fruits", 1)).await.unwrap();
        assert!(!created.category.id.is_nil());

        let fetched = svc.get(created.category.id).await.unwrap();
        assert_eq!(fetched.category.name, "Fruits");
    }

    #[tokio::test]
    async fn update_overwrites_existing_row() {
        let svc = CategoryService::new(MemoryStore::new());
        let created = svc.create_update(draft("Fruits", 1)).await.unwrap();

        let mut category = created.category;
        category.rename("Vegetables".into(), 2);
        let updated = svc.create_update(category.clone()).await.unwrap();
        assert_eq!(updated.category.id, category.id);

        let listed = svc.list().await.unwrap();
        assert_eq!(listed.categories.len(), 1);
        assert_eq!(listed.categories[0].name, "Vegetables");
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let svc = CategoryService::new(MemoryStore::new());
        let created = svc.create_update(draft("Fruits", 1)).await.unwrap();

        svc.delete(created.category.id).await.unwrap();
        let missing = svc.get(created.category.id).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn not_found_paths() {
        let svc = CategoryService::new(MemoryStore::new());
        let missing = svc.get(Uuid::new_v4()).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let deleted = svc.delete(Uuid::new_v4()).await;
        assert!(matches!(deleted, Err(AppError::NotFound(_))));
    }
}

use crate::errors::AppError;
use shop_types::ports::RepoError;

pub mod category_service;
pub mod order_service;
pub mod view_models;

pub(crate) fn repo_error(e: RepoError) -> AppError {
    match e {
        RepoError::RowNotFound(id) => AppError::NotFound(format!("row {}", id)),
        RepoError::DbError(_) => AppError::Internal(anyhow::anyhow!(e.to_string())),
    }
}

use uuid::Uuid;

pub mod category_repository;
pub mod order_repository;
pub mod unit_of_work;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("db error: {0}")]
    DbError(String),
    /// A staged update or delete referenced a row that does not exist;
    /// the whole commit is abandoned.
    #[error("row not found: {0}")]
    RowNotFound(Uuid),
}

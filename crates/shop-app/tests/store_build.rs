use shop_repo::{build_store, Store};
use shop_types::ports::unit_of_work::{UnitOfWork, UnitOfWorkFactory};
use std::env;

#[tokio::test]
async fn builds_sqlite_store_from_env() {
    // Use a temp DB path for isolation.
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("shopadmin-test.db");
    let url = format!("sqlite://{}", db_path.display());
    env::set_var("DATABASE_URL", &url);

    let store: Store = build_store(Some(&url)).await.expect("build store");
    // basic sanity: a fresh unit of work lists nothing
    let uow = store.begin().await.expect("begin");
    let categories = uow.categories().get_all().await.expect("list");
    assert!(categories.is_empty());
}

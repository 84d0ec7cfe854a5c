use std::sync::Arc;

use sqlx::SqlitePool;

use crate::catalog::CatalogProvider;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub catalog: Arc<dyn CatalogProvider>,
}

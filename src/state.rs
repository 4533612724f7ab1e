use std::sync::Arc;

use crate::{
    config::JwtConfig,
    db::{DbPool, OrmConn},
};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub jwt: Arc<JwtConfig>,
}

impl AppState {
    pub fn new(orm: OrmConn, jwt: JwtConfig) -> Self {
        Self {
            orm,
            jwt: Arc::new(jwt),
        }
    }

    /// The sqlx pool underneath the ORM connection, for raw link-table queries.
    pub fn pool(&self) -> &DbPool {
        self.orm.get_postgres_connection_pool()
    }
}

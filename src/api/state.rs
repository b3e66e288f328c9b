use std::sync::Arc;
use std::time::Instant;

use sqlx::{Pool, Sqlite};

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
    pub config: Arc<Config>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(db: Pool<Sqlite>, config: Arc<Config>) -> Self {
        AppState {
            db,
            config,
            started_at: Instant::now(),
        }
    }
}

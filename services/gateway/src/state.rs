use persistence::cache::OrderCache;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<OrderCache>,
}

impl AppState {
    pub fn new(cache: Arc<OrderCache>) -> Self {
        Self { cache }
    }
}

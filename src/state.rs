use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::notify::ContactNotifier;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn Store>,
    pub notifier: Arc<dyn ContactNotifier>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn Store>,
        notifier: Arc<dyn ContactNotifier>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            notifier,
        }
    }
}

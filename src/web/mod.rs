pub mod handlers;
pub mod render;
pub mod server;

use crate::config::AppConfig;
use crate::crm::CrmSource;
use std::sync::Arc;

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn CrmSource>,
    pub config: Arc<AppConfig>,
}

pub use server::serve;

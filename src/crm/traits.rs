use crate::model::FetchError;
use serde_json::Value;

/// Source of raw CRM records. Collection calls return every page's records.
#[async_trait::async_trait]
pub trait CrmSource: Send + Sync {
    /// All deals, with their company embedded.
    async fn fetch_deals(&self) -> Result<Vec<Value>, FetchError>;
    async fn fetch_companies(&self) -> Result<Vec<Value>, FetchError>;
    /// A single company; `FetchError::NotFound` when the id is unknown.
    async fn fetch_company(&self, id: i64) -> Result<Value, FetchError>;
    async fn fetch_company_deals(&self, id: i64) -> Result<Vec<Value>, FetchError>;
}

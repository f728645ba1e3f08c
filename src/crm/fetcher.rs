use crate::config::AppConfig;
use crate::crm::records::Page;
use crate::crm::traits::CrmSource;
use crate::model::FetchError;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const API_KEY_HEADER: &str = "x-api-key";

/// Lime CRM REST client. Headers and credentials come from the shared config.
pub struct LimeFetcher {
    client: Client,
    config: Arc<AppConfig>,
}

impl LimeFetcher {
    pub fn new(config: Arc<AppConfig>) -> Result<Self, FetchError> {
        let mut api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| FetchError::Setup(format!("API key is not a valid header value: {}", e)))?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/hal+json"));
        headers.insert(API_KEY_HEADER, api_key);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn collection_url(&self, object: &str, extra: &str) -> String {
        format!(
            "{}?_limit={}{}",
            self.config.resource_url(&format!("limeobject/{}/", object)),
            self.config.page_limit,
            extra
        )
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "unknown".into());
            warn!("CRM responded [{}] for {}", status, url);
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| FetchError::InvalidResponse(e.to_string()))
    }

    /// Follows `_links.next` serially and collects the records of every page.
    async fn fetch_all(&self, url: String) -> Result<Vec<Value>, FetchError> {
        let mut records = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut next = Some(resolve_link(&url, &url)?);

        while let Some(url) = next {
            let page: Page = self.get(&url).await?;
            visited.insert(url.clone());
            records.extend(page.embedded.limeobjects);

            next = match page.links.next {
                Some(link) => {
                    let resolved = resolve_link(&url, &link.href)?;
                    if visited.contains(&resolved) {
                        warn!("Next link {} was already fetched, stopping", resolved);
                        None
                    } else {
                        Some(resolved)
                    }
                }
                None => None,
            };
        }
        let pages = visited.len();

        info!("Fetched {} records in {} page(s)", records.len(), pages);
        Ok(records)
    }
}

fn resolve_link(current: &str, href: &str) -> Result<String, FetchError> {
    let base = Url::parse(current).map_err(|e| FetchError::InvalidResponse(e.to_string()))?;
    base.join(href)
        .map(String::from)
        .map_err(|e| FetchError::InvalidResponse(format!("bad next link {:?}: {}", href, e)))
}

#[async_trait::async_trait]
impl CrmSource for LimeFetcher {
    async fn fetch_deals(&self) -> Result<Vec<Value>, FetchError> {
        info!("Fetching deals...");
        self.fetch_all(self.collection_url("deal", "&_embed=company"))
            .await
    }

    async fn fetch_companies(&self) -> Result<Vec<Value>, FetchError> {
        info!("Fetching companies...");
        self.fetch_all(self.collection_url("company", "")).await
    }

    async fn fetch_company(&self, id: i64) -> Result<Value, FetchError> {
        info!("Fetching company {}...", id);
        let url = self
            .config
            .resource_url(&format!("limeobject/company/{}/", id));
        self.get(&url).await
    }

    async fn fetch_company_deals(&self, id: i64) -> Result<Vec<Value>, FetchError> {
        info!("Fetching deals for company {}...", id);
        let extra = format!("&_embed=company&company={}", id);
        self.fetch_all(self.collection_url("deal", &extra)).await
    }
}

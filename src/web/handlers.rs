use crate::analyzer::{
    deals_per_month, deals_per_year, derive_status, status_breakdown, status_rows,
    value_per_customer,
};
use crate::chart::{Chart, ChartKind};
use crate::model::{DataQualityIssue, Deal, FetchError};
use crate::normalizer::{attach_deals, normalize_companies, normalize_company, normalize_deals};
use crate::web::{render, AppState};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use chrono::{Datelike, Utc};
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum PageError {
    #[error("CRM request failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("customer {0} not found")]
    CustomerNotFound(i64),
    #[error("customer {id} could not be read: {issue}")]
    UnreadableCustomer { id: i64, issue: DataQualityIssue },
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let (status, title) = match &self {
            PageError::CustomerNotFound(_) => (StatusCode::NOT_FOUND, "Customer not found"),
            PageError::Fetch(_) | PageError::UnreadableCustomer { .. } => {
                (StatusCode::BAD_GATEWAY, "CRM unavailable")
            }
        };
        error!("Page failed [{}]: {}", status, self);
        (status, Html(render::error_page(title, &self.to_string()))).into_response()
    }
}

type PageResult = Result<Html<String>, PageError>;

fn default_year(state: &AppState) -> i32 {
    state.config.default_year.unwrap_or_else(|| Utc::now().year())
}

pub async fn home() -> Html<String> {
    Html(render::home_page())
}

pub async fn deals(State(state): State<AppState>) -> PageResult {
    let deals = normalize_deals(state.source.fetch_deals().await?);
    info!("Listing {} deals", deals.items.len());
    Ok(Html(render::deals_page(&deals.items, &deals.issues)))
}

pub async fn average_year(State(state): State<AppState>) -> PageResult {
    let deals = normalize_deals(state.source.fetch_deals().await?);
    let rows = deals_per_year(&deals.items);
    info!("Built {} yearly rows from {} deals", rows.len(), deals.items.len());

    let chart = Chart::build(
        "Average deal value per year",
        "Average value",
        ChartKind::Bar,
        &rows,
        |r| r.year.to_string(),
        |r| r.avg_value,
    );
    Ok(Html(render::year_page(&rows, &chart, &deals.issues)))
}

pub async fn average_month(State(state): State<AppState>) -> PageResult {
    let year = default_year(&state);
    month_view(state, year).await
}

pub async fn average_month_for(State(state): State<AppState>, Path(year): Path<i32>) -> PageResult {
    month_view(state, year).await
}

async fn month_view(state: AppState, year: i32) -> PageResult {
    let deals = normalize_deals(state.source.fetch_deals().await?);
    let rows = deals_per_month(&deals.items, year);
    info!("Built {} monthly rows for {}", rows.len(), year);

    let chart = Chart::build(
        &format!("Won deals per month in {}", year),
        "Won deals",
        ChartKind::Line,
        &rows,
        |r| r.month_name.to_string(),
        |r| r.total_deals as f64,
    );
    Ok(Html(render::month_page(year, &rows, &chart, &deals.issues)))
}

pub async fn customer_value(State(state): State<AppState>) -> PageResult {
    let year = default_year(&state);
    customer_value_view(state, year).await
}

pub async fn customer_value_for(State(state): State<AppState>, Path(year): Path<i32>) -> PageResult {
    customer_value_view(state, year).await
}

async fn customer_value_view(state: AppState, year: i32) -> PageResult {
    // One batched deal fetch; each deal carries its embedded company.
    let deals = normalize_deals(state.source.fetch_deals().await?);
    let rows = value_per_customer(&deals.items, year);
    info!("Built {} customer value rows for {}", rows.len(), year);

    let chart = Chart::build(
        &format!("Value per customer in {}", year),
        "Total value",
        ChartKind::Bar,
        &rows,
        |r| r.customer_name.clone(),
        |r| r.total_value,
    );
    Ok(Html(render::customer_value_page(year, &rows, &chart, &deals.issues)))
}

pub async fn customers(State(state): State<AppState>) -> PageResult {
    let companies = normalize_companies(state.source.fetch_companies().await?);
    let deals = normalize_deals(state.source.fetch_deals().await?);

    let mut customers = companies.items;
    attach_deals(&mut customers, &deals.items);

    let rows = status_rows(&customers, Utc::now());
    let breakdown = status_breakdown(&rows);
    info!("Classified {} customers", rows.len());

    let chart = Chart::build(
        "Customers by status",
        "Customers",
        ChartKind::Pie,
        &breakdown,
        |c| c.status.label().to_string(),
        |c| c.customers as f64,
    );

    let mut issues = companies.issues;
    issues.extend(deals.issues);
    Ok(Html(render::status_page(&rows, &chart, &issues)))
}

pub async fn customer(State(state): State<AppState>, Path(id): Path<i64>) -> PageResult {
    let record = match state.source.fetch_company(id).await {
        Ok(record) => record,
        Err(FetchError::NotFound(_)) => return Err(PageError::CustomerNotFound(id)),
        Err(e) => return Err(e.into()),
    };
    let mut customer =
        normalize_company(0, record).map_err(|issue| PageError::UnreadableCustomer { id, issue })?;

    let deals = normalize_deals(state.source.fetch_company_deals(id).await?);
    let own: Vec<Deal> = deals
        .items
        .into_iter()
        .filter(|d| d.customer_id == Some(id))
        .collect();
    customer.attach_deals(own);

    let status = derive_status(&customer, Utc::now());
    info!("Customer {} is {}", id, status.label());
    Ok(Html(render::customer_page(&customer, status, &deals.issues)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::crm::CrmSource;
    use crate::web::server::router;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::Duration;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    #[derive(Default)]
    struct FakeSource {
        deals: Vec<Value>,
        companies: Vec<Value>,
        offline: bool,
    }

    impl FakeSource {
        fn check(&self) -> Result<(), FetchError> {
            if self.offline {
                Err(FetchError::Status {
                    status: 503,
                    body: "down".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait::async_trait]
    impl CrmSource for FakeSource {
        async fn fetch_deals(&self) -> Result<Vec<Value>, FetchError> {
            self.check()?;
            Ok(self.deals.clone())
        }

        async fn fetch_companies(&self) -> Result<Vec<Value>, FetchError> {
            self.check()?;
            Ok(self.companies.clone())
        }

        async fn fetch_company(&self, id: i64) -> Result<Value, FetchError> {
            self.check()?;
            self.companies
                .iter()
                .find(|c| c["_id"].as_i64() == Some(id))
                .cloned()
                .ok_or_else(|| FetchError::NotFound(format!("company {}", id)))
        }

        async fn fetch_company_deals(&self, id: i64) -> Result<Vec<Value>, FetchError> {
            self.check()?;
            Ok(self
                .deals
                .iter()
                .filter(|d| d["company"].as_i64() == Some(id))
                .cloned()
                .collect())
        }
    }

    fn deal(id: i64, company: i64, value: f64, status: &str, closed: &str) -> Value {
        json!({
            "_id": id,
            "_descriptive": format!("Deal {}", id),
            "value": value,
            "dealstatus": { "key": status },
            "closeddate": closed,
            "company": company,
            "_embedded": { "relation_company": { "_id": company, "name": format!("Company {}", company) } }
        })
    }

    fn sample() -> FakeSource {
        let recent = (Utc::now() - Duration::days(30)).to_rfc3339();
        FakeSource {
            deals: vec![
                deal(1, 10, 100.0, "agreement", "2019-03-01T00:00:00Z"),
                deal(2, 10, 200.0, "agreement", "2019-03-20T00:00:00Z"),
                deal(3, 20, 300.0, "agreement", "2019-07-04T00:00:00Z"),
                deal(4, 20, 999.0, "lost", "2019-07-04T00:00:00Z"),
                deal(5, 30, 50.0, "agreement", &recent),
            ],
            companies: vec![
                json!({ "_id": 10, "name": "Company 10", "buyingstatus": { "key": "active" } }),
                json!({ "_id": 20, "name": "Company 20", "buyingstatus": { "key": "active" }, "postalcity": "Malmö" }),
                json!({ "_id": 30, "name": "Company 30", "buyingstatus": { "key": "active" } }),
                json!({ "_id": 40, "name": "Company 40", "buyingstatus": { "key": "irrelevant" } }),
            ],
            offline: false,
        }
    }

    async fn get(source: FakeSource, uri: &str) -> (StatusCode, String) {
        let state = AppState {
            source: Arc::new(source),
            config: Arc::new(AppConfig {
                api_key: "secret".into(),
                default_year: Some(2019),
                ..AppConfig::default()
            }),
        };
        let response = router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn home_page_links_every_view() {
        let (status, body) = get(FakeSource::default(), "/").await;
        assert_eq!(status, StatusCode::OK);
        for link in ["/deals", "/average_year", "/average_month", "/customer_value", "/customers"] {
            assert!(body.contains(link), "missing {}", link);
        }
    }

    #[tokio::test]
    async fn yearly_page_shows_averages() {
        let (status, body) = get(sample(), "/average_year").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<td>2019</td><td>200</td><td>3</td>"));
        assert!(body.contains("<canvas"));
    }

    #[tokio::test]
    async fn monthly_page_uses_default_or_path_year() {
        let (_, body) = get(sample(), "/average_month").await;
        assert!(body.contains("in 2019"));
        assert!(body.contains("<td>March</td><td>2</td>"));
        assert!(body.contains("<td>July</td><td>1</td>"));

        let (status, body) = get(sample(), "/average_month/2018").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("No deals found"));
    }

    #[tokio::test]
    async fn extreme_path_years_render_without_panicking() {
        let (status, body) = get(sample(), "/average_month/2147483647").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("No deals found"));

        let (status, body) = get(sample(), "/customer_value/-2147483648").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("No deals found"));
    }

    #[tokio::test]
    async fn customer_value_page_orders_by_value() {
        let (status, body) = get(sample(), "/customer_value/2019").await;
        assert_eq!(status, StatusCode::OK);
        let first = body.find("Company 10").unwrap();
        let second = body.find("Company 20").unwrap();
        assert!(first < second);
        assert!(body.contains("300.00"));
    }

    #[tokio::test]
    async fn status_page_classifies_every_company() {
        let (status, body) = get(sample(), "/customers").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<td>Inactive</td>"));
        assert!(body.contains("<td>Customer</td>"));
        assert!(body.contains("<td>Irrelevant</td>"));
        assert!(body.contains("\"type\":\"pie\""));
    }

    #[tokio::test]
    async fn customer_page_shows_contact_and_deals() {
        let (status, body) = get(sample(), "/customer/20").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Malmö"));
        assert!(body.contains("N/A"));
        assert!(body.contains("Deal 3"));
        assert!(body.contains("Deal 4"));
        assert!(!body.contains("Deal 1<"));
        assert!(body.contains("<td>Inactive</td>"));
    }

    #[tokio::test]
    async fn unknown_customer_is_404() {
        let (status, body) = get(sample(), "/customer/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("customer 999 not found"));
    }

    #[tokio::test]
    async fn empty_crm_renders_no_data_message() {
        let (status, body) = get(FakeSource::default(), "/deals").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("No deals found"));

        let (_, body) = get(FakeSource::default(), "/customers").await;
        assert!(body.contains("No customers found"));
    }

    #[tokio::test]
    async fn crm_failure_is_a_bad_gateway() {
        let source = FakeSource {
            offline: true,
            ..FakeSource::default()
        };
        let (status, body) = get(source, "/average_year").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.contains("503"));
    }

    #[tokio::test]
    async fn malformed_records_are_flagged_on_the_page() {
        let mut source = sample();
        source.deals.push(json!({ "_id": 77, "dealstatus": { "key": "agreement" } }));
        let (status, body) = get(source, "/average_year").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("1 record(s)"));
        assert!(body.contains("<td>2019</td><td>200</td><td>3</td>"));
    }
}

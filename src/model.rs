// Core structs: Deal, Customer, CustomerStatus, aggregate rows and errors
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Deal status key the CRM uses for a won deal.
pub const WON_STATUS: &str = "agreement";

/// Buying-status key marking a company that is not worth pursuing.
pub const IRRELEVANT_BUYING_STATUS: &str = "irrelevant";

/// Placeholder for contact fields the CRM left empty.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq)]
pub struct Deal {
    pub id: i64,
    pub status: String,
    pub value: f64,
    pub description: String,
    pub closing_date: Option<DateTime<Utc>>,
    /// Company id the deal belongs to, if any.
    pub customer_id: Option<i64>,
    /// Embedded company data, present when the deal was fetched with `_embed=company`.
    pub customer: Option<Customer>,
}

impl Deal {
    pub fn is_won(&self) -> bool {
        self.status == WON_STATUS
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.customer.as_ref().map(|c| c.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub buying_status: String,
    pub website: String,
    pub phone: String,
    pub address: String,
    pub zip_code: String,
    pub city: String,
    pub country: String,
    /// Empty until deals are attached.
    pub deals: Vec<Deal>,
}

impl Customer {
    pub fn is_irrelevant(&self) -> bool {
        self.buying_status == IRRELEVANT_BUYING_STATUS
    }

    pub fn attach_deals(&mut self, deals: Vec<Deal>) {
        self.deals = deals;
    }

    /// Sum of all won deal values, regardless of closing date.
    pub fn total_value(&self) -> f64 {
        self.deals
            .iter()
            .filter(|d| d.is_won())
            .map(|d| d.value)
            .sum()
    }
}

/// Lifecycle label derived from a customer's deal history.
/// The discriminants define the order used when picking the strongest status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum CustomerStatus {
    Irrelevant = 0,
    Prospect = 1,
    Inactive = 2,
    Customer = 3,
}

impl CustomerStatus {
    pub const ALL: [CustomerStatus; 4] = [
        CustomerStatus::Customer,
        CustomerStatus::Inactive,
        CustomerStatus::Prospect,
        CustomerStatus::Irrelevant,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CustomerStatus::Irrelevant => "Irrelevant",
            CustomerStatus::Prospect => "Prospect",
            CustomerStatus::Inactive => "Inactive",
            CustomerStatus::Customer => "Customer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearRow {
    pub year: i32,
    pub avg_value: f64,
    pub total_deals: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthRow {
    pub month: u32,
    pub month_name: &'static str,
    pub total_deals: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerValueRow {
    pub customer_id: i64,
    pub customer_name: String,
    pub total_value: f64,
    pub total_deals: usize,
}

/// One line of the customer lifecycle page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRow {
    pub customer_id: i64,
    pub customer_name: String,
    pub status: CustomerStatus,
    pub total_value: f64,
    pub total_deals: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    pub status: CustomerStatus,
    pub customers: usize,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("CRM responded with {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("client setup failed: {0}")]
    Setup(String),
}

/// A raw record the normalizer refused to turn into an entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataQualityIssue {
    #[error("{kind} record #{index} (id {record_id:?}) is missing `{field}`")]
    MissingField {
        kind: &'static str,
        index: usize,
        record_id: Option<i64>,
        field: &'static str,
    },
    #[error("{kind} record #{index} is malformed: {reason}")]
    Malformed {
        kind: &'static str,
        index: usize,
        reason: String,
    },
}

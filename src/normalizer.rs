use crate::crm::records::{RawCompany, RawDeal};
use crate::model::{Customer, DataQualityIssue, Deal, NOT_AVAILABLE};
use crate::utils::parse_closing_date;
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// Entities that passed validation, plus a report for the records that did not.
#[derive(Debug)]
pub struct Normalized<T> {
    pub items: Vec<T>,
    pub issues: Vec<DataQualityIssue>,
}

impl<T> Default for Normalized<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            issues: Vec::new(),
        }
    }
}

pub fn normalize_deals(records: Vec<Value>) -> Normalized<Deal> {
    let mut out = Normalized::default();
    for (index, record) in records.into_iter().enumerate() {
        let raw: RawDeal = match serde_json::from_value(record) {
            Ok(raw) => raw,
            Err(e) => {
                out.issues.push(DataQualityIssue::Malformed {
                    kind: "deal",
                    index,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        match normalize_deal(index, raw, &mut out.issues) {
            Ok(deal) => out.items.push(deal),
            Err(issue) => out.issues.push(issue),
        }
    }
    log_issues(&out.issues);
    out
}

pub fn normalize_companies(records: Vec<Value>) -> Normalized<Customer> {
    let mut out = Normalized::default();
    for (index, record) in records.into_iter().enumerate() {
        match normalize_company(index, record) {
            Ok(customer) => out.items.push(customer),
            Err(issue) => out.issues.push(issue),
        }
    }
    log_issues(&out.issues);
    out
}

/// Normalizes a single company record, as returned by a detail fetch.
pub fn normalize_company(index: usize, record: Value) -> Result<Customer, DataQualityIssue> {
    decode_customer("company", index, record)
}

fn decode_customer(
    kind: &'static str,
    index: usize,
    record: Value,
) -> Result<Customer, DataQualityIssue> {
    let raw: RawCompany =
        serde_json::from_value(record).map_err(|e| DataQualityIssue::Malformed {
            kind,
            index,
            reason: e.to_string(),
        })?;
    normalize_customer(kind, index, raw)
}

/// Hands every customer the deals that reference its id, keeping deal order.
pub fn attach_deals(customers: &mut [Customer], deals: &[Deal]) {
    let mut by_customer: HashMap<i64, Vec<Deal>> = HashMap::new();
    for deal in deals {
        if let Some(id) = deal.customer_id {
            by_customer.entry(id).or_default().push(deal.clone());
        }
    }
    for customer in customers.iter_mut() {
        let deals = by_customer.remove(&customer.id).unwrap_or_default();
        customer.attach_deals(deals);
    }
}

fn normalize_deal(
    index: usize,
    raw: RawDeal,
    issues: &mut Vec<DataQualityIssue>,
) -> Result<Deal, DataQualityIssue> {
    let missing = |field| DataQualityIssue::MissingField {
        kind: "deal",
        index,
        record_id: raw.id,
        field,
    };

    let id = raw.id.ok_or_else(|| missing("_id"))?;
    let status = raw
        .dealstatus
        .as_ref()
        .and_then(|s| s.key.clone())
        .ok_or_else(|| missing("dealstatus.key"))?;
    let value = raw.value.ok_or_else(|| missing("value"))?;

    let closing_date = raw.closeddate.as_deref().and_then(parse_closing_date);

    // Embedded company problems are reported but do not drop the deal.
    let customer = match raw.embedded.and_then(|e| e.relation_company) {
        Some(company) => match decode_customer("embedded company", index, company) {
            Ok(customer) => Some(customer),
            Err(issue) => {
                issues.push(issue);
                None
            }
        },
        None => None,
    };
    let customer_id = raw.company.or_else(|| customer.as_ref().map(|c| c.id));

    Ok(Deal {
        id,
        status,
        value,
        description: raw.descriptive.unwrap_or_default(),
        closing_date,
        customer_id,
        customer,
    })
}

fn normalize_customer(
    kind: &'static str,
    index: usize,
    raw: RawCompany,
) -> Result<Customer, DataQualityIssue> {
    let missing = |field| DataQualityIssue::MissingField {
        kind,
        index,
        record_id: raw.id,
        field,
    };

    let id = raw.id.ok_or_else(|| missing("_id"))?;
    let name = raw
        .name
        .clone()
        .or_else(|| raw.descriptive.clone())
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| missing("name"))?;

    Ok(Customer {
        id,
        name,
        buying_status: raw.buyingstatus.and_then(|s| s.key).unwrap_or_default(),
        website: contact(raw.www),
        phone: contact(raw.phone),
        address: contact(raw.postaladdress1),
        zip_code: contact(raw.postalzipcode),
        city: contact(raw.postalcity),
        country: contact(raw.country),
        deals: Vec::new(),
    })
}

fn contact(field: Option<String>) -> String {
    field
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn log_issues(issues: &[DataQualityIssue]) {
    for issue in issues {
        warn!("Data quality: {}", issue);
    }
}

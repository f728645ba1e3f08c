use crate::model::{Customer, CustomerStatus, Deal, StatusCount, StatusRow};
use crate::utils::one_year_before;
use chrono::{DateTime, Utc};

/// Status a single deal argues for, given the recency cutoff.
pub fn deal_contribution(deal: &Deal, customer: &Customer, cutoff: DateTime<Utc>) -> CustomerStatus {
    match deal.closing_date {
        Some(closed) if deal.is_won() && closed >= cutoff => CustomerStatus::Customer,
        Some(_) if deal.is_won() => CustomerStatus::Inactive,
        _ => buying_status_fallback(customer),
    }
}

fn buying_status_fallback(customer: &Customer) -> CustomerStatus {
    if customer.is_irrelevant() {
        CustomerStatus::Irrelevant
    } else {
        CustomerStatus::Prospect
    }
}

/// Strongest status across the customer's deals, with won deals counted as
/// current when they closed within the last year before `now`.
pub fn derive_status(customer: &Customer, now: DateTime<Utc>) -> CustomerStatus {
    let cutoff = one_year_before(now);
    customer
        .deals
        .iter()
        .map(|deal| deal_contribution(deal, customer, cutoff))
        .max()
        .unwrap_or_else(|| buying_status_fallback(customer))
}

pub fn status_rows(customers: &[Customer], now: DateTime<Utc>) -> Vec<StatusRow> {
    customers
        .iter()
        .map(|customer| StatusRow {
            customer_id: customer.id,
            customer_name: customer.name.clone(),
            status: derive_status(customer, now),
            total_value: customer.total_value(),
            total_deals: customer.deals.len(),
        })
        .collect()
}

/// Number of customers per status, strongest status first. Empty statuses are left out.
pub fn status_breakdown(rows: &[StatusRow]) -> Vec<StatusCount> {
    CustomerStatus::ALL
        .iter()
        .map(|&status| StatusCount {
            status,
            customers: rows.iter().filter(|r| r.status == status).count(),
        })
        .filter(|c| c.customers > 0)
        .collect()
}

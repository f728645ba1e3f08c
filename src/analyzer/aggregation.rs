use crate::model::{CustomerValueRow, Deal, MonthRow, YearRow};
use crate::utils::month_name;
use chrono::{DateTime, Datelike, Utc};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Won deals that carry a closing date, paired with that date.
fn won_and_closed(deals: &[Deal]) -> impl Iterator<Item = (&Deal, DateTime<Utc>)> {
    deals
        .iter()
        .filter(|d| d.is_won())
        .filter_map(|d| d.closing_date.map(|closed| (d, closed)))
}

/// Mean of `count` values summing to `total`; `None` for an empty group.
fn average(total: f64, count: usize) -> Option<f64> {
    (count > 0).then(|| total / count as f64)
}

/// Average value (rounded to whole units) and deal count per closing year, ascending by year.
pub fn deals_per_year(deals: &[Deal]) -> Vec<YearRow> {
    let mut groups: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for (deal, closed) in won_and_closed(deals) {
        let entry = groups.entry(closed.year()).or_insert((0.0, 0));
        entry.0 += deal.value;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .filter_map(|(year, (total, count))| {
            average(total, count).map(|avg| YearRow {
                year,
                avg_value: avg.round(),
                total_deals: count,
            })
        })
        .collect()
}

/// Deal count per closing month within `year`, ascending by month.
pub fn deals_per_month(deals: &[Deal], year: i32) -> Vec<MonthRow> {
    let mut groups: BTreeMap<u32, usize> = BTreeMap::new();
    for (_, closed) in won_and_closed(deals).filter(|(_, closed)| closed.year() == year) {
        *groups.entry(closed.month()).or_insert(0) += 1;
    }

    groups
        .into_iter()
        .map(|(month, count)| MonthRow {
            month,
            month_name: month_name(month),
            total_deals: count,
        })
        .collect()
}

/// Total won value per customer for deals closed in `year`, highest value first.
/// Equal totals keep the order in which the customers were first seen.
pub fn value_per_customer(deals: &[Deal], year: i32) -> Vec<CustomerValueRow> {
    let mut rows: Vec<CustomerValueRow> = Vec::new();
    let mut slots: HashMap<i64, usize> = HashMap::new();

    for (deal, _) in won_and_closed(deals).filter(|(_, closed)| closed.year() == year) {
        let Some(customer_id) = deal.customer_id else {
            continue;
        };
        let slot = *slots.entry(customer_id).or_insert_with(|| {
            rows.push(CustomerValueRow {
                customer_id,
                customer_name: String::new(),
                total_value: 0.0,
                total_deals: 0,
            });
            rows.len() - 1
        });

        let row = &mut rows[slot];
        row.total_value += deal.value;
        row.total_deals += 1;
        if row.customer_name.is_empty() {
            if let Some(name) = deal.customer_name() {
                row.customer_name = name.to_string();
            }
        }
    }

    for row in rows.iter_mut().filter(|r| r.customer_name.is_empty()) {
        row.customer_name = format!("Customer #{}", row.customer_id);
    }

    // sort_by is stable
    rows.sort_by(|a, b| {
        b.total_value
            .partial_cmp(&a.total_value)
            .unwrap_or(Ordering::Equal)
    });
    rows
}

// Server-side HTML for the dashboard pages.
use crate::chart::Chart;
use crate::model::{
    Customer, CustomerStatus, CustomerValueRow, DataQualityIssue, Deal, MonthRow, StatusRow,
    YearRow,
};
use std::fmt::Write;

const CHART_JS: &str = "https://cdn.jsdelivr.net/npm/chart.js@4";

const NAV: &[(&str, &str)] = &[
    ("/", "Home"),
    ("/deals", "Deals"),
    ("/average_year", "Deals per year"),
    ("/average_month", "Deals per month"),
    ("/customer_value", "Value per customer"),
    ("/customers", "Customer status"),
];

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

fn layout(title: &str, body: &str) -> String {
    let mut nav = String::new();
    for (href, label) in NAV {
        let _ = write!(nav, r#"<a href="{}">{}</a> "#, href, label);
    }
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{CHART_JS}"></script>
</head>
<body>
<nav>{nav}</nav>
<main>
<h1>{title}</h1>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
    )
}

fn chart_block(id: &str, chart: &Chart) -> String {
    if chart.is_empty() {
        return String::new();
    }
    // "</" would end the script element early.
    let config = chart.to_chartjs().to_string().replace("</", "<\\/");
    format!(
        r#"<canvas id="{id}"></canvas>
<script>new Chart(document.getElementById("{id}"), {config});</script>
"#
    )
}

fn issues_block(issues: &[DataQualityIssue]) -> String {
    if issues.is_empty() {
        return String::new();
    }
    let mut out = format!(
        "<section class=\"data-quality\"><p>{} record(s) were skipped or incomplete:</p><ul>",
        issues.len()
    );
    for issue in issues {
        let _ = write!(out, "<li>{}</li>", escape(&issue.to_string()));
    }
    out.push_str("</ul></section>\n");
    out
}

fn no_data(message: &str) -> String {
    format!("<p class=\"no-data\">{}</p>\n", escape(message))
}

fn table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut out = String::from("<table>\n<tr>");
    for h in headers {
        let _ = write!(out, "<th>{}</th>", escape(h));
    }
    out.push_str("</tr>\n");
    for row in rows {
        out.push_str("<tr>");
        for cell in row {
            let _ = write!(out, "<td>{}</td>", cell);
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>\n");
    out
}

/// Previous/next year navigation. A neighbour outside the `i32` range gets no link.
fn year_links(base: &str, current: i32) -> String {
    let mut links = Vec::new();
    if let Some(prev) = current.checked_sub(1) {
        links.push(format!(r#"<a href="{base}/{prev}">&larr; {prev}</a>"#));
    }
    if let Some(next) = current.checked_add(1) {
        links.push(format!(r#"<a href="{base}/{next}">{next} &rarr;</a>"#));
    }
    format!("<p>{}</p>\n", links.join(" | "))
}

pub fn home_page() -> String {
    let mut body = String::from("<p>Sales overview built from CRM deals and companies.</p>\n<ul>\n");
    for (href, label) in NAV.iter().skip(1) {
        let _ = writeln!(body, r#"<li><a href="{}">{}</a></li>"#, href, label);
    }
    body.push_str("</ul>\n");
    layout("Dashboard", &body)
}

pub fn deals_page(deals: &[Deal], issues: &[DataQualityIssue]) -> String {
    let mut body = issues_block(issues);
    if deals.is_empty() {
        body.push_str(&no_data("No deals found"));
        return layout("Deals", &body);
    }
    let rows = deals
        .iter()
        .map(|d| {
            vec![
                escape(&d.description),
                money(d.value),
                escape(&d.status),
                d.closing_date
                    .map(|c| c.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".into()),
                escape(d.customer_name().unwrap_or("-")),
            ]
        })
        .collect();
    body.push_str(&table(
        &["Description", "Value", "Status", "Closing date", "Customer"],
        rows,
    ));
    layout("Deals", &body)
}

pub fn year_page(rows: &[YearRow], chart: &Chart, issues: &[DataQualityIssue]) -> String {
    let mut body = issues_block(issues);
    if rows.is_empty() {
        body.push_str(&no_data("No deals found"));
        return layout("Average deal value per year", &body);
    }
    body.push_str(&chart_block("per-year", chart));
    let rows = rows
        .iter()
        .map(|r| vec![r.year.to_string(), format!("{:.0}", r.avg_value), r.total_deals.to_string()])
        .collect();
    body.push_str(&table(&["Year", "Average value", "Won deals"], rows));
    layout("Average deal value per year", &body)
}

pub fn month_page(year: i32, rows: &[MonthRow], chart: &Chart, issues: &[DataQualityIssue]) -> String {
    let title = format!("Won deals per month in {}", year);
    let mut body = year_links("/average_month", year);
    body.push_str(&issues_block(issues));
    if rows.is_empty() {
        body.push_str(&no_data("No deals found"));
        return layout(&title, &body);
    }
    body.push_str(&chart_block("per-month", chart));
    let rows = rows
        .iter()
        .map(|r| vec![r.month_name.to_string(), r.total_deals.to_string()])
        .collect();
    body.push_str(&table(&["Month", "Won deals"], rows));
    layout(&title, &body)
}

pub fn customer_value_page(
    year: i32,
    rows: &[CustomerValueRow],
    chart: &Chart,
    issues: &[DataQualityIssue],
) -> String {
    let title = format!("Value per customer in {}", year);
    let mut body = year_links("/customer_value", year);
    body.push_str(&issues_block(issues));
    if rows.is_empty() {
        body.push_str(&no_data("No deals found"));
        return layout(&title, &body);
    }
    body.push_str(&chart_block("per-customer", chart));
    let rows = rows
        .iter()
        .map(|r| {
            vec![
                format!(
                    r#"<a href="/customer/{}">{}</a>"#,
                    r.customer_id,
                    escape(&r.customer_name)
                ),
                money(r.total_value),
                r.total_deals.to_string(),
            ]
        })
        .collect();
    body.push_str(&table(&["Customer", "Total value", "Won deals"], rows));
    layout(&title, &body)
}

pub fn status_page(rows: &[StatusRow], chart: &Chart, issues: &[DataQualityIssue]) -> String {
    let mut body = issues_block(issues);
    if rows.is_empty() {
        body.push_str(&no_data("No customers found"));
        return layout("Customer status", &body);
    }
    body.push_str(&chart_block("status", chart));
    let rows = rows
        .iter()
        .map(|r| {
            vec![
                format!(
                    r#"<a href="/customer/{}">{}</a>"#,
                    r.customer_id,
                    escape(&r.customer_name)
                ),
                r.status.label().to_string(),
                money(r.total_value),
                r.total_deals.to_string(),
            ]
        })
        .collect();
    body.push_str(&table(&["Customer", "Status", "Won value", "Deals"], rows));
    layout("Customer status", &body)
}

pub fn customer_page(
    customer: &Customer,
    status: CustomerStatus,
    issues: &[DataQualityIssue],
) -> String {
    let mut body = issues_block(issues);
    body.push_str(&table(
        &["Field", "Value"],
        vec![
            vec!["Status".into(), status.label().into()],
            vec!["Total won value".into(), money(customer.total_value())],
            vec!["Website".into(), escape(&customer.website)],
            vec!["Phone".into(), escape(&customer.phone)],
            vec!["Address".into(), escape(&customer.address)],
            vec!["Zip code".into(), escape(&customer.zip_code)],
            vec!["City".into(), escape(&customer.city)],
            vec!["Country".into(), escape(&customer.country)],
        ],
    ));
    body.push_str("<h2>Deals</h2>\n");
    if customer.deals.is_empty() {
        body.push_str(&no_data("No deals found"));
    } else {
        let rows = customer
            .deals
            .iter()
            .map(|d| {
                vec![
                    escape(&d.description),
                    money(d.value),
                    escape(&d.status),
                    d.closing_date
                        .map(|c| c.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| "-".into()),
                ]
            })
            .collect();
        body.push_str(&table(&["Description", "Value", "Status", "Closing date"], rows));
    }
    layout(&customer.name, &body)
}

pub fn error_page(title: &str, message: &str) -> String {
    layout(title, &format!("<p class=\"error\">{}</p>\n", escape(message)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartKind;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn empty_year_page_says_no_data() {
        let chart = Chart::build("t", "l", ChartKind::Bar, &[] as &[YearRow], |r| r.year.to_string(), |r| r.avg_value);
        let html = year_page(&[], &chart, &[]);
        assert!(html.contains("No deals found"));
        assert!(!html.contains("<canvas"));
    }

    #[test]
    fn chart_payload_cannot_close_the_script_tag() {
        let rows = vec!["</script><b>".to_string()];
        let chart = Chart::build("t", "l", ChartKind::Bar, &rows, |r| r.clone(), |_| 1.0);
        let block = chart_block("c", &chart);
        assert!(!block.contains("</script><b>"));
        assert!(block.contains("<\\/script>"));
    }

    #[test]
    fn year_links_stop_at_the_ends_of_the_range() {
        let html = year_links("/average_month", 2019);
        assert!(html.contains(r#"href="/average_month/2018""#));
        assert!(html.contains(r#"href="/average_month/2020""#));

        let html = year_links("/average_month", i32::MAX);
        assert!(html.contains(&format!("/average_month/{}", i32::MAX - 1)));
        assert!(!html.contains("&rarr;"));

        let html = year_links("/customer_value", i32::MIN);
        assert!(html.contains(&format!("/customer_value/{}", i32::MIN + 1)));
        assert!(!html.contains("&larr;"));
    }

    #[test]
    fn issues_are_listed() {
        let issues = vec![DataQualityIssue::MissingField {
            kind: "deal",
            index: 0,
            record_id: Some(3),
            field: "value",
        }];
        let html = deals_page(&[], &issues);
        assert!(html.contains("1 record(s)"));
        assert!(html.contains("`value`"));
    }
}

use chrono::NaiveDate;

use super::summary::ReportSummary;
use crate::athena::{cell_f64, cell_text, QueryResult, Row};

const STYLE: &str = "\
table { border-collapse: collapse; width: 100%; margin-bottom: 20px; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
th { background-color: #f2f2f2; }
tr:nth-child(even) { background-color: #f9f9f9; }
.summary { margin-bottom: 20px; padding: 10px; background-color: #e6f7ff; border-left: 5px solid #1890ff; }
.warning { color: #d46b08; font-weight: bold; }";

/// Escape the characters that matter inside HTML text and attribute
/// positions. Resource ids and tag values are account-controlled input
/// and must never reach the document raw.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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

/// Render the full report document: overall summary, per-service detail
/// table, and the most expensive untagged resources. Rows appear in
/// result order (the queries already sort by cost).
pub fn render_report(
    billing_period: NaiveDate,
    tag_key: &str,
    summary: &ReportSummary,
    by_service: &QueryResult,
    expensive: &QueryResult,
) -> String {
    let mut html = String::new();
    html.push_str("<html>\n<head>\n<style>\n");
    html.push_str(STYLE);
    html.push_str("\n</style>\n</head>\n<body>\n");
    html.push_str("<h1>AWS Cost and Usage Report - Tagging Analysis</h1>\n");
    html.push_str(&format!(
        "<p>Billing Period: {}</p>\n<p>Tag Key Analyzed: {}</p>\n",
        billing_period.format("%Y-%m-%d"),
        escape_html(tag_key)
    ));

    html.push_str("<h2>1. Tagged vs. Untagged Resources by Service</h2>\n");
    push_summary(&mut html, summary);
    push_service_table(&mut html, by_service);

    html.push_str("<h2>2. Most Expensive Untagged Resources</h2>\n");
    push_expensive_table(&mut html, expensive);

    html.push_str(
        "<p>This report was automatically generated. Please do not reply to this email.</p>\n",
    );
    html.push_str("</body>\n</html>\n");
    html
}

fn push_summary(html: &mut String, summary: &ReportSummary) {
    html.push_str("<div class=\"summary\">\n<h3>Overall Tagging Summary</h3>\n");
    html.push_str(&format!(
        "<p>Total Resources: {} | Total Cost: ${:.2}</p>\n",
        summary.total_resources, summary.total_cost
    ));
    html.push_str(&format!(
        "<p>Tagged Resources: {} ({}%) | Tagged Cost: ${:.2} ({}%)</p>\n",
        summary.tagged_resources,
        summary.tagged_resources_percent(),
        summary.tagged_cost,
        summary.tagged_cost_percent()
    ));
    html.push_str(&format!(
        "<p>Untagged Resources: {} ({}%) | Untagged Cost: ${:.2} ({}%)</p>\n",
        summary.untagged_resources,
        summary.untagged_resources_percent(),
        summary.untagged_cost,
        summary.untagged_cost_percent()
    ));
    html.push_str(&format!(
        "<p class=\"warning\">Note: {} resources costing ${:.2} are missing tags!</p>\n</div>\n",
        summary.untagged_resources, summary.untagged_cost
    ));
}

fn push_service_table(html: &mut String, by_service: &QueryResult) {
    html.push_str("<h3>Tagging Details by Service</h3>\n<table>\n<tr>");
    for header in [
        "Service",
        "Total Resources",
        "Total Cost ($)",
        "Tagged Resources",
        "Tagged %",
        "Tagged Cost ($)",
        "Tagged Cost %",
        "Untagged Resources",
        "Untagged %",
        "Untagged Cost ($)",
        "Untagged Cost %",
    ] {
        html.push_str(&format!("<th>{}</th>", header));
    }
    html.push_str("</tr>\n");

    for row in &by_service.rows {
        html.push_str("<tr>");
        push_text_cell(html, row, "service");
        push_text_cell(html, row, "total_resources");
        push_cost_cell(html, row, "total_cost");
        push_text_cell(html, row, "tagged_resources");
        push_percent_cell(html, row, "tagged_resources_percent");
        push_cost_cell(html, row, "tagged_cost");
        push_percent_cell(html, row, "tagged_cost_percent");
        push_text_cell(html, row, "untagged_resources");
        push_percent_cell(html, row, "untagged_resources_percent");
        push_cost_cell(html, row, "untagged_cost");
        push_percent_cell(html, row, "untagged_cost_percent");
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n");
}

fn push_expensive_table(html: &mut String, expensive: &QueryResult) {
    html.push_str("<table>\n<tr>");
    for header in [
        "Service",
        "Resource ID",
        "Product Name",
        "Region",
        "Usage Type",
        "Cost ($)",
    ] {
        html.push_str(&format!("<th>{}</th>", header));
    }
    html.push_str("</tr>\n");

    for row in &expensive.rows {
        html.push_str("<tr>");
        push_text_cell(html, row, "service");
        push_text_cell(html, row, "resource_id");
        push_text_cell(html, row, "product_name");
        push_text_cell(html, row, "region");
        push_text_cell(html, row, "usage_type");
        push_cost_cell(html, row, "cost");
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n");
}

fn push_text_cell(html: &mut String, row: &Row, column: &str) {
    html.push_str(&format!("<td>{}</td>", escape_html(&cell_text(row, column))));
}

fn push_cost_cell(html: &mut String, row: &Row, column: &str) {
    html.push_str(&format!("<td>{:.2}</td>", cell_f64(row, column)));
}

fn push_percent_cell(html: &mut String, row: &Row, column: &str) {
    html.push_str(&format!(
        "<td>{}%</td>",
        escape_html(&cell_text(row, column))
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::athena::CellValue;

    fn period() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn service_result() -> QueryResult {
        let mut row = Row::new();
        row.insert("service".into(), CellValue::Text("AmazonEC2".into()));
        row.insert("total_resources".into(), CellValue::Int(10));
        row.insert("total_cost".into(), CellValue::Float(100.0));
        row.insert("tagged_resources".into(), CellValue::Int(6));
        row.insert("tagged_resources_percent".into(), CellValue::Float(60.0));
        row.insert("tagged_cost".into(), CellValue::Float(70.0));
        row.insert("tagged_cost_percent".into(), CellValue::Float(70.0));
        row.insert("untagged_resources".into(), CellValue::Int(4));
        row.insert("untagged_resources_percent".into(), CellValue::Float(40.0));
        row.insert("untagged_cost".into(), CellValue::Float(30.0));
        row.insert("untagged_cost_percent".into(), CellValue::Float(30.0));
        QueryResult {
            query_execution_id: "qe-1".into(),
            columns: vec!["service".into()],
            rows: vec![row],
            data_scanned_bytes: 0,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<script>alert('x') & \"y\"</script>"),
            "&lt;script&gt;alert(&#39;x&#39;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_empty_results_render_without_body_rows() {
        let summary = ReportSummary::default();
        let empty = QueryResult::default();
        let html = render_report(period(), "user_project", &summary, &empty, &empty);
        // Two header rows, no data rows
        assert_eq!(html.matches("<tr>").count(), 2);
        assert!(html.contains("Total Resources: 0"));
    }

    #[test]
    fn test_service_rows_are_rendered() {
        let result = service_result();
        let summary = ReportSummary::from_rows(&result.rows);
        let html = render_report(
            period(),
            "user_project",
            &summary,
            &result,
            &QueryResult::default(),
        );
        assert!(html.contains("<td>AmazonEC2</td>"));
        assert!(html.contains("<td>100.00</td>"));
        assert!(html.contains("<td>60.0%</td>"));
        assert!(html.contains("Note: 4 resources costing $30.00 are missing tags!"));
    }

    #[test]
    fn test_hostile_resource_id_is_escaped() {
        let mut row = Row::new();
        row.insert(
            "resource_id".into(),
            CellValue::Text("<img src=x onerror=alert(1)>".into()),
        );
        row.insert("cost".into(), CellValue::Float(5.0));
        let expensive = QueryResult {
            rows: vec![row],
            ..Default::default()
        };
        let html = render_report(
            period(),
            "user_project",
            &ReportSummary::default(),
            &QueryResult::default(),
            &expensive,
        );
        assert!(!html.contains("<img src=x"));
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
    }

    #[test]
    fn test_tag_key_is_escaped() {
        let html = render_report(
            period(),
            "<b>key</b>",
            &ReportSummary::default(),
            &QueryResult::default(),
            &QueryResult::default(),
        );
        assert!(html.contains("Tag Key Analyzed: &lt;b&gt;key&lt;/b&gt;"));
    }

    #[test]
    fn test_missing_columns_render_as_na() {
        let mut row = Row::new();
        row.insert("service".into(), CellValue::Text("AmazonS3".into()));
        let expensive = QueryResult {
            rows: vec![row],
            ..Default::default()
        };
        let html = render_report(
            period(),
            "user_project",
            &ReportSummary::default(),
            &QueryResult::default(),
            &expensive,
        );
        assert!(html.contains("<td>N/A</td>"));
    }
}

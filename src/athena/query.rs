use chrono::NaiveDate;

use crate::config::ReporterConfig;
use crate::errors::TagscopeError;

/// The two SQL statements behind one tagging compliance report: a
/// per-service tagged/untagged aggregation and a top-50 list of the most
/// expensive untagged resources.
///
/// Configuration values never reach the SQL verbatim: database and table
/// names must be plain identifiers, the tag key is embedded as a quoted
/// literal with quote doubling, and the billing period is re-rendered
/// from a parsed date.
#[derive(Debug, Clone)]
pub struct TaggingQueries {
    pub tagged_vs_untagged: String,
    pub expensive_untagged: String,
}

impl TaggingQueries {
    pub fn build(config: &ReporterConfig) -> Result<Self, TagscopeError> {
        let database = validate_identifier(&config.database, "DATABASE_NAME")?;
        let table = validate_identifier(&config.table, "TABLE_NAME")?;
        let tag_key = quote_literal(&config.tag_key);
        let period = format_date_literal(config.billing_period);

        Ok(Self {
            tagged_vs_untagged: tagged_vs_untagged_query(database, table, &tag_key, &period),
            expensive_untagged: expensive_untagged_query(database, table, &period),
        })
    }
}

/// Tagged vs. untagged resource distribution by service, restricted to
/// `Usage` line items for one billing period, excluding management and
/// overhead resource ids.
fn tagged_vs_untagged_query(database: &str, table: &str, tag_key: &str, period: &str) -> String {
    format!(
        "\
WITH tag_key_to_search AS (
    SELECT {tag_key} AS key
),
resource_counts AS (
    SELECT
        line_item_product_code AS service,
        line_item_resource_id AS resource_id,
        MAX(CASE WHEN CARDINALITY(MAP_KEYS(resource_tags)) > 0 THEN 1 ELSE 0 END) AS is_tagged,
        MAX(CASE WHEN resource_tags[(SELECT key FROM tag_key_to_search)] IS NOT NULL
                 AND resource_tags[(SELECT key FROM tag_key_to_search)] <> ''
                 THEN 1 ELSE 0 END) AS has_specific_tag,
        SUM(line_item_unblended_cost) AS resource_cost
    FROM {database}.{table}
    WHERE
        line_item_resource_id <> '' AND
        bill_billing_period_start_date = DATE {period} AND
        line_item_line_item_type != 'Credit' AND
        line_item_line_item_type != 'Refund' AND
        line_item_line_item_type = 'Usage' AND
        line_item_resource_id NOT LIKE '%management%' AND
        line_item_resource_id NOT LIKE '%overhead%'
    GROUP BY 1, 2
)
SELECT
    service,
    COUNT(DISTINCT resource_id) AS total_resources,
    SUM(resource_cost) AS total_cost,
    SUM(CASE WHEN is_tagged = 1 THEN 1 ELSE 0 END) AS tagged_resources,
    ROUND(100.0 * SUM(CASE WHEN is_tagged = 1 THEN 1 ELSE 0 END) / COUNT(DISTINCT resource_id), 2) AS tagged_resources_percent,
    SUM(CASE WHEN is_tagged = 1 THEN resource_cost ELSE 0 END) AS tagged_cost,
    ROUND(100.0 * SUM(CASE WHEN is_tagged = 1 THEN resource_cost ELSE 0 END) / SUM(resource_cost), 2) AS tagged_cost_percent,
    SUM(CASE WHEN is_tagged = 0 THEN 1 ELSE 0 END) AS untagged_resources,
    ROUND(100.0 * SUM(CASE WHEN is_tagged = 0 THEN 1 ELSE 0 END) / COUNT(DISTINCT resource_id), 2) AS untagged_resources_percent,
    SUM(CASE WHEN is_tagged = 0 THEN resource_cost ELSE 0 END) AS untagged_cost,
    ROUND(100.0 * SUM(CASE WHEN is_tagged = 0 THEN resource_cost ELSE 0 END) / SUM(resource_cost), 2) AS untagged_cost_percent,
    SUM(CASE WHEN has_specific_tag = 1 THEN 1 ELSE 0 END) AS resources_with_specific_tag,
    ROUND(100.0 * SUM(CASE WHEN has_specific_tag = 1 THEN 1 ELSE 0 END) / COUNT(DISTINCT resource_id), 2) AS specific_tag_resources_percent,
    SUM(CASE WHEN has_specific_tag = 1 THEN resource_cost ELSE 0 END) AS specific_tag_cost,
    ROUND(100.0 * SUM(CASE WHEN has_specific_tag = 1 THEN resource_cost ELSE 0 END) / SUM(resource_cost), 2) AS specific_tag_cost_percent
FROM resource_counts
GROUP BY 1
HAVING COUNT(DISTINCT resource_id) > 0
ORDER BY total_cost DESC"
    )
}

/// The 50 most expensive resources carrying no tags at all, same billing
/// period and exclusion filters.
fn expensive_untagged_query(database: &str, table: &str, period: &str) -> String {
    format!(
        "\
SELECT
    line_item_product_code AS service,
    line_item_resource_id AS resource_id,
    product_region_code AS region,
    product['instance_type'] AS instance_type,
    product['product_name'] AS product_name,
    line_item_usage_type AS usage_type,
    SUM(line_item_unblended_cost) AS cost
FROM {database}.{table}
WHERE
    CARDINALITY(MAP_KEYS(resource_tags)) = 0 AND
    line_item_resource_id <> '' AND
    line_item_line_item_type = 'Usage' AND
    bill_billing_period_start_date = DATE {period} AND
    line_item_resource_id NOT LIKE '%management%' AND
    line_item_resource_id NOT LIKE '%overhead%'
GROUP BY 1, 2, 3, 4, 5, 6
HAVING SUM(line_item_unblended_cost) > 0
ORDER BY 7 DESC
LIMIT 50"
    )
}

fn validate_identifier<'a>(name: &'a str, what: &str) -> Result<&'a str, TagscopeError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(TagscopeError::Config(format!(
            "{} must match [A-Za-z0-9_]+, got {:?}",
            what, name
        )))
    }
}

/// Render a string as a single-quoted SQL literal, doubling embedded
/// quotes.
fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn format_date_literal(date: NaiveDate) -> String {
    format!("'{}'", date.format("%Y-%m-%d"))
}

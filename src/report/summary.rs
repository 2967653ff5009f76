use crate::athena::{cell_f64, cell_i64, Row};

/// Overall tagging metrics, summed across every per-service row of the
/// first query's result. Exists only for the duration of one render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportSummary {
    pub total_resources: i64,
    pub total_cost: f64,
    pub tagged_resources: i64,
    pub tagged_cost: f64,
    pub untagged_resources: i64,
    pub untagged_cost: f64,
}

impl ReportSummary {
    pub fn from_rows(rows: &[Row]) -> Self {
        let mut summary = Self::default();
        for row in rows {
            summary.total_resources += cell_i64(row, "total_resources");
            summary.total_cost += cell_f64(row, "total_cost");
            summary.tagged_resources += cell_i64(row, "tagged_resources");
            summary.tagged_cost += cell_f64(row, "tagged_cost");
            summary.untagged_resources += cell_i64(row, "untagged_resources");
            summary.untagged_cost += cell_f64(row, "untagged_cost");
        }
        summary
    }

    pub fn tagged_resources_percent(&self) -> f64 {
        percent_of(self.tagged_resources as f64, self.total_resources as f64)
    }

    pub fn tagged_cost_percent(&self) -> f64 {
        percent_of(self.tagged_cost, self.total_cost)
    }

    pub fn untagged_resources_percent(&self) -> f64 {
        percent_of(self.untagged_resources as f64, self.total_resources as f64)
    }

    pub fn untagged_cost_percent(&self) -> f64 {
        percent_of(self.untagged_cost, self.total_cost)
    }
}

/// Percentage rounded to two decimals; exactly 0 when the denominator is
/// zero or negative.
fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        round2(100.0 * part / whole)
    } else {
        0.0
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

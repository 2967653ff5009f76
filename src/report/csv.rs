use crate::athena::QueryResult;
use crate::errors::TagscopeError;

/// Serialize a query result back to CSV text for attachment, preserving
/// the original column order.
pub fn result_to_csv(result: &QueryResult) -> Result<String, TagscopeError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&result.columns)?;
    for row in &result.rows {
        let record: Vec<String> = result
            .columns
            .iter()
            .map(|column| {
                row.get(column)
                    .map(|value| value.to_string())
                    .unwrap_or_default()
            })
            .collect();
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| TagscopeError::Internal(format!("flushing CSV attachment: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| TagscopeError::Internal(format!("CSV attachment is not UTF-8: {}", e)))
}

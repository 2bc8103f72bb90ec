use serde_json::{Map, Value};
use std::io;

use super::{format_scalar, is_row_array, result_object};

/// Write output as CSV to stdout.
///
/// Scalar fields go first as two-column `field,value` records. Each array of
/// rows (schedule periods, report breakdowns) follows as its own section: a
/// one-cell record naming it, a header record, then one record per row.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(stdout.lock());

    let records = match result_object(value) {
        Some(result) => csv_records(result),
        None => vec![vec![format_scalar(value)]],
    };
    for record in records {
        let _ = wtr.write_record(&record);
    }

    let _ = wtr.flush();
}

fn csv_records(result: &Map<String, Value>) -> Vec<Vec<String>> {
    let mut records = Vec::new();

    let scalars: Vec<(&String, &Value)> =
        result.iter().filter(|(_, v)| !is_row_array(v)).collect();
    if !scalars.is_empty() {
        records.push(vec!["field".to_string(), "value".to_string()]);
        for (key, val) in scalars {
            records.push(vec![key.clone(), format_scalar(val)]);
        }
    }

    for (key, val) in result {
        if let Value::Array(rows) = val {
            if is_row_array(val) {
                records.push(vec![key.clone()]);
                records.extend(row_records(rows));
            }
        }
    }
    records
}

fn row_records(rows: &[Value]) -> Vec<Vec<String>> {
    let Some(Value::Object(first)) = rows.first() else {
        return Vec::new();
    };
    let headers: Vec<String> = first.keys().cloned().collect();

    let mut records = vec![headers.clone()];
    for row in rows {
        if let Value::Object(map) = row {
            records.push(
                headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_scalar).unwrap_or_default())
                    .collect(),
            );
        }
    }
    records
}

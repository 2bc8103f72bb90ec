use serde_json::Value;

use super::{format_scalar, result_object};

/// Headline field of each command, in priority order.
const PRIORITY_KEYS: [&str; 7] = [
    "emi",
    "total_interest",
    "outstanding_principal",
    "installment",
    "collection_rate",
    "total_loan_amount",
    "total_paid",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(value));
}

fn minimal_line(value: &Value) -> String {
    let Some(map) = result_object(value) else {
        return format_scalar(value);
    };

    for key in PRIORITY_KEYS {
        if let Some(val) = map.get(key) {
            if !val.is_null() {
                return format_scalar(val);
            }
        }
    }

    match map.iter().next() {
        Some((key, val)) => format!("{}: {}", key, format_scalar(val)),
        None => String::new(),
    }
}

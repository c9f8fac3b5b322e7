//! Output schema and validating decoder for statement replies.
//!
//! The service is asked to answer in JSON constrained by
//! [`statement_schema`]. It usually honours the schema, but nothing on this
//! side of the wire guarantees it, so [`decode_statement`] parses the reply
//! into an untyped [`Value`] first and then checks every required field and
//! its JSON type before building a [`StatementRecord`]. Any deviation is a
//! schema error and no record is produced.

use crate::error::ExtractionError;
use crate::model::{StatementRecord, TransactionEntry};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::debug;

/// Top-level fields every reply must carry.
pub const REQUIRED_FIELDS: [&str; 7] = [
    "issuerName",
    "cardVariant",
    "cardLast4",
    "billingCycle",
    "dueDate",
    "totalBalance",
    "transactions",
];

/// Fields every transaction object must carry.
pub const TRANSACTION_FIELDS: [&str; 3] = ["date", "description", "amount"];

/// Response schema in the OpenAPI subset accepted by `generationConfig.responseSchema`.
pub fn statement_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "issuerName": { "type": "STRING", "description": "Name of the card issuer." },
            "cardVariant": { "type": "STRING", "description": "The specific variant of the card (e.g., Gold, Platinum)." },
            "cardLast4": { "type": "STRING", "description": "Last 4 digits of the card number." },
            "billingCycle": { "type": "STRING", "description": "The billing cycle period (e.g., 'MM/DD/YYYY - MM/DD/YYYY')." },
            "dueDate": { "type": "STRING", "description": "The payment due date." },
            "totalBalance": { "type": "NUMBER", "description": "The total balance due." },
            "transactions": {
                "type": "ARRAY",
                "description": "A list of transactions from the statement.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "date": { "type": "STRING", "description": "Date of the transaction." },
                        "description": { "type": "STRING", "description": "Description of the transaction." },
                        "amount": { "type": "NUMBER", "description": "Amount of the transaction." }
                    },
                    "required": TRANSACTION_FIELDS
                }
            }
        },
        "required": REQUIRED_FIELDS
    })
}

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?\s*\n(.*)\n```\s*$").unwrap());

/// Remove a Markdown code fence wrapped around the whole reply, if any.
///
/// JSON mode normally returns bare JSON; some models still fence it.
pub fn strip_code_fence(input: &str) -> &str {
    let trimmed = input.trim();
    match RE_OUTER_FENCES.captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => trimmed,
    }
}

/// Parse and validate a reply into a [`StatementRecord`].
///
/// Values are copied verbatim; transaction order is preserved. Unknown extra
/// fields are ignored.
pub fn decode_statement(reply: &str) -> Result<StatementRecord, ExtractionError> {
    let text = strip_code_fence(reply);
    if text.is_empty() {
        return Err(ExtractionError::EmptyReply {
            detail: "reply text is empty".into(),
        });
    }

    let value: Value = serde_json::from_str(text).map_err(|e| ExtractionError::MalformedReply {
        detail: e.to_string(),
    })?;

    let obj = value.as_object().ok_or_else(|| ExtractionError::WrongType {
        field: "<root>".into(),
        expected: "object",
        found: type_name(&value),
    })?;

    let transactions = require(obj, "transactions", "")?
        .as_array()
        .ok_or_else(|| wrong_type(obj, "transactions", "", "array"))?
        .iter()
        .enumerate()
        .map(|(i, item)| decode_transaction(item, i))
        .collect::<Result<Vec<_>, _>>()?;

    let record = StatementRecord {
        issuer_name: require_text(obj, "issuerName", "", true)?,
        card_variant: require_text(obj, "cardVariant", "", true)?,
        card_last4: require_text(obj, "cardLast4", "", false)?,
        billing_cycle: require_text(obj, "billingCycle", "", false)?,
        due_date: require_text(obj, "dueDate", "", false)?,
        total_balance: require_number(obj, "totalBalance", "")?,
        transactions,
    };

    debug!(
        "Decoded statement from {}: {} transactions",
        record.issuer_name,
        record.transactions.len()
    );
    Ok(record)
}

fn decode_transaction(item: &Value, index: usize) -> Result<TransactionEntry, ExtractionError> {
    let prefix = format!("transactions[{index}].");
    let obj = item.as_object().ok_or_else(|| ExtractionError::WrongType {
        field: format!("transactions[{index}]"),
        expected: "object",
        found: type_name(item),
    })?;

    Ok(TransactionEntry {
        date: require_text(obj, "date", &prefix, false)?,
        description: require_text(obj, "description", &prefix, true)?,
        amount: require_number(obj, "amount", &prefix)?,
    })
}

fn require<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    prefix: &str,
) -> Result<&'a Value, ExtractionError> {
    obj.get(key).ok_or_else(|| ExtractionError::MissingField {
        field: format!("{prefix}{key}"),
    })
}

fn require_text(
    obj: &Map<String, Value>,
    key: &str,
    prefix: &str,
    non_empty: bool,
) -> Result<String, ExtractionError> {
    let s = require(obj, key, prefix)?
        .as_str()
        .ok_or_else(|| wrong_type(obj, key, prefix, "string"))?;
    if non_empty && s.trim().is_empty() {
        return Err(ExtractionError::EmptyField {
            field: format!("{prefix}{key}"),
        });
    }
    Ok(s.to_string())
}

// Numeric strings such as "523.45" are rejected, not coerced.
fn require_number(
    obj: &Map<String, Value>,
    key: &str,
    prefix: &str,
) -> Result<f64, ExtractionError> {
    require(obj, key, prefix)?
        .as_f64()
        .ok_or_else(|| wrong_type(obj, key, prefix, "number"))
}

fn wrong_type(
    obj: &Map<String, Value>,
    key: &str,
    prefix: &str,
    expected: &'static str,
) -> ExtractionError {
    ExtractionError::WrongType {
        field: format!("{prefix}{key}"),
        expected,
        found: obj.get(key).map(type_name).unwrap_or("nothing"),
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const CHASE: &str = r#"{
        "issuerName": "Chase",
        "cardVariant": "Sapphire Preferred",
        "cardLast4": "1234",
        "billingCycle": "09/01/2023 - 09/30/2023",
        "dueDate": "10/15/2023",
        "totalBalance": 523.45,
        "transactions": [
            {"date": "09/05/2023", "description": "Coffee Shop", "amount": 4.50},
            {"date": "09/07/2023", "description": "Refund", "amount": -20.00},
            {"date": "09/09/2023", "description": "Bookstore", "amount": 31}
        ]
    }"#;

    fn without(field: &str) -> String {
        let mut v: Value = serde_json::from_str(CHASE).unwrap();
        v.as_object_mut().unwrap().remove(field);
        v.to_string()
    }

    #[test]
    fn decodes_fields_verbatim_and_in_order() {
        let r = decode_statement(CHASE).unwrap();
        assert_eq!(r.issuer_name, "Chase");
        assert_eq!(r.card_variant, "Sapphire Preferred");
        assert_eq!(r.card_last4, "1234");
        assert_eq!(r.billing_cycle, "09/01/2023 - 09/30/2023");
        assert_eq!(r.due_date, "10/15/2023");
        assert_eq!(r.total_balance, 523.45);
        let descriptions: Vec<&str> = r
            .transactions
            .iter()
            .map(|t| t.description.as_str())
            .collect();
        assert_eq!(descriptions, ["Coffee Shop", "Refund", "Bookstore"]);
        assert_eq!(r.transactions[1].amount, -20.0);
        assert_eq!(r.transactions[2].amount, 31.0);
    }

    #[test]
    fn every_missing_top_level_field_is_rejected() {
        for field in REQUIRED_FIELDS {
            let err = decode_statement(&without(field)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Schema, "field {field}");
            assert!(
                matches!(&err, ExtractionError::MissingField { field: f } if f == field),
                "field {field}: {err}"
            );
        }
    }

    #[test]
    fn missing_transaction_field_is_rejected() {
        let reply = CHASE.replace(r#""description": "Refund", "#, "");
        let err = decode_statement(&reply).unwrap_err();
        assert!(
            matches!(&err, ExtractionError::MissingField { field } if field == "transactions[1].description"),
            "{err}"
        );
    }

    #[test]
    fn numeric_string_balance_is_rejected() {
        let reply = CHASE.replace("523.45", "\"523.45\"");
        let err = decode_statement(&reply).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::WrongType {
                expected: "number",
                found: "string",
                ..
            }
        ));
    }

    #[test]
    fn null_field_is_wrong_type() {
        let reply = CHASE.replace("\"1234\"", "null");
        let err = decode_statement(&reply).unwrap_err();
        assert!(matches!(err, ExtractionError::WrongType { found: "null", .. }));
    }

    #[test]
    fn blank_issuer_is_rejected() {
        let reply = CHASE.replace("\"Chase\"", "\"  \"");
        let err = decode_statement(&reply).unwrap_err();
        assert!(matches!(err, ExtractionError::EmptyField { .. }));
    }

    #[test]
    fn empty_transaction_list_is_valid() {
        let mut v: Value = serde_json::from_str(CHASE).unwrap();
        v["transactions"] = json!([]);
        let r = decode_statement(&v.to_string()).unwrap();
        assert!(r.transactions.is_empty());
    }

    #[test]
    fn plain_text_reply_is_malformed() {
        let err = decode_statement("I could not find a statement in this file.").unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedReply { .. }));
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn array_root_is_wrong_type() {
        let err = decode_statement("[1, 2]").unwrap_err();
        assert!(matches!(err, ExtractionError::WrongType { expected: "object", .. }));
    }

    #[test]
    fn blank_reply_is_empty() {
        let err = decode_statement("  \n ").unwrap_err();
        assert!(matches!(err, ExtractionError::EmptyReply { .. }));
    }

    #[test]
    fn fenced_reply_is_unwrapped() {
        let fenced = format!("```json\n{CHASE}\n```");
        let r = decode_statement(&fenced).unwrap();
        assert_eq!(r.issuer_name, "Chase");
        assert_eq!(strip_code_fence("{}"), "{}");
    }

    #[test]
    fn schema_requires_all_fields() {
        let s = statement_schema();
        let required: Vec<&str> = s["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(required, REQUIRED_FIELDS);
        assert_eq!(s["properties"]["totalBalance"]["type"], "NUMBER");
        assert_eq!(
            s["properties"]["transactions"]["items"]["required"],
            json!(["date", "description", "amount"])
        );
        assert_eq!(
            s["properties"]["transactions"]["items"]["properties"]["amount"]["type"],
            "NUMBER"
        );
    }
}

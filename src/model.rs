//! Extraction result types.
//!
//! A [`StatementRecord`] is only ever built by
//! [`crate::schema::decode_statement`], which validates every required field
//! first. The types derive `Deserialize` for callers that reload JSON they
//! produced themselves (`--json` output), not for decoding service replies.

use serde::{Deserialize, Serialize};

/// One line item of a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEntry {
    /// Transaction date as printed on the statement.
    pub date: String,
    pub description: String,
    /// Signed amount in the statement currency.
    pub amount: f64,
}

/// Structured data extracted from one credit-card statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementRecord {
    /// Bank or institution, e.g. "Chase".
    pub issuer_name: String,
    /// Card product, e.g. "Sapphire Preferred".
    pub card_variant: String,
    /// Last four digits of the card number. Free text; not checked for digits.
    pub card_last4: String,
    /// Statement period, e.g. "09/01/2023 - 09/30/2023".
    pub billing_cycle: String,
    pub due_date: String,
    pub total_balance: f64,
    /// Transactions in statement order.
    pub transactions: Vec<TransactionEntry>,
}

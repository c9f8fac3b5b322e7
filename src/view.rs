//! Plain-text rendering of a session snapshot.
//!
//! Everything here is a pure function of `&AppState` (or of a record), so the
//! CLI can redraw after every state change and tests can assert on the exact
//! text a user would see.

use crate::model::{StatementRecord, TransactionEntry};
use crate::state::{AppState, Phase};
use std::fmt::Write as _;

/// Format an amount as US dollars: `$1,234.56`, `-$12.00`.
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u128;
    let negative = amount < 0.0 && cents != 0;
    let dollars = (cents / 100).to_string();

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, ch) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!(
        "{}${}.{:02}",
        if negative { "-" } else { "" },
        grouped,
        cents % 100
    )
}

/// Card number display with only the last four digits visible.
pub fn masked_card_number(last4: &str) -> String {
    format!("**** **** **** {last4}")
}

/// Label/value rows of the summary panel, in display order.
pub fn summary_rows(record: &StatementRecord) -> Vec<(&'static str, String)> {
    vec![
        ("Card Issuer", record.issuer_name.clone()),
        ("Card Variant", record.card_variant.clone()),
        ("Card Number", masked_card_number(&record.card_last4)),
        ("Billing Cycle", record.billing_cycle.clone()),
        ("Payment Due Date", record.due_date.clone()),
        ("Total Balance", format_currency(record.total_balance)),
    ]
}

/// Render the whole view for `state`.
pub fn render_state(state: &AppState) -> String {
    match state.phase {
        Phase::Idle => render_idle(state),
        Phase::Processing => {
            "Analyzing your document...\nThis may take a moment. Please wait.\n".to_string()
        }
        Phase::Success => match &state.result {
            Some(record) => render_record(record),
            None => render_idle(state),
        },
        Phase::Error => render_error(state.error_message.as_deref().unwrap_or("")),
    }
}

fn render_idle(state: &AppState) -> String {
    let mut out = String::from("Select a PDF statement file to parse.\n");
    if let Some(input) = &state.selected_input {
        let _ = writeln!(out, "File selected: {}", input.file_name);
    }
    out
}

/// Render the results panel for a successful extraction.
pub fn render_record(record: &StatementRecord) -> String {
    let mut out = String::new();
    out.push_str("Extraction Complete\n");
    out.push_str("Successfully parsed your statement.\n\n");

    let rows = summary_rows(record);
    let label_width = rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
    for (label, value) in &rows {
        let _ = writeln!(out, "{label:<label_width$}  {value}");
    }

    out.push('\n');
    out.push_str(&render_transactions(&record.transactions));
    out
}

/// Transaction table, or a notice when there are none.
pub fn render_transactions(transactions: &[TransactionEntry]) -> String {
    if transactions.is_empty() {
        return "No transactions found in this statement.\n".to_string();
    }

    let amounts: Vec<String> = transactions
        .iter()
        .map(|t| format_currency(t.amount))
        .collect();
    let date_w = column_width("Date", transactions.iter().map(|t| t.date.as_str()));
    let desc_w = column_width(
        "Description",
        transactions.iter().map(|t| t.description.as_str()),
    );
    let amount_w = column_width("Amount", amounts.iter().map(String::as_str));

    let mut out = String::from("Transactions\n");
    let _ = writeln!(
        out,
        "{:<date_w$}  {:<desc_w$}  {:>amount_w$}",
        "Date", "Description", "Amount"
    );
    let _ = writeln!(
        out,
        "{}  {}  {}",
        "-".repeat(date_w),
        "-".repeat(desc_w),
        "-".repeat(amount_w)
    );
    for (t, amount) in transactions.iter().zip(&amounts) {
        let _ = writeln!(
            out,
            "{:<date_w$}  {:<desc_w$}  {:>amount_w$}",
            t.date, t.description, amount
        );
    }
    out
}

fn render_error(message: &str) -> String {
    format!("Parsing Failed\n{message}\n\nReset and select a file to try again.\n")
}

fn column_width<'a>(header: &str, cells: impl Iterator<Item = &'a str>) -> usize {
    cells
        .map(|c| c.chars().count())
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0)
}

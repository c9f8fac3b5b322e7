//! Instruction prompt for statement extraction.
//!
//! The prompt names the same seven fields as the response schema in
//! [`crate::schema`]. The schema is what the service enforces; the prompt
//! tells the model what each field means. Edit both together.

/// Fixed instruction sent alongside every statement PDF.
pub const EXTRACTION_PROMPT: &str = r#"You are an expert financial data extraction tool. Analyze the provided credit card statement PDF and extract the following information precisely:
1.  Card Issuer: The name of the bank or financial institution (e.g., "Chase", "American Express", "Citi").
2.  Card Variant: The specific type of card (e.g., "Sapphire Preferred", "Gold Card", "Double Cash").
3.  Card Last 4 Digits: The last four digits of the credit card number.
4.  Billing Cycle: The start and end date of the statement period (e.g., "09/01/2023 - 09/30/2023").
5.  Payment Due Date: The date by which the payment must be made.
6.  Total Balance: The total balance that needs to be paid.
7.  Transactions: A list of all transactions, including date, description, and amount for each.

Return the extracted information in the specified JSON format. Ensure the totalBalance and transaction amounts are numbers, not strings."#;

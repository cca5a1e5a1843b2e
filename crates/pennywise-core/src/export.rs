//! CSV export of the transaction list
//!
//! Columns are `Date,Description,Amount,Type,Category`. Only the
//! description is quoted (with embedded quotes doubled); the other columns
//! come from fixed vocabularies and numbers, so they are written as-is.
//! Rows follow the order of the input slice, which for the ledger is
//! most-recent-first.

use chrono::{Local, TimeZone};

use crate::models::Transaction;

/// MIME type for the export payload
pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Suggested download file name
pub const EXPORT_FILE_NAME: &str = "financial_report.csv";

pub const CSV_HEADER: &str = "Date,Description,Amount,Type,Category";

/// Options for transaction export
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// chrono format string for the date column (default: en-US short date, `3/7/2024`)
    pub date_format: String,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            date_format: "%-m/%-d/%Y".to_string(),
        }
    }
}

/// Export transactions to CSV, formatting dates in local time
pub fn transactions_csv(transactions: &[Transaction], opts: &CsvOptions) -> String {
    transactions_csv_in(transactions, opts, &Local)
}

/// Export transactions to CSV, formatting dates in `tz`
pub fn transactions_csv_in<Tz>(transactions: &[Transaction], opts: &CsvOptions, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut csv = String::from(CSV_HEADER);
    csv.push('\n');

    for tx in transactions {
        let date = tx.date.with_timezone(tz).format(&opts.date_format);
        csv.push_str(&format!(
            "{},{},{},{},{}\n",
            date,
            quote_field(&tx.description),
            tx.amount,
            tx.kind,
            tx.category
        ));
    }

    tracing::debug!(rows = transactions.len(), "Exported transactions to CSV");
    csv
}

/// Always quote, doubling any embedded quotes
fn quote_field(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, TransactionType};
    use chrono::Utc;

    fn tx(description: &str, amount: f64, kind: TransactionType, category: Category) -> Transaction {
        Transaction::new(
            Utc.with_ymd_and_hms(2024, 3, 7, 15, 0, 0).unwrap(),
            description,
            amount,
            kind,
            category,
        )
        .unwrap()
    }

    #[test]
    fn test_quote_field() {
        assert_eq!(quote_field("simple"), "\"simple\"");
        assert_eq!(quote_field("with,comma"), "\"with,comma\"");
        assert_eq!(
            quote_field(r#"He said "hi", friend"#),
            r#""He said ""hi"", friend""#
        );
    }

    #[test]
    fn test_empty_export_is_header_only() {
        let csv = transactions_csv_in(&[], &CsvOptions::default(), &Utc);
        assert_eq!(csv, "Date,Description,Amount,Type,Category\n");
    }

    #[test]
    fn test_export_rows() {
        let txs = vec![
            tx("Coffee Shop", 5.75, TransactionType::Expense, Category::Food),
            tx("Monthly Salary", 3000.0, TransactionType::Income, Category::Income),
        ];

        let csv = transactions_csv_in(&txs, &CsvOptions::default(), &Utc);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "3/7/2024,\"Coffee Shop\",5.75,expense,Food");
        assert_eq!(lines[2], "3/7/2024,\"Monthly Salary\",3000,income,Income");
    }

    #[test]
    fn test_export_escapes_description() {
        let txs = vec![tx(
            r#"He said "hi", friend"#,
            12.0,
            TransactionType::Expense,
            Category::Other,
        )];

        let csv = transactions_csv_in(&txs, &CsvOptions::default(), &Utc);
        assert!(csv.contains(r#","He said ""hi"", friend","#));
    }

    #[test]
    fn test_custom_date_format_and_timezone() {
        let txs = vec![tx("Late", 1.0, TransactionType::Expense, Category::Food)];
        let opts = CsvOptions {
            date_format: "%Y-%m-%d".to_string(),
        };
        let tokyo = chrono::FixedOffset::east_opt(9 * 3600).unwrap();

        // 15:00 UTC is already the next day at UTC+9
        let csv = transactions_csv_in(&txs, &opts, &tokyo);
        assert!(csv.lines().nth(1).unwrap().starts_with("2024-03-08,"));
    }

    #[test]
    fn test_export_keeps_input_order() {
        let txs = vec![
            tx("b", 2.0, TransactionType::Expense, Category::Food),
            tx("a", 1.0, TransactionType::Expense, Category::Food),
        ];
        let csv = transactions_csv_in(&txs, &CsvOptions::default(), &Utc);
        let descriptions: Vec<_> = csv
            .lines()
            .skip(1)
            .map(|l| l.split(',').nth(1).unwrap())
            .collect();
        assert_eq!(descriptions, vec!["\"b\"", "\"a\""]);
    }
}

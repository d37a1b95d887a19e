//! Persisted transaction records

use rusqlite::params;
use sha2::{Digest, Sha256};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{
    CategorizationResult, CategorySource, PaymentMethod, ReferenceSymbols, StoredTransaction,
    TransactionDraft,
};

/// Deduplication hash over the raw notification body
pub fn notification_hash(raw_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_text.as_bytes());
    hex::encode(hasher.finalize())
}

fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<StoredTransaction> {
    let occurred_at: String = row.get(1)?;
    let payment_method: String = row.get(7)?;
    let category_source: String = row.get(13)?;
    let created_at: String = row.get(17)?;

    Ok(StoredTransaction {
        id: row.get(0)?,
        occurred_at: chrono::NaiveDateTime::parse_from_str(&occurred_at, "%Y-%m-%d %H:%M:%S")
            .unwrap_or_default(),
        amount: row.get(2)?,
        currency: row.get(3)?,
        counterparty_name: row.get(4)?,
        counterparty_account: row.get(5)?,
        description: row.get(6)?,
        payment_method: payment_method.parse().unwrap_or(PaymentMethod::Other),
        reference_symbols: ReferenceSymbols {
            variable: row.get(8)?,
            constant: row.get(9)?,
            specific: row.get(10)?,
        },
        environmental_cost: row.get(11)?,
        category_id: row.get(12)?,
        category_source: category_source.parse().unwrap_or(CategorySource::None),
        category_confidence: row.get(14)?,
        notification_hash: row.get(15)?,
        raw_text: row.get(16)?,
        created_at: parse_datetime(&created_at),
    })
}

const TRANSACTION_COLUMNS: &str =
    "id, occurred_at, amount, currency, counterparty_name, counterparty_account, description, \
     payment_method, variable_symbol, constant_symbol, specific_symbol, environmental_cost, \
     category_id, category_source, category_confidence, notification_hash, raw_text, created_at";

impl Database {
    /// Insert a draft together with its categorization
    ///
    /// Returns None when a record with the same notification hash already
    /// exists (the notification was processed before).
    pub fn insert_transaction(
        &self,
        draft: &TransactionDraft,
        result: &CategorizationResult,
        raw_text: &str,
    ) -> Result<Option<i64>> {
        let conn = self.conn()?;
        let hash = notification_hash(raw_text);

        let inserted = conn.execute(
            r#"
            INSERT OR IGNORE INTO transactions (
                occurred_at, amount, currency, counterparty_name, counterparty_account,
                description, payment_method, variable_symbol, constant_symbol,
                specific_symbol, environmental_cost, category_id, category_source,
                category_confidence, notification_hash, raw_text
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                draft.occurred_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                draft.amount,
                draft.currency,
                draft.counterparty_name,
                draft.counterparty_account,
                draft.description,
                draft.payment_method.as_str(),
                draft.reference_symbols.variable,
                draft.reference_symbols.constant,
                draft.reference_symbols.specific,
                draft.environmental_cost,
                result.category_id,
                result.source.as_str(),
                result.confidence,
                hash,
                raw_text,
            ],
        )?;

        if inserted == 0 {
            return Ok(None);
        }
        Ok(Some(conn.last_insert_rowid()))
    }

    /// Fetch one transaction by id
    pub fn get_transaction(&self, id: i64) -> Result<StoredTransaction> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM transactions WHERE id = ?", TRANSACTION_COLUMNS),
            params![id],
            row_to_transaction,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                Error::NotFound(format!("transaction {}", id))
            }
            other => Error::Database(other),
        })
    }

    /// Transactions that fell through the whole cascade
    pub fn list_uncategorized_transactions(&self) -> Result<Vec<StoredTransaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE category_id IS NULL ORDER BY occurred_at",
            TRANSACTION_COLUMNS
        ))?;
        let transactions = stmt
            .query_map([], row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(transactions)
    }

    /// Overwrite a transaction's category assignment
    pub fn set_transaction_category(
        &self,
        id: i64,
        category_id: Option<i64>,
        source: CategorySource,
        confidence: f64,
    ) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            r#"
            UPDATE transactions
            SET category_id = ?, category_source = ?, category_confidence = ?
            WHERE id = ?
            "#,
            params![category_id, source.as_str(), confidence, id],
        )?;

        if updated == 0 {
            return Err(Error::NotFound(format!("transaction {}", id)));
        }
        Ok(())
    }
}

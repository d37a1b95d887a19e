//! End-to-end notification processing
//!
//! Ties the extractor, store, and categorizer together: raw text in,
//! categorized stored transaction out. The upstream delivery channel (IMAP
//! poller, webhook) and the dashboard live outside this crate and call in
//! through these entry points.

use tracing::{debug, info, warn};

use crate::ai::AIClient;
use crate::categorize::{CategorizationContext, Categorizer};
use crate::db::Database;
use crate::error::Result;
use crate::extract::Extractor;
use crate::models::{
    CategorizationResult, CategorySource, RuleProvenance, StoredTransaction, TransactionDraft,
};

/// What happened to one processed notification
#[derive(Debug, Clone)]
pub enum ProcessOutcome {
    /// A new transaction was recorded
    Saved {
        transaction_id: i64,
        categorization: CategorizationResult,
    },
    /// The same notification was processed before; nothing was written
    Duplicate,
}

/// Counters from a backlog categorization run
#[derive(Debug, Clone, Default)]
pub struct BacklogResult {
    pub transactions_processed: i64,
    pub transactions_categorized: i64,
    pub by_income: i64,
    pub by_rule: i64,
    pub by_keyword: i64,
    pub by_ai: i64,
    pub still_uncategorized: i64,
}

/// Notification processor with injected store and classifier handles
pub struct Processor<'a> {
    db: &'a Database,
    extractor: Extractor,
    categorizer: Categorizer<'a>,
}

impl<'a> Processor<'a> {
    pub fn new(db: &'a Database, ai: Option<&'a AIClient>) -> Self {
        Self {
            db,
            extractor: Extractor::new(),
            categorizer: Categorizer::new(db, ai),
        }
    }

    /// Process one notification text start to finish
    ///
    /// Extraction failure rejects the notification before anything is
    /// persisted. Categorization trouble never blocks recording: the record
    /// lands first (uncategorized) and the assignment is written after the
    /// cascade finishes.
    pub async fn process(
        &self,
        raw_text: &str,
        context: &CategorizationContext,
    ) -> Result<ProcessOutcome> {
        let draft = self.extractor.extract(raw_text)?;
        debug!(
            counterparty = %draft.counterparty_name,
            amount = draft.amount,
            "Extracted draft"
        );

        let transaction_id = match self
            .db
            .insert_transaction(&draft, &CategorizationResult::uncategorized(), raw_text)?
        {
            Some(id) => id,
            None => {
                debug!("Notification already processed, skipping");
                return Ok(ProcessOutcome::Duplicate);
            }
        };

        let categorization = self.categorizer.categorize(&draft, context).await?;
        self.db.set_transaction_category(
            transaction_id,
            categorization.category_id,
            categorization.source,
            categorization.confidence,
        )?;

        info!(
            transaction_id,
            counterparty = %draft.counterparty_name,
            amount = draft.amount,
            source = %categorization.source,
            "Recorded transaction"
        );

        Ok(ProcessOutcome::Saved {
            transaction_id,
            categorization,
        })
    }

    /// Apply a user's category correction and learn from it
    ///
    /// The correction always wins: confidence 1.0, manual provenance,
    /// superseding any earlier classifier guess for the same counterparty.
    /// Income transactions are corrected but never learned.
    pub fn correct_category(&self, transaction_id: i64, category_id: i64) -> Result<()> {
        let transaction = self.db.get_transaction(transaction_id)?;

        self.db.set_transaction_category(
            transaction_id,
            Some(category_id),
            CategorySource::Manual,
            1.0,
        )?;

        if transaction.amount > 0.0 {
            debug!(transaction_id, "Income correction, not learning");
            return Ok(());
        }

        self.categorizer.learn(
            &transaction.counterparty_name,
            category_id,
            RuleProvenance::Manual,
            1.0,
        )?;
        Ok(())
    }

    /// Re-run the cascade over every stored uncategorized transaction
    ///
    /// Useful after rules have been learned or categories added; each record
    /// gets a single fresh attempt and failures leave it uncategorized.
    pub async fn categorize_backlog(&self, context: &CategorizationContext) -> Result<BacklogResult> {
        let backlog = self.db.list_uncategorized_transactions()?;
        let mut result = BacklogResult::default();

        for transaction in backlog {
            result.transactions_processed += 1;
            let draft = draft_from_stored(&transaction);

            let categorization = match self.categorizer.categorize(&draft, context).await {
                Ok(c) => c,
                Err(e) => {
                    warn!(transaction_id = transaction.id, error = %e, "Backlog categorization failed");
                    result.still_uncategorized += 1;
                    continue;
                }
            };

            if categorization.category_id.is_none() {
                result.still_uncategorized += 1;
                continue;
            }

            self.db.set_transaction_category(
                transaction.id,
                categorization.category_id,
                categorization.source,
                categorization.confidence,
            )?;

            result.transactions_categorized += 1;
            match categorization.source {
                CategorySource::Income => result.by_income += 1,
                CategorySource::Rule => result.by_rule += 1,
                CategorySource::Keyword => result.by_keyword += 1,
                CategorySource::Ai => result.by_ai += 1,
                CategorySource::Manual | CategorySource::None => {}
            }
        }

        info!(
            processed = result.transactions_processed,
            categorized = result.transactions_categorized,
            "Backlog categorization finished"
        );
        Ok(result)
    }
}

/// Rebuild a draft from a stored record so the cascade can re-run on it
fn draft_from_stored(transaction: &StoredTransaction) -> TransactionDraft {
    TransactionDraft {
        occurred_at: transaction.occurred_at,
        amount: transaction.amount,
        currency: transaction.currency.clone(),
        counterparty_account: transaction.counterparty_account.clone(),
        description: transaction.description.clone(),
        counterparty_name: transaction.counterparty_name.clone(),
        payment_method: transaction.payment_method,
        reference_symbols: transaction.reference_symbols.clone(),
        environmental_cost: transaction.environmental_cost,
    }
}

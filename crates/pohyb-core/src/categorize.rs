//! Categorization decision pipeline and rule learning
//!
//! The cascade is a strict ordered short-circuit: income shortcut → learned
//! rules → keyword heuristics → external classifier → uncategorized.
//! Confidence values are advisory metadata and never change which branch is
//! taken. Classifier failures degrade; they are never surfaced to the caller.

use tracing::{debug, warn};

use crate::ai::{AIBackend, AIClient, ClassificationRequest};
use crate::db::Database;
use crate::error::Result;
use crate::keywords::KeywordTable;
use crate::models::{
    CategorizationResult, Category, CategorySource, MatchType, MerchantRule, NewMerchantRule,
    RuleProvenance, TransactionDraft,
};

/// Confidence attached to keyword-table matches
const KEYWORD_CONFIDENCE: f64 = 0.9;

/// Caller-supplied hints that are not part of the draft but sharpen the
/// classifier when present (payment purpose, note for the recipient)
#[derive(Debug, Clone, Default)]
pub struct CategorizationContext {
    pub counterparty_purpose: Option<String>,
    pub recipient_note: Option<String>,
}

/// Canonical form of a counterparty name used as the rule-store key
pub fn normalize_counterparty(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Categorization engine with injected store, classifier, and keyword table
pub struct Categorizer<'a> {
    db: &'a Database,
    ai: Option<&'a AIClient>,
    keywords: KeywordTable,
}

impl<'a> Categorizer<'a> {
    /// Create a categorizer with the built-in keyword table
    pub fn new(db: &'a Database, ai: Option<&'a AIClient>) -> Self {
        Self {
            db,
            ai,
            keywords: KeywordTable::default(),
        }
    }

    /// Create a categorizer with a custom keyword table
    pub fn with_keywords(db: &'a Database, ai: Option<&'a AIClient>, keywords: KeywordTable) -> Self {
        Self { db, ai, keywords }
    }

    /// Run the decision cascade over one draft
    ///
    /// Never fails on classifier or advisory-lookup trouble; those degrade to
    /// the uncategorized outcome. Store errors on the income path and on
    /// learned-rule writes do propagate (retryable).
    pub async fn categorize(
        &self,
        draft: &TransactionDraft,
        context: &CategorizationContext,
    ) -> Result<CategorizationResult> {
        // 1. Credits are income, unconditionally. Never classified, never learned.
        if draft.amount > 0.0 {
            let category_id = self.db.get_or_create_income_category()?;
            debug!(counterparty = %draft.counterparty_name, "Income shortcut");
            return Ok(CategorizationResult {
                category_id: Some(category_id),
                source: CategorySource::Income,
                confidence: 1.0,
            });
        }

        // 2. Learned rules
        if let Some(result) = self.find_by_rules(&draft.counterparty_name) {
            return Ok(result);
        }

        // 3. Keyword heuristics
        if let Some(result) = self.find_by_keywords(&draft.counterparty_name, &draft.description) {
            return Ok(result);
        }

        // 4. External classifier
        if let Some(result) = self.classify_with_ai(draft, context).await? {
            return Ok(result);
        }

        // 5. Everything fell through; flag for review
        debug!(counterparty = %draft.counterparty_name, "No category found");
        Ok(CategorizationResult::uncategorized())
    }

    /// Rule store lookup: exact match on the normalized counterparty first,
    /// then the contains scan in precedence order (substring in either
    /// direction). Lookup is advisory: store errors degrade to "no rule".
    fn find_by_rules(&self, counterparty: &str) -> Option<CategorizationResult> {
        let normalized = normalize_counterparty(counterparty);

        match self.db.find_rule_exact(&normalized) {
            Ok(Some(rule)) => {
                debug!(counterparty = %counterparty, category_id = rule.category_id, "Rule match (exact)");
                return Some(self.rule_hit(&rule));
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Rule store lookup failed, continuing without rules");
                return None;
            }
        }

        let rules = match self.db.find_rules_contains() {
            Ok(rules) => rules,
            Err(e) => {
                warn!(error = %e, "Rule store scan failed, continuing without rules");
                return None;
            }
        };

        for rule in rules {
            let pattern = rule.pattern.to_uppercase();
            if normalized.contains(&pattern) || pattern.contains(&normalized) {
                debug!(
                    counterparty = %counterparty,
                    pattern = %rule.pattern,
                    category_id = rule.category_id,
                    "Rule match (contains)"
                );
                return Some(self.rule_hit(&rule));
            }
        }

        None
    }

    fn rule_hit(&self, rule: &MerchantRule) -> CategorizationResult {
        if let Err(e) = self.db.increment_rule_usage(rule.id) {
            warn!(rule_id = rule.id, error = %e, "Failed to record rule usage");
        }
        CategorizationResult {
            category_id: Some(rule.category_id),
            source: CategorySource::Rule,
            confidence: rule.confidence,
        }
    }

    /// Keyword-table lookup over counterparty and description
    fn find_by_keywords(&self, counterparty: &str, description: &str) -> Option<CategorizationResult> {
        let category_name = self.keywords.lookup(counterparty, description)?;

        match self.db.find_category_by_name(category_name) {
            Ok(Some(category)) => {
                debug!(counterparty = %counterparty, category = %category.name, "Keyword match");
                Some(CategorizationResult {
                    category_id: Some(category.id),
                    source: CategorySource::Keyword,
                    confidence: KEYWORD_CONFIDENCE,
                })
            }
            Ok(None) => {
                debug!(category = %category_name, "Keyword category not present in store");
                None
            }
            Err(e) => {
                warn!(error = %e, "Category lookup failed, skipping keyword stage");
                None
            }
        }
    }

    /// Classifier fallback. All failures (transport, timeout, malformed
    /// output, unrecognized category name) degrade to None.
    async fn classify_with_ai(
        &self,
        draft: &TransactionDraft,
        context: &CategorizationContext,
    ) -> Result<Option<CategorizationResult>> {
        let ai = match self.ai {
            Some(ai) => ai,
            None => return Ok(None),
        };

        let categories = match self.db.list_assignable_categories() {
            Ok(categories) if !categories.is_empty() => categories,
            Ok(_) => {
                debug!("No assignable categories, skipping classifier");
                return Ok(None);
            }
            Err(e) => {
                warn!(error = %e, "Category list failed, skipping classifier");
                return Ok(None);
            }
        };

        let request = ClassificationRequest {
            counterparty: draft.counterparty_name.clone(),
            description: draft.description.clone(),
            amount: draft.amount,
            counterparty_purpose: context.counterparty_purpose.clone(),
            recipient_note: context.recipient_note.clone(),
        };

        let suggestion = match ai.classify_transaction(&request, &categories).await {
            Ok(suggestion) => suggestion,
            Err(e) => {
                warn!(counterparty = %draft.counterparty_name, error = %e, "Classifier call failed");
                return Ok(None);
            }
        };

        let category = match match_category(&suggestion.category, &categories) {
            Some(category) => category,
            None => {
                warn!(
                    suggested = %suggestion.category,
                    "Classifier returned unrecognized category"
                );
                return Ok(None);
            }
        };

        let confidence = suggestion.confidence.clamp(0.0, 1.0);
        debug!(
            counterparty = %draft.counterparty_name,
            category = %category.name,
            confidence,
            "Classifier match"
        );

        // A validated classifier decision becomes a learned rule before the
        // result is returned, so the next identical counterparty short-circuits
        // at the rule stage.
        if let Err(e) = self.learn(
            &draft.counterparty_name,
            category.id,
            RuleProvenance::Ai,
            confidence,
        ) {
            warn!(counterparty = %draft.counterparty_name, error = %e, "Failed to learn classifier rule");
        }

        Ok(Some(CategorizationResult {
            category_id: Some(category.id),
            source: CategorySource::Ai,
            confidence,
        }))
    }

    /// Learn (or reinforce) an exact rule for a counterparty
    ///
    /// Automatic learning only ever writes exact rules; contains rules are a
    /// separately curated class. Income assignments must not reach this;
    /// the guard lives at the call sites.
    pub fn learn(
        &self,
        counterparty: &str,
        category_id: i64,
        provenance: RuleProvenance,
        confidence: f64,
    ) -> Result<i64> {
        let pattern = normalize_counterparty(counterparty);
        let rule_id = self.db.upsert_rule(&NewMerchantRule {
            pattern,
            match_type: MatchType::Exact,
            category_id,
            confidence,
            provenance,
        })?;
        debug!(counterparty = %counterparty, category_id, provenance = %provenance, "Learned rule");
        Ok(rule_id)
    }
}

/// Validate a classifier-suggested name against the known category list
///
/// Case-insensitive, substring in either direction: models habitually
/// answer "Doprava a parkovanie" for a category named "Doprava" and vice
/// versa.
fn match_category<'a>(suggested: &str, categories: &'a [Category]) -> Option<&'a Category> {
    let suggested = suggested.trim().to_lowercase();
    if suggested.is_empty() {
        return None;
    }

    categories.iter().find(|category| {
        let name = category.name.to_lowercase();
        name.contains(&suggested) || suggested.contains(&name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: i64, name: &str) -> Category {
        Category {
            id,
            name: name.to_string(),
            icon: None,
            color: None,
        }
    }

    #[test]
    fn test_normalize_counterparty() {
        assert_eq!(normalize_counterparty("  Bolt "), "BOLT");
        assert_eq!(normalize_counterparty("KAUFLAND 1120"), "KAUFLAND 1120");
    }

    #[test]
    fn test_match_category_exact_case_insensitive() {
        let categories = vec![category(1, "Doprava"), category(2, "Potraviny")];
        assert_eq!(match_category("doprava", &categories).map(|c| c.id), Some(1));
    }

    #[test]
    fn test_match_category_substring_both_directions() {
        let categories = vec![category(1, "Doprava")];
        assert_eq!(
            match_category("Doprava a parkovanie", &categories).map(|c| c.id),
            Some(1)
        );
        assert_eq!(match_category("oprav", &categories).map(|c| c.id), Some(1));
    }

    #[test]
    fn test_match_category_unknown() {
        let categories = vec![category(1, "Doprava")];
        assert_eq!(match_category("Bývanie", &categories).map(|c| c.id), None);
        assert_eq!(match_category("", &categories).map(|c| c.id), None);
    }
}

//! Database tests

use super::*;
use crate::models::*;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_draft(counterparty: &str, amount: f64) -> TransactionDraft {
        TransactionDraft {
            occurred_at: NaiveDate::from_ymd_opt(2025, 11, 3)
                .unwrap()
                .and_hms_opt(13, 1, 0)
                .unwrap(),
            amount,
            currency: "EUR".to_string(),
            counterparty_account: Some("SK8911000000002933213912".to_string()),
            description: format!("Platba kartou 4405**9645, {}", counterparty),
            counterparty_name: counterparty.to_string(),
            payment_method: PaymentMethod::Card,
            reference_symbols: ReferenceSymbols::default(),
            environmental_cost: None,
        }
    }

    #[test]
    fn test_in_memory_db() {
        let db = Database::in_memory().unwrap();
        let categories = db.list_categories().unwrap();
        assert!(categories.is_empty());
    }

    #[test]
    fn test_schema_exists() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();

        let result: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('merchant_rules') WHERE name IN \
                 ('id', 'pattern', 'match_type', 'category_id', 'confidence', 'provenance', \
                  'usage_count', 'last_used_at', 'created_at')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(result, 9, "merchant_rules table should have 9 expected columns");

        let result: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('transactions') WHERE name IN \
                 ('id', 'occurred_at', 'amount', 'counterparty_name', 'category_id', \
                  'category_source', 'notification_hash', 'raw_text')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(result, 8, "transactions table should have 8 expected columns");
    }

    #[test]
    fn test_category_create_is_idempotent() {
        let db = Database::in_memory().unwrap();

        let id = db.create_category("Doprava", Some("🚌"), None).unwrap();
        let id2 = db.create_category("Doprava", Some("🚌"), None).unwrap();
        assert_eq!(id, id2);

        let categories = db.list_categories().unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "Doprava");
        assert_eq!(categories[0].icon.as_deref(), Some("🚌"));
    }

    #[test]
    fn test_find_category_by_name_case_insensitive() {
        let db = Database::in_memory().unwrap();
        db.create_category("Potraviny", None, None).unwrap();

        let found = db.find_category_by_name("potraviny").unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().name, "Potraviny");

        assert!(db.find_category_by_name("Bývanie").unwrap().is_none());
    }

    #[test]
    fn test_income_category_created_once() {
        let db = Database::in_memory().unwrap();

        let id = db.get_or_create_income_category().unwrap();
        let id2 = db.get_or_create_income_category().unwrap();
        assert_eq!(id, id2);

        let categories = db.list_categories().unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, INCOME_CATEGORY_NAME);
    }

    #[test]
    fn test_assignable_categories_exclude_synthesized() {
        let db = Database::in_memory().unwrap();
        db.get_or_create_income_category().unwrap();
        db.create_category(UNCATEGORIZED_CATEGORY_NAME, None, None)
            .unwrap();
        db.create_category("Doprava", None, None).unwrap();

        let assignable = db.list_assignable_categories().unwrap();
        assert_eq!(assignable.len(), 1);
        assert_eq!(assignable[0].name, "Doprava");
    }

    #[test]
    fn test_upsert_exact_rule_reinforces() {
        let db = Database::in_memory().unwrap();
        let cat = db.create_category("Doprava", None, None).unwrap();

        let rule_id = db
            .upsert_rule(&NewMerchantRule {
                pattern: "BOLT".to_string(),
                match_type: MatchType::Exact,
                category_id: cat,
                confidence: 0.8,
                provenance: RuleProvenance::Ai,
            })
            .unwrap();

        let rule = db.find_rule_exact("BOLT").unwrap().unwrap();
        assert_eq!(rule.id, rule_id);
        assert_eq!(rule.usage_count, 1);
        assert_eq!(rule.provenance, RuleProvenance::Ai);

        // Second write for the same pattern reinforces instead of duplicating
        let rule_id2 = db
            .upsert_rule(&NewMerchantRule {
                pattern: "BOLT".to_string(),
                match_type: MatchType::Exact,
                category_id: cat,
                confidence: 1.0,
                provenance: RuleProvenance::Manual,
            })
            .unwrap();
        assert_eq!(rule_id, rule_id2);

        let rule = db.find_rule_exact("BOLT").unwrap().unwrap();
        assert_eq!(rule.usage_count, 2);
        assert_eq!(rule.confidence, 1.0);
        assert_eq!(rule.provenance, RuleProvenance::Manual);

        let conn = db.conn().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM merchant_rules WHERE pattern = 'BOLT'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_upsert_exact_rule_supersedes_category() {
        let db = Database::in_memory().unwrap();
        let transport = db.create_category("Doprava", None, None).unwrap();
        let food = db.create_category("Potraviny", None, None).unwrap();

        db.upsert_rule(&NewMerchantRule {
            pattern: "BOLT".to_string(),
            match_type: MatchType::Exact,
            category_id: transport,
            confidence: 0.8,
            provenance: RuleProvenance::Ai,
        })
        .unwrap();

        // Manual correction moves the pattern to another category
        db.upsert_rule(&NewMerchantRule {
            pattern: "BOLT".to_string(),
            match_type: MatchType::Exact,
            category_id: food,
            confidence: 1.0,
            provenance: RuleProvenance::Manual,
        })
        .unwrap();

        let rule = db.find_rule_exact("BOLT").unwrap().unwrap();
        assert_eq!(rule.category_id, food);
        assert_eq!(rule.provenance, RuleProvenance::Manual);
    }

    #[test]
    fn test_contains_rules_ordered_by_length_then_usage() {
        let db = Database::in_memory().unwrap();
        let cat_a = db.create_category("A", None, None).unwrap();
        let cat_b = db.create_category("B", None, None).unwrap();

        let short_id = db
            .upsert_rule(&NewMerchantRule {
                pattern: "KAUF".to_string(),
                match_type: MatchType::Contains,
                category_id: cat_a,
                confidence: 1.0,
                provenance: RuleProvenance::Manual,
            })
            .unwrap();
        let long_id = db
            .upsert_rule(&NewMerchantRule {
                pattern: "KAUFLAND".to_string(),
                match_type: MatchType::Contains,
                category_id: cat_b,
                confidence: 1.0,
                provenance: RuleProvenance::Manual,
            })
            .unwrap();

        // Give the short rule more usage; length still wins
        db.increment_rule_usage(short_id).unwrap();
        db.increment_rule_usage(short_id).unwrap();

        let rules = db.find_rules_contains().unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].id, long_id);
        assert_eq!(rules[1].id, short_id);
        assert_eq!(rules[1].usage_count, 2);
    }

    #[test]
    fn test_increment_rule_usage_sets_last_used() {
        let db = Database::in_memory().unwrap();
        let cat = db.create_category("Doprava", None, None).unwrap();
        let rule_id = db
            .upsert_rule(&NewMerchantRule {
                pattern: "BOLT".to_string(),
                match_type: MatchType::Exact,
                category_id: cat,
                confidence: 1.0,
                provenance: RuleProvenance::Manual,
            })
            .unwrap();

        assert!(db.find_rule_exact("BOLT").unwrap().unwrap().last_used_at.is_none());

        db.increment_rule_usage(rule_id).unwrap();

        let rule = db.find_rule_exact("BOLT").unwrap().unwrap();
        assert_eq!(rule.usage_count, 2);
        assert!(rule.last_used_at.is_some());
    }

    #[test]
    fn test_insert_transaction_roundtrip() {
        let db = Database::in_memory().unwrap();
        let draft = sample_draft("BOLT", -10.18);

        let id = db
            .insert_transaction(&draft, &CategorizationResult::uncategorized(), "raw body")
            .unwrap()
            .unwrap();

        let stored = db.get_transaction(id).unwrap();
        assert_eq!(stored.counterparty_name, "BOLT");
        assert_eq!(stored.amount, -10.18);
        assert_eq!(stored.occurred_at, draft.occurred_at);
        assert_eq!(stored.payment_method, PaymentMethod::Card);
        assert_eq!(stored.category_id, None);
        assert_eq!(stored.category_source, CategorySource::None);
        assert_eq!(stored.raw_text.as_deref(), Some("raw body"));
    }

    #[test]
    fn test_insert_transaction_deduplicates() {
        let db = Database::in_memory().unwrap();
        let draft = sample_draft("BOLT", -10.18);

        let first = db
            .insert_transaction(&draft, &CategorizationResult::uncategorized(), "same body")
            .unwrap();
        assert!(first.is_some());

        let second = db
            .insert_transaction(&draft, &CategorizationResult::uncategorized(), "same body")
            .unwrap();
        assert!(second.is_none());
    }

    #[test]
    fn test_set_transaction_category() {
        let db = Database::in_memory().unwrap();
        let cat = db.create_category("Doprava", None, None).unwrap();
        let draft = sample_draft("BOLT", -10.18);
        let id = db
            .insert_transaction(&draft, &CategorizationResult::uncategorized(), "body")
            .unwrap()
            .unwrap();

        db.set_transaction_category(id, Some(cat), CategorySource::Manual, 1.0)
            .unwrap();

        let stored = db.get_transaction(id).unwrap();
        assert_eq!(stored.category_id, Some(cat));
        assert_eq!(stored.category_source, CategorySource::Manual);
        assert_eq!(stored.category_confidence, 1.0);

        // Unknown ids are reported, not silently ignored
        assert!(matches!(
            db.set_transaction_category(9999, Some(cat), CategorySource::Manual, 1.0),
            Err(crate::error::Error::NotFound(_))
        ));
    }

    #[test]
    fn test_list_uncategorized_transactions() {
        let db = Database::in_memory().unwrap();
        let cat = db.create_category("Doprava", None, None).unwrap();

        let id1 = db
            .insert_transaction(
                &sample_draft("BOLT", -10.18),
                &CategorizationResult::uncategorized(),
                "body 1",
            )
            .unwrap()
            .unwrap();
        db.insert_transaction(
            &sample_draft("TESCO", -23.00),
            &CategorizationResult {
                category_id: Some(cat),
                source: CategorySource::Rule,
                confidence: 1.0,
            },
            "body 2",
        )
        .unwrap()
        .unwrap();

        let uncategorized = db.list_uncategorized_transactions().unwrap();
        assert_eq!(uncategorized.len(), 1);
        assert_eq!(uncategorized[0].id, id1);
    }
}

//! Learned merchant-rule store operations
//!
//! Exact rules are keyed on the normalized (trimmed, uppercased) counterparty
//! and are unique per pattern; contains rules may overlap and are returned in
//! their precedence order. Writes go through an upsert so two workers racing
//! on the same counterparty cannot create duplicate exact rules.

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{MatchType, MerchantRule, NewMerchantRule, RuleProvenance};

fn row_to_rule(row: &rusqlite::Row) -> rusqlite::Result<MerchantRule> {
    let match_type: String = row.get(2)?;
    let provenance: String = row.get(5)?;
    let last_used_at: Option<String> = row.get(7)?;
    let created_at: String = row.get(8)?;

    Ok(MerchantRule {
        id: row.get(0)?,
        pattern: row.get(1)?,
        match_type: match_type.parse().unwrap_or(MatchType::Exact),
        category_id: row.get(3)?,
        confidence: row.get(4)?,
        provenance: provenance.parse().unwrap_or(RuleProvenance::Manual),
        usage_count: row.get(6)?,
        last_used_at: last_used_at.as_deref().map(parse_datetime),
        created_at: parse_datetime(&created_at),
    })
}

const RULE_COLUMNS: &str =
    "id, pattern, match_type, category_id, confidence, provenance, usage_count, \
     last_used_at, created_at";

impl Database {
    /// Look up the exact rule for a normalized counterparty pattern
    pub fn find_rule_exact(&self, pattern: &str) -> Result<Option<MerchantRule>> {
        let conn = self.conn()?;
        let rule = conn
            .query_row(
                &format!(
                    "SELECT {} FROM merchant_rules WHERE match_type = 'exact' AND pattern = ?",
                    RULE_COLUMNS
                ),
                params![pattern],
                row_to_rule,
            )
            .optional()?;
        Ok(rule)
    }

    /// All contains rules in precedence order: longest pattern first, then
    /// highest usage count, then most recently created
    pub fn find_rules_contains(&self) -> Result<Vec<MerchantRule>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM merchant_rules WHERE match_type = 'contains' \
             ORDER BY LENGTH(pattern) DESC, usage_count DESC, id DESC",
            RULE_COLUMNS
        ))?;
        let rules = stmt
            .query_map([], row_to_rule)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rules)
    }

    /// Write a rule, reinforcing or superseding the existing one
    ///
    /// For exact rules the conflict target is the per-pattern unique index:
    /// a second write for the same pattern refreshes category, confidence and
    /// provenance and bumps the usage count instead of inserting a duplicate.
    /// Contains rules have no uniqueness constraint and insert as given.
    ///
    /// Returns the id of the written rule.
    pub fn upsert_rule(&self, rule: &NewMerchantRule) -> Result<i64> {
        let conn = self.conn()?;

        match rule.match_type {
            MatchType::Exact => {
                conn.execute(
                    r#"
                    INSERT INTO merchant_rules
                        (pattern, match_type, category_id, confidence, provenance, usage_count)
                    VALUES (?, 'exact', ?, ?, ?, 1)
                    ON CONFLICT(pattern) WHERE match_type = 'exact' DO UPDATE SET
                        category_id = excluded.category_id,
                        confidence = excluded.confidence,
                        provenance = excluded.provenance,
                        usage_count = usage_count + 1,
                        last_used_at = CURRENT_TIMESTAMP
                    "#,
                    params![
                        rule.pattern,
                        rule.category_id,
                        rule.confidence,
                        rule.provenance.as_str()
                    ],
                )?;

                let id = conn.query_row(
                    "SELECT id FROM merchant_rules WHERE match_type = 'exact' AND pattern = ?",
                    params![rule.pattern],
                    |row| row.get(0),
                )?;
                Ok(id)
            }
            MatchType::Contains => {
                conn.execute(
                    r#"
                    INSERT INTO merchant_rules
                        (pattern, match_type, category_id, confidence, provenance, usage_count)
                    VALUES (?, 'contains', ?, ?, ?, 0)
                    "#,
                    params![
                        rule.pattern,
                        rule.category_id,
                        rule.confidence,
                        rule.provenance.as_str()
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            }
        }
    }

    /// Record one more match for a rule
    pub fn increment_rule_usage(&self, rule_id: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            UPDATE merchant_rules
            SET usage_count = usage_count + 1, last_used_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
            params![rule_id],
        )?;
        Ok(())
    }
}

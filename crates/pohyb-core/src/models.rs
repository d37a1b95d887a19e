//! Domain models for pohyb

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the synthesized income category.
///
/// Credits are routed here unconditionally; the category is created on first
/// use and is never a valid classifier target.
pub const INCOME_CATEGORY_NAME: &str = "Príjem";

/// Name of the synthesized catch-all category shown for records that fell
/// through the whole cascade. Excluded from the classifier's category list.
pub const UNCATEGORIZED_CATEGORY_NAME: &str = "Nezaradené";

/// Payment instrument inferred from the notification description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Card payment ("Platba kartou")
    Card,
    /// Bank transfer or standing order ("Prevod", "Príkaz")
    Transfer,
    /// Cash withdrawal/deposit ("hotovosť")
    Cash,
    /// Direct debit ("inkaso")
    DirectDebit,
    /// Anything the patterns don't recognize
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Transfer => "transfer",
            Self::Cash => "cash",
            Self::DirectDebit => "direct_debit",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "card" => Ok(Self::Card),
            "transfer" => Ok(Self::Transfer),
            "cash" => Ok(Self::Cash),
            "direct_debit" | "directdebit" => Ok(Self::DirectDebit),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown payment method: {}", s)),
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reconciliation symbols carried by transfer notifications
///
/// The variable/constant/specific triple from Slovak payment orders. All
/// optional; card payments usually carry none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSymbols {
    pub variable: Option<String>,
    pub constant: Option<String>,
    pub specific: Option<String>,
}

impl ReferenceSymbols {
    pub fn is_empty(&self) -> bool {
        self.variable.is_none() && self.constant.is_none() && self.specific.is_none()
    }
}

/// Structured result of extracting one notification, before categorization
///
/// Immutable once produced; a draft is created exactly once per notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDraft {
    /// When the account movement happened (from the notification, never "now")
    pub occurred_at: NaiveDateTime,
    /// Negative = debit, positive = credit. Sign comes from the direction
    /// keyword, not from the printed numeral.
    pub amount: f64,
    /// 3-letter currency code
    pub currency: String,
    /// IBAN-shaped identifier of the account, when present
    pub counterparty_account: Option<String>,
    /// Free-text transaction narrative as found in the notification
    pub description: String,
    /// Best-effort short name of the other party; the categorization key
    pub counterparty_name: String,
    pub payment_method: PaymentMethod,
    pub reference_symbols: ReferenceSymbols,
    /// CO2 footprint estimate some notifications embed, informational only
    pub environmental_cost: Option<f64>,
}

/// How a rule entered the rule store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleProvenance {
    /// Learned from a user correction
    Manual,
    /// Learned from a confident classifier decision
    Ai,
    /// Seeded from the keyword table
    Keyword,
}

impl RuleProvenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Ai => "ai",
            Self::Keyword => "keyword",
        }
    }
}

impl std::str::FromStr for RuleProvenance {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "ai" => Ok(Self::Ai),
            "keyword" => Ok(Self::Keyword),
            _ => Err(format!("Unknown rule provenance: {}", s)),
        }
    }
}

impl std::fmt::Display for RuleProvenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a rule pattern is matched against a counterparty name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Whole normalized counterparty equals the pattern. At most one exact
    /// rule exists per normalized pattern.
    Exact,
    /// Substring match in either direction; longest pattern wins, then
    /// highest usage count.
    Contains,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Contains => "contains",
        }
    }
}

impl std::str::FromStr for MatchType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "contains" => Ok(Self::Contains),
            _ => Err(format!("Unknown match type: {}", s)),
        }
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A learned counterparty→category rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantRule {
    pub id: i64,
    /// Counterparty fragment this rule matches. Exact rules store the
    /// normalized (trimmed, uppercased) form.
    pub pattern: String,
    pub match_type: MatchType,
    pub category_id: i64,
    /// Advisory score in [0,1]; does not affect which rule matches
    pub confidence: f64,
    pub provenance: RuleProvenance,
    pub usage_count: i64,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A rule to be written to the store (before insertion)
#[derive(Debug, Clone)]
pub struct NewMerchantRule {
    pub pattern: String,
    pub match_type: MatchType,
    pub category_id: i64,
    pub confidence: f64,
    pub provenance: RuleProvenance,
}

/// A spending category
///
/// Categories are externally defined; the core only synthesizes the income
/// and uncategorized pseudo-categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
}

/// Which stage of the cascade (or which later actor) produced an assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategorySource {
    /// Credit shortcut
    Income,
    /// Learned rule from the rule store
    Rule,
    /// Keyword heuristic table
    Keyword,
    /// External classifier
    Ai,
    /// User correction (never produced by `categorize` itself)
    Manual,
    /// Everything fell through; record needs review
    None,
}

impl CategorySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Rule => "rule",
            Self::Keyword => "keyword",
            Self::Ai => "ai",
            Self::Manual => "manual",
            Self::None => "none",
        }
    }
}

impl std::str::FromStr for CategorySource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "rule" => Ok(Self::Rule),
            "keyword" => Ok(Self::Keyword),
            "ai" => Ok(Self::Ai),
            "manual" => Ok(Self::Manual),
            "none" => Ok(Self::None),
            _ => Err(format!("Unknown category source: {}", s)),
        }
    }
}

impl std::fmt::Display for CategorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of running the decision cascade over one draft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizationResult {
    /// None = uncategorized
    pub category_id: Option<i64>,
    pub source: CategorySource,
    /// Advisory score in [0,1]
    pub confidence: f64,
}

impl CategorizationResult {
    /// The degraded outcome: everything fell through
    pub fn uncategorized() -> Self {
        Self {
            category_id: None,
            source: CategorySource::None,
            confidence: 0.0,
        }
    }
}

/// A persisted, categorized transaction record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTransaction {
    pub id: i64,
    pub occurred_at: NaiveDateTime,
    pub amount: f64,
    pub currency: String,
    pub counterparty_name: String,
    pub counterparty_account: Option<String>,
    pub description: String,
    pub payment_method: PaymentMethod,
    pub reference_symbols: ReferenceSymbols,
    pub environmental_cost: Option<f64>,
    pub category_id: Option<i64>,
    pub category_source: CategorySource,
    pub category_confidence: f64,
    /// SHA-256 of the raw notification text, for deduplication
    pub notification_hash: String,
    /// Original notification body, kept for manual review
    pub raw_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_payment_method_roundtrip() {
        for method in [
            PaymentMethod::Card,
            PaymentMethod::Transfer,
            PaymentMethod::Cash,
            PaymentMethod::DirectDebit,
            PaymentMethod::Other,
        ] {
            assert_eq!(PaymentMethod::from_str(method.as_str()), Ok(method));
        }
    }

    #[test]
    fn test_category_source_roundtrip() {
        for source in [
            CategorySource::Income,
            CategorySource::Rule,
            CategorySource::Keyword,
            CategorySource::Ai,
            CategorySource::Manual,
            CategorySource::None,
        ] {
            assert_eq!(CategorySource::from_str(source.as_str()), Ok(source));
        }
    }

    #[test]
    fn test_unknown_match_type_rejected() {
        assert!(MatchType::from_str("prefix").is_err());
    }

    #[test]
    fn test_reference_symbols_empty() {
        assert!(ReferenceSymbols::default().is_empty());
        let symbols = ReferenceSymbols {
            variable: Some("1234".to_string()),
            ..Default::default()
        };
        assert!(!symbols.is_empty());
    }
}

//! Keyword heuristics for counterparties no learned rule covers yet
//!
//! A fixed, ordered mapping from category name to substrings known to
//! indicate that category. Consulted after the rule store and before the
//! classifier; the table is injected into the categorizer at construction so
//! tests can supply their own.

/// One category row: display name plus the substrings that indicate it
#[derive(Debug, Clone)]
pub struct KeywordEntry {
    pub category: &'static str,
    pub keywords: &'static [&'static str],
}

/// Ordered category→keywords table; earlier rows win ties
#[derive(Debug, Clone)]
pub struct KeywordTable {
    entries: Vec<KeywordEntry>,
}

/// Built-in table for Slovak merchants
///
/// Order matters: "BOLT FOOD" must be tested before the bare "BOLT" ride
/// keyword, so food delivery precedes transport.
const DEFAULT_ENTRIES: &[KeywordEntry] = &[
    KeywordEntry {
        category: "Donáška jedla",
        keywords: &["WOLT", "BOLT FOOD", "FOODORA", "DELIVEROO", "DONASKA"],
    },
    KeywordEntry {
        category: "Doprava",
        keywords: &["BOLT", "UBER", "HOPIN", "TAXI", "MHD", "PARKING"],
    },
    KeywordEntry {
        category: "Potraviny",
        keywords: &["TESCO", "BILLA", "KAUFLAND", "LIDL", "COOP", "JEDNOTA"],
    },
    KeywordEntry {
        category: "Reštaurácie",
        keywords: &["MCDONALD", "KFC", "SUBWAY", "PIZZA", "RESTAURANT", "BISTRO"],
    },
    KeywordEntry {
        category: "Káva",
        keywords: &["STARBUCKS", "COFFEE", "CAFE", "COSTA"],
    },
    KeywordEntry {
        category: "Drogéria",
        keywords: &["DM", "ROSSMANN", "TETA", "DR.MAX", "LEKAREN"],
    },
    KeywordEntry {
        category: "Pohonné hmoty",
        keywords: &["SHELL", "OMV", "SLOVNAFT", "BENZIN", "NAFTA", "MOL"],
    },
    KeywordEntry {
        category: "Bývanie",
        keywords: &["ZSE", "VSE", "SPP", "BVS", "ENERGIA"],
    },
];

impl Default for KeywordTable {
    fn default() -> Self {
        Self {
            entries: DEFAULT_ENTRIES.to_vec(),
        }
    }
}

impl KeywordTable {
    /// Build a custom table; rows keep the given priority order
    pub fn new(entries: Vec<KeywordEntry>) -> Self {
        Self { entries }
    }

    /// Find the first category whose keyword set hits the counterparty or
    /// description. Matching is case-insensitive via uppercased inputs.
    pub fn lookup(&self, counterparty: &str, description: &str) -> Option<&'static str> {
        let combined = format!(
            "{} {}",
            counterparty.to_uppercase(),
            description.to_uppercase()
        );

        for entry in &self.entries {
            if entry.keywords.iter().any(|kw| combined.contains(kw)) {
                return Some(entry.category);
            }
        }

        None
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

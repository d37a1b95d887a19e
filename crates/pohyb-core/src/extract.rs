//! Field extraction from bank-notification text
//!
//! Converts one raw notification string (the body of a B-mail style message
//! describing a single account movement) into a [`TransactionDraft`]. Pure
//! function of the input text: no clock, no store, no network.
//!
//! Each field is recovered independently and tolerates absence, except the
//! minimal viable set (amount, date, counterparty), whose absence
//! rejects the whole notification.

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::error::ExtractionError;
use crate::models::{PaymentMethod, ReferenceSymbols, TransactionDraft};

/// Fallback currency when the notification carries a bare currency sign
/// instead of a 3-letter code.
pub const HOME_CURRENCY: &str = "EUR";

/// Slovak genitive month names as they appear in "3. novembra 2025" dates
const MONTHS: [(&str, u32); 12] = [
    ("januára", 1),
    ("februára", 2),
    ("marca", 3),
    ("apríla", 4),
    ("mája", 5),
    ("júna", 6),
    ("júla", 7),
    ("augusta", 8),
    ("septembra", 9),
    ("októbra", 10),
    ("novembra", 11),
    ("decembra", 12),
];

/// Notification field extractor with pre-compiled patterns
pub struct Extractor {
    home_currency: String,
    amount: Regex,
    debit: Regex,
    credit: Regex,
    date_numeric: Regex,
    date_month_name: Regex,
    account: Regex,
    description: Regex,
    card_merchant: Regex,
    trailing_ref: Regex,
    variable_symbol: Regex,
    constant_symbol: Regex,
    specific_symbol: Regex,
    environmental: Regex,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    pub fn new() -> Self {
        Self::with_home_currency(HOME_CURRENCY)
    }

    /// Create an extractor with a different fallback currency
    pub fn with_home_currency(currency: &str) -> Self {
        Self {
            home_currency: currency.to_string(),
            // "10,18 EUR": decimal comma with exactly two fraction digits,
            // optional thousands groups, followed by a currency marker
            amount: Regex::new(r"(\d+(?:\s\d{3})*,\d{2})\s*([A-Z]{3}|€)").expect("valid regex"),
            debit: Regex::new(r"(?i)zn[íi][žz]en[ýy]").expect("valid regex"),
            credit: Regex::new(r"(?i)zv[ýy][šs]en[ýy]").expect("valid regex"),
            // "3.11.2025 13:01" / "03.11.2025"
            date_numeric: Regex::new(r"\b(\d{1,2})\.(\d{1,2})\.(\d{4})(?:\s+(\d{1,2}):(\d{2}))?")
                .expect("valid regex"),
            // "3. novembra 2025"
            date_month_name: Regex::new(r"(\d{1,2})\.\s*(\p{L}+)\s+(\d{4})").expect("valid regex"),
            // IBAN-shaped: 2 letters + at least 18 digits, spaces tolerated
            account: Regex::new(r"\b([A-Z]{2}\d(?:\s?\d){17,33})").expect("valid regex"),
            description: Regex::new(r"Popis transakcie:\s*([^\r\n]+)").expect("valid regex"),
            // token after the first comma in a card-payment description
            card_merchant: Regex::new(r",\s*([A-Z0-9.\-]+)").expect("valid regex"),
            // glued reference code at the end of a card merchant token,
            // e.g. "BOLT.EUD2511031201" → "BOLT"
            trailing_ref: Regex::new(r"\.?[A-Z]{3}\d+$").expect("valid regex"),
            variable_symbol: Regex::new(r"(?i)variabiln[ýy](?:\s+symbol)?\s*:?\s*(\d+)")
                .expect("valid regex"),
            constant_symbol: Regex::new(r"(?i)kon[šs]tantn[ýy](?:\s+symbol)?\s*:?\s*(\d+)")
                .expect("valid regex"),
            specific_symbol: Regex::new(r"(?i)[šs]pecifick[ýy](?:\s+symbol)?\s*:?\s*(\d+)")
                .expect("valid regex"),
            environmental: Regex::new(r"(?i)(\d+,\d{2})\s*kg\s*CO2").expect("valid regex"),
        }
    }

    /// Extract a transaction draft from one notification text
    ///
    /// Fails when the amount, date, or counterparty cannot be recovered;
    /// everything else degrades to `None`/fallback values.
    pub fn extract(&self, text: &str) -> Result<TransactionDraft, ExtractionError> {
        let (amount, currency) = self.extract_amount(text)?;
        let occurred_at = self.extract_date(text)?;
        let counterparty_account = self.extract_account(text);
        let description = self.extract_description(text);
        let (counterparty_name, payment_method) = self.extract_counterparty(&description)?;

        Ok(TransactionDraft {
            occurred_at,
            amount,
            currency,
            counterparty_account,
            description: description.unwrap_or_default(),
            counterparty_name,
            payment_method,
            reference_symbols: self.extract_symbols(text),
            environmental_cost: self
                .environmental
                .captures(text)
                .and_then(|c| parse_decimal(&c[1])),
        })
    }

    /// Signed amount plus currency code
    ///
    /// The numeral is always printed unsigned; the sign comes from the
    /// direction keyword ("znizeny" = balance decreased, "zvyseny" =
    /// increased) appearing before the amount. Without a direction keyword
    /// the movement is treated as a debit.
    fn extract_amount(&self, text: &str) -> Result<(f64, String), ExtractionError> {
        let caps = self
            .amount
            .captures(text)
            .ok_or(ExtractionError::MissingAmount)?;
        let value = parse_decimal(&caps[1]).ok_or(ExtractionError::MissingAmount)?;

        let marker = &caps[2];
        let currency = if marker == "€" {
            self.home_currency.clone()
        } else {
            marker.to_string()
        };

        let prefix = &text[..caps.get(0).map(|m| m.start()).unwrap_or(0)];
        let amount = if self.credit.is_match(prefix) {
            value
        } else if self.debit.is_match(prefix) {
            -value
        } else if self.credit.is_match(text) {
            value
        } else {
            -value
        };

        Ok((amount, currency))
    }

    /// First recognizable date wins: numeric `D.M.YYYY[ HH:MM]` before the
    /// localized "3. novembra 2025" form. Never falls back to "now".
    fn extract_date(&self, text: &str) -> Result<NaiveDateTime, ExtractionError> {
        for caps in self.date_numeric.captures_iter(text) {
            let day: u32 = caps[1].parse().unwrap_or(0);
            let month: u32 = caps[2].parse().unwrap_or(0);
            let year: i32 = caps[3].parse().unwrap_or(0);
            let hour: u32 = caps.get(4).map_or(0, |m| m.as_str().parse().unwrap_or(0));
            let minute: u32 = caps.get(5).map_or(0, |m| m.as_str().parse().unwrap_or(0));

            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                if let Some(dt) = date.and_hms_opt(hour, minute, 0) {
                    return Ok(dt);
                }
            }
        }

        for caps in self.date_month_name.captures_iter(text) {
            let day: u32 = caps[1].parse().unwrap_or(0);
            let year: i32 = caps[3].parse().unwrap_or(0);
            let name = caps[2].to_lowercase();

            if let Some(month) = month_number(&name) {
                if let Some(dt) =
                    NaiveDate::from_ymd_opt(year, month, day).and_then(|d| d.and_hms_opt(0, 0, 0))
                {
                    return Ok(dt);
                }
            }
        }

        Err(ExtractionError::MissingDate)
    }

    /// Opportunistic IBAN-shaped account identifier
    fn extract_account(&self, text: &str) -> Option<String> {
        self.account
            .captures(text)
            .map(|c| c[1].split_whitespace().collect::<String>())
    }

    /// Text after the "Popis transakcie:" label, to end of line
    fn extract_description(&self, text: &str) -> Option<String> {
        self.description
            .captures(text)
            .map(|c| c[1].trim().to_string())
    }

    /// Counterparty name and payment method, both derived from the
    /// description narrative
    ///
    /// Card payments name the merchant after the first comma, with a glued
    /// reference code trimmed off the end. Transfers and everything else use
    /// the full description as the least-specific fallback.
    fn extract_counterparty(
        &self,
        description: &Option<String>,
    ) -> Result<(String, PaymentMethod), ExtractionError> {
        let description = match description {
            Some(d) if !d.is_empty() => d,
            _ => return Err(ExtractionError::MissingCounterparty),
        };
        let lower = description.to_lowercase();

        if lower.contains("platba kartou") {
            let name = self
                .card_merchant
                .captures(description)
                .map(|c| {
                    let raw = c[1].trim_matches('.');
                    let trimmed = self.trailing_ref.replace(raw, "");
                    if trimmed.is_empty() {
                        raw.to_string()
                    } else {
                        trimmed.into_owned()
                    }
                })
                .unwrap_or_else(|| description.clone());
            return Ok((name, PaymentMethod::Card));
        }

        let method = if lower.contains("prevod") || lower.contains("prikaz") || lower.contains("príkaz")
        {
            PaymentMethod::Transfer
        } else if lower.contains("inkaso") {
            PaymentMethod::DirectDebit
        } else if lower.contains("hotovos") {
            PaymentMethod::Cash
        } else {
            PaymentMethod::Other
        };

        Ok((description.clone(), method))
    }

    /// The variable/constant/specific symbol triple, each "<label>: <digits>"
    fn extract_symbols(&self, text: &str) -> ReferenceSymbols {
        let grab = |re: &Regex| re.captures(text).map(|c| c[1].to_string());
        ReferenceSymbols {
            variable: grab(&self.variable_symbol),
            constant: grab(&self.constant_symbol),
            specific: grab(&self.specific_symbol),
        }
    }
}

/// Parse a Slovak-formatted decimal ("1 234,56") into a float
fn parse_decimal(s: &str) -> Option<f64> {
    s.replace(' ', "").replace(',', ".").parse().ok()
}

fn month_number(name: &str) -> Option<u32> {
    MONTHS
        .iter()
        .find(|(month, _)| *month == name)
        .map(|(_, number)| *number)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD_NOTIFICATION: &str = "Vazeny klient, 3.11.2025 13:01 bol zostatok na Vasom ucte \
         SK8911000000002933213912 znizeny o 10,18 EUR.\n\
         Popis transakcie: Platba kartou 4405**9645, BOLT.EUD2511031201.\n\
         Ekologicka stopa transakcie: 0,42 kg CO2e";

    const TRANSFER_NOTIFICATION: &str = "Vazeny klient, 5.11.2025 08:12 bol zostatok na Vasom ucte \
         SK8911000000002933213912 znizeny o 250,00 EUR.\n\
         Popis transakcie: Prevod na ucet\n\
         variabilný symbol: 20250011\n\
         konštantný symbol: 0308";

    #[test]
    fn test_extract_card_payment() {
        let draft = Extractor::new().extract(CARD_NOTIFICATION).unwrap();

        assert_eq!(draft.amount, -10.18);
        assert_eq!(draft.currency, "EUR");
        assert_eq!(
            draft.counterparty_account.as_deref(),
            Some("SK8911000000002933213912")
        );
        assert_eq!(draft.counterparty_name, "BOLT");
        assert_eq!(draft.payment_method, PaymentMethod::Card);
        assert_eq!(
            draft.occurred_at,
            NaiveDate::from_ymd_opt(2025, 11, 3)
                .unwrap()
                .and_hms_opt(13, 1, 0)
                .unwrap()
        );
        assert_eq!(draft.environmental_cost, Some(0.42));
        assert!(draft.reference_symbols.is_empty());
    }

    #[test]
    fn test_extract_transfer_with_symbols() {
        let draft = Extractor::new().extract(TRANSFER_NOTIFICATION).unwrap();

        assert_eq!(draft.amount, -250.0);
        assert_eq!(draft.payment_method, PaymentMethod::Transfer);
        assert_eq!(draft.counterparty_name, "Prevod na ucet");
        assert_eq!(draft.reference_symbols.variable.as_deref(), Some("20250011"));
        assert_eq!(draft.reference_symbols.constant.as_deref(), Some("0308"));
        assert_eq!(draft.reference_symbols.specific, None);
    }

    #[test]
    fn test_credit_direction_gives_positive_amount() {
        let text = "2.11.2025 09:00 bol zostatok na ucte SK8911000000002933213912 \
             zvyseny o 1 250,00 EUR.\nPopis transakcie: Prijata platba";
        let draft = Extractor::new().extract(text).unwrap();
        assert_eq!(draft.amount, 1250.0);
    }

    #[test]
    fn test_diacritic_direction_keyword() {
        let text = "2.11.2025 09:00 bol zostatok znížený o 5,00 EUR.\n\
             Popis transakcie: Platba kartou 4405**9645, TESCO.SKD2511020900";
        let draft = Extractor::new().extract(text).unwrap();
        assert_eq!(draft.amount, -5.0);
        assert_eq!(draft.counterparty_name, "TESCO");
    }

    #[test]
    fn test_missing_amount_fails() {
        let err = Extractor::new()
            .extract("3.11.2025 13:01 Popis transakcie: Platba kartou, BOLT")
            .unwrap_err();
        assert_eq!(err, ExtractionError::MissingAmount);
    }

    #[test]
    fn test_missing_date_fails() {
        let err = Extractor::new()
            .extract("zostatok znizeny o 10,18 EUR. Popis transakcie: Platba kartou, BOLT")
            .unwrap_err();
        assert_eq!(err, ExtractionError::MissingDate);
    }

    #[test]
    fn test_missing_description_fails() {
        let err = Extractor::new()
            .extract("3.11.2025 13:01 zostatok znizeny o 10,18 EUR")
            .unwrap_err();
        assert_eq!(err, ExtractionError::MissingCounterparty);
    }

    #[test]
    fn test_month_name_date() {
        let text = "Dna 3. novembra 2025 bol zostatok znizeny o 23,00 EUR.\n\
             Popis transakcie: Inkaso poistne";
        let draft = Extractor::new().extract(text).unwrap();
        assert_eq!(
            draft.occurred_at,
            NaiveDate::from_ymd_opt(2025, 11, 3)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
        assert_eq!(draft.payment_method, PaymentMethod::DirectDebit);
    }

    #[test]
    fn test_date_without_time_defaults_to_midnight() {
        let text = "03.11.2025 zostatok znizeny o 8,40 EUR\nPopis transakcie: Nakup";
        let draft = Extractor::new().extract(text).unwrap();
        assert_eq!(draft.occurred_at.time(), chrono::NaiveTime::MIN);
        assert_eq!(draft.payment_method, PaymentMethod::Other);
    }

    #[test]
    fn test_account_with_spaces_is_compacted() {
        let text = "3.11.2025 ucet SK89 1100 0000 0029 3321 3912 znizeny o 9,99 EUR\n\
             Popis transakcie: Platba kartou 4405**9645, DM-DROGERIE.ABC123";
        let draft = Extractor::new().extract(text).unwrap();
        assert_eq!(
            draft.counterparty_account.as_deref(),
            Some("SK8911000000002933213912")
        );
        assert_eq!(draft.counterparty_name, "DM-DROGERIE");
    }

    #[test]
    fn test_no_direction_keyword_defaults_to_debit() {
        let text = "3.11.2025 13:01 pohyb o 12,00 EUR\nPopis transakcie: Nakup";
        let draft = Extractor::new().extract(text).unwrap();
        assert_eq!(draft.amount, -12.0);
    }

    #[test]
    fn test_bare_currency_sign_uses_home_currency() {
        let text = "3.11.2025 zostatok znizeny o 7,50 €\nPopis transakcie: Nakup";
        let draft = Extractor::new().extract(text).unwrap();
        assert_eq!(draft.currency, "EUR");
        assert_eq!(draft.amount, -7.5);
    }
}

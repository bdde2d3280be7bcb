use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Delivery descriptor used when the backend omits one.
pub const DEFAULT_DELIVERY: &str = "spot";

/// Source convention for "no price available" ("sin cotización").
pub const NO_PRICE: &str = "s/c";

const PRODUCT_FIELDS: [&str; 4] = ["product", "producto", "name", "nombre"];
const PRICE_FIELDS: [&str; 2] = ["price", "precio"];
const CURRENCY_FIELDS: [&str; 2] = ["currency", "moneda"];
const DELIVERY_FIELDS: [&str; 2] = ["delivery", "entrega"];
const BASE_FIELDS: [&str; 2] = ["is_base", "base"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    #[serde(rename = "ARS")]
    Ars,
    #[serde(rename = "USD")]
    Usd,
}

impl Currency {
    /// Anything that is not recognisably dollars is pesos.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "USD" | "U$S" | "US$" => Currency::Usd,
            _ => Currency::Ars,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Ars => "ARS",
            Currency::Usd => "USD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One priced line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub product: String,
    /// Always finite when present.
    pub price: Option<f64>,
    pub currency: Currency,
    pub delivery: String,
    pub is_base: bool,
}

impl Quote {
    pub fn new(product: impl Into<String>, price: Option<f64>, currency: Currency) -> Self {
        Self {
            product: product.into().trim().to_string(),
            price: price.filter(|p| p.is_finite()),
            currency,
            delivery: DEFAULT_DELIVERY.to_string(),
            is_base: true,
        }
    }

    pub fn with_delivery(mut self, delivery: impl Into<String>) -> Self {
        self.delivery = delivery.into();
        self
    }

    pub fn with_base(mut self, is_base: bool) -> Self {
        self.is_base = is_base;
        self
    }

    pub fn has_price(&self) -> bool {
        self.price.is_some()
    }

    /// Price formatted for display, or `s/c` when there is none.
    pub fn display_price(&self) -> String {
        match self.price {
            Some(p) => format!("{:.2}", p),
            None => NO_PRICE.to_string(),
        }
    }

    /// Map one backend record, accepting the field spellings the backend
    /// has used over time. Returns `None` only when no product name can be
    /// found; every other missing field falls back to its default.
    pub fn from_record(record: &Value) -> Option<Quote> {
        let product = match first_field(record, &PRODUCT_FIELDS)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        if product.is_empty() {
            return None;
        }

        let price = first_field(record, &PRICE_FIELDS).and_then(parse_price);
        let currency = first_field(record, &CURRENCY_FIELDS)
            .and_then(Value::as_str)
            .map(Currency::parse)
            .unwrap_or_default();
        let delivery = first_field(record, &DELIVERY_FIELDS)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(DEFAULT_DELIVERY)
            .to_string();
        let is_base = first_field(record, &BASE_FIELDS)
            .and_then(parse_flag)
            .unwrap_or(true);

        Some(Quote {
            product,
            price,
            currency,
            delivery,
            is_base,
        })
    }
}

fn first_field<'a>(record: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|n| record.get(*n))
        .find(|v| !v.is_null())
}

fn parse_flag(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|x| x != 0.0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "1" | "true" | "si" | "sí" | "yes" => Some(true),
            "0" | "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Numeric price from a JSON number or a price text.
pub fn parse_price(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|p| p.is_finite()),
        Value::String(s) => parse_price_text(s),
        _ => None,
    }
}

/// Parse price texts such as `"$ 275.730,00"`, `"u$s 275.730"` or `"s/c"`.
///
/// When both `.` and `,` appear, `.` groups thousands and `,` is the decimal
/// mark; a lone `,` is a decimal mark.
pub fn parse_price_text(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if matches!(
        trimmed.to_lowercase().as_str(),
        "" | "s/c" | "sc" | "s / c" | "-"
    ) {
        return None;
    }
    let digits: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();
    let normalized = if digits.contains(',') && digits.contains('.') {
        digits.replace('.', "").replace(',', ".")
    } else {
        digits.replace(',', ".")
    };
    normalized.parse::<f64>().ok().filter(|p| p.is_finite())
}

/// Map a backend item list, skipping records without a product name.
pub fn map_records(items: &[Value]) -> Vec<Quote> {
    items
        .iter()
        .filter_map(|record| {
            let quote = Quote::from_record(record);
            if quote.is_none() {
                debug!(%record, "skipping quote record without product");
            }
            quote
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_spanish_field_names() {
        let q = Quote::from_record(&json!({
            "producto": "Soja",
            "precio": 427.95,
            "moneda": "usd",
            "entrega": "Disponible",
            "base": false
        }))
        .unwrap();
        assert_eq!(q.product, "Soja");
        assert_eq!(q.price, Some(427.95));
        assert_eq!(q.currency, Currency::Usd);
        assert_eq!(q.delivery, "Disponible");
        assert!(!q.is_base);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let q = Quote::from_record(&json!({"name": " Trigo Pan "})).unwrap();
        assert_eq!(q.product, "Trigo Pan");
        assert_eq!(q.price, None);
        assert_eq!(q.currency, Currency::Ars);
        assert_eq!(q.delivery, DEFAULT_DELIVERY);
        assert!(q.is_base);
    }

    #[test]
    fn unknown_currency_is_pesos() {
        let q = Quote::from_record(&json!({"product": "Maiz", "currency": "EUR"})).unwrap();
        assert_eq!(q.currency, Currency::Ars);
    }

    #[test]
    fn records_without_product_are_skipped() {
        let items = vec![
            json!({"precio": 1.0}),
            json!({"producto": ""}),
            json!({"producto": null, "nombre": "Girasol"}),
            json!("not an object"),
        ];
        let quotes = map_records(&items);
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].product, "Girasol");
    }

    #[test]
    fn price_texts() {
        assert_eq!(parse_price_text("$ 275.730,00"), Some(275730.0));
        assert_eq!(parse_price_text("427,95"), Some(427.95));
        assert_eq!(parse_price_text("u$s 310"), Some(310.0));
        assert_eq!(parse_price_text("S/C"), None);
        assert_eq!(parse_price_text("-"), None);
        assert_eq!(parse_price_text("n/d"), None);
    }

    #[test]
    fn base_flag_variants() {
        let q = Quote::from_record(&json!({"product": "x", "is_base": 0})).unwrap();
        assert!(!q.is_base);
        let q = Quote::from_record(&json!({"product": "x", "base": "1"})).unwrap();
        assert!(q.is_base);
        let q = Quote::from_record(&json!({"product": "x", "base": "???"})).unwrap();
        assert!(q.is_base);
    }

    #[test]
    fn display_price_uses_source_convention() {
        assert_eq!(Quote::new("x", None, Currency::Ars).display_price(), "s/c");
        assert_eq!(
            Quote::new("x", Some(12.5), Currency::Ars).display_price(),
            "12.50"
        );
        assert_eq!(Quote::new("x", Some(f64::NAN), Currency::Ars).price, None);
    }
}

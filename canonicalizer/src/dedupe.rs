use std::collections::HashMap;

use crate::quote::{Currency, Quote};

/// Collapse repeated `(product, currency)` entries, keeping first-seen order.
///
/// The first entry for a key is kept unless it has no price and a later one
/// does; between two priced entries the earlier one wins.
pub fn dedupe<I>(quotes: I) -> Vec<Quote>
where
    I: IntoIterator<Item = Quote>,
{
    let mut index: HashMap<(String, Currency), usize> = HashMap::new();
    let mut kept: Vec<Quote> = Vec::new();

    for quote in quotes {
        let key = (quote.product.trim().to_uppercase(), quote.currency);
        match index.get(&key) {
            Some(&slot) => {
                if !kept[slot].has_price() && quote.has_price() {
                    kept[slot] = quote;
                }
            }
            None => {
                index.insert(key, kept.len());
                kept.push(quote);
            }
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(product: &str, currency: Currency, price: Option<f64>) -> Quote {
        Quote::new(product, price, currency)
    }

    #[test]
    fn priced_entry_replaces_unpriced() {
        let out = dedupe(vec![
            q("SOJA", Currency::Ars, None),
            q("SOJA", Currency::Ars, Some(427.95)),
        ]);
        assert_eq!(out, vec![q("SOJA", Currency::Ars, Some(427.95))]);
    }

    #[test]
    fn first_priced_entry_wins() {
        let out = dedupe(vec![
            q("SOJA", Currency::Ars, Some(400.0)),
            q("SOJA", Currency::Ars, Some(427.95)),
        ]);
        assert_eq!(out, vec![q("SOJA", Currency::Ars, Some(400.0))]);
    }

    #[test]
    fn key_ignores_case_and_padding_but_not_currency() {
        let out = dedupe(vec![
            q("Soja ", Currency::Ars, None),
            q("SOJA", Currency::Usd, Some(300.0)),
            q("soja", Currency::Ars, None),
            q("MAIZ", Currency::Ars, Some(200.0)),
        ]);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].product, "Soja");
        assert_eq!(out[1].currency, Currency::Usd);
        assert_eq!(out[2].product, "MAIZ");
    }

    #[test]
    fn replacement_keeps_original_position() {
        let out = dedupe(vec![
            q("TRIGO", Currency::Ars, None),
            q("MAIZ", Currency::Ars, Some(1.0)),
            q("TRIGO", Currency::Ars, Some(2.0)),
        ]);
        assert_eq!(out[0].product, "TRIGO");
        assert_eq!(out[0].price, Some(2.0));
        assert_eq!(out[1].product, "MAIZ");
    }

    #[test]
    fn empty_input() {
        assert!(dedupe(Vec::new()).is_empty());
    }
}

//! Spot vs. forward classification of quoted products.
//!
//! The exchange tables carry no contract type, only a free-text product
//! name, so the default [`PatternClassifier`] looks for tokens that only
//! appear in forward contracts: a `MM/YYYY` delivery month, a Spanish month
//! abbreviation, or an exchange/location code. Names that happen to contain
//! one of those tokens are misclassified; callers that have structured data
//! can plug in their own [`ContractClassifier`].

use crate::text::fold;

const MONTHS: [&str; 12] = [
    "ENE", "FEB", "MAR", "ABR", "MAY", "JUN", "JUL", "AGO", "SEP", "OCT", "NOV", "DIC",
];

const VENUE_CODES: [&str; 5] = ["ROS", "BAHIA", "CHICAGO", "MATBA", "CBOT"];

/// Decides whether a product name denotes a futures/forward contract.
pub trait ContractClassifier: Send + Sync {
    fn is_futures(&self, product: &str) -> bool;
}

impl<F> ContractClassifier for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_futures(&self, product: &str) -> bool {
        self(product)
    }
}

/// Token-based heuristic classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternClassifier;

impl ContractClassifier for PatternClassifier {
    fn is_futures(&self, product: &str) -> bool {
        if product.trim().is_empty() {
            return false;
        }
        has_month_year(product) || has_month_word(product) || has_venue_code(product)
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// `\b\d{2}/\d{4}\b`
fn has_month_year(name: &str) -> bool {
    let b = name.as_bytes();
    if b.len() < 7 {
        return false;
    }
    (0..=b.len() - 7).any(|i| {
        let token = &b[i..i + 7];
        let shape = token[..2].iter().all(u8::is_ascii_digit)
            && token[2] == b'/'
            && token[3..].iter().all(u8::is_ascii_digit);
        let left = i == 0 || !is_word_byte(b[i - 1]);
        let right = i + 7 == b.len() || !is_word_byte(b[i + 7]);
        shape && left && right
    })
}

fn has_month_word(name: &str) -> bool {
    name.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .any(|w| w.len() == 3 && MONTHS.contains(&w.to_ascii_uppercase().as_str()))
}

fn has_venue_code(name: &str) -> bool {
    let upper = fold(name).to_uppercase();
    VENUE_CODES.iter().any(|code| upper.contains(code))
}

/// Classify with the default [`PatternClassifier`].
pub fn is_futures(product: &str) -> bool {
    PatternClassifier.is_futures(product)
}

//! Interactive commands read from stdin while watching the board.
//!
//! ```text
//! r | refresh          refetch now
//! market <name>        switch market (aliases accepted)
//! tab base|futures     switch partition
//! currency ARS|USD     switch displayed currency
//! hide | show          hide or show unpriced quotes
//! interval <minutes>   change the refresh interval
//! q | quit             stop
//! ```

use analytics::{PipelineConfig, Tab};
use canonicalizer::{CanonicalService, Currency};

#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    Refresh,
    /// New session configuration to publish.
    Update(PipelineConfig),
    Quit,
    Unknown(String),
}

/// Interpret one input line against the current configuration.
pub fn parse(current: &PipelineConfig, line: &str) -> Control {
    let line = line.trim();
    let (cmd, arg) = match line.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (line, ""),
    };
    let mut next = current.clone();
    match (cmd.to_lowercase().as_str(), arg) {
        ("" | "r" | "refresh", _) => return Control::Refresh,
        ("q" | "quit" | "exit", _) => return Control::Quit,
        ("market" | "plaza", name) if !name.is_empty() => {
            next.market = CanonicalService::canonical_market(name);
        }
        ("tab", tab) if !tab.is_empty() => {
            next.tab = tab.parse::<Tab>().unwrap_or_default();
        }
        ("base", "") => next.tab = Tab::Base,
        ("futures" | "futuros", "") => next.tab = Tab::Futures,
        ("currency", cur) if !cur.is_empty() => next.currency = Currency::parse(cur),
        ("hide", "") => next.hide_unpriced = true,
        ("show", "") => next.hide_unpriced = false,
        ("interval", minutes) => match minutes.parse::<u64>() {
            Ok(n) => next.interval_min = n,
            Err(_) => return Control::Unknown(line.to_string()),
        },
        _ => return Control::Unknown(line.to_string()),
    }
    Control::Update(next)
}

use analytics::{compute_view, write_table, PipelineConfig, Tab};
use canonicalizer::{Currency, Quote};
use serde_json::Value;
use tokio::io::{self, AsyncBufReadExt};
use tracing_subscriber::FmtSubscriber;

/// Usage: `analytics [base|futures] [ARS|USD] [--hide-unpriced] [--json]`
///
/// Reads quote records as JSON lines on stdin and prints the derived board.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cfg = PipelineConfig {
        tab: args
            .first()
            .and_then(|s| s.parse::<Tab>().ok())
            .unwrap_or_default(),
        currency: args.get(1).map(|s| Currency::parse(s)).unwrap_or_default(),
        hide_unpriced: args.iter().any(|a| a == "--hide-unpriced"),
        ..PipelineConfig::default()
    };
    let json_output = args.iter().any(|a| a == "--json");

    let stdin = io::BufReader::new(io::stdin());
    let mut lines = stdin.lines();
    let mut raw = Vec::new();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(&line) {
            Ok(v) => raw.extend(Quote::from_record(&v)),
            Err(e) => tracing::warn!(error = %e, "ignoring malformed input line"),
        }
    }

    let view = compute_view(&raw, &cfg);
    tracing::info!(
        tab = %cfg.tab,
        currency = %cfg.currency,
        shown = view.quotes.len(),
        active = view.kpis.active_count,
        "view computed"
    );
    if json_output {
        println!("{}", serde_json::to_string(&view)?);
    } else {
        write_table(std::io::stdout(), &view)?;
    }

    Ok(())
}

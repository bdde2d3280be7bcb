use serde_json::Value;
use std::io::{self, Write};
use tabwriter::TabWriter;
use tokio::io::{self as aio, AsyncBufReadExt, AsyncWriteExt};
use tracing_subscriber::FmtSubscriber;

use canonicalizer::{is_futures, Quote};

#[tokio::main]
async fn main() -> aio::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let json_output = std::env::args().any(|a| a == "--json");

    let stdin = aio::BufReader::new(aio::stdin());
    let mut lines = stdin.lines();

    if json_output {
        let mut stdout = aio::stdout();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let Some(quote) = parse_line(&line) else {
                continue;
            };
            let out = serde_json::to_string(&quote).unwrap_or(line);
            stdout.write_all(out.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
        stdout.flush().await?;
    } else {
        let stdout = io::stdout();
        let mut tw = TabWriter::new(stdout);
        writeln!(tw, "PRODUCT\tCURRENCY\tPRICE\tDELIVERY\tFUTURES")?;

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(q) = parse_line(&line) {
                writeln!(
                    tw,
                    "{}\t{}\t{}\t{}\t{}",
                    q.product,
                    q.currency,
                    q.display_price(),
                    q.delivery,
                    is_futures(&q.product)
                )?;
            }
        }
        tw.flush()?;
    }

    Ok(())
}

fn parse_line(line: &str) -> Option<Quote> {
    match serde_json::from_str::<Value>(line) {
        Ok(v) => Quote::from_record(&v),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring malformed input line");
            None
        }
    }
}

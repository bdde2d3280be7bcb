use std::path::PathBuf;
use std::time::Duration;

use analytics::config::DEFAULT_INTERVAL_MIN;
use analytics::{PipelineConfig, Tab};
use canonicalizer::{CanonicalService, Currency};
use clap::{Parser, Subcommand};
use serde::Deserialize;

/// Origin of the board in local development (the Vite dev server).
pub const DEFAULT_ORIGIN: &str = "http://localhost:5173";

/// Command line arguments
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional path to a configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Absolute API base, tried before the origin (e.g. http://localhost:8000)
    #[arg(long)]
    pub api_base: Option<String>,

    /// Origin serving the board; used for same-origin requests
    #[arg(long)]
    pub origin: Option<String>,

    /// Market (plaza); aliases such as "bbca" or "Córdoba" are accepted
    #[arg(short, long)]
    pub market: Option<String>,

    /// Displayed partition (base, futures)
    #[arg(long)]
    pub tab: Option<String>,

    /// Displayed currency (ARS, USD)
    #[arg(long)]
    pub currency: Option<String>,

    /// Hide quotes without a price
    #[arg(long)]
    pub hide_unpriced: bool,

    /// Refresh interval in minutes
    #[arg(long)]
    pub interval_min: Option<u64>,

    /// Output sink type (stdout, file)
    #[arg(long)]
    pub sink: Option<String>,

    /// Output file path for the file sink
    #[arg(long)]
    pub file_path: Option<String>,

    /// Emit views as JSON lines instead of tables
    #[arg(long)]
    pub json: bool,

    /// Address for the Prometheus endpoint (e.g. 127.0.0.1:9100)
    #[arg(long)]
    pub metrics_addr: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Keep the board refreshed; read commands from stdin (default)
    Watch,
    /// Refresh once and print the board
    Once,
    /// Start the backend's scraping scheduler for the market
    Start,
    /// Export the market's quotes to the external store
    Export,
    /// Download the market's quotes as CSV
    Csv {
        /// Destination file (defaults to cotizaciones_<plaza>.csv)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// Application configuration loaded from file and environment
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default = "default_origin")]
    pub origin: String,
    #[serde(default)]
    pub market: String,
    #[serde(default)]
    pub tab: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub hide_unpriced: bool,
    #[serde(default = "default_interval_min")]
    pub interval_min: u64,
    #[serde(default = "default_true")]
    pub fallback_cache: bool,
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
    #[serde(default = "default_sink")]
    pub sink: String,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub metrics_addr: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_origin() -> String {
    DEFAULT_ORIGIN.into()
}

fn default_interval_min() -> u64 {
    DEFAULT_INTERVAL_MIN
}

fn default_true() -> bool {
    true
}

fn default_sink() -> String {
    "stdout".into()
}

fn default_format() -> String {
    "table".into()
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: None,
            origin: default_origin(),
            market: String::new(),
            tab: String::new(),
            currency: String::new(),
            hide_unpriced: false,
            interval_min: DEFAULT_INTERVAL_MIN,
            fallback_cache: true,
            http_timeout_secs: None,
            sink: default_sink(),
            file_path: None,
            format: default_format(),
            metrics_addr: None,
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Defaults, then the optional config file, then `QUOTES_*` environment
    /// variables, then command line flags.
    pub fn load(cli: &Cli) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("origin", DEFAULT_ORIGIN)?
            .set_default("market", "rosario")?
            .set_default("tab", "base")?
            .set_default("currency", "ARS")?
            .set_default("interval_min", DEFAULT_INTERVAL_MIN as i64)?
            .set_default("fallback_cache", true)?
            .set_default("sink", "stdout")?
            .set_default("format", "table")?
            .set_default("log_level", "info")?;
        if let Some(path) = &cli.config {
            builder = builder.add_source(config::File::with_name(path));
        }
        builder = builder.add_source(config::Environment::with_prefix("QUOTES").try_parsing(true));
        let cfg = builder.build()?;
        let mut settings: Settings = cfg.try_deserialize()?;
        settings.apply_cli(cli);
        Ok(settings)
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(b) = &cli.api_base {
            self.api_base = Some(b.clone());
        }
        if let Some(o) = &cli.origin {
            self.origin = o.clone();
        }
        if let Some(m) = &cli.market {
            self.market = m.clone();
        }
        if let Some(t) = &cli.tab {
            self.tab = t.clone();
        }
        if let Some(c) = &cli.currency {
            self.currency = c.clone();
        }
        if cli.hide_unpriced {
            self.hide_unpriced = true;
        }
        if let Some(i) = cli.interval_min {
            self.interval_min = i;
        }
        if let Some(s) = &cli.sink {
            self.sink = s.clone();
        }
        if let Some(p) = &cli.file_path {
            self.file_path = Some(p.clone());
        }
        if cli.json {
            self.format = "json".into();
        }
        if let Some(a) = &cli.metrics_addr {
            self.metrics_addr = Some(a.clone());
        }
    }

    /// Initial session configuration.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            market: CanonicalService::canonical_market(&self.market),
            tab: self.tab.parse::<Tab>().unwrap_or_default(),
            currency: Currency::parse(&self.currency),
            hide_unpriced: self.hide_unpriced,
            interval_min: self.interval_min,
        }
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canonicalizer::CanonicalMarket;

    #[test]
    fn cli_overrides_settings() {
        let cli = Cli::parse_from([
            "ingestor",
            "--market",
            "Bahía Blanca",
            "--tab",
            "futures",
            "--currency",
            "usd",
            "--hide-unpriced",
            "--interval-min",
            "5",
            "--json",
            "once",
        ]);
        let mut settings = Settings::default();
        settings.apply_cli(&cli);
        let cfg = settings.pipeline_config();
        assert_eq!(cfg.market, CanonicalMarket::Bahia);
        assert_eq!(cfg.tab, Tab::Futures);
        assert_eq!(cfg.currency, Currency::Usd);
        assert!(cfg.hide_unpriced);
        assert_eq!(cfg.interval_min, 5);
        assert_eq!(settings.format, "json");
        assert_eq!(cli.command, Some(Command::Once));
    }

    #[test]
    fn defaults_describe_local_development() {
        let settings = Settings::default();
        let cfg = settings.pipeline_config();
        assert_eq!(cfg.market, CanonicalMarket::Rosario);
        assert_eq!(cfg.tab, Tab::Base);
        assert_eq!(cfg.currency, Currency::Ars);
        assert_eq!(settings.origin, DEFAULT_ORIGIN);
        assert!(settings.fallback_cache);
        assert_eq!(settings.http_timeout(), None);
    }

    #[test]
    fn csv_subcommand_takes_output_path() {
        let cli = Cli::parse_from(["ingestor", "csv", "--out", "/tmp/q.csv"]);
        assert_eq!(
            cli.command,
            Some(Command::Csv {
                out: Some(PathBuf::from("/tmp/q.csv"))
            })
        );
    }
}

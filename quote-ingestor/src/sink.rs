use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use analytics::{to_table, ViewState};

use crate::config::Settings;
use crate::error::IngestorError;

/// How a view is rendered before it reaches a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Table,
    Json,
}

impl Format {
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("json") {
            Format::Json
        } else {
            Format::Table
        }
    }

    pub fn render(self, view: &ViewState) -> Result<String, IngestorError> {
        match self {
            Format::Table => Ok(to_table(view)),
            Format::Json => Ok(serde_json::to_string(view)?),
        }
    }
}

#[async_trait]
pub trait OutputSink: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), IngestorError>;

    fn format(&self) -> Format;

    async fn publish(&self, view: &ViewState) -> Result<(), IngestorError> {
        let text = self.format().render(view)?;
        self.send(&text).await
    }
}

pub type DynSink = Arc<dyn OutputSink>;

pub struct StdoutSink {
    stdout: Mutex<tokio::io::Stdout>,
    format: Format,
}

impl StdoutSink {
    pub fn new(format: Format) -> Self {
        Self {
            stdout: Mutex::new(tokio::io::stdout()),
            format,
        }
    }
}

#[async_trait]
impl OutputSink for StdoutSink {
    async fn send(&self, text: &str) -> Result<(), IngestorError> {
        let mut stdout = self.stdout.lock().await;
        stdout.write_all(text.as_bytes()).await?;
        if !text.ends_with('\n') {
            stdout.write_all(b"\n").await?;
        }
        stdout.flush().await?;
        Ok(())
    }

    fn format(&self) -> Format {
        self.format
    }
}

pub struct FileSink {
    file: Mutex<tokio::fs::File>,
    format: Format,
}

impl FileSink {
    pub async fn new(path: &str, format: Format) -> Result<Self, std::io::Error> {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        Ok(Self {
            file: Mutex::new(file),
            format,
        })
    }
}

#[async_trait]
impl OutputSink for FileSink {
    async fn send(&self, text: &str) -> Result<(), IngestorError> {
        let mut file = self.file.lock().await;
        file.write_all(text.as_bytes()).await?;
        if !text.ends_with('\n') {
            file.write_all(b"\n").await?;
        }
        file.flush().await?;
        Ok(())
    }

    fn format(&self) -> Format {
        self.format
    }
}

/// Build the sink named by `settings.sink`.
pub async fn from_settings(settings: &Settings) -> Result<DynSink, IngestorError> {
    let format = Format::parse(&settings.format);
    match settings.sink.as_str() {
        "stdout" => Ok(Arc::new(StdoutSink::new(format))),
        "file" => {
            let path = settings
                .file_path
                .as_deref()
                .ok_or_else(|| IngestorError::Other("file sink requires file_path".into()))?;
            Ok(Arc::new(FileSink::new(path, format).await?))
        }
        other => Err(IngestorError::Other(format!("unknown sink: {other}"))),
    }
}

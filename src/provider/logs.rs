//! Log pipeline.
//!
//! # Responsibilities
//! - Build the OpenTelemetry logger provider for the selected backend
//! - Build the local JSON sink (stdout or an append-mode file)
//!
//! # Design Decisions
//! - The local sink is owned by the kit and writes newline-delimited JSON
//!   itself, so caller attributes land as real fields and the host
//!   application's own `tracing` subscriber is left alone
//! - Both sinks honour the configured level

use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use opentelemetry::logs::LoggerProvider as _;
use opentelemetry::InstrumentationScope;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::logs::{LoggerProviderBuilder, SdkLogger, SdkLoggerProvider};
use opentelemetry_sdk::Resource;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriter};

use crate::config::{KitConfig, LogLevel};
use crate::error::{KitError, Signal};
use crate::keys;
use crate::provider::backend::LogsBackend;

/// Instrumentation scope name of exported log records.
pub const LOGGER_NAME: &str = "otelkit";

/// Replaces the configured exporter when the kit is built.
pub type LogsHook = Box<dyn FnOnce(LoggerProviderBuilder) -> LoggerProviderBuilder + Send>;

pub struct LogsPipeline {
    pub provider: SdkLoggerProvider,
    pub logger: SdkLogger,
}

pub fn build_logs_pipeline(
    config: &KitConfig,
    resource: Resource,
    hook: Option<LogsHook>,
) -> Result<LogsPipeline, KitError> {
    let builder = SdkLoggerProvider::builder().with_resource(resource);

    let provider = match hook {
        Some(hook) => hook(builder).build(),
        None => match LogsBackend::select(config)? {
            LogsBackend::Otlp { endpoint } => {
                tracing::debug!(endpoint = %endpoint, "Creating OTLP logs exporter");
                let exporter = opentelemetry_otlp::LogExporter::builder()
                    .with_http()
                    .with_endpoint(endpoint)
                    .build()
                    .map_err(|e| KitError::exporter(Signal::Logs, e))?;
                builder.with_batch_exporter(exporter).build()
            }
            LogsBackend::Stdout => builder
                .with_batch_exporter(opentelemetry_stdout::LogExporter::default())
                .build(),
            LogsBackend::None => builder.build(),
        },
    };

    let scope = InstrumentationScope::builder(LOGGER_NAME)
        .with_version(config.service_version.clone())
        .build();
    let logger = provider.logger_with_scope(scope);

    Ok(LogsPipeline { provider, logger })
}

/// One line of the local sink.
pub(crate) struct LocalRecord<'a> {
    pub level: LogLevel,
    pub message: &'a str,
    pub error: Option<&'a str>,
    pub trace_id: Option<&'a str>,
    pub span_id: Option<&'a str>,
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Newline-delimited JSON writer behind the kit's local logs.
///
/// Caller attributes become top-level fields next to `timestamp`, `level`,
/// `message`, `target` and the correlation ids. An attribute never replaces
/// one of those.
pub struct LocalSink {
    writer: BoxMakeWriter,
}

impl LocalSink {
    pub(crate) fn new(writer: BoxMakeWriter) -> Self {
        Self { writer }
    }

    /// Write one record. Write failures are dropped.
    pub(crate) fn write(&self, record: LocalRecord<'_>) {
        let mut line = match serde_json::to_vec(&render(record, timestamp())) {
            Ok(line) => line,
            Err(_) => return,
        };
        line.push(b'\n');

        let mut writer = self.writer.make_writer();
        let _ = writer.write_all(&line);
        let _ = writer.flush();
    }
}

fn timestamp() -> Option<String> {
    let mut rendered = String::new();
    let formatted = SystemTime.format_time(&mut Writer::new(&mut rendered));
    formatted.ok().map(|()| rendered)
}

fn render(record: LocalRecord<'_>, timestamp: Option<String>) -> serde_json::Value {
    let mut line = serde_json::Map::new();
    if let Some(timestamp) = timestamp {
        line.insert("timestamp".into(), timestamp.into());
    }
    line.insert("level".into(), record.level.as_str().to_uppercase().into());
    line.insert("target".into(), LOGGER_NAME.into());
    line.insert("message".into(), record.message.into());
    if let Some(trace_id) = record.trace_id {
        line.insert(keys::log::TRACE_ID.into(), trace_id.into());
    }
    if let Some(span_id) = record.span_id {
        line.insert(keys::log::SPAN_ID.into(), span_id.into());
    }
    if let Some(error) = record.error {
        line.insert(keys::log::ERROR.into(), error.into());
    }
    for (key, value) in record.fields {
        line.entry(key).or_insert(value);
    }
    serde_json::Value::Object(line)
}

/// Build the local structured sink.
pub fn build_local_sink(config: &KitConfig) -> Result<LocalSink, KitError> {
    let writer = match &config.log_file_path {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| KitError::LogFile {
                    path: path.clone(),
                    source,
                })?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stdout),
    };

    Ok(LocalSink::new(writer))
}

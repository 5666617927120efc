//! Per-domain structured log sinks.
//!
//! # Responsibilities
//! - Open one append-only JSON-lines file per [`Domain`] at startup
//! - Tag every entry with the domain and the request's correlation id
//! - Stay safe under concurrent writers
//!
//! # Design Decisions
//! - An entry is serialized completely, then handed to the sink's background
//!   writer as one message, so entries never interleave and request tasks
//!   never block on file I/O
//! - The writer is not lossy: a full queue applies backpressure
//! - Pending entries are flushed when the last handle to a sink is dropped
//! - Every entry is mirrored to `tracing` for the process log

use std::collections::HashMap;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};

use crate::domain::Domain;
use crate::observability::correlation::CorrelationId;

/// Severity of a domain log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Warn => "warning",
            Level::Error => "error",
        }
    }
}

/// Failure to open a domain log destination.
#[derive(Debug, thiserror::Error)]
#[error("unable to open log destination {path}: {source}")]
pub struct LogSinkError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Append-only sink for one domain.
pub struct DomainLogger {
    domain: Domain,
    path: PathBuf,
    sink: NonBlocking,
    _flush: WorkerGuard,
}

impl fmt::Debug for DomainLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainLogger")
            .field("domain", &self.domain)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl DomainLogger {
    /// Open (creating if needed) `<dir>/<domain>.log` in append mode.
    pub fn open(dir: &Path, domain: Domain) -> Result<Self, LogSinkError> {
        let path = dir.join(format!("{}.log", domain.as_str()));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| LogSinkError {
                path: path.clone(),
                source,
            })?;

        let (sink, flush) = NonBlockingBuilder::default()
            .lossy(false)
            .thread_name("domain-log")
            .finish(file);

        Ok(Self {
            domain,
            path,
            sink,
            _flush: flush,
        })
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write one entry. Structured `fields` are flattened into the entry when
    /// they are an object and stored under `fields` otherwise.
    pub fn write(&self, level: Level, correlation: &CorrelationId, message: &str, fields: Value) {
        let mut entry = Map::new();
        entry.insert(
            "@timestamp".into(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        entry.insert("@version".into(), Value::from("1"));
        entry.insert("service".into(), Value::from(self.domain.as_str()));
        entry.insert("correlation_id".into(), Value::from(correlation.as_str()));
        entry.insert("level".into(), Value::from(level.as_str()));
        entry.insert("message".into(), Value::from(message));
        match fields {
            Value::Object(extra) => {
                for (key, value) in extra {
                    entry.entry(key).or_insert(value);
                }
            }
            Value::Null => {}
            other => {
                entry.insert("fields".into(), other);
            }
        }

        let mut line = Value::Object(entry).to_string();
        line.push('\n');

        if let Err(e) = self.sink.clone().write_all(line.as_bytes()) {
            tracing::error!(domain = %self.domain, path = ?self.path, error = %e, "Failed to write domain log entry");
        }

        match level {
            Level::Info => tracing::info!(domain = %self.domain, correlation_id = %correlation, "{}", message),
            Level::Warn => tracing::warn!(domain = %self.domain, correlation_id = %correlation, "{}", message),
            Level::Error => tracing::error!(domain = %self.domain, correlation_id = %correlation, "{}", message),
        }
    }
}

/// All domain sinks, opened once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct DomainLogs {
    loggers: Arc<HashMap<Domain, Arc<DomainLogger>>>,
}

impl DomainLogs {
    /// Create `dir` if absent and open a sink for every domain.
    pub fn open(dir: &Path) -> Result<Self, LogSinkError> {
        fs::create_dir_all(dir).map_err(|source| LogSinkError {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut loggers = HashMap::new();
        for domain in Domain::ALL {
            let logger = DomainLogger::open(dir, domain)?;
            tracing::debug!(domain = %domain, path = ?logger.path(), "Domain log sink opened");
            loggers.insert(domain, Arc::new(logger));
        }

        Ok(Self {
            loggers: Arc::new(loggers),
        })
    }

    /// Bind the domain's sink to one request.
    pub fn attach(&self, domain: Domain, correlation: CorrelationId) -> Option<RequestLog> {
        self.loggers.get(&domain).map(|logger| RequestLog {
            logger: logger.clone(),
            correlation,
        })
    }
}

/// A domain sink bound to one request's correlation id.
///
/// Cheap to clone; travels in request and response extensions.
#[derive(Debug, Clone)]
pub struct RequestLog {
    logger: Arc<DomainLogger>,
    correlation: CorrelationId,
}

impl RequestLog {
    pub fn domain(&self) -> Domain {
        self.logger.domain()
    }

    pub fn correlation(&self) -> &CorrelationId {
        &self.correlation
    }

    pub fn info(&self, message: &str, fields: Value) {
        self.logger.write(Level::Info, &self.correlation, message, fields);
    }

    pub fn warn(&self, message: &str, fields: Value) {
        self.logger.write(Level::Warn, &self.correlation, message, fields);
    }

    pub fn error(&self, message: &str, fields: Value) {
        self.logger.write(Level::Error, &self.correlation, message, fields);
    }
}

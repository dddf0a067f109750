use chrono::Utc;
use std::borrow::Cow;
use std::collections::hash_map::DefaultHasher;
use std::error::Error;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::field::{Field as TracingField, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::appender::Appender;
use crate::encoder::Encoder;
use crate::field::{Field, Value};
use crate::init::LayerConfig;
use crate::record::{Caller, Level, LoggerId, Record};
use crate::sink::JournalSink;

/// Events from this crate are never fed back into the journal.
const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");

/// `tracing_subscriber` layer that turns events into [`Record`]s and
/// forwards them to an [`Appender`] owned by a background task.
///
/// The appender is only ever touched by that task, so application threads
/// never contend on it and never wait on sink I/O. When the channel is full
/// the record is dropped and counted.
pub struct JournalLayer {
    sender: mpsc::Sender<Record>,
    max_level: tracing::Level,
    static_fields: Arc<[Field]>,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Successfully enqueued into channel.
    pub enqueued_events: Arc<AtomicU64>,
    /// Dropped because the channel was full.
    pub dropped_events: Arc<AtomicU64>,
}

impl JournalLayer {
    /// Create a new layer and spawn the task that owns `appender`.
    ///
    /// The task appends every record it receives, flushes every
    /// `flush_interval`, and flushes and closes the appender once all
    /// senders (this layer) are gone. Must be called inside a Tokio runtime.
    ///
    /// Minimal thresholds are enforced for the channel size and
    /// `flush_interval` to avoid degenerate configurations.
    pub fn new<S, E>(appender: Appender<S, E>, config: &LayerConfig) -> (Self, JoinHandle<()>)
    where
        S: JournalSink + 'static,
        E: Encoder + 'static,
    {
        let buffer = config.channel_buffer.max(16);
        let flush_interval = config.flush_interval.max(Duration::from_millis(10));

        let (tx, rx) = mpsc::channel::<Record>(buffer);
        let handle = tokio::spawn(dispatch(appender, rx, flush_interval));

        let static_fields: Vec<Field> = config
            .static_fields
            .iter()
            .map(|(k, v)| Field::str(k.clone(), v.clone()))
            .collect();

        (
            Self {
                sender: tx,
                max_level: config.max_level,
                static_fields: Arc::from(static_fields),
                total_events: Arc::new(AtomicU64::new(0)),
                enqueued_events: Arc::new(AtomicU64::new(0)),
                dropped_events: Arc::new(AtomicU64::new(0)),
            },
            handle,
        )
    }
}

async fn dispatch<S, E>(
    mut appender: Appender<S, E>,
    mut rx: mpsc::Receiver<Record>,
    flush_interval: Duration,
) where
    S: JournalSink,
    E: Encoder,
{
    let mut ticker = interval(flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    // Our own tracing events are filtered out by the layer, so report
    // dispatcher failures on stderr.
    loop {
        tokio::select! {
            maybe = rx.recv() => match maybe {
                Some(record) => {
                    if let Err(e) = appender.append(&record) {
                        eprintln!("error appending journal record: {}", e);
                    }
                }
                None => break,
            },
            _ = ticker.tick() => {
                if let Err(e) = appender.flush() {
                    eprintln!("error flushing journal batch: {}", e);
                }
            }
        }
    }

    if let Err(e) = appender.close() {
        eprintln!("error closing journal appender: {}", e);
    }
}

/// Stable identity for all events of one target.
fn logger_id(target: &str) -> LoggerId {
    let mut hasher = DefaultHasher::new();
    target.hash(&mut hasher);
    LoggerId(hasher.finish())
}

impl<S> Layer<S> for JournalLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        let meta = event.metadata();
        // tracing orders levels by verbosity: TRACE is the greatest.
        if *meta.level() > self.max_level || meta.target().starts_with(OWN_TARGET) {
            return;
        }

        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        let target = meta.target();
        let record = Record {
            level: Level::from(*meta.level()),
            text: visitor.message.unwrap_or_default(),
            timestamp: Utc::now(),
            logger_name: Some(target.to_string()),
            logger_id: logger_id(target),
            caller: meta
                .file()
                .map(|file| Caller::new(file, meta.line().unwrap_or(0))),
            fields: visitor.fields,
            derived_fields: Arc::clone(&self.static_fields),
        };

        match self.sender.try_send(record) {
            Ok(()) => {
                self.enqueued_events.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.dropped_events.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Collects event fields as typed [`Field`]s.
#[derive(Default)]
pub struct RecordVisitor {
    pub fields: Vec<Field>,
    pub message: Option<String>,
}

impl RecordVisitor {
    fn push(&mut self, field: &TracingField, value: Value) {
        self.fields.push(Field::new(Cow::Borrowed(field.name()), value));
    }
}

impl Visit for RecordVisitor {
    fn record_str(&mut self, field: &TracingField, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.push(field, Value::Str(Cow::Owned(value.to_string())));
        }
    }

    fn record_i64(&mut self, field: &TracingField, value: i64) {
        self.push(field, Value::I64(value));
    }

    fn record_u64(&mut self, field: &TracingField, value: u64) {
        self.push(field, Value::U64(value));
    }

    fn record_f64(&mut self, field: &TracingField, value: f64) {
        self.push(field, Value::F64(value));
    }

    fn record_bool(&mut self, field: &TracingField, value: bool) {
        self.push(field, Value::Bool(value));
    }

    fn record_error(&mut self, field: &TracingField, value: &(dyn Error + 'static)) {
        self.push(field, Value::Error(Arc::new(CapturedError::new(value))));
    }

    fn record_debug(&mut self, field: &TracingField, value: &dyn fmt::Debug) {
        let text = format!("{:?}", value);
        if field.name() == "message" {
            self.message = Some(text);
        } else {
            self.push(field, Value::Str(Cow::Owned(text)));
        }
    }
}

/// Owned snapshot of a borrowed error and its `source()` chain.
///
/// `{}` prints the error's own message, `{:#}` the whole chain.
#[derive(Debug, Clone)]
pub struct CapturedError {
    message: String,
    chain: Vec<String>,
}

impl CapturedError {
    pub fn new(err: &(dyn Error + 'static)) -> Self {
        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }
        CapturedError {
            message: err.to_string(),
            chain,
        }
    }
}

impl fmt::Display for CapturedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if f.alternate() {
            for cause in &self.chain {
                write!(f, ": {}", cause)?;
            }
        }
        Ok(())
    }
}

impl Error for CapturedError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Inner;

    impl fmt::Display for Inner {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("connection reset")
        }
    }

    impl Error for Inner {}

    #[derive(Debug)]
    struct Outer(Inner);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("request failed")
        }
    }

    impl Error for Outer {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn captured_error_keeps_chain_for_alternate() {
        let captured = CapturedError::new(&Outer(Inner));
        assert_eq!(captured.to_string(), "request failed");
        assert_eq!(format!("{:#}", captured), "request failed: connection reset");
    }

    #[test]
    fn logger_id_is_stable_per_target() {
        assert_eq!(logger_id("app::db"), logger_id("app::db"));
        assert_ne!(logger_id("app::db"), logger_id("app::http"));
    }
}

use crate::appender::Appender;
use crate::config::{AppenderConfig, EncoderConfig};
use crate::encoder::JournalEncoder;
use crate::layer::JournalLayer;
use crate::sink::JournalSink;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the journal layer.
///
/// Controls the channel between application threads and the dispatcher
/// task, how often buffered records are flushed, which events are captured,
/// and whether events are also printed to the console via a `fmt` layer.
///
/// **Fields**
/// - `channel_buffer`: maximum number of [`Record`](crate::record::Record)s
///   queued before new records are dropped.
/// - `flush_interval`: maximum time a record waits in the appender buffer
///   when the flush threshold is not reached.
/// - `max_level`: most verbose `tracing` level captured.
/// - `static_fields`: name/value pairs attached to every record as derived
///   fields (service name, host, version).
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   installed next to [`JournalLayer`].
/// - `encoder`, `appender`: passed to [`JournalEncoder`] and [`Appender`].
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub channel_buffer: usize,
    pub flush_interval: Duration,
    pub max_level: tracing::Level,
    pub static_fields: Vec<(String, String)>,
    pub enable_stdout: bool,
    pub encoder: EncoderConfig,
    pub appender: AppenderConfig,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            channel_buffer: 1024,
            flush_interval: Duration::from_millis(200),
            max_level: tracing::Level::INFO,
            static_fields: Vec::new(),
            enable_stdout: false,
            encoder: EncoderConfig::default(),
            appender: AppenderConfig::default(),
        }
    }
}

/// Initialize the global `tracing` subscriber writing to `sink` with the
/// provided [`LayerConfig`].
///
/// **Parameters**
/// - `sink`: implementation of [`JournalSink`] that receives encoded
///   batches.
/// - `config`: [`LayerConfig`] controlling encoding, buffering and capture.
///
/// **Returns**
/// - The handle of the dispatcher task. It finishes after the subscriber is
///   dropped and the last batch has been flushed.
/// - `Err(..)` if a global subscriber was already installed.
///
/// Must be called inside a Tokio runtime.
pub fn init_tracing_with_config<S>(
    sink: S,
    config: LayerConfig,
) -> Result<JoinHandle<()>, SetGlobalDefaultError>
where
    S: JournalSink + 'static,
{
    let encoder = JournalEncoder::new(config.encoder.clone());
    let appender = Appender::with_encoder(encoder, sink, config.appender.clone());
    let (layer, handle) = JournalLayer::new(appender, &config);

    // The two branches produce different subscriber types.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(handle)
}

/// Initialize tracing with sensible defaults.
///
/// Equivalent to calling [`init_tracing_with_config`] with
/// [`LayerConfig::default`].
pub fn init_tracing<S>(sink: S) -> Result<JoinHandle<()>, SetGlobalDefaultError>
where
    S: JournalSink + 'static,
{
    init_tracing_with_config(sink, LayerConfig::default())
}

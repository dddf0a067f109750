use crate::buffer::Buffer;
use crate::config::AppenderConfig;
use crate::encoder::{Encoder, JournalEncoder};
use crate::error::AppendError;
use crate::record::Record;
use crate::sink::JournalSink;

/// Batches encoded records and hands them to a [`JournalSink`].
///
/// Records are encoded into one owned buffer. Once an append pushes the
/// buffer past `flush_threshold` the whole buffer is written in one sink
/// call.
///
/// **Delivery**
///
/// A flush resets the buffer whether or not the sink call succeeded, so a
/// failed write drops the batch (at-most-once delivery). Wrap the sink if
/// you need retries.
///
/// The appender is not synchronized; feed it from one thread or task at a
/// time (see [`JournalLayer`](crate::layer::JournalLayer) for a dispatcher).
pub struct Appender<S, E = JournalEncoder> {
    encoder: E,
    sink: Option<S>,
    buf: Buffer,
    flush_threshold: usize,
}

impl<S: JournalSink> Appender<S, JournalEncoder> {
    /// Appender with the default encoder and buffering.
    pub fn new(sink: S) -> Self {
        Appender::with_encoder(JournalEncoder::default(), sink, AppenderConfig::default())
    }
}

impl<S: JournalSink, E: Encoder> Appender<S, E> {
    pub fn with_encoder(encoder: E, sink: S, config: AppenderConfig) -> Self {
        Appender {
            encoder,
            sink: Some(sink),
            buf: Buffer::with_capacity(config.initial_capacity),
            flush_threshold: config.flush_threshold,
        }
    }

    /// Encode `record` into the buffer, flushing if it grew past the
    /// threshold.
    ///
    /// If encoding fails the buffer is rolled back to its length before the
    /// call, so earlier records stay intact.
    pub fn append(&mut self, record: &Record) -> Result<(), AppendError> {
        if self.sink.is_none() {
            return Err(AppendError::Closed);
        }

        let mark = self.buf.len();
        if let Err(e) = self.encoder.encode(&mut self.buf, record) {
            self.buf.truncate(mark);
            return Err(e.into());
        }

        if self.buf.len() > self.flush_threshold {
            self.flush()?;
        }
        Ok(())
    }

    /// Write all buffered records to the sink in one call.
    ///
    /// The buffer is reset even if the sink fails. An empty buffer is a
    /// no-op.
    pub fn flush(&mut self) -> Result<(), AppendError> {
        let sink = self.sink.as_mut().ok_or(AppendError::Closed)?;
        if self.buf.is_empty() {
            return Ok(());
        }

        let result = sink.write(self.buf.as_bytes());
        let size = self.buf.len();
        self.buf.reset();

        match result {
            Ok(()) => {
                tracing::debug!(bytes = size, "flushed journal batch");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(bytes = size, error = %e, "journal sink write failed, batch dropped");
                Err(AppendError::Sink(e))
            }
        }
    }

    /// Same as [`Appender::flush`].
    pub fn sync(&mut self) -> Result<(), AppendError> {
        self.flush()
    }

    /// Flush buffered records, then close the sink.
    ///
    /// The sink is closed even if the flush fails; the first error is
    /// returned. Any later call returns [`AppendError::Closed`].
    pub fn close(&mut self) -> Result<(), AppendError> {
        if self.sink.is_none() {
            return Err(AppendError::Closed);
        }
        let flushed = self.flush();
        let closed = match self.sink.take() {
            Some(mut sink) => sink.close().map_err(AppendError::Sink),
            None => Ok(()),
        };
        flushed.and(closed)
    }

    pub fn is_closed(&self) -> bool {
        self.sink.is_none()
    }

    /// Bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    pub fn sink(&self) -> Option<&S> {
        self.sink.as_ref()
    }
}

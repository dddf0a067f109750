use std::io::Write;

use crate::error::BoxError;

/// Destination for finished batches produced by the
/// [`Appender`](crate::appender::Appender).
///
/// Implementations transport the bytes to a concrete backend (the journal
/// socket, a file, a test buffer). The appender never inspects the error and
/// never retries; wrap the sink if you need retries or spooling.
pub trait JournalSink: Send {
    /// Deliver one batch.
    ///
    /// **Parameters**
    /// - `batch`: one or more encoded records separated by a single `'\n'`.
    ///
    /// **Returns**
    /// - `Ok(())` if the backend accepted the whole batch.
    /// - `Err(..)` otherwise. The appender drops the batch either way.
    fn write(&mut self, batch: &[u8]) -> Result<(), BoxError>;

    /// Release the underlying resource.
    ///
    /// Default implementation is a no-op.
    fn close(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<S: JournalSink + ?Sized> JournalSink for Box<S> {
    fn write(&mut self, batch: &[u8]) -> Result<(), BoxError> {
        (**self).write(batch)
    }

    fn close(&mut self) -> Result<(), BoxError> {
        (**self).close()
    }
}

/// Sink writing each batch to an [`std::io::Write`] implementation.
///
/// Every batch is written in full and flushed before `write` returns.
#[derive(Debug)]
pub struct WriterSink<W> {
    inner: W,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(inner: W) -> Self {
        WriterSink { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write + Send> JournalSink for WriterSink<W> {
    fn write(&mut self, batch: &[u8]) -> Result<(), BoxError> {
        self.inner.write_all(batch)?;
        self.inner.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), BoxError> {
        self.inner.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_sink_appends_batches() {
        let mut sink = WriterSink::new(Vec::new());
        sink.write(b"A\n").unwrap();
        sink.write(b"B\n").unwrap();
        sink.close().unwrap();
        assert_eq!(sink.into_inner(), b"A\nB\n");
    }
}

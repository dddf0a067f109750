use crate::error::BoxError;
use crate::sink::JournalSink;

/// A sink that simply drops all batches.
///
/// Useful for measuring the overhead of the encoder and appender without any
/// external I/O, and for tests that don't care about delivery.
#[derive(Clone, Debug, Default)]
pub struct NoopSink;

impl JournalSink for NoopSink {
    fn write(&mut self, _batch: &[u8]) -> Result<(), BoxError> {
        Ok(())
    }
}

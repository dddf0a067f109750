use std::fmt;
use std::io;

use journal_log_sink::appender::Appender;
use journal_log_sink::field::{Field, Value};
use journal_log_sink::record::{Level, Record};
use journal_log_sink::sink::WriterSink;

#[derive(Debug)]
struct InternalError(io::Error);

impl fmt::Display for InternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("internal error")
    }
}

impl std::error::Error for InternalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Frames are binary; pipe through `xxd` to inspect them.
    let mut appender = Appender::new(WriterSink::new(io::stdout()));

    let record = Record::new(Level::INFO, "greg test")
        .with_field(Field::error(
            "_error",
            InternalError(io::Error::new(io::ErrorKind::Other, "error")),
        ))
        .with_field(Field::new("ints", Value::I64s(vec![123, 2342, 234])))
        .with_field(Field::new("ints", Value::I64s(vec![123, 2342, 234])))
        .with_field(Field::bytes("bytes", "byte array"));

    appender.append(&record)?;
    appender.append(&record)?;
    appender.flush()?;
    appender.close()?;
    Ok(())
}

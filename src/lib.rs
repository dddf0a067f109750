pub mod buffer;
pub mod normalize;
pub mod record;
pub mod field;
pub mod error;
pub mod format;
pub mod structured;
pub mod config;
pub mod cache;
pub mod encoder;
pub mod sink;
pub mod noop_sink;
pub mod appender;
pub mod layer;
pub mod init;

pub use appender::Appender;
pub use buffer::Buffer;
pub use encoder::{Encoder, JournalEncoder};
pub use error::{AppendError, EncodeError};
pub use field::{Field, Value};
pub use record::{Caller, Level, LoggerId, Record};
pub use sink::{JournalSink, WriterSink};

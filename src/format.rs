//! Pluggable text formatters for times, durations, errors, levels and
//! callers.
//!
//! Each strategy writes the value's text straight into the frame being
//! built. The error strategy is the odd one out: it receives the field
//! visitor and may emit more than one field.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use crate::buffer::Buffer;
use crate::error::{EncodeError, FormatterKind};
use crate::field::{FieldError, FieldVisitor};
use crate::record::{Caller, Level};

/// Suffix of the sibling field holding an error's detailed form.
pub const VERBOSE_SUFFIX: &str = "_VERBOSE";

pub type TimeFormatter =
    Arc<dyn Fn(&DateTime<Utc>, &mut Buffer) -> Result<(), EncodeError> + Send + Sync>;
pub type DurationFormatter =
    Arc<dyn Fn(Duration, &mut Buffer) -> Result<(), EncodeError> + Send + Sync>;
pub type LevelFormatter = Arc<dyn Fn(Level, &mut Buffer) -> Result<(), EncodeError> + Send + Sync>;
pub type CallerFormatter =
    Arc<dyn Fn(&Caller, &mut Buffer) -> Result<(), EncodeError> + Send + Sync>;
pub type ErrorFormatter = Arc<
    dyn Fn(&str, &FieldError, &mut dyn FieldVisitor) -> Result<(), EncodeError> + Send + Sync,
>;

/// Set of formatter strategies used by the encoder.
#[derive(Clone)]
pub struct Formatters {
    pub time: TimeFormatter,
    pub duration: DurationFormatter,
    pub error: ErrorFormatter,
    pub level: LevelFormatter,
    pub caller: CallerFormatter,
}

impl Default for Formatters {
    fn default() -> Self {
        Formatters {
            time: Arc::new(rfc3339_time),
            duration: Arc::new(string_duration),
            error: Arc::new(default_error),
            level: Arc::new(lower_case_level),
            caller: Arc::new(short_caller),
        }
    }
}

impl fmt::Debug for Formatters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formatters").finish_non_exhaustive()
    }
}

impl Formatters {
    pub fn with_time(mut self, f: TimeFormatter) -> Self {
        self.time = f;
        self
    }

    pub fn with_duration(mut self, f: DurationFormatter) -> Self {
        self.duration = f;
        self
    }

    pub fn with_error(mut self, f: ErrorFormatter) -> Self {
        self.error = f;
        self
    }

    pub fn with_level(mut self, f: LevelFormatter) -> Self {
        self.level = f;
        self
    }

    pub fn with_caller(mut self, f: CallerFormatter) -> Self {
        self.caller = f;
        self
    }
}

fn io_err(kind: FormatterKind) -> impl FnOnce(std::io::Error) -> EncodeError {
    move |e| EncodeError::formatter(kind, e)
}

/// RFC 3339 in UTC with trailing zeros of the fraction trimmed,
/// e.g. `2024-05-01T10:00:00.5Z`. Whole seconds have no fraction.
pub fn rfc3339_time(t: &DateTime<Utc>, buf: &mut Buffer) -> Result<(), EncodeError> {
    // Always nine fractional digits followed by `Z`.
    let text = t.to_rfc3339_opts(SecondsFormat::Nanos, true);
    let body = text.trim_end_matches('Z');
    buf.push_str(body.trim_end_matches('0').trim_end_matches('.'));
    buf.push(b'Z');
    Ok(())
}

/// Seconds since the Unix epoch with microsecond precision, e.g. `1714557600.500000`.
pub fn unix_time(t: &DateTime<Utc>, buf: &mut Buffer) -> Result<(), EncodeError> {
    let secs = t.timestamp();
    let micros = t.timestamp_subsec_micros();
    write!(buf, "{}.{:06}", secs, micros).map_err(io_err(FormatterKind::Time))
}

/// Compact human readable duration: `1s`, `1.5ms`, `250ns`.
pub fn string_duration(d: Duration, buf: &mut Buffer) -> Result<(), EncodeError> {
    write!(buf, "{:?}", d).map_err(io_err(FormatterKind::Duration))
}

/// Whole nanoseconds as an integer.
pub fn nanos_duration(d: Duration, buf: &mut Buffer) -> Result<(), EncodeError> {
    write!(buf, "{}", d.as_nanos()).map_err(io_err(FormatterKind::Duration))
}

/// `debug`, `info`, `warning`, `error`.
pub fn lower_case_level(level: Level, buf: &mut Buffer) -> Result<(), EncodeError> {
    write!(buf, "{}", level).map_err(io_err(FormatterKind::Level))
}

/// `DEBUG`, `INFO`, `WARNING`, `ERROR`.
pub fn upper_case_level(level: Level, buf: &mut Buffer) -> Result<(), EncodeError> {
    let start = buf.len();
    lower_case_level(level, buf)?;
    let upper = buf.since(start).to_ascii_uppercase();
    buf.truncate(start);
    buf.extend_from_slice(&upper);
    Ok(())
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Last directory and file name: `/a/b/c/f.rs:6` becomes `c/f.rs:6`.
pub fn short_caller(caller: &Caller, buf: &mut Buffer) -> Result<(), EncodeError> {
    let file = caller.file.as_str();
    let short = match file.rfind(is_separator) {
        Some(last) => match file[..last].rfind(is_separator) {
            Some(prev) => &file[prev + 1..],
            None => file,
        },
        None => file,
    };
    write!(buf, "{}:{}", short, caller.line).map_err(io_err(FormatterKind::Caller))
}

/// Full path as recorded: `/a/b/c/f.rs:6`.
pub fn full_caller(caller: &Caller, buf: &mut Buffer) -> Result<(), EncodeError> {
    write!(buf, "{}:{}", caller.file, caller.line).map_err(io_err(FormatterKind::Caller))
}

/// Detailed form of an error, if it carries more than its message.
///
/// Alternate formatting (`{:#}`) wins when it differs from the plain
/// message. Otherwise the `source()` chain is joined with `": "`.
pub fn verbose_error(err: &FieldError) -> Option<String> {
    let short = err.to_string();
    let alternate = format!("{:#}", err);
    if alternate != short {
        return Some(alternate);
    }

    let mut source = err.source();
    if source.is_none() {
        return None;
    }
    let mut chain = short;
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    Some(chain)
}

/// Writes the error message under `key` and, when the error has a
/// detailed form, that form under `<key>_VERBOSE` right after it.
pub fn default_error(
    key: &str,
    err: &FieldError,
    visitor: &mut dyn FieldVisitor,
) -> Result<(), EncodeError> {
    visitor.visit_str(key, &err.to_string())?;
    if let Some(verbose) = verbose_error(err) {
        visitor.visit_str(&format!("{}{}", key, VERBOSE_SUFFIX), &verbose)?;
    }
    Ok(())
}

/// Writes only the error message, never a `_VERBOSE` field.
pub fn short_error(
    key: &str,
    err: &FieldError,
    visitor: &mut dyn FieldVisitor,
) -> Result<(), EncodeError> {
    visitor.visit_str(key, &err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Debug)]
    struct Leaf;

    impl fmt::Display for Leaf {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("disk full")
        }
    }

    impl std::error::Error for Leaf {}

    #[derive(Debug)]
    struct Wrapped(Leaf);

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("write failed")
        }
    }

    impl std::error::Error for Wrapped {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    fn text(f: impl FnOnce(&mut Buffer) -> Result<(), EncodeError>) -> String {
        let mut buf = Buffer::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn time_formats() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(text(|b| rfc3339_time(&t, b)), "2024-05-01T10:00:00Z");
        assert_eq!(text(|b| unix_time(&t, b)), "1714557600.000000");

        let half = t + chrono::Duration::milliseconds(500);
        assert_eq!(text(|b| rfc3339_time(&half, b)), "2024-05-01T10:00:00.5Z");

        let odd = t + chrono::Duration::nanoseconds(1_020);
        assert_eq!(text(|b| rfc3339_time(&odd, b)), "2024-05-01T10:00:00.00000102Z");
    }

    #[test]
    fn duration_formats() {
        assert_eq!(text(|b| string_duration(Duration::from_secs(1), b)), "1s");
        assert_eq!(text(|b| string_duration(Duration::from_micros(1500), b)), "1.5ms");
        assert_eq!(text(|b| nanos_duration(Duration::from_millis(2), b)), "2000000");
    }

    #[test]
    fn level_formats() {
        assert_eq!(text(|b| lower_case_level(Level::WARN, b)), "warning");
        assert_eq!(text(|b| upper_case_level(Level::ERROR, b)), "ERROR");
    }

    #[test]
    fn caller_formats() {
        let caller = Caller::new("/a/b/c/f.rs", 6);
        assert_eq!(text(|b| short_caller(&caller, b)), "c/f.rs:6");
        assert_eq!(text(|b| full_caller(&caller, b)), "/a/b/c/f.rs:6");
        assert_eq!(text(|b| short_caller(&Caller::new("main.rs", 1), b)), "main.rs:1");
        assert_eq!(text(|b| short_caller(&Caller::new("src/main.rs", 2), b)), "src/main.rs:2");
    }

    #[test]
    fn verbose_form_from_source_chain() {
        assert_eq!(verbose_error(&Leaf), None);
        assert_eq!(
            verbose_error(&Wrapped(Leaf)).as_deref(),
            Some("write failed: disk full")
        );
    }
}

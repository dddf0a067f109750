//! Journal native export format encoder.
//!
//! Every field is written as
//!
//! ```text
//! KEY '\n' <u64 little-endian length> VALUE '\n'
//! ```
//!
//! which is safe for values containing newlines or NUL bytes. Fields of one
//! record follow each other directly; records sharing a buffer are separated
//! by a single `'\n'`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};
use std::borrow::Cow;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use crate::buffer::Buffer;
use crate::cache::DerivedFieldCache;
use crate::config::{EncoderConfig, FIELD_KEY_MESSAGE, FIELD_KEY_PRIORITY};
use crate::error::EncodeError;
use crate::field::{AnyValue, ArrayRef, FieldError, FieldVisitor};
use crate::format::Formatters;
use crate::normalize::{append_normalized_key, normalize_key};
use crate::record::Record;
use crate::structured::{JsonMarshaller, StructuredMarshaller};

/// Turns a [`Record`] into bytes appended to a caller-owned [`Buffer`].
pub trait Encoder: Send {
    /// Append `record` to `buf`.
    ///
    /// On error the bytes appended by this call are garbage; callers must
    /// truncate `buf` back to its previous length.
    fn encode(&mut self, buf: &mut Buffer, record: &Record) -> Result<(), EncodeError>;
}

impl<E: Encoder + ?Sized> Encoder for Box<E> {
    fn encode(&mut self, buf: &mut Buffer, record: &Record) -> Result<(), EncodeError> {
        (**self).encode(buf, record)
    }
}

/// Normalized keys of the enabled fixed fields.
#[derive(Debug, Clone)]
struct FixedKeys {
    priority: bool,
    level: Option<String>,
    message: bool,
    time: Option<String>,
    name: Option<String>,
    caller: Option<String>,
}

impl FixedKeys {
    fn new(cfg: &EncoderConfig) -> Self {
        fn key(k: &str, disabled: bool) -> Option<String> {
            if disabled || k.is_empty() {
                None
            } else {
                Some(normalize_key(k))
            }
        }

        FixedKeys {
            priority: !cfg.disable_field_priority,
            level: key(&cfg.field_key_level, cfg.disable_field_level),
            message: !cfg.disable_field_msg,
            time: key(&cfg.field_key_time, cfg.disable_field_time),
            name: key(&cfg.field_key_name, cfg.disable_field_name),
            caller: key(&cfg.field_key_caller, cfg.disable_field_caller),
        }
    }
}

/// Encoder for the journal native format.
///
/// Derived fields are encoded once per logger identity and replayed from
/// the cache afterwards; see [`DerivedFieldCache`] for the invalidation
/// contract.
pub struct JournalEncoder {
    keys: FixedKeys,
    formatters: Formatters,
    structured: Arc<dyn StructuredMarshaller>,
    custom_structured: bool,
    cache: DerivedFieldCache,
}

impl Default for JournalEncoder {
    fn default() -> Self {
        JournalEncoder::new(EncoderConfig::default())
    }
}

impl JournalEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        let formatters = Formatters::default();
        JournalEncoder {
            keys: FixedKeys::new(&config),
            structured: Arc::new(JsonMarshaller::with_duration_formatter(
                formatters.duration.clone(),
            )),
            formatters,
            custom_structured: false,
            cache: DerivedFieldCache::new(config.cache_capacity),
        }
    }

    /// Replace the formatter strategies. The default JSON marshaller picks up
    /// the new duration formatter for duration arrays.
    ///
    /// Cached derived fields are discarded since they were rendered with the
    /// previous strategies.
    pub fn with_formatters(mut self, formatters: Formatters) -> Self {
        if !self.custom_structured {
            self.structured = Arc::new(JsonMarshaller::with_duration_formatter(
                formatters.duration.clone(),
            ));
        }
        self.formatters = formatters;
        self.clear_cache();
        self
    }

    /// Replace the marshaller used for arrays, objects and unresolved `Any`
    /// values. Clears the derived-field cache.
    pub fn with_structured(mut self, structured: Arc<dyn StructuredMarshaller>) -> Self {
        self.structured = structured;
        self.custom_structured = true;
        self.clear_cache();
        self
    }

    fn clear_cache(&mut self) {
        self.cache = DerivedFieldCache::new(self.cache.capacity());
    }

    pub fn cache(&self) -> &DerivedFieldCache {
        &self.cache
    }
}

impl Encoder for JournalEncoder {
    fn encode(&mut self, buf: &mut Buffer, record: &Record) -> Result<(), EncodeError> {
        // Records already in the buffer: separate from the previous one.
        let start = buf.len();
        if start > 0 {
            buf.push(b'\n');
        }

        let keys = &self.keys;
        let fmts = &self.formatters;
        let mut w = FrameWriter {
            buf,
            formatters: fmts,
            structured: &*self.structured,
        };

        if keys.priority {
            let priority = record.level.priority().as_u8();
            w.fixed(FIELD_KEY_PRIORITY, |b| display(b, priority))?;
        }
        if let Some(key) = &keys.level {
            w.fixed(key, |b| (fmts.level)(record.level, b))?;
        }
        if keys.message {
            w.fixed(FIELD_KEY_MESSAGE, |b| {
                b.push_str(&record.text);
                Ok(())
            })?;
        }
        if let Some(key) = &keys.time {
            w.fixed(key, |b| (fmts.time)(&record.timestamp, b))?;
        }
        if let Some(key) = &keys.name {
            if let Some(name) = record.logger_name.as_deref().filter(|n| !n.is_empty()) {
                w.fixed(key, |b| {
                    b.push_str(name);
                    Ok(())
                })?;
            }
        }
        if let Some(key) = &keys.caller {
            if let Some(caller) = &record.caller {
                w.fixed(key, |b| (fmts.caller)(caller, b))?;
            }
        }

        if !record.derived_fields.is_empty() {
            match self.cache.get(record.logger_id) {
                Some(bytes) => w.buf.extend_from_slice(&bytes),
                None => {
                    let mark = w.buf.len();
                    for field in record.derived_fields.iter() {
                        field.accept(&mut w)?;
                    }
                    let bytes: Arc<[u8]> = Arc::from(w.buf.since(mark));
                    self.cache.set(record.logger_id, bytes);
                }
            }
        }

        for field in &record.fields {
            field.accept(&mut w)?;
        }

        // A record without frames must not leave a dangling separator.
        if start > 0 && w.buf.len() == start + 1 {
            w.buf.truncate(start);
        }
        Ok(())
    }
}

fn display(buf: &mut Buffer, v: impl std::fmt::Display) -> Result<(), EncodeError> {
    write!(buf, "{}", v).map_err(EncodeError::from_io)
}

/// Resolve an `Any` value: known scalars and errors are written as text,
/// everything else goes to the structured marshaller.
fn write_any(
    fmts: &Formatters,
    structured: &dyn StructuredMarshaller,
    buf: &mut Buffer,
    v: &AnyValue,
) -> Result<(), EncodeError> {
    macro_rules! try_display {
        ($($t:ty),* $(,)?) => {
            $(
                if let Some(x) = v.downcast_ref::<$t>() {
                    return display(buf, x);
                }
            )*
        };
    }

    try_display!(
        String,
        &'static str,
        Cow<'static, str>,
        bool,
        i8,
        i16,
        i32,
        i64,
        i128,
        isize,
        u8,
        u16,
        u32,
        u64,
        u128,
        usize,
        f32,
        f64,
        char,
    );

    if let Some(d) = v.downcast_ref::<Duration>() {
        return (fmts.duration)(*d, buf);
    }
    if let Some(t) = v.downcast_ref::<DateTime<Utc>>() {
        return (fmts.time)(t, buf);
    }
    if let Some(e) = v.downcast_ref::<Arc<FieldError>>() {
        return display(buf, e);
    }
    if let Some(e) = v.downcast_ref::<Box<FieldError>>() {
        return display(buf, e);
    }
    if let Some(e) = v.downcast_ref::<std::io::Error>() {
        return display(buf, e);
    }
    if let Some(j) = v.downcast_ref::<JsonValue>() {
        match j {
            JsonValue::Bool(b) => return display(buf, b),
            JsonValue::Number(n) => return display(buf, n),
            JsonValue::String(s) => {
                buf.push_str(s);
                return Ok(());
            }
            _ => {}
        }
    }
    structured.marshal_any(buf, v)
}

/// Writes frames for one record into the borrowed buffer.
struct FrameWriter<'a> {
    buf: &'a mut Buffer,
    formatters: &'a Formatters,
    structured: &'a dyn StructuredMarshaller,
}

impl FrameWriter<'_> {
    /// Frame under an already normalized key.
    fn fixed<F>(&mut self, key: &str, value: F) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut Buffer) -> Result<(), EncodeError>,
    {
        self.buf.push_str(key);
        self.frame(value)
    }

    fn field<F>(&mut self, key: &str, value: F) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut Buffer) -> Result<(), EncodeError>,
    {
        append_normalized_key(self.buf, key);
        self.frame(value)
    }

    /// Write the value and backpatch its length once the size is known.
    fn frame<F>(&mut self, value: F) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut Buffer) -> Result<(), EncodeError>,
    {
        self.buf.push(b'\n');
        let size_at = self.buf.reserve_u64();
        let start = self.buf.len();

        value(&mut *self.buf)?;

        let written = (self.buf.len() - start) as u64;
        self.buf.patch_u64_le(size_at, written);
        self.buf.push(b'\n');
        Ok(())
    }
}

impl FieldVisitor for FrameWriter<'_> {
    fn visit_bool(&mut self, key: &str, v: bool) -> Result<(), EncodeError> {
        self.field(key, |b| {
            b.push_str(if v { "true" } else { "false" });
            Ok(())
        })
    }

    fn visit_i64(&mut self, key: &str, v: i64) -> Result<(), EncodeError> {
        self.field(key, |b| display(b, v))
    }

    fn visit_u64(&mut self, key: &str, v: u64) -> Result<(), EncodeError> {
        self.field(key, |b| display(b, v))
    }

    fn visit_f32(&mut self, key: &str, v: f32) -> Result<(), EncodeError> {
        self.field(key, |b| display(b, v))
    }

    fn visit_f64(&mut self, key: &str, v: f64) -> Result<(), EncodeError> {
        self.field(key, |b| display(b, v))
    }

    fn visit_str(&mut self, key: &str, v: &str) -> Result<(), EncodeError> {
        self.field(key, |b| {
            b.push_str(v);
            Ok(())
        })
    }

    fn visit_bytes(&mut self, key: &str, v: &[u8]) -> Result<(), EncodeError> {
        self.field(key, |b| {
            let n = base64::encoded_len(v.len(), true)
                .ok_or_else(|| EncodeError::Custom("byte field too large to encode".into()))?;
            STANDARD
                .encode_slice(v, b.extend_zeroed(n))
                .map_err(|e| EncodeError::Custom(Box::new(e)))?;
            Ok(())
        })
    }

    fn visit_duration(&mut self, key: &str, v: Duration) -> Result<(), EncodeError> {
        let fmts = self.formatters;
        self.field(key, |b| (fmts.duration)(v, b))
    }

    fn visit_time(&mut self, key: &str, v: &DateTime<Utc>) -> Result<(), EncodeError> {
        let fmts = self.formatters;
        self.field(key, |b| (fmts.time)(v, b))
    }

    fn visit_error(&mut self, key: &str, v: &FieldError) -> Result<(), EncodeError> {
        // The error strategy writes its own fields, possibly more than one.
        let fmts = self.formatters;
        (fmts.error)(key, v, self)
    }

    fn visit_array(&mut self, key: &str, v: ArrayRef<'_>) -> Result<(), EncodeError> {
        let structured = self.structured;
        self.field(key, |b| structured.marshal_array(b, v))
    }

    fn visit_object(&mut self, key: &str, v: &Map<String, JsonValue>) -> Result<(), EncodeError> {
        let structured = self.structured;
        self.field(key, |b| structured.marshal_object(b, v))
    }

    fn visit_any(&mut self, key: &str, v: &AnyValue) -> Result<(), EncodeError> {
        let (fmts, structured) = (self.formatters, self.structured);
        self.field(key, |b| write_any(fmts, structured, b, v))
    }
}

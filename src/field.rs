//! Typed record fields and the visitor that consumes them.
//!
//! A [`Field`] pairs a name with a [`Value`]. Encoders never match on
//! `Value` directly: they implement [`FieldVisitor`] and let
//! [`Field::accept`] pick the method for the concrete kind.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};
use std::any::Any;
use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::EncodeError;

/// Error type carried by [`Value::Error`].
pub type FieldError = dyn StdError + Send + Sync + 'static;

/// Value resolved at encode time by runtime type inspection.
pub type AnyValue = dyn Any + Send + Sync;

/// Borrowed view of a homogeneous array, handed to structured marshallers.
#[derive(Debug, Clone, Copy)]
pub enum ArrayRef<'a> {
    Bools(&'a [bool]),
    I8s(&'a [i8]),
    I16s(&'a [i16]),
    I32s(&'a [i32]),
    I64s(&'a [i64]),
    U8s(&'a [u8]),
    U16s(&'a [u16]),
    U32s(&'a [u32]),
    U64s(&'a [u64]),
    F32s(&'a [f32]),
    F64s(&'a [f64]),
    Strs(&'a [String]),
    Durations(&'a [Duration]),
    /// Heterogeneous or nested items, including arrays of objects.
    Values(&'a [JsonValue]),
}

#[derive(Clone)]
pub enum Value {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(Cow<'static, str>),
    Bytes(Vec<u8>),
    Duration(Duration),
    Time(DateTime<Utc>),
    Error(Arc<FieldError>),
    Bools(Vec<bool>),
    I8s(Vec<i8>),
    I16s(Vec<i16>),
    I32s(Vec<i32>),
    I64s(Vec<i64>),
    U8s(Vec<u8>),
    U16s(Vec<u16>),
    U32s(Vec<u32>),
    U64s(Vec<u64>),
    F32s(Vec<f32>),
    F64s(Vec<f64>),
    Strs(Vec<String>),
    Durations(Vec<Duration>),
    Object(Map<String, JsonValue>),
    Array(Vec<JsonValue>),
    Any(Arc<AnyValue>),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Value::I8(v) => f.debug_tuple("I8").field(v).finish(),
            Value::I16(v) => f.debug_tuple("I16").field(v).finish(),
            Value::I32(v) => f.debug_tuple("I32").field(v).finish(),
            Value::I64(v) => f.debug_tuple("I64").field(v).finish(),
            Value::U8(v) => f.debug_tuple("U8").field(v).finish(),
            Value::U16(v) => f.debug_tuple("U16").field(v).finish(),
            Value::U32(v) => f.debug_tuple("U32").field(v).finish(),
            Value::U64(v) => f.debug_tuple("U64").field(v).finish(),
            Value::F32(v) => f.debug_tuple("F32").field(v).finish(),
            Value::F64(v) => f.debug_tuple("F64").field(v).finish(),
            Value::Str(v) => f.debug_tuple("Str").field(v).finish(),
            Value::Bytes(v) => f.debug_tuple("Bytes").field(v).finish(),
            Value::Duration(v) => f.debug_tuple("Duration").field(v).finish(),
            Value::Time(v) => f.debug_tuple("Time").field(v).finish(),
            Value::Error(v) => f.debug_tuple("Error").field(&v.to_string()).finish(),
            Value::Bools(v) => f.debug_tuple("Bools").field(v).finish(),
            Value::I8s(v) => f.debug_tuple("I8s").field(v).finish(),
            Value::I16s(v) => f.debug_tuple("I16s").field(v).finish(),
            Value::I32s(v) => f.debug_tuple("I32s").field(v).finish(),
            Value::I64s(v) => f.debug_tuple("I64s").field(v).finish(),
            Value::U8s(v) => f.debug_tuple("U8s").field(v).finish(),
            Value::U16s(v) => f.debug_tuple("U16s").field(v).finish(),
            Value::U32s(v) => f.debug_tuple("U32s").field(v).finish(),
            Value::U64s(v) => f.debug_tuple("U64s").field(v).finish(),
            Value::F32s(v) => f.debug_tuple("F32s").field(v).finish(),
            Value::F64s(v) => f.debug_tuple("F64s").field(v).finish(),
            Value::Strs(v) => f.debug_tuple("Strs").field(v).finish(),
            Value::Durations(v) => f.debug_tuple("Durations").field(v).finish(),
            Value::Object(v) => f.debug_tuple("Object").field(v).finish(),
            Value::Array(v) => f.debug_tuple("Array").field(v).finish(),
            Value::Any(_) => f.write_str("Any(..)"),
        }
    }
}

/// Receiver for typed fields.
///
/// Every method writes one field under `key`. Errors come only from
/// pluggable formatters and structured marshallers.
pub trait FieldVisitor {
    fn visit_bool(&mut self, key: &str, v: bool) -> Result<(), EncodeError>;
    fn visit_i64(&mut self, key: &str, v: i64) -> Result<(), EncodeError>;
    fn visit_u64(&mut self, key: &str, v: u64) -> Result<(), EncodeError>;
    fn visit_f32(&mut self, key: &str, v: f32) -> Result<(), EncodeError>;
    fn visit_f64(&mut self, key: &str, v: f64) -> Result<(), EncodeError>;
    fn visit_str(&mut self, key: &str, v: &str) -> Result<(), EncodeError>;
    fn visit_bytes(&mut self, key: &str, v: &[u8]) -> Result<(), EncodeError>;
    fn visit_duration(&mut self, key: &str, v: Duration) -> Result<(), EncodeError>;
    fn visit_time(&mut self, key: &str, v: &DateTime<Utc>) -> Result<(), EncodeError>;
    fn visit_error(&mut self, key: &str, v: &FieldError) -> Result<(), EncodeError>;
    fn visit_array(&mut self, key: &str, v: ArrayRef<'_>) -> Result<(), EncodeError>;
    fn visit_object(&mut self, key: &str, v: &Map<String, JsonValue>) -> Result<(), EncodeError>;
    fn visit_any(&mut self, key: &str, v: &AnyValue) -> Result<(), EncodeError>;

    fn visit_i8(&mut self, key: &str, v: i8) -> Result<(), EncodeError> {
        self.visit_i64(key, v.into())
    }

    fn visit_i16(&mut self, key: &str, v: i16) -> Result<(), EncodeError> {
        self.visit_i64(key, v.into())
    }

    fn visit_i32(&mut self, key: &str, v: i32) -> Result<(), EncodeError> {
        self.visit_i64(key, v.into())
    }

    fn visit_u8(&mut self, key: &str, v: u8) -> Result<(), EncodeError> {
        self.visit_u64(key, v.into())
    }

    fn visit_u16(&mut self, key: &str, v: u16) -> Result<(), EncodeError> {
        self.visit_u64(key, v.into())
    }

    fn visit_u32(&mut self, key: &str, v: u32) -> Result<(), EncodeError> {
        self.visit_u64(key, v.into())
    }
}

/// A named value attached to a record.
#[derive(Debug, Clone)]
pub struct Field {
    pub key: Cow<'static, str>,
    pub value: Value,
}

impl Field {
    pub fn new(key: impl Into<Cow<'static, str>>, value: Value) -> Self {
        Field {
            key: key.into(),
            value,
        }
    }

    /// Drive `visitor` with the method matching this field's kind.
    pub fn accept(&self, visitor: &mut dyn FieldVisitor) -> Result<(), EncodeError> {
        let k: &str = &self.key;
        match &self.value {
            Value::Bool(v) => visitor.visit_bool(k, *v),
            Value::I8(v) => visitor.visit_i8(k, *v),
            Value::I16(v) => visitor.visit_i16(k, *v),
            Value::I32(v) => visitor.visit_i32(k, *v),
            Value::I64(v) => visitor.visit_i64(k, *v),
            Value::U8(v) => visitor.visit_u8(k, *v),
            Value::U16(v) => visitor.visit_u16(k, *v),
            Value::U32(v) => visitor.visit_u32(k, *v),
            Value::U64(v) => visitor.visit_u64(k, *v),
            Value::F32(v) => visitor.visit_f32(k, *v),
            Value::F64(v) => visitor.visit_f64(k, *v),
            Value::Str(v) => visitor.visit_str(k, v),
            Value::Bytes(v) => visitor.visit_bytes(k, v),
            Value::Duration(v) => visitor.visit_duration(k, *v),
            Value::Time(v) => visitor.visit_time(k, v),
            Value::Error(v) => visitor.visit_error(k, &**v),
            Value::Bools(v) => visitor.visit_array(k, ArrayRef::Bools(v)),
            Value::I8s(v) => visitor.visit_array(k, ArrayRef::I8s(v)),
            Value::I16s(v) => visitor.visit_array(k, ArrayRef::I16s(v)),
            Value::I32s(v) => visitor.visit_array(k, ArrayRef::I32s(v)),
            Value::I64s(v) => visitor.visit_array(k, ArrayRef::I64s(v)),
            Value::U8s(v) => visitor.visit_array(k, ArrayRef::U8s(v)),
            Value::U16s(v) => visitor.visit_array(k, ArrayRef::U16s(v)),
            Value::U32s(v) => visitor.visit_array(k, ArrayRef::U32s(v)),
            Value::U64s(v) => visitor.visit_array(k, ArrayRef::U64s(v)),
            Value::F32s(v) => visitor.visit_array(k, ArrayRef::F32s(v)),
            Value::F64s(v) => visitor.visit_array(k, ArrayRef::F64s(v)),
            Value::Strs(v) => visitor.visit_array(k, ArrayRef::Strs(v)),
            Value::Durations(v) => visitor.visit_array(k, ArrayRef::Durations(v)),
            Value::Object(v) => visitor.visit_object(k, v),
            Value::Array(v) => visitor.visit_array(k, ArrayRef::Values(v)),
            Value::Any(v) => visitor.visit_any(k, &**v),
        }
    }

    pub fn bool(key: impl Into<Cow<'static, str>>, v: bool) -> Self {
        Field::new(key, Value::Bool(v))
    }

    pub fn i64(key: impl Into<Cow<'static, str>>, v: i64) -> Self {
        Field::new(key, Value::I64(v))
    }

    pub fn u64(key: impl Into<Cow<'static, str>>, v: u64) -> Self {
        Field::new(key, Value::U64(v))
    }

    pub fn f64(key: impl Into<Cow<'static, str>>, v: f64) -> Self {
        Field::new(key, Value::F64(v))
    }

    pub fn str(key: impl Into<Cow<'static, str>>, v: impl Into<Cow<'static, str>>) -> Self {
        Field::new(key, Value::Str(v.into()))
    }

    pub fn bytes(key: impl Into<Cow<'static, str>>, v: impl Into<Vec<u8>>) -> Self {
        Field::new(key, Value::Bytes(v.into()))
    }

    pub fn duration(key: impl Into<Cow<'static, str>>, v: Duration) -> Self {
        Field::new(key, Value::Duration(v))
    }

    pub fn time(key: impl Into<Cow<'static, str>>, v: DateTime<Utc>) -> Self {
        Field::new(key, Value::Time(v))
    }

    pub fn error<E>(key: impl Into<Cow<'static, str>>, err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Field::new(key, Value::Error(Arc::new(err)))
    }

    pub fn object(key: impl Into<Cow<'static, str>>, v: Map<String, JsonValue>) -> Self {
        Field::new(key, Value::Object(v))
    }

    pub fn array(key: impl Into<Cow<'static, str>>, v: Vec<JsonValue>) -> Self {
        Field::new(key, Value::Array(v))
    }

    pub fn any<T>(key: impl Into<Cow<'static, str>>, v: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Field::new(key, Value::Any(Arc::new(v)))
    }
}

//! Structured sub-encoder for arrays, objects and unresolved `Any` values.

use serde_json::{Map, Value as JsonValue};
use std::fmt::Display;
use std::io::Write;
use std::time::Duration;

use crate::buffer::Buffer;
use crate::error::EncodeError;
use crate::field::{AnyValue, ArrayRef};
use crate::format::{self, DurationFormatter};

/// Writes self-describing representations of non-scalar values.
///
/// The encoder hands over the frame's buffer positioned at the start of the
/// value; implementations append the value text and nothing else.
pub trait StructuredMarshaller: Send + Sync {
    fn marshal_array(&self, buf: &mut Buffer, items: ArrayRef<'_>) -> Result<(), EncodeError>;

    fn marshal_object(
        &self,
        buf: &mut Buffer,
        object: &Map<String, JsonValue>,
    ) -> Result<(), EncodeError>;

    /// Called for `Any` values that are not a known scalar. Values the
    /// marshaller does not recognize are written as nothing.
    fn marshal_any(&self, buf: &mut Buffer, value: &AnyValue) -> Result<(), EncodeError>;
}

/// JSON output: `[1,2]`, `{"name":"n"}`, `["1s"]`.
#[derive(Clone)]
pub struct JsonMarshaller {
    duration: DurationFormatter,
}

impl Default for JsonMarshaller {
    fn default() -> Self {
        JsonMarshaller {
            duration: std::sync::Arc::new(format::string_duration),
        }
    }
}

impl JsonMarshaller {
    /// Durations inside arrays are rendered with `duration` and quoted.
    pub fn with_duration_formatter(duration: DurationFormatter) -> Self {
        JsonMarshaller { duration }
    }

    fn durations(&self, buf: &mut Buffer, items: &[Duration]) -> Result<(), EncodeError> {
        let mut scratch = Buffer::new();
        buf.push(b'[');
        for (i, d) in items.iter().enumerate() {
            if i > 0 {
                buf.push(b',');
            }
            scratch.reset();
            (self.duration)(*d, &mut scratch)?;
            let text = String::from_utf8_lossy(scratch.as_bytes());
            serde_json::to_writer(&mut *buf, &*text)?;
        }
        buf.push(b']');
        Ok(())
    }
}

fn display_list<T: Display>(buf: &mut Buffer, items: &[T]) -> Result<(), EncodeError> {
    buf.push(b'[');
    for (i, v) in items.iter().enumerate() {
        if i > 0 {
            buf.push(b',');
        }
        write!(buf, "{}", v).map_err(EncodeError::from_io)?;
    }
    buf.push(b']');
    Ok(())
}

/// Non-finite floats have no JSON form and are written as `null`.
fn float_list<T: Display + Copy>(
    buf: &mut Buffer,
    items: &[T],
    is_finite: fn(T) -> bool,
) -> Result<(), EncodeError> {
    buf.push(b'[');
    for (i, v) in items.iter().enumerate() {
        if i > 0 {
            buf.push(b',');
        }
        if is_finite(*v) {
            write!(buf, "{}", v).map_err(EncodeError::from_io)?;
        } else {
            buf.push_str("null");
        }
    }
    buf.push(b']');
    Ok(())
}

impl StructuredMarshaller for JsonMarshaller {
    fn marshal_array(&self, buf: &mut Buffer, items: ArrayRef<'_>) -> Result<(), EncodeError> {
        match items {
            ArrayRef::Bools(v) => display_list(buf, v),
            ArrayRef::I8s(v) => display_list(buf, v),
            ArrayRef::I16s(v) => display_list(buf, v),
            ArrayRef::I32s(v) => display_list(buf, v),
            ArrayRef::I64s(v) => display_list(buf, v),
            ArrayRef::U8s(v) => display_list(buf, v),
            ArrayRef::U16s(v) => display_list(buf, v),
            ArrayRef::U32s(v) => display_list(buf, v),
            ArrayRef::U64s(v) => display_list(buf, v),
            ArrayRef::F32s(v) => float_list(buf, v, f32::is_finite),
            ArrayRef::F64s(v) => float_list(buf, v, f64::is_finite),
            ArrayRef::Strs(v) => Ok(serde_json::to_writer(buf, v)?),
            ArrayRef::Durations(v) => self.durations(buf, v),
            ArrayRef::Values(v) => Ok(serde_json::to_writer(buf, v)?),
        }
    }

    fn marshal_object(
        &self,
        buf: &mut Buffer,
        object: &Map<String, JsonValue>,
    ) -> Result<(), EncodeError> {
        serde_json::to_writer(buf, object)?;
        Ok(())
    }

    fn marshal_any(&self, buf: &mut Buffer, value: &AnyValue) -> Result<(), EncodeError> {
        if let Some(v) = value.downcast_ref::<JsonValue>() {
            serde_json::to_writer(buf, v)?;
        } else if let Some(v) = value.downcast_ref::<Map<String, JsonValue>>() {
            serde_json::to_writer(buf, v)?;
        } else if let Some(v) = value.downcast_ref::<Vec<JsonValue>>() {
            serde_json::to_writer(buf, v)?;
        } else if let Some(v) = value.downcast_ref::<Vec<String>>() {
            serde_json::to_writer(buf, v)?;
        } else if let Some(v) = value.downcast_ref::<Vec<i64>>() {
            display_list(buf, v)?;
        } else if let Some(v) = value.downcast_ref::<Vec<u64>>() {
            display_list(buf, v)?;
        } else if let Some(v) = value.downcast_ref::<Vec<f64>>() {
            float_list(buf, v, f64::is_finite)?;
        } else if let Some(v) = value.downcast_ref::<Vec<bool>>() {
            display_list(buf, v)?;
        } else if let Some(v) = value.downcast_ref::<Vec<Duration>>() {
            self.durations(buf, v)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn render(items: ArrayRef<'_>) -> String {
        let mut buf = Buffer::new();
        JsonMarshaller::default().marshal_array(&mut buf, items).unwrap();
        String::from_utf8(buf.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn numeric_arrays() {
        assert_eq!(render(ArrayRef::I64s(&[0, 1])), "[0,1]");
        assert_eq!(render(ArrayRef::U32s(&[8])), "[8]");
        assert_eq!(render(ArrayRef::F32s(&[0.1, 9.0])), "[0.1,9]");
        assert_eq!(render(ArrayRef::F64s(&[f64::NAN, 2.5])), "[null,2.5]");
        assert_eq!(render(ArrayRef::Bools(&[true, false])), "[true,false]");
        assert_eq!(render(ArrayRef::I8s(&[])), "[]");
    }

    #[test]
    fn string_and_duration_arrays() {
        let strs = vec!["a\"b".to_string(), "c".to_string()];
        assert_eq!(render(ArrayRef::Strs(&strs)), r#"["a\"b","c"]"#);
        assert_eq!(
            render(ArrayRef::Durations(&[Duration::from_secs(1)])),
            r#"["1s"]"#
        );
    }

    #[test]
    fn objects_and_nested_arrays() {
        let users = vec![json!({"name": "n1"}), json!({"name": "n2"})];
        assert_eq!(
            render(ArrayRef::Values(&users)),
            r#"[{"name":"n1"},{"name":"n2"}]"#
        );

        let mut buf = Buffer::new();
        let obj = json!({"name": "n"});
        JsonMarshaller::default()
            .marshal_object(&mut buf, obj.as_object().unwrap())
            .unwrap();
        assert_eq!(buf.as_bytes(), br#"{"name":"n"}"#);
    }

    #[test]
    fn unknown_any_writes_nothing() {
        struct Opaque;
        let mut buf = Buffer::new();
        let value: Arc<AnyValue> = Arc::new(Opaque);
        JsonMarshaller::default().marshal_any(&mut buf, &*value).unwrap();
        assert!(buf.is_empty());

        let value: Arc<AnyValue> = Arc::new(json!([1, "x"]));
        JsonMarshaller::default().marshal_any(&mut buf, &*value).unwrap();
        assert_eq!(buf.as_bytes(), br#"[1,"x"]"#);
    }
}

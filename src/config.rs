use serde::Deserialize;

use crate::buffer::PAGE_SIZE;

pub const DEFAULT_FIELD_KEY_LEVEL: &str = "LEVEL";
pub const DEFAULT_FIELD_KEY_TIME: &str = "TS";
pub const DEFAULT_FIELD_KEY_NAME: &str = "LOGGER";
pub const DEFAULT_FIELD_KEY_CALLER: &str = "CALLER";

/// Journal-native keys; these cannot be renamed.
pub const FIELD_KEY_PRIORITY: &str = "PRIORITY";
pub const FIELD_KEY_MESSAGE: &str = "MESSAGE";

pub const DEFAULT_CACHE_CAPACITY: usize = 100;
pub const DEFAULT_FLUSH_THRESHOLD: usize = PAGE_SIZE * 2;

/// Field layout of encoded records.
///
/// `PRIORITY` lets the journal filter and colorize by urgency, while the
/// level field keeps the original severity name. Both are on by default.
/// An empty key disables the corresponding field just like its flag does.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub field_key_level: String,
    pub field_key_time: String,
    pub field_key_name: String,
    pub field_key_caller: String,

    pub disable_field_priority: bool,
    pub disable_field_level: bool,
    pub disable_field_msg: bool,
    /// The journal still stamps its own receive time.
    pub disable_field_time: bool,
    pub disable_field_name: bool,
    pub disable_field_caller: bool,

    /// Number of loggers whose derived fields are kept pre-encoded. Zero
    /// disables caching.
    pub cache_capacity: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            field_key_level: DEFAULT_FIELD_KEY_LEVEL.to_string(),
            field_key_time: DEFAULT_FIELD_KEY_TIME.to_string(),
            field_key_name: DEFAULT_FIELD_KEY_NAME.to_string(),
            field_key_caller: DEFAULT_FIELD_KEY_CALLER.to_string(),
            disable_field_priority: false,
            disable_field_level: false,
            disable_field_msg: false,
            disable_field_time: false,
            disable_field_name: false,
            disable_field_caller: false,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Buffering discipline of the [`Appender`](crate::appender::Appender).
///
/// **Fields**
/// - `flush_threshold`: once the buffer grows past this many bytes after an
///   append, the whole buffer is written to the sink.
/// - `initial_capacity`: bytes pre-allocated for the buffer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppenderConfig {
    pub flush_threshold: usize,
    pub initial_capacity: usize,
}

impl Default for AppenderConfig {
    fn default() -> Self {
        Self {
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            initial_capacity: DEFAULT_FLUSH_THRESHOLD + PAGE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let cfg: EncoderConfig =
            serde_json::from_str(r#"{"field_key_time": "TIMESTAMP", "disable_field_caller": true}"#)
                .unwrap();
        assert_eq!(cfg.field_key_time, "TIMESTAMP");
        assert_eq!(cfg.field_key_level, DEFAULT_FIELD_KEY_LEVEL);
        assert!(cfg.disable_field_caller);
        assert_eq!(cfg.cache_capacity, DEFAULT_CACHE_CAPACITY);

        let cfg: AppenderConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, AppenderConfig::default());
        assert_eq!(cfg.flush_threshold, 8192);
    }
}

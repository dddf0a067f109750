use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::field::Field;

/// Severity of a [`Record`].
///
/// Levels are ordered by urgency: `DEBUG < INFO < WARN < ERROR`. Any other raw
/// value is accepted and treated as an unknown level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Level(u8);

impl Level {
    pub const DEBUG: Level = Level(10);
    pub const INFO: Level = Level(20);
    pub const WARN: Level = Level(30);
    pub const ERROR: Level = Level(40);

    pub const fn from_raw(raw: u8) -> Self {
        Level(raw)
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Lower-case level name, `None` for unknown levels.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Level::DEBUG => Some("debug"),
            Level::INFO => Some("info"),
            Level::WARN => Some("warning"),
            Level::ERROR => Some("error"),
            _ => None,
        }
    }

    /// Journal priority for this level. Unknown levels map to
    /// [`Priority::Notice`].
    pub fn priority(self) -> Priority {
        match self {
            Level::DEBUG => Priority::Debug,
            Level::INFO => Priority::Info,
            Level::WARN => Priority::Warning,
            Level::ERROR => Priority::Err,
            _ => Priority::Notice,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "level({})", self.0),
        }
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => Level::ERROR,
            tracing::Level::WARN => Level::WARN,
            tracing::Level::INFO => Level::INFO,
            // The journal has no priority below debug.
            _ => Level::DEBUG,
        }
    }
}

/// Syslog-style urgency written as the `PRIORITY` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Priority {
    Emerg = 0,
    Alert = 1,
    Crit = 2,
    Err = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
}

impl Priority {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Call site of a log statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Caller {
    pub file: String,
    pub line: u32,
}

impl Caller {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Caller {
            file: file.into(),
            line,
        }
    }
}

/// Identity of the logger that produced a record.
///
/// Every record carrying the same identity must carry the same derived
/// fields; the encoder caches their wire form under this key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LoggerId(pub u64);

/// One structured log event.
#[derive(Debug, Clone)]
pub struct Record {
    pub level: Level,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub logger_name: Option<String>,
    pub logger_id: LoggerId,
    /// `None` when the call site was not captured.
    pub caller: Option<Caller>,
    /// Fields attached to this record only.
    pub fields: Vec<Field>,
    /// Fields bound when the logger was created, shared by all its records.
    pub derived_fields: Arc<[Field]>,
}

impl Record {
    pub fn new(level: Level, text: impl Into<String>) -> Self {
        Record {
            level,
            text: text.into(),
            timestamp: Utc::now(),
            logger_name: None,
            logger_id: LoggerId(0),
            caller: None,
            fields: Vec::new(),
            derived_fields: Arc::from(Vec::new()),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_logger(mut self, id: LoggerId, name: impl Into<String>) -> Self {
        self.logger_id = id;
        self.logger_name = Some(name.into());
        self
    }

    pub fn with_logger_id(mut self, id: LoggerId) -> Self {
        self.logger_id = id;
        self
    }

    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Attach the logger's derived fields.
    ///
    /// The encoder caches derived fields per [`LoggerId`], so records with
    /// different derived fields must also carry different identities (see
    /// [`Record::with_logger`]). Records left at the default identity share
    /// one cache entry.
    pub fn with_derived_fields(mut self, fields: Arc<[Field]>) -> Self {
        self.derived_fields = fields;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_is_monotonic_in_level() {
        let levels = [Level::DEBUG, Level::INFO, Level::WARN, Level::ERROR];
        let priorities: Vec<u8> = levels.iter().map(|l| l.priority().as_u8()).collect();
        assert_eq!(priorities, vec![7, 6, 4, 3]);
        assert!(priorities.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn unknown_level_maps_to_notice() {
        assert_eq!(Level::from_raw(99).priority(), Priority::Notice);
        assert_eq!(Level::from_raw(0).priority(), Priority::Notice);
        assert_eq!(Level::from_raw(99).to_string(), "level(99)");
    }

    #[test]
    fn level_names() {
        assert_eq!(Level::WARN.to_string(), "warning");
        assert_eq!(Level::from(tracing::Level::TRACE), Level::DEBUG);
        assert!(Level::DEBUG < Level::ERROR);
    }
}
